//! Buffered read handles.
//!
//! Extension point for reads that accumulate until a condition holds (buffer
//! full, size threshold or terminator byte). No accumulation policy exists
//! yet, so the pass walks active handles without dispatching.

use core::fmt;

use super::{Entry, EventLoop, Handle, HandleId, Kind, PollFn, Table};
use crate::error::Error;
use crate::port::Platform;

/// Buffered read handle.
pub struct BufferedRead<P, const N: usize> {
    /// Common handle fields.
    pub base: Handle<P, N>,
    /// Reserved for the accumulation policy. Never invoked by the loop.
    pub callback: Option<PollFn<P, N>>,
}

impl<P, const N: usize> fmt::Debug for BufferedRead<P, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedRead")
            .field("base", &self.base)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

fn slot<P, const N: usize>(
    table: &mut Table<P, N>,
    id: HandleId,
) -> Result<&mut BufferedRead<P, N>, Error> {
    match table.get_mut(&id) {
        Some(Entry::BufferedRead(poll)) => Ok(poll),
        Some(_) => Err(Error::WrongKind),
        None => Err(Error::InvalidHandle),
    }
}

impl<P: Platform, const N: usize> EventLoop<P, N> {
    /// Creates an inert buffered read handle.
    pub fn poll_init(&mut self) -> Result<HandleId, Error> {
        self.register(Kind::BufferedRead, |base| {
            Entry::BufferedRead(BufferedRead {
                base,
                callback: None,
            })
        })
    }

    /// Registers `id` with the buffered read pass.
    pub fn poll_start(&mut self, id: HandleId, callback: Option<PollFn<P, N>>) -> Result<(), Error> {
        slot(&mut self.handles, id)?.callback = callback;
        self.activate(id, Kind::BufferedRead)?;
        trace!("poll {} reading", id);
        Ok(())
    }

    /// Unregisters `id` from the buffered read pass.
    pub fn poll_stop(&mut self, id: HandleId) -> Result<(), Error> {
        slot(&mut self.handles, id)?;
        self.deactivate(id, Kind::BufferedRead);
        trace!("poll {} stopped", id);
        Ok(())
    }

    pub(crate) fn run_polls(&mut self) {
        // TODO: accumulate into a per-handle buffer and dispatch on full
        // buffer, size threshold or terminator byte.
    }
}
