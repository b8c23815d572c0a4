//! Console input: turns the polled byte source into per-byte callbacks.

use core::fmt;

use super::{Entry, EventLoop, Handle, HandleId, Kind, Table, TtyFn};
use crate::error::Error;
use crate::port::Platform;

/// Line-oriented input handle. Holds no buffer of its own.
pub struct LineInput<P, const N: usize> {
    /// Common handle fields.
    pub base: Handle<P, N>,
    /// Invoked once per received byte.
    pub callback: Option<TtyFn<P, N>>,
}

impl<P, const N: usize> fmt::Debug for LineInput<P, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineInput")
            .field("base", &self.base)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

fn slot<P, const N: usize>(
    table: &mut Table<P, N>,
    id: HandleId,
) -> Result<&mut LineInput<P, N>, Error> {
    match table.get_mut(&id) {
        Some(Entry::LineInput(tty)) => Ok(tty),
        Some(_) => Err(Error::WrongKind),
        None => Err(Error::InvalidHandle),
    }
}

impl<P: Platform, const N: usize> EventLoop<P, N> {
    /// Creates an inert console input handle.
    pub fn tty_init(&mut self) -> Result<HandleId, Error> {
        self.register(Kind::LineInput, |base| {
            Entry::LineInput(LineInput {
                base,
                callback: None,
            })
        })
    }

    /// Starts delivering received bytes to `callback`.
    pub fn tty_start(&mut self, id: HandleId, callback: Option<TtyFn<P, N>>) -> Result<(), Error> {
        slot(&mut self.handles, id)?.callback = callback;
        self.activate(id, Kind::LineInput)?;
        trace!("tty {} reading", id);
        Ok(())
    }

    /// Stops delivering bytes. Unread bytes stay in the source.
    pub fn tty_stop(&mut self, id: HandleId) -> Result<(), Error> {
        slot(&mut self.handles, id)?;
        self.deactivate(id, Kind::LineInput);
        trace!("tty {} stopped", id);
        Ok(())
    }

    /// Stops and closes every console input handle.
    pub fn tty_cleanup(&mut self) {
        self.cleanup(Kind::LineInput);
    }

    /// Drains the byte source into each active handle in turn.
    ///
    /// The pending count is read once per handle, so bytes arriving during
    /// the drain wait for the next tick. A handle stopped by its own callback
    /// stops receiving immediately.
    pub(crate) fn run_ttys(&mut self) {
        for id in self.ttys.snapshot() {
            if !self.is_armed(id, Kind::LineInput) {
                continue;
            }
            let Some(callback) = slot(&mut self.handles, id).ok().and_then(|tty| tty.callback)
            else {
                continue;
            };
            if !self.platform.has_data() {
                continue;
            }
            let pending = self.platform.pending_count();
            for _ in 0..pending {
                if !self.is_armed(id, Kind::LineInput) {
                    break;
                }
                let byte = self.platform.read_one();
                callback(self, id, byte);
            }
        }
    }
}
