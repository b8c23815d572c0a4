//! Idle handles: deferred jobs run once per tick.
//!
//! A script runtime starts one of these to flush its queue of pending jobs
//! (promise reactions and the like) on every loop iteration.

use core::fmt;

use super::{Entry, EventLoop, Handle, HandleId, IdleFn, Kind, Table};
use crate::error::Error;
use crate::port::Platform;

/// Job invoked on every tick while active.
pub struct Idle<P, const N: usize> {
    /// Common handle fields.
    pub base: Handle<P, N>,
    /// Invoked once per tick.
    pub callback: Option<IdleFn<P, N>>,
}

impl<P, const N: usize> fmt::Debug for Idle<P, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Idle")
            .field("base", &self.base)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

fn slot<P, const N: usize>(table: &mut Table<P, N>, id: HandleId) -> Result<&mut Idle<P, N>, Error> {
    match table.get_mut(&id) {
        Some(Entry::Idle(idle)) => Ok(idle),
        Some(_) => Err(Error::WrongKind),
        None => Err(Error::InvalidHandle),
    }
}

impl<P: Platform, const N: usize> EventLoop<P, N> {
    /// Creates an inert idle handle.
    pub fn idle_init(&mut self) -> Result<HandleId, Error> {
        self.register(Kind::Idle, |base| {
            Entry::Idle(Idle {
                base,
                callback: None,
            })
        })
    }

    /// Runs `callback` on every tick from now on.
    pub fn idle_start(&mut self, id: HandleId, callback: Option<IdleFn<P, N>>) -> Result<(), Error> {
        slot(&mut self.handles, id)?.callback = callback;
        self.activate(id, Kind::Idle)?;
        trace!("idle {} started", id);
        Ok(())
    }

    /// Stops running the job.
    pub fn idle_stop(&mut self, id: HandleId) -> Result<(), Error> {
        slot(&mut self.handles, id)?;
        self.deactivate(id, Kind::Idle);
        trace!("idle {} stopped", id);
        Ok(())
    }

    /// Stops and closes every idle handle.
    pub fn idle_cleanup(&mut self) {
        self.cleanup(Kind::Idle);
    }

    pub(crate) fn run_idles(&mut self) {
        for id in self.idles.snapshot() {
            if !self.is_armed(id, Kind::Idle) {
                continue;
            }
            let Some(callback) = slot(&mut self.handles, id).ok().and_then(|idle| idle.callback)
            else {
                continue;
            };
            callback(self, id);
        }
    }
}
