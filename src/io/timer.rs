//! Timer subsystem.
//!
//! `Idle --start--> Armed --fire (one-shot)--> Idle`,
//! `Armed --fire (repeating)--> Armed`, `Armed --stop--> Idle`.

use core::fmt;

use super::{Entry, EventLoop, Flags, Handle, HandleId, Kind, Table, TimerFn};
use crate::error::Error;
use crate::port::{Duration, Instant, Platform};

/// One-shot or repeating deadline.
pub struct Timer<P, const N: usize> {
    /// Common handle fields.
    pub base: Handle<P, N>,
    /// Absolute time after which the timer fires.
    pub deadline: Instant,
    /// Interval the deadline advances by when repeating.
    pub period: Duration,
    /// Re-arms after firing when set.
    pub repeating: bool,
    /// Invoked on each firing.
    pub callback: Option<TimerFn<P, N>>,
}

impl<P, const N: usize> Timer<P, N> {
    fn new(base: Handle<P, N>) -> Self {
        Self {
            base,
            deadline: 0,
            period: 0,
            repeating: false,
            callback: None,
        }
    }

    /// Checks the deadline against `now`, returning `true` if the timer fires.
    ///
    /// A repeating timer advances by exactly one period per firing, so the
    /// schedule does not drift with late ticks. A one-shot timer disarms
    /// itself.
    pub(crate) fn expire(&mut self, now: Instant) -> bool {
        if now <= self.deadline {
            return false;
        }
        if self.repeating {
            self.deadline = self.deadline.wrapping_add(self.period);
        } else {
            self.base.flags.clear(Flags::ACTIVE);
        }
        true
    }
}

impl<P, const N: usize> fmt::Debug for Timer<P, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("base", &self.base)
            .field("deadline", &self.deadline)
            .field("period", &self.period)
            .field("repeating", &self.repeating)
            .finish_non_exhaustive()
    }
}

fn slot<P, const N: usize>(table: &mut Table<P, N>, id: HandleId) -> Result<&mut Timer<P, N>, Error> {
    match table.get_mut(&id) {
        Some(Entry::Timer(timer)) => Ok(timer),
        Some(_) => Err(Error::WrongKind),
        None => Err(Error::InvalidHandle),
    }
}

impl<P: Platform, const N: usize> EventLoop<P, N> {
    /// Creates an inert timer.
    pub fn timer_init(&mut self) -> Result<HandleId, Error> {
        self.register(Kind::Timer, |base| Entry::Timer(Timer::new(base)))
    }

    /// Arms `id` to fire `interval` after the current tick time.
    ///
    /// Starting an armed timer re-initialises it in place.
    pub fn timer_start(
        &mut self,
        id: HandleId,
        callback: Option<TimerFn<P, N>>,
        interval: Duration,
        repeat: bool,
    ) -> Result<(), Error> {
        let now = self.time;
        let timer = slot(&mut self.handles, id)?;
        timer.callback = callback;
        timer.deadline = now.wrapping_add(interval);
        timer.period = interval;
        timer.repeating = repeat;
        self.activate(id, Kind::Timer)?;
        trace!("timer {} armed, interval {}", id, interval);
        Ok(())
    }

    /// Disarms `id` and removes it from the timer list.
    ///
    /// A fired one-shot timer is inactive but still listed; stopping it
    /// unlists it.
    pub fn timer_stop(&mut self, id: HandleId) -> Result<(), Error> {
        slot(&mut self.handles, id)?;
        self.deactivate(id, Kind::Timer);
        trace!("timer {} stopped", id);
        Ok(())
    }

    /// Timer record of `id`.
    pub fn timer(&self, id: HandleId) -> Option<&Timer<P, N>> {
        match self.handles.get(&id) {
            Some(Entry::Timer(timer)) => Some(timer),
            _ => None,
        }
    }

    /// Looks `id` up among the registered timers.
    pub fn timer_get_by_id(&self, id: HandleId) -> Option<&Timer<P, N>> {
        self.get_by_identity(id, Kind::Timer)
            .and_then(|_| self.timer(id))
    }

    /// Stops and closes every timer.
    pub fn timer_cleanup(&mut self) {
        self.cleanup(Kind::Timer);
    }

    pub(crate) fn run_timers(&mut self) {
        let now = self.time;
        for id in self.timers.snapshot() {
            if !self.timers.contains(id) {
                continue;
            }
            let callback = match self.handles.get_mut(&id) {
                Some(Entry::Timer(timer)) if timer.base.is_active() => {
                    if !timer.expire(now) {
                        continue;
                    }
                    timer.callback
                }
                _ => continue,
            };
            trace!("timer {} fired at {}", id, now);
            if let Some(callback) = callback {
                callback(self, id);
            }
        }
    }
}
