//! Debounced level-change watches over digital input lines.
//!
//! Every raw transition restarts the debounce window. A new stable level is
//! accepted only once the line has stayed put for the whole window, so a
//! line that keeps flickering faster than the window never dispatches.

use core::fmt;

use super::{Entry, EventLoop, Handle, HandleId, Kind, Table, WatchFn};
use crate::error::Error;
use crate::port::{Duration, Instant, Level, Pin, PinMode, Platform};

/// Which stable transitions invoke the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Both directions.
    OnChange,
    /// Only when the new stable level is high.
    OnRising,
    /// Only when the new stable level is low.
    OnFalling,
}

impl TriggerMode {
    /// Returns `true` if a transition to `level` dispatches in this mode.
    pub const fn matches(self, level: Level) -> bool {
        match self {
            TriggerMode::OnChange => true,
            TriggerMode::OnRising => level.is_high(),
            TriggerMode::OnFalling => level.is_low(),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TriggerMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            TriggerMode::OnChange => defmt::write!(f, "OnChange"),
            TriggerMode::OnRising => defmt::write!(f, "OnRising"),
            TriggerMode::OnFalling => defmt::write!(f, "OnFalling"),
        }
    }
}

/// Debounced watch on one digital line.
pub struct Watch<P, const N: usize> {
    /// Common handle fields.
    pub base: Handle<P, N>,
    /// Watched line.
    pub pin: Pin,
    /// Transitions that dispatch.
    pub mode: TriggerMode,
    /// Raw level seen on the previous tick.
    pub last_sample: Level,
    /// Start of the pending debounce window, if a transition is settling.
    pub debounce_since: Option<Instant>,
    /// Last accepted level.
    pub stable: Level,
    /// Time a transition must hold before it is accepted.
    pub debounce: Duration,
    /// Invoked on matching stable transitions.
    pub callback: Option<WatchFn<P, N>>,
}

impl<P, const N: usize> Watch<P, N> {
    fn new(base: Handle<P, N>) -> Self {
        Self {
            base,
            pin: 0,
            mode: TriggerMode::OnChange,
            last_sample: Level::Low,
            debounce_since: None,
            stable: Level::Low,
            debounce: 0,
            callback: None,
        }
    }

    /// Feeds one raw sample taken at `now`. Returns `true` when the sample
    /// completes a debounced transition that matches the trigger mode.
    pub(crate) fn sample(&mut self, reading: Level, now: Instant) -> bool {
        if reading != self.last_sample {
            self.debounce_since = Some(now);
        }

        let mut dispatch = false;
        if let Some(since) = self.debounce_since {
            if now.saturating_sub(since) >= self.debounce {
                if reading != self.stable {
                    self.stable = reading;
                    dispatch = self.mode.matches(reading);
                }
                // A glitch that settled back on the stable level ends here too.
                self.debounce_since = None;
            }
        }

        self.last_sample = reading;
        dispatch
    }
}

impl<P, const N: usize> fmt::Debug for Watch<P, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("base", &self.base)
            .field("pin", &self.pin)
            .field("mode", &self.mode)
            .field("last_sample", &self.last_sample)
            .field("debounce_since", &self.debounce_since)
            .field("stable", &self.stable)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

fn slot<P, const N: usize>(table: &mut Table<P, N>, id: HandleId) -> Result<&mut Watch<P, N>, Error> {
    match table.get_mut(&id) {
        Some(Entry::Watch(watch)) => Ok(watch),
        Some(_) => Err(Error::WrongKind),
        None => Err(Error::InvalidHandle),
    }
}

impl<P: Platform, const N: usize> EventLoop<P, N> {
    /// Creates an inert watch.
    pub fn watch_init(&mut self) -> Result<HandleId, Error> {
        self.register(Kind::Watch, |base| Entry::Watch(Watch::new(base)))
    }

    /// Configures `pin` as an input and starts watching it.
    ///
    /// The current level becomes both the last raw sample and the stable
    /// level, so nothing dispatches until the line actually moves.
    pub fn watch_start(
        &mut self,
        id: HandleId,
        callback: Option<WatchFn<P, N>>,
        pin: Pin,
        mode: TriggerMode,
        debounce: Duration,
    ) -> Result<(), Error> {
        let watch = slot(&mut self.handles, id)?;
        self.platform.configure(pin, PinMode::Input);
        let level = self.platform.read(pin);
        watch.callback = callback;
        watch.pin = pin;
        watch.mode = mode;
        watch.debounce = debounce;
        watch.debounce_since = None;
        watch.last_sample = level;
        watch.stable = level;
        self.activate(id, Kind::Watch)?;
        trace!("watch {} on pin {} mode {:?}", id, pin, mode);
        Ok(())
    }

    /// Stops watching. Stopping an inactive watch is a no-op.
    pub fn watch_stop(&mut self, id: HandleId) -> Result<(), Error> {
        slot(&mut self.handles, id)?;
        self.deactivate(id, Kind::Watch);
        trace!("watch {} stopped", id);
        Ok(())
    }

    /// Watch record of `id`.
    pub fn watch(&self, id: HandleId) -> Option<&Watch<P, N>> {
        match self.handles.get(&id) {
            Some(Entry::Watch(watch)) => Some(watch),
            _ => None,
        }
    }

    /// Looks `id` up among the registered watches.
    pub fn watch_get_by_id(&self, id: HandleId) -> Option<&Watch<P, N>> {
        self.get_by_identity(id, Kind::Watch)
            .and_then(|_| self.watch(id))
    }

    /// Stops and closes every watch.
    pub fn watch_cleanup(&mut self) {
        self.cleanup(Kind::Watch);
    }

    pub(crate) fn run_watches(&mut self) {
        let now = self.time;
        for id in self.watches.snapshot() {
            if !self.is_armed(id, Kind::Watch) {
                continue;
            }
            let Ok(watch) = slot(&mut self.handles, id) else {
                continue;
            };
            let reading = self.platform.read(watch.pin);
            if !watch.sample(reading, now) {
                continue;
            }
            let callback = watch.callback;
            debug!("watch {} pin {} settled {:?}", id, watch.pin, reading);
            if let Some(callback) = callback {
                callback(self, id);
            }
        }
    }
}
