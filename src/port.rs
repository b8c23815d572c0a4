//! Collaborator contracts consumed by the event loop.
//!
//! The loop never touches hardware directly. A board support crate provides
//! a monotonic clock, digital input lines and a byte source (usually the
//! console UART) by implementing the traits in this module. Anything that
//! implements all three is a [`Platform`].
//!
//! # Interrupt hand-off
//!
//! The loop polls [`ByteSource`] from its own thread. If bytes are produced
//! in interrupt context, the implementation is responsible for a safe
//! hand-off (for example a ring buffer with atomic indices) before
//! [`ByteSource::has_data`] observes them.
//!
//! # Examples
//!
//! ```rust
//! use ioloop::port::{ByteSource, Clock, DigitalIo, Instant, Level, Pin, PinMode};
//!
//! struct Board {
//!     ticks: Instant,
//! }
//!
//! impl Clock for Board {
//!     fn now(&mut self) -> Instant {
//!         self.ticks
//!     }
//! }
//!
//! impl DigitalIo for Board {
//!     fn configure(&mut self, _pin: Pin, _mode: PinMode) {}
//!     fn read(&mut self, _pin: Pin) -> Level {
//!         Level::Low
//!     }
//! }
//!
//! impl ByteSource for Board {
//!     fn has_data(&mut self) -> bool {
//!         false
//!     }
//!     fn pending_count(&mut self) -> usize {
//!         0
//!     }
//!     fn read_one(&mut self) -> u8 {
//!         0
//!     }
//! }
//! ```

/// Monotonic timestamp in platform ticks.
///
/// The unit is chosen by the [`Clock`] implementation (milliseconds on most
/// boards) and must stay the same for the lifetime of the process.
pub type Instant = u64;

/// Span of time in the same unit as [`Instant`].
pub type Duration = u64;

/// Identifier of a digital line.
pub type Pin = u8;

/// Logic level of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Logic low.
    Low,
    /// Logic high.
    High,
}

impl Level {
    /// Returns `true` for [`Level::High`].
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Returns `true` for [`Level::Low`].
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Level {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Level::Low => defmt::write!(f, "Low"),
            Level::High => defmt::write!(f, "High"),
        }
    }
}

/// Direction a digital line is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Line is sampled.
    Input,
    /// Line is driven.
    Output,
}

/// Source of monotonic time.
pub trait Clock {
    /// Current monotonic time.
    fn now(&mut self) -> Instant;

    /// Called once after every tick of [`EventLoop::run`](crate::EventLoop::run).
    ///
    /// Bare-metal targets have nothing to yield to and keep the default
    /// no-op. Hosted ports should sleep or block here so the busy loop does
    /// not pin a CPU core.
    fn relax(&mut self) {}
}

/// Pin-level access to digital lines.
pub trait DigitalIo {
    /// Configures `pin` for the given direction.
    fn configure(&mut self, pin: Pin, mode: PinMode);

    /// Samples the current level of `pin`.
    fn read(&mut self, pin: Pin) -> Level;
}

/// Polled byte input, typically the console UART receive buffer.
pub trait ByteSource {
    /// Returns `true` when at least one byte can be read.
    fn has_data(&mut self) -> bool;

    /// Number of bytes currently buffered.
    fn pending_count(&mut self) -> usize;

    /// Reads one buffered byte.
    ///
    /// Only called after [`has_data`](ByteSource::has_data) reported data,
    /// and never more than [`pending_count`](ByteSource::pending_count)
    /// times per drain.
    fn read_one(&mut self) -> u8;
}

/// Everything the event loop needs from the board.
pub trait Platform: Clock + DigitalIo + ByteSource {}

impl<T: Clock + DigitalIo + ByteSource> Platform for T {}

/// Hosted clock backed by [`std::time::Instant`].
///
/// Reports milliseconds since construction. [`Clock::relax`] sleeps for the
/// configured period so a hosted `run()` does not spin.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
    relax: std::time::Duration,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Default sleep between ticks.
    pub const DEFAULT_RELAX: std::time::Duration = std::time::Duration::from_millis(1);

    /// Creates a clock starting at zero that sleeps [`Self::DEFAULT_RELAX`] per tick.
    pub fn new() -> Self {
        Self::with_relax(Self::DEFAULT_RELAX)
    }

    /// Creates a clock with a custom sleep period. Zero disables sleeping.
    pub fn with_relax(relax: std::time::Duration) -> Self {
        Self {
            origin: std::time::Instant::now(),
            relax,
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&mut self) -> Instant {
        self.origin.elapsed().as_millis() as Instant
    }

    fn relax(&mut self) {
        if !self.relax.is_zero() {
            std::thread::sleep(self.relax);
        }
    }
}
