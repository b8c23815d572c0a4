//! Handle base shared by every schedulable object.

use core::fmt;

use super::CloseFn;

/// Unique identity of a handle.
///
/// Allocated from a 64-bit counter owned by the loop, so ids are never
/// reused while the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(pub(crate) u64);

impl HandleId {
    /// Raw numeric value of the id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for HandleId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "#{=u64}", self.0)
    }
}

/// Kind of a handle. Each kind has its own active list in the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// One-shot or repeating deadline.
    Timer,
    /// Per-byte console input.
    LineInput,
    /// Debounced digital line watch.
    Watch,
    /// Buffered read extension point.
    BufferedRead,
    /// Job run once per tick.
    Idle,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Kind {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Kind::Timer => defmt::write!(f, "Timer"),
            Kind::LineInput => defmt::write!(f, "LineInput"),
            Kind::Watch => defmt::write!(f, "Watch"),
            Kind::BufferedRead => defmt::write!(f, "BufferedRead"),
            Kind::Idle => defmt::write!(f, "Idle"),
        }
    }
}

/// Status bits of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    /// Handle takes part in its subsystem's pass.
    pub const ACTIVE: Flags = Flags(1 << 0);
    /// Handle is queued for the close sweep.
    pub const CLOSING: Flags = Flags(1 << 1);

    /// No bits set.
    pub const fn empty() -> Self {
        Flags(0)
    }

    /// Returns `true` when every bit of `other` is set.
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the bits of `other`.
    pub fn set(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`.
    pub fn clear(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    /// Raw bit pattern.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Fields common to every handle.
pub struct Handle<P, const N: usize> {
    /// Identity assigned at init.
    pub id: HandleId,
    /// Kind assigned at init.
    pub kind: Kind,
    /// Status bits.
    pub flags: Flags,
    /// Callback invoked by the close sweep.
    pub close_cb: Option<CloseFn<P, N>>,
}

impl<P, const N: usize> Handle<P, N> {
    /// Fresh handle with cleared flags and no close callback.
    pub(crate) fn new(id: HandleId, kind: Kind) -> Self {
        Self {
            id,
            kind,
            flags: Flags::empty(),
            close_cb: None,
        }
    }

    /// Returns `true` while the handle takes part in its subsystem's pass.
    pub fn is_active(&self) -> bool {
        self.flags.contains(Flags::ACTIVE)
    }

    /// Returns `true` once the handle has been queued for closing.
    pub fn is_closing(&self) -> bool {
        self.flags.contains(Flags::CLOSING)
    }
}

impl<P, const N: usize> Clone for Handle<P, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, const N: usize> Copy for Handle<P, N> {}

impl<P, const N: usize> fmt::Debug for Handle<P, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("close_cb", &self.close_cb.is_some())
            .finish()
    }
}
