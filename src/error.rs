//! Common error type for event loop operations

use core::fmt;

/// A common error type for event loop operations.
///
/// The loop itself is total over well-formed handles. The only failures come
/// from fixed-capacity storage and from ids that do not name a live handle of
/// the expected kind. Caller contract violations such as closing a handle
/// that is still registered are not reported here.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The handle table or a membership list is at capacity.
    Full,
    /// The id does not name a live handle.
    InvalidHandle,
    /// The id names a handle of a different kind.
    WrongKind,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Full => f.write_str("handle capacity exhausted"),
            Error::InvalidHandle => f.write_str("unknown handle"),
            Error::WrongKind => f.write_str("handle has a different kind"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Full => defmt::write!(f, "Full"),
            Error::InvalidHandle => defmt::write!(f, "InvalidHandle"),
            Error::WrongKind => defmt::write!(f, "WrongKind"),
        }
    }
}

impl core::error::Error for Error {}
