//! Engine object identifiers.

use std::fmt;

use yumstudio_sys::INVALID_NODE;

/// Identifies one host-engine object.
///
/// Uniqueness and reuse are decided by the host engine. [`Uid::INVALID`] is
/// reserved across the whole interface to mean "no such object".
///
/// # Example
///
/// ```
/// use yumstudio_core::Uid;
///
/// let uid = Uid::new(42);
/// assert!(uid.is_valid());
/// assert_eq!(uid.raw(), 42);
/// assert!(!Uid::INVALID.is_valid());
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(u64);

impl Uid {
    /// The sentinel returned by failed lookups and creations.
    pub const INVALID: Uid = Uid(INVALID_NODE);

    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != INVALID_NODE
    }

    /// `None` for the sentinel, `Some(self)` otherwise.
    #[inline]
    pub const fn valid(self) -> Option<Uid> {
        if self.is_valid() { Some(self) } else { None }
    }
}

impl Default for Uid {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#invalid")
        }
    }
}

impl From<u64> for Uid {
    fn from(raw: u64) -> Self {
        Self::new(raw)
    }
}

impl From<Uid> for u64 {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}
