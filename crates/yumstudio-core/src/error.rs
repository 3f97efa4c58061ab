//! Error types for the native binding.
//!
//! Only conditions a caller can act on are represented here. Calling through a
//! slot the host never registered is a programming error and panics instead
//! (see [`NativeTable`](crate::NativeTable)).

use std::ffi::{CString, NulError};
use thiserror::Error;

use crate::table::Slots;

pub type NativeResult<T> = Result<T, NativeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    /// A name lookup returned the invalid UID.
    #[error("node `{name}` not found")]
    NodeNotFound { name: String },

    /// The host engine refused or failed to create a node.
    #[error("host engine failed to create a node")]
    CreationFailed,

    /// The handle holds [`Uid::INVALID`](crate::Uid::INVALID).
    #[error("operation on a node handle holding the invalid uid")]
    InvalidHandle,

    #[error("name must not be empty")]
    EmptyName,

    #[error("name {name:?} contains an interior nul byte")]
    InteriorNul {
        name: String,
        #[source]
        source: NulError,
    },

    /// The current native table lacks slots the caller asked for.
    #[error("native table is missing slots: {0:?}")]
    NotRegistered(Slots),
}

impl NativeError {
    /// Whether this error reports an absent node rather than a misuse.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NativeError::NodeNotFound { .. })
    }
}

/// Converts a name into the NUL-terminated form the host expects.
pub(crate) fn to_c_name(name: &str) -> NativeResult<CString> {
    if name.is_empty() {
        return Err(NativeError::EmptyName);
    }
    CString::new(name).map_err(|source| NativeError::InteriorNul {
        name: name.to_owned(),
        source,
    })
}
