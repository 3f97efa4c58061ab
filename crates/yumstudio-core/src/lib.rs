//! Core of the YumStudio native binding.
//!
//! A module talks to the host engine only through the `ysnative` function
//! table the host hands over at load time. This crate owns that table and the
//! handle model built on it:
//!
//! - [`NativeTable`] and [`Slots`]: the table and which of its slots are filled;
//! - [`register`], [`get_table`] and [`Native`]: the process-wide table;
//! - [`NodeBackend`]: the capability interface handles dispatch through;
//! - [`Node`] and [`Uid`]: non-owning handles to engine objects;
//! - [`fake`] (feature `fake`): an in-memory engine for tests.
//!
//! ```ignore
//! use yumstudio_core::Node;
//!
//! // After the host has called the module entry:
//! let root = Node::from_name("Root")?;
//! let child = Node::create()?;
//! root.add_child(&child);
//! let child = child.into_uid(); // owned by the scene tree now
//! ```

mod backend;
mod error;
mod node;
mod registry;
mod table;
mod uid;

pub mod signal;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use backend::NodeBackend;
pub use error::{NativeError, NativeResult};
pub use node::{DEFAULT_ANCESTOR_CAPACITY, MAX_QUERY_CAPACITY, Node};
pub use registry::{
    Native, ensure_ready, generation, get_table, raw_table, register, register_raw,
};
pub use signal::{SignalCallback, signal_args};
pub use table::{NativeTable, Slots};
pub use uid::Uid;

pub use yumstudio_sys as sys;
