//! YumStudio binding for Rust modules.
//!
//! The host process loads the module, then calls [`YumStudioModuleEntry`] with
//! its native function table. From then on, [`Node`] handles forward every
//! operation through that table to the engine.
//!
//! ```ignore
//! use yumstudio::prelude::*;
//!
//! let ui = Node::from_name("UI")?;
//! let panel = Node::create()?;
//! ui.add_child(&panel);
//! panel.into_uid();
//! ```
//!
//! [`YumStudioModuleEntry`]: entry::YumStudioModuleEntry

pub mod entry;

pub use yumstudio_core::*;

pub mod prelude {
    pub use yumstudio_core::{
        NativeError, NativeResult, Node, NodeBackend, SignalCallback, Uid, signal_args,
    };
}
