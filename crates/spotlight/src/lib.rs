//! A terminal spotlight: type a query, get results from local math, the
//! chat model and the file-system tools it calls.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod render;
mod session;
pub mod settings;

pub use session::{Session, SessionBuilder};

/// Re-exports of the core crate.
pub mod core {
    pub use spotlight_core::*;
}
