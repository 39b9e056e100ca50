//! An abstraction layer for the chat model behind the spotlight.
//!
//! This crate establishes the protocol the dispatcher uses to talk to a
//! model, whether the model is reached directly or through the proxy
//! endpoint. The history types mirror the wire shape of the hosted chat
//! API, so that a transcript can be forwarded without any conversion.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod history;
mod provider;
mod request;

pub use error::*;
pub use history::*;
pub use provider::*;
pub use request::*;
