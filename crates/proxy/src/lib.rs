//! The spotlight model proxy.
//!
//! A small HTTP relay that holds the server-side credential for the hosted
//! chat API, so that clients don't need one of their own.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod routes;

pub use routes::{AppState, router};
