//! Core logic of the spotlight: query dispatching, tool calls, conversation
//! history, result items and configuration.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod dispatcher;
mod error;
pub mod history;
pub mod math;
mod model_client;
pub mod poller;
pub mod result;
mod settings;
pub mod tool;

pub use dispatcher::{Dispatcher, DispatcherBuilder, Stage, Turn};
pub use error::{Error, ErrorKind};
pub use model_client::ModelClient;
pub use settings::Settings;
