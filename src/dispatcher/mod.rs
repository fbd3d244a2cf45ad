//! Event dispatch for the custom service
//!
//! `handler` maps inbound events onto the retained [`ServiceState`];
//! `runtime` drives it from the link stack and the timer queue.

pub mod handler;
pub mod runtime;
pub mod state;

pub use handler::EventDispatcher;
pub use runtime::{GattSink, ServiceRuntime, SinkError};
pub use state::{IndicationCounter, ServiceConfig, ServiceState};
