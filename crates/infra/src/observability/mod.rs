//! Structured logging setup

mod logging;

pub use logging::{init_tracing, init_tracing_with, LogFormat};
