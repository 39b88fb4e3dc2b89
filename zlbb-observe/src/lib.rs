//! Tracing setup for zlbb.
//!
//! Library crates only emit `tracing` events; binaries and long-running
//! services call [`init_tracing`] once at startup to decide where they go.

pub mod tracer;

pub use tracer::{LogFormat, TracingConfig, TracingError, init_tracing};
