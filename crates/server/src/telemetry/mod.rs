//! Tracing setup: structured JSON logs, plus optional OTLP span export.
//!
//! # Telemetry invariants
//!
//! - **No key material, plaintext, or envelope text** may appear in any span
//!   attribute or log field. Log record identifiers and error kinds only.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
