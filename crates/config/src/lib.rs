//! Configuration loading for the mft command-line client.
//!
//! Uses figment to layer YAML configuration and `MFT_*` environment
//! variables over sensible defaults. The client library never reads
//! configuration itself; only the binary does, through this crate.

pub mod schema;

pub use schema::{ApiConfig, AuthConfig, Config, ENV_PREFIX, LogConfig, LogFormat, RetryConfig};
