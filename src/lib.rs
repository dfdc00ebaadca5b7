//! # dor-radar
//!
//! Network status radar. Serves the reliability of blackbox-style probes,
//! as recorded in a Prometheus-compatible store, as a topology graph for
//! the radar front-end.
//!
//! The graph engine lives in `radar-collector`; this crate adds the
//! configuration file, the HTTP server and the `dor-radar` binary.

pub mod config;
pub mod duration;
pub mod server;

pub use config::{CollectorConfig, RadarConfig};
pub use server::RadarServer;
