//! # radar-types
//!
//! Core types for dor-radar. This crate defines the data that flows through
//! the metric-to-graph engine: probe samples read from the metrics store,
//! the reshape rules that rename and decorate endpoints, and the graph that
//! is rendered by the radar front-end.
//!
//! ## Features
//!
//! - `serde`: JSON (de)serialization via serde. Graphs serialize to the
//!   shape the front-end expects, reshape rules deserialize from config.
//!
//! ## Example
//!
//! ```rust
//! use radar_types::{ReshapeRule, ReshapeRules};
//!
//! let rules = ReshapeRules::new(vec![
//!     ReshapeRule::new("10.0.0.1").to("edge-router").attrs(["core"]).size(20),
//! ]);
//!
//! assert_eq!(rules.shape("10.0.0.1"), "edge-router");
//! assert_eq!(rules.size_for("10.0.0.1"), 20);
//! assert_eq!(rules.shape("10.0.0.2"), "10.0.0.2");
//! assert_eq!(rules.size_for("10.0.0.2"), radar_types::DEFAULT_NODE_SIZE);
//! ```

mod graph;
mod reshape;
mod sample;

pub use graph::*;
pub use reshape::*;
pub use sample::*;

/// Display size used for nodes no reshape rule sizes explicitly.
pub const DEFAULT_NODE_SIZE: u32 = 15;
