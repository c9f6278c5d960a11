//! Cellbot
//!
//! Navigation and decision engine for an agent in a cell-eating arena game.
//! Each tick the bot classifies foreign cells, builds a cost grid around
//! predators, runs a shortest-path search from its own position and picks
//! one of flee / hunt / chase / feed / wander.
//!
//! # Features
//!
//! - `sandbox` - Headless local arena for running the bot without a server (enabled by default)
//! - `metrics_extended` - Per-state decision counters in the Prometheus output (enabled by default)

pub mod config;
pub mod util;
pub mod game;
pub mod metrics;

#[cfg(feature = "sandbox")]
pub mod sandbox;
