//! Solarview Core: portal sync, year cache and heatmap rendering.
//!
//! This crate contains everything except the shell:
//! - Domain types (day records, year snapshots, plants)
//! - Growatt portal client behind the `SolarPortal` trait
//! - Per-year compressed snapshot cache
//! - Sync engine deciding what to fetch and when a year is complete
//! - Pure heatmap renderer
//! - TOML configuration

pub mod clock;
pub mod config;
pub mod data;
pub mod domain;
pub mod render;
pub mod service;

pub use service::{ServiceError, Solarview};
