//! Decision Analytics - Analytic Hierarchy Process engine
//!
//! This crate derives criteria priorities from pairwise comparisons, checks
//! their consistency, aggregates judgments across evaluators and stress-tests
//! the resulting ranking with sensitivity sweeps and Monte Carlo simulation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
