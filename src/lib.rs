//! sysprobe - one-shot system information probe
//!
//! Captures a [`Snapshot`] of total/available memory, CPU model, OS identity
//! and graphics identity, tolerating per-field failure, and renders it as a
//! fixed-layout text report.

pub mod config;
pub mod error;
pub mod hardware;
pub mod report;

pub use error::FieldUnavailable;
pub use hardware::{capture_snapshot, Field, Probe, Snapshot, SnapshotField};
pub use report::{format, ReportFormatter};
