//! Core workflow engine for the student no-dues clearance portal.

pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod workflows;
