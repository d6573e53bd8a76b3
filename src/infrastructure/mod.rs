//! Infrastructure layer module
//!
//! This module contains the adapters and external integrations:
//! - Configuration management (figment)
//! - Dashboard publishers (terminal tables, JSON summary file)
//! - Logging infrastructure
//! - TestRail HTTP client
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod dashboard;
pub mod logging;
pub mod testrail;
