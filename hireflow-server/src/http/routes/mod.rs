//! Route handlers organized by resource
//!
//! Resource endpoints are POST with JSON bodies, including reads.

pub mod candidates;
pub mod dashboards;
pub mod health;
pub mod tasks;
