//! Service layer
//!
//! Straight-line CRUD over `hireflow_db::Db`. Multi-row writes run inside
//! one transaction so a failure leaves nothing half-written.

pub mod candidates;
pub mod dashboards;
pub mod tasks;

pub use candidates::{ApplyOutcome, CandidateService};
pub use dashboards::DashboardService;
pub use tasks::TaskService;
