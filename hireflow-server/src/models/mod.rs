//! Row types and request payloads
//!
//! Rows decode with `sqlx::FromRow` and serialize straight into responses.
//! Payloads validate on the way in; invalid input returns `ValidationError`.

pub mod candidate;
pub mod dashboard;
pub mod task;
pub mod validation;

pub use candidate::{Candidate, CandidateDetails, NewCandidate, Skill};
pub use dashboard::{Dashboard, DashboardDetails, HistoryEntry, NewDashboard, Process};
pub use task::{NewTask, Task, TaskFilter};
pub use validation::{required_text, ValidationError};
