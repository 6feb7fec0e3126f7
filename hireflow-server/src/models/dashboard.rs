//! Dashboards, their process columns and the column-move history

use chrono::{DateTime, Utc};
use hireflow_db::InsertRequest;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validation::{required_text, ValidationError};

pub const DASHBOARDS: &str = "flow.dashboard";
pub const PROCESSES: &str = "flow.process";
pub const HISTORY: &str = "flow.history";

/// Dashboard row from `flow.dashboard`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Dashboard {
    pub id: Uuid,
    pub department: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
}

/// Column of a dashboard (`flow.process`), ordered by `order`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Process {
    pub id: Uuid,
    pub dashboard: Option<Uuid>,
    pub name: String,
    pub order: i32,
}

/// A task moved onto a column (`flow.history`)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub task: Option<Uuid>,
    pub to: Option<Uuid>,
    pub created: DateTime<Utc>,
}

/// Dashboard with its columns
#[derive(Debug, Clone, Serialize)]
pub struct DashboardDetails {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    pub columns: Vec<Process>,
}

/// Create dashboard request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewDashboard {
    pub department: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    /// Column names, left to right
    pub columns: Vec<String>,
}

impl NewDashboard {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = required_text("name", &self.name)?;
        self.columns = self
            .columns
            .iter()
            .map(|column| required_text("column", column))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    pub fn insert_request(&self) -> InsertRequest {
        InsertRequest::new(DASHBOARDS)
            .field("department", self.department)
            .field("name", self.name.clone())
            .field("description", self.description.clone())
    }

    /// One column per name; `order` is the position in the list.
    pub fn process_requests(&self, dashboard: Uuid) -> Vec<InsertRequest> {
        self.columns
            .iter()
            .zip(0_i32..)
            .map(|(name, order)| {
                InsertRequest::new(PROCESSES)
                    .field("dashboard", dashboard)
                    .field("name", name.clone())
                    .field("order", order)
            })
            .collect()
    }
}
