//! Tasks: an applicant placed on a dashboard

use chrono::{DateTime, Utc};
use hireflow_db::SelectRequest;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const TASKS: &str = "flow.tasks";

/// Task row from `flow.tasks`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub applicant: Option<Uuid>,
    pub dashboard: Option<Uuid>,
    pub removed: bool,
    pub created: DateTime<Utc>,
}

/// Create task request
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewTask {
    pub applicant: Uuid,
    pub dashboard: Uuid,
}

/// Optional task filters; unset fields match everything.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct TaskFilter {
    pub applicant: Option<Uuid>,
    pub dashboard: Option<Uuid>,
    pub include_removed: bool,
}

impl TaskFilter {
    pub fn select_request(&self) -> SelectRequest {
        let mut clauses = Vec::new();
        let mut req = SelectRequest::new(TASKS).order_by("created");

        for (column, value) in [("applicant", self.applicant), ("dashboard", self.dashboard)] {
            if let Some(value) = value {
                clauses.push(format!("{} = ${}", column, clauses.len() + 1));
                req = req.value(value);
            }
        }
        if !self.include_removed {
            clauses.push("NOT removed".to_string());
        }

        if clauses.is_empty() {
            req
        } else {
            req.filter(clauses.join(" AND "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_hides_removed() {
        let stmt = TaskFilter::default().select_request().build().unwrap();
        assert_eq!(
            stmt.text,
            "SELECT * FROM flow.tasks WHERE NOT removed ORDER BY created"
        );
        assert!(stmt.values.is_empty());
    }

    #[test]
    fn filters_number_their_placeholders() {
        let filter = TaskFilter {
            applicant: Some(Uuid::nil()),
            dashboard: Some(Uuid::nil()),
            include_removed: true,
        };
        let stmt = filter.select_request().build().unwrap();
        assert_eq!(
            stmt.text,
            "SELECT * FROM flow.tasks WHERE applicant = $1 AND dashboard = $2 ORDER BY created"
        );
        assert_eq!(stmt.values.len(), 2);

        let filter = TaskFilter {
            dashboard: Some(Uuid::nil()),
            ..TaskFilter::default()
        };
        let stmt = filter.select_request().build().unwrap();
        assert_eq!(
            stmt.text,
            "SELECT * FROM flow.tasks WHERE dashboard = $1 AND NOT removed ORDER BY created"
        );
    }
}
