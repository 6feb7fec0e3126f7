//! Dashboard service

use hireflow_db::{Db, DbError, InsertRequest, Queries, Result, SelectRequest};
use tracing::info;
use uuid::Uuid;

use crate::models::dashboard::{DASHBOARDS, HISTORY, PROCESSES};
use crate::models::{Dashboard, DashboardDetails, HistoryEntry, NewDashboard, Process};

fn columns_of(dashboard: Uuid) -> SelectRequest {
    SelectRequest::new(PROCESSES)
        .filter("dashboard = $1")
        .value(dashboard)
        .order_by("order")
}

pub struct DashboardService<'a> {
    db: &'a Db,
}

impl<'a> DashboardService<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Dashboard>> {
        self.db
            .select_as(&SelectRequest::new(DASHBOARDS).order_by("created"))
            .await
    }

    /// Create the dashboard and its columns.
    ///
    /// Columns are inserted one after another in list order, on the same
    /// transaction. The first failure aborts and rolls back everything.
    pub async fn create(&self, dashboard: NewDashboard) -> Result<DashboardDetails> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let id = conn.insert_row(&dashboard.insert_request()).await?;
                    for process in dashboard.process_requests(id) {
                        conn.insert(&process).await?;
                    }

                    let created = conn
                        .select_as::<Dashboard>(
                            &SelectRequest::new(DASHBOARDS).filter("id = $1").value(id),
                        )
                        .await?
                        .into_iter()
                        .next()
                        .ok_or_else(|| DbError::not_found("dashboard", id))?;
                    let columns = conn.select_as::<Process>(&columns_of(id)).await?;

                    info!(dashboard = %id, columns = columns.len(), "Dashboard created");
                    Ok(DashboardDetails {
                        dashboard: created,
                        columns,
                    })
                })
            })
            .await
    }

    pub async fn by_department(&self, department: Uuid) -> Result<Dashboard> {
        self.db
            .select_as::<Dashboard>(
                &SelectRequest::new(DASHBOARDS)
                    .filter("department = $1")
                    .value(department)
                    .order_by("created")
                    .limit(1),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("dashboard for department", department))
    }

    /// Columns of a dashboard, left to right.
    pub async fn processes(&self, dashboard: Uuid) -> Result<Vec<Process>> {
        self.db.select_as(&columns_of(dashboard)).await
    }

    /// Move a task onto a column.
    pub async fn history_append(&self, task: Uuid, column: Uuid) -> Result<Uuid> {
        let id = self
            .db
            .insert_row(
                &InsertRequest::new(HISTORY)
                    .field("task", task)
                    .field("to", column),
            )
            .await?;
        info!(task = %task, column = %column, "Task moved");
        Ok(id)
    }

    /// Column moves of a task, oldest first.
    pub async fn history(&self, task: Uuid) -> Result<Vec<HistoryEntry>> {
        self.db
            .select_as(
                &SelectRequest::new(HISTORY)
                    .filter("task = $1")
                    .value(task)
                    .order_by("created"),
            )
            .await
    }
}
