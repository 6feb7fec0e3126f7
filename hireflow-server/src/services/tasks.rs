//! Task service

use hireflow_db::{Db, InsertRequest, PgConnection, Queries, Result};
use tracing::info;
use uuid::Uuid;

use crate::models::task::TASKS;
use crate::models::{NewTask, Task, TaskFilter};

/// Insert a task on a connection the caller already holds.
pub(crate) async fn insert_task(conn: &mut PgConnection, task: &NewTask) -> Result<Uuid> {
    let id = conn
        .insert_row(
            &InsertRequest::new(TASKS)
                .field("applicant", task.applicant)
                .field("dashboard", task.dashboard),
        )
        .await?;
    info!(task = %id, applicant = %task.applicant, dashboard = %task.dashboard, "Task created");
    Ok(id)
}

pub struct TaskService<'a> {
    db: &'a Db,
}

impl<'a> TaskService<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, task: NewTask) -> Result<Uuid> {
        self.db
            .wrap(move |conn| Box::pin(async move { insert_task(conn, &task).await }))
            .await
    }

    pub async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        self.db.select_as(&filter.select_request()).await
    }
}
