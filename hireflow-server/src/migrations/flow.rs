//! Hiring pipeline: dashboards, their process columns, tasks (one per
//! applicant on a dashboard) and the history of column moves.

use futures::future::BoxFuture;
use hireflow_db::{ColumnSpec, Ddl, PgConnection, Result};

use super::UUID_DEFAULT;

fn id() -> (&'static str, ColumnSpec) {
    ("id", ColumnSpec::new("uuid").default_to(UUID_DEFAULT))
}

fn created() -> (&'static str, ColumnSpec) {
    ("created", ColumnSpec::new("timestamptz").default_to("now()"))
}

pub(super) fn up(conn: &mut PgConnection) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        conn.create_table(
            "flow.dashboard",
            "id",
            &[
                id(),
                ("department", ColumnSpec::new("uuid")),
                ("name", ColumnSpec::new("text").default_to("''")),
                ("description", ColumnSpec::new("text")),
                created(),
            ],
        )
        .await?;

        conn.create_table(
            "flow.process",
            "id",
            &[
                id(),
                ("dashboard", ColumnSpec::new("uuid")),
                ("name", ColumnSpec::new("text").default_to("''")),
                ("order", ColumnSpec::new("int4").default_to("0")),
            ],
        )
        .await?;

        conn.create_table(
            "flow.tasks",
            "id",
            &[
                id(),
                ("applicant", ColumnSpec::new("uuid")),
                ("dashboard", ColumnSpec::new("uuid")),
                ("removed", ColumnSpec::new("bool").default_to("false")),
                created(),
            ],
        )
        .await?;

        conn.create_table(
            "flow.history",
            "id",
            &[
                id(),
                ("task", ColumnSpec::new("uuid")),
                ("to", ColumnSpec::new("uuid")),
                created(),
            ],
        )
        .await?;

        for (source, target) in [
            ("flow.dashboard.id", "flow.process.dashboard"),
            ("service.applicants.id", "flow.tasks.applicant"),
            ("flow.dashboard.id", "flow.tasks.dashboard"),
            ("flow.tasks.id", "flow.history.task"),
            ("flow.process.id", "flow.history.to"),
        ] {
            conn.create_relation(source, target).await?;
        }
        Ok(())
    })
}
