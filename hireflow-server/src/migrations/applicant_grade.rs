use futures::future::BoxFuture;
use hireflow_db::{ColumnSpec, Ddl, PgConnection, Result};

/// Seniority grade on applicants.
pub(super) fn up(conn: &mut PgConnection) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        conn.create_field("service.applicants", "grade", &ColumnSpec::new("text"))
            .await
    })
}
