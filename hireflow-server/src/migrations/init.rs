//! Extension and schemas everything else lives in.

use futures::future::BoxFuture;
use hireflow_db::{Ddl, PgConnection, Result};

pub(super) fn up(conn: &mut PgConnection) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        conn.create_extension("uuid-ossp").await?;
        conn.create_schema("service").await?;
        conn.create_schema("flow").await
    })
}
