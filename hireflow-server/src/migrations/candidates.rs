//! Applicants, the skill catalogue and the applicant/skill link table.
//!
//! `service.abilities` rows with `tag = true` are free-form tags rather
//! than skills; both point into `service.skills`.

use futures::future::BoxFuture;
use hireflow_db::{ColumnSpec, Ddl, PgConnection, Result};

use super::UUID_DEFAULT;

fn id() -> (&'static str, ColumnSpec) {
    ("id", ColumnSpec::new("uuid").default_to(UUID_DEFAULT))
}

fn text(name: &'static str) -> (&'static str, ColumnSpec) {
    (name, ColumnSpec::new("text"))
}

pub(super) fn up(conn: &mut PgConnection) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        conn.create_table(
            "service.skills",
            "id",
            &[
                id(),
                ("name", ColumnSpec::new("text").default_to("''")),
                ("tag", ColumnSpec::new("bool").default_to("false")),
            ],
        )
        .await?;

        conn.create_table(
            "service.applicants",
            "id",
            &[
                id(),
                text("vacancy"),
                ("name", ColumnSpec::new("text").default_to("''")),
                ("birthdate", ColumnSpec::new("date")),
                text("description"),
                text("email"),
                text("experience"),
                text("file"),
                text("link"),
                text("notes"),
                text("phone"),
                text("photo"),
                text("position"),
                ("salary", ColumnSpec::new("int4")),
                text("sex"),
                text("telegram"),
                text("vk"),
                ("removed", ColumnSpec::new("bool").default_to("false")),
                ("created", ColumnSpec::new("timestamptz").default_to("now()")),
            ],
        )
        .await?;

        conn.create_table(
            "service.abilities",
            "id",
            &[
                id(),
                ("applicant", ColumnSpec::new("uuid")),
                ("skill", ColumnSpec::new("uuid")),
                ("tag", ColumnSpec::new("bool").default_to("false")),
            ],
        )
        .await?;

        conn.create_relation("service.applicants.id", "service.abilities.applicant")
            .await?;
        conn.create_relation("service.skills.id", "service.abilities.skill")
            .await
    })
}
