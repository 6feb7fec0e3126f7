//! Migration registry
//!
//! Every schema change the application needs, in id order. New units are
//! appended with the next id; applied units are never edited.

mod applicant_grade;
mod candidates;
mod flow;
mod init;

use hireflow_db::{Db, Migration, MigrationReport, Result};

/// Default for generated primary keys; the extension lives in `public`.
pub(crate) const UUID_DEFAULT: &str = "public.uuid_generate_v4()";

pub static MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        name: "init",
        up: init::up,
    },
    Migration {
        id: 2,
        name: "candidates",
        up: candidates::up,
    },
    Migration {
        id: 3,
        name: "flow",
        up: flow::up,
    },
    Migration {
        id: 4,
        name: "applicant_grade",
        up: applicant_grade::up,
    },
];

/// Bring the database schema up to date.
pub async fn run(db: &Db) -> Result<MigrationReport> {
    db.migrate(MIGRATIONS).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use hireflow_db::Migrator;

    #[test]
    fn registry_is_valid_and_ordered() {
        let migrator = Migrator::new(MIGRATIONS).expect("valid registry");
        assert_eq!(migrator.ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = MIGRATIONS.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MIGRATIONS.len());
    }
}
