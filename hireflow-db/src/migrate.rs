//! Forward-only migration runner.
//!
//! Migration units are registered statically as an ordered list of
//! functions keyed by a positive integer id. The ledger table
//! `public.migrations` records every id that has been applied; it is
//! created on first use. Each run applies the unrecorded units in ascending
//! id order and appends them to the ledger one by one.
//!
//! A failing unit stops the run. It is not recorded, so the next run starts
//! again from that unit. Statements the unit already committed stay
//! committed. Only one runner may work on a database at a time.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::ddl::ColumnSpec;
use crate::error::{DbError, Result};
use crate::pool::Db;
use crate::sql::{InsertRequest, SelectRequest};

/// Ledger table, schema-qualified.
pub const LEDGER_TABLE: &str = "public.migrations";

/// Body of a migration unit; runs on a borrowed connection.
pub type MigrationFn = for<'c> fn(&'c mut PgConnection) -> BoxFuture<'c, Result<()>>;

/// A numbered schema or data change.
#[derive(Clone, Copy)]
pub struct Migration {
    pub id: i32,
    pub name: &'static str,
    pub up: MigrationFn,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Storage the runner reads applied ids from and applies units against.
#[async_trait]
pub trait MigrationLedger: Sync {
    /// Ids recorded as applied. Creates the ledger when it does not exist.
    async fn applied(&self) -> Result<Vec<i32>>;

    /// Execute one unit's body.
    async fn apply(&self, unit: &Migration) -> Result<()>;

    /// Append `id` to the ledger.
    async fn record(&self, id: i32) -> Result<()>;
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Ids applied by this run, in order
    pub applied: Vec<i32>,
    /// Units that were already in the ledger
    pub skipped: usize,
}

/// Ordered, validated set of units.
#[derive(Debug)]
pub struct Migrator<'m> {
    units: Vec<&'m Migration>,
}

impl<'m> Migrator<'m> {
    /// Sort `units` by id, rejecting non-positive and duplicate ids.
    pub fn new(units: &'m [Migration]) -> Result<Self> {
        let mut seen = HashSet::new();
        for unit in units {
            if unit.id <= 0 {
                return Err(DbError::MigrationSet {
                    reason: format!("migration '{}' has non-positive id {}", unit.name, unit.id),
                });
            }
            if !seen.insert(unit.id) {
                return Err(DbError::MigrationSet {
                    reason: format!("migration id {} is registered twice", unit.id),
                });
            }
        }

        let mut units: Vec<&Migration> = units.iter().collect();
        units.sort_by_key(|u| u.id);
        Ok(Self { units })
    }

    /// Registered ids, ascending.
    pub fn ids(&self) -> Vec<i32> {
        self.units.iter().map(|u| u.id).collect()
    }

    /// Units not in `applied`, ascending.
    pub fn pending(&self, applied: &[i32]) -> Vec<&'m Migration> {
        let applied: HashSet<i32> = applied.iter().copied().collect();
        self.units
            .iter()
            .copied()
            .filter(|u| !applied.contains(&u.id))
            .collect()
    }

    /// Apply every pending unit, in order, stopping at the first failure.
    pub async fn run<L>(&self, ledger: &L) -> Result<MigrationReport>
    where
        L: MigrationLedger + ?Sized,
    {
        info!(migrations = ?self.ids(), "Registered migrations");

        let mut applied = ledger.applied().await?;
        applied.sort_unstable();
        info!(applied = ?applied, "Applied migrations");

        let pending = self.pending(&applied);
        let mut report = MigrationReport {
            applied: Vec::with_capacity(pending.len()),
            skipped: self.units.len() - pending.len(),
        };

        if pending.is_empty() {
            info!("No migrations to apply");
            return Ok(report);
        }

        for unit in pending {
            info!(migration = unit.id, name = unit.name, "Applying migration");
            let failed = |source: DbError| DbError::Migration {
                id: unit.id,
                name: unit.name,
                source: Box::new(source),
            };
            ledger.apply(unit).await.map_err(failed)?;
            ledger.record(unit.id).await.map_err(failed)?;
            info!(migration = unit.id, name = unit.name, "Migration applied");
            report.applied.push(unit.id);
        }

        info!(count = report.applied.len(), "All new migrations applied");
        Ok(report)
    }
}

fn ledger_select() -> SelectRequest {
    SelectRequest::new(LEDGER_TABLE).fields(["id"])
}

/// `id` plus a creation timestamp. The primary key is the timestamp column.
fn ledger_columns() -> [(&'static str, ColumnSpec); 2] {
    [
        ("id", ColumnSpec::new("int4")),
        ("timestamp", ColumnSpec::new("timestamp").default_to("now()")),
    ]
}

#[async_trait]
impl MigrationLedger for Db {
    async fn applied(&self) -> Result<Vec<i32>> {
        let rows = match self.select_array::<Option<i32>>(&ledger_select()).await {
            Ok(rows) => rows,
            Err(err) if err.is_undefined_table() => {
                info!(table = LEDGER_TABLE, "Ledger table missing, creating it");
                self.create_table(LEDGER_TABLE, "timestamp", &ledger_columns())
                    .await?;
                self.select_array::<Option<i32>>(&ledger_select()).await?
            }
            Err(err) => return Err(err),
        };
        Ok(rows.into_iter().flatten().flatten().collect())
    }

    async fn apply(&self, unit: &Migration) -> Result<()> {
        let up = unit.up;
        self.wrap(move |conn| up(conn)).await
    }

    async fn record(&self, id: i32) -> Result<()> {
        self.insert(&InsertRequest::new(LEDGER_TABLE).field("id", id))
            .await
            .map(|_| ())
    }
}

impl Db {
    /// Ids recorded in the ledger, read without creating it.
    ///
    /// A database that has no ledger table yet reports nothing applied.
    pub async fn recorded_migrations(&self) -> Result<Vec<i32>> {
        match self.select_array::<Option<i32>>(&ledger_select()).await {
            Ok(rows) => Ok(rows.into_iter().flatten().flatten().collect()),
            Err(err) if err.is_undefined_table() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Apply the pending units of `units` against this database.
    pub async fn migrate(&self, units: &[Migration]) -> Result<MigrationReport> {
        Migrator::new(units)?.run(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn noop(_conn: &mut PgConnection) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn unit(id: i32) -> Migration {
        Migration {
            id,
            name: "unit",
            up: noop,
        }
    }

    /// In-memory ledger; records which bodies ran instead of running them.
    ///
    /// Starts without a ledger table unless built with `with_applied`.
    /// Recording into a missing table fails the way the server would.
    #[derive(Default)]
    struct FakeLedger {
        exists: Mutex<bool>,
        created: Mutex<bool>,
        ledger: Mutex<Vec<i32>>,
        executed: Mutex<Vec<i32>>,
        fail_on: Option<i32>,
    }

    impl FakeLedger {
        fn with_applied(ids: &[i32]) -> Self {
            Self {
                exists: Mutex::new(true),
                ledger: Mutex::new(ids.to_vec()),
                ..Self::default()
            }
        }

        fn ledger(&self) -> Vec<i32> {
            self.ledger.lock().unwrap().clone()
        }

        fn executed(&self) -> Vec<i32> {
            self.executed.lock().unwrap().clone()
        }

        fn created(&self) -> bool {
            *self.created.lock().unwrap()
        }
    }

    #[async_trait]
    impl MigrationLedger for FakeLedger {
        async fn applied(&self) -> Result<Vec<i32>> {
            let mut exists = self.exists.lock().unwrap();
            if !*exists {
                *exists = true;
                *self.created.lock().unwrap() = true;
            }
            Ok(self.ledger())
        }

        async fn apply(&self, unit: &Migration) -> Result<()> {
            self.executed.lock().unwrap().push(unit.id);
            if self.fail_on == Some(unit.id) {
                return Err(DbError::not_found("table", "service.applicants"));
            }
            Ok(())
        }

        async fn record(&self, id: i32) -> Result<()> {
            if !*self.exists.lock().unwrap() {
                return Err(DbError::not_found("table", LEDGER_TABLE));
            }
            self.ledger.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn applies_only_missing_units_exactly_once() {
        let units = [unit(1), unit(2), unit(3), unit(4)];
        let ledger = FakeLedger::with_applied(&[1, 2]);
        let migrator = Migrator::new(&units).unwrap();

        let report = migrator.run(&ledger).await.unwrap();
        assert_eq!(report.applied, vec![3, 4]);
        assert_eq!(report.skipped, 2);
        assert_eq!(ledger.executed(), vec![3, 4]);
        assert_eq!(ledger.ledger(), vec![1, 2, 3, 4]);

        let report = migrator.run(&ledger).await.unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.skipped, 4);
        assert_eq!(ledger.executed(), vec![3, 4]);
    }

    #[tokio::test]
    async fn bootstraps_missing_ledger() {
        let units = [unit(1)];
        let ledger = FakeLedger::default();

        assert!(!ledger.created());

        let report = Migrator::new(&units).unwrap().run(&ledger).await.unwrap();
        assert!(ledger.created());
        assert_eq!(report.applied, vec![1]);
        assert_eq!(ledger.ledger(), vec![1]);
    }

    #[tokio::test]
    async fn existing_ledger_is_not_recreated() {
        let units = [unit(1), unit(2)];
        let ledger = FakeLedger::with_applied(&[1]);

        let report = Migrator::new(&units).unwrap().run(&ledger).await.unwrap();
        assert!(!ledger.created());
        assert_eq!(report.applied, vec![2]);
        assert_eq!(ledger.ledger(), vec![1, 2]);
    }

    #[tokio::test]
    async fn order_is_numeric_not_registration_order() {
        let units = [unit(10), unit(2), unit(1)];
        let ledger = FakeLedger::default();

        Migrator::new(&units).unwrap().run(&ledger).await.unwrap();
        assert_eq!(ledger.executed(), vec![1, 2, 10]);
        assert_eq!(ledger.ledger(), vec![1, 2, 10]);
    }

    #[tokio::test]
    async fn failure_halts_and_rerun_resumes() {
        let units = [unit(1), unit(2), unit(3)];
        let ledger = FakeLedger {
            fail_on: Some(2),
            ..FakeLedger::default()
        };
        let migrator = Migrator::new(&units).unwrap();

        let err = migrator.run(&ledger).await.unwrap_err();
        assert!(matches!(err, DbError::Migration { id: 2, .. }));
        assert_eq!(ledger.ledger(), vec![1]);
        assert_eq!(ledger.executed(), vec![1, 2]);

        let fixed = FakeLedger::with_applied(&ledger.ledger());
        let report = migrator.run(&fixed).await.unwrap();
        assert_eq!(report.applied, vec![2, 3]);
        assert_eq!(fixed.executed(), vec![2, 3]);
        assert_eq!(fixed.ledger(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn empty_registry_is_a_noop() {
        let ledger = FakeLedger::with_applied(&[1]);
        let report = Migrator::new(&[]).unwrap().run(&ledger).await.unwrap();
        assert_eq!(report, MigrationReport { applied: vec![], skipped: 0 });
        assert!(ledger.executed().is_empty());
    }

    #[test]
    fn rejects_invalid_ids() {
        let err = Migrator::new(&[unit(1), unit(1)]).unwrap_err();
        assert!(err.to_string().contains("registered twice"));

        let err = Migrator::new(&[unit(0)]).unwrap_err();
        assert!(err.to_string().contains("non-positive"));
    }

    #[test]
    fn pending_ignores_unknown_ledger_ids() {
        let units = [unit(1), unit(3)];
        let migrator = Migrator::new(&units).unwrap();
        let pending: Vec<i32> = migrator.pending(&[1, 2, 99]).iter().map(|u| u.id).collect();
        assert_eq!(pending, vec![3]);
    }

    #[test]
    fn ledger_query_shape() {
        let stmt = ledger_select().build().unwrap();
        assert_eq!(stmt.text, "SELECT id FROM public.migrations");
    }
}
