//! SQL builder
//!
//! Turns request descriptors into SQL text with positional placeholders
//! (`$1`, `$2`, ...) plus the values bound to them, in order. Pure functions:
//! no I/O and no state. Descriptors are assembled with consuming builder
//! methods and only read afterwards.
//!
//! Filter clauses are caller-supplied SQL text and are used verbatim; the
//! caller numbers their placeholders. The builder checks that numbering
//! against the bound values before anything reaches the server.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

use crate::error::BuilderError;
use crate::ident::{column_ref, qualify, quote_ident, quote_list};
use crate::value::SqlValue;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\d+)").expect("valid regex"));

/// Rendered SQL text plus its ordered parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub values: Vec<SqlValue>,
}

impl Statement {
    /// Literal SQL without parameters (DDL, session commands).
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            values: Vec::new(),
        }
    }

    /// Prepare the statement with every value bound in order.
    pub(crate) fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.values
            .iter()
            .fold(sqlx::query(&self.text), |q, v| v.bind_to(q))
    }
}

/// Column projection of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    Columns(Vec<String>),
}

/// Sort direction of an ORDER BY key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// WHERE clause of a descriptor.
#[derive(Debug, Clone, PartialEq)]
enum Filter {
    /// Caller-written clause, placeholders numbered by the caller
    Clause(String),
    /// `id = $n`, numbered by the builder
    Id(SqlValue),
}

/// SELECT descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectRequest {
    fields: Projection,
    tables: Vec<String>,
    filter: Option<String>,
    values: Vec<SqlValue>,
    order_by: Vec<(String, Direction)>,
    limit: Option<u64>,
}

impl SelectRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            tables: vec![table.into()],
            ..Self::default()
        }
    }

    /// Add another source table (rendered comma-joined).
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.tables.push(table.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Projection::Columns(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filter = Some(clause.into());
        self
    }

    pub fn value(mut self, value: impl Into<SqlValue>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    /// Sort ascending by `column` (may be table-qualified).
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push((column.into(), Direction::Asc));
        self
    }

    pub fn order_by_desc(mut self, column: impl Into<String>) -> Self {
        self.order_by.push((column.into(), Direction::Desc));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `SELECT <fields> FROM <tables> [WHERE ..] [ORDER BY ..] [LIMIT n]`
    pub fn build(&self) -> Result<Statement, BuilderError> {
        if self.tables.is_empty() {
            return Err(BuilderError::EmptyTables);
        }
        let fields = match &self.fields {
            Projection::All => "*".to_owned(),
            Projection::Columns(cols) if cols.is_empty() => {
                return Err(BuilderError::EmptyFields {
                    statement: "SELECT",
                })
            }
            Projection::Columns(cols) => cols
                .iter()
                .map(|c| column_ref(c))
                .collect::<Result<Vec<_>, _>>()?
                .join(", "),
        };
        let tables = self
            .tables
            .iter()
            .map(|t| qualify(t))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");

        let mut text = format!("SELECT {} FROM {}", fields, tables);
        check_placeholders(self.filter.as_deref(), self.values.len(), 0)?;
        if let Some(filter) = &self.filter {
            text.push_str(" WHERE ");
            text.push_str(filter);
        }
        if !self.order_by.is_empty() {
            text.push_str(" ORDER BY ");
            let keys = self
                .order_by
                .iter()
                .map(|(column, direction)| {
                    qualify(column).map(|c| match direction {
                        Direction::Asc => c,
                        Direction::Desc => format!("{} DESC", c),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            text.push_str(&keys.join(", "));
        }
        if let Some(limit) = self.limit {
            text.push_str(&format!(" LIMIT {}", limit));
        }

        Ok(Statement {
            text,
            values: self.values.clone(),
        })
    }
}

/// INSERT descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertRequest {
    table: String,
    fields: Vec<String>,
    values: Vec<SqlValue>,
    returning: Option<String>,
}

impl InsertRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Add one column together with its value.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.fields.push(name.into());
        self.values.push(value.into());
        self
    }

    /// Set the column list; values are supplied separately with [`Self::values`].
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn returning(mut self, column: impl Into<String>) -> Self {
        self.returning = Some(column.into());
        self
    }

    pub fn has_returning(&self) -> bool {
        self.returning.is_some()
    }

    /// `INSERT INTO <table> (<fields>) VALUES ($1, ..) [RETURNING <col>]`
    pub fn build(&self) -> Result<Statement, BuilderError> {
        if self.fields.is_empty() {
            return Err(BuilderError::EmptyFields {
                statement: "INSERT",
            });
        }
        if self.fields.len() != self.values.len() {
            return Err(BuilderError::ArityMismatch {
                fields: self.fields.len(),
                values: self.values.len(),
            });
        }

        let placeholders = (1..=self.values.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let mut text = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            qualify(&self.table)?,
            quote_list(&self.fields)?,
            placeholders
        );
        if let Some(column) = &self.returning {
            text.push_str(" RETURNING ");
            text.push_str(&quote_ident(column)?);
        }

        Ok(Statement {
            text,
            values: self.values.clone(),
        })
    }
}

/// UPDATE descriptor. A filter is mandatory.
///
/// SET values take `$1..$n`; placeholders in a caller-written filter continue
/// from `$n+1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateRequest {
    table: String,
    fields: Vec<String>,
    values: Vec<SqlValue>,
    filter: Option<Filter>,
    filter_values: Vec<SqlValue>,
}

impl UpdateRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.fields.push(field.into());
        self.values.push(value.into());
        self
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filter = Some(Filter::Clause(clause.into()));
        self
    }

    pub fn filter_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.filter_values.push(value.into());
        self
    }

    /// Restrict to the row whose `id` equals `id`.
    pub fn by_id(mut self, id: impl Into<SqlValue>) -> Self {
        self.filter = Some(Filter::Id(id.into()));
        self.filter_values.clear();
        self
    }

    /// `UPDATE <table> SET a = $1, .. WHERE <filter>`
    pub fn build(&self) -> Result<Statement, BuilderError> {
        if self.fields.is_empty() {
            return Err(BuilderError::EmptyFields {
                statement: "UPDATE",
            });
        }
        let assignments = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| quote_ident(f).map(|f| format!("{} = ${}", f, i + 1)))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");

        let (clause, mut values) = render_filter(
            self.filter.as_ref(),
            &self.filter_values,
            self.values.len(),
            "UPDATE",
        )?;
        let mut all = self.values.clone();
        all.append(&mut values);

        Ok(Statement {
            text: format!(
                "UPDATE {} SET {} WHERE {}",
                qualify(&self.table)?,
                assignments,
                clause
            ),
            values: all,
        })
    }
}

/// DELETE descriptor. A filter is mandatory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteRequest {
    table: String,
    filter: Option<Filter>,
    values: Vec<SqlValue>,
}

impl DeleteRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filter = Some(Filter::Clause(clause.into()));
        self
    }

    pub fn value(mut self, value: impl Into<SqlValue>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn by_id(mut self, id: impl Into<SqlValue>) -> Self {
        self.filter = Some(Filter::Id(id.into()));
        self.values.clear();
        self
    }

    /// `DELETE FROM <table> WHERE <filter>`
    pub fn build(&self) -> Result<Statement, BuilderError> {
        let (clause, values) = render_filter(self.filter.as_ref(), &self.values, 0, "DELETE")?;
        Ok(Statement {
            text: format!("DELETE FROM {} WHERE {}", qualify(&self.table)?, clause),
            values,
        })
    }
}

fn render_filter(
    filter: Option<&Filter>,
    values: &[SqlValue],
    offset: usize,
    statement: &'static str,
) -> Result<(String, Vec<SqlValue>), BuilderError> {
    match filter {
        None => Err(BuilderError::MissingFilter { statement }),
        Some(Filter::Id(id)) => Ok((format!("id = ${}", offset + 1), vec![id.clone()])),
        Some(Filter::Clause(clause)) => {
            check_placeholders(Some(clause), offset + values.len(), offset)?;
            Ok((clause.clone(), values.to_vec()))
        }
    }
}

/// Check a filter's placeholders against the bound values.
///
/// Placeholders `$1..=$offset` belong to the builder; every value after them
/// must be referenced by the filter and the filter may not reference a value
/// past `bound`.
fn check_placeholders(
    filter: Option<&str>,
    bound: usize,
    offset: usize,
) -> Result<(), BuilderError> {
    let mut used = BTreeSet::new();
    for cap in PLACEHOLDER.captures_iter(filter.unwrap_or_default()) {
        let index: usize = cap[1].parse().unwrap_or(usize::MAX);
        if index == 0 || index > bound {
            return Err(BuilderError::PlaceholderOutOfRange { index, bound });
        }
        used.insert(index);
    }
    match ((offset + 1)..=bound).find(|i| !used.contains(i)) {
        Some(index) => Err(BuilderError::UnusedValue { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_with_filter() {
        let stmt = SelectRequest::new("t")
            .filter("id = $1")
            .value("abc")
            .build()
            .unwrap();
        assert_eq!(stmt.text, "SELECT * FROM t WHERE id = $1");
        assert_eq!(stmt.values, vec![SqlValue::from("abc")]);
    }

    #[test]
    fn select_fields_from_several_tables() {
        let stmt = SelectRequest::new("flow.tasks")
            .table("service.applicants")
            .fields(["id", "name"])
            .order_by("order")
            .limit(10)
            .build()
            .unwrap();
        assert_eq!(
            stmt.text,
            "SELECT id, name FROM flow.tasks, service.applicants ORDER BY \"order\" LIMIT 10"
        );
        assert!(stmt.values.is_empty());
    }

    #[test]
    fn select_qualified_columns_across_tables() {
        let stmt = SelectRequest::new("flow.tasks")
            .table("service.applicants")
            .fields(["flow.tasks.id", "service.applicants.name"])
            .filter("flow.tasks.applicant = service.applicants.id")
            .order_by("service.applicants.name")
            .build()
            .unwrap();
        assert_eq!(
            stmt.text,
            "SELECT flow.tasks.id, service.applicants.name FROM flow.tasks, service.applicants \
             WHERE flow.tasks.applicant = service.applicants.id ORDER BY service.applicants.name"
        );
    }

    #[test]
    fn select_wildcards_are_not_quoted() {
        let stmt = SelectRequest::new("t").fields(["*"]).build().unwrap();
        assert_eq!(stmt.text, "SELECT * FROM t");

        let stmt = SelectRequest::new("flow.tasks")
            .table("flow.history")
            .fields(["flow.tasks.*", "flow.history.to"])
            .build()
            .unwrap();
        assert_eq!(
            stmt.text,
            "SELECT flow.tasks.*, flow.history.\"to\" FROM flow.tasks, flow.history"
        );
    }

    #[test]
    fn select_orders_by_direction() {
        let stmt = SelectRequest::new("flow.tasks")
            .order_by_desc("created")
            .order_by("id")
            .build()
            .unwrap();
        assert_eq!(stmt.text, "SELECT * FROM flow.tasks ORDER BY created DESC, id");
    }

    #[test]
    fn select_rejects_misnumbered_filter() {
        let err = SelectRequest::new("t")
            .filter("id = $2")
            .value(1)
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::PlaceholderOutOfRange { index: 2, bound: 1 });

        let err = SelectRequest::new("t")
            .filter("id = $1")
            .values([1, 2])
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::UnusedValue { index: 2 });

        let err = SelectRequest::new("t").value(1).build().unwrap_err();
        assert_eq!(err, BuilderError::UnusedValue { index: 1 });
    }

    #[test]
    fn select_allows_reused_placeholder() {
        let stmt = SelectRequest::new("flow.history")
            .filter("\"to\" = $1 OR task = $1")
            .value(uuid::Uuid::nil())
            .build()
            .unwrap();
        assert_eq!(stmt.values.len(), 1);
    }

    #[test]
    fn select_needs_a_table() {
        let req = SelectRequest::default();
        assert_eq!(req.build().unwrap_err(), BuilderError::EmptyTables);
    }

    #[test]
    fn insert_placeholders_follow_field_order() {
        let stmt = InsertRequest::new("service.abilities")
            .fields(["a", "b", "c"])
            .values(["x", "y", "z"])
            .build()
            .unwrap();
        assert_eq!(
            stmt.text,
            "INSERT INTO service.abilities (a, b, c) VALUES ($1, $2, $3)"
        );
        assert_eq!(
            stmt.values,
            vec![SqlValue::from("x"), SqlValue::from("y"), SqlValue::from("z")]
        );
        assert_eq!(PLACEHOLDER.find_iter(&stmt.text).count(), 3);
    }

    #[test]
    fn insert_with_returning_and_quoted_column() {
        let stmt = InsertRequest::new("flow.history")
            .field("task", uuid::Uuid::nil())
            .field("to", uuid::Uuid::nil())
            .returning("id")
            .build()
            .unwrap();
        assert_eq!(
            stmt.text,
            "INSERT INTO flow.history (task, \"to\") VALUES ($1, $2) RETURNING id"
        );
    }

    #[test]
    fn insert_arity_mismatch_is_reported() {
        let err = InsertRequest::new("t")
            .fields(["a", "b"])
            .values([1])
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::ArityMismatch { fields: 2, values: 1 });

        let err = InsertRequest::new("t").build().unwrap_err();
        assert_eq!(err, BuilderError::EmptyFields { statement: "INSERT" });
    }

    #[test]
    fn update_numbers_filter_after_assignments() {
        let stmt = UpdateRequest::new("service.applicants")
            .set("name", "Ada")
            .set("grade", "senior")
            .filter("id = $3")
            .filter_value(uuid::Uuid::nil())
            .build()
            .unwrap();
        assert_eq!(
            stmt.text,
            "UPDATE service.applicants SET name = $1, grade = $2 WHERE id = $3"
        );
        assert_eq!(stmt.values.len(), 3);

        let stmt = UpdateRequest::new("flow.tasks")
            .set("removed", true)
            .by_id(uuid::Uuid::nil())
            .build()
            .unwrap();
        assert_eq!(stmt.text, "UPDATE flow.tasks SET removed = $1 WHERE id = $2");
    }

    #[test]
    fn update_and_delete_require_filter() {
        let err = UpdateRequest::new("t").set("a", 1).build().unwrap_err();
        assert_eq!(err, BuilderError::MissingFilter { statement: "UPDATE" });

        let err = DeleteRequest::new("t").build().unwrap_err();
        assert_eq!(err, BuilderError::MissingFilter { statement: "DELETE" });
    }

    #[test]
    fn delete_by_filter_and_id() {
        let stmt = DeleteRequest::new("service.abilities")
            .filter("applicant = $1 AND skill = $2")
            .value(uuid::Uuid::nil())
            .value(uuid::Uuid::nil())
            .build()
            .unwrap();
        assert_eq!(
            stmt.text,
            "DELETE FROM service.abilities WHERE applicant = $1 AND skill = $2"
        );

        let stmt = DeleteRequest::new("flow.tasks").by_id(5).build().unwrap();
        assert_eq!(stmt.text, "DELETE FROM flow.tasks WHERE id = $1");
        assert_eq!(stmt.values, vec![SqlValue::from(5)]);
    }

    #[test]
    fn identifiers_are_validated() {
        let err = SelectRequest::new("t\"x").build().unwrap_err();
        assert!(matches!(err, BuilderError::InvalidIdentifier { .. }));
    }
}
