//! Identifier rendering
//!
//! Table, schema and column names are the only caller-supplied text that is
//! interpolated into SQL. They must come from code, never from requests.
//! A name is left bare when it is a plain lower-case word outside the
//! reserved keyword classes, and double-quoted otherwise. This is close to
//! PostgreSQL's `quote_ident()` but not identical: non-reserved column-name
//! keywords (`between`, `time`, `values`, ...) stay bare, which the server
//! accepts as table and column names.

use crate::error::BuilderError;

/// Keywords that cannot appear bare as a table or column name
/// (PostgreSQL "reserved" and "reserved (can be function or type)" classes).
const RESERVED: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant",
    "group", "having", "ilike", "in", "initially", "inner", "intersect", "into", "is",
    "isnull", "join", "lateral", "leading", "left", "like", "limit", "localtime",
    "localtimestamp", "natural", "not", "notnull", "null", "offset", "on", "only", "or",
    "order", "outer", "overlaps", "placing", "primary", "references", "returning", "right",
    "select", "session_user", "similar", "some", "symmetric", "system_user", "table",
    "tablesample", "then", "to", "trailing", "true", "union", "unique", "user", "using",
    "variadic", "verbose", "when", "where", "window", "with",
];

/// Render one identifier segment.
///
/// `applicants` stays bare, `to` becomes `"to"`, `createdAt` becomes `"createdAt"`.
pub fn quote_ident(name: &str) -> Result<String, BuilderError> {
    validate(name)?;
    if is_bare(name) {
        Ok(name.to_owned())
    } else {
        Ok(format!("\"{}\"", name))
    }
}

/// Render a possibly schema-qualified name: `service.applicants`.
///
/// Every dot-separated segment is rendered with [`quote_ident`].
pub fn qualify(name: &str) -> Result<String, BuilderError> {
    let parts = name
        .split('.')
        .map(quote_ident)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("."))
}

/// Render a column reference: `name`, `table.name`, `schema.table.name`,
/// or a wildcard (`*`, `schema.table.*`).
pub fn column_ref(name: &str) -> Result<String, BuilderError> {
    if name == "*" {
        return Ok("*".to_owned());
    }
    match name.strip_suffix(".*") {
        Some(table) => Ok(format!("{}.*", qualify(table)?)),
        None => qualify(name),
    }
}

/// Render a comma separated list of plain identifiers.
pub fn quote_list<S: AsRef<str>>(names: &[S]) -> Result<String, BuilderError> {
    let parts = names
        .iter()
        .map(|n| quote_ident(n.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(", "))
}

/// Split `schema.table.column` at the last dot into the table and the column.
pub fn split_column_path(path: &str) -> Result<(&str, &str), BuilderError> {
    match path.rsplit_once('.') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() => Ok((table, column)),
        _ => Err(BuilderError::InvalidIdentifier {
            name: path.to_owned(),
            reason: "expected <table>.<column>",
        }),
    }
}

fn validate(name: &str) -> Result<(), BuilderError> {
    let reason = if name.is_empty() {
        "empty identifier"
    } else if name.contains('"') || name.contains('\0') {
        "contains a double quote or NUL character"
    } else {
        return Ok(());
    };
    Err(BuilderError::InvalidIdentifier {
        name: name.to_owned(),
        reason,
    })
}

fn is_bare(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    first_ok
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !RESERVED.contains(&name)
}
