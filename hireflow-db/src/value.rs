//! Bindable parameter values
//!
//! Every variant carries an `Option` so a NULL keeps its PostgreSQL type:
//! `SqlValue::from(None::<Uuid>)` binds a `uuid` NULL, which a `uuid`
//! column accepts where an untyped text NULL would be rejected.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use sqlx::types::Json;
use uuid::Uuid;

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Uuid(Option<Uuid>),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
    Json(Option<JsonValue>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        match self {
            Self::Bool(v) => v.is_none(),
            Self::Int(v) => v.is_none(),
            Self::BigInt(v) => v.is_none(),
            Self::Float(v) => v.is_none(),
            Self::Text(v) => v.is_none(),
            Self::Uuid(v) => v.is_none(),
            Self::Date(v) => v.is_none(),
            Self::Timestamp(v) => v.is_none(),
            Self::Json(v) => v.is_none(),
        }
    }

    /// Attach this value as the next positional argument of `query`.
    pub(crate) fn bind_to<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            Self::Bool(v) => query.bind(*v),
            Self::Int(v) => query.bind(*v),
            Self::BigInt(v) => query.bind(*v),
            Self::Float(v) => query.bind(*v),
            Self::Text(v) => query.bind(v.clone()),
            Self::Uuid(v) => query.bind(*v),
            Self::Date(v) => query.bind(*v),
            Self::Timestamp(v) => query.bind(*v),
            Self::Json(v) => query.bind(v.clone().map(Json)),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for SqlValue {
            fn from(v: $ty) -> Self {
                Self::$variant(Some(v))
            }
        }

        impl From<Option<$ty>> for SqlValue {
            fn from(v: Option<$ty>) -> Self {
                Self::$variant(v)
            }
        }
    };
}

impl_from!(Bool, bool);
impl_from!(Int, i32);
impl_from!(BigInt, i64);
impl_from!(Float, f64);
impl_from!(Text, String);
impl_from!(Uuid, Uuid);
impl_from!(Date, NaiveDate);
impl_from!(Timestamp, DateTime<Utc>);
impl_from!(Json, JsonValue);

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(Some(v.to_owned()))
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(v: Option<&str>) -> Self {
        Self::Text(v.map(str::to_owned))
    }
}
