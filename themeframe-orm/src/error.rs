//! # Error Module
//!
//! Error types for themeframe-orm. Validation and clause errors are programmer
//! errors raised at the point of misuse; migration and database errors come
//! from applying SQL to a live connection.

use thiserror::Error;

/// An identifier, type or literal was rejected before any SQL was built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid field name `{value}`: {reason}")]
    InvalidFieldName { value: String, reason: &'static str },

    #[error("invalid table name `{value}`: {reason}")]
    InvalidTableName { value: String, reason: &'static str },

    #[error("unsupported SQL data type `{0}`")]
    InvalidDataType(String),

    #[error("data type `{0}` cannot be part of an index")]
    NotIndexable(String),

    #[error("unsafe value `{0}`: quotes, backslashes and semicolons are not allowed")]
    UnsafeValue(String),

    #[error("number `{0}` has no SQL literal")]
    NonFiniteNumber(String),

    #[error("property key `{0}` is reserved")]
    ReservedKey(String),

    #[error("model `{model}` already has a property `{key}`")]
    DuplicateProperty { model: String, key: String },

    #[error("model `{model}` has no property `{key}`")]
    UnknownProperty { model: String, key: String },

    #[error("status property `{0}` needs at least one value")]
    EmptyStatus(String),

    #[error("statement on `{0}` needs at least one column")]
    EmptyColumnList(String),

    #[error("expected {expected} values, got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },

    #[error("IN list for `{0}` is empty")]
    EmptyInList(String),
}

/// A WHERE, SET or VALUES clause was driven into an invalid state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClauseError {
    #[error("predicate added without AND/OR after a complete condition")]
    MissingConjunction,

    #[error("condition ends with a dangling AND/OR")]
    DanglingConjunction,

    #[error("AND/OR used before any condition")]
    NothingToJoin,

    #[error("VALUES clause already set")]
    ValuesAlreadySet,

    #[error("statement has no VALUES clause")]
    MissingValues,

    #[error("statement requires a WHERE condition")]
    MissingWhere,

    #[error("UPDATE has no SET assignments")]
    MissingSet,
}

/// Top-level error returned by themeframe-orm operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Clause(#[from] ClauseError),

    #[error("migration statement failed: {reason}\n{statement}")]
    Migration { statement: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub(crate) fn migration(statement: impl Into<String>, reason: impl ToString) -> Self {
        Error::Migration { statement: statement.into(), reason: reason.to_string() }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
