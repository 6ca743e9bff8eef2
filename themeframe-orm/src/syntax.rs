//! # Syntax Checks
//!
//! Whitelist validators for every identifier, type and literal that ends up
//! concatenated into SQL text. Each check comes in two forms: `is_*` returns a
//! boolean, `check_*` returns a [`ValidationError`] naming the offending value.
//!
//! `is_safe_value` is a blocklist (quotes, backslashes and semicolons), not parameterized
//! query safety. It is the only injection guard on literal values and must be
//! treated as a weak point.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::ValidationError;

/// Longest accepted column / property key.
pub const FIELD_NAME_MAX_LEN: usize = 20;

/// Longest accepted column identifier.
pub const COLUMN_NAME_MAX_LEN: usize = 64;

/// Longest accepted table name (MySQL identifier limit).
pub const TABLE_NAME_MAX_LEN: usize = 64;

/// Largest size an indexable sized type may declare.
pub const INDEXABLE_SIZE_MAX: u32 = 20;

static DATA_TYPE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<int>bigint|int)\((?P<isize>[0-9]{1,3})\)(?: unsigned)?|(?P<char>varchar)\((?P<csize>[0-9]{1,5})\)|(?P<plain>text|tinytext|longtext|datetime))$").ok()
});

/// Parsed parts of an accepted SQL column type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataType {
    pub name: String,
    pub size: Option<u32>,
    pub unsigned: bool,
}

impl DataType {
    /// Parses a whitelisted type such as `varchar(80)` or `bigint(20) unsigned`.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = DATA_TYPE.as_ref()?.captures(input.trim())?;
        if let Some(name) = caps.name("int") {
            let size = caps.name("isize")?.as_str().parse().ok()?;
            return Some(Self { name: name.as_str().to_string(), size: Some(size), unsigned: input.trim().ends_with(" unsigned") });
        }
        if let Some(name) = caps.name("char") {
            let size = caps.name("csize")?.as_str().parse().ok()?;
            return Some(Self { name: name.as_str().to_string(), size: Some(size), unsigned: false });
        }
        caps.name("plain").map(|name| Self { name: name.as_str().to_string(), size: None, unsigned: false })
    }

    pub fn is_indexable(&self) -> bool {
        match self.size {
            Some(size) => size <= INDEXABLE_SIZE_MAX,
            None => self.name == "datetime",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.name.as_str(), "bigint" | "int")
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if let Some(size) = self.size {
            write!(f, "({})", size)?;
        }
        if self.unsigned {
            f.write_str(" unsigned")?;
        }
        Ok(())
    }
}

fn field_name_problem(name: &str, max_len: usize, too_long: &'static str) -> Option<&'static str> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Some("empty"),
        Some(first) if !first.is_ascii_alphabetic() => return Some("must start with a letter"),
        _ => {}
    }
    if name.len() > max_len {
        return Some(too_long);
    }
    if !chars.all(|c| c.is_ascii_alphabetic() || c == '_') {
        return Some("only letters and underscores are allowed");
    }
    None
}

fn table_name_problem(name: &str) -> Option<&'static str> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Some("empty"),
        Some(first) if !first.is_ascii_lowercase() => return Some("must start with a lowercase letter"),
        _ => {}
    }
    if name.len() > TABLE_NAME_MAX_LEN {
        return Some("longer than 64 characters");
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c == '_') {
        return Some("only lowercase letters and underscores are allowed");
    }
    None
}

/// Property key: letters and underscores, at most 20 characters.
pub fn is_field_name(name: &str) -> bool {
    field_name_problem(name, FIELD_NAME_MAX_LEN, "longer than 20 characters").is_none()
}

pub fn check_field_name(name: &str) -> Result<(), ValidationError> {
    match field_name_problem(name, FIELD_NAME_MAX_LEN, "longer than 20 characters") {
        Some(reason) => Err(ValidationError::InvalidFieldName { value: name.to_string(), reason }),
        None => Ok(()),
    }
}

/// Physical column as used by the statement builders: same alphabet as a
/// field name, but prefixed columns such as `{model}_{key}` may reach the
/// identifier limit.
pub fn is_column_name(name: &str) -> bool {
    field_name_problem(name, COLUMN_NAME_MAX_LEN, "longer than 64 characters").is_none()
}

pub fn check_column_name(name: &str) -> Result<(), ValidationError> {
    match field_name_problem(name, COLUMN_NAME_MAX_LEN, "longer than 64 characters") {
        Some(reason) => Err(ValidationError::InvalidFieldName { value: name.to_string(), reason }),
        None => Ok(()),
    }
}

pub fn is_table_name(name: &str) -> bool {
    table_name_problem(name).is_none()
}

pub fn check_table_name(name: &str) -> Result<(), ValidationError> {
    match table_name_problem(name) {
        Some(reason) => Err(ValidationError::InvalidTableName { value: name.to_string(), reason }),
        None => Ok(()),
    }
}

/// MySQL reads `\` as an escape inside string literals, so it is blocked
/// along with quotes.
pub fn is_safe_value(value: &str) -> bool {
    !value.contains(['\'', '"', ';', '\\'])
}

pub fn check_safe_value(value: &str) -> Result<(), ValidationError> {
    if is_safe_value(value) { Ok(()) } else { Err(ValidationError::UnsafeValue(value.to_string())) }
}

pub fn is_data_type(sql_type: &str) -> bool {
    DataType::parse(sql_type).is_some()
}

pub fn check_data_type(sql_type: &str) -> Result<DataType, ValidationError> {
    DataType::parse(sql_type).ok_or_else(|| ValidationError::InvalidDataType(sql_type.to_string()))
}

pub fn is_indexable_data_type(sql_type: &str) -> bool {
    DataType::parse(sql_type).is_some_and(|t| t.is_indexable())
}

pub fn check_indexable_data_type(sql_type: &str) -> Result<DataType, ValidationError> {
    let parsed = check_data_type(sql_type)?;
    if parsed.is_indexable() { Ok(parsed) } else { Err(ValidationError::NotIndexable(sql_type.to_string())) }
}
