//! # Configuration
//!
//! [`SchemaContext`] carries the naming and charset settings every schema and
//! statement component needs. It is built once at application start and passed
//! explicitly; there is no global instance.

use serde::{Deserialize, Serialize};
use std::env;

use crate::{error::Error, syntax};

pub const DEFAULT_PREFIX: &str = "wp_tf";
pub const DEFAULT_HOST_PREFIX: &str = "wp_";
pub const DEFAULT_CHARSET: &str = "utf8mb4";
pub const DEFAULT_COLLATE: &str = "utf8mb4_unicode_520_ci";

/// Table naming and charset settings shared by models, DDL and tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaContext {
    /// Prefix of every framework-owned table, without the trailing underscore.
    pub prefix: String,
    /// Prefix of the host's built-in tables, including the trailing underscore.
    pub host_prefix: String,
    pub charset: String,
    pub collate: String,
}

impl Default for SchemaContext {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            host_prefix: DEFAULT_HOST_PREFIX.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            collate: DEFAULT_COLLATE.to_string(),
        }
    }
}

impl SchemaContext {
    pub fn builder() -> SchemaContextBuilder {
        SchemaContextBuilder::default()
    }

    /// Loads `.env` if present, then reads `THEMEFRAME_PREFIX`,
    /// `THEMEFRAME_HOST_PREFIX`, `THEMEFRAME_CHARSET` and `THEMEFRAME_COLLATE`,
    /// falling back to the defaults for unset variables.
    pub fn from_env() -> Result<Self, Error> {
        dotenvy::dotenv().ok();
        let mut builder = Self::builder();
        if let Ok(prefix) = env::var("THEMEFRAME_PREFIX") {
            builder = builder.prefix(prefix);
        }
        if let Ok(host_prefix) = env::var("THEMEFRAME_HOST_PREFIX") {
            builder = builder.host_prefix(host_prefix);
        }
        if let Ok(charset) = env::var("THEMEFRAME_CHARSET") {
            builder = builder.charset(charset);
        }
        if let Ok(collate) = env::var("THEMEFRAME_COLLATE") {
            builder = builder.collate(collate);
        }
        builder.build()
    }

    /// Trailing clause of every `CREATE TABLE`, as the host's
    /// `get_charset_collate()` would produce it.
    pub fn charset_collate(&self) -> String {
        let mut clause = String::new();
        if !self.charset.is_empty() {
            clause.push_str("DEFAULT CHARACTER SET ");
            clause.push_str(&self.charset);
        }
        if !self.collate.is_empty() {
            if !clause.is_empty() {
                clause.push(' ');
            }
            clause.push_str("COLLATE ");
            clause.push_str(&self.collate);
        }
        clause
    }

    /// `{prefix}_`, the marker of every framework-owned table.
    pub fn table_marker(&self) -> String {
        format!("{}_", self.prefix)
    }

    /// True when every host table would also carry the framework marker,
    /// e.g. prefix `wp` with host prefix `wp_`.
    pub fn claims_host_tables(&self) -> bool {
        self.host_prefix.starts_with(&self.table_marker())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaContextBuilder {
    prefix: Option<String>,
    host_prefix: Option<String>,
    charset: Option<String>,
    collate: Option<String>,
}

impl SchemaContextBuilder {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn host_prefix(mut self, host_prefix: impl Into<String>) -> Self {
        self.host_prefix = Some(host_prefix.into());
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    /// Validates the prefixes and the charset/collation names.
    pub fn build(self) -> Result<SchemaContext, Error> {
        let defaults = SchemaContext::default();
        let ctx = SchemaContext {
            prefix: self.prefix.unwrap_or(defaults.prefix),
            host_prefix: self.host_prefix.unwrap_or(defaults.host_prefix),
            charset: self.charset.unwrap_or(defaults.charset),
            collate: self.collate.unwrap_or(defaults.collate),
        };

        syntax::check_table_name(&ctx.prefix)?;
        if ctx.prefix.ends_with('_') {
            return Err(Error::Config(format!("prefix `{}` must not end with an underscore", ctx.prefix)));
        }
        if !ctx.host_prefix.ends_with('_') {
            return Err(Error::Config(format!("host prefix `{}` must end with an underscore", ctx.host_prefix)));
        }
        syntax::check_table_name(&ctx.host_prefix)?;
        if ctx.claims_host_tables() {
            return Err(Error::Config(format!(
                "prefix `{}` would claim every `{}` host table",
                ctx.prefix, ctx.host_prefix
            )));
        }

        for (label, value) in [("charset", &ctx.charset), ("collate", &ctx.collate)] {
            if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::Config(format!("{} `{}` contains invalid characters", label, value)));
            }
        }

        Ok(ctx)
    }
}
