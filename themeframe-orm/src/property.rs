//! # Property Module
//!
//! A [`Property`] is one typed column of a [`CustomModel`](crate::CustomModel).
//! Properties are built through [`PropertyBuilder`], which validates the key,
//! the SQL type and the default value before anything reaches a model.
//!
//! Status and foreign-reference properties are the same struct with a
//! different [`PropertyKind`]; their constructors fill in the type, index flag
//! and display names.

use heck::ToTitleCase;
use serde::Serialize;

use crate::{
    config::SchemaContext,
    error::{Error, ValidationError},
    model::CustomModel,
    syntax::{self, DataType},
    table::Table,
};

/// Keys that collide with columns every model table already has.
pub const RESERVED_KEYS: &[&str] = &["model_name", "id"];

/// Type and size of every status column.
pub const STATUS_SQL_TYPE: &str = "varchar(20)";

/// Type of every foreign reference column.
pub const FOREIGN_SQL_TYPE: &str = "bigint(20) unsigned";

/// How values of a property are typed on the application side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    Int,
    Text,
}

/// Admin form control kinds a property can be edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlKind {
    Text,
    Textarea,
    Number,
    Select,
    Checkbox,
    Date,
}

/// Descriptor of the form control attached to a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormControl {
    pub kind: ControlKind,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
}

impl FormControl {
    pub fn new(kind: ControlKind, label: impl Into<String>) -> Self {
        Self { kind, label: label.into(), description: None, required: false }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Enumerations usable as the allowed values of a status property.
///
/// Usually implemented with `#[derive(StatusValues)]`.
pub trait StatusValues {
    /// Allowed values in order; the first one is the default.
    fn values() -> Vec<&'static str>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PropertyKind {
    Plain,
    /// Enumerated string column; the first value is the default.
    Status { values: Vec<String> },
    /// Reference to the id column of another table.
    Foreign { table: String, id_column: String },
}

/// A single typed column definition of a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    key: String,
    data_type: DataType,
    value_kind: ValueKind,
    singular_name: String,
    plural_name: String,
    nullable: bool,
    indexable: bool,
    default_value: Option<String>,
    form_control: Option<FormControl>,
    kind: PropertyKind,
}

impl Property {
    pub fn builder(key: impl Into<String>, sql_type: impl Into<String>) -> PropertyBuilder {
        PropertyBuilder::new(key, sql_type)
    }

    /// Status property over `values`; the first value becomes the default.
    pub fn status<S: AsRef<str>>(key: impl Into<String>, values: &[S]) -> Result<Self, Error> {
        let key = key.into();
        let values: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        let first = values.first().cloned().ok_or_else(|| ValidationError::EmptyStatus(key.clone()))?;
        for value in &values {
            check_status_value(value)?;
        }

        let mut property = PropertyBuilder::new(key, STATUS_SQL_TYPE)
            .indexable(true)
            .default_value(first)
            .form_control(FormControl::new(ControlKind::Select, ""))
            .build()?;
        if let Some(control) = property.form_control.as_mut() {
            control.label = property.singular_name.clone();
        }
        property.kind = PropertyKind::Status { values };
        Ok(property)
    }

    /// Status property whose values come from a [`StatusValues`] enumeration.
    pub fn status_from<E: StatusValues>(key: impl Into<String>) -> Result<Self, Error> {
        Self::status(key, &E::values())
    }

    /// Reference to the rows of another custom model.
    pub fn foreign_instance(key: impl Into<String>, model: &CustomModel, ctx: &SchemaContext) -> Result<Self, Error> {
        let mut property = PropertyBuilder::new(key, FOREIGN_SQL_TYPE)
            .indexable(true)
            .names(model.singular_name(), model.plural_name())
            .build()?;
        property.kind = PropertyKind::Foreign { table: model.table_name(ctx)?, id_column: model.id_column_name() };
        Ok(property)
    }

    /// Reference to the id column of any bound table (built-in or third party).
    pub fn foreign_property(key: impl Into<String>, table: &Table) -> Result<Self, Error> {
        let singular = table.singular_label();
        let plural = format!("{}s", singular);
        let mut property = PropertyBuilder::new(key, FOREIGN_SQL_TYPE)
            .indexable(true)
            .names(singular, plural)
            .build()?;
        property.kind = PropertyKind::Foreign { table: table.name().to_string(), id_column: table.id_column_name().to_string() };
        Ok(property)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Base SQL type without size, e.g. `varchar`.
    pub fn sql_type(&self) -> &str {
        &self.data_type.name
    }

    pub fn sql_type_size(&self) -> Option<u32> {
        self.data_type.size
    }

    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    pub fn singular_name(&self) -> &str {
        &self.singular_name
    }

    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_indexable(&self) -> bool {
        self.indexable
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn form_control(&self) -> Option<&FormControl> {
        self.form_control.as_ref()
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    /// Allowed values of a status property; empty for other kinds.
    pub fn status_values(&self) -> &[String] {
        match &self.kind {
            PropertyKind::Status { values } => values,
            _ => &[],
        }
    }

    /// Appends an allowed value to a status property.
    pub fn add_status_value(&mut self, value: impl Into<String>) -> Result<(), Error> {
        let value = value.into();
        check_status_value(&value)?;
        match &mut self.kind {
            PropertyKind::Status { values } => {
                if !values.contains(&value) {
                    values.push(value);
                }
                Ok(())
            }
            _ => Err(Error::Config(format!("property `{}` is not a status property", self.key))),
        }
    }

    /// Removes an allowed value; the default follows the new first value.
    pub fn remove_status_value(&mut self, value: &str) -> Result<(), Error> {
        let PropertyKind::Status { values } = &mut self.kind else {
            return Err(Error::Config(format!("property `{}` is not a status property", self.key)));
        };
        if values.len() == 1 && values[0] == value {
            return Err(ValidationError::EmptyStatus(self.key.clone()).into());
        }
        values.retain(|v| v != value);
        self.default_value = values.first().cloned();
        Ok(())
    }

    pub(crate) fn set_form_control(&mut self, control: Option<FormControl>) -> Option<FormControl> {
        std::mem::replace(&mut self.form_control, control)
    }
}

fn check_status_value(value: &str) -> Result<(), ValidationError> {
    syntax::check_safe_value(value)?;
    if value.is_empty() || value.len() > 20 {
        return Err(ValidationError::InvalidDataType(format!("status value `{}` does not fit {}", value, STATUS_SQL_TYPE)));
    }
    Ok(())
}

/// Builder for [`Property`]; all validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct PropertyBuilder {
    key: String,
    sql_type: String,
    singular_name: Option<String>,
    plural_name: Option<String>,
    nullable: bool,
    indexable: bool,
    default_value: Option<String>,
    form_control: Option<FormControl>,
}

impl PropertyBuilder {
    pub fn new(key: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sql_type: sql_type.into(),
            singular_name: None,
            plural_name: None,
            nullable: false,
            indexable: false,
            default_value: None,
            form_control: None,
        }
    }

    pub fn names(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        self.singular_name = Some(singular.into());
        self.plural_name = Some(plural.into());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn indexable(mut self, indexable: bool) -> Self {
        self.indexable = indexable;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn form_control(mut self, control: FormControl) -> Self {
        self.form_control = Some(control);
        self
    }

    pub fn build(self) -> Result<Property, Error> {
        syntax::check_field_name(&self.key)?;
        let key = self.key.to_lowercase();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(ValidationError::ReservedKey(key).into());
        }

        let data_type = if self.indexable {
            syntax::check_indexable_data_type(&self.sql_type)?
        } else {
            syntax::check_data_type(&self.sql_type)?
        };
        let value_kind = if data_type.is_integer() { ValueKind::Int } else { ValueKind::Text };

        if let Some(default) = &self.default_value {
            syntax::check_safe_value(default)?;
            if value_kind == ValueKind::Int && default.parse::<i64>().is_err() {
                return Err(ValidationError::UnsafeValue(default.clone()).into());
            }
        }

        let singular_name = self.singular_name.unwrap_or_else(|| key.to_title_case());
        let plural_name = self.plural_name.unwrap_or_else(|| format!("{}s", singular_name));

        Ok(Property {
            key,
            data_type,
            value_kind,
            singular_name,
            plural_name,
            nullable: self.nullable,
            indexable: self.indexable,
            default_value: self.default_value,
            form_control: self.form_control,
            kind: PropertyKind::Plain,
        })
    }
}
