//! # Model Module
//!
//! [`CustomModel`] aggregates properties into a table schema and owns the
//! naming contract shared by the DDL generator and the table accessors:
//!
//! | item              | name                     |
//! |-------------------|--------------------------|
//! | table             | `{prefix}_{model}s`      |
//! | meta table        | `{prefix}_{model}meta`   |
//! | column            | `{model}_{key}`          |
//! | composite index   | keys joined with `_`     |

use heck::{ToSnakeCase, ToTitleCase};
use serde::Serialize;

use crate::{
    config::SchemaContext,
    error::{Error, ValidationError},
    property::{FormControl, Property},
    syntax::{self, FIELD_NAME_MAX_LEN},
};

/// The core trait for types that declare a model schema.
///
/// Implemented automatically by `#[derive(Model)]`.
///
/// # Example
///
/// ```rust,ignore
/// use themeframe_orm::Model;
///
/// #[derive(Model)]
/// #[model(name = "widget", meta)]
/// struct Widget {
///     #[property(size = 20, index)]
///     title: String,
///     price: i64,
/// }
/// ```
pub trait Model {
    /// Sanitized model name, e.g. `widget`.
    fn model_name() -> &'static str;

    /// Builds the schema definition. Fails on any invalid identifier or type.
    fn definition() -> Result<CustomModel, Error>;
}

/// A declarative table schema: ordered properties plus structural flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomModel {
    name: String,
    singular_name: String,
    plural_name: String,
    properties: Vec<Property>,
    primary_property: Option<String>,
    supports_meta: bool,
    supports_types: bool,
    hierarchical: bool,
    owner: Option<String>,
}

impl CustomModel {
    /// Creates an empty model. The name is converted to snake case and must be a
    /// valid table-name fragment of at most 20 characters.
    pub fn new(name: impl AsRef<str>) -> Result<Self, Error> {
        let name = sanitize_name(name.as_ref())?;
        let singular_name = name.to_title_case();
        let plural_name = format!("{}s", singular_name);
        Ok(Self {
            name,
            singular_name,
            plural_name,
            properties: Vec::new(),
            primary_property: None,
            supports_meta: false,
            supports_types: false,
            hierarchical: false,
            owner: None,
        })
    }

    pub fn names(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        self.singular_name = singular.into();
        self.plural_name = plural.into();
        self
    }

    /// Adds a `{model}_parent` column and key.
    pub fn hierarchical(mut self, hierarchical: bool) -> Self {
        self.hierarchical = hierarchical;
        self
    }

    /// Adds a companion `{prefix}_{model}meta` key/value table.
    pub fn supports_meta(mut self, supports_meta: bool) -> Self {
        self.supports_meta = supports_meta;
        self
    }

    /// Adds a `{model}_type` column and key.
    pub fn supports_types(mut self, supports_types: bool) -> Self {
        self.supports_types = supports_types;
        self
    }

    /// Adds a `{model}_owner` column referencing `owner`'s id.
    pub fn owner(mut self, owner: &CustomModel) -> Self {
        self.owner = Some(owner.name.clone());
        self
    }

    /// Appends a property. Keys must be unique; use
    /// [`replace_property`](Self::replace_property) to redefine one.
    pub fn register_property(&mut self, property: Property) -> Result<&mut Self, Error> {
        if self.property(property.key()).is_some() {
            return Err(ValidationError::DuplicateProperty { model: self.name.clone(), key: property.key().to_string() }.into());
        }
        self.check_column_name(property.key())?;
        if self.primary_property.is_none() {
            self.primary_property = Some(property.key().to_string());
        }
        self.properties.push(property);
        Ok(self)
    }

    /// Chainable form of [`register_property`](Self::register_property).
    pub fn with_property(mut self, property: Property) -> Result<Self, Error> {
        self.register_property(property)?;
        Ok(self)
    }

    /// Overwrites the property with the same key in place, or appends it when
    /// none exists. Returns the previous definition.
    pub fn replace_property(&mut self, property: Property) -> Result<Option<Property>, Error> {
        self.check_column_name(property.key())?;
        let position = self.properties.iter().position(|p| p.key() == property.key());
        match position {
            Some(index) => Ok(Some(std::mem::replace(&mut self.properties[index], property))),
            None => {
                self.register_property(property)?;
                Ok(None)
            }
        }
    }

    pub fn set_primary_property(&mut self, key: &str) -> Result<(), Error> {
        if self.property(key).is_none() {
            return Err(self.unknown(key));
        }
        self.primary_property = Some(key.to_string());
        Ok(())
    }

    pub fn primary_property(&self) -> Option<&Property> {
        self.primary_property.as_deref().and_then(|key| self.property(key))
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.key() == key)
    }

    /// Properties in registration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Properties in registration order, optionally only the indexable ones.
    pub fn get_properties(&self, just_indexables: bool) -> Vec<&Property> {
        self.properties.iter().filter(|p| !just_indexables || p.is_indexable()).collect()
    }

    pub fn register_form_control(&mut self, key: &str, control: FormControl) -> Result<Option<FormControl>, Error> {
        let unknown = self.unknown(key);
        let property = self.properties.iter_mut().find(|p| p.key() == key).ok_or(unknown)?;
        Ok(property.set_form_control(Some(control)))
    }

    pub fn unregister_form_control(&mut self, key: &str) -> Result<Option<FormControl>, Error> {
        let unknown = self.unknown(key);
        let property = self.properties.iter_mut().find(|p| p.key() == key).ok_or(unknown)?;
        Ok(property.set_form_control(None))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn singular_name(&self) -> &str {
        &self.singular_name
    }

    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    pub fn is_hierarchical(&self) -> bool {
        self.hierarchical
    }

    pub fn has_meta(&self) -> bool {
        self.supports_meta
    }

    pub fn has_types(&self) -> bool {
        self.supports_types
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn table_name(&self, ctx: &SchemaContext) -> Result<String, Error> {
        let name = format!("{}_{}s", ctx.prefix, self.name);
        syntax::check_table_name(&name)?;
        Ok(name)
    }

    pub fn meta_table_name(&self, ctx: &SchemaContext) -> Result<String, Error> {
        let name = format!("{}_{}meta", ctx.prefix, self.name);
        syntax::check_table_name(&name)?;
        Ok(name)
    }

    pub fn column_name(&self, key: &str) -> String {
        format!("{}_{}", self.name, key)
    }

    pub fn id_column_name(&self) -> String {
        self.column_name("id")
    }

    pub fn parent_column_name(&self) -> String {
        self.column_name("parent")
    }

    pub fn owner_column_name(&self) -> String {
        self.column_name("owner")
    }

    pub fn type_column_name(&self) -> String {
        self.column_name("type")
    }

    /// Every column name of the model table, in DDL order.
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = vec![self.id_column_name()];
        columns.extend(self.properties.iter().map(|p| self.column_name(p.key())));
        if self.supports_types {
            columns.push(self.type_column_name());
        }
        if self.owner.is_some() {
            columns.push(self.owner_column_name());
        }
        if self.hierarchical {
            columns.push(self.parent_column_name());
        }
        columns
    }

    // `{model}_{key}` has to stay a valid column name, and must not shadow
    // the structural columns.
    fn check_column_name(&self, key: &str) -> Result<(), Error> {
        if matches!(key, "parent" | "owner" | "type") {
            return Err(ValidationError::ReservedKey(key.to_string()).into());
        }
        let column = self.column_name(key);
        if column.len() > syntax::COLUMN_NAME_MAX_LEN {
            return Err(ValidationError::InvalidFieldName { value: column, reason: "column name too long" }.into());
        }
        Ok(())
    }

    fn unknown(&self, key: &str) -> Error {
        ValidationError::UnknownProperty { model: self.name.clone(), key: key.to_string() }.into()
    }
}

fn sanitize_name(raw: &str) -> Result<String, Error> {
    let name = raw.trim().to_snake_case();
    syntax::check_table_name(&name)?;
    if name.len() > FIELD_NAME_MAX_LEN {
        return Err(ValidationError::InvalidTableName { value: name, reason: "model names are limited to 20 characters" }.into());
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> CustomModel {
        CustomModel::new("widget")
            .unwrap()
            .with_property(Property::builder("title", "varchar(20)").indexable(true).build().unwrap())
            .unwrap()
            .with_property(Property::builder("price", "bigint(20)").build().unwrap())
            .unwrap()
    }

    #[test]
    fn names_follow_contract() {
        let ctx = SchemaContext::default();
        let model = widget();
        assert_eq!(model.table_name(&ctx).unwrap(), "wp_tf_widgets");
        assert_eq!(model.meta_table_name(&ctx).unwrap(), "wp_tf_widgetmeta");
        assert_eq!(model.column_name("title"), "widget_title");
        assert_eq!(model.id_column_name(), "widget_id");
        assert_eq!(model.singular_name(), "Widget");
        assert_eq!(model.plural_name(), "Widgets");
    }

    #[test]
    fn name_is_sanitized_and_validated() {
        assert_eq!(CustomModel::new("BlogEntry").unwrap().name(), "blog_entry");
        assert!(CustomModel::new("entry2").is_err());
        assert!(CustomModel::new("a_really_long_model_name").is_err());
        assert!(CustomModel::new("").is_err());
    }

    #[test]
    fn first_property_is_primary() {
        let mut model = widget();
        assert_eq!(model.primary_property().map(|p| p.key()), Some("title"));
        model.set_primary_property("price").unwrap();
        assert_eq!(model.primary_property().map(|p| p.key()), Some("price"));
        assert!(model.set_primary_property("missing").is_err());
    }

    #[test]
    fn duplicate_keys_need_explicit_replace() {
        let mut model = widget();
        let again = Property::builder("title", "varchar(10)").build().unwrap();
        assert!(matches!(
            model.register_property(again.clone()),
            Err(Error::Validation(ValidationError::DuplicateProperty { .. }))
        ));

        let old = model.replace_property(again).unwrap().unwrap();
        assert_eq!(old.sql_type_size(), Some(20));
        assert_eq!(model.properties()[0].sql_type_size(), Some(10));
        assert_eq!(model.properties().len(), 2);
    }

    #[test]
    fn structural_keys_are_reserved() {
        let mut model = widget();
        assert!(model.register_property(Property::builder("parent", "bigint(20)").build().unwrap()).is_err());
    }

    #[test]
    fn indexable_filter_keeps_order() {
        let model = widget()
            .with_property(Property::builder("sku", "varchar(12)").indexable(true).build().unwrap())
            .unwrap();
        let keys: Vec<_> = model.get_properties(true).iter().map(|p| p.key()).collect();
        assert_eq!(keys, ["title", "sku"]);
        assert_eq!(model.get_properties(false).len(), 3);
    }

    #[test]
    fn form_controls_attach_and_detach() {
        use crate::property::ControlKind;

        let mut model = widget();
        let control = FormControl::new(ControlKind::Number, "Price").required(true);
        assert_eq!(model.register_form_control("price", control.clone()).unwrap(), None);
        assert_eq!(model.property("price").unwrap().form_control(), Some(&control));
        assert_eq!(model.unregister_form_control("price").unwrap(), Some(control));
        assert!(model.register_form_control("nope", FormControl::new(ControlKind::Text, "x")).is_err());
    }

    #[test]
    fn column_names_include_structural_columns() {
        let owner = CustomModel::new("shop").unwrap();
        let model = widget().hierarchical(true).supports_types(true).owner(&owner);
        assert_eq!(
            model.column_names(),
            ["widget_id", "widget_title", "widget_price", "widget_type", "widget_owner", "widget_parent"]
        );
        assert_eq!(model.owner_name(), Some("shop"));
    }
}
