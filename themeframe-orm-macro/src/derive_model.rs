//! # Model Derive
//!
//! Expands `#[derive(Model)]` into an `impl themeframe_orm::Model` whose
//! `definition()` registers one property per field.

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, LitInt, LitStr, Path};

use crate::types::rust_type_to_sql;

#[derive(Default)]
struct ModelAttrs {
    name: Option<String>,
    singular: Option<String>,
    plural: Option<String>,
    hierarchical: bool,
    meta: bool,
    types: bool,
}

#[derive(Default)]
struct PropertyAttrs {
    sql_type: Option<String>,
    size: Option<u32>,
    index: bool,
    nullable: bool,
    default: Option<String>,
    singular: Option<String>,
    plural: Option<String>,
    status: Option<Path>,
    primary: bool,
    skip: bool,
}

impl PropertyAttrs {
    /// First attribute that a `status` property would silently ignore.
    fn status_conflict(&self) -> Option<&'static str> {
        [
            ("sql_type", self.sql_type.is_some()),
            ("size", self.size.is_some()),
            ("index", self.index),
            ("nullable", self.nullable),
            ("default", self.default.is_some()),
            ("singular", self.singular.is_some()),
            ("plural", self.plural.is_some()),
        ]
        .into_iter()
        .find_map(|(name, set)| set.then_some(name))
    }
}

fn parse_model_attrs(ast: &DeriveInput) -> syn::Result<ModelAttrs> {
    let mut attrs = ModelAttrs::default();
    for attr in ast.attrs.iter().filter(|a| a.path().is_ident("model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                attrs.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("singular") {
                attrs.singular = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("plural") {
                attrs.plural = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("hierarchical") {
                attrs.hierarchical = true;
            } else if meta.path.is_ident("meta") {
                attrs.meta = true;
            } else if meta.path.is_ident("types") {
                attrs.types = true;
            } else {
                return Err(meta.error("unknown model attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn parse_property_attrs(field: &Field) -> syn::Result<PropertyAttrs> {
    let mut attrs = PropertyAttrs::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("property")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("sql_type") {
                attrs.sql_type = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("size") {
                attrs.size = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("index") {
                attrs.index = true;
            } else if meta.path.is_ident("nullable") {
                attrs.nullable = true;
            } else if meta.path.is_ident("default") {
                attrs.default = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("singular") {
                attrs.singular = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("plural") {
                attrs.plural = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("status") {
                attrs.status = Some(meta.value()?.parse::<Path>()?);
            } else if meta.path.is_ident("primary") {
                attrs.primary = true;
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else {
                return Err(meta.error("unknown property attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn property_tokens(field: &Field, key: &str, attrs: &PropertyAttrs) -> syn::Result<TokenStream> {
    if let Some(status) = &attrs.status {
        if let Some(other) = attrs.status_conflict() {
            return Err(syn::Error::new_spanned(
                status,
                format!("`{}` cannot be combined with `status`; the enum decides type, default and index", other),
            ));
        }
        return Ok(quote! { themeframe_orm::Property::status_from::<#status>(#key)? });
    }

    let (sql_type, inferred_nullable) = match &attrs.sql_type {
        Some(sql_type) => (sql_type.clone(), false),
        None => {
            let inferred = rust_type_to_sql(&field.ty, attrs.size).ok_or_else(|| {
                syn::Error::new_spanned(&field.ty, "no SQL type for this field type; add #[property(sql_type = \"...\")]")
            })?;
            (inferred.sql_type, inferred.nullable)
        }
    };
    let nullable = attrs.nullable || inferred_nullable;
    let index = attrs.index;

    let mut builder = quote! {
        themeframe_orm::PropertyBuilder::new(#key, #sql_type)
            .nullable(#nullable)
            .indexable(#index)
    };
    if let Some(default) = &attrs.default {
        builder = quote! { #builder.default_value(#default) };
    }
    if attrs.singular.is_some() || attrs.plural.is_some() {
        let singular = attrs.singular.clone().unwrap_or_else(|| key.to_string());
        let plural = attrs.plural.clone().unwrap_or_else(|| format!("{}s", singular));
        builder = quote! { #builder.names(#singular, #plural) };
    }
    Ok(quote! { #builder.build()? })
}

pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new_spanned(struct_name, "Model must have named fields")),
        },
        _ => return Err(syn::Error::new_spanned(struct_name, "Model must be a struct")),
    };

    let model_attrs = parse_model_attrs(&ast)?;
    let model_name = model_attrs.name.clone().unwrap_or_else(|| struct_name.to_string()).to_snake_case();

    let mut registrations = Vec::new();
    let mut primary = None;
    for field in fields {
        let Some(ident) = &field.ident else { continue };
        let key = ident.to_string();
        let attrs = parse_property_attrs(field)?;
        if attrs.skip || key == "id" {
            continue;
        }
        if attrs.primary {
            if primary.is_some() {
                return Err(syn::Error::new_spanned(ident, "only one field can be the primary property"));
            }
            primary = Some(key.clone());
        }
        let property = property_tokens(field, &key, &attrs)?;
        registrations.push(quote! { model.register_property(#property)?; });
    }

    let hierarchical = model_attrs.hierarchical;
    let meta = model_attrs.meta;
    let types = model_attrs.types;
    let mut flags = quote! {
        .hierarchical(#hierarchical)
        .supports_meta(#meta)
        .supports_types(#types)
    };
    if model_attrs.singular.is_some() || model_attrs.plural.is_some() {
        let singular = model_attrs.singular.clone().unwrap_or_else(|| model_name.clone());
        let plural = model_attrs.plural.clone().unwrap_or_else(|| format!("{}s", singular));
        flags = quote! { #flags.names(#singular, #plural) };
    }

    let set_primary = primary.map(|key| quote! { model.set_primary_property(#key)?; });

    Ok(quote! {
        impl themeframe_orm::Model for #struct_name {
            fn model_name() -> &'static str {
                #model_name
            }

            fn definition() -> Result<themeframe_orm::CustomModel, themeframe_orm::Error> {
                let mut model = themeframe_orm::CustomModel::new(#model_name)? #flags;
                #(#registrations)*
                #set_primary
                Ok(model)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_of(ast: DeriveInput) -> String {
        match expand(ast) {
            Ok(_) => String::new(),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn status_alone_expands() {
        let ast: DeriveInput = syn::parse_quote! {
            struct Widget {
                #[property(status = WidgetState, primary)]
                state: WidgetState,
            }
        };
        assert!(expand(ast).is_ok());
    }

    #[test]
    fn status_rejects_other_column_attributes() {
        for attrs in [
            quote! { status = WidgetState, nullable },
            quote! { status = WidgetState, default = "draft" },
            quote! { status = WidgetState, index },
            quote! { status = WidgetState, sql_type = "varchar(40)" },
            quote! { status = WidgetState, singular = "State" },
        ] {
            let ast: DeriveInput = syn::parse_quote! {
                struct Widget {
                    #[property(#attrs)]
                    state: WidgetState,
                }
            };
            let message = error_of(ast);
            assert!(message.contains("cannot be combined with `status`"), "{attrs}: {message}");
        }
    }

    #[test]
    fn later_attribute_still_conflicts() {
        let ast: DeriveInput = syn::parse_quote! {
            struct Widget {
                #[property(status = WidgetState)]
                #[property(plural = "States")]
                state: WidgetState,
            }
        };
        assert!(error_of(ast).starts_with("`plural` cannot be combined"));
    }
}
