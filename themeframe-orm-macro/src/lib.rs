//! # themeframe-orm-macro
//!
//! Procedural macros for themeframe-orm.
//!
//! - `#[derive(Model)]` builds a `CustomModel` definition from a struct.
//! - `#[derive(StatusValues)]` turns a unit enum into the allowed values of a
//!   status property.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod derive_model;
mod derive_status;
mod types;

/// Derives `themeframe_orm::Model`.
///
/// Container attribute `#[model(...)]`:
/// `name = "..."`, `singular = "..."`, `plural = "..."`, `hierarchical`,
/// `meta`, `types`.
///
/// Field attribute `#[property(...)]`:
/// `sql_type = "..."`, `size = N`, `index`, `nullable`, `default = "..."`,
/// `singular = "..."`, `plural = "..."`, `status = EnumType`, `primary`,
/// `skip`. A field named `id` is the generated primary key and is skipped.
#[proc_macro_derive(Model, attributes(model, property))]
pub fn model_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_model::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}

/// Derives `themeframe_orm::StatusValues`, `Display` and `FromStr` for a unit
/// enum. Values are the snake case variant names, in declaration order.
#[proc_macro_derive(StatusValues)]
pub fn status_values_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_status::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
