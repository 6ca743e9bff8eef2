//! # StatusValues Derive
//!
//! Implements `themeframe_orm::StatusValues`, `Display` and `FromStr` for unit
//! enums, using the snake case variant names as the stored values.

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let name = &ast.ident;

    let variants = match &ast.data {
        Data::Enum(data_enum) => &data_enum.variants,
        _ => return Err(syn::Error::new_spanned(name, "StatusValues can only be derived for enums")),
    };
    if variants.is_empty() {
        return Err(syn::Error::new_spanned(name, "a status needs at least one value"));
    }

    let mut idents = Vec::with_capacity(variants.len());
    let mut values = Vec::with_capacity(variants.len());
    for variant in variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(variant, "StatusValues variants cannot carry data"));
        }
        idents.push(&variant.ident);
        values.push(variant.ident.to_string().to_snake_case());
    }

    Ok(quote! {
        impl themeframe_orm::StatusValues for #name {
            fn values() -> Vec<&'static str> {
                vec![#(#values),*]
            }
        }

        impl std::fmt::Display for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    #(Self::#idents => f.write_str(#values),)*
                }
            }
        }

        impl std::str::FromStr for #name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    #(#values => Ok(Self::#idents),)*
                    _ => Err(format!("unknown status value: {}", s)),
                }
            }
        }
    })
}
