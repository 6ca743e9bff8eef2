use syn::{GenericArgument, PathArguments, Type};

/// SQL column type inferred from a Rust field type.
pub struct InferredType {
    pub sql_type: String,
    pub nullable: bool,
}

/// Maps a Rust field type to a whitelisted SQL type.
///
/// `size` only applies to `String`, which defaults to `varchar(255)`.
/// Returns `None` for types without a mapping; those need an explicit
/// `sql_type`.
pub fn rust_type_to_sql(ty: &Type, size: Option<u32>) -> Option<InferredType> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let type_name = segment.ident.to_string();

    if type_name == "Option" {
        if let PathArguments::AngleBracketed(args) = &segment.arguments {
            if let Some(GenericArgument::Type(inner_ty)) = args.args.first() {
                let inner = rust_type_to_sql(inner_ty, size)?;
                return Some(InferredType { sql_type: inner.sql_type, nullable: true });
            }
        }
        return None;
    }

    let sql_type = match type_name.as_str() {
        "i64" => "bigint(20)".to_string(),
        "u64" => "bigint(20) unsigned".to_string(),
        "i32" | "i16" | "i8" => "int(11)".to_string(),
        "u32" | "u16" | "u8" => "int(11) unsigned".to_string(),
        "bool" => "int(1)".to_string(),
        "String" => format!("varchar({})", size.unwrap_or(255)),
        "NaiveDateTime" | "DateTime" => "datetime".to_string(),
        _ => return None,
    };
    Some(InferredType { sql_type, nullable: false })
}
