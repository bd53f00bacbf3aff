use syn::{GenericArgument, PathArguments, Type};

/// Field flavor chosen for a member type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    String,
    Integer,
    Boolean,
    Float,
    Text,
}

impl Flavor {
    /// Name of the `Field` constructor for this flavor.
    pub fn constructor(self) -> &'static str {
        match self {
            Flavor::String => "string",
            Flavor::Integer => "integer",
            Flavor::Boolean => "boolean",
            Flavor::Float => "float",
            Flavor::Text => "text",
        }
    }

    pub fn can_be_primary_key(self) -> bool {
        !matches!(self, Flavor::Boolean | Flavor::Text)
    }
}

/// Maps a Rust member type to its field flavor.
///
/// Returns a tuple containing:
/// 1. The flavor (`String` for anything not numeric or boolean).
/// 2. A boolean indicating if the type is optional (`Option<T>`).
pub fn rust_type_to_flavor(ty: &Type) -> (Flavor, bool) {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            let type_name = segment.ident.to_string();

            // Option<T> is the only way a member can be unset
            if type_name == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner_ty)) = args.args.first() {
                        let (inner, _ignored_optional) = rust_type_to_flavor(inner_ty);
                        return (inner, true);
                    }
                }
            }

            let flavor = match type_name.as_str() {
                "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => Flavor::Integer,
                "bool" => Flavor::Boolean,
                "f32" | "f64" => Flavor::Float,
                _ => Flavor::String,
            };
            return (flavor, false);
        }
    }
    (Flavor::String, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn scalars_map_to_their_flavor() {
        assert_eq!(rust_type_to_flavor(&parse_quote!(i64)), (Flavor::Integer, false));
        assert_eq!(rust_type_to_flavor(&parse_quote!(bool)), (Flavor::Boolean, false));
        assert_eq!(rust_type_to_flavor(&parse_quote!(f64)), (Flavor::Float, false));
        assert_eq!(rust_type_to_flavor(&parse_quote!(String)), (Flavor::String, false));
        assert_eq!(rust_type_to_flavor(&parse_quote!(uuid::Uuid)), (Flavor::String, false));
    }

    #[test]
    fn options_are_unwrapped() {
        assert_eq!(rust_type_to_flavor(&parse_quote!(Option<f32>)), (Flavor::Float, true));
        assert_eq!(rust_type_to_flavor(&parse_quote!(std::option::Option<String>)), (Flavor::String, true));
    }
}
