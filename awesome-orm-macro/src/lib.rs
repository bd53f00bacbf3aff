//! # awesome-orm-macro
//!
//! Procedural macros for awesome-orm.
//!
//! `#[derive(Model)]` registers a struct as a model. Struct-level options:
//!
//! * `#[orm(table = "users")]`: table name (defaults to the struct name).
//!
//! Field-level options:
//!
//! * `primary_key`: exactly one field must carry it.
//! * `name = "column"`: column name (defaults to the field name).
//! * `ddl = "varchar(50)"`: overrides the SQL type literal.
//! * `text`: uses the text field flavor instead of the string one.
//! * `default = <expr>`: value used on insert when an `Option` field is `None`.
//! * `default_fn = path`: function called for that value instead.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod derive_model;
mod types;

#[proc_macro_derive(Model, attributes(orm))]
pub fn model_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_model::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
