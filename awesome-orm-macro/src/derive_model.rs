use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{ext::IdentExt, Attribute, Data, DeriveInput, Expr, Fields, Ident, LitStr, Path, Type};

use crate::types::{rust_type_to_flavor, Flavor};

/// One struct member and its `#[orm(...)]` options.
struct ColumnDef {
    ident: Ident,
    ty: Type,
    attr: String,
    flavor: Flavor,
    optional: bool,
    primary_key: bool,
    name: Option<String>,
    ddl: Option<String>,
    default: Option<Expr>,
    default_fn: Option<Path>,
}

impl ColumnDef {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        let ident = field.ident.clone().ok_or_else(|| syn::Error::new_spanned(field, "Model fields must be named"))?;
        let (flavor, optional) = rust_type_to_flavor(&field.ty);

        let mut def = ColumnDef {
            attr: ident.unraw().to_string(),
            ident,
            ty: field.ty.clone(),
            flavor,
            optional,
            primary_key: false,
            name: None,
            ddl: None,
            default: None,
            default_fn: None,
        };

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("orm")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    def.primary_key = true;
                } else if meta.path.is_ident("text") {
                    def.flavor = Flavor::Text;
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    def.name = Some(value.value());
                } else if meta.path.is_ident("ddl") {
                    let value: LitStr = meta.value()?.parse()?;
                    def.ddl = Some(value.value());
                } else if meta.path.is_ident("default") {
                    def.default = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("default_fn") {
                    def.default_fn = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("unknown orm attribute; expected primary_key, text, name, ddl, default or default_fn"));
                }
                Ok(())
            })?;
        }

        if def.primary_key && !def.flavor.can_be_primary_key() {
            return Err(syn::Error::new_spanned(&def.ident, "boolean and text fields cannot be the primary key"));
        }
        if def.default.is_some() && def.default_fn.is_some() {
            return Err(syn::Error::new_spanned(&def.ident, "use either `default` or `default_fn`, not both"));
        }

        Ok(def)
    }

    fn column(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.attr)
    }

    /// `awesome_orm::Field::string().ddl(..).primary_key()...`
    fn field_expr(&self) -> TokenStream {
        let ctor = format_ident!("{}", self.flavor.constructor());
        let mut expr = quote! { awesome_orm::Field::#ctor() };

        if let Some(ddl) = &self.ddl {
            expr = quote! { #expr.ddl(#ddl) };
        }
        if let Some(name) = &self.name {
            expr = quote! { #expr.named(#name) };
        }
        if self.primary_key {
            expr = quote! { #expr.primary_key() };
        }
        if let Some(default) = &self.default {
            expr = quote! { #expr.with_default(#default) };
        }
        if let Some(factory) = &self.default_fn {
            expr = quote! { #expr.with_default_fn(|| awesome_orm::Value::from(#factory())) };
        }
        expr
    }
}

fn table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut table = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                table = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unknown orm attribute; expected table"))
            }
        })?;
    }
    Ok(table)
}

/// Expands the `#[derive(Model)]` macro.
///
/// Generates the `awesome_orm::Model` impl: cached registration of the declared
/// fields, the value map used for bind arguments, `set_value` and row hydration.
/// Zero or several primary keys are reported as compile errors.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new_spanned(struct_name, "Model must have named fields")),
        },
        _ => return Err(syn::Error::new_spanned(struct_name, "Model must be a struct")),
    };

    let table = table_name(&ast.attrs)?.unwrap_or_else(|| struct_name.to_string());
    let columns = fields.iter().map(ColumnDef::parse).collect::<syn::Result<Vec<_>>>()?;

    let mut keys = columns.iter().filter(|c| c.primary_key);
    if keys.next().is_none() {
        return Err(syn::Error::new_spanned(struct_name, "primary key not found; mark one field with #[orm(primary_key)]"));
    }
    if let Some(duplicate) = keys.next() {
        return Err(syn::Error::new_spanned(&duplicate.ident, "duplicate primary key"));
    }

    let declarations = columns.iter().map(|c| {
        let attr = &c.attr;
        let field = c.field_expr();
        quote! { (#attr, #field) }
    });

    let value_inserts = columns.iter().map(|c| {
        let ident = &c.ident;
        let attr = &c.attr;
        if c.optional {
            quote! {
                if let Some(value) = &self.#ident {
                    map.insert(#attr, awesome_orm::Value::from(value.clone()));
                }
            }
        } else {
            quote! {
                map.insert(#attr, awesome_orm::Value::from(self.#ident.clone()));
            }
        }
    });

    let setters = columns.iter().map(|c| {
        let ident = &c.ident;
        let attr = &c.attr;
        let ty = &c.ty;
        quote! {
            #attr => {
                self.#ident = <#ty as awesome_orm::FromValue>::from_value(value).map_err(|e| e.in_column(#attr))?;
            }
        }
    });

    let hydrate = columns.iter().map(|c| {
        let ident = &c.ident;
        let column = c.column();
        quote! { #ident: row.decode(#column)? }
    });

    Ok(quote! {
        impl awesome_orm::Model for #struct_name {
            fn meta() -> Result<&'static awesome_orm::ModelMeta, awesome_orm::Error> {
                static META: std::sync::OnceLock<Result<awesome_orm::ModelMeta, awesome_orm::ConfigError>> =
                    std::sync::OnceLock::new();

                META.get_or_init(|| awesome_orm::ModelMeta::build(#table, vec![#(#declarations),*]))
                    .as_ref()
                    .map_err(|e| awesome_orm::Error::Config(e.clone()))
            }

            fn values(&self) -> std::collections::HashMap<&'static str, awesome_orm::Value> {
                let mut map = std::collections::HashMap::new();
                #(#value_inserts)*
                map
            }

            fn set_value(&mut self, field: &str, value: awesome_orm::Value) -> Result<(), awesome_orm::Error> {
                match field {
                    #(#setters)*
                    _ => {
                        return Err(awesome_orm::Error::InvalidArgument(format!(
                            "unknown field `{}` on model `{}`",
                            field,
                            #table
                        )));
                    }
                }
                Ok(())
            }

            fn from_row(row: &awesome_orm::Row) -> Result<Self, awesome_orm::Error> {
                Ok(Self {
                    #(#hydrate),*
                })
            }
        }
    })
}
