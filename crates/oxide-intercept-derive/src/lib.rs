//! Derive macro for exposing struct fields to the interception walker.
//!
//! This crate provides the `#[derive(Record)]` macro, which implements
//! `oxide_intercept::Record` so that fields can be read and replaced by name.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Type, parse_macro_input};

/// Derives the `Record` trait for a struct with named fields.
///
/// # Attributes
///
/// - `#[record(rename_all = "camelCase")]` - Naming convention for exposed
///   field names: `"camelCase"` (default) or `"snake_case"` (field names as
///   written)
///
/// # Field Attributes
///
/// - `#[record(rename = "name")]` - Exposes the field under an explicit name
/// - `#[record(skip)]` - Hides the field from interception
///
/// Every exposed field type must implement `ToSqlValue` and `FromSqlValue`.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_record_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_record_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Record derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Record derive only supports structs",
            ));
        }
    };

    let convention = parse_container_attrs(&input.attrs)?;

    // Collect field information
    let mut field_infos: Vec<FieldInfo> = Vec::new();
    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let rust_name = field_ident.to_string();
        let rust_name = rust_name.trim_start_matches("r#");
        let exposed_name = attrs.rename.unwrap_or_else(|| match convention {
            Convention::CamelCase => to_camel_case(rust_name),
            Convention::SnakeCase => rust_name.to_string(),
        });
        field_infos.push(FieldInfo {
            ident: field_ident.clone(),
            ty: field.ty.clone(),
            exposed_name,
        });
    }

    for (i, info) in field_infos.iter().enumerate() {
        if field_infos[..i]
            .iter()
            .any(|other| other.exposed_name == info.exposed_name)
        {
            return Err(syn::Error::new_spanned(
                &info.ident,
                format!("duplicate record field name `{}`", info.exposed_name),
            ));
        }
    }

    let names: Vec<&str> = field_infos.iter().map(|f| f.exposed_name.as_str()).collect();

    let getters: Vec<TokenStream2> = field_infos
        .iter()
        .map(|info| {
            let ident = &info.ident;
            let name = &info.exposed_name;
            quote! {
                #name => ::core::option::Option::Some(
                    ::oxide_intercept::ToSqlValue::to_sql_value(&self.#ident)
                ),
            }
        })
        .collect();

    let setters: Vec<TokenStream2> = field_infos
        .iter()
        .map(|info| {
            let ident = &info.ident;
            let ty = &info.ty;
            let name = &info.exposed_name;
            quote! {
                #name => {
                    self.#ident = <#ty as ::oxide_intercept::FromSqlValue>::from_sql_value(value)?;
                    ::core::result::Result::Ok(())
                }
            }
        })
        .collect();

    let expanded = quote! {
        impl #impl_generics ::oxide_intercept::Record for #struct_name #ty_generics #where_clause {
            fn field_names(&self) -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn get_field(&self, name: &str) -> ::core::option::Option<::oxide_intercept::SqlValue> {
                match name {
                    #(#getters)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: ::oxide_intercept::SqlValue,
            ) -> ::core::result::Result<(), ::oxide_intercept::ValueError> {
                match name {
                    #(#setters)*
                    _ => ::core::result::Result::Err(
                        ::oxide_intercept::ValueError::UnknownField(::std::string::ToString::to_string(name))
                    ),
                }
            }
        }
    };

    Ok(expanded)
}

struct FieldInfo {
    ident: Ident,
    ty: Type,
    exposed_name: String,
}

#[derive(Clone, Copy)]
enum Convention {
    CamelCase,
    SnakeCase,
}

struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
}

fn parse_string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = value {
        if let Lit::Str(s) = lit.lit {
            return Ok(s.value());
        }
    }
    Err(meta.error("expected a string literal"))
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<Convention> {
    let mut convention = Convention::CamelCase;
    for attr in attrs {
        if attr.path().is_ident("record") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    convention = match parse_string_value(&meta)?.as_str() {
                        "camelCase" => Convention::CamelCase,
                        "snake_case" => Convention::SnakeCase,
                        other => {
                            return Err(meta.error(format!(
                                "unsupported rename_all convention `{other}`"
                            )));
                        }
                    };
                    Ok(())
                } else {
                    Err(meta.error("unsupported record attribute"))
                }
            })?;
        }
    }
    Ok(convention)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs {
        rename: None,
        skip: false,
    };

    for attr in attrs {
        if attr.path().is_ident("record") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    result.skip = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    result.rename = Some(parse_string_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported record field attribute"))
                }
            })?;
        }
    }

    Ok(result)
}

/// Mirrors `oxide_intercept::naming::underscore_to_camel_case`: a leading
/// underscore capitalizes the first word.
fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
