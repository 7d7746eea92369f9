extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, Attribute, Error, Fields, Ident,
    ItemStruct, LitStr, Result, Token,
};

const DEFAULT_RENAME_ALL: &str = "camelCase";

// --- 1. Macro arguments: `#[api_dto]` or `#[api_dto(rename_all = "...")]` ---
struct ApiDtoArgs {
    rename_all: LitStr,
}

impl Parse for ApiDtoArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.is_empty() {
            return Ok(ApiDtoArgs {
                rename_all: LitStr::new(DEFAULT_RENAME_ALL, Span::call_site()),
            });
        }
        let key: Ident = input.parse()?;
        if key != "rename_all" {
            return Err(Error::new(key.span(), "expected `rename_all = \"...\"`"));
        }
        input.parse::<Token![=]>()?;
        let rename_all: LitStr = input.parse()?;
        if !input.is_empty() {
            return Err(input.error("unexpected tokens after `rename_all`"));
        }
        Ok(ApiDtoArgs { rename_all })
    }
}

/// Turns a struct into an API payload type.
///
/// Adds `Debug`, `Clone`, `serde::Serialize` and `serde::Deserialize`
/// derives, camelCase JSON field names (override with
/// `#[api_dto(rename_all = "snake_case")]`), and an
/// `oas_registry::Describe` impl whose field names match the serialized
/// ones. Field-level `#[serde(rename = "...")]` and `#[serde(skip)]` are
/// honored.
///
/// `#[serde(skip_serializing)]` also drops the field from the schema, even
/// though deserialization still accepts it. A request body schema for such a
/// type under-documents what the service reads.
///
/// Only structs with named fields and no generic parameters are accepted.
#[proc_macro_attribute]
pub fn api_dto(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as ApiDtoArgs);
    let item = parse_macro_input!(input as ItemStruct);

    expand(args, item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

fn expand(args: ApiDtoArgs, item: ItemStruct) -> Result<proc_macro2::TokenStream> {
    // --- 2. Validate the shape ---
    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &item.generics,
            "#[api_dto] does not support generic types",
        ));
    }
    let Fields::Named(named) = &item.fields else {
        return Err(Error::new_spanned(
            &item.ident,
            "#[api_dto] requires a struct with named fields",
        ));
    };
    let rename_all = args.rename_all.value();
    let convert = case_converter(&rename_all)
        .ok_or_else(|| Error::new(args.rename_all.span(), format!("unknown rename rule `{rename_all}`")))?;

    // --- 3. Collect the serialized fields ---
    let mut field_names = Vec::new();
    let mut field_types = Vec::new();
    for field in &named.named {
        let Some(ident) = &field.ident else { continue };
        let attrs = SerdeFieldAttrs::parse(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let name = attrs
            .rename
            .unwrap_or_else(|| convert(&ident.unraw().to_string()));
        field_names.push(name);
        field_types.push(&field.ty);
    }

    // --- 4. Assemble ---
    let ident = &item.ident;
    let type_name = ident.unraw().to_string();
    let output = quote! {
        #[derive(Debug, Clone, ::oas_registry::serde::Serialize, ::oas_registry::serde::Deserialize)]
        #[serde(crate = "::oas_registry::serde", rename_all = #rename_all)]
        #item

        impl ::oas_registry::Describe for #ident {
            fn describe() -> ::oas_registry::TypeDescriptor {
                ::oas_registry::TypeDescriptor::record::<Self>(
                    #type_name,
                    ::oas_registry::TypeOrigin::new(
                        ::core::option_env!("CARGO_PKG_REPOSITORY"),
                        ::core::module_path!(),
                    ),
                    || ::std::vec![
                        #( ::oas_registry::Field::new::<#field_types>(#field_names) ),*
                    ],
                )
            }
        }
    };
    Ok(output)
}

/// Field renaming with the same rules serde applies to field names, which
/// assume snake_case input and leave other characters untouched.
fn case_converter(rule: &str) -> Option<fn(&str) -> String> {
    let convert: fn(&str) -> String = match rule {
        "lowercase" | "snake_case" => |field| field.to_owned(),
        "UPPERCASE" | "SCREAMING_SNAKE_CASE" => |field| field.to_ascii_uppercase(),
        "PascalCase" => pascal_case,
        "camelCase" => |field| {
            let pascal = pascal_case(field);
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                None => pascal,
            }
        },
        "kebab-case" => |field| field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => |field| field.to_ascii_uppercase().replace('_', "-"),
        _ => return None,
    };
    Some(convert)
}

fn pascal_case(field: &str) -> String {
    let mut pascal = String::with_capacity(field.len());
    let mut capitalize = true;
    for ch in field.chars() {
        if ch == '_' {
            capitalize = true;
        } else if capitalize {
            pascal.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            pascal.push(ch);
        }
    }
    pascal
}

#[derive(Default)]
struct SerdeFieldAttrs {
    rename: Option<String>,
    skip: bool,
}

impl SerdeFieldAttrs {
    fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut parsed = SerdeFieldAttrs::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    if meta.input.peek(Token![=]) {
                        let name: LitStr = meta.value()?.parse()?;
                        parsed.rename = Some(name.value());
                    } else {
                        // rename(serialize = "..", deserialize = "..")
                        meta.parse_nested_meta(|inner| {
                            let name: LitStr = inner.value()?.parse()?;
                            if inner.path.is_ident("serialize") {
                                parsed.rename = Some(name.value());
                            }
                            Ok(())
                        })?;
                    }
                    return Ok(());
                }
                if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    parsed.skip = true;
                    return Ok(());
                }
                if meta.path.is_ident("flatten") {
                    return Err(meta.error("#[api_dto] does not support flattened fields"));
                }
                skip_meta_value(&meta)
            })?;
        }
        Ok(parsed)
    }
}

/// Consumes the value of a serde option this macro does not interpret.
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let _content;
        syn::parenthesized!(_content in meta.input);
    }
    Ok(())
}
