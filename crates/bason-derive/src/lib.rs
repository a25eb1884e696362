//! # bason-derive
//!
//! `#[derive(Persist)]` for bason configuration types.
//!
//! The derive reads the `#[serde(...)]` attributes already present on the
//! struct so that the persisted field set is described in one place:
//!
//! - `skip`, `skip_serializing`, `skip_deserializing` mark a field transient:
//!   it is left out of `fields()` and `absorb()`.  serde still writes a
//!   `skip_deserializing` field; it is just never loaded back.
//! - `rename = "..."` changes the key reported by `fields()`.
//! - `flatten` splices the nested type's own fields in at the declaration
//!   position; the nested type must derive `Persist` as well.
//!
//! Container-level `rename_all` is rejected because the reported keys would
//! no longer match the JSON.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parenthesized, parse_macro_input, spanned::Spanned, Attribute, Data, DeriveInput, Error,
    Fields, LitStr, Type,
};

#[proc_macro_derive(Persist)]
pub fn derive_persist(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// What the serde attributes on a single field tell us.
#[derive(Default)]
struct FieldAttrs {
    transient: bool,
    flatten: bool,
    rename: Option<String>,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    check_container_attrs(&input.attrs)?;

    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Persist can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Persist can only be derived for structs",
            ))
        }
    };

    let mut descriptors = Vec::new();
    let mut copies = Vec::new();

    for field in fields {
        let attrs = field_attrs(&field.attrs)?;
        if attrs.transient {
            continue;
        }

        // Named fields always carry an ident.
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;

        if attrs.flatten {
            descriptors.push(quote! {
                fields.extend(<#ty as ::bason::Persist>::fields());
            });
            copies.push(quote! {
                ::bason::Persist::absorb(&mut self.#ident, decoded.#ident);
            });
        } else {
            let key = attrs.rename.unwrap_or_else(|| unraw(&ident.to_string()));
            let type_name = type_name(ty);
            descriptors.push(quote! {
                fields.push(::bason::FieldDesc::new(#key, #type_name));
            });
            copies.push(quote! {
                self.#ident = decoded.#ident;
            });
        }
    }

    if copies.is_empty() {
        copies.push(quote! { let _ = decoded; });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::bason::Persist for #name #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<::bason::FieldDesc> {
                let mut fields = ::std::vec::Vec::new();
                #(#descriptors)*
                fields
            }

            fn absorb(&mut self, decoded: Self) {
                #(#copies)*
            }
        }
    })
}

fn check_container_attrs(attrs: &[Attribute]) -> syn::Result<()> {
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                return Err(meta.error("Persist does not support container-level rename_all"));
            }
            skip_meta_value(&meta)
        })?;
    }
    Ok(())
}

fn field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip")
                || meta.path.is_ident("skip_serializing")
                || meta.path.is_ident("skip_deserializing")
            {
                out.transient = true;
                Ok(())
            } else if meta.path.is_ident("flatten") {
                out.flatten = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                if meta.input.peek(syn::Token![=]) {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.rename = Some(lit.value());
                    Ok(())
                } else {
                    // rename(serialize = "..", deserialize = "..") - the
                    // deserialize name is the key we read back.
                    meta.parse_nested_meta(|inner| {
                        let lit: LitStr = inner.value()?.parse()?;
                        if inner.path.is_ident("deserialize") {
                            out.rename = Some(lit.value());
                        }
                        Ok(())
                    })
                }
            } else {
                skip_meta_value(&meta)
            }
        })?;
    }
    Ok(out)
}

/// Consumes `= value` or `(...)` following a serde option we do not care about.
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        parenthesized!(content in meta.input);
        let _: TokenStream2 = content.parse()?;
    }
    Ok(())
}

fn unraw(ident: &str) -> String {
    ident.strip_prefix("r#").unwrap_or(ident).to_string()
}

/// Renders a type the way a reader would write it: `Vec<String>`, not `Vec < String >`.
fn type_name(ty: &Type) -> String {
    let raw = quote!(#ty).to_string();
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            let prev_word = out.chars().last().is_some_and(is_word_char);
            let next_word = chars.peek().copied().is_some_and(is_word_char);
            if prev_word && next_word {
                out.push(' ');
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}
