extern crate quote;
extern crate syn;

extern crate proc_macro;

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr};

/// Derives `crate::types::Indexed` for a fieldless enum.
///
/// Variants are numbered in declaration order. Each variant's name defaults to
/// its identifier in snake_case and can be overridden with
/// `#[indexed(name = "...")]`.
#[proc_macro_derive(Indexed, attributes(indexed))]
pub fn indexed_macro_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = match syn::parse(input) {
        Ok(ast) => ast,
        Err(e) => return e.to_compile_error().into(),
    };
    match impl_indexed_macro(&ast) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn parse_indexed_name(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let mut found: Option<LitStr> = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("indexed")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(syn::Error::new(value.span(), "indexed name must not be empty"));
                }
                found = Some(value);
                Ok(())
            } else {
                Err(meta.error("unsupported indexed attribute; expected `name = \"...\"`"))
            }
        })?;
    }

    Ok(found)
}

fn impl_indexed_macro(ast: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &ast.ident;

    let data_enum = match &ast.data {
        Data::Enum(e) => e,
        Data::Struct(_) | Data::Union(_) => {
            return Err(syn::Error::new(
                Span::call_site(),
                "Indexed can only be derived for enums",
            ));
        }
    };

    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "Indexed enums cannot be generic",
        ));
    }

    if data_enum.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "Indexed enums need at least one variant",
        ));
    }

    let mut variants = Vec::new();
    let mut index_arms: Vec<TokenStream2> = Vec::new();
    let mut name_arms: Vec<TokenStream2> = Vec::new();
    let mut seen_names = std::collections::HashSet::new();

    for (i, v) in data_enum.variants.iter().enumerate() {
        let v_ident = &v.ident;

        if !matches!(v.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                v,
                "Indexed variants cannot carry fields",
            ));
        }
        if let Some((_, expr)) = &v.discriminant {
            return Err(syn::Error::new_spanned(
                expr,
                "Indexed variants are numbered by position; remove the explicit discriminant",
            ));
        }

        let label = match parse_indexed_name(&v.attrs)? {
            Some(lit) => lit.value(),
            None => v_ident.to_string().to_case(Case::Snake),
        };
        if !seen_names.insert(label.clone()) {
            return Err(syn::Error::new_spanned(
                v_ident,
                format!("duplicate Indexed name `{label}`"),
            ));
        }

        variants.push(quote!(Self::#v_ident));
        index_arms.push(quote!(Self::#v_ident => #i));
        name_arms.push(quote!(Self::#v_ident => #label));
    }

    let count = variants.len();

    Ok(quote! {
        impl crate::types::Indexed for #name {
            const COUNT: usize = #count;
            const ALL: &'static [Self] = &[ #( #variants, )* ];

            #[inline]
            fn index(self) -> usize {
                match self {
                    #( #index_arms, )*
                }
            }

            fn name(self) -> &'static str {
                match self {
                    #( #name_arms, )*
                }
            }
        }
    })
}
