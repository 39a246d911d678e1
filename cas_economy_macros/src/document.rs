use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr};

pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let collection = collection_name(input)?;
    let id_field = id_field(input)?;

    Ok(quote! {
        impl cas_economy::Document for #name {
            const COLLECTION: &'static str = #collection;

            fn id(&self) -> &str {
                &self.#id_field
            }
        }
    })
}

/// `#[document(collection = "...")]` on the struct, or the snake_case name.
fn collection_name(input: &DeriveInput) -> syn::Result<String> {
    let mut collection: Option<LitStr> = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("document")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("collection") {
                return Err(meta.error("expected `collection = \"...\"`"));
            }
            let value: LitStr = meta.value()?.parse()?;
            if value.value().is_empty() {
                return Err(syn::Error::new(value.span(), "collection must not be empty"));
            }
            if collection.replace(value).is_some() {
                return Err(meta.error("collection given more than once"));
            }
            Ok(())
        })?;
    }

    Ok(match collection {
        Some(lit) => lit.value(),
        None => snake_case(&input.ident.to_string()),
    })
}

/// The field marked `#[document(id)]`, else a field named `id`.
fn id_field(input: &DeriveInput) -> syn::Result<Ident> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Document can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Document needs a struct with named fields",
        ));
    };

    let mut marked: Option<&Ident> = None;
    for field in &fields.named {
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("document")) {
            attr.parse_nested_meta(|meta| {
                if !meta.path.is_ident("id") {
                    return Err(meta.error("expected `id`"));
                }
                if marked.is_some() {
                    return Err(meta.error("only one field may be marked #[document(id)]"));
                }
                marked = field.ident.as_ref();
                Ok(())
            })?;
        }
    }

    marked
        .or_else(|| {
            fields
                .named
                .iter()
                .filter_map(|field| field.ident.as_ref())
                .find(|ident| *ident == "id")
        })
        .cloned()
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "Document derive: no field marked with #[document(id)] and no field named `id`",
            )
        })
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.char_indices() {
        if ch.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}
