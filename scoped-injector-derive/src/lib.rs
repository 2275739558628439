//! Derive macro for scoped-injector
//!
//! `#[derive(Injectable)]` generates the `Injectable` implementation that
//! declares a struct's injection points.
//!
//! # Example
//!
//! ```rust,ignore
//! use scoped_injector::{Inject, Injectable, Injector, Module};
//!
//! struct Logger;
//! struct Metrics;
//! struct Clock;
//!
//! #[derive(Default, Injectable)]
//! struct Base {
//!     #[inject]
//!     #[named("utc")]
//!     clock: Inject<Clock>,
//! }
//!
//! #[derive(Default, Injectable)]
//! struct Worker {
//!     #[inject]
//!     logger: Inject<Logger>,
//!     #[inject(optional)]
//!     metrics: Inject<Metrics>,
//!     #[inject(base)]
//!     base: Base,
//!     // not injected
//!     jobs_done: u64,
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr, Meta, Type, parse_macro_input};

/// Derive macro for the `Injectable` trait.
///
/// # Attributes
///
/// Fields of type `Inject<T>` marked with `#[inject]` are injection points:
///
/// - `#[inject]` - Required injection point
/// - `#[inject(optional)]` - Left empty when nothing is bound
/// - `#[inject(name = "primary")]` - Qualified lookup
/// - `#[inject(raw = "RawType")]` - Parameterized field whose raw form is `RawType`
/// - `#[named("primary")]` / `#[named = "primary"]` - Qualifier for a field
///   already marked with `#[inject]`; ignored on unmarked fields
///
/// Options can be combined: `#[inject(optional, name = "x")]`.
///
/// `#[inject(base)]` on a field whose type is itself `Injectable` appends that
/// type's injection points after the struct's own.
#[proc_macro_derive(Injectable, attributes(inject, named))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Only support structs with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => {
                return Ok(quote! {
                    impl #impl_generics ::scoped_injector::Injectable for #name #ty_generics #where_clause {}
                });
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Injectable can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Injectable can only be derived for structs",
            ));
        }
    };

    let mut own = Vec::new();
    let mut bases = Vec::new();

    for field in fields.iter() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let Some(options) = parse_field_attrs(&field.attrs)? else {
            continue;
        };

        if options.base {
            bases.push(quote! {
                points.base(|this: &Self| &this.#ident);
            });
            continue;
        }

        let inner = extract_inject_inner_type(&field.ty).ok_or_else(|| {
            syn::Error::new_spanned(&field.ty, "Injection points must have type Inject<T>")
        })?;
        let field_name = ident.unraw().to_string();

        let declare = match &options.raw {
            Some(raw) => quote! {
                points.field_erased::<#inner, #raw, _>(#field_name, |this: &Self| &this.#ident)
            },
            None => quote! {
                points.field::<#inner, _>(#field_name, |this: &Self| &this.#ident)
            },
        };
        let named = options.name.as_ref().map(|lit| quote! { .named(#lit) });
        let optional = options.optional.then(|| quote! { .optional() });

        own.push(quote! {
            #declare #named #optional;
        });
    }

    Ok(quote! {
        impl #impl_generics ::scoped_injector::Injectable for #name #ty_generics #where_clause {
            fn injection_points(points: &mut ::scoped_injector::InjectionPoints<Self>) {
                #(#own)*
                #(#bases)*
            }
        }
    })
}

#[derive(Default)]
struct FieldOptions {
    optional: bool,
    base: bool,
    name: Option<LitStr>,
    raw: Option<Type>,
}

/// Collect `#[inject(..)]` and `#[named(..)]`; `None` unless the field is marked `#[inject]`
fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<Option<FieldOptions>> {
    let mut options = FieldOptions::default();
    let mut marked = false;

    for attr in attrs {
        if attr.path().is_ident("inject") {
            marked = true;
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("optional") {
                    options.optional = true;
                    Ok(())
                } else if meta.path.is_ident("base") {
                    options.base = true;
                    Ok(())
                } else if meta.path.is_ident("name") {
                    options.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("raw") {
                    let lit: LitStr = meta.value()?.parse()?;
                    options.raw = Some(lit.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `optional`, `base`, `name = \"..\"` or `raw = \"..\"`"))
                }
            })?;
        } else if attr.path().is_ident("named") {
            options.name = Some(parse_named(attr)?);
        }
    }

    if options.base && (options.name.is_some() || options.raw.is_some() || options.optional) {
        return Err(syn::Error::new_spanned(
            &attrs[0],
            "`base` cannot be combined with other injection options",
        ));
    }

    Ok(marked.then_some(options))
}

/// `#[named("x")]` or `#[named = "x"]`
fn parse_named(attr: &Attribute) -> syn::Result<LitStr> {
    match &attr.meta {
        Meta::NameValue(nv) => match &nv.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit), ..
            }) => Ok(lit.clone()),
            other => Err(syn::Error::new_spanned(other, "expected a string literal")),
        },
        _ => attr.parse_args::<LitStr>(),
    }
}

/// Extract T from Inject<T>
fn extract_inject_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Inject" {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}
