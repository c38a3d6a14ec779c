//! `#[derive(Merge)]` for quarto-merge.
//!
//! Structs with named fields become records, merged field by field. A tuple
//! struct with a single field is a transparent newtype: it merges, reads the
//! environment and reports emptiness exactly like the wrapped type. Any
//! other struct or enum is an opaque record, merged as a single value.
//!
//! Container attributes:
//!
//! - `#[merge(env_prefix = "APP_")]`: environment variables are named
//!   `APP_<field>`; also implements `Overridable`
//! - `#[merge(overridable)]`: environment variable names come from a
//!   hand-written `Overridable` implementation
//!
//! Field attributes:
//!
//! - `#[merge(skip)]`: not merged, not described
//! - `#[merge(rename = "Name")]`: field name used for metadata and the
//!   environment
//! - `#[merge(tag = "final,optional")]`: raw tag tokens
//! - `#[merge(final)]`, `#[merge(optional)]`, `#[merge(mustoverride)]`, or
//!   any other bare word: a single tag token

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    Attribute, Data, DeriveInput, Fields, FieldsNamed, Generics, LitStr, Type,
    parse_macro_input, parse_quote,
};

#[proc_macro_derive(Merge, attributes(merge))]
pub fn derive_merge(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct ContainerOptions {
    env_prefix: Option<LitStr>,
    overridable: bool,
}

#[derive(Default)]
struct FieldOptions {
    skip: bool,
    rename: Option<LitStr>,
    tags: Vec<String>,
}

fn merge_attributes(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("merge"))
}

fn container_options(attrs: &[Attribute]) -> syn::Result<ContainerOptions> {
    let mut options = ContainerOptions::default();
    for attr in merge_attributes(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("env_prefix") {
                options.env_prefix = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("overridable") {
                options.overridable = true;
                Ok(())
            } else {
                Err(meta.error("expected `env_prefix = \"...\"` or `overridable`"))
            }
        })?;
    }
    Ok(options)
}

fn field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in merge_attributes(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("rename") {
                options.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("tag") {
                let tag: LitStr = meta.value()?.parse()?;
                options.tags.extend(
                    tag.value()
                        .split(',')
                        .map(str::trim)
                        .filter(|token| !token.is_empty())
                        .map(str::to_string),
                );
            } else if let Some(ident) = meta.path.get_ident() {
                if !meta.input.is_empty() && !meta.input.peek(syn::Token![,]) {
                    return Err(meta.error("tag words take no value"));
                }
                options.tags.push(ident.unraw().to_string());
            } else {
                return Err(meta.error("unsupported merge attribute"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

/// Add a `Merge` bound to every type parameter.
fn bounded_generics(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::quarto_merge::Merge));
    }
    generics
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let options = container_options(&input.attrs)?;
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => expand_record(input, &options, Some(fields)),
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                let inner = &fields.unnamed[0];
                if field_options(&inner.attrs)?.skip {
                    expand_record(input, &options, None)
                } else {
                    Ok(expand_newtype(input, &inner.ty))
                }
            }
            _ => expand_record(input, &options, None),
        },
        Data::Enum(_) => expand_record(input, &options, None),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Merge cannot be derived for unions",
        )),
    }
}

fn expand_record(
    input: &DeriveInput,
    options: &ContainerOptions,
    fields: Option<&FieldsNamed>,
) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let generics = bounded_generics(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut descriptors = Vec::new();
    let mut visits = Vec::new();
    for field in fields.into_iter().flat_map(|fields| &fields.named) {
        let field_opts = field_options(&field.attrs)?;
        if field_opts.skip {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };

        let field_name = match &field_opts.rename {
            Some(rename) => rename.value(),
            None => ident.unraw().to_string(),
        };
        let tag = if field_opts.tags.is_empty() {
            quote!(::core::option::Option::None)
        } else {
            let joined = field_opts.tags.join(",");
            quote!(::core::option::Option::Some(#joined))
        };
        let ty = &field.ty;
        let index = descriptors.len();

        descriptors.push(quote! {
            ::quarto_merge::FieldDescriptor::of::<#ty>(#field_name, #tag)
        });
        visits.push(quote! {
            fields.field(#index, &mut self.#ident, &src.#ident)?;
        });
    }

    let environment_name = (options.env_prefix.is_some() || options.overridable).then(|| {
        quote! {
            fn environment_name(&self, field_name: &str) -> ::std::string::String {
                ::quarto_merge::Overridable::environment_setting(self, field_name)
            }
        }
    });

    let overridable = options.env_prefix.as_ref().map(|prefix| {
        quote! {
            impl #impl_generics ::quarto_merge::Overridable for #name #ty_generics #where_clause {
                fn environment_setting(&self, field_name: &str) -> ::std::string::String {
                    ::std::format!("{}{}", #prefix, field_name)
                }
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::quarto_merge::Merge for #name #ty_generics #where_clause {
            const KIND: ::quarto_merge::Kind = ::quarto_merge::Kind::Record;

            fn is_empty_value(&self) -> bool {
                false
            }

            fn merge_from(
                &mut self,
                src: &Self,
                cx: &mut ::quarto_merge::MergeContext<'_>,
            ) -> ::core::result::Result<(), ::quarto_merge::MergeError> {
                ::quarto_merge::merge_record(self, src, cx)
            }
        }

        impl #impl_generics ::quarto_merge::Record for #name #ty_generics #where_clause {
            fn field_descriptors() -> ::std::vec::Vec<::quarto_merge::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }

            #[allow(unused_variables)]
            fn merge_fields(
                &mut self,
                src: &Self,
                fields: &mut ::quarto_merge::FieldMerger<'_, '_>,
            ) -> ::core::result::Result<(), ::quarto_merge::MergeError> {
                #(#visits)*
                ::core::result::Result::Ok(())
            }

            #environment_name
        }

        #overridable
    })
}

fn expand_newtype(input: &DeriveInput, inner: &Type) -> TokenStream2 {
    let name = &input.ident;
    let generics = bounded_generics(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics ::quarto_merge::Merge for #name #ty_generics #where_clause {
            const KIND: ::quarto_merge::Kind = <#inner as ::quarto_merge::Merge>::KIND;

            fn is_empty_value(&self) -> bool {
                ::quarto_merge::Merge::is_empty_value(&self.0)
            }

            fn is_nil(&self) -> bool {
                ::quarto_merge::Merge::is_nil(&self.0)
            }

            fn merge_from(
                &mut self,
                src: &Self,
                cx: &mut ::quarto_merge::MergeContext<'_>,
            ) -> ::core::result::Result<(), ::quarto_merge::MergeError> {
                ::quarto_merge::deep_merge(&mut self.0, &src.0, cx)
            }

            fn from_env(
                name: &str,
                env: &dyn ::quarto_merge::Environment,
            ) -> ::core::option::Option<Self> {
                <#inner as ::quarto_merge::Merge>::from_env(name, env).map(Self)
            }

            fn override_from_env(
                &mut self,
                name: &str,
                env: &dyn ::quarto_merge::Environment,
            ) -> bool {
                ::quarto_merge::Merge::override_from_env(&mut self.0, name, env)
            }
        }
    }
}
