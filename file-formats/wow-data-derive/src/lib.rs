//! Derive macros for the `wow-data` record traits.
//!
//! * `WowHeaderR` reads a struct field by field in declaration order.
//! * `VWowHeaderR` does the same with a version in scope: fields marked
//!   `#[wow_data(versioned)]` receive the version, and enum variants are
//!   chosen by their `#[wow_data(read_if = <expr>)]` predicate before any
//!   byte of the variant is read. Exactly one variant must lack `read_if`.
//! * `WowHeaderW` writes fields in declaration order and sums their sizes.
//!
//! `#[wow_data(skip = <expr>)]` fills a field without touching the stream;
//! `#[wow_data(bitflags = <int type>)]` on a `bitflags` struct reads and
//! writes the raw bits, keeping unknown bits.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Type, parse::Parse, parse_macro_input};

#[proc_macro_derive(WowHeaderR, attributes(wow_data))]
pub fn wow_header_r_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = if let Some(bits_ty) = find_value::<Type>(&input.attrs, "bitflags") {
        Ok(quote! {
            Self::from_bits_retain(
                ::wow_data::types::WowReaderForHeader::wow_read::<#bits_ty>(reader)?
            )
        })
    } else {
        match &input.data {
            Data::Struct(s) => struct_reader_body(&s.fields, false),
            Data::Enum(e) => enum_reader_body(e, false),
            Data::Union(_) => Err(syn::Error::new_spanned(
                &input,
                "WowHeaderR cannot be derived for unions.",
            )),
        }
    };

    let body = match body {
        Ok(body) => body,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(quote! {
        impl #impl_generics ::wow_data::types::WowHeaderR for #ident #ty_generics #where_clause {
            fn wow_read<R: ::std::io::Read + ::std::io::Seek>(
                reader: &mut R,
            ) -> ::wow_data::error::Result<Self> {
                #[allow(unused_imports)]
                use ::wow_data::types::WowReaderForHeader as _;
                Ok(#body)
            }
        }
    })
}

#[proc_macro_derive(VWowHeaderR, attributes(wow_data))]
pub fn v_wow_header_r_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let Some(version_ty) = find_value::<Type>(&input.attrs, "version") else {
        return syn::Error::new_spanned(
            &input,
            "Missing required attribute `#[wow_data(version = YourVersionType)]`",
        )
        .to_compile_error()
        .into();
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(s) => struct_reader_body(&s.fields, true),
        Data::Enum(e) => enum_reader_body(e, true),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input,
            "VWowHeaderR cannot be derived for unions.",
        )),
    };

    let body = match body {
        Ok(body) => body,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(quote! {
        impl #impl_generics ::wow_data::types::VWowHeaderR<#version_ty> for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn wow_read<R: ::std::io::Read + ::std::io::Seek>(
                reader: &mut R,
                version: #version_ty,
            ) -> ::wow_data::error::Result<Self> {
                #[allow(unused_imports)]
                use ::wow_data::types::WowReaderForHeader as _;
                Ok(#body)
            }
        }
    })
}

#[proc_macro_derive(WowHeaderW, attributes(wow_data))]
pub fn wow_header_w_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let bodies = if let Some(bits_ty) = find_value::<Type>(&input.attrs, "bitflags") {
        Ok((
            quote! {
                ::wow_data::types::WowHeaderW::wow_write(&self.bits(), writer)
            },
            quote! { ::std::mem::size_of::<#bits_ty>() },
        ))
    } else {
        match &input.data {
            Data::Struct(s) => struct_writer_bodies(&s.fields),
            Data::Enum(e) => Ok(enum_writer_bodies(e)),
            Data::Union(_) => Err(syn::Error::new_spanned(
                &input,
                "WowHeaderW cannot be derived for unions.",
            )),
        }
    };

    let (writer_body, size_body) = match bodies {
        Ok(bodies) => bodies,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(quote! {
        impl #impl_generics ::wow_data::types::WowHeaderW for #ident #ty_generics #where_clause {
            fn wow_write<W: ::std::io::Write>(&self, writer: &mut W) -> ::wow_data::error::Result<()> {
                #writer_body
            }

            fn wow_size(&self) -> usize {
                #size_body
            }
        }
    })
}

fn read_expr(attrs: &[Attribute], versioned_ctx: bool) -> proc_macro2::TokenStream {
    if let Some(val) = find_value::<Expr>(attrs, "skip") {
        return quote! { #val };
    }
    if versioned_ctx && has_flag(attrs, "versioned") {
        quote! { ::wow_data::types::WowReaderForHeader::wow_read_versioned(reader, version)? }
    } else {
        quote! { ::wow_data::types::WowReaderForHeader::wow_read(reader)? }
    }
}

fn struct_reader_body(
    fields: &Fields,
    versioned_ctx: bool,
) -> syn::Result<proc_macro2::TokenStream> {
    match fields {
        Fields::Named(named) => {
            let initializers = named.named.iter().map(|field| {
                let name = &field.ident;
                let value = read_expr(&field.attrs, versioned_ctx);
                quote! { #name: #value }
            });
            Ok(quote! { Self { #(#initializers),* } })
        }
        Fields::Unnamed(unnamed) => {
            let values = unnamed
                .unnamed
                .iter()
                .map(|field| read_expr(&field.attrs, versioned_ctx));
            Ok(quote! { Self( #(#values),* ) })
        }
        Fields::Unit => Ok(quote! { Self }),
    }
}

fn enum_reader_body(
    data: &syn::DataEnum,
    versioned_ctx: bool,
) -> syn::Result<proc_macro2::TokenStream> {
    let mut conditional_arms = Vec::new();
    let mut default_arm = None;

    for variant in &data.variants {
        let variant_ident = &variant.ident;

        let constructor = match &variant.fields {
            Fields::Unit => quote! { Self::#variant_ident },
            Fields::Unnamed(fields) => {
                let values = fields
                    .unnamed
                    .iter()
                    .map(|f| read_expr(&f.attrs, versioned_ctx));
                quote! { Self::#variant_ident( #(#values),* ) }
            }
            Fields::Named(fields) => {
                let values = fields.named.iter().map(|f| {
                    let name = &f.ident;
                    let value = read_expr(&f.attrs, versioned_ctx);
                    quote! { #name: #value }
                });
                quote! { Self::#variant_ident { #(#values),* } }
            }
        };

        if let Some(cond_expr) = find_value::<Expr>(&variant.attrs, "read_if") {
            conditional_arms.push(quote! { if #cond_expr { #constructor } });
        } else {
            if default_arm.is_some() {
                return Err(syn::Error::new_spanned(
                    variant,
                    "Only one enum variant can be the default (lacking a `read_if` attribute).",
                ));
            }
            default_arm = Some(constructor);
        }
    }

    let default_arm = default_arm.ok_or_else(|| {
        syn::Error::new_spanned(
            &data.variants,
            "An enum must have one default variant (lacking a `read_if` attribute).",
        )
    })?;

    if conditional_arms.is_empty() {
        return Ok(default_arm);
    }

    Ok(quote! {
        #(#conditional_arms)else*
        else {
            #default_arm
        }
    })
}

fn struct_writer_bodies(
    fields: &Fields,
) -> syn::Result<(proc_macro2::TokenStream, proc_macro2::TokenStream)> {
    let members: Vec<(proc_macro2::TokenStream, bool)> = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .map(|f| {
                let name = &f.ident;
                (quote! { self.#name }, is_skipped(&f.attrs))
            })
            .collect(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let index = syn::Index::from(i);
                (quote! { self.#index }, is_skipped(&f.attrs))
            })
            .collect(),
        Fields::Unit => Vec::new(),
    };

    let writes = members.iter().filter(|(_, skip)| !skip).map(|(m, _)| {
        quote! { ::wow_data::types::WowHeaderW::wow_write(&#m, writer)?; }
    });
    let sizes = members.iter().filter(|(_, skip)| !skip).map(|(m, _)| {
        quote! { + ::wow_data::types::WowHeaderW::wow_size(&#m) }
    });

    Ok((
        quote! {
            #(#writes)*
            Ok(())
        },
        quote! { 0 #(#sizes)* },
    ))
}

fn enum_writer_bodies(
    data: &syn::DataEnum,
) -> (proc_macro2::TokenStream, proc_macro2::TokenStream) {
    let mut write_arms = Vec::new();
    let mut size_arms = Vec::new();

    for variant in &data.variants {
        let variant_ident = &variant.ident;
        match &variant.fields {
            Fields::Unit => {
                write_arms.push(quote! { Self::#variant_ident => {} });
                size_arms.push(quote! { Self::#variant_ident => 0 });
            }
            Fields::Unnamed(fields) => {
                let bindings: Vec<_> = (0..fields.unnamed.len())
                    .map(|i| format_ident!("v{}", i))
                    .collect();
                let live: Vec<_> = bindings
                    .iter()
                    .zip(fields.unnamed.iter())
                    .filter(|(_, f)| !is_skipped(&f.attrs))
                    .map(|(b, _)| b)
                    .collect();
                write_arms.push(quote! {
                    #[allow(unused_variables)]
                    Self::#variant_ident( #(#bindings),* ) => {
                        #( ::wow_data::types::WowHeaderW::wow_write(#live, writer)?; )*
                    }
                });
                size_arms.push(quote! {
                    #[allow(unused_variables)]
                    Self::#variant_ident( #(#bindings),* ) => {
                        0 #( + ::wow_data::types::WowHeaderW::wow_size(#live) )*
                    }
                });
            }
            Fields::Named(fields) => {
                let bindings: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                let live: Vec<_> = fields
                    .named
                    .iter()
                    .filter(|f| !is_skipped(&f.attrs))
                    .map(|f| &f.ident)
                    .collect();
                write_arms.push(quote! {
                    #[allow(unused_variables)]
                    Self::#variant_ident { #(#bindings),* } => {
                        #( ::wow_data::types::WowHeaderW::wow_write(#live, writer)?; )*
                    }
                });
                size_arms.push(quote! {
                    #[allow(unused_variables)]
                    Self::#variant_ident { #(#bindings),* } => {
                        0 #( + ::wow_data::types::WowHeaderW::wow_size(#live) )*
                    }
                });
            }
        }
    }

    (
        quote! {
            match self {
                #(#write_arms),*
            }
            Ok(())
        },
        quote! {
            match self {
                #(#size_arms),*
            }
        },
    )
}

fn is_skipped(attrs: &[Attribute]) -> bool {
    find_value::<Expr>(attrs, "skip").is_some()
}

fn has_flag(attrs: &[Attribute], key: &str) -> bool {
    let mut found = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("wow_data")) {
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) {
                found = true;
            } else if meta.input.peek(syn::Token![=]) {
                // consume `key = value` pairs we are not interested in
                let _: Expr = meta.value()?.parse()?;
            }
            Ok(())
        });
    }
    found
}

fn find_value<T: Parse>(attrs: &[Attribute], key: &str) -> Option<T> {
    let mut ret_val = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("wow_data")) {
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) {
                let parsed: T = meta.value()?.parse()?;
                ret_val = Some(parsed);
            } else if meta.input.peek(syn::Token![=]) {
                let _: Expr = meta.value()?.parse()?;
            }
            Ok(())
        });
    }
    ret_val
}
