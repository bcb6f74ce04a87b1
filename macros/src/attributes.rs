use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};

use super::*;

mod kw {
    syn::custom_keyword!(cell);
}

/// The arguments to `#[attributes(..)]`.
pub struct Config {
    /// The field holding the instance's `AttrCell`. Defaults to `attrs`.
    cell: Option<syn::Ident>,
}

impl Parse for Config {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cell = None;
        if input.peek(kw::cell) {
            let _: kw::cell = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            cell = Some(input.parse()?);
        }
        if !input.is_empty() {
            return Err(input.error("expected `cell = <field>`"));
        }
        Ok(Self { cell })
    }
}

/// Expand an `#[attributes]` impl block.
pub fn expand(config: &Config, item: &syn::ItemImpl) -> Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        bail!(path, "only inherent impl blocks can declare attributes");
    }

    for param in item.generics.params.iter() {
        bail!(param, "attribute impl blocks cannot be generic");
    }

    // Preprocess and validate the declared functions.
    let mut attrs = vec![];
    for item in &item.items {
        attrs.push(prepare(item)?);
    }

    let ty = item.self_ty.as_ref();
    let cell = config
        .cell
        .clone()
        .unwrap_or_else(|| syn::Ident::new("attrs", proc_macro2::Span::call_site()));

    let hidden = attrs.iter().map(|attr| &attr.hidden);
    let accessors = attrs.iter().map(create_accessors);
    let declares = attrs.iter().map(|attr| create_declare(attr, ty));

    Ok(quote! {
        impl #ty {
            #(#hidden)*
            #(#accessors)*
        }

        impl ::memoattr::Memoize for #ty {
            fn definitions() -> &'static ::memoattr::Definitions<Self> {
                static DEFS: ::std::sync::LazyLock<::memoattr::Definitions<#ty>> =
                    ::std::sync::LazyLock::new(|| {
                        let mut defs = ::memoattr::Definitions::new();
                        #(#declares)*
                        defs
                    });
                &DEFS
            }

            fn attr_cell(&self) -> &::memoattr::AttrCell {
                &self.#cell
            }

            fn type_cell() -> &'static ::memoattr::AttrCell {
                static CELL: ::memoattr::AttrCell = ::memoattr::AttrCell::new();
                &CELL
            }
        }
    })
}

/// One declared attribute.
struct Attr {
    vis: syn::Visibility,
    docs: Vec<syn::Attribute>,
    name: syn::Ident,
    kind: Kind,
    params: Vec<syn::Ident>,
    fallible: bool,
    hidden: syn::ImplItemFn,
}

/// How the declared function's signature classifies the attribute.
enum Kind {
    Static,
    Lazy,
    Parametrized,
}

/// Preprocess and validate a declared function.
fn prepare(item: &syn::ImplItem) -> Result<Attr> {
    let syn::ImplItem::Fn(func) = item else {
        bail!(item, "only functions can declare attributes");
    };

    let sig = &func.sig;
    if let Some(unsafety) = sig.unsafety {
        bail!(unsafety, "attribute generators cannot be unsafe");
    }

    if let Some(asyncness) = sig.asyncness {
        bail!(asyncness, "attribute generators cannot be async");
    }

    if let Some(constness) = sig.constness {
        bail!(constness, "attribute generators cannot be const");
    }

    for param in sig.generics.params.iter() {
        bail!(param, "attribute generators cannot be generic");
    }

    let mut inputs = sig.inputs.iter();
    let mut has_scope = false;
    let mut params = vec![];

    if let Some(first) = inputs.next() {
        let typed = match first {
            syn::FnArg::Typed(typed) => typed,
            syn::FnArg::Receiver(receiver) => {
                bail!(
                    receiver,
                    "declare the owner as a `Scope<Self>` parameter instead of `self`"
                );
            }
        };

        if !is_path_to(&typed.ty, "Scope") {
            bail!(typed.ty, "the first parameter must be of type `Scope<Self>`");
        }

        has_scope = true;
    }

    for input in inputs {
        let typed = match input {
            syn::FnArg::Typed(typed) => typed,
            syn::FnArg::Receiver(receiver) => {
                bail!(receiver, "unexpected receiver");
            }
        };

        let syn::Pat::Ident(syn::PatIdent {
            by_ref: None,
            mutability: None,
            ident,
            subpat: None,
            ..
        }) = typed.pat.as_ref()
        else {
            bail!(typed.pat, "only simple identifiers are supported");
        };

        if !is_path_to(&typed.ty, "Value") {
            bail!(typed.ty, "attribute parameters must be of type `Value`");
        }

        params.push(ident.clone());
    }

    let kind = match (has_scope, params.len()) {
        (false, _) => Kind::Static,
        (true, 0) => Kind::Lazy,
        (true, _) => Kind::Parametrized,
    };

    let fallible = match &sig.output {
        syn::ReturnType::Default => {
            bail!(sig, "attribute generators must return `Value`");
        }
        syn::ReturnType::Type(_, ty) => is_path_to(ty, "Result"),
    };

    if fallible && matches!(kind, Kind::Static) {
        bail!(sig, "static attributes cannot be fallible");
    }

    // The declared function survives under a mangled name as the generator
    // invoked by the engine. Its documentation moves to the accessors.
    let mut hidden = func.clone();
    hidden.vis = syn::Visibility::Inherited;
    hidden.sig.ident = format_ident!("__attr_{}", sig.ident);
    hidden.attrs.retain(|attr| !attr.path().is_ident("doc"));
    hidden.attrs.push(syn::parse_quote! { #[doc(hidden)] });

    let docs = func
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .cloned()
        .collect();

    Ok(Attr {
        vis: func.vis.clone(),
        docs,
        name: sig.ident.clone(),
        kind,
        params,
        fallible,
        hidden,
    })
}

/// Whether a type is a path whose last segment is `ident`.
fn is_path_to(ty: &syn::Type, ident: &str) -> bool {
    match ty {
        syn::Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == ident),
        _ => false,
    }
}

/// Produce the instance-scope and type-scope accessors for an attribute.
fn create_accessors(attr: &Attr) -> TokenStream {
    let Attr { vis, docs, name, params, .. } = attr;
    let name_str = name.to_string();
    let type_name = format_ident!("type_{}", name);

    quote! {
        #(#docs)*
        #[allow(dead_code)]
        #vis fn #name(
            &self
            #(, #params: ::memoattr::Value)*
        ) -> ::core::result::Result<::memoattr::FrozenValue, ::memoattr::AttrError> {
            ::memoattr::internal::access_instance(self, #name_str, &[#(#params),*])
        }

        #(#docs)*
        #[allow(dead_code)]
        #vis fn #type_name(
            #(#params: ::memoattr::Value),*
        ) -> ::core::result::Result<::memoattr::FrozenValue, ::memoattr::AttrError> {
            ::memoattr::internal::access_type::<Self>(#name_str, &[#(#params),*])
        }
    }
}

/// Produce the registration of an attribute in the type's definitions.
///
/// Runs inside a static initializer, where `Self` is unavailable, so the
/// concrete type is spelled out. Duplicate names are impossible here: two
/// declared functions with the same name would already fail to compile.
fn create_declare(attr: &Attr, ty: &syn::Type) -> TokenStream {
    let name_str = attr.name.to_string();
    let hidden = &attr.hidden.sig.ident;

    match attr.kind {
        Kind::Static => quote! {
            defs.declare_static(#name_str, <#ty>::#hidden())
                .expect("memoattr: duplicate attribute");
        },
        Kind::Lazy => {
            let call = quote! { <#ty>::#hidden(owner) };
            let body = if attr.fallible {
                call
            } else {
                quote! { ::core::result::Result::Ok(#call) }
            };
            quote! {
                defs.declare_lazy(#name_str, |owner| #body)
                    .expect("memoattr: duplicate attribute");
            }
        }
        Kind::Parametrized => {
            let arity = attr.params.len();
            let params = &attr.params;
            let forwarded = params.iter().map(|param| quote! { #param.clone() });
            let call = quote! { <#ty>::#hidden(owner, #(#forwarded),*) };
            let body = if attr.fallible {
                call
            } else {
                quote! { ::core::result::Result::Ok(#call) }
            };
            quote! {
                defs.declare_parametrized(#name_str, #arity, |owner, args| {
                    let [#(#params),*] = args else {
                        ::core::unreachable!("arity is checked before the generator runs")
                    };
                    #body
                })
                .expect("memoattr: duplicate attribute");
            }
        }
    }
}
