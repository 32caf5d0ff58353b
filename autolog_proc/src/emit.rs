// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wrapper emission.
//!
//! For every resolved method this module builds a sibling method with the
//! same signature that logs entry, exit and error events around a call to
//! the original. The wrapper name comes from the original's: a `_core`
//! suffix is stripped, otherwise `_logged` is appended. A wrapper whose name
//! would collide with an existing member is skipped silently; everything
//! else in the block is still generated.
//!
//! The generated code only ever borrows arguments for the duration of the
//! entry event and forwards them untouched, masks are baked in as string
//! literals, and a method returning a syntactic `Result` gets an error arm
//! that logs the failure and re-raises it unchanged.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use std::collections::HashSet;
use syn::{
    FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Pat, ReturnType, Type,
};

use crate::directive::{
    is_helper_attr, param_args_from_attrs, sensitive_args_from_attrs, DirectiveArgs, LevelArg,
    SensitiveArgs,
};
use crate::discover::discover;
use crate::resolve::{resolve, ResolvedMethodConfig};
use crate::validate::validate_container;

/// Expands one annotated impl block into the block plus its generated
/// members and the per-type logger slot.
pub fn expand_block(mut block: ItemImpl, directive: DirectiveArgs) -> syn::Result<TokenStream> {
    let type_name = validate_container(&block)?;
    let slot = format_ident!(
        "__AUTOLOG_LOGGER_{}",
        type_name.to_string().to_uppercase(),
        span = type_name.span()
    );

    let mut taken: HashSet<String> = block
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(f) => Some(f.sig.ident.to_string()),
            ImplItem::Const(c) => Some(c.ident.to_string()),
            ImplItem::Type(t) => Some(t.ident.to_string()),
            _ => None,
        })
        .collect();

    let discovery_directive = (!directive.opt_in).then_some(&directive);
    let candidates = discover(&block, discovery_directive)?;

    let mut wrappers: Vec<ImplItemFn> = Vec::new();
    for candidate in &candidates {
        let Some(cfg) = resolve(Some(&directive), candidate.directive.as_ref()) else {
            continue;
        };
        let name = wrapper_name(&candidate.method.sig.ident.to_string());
        if taken.contains(&name) {
            continue;
        }
        let wrapper_ident = Ident::new(&name, candidate.method.sig.ident.span());
        wrappers.push(build_wrapper(
            &type_name,
            &slot,
            candidate.method,
            &cfg,
            wrapper_ident,
        )?);
        taken.insert(name);
    }

    strip_helper_attrs(&mut block);

    // setter and slot exist only to serve wrappers; a block whose every
    // method resolved to skip gains no members at all
    let has_wrappers = !wrappers.is_empty();
    if has_wrappers && !taken.contains("set_method_logger") {
        let setter: ImplItemFn = syn::parse_quote! {
            /// Installs the logger used by the wrappers generated for this
            /// type, overriding the process-wide logger.
            pub fn set_method_logger(logger: ::std::sync::Arc<dyn autolog::MethodLogger>) {
                #slot.set(logger);
            }
        };
        block.items.push(ImplItem::Fn(setter));
    }
    block.items.extend(wrappers.into_iter().map(ImplItem::Fn));

    let slot_item = if has_wrappers {
        quote! {
            #[doc(hidden)]
            static #slot: autolog::hidden::LoggerSlot = autolog::hidden::LoggerSlot::new();
        }
    } else {
        TokenStream::new()
    };
    Ok(quote! { #block #slot_item })
}

/// Removes `#[logged]`, `#[log_param]` and `#[sensitive]` from the block so
/// the re-emitted code carries no unknown attributes.
pub fn strip_helper_attrs(block: &mut ItemImpl) {
    for item in &mut block.items {
        let ImplItem::Fn(method) = item else { continue };
        method.attrs.retain(|a| !is_helper_attr(a));
        for input in &mut method.sig.inputs {
            match input {
                FnArg::Receiver(receiver) => receiver.attrs.retain(|a| !is_helper_attr(a)),
                FnArg::Typed(pat_ty) => pat_ty.attrs.retain(|a| !is_helper_attr(a)),
            }
        }
    }
}

/// Derives the wrapper name. Falls back to the `_logged` form when the
/// stripped name would not be a usable identifier (e.g. `match_core`).
fn wrapper_name(original: &str) -> String {
    const SUFFIX: &str = "_core";
    if original.len() > SUFFIX.len() && original.ends_with(SUFFIX) {
        let stripped = &original[..original.len() - SUFFIX.len()];
        if syn::parse_str::<Ident>(stripped).is_ok() {
            return stripped.to_string();
        }
    }
    format!("{original}_logged")
}

fn level_tokens(level: LevelArg) -> TokenStream {
    match level {
        LevelArg::Trace => quote!(autolog::Level::Trace),
        LevelArg::Debug => quote!(autolog::Level::Debug),
        LevelArg::Information => quote!(autolog::Level::Information),
        LevelArg::Warning => quote!(autolog::Level::Warning),
        LevelArg::Error => quote!(autolog::Level::Error),
        LevelArg::Critical => quote!(autolog::Level::Critical),
        LevelArg::Off => quote!(autolog::Level::Off),
    }
}

fn mask_tokens(mask: Option<&str>, span: Span) -> TokenStream {
    match mask {
        Some(text) => {
            let lit = LitStr::new(text, span);
            quote!(#lit)
        }
        None => quote!(autolog::DEFAULT_MASK),
    }
}

/// One typed parameter of the original signature.
struct ParamInfo {
    index: usize,
    /// Binding used in the wrapper signature and the forwarding call.
    ident: Ident,
    /// `LogParam` constructor expression; `None` when the parameter is
    /// skipped.
    log: Option<TokenStream>,
}

fn plan_params(original: &ImplItemFn) -> syn::Result<Vec<ParamInfo>> {
    let mut infos = Vec::new();
    for (index, arg) in original.sig.inputs.iter().enumerate() {
        let FnArg::Typed(pat_ty) = arg else { continue };
        let args = param_args_from_attrs(&pat_ty.attrs)?.unwrap_or_default();
        let sensitive = sensitive_args_from_attrs(&pat_ty.attrs)?;
        // Destructuring patterns get a synthetic binding in the wrapper.
        let (ident, synthesized) = match &*pat_ty.pat {
            Pat::Ident(pat) if pat.subpat.is_none() => (pat.ident.clone(), false),
            _ => (format_ident!("__arg{}", index), true),
        };

        let log = if args.skip {
            None
        } else {
            let display = args.name.clone().unwrap_or_else(|| {
                if synthesized {
                    format!("arg{index}")
                } else {
                    ident.to_string()
                }
            });
            let name_lit = LitStr::new(&display, ident.span());
            Some(match &sensitive {
                Some(s) => {
                    let mask = mask_tokens(s.mask.as_deref(), ident.span());
                    let length = if s.show_length {
                        quote! {
                            ::core::option::Option::Some(
                                autolog::fmt::KnownLength::known_length(&#ident),
                            )
                        }
                    } else {
                        quote!(::core::option::Option::None)
                    };
                    quote!(autolog::LogParam::masked(#name_lit, #mask, #length))
                }
                None => match args.max_length {
                    Some(n) if n < 0 => quote! {
                        autolog::LogParam::with_limit(
                            #name_lit, &#ident, autolog::StringLimit::Unbounded,
                        )
                    },
                    Some(n) => {
                        let cap = n as usize;
                        quote! {
                            autolog::LogParam::with_limit(
                                #name_lit, &#ident, autolog::StringLimit::Chars(#cap),
                            )
                        }
                    }
                    None => quote!(autolog::LogParam::value(#name_lit, &#ident)),
                },
            })
        };
        infos.push(ParamInfo { index, ident, log });
    }
    Ok(infos)
}

/// `true` when the last path segment of the return type is `Result`. Type
/// aliases to `core::result::Result` (including `io::Result` and
/// `anyhow::Result`) all satisfy this; the error arm then requires the
/// error type to implement `Display`.
fn fallible_return(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => match &**ty {
            Type::Path(path) => path
                .path
                .segments
                .last()
                .is_some_and(|seg| seg.ident == "Result"),
            _ => false,
        },
    }
}

fn return_value_tokens(
    cfg: &ResolvedMethodConfig,
    sensitive: Option<&SensitiveArgs>,
    binding: &Ident,
) -> TokenStream {
    if !cfg.return_value {
        return quote!(::core::option::Option::None);
    }
    match sensitive {
        Some(s) => {
            let mask = mask_tokens(s.mask.as_deref(), binding.span());
            let length = if s.show_length {
                quote! {
                    ::core::option::Option::Some(
                        autolog::fmt::KnownLength::known_length(&#binding),
                    )
                }
            } else {
                quote!(::core::option::Option::None)
            };
            quote!(::core::option::Option::Some(autolog::LoggedValue::masked(#mask, #length)))
        }
        None => quote!(::core::option::Option::Some(autolog::LoggedValue::value(&#binding))),
    }
}

fn build_wrapper(
    type_name: &Ident,
    slot: &Ident,
    original: &ImplItemFn,
    cfg: &ResolvedMethodConfig,
    wrapper_ident: Ident,
) -> syn::Result<ImplItemFn> {
    let params = plan_params(original)?;
    let sensitive_return = sensitive_args_from_attrs(&original.attrs)?;

    let orig_ident = &original.sig.ident;
    let class_lit = LitStr::new(&type_name.to_string(), type_name.span());
    let method_lit = LitStr::new(&orig_ident.to_string(), orig_ident.span());
    let level = level_tokens(cfg.level);

    // Wrapper signature: same as the original, with simple bindings and no
    // helper attributes. `const` cannot carry over; the body takes time.
    let mut sig = original.sig.clone();
    sig.ident = wrapper_ident;
    sig.constness = None;
    let mut param_iter = params.iter();
    let mut next = param_iter.next();
    for (index, input) in sig.inputs.iter_mut().enumerate() {
        match input {
            FnArg::Receiver(receiver) => receiver.attrs.clear(),
            FnArg::Typed(pat_ty) => {
                let info = match next {
                    Some(info) if info.index == index => info,
                    _ => unreachable!("typed inputs and param plan are aligned"),
                };
                pat_ty.attrs.clear();
                let ident = &info.ident;
                pat_ty.pat = Box::new(syn::parse_quote!(#ident));
                next = param_iter.next();
            }
        }
    }

    let forwards: Vec<&Ident> = params.iter().map(|p| &p.ident).collect();
    let log_exprs: Vec<&TokenStream> = params.iter().filter_map(|p| p.log.as_ref()).collect();

    let entry_call = if cfg.parameters && !log_exprs.is_empty() {
        quote! {
            let __params = [ #(#log_exprs),* ];
            __l.log_entry(__class, #method_lit, &__params, #level);
        }
    } else {
        quote! {
            __l.log_entry(__class, #method_lit, &[], #level);
        }
    };

    let timer_stmt = if cfg.execution_time {
        quote! {
            let __timer = if __enabled {
                ::core::option::Option::Some(::std::time::Instant::now())
            } else {
                ::core::option::Option::None
            };
        }
    } else {
        TokenStream::new()
    };
    let elapsed_expr = if cfg.execution_time {
        quote!(__timer.map(|__t| __t.elapsed()))
    } else {
        quote!(::core::option::Option::None)
    };

    let dot_await = original
        .sig
        .asyncness
        .map(|_| quote!(.await))
        .unwrap_or_default();
    let call = quote!(self.#orig_ident( #(#forwards),* ) #dot_await);

    let tail = if fallible_return(&original.sig.output) {
        let value_binding = Ident::new("__value", Span::call_site());
        let exit_value = return_value_tokens(cfg, sensitive_return.as_ref(), &value_binding);
        let err_log = if cfg.exceptions {
            quote! {
                if __enabled {
                    if let ::core::option::Option::Some(__l) = __logger.as_ref() {
                        let __info = autolog::ExceptionInfo::new(
                            ::std::any::type_name_of_val(&__error),
                            &__error,
                        );
                        __l.log_exception(__class, #method_lit, &__info, #elapsed_expr, #level);
                    }
                }
            }
        } else {
            TokenStream::new()
        };
        quote! {
            match #call {
                ::core::result::Result::Ok(__value) => {
                    if __enabled {
                        if let ::core::option::Option::Some(__l) = __logger.as_ref() {
                            __l.log_exit(
                                __class, #method_lit, #exit_value, #elapsed_expr, #level,
                            );
                        }
                    }
                    ::core::result::Result::Ok(__value)
                }
                ::core::result::Result::Err(__error) => {
                    #err_log
                    ::core::result::Result::Err(__error)
                }
            }
        }
    } else {
        let result_binding = Ident::new("__result", Span::call_site());
        let exit_value = return_value_tokens(cfg, sensitive_return.as_ref(), &result_binding);
        quote! {
            let __result = #call;
            if __enabled {
                if let ::core::option::Option::Some(__l) = __logger.as_ref() {
                    __l.log_exit(__class, #method_lit, #exit_value, #elapsed_expr, #level);
                }
            }
            __result
        }
    };

    let body = quote! {
        let __class: &'static str = ::core::concat!(::core::module_path!(), "::", #class_lit);
        let __logger = autolog::hidden::active_logger(&#slot);
        let __enabled = match __logger.as_ref() {
            ::core::option::Option::Some(__l) => __l.enabled(__class, #level),
            ::core::option::Option::None => false,
        };
        if __enabled {
            if let ::core::option::Option::Some(__l) = __logger.as_ref() {
                #entry_call
            }
        }
        #timer_stmt
        #tail
    };

    let doc = format!("Instrumented wrapper around [`Self::{orig_ident}`].");
    Ok(ImplItemFn {
        attrs: vec![syn::parse_quote!(#[doc = #doc])],
        vis: original.vis.clone(),
        defaultness: None,
        sig,
        block: syn::parse2(quote!({ #body }))?,
    })
}
