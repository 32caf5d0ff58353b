// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed instrumentation directives parsed from attribute arguments.
//!
//! Three attribute names make up the directive surface: `#[logged(...)]` on
//! the impl block (type level) or a method (method level), `#[log_param(...)]`
//! on a parameter, and `#[sensitive(...)]` on a parameter or method. All of
//! them are inert helper attributes consumed and stripped by the `logged`
//! attribute macro.
//!
//! Directive fields are tri-state: an unset field falls back to the
//! type-level value and then to the hard default during resolution, so the
//! records here keep `Option`s and never apply defaults themselves.

use darling::ast::NestedMeta;
use darling::FromMeta;
use proc_macro2::TokenStream;
use syn::{Attribute, Meta};

/// Log level named in a directive, e.g. `level = "debug"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelArg {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
    Off,
}

impl FromMeta for LevelArg {
    fn from_string(value: &str) -> darling::Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Ok(LevelArg::Trace),
            "debug" => Ok(LevelArg::Debug),
            "information" | "info" => Ok(LevelArg::Information),
            "warning" | "warn" => Ok(LevelArg::Warning),
            "error" => Ok(LevelArg::Error),
            "critical" => Ok(LevelArg::Critical),
            "off" | "none" => Ok(LevelArg::Off),
            other => Err(darling::Error::unknown_value(other)),
        }
    }
}

/// `#[logged(...)]` as written, before resolution.
#[derive(Debug, Clone, Default, FromMeta)]
#[darling(default)]
pub struct DirectiveArgs {
    pub level: Option<LevelArg>,
    pub execution_time: Option<bool>,
    pub parameters: Option<bool>,
    pub return_value: Option<bool>,
    pub exceptions: Option<bool>,
    pub skip: Option<bool>,
    /// Container flag only: the block is scanned but carries no type-level
    /// directive, so only explicitly annotated methods are instrumented.
    pub opt_in: bool,
}

/// `#[log_param(...)]` on a single parameter.
#[derive(Debug, Clone, Default, FromMeta)]
#[darling(default)]
pub struct ParamArgs {
    pub skip: bool,
    /// Display name overriding the binding name.
    pub name: Option<String>,
    /// Per-parameter string cap; −1 means unbounded.
    pub max_length: Option<i64>,
}

/// `#[sensitive(...)]` on a parameter (masks the argument) or a method
/// (masks the return value).
#[derive(Debug, Clone, Default, FromMeta)]
#[darling(default)]
pub struct SensitiveArgs {
    pub mask: Option<String>,
    pub show_length: bool,
}

pub const LOGGED_ATTR: &str = "logged";
pub const LOG_PARAM_ATTR: &str = "log_param";
pub const SENSITIVE_ATTR: &str = "sensitive";

/// Whether `attr` is one of ours and must be stripped from re-emitted code.
pub fn is_helper_attr(attr: &Attribute) -> bool {
    attr.path().is_ident(LOGGED_ATTR)
        || attr.path().is_ident(LOG_PARAM_ATTR)
        || attr.path().is_ident(SENSITIVE_ATTR)
}

fn darling_to_syn(err: darling::Error) -> syn::Error {
    syn::Error::new(err.span(), err.to_string())
}

/// Parses an argument record from an attribute's meta. A bare path
/// (`#[logged]`, `#[sensitive]`) is the record with nothing set.
fn from_attribute<T: FromMeta + Default>(attr: &Attribute) -> syn::Result<T> {
    match &attr.meta {
        Meta::Path(_) => Ok(T::default()),
        Meta::List(list) => {
            let nested =
                NestedMeta::parse_meta_list(list.tokens.clone()).map_err(|e| syn::Error::new_spanned(list, e))?;
            T::from_list(&nested).map_err(darling_to_syn)
        }
        Meta::NameValue(nv) => Err(syn::Error::new_spanned(
            nv,
            "expected a parenthesized argument list",
        )),
    }
}

/// Parses the attribute-macro argument tokens (the part between the
/// parentheses of `#[logged(...)]` on the impl block).
pub fn directive_from_macro_args(args: TokenStream) -> syn::Result<DirectiveArgs> {
    if args.is_empty() {
        return Ok(DirectiveArgs::default());
    }
    let nested = NestedMeta::parse_meta_list(args)?;
    DirectiveArgs::from_list(&nested).map_err(darling_to_syn)
}

/// First `#[logged(...)]` among `attrs`, parsed.
pub fn directive_from_attrs(attrs: &[Attribute]) -> syn::Result<Option<DirectiveArgs>> {
    for attr in attrs {
        if attr.path().is_ident(LOGGED_ATTR) {
            return from_attribute::<DirectiveArgs>(attr).map(Some);
        }
    }
    Ok(None)
}

/// First `#[log_param(...)]` among `attrs`, parsed.
pub fn param_args_from_attrs(attrs: &[Attribute]) -> syn::Result<Option<ParamArgs>> {
    for attr in attrs {
        if attr.path().is_ident(LOG_PARAM_ATTR) {
            return from_attribute::<ParamArgs>(attr).map(Some);
        }
    }
    Ok(None)
}

/// First `#[sensitive(...)]` among `attrs`, parsed.
pub fn sensitive_args_from_attrs(attrs: &[Attribute]) -> syn::Result<Option<SensitiveArgs>> {
    for attr in attrs {
        if attr.path().is_ident(SENSITIVE_ATTR) {
            return from_attribute::<SensitiveArgs>(attr).map(Some);
        }
    }
    Ok(None)
}
