// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proc-macro implementation for the `autolog` crate. Use via autolog;
//! do not import this crate directly.
//!
//! The single entry point is the `#[logged]` attribute on an inherent impl
//! block. Expansion runs a small pipeline: parse the directive arguments,
//! validate the container, discover candidate methods, resolve each method's
//! configuration, and emit the wrappers plus the per-type logger slot. Any
//! error produces exactly one `compile_error!` alongside the (helper-attr
//! stripped) original block, so the rest of the program still type-checks.

mod directive;
mod discover;
mod emit;
mod resolve;
mod validate;

use proc_macro::TokenStream;

/// Generates logging wrapper methods for an impl block.
///
/// See the `autolog` crate documentation for the full directive surface:
/// `level`, `execution_time`, `parameters`, `return_value`, `exceptions`,
/// `skip` and `opt_in` here, plus `#[logged(...)]` overrides on methods,
/// `#[log_param(...)]` on parameters and `#[sensitive(...)]` on parameters
/// and methods.
#[proc_macro_attribute]
pub fn logged(attr: TokenStream, item: TokenStream) -> TokenStream {
    logged_impl(attr.into(), item.into()).into()
}

fn logged_impl(
    args: proc_macro2::TokenStream,
    item: proc_macro2::TokenStream,
) -> proc_macro2::TokenStream {
    let block = match syn::parse2::<syn::ItemImpl>(item.clone()) {
        Ok(block) => block,
        Err(e) => {
            let err = e.into_compile_error();
            // Not an impl block; re-emit the item untouched.
            return quote::quote!(#item #err);
        }
    };
    let expanded = directive::directive_from_macro_args(args)
        .and_then(|directive| emit::expand_block(block.clone(), directive));
    match expanded {
        Ok(tokens) => tokens,
        Err(e) => {
            let err = e.into_compile_error();
            let mut fallback = block;
            emit::strip_helper_attrs(&mut fallback);
            quote::quote!(#fallback #err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::logged_impl;
    use quote::quote;

    fn count(text: &str, needle: &str) -> usize {
        text.matches(needle).count()
    }

    #[test]
    fn trait_impl_produces_exactly_one_diagnostic_and_no_members() {
        let out = logged_impl(
            quote!(),
            quote! {
                impl Display for Svc {
                    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { Ok(()) }
                }
            },
        );
        let text = out.to_string();
        assert_eq!(count(&text, "compile_error"), 1);
        assert!(!text.contains("set_method_logger"));
        assert!(!text.contains("LoggerSlot"));
        // the original impl is still present
        assert!(text.contains("fn fmt"));
    }

    #[test]
    fn bad_directive_argument_reports_once_and_strips_helpers() {
        let out = logged_impl(
            quote!(level = "loud"),
            quote! {
                impl Svc {
                    fn run(&self, #[sensitive] secret: String) {}
                }
            },
        );
        let text = out.to_string();
        assert_eq!(count(&text, "compile_error"), 1);
        assert!(!text.contains("# [sensitive]"));
    }

    #[test]
    fn happy_path_expands_to_valid_items() {
        let out = logged_impl(
            quote!(level = "debug", execution_time = false),
            quote! {
                impl AccountService {
                    pub fn close_account_core(&self, account_id: u64) -> bool {
                        account_id != 0
                    }
                }
            },
        );
        let file = syn::parse2::<syn::File>(out).expect("expansion parses as items");
        assert_eq!(file.items.len(), 2); // the impl and the slot static
    }

    #[test]
    fn non_impl_item_is_preserved_next_to_the_error() {
        let out = logged_impl(quote!(), quote!(fn free_standing() {}));
        let text = out.to_string();
        assert_eq!(count(&text, "compile_error"), 1);
        assert!(text.contains("fn free_standing"));
    }
}
