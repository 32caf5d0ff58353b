// SPDX-License-Identifier: MIT OR Apache-2.0

//! Method discovery.
//!
//! Two searches run over the impl block and their results are unioned: one
//! for methods covered by the type-level directive, one for methods carrying
//! their own `#[logged]`. A method found by both is a single candidate that
//! keeps its method-level directive for resolution. Associated functions
//! without a `self` receiver are never candidates; logging needs an instance
//! to hang the call on.

use syn::{ImplItem, ImplItemFn, ItemImpl};

use crate::directive::{directive_from_attrs, DirectiveArgs};

/// One method slated for instrumentation, in declaration order.
#[derive(Debug)]
pub struct MethodCandidate<'a> {
    /// Index into `ItemImpl::items`.
    pub index: usize,
    pub method: &'a ImplItemFn,
    /// The method's own `#[logged(...)]`, if it wrote one.
    pub directive: Option<DirectiveArgs>,
}

/// Finds every candidate method of `block`. `type_directive` is `Some` when
/// the block-level `#[logged(...)]` applies to all methods (i.e. it was not
/// declared `opt_in`).
pub fn discover<'a>(
    block: &'a ItemImpl,
    type_directive: Option<&DirectiveArgs>,
) -> syn::Result<Vec<MethodCandidate<'a>>> {
    let mut candidates = Vec::new();
    for (index, item) in block.items.iter().enumerate() {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        if method.sig.receiver().is_none() {
            continue;
        }
        let directive = directive_from_attrs(&method.attrs)?;
        if directive.is_some() || type_directive.is_some() {
            candidates.push(MethodCandidate {
                index,
                method,
                directive,
            });
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn names(candidates: &[MethodCandidate<'_>]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| c.method.sig.ident.to_string())
            .collect()
    }

    #[test]
    fn type_directive_covers_every_instance_method() {
        let block: ItemImpl = parse_quote! {
            impl Svc {
                pub fn alpha(&self) {}
                fn beta(&mut self, n: u32) -> u32 { n }
                fn helper(n: u32) -> u32 { n }
                const LIMIT: usize = 4;
            }
        };
        let found = discover(&block, Some(&DirectiveArgs::default())).unwrap();
        assert_eq!(names(&found), ["alpha", "beta"]);
    }

    #[test]
    fn opt_in_finds_only_annotated_methods() {
        let block: ItemImpl = parse_quote! {
            impl Svc {
                pub fn alpha(&self) {}
                #[logged(level = "trace")]
                fn beta(&self) {}
            }
        };
        let found = discover(&block, None).unwrap();
        assert_eq!(names(&found), ["beta"]);
        assert!(found[0].directive.is_some());
    }

    #[test]
    fn both_searches_yield_one_candidate_per_method() {
        let block: ItemImpl = parse_quote! {
            impl Svc {
                #[logged(parameters = false)]
                fn alpha(&self) {}
            }
        };
        let found = discover(&block, Some(&DirectiveArgs::default())).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].directive.as_ref().unwrap().parameters, Some(false));
    }

    #[test]
    fn annotated_associated_function_is_ignored() {
        let block: ItemImpl = parse_quote! {
            impl Svc {
                #[logged]
                fn make() -> Self { Svc }
            }
        };
        assert!(discover(&block, None).unwrap().is_empty());
    }
}
