// SPDX-License-Identifier: MIT OR Apache-2.0

//! Container validation.
//!
//! Wrappers are injected as new members of the annotated impl block, so the
//! block must be an inherent impl of a named type. A trait impl (or an impl
//! for a non-path type such as a reference or tuple) cannot accept arbitrary
//! new members; annotating one is reported as a single error on the block and
//! no code is generated for it.

use syn::spanned::Spanned;
use syn::{Ident, ItemImpl, Type};

/// Checks that `block` can receive generated members and returns the name of
/// the instrumented type.
pub fn validate_container(block: &ItemImpl) -> syn::Result<Ident> {
    let type_name = named_self_type(&block.self_ty);
    if let Some((_, trait_path, _)) = &block.trait_ {
        let shown = type_name
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "this type".to_string());
        return Err(syn::Error::new(
            trait_path.span(),
            format!(
                "#[logged] cannot add wrapper methods to a trait impl; \
                 move it to an inherent `impl {shown}` block"
            ),
        ));
    }
    match type_name {
        Some(ident) => Ok(ident),
        None => Err(syn::Error::new(
            block.self_ty.span(),
            "#[logged] requires an inherent impl of a named type",
        )),
    }
}

fn named_self_type(ty: &Type) -> Option<Ident> {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => {
            type_path.path.segments.last().map(|seg| seg.ident.clone())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn inherent_impl_passes() {
        let block: ItemImpl = parse_quote! {
            impl AccountService {
                fn close(&self) {}
            }
        };
        assert_eq!(validate_container(&block).unwrap(), "AccountService");
    }

    #[test]
    fn generic_inherent_impl_uses_the_base_name() {
        let block: ItemImpl = parse_quote! {
            impl<T> Repository<T> {
                fn get(&self) {}
            }
        };
        assert_eq!(validate_container(&block).unwrap(), "Repository");
    }

    #[test]
    fn trait_impl_is_rejected() {
        let block: ItemImpl = parse_quote! {
            impl Drop for AccountService {
                fn drop(&mut self) {}
            }
        };
        let err = validate_container(&block).unwrap_err();
        assert!(err.to_string().contains("AccountService"));
        assert!(err.to_string().contains("inherent"));
    }

    #[test]
    fn non_path_self_type_is_rejected() {
        let block: ItemImpl = parse_quote! {
            impl (u32, u32) {
                fn get(&self) {}
            }
        };
        assert!(validate_container(&block).is_err());
    }
}
