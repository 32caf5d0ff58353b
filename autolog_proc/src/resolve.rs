// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directive resolution.
//!
//! Every field merges independently: the method-level value wins when set,
//! otherwise the type-level value, otherwise the hard default. A method
//! under a `skip = true` type directive can therefore opt itself back in
//! with `#[logged(skip = false)]`, and a method-level directive that sets
//! only `level` still inherits the rest from the type.

use crate::directive::{DirectiveArgs, LevelArg};

/// Fully resolved per-method configuration. No `Option`s remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMethodConfig {
    pub level: LevelArg,
    pub execution_time: bool,
    pub parameters: bool,
    pub return_value: bool,
    pub exceptions: bool,
}

impl Default for ResolvedMethodConfig {
    fn default() -> Self {
        ResolvedMethodConfig {
            level: LevelArg::Information,
            execution_time: true,
            parameters: true,
            return_value: true,
            exceptions: true,
        }
    }
}

fn merge<T: Copy>(method: Option<T>, ty: Option<T>, default: T) -> T {
    method.or(ty).unwrap_or(default)
}

/// Merges the two directives into a concrete configuration, or `None` when
/// the merged `skip` excludes the method.
pub fn resolve(
    type_directive: Option<&DirectiveArgs>,
    method_directive: Option<&DirectiveArgs>,
) -> Option<ResolvedMethodConfig> {
    let field_bool = |get: fn(&DirectiveArgs) -> Option<bool>, default: bool| {
        merge(
            method_directive.and_then(get),
            type_directive.and_then(get),
            default,
        )
    };

    if field_bool(|d| d.skip, false) {
        return None;
    }
    let defaults = ResolvedMethodConfig::default();
    Some(ResolvedMethodConfig {
        level: merge(
            method_directive.and_then(|d| d.level),
            type_directive.and_then(|d| d.level),
            defaults.level,
        ),
        execution_time: field_bool(|d| d.execution_time, defaults.execution_time),
        parameters: field_bool(|d| d.parameters, defaults.parameters),
        return_value: field_bool(|d| d.return_value, defaults.return_value),
        exceptions: field_bool(|d| d.exceptions, defaults.exceptions),
    })
}
