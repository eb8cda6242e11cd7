// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros shared by the runner crates.
//!
//! - [`simple_display!`]: `Display` for fieldless or tuple enums via string literals
//! - [`setters!`]: chained `with`-style setters inside an existing `impl` block

/// Implement `Display` by mapping each variant to a fixed string.
///
/// ```ignore
/// allci_core::simple_display! {
///     Stage {
///         Bootstrap => "bootstrap",
///         Other(..) => "other",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                })
            }
        }
    };
}

/// Generate consuming setters for plain data structs.
///
/// - `into { field: Type }` takes `impl Into<Type>`
/// - `set { field: Type }` takes `Type` as is
/// - `option { field: Type }` stores `Some(v.into())` into an `Option<Type>` field
///
/// ```ignore
/// impl ComponentSpec {
///     allci_core::setters! {
///         into { image_name: String }
///         set { privileged: bool }
///         option { branch: String }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    (
        $(into {
            $( $into_field:ident : $into_ty:ty ),* $(,)?
        })?
        $(set {
            $( $set_field:ident : $set_ty:ty ),* $(,)?
        })?
        $(option {
            $( $opt_field:ident : $opt_ty:ty ),* $(,)?
        })?
    ) => {
        $($(
            pub fn $into_field(mut self, v: impl Into<$into_ty>) -> Self {
                self.$into_field = v.into();
                self
            }
        )*)?

        $($(
            pub fn $set_field(mut self, v: $set_ty) -> Self {
                self.$set_field = v;
                self
            }
        )*)?

        $($(
            pub fn $opt_field(mut self, v: impl Into<$opt_ty>) -> Self {
                self.$opt_field = Some(v.into());
                self
            }
        )*)?
    };
}
