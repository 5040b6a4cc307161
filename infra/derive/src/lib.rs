#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the Strata crates: the error enum attribute used by
//! every fallible layer and the runtime bootstrap attribute used by the binaries.
//!
//! ## Usage
//! Consumers depend on the crate through `strata-runtime` (for `main`) or directly:
//! ```toml
//! [dependencies]
//! strata-derive = { path = "../infra/derive" }
//! ```
//!
//! Examples below are `ignore`d; the trybuild suite under `tests/` compiles them.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro to bootstrap the Tokio runtime used by Strata binaries.
///
/// Turns an `async fn main` into a plain `fn main` that builds a runtime from one of
/// the `strata_runtime::RuntimeConfig` presets and blocks on the body.
///
/// # Arguments
///
/// An optional preset naming a `RuntimeConfig` constructor (`node`, `simulation`,
/// `default` when omitted), followed by `setting = value` overrides for
/// `worker_threads`, `stack_size` and `thread_name`.
///
/// # Examples
///
/// ```rust,ignore
/// #[strata_runtime::main(simulation, worker_threads = 8)]
/// async fn main() -> anyhow::Result<()> {
/// # Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for defining the error enums of Strata crates.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless present.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to `Result<T, Self>` and to `Result<T, Source>` for every wrapped source error.
/// * **Standard Conversions**: Implements `From<Source>` for variants containing a
///   `source` field (or one marked `#[source]`/`#[from]`).
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant is present.
/// * **Classification**: A `kind()` accessor returning `strata_domain::ErrorKind`. Each
///   variant may carry `#[kind(InvalidArgument | Resource | Transport | Lifecycle | Internal)]`;
///   unannotated variants classify as `Internal`. The attribute is removed from the output.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants.
/// 2. Variants that wrap a source must also carry `context: Option<Cow<'static, str>>`.
/// 3. The consuming crate must depend on `strata-domain` and `thiserror`.
///
/// # Example
///
/// ```rust,ignore
/// use strata_derive::strata_error;
/// use std::borrow::Cow;
///
/// #[strata_error]
/// pub enum ExchangeError {
///     #[kind(Transport)]
///     #[error("Collective failed{}: {source}", format_context(.context))]
///     Collective { source: TransportError, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn strata_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
