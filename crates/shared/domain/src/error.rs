use serde::Serialize;
use strum_macros::{Display, IntoStaticStr};

/// Coarse failure category shared by all Strata error enums.
///
/// Every error type generated with `#[strata_error]` exposes it through `kind()`, so
/// callers can branch on the category without matching crate-specific variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller supplied something that does not name a valid object.
    InvalidArgument,
    /// A bounded resource is exhausted or a size limit is exceeded.
    Resource,
    /// The collective layer failed; surfaced as-is and never retried.
    Transport,
    /// The operation is not valid in the current lifecycle state.
    Lifecycle,
    /// A broken internal invariant.
    Internal,
}
