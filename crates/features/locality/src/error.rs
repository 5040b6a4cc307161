use std::borrow::Cow;
use strata_domain::{TeamId, UnitId};
use strata_kernel::probe::ProbeError;
use strata_transport::TransportError;

/// Error types of the locality layer.
#[strata_derive::strata_error]
pub enum LocalityError {
    #[kind(Lifecycle)]
    #[error("Team {team} is already active{}", format_context(.context))]
    AlreadyActive { team: TeamId, context: Option<Cow<'static, str>> },

    #[kind(InvalidArgument)]
    #[error("Team {team} has no locality data{}", format_context(.context))]
    UnknownTeam { team: TeamId, context: Option<Cow<'static, str>> },

    #[kind(InvalidArgument)]
    #[error("Unit {unit} is not part of {team}{}", format_context(.context))]
    UnknownUnit { team: TeamId, unit: UnitId, context: Option<Cow<'static, str>> },

    #[kind(InvalidArgument)]
    #[error("Malformed domain tag{}: {message}", format_context(.context))]
    MalformedTag { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[kind(InvalidArgument)]
    #[error("Tag '{tag}' exceeds tree depth {depth}{}", format_context(.context))]
    TagDepthExceeded { tag: String, depth: usize, context: Option<Cow<'static, str>> },

    #[kind(InvalidArgument)]
    #[error("Tag '{tag}': index {index} out of bounds for {children} children{}", format_context(.context))]
    IndexOutOfBounds { tag: String, index: usize, children: usize, context: Option<Cow<'static, str>> },

    #[kind(Resource)]
    #[error("Active team limit of {limit} reached{}", format_context(.context))]
    TeamLimit { limit: usize, context: Option<Cow<'static, str>> },

    #[kind(Resource)]
    #[error("Locality record too large{}: {message}", format_context(.context))]
    RecordTooLarge { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[kind(InvalidArgument)]
    #[error("Invalid locality record{}: {message}", format_context(.context))]
    InvalidRecord { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[kind(Transport)]
    #[error("Peer {unit} failed to provide its locality{}", format_context(.context))]
    PeerFailed { unit: UnitId, context: Option<Cow<'static, str>> },

    #[kind(InvalidArgument)]
    #[error("Record decoding failed{}: {source}", format_context(.context))]
    Record { source: postcard::Error, context: Option<Cow<'static, str>> },

    #[kind(InvalidArgument)]
    #[error("Invalid host topology{}: {message}", format_context(.context))]
    InvalidTopology { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[kind(Transport)]
    #[error("Collective operation failed{}: {source}", format_context(.context))]
    Transport { source: TransportError, context: Option<Cow<'static, str>> },

    #[error("Hardware probe failed{}: {source}", format_context(.context))]
    Probe { source: ProbeError, context: Option<Cow<'static, str>> },

    #[error("Internal locality error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
