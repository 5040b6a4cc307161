use std::borrow::Cow;
use strata_domain::TeamId;

/// Errors raised by collective operations.
#[strata_derive::strata_error]
pub enum TransportError {
    /// The team id has no registered channel.
    #[kind(InvalidArgument)]
    #[error("Unknown team {team}{}", format_context(.context))]
    UnknownTeam { team: TeamId, context: Option<Cow<'static, str>> },

    /// The calling unit is not part of the team.
    #[kind(InvalidArgument)]
    #[error("Not a member of {team}{}", format_context(.context))]
    NotMember { team: TeamId, context: Option<Cow<'static, str>> },

    /// A team definition is unusable (duplicate id, bad member list).
    #[kind(InvalidArgument)]
    #[error("Invalid team{}: {message}", format_context(.context))]
    InvalidTeam { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Units contributed records of different sizes to one all-gather.
    #[kind(Transport)]
    #[error("Record size mismatch: expected {expected} bytes, unit {unit} sent {actual}{}", format_context(.context))]
    RecordSize { expected: usize, actual: usize, unit: usize, context: Option<Cow<'static, str>> },

    #[kind(Transport)]
    #[error("Transport failure{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
