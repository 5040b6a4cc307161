use std::borrow::Cow;
use strata_derive::strata_error;
use strata_domain::ErrorKind;

#[strata_error]
pub enum LookupError {
    #[kind(InvalidArgument)]
    #[error("Bad key{}: {message}", format_context(.context))]
    BadKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[kind(Lifecycle)]
    #[error("Not ready")]
    NotReady {},

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let bad = LookupError::BadKey { message: "x".into(), context: None };
    assert_eq!(bad.kind(), ErrorKind::InvalidArgument);
    assert_eq!(LookupError::NotReady {}.kind(), ErrorKind::Lifecycle);
    assert_eq!(LookupError::from("boom").kind(), ErrorKind::Internal);
}
