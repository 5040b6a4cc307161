use std::borrow::Cow;
use strata_derive::strata_error;

#[strata_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<(), DemoError> {
    Err::<(), _>(std::io::Error::other("disk"))?;
    Ok(())
}

fn main() {
    let err = read().context("reading record").unwrap_err();
    assert_eq!(err.to_string(), "IO error (reading record): disk");

    let internal: DemoError = "broken".into();
    assert_eq!(internal.to_string(), "Internal error: broken");
}
