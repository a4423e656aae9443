use failure::{Backtrace, Context, Fail};
use std::fmt::{self, Display};

/// Error kinds surfaced by the loader, reference resolver and validator.
///
/// Mirrors the shape of `HErrKind`/`VErrKind` from the CLI crate: a plain
/// `Fail` enum wrapped in a `Context`, rather than `error_chain`.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum DefErrKind {
    #[fail(display = "{}", _0)]
    Configuration(String),

    #[fail(display = "{}", _0)]
    Validation(String),

    #[fail(display = "{}", _0)]
    Reference(String),

    #[fail(display = "unsupported YAML tag '{}'", _0)]
    UnsupportedTag(String),

    #[fail(display = "path resolves outside base dir: {}", _0)]
    PathEscapesBaseDir(String),
}

#[derive(Debug)]
pub struct DefError {
    inner: Context<DefErrKind>,
}

impl Fail for DefError {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl Display for DefError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl DefError {
    pub fn kind(&self) -> &DefErrKind {
        self.inner.get_context()
    }
}

impl From<DefErrKind> for DefError {
    fn from(kind: DefErrKind) -> DefError {
        DefError { inner: Context::new(kind) }
    }
}

impl From<Context<DefErrKind>> for DefError {
    fn from(inner: Context<DefErrKind>) -> DefError {
        DefError { inner }
    }
}

pub type Result<T> = std::result::Result<T, failure::Error>;

/// Shorthand constructors used throughout the crate instead of `bail!`,
/// since these kinds carry structured data callers downstream may want to
/// match on (the friendly error renderer in `kongctl` does).
pub fn configuration<S: Into<String>>(msg: S) -> failure::Error {
    DefError::from(DefErrKind::Configuration(msg.into())).into()
}

pub fn validation<S: Into<String>>(msg: S) -> failure::Error {
    DefError::from(DefErrKind::Validation(msg.into())).into()
}

pub fn reference<S: Into<String>>(msg: S) -> failure::Error {
    DefError::from(DefErrKind::Reference(msg.into())).into()
}
