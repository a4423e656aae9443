//! Layered error model (§7): a `failure`-derived `KongctlErrKind` wrapped
//! in `KongctlError`, exactly the shape of the teacher's `HError`/`VaultError`.

use failure::{Backtrace, Context, Fail};
use std::fmt::{self, Display};

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum KongctlErrKind {
    #[fail(display = "{}", _0)]
    Configuration(String),

    #[fail(display = "{}", _0)]
    Validation(String),

    #[fail(display = "{}", _0)]
    Reference(String),

    #[fail(display = "{}", _0)]
    Conflict(String),

    #[fail(display = "cannot {} \"{}\": resource is protected", _0, _1)]
    Protection(String, String),

    #[fail(display = "authentication failed: {}", _0)]
    Auth(String),

    #[fail(display = "rate limited: {}", _0)]
    RateLimit(String),

    #[fail(display = "network error: {}", _0)]
    Network(String),

    #[fail(display = "server error: {}", _0)]
    Server(String),

    #[fail(display = "external tool error: {}", _0)]
    ExternalTool(String),

    #[fail(display = "{}", _0)]
    Execution(String),
}

#[derive(Debug)]
pub struct KongctlError {
    inner: Context<KongctlErrKind>,
}

impl Fail for KongctlError {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl Display for KongctlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl KongctlError {
    pub fn kind(&self) -> &KongctlErrKind {
        self.inner.get_context()
    }
}

impl From<KongctlErrKind> for KongctlError {
    fn from(kind: KongctlErrKind) -> KongctlError {
        KongctlError { inner: Context::new(kind) }
    }
}

impl From<Context<KongctlErrKind>> for KongctlError {
    fn from(inner: Context<KongctlErrKind>) -> KongctlError {
        KongctlError { inner }
    }
}

pub type Result<T> = std::result::Result<T, failure::Error>;

pub fn configuration<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::Configuration(msg.into())).into()
}

pub fn validation<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::Validation(msg.into())).into()
}

pub fn reference<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::Reference(msg.into())).into()
}

pub fn conflict<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::Conflict(msg.into())).into()
}

pub fn protection<S: Into<String>>(action: S, resource_ref: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::Protection(action.into(), resource_ref.into())).into()
}

pub fn auth<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::Auth(msg.into())).into()
}

pub fn rate_limit<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::RateLimit(msg.into())).into()
}

pub fn network<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::Network(msg.into())).into()
}

pub fn server<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::Server(msg.into())).into()
}

pub fn external_tool<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::ExternalTool(msg.into())).into()
}

pub fn execution<S: Into<String>>(msg: S) -> failure::Error {
    KongctlError::from(KongctlErrKind::Execution(msg.into())).into()
}
