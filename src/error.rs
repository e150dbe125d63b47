use crate::facets::Facet;
use crate::handler::HandlerKind;
use thiserror::Error;

/// Programmer errors raised by assertion predicates.
///
/// These are deliberately distinct from a failed expectation: they mean the
/// test itself is wrong (asserting on the wrong handler kind, or on a
/// handler that never went through the interception builder), not that the
/// expectation was unmet.
#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("expected `{name}` to be a {expected} handler, but it is a {actual} handler")]
    WrongHandlerKind {
        name: String,
        expected: HandlerKind,
        actual: HandlerKind,
    },

    #[error("handler `{name}` is not instrumented with a {facet} recorder")]
    NotInstrumented { name: String, facet: Facet },

    #[error("request pattern has no facet constraints")]
    EmptyPattern,
}

/// Errors building handlers or requests.
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
