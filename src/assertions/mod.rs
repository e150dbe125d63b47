//! The assertion catalog and its evaluation predicates.
//!
//! Each registered [`Assertion`] pairs a name with the facets its evaluation
//! reads; the [`InterceptBuilder`](crate::InterceptBuilder) uses the catalog
//! to decide which recorders handlers are built with. Predicates are plain
//! functions over an [`InstrumentedHandler`]: they compute a pass/fail
//! [`Outcome`] with a diagnostic message, and reserve errors for the two
//! programmer-error preconditions (wrong handler kind, missing recorder).

mod facet;
mod request_pattern;
mod requested;

pub use facet::{to_have_been_nth_requested_with_facet, to_have_been_requested_with_facet};
pub use request_pattern::{
    to_have_been_nth_requested_with, to_have_been_requested_with, RequestPattern,
};
pub use requested::{to_have_been_requested, to_have_been_requested_times};

use crate::error::AssertionError;
use crate::facets::Facet;
use crate::handler::{HandlerKind, InstrumentedHandler};
use crate::recorder::CallRecorder;

/// The negation context the host runner binds into a predicate call.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatcherContext {
    /// True when the assertion runs under the runner's negation protocol.
    /// Predicates still compute the positive-sense `pass`; only the message
    /// wording flips.
    pub is_not: bool,
}

impl MatcherContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn polarity(&self) -> &'static str {
        if self.is_not { " not" } else { "" }
    }
}

/// A predicate verdict: the positive-sense pass boolean plus the diagnostic
/// message rendered for the current polarity.
#[derive(Debug)]
pub struct Outcome {
    pub pass: bool,
    pub message: String,
}

/// Which handler families an assertion applies to.
#[derive(Debug, Clone, Copy)]
pub struct AssertionModes {
    pub http: bool,
    pub graphql: bool,
}

const BOTH: AssertionModes = AssertionModes {
    http: true,
    graphql: true,
};
const GRAPHQL_ONLY: AssertionModes = AssertionModes {
    http: false,
    graphql: true,
};

/// One catalog entry: the public assertion name, the modes it installs on,
/// and the facets its evaluation reads.
#[derive(Debug, Clone, Copy)]
pub struct Assertion {
    pub name: &'static str,
    pub modes: AssertionModes,
    pub facets: &'static [Facet],
}

const COMPOSITE_FACETS: &[Facet] = &[
    Facet::Requested,
    Facet::Body,
    Facet::JsonBody,
    Facet::Headers,
    Facet::QueryString,
    Facet::Hash,
    Facet::PathParameters,
    Facet::GqlVariables,
    Facet::GqlQuery,
];

/// The full assertion catalog.
pub const ASSERTIONS: &[Assertion] = &[
    Assertion {
        name: "to_have_been_requested",
        modes: BOTH,
        facets: &[Facet::Requested],
    },
    Assertion {
        name: "to_have_been_requested_times",
        modes: BOTH,
        facets: &[Facet::Requested],
    },
    Assertion {
        name: "to_have_been_requested_with",
        modes: BOTH,
        facets: COMPOSITE_FACETS,
    },
    Assertion {
        name: "to_have_been_nth_requested_with",
        modes: BOTH,
        facets: COMPOSITE_FACETS,
    },
    Assertion {
        name: "to_have_been_requested_with_body",
        modes: BOTH,
        facets: &[Facet::Body],
    },
    Assertion {
        name: "to_have_been_nth_requested_with_body",
        modes: BOTH,
        facets: &[Facet::Body],
    },
    Assertion {
        name: "to_have_been_requested_with_json_body",
        modes: BOTH,
        facets: &[Facet::JsonBody],
    },
    Assertion {
        name: "to_have_been_nth_requested_with_json_body",
        modes: BOTH,
        facets: &[Facet::JsonBody],
    },
    Assertion {
        name: "to_have_been_requested_with_headers",
        modes: BOTH,
        facets: &[Facet::Headers],
    },
    Assertion {
        name: "to_have_been_nth_requested_with_headers",
        modes: BOTH,
        facets: &[Facet::Headers],
    },
    Assertion {
        name: "to_have_been_requested_with_query_string",
        modes: BOTH,
        facets: &[Facet::QueryString],
    },
    Assertion {
        name: "to_have_been_nth_requested_with_query_string",
        modes: BOTH,
        facets: &[Facet::QueryString],
    },
    Assertion {
        name: "to_have_been_requested_with_hash",
        modes: BOTH,
        facets: &[Facet::Hash],
    },
    Assertion {
        name: "to_have_been_nth_requested_with_hash",
        modes: BOTH,
        facets: &[Facet::Hash],
    },
    Assertion {
        name: "to_have_been_requested_with_path_parameters",
        modes: BOTH,
        facets: &[Facet::PathParameters],
    },
    Assertion {
        name: "to_have_been_nth_requested_with_path_parameters",
        modes: BOTH,
        facets: &[Facet::PathParameters],
    },
    Assertion {
        name: "to_have_been_requested_with_gql_variables",
        modes: GRAPHQL_ONLY,
        facets: &[Facet::GqlVariables],
    },
    Assertion {
        name: "to_have_been_nth_requested_with_gql_variables",
        modes: GRAPHQL_ONLY,
        facets: &[Facet::GqlVariables],
    },
    Assertion {
        name: "to_have_been_requested_with_gql_query",
        modes: GRAPHQL_ONLY,
        facets: &[Facet::GqlQuery],
    },
    Assertion {
        name: "to_have_been_nth_requested_with_gql_query",
        modes: GRAPHQL_ONLY,
        facets: &[Facet::GqlQuery],
    },
];

/// The shared precondition check: the handler must be able to record the
/// facet (kind check) and must actually carry its recorder (instrumented
/// through the builder).
pub(crate) fn require_recorder<'h>(
    handler: &'h dyn InstrumentedHandler,
    facet: Facet,
) -> Result<&'h CallRecorder, AssertionError> {
    if !facet.supported_by(handler.kind()) {
        return Err(AssertionError::WrongHandlerKind {
            name: handler.name().to_owned(),
            expected: HandlerKind::GraphQl,
            actual: handler.kind(),
        });
    }
    handler
        .recorder(facet)
        .ok_or_else(|| AssertionError::NotInstrumented {
            name: handler.name().to_owned(),
            facet,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_every_assertion_once() {
        assert_eq!(ASSERTIONS.len(), 20);
        let mut names: Vec<&str> = ASSERTIONS.iter().map(|a| a.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 20);
    }

    #[test]
    fn test_gql_only_assertions_do_not_install_on_http() {
        for assertion in ASSERTIONS {
            let gql_only = assertion
                .facets
                .iter()
                .all(|f| matches!(f, Facet::GqlVariables | Facet::GqlQuery));
            if gql_only {
                assert!(!assertion.modes.http, "{} installs on HTTP", assertion.name);
            }
        }
    }
}
