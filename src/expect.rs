//! The panicking assertion entry point.
//!
//! [`expect`] wraps an instrumented handler in an [`Expect`] guard whose
//! methods mirror the assertion catalog one-to-one. A failed comparison
//! panics with the full diagnostic message; a violated precondition (wrong
//! handler kind, handler built without the needed recorder, empty pattern)
//! also panics, but with the error's own message, because it signals a
//! mistake in the test rather than in the code under test.

use crate::assertions::{self, MatcherContext, Outcome, RequestPattern};
use crate::error::AssertionError;
use crate::facets::Facet;
use crate::handler::InstrumentedHandler;
use crate::matcher::Expected;

/// Starts an assertion chain over a handler's recorded traffic.
pub fn expect(handler: &dyn InstrumentedHandler) -> Expect<'_> {
    Expect {
        handler,
        is_not: false,
    }
}

/// Assertion guard returned by [`expect`].
#[derive(Clone, Copy)]
pub struct Expect<'h> {
    handler: &'h dyn InstrumentedHandler,
    is_not: bool,
}

macro_rules! impl_facet_assertions {
    ($(($any_fn:ident, $nth_fn:ident, $facet:expr, $noun:literal)),* $(,)?) => {
        $(
            #[doc = concat!("Asserts that some recorded request carried the expected ", $noun, ".")]
            #[track_caller]
            pub fn $any_fn<E: Into<Expected>>(&self, expected: E) {
                let expected = expected.into();
                self.check(assertions::to_have_been_requested_with_facet(
                    &self.ctx(),
                    self.handler,
                    $facet,
                    &expected,
                ));
            }

            #[doc = concat!("Asserts that the nth recorded request (1-based) carried the expected ", $noun, ".")]
            #[track_caller]
            pub fn $nth_fn<E: Into<Expected>>(&self, n: usize, expected: E) {
                let expected = expected.into();
                self.check(assertions::to_have_been_nth_requested_with_facet(
                    &self.ctx(),
                    self.handler,
                    n,
                    $facet,
                    &expected,
                ));
            }
        )*
    };
}

impl Expect<'_> {
    /// Inverts the sense of the next assertion.
    #[must_use]
    pub fn not(mut self) -> Self {
        self.is_not = !self.is_not;
        self
    }

    fn ctx(&self) -> MatcherContext {
        MatcherContext {
            is_not: self.is_not,
        }
    }

    #[track_caller]
    #[allow(clippy::panic)]
    fn check(&self, result: Result<Outcome, AssertionError>) {
        match result {
            Ok(outcome) => {
                if outcome.pass == self.is_not {
                    panic!("{}", outcome.message);
                }
            }
            Err(err) => panic!("{err}"),
        }
    }

    /// Asserts that the handler resolved at least one request.
    #[track_caller]
    pub fn to_have_been_requested(&self) {
        self.check(assertions::to_have_been_requested(&self.ctx(), self.handler));
    }

    /// Asserts that the handler resolved exactly `times` requests.
    #[track_caller]
    pub fn to_have_been_requested_times(&self, times: usize) {
        self.check(assertions::to_have_been_requested_times(
            &self.ctx(),
            self.handler,
            times,
        ));
    }

    /// Asserts that some recorded request matched every facet the pattern
    /// constrains, on the same call.
    #[track_caller]
    pub fn to_have_been_requested_with(&self, pattern: &RequestPattern) {
        self.check(assertions::to_have_been_requested_with(
            &self.ctx(),
            self.handler,
            pattern,
        ));
    }

    /// Asserts that the nth recorded request (1-based) matched every facet
    /// the pattern constrains.
    #[track_caller]
    pub fn to_have_been_nth_requested_with(&self, n: usize, pattern: &RequestPattern) {
        self.check(assertions::to_have_been_nth_requested_with(
            &self.ctx(),
            self.handler,
            n,
            pattern,
        ));
    }

    impl_facet_assertions!(
        (
            to_have_been_requested_with_body,
            to_have_been_nth_requested_with_body,
            Facet::Body,
            "raw body text"
        ),
        (
            to_have_been_requested_with_json_body,
            to_have_been_nth_requested_with_json_body,
            Facet::JsonBody,
            "JSON body"
        ),
        (
            to_have_been_requested_with_headers,
            to_have_been_nth_requested_with_headers,
            Facet::Headers,
            "headers"
        ),
        (
            to_have_been_requested_with_query_string,
            to_have_been_nth_requested_with_query_string,
            Facet::QueryString,
            "query string"
        ),
        (
            to_have_been_requested_with_hash,
            to_have_been_nth_requested_with_hash,
            Facet::Hash,
            "hash"
        ),
        (
            to_have_been_requested_with_path_parameters,
            to_have_been_nth_requested_with_path_parameters,
            Facet::PathParameters,
            "path parameters"
        ),
        (
            to_have_been_requested_with_gql_variables,
            to_have_been_nth_requested_with_gql_variables,
            Facet::GqlVariables,
            "GraphQL variables"
        ),
        (
            to_have_been_requested_with_gql_query,
            to_have_been_nth_requested_with_gql_query,
            Facet::GqlQuery,
            "GraphQL query"
        ),
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::intercept::InterceptBuilder;
    use crate::request::{IncomingRequest, MockResponse};
    use serde_json::json;

    async fn requested_handler() -> crate::handler::HttpHandler {
        let handler = InterceptBuilder::all()
            .http()
            .post("/users", |_info| async { MockResponse::json(&json!({"id": 1})) })
            .unwrap();
        let request = IncomingRequest::post("http://test.local/users")
            .unwrap()
            .json(&json!({"name": "John"}));
        handler.handle(&request).await.unwrap();
        handler
    }

    #[tokio::test]
    async fn test_passing_assertions_do_not_panic() {
        let handler = requested_handler().await;
        expect(&handler).to_have_been_requested();
        expect(&handler).to_have_been_requested_times(1);
        expect(&handler).to_have_been_requested_with_json_body(json!({"name": "John"}));
        expect(&handler).to_have_been_nth_requested_with_json_body(1, json!({"name": "John"}));
        expect(&handler).not().to_have_been_requested_times(2);
    }

    #[tokio::test]
    #[should_panic(expected = "Expected /users to have been requested 2 times, \
                              but it was requested 1 times")]
    async fn test_failed_count_panics_with_diagnostic() {
        let handler = requested_handler().await;
        expect(&handler).to_have_been_requested_times(2);
    }

    #[tokio::test]
    #[should_panic(expected = "Expected /users to not have been requested")]
    async fn test_negated_failure_panics_with_negated_wording() {
        let handler = requested_handler().await;
        expect(&handler).not().to_have_been_requested();
    }

    #[tokio::test]
    #[should_panic(expected = "is not instrumented with a")]
    async fn test_missing_recorder_panics_as_programmer_error() {
        let handler = InterceptBuilder::new()
            .http()
            .get("/bare", |_info| async { MockResponse::text("ok") })
            .unwrap();
        expect(&handler).to_have_been_requested();
    }

    #[tokio::test]
    #[should_panic(expected = "to be a GraphQL handler, but it is a HTTP handler")]
    async fn test_gql_assertion_on_http_handler_panics() {
        let handler = requested_handler().await;
        expect(&handler).to_have_been_requested_with_gql_variables(json!({}));
    }

    #[tokio::test]
    async fn test_composite_pattern_through_expect() {
        let handler = requested_handler().await;
        let pattern = RequestPattern::new()
            .json_body(json!({"name": "John"}))
            .query_string("");
        expect(&handler).to_have_been_requested_with(&pattern);
    }
}
