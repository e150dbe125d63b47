//! Call-recording and assertion library for mock HTTP and GraphQL handlers.
//!
//! Wrap mock handler declarations with an [`InterceptBuilder`] and the
//! resulting handlers record, per request, the facets your active assertions
//! need: raw body, parsed JSON body, normalized headers, query string, hash,
//! captured path parameters, and for GraphQL handlers the operation's
//! variables and query document. [`expect`] then asserts over the recorded
//! traffic with jest-style matchers that panic with a full call-by-call
//! diagnostic dump on failure.
//!
//! # Features
//!
//! - Instrumented HTTP handler constructors (`get`, `post`, ..., `all`) with
//!   `:param` path patterns and trailing `*` wildcards, plus GraphQL `query`
//!   and `mutation` constructors matched by operation kind and name.
//! - Per-facet append-only [`CallRecorder`]s with guaranteed index alignment
//!   across facets of the same handler.
//! - Existential ("some call matched") and 1-based nth-call assertions for
//!   every facet, and a composite [`RequestPattern`] that must match all of
//!   its facets on the same call.
//! - Asymmetric matchers ([`matcher::any`], [`matcher::string_containing`],
//!   [`matcher::string_matching`], [`matcher::object_containing`],
//!   [`matcher::array_containing`]) nestable anywhere inside an expectation.
//! - A distinct programmer-error path: asserting a GraphQL facet on an HTTP
//!   handler or asserting on a handler built without the needed recorder is
//!   reported as a test bug, never as a failed assertion.
//!
//! # Quick Start
//!
//! ```
//! use mock_intercept::{expect, InterceptBuilder, IncomingRequest, MockResponse};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let http = InterceptBuilder::all().http();
//! let handler = http
//!     .post("/users", |_info| async { MockResponse::json(&json!({"id": 1})) })
//!     .unwrap();
//!
//! let request = IncomingRequest::post("http://localhost/users")
//!     .unwrap()
//!     .json(&json!({"name": "John"}));
//! handler.handle(&request).await.unwrap();
//!
//! expect(&handler).to_have_been_requested();
//! expect(&handler).to_have_been_requested_with_json_body(json!({"name": "John"}));
//! # }
//! ```

pub mod assertions;
mod error;
mod expect;
mod facets;
mod format;
mod handler;
mod intercept;
pub mod matcher;
mod recorder;
mod request;

pub use assertions::{Assertion, MatcherContext, Outcome, RequestPattern, ASSERTIONS};
pub use error::{AssertionError, InterceptError};
pub use expect::{expect, Expect};
pub use facets::Facet;
pub use handler::{
    BoxFuture, GraphQlHandler, GraphQlResolverInfo, HandlerKind, HttpHandler, HttpResolverInfo,
    InstrumentedHandler,
};
pub use intercept::{GraphqlIntercept, HttpIntercept, InterceptBuilder};
pub use matcher::{AsymmetricMatcher, Expected};
pub use recorder::CallRecorder;
pub use request::{GraphQlOperation, IncomingRequest, MockResponse, OperationKind};
