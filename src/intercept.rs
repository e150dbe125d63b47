use crate::assertions::{Assertion, ASSERTIONS};
use crate::error::InterceptError;
use crate::facets::Facet;
use crate::handler::{
    BoxFuture, GraphQlHandler, GraphQlResolverInfo, HandlerKind, HttpHandler, HttpResolverInfo,
};
use crate::request::{MockResponse, OperationKind, PathPattern};
use http::Method;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

/// The composition step that decides which facets handlers will record.
///
/// Instead of patching shared constructor tables in place, the builder is
/// applied once at a well-defined initialization boundary and produces
/// freshly-configured constructor factories, so the set of active assertions
/// is an explicit, testable contract and nothing leaks across tests.
///
/// # Example
///
/// ```
/// use mock_intercept::{InterceptBuilder, MockResponse};
/// use serde_json::json;
///
/// let http = InterceptBuilder::all().http();
/// let handler = http
///     .post("/users", |_info| async { MockResponse::json(&json!({"ok": true})) })
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterceptBuilder {
    http_facets: BTreeSet<Facet>,
    gql_facets: BTreeSet<Facet>,
}

impl InterceptBuilder {
    /// A builder with no assertions activated. Handlers built from it carry
    /// no recorders and cannot be asserted on.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with every registered assertion activated.
    pub fn all() -> Self {
        ASSERTIONS
            .iter()
            .fold(Self::new(), |builder, assertion| {
                builder.with_assertion(assertion)
            })
    }

    /// Activates one assertion's facets, per mode, skipping facets the mode
    /// can never record.
    #[must_use]
    pub fn with_assertion(mut self, assertion: &Assertion) -> Self {
        for facet in assertion.facets {
            if assertion.modes.http && facet.supported_by(HandlerKind::Http) {
                self.http_facets.insert(*facet);
            }
            if assertion.modes.graphql && facet.supported_by(HandlerKind::GraphQl) {
                self.gql_facets.insert(*facet);
            }
        }
        self
    }

    /// The facets HTTP handlers built from this builder will record.
    pub fn http_facets(&self) -> &BTreeSet<Facet> {
        &self.http_facets
    }

    /// The facets GraphQL handlers built from this builder will record.
    pub fn gql_facets(&self) -> &BTreeSet<Facet> {
        &self.gql_facets
    }

    /// Constructor factory for instrumented HTTP handlers.
    pub fn http(&self) -> HttpIntercept {
        HttpIntercept {
            facets: self.http_facets.clone(),
        }
    }

    /// Constructor factory for instrumented GraphQL handlers.
    pub fn graphql(&self) -> GraphqlIntercept {
        GraphqlIntercept {
            facets: self.gql_facets.clone(),
        }
    }
}

macro_rules! impl_http_constructors {
    ($(($fn_name:ident, $method:expr, $doc:literal)),* $(,)?) => {
        $(
            #[doc = $doc]
            ///
            /// # Errors
            ///
            /// Returns an error when `path` is not a valid path pattern.
            pub fn $fn_name<F, Fut>(
                &self,
                path: &str,
                resolver: F,
            ) -> Result<HttpHandler, InterceptError>
            where
                F: Fn(HttpResolverInfo) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = MockResponse> + Send + 'static,
            {
                self.handler($method, path, resolver)
            }
        )*
    };
}

/// Builds instrumented HTTP handlers with an identical external signature to
/// an uninstrumented constructor: a path pattern plus a resolver.
#[derive(Debug, Clone)]
pub struct HttpIntercept {
    facets: BTreeSet<Facet>,
}

impl HttpIntercept {
    impl_http_constructors!(
        (get, Some(Method::GET), "Declares a handler for `GET` requests."),
        (post, Some(Method::POST), "Declares a handler for `POST` requests."),
        (put, Some(Method::PUT), "Declares a handler for `PUT` requests."),
        (patch, Some(Method::PATCH), "Declares a handler for `PATCH` requests."),
        (delete, Some(Method::DELETE), "Declares a handler for `DELETE` requests."),
        (head, Some(Method::HEAD), "Declares a handler for `HEAD` requests."),
        (options, Some(Method::OPTIONS), "Declares a handler for `OPTIONS` requests."),
        (all, None, "Declares a handler matching any request method."),
    );

    fn handler<F, Fut>(
        &self,
        method: Option<Method>,
        path: &str,
        resolver: F,
    ) -> Result<HttpHandler, InterceptError>
    where
        F: Fn(HttpResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MockResponse> + Send + 'static,
    {
        let pattern = PathPattern::parse(path)?;
        tracing::debug!(path, facets = self.facets.len(), "instrumenting HTTP handler");
        Ok(HttpHandler::new(
            method,
            pattern,
            &self.facets,
            box_http_resolver(resolver),
        ))
    }
}

/// Builds instrumented GraphQL handlers from an operation name plus a
/// resolver.
#[derive(Debug, Clone)]
pub struct GraphqlIntercept {
    facets: BTreeSet<Facet>,
}

impl GraphqlIntercept {
    /// Declares a handler for the named query operation.
    pub fn query<F, Fut>(
        &self,
        operation: &str,
        resolver: F,
    ) -> Result<GraphQlHandler, InterceptError>
    where
        F: Fn(GraphQlResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MockResponse> + Send + 'static,
    {
        self.handler(OperationKind::Query, operation, resolver)
    }

    /// Declares a handler for the named mutation operation.
    pub fn mutation<F, Fut>(
        &self,
        operation: &str,
        resolver: F,
    ) -> Result<GraphQlHandler, InterceptError>
    where
        F: Fn(GraphQlResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MockResponse> + Send + 'static,
    {
        self.handler(OperationKind::Mutation, operation, resolver)
    }

    fn handler<F, Fut>(
        &self,
        kind: OperationKind,
        operation: &str,
        resolver: F,
    ) -> Result<GraphQlHandler, InterceptError>
    where
        F: Fn(GraphQlResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MockResponse> + Send + 'static,
    {
        tracing::debug!(
            operation,
            %kind,
            facets = self.facets.len(),
            "instrumenting GraphQL handler",
        );
        Ok(GraphQlHandler::new(
            kind,
            operation.to_owned(),
            &self.facets,
            box_gql_resolver(resolver),
        ))
    }
}

fn box_http_resolver<F, Fut>(
    resolver: F,
) -> Arc<dyn Fn(HttpResolverInfo) -> BoxFuture<MockResponse> + Send + Sync>
where
    F: Fn(HttpResolverInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    Arc::new(move |info| Box::pin(resolver(info)))
}

fn box_gql_resolver<F, Fut>(
    resolver: F,
) -> Arc<dyn Fn(GraphQlResolverInfo) -> BoxFuture<MockResponse> + Send + Sync>
where
    F: Fn(GraphQlResolverInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    Arc::new(move |info| Box::pin(resolver(info)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::handler::InstrumentedHandler;

    #[test]
    fn test_empty_builder_attaches_no_recorders() {
        let handler = InterceptBuilder::new()
            .http()
            .get("/foo", |_info| async { MockResponse::text("ok") })
            .unwrap();
        assert!(handler.recorder(Facet::Requested).is_none());
        assert!(handler.recorder(Facet::Body).is_none());
    }

    #[test]
    fn test_all_activates_every_http_supported_facet() {
        let builder = InterceptBuilder::all();
        let http = builder.http_facets();
        assert!(http.contains(&Facet::Requested));
        assert!(http.contains(&Facet::Body));
        assert!(http.contains(&Facet::JsonBody));
        assert!(http.contains(&Facet::Headers));
        assert!(http.contains(&Facet::QueryString));
        assert!(http.contains(&Facet::Hash));
        assert!(http.contains(&Facet::PathParameters));
        // GraphQL-only facets never activate for HTTP handlers.
        assert!(!http.contains(&Facet::GqlVariables));
        assert!(!http.contains(&Facet::GqlQuery));

        let gql = builder.gql_facets();
        assert!(gql.contains(&Facet::GqlVariables));
        assert!(gql.contains(&Facet::GqlQuery));
        assert!(gql.contains(&Facet::JsonBody));
    }

    #[test]
    fn test_with_assertion_activates_only_its_facets() {
        let requested = ASSERTIONS
            .iter()
            .find(|a| a.name == "to_have_been_requested")
            .unwrap();
        let builder = InterceptBuilder::new().with_assertion(requested);
        assert_eq!(
            builder.http_facets().iter().copied().collect::<Vec<_>>(),
            vec![Facet::Requested],
        );
        assert_eq!(
            builder.gql_facets().iter().copied().collect::<Vec<_>>(),
            vec![Facet::Requested],
        );
    }

    #[test]
    fn test_invalid_path_pattern_is_an_error() {
        let http = InterceptBuilder::all().http();
        assert!(http
            .get("no-leading-slash", |_info| async { MockResponse::text("") })
            .is_err());
    }
}
