use crate::facets::{ALL_FACETS, extract, Facet, FacetSource};
use crate::recorder::CallRecorder;
use crate::request::{
    GraphQlOperation, IncomingRequest, MockResponse, OperationKind, PathPattern,
};
use http::Method;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Boxed future returned by handler resolvers.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub(crate) type HttpResolverFn =
    Arc<dyn Fn(HttpResolverInfo) -> BoxFuture<MockResponse> + Send + Sync>;
pub(crate) type GraphQlResolverFn =
    Arc<dyn Fn(GraphQlResolverInfo) -> BoxFuture<MockResponse> + Send + Sync>;

/// What an HTTP resolver receives for one matched request.
#[derive(Debug, Clone)]
pub struct HttpResolverInfo {
    pub request: IncomingRequest,
    pub path_params: BTreeMap<String, String>,
}

/// What a GraphQL resolver receives for one matched request.
#[derive(Debug, Clone)]
pub struct GraphQlResolverInfo {
    pub request: IncomingRequest,
    pub operation: GraphQlOperation,
}

/// Discriminates the two handler families for assertion preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Http,
    GraphQl,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "HTTP"),
            Self::GraphQl => write!(f, "GraphQL"),
        }
    }
}

/// A handler that carries call recorders attached by the interception
/// builder. Assertion predicates read handlers through this trait.
pub trait InstrumentedHandler {
    fn kind(&self) -> HandlerKind;

    /// The route path or operation name the handler was declared with.
    fn name(&self) -> &str;

    /// The recorder for one facet, `None` when the facet was not activated
    /// at construction time.
    fn recorder(&self, facet: Facet) -> Option<&CallRecorder>;
}

fn make_recorders(name: &str, facets: &BTreeSet<Facet>) -> HashMap<Facet, CallRecorder> {
    facets
        .iter()
        .map(|facet| (*facet, CallRecorder::new(name)))
        .collect()
}

fn record_all(
    gate: &Mutex<()>,
    recorders: &HashMap<Facet, CallRecorder>,
    source: &FacetSource<'_>,
) {
    // Walks the canonical facet order so every recorder gets its entry for
    // this request before the resolver future is awaited. The gate keeps the
    // whole walk atomic per handler: with parallel dispatch, per-recorder
    // locking alone would let two requests overtake each other between
    // facets and leave the recorders index-misaligned.
    let _gate = lock_gate(gate);
    for facet in ALL_FACETS {
        if let Some(recorder) = recorders.get(facet) {
            recorder.record(extract(*facet, source));
        }
    }
}

fn lock_gate(gate: &Mutex<()>) -> MutexGuard<'_, ()> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An instrumented HTTP mock handler.
///
/// Created through [`HttpIntercept`](crate::HttpIntercept); matches requests
/// by method and path pattern, records the active facets, then delegates to
/// the resolver it was declared with. The resolver's response is returned
/// unchanged.
pub struct HttpHandler {
    method: Option<Method>,
    pattern: PathPattern,
    recorders: HashMap<Facet, CallRecorder>,
    record_gate: Mutex<()>,
    resolver: HttpResolverFn,
}

impl HttpHandler {
    pub(crate) fn new(
        method: Option<Method>,
        pattern: PathPattern,
        facets: &BTreeSet<Facet>,
        resolver: HttpResolverFn,
    ) -> Self {
        let recorders = make_recorders(pattern.raw(), facets);
        Self {
            method,
            pattern,
            recorders,
            record_gate: Mutex::new(()),
            resolver,
        }
    }

    /// Resolves one request. Returns `None` when the method or path does not
    /// match this handler; otherwise records every active facet and then
    /// awaits the declared resolver.
    pub async fn handle(&self, request: &IncomingRequest) -> Option<MockResponse> {
        if let Some(method) = &self.method
            && method != request.method()
        {
            return None;
        }
        let path_params = self.pattern.matches(request.url().path())?;

        let captured = request.clone();
        let source = FacetSource {
            request: &captured,
            path_params: &path_params,
            gql: None,
        };
        record_all(&self.record_gate, &self.recorders, &source);
        tracing::debug!(
            handler = %self.pattern.raw(),
            method = %captured.method(),
            "recorded intercepted request",
        );

        Some(
            (self.resolver)(HttpResolverInfo {
                request: captured,
                path_params,
            })
            .await,
        )
    }

    /// Clears all recorded calls, as the collaborator does when handlers are
    /// re-registered between test cases.
    pub fn reset(&self) {
        for recorder in self.recorders.values() {
            recorder.clear();
        }
    }
}

impl InstrumentedHandler for HttpHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Http
    }

    fn name(&self) -> &str {
        self.pattern.raw()
    }

    fn recorder(&self, facet: Facet) -> Option<&CallRecorder> {
        self.recorders.get(&facet)
    }
}

impl fmt::Debug for HttpHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHandler")
            .field("method", &self.method)
            .field("pattern", &self.pattern.raw())
            .field("facets", &self.recorders.keys().collect::<BTreeSet<_>>())
            .finish_non_exhaustive()
    }
}

/// An instrumented GraphQL mock handler.
///
/// Matches POSTed GraphQL documents by operation kind and name.
pub struct GraphQlHandler {
    kind: OperationKind,
    operation: String,
    recorders: HashMap<Facet, CallRecorder>,
    record_gate: Mutex<()>,
    resolver: GraphQlResolverFn,
}

impl GraphQlHandler {
    pub(crate) fn new(
        kind: OperationKind,
        operation: String,
        facets: &BTreeSet<Facet>,
        resolver: GraphQlResolverFn,
    ) -> Self {
        let recorders = make_recorders(&operation, facets);
        Self {
            kind,
            operation,
            recorders,
            record_gate: Mutex::new(()),
            resolver,
        }
    }

    /// Resolves one request. Returns `None` when the body is not a GraphQL
    /// document or the operation kind/name does not match.
    pub async fn handle(&self, request: &IncomingRequest) -> Option<MockResponse> {
        let operation = GraphQlOperation::from_request(request)?;
        if operation.kind != self.kind || operation.name.as_deref() != Some(&self.operation) {
            return None;
        }

        let captured = request.clone();
        let path_params = BTreeMap::new();
        let source = FacetSource {
            request: &captured,
            path_params: &path_params,
            gql: Some(&operation),
        };
        record_all(&self.record_gate, &self.recorders, &source);
        tracing::debug!(
            handler = %self.operation,
            kind = %self.kind,
            "recorded intercepted operation",
        );

        Some(
            (self.resolver)(GraphQlResolverInfo {
                request: captured,
                operation,
            })
            .await,
        )
    }

    /// Clears all recorded calls.
    pub fn reset(&self) {
        for recorder in self.recorders.values() {
            recorder.clear();
        }
    }
}

impl InstrumentedHandler for GraphQlHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::GraphQl
    }

    fn name(&self) -> &str {
        &self.operation
    }

    fn recorder(&self, facet: Facet) -> Option<&CallRecorder> {
        self.recorders.get(&facet)
    }
}

impl fmt::Debug for GraphQlHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQlHandler")
            .field("kind", &self.kind)
            .field("operation", &self.operation)
            .field("facets", &self.recorders.keys().collect::<BTreeSet<_>>())
            .finish_non_exhaustive()
    }
}
