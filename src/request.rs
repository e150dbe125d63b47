use crate::error::InterceptError;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// A request as seen by an instrumented handler.
///
/// Carries the full URL (including the fragment, which `http::Uri` would
/// drop) plus headers and an optional body. Cloning is cheap; facet
/// extraction always works on a clone so the resolver still sees the
/// original.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl IncomingRequest {
    /// Starts building a request with an arbitrary method.
    ///
    /// # Errors
    ///
    /// Returns an error when `url` is not an absolute URL.
    pub fn new(method: Method, url: &str) -> Result<Self, InterceptError> {
        let parsed = Url::parse(url).map_err(|source| InterceptError::InvalidUrl {
            url: url.to_owned(),
            source,
        })?;
        Ok(Self {
            method,
            url: parsed,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    /// Shorthand for [`IncomingRequest::new`] with `GET`.
    pub fn get(url: &str) -> Result<Self, InterceptError> {
        Self::new(Method::GET, url)
    }

    /// Shorthand for [`IncomingRequest::new`] with `POST`.
    pub fn post(url: &str) -> Result<Self, InterceptError> {
        Self::new(Method::POST, url)
    }

    /// Adds a header. Invalid names or values are ignored rather than
    /// panicking; header names are normalized to lower case by `HeaderMap`.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets a JSON body and the matching content type.
    #[must_use]
    pub fn json(self, value: &Value) -> Self {
        let bytes = serde_json::to_vec(value).unwrap_or_default();
        self.header("content-type", "application/json")
            .body(Bytes::from(bytes))
    }

    /// Sets a plain text body.
    #[must_use]
    pub fn text<S: Into<String>>(self, text: S) -> Self {
        self.body(Bytes::from(text.into().into_bytes()))
    }

    /// Sets a raw body.
    #[must_use]
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[cfg(test)]
    pub(crate) fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The raw body, `None` when the transport carried none.
    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The body decoded as text, `None` when there is no body. Invalid UTF-8
    /// is replaced rather than failing.
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// The body parsed as JSON, `None` on a missing or unparsable body.
    pub fn body_json(&self) -> Option<Value> {
        self.body
            .as_ref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

/// The response produced by a handler's resolver.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl MockResponse {
    /// A `200 OK` response with a JSON body.
    pub fn json(value: &Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            status: StatusCode::OK,
            headers,
            body: Bytes::from(serde_json::to_vec(value).unwrap_or_default()),
        }
    }

    /// A `200 OK` response with a text body.
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from(text.into().into_bytes()),
        }
    }

    /// An empty response with the given status.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// A route path pattern: literal segments, `:name` parameters, and an
/// optional trailing `*` wildcard.
#[derive(Debug, Clone)]
pub(crate) struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    trailing_wildcard: bool,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Param(String),
}

impl PathPattern {
    pub(crate) fn parse(pattern: &str) -> Result<Self, InterceptError> {
        if !pattern.starts_with('/') {
            return Err(InterceptError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: "path must start with '/'".to_owned(),
            });
        }

        let mut segments = Vec::new();
        let mut trailing_wildcard = false;
        let parts: Vec<&str> = pattern[1..]
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        for (i, part) in parts.iter().enumerate() {
            if *part == "*" {
                if i != parts.len() - 1 {
                    return Err(InterceptError::InvalidPattern {
                        pattern: pattern.to_owned(),
                        reason: "wildcard is only allowed as the last segment".to_owned(),
                    });
                }
                trailing_wildcard = true;
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(InterceptError::InvalidPattern {
                        pattern: pattern.to_owned(),
                        reason: "parameter segment needs a name".to_owned(),
                    });
                }
                segments.push(Segment::Param(name.to_owned()));
            } else {
                segments.push(Segment::Literal((*part).to_owned()));
            }
        }

        Ok(Self {
            raw: pattern.to_owned(),
            segments,
            trailing_wildcard,
        })
    }

    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    /// Matches a concrete request path, returning the captured parameters.
    pub(crate) fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if self.trailing_wildcard {
            if parts.len() < self.segments.len() {
                return None;
            }
        } else if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*part).to_owned());
                }
            }
        }
        Some(params)
    }
}

/// The parsed GraphQL document submitted with a request.
#[derive(Debug, Clone)]
pub struct GraphQlOperation {
    pub(crate) kind: OperationKind,
    pub(crate) name: Option<String>,
    pub(crate) query: String,
    pub(crate) variables: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Mutation => write!(f, "mutation"),
        }
    }
}

impl GraphQlOperation {
    /// Reads `{query, variables, operationName}` off a request body. Returns
    /// `None` when the body is not a GraphQL document.
    pub(crate) fn from_request(request: &IncomingRequest) -> Option<Self> {
        let body = request.body_json()?;
        let query = body.get("query")?.as_str()?.to_owned();

        let kind = operation_kind_of(&query)?;
        let name = body
            .get("operationName")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or_else(|| operation_name_of(&query));

        let variables = body.get("variables").cloned().unwrap_or(Value::Null);

        Some(Self {
            kind,
            name,
            query,
            variables,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn variables(&self) -> &Value {
        &self.variables
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

fn operation_kind_of(query: &str) -> Option<OperationKind> {
    let trimmed = query.trim_start();
    if trimmed.starts_with("mutation") {
        Some(OperationKind::Mutation)
    } else if trimmed.starts_with("query") || trimmed.starts_with('{') {
        Some(OperationKind::Query)
    } else {
        None
    }
}

fn operation_name_of(query: &str) -> Option<String> {
    // `query GetUser(...)` / `mutation AddUser {` — the name is the first
    // identifier after the operation keyword. Anonymous operations have none.
    static NAME: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
        #[allow(clippy::expect_used)]
        regex::Regex::new(r"^\s*(?:query|mutation)\s+([A-Za-z_][A-Za-z0-9_]*)")
            .expect("operation name pattern is valid")
    });
    NAME.captures(query)
        .map(|caps| caps[1].to_owned())
}
