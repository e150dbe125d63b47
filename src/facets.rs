use crate::handler::HandlerKind;
use crate::matcher::value_object;
use crate::request::{GraphQlOperation, IncomingRequest};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One distinct observable aspect of an intercepted request.
///
/// `Requested` is the count-only marker facet: it records `null` once per
/// matched request and backs the existence/count assertions plus the
/// composite call count. Every other facet carries content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Requested,
    Body,
    JsonBody,
    Headers,
    QueryString,
    Hash,
    PathParameters,
    GqlVariables,
    GqlQuery,
}

/// Canonical extraction order. Extraction walks this list for every matched
/// request so all active recorders stay index-aligned.
pub(crate) const ALL_FACETS: &[Facet] = &[
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

impl Facet {
    /// The label used in diagnostics and composite-pattern keys.
    pub fn label(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Body => "body",
            Self::JsonBody => "jsonBody",
            Self::Headers => "headers",
            Self::QueryString => "queryString",
            Self::Hash => "hash",
            Self::PathParameters => "pathParameters",
            Self::GqlVariables => "gqlVariables",
            Self::GqlQuery => "gqlQuery",
        }
    }

    /// Whether a handler of the given kind can ever record this facet.
    pub(crate) fn supported_by(self, kind: HandlerKind) -> bool {
        match self {
            Self::GqlVariables | Self::GqlQuery => kind == HandlerKind::GraphQl,
            _ => true,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything a facet extractor may read for one request-resolution instant.
pub(crate) struct FacetSource<'a> {
    pub request: &'a IncomingRequest,
    pub path_params: &'a BTreeMap<String, String>,
    pub gql: Option<&'a GraphQlOperation>,
}

/// Derives the recorded value for one facet. Pure; extraction failures for
/// optional content (unparsable JSON, missing body) normalize to the absent
/// sentinel (`null`) or an empty string per facet contract, never an error.
pub(crate) fn extract(facet: Facet, source: &FacetSource<'_>) -> Value {
    match facet {
        Facet::Requested => Value::Null,
        Facet::Body => Value::String(source.request.body_text().unwrap_or_default()),
        Facet::JsonBody => source.request.body_json().unwrap_or(Value::Null),
        Facet::Headers => headers_value(source.request),
        Facet::QueryString => Value::String(
            source
                .request
                .url()
                .query()
                .map(|q| format!("?{q}"))
                .unwrap_or_default(),
        ),
        Facet::Hash => Value::String(
            source
                .request
                .url()
                .fragment()
                .map(|h| format!("#{h}"))
                .unwrap_or_default(),
        ),
        Facet::PathParameters => value_object(
            source
                .path_params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone()))),
        ),
        Facet::GqlVariables => source
            .gql
            .map(|op| op.variables().clone())
            .unwrap_or(Value::Null),
        Facet::GqlQuery => source
            .gql
            .map(|op| Value::String(op.query().to_owned()))
            .unwrap_or(Value::Null),
    }
}

fn headers_value(request: &IncomingRequest) -> Value {
    // HeaderMap already lower-cases names; duplicate values collapse into a
    // single comma-joined entry the way fetch's Headers iteration does.
    // Non-UTF-8 bytes decode lossily so a header never goes missing from the
    // recorded map.
    value_object(request.headers().keys().map(|name| {
        let joined = request
            .headers()
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .collect::<Vec<_>>()
            .join(", ");
        (name.as_str().to_owned(), Value::String(joined))
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source_for(request: &IncomingRequest) -> (BTreeMap<String, String>, Option<GraphQlOperation>) {
        (BTreeMap::new(), GraphQlOperation::from_request(request))
    }

    #[test]
    fn test_body_facet_is_empty_string_when_absent() {
        let request = IncomingRequest::get("http://test.local/foo").unwrap();
        let (params, gql) = source_for(&request);
        let source = FacetSource {
            request: &request,
            path_params: &params,
            gql: gql.as_ref(),
        };
        assert_eq!(extract(Facet::Body, &source), json!(""));
        assert_eq!(extract(Facet::JsonBody, &source), Value::Null);
    }

    #[test]
    fn test_json_body_facet_normalizes_parse_failure() {
        let request = IncomingRequest::post("http://test.local/foo")
            .unwrap()
            .text("{broken");
        let (params, gql) = source_for(&request);
        let source = FacetSource {
            request: &request,
            path_params: &params,
            gql: gql.as_ref(),
        };
        assert_eq!(extract(Facet::Body, &source), json!("{broken"));
        assert_eq!(extract(Facet::JsonBody, &source), Value::Null);
    }

    #[test]
    fn test_headers_facet_lower_cases_names() {
        let request = IncomingRequest::get("http://test.local/foo")
            .unwrap()
            .header("Authorization", "Bearer X")
            .header("X-Custom", "y");
        let (params, gql) = source_for(&request);
        let source = FacetSource {
            request: &request,
            path_params: &params,
            gql: gql.as_ref(),
        };
        assert_eq!(
            extract(Facet::Headers, &source),
            json!({"authorization": "Bearer X", "x-custom": "y"}),
        );
    }

    #[test]
    fn test_headers_facet_decodes_non_utf8_values_lossily() {
        let mut request = IncomingRequest::get("http://test.local/foo").unwrap();
        request.headers_mut().insert(
            http::header::HeaderName::from_static("x-raw"),
            http::header::HeaderValue::from_bytes(b"caf\xE9").unwrap(),
        );
        let params = BTreeMap::new();
        let source = FacetSource {
            request: &request,
            path_params: &params,
            gql: None,
        };
        // The header stays present, with the bad byte replaced.
        assert_eq!(
            extract(Facet::Headers, &source),
            json!({"x-raw": "caf\u{FFFD}"}),
        );
    }

    #[test]
    fn test_headers_facet_joins_repeated_values() {
        let request = IncomingRequest::get("http://test.local/foo")
            .unwrap()
            .header("accept", "text/html")
            .header("accept", "application/json");
        let (params, gql) = source_for(&request);
        let source = FacetSource {
            request: &request,
            path_params: &params,
            gql: gql.as_ref(),
        };
        assert_eq!(
            extract(Facet::Headers, &source),
            json!({"accept": "text/html, application/json"}),
        );
    }

    #[test]
    fn test_query_and_hash_facets_keep_leading_markers() {
        let request = IncomingRequest::get("http://test.local/foo?a=1&b=2#frag").unwrap();
        let (params, gql) = source_for(&request);
        let source = FacetSource {
            request: &request,
            path_params: &params,
            gql: gql.as_ref(),
        };
        assert_eq!(extract(Facet::QueryString, &source), json!("?a=1&b=2"));
        assert_eq!(extract(Facet::Hash, &source), json!("#frag"));
    }

    #[test]
    fn test_query_and_hash_facets_are_empty_strings_when_absent() {
        let request = IncomingRequest::get("http://test.local/foo").unwrap();
        let (params, gql) = source_for(&request);
        let source = FacetSource {
            request: &request,
            path_params: &params,
            gql: gql.as_ref(),
        };
        assert_eq!(extract(Facet::QueryString, &source), json!(""));
        assert_eq!(extract(Facet::Hash, &source), json!(""));
    }

    #[test]
    fn test_path_parameters_facet_is_a_plain_object() {
        let request = IncomingRequest::get("http://test.local/users/7").unwrap();
        let mut params = BTreeMap::new();
        params.insert("id".to_owned(), "7".to_owned());
        let source = FacetSource {
            request: &request,
            path_params: &params,
            gql: None,
        };
        assert_eq!(extract(Facet::PathParameters, &source), json!({"id": "7"}));
    }

    #[test]
    fn test_gql_facets_read_the_parsed_operation() {
        let request = IncomingRequest::post("http://test.local/graphql")
            .unwrap()
            .json(&json!({
                "query": "query GetUser { user { name } }",
                "variables": {"userId": "123"},
            }));
        let (params, gql) = source_for(&request);
        let source = FacetSource {
            request: &request,
            path_params: &params,
            gql: gql.as_ref(),
        };
        assert_eq!(
            extract(Facet::GqlVariables, &source),
            json!({"userId": "123"}),
        );
        assert_eq!(
            extract(Facet::GqlQuery, &source),
            json!("query GetUser { user { name } }"),
        );
    }
}
