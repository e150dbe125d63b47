use super::{require_recorder, MatcherContext, Outcome};
use crate::error::AssertionError;
use crate::facets::Facet;
use crate::handler::InstrumentedHandler;

/// Passes iff the handler resolved at least one request.
pub fn to_have_been_requested(
    ctx: &MatcherContext,
    handler: &dyn InstrumentedHandler,
) -> Result<Outcome, AssertionError> {
    let recorder = require_recorder(handler, Facet::Requested)?;
    Ok(Outcome {
        pass: !recorder.is_empty(),
        message: format!(
            "Expected {} to{} have been requested",
            recorder.name(),
            ctx.polarity(),
        ),
    })
}

/// Passes iff the handler resolved exactly `times` requests.
pub fn to_have_been_requested_times(
    ctx: &MatcherContext,
    handler: &dyn InstrumentedHandler,
    times: usize,
) -> Result<Outcome, AssertionError> {
    let recorder = require_recorder(handler, Facet::Requested)?;
    let actual = recorder.len();
    Ok(Outcome {
        pass: actual == times,
        message: format!(
            "Expected {} to{} have been requested {} times, but it was requested {} times",
            recorder.name(),
            ctx.polarity(),
            times,
            actual,
        ),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::intercept::InterceptBuilder;
    use crate::request::MockResponse;

    #[tokio::test]
    async fn test_requested_fails_before_any_request() {
        let handler = InterceptBuilder::all()
            .http()
            .get("/foo", |_info| async { MockResponse::text("ok") })
            .unwrap();
        let outcome = to_have_been_requested(&MatcherContext::new(), &handler).unwrap();
        assert!(!outcome.pass);
        assert_eq!(outcome.message, "Expected /foo to have been requested");
    }

    #[test]
    fn test_uninstrumented_handler_is_a_programmer_error() {
        let handler = InterceptBuilder::new()
            .http()
            .get("/foo", |_info| async { MockResponse::text("ok") })
            .unwrap();
        let err = to_have_been_requested(&MatcherContext::new(), &handler).unwrap_err();
        assert!(matches!(err, AssertionError::NotInstrumented { .. }));
    }

    #[tokio::test]
    async fn test_times_reports_actual_count() {
        let handler = InterceptBuilder::all()
            .http()
            .get("/foo", |_info| async { MockResponse::text("ok") })
            .unwrap();
        let request = crate::request::IncomingRequest::get("http://test.local/foo").unwrap();
        handler.handle(&request).await.unwrap();
        handler.handle(&request).await.unwrap();

        let ctx = MatcherContext::new();
        assert!(to_have_been_requested_times(&ctx, &handler, 2).unwrap().pass);
        let outcome = to_have_been_requested_times(&ctx, &handler, 3).unwrap();
        assert!(!outcome.pass);
        assert_eq!(
            outcome.message,
            "Expected /foo to have been requested 3 times, but it was requested 2 times",
        );
    }

    #[tokio::test]
    async fn test_negated_context_flips_message_wording_only() {
        let handler = InterceptBuilder::all()
            .http()
            .get("/foo", |_info| async { MockResponse::text("ok") })
            .unwrap();
        let request = crate::request::IncomingRequest::get("http://test.local/foo").unwrap();
        handler.handle(&request).await.unwrap();

        let ctx = MatcherContext { is_not: true };
        let outcome = to_have_been_requested(&ctx, &handler).unwrap();
        assert!(outcome.pass);
        assert_eq!(outcome.message, "Expected /foo to not have been requested");
    }
}
