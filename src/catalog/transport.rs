//! The seam between catalog operations and the wire.

use crate::constants;
use crate::error::Error;
use crate::invocation::{Context, RequestData, ResponseData};
use crate::logging;
use serde_json::json;
use std::collections::BTreeMap;

/// Sends one encoded request.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the request could not be delivered or was cancelled.
    fn send(&self, ctx: &Context, request: &RequestData) -> Result<ResponseData, Error>;
}

/// Answers every request locally without touching the network.
///
/// The response echoes the request: status 200 and the request body (or,
/// for body-less requests, the method, URL and any headers) as the
/// response body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunTransport;

impl Transport for DryRunTransport {
    fn send(&self, ctx: &Context, request: &RequestData) -> Result<ResponseData, Error> {
        let _guard = ctx.span.enter();
        if ctx.cancellation.is_cancelled() {
            return Err(Error::transport(format!(
                "request {} {} was cancelled",
                request.method, request.url
            )));
        }

        let max_body_len = logging::get_max_body_len();
        logging::log_request(request, max_body_len);

        let body = request.body.clone().unwrap_or_else(|| {
            let mut line = json!({"method": request.method, "url": request.url});
            if !request.headers.is_empty() {
                line["headers"] = json!(request.headers);
            }
            line
        });
        let mut headers = BTreeMap::new();
        headers.insert(
            constants::HEADER_CONTENT_TYPE.to_string(),
            constants::CONTENT_TYPE_JSON.to_string(),
        );
        let response = ResponseData {
            status: 200,
            headers,
            body: Some(body),
        };

        logging::log_response(&response, max_body_len);
        Ok(response)
    }
}
