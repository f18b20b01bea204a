use std::time::Duration;

use futures_util::StreamExt;
use livescript_logging::script_trace;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;

use crate::stream::{StreamEvent, StreamParser};
use crate::wire::Envelope;
use crate::{ApiSettings, FailureKind, QueryError};

pub(crate) fn build_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<reqwest::Client, QueryError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .map_err(|err| QueryError::new(FailureKind::Network, err.to_string()))
}

/// POST one envelope to the gateway and return the successful response.
pub(crate) async fn post_envelope<R: Serialize>(
    client: &reqwest::Client,
    settings: &ApiSettings,
    request: R,
) -> Result<reqwest::Response, QueryError> {
    let endpoint = settings
        .endpoint()
        .map_err(|err| QueryError::new(FailureKind::InvalidUrl, err.to_string()))?;
    let body = serde_json::to_vec(&Envelope::new(settings, request))
        .map_err(|err| QueryError::new(FailureKind::Encode, err.to_string()))?;

    let response = client
        .post(endpoint)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "text/event-stream")
        .body(body)
        .send()
        .await
        .map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(QueryError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    Ok(response)
}

/// Drain a streamed response into parsed events, stopping at the done marker.
pub(crate) async fn read_events(response: reqwest::Response) -> Result<Vec<StreamEvent>, QueryError> {
    let mut parser = StreamParser::new();
    let mut events = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        script_trace!("stream chunk of {} bytes", chunk.len());
        events.extend(parser.feed(&chunk));
        if parser.is_done() {
            return Ok(events);
        }
    }
    events.extend(parser.finish());
    Ok(events)
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> QueryError {
    if err.is_timeout() {
        return QueryError::new(FailureKind::Timeout, err.to_string());
    }
    QueryError::new(FailureKind::Network, err.to_string())
}
