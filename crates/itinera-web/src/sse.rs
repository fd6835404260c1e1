//! Event-stream response body
//!
//! Frames are written pre-encoded as `data:` lines rather than through
//! `axum::response::sse`, which would add its own blank line after every
//! event.

use axum::{
    body::Body,
    http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use itinera_planner::Frame;
use std::convert::Infallible;

pub const EVENT_STREAM: &str = "text/event-stream";

/// Stream `frames` as a `text/event-stream` body.
///
/// Dropping the body (client disconnect) drops `frames`, which cancels the
/// upstream generation stream.
pub fn event_stream<S>(frames: S) -> Response
where
    S: Stream<Item = Frame> + Send + 'static,
{
    let body = frames.map(|frame| Ok::<_, Infallible>(Bytes::from(frame.encode())));

    (
        [
            (CONTENT_TYPE, EVENT_STREAM),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}
