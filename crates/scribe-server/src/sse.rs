//! Server-Sent Events endpoint for the live progress feed

use crate::state::SharedState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

/// GET /api/events - streams progress events as `log` events
///
/// Listeners only see events emitted after they connect. A listener that
/// falls behind skips the events it missed.
pub async fn sse_handler(
    State(app): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(app.progress.subscribe());

    let mapped = async_stream::stream! {
        tokio::pin!(stream);

        while let Some(result) = futures::StreamExt::next(&mut stream).await {
            match result {
                Ok(event) => {
                    if let Ok(json) = serde_json::to_string(&event) {
                        yield Ok(Event::default().event("log").data(json));
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!("SSE listener lagged, skipped {} event(s)", skipped);
                }
            }
        }
    };

    Sse::new(mapped).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
