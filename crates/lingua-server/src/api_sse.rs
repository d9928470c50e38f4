//! SSE message stream handler.

use crate::AppState;
use axum::{
    extract::Extension,
    response::{sse::Event, Sse},
};
use futures_util::Stream;
use std::{convert::Infallible, sync::Arc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Handler for `GET /events/messages`.
///
/// Streams every completed assistant turn as a `message` event to every
/// connected subscriber. There is one global channel; clients filter by
/// `conversationId` themselves.
pub async fn get_message_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.message_tx.subscribe();
    let stream = BroadcastStream::new(rx);

    let mapped_stream = stream.filter_map(|result| {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(data) => Some(Ok(Event::default().event("message").data(data))),
                Err(e) => {
                    tracing::error!("failed to serialize message event: {}", e);
                    None
                }
            },
            Err(broadcast_error) => {
                tracing::warn!(
                    error = %broadcast_error,
                    "message SSE stream lagged or closed; events were dropped for this subscriber"
                );
                None
            }
        }
    });

    Sse::new(mapped_stream).keep_alive(axum::response::sse::KeepAlive::default())
}
