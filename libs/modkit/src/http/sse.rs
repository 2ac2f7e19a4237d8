use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::{borrow::Cow, convert::Infallible, time::Duration};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Small typed SSE broadcaster built on `tokio::sync::broadcast`.
/// - T must be `Clone` so multiple subscribers can receive the same payload.
/// - The channel is bounded; subscribers that lag lose the oldest events.
#[derive(Clone)]
pub struct SseBroadcaster<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> SseBroadcaster<T> {
    /// Create a broadcaster with bounded buffer capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Broadcast a single message to current subscribers.
    /// Having no subscribers is not an error.
    pub fn send(&self, value: T) {
        let _ = self.tx.send(value);
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Subscribe to a typed stream of messages; lag errors are skipped.
    pub fn subscribe_stream(&self) -> impl Stream<Item = T> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|res| async move {
            match res {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::debug!(error = %e, "SSE subscriber lagged; events dropped");
                    None
                }
            }
        })
    }

    /// SSE response with a constant `event:` name and JSON `data:` per message.
    /// Includes periodic keepalive comments to avoid idle timeouts.
    pub fn sse_response_named(
        &self,
        event_name: impl Into<Cow<'static, str>>,
    ) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
    where
        T: Serialize,
    {
        let event_name = event_name.into();
        let stream = self.subscribe_stream().map(move |msg| {
            let ev = Event::default()
                .event(event_name.as_ref())
                .json_data(&msg)
                .unwrap_or_else(|_| {
                    Event::default()
                        .event(event_name.as_ref())
                        .data("serialization_error")
                });
            Ok(ev)
        });
        Sse::new(stream).keep_alive(
            KeepAlive::new()
                .interval(KEEPALIVE_INTERVAL)
                .text("keepalive"),
        )
    }
}
