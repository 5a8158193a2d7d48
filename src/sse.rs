//! Server-sent event streams backed by store subscriptions.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use admitdesk_core::RepoError;
use admitdesk_store::SubscriptionHandle;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::warn;

/// Events produced by a subscription callback.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Yields events until the client disconnects; dropping the stream closes
/// the subscription.
pub struct SubscriptionStream {
    rx: mpsc::UnboundedReceiver<Event>,
    _subscription: SubscriptionHandle,
}

impl Stream for SubscriptionStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|event| event.map(Ok))
    }
}

/// Opens a subscription whose callback pushes into the returned stream.
pub fn subscription_stream<F, E>(open: F) -> Result<Sse<KeepAliveStream<SubscriptionStream>>, E>
where
    F: FnOnce(EventSender) -> Result<SubscriptionHandle, E>,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = open(tx)?;

    Ok(Sse::new(SubscriptionStream {
        rx,
        _subscription: subscription,
    })
    .keep_alive(KeepAlive::default()))
}

/// A named event carrying `data` as JSON.
pub fn json_event<T: Serialize>(name: &str, data: &T) -> Event {
    match Event::default().event(name).json_data(data) {
        Ok(event) => event,
        Err(e) => {
            warn!(event = name, error = %e, "Failed to encode event");
            error_event(&e.to_string())
        }
    }
}

/// Failures are delivered in-band; the stream stays open.
pub fn repo_error_event(err: &RepoError) -> Event {
    error_event(&err.to_string())
}

fn error_event(message: &str) -> Event {
    Event::default()
        .event("error")
        .data(json!({ "error": message }).to_string())
}

/// Sends `event` unless the client is gone.
pub fn emit(tx: &EventSender, event: Event) {
    // A closed channel means the stream was dropped and the handle is
    // being aborted.
    let _ = tx.send(event);
}
