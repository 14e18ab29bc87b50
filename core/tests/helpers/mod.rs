//! Shared helpers for integration tests

use std::time::Duration;
use tm_core::infrastructure::events::Event;
use tokio::sync::broadcast;

/// Receive events until one matches `pred`, panicking after `limit`.
/// Non-matching events are consumed.
pub async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<Event>,
    limit: Duration,
    mut pred: F,
) -> Event
where
    F: FnMut(&Event) -> bool,
{
    let result = tokio::time::timeout(limit, async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await;
    result.unwrap_or_else(|_| panic!("expected event within {limit:?}"))
}

/// Drain every event currently queued on the receiver.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// The messages of all queued `Notice` events.
pub fn drain_notices(rx: &mut broadcast::Receiver<Event>) -> Vec<String> {
    drain(rx)
        .into_iter()
        .filter_map(|event| match event {
            Event::Notice { message, .. } => Some(message),
            _ => None,
        })
        .collect()
}
