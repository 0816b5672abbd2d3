//! Exposes the change feed to browsers over server-sent events.

use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{FromRef, State},
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};

use crate::{AppState, live::ChangeFeed};

/// How often to send a comment line to keep idle connections open.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// The state needed to stream change events.
#[derive(Debug, Clone)]
pub struct ChangeFeedState {
    /// The feed to stream events from.
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for ChangeFeedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            change_feed: state.change_feed.clone(),
        }
    }
}

/// The feed's events as SSE events, with lag notices filtered out.
fn change_event_stream(feed: &ChangeFeed) -> impl Stream<Item = Result<Event, Infallible>> + use<> {
    BroadcastStream::new(feed.subscribe()).filter_map(|event| {
        match event {
            Ok(event) => Some(Ok(Event::default().data(event.as_str()))),
            // A lagged subscriber missed events. The client refetches on the
            // next event anyway, so there is nothing to send.
            Err(_) => None,
        }
    })
}

/// Stream change events to the client as server-sent events.
///
/// Each event's data is the lowercase event name, e.g. `inserted`. Clients
/// are expected to refetch on any event rather than interpret the name.
pub async fn get_change_events(
    State(state): State<ChangeFeedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(change_event_stream(&state.change_feed)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
