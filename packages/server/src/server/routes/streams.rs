//! SSE live queries.
//!
//! Each connection holds a [`Snapshots`] subscription and receives the full
//! result set as a `snapshot` event whenever the underlying collection
//! changes. EventSource can't send custom headers, so these routes also
//! accept the JWT as `?token=` (see the auth middleware).

use std::convert::Infallible;

use axum::{
    extract::Extension,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::warn;

use crate::common::RecipeResult;
use crate::domains::favorites::actions as favorite_actions;
use crate::domains::publications::actions as publication_actions;
use crate::domains::submissions::actions::watch;
use crate::kernel::Snapshots;
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;

type EventStream = Sse<std::pin::Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>>;

fn to_event<T: Serialize>(snapshot: RecipeResult<Vec<T>>) -> Event {
    let event = match snapshot {
        Ok(items) => Event::default().event("snapshot").json_data(&items),
        Err(e) => {
            warn!(error = %e, "Live query failed to load snapshot");
            Event::default()
                .event("error")
                .json_data(serde_json::json!({ "error": e.to_string() }))
        }
    };

    // json_data only fails on serialization errors
    event.unwrap_or_else(|_| Event::default().event("error").data("serialization failed"))
}

fn sse<T: Serialize + Send + 'static>(snapshots: Snapshots<T>) -> EventStream {
    let events = snapshots
        .into_stream()
        .map(|snapshot| Ok::<_, Infallible>(to_event(snapshot)));

    Sse::new(events.boxed()).keep_alive(KeepAlive::default())
}

/// GET /api/submissions/mine/stream
pub async fn my_submissions_stream(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> EventStream {
    sse(watch::watch_my_submissions(&user.user_id, &state.deps))
}

/// GET /api/publications/mine/stream
pub async fn my_publications_stream(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> EventStream {
    sse(publication_actions::watch_my_publications(
        &user.user_id,
        &state.deps,
    ))
}

/// GET /api/favorites/stream
pub async fn my_favorites_stream(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> EventStream {
    sse(favorite_actions::watch_my_favorites(
        &user.user_id,
        &state.deps,
    ))
}

/// GET /api/admin/submissions/stream
pub async fn queue_stream(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<EventStream> {
    let snapshots = watch::watch_queue(&user.user_id, &state.deps).await?;
    Ok(sse(snapshots))
}
