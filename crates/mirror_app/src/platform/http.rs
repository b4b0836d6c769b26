use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::header::VARY;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::sse::{Event as SseEvent, Sse};
use axum::response::{Html, Response};
use axum::routing::get;
use axum::Router;
use futures_util::stream::{self, Stream};
use mirror_engine::{ContentCache, SubscriberRegistry, Subscription};
use mirror_logging::{mirror_debug, FANOUT_TARGET};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;

use super::page;

pub const SSE_KEEPALIVE: Duration = Duration::from_secs(30);

const HX_TRIGGER: HeaderName = HeaderName::from_static("hx-trigger");

/// Everything a request handler can see.
#[derive(Clone)]
pub struct HttpState {
    pub cache: ContentCache,
    pub registry: SubscriberRegistry,
    /// Cancelled on shutdown; ends every open event stream.
    pub shutdown: CancellationToken,
    pub keepalive: Duration,
}

pub fn router(state: HttpState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/content", get(content))
        .route("/last-update", get(last_update))
        .route("/updates", get(updates))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn(htmx_headers))
        .with_state(state)
}

async fn index(State(state): State<HttpState>) -> Html<String> {
    Html(page::render_index(&state.cache.get()))
}

async fn content(State(state): State<HttpState>) -> Html<String> {
    Html(page::markup_to_html(&state.cache.get().markup))
}

async fn last_update(State(state): State<HttpState>) -> String {
    page::last_update_line(&state.cache.get())
}

async fn updates(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let subscription = state.registry.register();
    Sse::new(event_stream(subscription, state.shutdown, state.keepalive))
}

/// One `data:` frame per event, an empty comment after `keepalive` of
/// silence. Dropping the stream drops the subscription with it.
fn event_stream(
    subscription: Subscription,
    shutdown: CancellationToken,
    keepalive: Duration,
) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    stream::unfold(subscription, move |mut subscription| {
        let shutdown = shutdown.clone();
        async move {
            let frame = tokio::select! {
                _ = shutdown.cancelled() => None,
                next = tokio::time::timeout(keepalive, subscription.recv()) => match next {
                    Ok(Some(event)) => Some(SseEvent::default().data(event.to_string())),
                    Ok(None) => None,
                    Err(_) => Some(SseEvent::default().comment("")),
                },
            };
            match frame {
                Some(frame) => Some((Ok(frame), subscription)),
                None => {
                    mirror_debug!(
                        target: FANOUT_TARGET,
                        "Event stream for subscriber {} closed",
                        subscription.id()
                    );
                    None
                }
            }
        }
    })
}

async fn htmx_headers(request: Request, next: Next) -> Response {
    let trigger = request
        .headers()
        .get(&HX_TRIGGER)
        .filter(|value| !value.is_empty())
        .cloned();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.append(VARY, HeaderValue::from_static("HX-Request"));
    if let Some(trigger) = trigger {
        headers.insert(HX_TRIGGER, trigger);
    }
    response
}
