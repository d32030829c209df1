use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use blog_kit_client::{PageSource, PrismicClient, load_static_props};
use blog_kit_core::BlogConfig;
use blog_kit_generator::template::html_escape;
use blog_kit_generator::{PostListView, RenderMode, render_home};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::sync::{Mutex, broadcast};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::{CONFIG_FILE, load_config};

/// List state for the single preview user.
///
/// `generation` changes whenever `/` reloads from Prismic, so a load-more
/// that started against an older list is dropped instead of applied.
#[derive(Default)]
struct Session {
    generation: u64,
    view: Option<PostListView>,
}

#[derive(Clone)]
struct AppState {
    blog_path: PathBuf,
    session: Arc<Mutex<Session>>,
    reload_tx: broadcast::Sender<()>,
}

/// Start preview server with hot reload for local development.
///
/// This command:
/// - Validates and loads blog.toml
/// - Renders `/` from Prismic on every request (server-rendering mode)
/// - Serves load-more as a form post that follows the list's cursor
/// - Watches blog.toml and triggers hot reload
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    println!("📰 Starting preview server...");
    println!("   Blog: {}", path.display());

    let config = load_config(&path)?;
    println!("   ✓ Loaded: {}", config.site.title);
    println!("   ✓ Endpoint: {}", config.prismic.endpoint);

    // Create broadcast channel for reload events
    let (reload_tx, _) = broadcast::channel::<()>(100);

    let state = AppState {
        blog_path: path.clone(),
        session: Arc::new(Mutex::new(Session::default())),
        reload_tx: reload_tx.clone(),
    };

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/more", post(more_handler))
        .route("/_reload", get(sse_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state);

    // Start file watcher
    let watcher_path = path.clone();
    let watcher_tx = reload_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = watch_config(watcher_path, watcher_tx).await {
            eprintln!("File watcher error: {}", e);
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Watch blog.toml and trigger reload
async fn watch_config(path: PathBuf, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    // Editors often replace the file, so watch the directory
    watcher.watch(&path, RecursiveMode::NonRecursive)?;

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                if event
                    .paths
                    .iter()
                    .any(|p| p.file_name().is_some_and(|name| name == CONFIG_FILE))
                {
                    println!("   📝 {} changed, reloading...", CONFIG_FILE);
                    let _ = reload_tx.send(());
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn error_page(status: StatusCode, title: &str, err: &anyhow::Error) -> Response {
    let html = format!(
        r#"<!DOCTYPE html>
<html><head><title>Error</title></head><body>
<h1>{}</h1>
<pre>{}</pre>
</body></html>"#,
        html_escape(title),
        html_escape(&format!("{:#}", err))
    );
    (status, Html(html)).into_response()
}

fn connect(state: &AppState) -> Result<(BlogConfig, PrismicClient)> {
    let config = load_config(&state.blog_path)?;
    let client = PrismicClient::new(&config.prismic).context("Failed to create Prismic client")?;
    Ok((config, client))
}

/// Query the first page and start a fresh list
async fn fresh_view(config: &BlogConfig, source: &dyn PageSource) -> Result<PostListView> {
    let props = load_static_props(source, &config.prismic)
        .await
        .context("Failed to query Prismic for posts")?;
    Ok(PostListView::new(props.posts_pagination))
}

/// Home page, loaded from Prismic on every request
async fn index_handler(State(state): State<AppState>) -> Response {
    let (config, client) = match connect(&state) {
        Ok(c) => c,
        Err(e) => return error_page(StatusCode::INTERNAL_SERVER_ERROR, "Configuration Error", &e),
    };

    let view = match fresh_view(&config, &client).await {
        Ok(v) => v,
        Err(e) => return error_page(StatusCode::BAD_GATEWAY, "Content API Error", &e),
    };

    let html = render_home(&view, &config.site, RenderMode::Preview);

    let mut session = state.session.lock().await;
    session.generation += 1;
    session.view = Some(view);

    Html(html).into_response()
}

/// Load-more activation.
///
/// The session lock is not held across the fetch; a second activation in
/// that window sees the in-flight flag and just re-renders. A page that
/// arrives after `/` reloaded the list is dropped.
async fn more_handler(State(state): State<AppState>) -> Response {
    let (config, client) = match connect(&state) {
        Ok(c) => c,
        Err(e) => return error_page(StatusCode::INTERNAL_SERVER_ERROR, "Configuration Error", &e),
    };

    let (generation, ticket) = {
        let mut session = state.session.lock().await;
        if session.view.is_none() {
            match fresh_view(&config, &client).await {
                Ok(v) => {
                    session.generation += 1;
                    session.view = Some(v);
                }
                Err(e) => return error_page(StatusCode::BAD_GATEWAY, "Content API Error", &e),
            }
        }

        let generation = session.generation;
        let Some(view) = session.view.as_mut() else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        match view.begin_load() {
            Some(ticket) => (generation, ticket),
            None => {
                debug!(busy = view.is_loading(), "Nothing to load");
                return Html(render_home(view, &config.site, RenderMode::Preview)).into_response();
            }
        }
    };

    // The fetch and completion run detached so a cancelled request still
    // clears the in-flight flag.
    let session = Arc::clone(&state.session);
    let completion = tokio::spawn(async move {
        let result = client.next_page(ticket.url()).await;

        let mut session = session.lock().await;
        if session.generation != generation {
            info!("List was reloaded during load-more, dropping stale page");
            return;
        }
        if let Some(view) = session.view.as_mut()
            && let Err(e) = view.complete_load(ticket, result)
        {
            warn!(error = %e, "Preview load-more failed");
        }
    });
    if let Err(e) = completion.await {
        warn!(error = %e, "Load-more task did not finish");
    }

    let session = state.session.lock().await;
    let Some(view) = session.view.as_ref() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    Html(render_home(view, &config.site, RenderMode::Preview)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_kit_generator::template::LOAD_MORE_LABEL;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Prismic double: a first page with one post whose cursor points at
    /// `/slow`, which answers with post `b` after `delay`
    async fn start_prismic(delay: Duration) -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "refs": [{"id": "master", "ref": "MASTER", "isMasterRef": true}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "next_page": format!("{}/slow", server.uri()),
                "results": [{"uid": "a", "data": {"title": "Post A"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "next_page": null,
                        "results": [{"uid": "b", "data": {"title": "Post B"}}]
                    }))
                    .set_delay(delay),
            )
            .mount(&server)
            .await;

        server
    }

    fn state_for(server: &MockServer) -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            format!("[prismic]\nendpoint = \"{}/api/v2\"\npage_size = 1\n", server.uri()),
        )
        .unwrap();

        let (reload_tx, _) = broadcast::channel::<()>(4);
        let state = AppState {
            blog_path: dir.path().to_path_buf(),
            session: Arc::new(Mutex::new(Session::default())),
            reload_tx,
        };
        (dir, state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn post_count(state: &AppState) -> usize {
        let session = state.session.lock().await;
        session.view.as_ref().map_or(0, |v| v.posts().len())
    }

    #[tokio::test]
    async fn test_more_appends_next_page() {
        let server = start_prismic(Duration::ZERO).await;
        let (_dir, state) = state_for(&server);

        let home = body_text(index_handler(State(state.clone())).await).await;
        assert!(home.contains("Post A"));
        assert!(home.contains(LOAD_MORE_LABEL));

        let more = body_text(more_handler(State(state.clone())).await).await;
        assert!(more.contains("Post A"));
        assert!(more.contains("Post B"));
        assert!(!more.contains(LOAD_MORE_LABEL));
        assert_eq!(post_count(&state).await, 2);
    }

    #[tokio::test]
    async fn test_more_without_session_loads_fresh_view() {
        let server = start_prismic(Duration::ZERO).await;
        let (_dir, state) = state_for(&server);

        let more = body_text(more_handler(State(state.clone())).await).await;

        assert!(more.contains("Post A"));
        assert!(more.contains("Post B"));
        let session = state.session.lock().await;
        assert_eq!(session.generation, 1);
        assert_eq!(session.view.as_ref().unwrap().posts().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_more_still_completes() {
        let server = start_prismic(Duration::from_millis(500)).await;
        let (_dir, state) = state_for(&server);
        index_handler(State(state.clone())).await;

        let cancelled =
            tokio::time::timeout(Duration::from_millis(50), more_handler(State(state.clone())))
                .await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(700)).await;

        {
            let session = state.session.lock().await;
            let view = session.view.as_ref().unwrap();
            assert!(!view.is_loading());
            assert_eq!(view.posts().len(), 2);
        }

        let more = body_text(more_handler(State(state.clone())).await).await;
        assert!(!more.contains(" disabled"));
        assert_eq!(post_count(&state).await, 2);
    }

    #[tokio::test]
    async fn test_failed_more_keeps_list_and_shows_error() {
        let server = start_prismic(Duration::ZERO).await;
        let (_dir, state) = state_for(&server);

        // Cursor at a page the double does not serve (404)
        {
            let mut session = state.session.lock().await;
            session.generation = 1;
            session.view = Some(PostListView::new(blog_kit_core::PostPagination {
                next_page: Some(format!("{}/missing", server.uri())),
                results: vec![],
            }));
        }

        let more = body_text(more_handler(State(state.clone())).await).await;
        assert!(more.contains(r#"role="alert">Failed to load more posts"#));
        assert!(more.contains(LOAD_MORE_LABEL));

        let session = state.session.lock().await;
        let view = session.view.as_ref().unwrap();
        assert!(!view.is_loading());
        assert!(view.last_error().is_some());
        assert_eq!(
            view.next_page(),
            Some(format!("{}/missing", server.uri()).as_str())
        );
    }

    #[tokio::test]
    async fn test_double_activation_sees_in_flight() {
        let server = start_prismic(Duration::from_millis(300)).await;
        let (_dir, state) = state_for(&server);
        index_handler(State(state.clone())).await;

        let first = tokio::spawn(more_handler(State(state.clone())));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = body_text(more_handler(State(state.clone())).await).await;
        assert!(second.contains(" disabled"));
        assert!(!second.contains("Post B"));

        let first = body_text(first.await.unwrap()).await;
        assert!(first.contains("Post B"));
        assert_eq!(post_count(&state).await, 2);

        let slow_calls = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/slow")
            .count();
        assert_eq!(slow_calls, 1);
    }

    #[tokio::test]
    async fn test_reload_during_more_drops_stale_page() {
        let server = start_prismic(Duration::from_millis(300)).await;
        let (_dir, state) = state_for(&server);
        index_handler(State(state.clone())).await;

        let pending = tokio::spawn(more_handler(State(state.clone())));
        tokio::time::sleep(Duration::from_millis(50)).await;

        index_handler(State(state.clone())).await;
        let rendered = body_text(pending.await.unwrap()).await;

        assert!(!rendered.contains("Post B"));
        let session = state.session.lock().await;
        assert_eq!(session.generation, 2);
        let view = session.view.as_ref().unwrap();
        assert_eq!(view.posts().len(), 1);
        assert!(!view.is_loading());
        assert_eq!(view.next_page(), Some(format!("{}/slow", server.uri()).as_str()));
    }
}
