//! JSON API over the live post index

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tower_http::trace::TraceLayer;

use crate::config::SiteMetadata;
use crate::content::Post;
use crate::error::LookupError;
use crate::index::PostStore;
use crate::watch::watch_posts;
use crate::Site;

/// Server state
struct ServerState {
    store: Arc<PostStore>,
    site: SiteMetadata,
}

/// Start the API server, optionally keeping the index live with the watcher
pub async fn start(site: &Site, ip: &str, port: u16, watch: bool) -> Result<()> {
    let (store, report) = site.open_store()?;
    if report.failed() > 0 {
        tracing::warn!("{} posts failed to load", report.failed());
    }
    let store = Arc::new(store);

    let app = router(store.clone(), site.config.site.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!(
        "Serving {} posts ({} mode) at http://{}:{}/api/posts",
        store.snapshot().len(),
        store.mode().as_str(),
        ip,
        port
    );
    if watch {
        println!("Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    let stop = Arc::new(AtomicBool::new(false));
    let watcher = if watch {
        Some(spawn_watcher(store.clone(), stop.clone())?)
    } else {
        None
    };

    let served = axum::serve(listener, app).await;

    stop.store(true, Ordering::Relaxed);
    if let Some(handle) = watcher {
        if handle.join().is_err() {
            tracing::error!("File watcher panicked");
        }
    }

    served?;
    Ok(())
}

/// Run the watcher on its own thread until `stop` is set
fn spawn_watcher(store: Arc<PostStore>, stop: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("postindex-watch".to_string())
        .spawn(move || {
            let loader = store.loader().clone();
            let result = watch_posts(&loader, &store, &stop, |outcome| {
                tracing::info!(
                    "Reindexed: {} updated, {} removed, {} failed",
                    outcome.updated.len(),
                    outcome.removed.len(),
                    outcome.failures.len()
                );
            });
            if let Err(e) = result {
                tracing::error!("File watcher error: {}", e);
            }
        })?;
    Ok(handle)
}

fn router(store: Arc<PostStore>, site: SiteMetadata) -> Router {
    let state = Arc::new(ServerState { store, site });
    Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/:slug", get(get_post))
        .route("/api/site", get(site_metadata))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_posts(State(state): State<Arc<ServerState>>) -> Json<Vec<Post>> {
    Json(state.store.snapshot().list_posts().to_vec())
}

async fn get_post(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let collection = state.store.snapshot();
    let post = collection.require_post(&slug)?;
    Ok(Json(post.clone()))
}

async fn site_metadata(State(state): State<Arc<ServerState>>) -> Json<SiteMetadata> {
    Json(state.site.clone())
}

/// Error body returned by the API
struct ApiError(LookupError);

impl From<LookupError> for ApiError {
    fn from(e: LookupError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LookupError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::content::{ContentLoader, PostAssembler};
    use std::fs;
    use tempfile::TempDir;

    fn state(tmp: &TempDir) -> State<Arc<ServerState>> {
        for (slug, date, published) in [("a", "2020-01-01", true), ("b", "2020-06-01", false)] {
            let dir = tmp.path().join(slug);
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join("index.md"),
                format!("---\ntitle: {slug}\ndate: {date}\npublished: {published}\n---\nText\n"),
            )
            .unwrap();
        }
        let loader = ContentLoader::new(tmp.path(), PostAssembler::default());
        let (store, _) = PostStore::open(loader, Mode::Production).unwrap();
        State(Arc::new(ServerState {
            store: Arc::new(store),
            site: SiteMetadata::default(),
        }))
    }

    #[tokio::test]
    async fn test_list_posts_hides_drafts() {
        let tmp = TempDir::new().unwrap();
        let Json(posts) = list_posts(state(&tmp)).await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "a");
    }

    #[tokio::test]
    async fn test_get_post() {
        let tmp = TempDir::new().unwrap();
        let Json(post) = get_post(state(&tmp), Path("a".to_string()))
            .await
            .map_err(|_| "lookup failed")
            .unwrap();
        assert_eq!(post.title(), "a");
    }

    #[tokio::test]
    async fn test_unknown_or_draft_post_is_404() {
        let tmp = TempDir::new().unwrap();
        let response = match get_post(state(&tmp), Path("b".to_string())).await {
            Ok(_) => panic!("draft should not be served in production"),
            Err(e) => e.into_response(),
        };
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_site_metadata() {
        let tmp = TempDir::new().unwrap();
        let Json(site) = site_metadata(state(&tmp)).await;
        assert_eq!(site.title, "Blog");
    }

    #[tokio::test]
    async fn test_port_in_use_fails_fast() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("public/blog")).unwrap();
        let site = Site::new(tmp.path()).unwrap();

        let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = held.local_addr().unwrap().port();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            start(&site, "127.0.0.1", port, true),
        )
        .await
        .expect("start should return instead of hanging");
        assert!(result.is_err());
    }

    #[test]
    fn test_error_body() {
        let error = ApiError(LookupError::NotFound("x".to_string()));
        assert_eq!(error.0.to_string(), "post not found: x");
    }
}
