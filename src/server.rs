// Pokédex Gallery - Web Surface
// HTML gallery + JSON API over one shared Session
//
// The shared session only supplies the collection and the load status.
// Query and card images belong to each page: every request carries its own
// filter, and a toggle carries the variant the page currently shows.

use crate::config::GalleryConfig;
use crate::filter::{FilterQuery, ALL_CATEGORIES, CATEGORY_VOCABULARY};
use crate::loader::Loader;
use crate::render::{badge_color, escape_html, BadgeColor, ImageRegion, Rendered};
use crate::session::{LoadStatus, Session};
use crate::view_state::ImageVariant;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub loader: Arc<Loader>,
    pub config: Arc<GalleryConfig>,
}

impl AppState {
    pub fn new(session: Session, loader: Loader, config: GalleryConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            loader: Arc::new(loader),
            config: Arc::new(config),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(message.into()),
        }
    }
}

/// `?q=...&category=...`
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    category: Option<String>,
}

impl From<FilterParams> for FilterQuery {
    fn from(params: FilterParams) -> Self {
        FilterQuery::new(
            params.q,
            params.category.as_deref().unwrap_or(ALL_CATEGORIES),
        )
    }
}

/// `?from=primary&q=...&category=...`
#[derive(Debug, Default, Deserialize)]
pub struct ToggleParams {
    /// Variant the page shows before the click
    #[serde(default)]
    from: ImageVariant,
    #[serde(default)]
    q: String,
    #[serde(default)]
    category: Option<String>,
}

impl ToggleParams {
    fn query(self) -> FilterQuery {
        FilterParams {
            q: self.q,
            category: self.category,
        }
        .into()
    }
}

#[derive(Serialize)]
struct CreaturesResponse {
    status: LoadStatus,
    query: FilterQuery,
    total: usize,
    rendered: Option<Rendered>,
}

#[derive(Serialize)]
struct CategoryOption {
    name: &'static str,
    color: Option<BadgeColor>,
}

// ============================================================================
// Loading
// ============================================================================

/// Start a catalog load in the background. Returns `None` if one is running.
pub fn spawn_load(state: AppState) -> Option<JoinHandle<()>> {
    {
        let mut session = state.session();
        if session.status().shows_loading_indicator() {
            return None;
        }
        session.begin_load();
    }

    Some(tokio::spawn(async move {
        // Lock is only taken after the fetches finish
        let result = state.loader.load(state.config.id_range()).await;
        let mut session = state.session();
        match session.finish_load(result) {
            Ok(count) => info!(count, "catalog ready"),
            Err(e) => error!(error = %e, "catalog load failed"),
        }
    }))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/status - Load status
async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.session().status().clone();
    Json(ApiResponse::ok(status))
}

/// GET /api/creatures - Filtered cards as JSON
async fn get_creatures(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    let query: FilterQuery = params.into();
    let body = {
        let session = state.session();
        CreaturesResponse {
            status: session.status().clone(),
            total: session.collection().len(),
            rendered: session.view(&query),
            query,
        }
    };

    match &body.status {
        LoadStatus::Failed { message, .. } => {
            let message = message.clone();
            (StatusCode::BAD_GATEWAY, Json(ApiResponse::err(body, message))).into_response()
        }
        _ => (StatusCode::OK, Json(ApiResponse::ok(body))).into_response(),
    }
}

/// GET /api/categories - Selector vocabulary with badge colors
async fn get_categories() -> impl IntoResponse {
    let mut options = vec![CategoryOption {
        name: ALL_CATEGORIES,
        color: None,
    }];
    options.extend(CATEGORY_VOCABULARY.iter().map(|&name| CategoryOption {
        name,
        color: Some(badge_color(name)),
    }));

    Json(ApiResponse::ok(options))
}

/// POST /api/cards/:id/toggle - Flip a card between normal and shiny
async fn toggle_card(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(params): Query<ToggleParams>,
) -> impl IntoResponse {
    let current = params.from;
    let query = params.query();
    let region = state.session().flip_image(&query, id, current);

    match region {
        Some(region) => (StatusCode::OK, Json(ApiResponse::ok(Some(region)))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Option<ImageRegion>>::err(
                None,
                format!("card {} is not on display", id),
            )),
        )
            .into_response(),
    }
}

/// POST /reload - Retry affordance: full reload of the catalog
async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    spawn_load(state);
    Redirect::to("/")
}

// ============================================================================
// HTML Handlers
// ============================================================================

/// GET / - Full gallery page
async fn serve_index(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    let query: FilterQuery = params.into();
    let (status, rendered) = {
        let session = state.session();
        (session.status().clone(), session.view(&query))
    };
    Html(render_page(&status, &query, rendered.as_ref()))
}

/// GET /fragments - Card list only, swapped in on every keystroke
async fn serve_fragments(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    let query: FilterQuery = params.into();
    let rendered = state.session().view(&query);
    Html(rendered.map(|r| r.to_html()).unwrap_or_default())
}

pub fn render_page(
    status: &LoadStatus,
    query: &FilterQuery,
    rendered: Option<&Rendered>,
) -> String {
    let options: String = std::iter::once(ALL_CATEGORIES)
        .chain(CATEGORY_VOCABULARY)
        .map(|name| {
            let selected = if query.category.as_str() == name { " selected" } else { "" };
            format!(r#"<option value="{name}"{selected}>{name}</option>"#)
        })
        .collect();

    let (refresh, body) = match status {
        LoadStatus::Loading | LoadStatus::Idle => (
            r#"<meta http-equiv="refresh" content="2">"#,
            r#"<div id="loading-spinner">Loading Pokédex...</div>"#.to_string(),
        ),
        LoadStatus::Failed { message, .. } => (
            "",
            format!(
                r#"<div id="load-error" class="error-panel">
  <h2>Could not load the Pokédex</h2>
  <p>{}</p>
  <form method="post" action="/reload"><button type="submit">Try again</button></form>
</div>"#,
                escape_html(message)
            ),
        ),
        LoadStatus::Loaded { .. } => ("", rendered.map(Rendered::to_html).unwrap_or_default()),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
{refresh}
<title>Pokédex</title>
</head>
<body>
<form id="filters" method="get" action="/">
  <input id="search-input" type="search" name="q" value="{text}" placeholder="Search by name" autocomplete="off">
  <select id="type-filter" name="category">{options}</select>
</form>
<main id="results">
{body}
</main>
<script>{script}</script>
</body>
</html>"#,
        refresh = refresh,
        text = escape_html(&query.text),
        options = options,
        body = body,
        script = PAGE_SCRIPT,
    )
}

const PAGE_SCRIPT: &str = r#"
const form = document.getElementById("filters");
const results = document.getElementById("results");
const refilter = async () => {
  const params = new URLSearchParams(new FormData(form));
  results.innerHTML = await (await fetch(`/fragments?${params}`)).text();
};
document.getElementById("search-input").addEventListener("input", refilter);
document.getElementById("type-filter").addEventListener("change", refilter);
results.addEventListener("click", async (event) => {
  const region = event.target.closest(".image-region");
  if (!region) return;
  const label = region.querySelector(".variant-label");
  const params = new URLSearchParams(new FormData(form));
  params.set("from", label.dataset.variant);
  const response = await fetch(`/api/cards/${region.dataset.creatureId}/toggle?${params}`, { method: "POST" });
  if (!response.ok) return;
  const { data } = await response.json();
  region.querySelector("img").src = data.src ?? "";
  label.dataset.variant = data.variant;
  label.textContent = data.label;
  label.className = `variant-label ${data.label_classes.join(" ")}`;
});
"#;

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/creatures", get(get_creatures))
        .route("/categories", get(get_categories))
        .route("/cards/:id/toggle", post(toggle_card))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_index))
        .route("/fragments", get(serve_fragments))
        .route("/reload", post(reload))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::{test_creature, Collection};
    use crate::loader::tests::FakeCatalog;
    use crate::loader::{FailurePolicy, FetchError};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state(session: Session, source: FakeCatalog) -> AppState {
        let config = GalleryConfig {
            last_id: 3,
            ..GalleryConfig::default()
        };
        let loader = Loader::new(Arc::new(source), 1, FailurePolicy::FailFast);
        AppState::new(session, loader, config)
    }

    fn loaded_state() -> AppState {
        let session = Session::from_collection(Collection::from_batch(vec![
            test_creature(1, "bulbasaur", &["grass", "poison"]),
            test_creature(4, "charmander", &["fire"]),
        ]));
        test_state(session, FakeCatalog::default())
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(router(loaded_state()), "GET", "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"OK\""));
    }

    #[tokio::test]
    async fn test_creatures_are_filtered() {
        let (status, body) =
            send(router(loaded_state()), "GET", "/api/creatures?q=BULBA&category=all").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        let cards = json["data"]["rendered"]["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["number"], "#001");
        assert_eq!(json["data"]["total"], 2);
    }

    #[tokio::test]
    async fn test_empty_result_state() {
        let (_, body) = send(router(loaded_state()), "GET", "/api/creatures?category=water").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"]["rendered"]["state"], "empty");

        let (_, html) = send(router(loaded_state()), "GET", "/fragments?category=water").await;
        assert!(html.contains("no-creatures-found"));
    }

    #[tokio::test]
    async fn test_toggle_card() {
        let state = loaded_state();

        let (status, body) = send(router(state.clone()), "POST", "/api/cards/4/toggle").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"]["variant"], "alternate");
        assert_eq!(json["data"]["label"], "✨ Shiny");

        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/api/cards/4/toggle?from=alternate",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"]["variant"], "primary");
        assert_eq!(json["data"]["label"], "Normal");

        let (status, _) = send(router(state.clone()), "POST", "/api/cards/999/toggle").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(router(state), "POST", "/api/cards/4/toggle?category=water").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    fn variant_of(body: &str) -> String {
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        json["data"]["variant"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_pages_do_not_share_card_state() {
        let state = loaded_state();
        let app = router(state.clone());

        // Page A shows everything and flips charmander to shiny
        let (_, page_a) = send(app.clone(), "GET", "/").await;
        assert!(page_a.contains("bulbasaur") && page_a.contains("charmander"));
        let (_, body) = send(app.clone(), "POST", "/api/cards/4/toggle?from=primary").await;
        assert_eq!(variant_of(&body), "alternate");

        // Page B narrows to fire; its card starts at Primary
        let (_, fragments_b) = send(app.clone(), "GET", "/fragments?category=fire").await;
        assert!(fragments_b.contains(r#"data-variant="primary""#));
        assert!(!fragments_b.contains("bulbasaur"));

        // Page A clicks charmander again and gets back to Primary
        let (status, body) =
            send(app.clone(), "POST", "/api/cards/4/toggle?from=alternate").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(variant_of(&body), "primary");

        // Page B switches to water; bulbasaur is still on page A
        send(app.clone(), "GET", "/fragments?category=water").await;
        let (status, body) =
            send(app.clone(), "POST", "/api/cards/1/toggle?from=primary&category=all").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(variant_of(&body), "alternate");

        // Requests never rewrite the shared session's own view
        let session = state.session();
        assert_eq!(session.query(), &FilterQuery::default());
        assert_eq!(session.visible().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_page_offers_retry() {
        let source = FakeCatalog::failing_with(&[(2, FetchError::Status(500))]);
        let state = test_state(Session::new(), source);

        spawn_load(state.clone()).unwrap().await.unwrap();
        assert!(state.session().status().shows_error());

        let (status, html) = send(router(state), "GET", "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Try again"));
        assert!(html.contains("failed to fetch creature 2"));
        assert!(!html.contains("loading-spinner"));
    }

    #[tokio::test]
    async fn test_page_lists_selector_vocabulary() {
        let (_, html) = send(router(loaded_state()), "GET", "/?category=fire").await;
        assert!(html.contains(r#"<option value="fire" selected>fire</option>"#));
        assert!(html.contains(r#"<option value="all">all</option>"#));
        assert!(html.contains("charmander"));
        assert!(!html.contains("bulbasaur"));
    }
}
