//! Static UI page handler with inline fallback.

use axum::{extract::State, response::Html};
use tracing::{debug, instrument};

use crate::server::AppState;

/// Inline page served when the static asset is missing.
const FALLBACK_PAGE: &str =
    "<h1>Webhook Receiver Active</h1><p>Access /webhook/events for data</p>";

/// Serves the main UI page from the configured static directory.
///
/// Falls back to a minimal inline HTML string when the file is missing or
/// unreadable, so the service stays usable headless.
#[instrument(name = "index_page", skip(state))]
pub async fn index_page(State(state): State<AppState>) -> Html<String> {
    let path = state.static_dir.join("index.html");

    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Static page missing, serving fallback");
            Html(FALLBACK_PAGE.to_string())
        },
    }
}
