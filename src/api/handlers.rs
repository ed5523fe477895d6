use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::flow::SearchFlow;
use crate::page::SearchPage;

use super::AppState;
use super::models::SearchParams;

/// Serves the search page. With a `query` parameter the search runs
/// server-side and the page comes back with results already rendered;
/// summaries that miss the wait window stay as loading placeholders.
pub async fn search_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, (StatusCode, String)> {
    let mut page = SearchPage::bind(state.template.clone()).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Template error: {}", e),
        )
    })?;
    page.set_form_action("/");

    let Some(query) = params.to_query() else {
        return Ok(Html(page.to_html()));
    };
    page.fill_form(&query);

    let start = Instant::now();
    let flow = SearchFlow::with_clients(
        state.search_api.clone(),
        state.summaries.clone(),
        page,
        state.config.summary_concurrency,
    );

    // errors are already logged by the flow; the page renders as it stands
    if let Ok(outcome) = flow.search(query).await {
        let complete = flow.settle_within(state.config.summary_wait).await;
        info!(
            ?outcome,
            summaries_complete = complete,
            elapsed_ms = millis(start.elapsed()),
            "search page rendered"
        );
    } else {
        warn!(elapsed_ms = millis(start.elapsed()), "search page rendered without results");
    }

    let html = flow.page().lock().await.to_html();
    Ok(Html(html))
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
