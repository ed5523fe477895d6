//! Submit → search → render → summaries, against one [`SearchPage`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data_models::Query;
use crate::error::Result;
use crate::http;
use crate::page::{PendingSummary, SearchPage};
use crate::search_api::SearchApi;
use crate::summary::SummaryClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    NoResults,
    /// Another search started while this one was in flight; nothing rendered.
    Superseded,
    Rendered { results: usize, summaries: usize },
}

pub struct SearchFlow {
    search_api: SearchApi,
    summaries: Arc<SummaryClient>,
    page: Arc<Mutex<SearchPage>>,
    concurrent_summaries: Arc<Semaphore>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl SearchFlow {
    pub fn new(config: &Config, page: SearchPage) -> Result<Self> {
        let client = http::build_client(config)?;
        Ok(Self::with_clients(
            SearchApi::new(client.clone(), config.server_url.clone()),
            SummaryClient::new(
                client,
                config.summary_endpoint.clone(),
                config.summary_max_chars,
            ),
            page,
            config.summary_concurrency,
        ))
    }

    pub fn with_clients(
        search_api: SearchApi,
        summaries: SummaryClient,
        page: SearchPage,
        max_concurrent_summaries: usize,
    ) -> Self {
        Self {
            search_api,
            summaries: Arc::new(summaries),
            page: Arc::new(Mutex::new(page)),
            concurrent_summaries: Arc::new(Semaphore::new(max_concurrent_summaries.max(1))),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn page(&self) -> Arc<Mutex<SearchPage>> {
        self.page.clone()
    }

    /// Searches for whatever the page's form currently holds.
    pub async fn submit(&self) -> Result<SearchOutcome> {
        let query = self.page.lock().await.query();
        self.search(query).await
    }

    pub async fn search(&self, query: Query) -> Result<SearchOutcome> {
        let generation = self.page.lock().await.begin_search();
        info!(query = %query.text, advanced = query.advanced, generation, "searching");

        let response = self.search_api.send(&query).await.inspect_err(|e| {
            warn!("search failed: {e:#}");
        })?;

        if response.status().is_success() {
            let moved = self.page.lock().await.leave_initial_layout();
            if moved > 0 {
                debug!(elements = moved, "left initial layout");
            }
        }

        let results = SearchApi::decode(response).await.inspect_err(|e| {
            warn!("could not decode search results: {e:#}");
        })?;

        let pending = {
            let mut page = self.page.lock().await;
            if page.generation() != generation {
                debug!(generation, "a newer search started, not rendering");
                return Ok(SearchOutcome::Superseded);
            }
            page.render_results(&results)
        };

        if results.is_empty() {
            info!("no results");
            return Ok(SearchOutcome::NoResults);
        }

        let summaries = pending.len();
        for summary in pending {
            self.spawn_summary(generation, summary).await;
        }
        info!(results = results.len(), summaries, "rendered results");

        Ok(SearchOutcome::Rendered {
            results: results.len(),
            summaries,
        })
    }

    async fn spawn_summary(&self, generation: u64, pending: PendingSummary) {
        let summaries = self.summaries.clone();
        let page = self.page.clone();
        let limiter = self.concurrent_summaries.clone();

        let handle = tokio::spawn(async move {
            let Ok(_permit) = limiter.acquire_owned().await else {
                return;
            };
            match summaries.fetch_summary(&pending.title).await {
                Ok(text) => {
                    let applied = page
                        .lock()
                        .await
                        .apply_summary(generation, pending.node, &text);
                    if !applied {
                        debug!(title = %pending.title, generation, "discarded stale summary");
                    }
                }
                Err(e) => {
                    warn!(title = %pending.title, "summary unavailable: {e:#}");
                }
            }
        });

        let mut in_flight = self.in_flight.lock().await;
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Waits until every summary requested so far has landed or failed.
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.in_flight.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("summary task panicked: {e}");
            }
        }
    }

    /// Like [`settle`](Self::settle) but gives up after `limit`. Returns
    /// false if some summaries were still outstanding.
    pub async fn settle_within(&self, limit: Duration) -> bool {
        let handles = std::mem::take(&mut *self.in_flight.lock().await);
        let outstanding = handles.len();
        match tokio::time::timeout(limit, futures::future::join_all(handles)).await {
            Ok(_) => true,
            Err(_) => {
                debug!(outstanding, ?limit, "stopped waiting for summaries");
                false
            }
        }
    }
}
