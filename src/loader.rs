// 🌐 Catalog Loader - fetch a contiguous id range into one ordered Collection
//
// Fetches run concurrently (bounded by `max_concurrency`) and are joined at a
// single aggregation point. What happens on a failed fetch is decided by
// FailurePolicy, never implicitly.

use crate::config::GalleryConfig;
use crate::creature::{ApiCreature, Collection, Creature};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// ============================================================================
// ERRORS
// ============================================================================

/// Why a single fetch failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// Non-2xx response
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    /// 2xx response whose body is not a creature record
    #[error("malformed record: {0}")]
    Decode(String),

    #[error("fetch aborted: {0}")]
    Aborted(String),
}

/// A failed fetch, tagged with the identifier that was requested.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to fetch creature {id}: {cause}")]
pub struct NetworkError {
    pub id: u32,
    #[source]
    pub cause: FetchError,
}

// ============================================================================
// CATALOG SOURCE
// ============================================================================

/// Where creature records come from. `HttpCatalog` talks to the real service.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, id: u32) -> Result<Creature, FetchError>;
}

pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pokedex-gallery/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &GalleryConfig) -> Result<Self, FetchError> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn url_for(&self, id: u32) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), id)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch(&self, id: u32) -> Result<Creature, FetchError> {
        let response = self
            .client
            .get(self.url_for(id))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let record: ApiCreature = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(record.into())
    }
}

// ============================================================================
// LOADER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// First failure aborts every outstanding fetch
    #[default]
    FailFast,
    /// Attempt every id; keep successes, report failures alongside
    Partial,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub collection: Collection,
    /// Failed ids in ascending order (always empty under FailFast)
    pub failures: Vec<NetworkError>,
}

pub struct Loader {
    source: Arc<dyn CatalogSource>,
    max_concurrency: usize,
    policy: FailurePolicy,
}

impl Loader {
    pub fn new(source: Arc<dyn CatalogSource>, max_concurrency: usize, policy: FailurePolicy) -> Self {
        Self {
            source,
            max_concurrency: max_concurrency.max(1),
            policy,
        }
    }

    pub fn from_config(config: &GalleryConfig) -> Result<Self, FetchError> {
        let source = HttpCatalog::from_config(config)?;
        Ok(Self::new(
            Arc::new(source),
            config.max_concurrency,
            config.failure_policy,
        ))
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Fetch every id in `ids`.
    ///
    /// Under `FailFast` the first failure is returned and fetches still in
    /// flight are dropped. Under `Partial` the load only fails when not a
    /// single record could be fetched; the reported error is then the lowest
    /// failing id.
    pub async fn load(&self, ids: RangeInclusive<u32>) -> Result<LoadReport, NetworkError> {
        let requested = ids.clone().count();
        info!(
            first = *ids.start(),
            last = *ids.end(),
            concurrency = self.max_concurrency,
            policy = ?self.policy,
            "loading catalog"
        );

        let source = self.source.as_ref();
        let mut in_flight = stream::iter(ids)
            .map(move |id| async move {
                debug!(id, "fetching creature");
                (id, source.fetch(id).await)
            })
            .buffer_unordered(self.max_concurrency);

        let mut creatures = Vec::with_capacity(requested);
        let mut failures = Vec::new();

        while let Some((id, result)) = in_flight.next().await {
            match result {
                Ok(creature) => creatures.push(creature),
                Err(cause) => {
                    let err = NetworkError { id, cause };
                    match self.policy {
                        FailurePolicy::FailFast => {
                            error!(id, error = %err.cause, "fetch failed, aborting remaining fetches");
                            return Err(err);
                        }
                        FailurePolicy::Partial => {
                            warn!(id, error = %err.cause, "fetch failed, continuing");
                            failures.push(err);
                        }
                    }
                }
            }
        }

        failures.sort_by_key(|f| f.id);
        if creatures.is_empty() && !failures.is_empty() {
            return Err(failures.remove(0));
        }

        let collection = Collection::from_batch(creatures);
        info!(
            loaded = collection.len(),
            failed = failures.len(),
            "catalog loaded"
        );

        Ok(LoadReport {
            collection,
            failures,
        })
    }
}
