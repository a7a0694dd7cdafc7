//! # Finance Tracker Client Core
//!
//! Client-side core for a personal-finance tracker backed by a remote
//! spreadsheet API: a typed API client over a single GET/POST endpoint,
//! per-entity caches keyed by (month, year) with read-through and
//! write-through semantics, period selection state, and pure
//! grouping/aggregation helpers for the dashboard views.
//!
//! The UI layer sits on top of [`AppContext`], which owns explicit cache
//! and endpoint instances so tests can build isolated contexts over a fake
//! transport instead of sharing process-wide state.

use std::sync::{Arc, Mutex};

use log::debug;

use shared::{FullSummary, Period};

pub mod api;
pub mod cache;
pub mod dashboard;
pub mod endpoints;
pub mod format;
pub mod period;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError};
pub use cache::{CacheRecord, PeriodCache, PeriodKey};
pub use endpoints::{CommitmentsEndpoint, ExpensesEndpoint, IncomesEndpoint};
pub use period::PeriodContext;
pub use transport::{HttpTransport, Transport};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// URL of the remote spreadsheet endpoint.
    pub endpoint_url: String,
    /// Card display order for the dashboard's card section.
    pub card_order: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            card_order: vec![
                "Bradesco".to_string(),
                "Itaú".to_string(),
                "Mercado Pago".to_string(),
            ],
        }
    }
}

/// Top-level application context owning the API client, one endpoint per
/// entity, and the period selection state.
pub struct AppContext<T: Transport> {
    pub api: Arc<ApiClient<T>>,
    pub expenses: ExpensesEndpoint<T>,
    pub incomes: IncomesEndpoint<T>,
    pub commitments: CommitmentsEndpoint<T>,
    pub period: Mutex<PeriodContext>,
    pub config: AppConfig,
}

impl AppContext<HttpTransport> {
    /// Create a context talking to the configured remote endpoint.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        if config.endpoint_url.is_empty() {
            anyhow::bail!("endpoint URL is not configured");
        }
        let transport = HttpTransport::new(config.endpoint_url.clone());
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> AppContext<T> {
    /// Wire a context over any transport; tests use an in-memory fake.
    pub fn with_transport(transport: T, config: AppConfig) -> Self {
        let api = Arc::new(ApiClient::new(transport));
        Self {
            expenses: ExpensesEndpoint::new(api.clone()),
            incomes: IncomesEndpoint::new(api.clone()),
            commitments: CommitmentsEndpoint::new(api.clone()),
            period: Mutex::new(PeriodContext::new(Period::current())),
            api,
            config,
        }
    }

    /// Currently selected period.
    pub fn selected_period(&self) -> Period {
        self.period.lock().expect("period lock poisoned").selected()
    }

    /// Switch the selected period, dropping the now-stale summary.
    pub fn select_period(&self, period: Period) {
        self.period
            .lock()
            .expect("period lock poisoned")
            .select(period);
    }

    /// Fetch the aggregated summary for the selected period. A response
    /// arriving after the user already switched periods is returned to the
    /// caller but not stored.
    pub async fn refresh_summary(&self) -> Result<FullSummary, ApiError> {
        let token = self
            .period
            .lock()
            .expect("period lock poisoned")
            .begin_refresh();
        let summary = self.api.get_summary(token.period()).await?;

        let mut period = self.period.lock().expect("period lock poisoned");
        if !period.apply_summary(&token, summary.clone()) {
            debug!("discarding stale summary for {}", token.period());
        }
        Ok(summary)
    }
}
