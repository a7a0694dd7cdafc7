//! Income endpoint.
//!
//! Incomes can recur, so update and delete carry a [`Scope`]; the backend
//! answers mutations with the full set of affected rows and every one of
//! them is reconciled against the cache.

use std::sync::{Arc, Mutex};

use log::{debug, info};

use shared::{validate_amount, validate_description, ApiRequest, Income, Period, Scope};

use crate::api::{ApiClient, ApiError};
use crate::cache::{PeriodCache, PeriodKey};
use crate::endpoints::affected_rows;
use crate::format::sanitize_text;
use crate::transport::Transport;

/// Payload for creating an income (or a recurring income series).
#[derive(Debug, Clone)]
pub struct NewIncome {
    pub description: String,
    pub amount: f64,
    /// ISO 8601 date (YYYY-MM-DD) the income is expected on.
    pub expected_date: String,
    /// Reference month in YYYY-MM format.
    pub reference_month: String,
}

/// Partial payload for updating an income; unset fields are left untouched.
#[derive(Debug, Clone)]
pub struct IncomeUpdate {
    pub row_index: u32,
    pub amount: Option<f64>,
    /// Marks the income as received on this date.
    pub received_date: Option<String>,
    pub scope: Scope,
}

pub struct IncomesEndpoint<T: Transport> {
    api: Arc<ApiClient<T>>,
    cache: Mutex<PeriodCache<Income>>,
}

impl<T: Transport> IncomesEndpoint<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self {
            api,
            cache: Mutex::new(PeriodCache::new()),
        }
    }

    /// List the incomes of one period, from cache when already fetched.
    pub async fn list(&self, period: Period) -> Result<Vec<Income>, ApiError> {
        self.list_key(PeriodKey::Month(period), Some(period)).await
    }

    /// List every income, for the aggregate whole-year view.
    pub async fn list_all(&self) -> Result<Vec<Income>, ApiError> {
        self.list_key(PeriodKey::All, None).await
    }

    async fn list_key(
        &self,
        key: PeriodKey,
        period: Option<Period>,
    ) -> Result<Vec<Income>, ApiError> {
        let token = {
            let mut cache = self.cache.lock().expect("incomes cache lock poisoned");
            if let Some(rows) = cache.get(key) {
                debug!("incomes cache hit for {}", key);
                return Ok(rows.to_vec());
            }
            cache.begin_fetch(key)
        };
        debug!("incomes cache miss for {}, fetching", key);

        let rows: Vec<Income> = self.api.get_rows("listIncomes", period).await?;

        let mut cache = self.cache.lock().expect("incomes cache lock poisoned");
        if !cache.set_latest(token, rows.clone()) {
            debug!("discarding stale income fetch for {}", key);
        }
        Ok(rows)
    }

    /// Create an income. The backend answers with every created row (one per
    /// occurrence for a recurring series), each inserted into the bucket of
    /// its own reference month.
    pub async fn create(&self, payload: NewIncome) -> Result<Vec<Income>, ApiError> {
        validate_description(&payload.description)?;
        validate_amount(payload.amount)?;

        let request = ApiRequest::CreateIncome {
            description: sanitize_text(&payload.description),
            amount: payload.amount,
            expected_date: payload.expected_date,
            reference_month: payload.reference_month,
        };
        let created: Vec<Income> = self.api.post_rows(&request).await?;

        let mut cache = self.cache.lock().expect("incomes cache lock poisoned");
        for row in &created {
            cache.add(row.clone());
        }
        info!("created {} income row(s)", created.len());
        Ok(created)
    }

    /// Update an income; the cache is patched from the request payload for
    /// every row the backend reports as affected.
    pub async fn update(
        &self,
        payload: IncomeUpdate,
        period: Period,
    ) -> Result<Vec<Income>, ApiError> {
        if let Some(amount) = payload.amount {
            validate_amount(amount)?;
        }

        let request = ApiRequest::UpdateIncome {
            row_index: payload.row_index,
            amount: payload.amount,
            received_date: payload.received_date.clone(),
            scope: payload.scope,
        };
        let updated: Vec<Income> = self.api.post_rows(&request).await?;

        let mut cache = self.cache.lock().expect("incomes cache lock poisoned");
        for (key, row_index) in affected_rows(&updated, payload.row_index, period) {
            cache.update(key, row_index, |row| {
                if let Some(amount) = payload.amount {
                    row.amount = amount;
                }
                if let Some(received_date) = &payload.received_date {
                    row.received_date = Some(received_date.clone());
                }
            });
        }
        info!(
            "updated income row {} (scope {:?})",
            payload.row_index, payload.scope
        );
        Ok(updated)
    }

    /// Delete an income row, or part/all of its series depending on `scope`.
    /// Every row the backend reports as deleted is pruned from the cache.
    pub async fn delete(
        &self,
        row_index: u32,
        period: Period,
        scope: Scope,
    ) -> Result<(), ApiError> {
        let deleted: Vec<Income> = self
            .api
            .post_rows(&ApiRequest::DeleteIncome { row_index, scope })
            .await?;

        let mut cache = self.cache.lock().expect("incomes cache lock poisoned");
        for (key, row_index) in affected_rows(&deleted, row_index, period) {
            cache.remove(key, row_index);
        }
        info!("deleted income row {} (scope {:?})", row_index, scope);
        Ok(())
    }
}
