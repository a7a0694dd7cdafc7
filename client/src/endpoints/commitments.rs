//! Commitment endpoint.
//!
//! Commitments cover fixed and variable monthly obligations plus credit-card
//! installment plans. Installment and recurring rows share a series on the
//! backend, so update and delete carry a [`Scope`] and the backend answers
//! with every affected row.

use std::sync::{Arc, Mutex};

use log::{debug, info};

use shared::{
    validate_amount, validate_description, ApiRequest, Commitment, CommitmentType, Period, Scope,
};

use crate::api::{ApiClient, ApiError};
use crate::cache::{PeriodCache, PeriodKey};
use crate::endpoints::affected_rows;
use crate::format::sanitize_text;
use crate::transport::Transport;

/// Payload for creating a commitment. For card installment plans the backend
/// expands `total_installments` rows, one per month starting at `due_date`.
#[derive(Debug, Clone)]
pub struct NewCommitment {
    pub description: String,
    pub category: String,
    pub commitment_type: CommitmentType,
    pub amount: f64,
    /// ISO 8601 date (YYYY-MM-DD).
    pub due_date: String,
    /// Card name; only meaningful for [`CommitmentType::Card`].
    pub card: Option<String>,
    pub total_installments: Option<u32>,
    /// Reference month in YYYY-MM format.
    pub reference_month: String,
}

/// Partial payload for updating a commitment; unset fields are left
/// untouched.
#[derive(Debug, Clone)]
pub struct CommitmentUpdate {
    pub row_index: u32,
    pub amount: Option<f64>,
    pub due_date: Option<String>,
    /// Marks the commitment as paid on this date.
    pub payment_date: Option<String>,
    pub scope: Scope,
}

pub struct CommitmentsEndpoint<T: Transport> {
    api: Arc<ApiClient<T>>,
    cache: Mutex<PeriodCache<Commitment>>,
}

impl<T: Transport> CommitmentsEndpoint<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self {
            api,
            cache: Mutex::new(PeriodCache::new()),
        }
    }

    /// List the commitments of one period, from cache when already fetched.
    pub async fn list(&self, period: Period) -> Result<Vec<Commitment>, ApiError> {
        self.list_key(PeriodKey::Month(period), Some(period)).await
    }

    /// List every commitment, for the aggregate whole-year view.
    pub async fn list_all(&self) -> Result<Vec<Commitment>, ApiError> {
        self.list_key(PeriodKey::All, None).await
    }

    async fn list_key(
        &self,
        key: PeriodKey,
        period: Option<Period>,
    ) -> Result<Vec<Commitment>, ApiError> {
        let token = {
            let mut cache = self.cache.lock().expect("commitments cache lock poisoned");
            if let Some(rows) = cache.get(key) {
                debug!("commitments cache hit for {}", key);
                return Ok(rows.to_vec());
            }
            cache.begin_fetch(key)
        };
        debug!("commitments cache miss for {}, fetching", key);

        let rows: Vec<Commitment> = self.api.get_rows("listCommitments", period).await?;

        let mut cache = self.cache.lock().expect("commitments cache lock poisoned");
        if !cache.set_latest(token, rows.clone()) {
            debug!("discarding stale commitment fetch for {}", key);
        }
        Ok(rows)
    }

    /// Create a commitment. The backend answers with every created row (the
    /// whole expanded series for installment plans), each inserted into the
    /// bucket of its own reference month.
    pub async fn create(&self, payload: NewCommitment) -> Result<Vec<Commitment>, ApiError> {
        validate_description(&payload.description)?;
        validate_amount(payload.amount)?;

        let request = ApiRequest::CreateCommitment {
            description: sanitize_text(&payload.description),
            category: sanitize_text(&payload.category),
            commitment_type: payload.commitment_type,
            amount: payload.amount,
            due_date: payload.due_date,
            card: payload.card.as_deref().map(sanitize_text),
            total_installments: payload.total_installments,
            reference_month: payload.reference_month,
        };
        let created: Vec<Commitment> = self.api.post_rows(&request).await?;

        let mut cache = self.cache.lock().expect("commitments cache lock poisoned");
        for row in &created {
            cache.add(row.clone());
        }
        info!("created {} commitment row(s)", created.len());
        Ok(created)
    }

    /// Update a commitment; the cache is patched from the request payload
    /// for every row the backend reports as affected.
    pub async fn update(
        &self,
        payload: CommitmentUpdate,
        period: Period,
    ) -> Result<Vec<Commitment>, ApiError> {
        if let Some(amount) = payload.amount {
            validate_amount(amount)?;
        }

        let request = ApiRequest::UpdateCommitment {
            row_index: payload.row_index,
            amount: payload.amount,
            due_date: payload.due_date.clone(),
            payment_date: payload.payment_date.clone(),
            scope: payload.scope,
        };
        let updated: Vec<Commitment> = self.api.post_rows(&request).await?;

        let mut cache = self.cache.lock().expect("commitments cache lock poisoned");
        for (key, row_index) in affected_rows(&updated, payload.row_index, period) {
            cache.update(key, row_index, |row| {
                if let Some(amount) = payload.amount {
                    row.amount = amount;
                }
                if let Some(due_date) = &payload.due_date {
                    row.due_date = due_date.clone();
                }
                if let Some(payment_date) = &payload.payment_date {
                    row.payment_date = Some(payment_date.clone());
                }
            });
        }
        info!(
            "updated commitment row {} (scope {:?})",
            payload.row_index, payload.scope
        );
        Ok(updated)
    }

    /// Mark a single commitment occurrence as paid on the given date.
    pub async fn mark_paid(
        &self,
        row_index: u32,
        period: Period,
        payment_date: String,
    ) -> Result<Vec<Commitment>, ApiError> {
        self.update(
            CommitmentUpdate {
                row_index,
                amount: None,
                due_date: None,
                payment_date: Some(payment_date),
                scope: Scope::Single,
            },
            period,
        )
        .await
    }

    /// Delete a commitment row, or part/all of its series depending on
    /// `scope`. Every row the backend reports as deleted is pruned.
    pub async fn delete(
        &self,
        row_index: u32,
        period: Period,
        scope: Scope,
    ) -> Result<(), ApiError> {
        let deleted: Vec<Commitment> = self
            .api
            .post_rows(&ApiRequest::DeleteCommitment { row_index, scope })
            .await?;

        let mut cache = self.cache.lock().expect("commitments cache lock poisoned");
        for (key, row_index) in affected_rows(&deleted, row_index, period) {
            cache.remove(key, row_index);
        }
        info!("deleted commitment row {} (scope {:?})", row_index, scope);
        Ok(())
    }
}
