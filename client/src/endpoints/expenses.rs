//! Expense endpoint: read-through listing and write-through mutations.
//!
//! Expenses have no recurrence, so every mutation affects exactly one row.

use std::sync::{Arc, Mutex};

use log::{debug, info};

use shared::{validate_amount, validate_description, ApiRequest, Expense, Period};

use crate::api::{ApiClient, ApiError};
use crate::cache::{PeriodCache, PeriodKey};
use crate::format::sanitize_text;
use crate::transport::Transport;

/// Payload for creating an expense. Row identity is assigned by the backend.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub category: String,
    pub amount: f64,
    /// ISO 8601 date (YYYY-MM-DD).
    pub payment_date: String,
}

/// Partial payload for updating an expense; unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub row_index: u32,
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub payment_date: Option<String>,
}

pub struct ExpensesEndpoint<T: Transport> {
    api: Arc<ApiClient<T>>,
    cache: Mutex<PeriodCache<Expense>>,
}

impl<T: Transport> ExpensesEndpoint<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self {
            api,
            cache: Mutex::new(PeriodCache::new()),
        }
    }

    /// List the expenses of one period, from cache when already fetched.
    pub async fn list(&self, period: Period) -> Result<Vec<Expense>, ApiError> {
        self.list_key(PeriodKey::Month(period), Some(period)).await
    }

    /// List every expense, for the aggregate whole-year view.
    pub async fn list_all(&self) -> Result<Vec<Expense>, ApiError> {
        self.list_key(PeriodKey::All, None).await
    }

    async fn list_key(
        &self,
        key: PeriodKey,
        period: Option<Period>,
    ) -> Result<Vec<Expense>, ApiError> {
        let token = {
            let mut cache = self.cache.lock().expect("expenses cache lock poisoned");
            if let Some(rows) = cache.get(key) {
                debug!("expenses cache hit for {}", key);
                return Ok(rows.to_vec());
            }
            cache.begin_fetch(key)
        };
        debug!("expenses cache miss for {}, fetching", key);

        let rows: Vec<Expense> = self.api.get_rows("listExpenses", period).await?;

        let mut cache = self.cache.lock().expect("expenses cache lock poisoned");
        if !cache.set_latest(token, rows.clone()) {
            debug!("discarding stale expense fetch for {}", key);
        }
        Ok(rows)
    }

    /// Create an expense. The backend answers with the created row, which is
    /// inserted into the matching cache bucket.
    pub async fn create(&self, payload: NewExpense) -> Result<Vec<Expense>, ApiError> {
        validate_description(&payload.description)?;
        validate_amount(payload.amount)?;

        let request = ApiRequest::CreateExpense {
            description: sanitize_text(&payload.description),
            category: sanitize_text(&payload.category),
            amount: payload.amount,
            payment_date: payload.payment_date,
        };
        let created: Vec<Expense> = self.api.post_rows(&request).await?;

        let mut cache = self.cache.lock().expect("expenses cache lock poisoned");
        for row in &created {
            cache.add(row.clone());
        }
        info!("created {} expense row(s)", created.len());
        Ok(created)
    }

    /// Update an expense. The cache bucket for `period` is patched from the
    /// request payload; the returned rows are the backend's view.
    pub async fn update(
        &self,
        payload: ExpenseUpdate,
        period: Period,
    ) -> Result<Vec<Expense>, ApiError> {
        if let Some(description) = &payload.description {
            validate_description(description)?;
        }
        if let Some(amount) = payload.amount {
            validate_amount(amount)?;
        }

        let description = payload.description.as_deref().map(sanitize_text);
        let category = payload.category.as_deref().map(sanitize_text);
        let request = ApiRequest::UpdateExpense {
            row_index: payload.row_index,
            description: description.clone(),
            category: category.clone(),
            amount: payload.amount,
            payment_date: payload.payment_date.clone(),
        };
        let updated: Vec<Expense> = self.api.post_rows(&request).await?;

        let mut cache = self.cache.lock().expect("expenses cache lock poisoned");
        cache.update(PeriodKey::Month(period), payload.row_index, |row| {
            if let Some(description) = &description {
                row.description = description.clone();
            }
            if let Some(category) = &category {
                row.category = category.clone();
            }
            if let Some(amount) = payload.amount {
                row.amount = amount;
            }
            if let Some(payment_date) = &payload.payment_date {
                row.payment_date = payment_date.clone();
            }
        });
        info!("updated expense row {}", payload.row_index);
        Ok(updated)
    }

    /// Delete an expense and prune it from the cache.
    pub async fn delete(&self, row_index: u32, period: Period) -> Result<(), ApiError> {
        self.api
            .post_rows::<Expense>(&ApiRequest::DeleteExpense { row_index })
            .await?;

        let mut cache = self.cache.lock().expect("expenses cache lock poisoned");
        cache.remove(PeriodKey::Month(period), row_index);
        info!("deleted expense row {}", row_index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use serde_json::json;

    fn endpoint() -> (Arc<FakeTransport>, ExpensesEndpoint<Arc<FakeTransport>>) {
        let transport = Arc::new(FakeTransport::new());
        let api = Arc::new(ApiClient::new(transport.clone()));
        (transport, ExpensesEndpoint::new(api))
    }

    fn expense_row(row_index: u32, amount: f64, payment_date: &str) -> serde_json::Value {
        json!({
            "rowIndex": row_index,
            "description": "Mercado",
            "category": "Alimentação",
            "amount": amount,
            "paymentDate": payment_date
        })
    }

    #[tokio::test]
    async fn test_list_is_read_through() {
        crate::testing::init_test_logging();
        let (transport, endpoint) = endpoint();
        transport.push_get(json!([expense_row(1, 50.0, "2026-01-05")]));
        let period = Period::new(1, 2026);

        let first = endpoint.list(period).await.unwrap();
        let second = endpoint.list(period).await.unwrap();

        assert_eq!(first, second);
        // The second call was served from the cache.
        assert_eq!(transport.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_list_failure_leaves_no_bucket_behind() {
        let (transport, endpoint) = endpoint();
        let period = Period::new(1, 2026);

        assert!(endpoint.list(period).await.is_err());

        // Next read retries the network instead of serving an empty bucket.
        transport.push_get(json!([expense_row(1, 50.0, "2026-01-05")]));
        assert_eq!(endpoint.list(period).await.unwrap().len(), 1);
        assert_eq!(transport.get_call_count(), 2);
    }

    #[tokio::test]
    async fn test_create_inserts_into_populated_bucket_without_refetch() {
        let (transport, endpoint) = endpoint();
        let period = Period::new(1, 2026);
        transport.push_get(json!([expense_row(1, 50.0, "2026-01-05")]));
        endpoint.list(period).await.unwrap();

        transport.push_post(json!([expense_row(2, 2000.0, "2026-01-10")]));
        endpoint
            .create(NewExpense {
                description: "Conserto do carro".to_string(),
                category: "Transporte".to_string(),
                amount: 2000.0,
                payment_date: "2026-01-10".to_string(),
            })
            .await
            .unwrap();

        let rows = endpoint.list(period).await.unwrap();
        assert_eq!(rows.len(), 2);
        // Only the initial list hit the network; create used POST only.
        assert_eq!(transport.get_call_count(), 1);
        assert_eq!(transport.post_call_count(), 1);
    }

    #[tokio::test]
    async fn test_create_sanitizes_free_text_before_transmission() {
        let (transport, endpoint) = endpoint();
        transport.push_post(json!([expense_row(3, 10.0, "2026-01-02")]));

        endpoint
            .create(NewExpense {
                description: "  Padaria   da esquina  ".to_string(),
                category: " Alimentação ".to_string(),
                amount: 10.0,
                payment_date: "2026-01-02".to_string(),
            })
            .await
            .unwrap();

        let body = &transport.post_calls()[0];
        assert_eq!(body["description"], json!("Padaria da esquina"));
        assert_eq!(body["category"], json!("Alimentação"));
    }

    #[tokio::test]
    async fn test_create_validation_failure_blocks_network() {
        let (transport, endpoint) = endpoint();

        let result = endpoint
            .create(NewExpense {
                description: "   ".to_string(),
                category: "Outros".to_string(),
                amount: 10.0,
                payment_date: "2026-01-02".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(transport.post_call_count(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_leaves_cache_untouched() {
        let (transport, endpoint) = endpoint();
        let period = Period::new(1, 2026);
        transport.push_get(json!([expense_row(1, 50.0, "2026-01-05")]));
        endpoint.list(period).await.unwrap();

        // No queued POST response: the network call fails.
        let result = endpoint
            .create(NewExpense {
                description: "Farmácia".to_string(),
                category: "Saúde".to_string(),
                amount: 30.0,
                payment_date: "2026-01-11".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ApiError::Transport(_))));

        assert_eq!(endpoint.list(period).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_patches_cache_from_request_payload() {
        let (transport, endpoint) = endpoint();
        let period = Period::new(1, 2026);
        transport.push_get(json!([expense_row(1, 50.0, "2026-01-05")]));
        endpoint.list(period).await.unwrap();

        transport.push_post(json!([expense_row(1, 75.0, "2026-01-05")]));
        endpoint
            .update(
                ExpenseUpdate {
                    row_index: 1,
                    amount: Some(75.0),
                    ..Default::default()
                },
                period,
            )
            .await
            .unwrap();

        let rows = endpoint.list(period).await.unwrap();
        assert_eq!(rows[0].amount, 75.0);
        assert_eq!(transport.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_prunes_cache_bucket() {
        let (transport, endpoint) = endpoint();
        let period = Period::new(1, 2026);
        transport.push_get(json!([
            expense_row(1, 50.0, "2026-01-05"),
            expense_row(2, 20.0, "2026-01-07")
        ]));
        endpoint.list(period).await.unwrap();

        transport.push_post(json!([expense_row(1, 50.0, "2026-01-05")]));
        endpoint.delete(1, period).await.unwrap();

        let rows = endpoint.list(period).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_index, 2);
    }
}
