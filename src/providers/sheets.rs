use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::future::join3;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::sync::{SyncPayload, SyncSink};

/// Pushes rows to a spreadsheet web-app endpoint, one request per sheet.
pub struct SheetsSyncProvider {
    endpoint: String,
    client: reqwest::Client,
}

impl SheetsSyncProvider {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("shopkeep/0.1")
            .build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    async fn push_sheet<T: Serialize + Sync>(&self, sheet: &str, rows: &[T]) -> Result<()> {
        #[derive(Serialize)]
        struct SheetUpdate<'a, T> {
            sheet: &'a str,
            rows: &'a [T],
        }

        debug!(sheet, rows = rows.len(), "Pushing sheet");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SheetUpdate { sheet, rows })
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for sheet: {}", e, sheet))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for sheet: {}",
                response.status(),
                sheet
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SyncSink for SheetsSyncProvider {
    #[instrument(name = "SheetsPush", skip(self, payload), fields(rows = payload.row_count()))]
    async fn push(&self, payload: &SyncPayload) -> Result<()> {
        let (sales, inventory, expenses) = join3(
            self.push_sheet("Sales", &payload.sales),
            self.push_sheet("Inventory", &payload.inventory),
            self.push_sheet("Expenses", &payload.expenses),
        )
        .await;

        let failures: Vec<String> = [sales, inventory, expenses]
            .into_iter()
            .filter_map(|r| r.err())
            .map(|e| e.to_string())
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("Sync failed: {}", failures.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::ExpenseRow;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> SyncPayload {
        SyncPayload {
            expenses: vec![ExpenseRow {
                id: "e1".to_string(),
                date: "2026-02-01".to_string(),
                category: "Ads".to_string(),
                amount: 150.0,
                note: String::new(),
            }],
            ..SyncPayload::default()
        }
    }

    #[tokio::test]
    async fn test_pushes_every_sheet() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/exec"))
            .and(body_partial_json(serde_json::json!({
                "sheet": "Expenses",
                "rows": [{"id": "e1", "amount": 150.0}]
            })))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(1)
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/exec"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&mock_server)
            .await;

        let provider = SheetsSyncProvider::new(&format!("{}/exec", mock_server.uri())).unwrap();
        provider.push(&payload()).await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_names_the_sheet() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let provider = SheetsSyncProvider::new(&mock_server.uri()).unwrap();
        let err = provider.push(&payload()).await.unwrap_err().to_string();
        assert!(err.starts_with("Sync failed: "));
        assert!(err.contains("HTTP error: 500 Internal Server Error for sheet: Sales"));
        assert!(err.contains("for sheet: Expenses"));
    }
}
