use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use log::{debug, info, warn};
use serde_json::{json, Value};

use super::pipeline::{DiscoveredTransaction, TransactionPipeline};
use crate::transaction::types::RawTransaction;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<TransactionPipeline>,
    requests: Arc<AtomicU64>,
}

pub fn router(pipeline: Arc<TransactionPipeline>) -> Router {
    let state = AppState {
        pipeline,
        requests: Arc::new(AtomicU64::new(0)),
    };
    Router::new()
        .route("/webhook", post(receive))
        .route("/health", get(health))
        .route("/status", get(status))
        .with_state(state)
}

pub async fn serve(pipeline: Arc<TransactionPipeline>, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Webhook endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router(pipeline)).await
}

// Acknowledge first; classification and delivery never hold the response.
async fn receive(State(state): State<AppState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let sequence = state.requests.fetch_add(1, Ordering::Relaxed);
    let request_id = format!("{}-{}", Utc::now().timestamp_millis(), sequence);

    let discoveries = extract_discoveries(&body);
    if discoveries.is_empty() {
        warn!("Webhook {} carried no transaction signature", request_id);
    } else {
        debug!("Webhook {} carried {} transaction(s)", request_id, discoveries.len());
    }
    for discovered in discoveries {
        let _ = state.pipeline.submit(discovered);
    }

    (
        StatusCode::OK,
        Json(json!({ "status": "received", "requestId": request_id })),
    )
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339(),
        "dedupSize": state.pipeline.dedup().size(),
    }))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "metrics": state.pipeline.metrics().snapshot(),
        "dedupSize": state.pipeline.dedup().size(),
        "dedupCeiling": state.pipeline.dedup().ceiling(),
    }))
}

/// Signatures (and payloads, when pushed in full) from a webhook body. The
/// body is one item or an array of items; items may wrap the record in
/// `data.transaction`.
pub fn extract_discoveries(body: &Value) -> Vec<DiscoveredTransaction> {
    match body {
        Value::Array(items) => items.iter().filter_map(discovery).collect(),
        item => discovery(item).into_iter().collect(),
    }
}

fn discovery(item: &Value) -> Option<DiscoveredTransaction> {
    let item = item
        .get("data")
        .and_then(|data| data.get("transaction"))
        .filter(|inner| inner.is_object())
        .unwrap_or(item);

    let signature = item
        .get("signature")
        .and_then(Value::as_str)
        .or_else(|| {
            item.pointer("/transaction/signatures/0")
                .and_then(Value::as_str)
        })
        .filter(|s| !s.is_empty())?;

    let has_payload = item.get("meta").is_some_and(Value::is_object)
        && item.get("transaction").is_some_and(Value::is_object);
    if has_payload {
        match serde_json::from_value::<RawTransaction>(item.clone()) {
            Ok(tx) => return Some(DiscoveredTransaction::with_payload(signature, tx)),
            Err(e) => debug!("Payload for {} unreadable, will fetch: {}", signature, e),
        }
    }
    Some(DiscoveredTransaction::signature(signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::chain::ClassifierChain;
    use crate::classifier::registry::ClassifierContext;
    use crate::fetch::client::MockTransactionSource;
    use crate::fetch::error::FetchError;
    use crate::fetch::fetcher::{FetcherConfig, RateLimitedFetcher};
    use crate::monitor::dedup::DedupStore;
    use crate::notify::dispatcher::NotificationDispatcher;
    use crate::retry::RetryConfig;
    use tokio::time::Duration;

    async fn spawn_server() -> (String, Arc<TransactionPipeline>) {
        let mut source = MockTransactionSource::new();
        source
            .expect_get_transaction()
            .returning(|sig| Err(FetchError::InvalidSignature(sig.to_string())));
        let pipeline = Arc::new(TransactionPipeline::new(
            DedupStore::new(100),
            RateLimitedFetcher::new(
                Arc::new(source),
                FetcherConfig {
                    min_interval: Duration::ZERO,
                    ..Default::default()
                },
            ),
            ClassifierChain::standard(ClassifierContext::with_defaults()),
            NotificationDispatcher::new(Vec::new(), RetryConfig::default()),
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(pipeline.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), pipeline)
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_and_processes() {
        let (base, pipeline) = spawn_server().await;
        let client = reqwest::Client::new();

        let reply: Value = client
            .post(format!("{}/webhook", base))
            .json(&json!([{ "signature": "sigW1" }, { "signature": "sigW2" }]))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(reply["status"], "received");
        assert!(reply["requestId"].is_string());

        // Processing runs in the background; wait for both claims to land
        for _ in 0..50 {
            if pipeline.dedup().size() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(pipeline.dedup().contains("sigW1"));
        assert!(pipeline.dedup().contains("sigW2"));

        let health: Value = client
            .get(format!("{}/health", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["dedupSize"], 2);

        let status: Value = client
            .get(format!("{}/status", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["metrics"]["received"], 2);
    }

    #[test]
    fn test_signature_only_item() {
        let found = extract_discoveries(&json!({ "signature": "sig1" }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].signature, "sig1");
        assert!(found[0].payload.is_none());
    }

    #[test]
    fn test_array_with_full_payloads() {
        let body = json!([
            {
                "blockTime": 1703001234,
                "meta": { "fee": 5000, "preBalances": [1], "postBalances": [1] },
                "transaction": { "signatures": ["sigA"], "message": { "accountKeys": ["Payer"] } }
            },
            { "note": "no signature here" },
            { "signature": "sigB" }
        ]);

        let found = extract_discoveries(&body);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].signature, "sigA");
        let payload = found[0].payload.as_ref().unwrap();
        assert_eq!(payload.meta.fee, 5000);
        assert_eq!(found[1].signature, "sigB");
        assert!(found[1].payload.is_none());
    }

    #[test]
    fn test_nested_data_transaction() {
        let body = json!({
            "data": {
                "transaction": {
                    "meta": { "fee": 0 },
                    "transaction": { "signatures": ["sigNested"], "message": {} }
                }
            }
        });

        let found = extract_discoveries(&body);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].signature, "sigNested");
        assert!(found[0].payload.is_some());
    }

    #[test]
    fn test_empty_bodies() {
        assert!(extract_discoveries(&json!([])).is_empty());
        assert!(extract_discoveries(&json!({ "signature": "" })).is_empty());
        assert!(extract_discoveries(&Value::Null).is_empty());
    }
}
