use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::channel::NotificationChannel;
use super::error::ChannelError;
use super::types::{MessageFormat, RenderedMessage};

/// Feishu (Lark) custom-bot webhook.
pub struct FeishuChannel {
    http_client: Client,
    webhook_url: String,
}

// Newer hooks answer `code`/`msg`, older ones `StatusCode`/`StatusMessage`.
#[derive(Debug, Deserialize)]
struct FeishuReply {
    #[serde(default, alias = "StatusCode")]
    code: i64,
    #[serde(default, alias = "StatusMessage")]
    msg: String,
}

impl FeishuChannel {
    pub fn new(webhook_url: &str) -> Result<Self, ChannelError> {
        if !webhook_url.starts_with("http://") && !webhook_url.starts_with("https://") {
            return Err(ChannelError::Misconfigured(format!(
                "Feishu webhook must be an http(s) URL, got {}",
                mask_webhook(webhook_url)
            )));
        }
        Ok(Self {
            http_client: Client::new(),
            webhook_url: webhook_url.to_string(),
        })
    }

    pub fn masked_url(&self) -> String {
        mask_webhook(&self.webhook_url)
    }
}

/// Hide the hook token, the last path segment.
pub fn mask_webhook(url: &str) -> String {
    match url.rsplit_once('/') {
        Some((head, token)) if !token.is_empty() => format!("{}/***", head),
        _ => url.to_string(),
    }
}

#[async_trait]
impl NotificationChannel for FeishuChannel {
    fn name(&self) -> String {
        "feishu".to_string()
    }

    fn format(&self) -> MessageFormat {
        MessageFormat::PlainText
    }

    async fn send(&self, message: &RenderedMessage) -> Result<(), ChannelError> {
        let body = json!({
            "msg_type": "text",
            "content": { "text": message.text }
        });

        let response = self
            .http_client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChannelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: FeishuReply = response
            .json()
            .await
            .map_err(|e| ChannelError::Transport(e.without_url().to_string()))?;
        if reply.code != 0 {
            return Err(ChannelError::Rejected(format!(
                "code {}: {}",
                reply.code, reply.msg
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/open-apis/bot/v2/hook/secret-token", addr)
    }

    fn message() -> RenderedMessage {
        RenderedMessage {
            format: MessageFormat::PlainText,
            text: "💸 SOL TRANSFER".to_string(),
        }
    }

    #[test]
    fn test_mask_webhook() {
        assert_eq!(
            mask_webhook("https://open.feishu.cn/open-apis/bot/v2/hook/abc-123"),
            "https://open.feishu.cn/open-apis/bot/v2/hook/***"
        );
        assert!(FeishuChannel::new("ftp://nope").is_err());
    }

    #[tokio::test]
    async fn test_send_success_posts_text_message() {
        let router = Router::new().route(
            "/open-apis/bot/v2/hook/secret-token",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["msg_type"], "text");
                assert_eq!(body["content"]["text"], "💸 SOL TRANSFER");
                Json(serde_json::json!({ "code": 0, "msg": "success", "data": {} }))
            }),
        );
        let channel = FeishuChannel::new(&serve(router).await).unwrap();

        assert!(channel.masked_url().ends_with("/hook/***"));
        assert_eq!(channel.send(&message()).await, Ok(()));
    }

    #[tokio::test]
    async fn test_nonzero_code_is_rejected() {
        let router = Router::new().route(
            "/open-apis/bot/v2/hook/secret-token",
            post(|| async { Json(serde_json::json!({ "code": 19021, "msg": "sign match fail" })) }),
        );
        let channel = FeishuChannel::new(&serve(router).await).unwrap();

        let err = channel.send(&message()).await.unwrap_err();
        assert_eq!(err, ChannelError::Rejected("code 19021: sign match fail".to_string()));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let router = Router::new().route(
            "/open-apis/bot/v2/hook/secret-token",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let channel = FeishuChannel::new(&serve(router).await).unwrap();

        let err = channel.send(&message()).await.unwrap_err();
        assert_eq!(
            err,
            ChannelError::Api {
                status: 502,
                message: "upstream down".to_string()
            }
        );
        assert!(err.is_retryable());
    }
}
