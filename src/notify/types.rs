use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    /// Telegram HTML subset, entities escaped.
    Html,
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub format: MessageFormat,
    pub text: String,
}

/// Outcome of delivering one event to one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub channel: String,
    pub succeeded: bool,
    pub attempts: u32,
    pub last_error: Option<String>,
}
