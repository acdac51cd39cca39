use async_trait::async_trait;
use log::debug;
use teloxide::payloads::SendMessageSetters;
use teloxide::requests::Requester;
use teloxide::types::{ChatId, ParseMode, Recipient};
use teloxide::Bot;

use super::channel::NotificationChannel;
use super::error::ChannelError;
use super::types::{MessageFormat, RenderedMessage};

pub struct TelegramChannel {
    bot: Bot,
    chat: Recipient,
}

impl TelegramChannel {
    /// `chat` is a numeric chat id or an `@channel` username.
    pub fn new(token: &str, chat: &str) -> Result<Self, ChannelError> {
        if token.trim().is_empty() {
            return Err(ChannelError::Misconfigured("empty Telegram token".to_string()));
        }
        Ok(Self {
            bot: Bot::new(token),
            chat: parse_recipient(chat)?,
        })
    }
}

fn parse_recipient(chat: &str) -> Result<Recipient, ChannelError> {
    let chat = chat.trim();
    if let Ok(id) = chat.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if chat.starts_with('@') && chat.len() > 1 {
        return Ok(Recipient::ChannelUsername(chat.to_string()));
    }
    Err(ChannelError::Misconfigured(format!(
        "Telegram chat must be a numeric id or @username, got {:?}",
        chat
    )))
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn name(&self) -> String {
        "telegram".to_string()
    }

    fn format(&self) -> MessageFormat {
        MessageFormat::Html
    }

    async fn send(&self, message: &RenderedMessage) -> Result<(), ChannelError> {
        let request = self
            .bot
            .send_message(self.chat.clone(), message.text.clone())
            .disable_web_page_preview(true);

        let sent = match message.format {
            MessageFormat::Html => request.parse_mode(ParseMode::Html).await?,
            MessageFormat::PlainText => request.await?,
        };
        debug!("Telegram message {} delivered", sent.id.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recipient() {
        assert_eq!(
            parse_recipient("-1001234567890").unwrap(),
            Recipient::Id(ChatId(-1001234567890))
        );
        assert_eq!(
            parse_recipient(" @whale_alerts ").unwrap(),
            Recipient::ChannelUsername("@whale_alerts".to_string())
        );
        assert!(parse_recipient("whale_alerts").is_err());
        assert!(parse_recipient("@").is_err());
    }

    #[test]
    fn test_empty_token_is_misconfigured() {
        assert!(matches!(
            TelegramChannel::new(" ", "123"),
            Err(ChannelError::Misconfigured(_))
        ));
    }
}
