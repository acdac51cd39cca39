pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod feishu;
pub mod format;
pub mod telegram;
pub mod types;

pub use channel::NotificationChannel;
pub use dispatcher::NotificationDispatcher;
pub use error::ChannelError;
pub use feishu::FeishuChannel;
pub use format::{format_amount, render};
pub use telegram::TelegramChannel;
pub use types::{DeliveryResult, MessageFormat, RenderedMessage};
