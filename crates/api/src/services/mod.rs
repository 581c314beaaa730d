//! External service integrations.

pub mod telegram;

pub use telegram::{ConsoleGateway, TelegramClient, TelegramGateway, TelegramPoller, Update};
