//! Telegram bot and deep-link configuration

use serde::{Deserialize, Serialize};

/// Telegram integration configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot username without the leading '@', used to build deep links
    pub bot_username: String,

    /// Base URL of the web app, used to build web login links
    pub web_app_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_username: String::from("partshub_bot"),
            web_app_url: String::from("http://localhost:5173"),
        }
    }
}

impl TelegramConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bot_username: std::env::var("TELEGRAM_BOT_USERNAME").unwrap_or(defaults.bot_username),
            web_app_url: std::env::var("WEB_APP_URL").unwrap_or(defaults.web_app_url),
        }
    }

    /// Deep link opening the bot with a start payload, e.g.
    /// `https://t.me/partshub_bot?start=link_<token>`
    pub fn deep_link(&self, payload: &str) -> String {
        format!("https://t.me/{}?start={}", self.bot_username, payload)
    }

    /// Web login URL carrying a bot-issued login token
    pub fn web_login_url(&self, token: &str) -> String {
        format!(
            "{}/auth/telegram?token={}",
            self.web_app_url.trim_end_matches('/'),
            token
        )
    }
}
