use anyhow::{Context, Result};

/// Telegram-side settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Literal handle matched against group messages, including the leading
    /// `@` (e.g. `@mybot`).
    pub bot_username: String,
}

/// Completion-provider settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
}

fn default_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. `from_env` goes
    /// through here; tests feed a map instead of mutating process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("environment variable {} is required", key))
        };

        Ok(Self {
            telegram: TelegramConfig {
                bot_token: required("TELEGRAM_BOT_TOKEN")?,
                bot_username: required("BOT_USERNAME")?,
            },
            llm: LlmConfig {
                api_key: required("DEEPSEEK_API_KEY")?,
                base_url: lookup("DEEPSEEK_BASE_URL").unwrap_or_else(default_base_url),
                model: lookup("DEEPSEEK_MODEL").unwrap_or_else(default_model),
                system_prompt: lookup("SYSTEM_PROMPT").unwrap_or_default(),
            },
        })
    }
}
