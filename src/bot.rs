use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::Chat;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatch::{self, ChatScope, InboundMessage, MessageDispatcher};
use crate::llm::LlmClient;

/// Telegram caps messages at 4096 chars; chunk with some headroom.
const MAX_REPLY_CHUNK: usize = 4000;

/// Shared application state
pub struct AppState {
    dispatcher: MessageDispatcher,
    config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = Arc::new(LlmClient::new(config.llm.clone()));
        let dispatcher = MessageDispatcher::new(
            client,
            config.telegram.bot_username.clone(),
            config.llm.system_prompt.clone(),
        );
        Self { dispatcher, config }
    }
}

/// The two fixed-response commands. Any other `/`-prefixed text is dropped,
/// so only plain text reaches the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Hello,
    Tools,
}

fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    let head = text.trim().split_whitespace().next()?;
    // In groups Telegram appends the handle: `/hello@mybot`.
    let head = head.strip_suffix(bot_username).unwrap_or(head);
    match head {
        "/hello" => Some(Command::Hello),
        "/tools1" => Some(Command::Tools),
        _ => None,
    }
}

fn chat_scope(chat: &Chat) -> ChatScope {
    if chat.is_private() {
        ChatScope::Private
    } else if chat.is_group() {
        ChatScope::Group
    } else {
        ChatScope::Other
    }
}

/// Start the Telegram bot
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bot = Bot::new(&state.config.telegram.bot_token);

    info!("Starting Telegram bot...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t.to_string(),
        None => return Ok(()),
    };

    let sender_name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_default();

    info!("Message from {}: {}", sender_name, text);

    if let Some(command) = parse_command(&text, &state.config.telegram.bot_username) {
        let reply = match command {
            Command::Hello => dispatch::greet(&sender_name),
            Command::Tools => dispatch::tools_placeholder().to_string(),
        };
        bot.send_message(msg.chat.id, reply).await?;
        return Ok(());
    }

    if text.starts_with('/') {
        debug!("Dropping unrecognized command: {}", text);
        return Ok(());
    }

    let inbound = InboundMessage {
        text,
        scope: chat_scope(&msg.chat),
        sender_name,
    };

    match state.dispatcher.dispatch(&inbound).await {
        Ok(Some(reply)) => {
            for chunk in split_reply(&reply, MAX_REPLY_CHUNK) {
                bot.send_message(msg.chat.id, chunk).await?;
            }
        }
        Ok(None) => {}
        Err(e) => {
            // The sender gets no reply on failure; log and keep polling.
            error!("Update {:?} in chat {:?} failed: {:#}", msg.id, msg.chat.id, e);
        }
    }

    Ok(())
}

/// Split a reply into chunks that fit under Telegram's message size limit,
/// preferring newline then space boundaries and never cutting inside a
/// UTF-8 code point.
fn split_reply(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.len() > max_len {
        let mut end = max_len;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let cut = rest[..end]
            .rfind('\n')
            .or_else(|| rest[..end].rfind(' '))
            .map(|pos| pos + 1)
            .unwrap_or(end);
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    chunks.push(rest.to_string());
    chunks
}
