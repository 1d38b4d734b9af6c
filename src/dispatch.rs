use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::llm::CompletionClient;

/// Chat context an inbound message arrived in. Only plain groups get the
/// mention filter; supergroups and channels count as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatScope {
    Private,
    Group,
    Other,
}

/// A single inbound text message, as far as routing cares.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub text: String,
    pub scope: ChatScope,
    pub sender_name: String,
}

/// Outcome of routing: either text to forward to the model, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    Forward(String),
    Ignore,
}

/// Decide whether a message warrants a reply and what text to forward.
///
/// Group messages are ignored unless they contain `bot_username` as a literal
/// substring; the first occurrence is removed before forwarding. Matching is
/// case-sensitive with no word-boundary check, so a handle embedded in a
/// longer word still counts.
pub fn route(message: &InboundMessage, bot_username: &str) -> RouteAction {
    let text = match message.scope {
        ChatScope::Group => {
            if !message.text.contains(bot_username) {
                return RouteAction::Ignore;
            }
            message.text.replacen(bot_username, "", 1)
        }
        ChatScope::Private | ChatScope::Other => message.text.clone(),
    };

    // Empty text still forwards; the provider decides what to do with it.
    RouteAction::Forward(text.trim().to_string())
}

/// Reply for `/hello`.
pub fn greet(sender_name: &str) -> String {
    format!("Hello {}", sender_name)
}

/// Reply for `/tools1` until tool support lands.
pub fn tools_placeholder() -> &'static str {
    "Tools are coming soon: the first one will send email on your behalf."
}

/// Routes inbound messages and relays the survivors to the completion client.
pub struct MessageDispatcher {
    client: Arc<dyn CompletionClient>,
    bot_username: String,
    system_prompt: String,
}

impl MessageDispatcher {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        bot_username: String,
        system_prompt: String,
    ) -> Self {
        Self {
            client,
            bot_username,
            system_prompt,
        }
    }

    /// Handle one message; `None` means no reply is owed. The provider call
    /// blocks this update only, and its errors bubble to the caller untouched.
    pub async fn dispatch(&self, message: &InboundMessage) -> Result<Option<String>> {
        match route(message, &self.bot_username) {
            RouteAction::Ignore => {
                debug!("Ignoring group message without mention");
                Ok(None)
            }
            RouteAction::Forward(text) => {
                info!("Forwarding message from {} to model", message.sender_name);
                let reply = self.client.complete(&self.system_prompt, &text).await?;
                Ok(Some(reply))
            }
        }
    }
}
