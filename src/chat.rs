use crate::api::ApiClient;
use crate::models::{ChatMessage, ChatResponse, Speaker};
use chrono::{DateTime, Local, Utc};
use serde_json::json;
use tracing::warn;

pub const TYPING_PLACEHOLDER: &str = "…";
pub const UNAVAILABLE_NOTICE: &str = "Chat unavailable (server offline or not authenticated).";
pub const SEND_FAILED_NOTICE: &str = "Failed to send message (server offline or not authenticated).";
pub const NO_REPLY_NOTICE: &str = "No reply from server";
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Chat box: a visibility flag plus the rendered message log.
#[derive(Debug, Default)]
pub struct ChatWidget {
    visible: bool,
    log: Vec<ChatMessage>,
    pending: Option<usize>,
}

impl ChatWidget {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn log(&self) -> &[ChatMessage] {
        &self.log
    }

    /// Header activation. Opening loads the full history.
    pub async fn toggle(&mut self, api: &ApiClient) {
        if self.visible {
            self.visible = false;
        } else {
            self.open(api).await;
        }
    }

    pub async fn open(&mut self, api: &ApiClient) {
        self.visible = true;
        self.load_history(api).await;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub async fn load_history(&mut self, api: &ApiClient) {
        match api.get_as::<ChatResponse>("/api/chat").await {
            Ok(response) if response.success => {
                self.replace(response.history.unwrap_or_default());
            }
            Ok(_) => {}
            Err(err) => {
                warn!("loading chat history failed: {err}");
                self.append(Speaker::Bot, UNAVAILABLE_NOTICE);
            }
        }
    }

    pub fn begin_send(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.append(Speaker::User, text);
        self.append(Speaker::Bot, TYPING_PLACEHOLDER);
        self.pending = Some(self.log.len() - 1);
        Some(text.to_string())
    }

    pub fn finish_send(&mut self, result: Result<ChatResponse, String>) {
        self.drop_placeholder();
        match result {
            Ok(response) if response.success => {
                if let Some(history) = response.history {
                    self.replace(history);
                } else if let Some(reply) = response.reply {
                    self.append(Speaker::Bot, reply.text());
                }
            }
            Ok(response) => {
                let message = response.message.unwrap_or_else(|| NO_REPLY_NOTICE.to_string());
                self.append(Speaker::Bot, &message);
            }
            Err(err) => {
                warn!("sending chat message failed: {err}");
                self.append(Speaker::Bot, SEND_FAILED_NOTICE);
            }
        }
    }

    /// Sends one message. The user's line is in the log before the request
    /// goes out.
    pub async fn send(&mut self, api: &ApiClient, text: &str) {
        let Some(text) = self.begin_send(text) else {
            return;
        };
        let result = api
            .post_as::<ChatResponse>("/api/chat", Some(json!({ "message": text })))
            .await
            .map_err(|err| err.message);
        self.finish_send(result);
    }

    fn append(&mut self, who: Speaker, text: &str) {
        self.log.push(ChatMessage {
            who,
            text: text.to_string(),
            time: Utc::now().to_rfc3339(),
        });
    }

    fn replace(&mut self, history: Vec<ChatMessage>) {
        self.pending = None;
        self.log = history;
    }

    fn drop_placeholder(&mut self) {
        if let Some(position) = self.pending.take() {
            if position < self.log.len() {
                self.log.remove(position);
            }
        }
    }
}

pub fn format_time(iso: &str) -> String {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(time) => time
            .with_timezone(&Local)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string(),
        Err(_) => iso.to_string(),
    }
}
