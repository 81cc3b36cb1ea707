//! Chat thread state for the terminal client.

use std::fmt;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::relay::MAX_PROMPT_CHARS;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl Role {
    fn label(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Agent => "AGENT",
        }
    }
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Emoji for the weather an agent reply describes, if any.
    ///
    /// Keywords are checked in a fixed order, so "sunny with rain later" is
    /// sunny. User messages never get an icon.
    pub fn weather_icon(&self) -> Option<&'static str> {
        const ICONS: &[(&[&str], &str)] = &[
            (&["sunny", "clear"], "☀️"),
            (&["rain", "drizzle"], "🌧️"),
            (&["cloud"], "☁️"),
            (&["snow"], "❄️"),
            (&["thunder"], "⚡"),
            (&["wind", "breeze"], "💨"),
            (&["mist", "fog"], "🌫️"),
        ];

        if self.role != Role::Agent {
            return None;
        }
        let content = self.content.to_lowercase();
        ICONS
            .iter()
            .find(|(words, _)| words.iter().any(|w| content.contains(w)))
            .map(|(_, icon)| *icon)
    }
}

/// Why a prompt was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Please enter a message before sending.")]
    Empty,
    #[error("Message is too long. Please keep it under {} characters.", MAX_PROMPT_CHARS)]
    TooLong,
    #[error("A message is already being sent.")]
    Busy,
}

/// In-memory conversation with at most one send in flight.
///
/// A send appends the user message and an empty agent placeholder; streamed
/// fragments grow only that placeholder. On failure the placeholder is removed
/// and the error kept for display until the next send.
#[derive(Debug, Default)]
pub struct ChatThread {
    messages: Vec<ChatMessage>,
    loading: Option<Uuid>,
    error: Option<String>,
    last_prompt: Option<String>,
}

impl ChatThread {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a send and return the id of the agent placeholder.
    pub fn begin_send(&mut self, prompt: &str) -> Result<Uuid, InputError> {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Err(InputError::Empty);
        }
        if trimmed.chars().count() > MAX_PROMPT_CHARS {
            return Err(InputError::TooLong);
        }
        if self.loading.is_some() {
            return Err(InputError::Busy);
        }

        self.error = None;
        self.last_prompt = Some(trimmed.to_string());
        self.messages.push(ChatMessage::new(Role::User, trimmed));

        let placeholder = ChatMessage::new(Role::Agent, String::new());
        let id = placeholder.id;
        self.messages.push(placeholder);
        self.loading = Some(id);
        Ok(id)
    }

    /// Append a streamed fragment to the placeholder `id`.
    pub fn append_chunk(&mut self, id: Uuid, chunk: &str) {
        if let Some(msg) = self.messages.iter_mut().find(|m| m.id == id) {
            msg.content.push_str(chunk);
        }
    }

    /// Finish the send that owns `id`.
    pub fn complete(&mut self, id: Uuid) {
        if self.loading == Some(id) {
            self.loading = None;
        }
    }

    /// Abort the send that owns `id`, dropping its partial reply.
    pub fn fail(&mut self, id: Uuid, message: impl Into<String>) {
        self.messages.retain(|m| m.id != id);
        self.error = Some(message.into());
        if self.loading == Some(id) {
            self.loading = None;
        }
    }

    /// Prompt to resend, if anything was sent yet.
    pub fn retry_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.error = None;
        self.last_prompt = None;
    }

    /// Messages whose content contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&ChatMessage> {
        let query = query.to_lowercase();
        self.messages
            .iter()
            .filter(|m| m.content.to_lowercase().contains(&query))
            .collect()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Transcript in local time.
    pub fn export(&self) -> String {
        self.export_in(&Local)
    }

    /// Transcript with timestamps rendered in `tz`.
    ///
    /// Each message becomes `[<timestamp>] ROLE: content`; messages are
    /// separated by a blank line.
    pub fn export_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.messages
            .iter()
            .map(|m| {
                format!(
                    "[{}] {}: {}",
                    m.timestamp.with_timezone(tz).format("%Y-%m-%d %H:%M:%S"),
                    m.role.label(),
                    m.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Download name for an export made on `date`.
    pub fn export_file_name(date: NaiveDate) -> String {
        format!("weather-chat-{}.txt", date.format("%Y-%m-%d"))
    }
}
