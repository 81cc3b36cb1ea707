//! Conversation thread management.
//!
//! [`ChatThread`] holds one conversation in memory: the transcript, the
//! in-flight send (at most one), the last error and the prompt to retry.
//!
//! # Example
//!
//! ```rust
//! use weather_chat::session::ChatThread;
//!
//! let mut thread = ChatThread::new();
//! let reply = thread.begin_send("Weather in Paris?").unwrap();
//! thread.append_chunk(reply, "It is sunny.");
//! thread.complete(reply);
//!
//! assert_eq!(thread.messages().len(), 2);
//! assert_eq!(thread.messages()[1].weather_icon(), Some("☀️"));
//! ```

mod thread;

pub use thread::{ChatMessage, ChatThread, InputError, Role};
