//! A2A (Agent-to-Agent) protocol support for Parley
//!
//! Client-side pieces of Google's Agent-to-Agent protocol: agent card
//! discovery and validation, JSON-RPC message exchange, and task polling.

pub mod card;
pub mod client;
pub mod error;
pub mod poll;
pub mod protocol;

pub use card::{FieldError, ValidationReport, apply_compat_defaults, candidate_card_urls, validate_card};
pub use client::{A2aClient, AgentConnection, ConnectionConfig, FetchedDocument};
pub use error::{A2aError, Result};
pub use poll::{PollConfig, PollEvent, PollOutcome, PollStop, TaskSource, poll_task};
pub use protocol::{AgentCard, Message, Role, SendMessageResponse, Task, TaskState};
