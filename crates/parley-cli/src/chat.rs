//! Interactive chat session with a single A2A agent

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use parley_a2a::{
    A2aClient, A2aError, AgentCard, AgentConnection, Message, PollConfig, PollEvent, PollStop,
    SendMessageResponse, Task, TaskState, apply_compat_defaults, poll_task, validate_card,
};

use crate::config::ChatConfig;
use crate::render;

/// Local dev server room used when no URL is given
pub const DEFAULT_AGENT_URL: &str =
    "http://localhost:3003/api/rooms/please-replace-this-placeholder-1756426027739-gvr0wy/a2a";

/// Public Banterop bridge running the knee MRI prior-auth scenario
pub const BANTEROP_URL: &str = "https://banterop.fhir.me/api/bridge/eyJ0aXRsZSI6IlJ1bjogS25lZSBNUkkgUHJpb3IgQXV0aCIsInNjZW5hcmlvSWQiOiJzY2VuX2tuZWVfbXJpXzAxIiwiYWdlbnRzIjpbeyJpZCI6InBhdGllbnQtYWdlbnQifSx7ImlkIjoiaW5zdXJhbmNlLWF1dGgtc3BlY2lhbGlzdCIsImNvbmZpZyI6eyJtb2RlbCI6Im9wZW5haS9ncHQtb3NzLTEyMGI6bml0cm8ifX1dLCJzdGFydGluZ0FnZW50SWQiOiJwYXRpZW50LWFnZW50In0/a2a";

/// A line typed at the `You>` prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Quit,
    New,
    End,
    Send(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        match line.to_lowercase().as_str() {
            "/quit" => Self::Quit,
            "/new" => Self::New,
            "/end" => Self::End,
            _ => Self::Send(line.to_string()),
        }
    }
}

/// Discover, validate and connect to the agent behind `agent_url`
pub async fn connect<W: Write>(
    agent_url: &str,
    config: &ChatConfig,
    out: &mut W,
) -> Result<(AgentCard, AgentConnection)> {
    writeln!(out, "🔌 Connecting to: {}", agent_url)?;

    let client = A2aClient::new(config.timeout())?;
    let mut written: std::io::Result<()> = Ok(());
    let discovered = client
        .discover_card(agent_url, |url| {
            if written.is_ok() {
                written = writeln!(out, "   Trying: {}", url);
            }
        })
        .await;
    written.context("Failed to write discovery progress")?;
    let mut doc = match discovered {
        Ok(doc) => doc,
        Err(e @ A2aError::CardNotFound { .. }) => {
            writeln!(out, "❌ Could not fetch agent card from any URL pattern")?;
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    writeln!(out, "   ✅ Found agent card at: {}", doc.url)?;

    apply_compat_defaults(&mut doc.body);
    let card = validate_card(&doc.body).map_err(A2aError::Validation)?;

    writeln!(out, "✅ Connected to: {}", card.name)?;
    writeln!(out, "   Protocol: v{}", card.protocol_version)?;
    writeln!(out, "   Transport: {}", card.preferred_transport)?;

    let conn = client.connect(&card, config.connection_config())?;
    writeln!(out, "✅ Client initialized successfully\n")?;
    info!("Chat session connected to {} via {}", card.name, conn.endpoint());

    Ok((card, conn))
}

/// Conversation state: the connection plus the task currently being continued
pub struct ChatSession<W: Write> {
    conn: AgentConnection,
    poll: PollConfig,
    current_task: Option<Task>,
    out: W,
}

impl<W: Write> ChatSession<W> {
    pub fn new(conn: AgentConnection, poll: PollConfig, out: W) -> Self {
        Self {
            conn,
            poll,
            current_task: None,
            out,
        }
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current_task.as_ref()
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn banner(&mut self) -> Result<()> {
        writeln!(self.out, "{}", render::RULE)?;
        writeln!(self.out, "A2A Interactive Client")?;
        writeln!(self.out, "{}", render::RULE)?;
        writeln!(self.out, "\nCommands:")?;
        writeln!(self.out, "  /new   - Start a new conversation")?;
        writeln!(self.out, "  /end   - End the current conversation")?;
        writeln!(self.out, "  /quit  - Exit")?;
        writeln!(self.out, "  (anything else) - Send to agent\n")?;
        writeln!(self.out, "{}\n", render::RULE)?;
        Ok(())
    }

    /// Read commands until `/quit`, end of input or Ctrl-C
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                debug!("Ctrl-C listener unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_until(input, ctrl_c).await
    }

    /// Like [`run`](Self::run), but ends when `shutdown` resolves, whether the
    /// session is at the prompt or waiting on the agent
    pub async fn run_until<R, S>(&mut self, input: R, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.banner()?;
        let mut lines = input.lines();

        loop {
            write!(self.out, "You> ")?;
            self.out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read input")?,
                _ = &mut shutdown => None,
            };
            let Some(line) = line else {
                writeln!(self.out, "\n👋 Goodbye!")?;
                break;
            };

            let interrupted = match Command::parse(&line) {
                Command::Empty => continue,
                Command::Quit => {
                    writeln!(self.out, "👋 Goodbye!")?;
                    break;
                }
                Command::New => {
                    self.new_conversation()?;
                    false
                }
                Command::End => tokio::select! {
                    ended = self.end_conversation() => {
                        ended?;
                        writeln!(self.out)?;
                        false
                    }
                    _ = &mut shutdown => true,
                },
                Command::Send(text) => tokio::select! {
                    sent = self.send(&text) => {
                        if let Err(e) = sent {
                            writeln!(self.out, "❌ Error: {:#}", e)?;
                        }
                        false
                    }
                    _ = &mut shutdown => true,
                },
            };

            if interrupted {
                info!("Session interrupted while waiting on the agent");
                writeln!(self.out, "\n👋 Goodbye!")?;
                break;
            }
        }
        Ok(())
    }

    pub fn new_conversation(&mut self) -> Result<()> {
        self.current_task = None;
        writeln!(self.out, "🆕 Starting new conversation\n")?;
        Ok(())
    }

    /// Send one user message, continuing the current task if there is one
    pub async fn send(&mut self, text: &str) -> Result<()> {
        let mut message = Message::user_text(text);
        if let Some(task) = &self.current_task {
            message = message.with_task_id(task.id.clone());
        }

        writeln!(self.out, "📤 Sending message...")?;
        writeln!(self.out, "   Waiting for responses...")?;
        writeln!(
            self.out,
            "   [Polling enabled: {}]",
            self.conn.config().polling
        )?;

        let response = self.conn.send_message(message).await?;
        let mut message_count = 0;
        match response {
            SendMessageResponse::Task(task) => {
                write!(self.out, "{}", render::task_update(1, &task))?;
                self.current_task = Some(task);
            }
            SendMessageResponse::Message(msg) => {
                message_count += 1;
                write!(self.out, "{}", render::received_message(message_count, &msg))?;
            }
        }
        writeln!(self.out, "   Total responses: 1 (messages: {})", message_count)?;

        if self.current_task.is_some() && message_count == 0 {
            writeln!(self.out, "\n   🔄 Starting manual polling for updates...")?;
            self.poll_for_updates().await?;
        }

        writeln!(self.out)?;
        Ok(())
    }

    /// Poll the current task until the agent replies or the task ends
    pub async fn poll_for_updates(&mut self) -> Result<()> {
        let Some(task_id) = self.current_task.as_ref().map(|t| t.id.clone()) else {
            return Ok(());
        };

        let out = &mut self.out;
        let mut written: std::io::Result<()> = Ok(());
        let outcome = poll_task(&self.conn, &task_id, &self.poll, |event| {
            if written.is_err() {
                return;
            }
            written = match event {
                PollEvent::Waiting { poll, interval } => writeln!(
                    out,
                    "\n   Poll #{} (waiting {:.1}s)...",
                    poll,
                    interval.as_secs_f64()
                ),
                PollEvent::Checking { task_id } => writeln!(out, "   Checking task {}...", task_id),
                PollEvent::StateChanged { from, to } => {
                    let from = from.map(|s| s.to_string()).unwrap_or_else(|| "None".to_string());
                    writeln!(out, "   ✓ State changed: {} → {}", from, to)
                }
                PollEvent::StateUnchanged(state) => writeln!(out, "   State: {}", state),
                PollEvent::Failed { error, .. } => writeln!(out, "   Poll error: {}", error),
            };
        })
        .await;
        written.context("Failed to write poll progress")?;
        debug!("Polling finished: {:?} after {} polls", outcome.stop, outcome.polls);

        match outcome.stop {
            PollStop::InputRequired => {
                match &outcome.last_agent_message {
                    Some(msg) => {
                        writeln!(self.out, "\n   ✅ Agent responded. Stopping polls.\n")?;
                        writeln!(self.out, "🤖 Agent:")?;
                        writeln!(self.out, "{}", render::agent_text(msg))?;
                    }
                    None => {
                        writeln!(self.out, "\n   ℹ️ Reached input-required state. Stopping polls.")?;
                        writeln!(self.out, "   (No agent message found in status)")?;
                    }
                }
                self.current_task = outcome.task;
            }
            PollStop::Terminal(state) => {
                writeln!(self.out, "\n   Task {}. Stopping polls.", state)?;
                if state == TaskState::Completed {
                    if let Some(msg) = &outcome.last_agent_message {
                        writeln!(self.out, "\n🤖 Agent (final message):")?;
                        writeln!(self.out, "{}", render::agent_text(msg))?;
                    }
                }
                self.current_task = outcome.task;
            }
            PollStop::Exhausted => {
                writeln!(self.out, "\n   Reached max polls ({}). Stopping.", self.poll.max_polls)?;
            }
        }
        Ok(())
    }

    /// Cancel the current task on the agent and forget it locally
    pub async fn end_conversation(&mut self) -> Result<()> {
        let Some(task) = self.current_task.take() else {
            writeln!(self.out, "❌ No active conversation to end")?;
            return Ok(());
        };

        writeln!(self.out, "📤 Ending conversation...")?;
        match self.conn.cancel_task(&task.id).await {
            Ok(task) => writeln!(self.out, "✅ Conversation ended (task {})", task.status.state)?,
            Err(e) => {
                writeln!(self.out, "❌ Error ending conversation: {}", e)?;
                writeln!(self.out, "   Clearing conversation locally")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("   "), Command::Empty);
        assert_eq!(Command::parse("/QUIT"), Command::Quit);
        assert_eq!(Command::parse(" /new "), Command::New);
        assert_eq!(Command::parse("/End"), Command::End);
        assert_eq!(
            Command::parse("  book a room  "),
            Command::Send("book a room".to_string())
        );
        assert_eq!(
            Command::parse("/unknown"),
            Command::Send("/unknown".to_string())
        );
    }

    #[test]
    fn test_known_urls() {
        assert!(DEFAULT_AGENT_URL.ends_with("/a2a"));
        assert!(BANTEROP_URL.starts_with("https://"));
        assert!(BANTEROP_URL.ends_with("/a2a"));
    }
}
