//! Manual task polling
//!
//! When an agent answers `message/send` with a task instead of a message, the
//! reply arrives later. The poller re-reads the task on a fixed interval until
//! the agent asks for input, the task ends, or the poll budget runs out.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{A2aError, Result};
use crate::protocol::{Message, Role, Task, TaskState};

/// Anything that can look up a task by id
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn get_task(&self, task_id: &str, history_length: Option<u32>) -> Result<Task>;
}

/// Poll budget and cadence
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub max_polls: u32,
    pub interval: Duration,
    pub history_length: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_polls: 10,
            interval: Duration::from_secs(2),
            history_length: 100,
        }
    }
}

/// Progress reported while polling
#[derive(Debug)]
pub enum PollEvent<'a> {
    Waiting { poll: u32, interval: Duration },
    Checking { task_id: &'a str },
    StateChanged { from: Option<TaskState>, to: TaskState },
    StateUnchanged(TaskState),
    Failed { poll: u32, error: &'a A2aError },
}

/// Why polling stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStop {
    /// The agent is waiting for the user
    InputRequired,
    /// The task completed, failed or was canceled
    Terminal(TaskState),
    /// The poll budget ran out first
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub stop: PollStop,
    pub polls: u32,
    /// Task as last seen when a stop condition was reached
    pub task: Option<Task>,
    /// Most recent agent message not seen before during this poll run
    pub last_agent_message: Option<Message>,
}

/// Poll `task_id` until a stop condition or `config.max_polls` attempts
pub async fn poll_task<S, F>(source: &S, task_id: &str, config: &PollConfig, mut observer: F) -> PollOutcome
where
    S: TaskSource + ?Sized,
    F: FnMut(PollEvent<'_>),
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut last_state: Option<TaskState> = None;
    let mut last_agent_message: Option<Message> = None;
    let mut polls = 0;

    while polls < config.max_polls {
        polls += 1;
        observer(PollEvent::Waiting {
            poll: polls,
            interval: config.interval,
        });
        tokio::time::sleep(config.interval).await;

        observer(PollEvent::Checking { task_id });
        let task = match source.get_task(task_id, Some(config.history_length)).await {
            Ok(task) => task,
            Err(e) => {
                warn!("Poll #{} for task {} failed: {}", polls, task_id, e);
                observer(PollEvent::Failed {
                    poll: polls,
                    error: &e,
                });
                continue;
            }
        };

        let state = task.status.state;
        if last_state != Some(state) {
            observer(PollEvent::StateChanged {
                from: last_state,
                to: state,
            });
            last_state = Some(state);
        } else {
            observer(PollEvent::StateUnchanged(state));
        }

        let candidates = task
            .status
            .message
            .iter()
            .chain(task.history.iter().flatten());
        for msg in candidates {
            if seen.insert(msg.message_id.clone()) && msg.role == Role::Agent {
                last_agent_message = Some(msg.clone());
            }
        }

        let stop = if state == TaskState::InputRequired {
            Some(PollStop::InputRequired)
        } else if state.is_terminal_for_polling() {
            Some(PollStop::Terminal(state))
        } else {
            None
        };

        if let Some(stop) = stop {
            debug!("Stopped polling task {} after {} polls: {:?}", task_id, polls, stop);
            return PollOutcome {
                stop,
                polls,
                task: Some(task),
                last_agent_message,
            };
        }
    }

    debug!("Poll budget of {} exhausted for task {}", config.max_polls, task_id);
    PollOutcome {
        stop: PollStop::Exhausted,
        polls,
        task: None,
        last_agent_message,
    }
}
