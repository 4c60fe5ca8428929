//! Command Registry Module
//!
//! This module maps command keys to typed handlers and runs a whole request
//! batch against a controller. Every token is isolated: a malformed token, an
//! unknown key, a failing handler or a panicking handler each turn into a
//! reply fragment and the rest of the batch still runs.

use super::protocol::{parse_token, split_batch};
use super::response_handler::{Fragment, Reply};
use crate::controller::{Controller, ControllerError};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// Result type for command execution
///
/// `Ok(None)` means the command ran but contributes nothing to the reply.
pub type CommandResult = Result<Option<Fragment>, CommandError>;

/// Error type for command handling
#[derive(Debug)]
pub enum CommandError {
    /// The controller failed while executing the command
    Controller(ControllerError),
    /// The handler panicked
    Panicked(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Controller(err) => write!(f, "Controller error: {}", err),
            CommandError::Panicked(msg) => write!(f, "Handler panicked: {}", msg),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<ControllerError> for CommandError {
    fn from(error: ControllerError) -> Self {
        CommandError::Controller(error)
    }
}

/// Trait for command handlers
pub trait CommandHandler: Send + Sync {
    /// Execute the command
    ///
    /// # Arguments
    /// * `key` - The key the command was invoked with
    /// * `value` - Everything after the first colon of the token
    /// * `controller` - The application controller to act on
    fn execute(&self, key: &str, value: &str, controller: &mut dyn Controller) -> CommandResult;

    /// Human-readable description of what the command does
    fn description(&self) -> &str;
}

/// Executor signature shared by closure-backed commands
pub type Executor = dyn Fn(&str, &str, &mut dyn Controller) -> CommandResult + Send + Sync;

/// Command handler backed by a closure
pub struct KeyedCommand {
    pub description: String,
    pub executor: Box<Executor>,
}

impl CommandHandler for KeyedCommand {
    fn execute(&self, key: &str, value: &str, controller: &mut dyn Controller) -> CommandResult {
        (self.executor)(key, value, controller)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Helper to create closure-backed command handlers
///
/// # Arguments
/// * `description` - The command description
/// * `executor` - The function to execute when the command is called
pub fn keyed_command<F>(description: &str, executor: F) -> Box<dyn CommandHandler>
where
    F: Fn(&str, &str, &mut dyn Controller) -> CommandResult + Send + Sync + 'static,
{
    Box::new(KeyedCommand {
        description: description.to_string(),
        executor: Box::new(executor),
    })
}

/// Key to handler table
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command handler under an exact, case-sensitive key
    pub fn register<S: Into<String>>(&mut self, key: S, handler: Box<dyn CommandHandler>) {
        let key = key.into();
        debug!("Registering command: {}", key);
        self.commands.insert(key, handler);
    }

    /// Handle one command token.
    ///
    /// Returns the token's fragment, or `None` for commands that reply nothing.
    pub fn handle(&self, token: &str, controller: &mut dyn Controller) -> Option<Fragment> {
        let command = match parse_token(token) {
            Ok(command) => command,
            Err(err) => {
                warn!("{}", err);
                return Some(Fragment::UnknownMsg(token.to_string()));
            }
        };

        let Some(handler) = self.commands.get(command.key) else {
            warn!("Unknown key: {}", command.key);
            return Some(Fragment::UnknownKey(command.key.to_string()));
        };

        info!("Executing {} with value '{}'", command.key, command.value);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.execute(command.key, command.value, controller)
        }))
        .unwrap_or_else(|payload| Err(CommandError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(fragment) => fragment,
            Err(err) => {
                if matches!(err, CommandError::Panicked(_)) {
                    error!("Command '{}' aborted: {}", token, err);
                } else {
                    warn!("Command '{}' failed: {}", token, err);
                }
                Some(Fragment::UnknownMsg(token.to_string()))
            }
        }
    }

    /// Run every command of a request batch in order and collect the reply
    pub fn dispatch(&self, request: &str, controller: &mut dyn Controller) -> Reply {
        let mut reply = Reply::default();
        for token in split_batch(request) {
            if let Some(fragment) = self.handle(token, controller) {
                reply.push(fragment);
            }
        }
        reply
    }

    /// List all registered commands with descriptions, sorted by key
    pub fn list_commands(&self) -> String {
        let mut commands: Vec<_> = self.commands.iter().collect();
        commands.sort_by_key(|(key, _)| *key);

        commands
            .iter()
            .map(|(key, handler)| format!("{}: {}", key, handler.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
