//! Input Actor: Dedicated thread reading user input.
//!
//! Input is line based. Plain lines are messages; lines starting with `/`
//! are commands. Each line becomes one [`UserCommand`] on the event loop.

use super::messages::{ClientEvent, UserCommand};
use crossbeam_channel::Sender;
use std::io::{self, BufRead, BufReader};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Summary of the commands understood by [`parse_command`].
pub const COMMAND_HELP: &str = "\
/stop            stop the current response
/new             start a new chat
/model [ID]      list models, or select one
/system [TEXT]   show the system prompt, or set it (/system clear removes it)
/help            show this summary
/quit            leave";

/// Turn one input line into a command.
///
/// Blank lines produce nothing.
pub fn parse_command(line: &str) -> Option<UserCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(command) = line.strip_prefix('/') else {
        return Some(UserCommand::Submit(line.to_string()));
    };

    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    Some(match (name, argument) {
        ("stop", _) => UserCommand::Cancel,
        ("new", _) => UserCommand::NewChat,
        ("model", "") => UserCommand::ListModels,
        ("model", id) => UserCommand::SelectModel(id.to_string()),
        ("system", "") => UserCommand::ShowSystemPrompt,
        ("system", "clear") => UserCommand::SetSystemPrompt(String::new()),
        ("system", text) => UserCommand::SetSystemPrompt(text.to_string()),
        ("help", _) => UserCommand::Help,
        ("quit" | "exit", _) => UserCommand::Quit,
        (other, _) => UserCommand::Unknown(other.to_string()),
    })
}

/// Input actor that reads lines and forwards commands.
///
/// Reads block, so the thread cannot be interrupted; it exits at end of
/// input or when the event loop is gone.
pub struct InputActor {
    /// Handle to the input thread.
    handle: Option<JoinHandle<()>>,
}

impl InputActor {
    /// Spawn the input actor on standard input.
    pub fn spawn_stdin(events: Sender<ClientEvent>) -> Self {
        Self::spawn(BufReader::new(io::stdin()), events)
    }

    /// Spawn the input actor on any line source.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the input thread.
    pub fn spawn<R: BufRead + Send + 'static>(reader: R, events: Sender<ClientEvent>) -> Self {
        let handle = thread::Builder::new()
            .name("chatwheel-input".to_string())
            .spawn(move || {
                Self::run_loop(reader, &events);
            })
            .expect("Failed to spawn input thread");

        Self {
            handle: Some(handle),
        }
    }

    /// Whether the input thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the input thread to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main input loop.
    fn run_loop<R: BufRead>(reader: R, events: &Sender<ClientEvent>) {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            };

            if let Some(command) = parse_command(&line) {
                if events.send(ClientEvent::Command(command)).is_err() {
                    // Receiver dropped, exit
                    return;
                }
            }
        }

        debug!("Input closed");
        let _ = events.send(ClientEvent::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::io::Cursor;

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(
            parse_command("  What is Rust?  "),
            Some(UserCommand::Submit("What is Rust?".to_string()))
        );
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/stop"), Some(UserCommand::Cancel));
        assert_eq!(parse_command("/new"), Some(UserCommand::NewChat));
        assert_eq!(parse_command("/model"), Some(UserCommand::ListModels));
        assert_eq!(
            parse_command("/model  llama3 "),
            Some(UserCommand::SelectModel("llama3".to_string()))
        );
        assert_eq!(parse_command("/system"), Some(UserCommand::ShowSystemPrompt));
        assert_eq!(
            parse_command("/system Answer in French."),
            Some(UserCommand::SetSystemPrompt("Answer in French.".to_string()))
        );
        assert_eq!(
            parse_command("/system clear"),
            Some(UserCommand::SetSystemPrompt(String::new()))
        );
        assert_eq!(parse_command("/exit"), Some(UserCommand::Quit));
        assert_eq!(
            parse_command("/frobnicate"),
            Some(UserCommand::Unknown("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_actor_forwards_lines_then_shuts_down() {
        let (tx, rx) = unbounded();
        let actor = InputActor::spawn(Cursor::new("hello\n\n/stop\n"), tx);
        actor.join();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ClientEvent::Command(UserCommand::Submit("hello".to_string())),
                ClientEvent::Command(UserCommand::Cancel),
                ClientEvent::Shutdown,
            ]
        );
    }
}
