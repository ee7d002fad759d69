//! Line-oriented game shell.

use tracing::debug;
use truthdare_core::error::DomainError;
use truthdare_core::model::{AgeGateDecision, Prompt};
use truthdare_session::application::engine::{ChooseOutcome, GameEngine};
use truthdare_session::domain::aggregates::LevelOutcome;

use crate::command::{Command, HELP};
use crate::render;

/// Drives one `GameEngine` from parsed commands and renders replies.
#[derive(Debug)]
pub struct Shell {
    engine: GameEngine,
    /// Drawn but not yet completed.
    pending: Option<Prompt>,
}

impl Shell {
    /// Wraps an engine.
    #[must_use]
    pub fn new(engine: GameEngine) -> Self {
        Self {
            engine,
            pending: None,
        }
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// The prompt waiting for `done`, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&Prompt> {
        self.pending.as_ref()
    }

    /// Lines shown when the shell starts.
    #[must_use]
    pub fn greeting(&self) -> Vec<String> {
        let view = self.engine.view();
        let mut lines = vec!["Truth or Dare".to_owned()];
        lines.extend(render::status_lines(&view));
        if !view.level_complete {
            lines.extend(render::turn_line(&view));
        }
        lines
    }

    /// Runs one command and returns the lines to print.
    ///
    /// # Errors
    ///
    /// Returns the `DomainError` of a rejected engine operation, or
    /// `DomainError::Precondition` for a command the age gate blocks.
    pub fn execute(&mut self, command: Command) -> Result<Vec<String>, DomainError> {
        debug!(?command, "executing command");
        self.check_age_gate(&command)?;

        match command {
            Command::Age(allowed) => {
                self.engine.set_age_gate_decision(allowed);
                Ok(render::status_lines(&self.engine.view()))
            }
            Command::Players(first, second) => {
                self.engine.register_players(&first, &second)?;
                Ok(vec![format!(
                    "Welcome {} and {}! Type `start` to begin.",
                    first.name.trim(),
                    second.name.trim()
                )])
            }
            Command::Start => {
                self.engine.start_game()?;
                self.engine.ensure_current_player();
                Ok(self.turn_lines())
            }
            Command::Draw(prompt_type) => match self.engine.choose_type(prompt_type)? {
                ChooseOutcome::Drawn(prompt) => {
                    let lines = render::prompt_lines(&prompt);
                    self.pending = Some(prompt);
                    Ok(lines)
                }
                ChooseOutcome::Exhausted => {
                    self.pending = None;
                    Ok(vec![format!(
                        "No {prompt_type}s left at this level. Try a {}.",
                        prompt_type.other()
                    )])
                }
            },
            Command::Done => self.complete_pending(),
            Command::Next => {
                let lines = match self.engine.advance_level()? {
                    LevelOutcome::Advanced(level) => {
                        self.engine.ensure_current_player();
                        let mut lines = vec![format!("Welcome to level {level}!")];
                        lines.extend(self.turn_lines());
                        lines
                    }
                    LevelOutcome::GameCompleted => {
                        vec!["Game complete! `reset` to play again.".to_owned()]
                    }
                };
                self.pending = None;
                Ok(lines)
            }
            Command::Status => Ok(render::status_lines(&self.engine.view())),
            Command::Reset => {
                self.engine.reset_game();
                self.pending = None;
                let mut lines = vec!["Game reset.".to_owned()];
                lines.extend(render::status_lines(&self.engine.view()));
                Ok(lines)
            }
            Command::Help => Ok(HELP.lines().map(str::to_owned).collect()),
            Command::Quit => Ok(vec!["Bye!".to_owned()]),
        }
    }

    fn complete_pending(&mut self) -> Result<Vec<String>, DomainError> {
        let prompt = self.pending.take().ok_or_else(|| {
            DomainError::Precondition("draw a truth or dare first".to_owned())
        })?;
        if let Err(e) = self.engine.complete_prompt(&prompt.id) {
            self.pending = Some(prompt);
            return Err(e);
        }

        if self.engine.check_level_completion() {
            let level = self.engine.state().current_level().get();
            Ok(vec![render::level_complete_line(level)])
        } else {
            Ok(self.turn_lines())
        }
    }

    fn turn_lines(&self) -> Vec<String> {
        render::turn_line(&self.engine.view()).into_iter().collect()
    }

    fn check_age_gate(&self, command: &Command) -> Result<(), DomainError> {
        if matches!(
            command,
            Command::Status | Command::Reset | Command::Help | Command::Quit
        ) {
            return Ok(());
        }
        match (self.engine.state().age_gate(), command) {
            (AgeGateDecision::Allowed, _) | (AgeGateDecision::Undecided, Command::Age(_)) => Ok(()),
            (AgeGateDecision::Undecided, _) => Err(DomainError::Precondition(
                "answer the age gate first: `age yes` or `age no`".to_owned(),
            )),
            (AgeGateDecision::Denied, _) => Err(DomainError::Precondition(
                "this game is for adults only; `reset` to answer again".to_owned(),
            )),
        }
    }
}
