//! Parsing of shell input lines.

use std::str::FromStr;

use thiserror::Error;
use truthdare_core::model::{Gender, PromptType};
use truthdare_session::domain::aggregates::PlayerRegistration;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer the age gate.
    Age(bool),
    /// Register both players.
    Players(PlayerRegistration, PlayerRegistration),
    Start,
    /// Draw a prompt of the given type for the acting player.
    Draw(PromptType),
    /// Complete the drawn prompt.
    Done,
    /// Advance to the next level.
    Next,
    Status,
    Reset,
    Help,
    Quit,
}

/// Input that is not a valid command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} (type `help` for commands)")]
pub struct CommandParseError(String);

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandParseError("empty input".to_owned()));
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("age", [answer]) => Self::Age(parse_yes_no(answer)?),
            ("players", roster) if !roster.is_empty() => {
                let (first, second) = parse_roster(roster)?;
                Self::Players(first, second)
            }
            ("start", []) => Self::Start,
            ("truth" | "t", []) => Self::Draw(PromptType::Truth),
            ("dare" | "d", []) => Self::Draw(PromptType::Dare),
            ("done", []) => Self::Done,
            ("next", []) => Self::Next,
            ("status", []) => Self::Status,
            ("reset", []) => Self::Reset,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            ("age", _) => return Err(usage("age yes|no")),
            ("players", _) => return Err(usage("players <name>:<m|f> <name>:<m|f>")),
            (
                "start" | "truth" | "t" | "dare" | "d" | "done" | "next" | "status" | "reset"
                | "help" | "?" | "quit" | "exit",
                _,
            ) => return Err(CommandParseError(format!("`{verb}` takes no arguments"))),
            _ => return Err(CommandParseError(format!("unknown command `{verb}`"))),
        };
        Ok(command)
    }
}

/// Text printed by the `help` command.
pub const HELP: &str = "\
commands:
  age yes|no                           answer the 18+ age gate
  players <name>:<m|f> <name>:<m|f>    register both players (names may contain spaces)
  start                                begin the game
  truth | dare                         draw a prompt for the current player
  done                                 mark the drawn prompt as completed
  next                                 advance to the next level
  status                               show levels, turns and progress
  reset                                discard the game and start over
  quit                                 save and exit";

fn usage(form: &str) -> CommandParseError {
    CommandParseError(format!("usage: {form}"))
}

fn parse_yes_no(answer: &str) -> Result<bool, CommandParseError> {
    match answer.to_ascii_lowercase().as_str() {
        "yes" | "y" => Ok(true),
        "no" | "n" => Ok(false),
        _ => Err(usage("age yes|no")),
    }
}

/// Splits `players` arguments into two registrations. A name may span
/// several words; each ends at the word carrying `:<gender>`.
fn parse_roster(
    words: &[&str],
) -> Result<(PlayerRegistration, PlayerRegistration), CommandParseError> {
    let mut registrations = Vec::with_capacity(2);
    let mut name_words: Vec<&str> = Vec::new();
    for &word in words {
        let Some((last, gender)) = word.rsplit_once(':') else {
            name_words.push(word);
            continue;
        };
        name_words.push(last);
        registrations.push(parse_registration(&name_words.join(" "), gender)?);
        name_words.clear();
    }
    match <[PlayerRegistration; 2]>::try_from(registrations) {
        Ok([first, second]) if name_words.is_empty() => Ok((first, second)),
        _ => Err(usage("players <name>:<m|f> <name>:<m|f>")),
    }
}

fn parse_registration(name: &str, gender: &str) -> Result<PlayerRegistration, CommandParseError> {
    let gender = match gender.to_ascii_lowercase().as_str() {
        "m" | "male" => Gender::Male,
        "f" | "female" => Gender::Female,
        other => {
            return Err(CommandParseError(format!(
                "unknown gender `{other}` for {name}; use m or f"
            )));
        }
    };
    Ok(PlayerRegistration::new(name, gender))
}
