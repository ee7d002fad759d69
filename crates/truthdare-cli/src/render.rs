//! Plain-text rendering of session views.

use truthdare_core::model::{AgeGateDecision, Level, PROMPTS_PER_TYPE_PER_LEVEL, Prompt};
use truthdare_session::application::query_handlers::{PlayerView, SessionView};

/// One line announcing whose turn it is, or `None` if nobody holds it.
#[must_use]
pub fn turn_line(view: &SessionView) -> Option<String> {
    let player = view.players.iter().find(|p| p.is_current)?;
    Some(format!(
        "{}'s turn: truth or dare? ({})",
        player.name,
        counters(player)
    ))
}

/// A drawn prompt, tagged with its type.
#[must_use]
pub fn prompt_lines(prompt: &Prompt) -> Vec<String> {
    vec![
        format!("[{}] {}", prompt.prompt_type, prompt.text),
        "type `done` once it is completed".to_owned(),
    ]
}

/// Full status block.
#[must_use]
pub fn status_lines(view: &SessionView) -> Vec<String> {
    let mut lines = Vec::new();
    match view.age_gate_decision {
        AgeGateDecision::Undecided => {
            lines.push("Are you 18 or older? Answer with `age yes` or `age no`.".to_owned());
            return lines;
        }
        AgeGateDecision::Denied => {
            lines.push("This game is for adults only. `reset` to answer again.".to_owned());
            return lines;
        }
        AgeGateDecision::Allowed => {}
    }

    if view.players.is_empty() {
        lines.push("Register players with `players <name>:<m|f> <name>:<m|f>`.".to_owned());
        return lines;
    }
    if view.game_completed {
        lines.push("Game complete! `reset` to play again.".to_owned());
    } else if view.game_started {
        lines.push(format!(
            "Level {}: {}/{} prompts completed",
            view.current_level, view.level_progress, view.level_prompt_total
        ));
    } else {
        lines.push("Players registered. `start` to begin.".to_owned());
    }
    for player in &view.players {
        let marker = if player.is_current { "*" } else { " " };
        lines.push(format!(
            "{marker} {} ({}): {}",
            player.name,
            player.gender,
            counters(player)
        ));
    }
    if view.level_complete && !view.game_completed {
        lines.push(level_complete_line(view.current_level));
    }
    lines
}

/// Announces a cleared level and what `next` will do.
#[must_use]
pub fn level_complete_line(current_level: u8) -> String {
    let next = if current_level < Level::MAX.get() {
        "`next` to continue"
    } else {
        "`next` to finish the game"
    };
    format!("Level {current_level} complete! {next}.")
}

fn counters(player: &PlayerView) -> String {
    format!(
        "{}/{PROMPTS_PER_TYPE_PER_LEVEL} truths, {}/{PROMPTS_PER_TYPE_PER_LEVEL} dares",
        player.truths_completed, player.dares_completed
    )
}
