//! Folding commands into an approval state.
//!
//! The fold replays the whole thread in order every time, so the state for
//! each (issuer, aspect) pair is decided by the last command touching it.

use tracing::debug;

use super::events::Event;
use crate::commands::{Command, IssuedCommand, parse_commands};
use crate::types::{ApprovalState, Login};

/// Extracts every command from the ordered events, skipping the bot's own
/// comments (its tracking comment documents the commands in prose).
pub fn collect_commands(events: &[Event], bot: &Login) -> Vec<IssuedCommand> {
    events
        .iter()
        .filter(|event| event.author.folded() != bot.folded())
        .flat_map(|event| {
            parse_commands(&event.body, bot.as_str())
                .into_iter()
                .map(|command| IssuedCommand {
                    issuer: event.author.clone(),
                    command,
                })
        })
        .collect()
}

/// Applies one command to the state.
pub fn apply(state: &mut ApprovalState, issued: &IssuedCommand) {
    let issuer = &issued.issuer;
    match &issued.command {
        Command::Approve(selection) => {
            for aspect in selection.aspects() {
                state.approve(aspect, issuer);
            }
        }
        Command::Disapprove(selection) => {
            for aspect in selection.aspects() {
                state.disapprove(aspect, issuer);
            }
        }
        Command::ApproveUntil(last) => {
            for aspect in last.through() {
                state.approve(aspect, issuer);
            }
        }
        Command::Attention(targets) => {
            for target in targets {
                state.request_attention(target, issuer);
            }
        }
    }
}

/// Builds the approval state of a thread from its ordered events.
pub fn accumulate(events: &[Event], bot: &Login) -> ApprovalState {
    let commands = collect_commands(events, bot);
    debug!(events = events.len(), commands = commands.len(), "folding review commands");
    commands.iter().fold(ApprovalState::new(), |mut state, issued| {
        apply(&mut state, issued);
        state
    })
}
