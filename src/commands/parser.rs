//! Parser for review commands in comment text.
//!
//! This module provides a pure parser that extracts structured commands from
//! unstructured GitHub comment text. Invalid commands never surface to the
//! author: they are logged at debug level and skipped.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::types::{Login, ReviewAspect};

use super::types::{AspectSelection, Command};

/// Punctuation stripped from the end of every token before matching.
const TRAILING_PUNCTUATION: [char; 4] = [',', '.', '!', '?'];

/// Why a mention did not yield a command.
#[derive(Debug, Error, PartialEq, Eq)]
enum InvalidCommand {
    #[error("fewer than two tokens follow the mention")]
    Incomplete,

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("unknown aspect {0:?}")]
    UnknownAspect(String),

    #[error("attention without any @login argument")]
    NoAttentionTargets,
}

/// Parses every review command found in comment text, in reading order.
///
/// # Arguments
///
/// * `text` - The comment text to parse
/// * `bot_name` - The bot login without the `@` prefix (e.g., `"flinkbot"`)
///
/// # Parsing Rules
///
/// - Only lines containing `@{bot_name}` are considered
/// - Tokens are split on whitespace after stripping trailing `,.!?`
/// - The mention is matched case-insensitively (like GitHub mentions)
/// - Every mention on a line is interpreted; the token after it is the action,
///   the one after that the first argument
/// - The arguments of one command end at the next mention on the same line
/// - An invalid command stops processing of the rest of its line
///
/// # Examples
///
/// ```
/// use review_bot::commands::{parse_commands, AspectSelection, Command};
/// use review_bot::types::ReviewAspect;
///
/// let commands = parse_commands("LGTM!\n@flinkbot approve description.", "flinkbot");
/// assert_eq!(
///     commands,
///     vec![Command::Approve(AspectSelection::Named([ReviewAspect::Description].into()))]
/// );
///
/// assert!(parse_commands("@flinkbot approve", "flinkbot").is_empty());
/// assert!(parse_commands("no command here", "flinkbot").is_empty());
/// ```
pub fn parse_commands(text: &str, bot_name: &str) -> Vec<Command> {
    let mention = format!("@{}", bot_name);
    let mention_lower = mention.to_ascii_lowercase();
    let mut commands = Vec::new();

    for line in text.lines() {
        if !line.to_ascii_lowercase().contains(&mention_lower) {
            continue;
        }

        let tokens: Vec<&str> = line
            .split_whitespace()
            .map(|token| token.trim_end_matches(TRAILING_PUNCTUATION))
            .filter(|token| !token.is_empty())
            .collect();

        for (index, token) in tokens.iter().enumerate() {
            if !token.eq_ignore_ascii_case(&mention) {
                continue;
            }
            match parse_after_mention(&tokens, index, &mention) {
                Ok(command) => commands.push(command),
                Err(reason) => {
                    debug!(%reason, line, "Ignoring invalid command");
                    break;
                }
            }
        }
    }

    commands
}

/// Parses the command introduced by the mention at `tokens[index]`.
fn parse_after_mention(
    tokens: &[&str],
    index: usize,
    mention: &str,
) -> Result<Command, InvalidCommand> {
    let (Some(action), Some(first_arg)) = (tokens.get(index + 1), tokens.get(index + 2)) else {
        return Err(InvalidCommand::Incomplete);
    };

    // Arguments run from the first argument up to the next mention.
    let args: Vec<&str> = tokens[index + 2..]
        .iter()
        .take_while(|token| !token.eq_ignore_ascii_case(mention))
        .copied()
        .collect();
    let further = args.get(1..).unwrap_or_default();

    match action.to_ascii_lowercase().as_str() {
        "attention" => parse_attention(&args),
        "approve" => parse_selection(first_arg, further).map(Command::Approve),
        "disapprove" => parse_selection(first_arg, further).map(Command::Disapprove),
        "approve-until" => ReviewAspect::parse(first_arg)
            .map(Command::ApproveUntil)
            .ok_or_else(|| InvalidCommand::UnknownAspect(first_arg.to_string())),
        other => Err(InvalidCommand::UnknownAction(other.to_string())),
    }
}

/// Collects every `@login` argument (a lone `@` is not a login).
fn parse_attention(args: &[&str]) -> Result<Command, InvalidCommand> {
    let targets: BTreeSet<Login> = args
        .iter()
        .filter(|token| token.starts_with('@') && token.len() > 1)
        .map(Login::new)
        .collect();

    if targets.is_empty() {
        Err(InvalidCommand::NoAttentionTargets)
    } else {
        Ok(Command::Attention(targets))
    }
}

/// Parses `all` or a first aspect, folding any further aspect names in.
fn parse_selection(first: &str, rest: &[&str]) -> Result<AspectSelection, InvalidCommand> {
    if first.eq_ignore_ascii_case("all") {
        return Ok(AspectSelection::All);
    }

    let first = ReviewAspect::parse(first)
        .ok_or_else(|| InvalidCommand::UnknownAspect(first.to_string()))?;

    let mut aspects = BTreeSet::from([first]);
    aspects.extend(rest.iter().filter_map(|token| ReviewAspect::parse(token)));
    Ok(AspectSelection::Named(aspects))
}
