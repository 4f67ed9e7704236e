//! Parsing of the model's reasoning replies.
//!
//! A reply either names a tool (`Action:` plus `Action Input:`) or ends the
//! loop with `Final Answer:`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

const FINAL_ANSWER: &str = "Final Answer:";

/// One parsed reasoning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Action { tool: String, input: String },
    Finish { answer: String },
}

/// Why a reply could not be parsed. The message is shown to the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

static ACTION_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
});

fn action_regex() -> Result<&'static Regex, ParseError> {
    ACTION_RE
        .as_ref()
        .map_err(|e| ParseError(format!("internal parser error: {e}")))
}

/// Parses one model reply.
pub fn parse_reply(text: &str) -> Result<AgentStep, ParseError> {
    let action = action_regex()?.captures(text).map(|caps| {
        let tool = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let input = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        (tool.trim().to_string(), clean_input(input))
    });
    let final_answer = text.find(FINAL_ANSWER);

    match (action, final_answer) {
        (Some((tool, input)), None) => Ok(AgentStep::Action { tool, input }),
        (Some((tool, input)), Some(answer_at)) => {
            // An action written before the answer wins; the answer was premature.
            let action_at = text.find("Action").unwrap_or(usize::MAX);
            if action_at < answer_at {
                Ok(AgentStep::Action {
                    tool,
                    input: strip_after(&input, FINAL_ANSWER),
                })
            } else {
                Err(ParseError(
                    "Reply contained both a final answer and an action. Provide only one."
                        .to_string(),
                ))
            }
        }
        (None, Some(answer_at)) => {
            let answer = text[answer_at + FINAL_ANSWER.len()..].trim().to_string();
            if answer.is_empty() {
                Err(ParseError("Invalid Format: 'Final Answer:' was empty.".to_string()))
            } else {
                Ok(AgentStep::Finish { answer })
            }
        }
        (None, None) if text.contains("Action") && !text.contains("Input") => Err(ParseError(
            "Invalid Format: Missing 'Action Input:' after 'Action:'".to_string(),
        )),
        (None, None) => Err(ParseError(
            "Invalid Format: Missing 'Action:' after 'Thought:'".to_string(),
        )),
    }
}

fn strip_after(text: &str, marker: &str) -> String {
    text.split(marker).next().unwrap_or_default().trim().to_string()
}

/// Trims the action input and removes code fences and wrapping quotes.
fn clean_input(raw: &str) -> String {
    let mut input = raw.trim();

    // The model sometimes keeps writing a fake observation.
    if let Some(idx) = input.find("\nObservation") {
        input = input[..idx].trim();
    }

    if let Some(inner) = fenced_block(input) {
        input = inner;
    }

    input
        .trim()
        .trim_matches('"')
        .trim_matches('`')
        .trim()
        .to_string()
}

/// Returns the contents of a ```-fenced block, if the input is one.
fn fenced_block(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let body_start = rest.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &rest[body_start..];
    let end = body.rfind("```").unwrap_or(body.len());
    Some(&body[..end])
}
