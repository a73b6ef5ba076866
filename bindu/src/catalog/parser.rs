//! Line-oriented parser for numbered query sections.
//!
//! | State | Header | Continuation | Body |
//! |-------|--------|--------------|------|
//! | `Idle` | start section | ignore | ignore |
//! | `Accumulating` | flush, start section | extend description | extend query |
//!
//! While idle, continuation comments and body lines are ignored. While
//! accumulating, continuation comments extend the description and body lines
//! extend the query text. End of input flushes the open section.

use std::collections::BTreeMap;

use super::AnalyticalQuery;

/// Classification of one trimmed, non-blank line
#[derive(Debug, PartialEq)]
enum Line<'a> {
    /// `-- N. description`
    Header { number: u32, description: &'a str },
    /// Any other `--` comment
    Continuation(&'a str),
    /// Query text
    Body(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let Some(comment) = line.strip_prefix("--") else {
        return Line::Body(line);
    };
    let comment = comment.trim();
    if let Some((head, rest)) = comment.split_once('.') {
        if let Ok(number) = head.trim().parse::<u32>() {
            if number > 0 {
                return Line::Header {
                    number,
                    description: rest.trim(),
                };
            }
        }
    }
    Line::Continuation(comment)
}

/// Section under construction
struct Pending {
    number: u32,
    description: String,
    body: Vec<String>,
}

enum State {
    Idle,
    Accumulating(Pending),
}

/// Parse catalog text into queries keyed by number.
///
/// Sections without a body are dropped; a repeated number replaces the earlier
/// section. Both cases are logged.
pub(crate) fn parse(source: &str) -> BTreeMap<u32, AnalyticalQuery> {
    let mut queries = BTreeMap::new();
    let mut state = State::Idle;

    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        state = match (state, classify(line)) {
            (State::Idle, Line::Header { number, description }) => {
                State::Accumulating(Pending::new(number, description))
            }
            (State::Idle, _) => State::Idle,
            (State::Accumulating(pending), Line::Header { number, description }) => {
                flush(&mut queries, pending);
                State::Accumulating(Pending::new(number, description))
            }
            (State::Accumulating(mut pending), Line::Continuation(text)) => {
                if !text.is_empty() {
                    if !pending.description.is_empty() {
                        pending.description.push(' ');
                    }
                    pending.description.push_str(text);
                }
                State::Accumulating(pending)
            }
            (State::Accumulating(mut pending), Line::Body(text)) => {
                pending.body.push(text.to_string());
                State::Accumulating(pending)
            }
        };
    }

    if let State::Accumulating(pending) = state {
        flush(&mut queries, pending);
    }
    queries
}

impl Pending {
    fn new(number: u32, description: &str) -> Self {
        Self {
            number,
            description: description.to_string(),
            body: Vec::new(),
        }
    }
}

fn flush(queries: &mut BTreeMap<u32, AnalyticalQuery>, pending: Pending) {
    if pending.body.is_empty() {
        log::warn!(
            "Catalog: query {} ({}) has no body, dropped",
            pending.number,
            pending.description
        );
        return;
    }
    let query = AnalyticalQuery {
        number: pending.number,
        description: pending.description,
        query_text: pending.body.join("\n"),
    };
    if let Some(previous) = queries.insert(query.number, query) {
        log::warn!(
            "Catalog: query {} defined again, replacing \"{}\"",
            previous.number,
            previous.description
        );
    }
}
