//! Status Parser
//!
//! Turns the flat token list of an SSDB `info` response into a
//! [`ParsedStatus`]. Fields are located by scanning for marker tokens rather
//! than by position, since the token count varies between server versions.
//!
//! Parsing never fails as a whole: missing fields stay `None`, and anything
//! structurally wrong clears `well_formed`.

use crate::domain::entities::{CommandStats, ParsedStatus};
use std::collections::BTreeMap;

/// First token of a successful response.
pub const SUCCESS_MARKER: &str = "ok";
/// Key token preceding the database size.
pub const DB_SIZE_MARKER: &str = "dbsize";
/// Key token preceding the connection count.
pub const LINKS_MARKER: &str = "links";
/// Leading word of a replication client record.
pub const REPLICATION_CLIENT_MARKER: &str = "client";
/// Prefix of every command key; the first such token opens the command table.
pub const COMMAND_KEY_PREFIX: &str = "cmd.";

const REPLICATION_SYNC: &str = "SYNC";

/// Parse one backend's response tokens.
pub fn parse(tokens: &[String]) -> ParsedStatus {
    let mut status = ParsedStatus::default();

    let Some(first) = tokens.first() else {
        return status;
    };
    let success = first == SUCCESS_MARKER;

    status.db_size = value_after(tokens, DB_SIZE_MARKER);
    status.links = value_after(tokens, LINKS_MARKER);

    let command_start = tokens
        .iter()
        .position(|t| t.starts_with(COMMAND_KEY_PREFIX));
    let head = &tokens[..command_start.unwrap_or(tokens.len())];

    status.replication = head
        .iter()
        .filter(|t| is_replication_record(t))
        .filter_map(|t| {
            let record = parse_replication_record(t);
            if record.is_none() {
                tracing::debug!("skipping malformed replication record: {:?}", t);
            }
            record
        })
        .collect();

    let commands_ok = match command_start {
        Some(start) => match parse_command_table(&tokens[start..]) {
            Ok(commands) => {
                status.commands = commands;
                true
            }
            Err(e) => {
                tracing::debug!("discarding command table: {}", e);
                false
            }
        },
        None => true,
    };

    status.well_formed =
        success && status.db_size.is_some() && status.links.is_some() && commands_ok;
    status
}

/// Best-effort numeric coercion: anything unparseable becomes `0.0`.
pub fn parse_float_or_zero(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.0)
}

/// Token immediately following the first occurrence of `marker`.
fn value_after(tokens: &[String], marker: &str) -> Option<String> {
    tokens
        .iter()
        .position(|t| t == marker)
        .and_then(|i| tokens.get(i + 1))
        .cloned()
}

/// Records open with `client`; key-range dumps may mention it mid-token.
fn is_replication_record(token: &str) -> bool {
    token.trim_start().starts_with(REPLICATION_CLIENT_MARKER)
}

/// Decode a record such as `client 10.0.0.2:50123\n type : sync\n status : SYNC`.
///
/// Field 0 is the client id, field 2 carries the sync mode after a `:`.
fn parse_replication_record(token: &str) -> Option<(String, u8)> {
    let normalized = token
        .replace("\r\n", "\n")
        .replace('\n', ",")
        .replace(REPLICATION_CLIENT_MARKER, "")
        .replace(' ', "");
    let fields: Vec<&str> = normalized.split(',').collect();

    let client = fields.first()?.trim_start_matches(':');
    if client.is_empty() {
        return None;
    }
    let mode = fields.get(2)?.split(':').nth(1)?;

    let sync = u8::from(mode == REPLICATION_SYNC);
    Some((client.to_string(), sync))
}

#[derive(Debug, thiserror::Error, PartialEq)]
enum CommandTableError {
    #[error("command {0:?} has no stats token")]
    MissingStats(String),
    #[error("expected a command key, found {0:?}")]
    NotACommand(String),
    #[error("malformed stats for {command}: {stats:?}")]
    MalformedStats { command: String, stats: String },
}

/// Consume (name, stats) token pairs up to the end of the response.
fn parse_command_table(
    table: &[String],
) -> Result<BTreeMap<String, CommandStats>, CommandTableError> {
    let mut commands = BTreeMap::new();

    for pair in table.chunks(2) {
        let [name, stats] = pair else {
            return Err(CommandTableError::MissingStats(pair[0].clone()));
        };
        if !name.starts_with(COMMAND_KEY_PREFIX) {
            return Err(CommandTableError::NotACommand(name.clone()));
        }
        let parsed =
            parse_command_stats(stats).ok_or_else(|| CommandTableError::MalformedStats {
                command: name.clone(),
                stats: stats.clone(),
            })?;
        commands.insert(name.clone(), parsed);
    }

    Ok(commands)
}

/// `calls: N\twait_time: N\tproc_time: N`, always in that order.
fn parse_command_stats(stats: &str) -> Option<CommandStats> {
    let mut values = stats
        .split('\t')
        .map(|field| field.split_whitespace().nth(1));

    let calls = values.next()??;
    let wait_time = values.next()??;
    let proc_time = values.next()??;

    Some(CommandStats {
        calls: calls.to_string(),
        wait_time: wait_time.to_string(),
        proc_time: proc_time.to_string(),
    })
}
