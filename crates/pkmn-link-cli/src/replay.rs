//! Feeds a captured byte stream through a session.
//!
//! Scripts are whitespace separated hex bytes (`FD`, `0xfd`); `#` starts a
//! comment that runs to the end of the line.

use std::path::Path;

use log::debug;
use pkmn_link_core::platform::PendingTasks;
use pkmn_link_core::session::Session;
use pkmn_link_core::status::LinkStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read replay script: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {token:?} is not a hex byte")]
    InvalidByte { line: usize, token: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayStep {
    pub inbound: u8,
    pub reply: u8,
    pub status: LinkStatus,
}

pub fn parse_script(text: &str) -> Result<Vec<u8>, ReplayError> {
    let mut bytes = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let code = line.split('#').next().unwrap_or_default();
        for token in code.split_whitespace() {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            let byte = u8::from_str_radix(digits, 16).map_err(|_| ReplayError::InvalidByte {
                line: index + 1,
                token: token.to_string(),
            })?;
            bytes.push(byte);
        }
    }
    Ok(bytes)
}

pub fn load_script(path: &Path) -> Result<Vec<u8>, ReplayError> {
    let text = std::fs::read_to_string(path)?;
    parse_script(&text)
}

/// Answers every byte in order, running deferred work between bytes the way
/// a live host would.
pub fn run(session: &mut Session, pending: &PendingTasks, bytes: &[u8]) -> Vec<ReplayStep> {
    let mut steps = Vec::with_capacity(bytes.len());
    for &inbound in bytes {
        let reply = session.exchange(inbound);
        for task in pending.take_all() {
            debug!("Replay: running deferred {task:?}");
            session.run_deferred(task);
        }
        steps.push(ReplayStep {
            inbound,
            reply,
            status: session.status(),
        });
    }
    steps
}
