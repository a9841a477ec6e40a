// The storage interface of the ballot box, and an in-memory implementation.

use crate::ballot_box::*;

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ballot as recorded, with the time it was accepted.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StoredBallot {
    pub ballot: Vec<String>,
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl StoredBallot {
    pub fn new(ballot: &[String], timestamp: DateTime<Utc>) -> StoredBallot {
        StoredBallot {
            ballot: ballot.to_vec(),
            timestamp,
        }
    }
}

/// A single-use voting token.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub used: bool,
}

impl TokenEntry {
    pub fn unused(token: String) -> TokenEntry {
        TokenEntry { token, used: false }
    }
}

/// Durable state of an election: the candidate list, the ballots and the tokens.
///
/// Ballots are only ever appended. A token goes from unused to used exactly once,
/// together with the ballot it was redeemed for.
///
/// Implementations are not synchronized. The ballot box serializes access to them.
pub trait ElectionStore: Send {
    /// The candidates, in canonical order.
    fn candidates(&self) -> &[String];

    /// The ballots, in the order they were accepted.
    fn ballots(&self) -> &[StoredBallot];

    fn tokens(&self) -> &[TokenEntry];

    fn find_token(&self, token: &str) -> Option<&TokenEntry> {
        self.tokens().iter().find(|t| t.token == token)
    }

    /// Registers new unused tokens.
    fn add_tokens(&mut self, tokens: Vec<TokenEntry>) -> BoxResult<()>;

    /// Records the ballot and marks the token as used.
    ///
    /// Either both changes are recorded, or neither of them is.
    fn redeem(&mut self, token: &str, ballot: StoredBallot) -> BoxResult<()>;
}

/// The position of a token that can still be redeemed.
pub(crate) fn redeemable_index(tokens: &[TokenEntry], token: &str) -> BoxResult<usize> {
    let idx = tokens
        .iter()
        .position(|t| t.token == token)
        .context(UnknownTokenSnafu {})?;
    ensure!(!tokens[idx].used, TokenConsumedSnafu {});
    Ok(idx)
}

/// A store held in memory, used as the injected store in tests.
#[cfg(test)]
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MemoryStore {
    candidates: Vec<String>,
    ballots: Vec<StoredBallot>,
    tokens: Vec<TokenEntry>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new(candidates: &[String]) -> MemoryStore {
        MemoryStore {
            candidates: candidates.to_vec(),
            ballots: Vec::new(),
            tokens: Vec::new(),
        }
    }
}

#[cfg(test)]
impl ElectionStore for MemoryStore {
    fn candidates(&self) -> &[String] {
        &self.candidates
    }

    fn ballots(&self) -> &[StoredBallot] {
        &self.ballots
    }

    fn tokens(&self) -> &[TokenEntry] {
        &self.tokens
    }

    fn add_tokens(&mut self, tokens: Vec<TokenEntry>) -> BoxResult<()> {
        self.tokens.extend(tokens);
        Ok(())
    }

    fn redeem(&mut self, token: &str, ballot: StoredBallot) -> BoxResult<()> {
        let idx = redeemable_index(&self.tokens, token)?;
        self.ballots.push(ballot);
        self.tokens[idx].used = true;
        Ok(())
    }
}
