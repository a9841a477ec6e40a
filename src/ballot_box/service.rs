use chrono::Utc;
use log::{debug, info};
use snafu::prelude::*;
use std::sync::{Mutex, MutexGuard};

use seat_tally::validate_ballot;

use crate::ballot_box::{
    config_reader::Settings,
    store::{ElectionStore, StoredBallot, TokenEntry},
    tokens::{self, TokenSummary},
    *,
};

/// A copy of the election contents, taken under the lock.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Snapshot {
    pub candidates: Vec<String>,
    pub ballots: Vec<StoredBallot>,
}

/// The ballot box: accepts ballots against tokens and hands out consistent
/// snapshots for reporting.
///
/// All access to the store goes through one lock. A submission holds it from the
/// token lookup until the ballot and the token are both recorded.
pub struct BallotBox<S: ElectionStore> {
    store: Mutex<S>,
    settings: Settings,
}

impl<S: ElectionStore> BallotBox<S> {
    pub fn new(store: S, settings: Settings) -> BallotBox<S> {
        BallotBox {
            store: Mutex::new(store),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn lock(&self) -> BoxResult<MutexGuard<'_, S>> {
        self.store.lock().ok().context(StoreUnavailableSnafu {})
    }

    /// The candidates, in canonical order.
    pub fn candidates(&self) -> BoxResult<Vec<String>> {
        Ok(self.lock()?.candidates().to_vec())
    }

    /// Accepts a ballot in exchange for a token.
    ///
    /// The checks run in order: the token exists, the token is unused, the ballot
    /// is valid. Nothing is recorded unless all of them pass.
    pub fn submit(&self, ballot: &[String], token: &str) -> BoxResult<()> {
        let mut store = self.lock()?;
        let entry = store.find_token(token).context(UnknownTokenSnafu {})?;
        ensure!(!entry.used, TokenConsumedSnafu {});
        validate_ballot(ballot, store.candidates(), self.settings.ranks_required)
            .context(InvalidBallotSnafu {})?;
        store.redeem(token, StoredBallot::new(ballot, Utc::now()))?;
        info!("submit: ballot accepted, {} ballots", store.ballots().len());
        Ok(())
    }

    pub fn snapshot(&self) -> BoxResult<Snapshot> {
        let store = self.lock()?;
        Ok(Snapshot {
            candidates: store.candidates().to_vec(),
            ballots: store.ballots().to_vec(),
        })
    }

    /// Creates and registers `count` new tokens.
    pub fn generate_tokens(&self, count: i64) -> BoxResult<Vec<TokenEntry>> {
        let mut store = self.lock()?;
        let fresh = tokens::generate_tokens(store.tokens(), count)?;
        store.add_tokens(fresh.clone())?;
        info!(
            "generate_tokens: {} tokens created, {} in total",
            fresh.len(),
            store.tokens().len()
        );
        Ok(fresh)
    }

    pub fn token_summary(&self) -> BoxResult<TokenSummary> {
        let store = self.lock()?;
        let summary = tokens::summarize(store.tokens());
        debug!("token_summary: {:?}", summary);
        Ok(summary)
    }
}
