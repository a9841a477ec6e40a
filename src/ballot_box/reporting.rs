// Admin views over the ballots and the tabulation.

use chrono::SecondsFormat;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::fmt::Write;
use std::fs;
use text_diff::print_diff;

use seat_tally::{run_tabulation, Ballot, ElectionResult};

use crate::ballot_box::{config_reader::Settings, service::Snapshot, store::StoredBallot, *};

pub const METHOD: &str = "elect-top-eliminate-bottom";

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    pub total_ballots: usize,
    pub seats: u32,
    pub ranks_required: usize,
    pub votes: Vec<Vec<String>>,
    /// The same ballots with the time they were accepted.
    pub records: Vec<StoredBallot>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct CountedRound {
    pub round: u32,
    pub elected: Vec<String>,
    pub eliminated: Vec<String>,
    /// Active candidates only, in candidate order.
    pub tallies: JSMap<String, JSValue>,
    pub exhausted: u64,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountedReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contest: Option<String>,
    pub method: String,
    pub seats: u32,
    /// Always empty: this method has no quota.
    pub quota: Option<u64>,
    pub total_ballots: usize,
    pub winners: Vec<String>,
    pub rounds: Vec<CountedRound>,
}

pub fn raw_report(snapshot: &Snapshot, settings: &Settings) -> RawReport {
    RawReport {
        total_ballots: snapshot.ballots.len(),
        seats: settings.seats,
        ranks_required: settings.ranks_required,
        votes: snapshot.ballots.iter().map(|b| b.ballot.clone()).collect(),
        records: snapshot.ballots.clone(),
    }
}

/// The ballots, one per line, numbered from 1.
pub fn render_raw_text(report: &RawReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total ballots: {}", report.total_ballots);
    let _ = writeln!(
        out,
        "Seats: {} | Ranks required: {}",
        report.seats, report.ranks_required
    );
    for (idx, record) in report.records.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>5}  {}  ({})",
            idx + 1,
            record.ballot.join(", "),
            record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
    }
    out
}

pub fn tabulate(snapshot: &Snapshot, settings: &Settings) -> ElectionResult {
    let ballots: Vec<Ballot> = snapshot
        .ballots
        .iter()
        .map(|b| Ballot::new(&b.ballot))
        .collect();
    run_tabulation(&snapshot.candidates, &ballots, settings.seats)
}

pub fn counted_report(snapshot: &Snapshot, settings: &Settings) -> CountedReport {
    let result = tabulate(snapshot, settings);
    info!(
        "counted_report: {} ballots, {} rounds, winners {:?}",
        snapshot.ballots.len(),
        result.round_stats.len(),
        result.winners
    );
    CountedReport {
        contest: settings.contest_name.clone(),
        method: METHOD.to_string(),
        seats: result.seats,
        quota: None,
        total_ballots: snapshot.ballots.len(),
        winners: result.winners.clone(),
        rounds: result_rounds(&result),
    }
}

fn result_rounds(result: &ElectionResult) -> Vec<CountedRound> {
    result
        .round_stats
        .iter()
        .map(|rs| {
            let mut tallies: JSMap<String, JSValue> = JSMap::new();
            for (name, count) in rs.tally.iter() {
                tallies.insert(name.clone(), JSValue::from(*count));
            }
            CountedRound {
                round: rs.round,
                elected: vec![rs.elected.clone()],
                eliminated: vec![rs.eliminated.clone()],
                tallies,
                exhausted: rs.exhausted,
            }
        })
        .collect()
}

pub fn read_summary(path: &str) -> BoxResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_summary: {} bytes", contents.len());
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

/// Compares a report with a reference file, printing the differences if any.
pub fn check_against_reference(report: &JSValue, reference_path: &str) -> BoxResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    let pretty_report = serde_json::to_string_pretty(report).context(SerializingJsonSnafu {})?;
    if pretty_ref != pretty_report {
        warn!("Found differences with the reference {}", reference_path);
        print_diff(pretty_ref.as_str(), pretty_report.as_str(), "\n");
        whatever!("Difference detected between the counted results and the reference");
    }
    info!("Results match the reference {}", reference_path);
    Ok(())
}
