// Primitives for keeping the election in JSON files.

use log::{debug, error, info, warn};
use serde::{de::DeserializeOwned, Serialize};
use snafu::prelude::*;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use crate::ballot_box::{
    store::{redeemable_index, ElectionStore, StoredBallot, TokenEntry},
    *,
};

pub const CANDIDATES_FILE: &str = "candidates.json";
pub const VOTES_FILE: &str = "votes.json";
pub const TOKENS_FILE: &str = "tokens.json";

/// An election kept as three JSON files in one directory.
///
/// The files are loaded when the store is opened. Every change is written to disk
/// before it is visible through the store.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    candidates: Vec<String>,
    ballots: Vec<StoredBallot>,
    tokens: Vec<TokenEntry>,
}

impl JsonFileStore {
    /// Opens an existing election. The candidate file must exist, missing ballot
    /// and token files are read as empty.
    pub fn open(dir: &Path) -> BoxResult<JsonFileStore> {
        let candidates_path = dir.join(CANDIDATES_FILE);
        ensure!(
            candidates_path.exists(),
            MissingCandidatesSnafu {
                path: candidates_path.display().to_string()
            }
        );
        let candidates: Vec<String> = read_json(&candidates_path)?;
        let ballots: Vec<StoredBallot> = read_json_or_default(&dir.join(VOTES_FILE))?;
        let tokens: Vec<TokenEntry> = read_json_or_default(&dir.join(TOKENS_FILE))?;
        info!(
            "Opened election in {:?}: {} candidates, {} ballots, {} tokens",
            dir,
            candidates.len(),
            ballots.len(),
            tokens.len()
        );
        Ok(JsonFileStore {
            dir: dir.to_path_buf(),
            candidates,
            ballots,
            tokens,
        })
    }

    /// Creates a new election with the given candidates.
    ///
    /// Refuses to run over a directory that already holds ballots. Existing tokens
    /// are kept.
    pub fn initialize(dir: &Path, candidates: &[String]) -> BoxResult<JsonFileStore> {
        let ballots: Vec<StoredBallot> = read_json_or_default(&dir.join(VOTES_FILE))?;
        ensure!(
            ballots.is_empty(),
            ExistingElectionSnafu {
                path: dir.display().to_string()
            }
        );
        let tokens: Vec<TokenEntry> = read_json_or_default(&dir.join(TOKENS_FILE))?;
        fs::create_dir_all(dir).context(WritingJsonSnafu {
            path: dir.display().to_string(),
        })?;
        write_json(&dir.join(CANDIDATES_FILE), &candidates)?;
        write_json(&dir.join(VOTES_FILE), &ballots)?;
        write_json(&dir.join(TOKENS_FILE), &tokens)?;
        info!(
            "Initialized election in {:?} with {} candidates",
            dir,
            candidates.len()
        );
        Ok(JsonFileStore {
            dir: dir.to_path_buf(),
            candidates: candidates.to_vec(),
            ballots,
            tokens,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ElectionStore for JsonFileStore {
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
        let previous = self.tokens.len();
        self.tokens.extend(tokens);
        if let Err(e) = write_json(&self.dir.join(TOKENS_FILE), &self.tokens) {
            self.tokens.truncate(previous);
            return Err(e);
        }
        Ok(())
    }

    fn redeem(&mut self, token: &str, ballot: StoredBallot) -> BoxResult<()> {
        let idx = redeemable_index(&self.tokens, token)?;
        let votes_path = self.dir.join(VOTES_FILE);

        self.ballots.push(ballot);
        if let Err(e) = write_json(&votes_path, &self.ballots) {
            self.ballots.pop();
            return Err(e);
        }

        self.tokens[idx].used = true;
        if let Err(e) = write_json(&self.dir.join(TOKENS_FILE), &self.tokens) {
            warn!("redeem: could not record the token, withdrawing the ballot");
            self.tokens[idx].used = false;
            self.ballots.pop();
            if let Err(restore) = write_json(&votes_path, &self.ballots) {
                error!(
                    "redeem: could not withdraw the ballot from {:?}: {}",
                    votes_path, restore
                );
            }
            return Err(e);
        }
        debug!("redeem: {} ballots recorded", self.ballots.len());
        Ok(())
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> BoxResult<T> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p.clone() })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: p })
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> BoxResult<T> {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {
            path: path.display().to_string(),
        }),
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            debug!("read_json_or_default: {:?} not found, starting empty", path);
            Ok(T::default())
        }
        Err(e) => Err(e).context(OpeningJsonSnafu {
            path: path.display().to_string(),
        }),
    }
}

/// Writes the file in full through a temporary file, so that readers never see a
/// partial file.
fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> BoxResult<()> {
    let p = path.display().to_string();
    let js = serde_json::to_string_pretty(data).context(SerializingJsonSnafu {})?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, js).context(WritingJsonSnafu { path: p.clone() })?;
    fs::rename(&tmp, path).context(WritingJsonSnafu { path: p })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn open_requires_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let res = JsonFileStore::open(dir.path());
        assert!(matches!(res, Err(BoxError::MissingCandidates { .. })));
        assert_eq!(res.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn state_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::initialize(dir.path(), &names(&["A", "B", "C"])).unwrap();
        store
            .add_tokens(vec![
                TokenEntry::unused("t1".to_string()),
                TokenEntry::unused("t2".to_string()),
            ])
            .unwrap();
        store
            .redeem("t2", StoredBallot::new(&names(&["C", "A", "B"]), Utc::now()))
            .unwrap();

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.candidates(), &names(&["A", "B", "C"])[..]);
        assert_eq!(reopened.ballots().len(), 1);
        assert_eq!(reopened.ballots()[0].ballot, names(&["C", "A", "B"]));
        assert!(!reopened.find_token("t1").unwrap().used);
        assert!(reopened.find_token("t2").unwrap().used);
    }

    #[test]
    fn reads_reference_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CANDIDATES_FILE), r#"["A", "B"]"#).unwrap();
        fs::write(
            dir.path().join(VOTES_FILE),
            r#"[{"ballot": ["B", "A"], "timestamp": 1700000000000}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(TOKENS_FILE),
            r#"[{"token": "abc", "used": true}, {"token": "def", "used": false}]"#,
        )
        .unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(store.ballots()[0].ballot, names(&["B", "A"]));
        assert_eq!(store.tokens().len(), 2);
        assert!(store.find_token("abc").unwrap().used);
    }

    #[test]
    fn initialize_refuses_to_erase_ballots() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::initialize(dir.path(), &names(&["A", "B"])).unwrap();
        store
            .add_tokens(vec![TokenEntry::unused("t1".to_string())])
            .unwrap();
        store
            .redeem("t1", StoredBallot::new(&names(&["A", "B"]), Utc::now()))
            .unwrap();
        let again = JsonFileStore::initialize(dir.path(), &names(&["X", "Y"]));
        assert!(matches!(again, Err(BoxError::ExistingElection { .. })));
        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.candidates(), &names(&["A", "B"])[..]);
    }

    #[test]
    fn failed_redeem_leaves_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::initialize(dir.path(), &names(&["A", "B"])).unwrap();
        store
            .add_tokens(vec![TokenEntry::unused("t1".to_string())])
            .unwrap();
        let res = store.redeem("nope", StoredBallot::new(&names(&["A", "B"]), Utc::now()));
        assert!(matches!(res, Err(BoxError::UnknownToken {})));
        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert!(reopened.ballots().is_empty());
        assert!(!reopened.find_token("t1").unwrap().used);
    }

    #[test]
    fn token_write_failure_withdraws_the_ballot() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::initialize(dir.path(), &names(&["A", "B"])).unwrap();
        store
            .add_tokens(vec![TokenEntry::unused("t1".to_string())])
            .unwrap();
        // A non-empty directory in place of the token file makes the rename fail.
        let tokens_path = dir.path().join(TOKENS_FILE);
        fs::remove_file(&tokens_path).unwrap();
        fs::create_dir(&tokens_path).unwrap();
        fs::write(tokens_path.join("keep"), "x").unwrap();

        let res = store.redeem("t1", StoredBallot::new(&names(&["B", "A"]), Utc::now()));
        assert!(matches!(res, Err(BoxError::WritingJson { .. })));
        assert!(store.ballots().is_empty());
        assert!(!store.find_token("t1").unwrap().used);
        let on_disk: Vec<StoredBallot> = read_json(&dir.path().join(VOTES_FILE)).unwrap();
        assert!(on_disk.is_empty());
    }
}
