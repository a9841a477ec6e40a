use log::debug;
use std::collections::HashSet;

use crate::config::InvalidBallot;

/// Checks the shape of a ballot before it is accepted.
///
/// The checks run in order and the first failure is returned:
/// * the ballot ranks exactly `ranks_required` entries
/// * every entry is a registered candidate
/// * no entry is repeated
pub fn validate_ballot(
    choices: &[String],
    candidates: &[String],
    ranks_required: usize,
) -> Result<(), InvalidBallot> {
    if choices.len() != ranks_required {
        return Err(InvalidBallot::WrongLength {
            expected: ranks_required,
            found: choices.len(),
        });
    }

    let known: HashSet<&str> = candidates.iter().map(|c| c.as_str()).collect();
    if let Some(unknown) = choices.iter().find(|c| !known.contains(c.as_str())) {
        debug!("validate_ballot: unknown candidate {:?}", unknown);
        return Err(InvalidBallot::UnknownCandidate(unknown.clone()));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for c in choices.iter() {
        if !seen.insert(c.as_str()) {
            debug!("validate_ballot: duplicate candidate {:?}", c);
            return Err(InvalidBallot::DuplicateCandidate(c.clone()));
        }
    }
    Ok(())
}
