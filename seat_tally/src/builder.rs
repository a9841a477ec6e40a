pub use crate::config::*;
use crate::{run_tabulation, validator::validate_ballot};

/// A builder for assembling an election ballot by ballot.
///
/// Every ballot is validated against the registered candidates and the rules
/// when it is added.
///
/// ```
/// pub use seat_tally::builder::Builder;
/// pub use seat_tally::TallyRules;
/// # use seat_tally::TallyErrors;
///
/// let rules = TallyRules { seats: 1, ranks_required: 2 };
/// let mut builder = Builder::new(&rules)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ballot(&["Anna".to_string(), "Bob".to_string()])?;
/// assert!(builder.add_ballot(&["Anna".to_string(), "Anna".to_string()]).is_err());
///
/// let result = builder.tabulate();
/// assert_eq!(result.winners, vec!["Anna".to_string()]);
///
/// # Ok::<(), TallyErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: TallyRules,
    pub(crate) _candidates: Vec<String>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &TallyRules) -> Result<Builder, TallyErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
            _ballots: Vec::new(),
        })
    }

    /// Registers the candidates, in canonical order. Ballots added before are dropped.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, TallyErrors> {
        if cands.is_empty() {
            return Err(TallyErrors::EmptyElection);
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: cands.to_vec(),
            _ballots: Vec::new(),
        })
    }

    /// Adds a ballot after checking it.
    ///
    /// choices: the candidates ranked by the voter, most preferred first.
    pub fn add_ballot(&mut self, choices: &[String]) -> Result<(), TallyErrors> {
        if self._candidates.is_empty() {
            return Err(TallyErrors::EmptyElection);
        }
        validate_ballot(choices, &self._candidates, self._rules.ranks_required)?;
        self._ballots.push(Ballot::new(choices));
        Ok(())
    }

    pub fn num_ballots(&self) -> usize {
        self._ballots.len()
    }

    pub fn tabulate(&self) -> ElectionResult {
        run_tabulation(&self._candidates, &self._ballots, self._rules.seats)
    }
}
