use log::debug;
use serde::Serialize;
use snafu::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

use crate::ballot_box::{store::TokenEntry, *};

pub const MAX_TOKENS_PER_REQUEST: i64 = 10_000;

/// A random token, as the text of a version 4 UUID.
pub fn fresh_token() -> String {
    Uuid::new_v4().to_string()
}

/// Creates `count` unused tokens that differ from the existing ones and from each other.
pub fn generate_tokens(existing: &[TokenEntry], count: i64) -> BoxResult<Vec<TokenEntry>> {
    ensure!(
        (1..=MAX_TOKENS_PER_REQUEST).contains(&count),
        InvalidTokenCountSnafu {
            count,
            max: MAX_TOKENS_PER_REQUEST
        }
    );
    let mut seen: HashSet<String> = existing.iter().map(|t| t.token.clone()).collect();
    let mut res: Vec<TokenEntry> = Vec::with_capacity(count as usize);
    while res.len() < count as usize {
        let token = fresh_token();
        if seen.insert(token.clone()) {
            res.push(TokenEntry::unused(token));
        } else {
            debug!("generate_tokens: collision, drawing again");
        }
    }
    Ok(res)
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct TokenSummary {
    pub total: usize,
    pub used: usize,
    pub unused: usize,
}

pub fn summarize(tokens: &[TokenEntry]) -> TokenSummary {
    let used = tokens.iter().filter(|t| t.used).count();
    TokenSummary {
        total: tokens.len(),
        used,
        unused: tokens.len() - used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_look_like_uuids() {
        let t = fresh_token();
        assert_eq!(t.len(), 36);
        let parts: Vec<&str> = t.split('-').collect();
        assert_eq!(
            parts.iter().map(|p| p.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
        assert!(parts[2].starts_with('4'));
        assert!(t.chars().all(|c| c == '-' || c.is_ascii_hexdigit()));
        assert_eq!(Uuid::parse_str(&t).map(|u| u.get_version_num()).ok(), Some(4));
    }

    #[test]
    fn generated_tokens_are_new_and_unused() {
        let existing = generate_tokens(&[], 5).unwrap();
        let more = generate_tokens(&existing, 50).unwrap();
        assert_eq!(more.len(), 50);
        let all: HashSet<&String> = existing.iter().chain(more.iter()).map(|t| &t.token).collect();
        assert_eq!(all.len(), 55);
        assert!(more.iter().all(|t| !t.used));
    }

    #[test]
    fn count_must_be_in_range() {
        for count in [0, -3, MAX_TOKENS_PER_REQUEST + 1] {
            let res = generate_tokens(&[], count);
            assert!(matches!(res, Err(BoxError::InvalidTokenCount { .. })));
        }
    }

    #[test]
    fn summary_counts_used_tokens() {
        let mut tokens = generate_tokens(&[], 3).unwrap();
        tokens[1].used = true;
        assert_eq!(
            summarize(&tokens),
            TokenSummary {
                total: 3,
                used: 1,
                unused: 2
            }
        );
    }
}
