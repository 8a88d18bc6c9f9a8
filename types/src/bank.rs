//! Provider bank list and search ranking.

use serde::{Deserialize, Serialize};

/// A bank from the provider-banks endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub bank_name: String,
    pub bank_code: String,
}

/// Result cap for bank search dropdowns.
pub const MAX_BANK_RESULTS: usize = 10;

/// Rank banks against a search query, most likely intended bank first.
///
/// Ordering among matches: exact name match, then prefix match, then
/// shorter name, then alphabetical. Matching is case-insensitive on the
/// bank name; non-matching banks are dropped. At most
/// [`MAX_BANK_RESULTS`] banks are returned.
#[must_use]
pub fn rank_banks<'a>(banks: &'a [Bank], query: &str) -> Vec<&'a Bank> {
    let term = query.trim().to_lowercase();

    let mut matches: Vec<(&Bank, String)> = banks
        .iter()
        .map(|b| (b, b.bank_name.to_lowercase()))
        .filter(|(_, name)| term.is_empty() || name.contains(&term))
        .collect();

    matches.sort_by(|(_, a), (_, b)| {
        let a_exact = *a == term;
        let b_exact = *b == term;
        if a_exact != b_exact {
            return b_exact.cmp(&a_exact);
        }

        let a_prefix = a.starts_with(&term);
        let b_prefix = b.starts_with(&term);
        if a_prefix != b_prefix {
            return b_prefix.cmp(&a_prefix);
        }

        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    });

    matches
        .into_iter()
        .take(MAX_BANK_RESULTS)
        .map(|(b, _)| b)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(name: &str, code: &str) -> Bank {
        Bank {
            bank_name: name.to_owned(),
            bank_code: code.to_owned(),
        }
    }

    #[test]
    fn exact_beats_prefix_beats_contains() {
        let banks = vec![
            bank("Magnet Bank", "001"),
            bank("GTBank", "058"),
            bank("GT", "721"),
            bank("Signature GT Trust", "103"),
        ];

        let ranked = rank_banks(&banks, "GT");
        let names: Vec<&str> = ranked.iter().map(|b| b.bank_name.as_str()).collect();
        assert_eq!(names, ["GT", "GTBank", "Signature GT Trust"]);
    }

    #[test]
    fn shorter_name_breaks_prefix_ties() {
        let banks = vec![
            bank("Zenith International", "057"),
            bank("Zenith", "157"),
            bank("Zenith Merchant", "257"),
        ];

        let ranked = rank_banks(&banks, "zen");
        let names: Vec<&str> = ranked.iter().map(|b| b.bank_name.as_str()).collect();
        assert_eq!(names, ["Zenith", "Zenith Merchant", "Zenith International"]);
    }

    #[test]
    fn alphabetical_as_final_tiebreak() {
        let banks = vec![bank("Keystone", "082"), bank("Keystore", "083")];
        let ranked = rank_banks(&banks, "key");
        let names: Vec<&str> = ranked.iter().map(|b| b.bank_name.as_str()).collect();
        assert_eq!(names, ["Keystone", "Keystore"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let banks = vec![bank("GTBank", "058")];
        assert_eq!(rank_banks(&banks, "gtb").len(), 1);
        assert_eq!(rank_banks(&banks, "xyz").len(), 0);
    }

    #[test]
    fn caps_results() {
        let banks: Vec<Bank> = (0..25)
            .map(|i| bank(&format!("Union Bank {i:02}"), &format!("{i:03}")))
            .collect();
        assert_eq!(rank_banks(&banks, "union").len(), MAX_BANK_RESULTS);
    }

    #[test]
    fn empty_query_lists_everything_up_to_cap() {
        let banks = vec![bank("B", "2"), bank("A", "1")];
        let ranked = rank_banks(&banks, "");
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].bank_name, "A");
    }
}
