use crate::models::question::OptionLetter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Wire value for a position with no answer recorded.
pub const UNANSWERED: &str = "";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    #[default]
    Unanswered,
    Single(OptionLetter),
    Multiple(BTreeSet<OptionLetter>),
}

impl Answer {
    pub fn is_complete(&self) -> bool {
        match self {
            Answer::Unanswered => false,
            Answer::Single(_) => true,
            Answer::Multiple(letters) => !letters.is_empty(),
        }
    }

    pub fn letters(&self) -> BTreeSet<OptionLetter> {
        match self {
            Answer::Unanswered => BTreeSet::new(),
            Answer::Single(letter) => BTreeSet::from([*letter]),
            Answer::Multiple(letters) => letters.clone(),
        }
    }

    /// Sorted concatenation of the chosen letters, `""` when unanswered.
    pub fn encode(&self) -> String {
        self.letters().iter().map(|l| l.as_char()).collect()
    }

    /// Parses an encoded slot back into its letter set. Unknown characters are
    /// dropped so a tampered slot can only lose correctness, never gain it.
    pub fn decode_letters(encoded: &str) -> BTreeSet<OptionLetter> {
        encoded
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .filter_map(|c| c.to_string().parse::<OptionLetter>().ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_answers_encode_sorted() {
        let answer = Answer::Multiple(BTreeSet::from([OptionLetter::D, OptionLetter::A]));
        assert_eq!(answer.encode(), "AD");
        assert_eq!(Answer::Unanswered.encode(), UNANSWERED);
    }

    #[test]
    fn empty_multiple_is_incomplete() {
        assert!(!Answer::Multiple(BTreeSet::new()).is_complete());
        assert!(Answer::Single(OptionLetter::B).is_complete());
    }

    #[test]
    fn decode_accepts_comma_lists() {
        let letters = Answer::decode_letters("c,a");
        assert_eq!(letters, BTreeSet::from([OptionLetter::A, OptionLetter::C]));
        assert!(Answer::decode_letters("").is_empty());
    }
}
