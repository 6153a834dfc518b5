use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 6] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
        OptionLetter::E,
        OptionLetter::F,
    ];

    pub fn as_char(self) -> char {
        match self {
            OptionLetter::A => 'A',
            OptionLetter::B => 'B',
            OptionLetter::C => 'C',
            OptionLetter::D => 'D',
            OptionLetter::E => 'E',
            OptionLetter::F => 'F',
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for OptionLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(OptionLetter::A),
            "B" => Ok(OptionLetter::B),
            "C" => Ok(OptionLetter::C),
            "D" => Ok(OptionLetter::D),
            "E" => Ok(OptionLetter::E),
            "F" => Ok(OptionLetter::F),
            other => Err(format!("'{}' is not an option letter", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    SingleCorrect,
    MultipleCorrect,
    TrueFalse,
}

const TRUE_FALSE_SLOTS: [OptionLetter; 2] = [OptionLetter::A, OptionLetter::B];
const REQUIRED_CHOICE_SLOTS: [OptionLetter; 4] =
    [OptionLetter::A, OptionLetter::B, OptionLetter::C, OptionLetter::D];

impl QuestionType {
    /// Letters a question of this type may carry, in display order.
    pub fn option_slots(self) -> &'static [OptionLetter] {
        match self {
            QuestionType::TrueFalse => &TRUE_FALSE_SLOTS,
            QuestionType::SingleCorrect | QuestionType::MultipleCorrect => &OptionLetter::ALL,
        }
    }

    /// Letters that must be populated; E and F are optional extras.
    pub fn required_slots(self) -> &'static [OptionLetter] {
        match self {
            QuestionType::TrueFalse => &TRUE_FALSE_SLOTS,
            QuestionType::SingleCorrect | QuestionType::MultipleCorrect => &REQUIRED_CHOICE_SLOTS,
        }
    }

    pub fn is_multi_select(self) -> bool {
        matches!(self, QuestionType::MultipleCorrect)
    }

    pub fn accepts(self, letter: OptionLetter) -> bool {
        self.option_slots().contains(&letter)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionType::SingleCorrect => "SINGLE_CORRECT",
            QuestionType::MultipleCorrect => "MULTIPLE_CORRECT",
            QuestionType::TrueFalse => "TRUE_FALSE",
        };
        f.write_str(name)
    }
}

/// Option text per slot. Blank text counts as an empty slot. Serialized as
/// a map keyed by letter, e.g. `{"A": "True", "B": "False"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<OptionLetter, String>",
    into = "BTreeMap<OptionLetter, String>"
)]
pub struct OptionSet {
    slots: [Option<String>; 6],
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, letter: OptionLetter, text: impl Into<String>) -> Self {
        self.set(letter, text);
        self
    }

    pub fn set(&mut self, letter: OptionLetter, text: impl Into<String>) {
        self.slots[letter.index()] = Some(text.into());
    }

    pub fn get(&self, letter: OptionLetter) -> Option<&str> {
        self.slots[letter.index()]
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    pub fn is_populated(&self, letter: OptionLetter) -> bool {
        self.get(letter).is_some()
    }

    /// Populated letters among the slots valid for `question_type`.
    pub fn populated(&self, question_type: QuestionType) -> Vec<OptionLetter> {
        question_type
            .option_slots()
            .iter()
            .copied()
            .filter(|letter| self.is_populated(*letter))
            .collect()
    }
}

impl From<BTreeMap<OptionLetter, String>> for OptionSet {
    fn from(map: BTreeMap<OptionLetter, String>) -> Self {
        map.into_iter()
            .fold(OptionSet::new(), |set, (letter, text)| set.with(letter, text))
    }
}

impl From<OptionSet> for BTreeMap<OptionLetter, String> {
    fn from(set: OptionSet) -> Self {
        OptionLetter::ALL
            .iter()
            .zip(set.slots)
            .filter_map(|(letter, text)| text.map(|t| (*letter, t)))
            .collect()
    }
}

/// Shape-varying part of a question, keyed by its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "questionType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    #[serde(rename_all = "camelCase")]
    SingleCorrect { correct_answer: OptionLetter },
    #[serde(rename_all = "camelCase")]
    MultipleCorrect { correct_answers: BTreeSet<OptionLetter> },
    #[serde(rename_all = "camelCase")]
    TrueFalse { correct_answer: OptionLetter },
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::SingleCorrect { .. } => QuestionType::SingleCorrect,
            QuestionKind::MultipleCorrect { .. } => QuestionType::MultipleCorrect,
            QuestionKind::TrueFalse { .. } => QuestionType::TrueFalse,
        }
    }

    pub fn correct_letters(&self) -> BTreeSet<OptionLetter> {
        match self {
            QuestionKind::SingleCorrect { correct_answer }
            | QuestionKind::TrueFalse { correct_answer } => BTreeSet::from([*correct_answer]),
            QuestionKind::MultipleCorrect { correct_answers } => correct_answers.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub options: OptionSet,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub explanation: Option<String>,
    pub marks: u32,
    pub order: u32,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    pub fn option_text(&self, letter: OptionLetter) -> Option<&str> {
        if self.question_type().accepts(letter) {
            self.options.get(letter)
        } else {
            None
        }
    }
}
