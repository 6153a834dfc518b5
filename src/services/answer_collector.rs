use crate::error::{Error, Result};
use crate::models::answer::{Answer, UNANSWERED};
use crate::models::question::{OptionLetter, Question, QuestionType};
use std::collections::BTreeSet;

/// Answers for one attempt, one slot per question position. Sized when the
/// attempt starts; unanswered slots hold [`Answer::Unanswered`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCollector {
    types: Vec<QuestionType>,
    answers: Vec<Answer>,
}

impl AnswerCollector {
    pub fn new(types: Vec<QuestionType>) -> Self {
        let answers = vec![Answer::Unanswered; types.len()];
        Self { types, answers }
    }

    pub fn for_questions(questions: &[Question]) -> Self {
        Self::new(questions.iter().map(Question::question_type).collect())
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Single-select questions take the letter as their answer; multi-select
    /// questions toggle it in or out of the chosen set.
    pub fn select(&mut self, index: usize, letter: OptionLetter) -> Result<()> {
        let question_type = *self.types.get(index).ok_or_else(|| {
            Error::InvalidAnswer(format!("No question at position {}", index + 1))
        })?;
        if !question_type.accepts(letter) {
            return Err(Error::InvalidAnswer(format!(
                "Option {} is not available for a {} question",
                letter, question_type
            )));
        }

        let slot = &mut self.answers[index];
        if question_type.is_multi_select() {
            let mut letters = match std::mem::take(slot) {
                Answer::Multiple(letters) => letters,
                _ => BTreeSet::new(),
            };
            if !letters.remove(&letter) {
                letters.insert(letter);
            }
            *slot = if letters.is_empty() {
                Answer::Unanswered
            } else {
                Answer::Multiple(letters)
            };
        } else {
            *slot = Answer::Single(letter);
        }
        Ok(())
    }

    pub fn answer(&self, index: usize) -> Option<&Answer> {
        self.answers.get(index)
    }

    pub fn is_complete(&self, index: usize) -> bool {
        self.answers.get(index).is_some_and(Answer::is_complete)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_complete()).count()
    }

    /// Dense transport form: exactly `question_count` slots, `""` for any
    /// position without an answer.
    pub fn encode(&self, question_count: usize) -> Vec<String> {
        (0..question_count)
            .map(|index| {
                self.answers
                    .get(index)
                    .map(Answer::encode)
                    .unwrap_or_else(|| UNANSWERED.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> AnswerCollector {
        AnswerCollector::new(vec![
            QuestionType::SingleCorrect,
            QuestionType::MultipleCorrect,
            QuestionType::TrueFalse,
        ])
    }

    #[test]
    fn single_select_overwrites_and_is_idempotent() {
        let mut answers = collector();
        answers.select(0, OptionLetter::A).unwrap();
        answers.select(0, OptionLetter::C).unwrap();
        let once = answers.clone();
        answers.select(0, OptionLetter::C).unwrap();
        assert_eq!(answers, once);
        assert_eq!(answers.answer(0), Some(&Answer::Single(OptionLetter::C)));
    }

    #[test]
    fn multi_select_toggle_is_an_involution() {
        let mut answers = collector();
        answers.select(1, OptionLetter::A).unwrap();
        let before = answers.clone();
        answers.select(1, OptionLetter::D).unwrap();
        answers.select(1, OptionLetter::D).unwrap();
        assert_eq!(answers, before);

        answers.select(1, OptionLetter::A).unwrap();
        assert!(!answers.is_complete(1));
    }

    #[test]
    fn rejects_letters_outside_the_question_slots() {
        let mut answers = collector();
        assert!(matches!(
            answers.select(2, OptionLetter::C),
            Err(Error::InvalidAnswer(_))
        ));
        assert!(matches!(
            answers.select(3, OptionLetter::A),
            Err(Error::InvalidAnswer(_))
        ));
        assert_eq!(answers.answered_count(), 0);
    }

    #[test]
    fn encode_fills_gaps_with_sentinel() {
        let mut answers = collector();
        answers.select(1, OptionLetter::E).unwrap();
        answers.select(1, OptionLetter::B).unwrap();
        answers.select(2, OptionLetter::A).unwrap();

        let encoded = answers.encode(3);
        assert_eq!(encoded, vec!["", "BE", "A"]);
        assert_eq!(answers.encode(5).len(), 5);
    }
}
