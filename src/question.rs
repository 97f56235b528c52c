//! Question source.
//!
//! Every claim attempt is gated on a multiple-choice question picked by the
//! cell's letter. Question content lives outside this crate behind
//! [`QuestionSource`]; the engine only needs the player's answer turned into
//! a yes/no for [`GameRegistry::claim`](crate::state::GameRegistry::claim).
//!
//! A source failure never blocks play. [`ask`] logs it and falls back to a
//! question generated locally for the same letter.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Number of options on a fallback question.
pub const FALLBACK_OPTIONS: usize = 4;

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub letter: char,
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct: usize,
}

impl Question {
    /// Whether `choice` is the correct option.
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct
    }

    /// A question with an out-of-range answer index is unusable.
    pub fn is_well_formed(&self) -> bool {
        !self.options.is_empty() && self.correct < self.options.len()
    }
}

/// Failures reported by a question source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionSourceError {
    #[error("question source unavailable: {0}")]
    Unavailable(String),

    #[error("no question for letter '{0}'")]
    NoQuestion(char),

    #[error("malformed question for letter '{0}'")]
    Malformed(char),
}

/// External provider of questions keyed by letter.
pub trait QuestionSource {
    fn question_for(&self, letter: char) -> Result<Question, QuestionSourceError>;
}

impl<F> QuestionSource for F
where
    F: Fn(char) -> Result<Question, QuestionSourceError>,
{
    fn question_for(&self, letter: char) -> Result<Question, QuestionSourceError> {
        self(letter)
    }
}

/// Locally generated question for `letter`.
///
/// Asks the player to pick the letter out of a short list. The distractors
/// and the answer's slot are derived from the letter, so the same letter
/// always yields the same question.
pub fn fallback_question(letter: char) -> Question {
    let letter = letter.to_ascii_uppercase();
    let base = if letter.is_ascii_uppercase() {
        letter as u8 - b'A'
    } else {
        0
    };

    let correct = usize::from(base) % FALLBACK_OPTIONS;
    let mut distractors = (1..)
        .map(|step: u8| char::from(b'A' + (base + step * 7) % 26))
        .filter(|&c| c != letter);

    let options = (0..FALLBACK_OPTIONS)
        .map(|slot| {
            if slot == correct {
                letter.to_string()
            } else {
                distractors
                    .next()
                    .map(String::from)
                    .unwrap_or_default()
            }
        })
        .collect();

    Question {
        letter,
        prompt: format!("Which of these is the letter {}?", letter),
        options,
        correct,
    }
}

/// Fetch a question, falling back to [`fallback_question`] on any failure.
pub fn ask<S: QuestionSource + ?Sized>(source: &S, letter: char) -> Question {
    match source.question_for(letter) {
        Ok(question) if question.is_well_formed() => {
            debug!(%letter, "Question served by source");
            question
        }
        Ok(_) => {
            let err = QuestionSourceError::Malformed(letter);
            warn!(%letter, error = %err, "QuestionSourceUnavailable, using fallback");
            fallback_question(letter)
        }
        Err(err) => {
            warn!(%letter, error = %err, "QuestionSourceUnavailable, using fallback");
            fallback_question(letter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn trivia(letter: char) -> Result<Question, QuestionSourceError> {
        match letter {
            'Q' => Ok(Question {
                letter,
                prompt: "Which Q is a royal?".to_string(),
                options: vec!["Queen".to_string(), "Quill".to_string()],
                correct: 0,
            }),
            'Z' => Ok(Question {
                letter,
                prompt: "Broken".to_string(),
                options: vec![],
                correct: 3,
            }),
            _ => Err(QuestionSourceError::Unavailable("timeout".to_string())),
        }
    }

    #[test]
    fn test_source_question_used() {
        let question = ask(&trivia, 'Q');
        assert_eq!(question.prompt, "Which Q is a royal?");
        assert!(question.is_correct(0));
        assert!(!question.is_correct(1));
    }

    #[test]
    fn test_fallback_on_error() {
        let question = ask(&trivia, 'M');
        assert_eq!(question, fallback_question('M'));
    }

    #[test]
    fn test_fallback_on_malformed() {
        let question = ask(&trivia, 'Z');
        assert!(question.is_well_formed());
        assert_eq!(question.letter, 'Z');
    }

    #[test]
    fn test_fallback_for_every_letter() {
        for letter in 'A'..='Z' {
            let question = fallback_question(letter);
            assert!(question.is_well_formed());
            assert_eq!(question.options.len(), FALLBACK_OPTIONS);
            assert_eq!(question.options[question.correct], letter.to_string());

            let distinct: HashSet<_> = question.options.iter().collect();
            assert_eq!(distinct.len(), FALLBACK_OPTIONS, "letter {}", letter);
        }
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(fallback_question('k'), fallback_question('K'));
    }
}
