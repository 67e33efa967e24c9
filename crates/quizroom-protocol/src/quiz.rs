//! The quiz aggregate and the two ways a question is shown to members.
//!
//! A [`Quiz`] is a read-only snapshot handed over by the quiz lookup
//! collaborator. The owner of a room sees questions with their correctness
//! flags; everyone else gets a [`RedactedQuestion`] until the round ends.

use serde::{Deserialize, Serialize};

use crate::{InviteCode, UserId};

/// A full quiz: topic, timing, scoring, and ordered questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    /// Persistent id of the quiz (the "game id" in session records).
    pub id: u64,
    pub invite_code: InviteCode,
    pub topic: String,
    /// Seconds each round's countdown runs for.
    pub round_time: u32,
    /// Points awarded for a correct answer in any round.
    pub points: f64,
    /// The only user allowed to open a room for this quiz.
    pub owner: UserId,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Number of questions, i.e. rounds.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// One question with its options, correctness included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub name: String,
    pub options: Vec<QuizOption>,
}

impl Question {
    /// Whether option `index` is marked correct. Out-of-range is `false`.
    pub fn is_correct(&self, index: usize) -> bool {
        self.options.get(index).is_some_and(|option| option.correct)
    }

    /// The question as non-owners see it during a round.
    pub fn redacted(&self) -> RedactedQuestion {
        RedactedQuestion {
            name: self.name.clone(),
            options: self
                .options
                .iter()
                .map(|option| RedactedOption {
                    name: option.name.clone(),
                })
                .collect(),
        }
    }
}

/// An answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub name: String,
    pub correct: bool,
}

/// A question stripped of correctness flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactedQuestion {
    pub name: String,
    pub options: Vec<RedactedOption>,
}

/// An option name without its correctness flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactedOption {
    pub name: String,
}

/// The current question as shown to one recipient.
///
/// Picked per recipient at broadcast time: [`QuestionView::Full`] for the
/// room owner, [`QuestionView::Redacted`] for everyone else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionView {
    Full(Question),
    Redacted(RedactedQuestion),
}

impl QuestionView {
    /// Builds the view for a recipient.
    pub fn for_recipient(question: &Question, is_owner: bool) -> Self {
        if is_owner {
            Self::Full(question.clone())
        } else {
            Self::Redacted(question.redacted())
        }
    }
}
