//! Answer collection and scoring.
//!
//! Pure functions over plain data; the room actor calls them at the end of
//! each round and when the room finishes.

use std::collections::{BTreeMap, HashMap};

use quizroom_protocol::{Leaderboard, Question, UserId};

/// The answers submitted during one round.
#[derive(Debug, Clone, Default)]
pub(crate) struct RoundLedger {
    round: usize,
    answers: HashMap<UserId, usize>,
}

impl RoundLedger {
    pub(crate) fn new(round: usize) -> Self {
        Self {
            round,
            answers: HashMap::new(),
        }
    }

    pub(crate) fn round(&self) -> usize {
        self.round
    }

    /// Records a submission. A later submission overwrites an earlier one.
    pub(crate) fn record(&mut self, user: UserId, option: usize) {
        self.answers.insert(user, option);
    }

    /// The option a user is scored on. Users who never answered resolve
    /// to option 0.
    pub(crate) fn choice(&self, user: UserId) -> usize {
        self.answers.get(&user).copied().unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.answers.len()
    }
}

/// Scores one round for the given members.
///
/// Every member gets a leaderboard entry (0 if they had none) and earns
/// `points` if their choice is marked correct. Returns each member's
/// correctness.
pub(crate) fn score_round(
    question: &Question,
    ledger: &RoundLedger,
    members: impl IntoIterator<Item = UserId>,
    points: f64,
    leaderboard: &mut Leaderboard,
) -> BTreeMap<UserId, bool> {
    members
        .into_iter()
        .map(|user| {
            let correct = question.is_correct(ledger.choice(user));
            let score = leaderboard.entry(user).or_insert(0.0);
            if correct {
                *score += points;
            }
            (user, correct)
        })
        .collect()
}

/// Competition ranking of the given members: 1 + the number of members
/// with strictly more points. Missing entries count as 0.
pub(crate) fn placements(
    leaderboard: &Leaderboard,
    members: impl IntoIterator<Item = UserId>,
) -> BTreeMap<UserId, usize> {
    let scores: Vec<(UserId, f64)> = members
        .into_iter()
        .map(|user| (user, leaderboard.get(&user).copied().unwrap_or(0.0)))
        .collect();

    scores
        .iter()
        .map(|&(user, points)| {
            let ahead = scores.iter().filter(|(_, other)| *other > points).count();
            (user, ahead + 1)
        })
        .collect()
}
