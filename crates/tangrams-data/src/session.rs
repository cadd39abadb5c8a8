//! Sessions (recorded games) and session collections.

use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::Round;

/// One full game transcript between two participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub rounds: Vec<Arc<Round>>,
}

impl Session {
    /// Creates a session, dropping any leading pre-game rounds (round number below 1) and
    /// any trailing rounds without utterances.
    #[must_use]
    pub fn new<S>(name: S, rounds: Vec<Round>) -> Self
    where
        S: Into<String>,
    {
        let start = rounds.iter().take_while(|r| r.n < 1).count();
        let end = rounds.len()
            - rounds[start..]
                .iter()
                .rev()
                .take_while(|r| r.utterances.is_empty())
                .count();
        let rounds = rounds
            .into_iter()
            .take(end)
            .skip(start)
            .map(Arc::new)
            .collect();
        Self {
            name: name.into(),
            rounds,
        }
    }
}

/// A training/testing split produced by leave-one-session-out iteration.
#[derive(Debug, Clone)]
pub struct Fold<'a> {
    /// Position of the held-out session in the original collection.
    pub index: usize,
    /// Every session except the held-out one, in original order.
    pub training: SessionSet,
    pub testing: &'a Session,
}

/// A collection of sessions: the corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSet {
    pub sessions: Vec<Session>,
}

impl SessionSet {
    #[must_use]
    pub fn new(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn rounds(&self) -> impl Iterator<Item = &Arc<Round>> + '_ {
        self.sessions.iter().flat_map(|s| &s.rounds)
    }

    /// All distinct referent shapes in the corpus, sorted.
    #[must_use]
    pub fn shapes(&self) -> BTreeSet<String> {
        self.rounds()
            .flat_map(|round| &round.referents)
            .map(|r| r.shape.clone())
            .collect()
    }

    /// Leave-one-session-out folds, one per session in collection order.
    ///
    /// The collection itself is never modified; each fold owns a copy of the training
    /// sessions (the rounds themselves are shared).
    pub fn folds(&self) -> impl Iterator<Item = Fold<'_>> + '_ {
        self.sessions.iter().enumerate().map(|(index, testing)| {
            let training = self
                .sessions
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, s)| s.clone())
                .collect();
            Fold {
                index,
                training: SessionSet::new(training),
                testing,
            }
        })
    }
}

impl From<Session> for SessionSet {
    fn from(session: Session) -> Self {
        Self::new(vec![session])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Referent, Utterance};

    fn round(n: i32, with_utterance: bool) -> Round {
        let utterances = if with_utterance {
            vec![Utterance::new("A", true, ["hello"])]
        } else {
            vec![]
        };
        Round::new(
            n,
            utterances,
            vec![Referent::new(1, n, format!("shape{n}")).with_target(true)],
        )
    }

    fn session(name: &str, rounds: usize) -> Session {
        let rounds = (1..=rounds)
            .map(|n| round(i32::try_from(n).unwrap(), true))
            .collect();
        Session::new(name, rounds)
    }

    #[test]
    fn test_new_trims_pre_game_and_silent_tail() {
        let rounds = vec![
            round(0, true),
            round(1, true),
            round(2, true),
            round(3, false),
        ];
        let session = Session::new("s", rounds);
        let numbers = session.rounds.iter().map(|r| r.n).collect::<Vec<_>>();
        assert_eq!(numbers, [1, 2]);
    }

    #[test]
    fn test_folds_hold_out_each_session_once() {
        let set = SessionSet::new(vec![session("a", 2), session("b", 3), session("c", 1)]);
        let folds = set.folds().collect::<Vec<_>>();
        assert_eq!(folds.len(), 3);
        for fold in &folds {
            assert_eq!(fold.training.len(), 2);
            assert!(
                fold.training
                    .sessions
                    .iter()
                    .all(|s| s.name != fold.testing.name)
            );
            assert_eq!(set.sessions[fold.index].name, fold.testing.name);
        }
        // the original collection is untouched
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_shapes_are_sorted_and_distinct() {
        let set = SessionSet::new(vec![session("a", 2), session("b", 3)]);
        let shapes = set.shapes().into_iter().collect::<Vec<_>>();
        assert_eq!(shapes, ["shape1", "shape2", "shape3"]);
    }
}
