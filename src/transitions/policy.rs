use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// First illegal adjacent pair found while validating a status sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("illegal transition at index {index}: {from:?} -> {to:?}")]
pub struct SequenceViolation<S: fmt::Debug> {
    /// Position of the offending `to` element in the audited sequence
    pub index: usize,
    pub from: S,
    pub to: S,
}

/// Fixed mapping from each state to the set of states it may move to.
///
/// States that were never declared have no successors, so any transition out
/// of them is rejected. The policy holds no mutable state and can be shared
/// freely between threads.
#[derive(Debug, Clone)]
pub struct TransitionPolicy<S> {
    successors: HashMap<S, HashSet<S>>,
}

impl<S> Default for TransitionPolicy<S>
where
    S: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TransitionPolicy<S>
where
    S: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new() -> Self {
        Self {
            successors: HashMap::new(),
        }
    }

    /// Declare `from` and permit moves to each of `to`
    pub fn allow(mut self, from: S, to: impl IntoIterator<Item = S>) -> Self {
        self.successors.entry(from).or_default().extend(to);
        self
    }

    /// Declare a state with no outgoing edges
    pub fn terminal(mut self, state: S) -> Self {
        self.successors.entry(state).or_default();
        self
    }

    pub fn is_allowed(&self, from: &S, to: &S) -> bool {
        self.successors
            .get(from)
            .map(|next| next.contains(to))
            .unwrap_or(false)
    }

    pub fn is_declared(&self, state: &S) -> bool {
        self.successors.contains_key(state)
    }

    /// A declared state with an empty successor set
    pub fn is_terminal(&self, state: &S) -> bool {
        self.successors
            .get(state)
            .map(|next| next.is_empty())
            .unwrap_or(false)
    }

    pub fn successors(&self, from: &S) -> impl Iterator<Item = &S> {
        self.successors.get(from).into_iter().flatten()
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.successors.keys()
    }

    /// Check every adjacent pair in order and report the first illegal one.
    ///
    /// Empty and single-element sequences have no pairs and are always valid.
    pub fn validate_sequence(&self, sequence: &[S]) -> Result<(), SequenceViolation<S>> {
        for (index, pair) in sequence.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            if !self.is_allowed(from, to) {
                return Err(SequenceViolation {
                    index: index + 1,
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
        Ok(())
    }
}
