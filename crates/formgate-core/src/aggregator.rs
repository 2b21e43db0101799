#![forbid(unsafe_code)]

//! Combined validity over a dynamic participant set.
//!
//! The [`ValidationAggregator`] owns an arena of [`Participant`]s keyed by
//! [`ParticipantId`](crate::participant::ParticipantId) and publishes one
//! boolean: the AND of every current participant's validity, or `true` when
//! nothing is registered.
//!
//! # Fold lifecycle
//!
//! The combination is a fold over a snapshot of the participant signals. It
//! is rebuilt only when membership changes:
//!
//! 1. The previous fold's subscriptions are dropped (explicit teardown).
//! 2. A generation counter is bumped; callbacks of older generations return
//!    without publishing even if still reachable.
//! 3. The new fold subscribes to each participant signal and publishes the
//!    current AND immediately.
//!
//! Individual validity changes flow through the existing fold; a membership
//! change costs one O(n) rebuild.
//!
//! # Invariants
//!
//! 1. `is_valid() == participants.all(valid)` after every register, clear,
//!    or participant change.
//! 2. A participant id is registered at most once.
//! 3. No internal borrow is held while the combined signal notifies, so
//!    subscribers may query the aggregator.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use formgate_runtime::{BindingScope, Observable, Subscription};
use tracing::debug;

use crate::participant::Participant;

/// Fold participant signals left to right with AND; empty folds to `true`.
fn fold_validity(signals: &[Observable<bool>]) -> bool {
    signals.iter().fold(true, |acc, signal| acc && signal.get())
}

pub struct ValidationAggregator {
    participants: RefCell<Vec<Participant>>,
    combined: Observable<bool>,
    fold: RefCell<BindingScope>,
    generation: Rc<Cell<u64>>,
}

impl ValidationAggregator {
    /// An empty aggregator; vacuously valid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            participants: RefCell::new(Vec::new()),
            combined: Observable::new(true),
            fold: RefCell::new(BindingScope::new()),
            generation: Rc::new(Cell::new(0)),
        }
    }

    /// Add `participant` unless its id is already registered.
    ///
    /// Returns `false` (and drops `participant`) for a duplicate.
    pub fn register(&self, participant: Participant) -> bool {
        {
            let mut participants = self.participants.borrow_mut();
            if participants.iter().any(|p| p.id() == participant.id()) {
                return false;
            }
            debug!(
                participant = participant.type_name(),
                kind = ?participant.kind(),
                "registered validation participant"
            );
            participants.push(participant);
        }
        self.rebuild();
        true
    }

    /// Remove every participant; the combined signal becomes `true`.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.participants.borrow_mut());
        drop(removed);
        self.rebuild();
    }

    /// Tear down participants and the fold without publishing.
    ///
    /// The combined signal keeps its last value and never changes again
    /// unless participants are registered anew.
    pub fn dispose(&self) {
        let removed = std::mem::take(&mut *self.participants.borrow_mut());
        drop(removed);
        let fold = std::mem::take(&mut *self.fold.borrow_mut());
        drop(fold);
        self.generation.set(self.generation.get() + 1);
    }

    /// The combined signal. Stable across rebuilds.
    #[must_use]
    pub fn combined_validity(&self) -> Observable<bool> {
        self.combined.clone()
    }

    /// Deliver the current combined value now and every change after.
    pub fn watch(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.combined.watch(callback)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.combined.get()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.borrow().is_empty()
    }

    fn rebuild(&self) {
        let signals: Rc<[Observable<bool>]> = self
            .participants
            .borrow()
            .iter()
            .map(|p| p.validity().signal().clone())
            .collect();

        let superseded = std::mem::take(&mut *self.fold.borrow_mut());
        drop(superseded);

        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let publish: Rc<dyn Fn()> = {
            let signals = Rc::clone(&signals);
            let combined = self.combined.clone();
            let current = Rc::clone(&self.generation);
            Rc::new(move || {
                if current.get() == generation {
                    combined.set(fold_validity(&signals));
                }
            })
        };

        let mut fold = BindingScope::new();
        for signal in signals.iter() {
            let publish = Rc::clone(&publish);
            fold.subscribe(signal, move |_| publish());
        }
        *self.fold.borrow_mut() = fold;

        debug!(participants = signals.len(), generation, "rebuilt validity fold");
        publish();
    }
}

impl Default for ValidationAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidationAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationAggregator")
            .field("participants", &*self.participants.borrow())
            .field("combined", &self.combined.get())
            .field("generation", &self.generation.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityState, Validatable};
    use crate::participant::ParticipantKind;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    struct Line {
        state: EntityState,
    }

    impl Validatable for Line {
        fn entity(&self) -> &EntityState {
            &self.state
        }
    }

    fn line() -> Rc<Line> {
        Rc::new(Line {
            state: EntityState::new(&["qty"]),
        })
    }

    /// Register `entity` with its store and validity already settled at `valid`.
    fn settled(agg: &ValidationAggregator, entity: &Rc<Line>, valid: bool) -> bool {
        set_valid(entity, valid);
        let participant = Participant::new(entity, ParticipantKind::Nested);
        participant.validity().settle(valid);
        agg.register(participant)
    }

    fn set_valid(entity: &Line, valid: bool) {
        let errors = entity.entity().errors();
        if valid {
            errors.clear_errors("qty").unwrap();
        } else {
            errors.set_errors("qty", vec!["must be positive".into()]).unwrap();
        }
    }

    #[test]
    fn empty_is_vacuously_valid() {
        let agg = ValidationAggregator::new();
        assert!(agg.is_valid());
        assert!(agg.is_empty());
    }

    #[test]
    fn all_valid_participants_combine_to_valid() {
        let agg = ValidationAggregator::new();
        let (a, b) = (line(), line());
        settled(&agg, &a, true);
        settled(&agg, &b, true);
        assert!(agg.is_valid());

        set_valid(&b, false);
        assert!(!agg.is_valid());
        set_valid(&b, true);
        assert!(agg.is_valid());
    }

    #[test]
    fn unsettled_participant_holds_aggregate_invalid() {
        let agg = ValidationAggregator::new();
        let a = line();
        agg.register(Participant::new(&a, ParticipantKind::Nested));
        assert!(!agg.is_valid());
    }

    #[test]
    fn duplicate_registration_is_noop() {
        let agg = ValidationAggregator::new();
        let a = line();
        assert!(settled(&agg, &a, true));
        let generation = agg.generation.get();
        assert!(!agg.register(Participant::new(&a, ParticipantKind::Nested)));
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.generation.get(), generation);
        assert!(agg.is_valid());
    }

    #[test]
    fn clear_publishes_true_immediately() {
        let agg = ValidationAggregator::new();
        let a = line();
        settled(&agg, &a, false);
        assert!(!agg.is_valid());

        agg.clear();
        assert!(agg.is_valid());
        assert!(agg.is_empty());
    }

    #[test]
    fn removed_participant_no_longer_affects_output() {
        let agg = ValidationAggregator::new();
        let stale = line();
        settled(&agg, &stale, true);
        agg.clear();
        let fresh = line();
        settled(&agg, &fresh, true);

        set_valid(&stale, false);
        assert!(agg.is_valid());
    }

    #[test]
    fn late_watcher_gets_current_value_then_updates() {
        let agg = ValidationAggregator::new();
        let a = line();
        settled(&agg, &a, false);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = agg.watch(move |v| s.borrow_mut().push(*v));
        set_valid(&a, true);
        agg.clear();

        // clear() keeps true, so no extra emission.
        assert_eq!(*seen.borrow(), vec![false, true]);
    }

    #[test]
    fn subscriber_may_query_aggregator_during_publish() {
        let agg = Rc::new(ValidationAggregator::new());
        let counts = Rc::new(RefCell::new(Vec::new()));
        let reader = Rc::downgrade(&agg);
        let c = Rc::clone(&counts);
        let _sub = agg.combined_validity().subscribe(move |_| {
            if let Some(agg) = reader.upgrade() {
                c.borrow_mut().push(agg.len());
            }
        });

        let a = line();
        settled(&agg, &a, false);
        agg.clear();
        assert_eq!(*counts.borrow(), vec![1, 0]);
    }

    #[test]
    fn dispose_freezes_combined_value() {
        let agg = ValidationAggregator::new();
        let a = line();
        settled(&agg, &a, false);
        agg.dispose();
        assert!(agg.is_empty());
        assert!(!agg.is_valid());

        set_valid(&a, true);
        assert!(!agg.is_valid());
    }

    #[test]
    #[traced_test]
    fn rebuild_is_logged() {
        let agg = ValidationAggregator::new();
        settled(&agg, &line(), true);
        assert!(logs_contain("rebuilt validity fold"));
        assert!(logs_contain("registered validation participant"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Register(bool),
        Flip(usize),
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Register),
            (0usize..8).prop_map(Op::Flip),
            Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn combined_is_and_of_current_participants(ops in prop::collection::vec(op(), 0..40)) {
            let agg = ValidationAggregator::new();
            let mut current: Vec<(Rc<Line>, bool)> = Vec::new();
            let mut retired: Vec<Rc<Line>> = Vec::new();

            for op in ops {
                match op {
                    Op::Register(valid) => {
                        let entity = line();
                        prop_assert!(settled(&agg, &entity, valid));
                        current.push((entity, valid));
                    }
                    Op::Flip(i) => {
                        if let Some((entity, valid)) = current.get_mut(i) {
                            *valid = !*valid;
                            set_valid(entity, *valid);
                        } else if let Some(entity) = retired.get(i) {
                            // Flipping a cleared participant must be invisible.
                            set_valid(entity, entity.entity().errors().has_errors());
                        }
                    }
                    Op::Clear => {
                        agg.clear();
                        retired.extend(current.drain(..).map(|(e, _)| e));
                    }
                }
                let expected = current.iter().all(|(_, valid)| *valid);
                prop_assert_eq!(agg.is_valid(), expected);
                prop_assert_eq!(agg.len(), current.len());
            }
        }
    }
}
