#![forbid(unsafe_code)]

//! Validation participants.
//!
//! A [`Participant`] is one registered entity: the form itself
//! ([`ParticipantKind::Root`]) or a sub-entity it edits
//! ([`ParticipantKind::Nested`]). It contributes one validity signal to the
//! aggregate.
//!
//! # Validity lifecycle
//!
//! 1. A fresh participant reports `false` (unverified).
//! 2. [`ParticipantValidity::settle`] is called once the registration-time
//!    full evaluation has been written to the error store.
//! 3. From then on every error store change republishes `!has_errors`.
//!
//! Identity is the address of the shared entity allocation. The participant
//! keeps that allocation alive, so the address cannot be reused by another
//! entity while it is registered.

use std::any::{Any, type_name};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use formgate_runtime::{Observable, Subscription};

use crate::entity::Validatable;

/// Stable identity key of a registered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(usize);

impl ParticipantId {
    /// Identity of the allocation behind `entity`.
    #[must_use]
    pub fn of<T: ?Sized>(entity: &Rc<T>) -> Self {
        Self(Rc::as_ptr(entity).cast::<()>() as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    /// The form's own root entity.
    Root,
    /// Any other entity the form edits.
    Nested,
}

/// Validity signal plus its "has the first evaluation landed" flag.
#[derive(Clone)]
pub struct ParticipantValidity {
    signal: Observable<bool>,
    settled: Rc<Cell<bool>>,
}

impl ParticipantValidity {
    fn new() -> Self {
        Self {
            signal: Observable::new(false),
            settled: Rc::new(Cell::new(false)),
        }
    }

    #[must_use]
    pub fn signal(&self) -> &Observable<bool> {
        &self.signal
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled.get()
    }

    /// Mark the first full evaluation as applied and publish `valid`.
    pub fn settle(&self, valid: bool) {
        self.settled.set(true);
        self.signal.set(valid);
    }

    fn refresh(&self, valid: bool) {
        if self.settled.get() {
            self.signal.set(valid);
        }
    }
}

impl fmt::Debug for ParticipantValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticipantValidity")
            .field("valid", &self.signal.get())
            .field("settled", &self.settled.get())
            .finish()
    }
}

/// One registered entity.
pub struct Participant {
    id: ParticipantId,
    kind: ParticipantKind,
    type_name: &'static str,
    validity: ParticipantValidity,
    _tracking: Subscription,
    _anchor: Rc<dyn Any>,
}

impl Participant {
    /// Wrap `entity`, tracking its error store.
    pub fn new<T: Validatable>(entity: &Rc<T>, kind: ParticipantKind) -> Self {
        let validity = ParticipantValidity::new();
        let tracked = Rc::downgrade(entity);
        let publish = validity.clone();
        let tracking = entity.entity().errors().subscribe(move |_| {
            if let Some(entity) = tracked.upgrade() {
                publish.refresh(!entity.entity().errors().has_errors());
            }
        });
        let anchor: Rc<dyn Any> = Rc::clone(entity) as Rc<dyn Any>;
        Self {
            id: ParticipantId::of(entity),
            kind,
            type_name: type_name::<T>(),
            validity,
            _tracking: tracking,
            _anchor: anchor,
        }
    }

    #[must_use]
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> ParticipantKind {
        self.kind
    }

    /// Rust type name of the entity, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn validity(&self) -> &ParticipantValidity {
        &self.validity
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validity.signal.get()
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .field("validity", &self.validity)
            .finish()
    }
}
