#![forbid(unsafe_code)]

//! Form lifecycle orchestration.
//!
//! A [`FormController`] drives one concrete form (a [`FormDelegate`]) through
//! its lifecycle and owns everything that decides whether the form may be
//! committed:
//!
//! ```text
//!   Uninitialized ──initialize──▶ Initializing ──ok──▶ Idle ◀──┐
//!         ▲                            │                 │      │
//!         └────────── delegate err ────┘            commit  done│
//!                                                        ▼      │
//!                         Idle ──reset──▶ Resetting   Committing┘
//!
//!   any state ──dispose──▶ Disposed
//! ```
//!
//! # Registration
//!
//! During initialization the delegate registers the entities it edits
//! through the [`Registrar`]. Each registration adds a participant to the
//! [`ValidationAggregator`], schedules one full evaluation that settles the
//! participant's validity, and subscribes to the entity's change stream:
//! every content edit updates `dirty` through the delegate's dirty check and
//! schedules one evaluation of the edited field.
//!
//! # Event queue
//!
//! Evaluations run on the [`LocalSpawn`] executor handed to the controller.
//! Their results are written to error stores from that executor only, so no
//! locking is involved.
//!
//! Under [`EvaluationOrder::LatestEdit`] a newer edit of a field aborts the
//! older evaluation of that field. The registration evaluation is never
//! aborted; when it lands it skips every property a later edit has claimed.
//!
//! # Invariants
//!
//! 1. `can_apply == valid && dirty && !busy` once the gate exists (it is
//!    created by the first successful initialize; before that it reads
//!    `false`).
//! 2. At most one initialize/reset and at most one commit are in flight, and
//!    never both.
//! 3. Controller bookkeeping changes are published on the form's change
//!    stream as [`PropertyChange::Meta`] and never mark the form dirty.
//! 4. After `dispose()` no state changes and every operation returns
//!    [`UsageError::Disposed`].
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Initialization delegate error | `FormError::Initialization`; form stays busy and `Uninitialized` until a retry succeeds |
//! | Commit delegate error | `commit_error` set to the error text; `dirty` kept |
//! | Commit delegate returns `false` | `commit_error` set to the configured rejection message; `dirty` kept |
//! | Evaluator error | One synthetic message stored against the field |
//! | Full evaluation reports an undeclared property | Synthetic message on every declared property; participant invalid |
//! | Executor refuses a task | Logged; the evaluation is dropped |

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use formgate_runtime::{BindingScope, Observable, Subscription};
use futures::future::{AbortHandle, LocalBoxFuture, abortable};
use futures::task::{LocalSpawn, LocalSpawnExt};
use tracing::{debug, trace, warn};

use crate::aggregator::ValidationAggregator;
use crate::config::{ControllerConfig, EvaluationOrder};
use crate::entity::{MetaProperty, PropertyChange, Validatable};
use crate::error::{DelegateError, EvaluationError, FormError, UsageError};
use crate::error_store::ErrorStore;
use crate::evaluator::{RuleEvaluator, ValidationReport};
use crate::gate::{ApplyGate, BusyGuard};
use crate::participant::{Participant, ParticipantId, ParticipantKind, ParticipantValidity};

/// Lifecycle position of a [`FormController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Idle,
    Committing,
    Resetting,
    Disposed,
}

/// Result of a commit attempt that was allowed to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The delegate reported `false`.
    Rejected,
    /// The delegate failed; carries the error text.
    Failed(String),
}

impl CommitOutcome {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// The concrete form: its own root entity plus the load and save steps.
pub trait FormDelegate: Validatable + Sized {
    /// Populate the form and register what should be validated.
    fn initialize<'a>(
        &'a self,
        registrar: &'a Registrar<Self>,
    ) -> LocalBoxFuture<'a, Result<(), DelegateError>>;

    /// Persist the edit. `Ok(false)` and `Err` both leave the form dirty.
    fn commit(&self) -> LocalBoxFuture<'_, Result<bool, DelegateError>>;

    /// New value of `dirty` after a content change.
    ///
    /// Override to compare against a snapshot so reverting an edit clears
    /// the flag.
    fn dirty_check(&self, change: &PropertyChange) -> bool {
        let _ = change;
        true
    }
}

/// Handle returned by a registration.
///
/// Disposing it stops validation and dirty tracking of the entity's edits;
/// the entity stays a participant until the next initialize.
#[derive(Debug, Clone)]
pub struct Registration {
    active: Rc<Cell<bool>>,
    inert: bool,
}

impl Registration {
    fn live(active: Rc<Cell<bool>>) -> Self {
        Self {
            active,
            inert: false,
        }
    }

    /// Handle for a duplicate registration; disposing it does nothing.
    #[must_use]
    pub fn inert() -> Self {
        Self {
            active: Rc::new(Cell::new(false)),
            inert: true,
        }
    }

    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn dispose(&self) {
        self.active.set(false);
    }
}

/// Registration access handed to [`FormDelegate::initialize`].
pub struct Registrar<D: FormDelegate> {
    core: Rc<ControllerCore>,
    root: Rc<D>,
}

impl<D: FormDelegate> Registrar<D> {
    /// Validate the form's own root entity with `validator`.
    ///
    /// # Errors
    ///
    /// [`UsageError::UnknownField`] if the validator reports on a property
    /// the form does not declare; [`UsageError::Disposed`] after disposal.
    pub fn register_root(
        &self,
        validator: impl RuleEvaluator<D> + 'static,
    ) -> Result<Registration, FormError> {
        self.core
            .register(&self.root, Rc::new(validator), ParticipantKind::Root)
    }

    /// Validate `target` with `validator`.
    ///
    /// Registering an entity that is already registered returns an inert
    /// handle and changes nothing.
    ///
    /// # Errors
    ///
    /// As for [`register_root`](Self::register_root).
    pub fn register<T: Validatable>(
        &self,
        target: &Rc<T>,
        validator: impl RuleEvaluator<T> + 'static,
    ) -> Result<Registration, FormError> {
        let kind = if ParticipantId::of(target) == ParticipantId::of(&self.root) {
            ParticipantKind::Root
        } else {
            ParticipantKind::Nested
        };
        self.core.register(target, Rc::new(validator), kind)
    }

    /// Number of participants registered so far.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.core.aggregator.len()
    }
}

type EvaluationKey = (ParticipantId, &'static str);

/// What an evaluation covers.
enum EvaluationScope {
    /// One edited field.
    Field(EvaluationKey),
    /// Every declared property of a freshly registered participant.
    Full(Vec<EvaluationKey>),
}

/// Abort handles of running evaluations, plus the newest ticket triggered
/// per field when edits are ordered by [`EvaluationOrder::LatestEdit`].
///
/// Tickets only grow, so a larger ticket always means a later trigger.
#[derive(Default)]
struct InFlight {
    next_ticket: u64,
    handles: HashMap<u64, AbortHandle>,
    triggered: HashMap<EvaluationKey, u64>,
    full: HashSet<u64>,
}

impl InFlight {
    fn reserve(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    fn start(&mut self, ticket: u64, handle: AbortHandle, scope: EvaluationScope, order: EvaluationOrder) {
        if order == EvaluationOrder::LatestEdit {
            match scope {
                EvaluationScope::Field(key) => {
                    let previous = self.triggered.insert(key, ticket);
                    // A full evaluation still settles validity; it is outranked
                    // per property when it lands instead.
                    if let Some(previous) = previous.filter(|p| !self.full.contains(p)) {
                        if let Some(stale) = self.handles.remove(&previous) {
                            trace!(field = key.1, "aborting superseded evaluation");
                            stale.abort();
                        }
                    }
                }
                EvaluationScope::Full(keys) => {
                    for key in keys {
                        self.triggered.insert(key, ticket);
                    }
                    self.full.insert(ticket);
                }
            }
        }
        self.handles.insert(ticket, handle);
    }

    /// Whether a later evaluation of `key` was triggered after `ticket`.
    fn is_superseded(&self, key: EvaluationKey, ticket: u64) -> bool {
        self.triggered.get(&key).is_some_and(|latest| *latest > ticket)
    }

    fn finish(&mut self, ticket: u64) {
        self.handles.remove(&ticket);
        self.full.remove(&ticket);
    }

    fn abort_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
        self.triggered.clear();
        self.full.clear();
    }
}

struct ControllerCore {
    config: ControllerConfig,
    spawner: Rc<dyn LocalSpawn>,
    state: Cell<LifecycleState>,
    busy: Observable<bool>,
    dirty: Observable<bool>,
    commit_error: Observable<String>,
    valid: Observable<bool>,
    can_apply: Observable<bool>,
    aggregator: ValidationAggregator,
    registrations: RefCell<BindingScope>,
    in_flight: RefCell<InFlight>,
    gate: RefCell<Option<(ApplyGate, Subscription)>>,
    meta: RefCell<BindingScope>,
    dirty_check: Box<dyn Fn(&PropertyChange) -> bool>,
}

impl ControllerCore {
    fn is_disposed(&self) -> bool {
        self.state.get() == LifecycleState::Disposed
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state.replace(next);
        if previous != next {
            debug!(from = ?previous, to = ?next, "form lifecycle transition");
        }
    }

    fn check_can_initialize(&self) -> Result<(), UsageError> {
        match self.state.get() {
            LifecycleState::Disposed => Err(UsageError::Disposed),
            LifecycleState::Initializing | LifecycleState::Resetting => {
                Err(UsageError::InitializeInProgress)
            }
            LifecycleState::Committing => Err(UsageError::CommitInProgress),
            LifecycleState::Uninitialized | LifecycleState::Idle => Ok(()),
        }
    }

    fn check_can_commit(&self) -> Result<(), UsageError> {
        match self.state.get() {
            LifecycleState::Disposed => Err(UsageError::Disposed),
            LifecycleState::Committing => Err(UsageError::CommitInProgress),
            LifecycleState::Initializing | LifecycleState::Resetting => {
                Err(UsageError::InitializeInProgress)
            }
            LifecycleState::Uninitialized => Err(UsageError::NotInitialized),
            LifecycleState::Idle => Ok(()),
        }
    }

    /// Drop every participant, registration, and in-flight evaluation.
    fn clear_registrations(&self) {
        self.in_flight.borrow_mut().abort_all();
        let released = std::mem::take(&mut *self.registrations.borrow_mut());
        drop(released);
        self.aggregator.clear();
    }

    /// Create the apply gate once. Returns whether it was created now.
    fn ensure_gate(&self) -> bool {
        if self.gate.borrow().is_some() {
            return false;
        }
        let gate = ApplyGate::new(&self.valid, &self.dirty, &self.busy);
        let mirror = self.can_apply.clone();
        let forward = gate.signal().watch(move |open| mirror.set(*open));
        *self.gate.borrow_mut() = Some((gate, forward));
        true
    }

    fn register<T: Validatable>(
        self: &Rc<Self>,
        target: &Rc<T>,
        validator: Rc<dyn RuleEvaluator<T>>,
        kind: ParticipantKind,
    ) -> Result<Registration, FormError> {
        if self.is_disposed() {
            return Err(UsageError::Disposed.into());
        }
        let errors = target.entity().errors();
        for property in validator.properties() {
            errors.resolve(property)?;
        }

        let participant = Participant::new(target, kind);
        let id = participant.id();
        let validity = participant.validity().clone();
        if !self.aggregator.register(participant) {
            debug!(participant = ?id, "entity already registered; ignoring");
            return Ok(Registration::inert());
        }

        self.spawn_full_evaluation(id, target, Rc::clone(&validator), validity);

        let active = Rc::new(Cell::new(true));
        let subscription = {
            let core = Rc::downgrade(self);
            let entity = Rc::downgrade(target);
            let active = Rc::clone(&active);
            target.entity().subscribe(move |change| {
                let PropertyChange::Field(field) = *change else {
                    return;
                };
                if !active.get() {
                    return;
                }
                if let (Some(core), Some(entity)) = (core.upgrade(), entity.upgrade()) {
                    core.on_field_changed(id, &entity, &validator, change, field);
                }
            })
        };
        self.registrations.borrow_mut().hold(subscription);
        Ok(Registration::live(active))
    }

    fn on_field_changed<T: Validatable>(
        self: &Rc<Self>,
        id: ParticipantId,
        target: &Rc<T>,
        validator: &Rc<dyn RuleEvaluator<T>>,
        change: &PropertyChange,
        field: &'static str,
    ) {
        if self.is_disposed() {
            return;
        }
        self.dirty.set((self.dirty_check)(change));
        trace!(field, "field changed; scheduling evaluation");

        let core = Rc::downgrade(self);
        let target = Rc::clone(target);
        let validator = Rc::clone(validator);
        let ticket = self.in_flight.borrow_mut().reserve();
        self.spawn(ticket, EvaluationScope::Field((id, field)), async move {
            let outcome = validator.evaluate(&target, Some(field)).await;
            if let Some(core) = live(&core) {
                core.apply_field(target.entity().errors(), field, outcome);
            }
        });
    }

    fn spawn_full_evaluation<T: Validatable>(
        self: &Rc<Self>,
        id: ParticipantId,
        target: &Rc<T>,
        validator: Rc<dyn RuleEvaluator<T>>,
        validity: ParticipantValidity,
    ) {
        let core = Rc::downgrade(self);
        let target = Rc::clone(target);
        let keys: Vec<EvaluationKey> = validator.properties().iter().map(|p| (id, *p)).collect();
        let ticket = self.in_flight.borrow_mut().reserve();
        self.spawn(ticket, EvaluationScope::Full(keys), async move {
            let outcome = validator.evaluate(&target, None).await;
            if let Some(core) = live(&core) {
                let errors = target.entity().errors();
                let sound = core.apply_full(id, ticket, errors, validator.properties(), outcome);
                validity.settle(sound && !errors.has_errors());
            }
        });
    }

    fn spawn(
        self: &Rc<Self>,
        ticket: u64,
        scope: EvaluationScope,
        work: impl Future<Output = ()> + 'static,
    ) {
        let (task, handle) = abortable(work);
        self.in_flight
            .borrow_mut()
            .start(ticket, handle, scope, self.config.evaluation_order);
        let core = Rc::downgrade(self);
        let spawned = self.spawner.spawn_local(async move {
            let _ = task.await;
            if let Some(core) = core.upgrade() {
                core.in_flight.borrow_mut().finish(ticket);
            }
        });
        if let Err(err) = spawned {
            warn!(error = %err, "executor refused evaluation task");
            self.in_flight.borrow_mut().finish(ticket);
        }
    }

    fn apply_field(
        &self,
        errors: &ErrorStore,
        field: &'static str,
        outcome: Result<ValidationReport, EvaluationError>,
    ) {
        let messages = match outcome {
            Ok(report) => report.messages_for(field),
            Err(err) => {
                warn!(field, error = %err, "rule evaluation failed");
                vec![format!("{}{err}", self.config.failure_prefix)]
            }
        };
        trace!(field, errors = messages.len(), "evaluation result applied");
        store_messages(errors, field, messages);
    }

    /// Write a full evaluation to every declared property that no later
    /// edit has claimed. Returns `false` when the evaluation itself was
    /// unusable: the evaluator failed, or it reported on a property it does
    /// not declare.
    fn apply_full(
        &self,
        id: ParticipantId,
        ticket: u64,
        errors: &ErrorStore,
        properties: &[&'static str],
        outcome: Result<ValidationReport, EvaluationError>,
    ) -> bool {
        let prefix = &self.config.failure_prefix;
        let checked = match outcome {
            Ok(report) => {
                let stray = report
                    .failures()
                    .iter()
                    .map(|failure| failure.property.as_str())
                    .find(|property| !properties.iter().any(|declared| declared == property))
                    .map(str::to_string);
                match stray {
                    Some(stray) => {
                        warn!(property = %stray, "evaluation reported an undeclared property");
                        Err(format!("{prefix}undeclared property '{stray}'"))
                    }
                    None => Ok(report),
                }
            }
            Err(err) => {
                warn!(error = %err, "full rule evaluation failed");
                Err(format!("{prefix}{err}"))
            }
        };

        for &property in properties {
            let superseded = self.in_flight.borrow().is_superseded((id, property), ticket);
            if superseded {
                trace!(field = property, "full result outranked by a later edit");
                continue;
            }
            let messages = match &checked {
                Ok(report) => report.messages_for(property),
                Err(message) => vec![message.clone()],
            };
            store_messages(errors, property, messages);
        }
        checked.is_ok()
    }

    fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        self.transition(LifecycleState::Disposed);
        self.in_flight.borrow_mut().abort_all();
        let released = std::mem::take(&mut *self.registrations.borrow_mut());
        drop(released);
        let gate = self.gate.borrow_mut().take();
        drop(gate);
        let meta = std::mem::take(&mut *self.meta.borrow_mut());
        drop(meta);
        self.aggregator.dispose();
    }
}

/// Upgrade `core` unless it is gone or disposed.
fn live(core: &Weak<ControllerCore>) -> Option<Rc<ControllerCore>> {
    core.upgrade().filter(|core| !core.is_disposed())
}

fn store_messages(errors: &ErrorStore, property: &str, messages: Vec<String>) {
    let result = if messages.is_empty() {
        errors.clear_errors(property)
    } else {
        errors.set_errors(property, messages)
    };
    if let Err(err) = result {
        warn!(property, error = %err, "discarded evaluation result");
    }
}

/// Orchestrates validation, dirty/busy tracking, and commit for one form.
pub struct FormController<D: FormDelegate> {
    core: Rc<ControllerCore>,
    form: Rc<D>,
}

impl<D: FormDelegate> FormController<D> {
    /// Controller with the default [`ControllerConfig`].
    pub fn new(form: D, spawner: impl LocalSpawn + 'static) -> Self {
        Self::with_config(form, spawner, ControllerConfig::default())
    }

    pub fn with_config(form: D, spawner: impl LocalSpawn + 'static, config: ControllerConfig) -> Self {
        let form = Rc::new(form);
        let dirty_check: Box<dyn Fn(&PropertyChange) -> bool> = {
            let form = Rc::downgrade(&form);
            Box::new(move |change| form.upgrade().is_none_or(|form| form.dirty_check(change)))
        };
        let aggregator = ValidationAggregator::new();
        let core = Rc::new(ControllerCore {
            config,
            spawner: Rc::new(spawner),
            state: Cell::new(LifecycleState::Uninitialized),
            busy: Observable::new(false),
            dirty: Observable::new(false),
            commit_error: Observable::new(String::new()),
            valid: aggregator.combined_validity(),
            can_apply: Observable::new(false),
            aggregator,
            registrations: RefCell::new(BindingScope::new()),
            in_flight: RefCell::new(InFlight::default()),
            gate: RefCell::new(None),
            meta: RefCell::new(BindingScope::new()),
            dirty_check,
        });

        {
            let mut meta = core.meta.borrow_mut();
            let forwards = [
                (&core.busy, MetaProperty::Busy),
                (&core.dirty, MetaProperty::Dirty),
            ];
            for (signal, property) in forwards {
                let form = Rc::downgrade(&form);
                meta.subscribe(signal, move |_| {
                    if let Some(form) = form.upgrade() {
                        form.entity().emit_meta(property);
                    }
                });
            }
            let target = Rc::downgrade(&form);
            meta.subscribe(&core.commit_error, move |_| {
                if let Some(form) = target.upgrade() {
                    form.entity().emit_meta(MetaProperty::CommitError);
                }
            });
        }

        Self { core, form }
    }

    /// Load the form and (re)register its validation.
    ///
    /// # Errors
    ///
    /// - [`UsageError`] if disposed, or an initialize or commit is running.
    /// - [`FormError::Initialization`] if the delegate fails. Whatever it
    ///   registered before failing is dropped, and the form stays busy and
    ///   `Uninitialized`; call `initialize()` again to retry.
    pub async fn initialize(&self) -> Result<(), FormError> {
        self.core.check_can_initialize()?;
        self.run_initialize(LifecycleState::Initializing).await
    }

    /// Discard edits by re-running initialization.
    ///
    /// # Errors
    ///
    /// [`UsageError::CommitInProgress`] while committing,
    /// [`UsageError::NotInitialized`] before the first successful
    /// initialize; otherwise as for [`initialize`](Self::initialize).
    pub async fn reset(&self) -> Result<(), FormError> {
        self.core.check_can_initialize()?;
        if self.core.state.get() == LifecycleState::Uninitialized {
            return Err(UsageError::NotInitialized.into());
        }
        self.form.entity().emit_meta(MetaProperty::Reset);
        self.run_initialize(LifecycleState::Resetting).await
    }

    async fn run_initialize(&self, entering: LifecycleState) -> Result<(), FormError> {
        self.core.transition(entering);
        let busy = BusyGuard::acquire(&self.core.busy);
        self.core.clear_registrations();
        self.form.entity().errors().clear_all();

        let registrar = Registrar {
            core: Rc::clone(&self.core),
            root: Rc::clone(&self.form),
        };
        let loaded = self.form.initialize(&registrar).await;

        if self.core.is_disposed() {
            busy.hold();
            return Err(UsageError::Disposed.into());
        }
        if let Err(err) = loaded {
            warn!(error = %err, "form initialization failed");
            self.core.clear_registrations();
            busy.hold();
            self.core.transition(LifecycleState::Uninitialized);
            return Err(FormError::Initialization(err));
        }

        self.core.dirty.set(false);
        drop(busy);
        if self.core.ensure_gate() {
            self.form.entity().emit_meta(MetaProperty::Apply);
        }
        self.core.transition(LifecycleState::Idle);
        debug!(
            participants = self.core.aggregator.len(),
            "form initialized"
        );
        Ok(())
    }

    /// Run the commit delegate.
    ///
    /// Delegate failures do not error this call: they are reported in the
    /// returned outcome and in [`commit_error`](Self::commit_error).
    ///
    /// # Errors
    ///
    /// [`UsageError`] if disposed, not initialized, or an initialize or
    /// commit is running.
    pub async fn commit(&self) -> Result<CommitOutcome, FormError> {
        self.core.check_can_commit()?;
        self.core.transition(LifecycleState::Committing);
        let busy = BusyGuard::acquire(&self.core.busy);
        self.core.commit_error.set(String::new());

        let outcome = match self.form.commit().await {
            Ok(true) => CommitOutcome::Committed,
            Ok(false) => CommitOutcome::Rejected,
            Err(err) => CommitOutcome::Failed(err.to_string()),
        };

        if self.core.is_disposed() {
            busy.hold();
            return Err(UsageError::Disposed.into());
        }
        match &outcome {
            CommitOutcome::Committed => self.core.dirty.set(false),
            CommitOutcome::Rejected => {
                warn!("commit rejected by delegate");
                self.core
                    .commit_error
                    .set(self.core.config.rejected_commit_message.clone());
            }
            CommitOutcome::Failed(message) => {
                warn!(error = %message, "commit failed");
                self.core.commit_error.set(message.clone());
            }
        }
        drop(busy);
        self.core.transition(LifecycleState::Idle);
        Ok(outcome)
    }

    /// Commit through the apply gate.
    ///
    /// # Errors
    ///
    /// [`UsageError::ApplyUnavailable`] unless the form is valid, dirty, and
    /// not busy; otherwise as for [`commit`](Self::commit).
    pub async fn apply(&self) -> Result<CommitOutcome, FormError> {
        if self.core.is_disposed() {
            return Err(UsageError::Disposed.into());
        }
        if !self.core.can_apply.get() {
            return Err(UsageError::ApplyUnavailable.into());
        }
        self.commit().await
    }

    /// Tear down every subscription and abort pending evaluations.
    ///
    /// Idempotent; also runs on drop.
    pub fn dispose(&self) {
        self.core.dispose();
    }

    #[must_use]
    pub fn form(&self) -> &Rc<D> {
        &self.form
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.core.config
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.core.state.get()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.core.busy.get()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.core.dirty.get()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.core.valid.get()
    }

    #[must_use]
    pub fn can_apply(&self) -> bool {
        self.core.can_apply.get()
    }

    /// Last commit failure text; empty when the last commit succeeded.
    #[must_use]
    pub fn commit_error(&self) -> String {
        self.core.commit_error.get()
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.core.aggregator.len()
    }

    /// Number of evaluations scheduled but not yet finished.
    #[must_use]
    pub fn pending_evaluations(&self) -> usize {
        self.core.in_flight.borrow().handles.len()
    }

    #[must_use]
    pub fn busy_signal(&self) -> Observable<bool> {
        self.core.busy.clone()
    }

    #[must_use]
    pub fn dirty_signal(&self) -> Observable<bool> {
        self.core.dirty.clone()
    }

    #[must_use]
    pub fn valid_signal(&self) -> Observable<bool> {
        self.core.valid.clone()
    }

    #[must_use]
    pub fn can_apply_signal(&self) -> Observable<bool> {
        self.core.can_apply.clone()
    }

    #[must_use]
    pub fn commit_error_signal(&self) -> Observable<String> {
        self.core.commit_error.clone()
    }
}

impl<D: FormDelegate> Drop for FormController<D> {
    fn drop(&mut self) {
        self.core.dispose();
    }
}

impl<D: FormDelegate> fmt::Debug for FormController<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("state", &self.state())
            .field("busy", &self.is_busy())
            .field("dirty", &self.is_dirty())
            .field("valid", &self.is_valid())
            .field("can_apply", &self.can_apply())
            .field("commit_error", &self.commit_error())
            .field("participants", &self.participant_count())
            .finish()
    }
}
