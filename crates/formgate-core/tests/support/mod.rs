//! Person/PersonForm fixtures shared by the integration scenarios.
//!
//! The person rules: name must be "Cody", id strictly between 50 and 100.
//! The form rule: a person must be present. Evaluations and delegates can be
//! held on oneshot gates so tests decide completion order.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future;
use std::rc::Rc;

use formgate_core::{
    ControllerConfig, DelegateError, EntityState, EvaluationError, FormController, FormDelegate,
    PropertyChange, Registrar, Registration, RuleEvaluator, Validatable, ValidationReport,
};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::LocalBoxFuture;

pub const NAME_MESSAGE: &str = "Name must be Cody";
pub const ID_MESSAGE: &str = "Id must be between 50 and 100";
pub const PERSON_MESSAGE: &str = "A person is required";

type Gates = Rc<RefCell<VecDeque<oneshot::Receiver<()>>>>;

pub struct Person {
    state: EntityState,
    name: RefCell<String>,
    id: RefCell<i64>,
}

impl Person {
    pub fn new(name: &str, id: i64) -> Self {
        Self {
            state: EntityState::new(&["name", "id"]),
            name: RefCell::new(name.to_string()),
            id: RefCell::new(id),
        }
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn id(&self) -> i64 {
        *self.id.borrow()
    }

    pub fn set_name(&self, name: &str) -> bool {
        self.state.assign(&self.name, name.to_string(), "name")
    }

    pub fn set_id(&self, id: i64) -> bool {
        self.state.assign(&self.id, id, "id")
    }

    pub fn errors(&self, property: &str) -> Option<Vec<String>> {
        self.state.errors().errors(property)
    }
}

impl Validatable for Person {
    fn entity(&self) -> &EntityState {
        &self.state
    }
}

fn check_person(name: &str, id: i64, property: Option<&str>, broken: bool) -> Result<ValidationReport, EvaluationError> {
    if broken {
        return Err("rules engine offline".into());
    }
    let mut report = ValidationReport::valid();
    if property.is_none_or(|p| p == "name") && name != "Cody" {
        report.push("name", NAME_MESSAGE);
    }
    if property.is_none_or(|p| p == "id") && !(51..100).contains(&id) {
        report.push("id", ID_MESSAGE);
    }
    Ok(report)
}

/// Person rules. Each evaluation snapshots the person when it starts and
/// then waits for the next queued gate, if any.
pub struct UserValidator {
    gates: Gates,
    broken: Rc<Cell<bool>>,
}

impl RuleEvaluator<Person> for UserValidator {
    fn properties(&self) -> &[&'static str] {
        &["name", "id"]
    }

    fn evaluate<'a>(
        &'a self,
        person: &'a Person,
        property: Option<&'a str>,
    ) -> LocalBoxFuture<'a, Result<ValidationReport, EvaluationError>> {
        let (name, id) = (person.name(), person.id());
        let gate = self.gates.borrow_mut().pop_front();
        let broken = self.broken.get();
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            check_person(&name, id, property, broken)
        })
    }
}

pub struct PersonFormValidator;

impl RuleEvaluator<PersonForm> for PersonFormValidator {
    fn properties(&self) -> &[&'static str] {
        &["person"]
    }

    fn evaluate<'a>(
        &'a self,
        form: &'a PersonForm,
        _property: Option<&'a str>,
    ) -> LocalBoxFuture<'a, Result<ValidationReport, EvaluationError>> {
        let mut report = ValidationReport::valid();
        if form.person().is_none() {
            report.push("person", PERSON_MESSAGE);
        }
        let result: Result<ValidationReport, EvaluationError> = Ok(report);
        Box::pin(future::ready(result))
    }
}

/// Edits one person. Initialization builds the person from the seed values.
pub struct PersonForm {
    state: EntityState,
    person: RefCell<Option<Rc<Person>>>,
    seed: (String, i64),
    gates: Gates,
    rules_broken: Rc<Cell<bool>>,
    init_failures: Cell<u32>,
    late_init_failures: Cell<u32>,
    init_gate: RefCell<Option<oneshot::Receiver<()>>>,
    commit_gate: RefCell<Option<oneshot::Receiver<()>>>,
    commit_results: RefCell<VecDeque<Result<bool, String>>>,
    commits: Cell<u32>,
    register_twice: Cell<bool>,
    duplicate_inert: Cell<Option<bool>>,
    snapshot_dirty: Cell<bool>,
    person_registration: RefCell<Option<Registration>>,
}

impl PersonForm {
    pub fn new(name: &str, id: i64) -> Self {
        Self {
            state: EntityState::new(&["person"]),
            person: RefCell::new(None),
            seed: (name.to_string(), id),
            gates: Rc::default(),
            rules_broken: Rc::default(),
            init_failures: Cell::new(0),
            late_init_failures: Cell::new(0),
            init_gate: RefCell::new(None),
            commit_gate: RefCell::new(None),
            commit_results: RefCell::new(VecDeque::new()),
            commits: Cell::new(0),
            register_twice: Cell::new(false),
            duplicate_inert: Cell::new(None),
            snapshot_dirty: Cell::new(false),
            person_registration: RefCell::new(None),
        }
    }

    /// Fail the next `count` initializations with "backend offline".
    pub fn failing_initializations(self, count: u32) -> Self {
        self.init_failures.set(count);
        self
    }

    /// Fail the next `count` initializations after everything is registered.
    pub fn failing_after_registration(self, count: u32) -> Self {
        self.late_init_failures.set(count);
        self
    }

    /// Register the person a second time during initialization.
    pub fn registering_twice(self) -> Self {
        self.register_twice.set(true);
        self
    }

    /// Dirty means "name differs from the seed".
    pub fn with_snapshot_dirty(self) -> Self {
        self.snapshot_dirty.set(true);
        self
    }

    pub fn person(&self) -> Option<Rc<Person>> {
        self.person.borrow().clone()
    }

    pub fn set_person(&self, person: Option<Rc<Person>>) {
        let changed = {
            let mut slot = self.person.borrow_mut();
            let same = match (&*slot, &person) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            *slot = person;
            !same
        };
        if changed {
            self.state.field_changed("person");
        }
    }

    pub fn errors(&self, property: &str) -> Option<Vec<String>> {
        self.state.errors().errors(property)
    }

    /// Hold the next person evaluation until the returned sender fires.
    pub fn hold_next_evaluation(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.gates.borrow_mut().push_back(gate);
        release
    }

    pub fn hold_next_initialize(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *self.init_gate.borrow_mut() = Some(gate);
        release
    }

    pub fn hold_next_commit(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *self.commit_gate.borrow_mut() = Some(gate);
        release
    }

    pub fn break_rules(&self, broken: bool) {
        self.rules_broken.set(broken);
    }

    /// Queue the result of the next commit (default: success).
    pub fn script_commit(&self, result: Result<bool, &str>) {
        self.commit_results
            .borrow_mut()
            .push_back(result.map_err(str::to_string));
    }

    pub fn commits(&self) -> u32 {
        self.commits.get()
    }

    pub fn duplicate_inert(&self) -> Option<bool> {
        self.duplicate_inert.get()
    }

    pub fn person_registration(&self) -> Option<Registration> {
        self.person_registration.borrow().clone()
    }

    async fn load(&self, registrar: &Registrar<Self>) -> Result<(), DelegateError> {
        let gate = self.init_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let remaining = self.init_failures.get();
        if remaining > 0 {
            self.init_failures.set(remaining - 1);
            return Err("backend offline".into());
        }

        let person = Rc::new(Person::new(&self.seed.0, self.seed.1));
        self.set_person(Some(Rc::clone(&person)));
        registrar.register_root(PersonFormValidator)?;
        let registration = registrar.register(
            &person,
            UserValidator {
                gates: Rc::clone(&self.gates),
                broken: Rc::clone(&self.rules_broken),
            },
        )?;
        *self.person_registration.borrow_mut() = Some(registration);

        if self.register_twice.get() {
            let again = registrar.register(
                &person,
                UserValidator {
                    gates: Rc::clone(&self.gates),
                    broken: Rc::clone(&self.rules_broken),
                },
            )?;
            self.duplicate_inert.set(Some(again.is_inert()));
        }

        let late = self.late_init_failures.get();
        if late > 0 {
            self.late_init_failures.set(late - 1);
            return Err("backend offline".into());
        }
        Ok(())
    }

    async fn save(&self) -> Result<bool, DelegateError> {
        let gate = self.commit_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.commits.set(self.commits.get() + 1);
        let scripted = self.commit_results.borrow_mut().pop_front();
        scripted.unwrap_or(Ok(true)).map_err(Into::into)
    }
}

impl Validatable for PersonForm {
    fn entity(&self) -> &EntityState {
        &self.state
    }
}

impl FormDelegate for PersonForm {
    fn initialize<'a>(
        &'a self,
        registrar: &'a Registrar<Self>,
    ) -> LocalBoxFuture<'a, Result<(), DelegateError>> {
        Box::pin(self.load(registrar))
    }

    fn commit(&self) -> LocalBoxFuture<'_, Result<bool, DelegateError>> {
        Box::pin(self.save())
    }

    fn dirty_check(&self, change: &PropertyChange) -> bool {
        if !self.snapshot_dirty.get() {
            return true;
        }
        let _ = change;
        self.person().is_some_and(|person| person.name() != self.seed.0)
    }
}

/// A controller over `form` on a fresh pool, not yet initialized.
pub fn controller(form: PersonForm, config: ControllerConfig) -> (LocalPool, FormController<PersonForm>) {
    let pool = LocalPool::new();
    let controller = FormController::with_config(form, pool.spawner(), config);
    (pool, controller)
}

/// A controller that has initialized and settled every evaluation.
pub fn initialized(form: PersonForm, config: ControllerConfig) -> (LocalPool, FormController<PersonForm>) {
    let (mut pool, controller) = controller(form, config);
    pool.run_until(controller.initialize())
        .expect("initialize succeeds");
    pool.run_until_stalled();
    (pool, controller)
}

pub fn person_of(controller: &FormController<PersonForm>) -> Rc<Person> {
    controller.form().person().expect("form has a person")
}
