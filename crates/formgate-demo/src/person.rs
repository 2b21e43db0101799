//! The person-editing form driven by the demo.

use std::cell::RefCell;
use std::future;
use std::rc::Rc;

use formgate_core::{
    DelegateError, EntityState, EvaluationError, FormDelegate, Registrar, RuleEvaluator,
    Validatable, ValidationReport,
};
use futures::future::LocalBoxFuture;
use tracing::info;

pub struct Person {
    state: EntityState,
    name: RefCell<String>,
    id: RefCell<i64>,
}

impl Person {
    pub fn new() -> Self {
        Self {
            state: EntityState::new(&["name", "id"]),
            name: RefCell::new(String::new()),
            id: RefCell::new(0),
        }
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn id(&self) -> i64 {
        *self.id.borrow()
    }

    pub fn set_name(&self, name: &str) {
        self.state.assign(&self.name, name.to_string(), "name");
    }

    pub fn set_id(&self, id: i64) {
        self.state.assign(&self.id, id, "id");
    }
}

impl Default for Person {
    fn default() -> Self {
        Self::new()
    }
}

impl Validatable for Person {
    fn entity(&self) -> &EntityState {
        &self.state
    }
}

/// Person rules: the name must be "Cody" and the id strictly between 50 and
/// 100.
pub fn check_person(name: &str, id: i64, property: Option<&str>) -> ValidationReport {
    let mut report = ValidationReport::valid();
    if property.is_none_or(|p| p == "name") && name != "Cody" {
        report.push("name", "Name must be Cody");
    }
    if property.is_none_or(|p| p == "id") && !(id > 50 && id < 100) {
        report.push("id", "Id must be between 50 and 100");
    }
    report
}

pub struct UserValidator;

impl RuleEvaluator<Person> for UserValidator {
    fn properties(&self) -> &[&'static str] {
        &["name", "id"]
    }

    fn evaluate<'a>(
        &'a self,
        person: &'a Person,
        property: Option<&'a str>,
    ) -> LocalBoxFuture<'a, Result<ValidationReport, EvaluationError>> {
        let result: Result<ValidationReport, EvaluationError> =
            Ok(check_person(&person.name(), person.id(), property));
        Box::pin(future::ready(result))
    }
}

/// Form-level rule: a person must be loaded.
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
            report.push("person", "A person is required");
        }
        let result: Result<ValidationReport, EvaluationError> = Ok(report);
        Box::pin(future::ready(result))
    }
}

pub struct PersonForm {
    state: EntityState,
    person: RefCell<Option<Rc<Person>>>,
    commit_failure: Option<String>,
}

impl PersonForm {
    /// A form whose commits fail with `commit_failure`, if given.
    pub fn new(commit_failure: Option<String>) -> Self {
        Self {
            state: EntityState::new(&["person"]),
            person: RefCell::new(None),
            commit_failure,
        }
    }

    pub fn person(&self) -> Option<Rc<Person>> {
        self.person.borrow().clone()
    }

    async fn load(&self, registrar: &Registrar<Self>) -> Result<(), DelegateError> {
        let person = Rc::new(Person::new());
        *self.person.borrow_mut() = Some(Rc::clone(&person));
        self.state.field_changed("person");

        registrar.register_root(PersonFormValidator)?;
        registrar.register(&person, UserValidator)?;
        Ok(())
    }

    async fn save(&self) -> Result<bool, DelegateError> {
        if let Some(message) = &self.commit_failure {
            return Err(message.clone().into());
        }
        if let Some(person) = self.person() {
            info!(name = %person.name(), id = person.id(), "person saved");
        }
        Ok(true)
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
}
