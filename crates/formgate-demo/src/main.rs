#![forbid(unsafe_code)]

//! Walk a person-editing form through initialize, edit, and apply.
//!
//! ```text
//! formgate-demo --name Cody --id 75
//! formgate-demo --name Bob --id 10          # apply is refused
//! formgate-demo --name Cody --id 75 --fail-commit "disk full"
//! RUST_LOG=formgate_core=debug formgate-demo --json
//! ```

mod person;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use formgate_core::{
    CommitOutcome, ConfigError, ControllerConfig, EvaluationOrder, FormController, FormError,
    Validatable,
};
use formgate_runtime::{Binding, BindingScope};
use futures::executor::LocalPool;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use person::PersonForm;

#[derive(Parser, Debug)]
#[command(name = "formgate-demo")]
#[command(about = "Edit a person through the formgate lifecycle", long_about = None)]
struct Cli {
    /// Name to enter (the rules accept only "Cody")
    #[arg(long, default_value = "")]
    name: String,

    /// Id to enter (the rules accept 51..=99)
    #[arg(long, default_value_t = 0)]
    id: i64,

    /// Make the commit fail with this message
    #[arg(long, value_name = "MESSAGE")]
    fail_commit: Option<String>,

    /// Abort superseded field evaluations
    #[arg(long)]
    latest_edit: bool,

    /// Controller policy file (.toml or .json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Form(#[from] FormError),
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<ControllerConfig, ConfigError> {
    let config = match &cli.config {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };
    Ok(if cli.latest_edit {
        config.with_evaluation_order(EvaluationOrder::LatestEdit)
    } else {
        config
    })
}

fn status_line(controller: &FormController<PersonForm>) -> Binding<String> {
    let (valid, dirty, busy, apply) = (
        controller.valid_signal(),
        controller.dirty_signal(),
        controller.busy_signal(),
        controller.can_apply_signal(),
    );
    Binding::new(move || {
        format!(
            "valid={} dirty={} busy={} can_apply={}",
            valid.get(),
            dirty.get(),
            busy.get(),
            apply.get()
        )
    })
}

fn print_errors(controller: &FormController<PersonForm>) {
    let Some(person) = controller.form().person() else {
        return;
    };
    let errors = person.entity().errors();
    for property in errors.properties() {
        for message in errors.errors(property).unwrap_or_default() {
            println!("  {property}: {message}");
        }
    }
}

fn run(cli: Cli) -> Result<bool, DemoError> {
    let config = load_config(&cli)?;
    debug!(?config, "controller config");

    let mut pool = LocalPool::new();
    let controller = FormController::with_config(
        PersonForm::new(cli.fail_commit.clone()),
        pool.spawner(),
        config,
    );

    let status = status_line(&controller);
    let mut scope = BindingScope::new();
    {
        let status = status.clone();
        scope.subscribe(&controller.can_apply_signal(), move |_| {
            println!("  [{}]", status.get());
        });
    }

    pool.run_until(controller.initialize())?;
    pool.run_until_stalled();
    println!("loaded:  {}", status.get());
    print_errors(&controller);

    if let Some(person) = controller.form().person() {
        person.set_name(&cli.name);
        person.set_id(cli.id);
    }
    pool.run_until_stalled();
    println!("edited:  {}", status.get());
    print_errors(&controller);

    if !controller.can_apply() {
        println!("apply unavailable");
        return Ok(false);
    }
    let committed = match pool.run_until(controller.apply())? {
        CommitOutcome::Committed => {
            println!("committed");
            true
        }
        CommitOutcome::Rejected | CommitOutcome::Failed(_) => {
            println!("commit failed: {}", controller.commit_error());
            false
        }
    };
    println!("final:   {}", status.get());
    scope.clear();
    Ok(committed)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json);
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!(error = %err, "demo failed");
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
