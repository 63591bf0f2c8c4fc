//! Multi-step form driver for the terminal.
//!
//! Runs the form declared in `.wizard/form.toml` against a JSON-file session
//! (`.wizard/session.json`), one step per `wizard next` invocation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use wizard::core::fields::{Field, FieldData, FieldKind, parse_assignments};
use wizard::definition::{default_definition, load_definition, write_definition};
use wizard::exit_codes;
use wizard::form::Submission;
use wizard::io::config::{WizardConfig, load_config, write_config};
use wizard::io::file_session::FileSession;
use wizard::{FormStep, MultiStepForm, StepOutcome, logging};

#[derive(Parser)]
#[command(name = "wizard", version, about = "Session-backed multi-step form runner")]
struct Cli {
    /// Directory holding form.toml, config.toml and the session.
    #[arg(long, global = true, default_value = ".wizard")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a sample form.toml and config.toml if missing.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Show the current step with its fields, values and actions.
    Show {
        /// Show this step instead (only if already reached).
        #[arg(long)]
        step: Option<u32>,
    },
    /// Print the step navigation list as JSON.
    Steps,
    /// Submit `key=value` pairs for the current step.
    Next {
        /// Resubmit this step instead (only if already reached).
        #[arg(long)]
        step: Option<u32>,
        /// Field values, e.g. `email=ada@example.com`.
        values: Vec<String>,
    },
    /// Go back one step.
    Prev {
        /// Step back from this step instead (only if already reached).
        #[arg(long)]
        step: Option<u32>,
    },
    /// Jump to an already reached step.
    Goto { step: u32 },
    /// Print submitted data as JSON.
    Data {
        /// One entry per step instead of a merged map.
        #[arg(long, conflicts_with = "tabs")]
        by_step: bool,
        /// Every step's fields, read-only, filled with the merged data.
        #[arg(long)]
        tabs: bool,
    },
    /// Forget every submitted value and the current position.
    Reset,
}

/// Files of one wizard directory.
struct WizardPaths {
    form: PathBuf,
    config: PathBuf,
    session: PathBuf,
    completed: PathBuf,
}

impl WizardPaths {
    fn new(dir: &Path) -> Self {
        Self {
            form: dir.join("form.toml"),
            config: dir.join("config.toml"),
            session: dir.join("session.json"),
            completed: dir.join("completed.json"),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let paths = WizardPaths::new(&cli.dir);
    match cli.command {
        Command::Init { force } => cmd_init(&paths, force),
        Command::Show { step } => cmd_show(&paths, step),
        Command::Steps => cmd_steps(&paths),
        Command::Next { step, values } => cmd_next(&paths, step, &values),
        Command::Prev { step } => cmd_prev(&paths, step),
        Command::Goto { step } => cmd_goto(&paths, step),
        Command::Data { by_step, tabs } => cmd_data(&paths, by_step, tabs),
        Command::Reset => cmd_reset(&paths),
    }
}

fn cmd_init(paths: &WizardPaths, force: bool) -> Result<i32> {
    if force || !paths.form.exists() {
        write_definition(&paths.form, &default_definition())?;
    }
    if force || !paths.config.exists() {
        write_config(&paths.config, &WizardConfig::default())?;
    }
    info!(form = %paths.form.display(), "wizard initialized");
    Ok(exit_codes::OK)
}

fn cmd_show(paths: &WizardPaths, requested: Option<u32>) -> Result<i32> {
    let form = load_form(paths)?;
    let session = FileSession::open(&paths.session)?;
    let n = form.current_step(&session, requested)?;
    let step = form.step(n)?;
    let values = form.form_data(&session, n)?;

    println!("Step {}/{}: {}", n, form.step_count(), step.title());
    let mut lines = Vec::new();
    render_fields(&step.build_fields(), &values, 1, &mut lines);
    for line in lines {
        println!("{line}");
    }
    let actions: Vec<String> = form
        .actions(n)
        .iter()
        .map(|action| format!("[{}]", action.title))
        .collect();
    println!("actions: {}", actions.join(" "));
    println!("posts to: {}", form.form_action(n));
    Ok(exit_codes::OK)
}

fn cmd_steps(paths: &WizardPaths) -> Result<i32> {
    let form = load_form(paths)?;
    let session = FileSession::open(&paths.session)?;
    print_json(&form.all_steps(&session)?)?;
    Ok(exit_codes::OK)
}

fn cmd_next(paths: &WizardPaths, requested: Option<u32>, values: &[String]) -> Result<i32> {
    let form = load_form(paths)?;
    let mut session = FileSession::open(&paths.session)?;
    let data = parse_assignments(values).map_err(|err| anyhow!(err))?;
    let outcome = form.do_next(&mut session, requested, data)?;
    print_json(&outcome)?;
    Ok(match outcome {
        StepOutcome::Advanced { .. } => exit_codes::OK,
        StepOutcome::Rejected { .. } => exit_codes::REJECTED,
        StepOutcome::Completed { .. } => exit_codes::COMPLETE,
    })
}

fn cmd_prev(paths: &WizardPaths, requested: Option<u32>) -> Result<i32> {
    let form = load_form(paths)?;
    let mut session = FileSession::open(&paths.session)?;
    let current = form.do_prev(&mut session, requested)?;
    println!("{current}");
    Ok(exit_codes::OK)
}

fn cmd_goto(paths: &WizardPaths, step: u32) -> Result<i32> {
    let form = load_form(paths)?;
    let mut session = FileSession::open(&paths.session)?;
    form.goto_step(&mut session, step)?;
    println!("{}", form.current_step(&session, None)?);
    Ok(exit_codes::OK)
}

fn cmd_data(paths: &WizardPaths, by_step: bool, tabs: bool) -> Result<i32> {
    let form = load_form(paths)?;
    let session = FileSession::open(&paths.session)?;
    if by_step {
        let entries: Vec<StepEntry> = form
            .data_by_step(&session)?
            .into_iter()
            .map(|(step, fields)| StepEntry { step, fields })
            .collect();
        print_json(&entries)?;
    } else if tabs {
        print_json(&form.tabbed_fields(&form.merged_data(&session)?))?;
    } else {
        print_json(&form.merged_data(&session)?)?;
    }
    Ok(exit_codes::OK)
}

fn cmd_reset(paths: &WizardPaths) -> Result<i32> {
    let form = load_form(paths)?;
    let mut session = FileSession::open(&paths.session)?;
    form.clear_all(&mut session)?;
    Ok(exit_codes::OK)
}

#[derive(Serialize)]
struct StepEntry {
    step: u32,
    fields: FieldData,
}

/// Build the form from `form.toml` + `config.toml`, completing into
/// `completed.json`.
fn load_form(paths: &WizardPaths) -> Result<MultiStepForm> {
    let definition = load_definition(&paths.form)
        .context("load form (run `wizard init` first)")?;
    let config = load_config(&paths.config)?;
    let completed = paths.completed.clone();
    let form = definition
        .builder()
        .config(config)
        .on_complete(move |submission: &Submission| write_json(&completed, submission))
        .build()?;
    Ok(form)
}

fn render_fields(fields: &[Field], values: &FieldData, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for field in fields {
        let marker = if field.required { "*" } else { "" };
        if field.kind == FieldKind::Group {
            lines.push(format!("{indent}{}:", field.display_label()));
            render_fields(&field.children, values, depth + 1, lines);
            continue;
        }
        let value = values.get(&field.name).map(Value::to_string).unwrap_or_default();
        lines.push(format!(
            "{indent}{}{marker} ({}): {value}",
            field.display_label(),
            field.name
        ));
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize json")?);
    Ok(())
}

/// Serialize `value` to pretty-printed JSON with trailing newline.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
