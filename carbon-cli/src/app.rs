use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use carbon_core::{
    Controller, ControllerError, EstimatorRegistry, MockEstimatorFactory, Phase, WizardEvent,
    WizardRuntime,
};
use carbon_estimator_gemini::GeminiEstimatorFactory;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::input::{Command, HELP, Input, field_value, parse_line};
use crate::render::{
    render_field_prompt, render_notice, render_phase_hint, render_result, render_step,
};

/// Every estimator backend this binary knows about.
pub fn build_registry() -> EstimatorRegistry {
    let mut registry = EstimatorRegistry::new();
    registry.register(Box::new(MockEstimatorFactory));
    registry.register(Box::new(GeminiEstimatorFactory));
    registry
}

/// Resolves the questionnaire and estimator from `config` and wires them
/// into a runtime.
pub async fn build_runtime(config: &AppConfig) -> Result<WizardRuntime> {
    let schema = config
        .questions
        .schema()
        .context("Failed to load questionnaire")?;

    let estimator = build_registry()
        .create(&config.estimator)
        .await
        .with_context(|| format!("Failed to create '{}' estimator", config.estimator.backend))?;
    info!(
        estimator = estimator.name(),
        steps = schema.step_count(),
        "questionnaire ready"
    );

    Ok(WizardRuntime::new(
        Controller::new(Arc::new(schema)),
        Arc::from(estimator),
        config.estimator.timeout(),
    ))
}

/// How the interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    EndOfInput,
}

/// Lines typed by the user. Lines that arrive while an estimate is running
/// and are not commands are held back for the next prompt.
struct LineSource<R> {
    lines: Lines<R>,
    held: VecDeque<String>,
    closed: bool,
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            held: VecDeque::new(),
            closed: false,
        }
    }

    async fn next(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.held.pop_front() {
            return Ok(Some(line));
        }
        self.fresh().await
    }

    /// Reads past anything held back. Cancel-safe.
    async fn fresh(&mut self) -> Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        let line = self.lines.next_line().await.context("Failed to read input")?;
        if line.is_none() {
            self.closed = true;
        }
        Ok(line)
    }
}

enum Waited {
    Estimate,
    Line(Option<String>),
}

/// Runs the questionnaire until the user quits or input ends.
///
/// Each field of the current step is prompted in turn and recorded with
/// [`WizardEvent::FieldChanged`]; after the last field the step is
/// submitted with [`WizardEvent::Next`]. While an estimate is running the
/// user can still type `:reset` or `:quit`.
pub async fn run_interactive<R, W>(
    runtime: &mut WizardRuntime,
    input: R,
    out: &mut W,
) -> Result<Exit>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut source = LineSource::new(input);

    loop {
        match runtime.controller().phase() {
            Phase::Collecting { .. } => {
                if let Some(exit) = collect_step(runtime, &mut source, out).await? {
                    return Ok(exit);
                }
            }
            Phase::Submitting => {
                if let Some(exit) = await_estimate(runtime, &mut source, out).await? {
                    return Ok(exit);
                }
            }
            Phase::Failed => {
                let view = runtime.controller().view()?;
                write!(out, "{}", render_step(&view))?;
                prompt(out, render_phase_hint(Phase::Failed))?;
                let Some(line) = source.next().await? else {
                    return Ok(Exit::EndOfInput);
                };
                match parse_line(&line) {
                    Ok(Input::Empty) => report(out, runtime.dispatch(WizardEvent::Next))?,
                    Ok(Input::Command(command)) => {
                        if let Some(exit) = run_command(runtime, command, out)? {
                            return Ok(exit);
                        }
                    }
                    Ok(Input::Text(_)) => writeln!(
                        out,
                        "{}",
                        render_notice("press Enter to try again or :reset to start over")
                    )?,
                    Err(e) => writeln!(out, "{}", render_notice(&e.to_string()))?,
                }
            }
            Phase::Completed => {
                let view = runtime.controller().view()?;
                if let Some(result) = view.result {
                    write!(out, "{}", render_result(result))?;
                }
                prompt(out, render_phase_hint(Phase::Completed))?;
                let Some(line) = source.next().await? else {
                    return Ok(Exit::EndOfInput);
                };
                match parse_line(&line) {
                    Ok(Input::Command(Command::Quit)) => return Ok(Exit::Quit),
                    Ok(Input::Command(Command::Help)) => writeln!(out, "{HELP}")?,
                    Ok(_) => {
                        debug!("calculating again");
                        runtime.dispatch(WizardEvent::ResetRequested)?;
                    }
                    Err(e) => writeln!(out, "{}", render_notice(&e.to_string()))?,
                }
            }
        }
    }
}

/// Prompts every field on the current step, then submits it. Returns early
/// (with `None`) when a command moved the session elsewhere.
async fn collect_step<R, W>(
    runtime: &mut WizardRuntime,
    source: &mut LineSource<R>,
    out: &mut W,
) -> Result<Option<Exit>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let view = runtime.controller().view()?;
    write!(out, "{}", render_step(&view))?;
    let generation = runtime.controller().generation();
    let step_index = view.step_index;
    let fields = view.step.fields.clone();

    for field in &fields {
        loop {
            let current = runtime.controller().state().answers().get(&field.name);
            write!(out, "{}", render_field_prompt(field, current))?;
            out.flush()?;

            let Some(line) = source.next().await? else {
                return Ok(Some(Exit::EndOfInput));
            };
            let value = match parse_line(&line) {
                Ok(Input::Empty) => break,
                Ok(Input::Text(text)) => text,
                Ok(Input::Command(command)) => {
                    if let Some(exit) = run_command(runtime, command, out)? {
                        return Ok(Some(exit));
                    }
                    let moved = runtime.controller().generation() != generation
                        || runtime.controller().state().current_step_index() != step_index;
                    if moved {
                        return Ok(None);
                    }
                    continue;
                }
                Err(e) => {
                    writeln!(out, "{}", render_notice(&e.to_string()))?;
                    continue;
                }
            };

            match field_value(field, &value) {
                Ok(value) => {
                    runtime.dispatch(WizardEvent::FieldChanged {
                        name: field.name.clone(),
                        value,
                    })?;
                    break;
                }
                Err(e) => writeln!(out, "{}", render_notice(&e.to_string()))?,
            }
        }
    }

    report(out, runtime.dispatch(WizardEvent::Next))?;
    Ok(None)
}

async fn await_estimate<R, W>(
    runtime: &mut WizardRuntime,
    source: &mut LineSource<R>,
    out: &mut W,
) -> Result<Option<Exit>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    prompt(out, render_phase_hint(Phase::Submitting))?;
    writeln!(out)?;

    loop {
        let waited = tokio::select! {
            completion = runtime.wait_for_estimate() => {
                if completion.is_none() {
                    anyhow::bail!("estimate was requested but never started");
                }
                Waited::Estimate
            }
            line = source.fresh(), if !source.closed => Waited::Line(line?),
        };

        match waited {
            Waited::Estimate => {
                if runtime.controller().phase() != Phase::Submitting {
                    return Ok(None);
                }
            }
            Waited::Line(None) => {}
            Waited::Line(Some(line)) => match parse_line(&line) {
                Ok(Input::Command(Command::Reset)) => {
                    runtime.dispatch(WizardEvent::ResetRequested)?;
                    writeln!(out, "Estimate cancelled.")?;
                    return Ok(None);
                }
                Ok(Input::Command(Command::Quit)) => return Ok(Some(Exit::Quit)),
                _ => source.held.push_back(line),
            },
        }
    }
}

/// Applies a navigation command. Returns the exit reason for `:quit`.
fn run_command<W: Write>(
    runtime: &mut WizardRuntime,
    command: Command,
    out: &mut W,
) -> Result<Option<Exit>> {
    match command {
        Command::Quit => return Ok(Some(Exit::Quit)),
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Back => report(out, runtime.dispatch(WizardEvent::Back))?,
        Command::Reset => {
            runtime.dispatch(WizardEvent::ResetRequested)?;
            writeln!(out, "Starting over.")?;
        }
    }
    Ok(None)
}

/// Shows controller rejections to the user instead of aborting the session.
/// Validation failures are skipped here; the next step header shows them.
fn report<T, W: Write>(
    out: &mut W,
    result: Result<T, ControllerError>,
) -> Result<()> {
    match result {
        Ok(_) | Err(ControllerError::Validation(_)) => Ok(()),
        Err(
            e @ (ControllerError::AlreadySubmitting
            | ControllerError::Completed
            | ControllerError::Failed
            | ControllerError::Wizard(_)),
        ) => {
            writeln!(out, "{}", render_notice(&e.to_string()))?;
            Ok(())
        }
        Err(e @ ControllerError::Schema(_)) => Err(e.into()),
    }
}

fn prompt<W: Write>(
    out: &mut W,
    hint: Option<&str>,
) -> Result<()> {
    if let Some(hint) = hint {
        writeln!(out, "{hint}")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::QuestionsConfig;

    #[test]
    fn registry_offers_mock_and_gemini() {
        assert_eq!(build_registry().available_backends(), vec!["gemini", "mock"]);
    }

    #[tokio::test]
    async fn runtime_uses_configured_question_set() {
        let config = AppConfig {
            questions: QuestionsConfig {
                set: "quick".to_string(),
                file: None,
            },
            ..AppConfig::default()
        };

        let runtime = build_runtime(&config).await.unwrap();

        assert_eq!(runtime.controller().state().schema().step_count(), 2);
    }

    #[tokio::test]
    async fn gemini_without_credential_fails_to_start() {
        let mut config = AppConfig::default();
        config.estimator.backend = "gemini".to_string();

        let Err(err) = build_runtime(&config).await else {
            panic!("gemini should need a credential");
        };

        assert!(format!("{err:#}").contains("no credential configured"));
    }

    #[tokio::test]
    async fn unknown_backend_lists_alternatives() {
        let mut config = AppConfig::default();
        config.estimator.backend = "oracle".to_string();

        let Err(err) = build_runtime(&config).await else {
            panic!("unknown backend should be rejected");
        };

        assert!(format!("{err:#}").contains("available"));
    }
}
