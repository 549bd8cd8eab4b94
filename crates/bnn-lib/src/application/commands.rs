//! Command execution handlers
//!
//! Every handler receives a [`CommandContext`] and reports through its
//! display provider. In `--json` mode each command emits exactly one JSON
//! document on stdout.

use crate::application::cli::{ConfigCommand, ModelArgs, SessionCommand};
use crate::application::context::CommandContext;
use crate::application::schema;
use crate::application::{CliConfig, Commands};
use crate::bnn::edit::{EditOptions, EditTurn, TurnInput, TurnOutcome};
use crate::bnn::image::{ImagePayload, ImageSource};
use crate::bnn::layers::{get_path, parse_assignment};
use crate::bnn::repl::InteractiveLoop;
use crate::bnn::store::Session;
use crate::primitives::{ConfigLayer, SessionError};
use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use toml::Table;
use tracing::warn;

/// Execute a parsed command line against a live context
pub async fn execute_command(config: CliConfig, context: &dyn CommandContext) -> Result<()> {
    let Some(command) = config.command else {
        let status = context.display().status();
        status.message(&format!("bnn {}", env!("CARGO_PKG_VERSION")));
        status.subtle("Run 'bnn --help' for usage information");
        return Ok(());
    };
    execute_command_with_context(command, context).await
}

/// Execute a specific command with a provided context (for testing)
pub async fn execute_command_with_context(
    command: Commands,
    context: &dyn CommandContext,
) -> Result<()> {
    match command {
        Commands::Generate { prompt, options } => handle_generate(context, &prompt, &options).await,
        Commands::Edit {
            prompt,
            image,
            session,
            continue_latest,
            interactive,
            options,
        } => {
            let target = match (image, session, continue_latest) {
                (Some(path), _, _) => EditTarget::NewFrom(path),
                (None, Some(id), _) => EditTarget::Session(id),
                (None, None, true) => EditTarget::Latest,
                (None, None, false) => {
                    bail!("Nothing to edit: pass --image <path>, --session <id> or --continue")
                }
            };
            handle_edit(context, &prompt, target, interactive, &options).await
        }
        Commands::Config { command } => match command {
            ConfigCommand::Get { key } => handle_config_get(context, &key),
            ConfigCommand::List => handle_config_list(context),
            ConfigCommand::Set { assignments, layer } => {
                handle_config_set(context, &assignments, layer.layer())
            }
            ConfigCommand::Unset { keys, layer } => {
                handle_config_unset(context, &keys, layer.layer())
            }
            ConfigCommand::Init { layer } => handle_config_init(context, layer.layer()),
            ConfigCommand::Import { file, layer } => {
                handle_config_import(context, &file, layer.layer())
            }
            ConfigCommand::Path => handle_config_path(context),
        },
        Commands::Session { command } => match command {
            SessionCommand::List => handle_session_list(context),
            SessionCommand::Show { id } => handle_session_show(context, &id),
            SessionCommand::Delete { id } => handle_session_delete(context, &id),
            SessionCommand::Clear => handle_session_clear(context),
            SessionCommand::Prune { keep } => handle_session_prune(context, keep),
        },
    }
}

// ===== IMAGE COMMANDS =====

/// Which session an `edit` works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    /// Start a new session from this image
    NewFrom(PathBuf),
    /// Continue the session with this id
    Session(String),
    /// Continue the most recently updated session
    Latest,
}

fn edit_options(
    context: &dyn CommandContext,
    options: &ModelArgs,
    model: String,
) -> Result<EditOptions> {
    let config = context.config();
    let reference_images = options
        .references
        .iter()
        .map(|path| ImagePayload::from_path(path))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load reference image")?;

    Ok(EditOptions {
        model,
        resolution: options.resolution.unwrap_or(config.output.resolution),
        aspect_ratio: options.aspect_ratio.unwrap_or(config.output.aspect_ratio),
        thinking: options.thinking.unwrap_or(config.model.thinking),
        reference_images,
    })
}

async fn run_turn(
    context: &dyn CommandContext,
    turn: &EditTurn<'_>,
    session_id: &str,
    prompt: &str,
    input: TurnInput,
    output: Option<&Path>,
) -> Result<TurnOutcome> {
    let message = match input {
        TurnInput::Generate => "Generating image...",
        TurnInput::Continue => "Editing image...",
    };
    let spinner = context.display().progress().spinner(message);
    match turn.run(session_id, prompt, input, output).await {
        Ok(outcome) => {
            spinner.finish_clear();
            Ok(outcome)
        }
        Err(e) => {
            spinner.abandon("Image request failed");
            Err(e)
        }
    }
}

fn report_outcome(context: &dyn CommandContext, outcome: &TurnOutcome) {
    if context.flags().json {
        context.display().table().json(&json!({
            "session_id": outcome.session.id,
            "output": outcome.output.display().to_string(),
            "model": outcome.session.model,
            "history_count": outcome.session.history.len(),
            "text": outcome.response.text,
            "width": outcome.response.width,
            "height": outcome.response.height,
            "sources": outcome.response.sources,
        }));
        return;
    }

    let status = context.display().status();
    let size = match (outcome.response.width, outcome.response.height) {
        (Some(width), Some(height)) => format!(" ({width}x{height})"),
        _ => String::new(),
    };
    status.success("Saved", &format!("{}{size}", outcome.output.display()));
    status.subtle(&format!(
        "Session {} · {} edit(s) · continue with: bnn edit \"...\" --session {}",
        outcome.session.id,
        outcome.session.history.len(),
        outcome.session.id
    ));
    if let Some(text) = &outcome.response.text {
        status.message(text);
    }
    if !outcome.response.sources.is_empty() {
        let sources: Vec<&str> = outcome.response.sources.iter().map(String::as_str).collect();
        status.section("Sources");
        status.list(&sources);
    }
}

/// Drop a session created by this invocation whose first turn failed
fn discard_new_session(context: &dyn CommandContext, id: &str) {
    if let Err(e) = context.store().delete(id) {
        warn!(id, error = %e, "Failed to remove empty session");
    }
}

async fn handle_generate(
    context: &dyn CommandContext,
    prompt: &str,
    options: &ModelArgs,
) -> Result<()> {
    let model = options
        .model
        .clone()
        .unwrap_or_else(|| context.config().model.default.clone());
    let settings = edit_options(context, options, model)?;

    let session = context.store().create(&settings.model, None)?;
    let turn = EditTurn::new(context.store(), context.editor(), context.namer(), settings);
    let outcome = run_turn(
        context,
        &turn,
        &session.id,
        prompt,
        TurnInput::Generate,
        options.output.as_deref(),
    )
    .await
    .inspect_err(|_| discard_new_session(context, &session.id))?;

    report_outcome(context, &outcome);
    Ok(())
}

async fn handle_edit(
    context: &dyn CommandContext,
    prompt: &str,
    target: EditTarget,
    interactive: bool,
    options: &ModelArgs,
) -> Result<()> {
    if interactive && context.flags().json {
        bail!("--interactive cannot be combined with --json");
    }

    let created = matches!(target, EditTarget::NewFrom(_));
    let session = match target {
        EditTarget::NewFrom(path) => {
            let payload = ImagePayload::from_path(&path)?;
            let model = options
                .model
                .clone()
                .unwrap_or_else(|| context.config().model.default.clone());
            context
                .store()
                .create(&model, Some(ImageSource::Embedded(payload)))?
        }
        EditTarget::Session(id) => context
            .store()
            .get(&id)
            .ok_or(SessionError::NotFound { id })?,
        EditTarget::Latest => {
            let latest = context
                .store()
                .latest()?
                .ok_or_else(|| SessionError::NotFound {
                    id: "latest".to_string(),
                })?;
            context
                .store()
                .get(&latest.id)
                .ok_or(SessionError::NotFound { id: latest.id })?
        }
    };

    // a continued session keeps its model unless overridden
    let model = options.model.clone().unwrap_or_else(|| session.model.clone());
    let settings = edit_options(context, options, model)?;
    let turn = EditTurn::new(context.store(), context.editor(), context.namer(), settings);
    let outcome = run_turn(
        context,
        &turn,
        &session.id,
        prompt,
        TurnInput::Continue,
        options.output.as_deref(),
    )
    .await
    .inspect_err(|_| {
        if created {
            discard_new_session(context, &session.id);
        }
    })?;
    report_outcome(context, &outcome);

    if interactive {
        let mut repl =
            InteractiveLoop::new(&turn, context.display(), &session.id, Some(outcome.output));
        let summary = repl
            .run(context.input().lines(), context.input().prompt_echo())
            .await?;
        context.display().status().info(&format!(
            "{} edit(s) this run, {} failed",
            summary.turns, summary.failures
        ));
    }
    Ok(())
}

// ===== CONFIG COMMANDS =====

fn toml_to_json(value: &toml::Value) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn render_toml(value: &toml::Value) -> String {
    match value {
        toml::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Dotted `key = value` pairs in document order
fn flatten(table: &Table, prefix: &str, out: &mut Vec<(String, String)>) {
    for (key, value) in table {
        let dotted = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten(inner, &dotted, out),
            other => out.push((dotted, render_toml(other))),
        }
    }
}

fn handle_config_get(context: &dyn CommandContext, key: &str) -> Result<()> {
    schema::require_field(key)?;
    let table = context.config().to_redacted_table()?;
    let value = get_path(&table, key);

    if context.flags().json {
        context.display().table().json(&json!({
            "key": key,
            "value": value.map(toml_to_json),
        }));
        return Ok(());
    }

    match value {
        Some(value) => context.display().status().message(&render_toml(value)),
        None => context.display().status().subtle("(not set)"),
    }
    Ok(())
}

fn handle_config_list(context: &dyn CommandContext) -> Result<()> {
    let table = context.config().to_redacted_table()?;

    if context.flags().json {
        context
            .display()
            .table()
            .json(&toml_to_json(&toml::Value::Table(table)));
        return Ok(());
    }

    let mut pairs = Vec::new();
    flatten(&table, "", &mut pairs);
    if !pairs.iter().any(|(key, _)| key == "api.key") {
        pairs.insert(0, ("api.key".to_string(), "(not set)".to_string()));
    }
    let borrowed: Vec<(&str, String)> = pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value.clone()))
        .collect();
    context.display().table().properties(&borrowed);
    Ok(())
}

fn handle_config_set(
    context: &dyn CommandContext,
    assignments: &[String],
    layer: ConfigLayer,
) -> Result<()> {
    let updates = assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut secret_input = context.input().secret_input();
    let path = context
        .mutator()
        .set_many(layer, &updates, secret_input.as_mut())?;

    let keys: Vec<&str> = updates.iter().map(|(key, _)| key.as_str()).collect();
    if context.flags().json {
        context.display().table().json(&json!({
            "layer": layer.to_string(),
            "path": path.display().to_string(),
            "keys": keys,
        }));
    } else {
        context.display().status().success(
            &format!("Updated {layer} configuration"),
            &path.display().to_string(),
        );
        context.display().status().list(&keys);
    }
    Ok(())
}

fn handle_config_unset(
    context: &dyn CommandContext,
    keys: &[String],
    layer: ConfigLayer,
) -> Result<()> {
    let removed = context.mutator().unset_many(layer, keys)?;
    let path = context.mutator().path(layer)?;

    if context.flags().json {
        context.display().table().json(&json!({
            "layer": layer.to_string(),
            "path": path.display().to_string(),
            "removed": removed,
        }));
    } else if removed == 0 {
        context
            .display()
            .status()
            .info(&format!("No matching keys in {layer} configuration"));
    } else {
        context.display().status().success(
            &format!("Removed {removed} key(s) from {layer} configuration"),
            &path.display().to_string(),
        );
    }
    Ok(())
}

fn handle_config_init(context: &dyn CommandContext, layer: ConfigLayer) -> Result<()> {
    let path = context.mutator().init_layer(layer)?;
    if context.flags().json {
        context.display().table().json(&json!({
            "layer": layer.to_string(),
            "path": path.display().to_string(),
        }));
    } else {
        context.display().status().success(
            &format!("Created {layer} configuration"),
            &path.display().to_string(),
        );
    }
    Ok(())
}

fn handle_config_import(context: &dyn CommandContext, file: &Path, layer: ConfigLayer) -> Result<()> {
    let payload = fs::read_to_string(file)
        .with_context(|| format!("Failed to read '{}'", file.display()))?;
    let path = context.mutator().import_document(&payload, layer)?;

    if context.flags().json {
        context.display().table().json(&json!({
            "layer": layer.to_string(),
            "path": path.display().to_string(),
        }));
    } else {
        context.display().status().success(
            &format!("Imported {} into {layer} configuration", file.display()),
            &path.display().to_string(),
        );
    }
    Ok(())
}

fn handle_config_path(context: &dyn CommandContext) -> Result<()> {
    let mut entries: Vec<(String, Option<PathBuf>)> = [ConfigLayer::Global, ConfigLayer::Project]
        .into_iter()
        .map(|layer| (layer.to_string(), context.config_paths().layer_path(layer).ok()))
        .collect();
    entries.push((
        "sessions".to_string(),
        Some(context.store().directory().to_path_buf()),
    ));

    if context.flags().json {
        let documents: Vec<Value> = entries
            .iter()
            .map(|(name, path)| {
                json!({
                    "name": name,
                    "path": path.as_ref().map(|p| p.display().to_string()),
                    "exists": path.as_ref().is_some_and(|p| p.exists()),
                })
            })
            .collect();
        context.display().table().json(&Value::Array(documents));
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|(name, path)| {
            let (shown, exists) = match path {
                Some(path) => (path.display().to_string(), path.exists()),
                None => ("(unavailable)".to_string(), false),
            };
            vec![name.clone(), shown, if exists { "yes" } else { "no" }.to_string()]
        })
        .collect();
    context.display().table().table(&["Layer", "Path", "Exists"], &rows);
    Ok(())
}

// ===== SESSION COMMANDS =====

fn handle_session_list(context: &dyn CommandContext) -> Result<()> {
    let summaries = context.store().list()?;

    if context.flags().json {
        context
            .display()
            .table()
            .json(&serde_json::to_value(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        context.display().status().info("No sessions");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|summary| {
            vec![
                summary.id.clone(),
                summary.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                summary.history_count.to_string(),
                summary.model.clone(),
                summary.last_prompt.clone().unwrap_or_default(),
            ]
        })
        .collect();
    context
        .display()
        .table()
        .table(&["ID", "Updated", "Edits", "Model", "Last prompt"], &rows);
    Ok(())
}

fn input_label(session: &Session) -> String {
    match &session.input_image {
        Some(ImageSource::Path { path }) => path.display().to_string(),
        Some(ImageSource::Embedded(payload)) => format!("embedded {}", payload.mime_type),
        None => "(none)".to_string(),
    }
}

fn handle_session_show(context: &dyn CommandContext, id: &str) -> Result<()> {
    let session = context.store().get(id).ok_or_else(|| SessionError::NotFound {
        id: id.to_string(),
    })?;

    if context.flags().json {
        let history: Vec<Value> = session
            .history
            .iter()
            .map(|entry| {
                json!({
                    "prompt": entry.prompt,
                    "output": entry.output.display().to_string(),
                    "timestamp": entry.timestamp,
                })
            })
            .collect();
        context.display().table().json(&json!({
            "id": session.id,
            "created_at": session.created_at,
            "updated_at": session.updated_at,
            "model": session.model,
            "input_image": input_label(&session),
            "history": history,
        }));
        return Ok(());
    }

    context.display().table().properties(&[
        ("id", session.id.clone()),
        ("model", session.model.clone()),
        ("created", session.created_at.to_rfc3339()),
        ("updated", session.updated_at.to_rfc3339()),
        ("input", input_label(&session)),
    ]);
    if session.history.is_empty() {
        context.display().status().subtle("No edits yet");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = session
        .history
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            vec![
                (index + 1).to_string(),
                entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.prompt.clone(),
                entry.output.display().to_string(),
            ]
        })
        .collect();
    context
        .display()
        .table()
        .table(&["#", "When", "Prompt", "Output"], &rows);
    Ok(())
}

fn handle_session_delete(context: &dyn CommandContext, id: &str) -> Result<()> {
    if !context.store().delete(id)? {
        return Err(SessionError::NotFound { id: id.to_string() }.into());
    }
    if context.flags().json {
        context
            .display()
            .table()
            .json(&json!({ "deleted": id }));
    } else {
        context.display().status().success("Deleted session", id);
    }
    Ok(())
}

fn handle_session_clear(context: &dyn CommandContext) -> Result<()> {
    // every record file, unreadable ones included
    let count = context.store().record_count()?;
    if count > 0 && !context.flags().yes {
        let question = format!("Delete all {count} session(s)?");
        if !context.display().prompt().confirm(&question) {
            context.display().status().info("Cancelled");
            if context.flags().json {
                context
                    .display()
                    .table()
                    .json(&json!({ "removed": 0, "cancelled": true }));
            }
            return Ok(());
        }
    }

    let removed = context.store().clear()?;
    if context.flags().json {
        context
            .display()
            .table()
            .json(&json!({ "removed": removed, "cancelled": false }));
    } else {
        context
            .display()
            .status()
            .success("Cleared sessions", &format!("{removed} removed"));
    }
    Ok(())
}

fn handle_session_prune(context: &dyn CommandContext, keep: Option<usize>) -> Result<()> {
    let keep = keep.unwrap_or_else(|| context.store().max_history());
    if keep == 0 {
        bail!("--keep must be at least 1; use 'bnn session clear' to delete everything");
    }

    let removed = context.store().prune(keep)?;
    if context.flags().json {
        context
            .display()
            .table()
            .json(&json!({ "kept": keep, "removed": removed }));
    } else {
        context.display().status().success(
            "Pruned sessions",
            &format!("{removed} removed, keeping the {keep} most recent"),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("commands.test.rs");
}
