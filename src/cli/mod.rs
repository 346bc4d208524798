//! CLI command handling
//!
//! Dispatches CLI commands against the remote sandbox and formats output.
//! This layer owns everything the original system kept in its UI shell:
//! confirmation dialogs become stdin prompts, inline validation errors go to
//! stderr with the operator's text echoed back, and navigation context is
//! just the subcommand arguments.

use std::io::Write as _;
use std::sync::Arc;

use colored::Colorize;
use serde_json::Value;

use crate::commands::{Commands, ConfigCommands};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::exec::{PollSettings, ScenarioController};
use crate::model::{
    any_scenario_running, start_allowed, stop_allowed, ModuleDigest, SandboxConfig,
    SandboxConfigDraft, ScenarioDigest,
};
use crate::rpc::{Anonymous, AuthState, ConformanceApi, HttpGateway, IdentityProvider, StaticToken};

/// Build the typed API facade from the loaded configuration
fn build_api(config: &Config) -> ConformanceApi {
    let token = config.token();
    let auth = Arc::new(AuthState::new(token.is_some()));

    // warn the operator once when the sandbox starts rejecting credentials
    let mut auth_changes = auth.subscribe();
    tokio::spawn(async move {
        while auth_changes.changed().await.is_ok() {
            if !*auth_changes.borrow() {
                tracing::warn!("the sandbox rejected the identity token");
            }
        }
    });

    let identity: Arc<dyn IdentityProvider> = match token {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => Arc::new(Anonymous),
    };
    let gateway = HttpGateway::new(config.endpoint.api_url.clone(), identity, auth);
    ConformanceApi::new(Arc::new(gateway))
}

fn build_controller(
    config: &Config,
    sandbox_id: &str,
    scenario_id: &str,
) -> ScenarioController {
    let mut controller = ScenarioController::new(
        build_api(config),
        sandbox_id,
        scenario_id,
        PollSettings::from_config(&config.polling),
    );
    // surface waiting entries live while the poller runs
    controller.set_waiting_observer(|entries| {
        for entry in entries {
            eprintln!("  {} {}", "waiting:".yellow(), entry);
        }
    });
    controller
}

/// Ask the operator to confirm a destructive action, naming the consequence
fn confirm(question: &str, yes: bool) -> Result<()> {
    if yes {
        return Ok(());
    }
    eprint!("{} [y/N] ", question);
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    if answer.trim().eq_ignore_ascii_case("y") {
        Ok(())
    } else {
        Err(Error::Aborted)
    }
}

/// Read one line from stdin
fn read_line() -> Result<String> {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read lines until a blank line; empty input keeps `seed`
fn read_block(seed: &str) -> Result<String> {
    let mut lines = Vec::new();
    loop {
        let line = read_line()?;
        if line.is_empty() {
            break;
        }
        lines.push(line);
    }
    if lines.is_empty() {
        Ok(seed.to_string())
    } else {
        Ok(lines.join("\n"))
    }
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Sandboxes => {
            let api = build_api(config);
            let sandboxes = api.get_all_sandboxes().await?;
            if sandboxes.is_empty() {
                println!("No sandboxes");
                return Ok(());
            }
            for sandbox in sandboxes {
                println!("{}  {}", sandbox.id.dimmed(), sandbox.name.bold());
            }
            Ok(())
        }

        Commands::Scenarios { sandbox_id } => {
            let api = build_api(config);
            let sandbox = api.get_sandbox(&sandbox_id).await?;
            println!("{}", sandbox.name.bold());
            let modules = api.get_scenario_digests(&sandbox_id).await?;
            print_module_listing(&modules);
            Ok(())
        }

        Commands::Start {
            sandbox_id,
            scenario_id,
            yes,
        } => {
            let api = build_api(config);
            let modules = api.get_scenario_digests(&sandbox_id).await?;
            if !start_allowed(&modules, &scenario_id) {
                if any_scenario_running(&modules) {
                    // the server is still the authority; we just refuse the
                    // obviously-rejected request up front
                    return Err(Error::ScenarioRunning);
                }
                return Err(Error::operation(
                    "startOrStopScenario",
                    &format!("no scenario '{scenario_id}' in sandbox '{sandbox_id}'"),
                ));
            }
            if let Some(digest) = find_scenario(&modules, &scenario_id) {
                if digest.conformance_status.has_traffic() {
                    confirm(
                        "Restarting discards this scenario's traffic irreversibly. Restart?",
                        yes,
                    )?;
                }
            }
            api.start_or_stop_scenario(&sandbox_id, &scenario_id).await?;
            println!("Scenario started. Use 'conformance run {sandbox_id} {scenario_id}' to drive it.");
            Ok(())
        }

        Commands::Stop {
            sandbox_id,
            scenario_id,
            yes,
        } => {
            let api = build_api(config);
            let modules = api.get_scenario_digests(&sandbox_id).await?;
            if !stop_allowed(&modules, &scenario_id) {
                return Err(Error::operation(
                    "startOrStopScenario",
                    &format!("scenario '{scenario_id}' is not running"),
                ));
            }
            confirm(
                "A stopped scenario cannot be resumed, only restarted. Stop?",
                yes,
            )?;
            api.start_or_stop_scenario(&sandbox_id, &scenario_id).await?;
            println!("Scenario stopped");
            Ok(())
        }

        Commands::Status {
            sandbox_id,
            scenario_id,
        } => {
            let mut controller = build_controller(config, &sandbox_id, &scenario_id);
            controller.activate().await?;
            print_scenario_status(&controller);
            Ok(())
        }

        Commands::Run {
            sandbox_id,
            scenario_id,
            yes,
        } => run_interactive(config, &sandbox_id, &scenario_id, yes).await,

        Commands::Submit {
            sandbox_id,
            scenario_id,
            input,
            file,
            no_input,
        } => {
            let mut controller = build_controller(config, &sandbox_id, &scenario_id);
            controller.activate().await?;

            let with_input = !no_input;
            if with_input {
                let text = match (input, file) {
                    (Some(text), _) => text,
                    (None, Some(path)) => {
                        std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
                            path: path.display().to_string(),
                            error: e.to_string(),
                        })?
                    }
                    // no explicit input: submit the pre-seeded buffer as-is
                    (None, None) => controller.input_buffer().to_string(),
                };
                controller.set_input_buffer(text);
            }

            match controller.submit(with_input).await {
                Ok(()) => {
                    println!("{}", "Action input submitted".green());
                    print_scenario_status(&controller);
                    Ok(())
                }
                Err(e @ Error::InvalidInput(_)) => {
                    // inline validation: echo the untouched text back for correction
                    eprintln!("{} {e}", "invalid input:".red());
                    eprintln!("{}", controller.input_buffer());
                    Err(e)
                }
                Err(e) => Err(e),
            }
        }

        Commands::Complete {
            sandbox_id,
            scenario_id,
            skip,
            yes,
        } => {
            let mut controller = build_controller(config, &sandbox_id, &scenario_id);
            controller.activate().await?;
            if controller.confirmation_required() {
                let verb = if skip { "Skip" } else { "Complete" };
                confirm(&format!("{verb} the current action?"), yes)?;
            }
            controller.complete(skip).await?;
            println!(
                "{}",
                if skip { "Action skipped".green() } else { "Action completed".green() }
            );
            print_scenario_status(&controller);
            Ok(())
        }

        Commands::Report {
            sandbox_id,
            scenario_id,
        } => {
            let api = build_api(config);
            let scenario = api.get_scenario(&sandbox_id, &scenario_id).await?;
            println!(
                "{} {} {}",
                scenario.conformance_status.glyph(),
                scenario.name.bold(),
                format!("[{}]", scenario.conformance_status.title()).dimmed()
            );
            let mut controller = build_controller(config, &sandbox_id, &scenario_id);
            controller.activate().await?;
            match controller.sub_report() {
                Some(report) => print!("{}", report.render()),
                None => println!("No conformance report yet"),
            }
            Ok(())
        }

        Commands::Exchanges {
            sandbox_id,
            scenario_id,
        } => {
            let api = build_api(config);
            let exchanges = api
                .get_current_action_exchanges(&sandbox_id, &scenario_id)
                .await?;
            println!("{}", render_exchanges(&exchanges));
            Ok(())
        }

        Commands::NotifyParty { sandbox_id } => {
            let api = build_api(config);
            require_party_actions(&api, &sandbox_id).await?;
            api.notify_party(&sandbox_id).await?;
            println!("Counterpart party notified");
            Ok(())
        }

        Commands::ResetParty { sandbox_id } => {
            let api = build_api(config);
            require_party_actions(&api, &sandbox_id).await?;
            api.reset_party(&sandbox_id).await?;
            println!("Counterpart party reset");
            Ok(())
        }

        Commands::Config(config_command) => match config_command {
            ConfigCommands::Get { sandbox_id } => {
                let api = build_api(config);
                let sandbox_config = api.get_sandbox_config(&sandbox_id).await?;
                println!("{}", serde_json::to_string_pretty(&sandbox_config)?);
                Ok(())
            }

            ConfigCommands::Update { sandbox_id, file } => {
                let api = build_api(config);
                let content =
                    std::fs::read_to_string(&file).map_err(|e| Error::FileRead {
                        path: file.display().to_string(),
                        error: e.to_string(),
                    })?;
                let updated: SandboxConfig = serde_json::from_str(&content)?;

                // copy-on-write: compare against the fetched original before
                // submitting anything
                let original = api.get_sandbox_config(&sandbox_id).await?;
                let mut draft = SandboxConfigDraft::new(original);
                draft.updated = updated;
                draft.validate()?;
                if !draft.can_update() {
                    println!("Configuration unchanged, nothing to update");
                    return Ok(());
                }
                api.update_sandbox_config(&draft.updated).await?;
                println!("{}", "Sandbox configuration updated".green());
                Ok(())
            }
        },
    }
}

/// Drive a scenario action by action until it stops needing the operator
async fn run_interactive(
    config: &Config,
    sandbox_id: &str,
    scenario_id: &str,
    yes: bool,
) -> Result<()> {
    let mut controller = build_controller(config, sandbox_id, scenario_id);
    controller.activate().await?;

    loop {
        let Some(status) = controller.status().cloned() else {
            return Ok(());
        };

        if !status.is_running {
            println!("{}", "Scenario is no longer running".bold());
            if let Some(report) = controller.sub_report() {
                print!("{}", report.render());
            }
            return Ok(());
        }

        if status.prompt_action_id.is_none() {
            // counterpart's turn; retry one poll interval at a time
            println!("{}", "Waiting for the counterpart party...".dimmed());
            controller.reload_after_interval().await?;
            continue;
        }

        println!();
        println!("{} {}", "Action:".bold(), status.current_action_title());
        if !status.prompt_text.is_empty() {
            println!("{}", status.prompt_text);
        }

        let outcome = if status.input_required {
            if controller.input_buffer().is_empty() {
                println!("Enter input, finish with a blank line:");
            } else {
                println!("Proposed input (blank line keeps it, or type a replacement):");
                println!("{}", controller.input_buffer().dimmed());
            }
            let text = read_block(controller.input_buffer())?;
            controller.set_input_buffer(text);
            controller.submit(true).await
        } else if status.is_skippable {
            eprint!("[Enter]=acknowledge, s=skip, q=quit: ");
            std::io::stderr().flush()?;
            match read_line()?.as_str() {
                "q" => return Ok(()),
                "s" => {
                    if controller.confirmation_required() {
                        confirm("Skip the current action?", yes)?;
                    }
                    controller.complete(true).await
                }
                _ => controller.submit(false).await,
            }
        } else {
            if controller.confirmation_required() {
                confirm("Acknowledge the current action?", yes)?;
            }
            controller.submit(false).await
        };

        if let Err(e) = outcome {
            if e.is_stale() {
                return Ok(());
            }
            // blocking acknowledgement, then back to an actionable state with
            // the typed input preserved
            eprintln!("{} {e}", "error:".red().bold());
            if matches!(e, Error::InvalidInput(_)) {
                eprintln!("{}", controller.input_buffer());
            } else {
                eprint!("Press Enter to continue ");
                std::io::stderr().flush()?;
                let _ = read_line()?;
            }
            controller.acknowledge_error();
        }
    }
}

/// Party maintenance actions are offered only on sandboxes that advertise
/// support for them
async fn require_party_actions(api: &ConformanceApi, sandbox_id: &str) -> Result<()> {
    let sandbox = api.get_sandbox(sandbox_id).await?;
    if !sandbox.can_notify_party {
        return Err(Error::PartyActionUnsupported);
    }
    Ok(())
}

fn find_scenario<'a>(modules: &'a [ModuleDigest], scenario_id: &str) -> Option<&'a ScenarioDigest> {
    modules
        .iter()
        .flat_map(|m| m.scenarios.iter())
        .find(|s| s.id == scenario_id)
}

fn print_module_listing(modules: &[ModuleDigest]) {
    let running = any_scenario_running(modules);
    for module in modules {
        if !module.module_name.is_empty() {
            println!("{}", module.module_name.bold());
        }
        for scenario in &module.scenarios {
            let action = if scenario.is_running {
                "stop".yellow()
            } else if running {
                "locked".dimmed()
            } else if scenario.conformance_status.has_traffic() {
                "restart".normal()
            } else {
                "start".green()
            };
            println!(
                "  {} {}  {}  [{}]  ({})",
                scenario.conformance_status.glyph(),
                scenario.id.dimmed(),
                scenario.name,
                scenario.conformance_status.title(),
                action
            );
        }
    }
}

fn print_scenario_status(controller: &ScenarioController) {
    let Some(status) = controller.status() else {
        return;
    };
    println!(
        "{} {}",
        "State:".bold(),
        if status.is_running { "running" } else { "not running" }
    );
    if !status.next_actions.is_empty() {
        println!("{} {}", "Next actions:".bold(), status.next_actions);
    }
    if status.prompt_action_id.is_some() {
        println!("{} {}", "Pending action:".bold(), status.current_action_title());
        if status.input_required {
            println!("  (input required)");
        }
        if status.is_skippable {
            println!("  (skippable)");
        }
    }
    if let Some(report) = controller.sub_report() {
        println!("{}", "Conformance report:".bold());
        print!("{}", report.render());
    }
}

/// Render an opaque exchange log value for inspection
fn render_exchanges(exchanges: &Value) -> String {
    serde_json::to_string_pretty(exchanges).unwrap_or_else(|_| exchanges.to_string())
}
