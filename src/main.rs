use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cadence::cli::Cli;
use cadence::cli::commands::Commands;
use cadence::config::Config;
use cadence::domain::definition::LoopDefinition;
use cadence::domain::execution::{AutonomyLevel, ExecutionContext};
use cadence::domain::gate::ApprovalPolicy;
use cadence::domain::skill::SkillOutcome;
use cadence::engine::ExecutionEngine;
use cadence::engine::snapshot::ExecutionSnapshot;
use cadence::supervisor::{
    AutoSupervisor, NoOpNotifier, NoOpRemediationWorker, SupervisorOutcome,
};
use cadence::workspace::FsWorkspace;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadence")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("cadence.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Validate { path } => handle_validate(path),
        Commands::Inspect { path, log } => handle_inspect(path, *log),
        Commands::Simulate {
            path,
            workspace,
            out,
        } => handle_simulate(path, workspace, out.as_deref(), config).await,
    }
}

fn handle_validate(path: &Path) -> Result<()> {
    info!("Validating loop definition: {}", path.display());
    let definition = LoopDefinition::load(path)
        .with_context(|| format!("Failed to load definition from {}", path.display()))?;
    definition.validate().context("Definition is invalid")?;

    let skills: usize = definition.phases.iter().map(|p| p.skills.len()).sum();
    let gates = definition.phases.iter().filter(|p| p.gate.is_some()).count();
    println!(
        "{} {} ({} phase(s), {} skill(s), {} gate(s))",
        "Valid:".green(),
        definition.name,
        definition.phases.len(),
        skills,
        gates
    );
    Ok(())
}

fn handle_inspect(path: &Path, show_log: bool) -> Result<()> {
    info!("Inspecting snapshot: {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot from {}", path.display()))?;
    let snapshot = ExecutionSnapshot::from_json(&content).context("Failed to parse snapshot")?;

    let execution = &snapshot.record.execution;
    println!("{} {}", "Execution:".cyan(), execution.id);
    println!("  Loop:     {}", execution.loop_id);
    println!("  Status:   {:?}", execution.status);
    println!("  Exported: {}", snapshot.exported_at_utc);

    for phase in &snapshot.record.phases {
        println!("  {} {}", "Phase:".cyan(), phase.name);
        for skill in &phase.skills {
            println!("    skill {:<24} {:?}", skill.name, skill.status);
        }
        if let Some(gate) = &phase.gate {
            println!(
                "    gate  {:<24} {:?} ({} decision(s))",
                gate.name,
                gate.status,
                gate.decisions.len()
            );
        }
    }

    if show_log {
        println!("  {}", "Log:".cyan());
        for entry in &snapshot.record.log {
            println!("    [{}] {:?} {}", entry.timestamp, entry.level, entry.message);
        }
    }
    Ok(())
}

async fn handle_simulate(
    path: &Path,
    workspace_root: &Path,
    out: Option<&Path>,
    config: &Config,
) -> Result<()> {
    info!("Simulating execution of: {}", path.display());
    let definition = LoopDefinition::load(path)
        .with_context(|| format!("Failed to load definition from {}", path.display()))?;

    let mut engine = ExecutionEngine::new();
    let execution = engine.start(&definition, ExecutionContext::default(), AutonomyLevel::Full)?;
    let id = execution.id.clone();
    println!("{} {}", "Started:".green(), id);

    let engine = Arc::new(Mutex::new(engine));
    let supervisor = AutoSupervisor::new(
        Arc::clone(&engine),
        Arc::new(FsWorkspace::new(workspace_root)),
        Arc::new(NoOpRemediationWorker),
        Arc::new(NoOpNotifier),
        config.supervisor_config(),
    );

    for phase in &definition.phases {
        println!("{} {}", "Phase:".cyan(), phase.name);
        {
            let mut engine = lock(&engine)?;
            for skill in &phase.skills {
                engine.complete_skill(
                    &id,
                    &skill.id,
                    SkillOutcome {
                        success: true,
                        score: 1.0,
                    },
                )?;
                println!("  {} {}", "completed".green(), skill.name);
            }
            engine.complete_phase(&id)?;
        }

        if let Some(gate_spec) = &phase.gate {
            // The engine resolved auto_if_configured at start; read the live policy
            let policy = {
                let engine = lock(&engine)?;
                let record = engine.get_state(&id)?;
                let pi = record
                    .find_gate(&gate_spec.id)
                    .ok_or_else(|| eyre!("gate {} missing from record", gate_spec.id))?;
                record.phases[pi]
                    .gate
                    .as_ref()
                    .map(|g| g.policy)
                    .ok_or_else(|| eyre!("gate {} missing from record", gate_spec.id))?
            };

            if policy == ApprovalPolicy::Automatic {
                match supervisor.auto_approve(&id, &gate_spec.id).await? {
                    SupervisorOutcome::AutoApproved { attempts } => {
                        println!(
                            "  {} {} (attempt {})",
                            "gate auto-approved".green(),
                            gate_spec.name,
                            attempts.len()
                        );
                    }
                    SupervisorOutcome::Escalated(event) => {
                        println!(
                            "  {} {} ({} failed guarantee(s))",
                            "gate escalated to pending-human".yellow(),
                            gate_spec.name,
                            event.failed_guarantees.len()
                        );
                        println!("{}", "Simulation halted awaiting human review".yellow());
                        return Ok(());
                    }
                    SupervisorOutcome::Aborted { .. } => {
                        println!("{}", "Simulation paused".yellow());
                        return Ok(());
                    }
                }
            } else {
                lock(&engine)?.approve_gate(
                    &id,
                    &gate_spec.id,
                    "simulator",
                    "approved in simulation",
                )?;
                println!("  {} {}", "gate approved".green(), gate_spec.name);
            }
        }

        lock(&engine)?.advance_phase(&id)?;
    }

    let snapshot = lock(&engine)?.export_snapshot(&id)?;
    println!(
        "{} {} ({:?})",
        "Finished:".green(),
        id,
        snapshot.record.execution.status
    );
    if let Some(out) = out {
        fs::write(out, snapshot.to_json()?)
            .with_context(|| format!("Failed to write snapshot to {}", out.display()))?;
        println!("{} {}", "Snapshot written:".green(), out.display());
    }
    Ok(())
}

fn lock(engine: &Arc<Mutex<ExecutionEngine>>) -> Result<std::sync::MutexGuard<'_, ExecutionEngine>> {
    engine.lock().map_err(|e| eyre!("engine lock poisoned: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
