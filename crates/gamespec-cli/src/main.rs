//! gamespec - compile, patch and propose Game Specs from the command line

mod simulate;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gamespec_compiler::compile;
use gamespec_core::{ForgeConfig, GameForge, UserId};
use gamespec_intent::{IntentConfig, IntentResolver};
use gamespec_model::{apply_with_report, default_spec, Patch, SpawnMode};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gamespec")]
#[command(version, about = "Natural-language game specs compiled to single-file HTML")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a spec file to HTML
    Compile {
        /// Spec JSON file
        #[arg(long)]
        spec: PathBuf,
        /// Output file (stdout when absent)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Apply a patch file to a spec file and print the result
    Apply {
        /// Spec JSON file
        #[arg(long)]
        spec: PathBuf,
        /// Patch file (JSON array, fenced or wrapped)
        #[arg(long)]
        patch: PathBuf,
    },
    /// Propose a patch for a prompt
    Propose {
        /// Natural-language request
        #[arg(long)]
        prompt: String,
        /// Current spec (default spec for the prompt when absent)
        #[arg(long)]
        spec: Option<PathBuf>,
        /// Rolling summary of earlier turns
        #[arg(long, default_value = "")]
        summary: String,
    },
    /// Run prompts as successive turns of one session and emit the document
    Forge {
        /// Prompts, applied in order
        #[arg(long = "prompt", required = true)]
        prompts: Vec<String>,
        /// Output file (stdout when absent)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the timed-spawn model headless and report spawn totals
    Simulate {
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,
        #[arg(long, value_enum, default_value_t = Mode::Doubling)]
        mode: Mode,
        /// Objects per window (linear and fixed modes)
        #[arg(long)]
        add: Option<u32>,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        /// Keep running at the limit instead of ending
        #[arg(long)]
        hold: bool,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Simulated duration in seconds
        #[arg(long, default_value_t = 60)]
        seconds: u64,
        /// Frame step in milliseconds
        #[arg(long, default_value_t = 16.0)]
        frame_ms: f64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Doubling,
    Linear,
    Fixed,
}

impl From<Mode> for SpawnMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Doubling => SpawnMode::Doubling,
            Mode::Linear => SpawnMode::Linear,
            Mode::Fixed => SpawnMode::Fixed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Compile { spec, out } => {
            let spec = read_json(&spec)?;
            let html = compile(&spec);
            info!(bytes = html.len(), "compiled");
            emit(out.as_deref(), &html)?;
        }
        Command::Apply { spec, patch } => {
            let next = apply_files(&spec, &patch)?;
            println!("{}", serde_json::to_string_pretty(&next)?);
        }
        Command::Propose {
            prompt,
            spec,
            summary,
        } => {
            let spec = match spec {
                Some(path) => read_json(&path)?,
                None => default_spec(&prompt),
            };
            let resolver = IntentResolver::from_config(config.intent.clone());
            let proposal = resolver.propose(&spec, &prompt, &summary).await;
            let report = json!({
                "source": proposal.source,
                "degradations": proposal.degradations,
                "model": proposal.model,
                "patch": proposal.patch,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Forge { prompts, out } => {
            let html = forge(config, &prompts).await?;
            emit(out.as_deref(), &html)?;
        }
        Command::Simulate {
            interval_ms,
            mode,
            add,
            limit,
            hold,
            seed,
            seconds,
            frame_ms,
        } => {
            let report = simulate::run(&simulate::SimulationConfig {
                mode: mode.into(),
                interval_ms,
                add_per_interval: add,
                limit,
                end_on_limit: !hold,
                seed,
                duration_ms: seconds.saturating_mul(1000),
                frame_ms,
            });
            print!("{}", report.render());
        }
    }
    Ok(())
}

/// File configuration when given, with environment intent settings as the
/// base and the API key always taken from the environment when the file has
/// none
fn load_config(path: Option<&Path>) -> Result<ForgeConfig> {
    let env_intent = IntentConfig::from_env();
    let Some(path) = path else {
        return Ok(ForgeConfig::default().with_intent(env_intent));
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut config = ForgeConfig::from_toml_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    if config.intent.api_key.is_none() {
        config.intent.api_key = env_intent.api_key;
    }
    Ok(config)
}

fn read_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn apply_files(spec: &Path, patch: &Path) -> Result<Value> {
    let spec = read_json(spec)?;
    let text =
        fs::read_to_string(patch).with_context(|| format!("reading {}", patch.display()))?;
    let patch = Patch::from_text(&text).with_context(|| format!("parsing {}", patch.display()))?;

    let (next, report) = apply_with_report(&spec, patch.ops());
    for skipped in &report.skipped {
        warn!(index = skipped.index, path = %skipped.path, reason = ?skipped.reason, "skipped operation");
    }
    info!(applied = report.applied, skipped = report.skipped.len(), "patch applied");
    Ok(next)
}

async fn forge(config: ForgeConfig, prompts: &[String]) -> Result<String> {
    let forge = GameForge::in_memory(config);
    let user = UserId::new("cli");
    let game = forge.create_session(&user, None).await?;

    let mut html = None;
    for prompt in prompts {
        let turn = forge.generate(&user, game, prompt).await?;
        info!(
            source = turn.source.as_str(),
            applied = turn.report.applied,
            degraded = !turn.degradations.is_empty(),
            "turn: {prompt}"
        );
        html = turn.html;
    }
    match html {
        Some(html) => Ok(html),
        None => bail!("no document produced"),
    }
}

fn emit(out: Option<&Path>, html: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "wrote document");
        }
        None => println!("{html}"),
    }
    Ok(())
}
