//! diagnet CLI: diagnostic inference over semantic networks.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use diagnet::answer::{Answer, Explanation};
use diagnet::condition::Condition;
use diagnet::engine::{Engine, EngineConfig};
use diagnet::network::NodeId;
use diagnet::solve::{KbId, Observation, Question, Request, UserId};

#[derive(Parser)]
#[command(name = "diagnet", version, about = "Diagnostic inference over semantic networks")]
struct Cli {
    /// Engine configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of knowledge-base files to load at startup.
    #[arg(long, global = true)]
    kb_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a diagnostic request.
    Solve {
        /// Knowledge-base file to load before solving.
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Knowledge base to query, when several are loaded.
        #[arg(long)]
        kb_id: Option<u64>,

        /// Requesting user.
        #[arg(long, default_value = "0")]
        user: u64,

        /// Observed value, as FEATURE_ID=VALUE. Repeatable.
        #[arg(long = "observe", value_parser = parse_observation)]
        observations: Vec<Observation>,

        /// Read the whole request from a JSON file instead.
        #[arg(long, conflicts_with_all = ["observations", "kb_id", "user"])]
        request: Option<PathBuf>,

        /// Keep only the most specific hypotheses.
        #[arg(long)]
        differentiate: bool,

        /// Drop hypotheses the others already explain.
        #[arg(long)]
        minimize: bool,

        /// Ask on stdin about unobserved supporting features.
        #[arg(long)]
        ask: bool,

        /// Print the answer as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a summary of a knowledge base.
    Info {
        /// Knowledge-base file.
        #[arg(long)]
        kb: PathBuf,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List knowledge bases found in the kb directory.
    List,

    /// Evaluate a condition against a value.
    Check {
        /// Condition expression: `low:high`, `[a,b,c]`, or an exact value.
        #[arg(long)]
        condition: String,

        /// Observed value.
        #[arg(long)]
        value: String,
    },
}

fn parse_observation(arg: &str) -> std::result::Result<Observation, String> {
    let (id, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FEATURE_ID=VALUE, got `{arg}`"))?;
    let raw: u64 = id
        .trim()
        .parse()
        .map_err(|e| format!("invalid feature id `{id}`: {e}"))?;
    let feature_id = NodeId::new(raw).ok_or_else(|| "feature id must be non-zero".to_string())?;
    Ok(Observation::new(feature_id, value))
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if cli.kb_dir.is_some() {
        config.kb_dir = cli.kb_dir.clone();
    }

    match cli.command {
        Commands::Solve {
            kb,
            kb_id,
            user,
            observations,
            request,
            differentiate,
            minimize,
            ask,
            json,
        } => {
            let engine = Engine::new(config)?;
            let loaded = match &kb {
                Some(path) => Some(engine.open_file(path)?),
                None => None,
            };

            let mut request = match request {
                Some(path) => {
                    let content = std::fs::read_to_string(&path).into_diagnostic()?;
                    serde_json::from_str::<Request>(&content).into_diagnostic()?
                }
                None => {
                    let Some(kb_id) = kb_id.map(KbId).or(loaded) else {
                        miette::bail!("no knowledge base given: pass --kb or --kb-id");
                    };
                    let mut request = Request::new(UserId(user), kb_id);
                    request.observations = observations;
                    request
                }
            };
            request.differentiate |= differentiate;
            request.minimize |= minimize;

            let answer = if ask {
                engine.solve_with(&request, &mut ask_on_stdin)?
            } else {
                engine.solve(&request)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&answer).into_diagnostic()?);
            } else {
                print_answer(&answer);
            }
        }

        Commands::Info { kb, json } => {
            let engine = Engine::new(config)?;
            let kb_id = engine.open_file(&kb)?;
            let info = engine.info(kb_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info).into_diagnostic()?);
            } else {
                println!("{info}");
            }
        }

        Commands::List => {
            let engine = Engine::new(config)?;
            let ids = engine.knowledge_bases();
            if engine.config().kb_dir.is_none() {
                println!("No kb_dir configured; pass --kb-dir or set it in the config file.");
            } else if ids.is_empty() {
                println!("No knowledge bases loaded.");
            }
            for kb_id in ids {
                let info = engine.info(kb_id)?;
                println!(
                    "{:>6}  {:<30} {} hypotheses  ({})",
                    info.id.0, info.name, info.hypotheses, info.source
                );
            }
        }

        Commands::Check { condition, value } => {
            let parsed = Condition::parse(&condition);
            let verdict = if parsed.matches(&value) { "matches" } else { "does not match" };
            println!("{value:?} {verdict} {parsed}");
        }
    }

    Ok(())
}

/// Prompt for every question on stdin. An empty line skips the feature.
fn ask_on_stdin(questions: &[Question]) -> Vec<Observation> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut answers = Vec::new();
    for question in questions {
        print!(
            "{} [{}: {}]? ",
            question.name, question.attribute, question.value_area
        );
        if std::io::stdout().flush().is_err() {
            break;
        }
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let value = line.trim();
        if !value.is_empty() {
            answers.push(Observation::new(question.feature_id, value));
        }
    }
    answers
}

fn print_answer(answer: &Answer) {
    if answer.hypotheses.is_empty() {
        println!("No hypothesis survived.");
    }
    for hypothesis in &answer.hypotheses {
        print_explanation(hypothesis, 0);
    }
    if !answer.questions.is_empty() {
        println!();
        println!("Unobserved supporting features:");
        for q in &answer.questions {
            println!("  {:>6}  {} [{}: {}]", q.feature_id.get(), q.name, q.attribute, q.value_area);
        }
    }
    println!();
    println!("Rounds: {}", answer.rounds);
}

fn print_explanation(node: &Explanation, depth: usize) {
    let marker = if node.confirmed { " (confirmed)" } else { "" };
    println!(
        "{:indent$}{} {} [{}]{marker}",
        "",
        node.id,
        node.name,
        node.kind,
        indent = depth * 2
    );
    for argument in &node.arguments {
        print_explanation(argument, depth + 1);
    }
}
