//! aic - prompt token interpreter
//!
//! CLI entry point: renders ai/prompt.md to the clipboard once, on every
//! change, or listens for leader-key sequences.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use aic::actions::{Automation, ExecutionReport, SystemAutomation};
use aic::aidir::AiDir;
use aic::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use aic::clipboard::SystemClipboard;
use aic::config::Config;
use aic::pipeline::{PassOutcome, PipelineOptions, PromptPipeline};
use aic::sequence::{KeySource, SequenceContext, SequenceDispatcher, SequenceHandle, SequenceListener, SequenceRegistry};
use aic::watcher::{PromptWatcher, WatchEvent};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    let command = cli.command.unwrap_or_default();
    debug!(?command, "main: dispatching command");
    match command {
        Command::Run { no_copy, no_actions } => cmd_run(config, !no_copy, !no_actions).await,
        Command::Watch {
            poll_ms,
            debounce_ms,
            keys,
        } => {
            let mut config = config;
            if let Some(ms) = poll_ms {
                config.watch.poll_ms = ms;
            }
            if let Some(ms) = debounce_ms {
                config.watch.debounce_ms = ms;
            }
            cmd_watch(config, keys).await
        }
        Command::Listen => cmd_listen(config).await,
        Command::Init { force } => cmd_init(force),
        Command::Tokens { format } => cmd_tokens(config, format),
        Command::History { show } => cmd_history(show),
    }
}

/// Status line on stderr; raw mode needs an explicit carriage return
fn status(raw: bool, line: impl std::fmt::Display) {
    if raw {
        eprint!("{}\r\n", line);
    } else {
        eprintln!("{}", line);
    }
}

fn report_failures(raw: bool, outcome: &PassOutcome) {
    let reports: [&ExecutionReport; 2] = [&outcome.before, &outcome.after];
    for failure in reports.iter().flat_map(|r| r.failures.iter()) {
        status(
            raw,
            format!("[action {} failed: {}] {}", failure.index, failure.literal, failure.error).yellow(),
        );
    }
}

/// Open the nearest project, creating `ai/` in the working directory if none exists
fn open_or_init() -> Result<AiDir> {
    match AiDir::open() {
        Ok(dir) => Ok(dir),
        Err(e) => {
            debug!(error = %e, "open_or_init: no project found, initializing");
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            Ok(AiDir::init(&cwd, false)?)
        }
    }
}

fn build_pipeline(dir: AiDir, config: Config, automation: Arc<dyn Automation>) -> PromptPipeline {
    PromptPipeline::new(dir, config, Arc::new(SystemClipboard::detect()), automation)
}

async fn cmd_run(config: Config, copy: bool, run_actions: bool) -> Result<()> {
    debug!(copy, run_actions, "cmd_run: called");
    let dir = open_or_init()?;
    let pipeline = build_pipeline(dir, config, Arc::new(SystemAutomation::detect())).with_options(PipelineOptions {
        copy,
        run_actions,
        skip_empty_body: false,
    });

    let outcome = pipeline.run_once().await?;
    println!("{}", outcome.output);
    if outcome.copied {
        status(false, "[copied output to clipboard]".green());
    }
    report_failures(false, &outcome);
    Ok(())
}

/// Flip `tx` to true on SIGINT/SIGTERM
fn spawn_signal_handler(tx: Arc<watch::Sender<bool>>) -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => warn!("SIGINT received"),
                _ = sigterm.recv() => warn!("SIGTERM received"),
            }
            let _ = tx.send(true);
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl+C received");
            }
            let _ = tx.send(true);
        });
    }
    Ok(())
}

/// Leader-key listening
struct KeyListening {
    source: KeySource,
    listener: SequenceHandle,
    printer: tokio::task::JoinHandle<()>,
}

impl KeyListening {
    fn start(config: &Config, automation: Arc<dyn Automation>, shutdown: Arc<watch::Sender<bool>>) -> Result<Self> {
        debug!("KeyListening::start: called");
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<String>();
        let dispatcher = SequenceDispatcher::new(
            Arc::new(SequenceRegistry::standard()),
            SequenceContext { automation },
        )
        .with_reporter(report_tx);

        let (key_tx, key_rx) = mpsc::unbounded_channel();
        let source = KeySource::spawn(config.sequence.source, key_tx, shutdown)?;
        info!(kind = ?source.kind(), "key source started");

        let raw = source.is_raw_mode();
        let printer = tokio::spawn(async move {
            while let Some(line) = report_rx.recv().await {
                status(raw, format!("[{}]", line).cyan());
            }
        });
        let listener = SequenceListener::from_config(&config.sequence).start(key_rx, move |key| {
            dispatcher.dispatch(key);
        });

        Ok(Self {
            source,
            listener,
            printer,
        })
    }

    fn is_raw_mode(&self) -> bool {
        self.source.is_raw_mode()
    }

    async fn stop(self) {
        self.source.stop();
        self.listener.stop().await;
        self.printer.abort();
    }
}

fn leader_display(config: &Config) -> String {
    config
        .sequence
        .leader
        .iter()
        .map(|c| if *c == ' ' { "SPACE".to_string() } else { c.to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn cmd_watch(config: Config, keys: bool) -> Result<()> {
    debug!(keys, "cmd_watch: called");
    let dir = open_or_init()?;
    let automation: Arc<dyn Automation> = Arc::new(SystemAutomation::detect());

    let (tx, rx) = watch::channel(false);
    let tx = Arc::new(tx);
    spawn_signal_handler(tx.clone())?;

    status(false, format!("Watching: {}", dir.prompt_path().display()));
    status(false, "Press Ctrl+C to stop.");

    let keys = if keys {
        status(
            false,
            format!("Sequences: {} then a command key", leader_display(&config)),
        );
        Some(KeyListening::start(&config, automation.clone(), tx.clone())?)
    } else {
        None
    };
    let raw = keys.as_ref().is_some_and(KeyListening::is_raw_mode);

    let poll = config.watch.poll_interval();
    let debounce = config.watch.debounce();
    let pipeline = build_pipeline(dir, config, automation).with_options(PipelineOptions {
        skip_empty_body: true,
        ..Default::default()
    });
    let watcher = PromptWatcher::new(pipeline, poll, debounce);

    watcher
        .run(rx, |event| match event {
            WatchEvent::Initial(outcome) if outcome.skipped => {
                status(raw, "prompt is empty, waiting for changes".dimmed());
            }
            WatchEvent::Initial(outcome) => {
                status(raw, format!("initial copy [{} chars]", outcome.output.chars().count()).green());
                report_failures(raw, &outcome);
            }
            WatchEvent::Updated(outcome) if outcome.skipped => {}
            WatchEvent::Updated(outcome) => {
                status(raw, format!("updated clipboard [{} chars]", outcome.output.chars().count()).green());
                report_failures(raw, &outcome);
            }
            WatchEvent::Failed(e) => status(raw, format!("render error: {}", e).red()),
        })
        .await;

    if let Some(keys) = keys {
        keys.stop().await;
    }
    info!("watch stopped");
    Ok(())
}

async fn cmd_listen(config: Config) -> Result<()> {
    debug!("cmd_listen: called");
    let (tx, mut rx) = watch::channel(false);
    let tx = Arc::new(tx);
    spawn_signal_handler(tx.clone())?;

    status(
        false,
        format!("Listening for {} then a command key. Press Ctrl+C to stop.", leader_display(&config)),
    );
    let keys = KeyListening::start(&config, Arc::new(SystemAutomation::detect()), tx.clone())?;

    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            break;
        }
    }

    keys.stop().await;
    info!("listen stopped");
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    debug!(force, "cmd_init: called");
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let dir = AiDir::init(&cwd, force)?;
    status(false, format!("initialized {}", dir.ai_dir().display()).green());
    Ok(())
}

fn cmd_tokens(config: Config, format: OutputFormat) -> Result<()> {
    debug!(%format, "cmd_tokens: called");
    let dir = AiDir::open()?;
    let raw = dir.read_prompt()?;
    let pipeline = build_pipeline(dir, config, Arc::new(SystemAutomation::detect()));
    let ctx = pipeline.command_context();
    let (context, body) = pipeline.parse(&raw, &ctx);

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "context": context.report(),
                "body": body.report(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            for (label, doc) in [("context", &context), ("body", &body)] {
                if doc.is_empty() {
                    continue;
                }
                println!("{}", format!("== {} ==", label).bold());
                for report in doc.report() {
                    let call = match report.call {
                        Some(call) => format!("  {}", serde_json::to_string(call)?),
                        None => String::new(),
                    };
                    println!("{:>4}  {:<8} {:?}{}", report.index, report.kind, report.literal, call);
                    if report.call.is_none()
                        && let Some(usage) = pipeline.registry().usage_for(report.literal)
                    {
                        println!("{}", format!("        usage: {}", usage).dimmed());
                    }
                }
            }
        }
    }
    Ok(())
}

fn cmd_history(show: Option<usize>) -> Result<()> {
    debug!(?show, "cmd_history: called");
    let dir = AiDir::open()?;
    let mut snapshots: Vec<PathBuf> = dir.history()?;
    snapshots.reverse();

    match show {
        Some(n) => {
            let path = n
                .checked_sub(1)
                .and_then(|i| snapshots.get(i))
                .ok_or_else(|| eyre!("no snapshot #{} ({} in history)", n, snapshots.len()))?;
            let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            print!("{}", text);
        }
        None if snapshots.is_empty() => status(false, "no prompt history yet".dimmed()),
        None => {
            for (i, path) in snapshots.iter().enumerate() {
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                println!("{:>4}  {}", i + 1, name);
            }
        }
    }
    Ok(())
}
