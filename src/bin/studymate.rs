//! CLI binary for studymate.
//!
//! A thin shim over the library crate: one subcommand per study action, plus
//! an interactive `shell` that keeps a session alive between commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use studymate::{
    render_links_markdown, Difficulty, ExtractionStatus, ProgressCallback, Role, SessionStore,
    StudyConfig, StudyError, StudyMate, StudyProgressCallback, TaskKind, Upload,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: one spinner per slow step, replaced by a
/// ✓/✗ line when the step ends.
struct CliProgressCallback {
    active: Mutex<Option<(ProgressBar, Instant)>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            active: Mutex::new(None),
        })
    }

    fn start(&self, prefix: &str, message: String) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix(prefix.to_string());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut slot) = self.active.lock() {
            if let Some((old, _)) = slot.replace((bar, Instant::now())) {
                old.finish_and_clear();
            }
        }
    }

    fn finish(&self, line: String) {
        let taken = self.active.lock().ok().and_then(|mut slot| slot.take());
        match taken {
            Some((bar, started)) => {
                bar.finish_and_clear();
                eprintln!(
                    "{}  {}",
                    line,
                    dim(&format!("{:.1}s", started.elapsed().as_secs_f64()))
                );
            }
            None => eprintln!("{line}"),
        }
    }
}

impl StudyProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, file_name: &str, byte_len: usize) {
        self.start(
            "Reading",
            format!("{file_name} {}", dim(&format!("({byte_len} bytes)"))),
        );
    }

    fn on_extraction_complete(&self, file_name: &str, text_chars: usize) {
        let mark = if text_chars > 0 { green("✓") } else { cyan("⚠") };
        self.finish(format!(
            "{mark} {file_name}  {}",
            dim(&format!("{text_chars} chars of text"))
        ));
    }

    fn on_generation_start(&self, kind: TaskKind) {
        self.start("Generating", kind.to_string());
    }

    fn on_generation_complete(&self, kind: TaskKind, raw_len: usize) {
        self.finish(format!(
            "{} {}  {}",
            green("✓"),
            kind,
            dim(&format!("{raw_len} bytes"))
        ));
    }

    fn on_generation_error(&self, kind: TaskKind, _error: &str) {
        // The error itself is printed by the caller.
        self.finish(format!("{} {} failed", red("✗"), kind));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask a general question
  studymate chat "What is the Krebs cycle?"

  # Ten hard questions from a PDF
  studymate quiz biology.pdf --difficulty hard --count 10

  # Flashcards and a summary as JSON
  studymate --json flashcards biology.pdf
  studymate --json summary biology.pdf > summary.json

  # Search and learning links
  studymate links Newton\'s laws

  # Interactive session (upload once, generate many times)
  studymate shell

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (required for generation)
  STUDYMATE_MODEL         Override model ID (default: gemini-1.5-flash-latest)
  STUDYMATE_API_BASE      Override the API endpoint root
  STUDYMATE_API_TIMEOUT   Generation timeout in seconds (default: 60)
  RUST_LOG                Override log filter (e.g. studymate=debug)
"#;

/// Turn PDFs into quizzes, flashcards and summaries with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "studymate",
    version,
    about = "AI study assistant: quizzes, flashcards and summaries from PDFs",
    long_about = "Upload a text-based PDF and generate test questions, flashcards or a summary \
with key highlights using Google Gemini. Also answers general questions and suggests search \
and learning links for any topic.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Gemini model ID.
    #[arg(long, env = "STUDYMATE_MODEL", global = true)]
    model: Option<String>,

    /// API endpoint root.
    #[arg(long, env = "STUDYMATE_API_BASE", global = true)]
    api_base: Option<String>,

    /// Generation timeout in seconds.
    #[arg(long, env = "STUDYMATE_API_TIMEOUT", default_value_t = 60, global = true,
          value_parser = clap::value_parser!(u64).range(1..))]
    api_timeout: u64,

    /// Print JSON instead of Markdown.
    #[arg(long, global = true)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a general-knowledge question.
    Chat {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Generate test questions from a PDF.
    Quiz {
        pdf: PathBuf,
        /// easy, medium or hard.
        #[arg(long, default_value = "easy", value_parser = parse_difficulty)]
        difficulty: Difficulty,
        /// Number of questions.
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..=50))]
        count: Option<u16>,
    },
    /// Generate flashcards from a PDF.
    Flashcards { pdf: PathBuf },
    /// Summarise a PDF and list its key highlights.
    Summary { pdf: PathBuf },
    /// Search and learning links for a topic (no API key needed).
    Links {
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
    },
    /// Interactive session.
    Shell,
}

fn parse_difficulty(s: &str) -> Result<Difficulty, StudyError> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the step-level feedback; keep INFO logs out of its way.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn StudyProgressCallback>)
    } else {
        None
    };

    let quiz_count = match &cli.command {
        Command::Quiz { count, .. } => count.map(usize::from),
        _ => None,
    };
    let config = build_config(&cli, progress_cb, quiz_count)?;
    let mate = StudyMate::new(config).context("Failed to initialise StudyMate")?;
    let mut session = SessionStore::new();

    match &cli.command {
        Command::Chat { question } => {
            let question = question.join(" ");
            let answer = mate
                .ask(&mut session, &question)
                .await
                .context("Chat failed")?;
            if cli.json {
                print_json(&serde_json::json!({ "question": question, "answer": answer }))?;
            } else {
                print_markdown(&answer)?;
            }
        }
        Command::Quiz {
            pdf, difficulty, ..
        } => {
            load(&mate, &mut session, pdf).await?;
            let result = mate
                .generate_quiz(&mut session, *difficulty)
                .await
                .context("Quiz generation failed")?;
            emit(&cli, &result)?;
        }
        Command::Flashcards { pdf } => {
            load(&mate, &mut session, pdf).await?;
            let result = mate
                .generate_flashcards(&mut session)
                .await
                .context("Flashcard generation failed")?;
            emit(&cli, &result)?;
        }
        Command::Summary { pdf } => {
            load(&mate, &mut session, pdf).await?;
            let result = mate
                .summarize(&mut session)
                .await
                .context("Summary generation failed")?;
            emit(&cli, &result)?;
        }
        Command::Links { topic } => {
            let topic = topic.join(" ");
            let groups = mate.suggest_links(&topic)?;
            if cli.json {
                print_json(&groups)?;
            } else {
                print_markdown(&render_links_markdown(&topic, &groups))?;
            }
        }
        Command::Shell => run_shell(&cli, &mate, &mut session).await?,
    }

    Ok(())
}

/// Map CLI args to `StudyConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    quiz_count: Option<usize>,
) -> Result<StudyConfig> {
    let mut builder = StudyConfig::builder().api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.api_key {
        if !key.trim().is_empty() {
            builder = builder.api_key(key.clone());
        }
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref base) = cli.api_base {
        builder = builder.api_base(base.clone());
    }
    if let Some(n) = quiz_count {
        builder = builder.quiz_questions(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Read and upload a PDF for a one-shot command.
async fn load(mate: &StudyMate, session: &mut SessionStore, path: &Path) -> Result<()> {
    let upload = Upload::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    mate.upload(session, upload)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))?;
    // Failed extractions already returned above; what is left unusable is Empty.
    let usable = session.document().is_some_and(|doc| doc.is_usable());
    if !usable {
        anyhow::bail!("Cannot use {}: {}", path.display(), StudyError::EmptyDocument);
    }
    Ok(())
}

fn emit(cli: &Cli, result: &studymate::GenerationResult) -> Result<()> {
    if cli.json {
        print_json(result)
    } else {
        print_markdown(&result.artifact.to_markdown())
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

fn print_markdown(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

// ── Interactive shell ────────────────────────────────────────────────────────

const SHELL_HELP: &str = "\
Commands:
  upload <path>          load a PDF (replaces the current one)
  ask <question>         chat about anything
  quiz [easy|medium|hard]
  flashcards
  summary
  links <topic>          search and learning links
  show <chat|quiz|flashcards|summary>
  history                print the chat transcript
  reset-chat             start a new conversation
  clear                  forget the document and everything generated
  status                 what is loaded and generated
  help
  quit";

async fn run_shell(cli: &Cli, mate: &StudyMate, session: &mut SessionStore) -> Result<()> {
    if !cli.quiet {
        eprintln!("{} {}", cyan("◆"), bold(studymate::prompts::CHAT_GREETING));
        eprintln!("{}", dim("Type 'help' for commands, 'quit' to leave."));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{} ", cyan("studymate>"));
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "quit" | "exit" => break,
            "help" => println!("{SHELL_HELP}"),
            other => {
                if let Err(e) = shell_command(cli, mate, session, other, rest).await {
                    report(&e);
                }
            }
        }
    }
    Ok(())
}

async fn shell_command(
    cli: &Cli,
    mate: &StudyMate,
    session: &mut SessionStore,
    command: &str,
    rest: &str,
) -> Result<(), StudyError> {
    match command {
        "upload" => {
            if rest.is_empty() {
                return Err(StudyError::InvalidInput("usage: upload <path>".into()));
            }
            let upload = Upload::from_path(rest).await?;
            match mate.upload(session, upload).await? {
                ExtractionStatus::Empty => report(&StudyError::EmptyDocument),
                _ => eprintln!("{} Ready. Try 'quiz', 'flashcards' or 'summary'.", green("✔")),
            }
        }
        "ask" => {
            let answer = mate.ask(session, rest).await?;
            show_text(cli, &answer);
        }
        "quiz" => {
            let difficulty = if rest.is_empty() {
                Difficulty::default()
            } else {
                rest.parse()?
            };
            let result = mate.generate_quiz(session, difficulty).await?;
            show_text(cli, &result.artifact.to_markdown());
        }
        "flashcards" => {
            let result = mate.generate_flashcards(session).await?;
            show_text(cli, &result.artifact.to_markdown());
        }
        "summary" => {
            let result = mate.summarize(session).await?;
            show_text(cli, &result.artifact.to_markdown());
        }
        "links" => {
            let groups = mate.suggest_links(rest)?;
            show_text(cli, &render_links_markdown(rest, &groups));
        }
        "show" => {
            let kind: TaskKind = rest.parse()?;
            match session.result(kind) {
                Some(result) => show_text(cli, &result.artifact.to_markdown()),
                None => eprintln!("{}", dim(&empty_result_hint(session, kind))),
            }
        }
        "history" => {
            for message in session.messages() {
                let who = match message.role {
                    Role::User => bold("you"),
                    Role::Assistant => cyan("studymate"),
                };
                println!("{who}: {}\n", message.content);
            }
        }
        "reset-chat" => {
            session.reset_chat();
            eprintln!("{} New conversation started.", green("✔"));
        }
        "clear" => {
            session.clear();
            eprintln!("{} Session cleared.", green("✔"));
        }
        "status" => print_status(mate, session),
        other => {
            return Err(StudyError::InvalidInput(format!(
                "unknown command '{other}' (type 'help')"
            )))
        }
    }
    Ok(())
}

fn show_text(cli: &Cli, text: &str) {
    if cli.json {
        match serde_json::to_string_pretty(&serde_json::json!({ "text": text })) {
            Ok(json) => println!("{json}"),
            Err(e) => report(&StudyError::Internal(e.to_string())),
        }
    } else if let Err(e) = print_markdown(text) {
        eprintln!("{} {e:#}", red("✘"));
    }
}

/// What to say when `show <kind>` has nothing stored.
fn empty_result_hint(session: &SessionStore, kind: TaskKind) -> String {
    if kind.needs_document() && session.document().is_none() {
        format!("No {kind} yet. Upload a PDF first.")
    } else if kind == TaskKind::Chat {
        "No chat answer since the last upload or reset. Type 'history' for the transcript."
            .to_string()
    } else {
        format!("No {kind} generated yet.")
    }
}

fn print_status(mate: &StudyMate, session: &SessionStore) {
    println!("Model:     {}", mate.config().model);
    match session.document() {
        Some(doc) => {
            let status = match doc.status() {
                ExtractionStatus::Success => green("text extracted"),
                ExtractionStatus::Empty => cyan("no text layer"),
                ExtractionStatus::Failed(reason) => red(&format!("failed: {reason}")),
            };
            println!("Document:  {} ({})", doc.file_name(), status);
        }
        None => println!("Document:  {}", dim("none")),
    }
    for kind in TaskKind::ALL {
        let state = if session.result(kind).is_some() {
            green("ready")
        } else {
            dim("-")
        };
        println!("{:<10} {}", format!("{kind}:"), state);
    }
    println!("Messages:  {}", session.messages().len());
}

fn report(e: &StudyError) {
    eprintln!("{} {}", red("✘"), e);
    if e.is_generation_error() {
        eprintln!("{}", dim("  Nothing was changed. Try the same command again."));
    }
}
