use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use counsel::auth::{self, AuthStorage};
use counsel::banner::{BannerInfo, print_banner, print_session_summary, usage_line};
use counsel::cases::index::{build_index, cases_prompt, read_index, write_index};
use counsel::cases::{CaseStore, SAMPLE_USER_QUERY};
use counsel::chat::store::ChatStore;
use counsel::chat::{ChatMessage, ChatRole, CoCounsel};
use counsel::config::{Config, KNOWN_KEYS, Settings};
use counsel::consts::{API_KEY_ENV, CHAT_HISTORY_LIMIT, PROVIDER, default_db_path};
use counsel::llm::gemini::GeminiClient;
use counsel::llm::{Llm, Model, Unavailable};
use counsel::research::{ResearchConfig, ResearchPipeline, find_cases, summarize_case};
use counsel::risk::{self, DEFAULT_ITERATIONS, Factors, TribunalStance};
use counsel::server::{self, AppState};
use counsel::spinner::{Spinner, progress_label};
use counsel::{render, research};

#[derive(Parser)]
#[command(
    name = "counsel",
    version,
    about = "Strategic co-counsel for investment arbitration counterclaims."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite database for config, credentials and chat history
    /// (default: ~/.counsel/counsel.db, use :memory: for ephemeral)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Directory of case JSON files
    #[arg(long, global = true)]
    cases_dir: Option<PathBuf>,

    /// Case index CSV
    #[arg(long, global = true)]
    index: Option<PathBuf>,
}

#[derive(Args)]
struct QueryArgs {
    /// The fact pattern to research
    #[arg(short, long, conflicts_with = "query_file")]
    query: Option<String>,

    /// Read the fact pattern from a file
    #[arg(long)]
    query_file: Option<PathBuf>,
}

impl QueryArgs {
    /// Inline query, then query file, then the sample fact pattern.
    fn resolve(&self) -> anyhow::Result<String> {
        if let Some(query) = &self.query {
            return Ok(query.clone());
        }
        if let Some(path) = &self.query_file {
            let query = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if query.trim().is_empty() {
                bail!("{} is empty", path.display());
            }
            return Ok(query);
        }
        Ok(SAMPLE_USER_QUERY.to_string())
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the case index CSV from the case directory
    Index,
    /// Rank the cases most relevant to a query
    Find {
        #[command(flatten)]
        query: QueryArgs,
        /// Number of cases to return
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
        /// Ranking model (pro, flash, flash-lite or a full id)
        #[arg(long)]
        model: Option<String>,
    },
    /// Summarize one case's decisions against a query
    Summarize {
        case_id: String,
        #[command(flatten)]
        query: QueryArgs,
        /// Summary model
        #[arg(long)]
        model: Option<String>,
    },
    /// Rank, summarize and write the counterclaim report
    Research {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
        /// Where report_prompt.txt and report.md are written
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Also render report.html
        #[arg(long, default_value_t = false)]
        html: bool,
    },
    /// Render a Markdown report as a styled HTML page
    Render {
        #[arg(short, long, default_value = research::report::REPORT_FILE)]
        input: PathBuf,
        #[arg(short, long, default_value = research::report::HTML_FILE)]
        output: PathBuf,
    },
    /// Monte Carlo risk simulation of the counterclaim strategy
    Simulate {
        /// Pro-Investor, Neutral or Pro-State
        #[arg(long, default_value = "neutral")]
        stance: String,
        #[arg(long, default_value_t = 70.0)]
        jurisdiction: f64,
        #[arg(long, default_value_t = 45.0)]
        causation: f64,
        #[arg(long, default_value_t = 60.0)]
        evidence: f64,
        #[arg(long, default_value_t = 55.0)]
        precedent: f64,
        #[arg(long, default_value_t = 75.0)]
        damages: f64,
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,
        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long, default_value = "python_report.html")]
        output: PathBuf,
        /// Open the report in a browser
        #[arg(long, default_value_t = false)]
        open: bool,
    },
    /// Talk to the arbitration co-counsel in the terminal
    Chat {
        #[arg(long)]
        model: Option<String>,
    },
    /// Serve the chat and simulator web apps
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
    },
    /// Store an API key for a provider
    Login {
        #[arg(default_value = PROVIDER)]
        provider: String,
        /// Key to store (prompted for when omitted)
        #[arg(long)]
        key: Option<String>,
    },
    /// Remove the stored API key for a provider
    Logout {
        #[arg(default_value = PROVIDER)]
        provider: String,
    },
    /// Read or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Get { key: String },
    Set { key: String, value: String },
    Unset { key: String },
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counsel=info,tower_http=info".into()),
        )
        .init();

    let Cli {
        command,
        db,
        cases_dir,
        index,
    } = Cli::parse();
    let db_path = resolve_db_path(db.as_deref())?;

    match command {
        Command::Login { provider, key } => handle_login(&db_path, &provider, key.as_deref())?,
        Command::Logout { provider } => {
            if auth::logout(&db_path, &provider)? {
                println!("✓ Logged out from {provider}.");
            } else {
                println!("No saved {provider} API key.");
            }
        }
        Command::Config { action } => handle_config(&db_path, &action)?,
        Command::Render { input, output } => {
            render::render_report_file(&input, &output)?;
            println!("{}", output.display());
        }
        Command::Index => {
            let settings = load_settings(&db_path, cases_dir, index)?;
            let store = CaseStore::new(&settings.cases_dir);
            let rows = build_index(&store)?;
            write_index(&rows, &settings.index_path)?;
            println!(
                "indexed {} cases -> {}",
                rows.len(),
                settings.index_path.display()
            );
        }
        Command::Find {
            query,
            top_n,
            model,
        } => {
            let settings = load_settings(&db_path, cases_dir, index)?;
            let query = query.resolve()?;
            let model = model_override(model.as_deref(), settings.ranking_model)?;
            let top_n = top_n.unwrap_or(settings.top_n);
            let rows = read_index(&settings.index_path)?;
            let client = gemini(&db_path, &settings)?;

            let spinner = Spinner::start("ranking cases");
            let ids = find_cases(client.as_ref(), model, &query, &cases_prompt(&rows), top_n).await;
            spinner.stop().await;

            for id in ids? {
                println!("{id}");
            }
            report_usage(&client);
        }
        Command::Summarize {
            case_id,
            query,
            model,
        } => {
            let settings = load_settings(&db_path, cases_dir, index)?;
            let query = query.resolve()?;
            let model = model_override(model.as_deref(), settings.summary_model)?;
            let store = CaseStore::new(&settings.cases_dir);
            let client = gemini(&db_path, &settings)?;

            let spinner = Spinner::start(&format!("summarizing {case_id}"));
            let summary = summarize_case(
                client.as_ref(),
                model,
                &store,
                &case_id,
                &query,
                settings.concurrency,
            )
            .await;
            spinner.stop().await;

            let summary = summary?;
            println!("{}", summary.text);
            eprintln!(
                "kept {} of {} decisions",
                summary.decisions_kept, summary.decisions_total
            );
            report_usage(&client);
        }
        Command::Research {
            query,
            top_n,
            output_dir,
            html,
        } => {
            let settings = load_settings(&db_path, cases_dir, index)?;
            let query = query.resolve()?;
            let rows = read_index(&settings.index_path)?;
            let client = gemini(&db_path, &settings)?;
            let pipeline = ResearchPipeline::new(
                client.clone(),
                CaseStore::new(&settings.cases_dir),
                cases_prompt(&rows),
                ResearchConfig {
                    ranking_model: settings.ranking_model,
                    summary_model: settings.summary_model,
                    report_model: settings.report_model,
                    top_n: top_n.unwrap_or(settings.top_n),
                    concurrency: settings.concurrency,
                    output_dir: output_dir.unwrap_or(settings.output_dir),
                    render_html: html,
                },
            );
            run_research(&pipeline, &query).await?;
            report_usage(&client);
        }
        Command::Simulate {
            stance,
            jurisdiction,
            causation,
            evidence,
            precedent,
            damages,
            iterations,
            seed,
            output,
            open,
        } => {
            let stance = TribunalStance::from_str(&stance)?;
            let factors = Factors {
                jurisdiction,
                causation,
                evidence,
                precedent,
                damages,
            };
            simulate(&factors, stance, iterations, seed, &output)?;
            if open {
                // Headless sessions have no browser; the path is printed anyway.
                let _ = open::that(&output);
            }
        }
        Command::Chat { model } => {
            let settings = load_settings(&db_path, cases_dir, index)?;
            let model = model_override(model.as_deref(), settings.chat_model)?;
            run_chat(&db_path, &settings, model).await?;
        }
        Command::Serve { host, port } => {
            let settings = load_settings(&db_path, cases_dir, index)?;
            let addr = format!("{host}:{port}");
            // The simulator needs no model, so a missing key only disables chat.
            let llm: Arc<dyn Llm> = match try_gemini(&db_path, &settings)? {
                Some(client) => client,
                None => {
                    warn!("{}; chat replies will report the error", no_key_message());
                    Arc::new(Unavailable::new(no_key_message()))
                }
            };
            let auth_status = auth::status(&AuthStorage::open(&db_path)?, PROVIDER, API_KEY_ENV)?;
            print_banner(&BannerInfo {
                mode: &format!("serve http://{addr}"),
                model: settings.chat_model.id(),
                auth_status: &auth_status,
                cases_dir: &settings.cases_dir,
                db: &db_path,
            });
            let state = Arc::new(AppState {
                co_counsel: CoCounsel::new(llm, settings.chat_model),
                chats: ChatStore::new(&db_path)?,
                history_limit: CHAT_HISTORY_LIMIT,
            });
            server::serve(state, &addr).await?;
        }
    }

    Ok(())
}

/// `--db`, or the default path with its directory created.
fn resolve_db_path(db: Option<&str>) -> anyhow::Result<String> {
    if let Some(db) = db {
        return Ok(db.to_string());
    }
    let path = default_db_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(path.to_string_lossy().into_owned())
}

/// Stored settings with the global path flags applied on top.
fn load_settings(
    db_path: &str,
    cases_dir: Option<PathBuf>,
    index: Option<PathBuf>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(&Config::open(db_path)?)?;
    if let Some(dir) = cases_dir {
        settings.cases_dir = dir;
    }
    if let Some(index) = index {
        settings.index_path = index;
    }
    Ok(settings)
}

fn model_override(flag: Option<&str>, default: Model) -> anyhow::Result<Model> {
    flag.map(Model::from_str).transpose().map(|m| m.unwrap_or(default))
}

fn no_key_message() -> String {
    format!("no Gemini API key: run `counsel login` or set {API_KEY_ENV}")
}

/// A client for the resolved key, or `None` when there is no key.
fn try_gemini(db_path: &str, settings: &Settings) -> anyhow::Result<Option<Arc<GeminiClient>>> {
    let Some(source) = AuthStorage::open(db_path)?.resolve(PROVIDER, API_KEY_ENV)? else {
        return Ok(None);
    };
    let client = GeminiClient::new(source.key(), &settings.base_url, settings.timeout)?;
    Ok(Some(Arc::new(client)))
}

fn gemini(db_path: &str, settings: &Settings) -> anyhow::Result<Arc<GeminiClient>> {
    match try_gemini(db_path, settings)? {
        Some(client) => Ok(client),
        None => bail!(no_key_message()),
    }
}

fn report_usage(client: &GeminiClient) {
    if let Some(line) = usage_line(client.session_usage()) {
        eprintln!("{line}");
    }
}

/// Run the pipeline with a spinner that follows its progress events.
/// Ctrl+C abandons the run.
async fn run_research(pipeline: &ResearchPipeline, query: &str) -> anyhow::Result<()> {
    let mut events = pipeline.events().subscribe();
    let spinner = Spinner::start("starting research");

    let run = pipeline.run(query);
    tokio::pin!(run);
    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            Ok(event) = events.recv() => {
                if let Some(label) = progress_label(&event) {
                    spinner.set_message(label);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                spinner.stop().await;
                bail!("interrupted");
            }
        }
    };
    spinner.stop().await;

    let report = result?;
    println!("cases     {}", report.case_ids.join(", "));
    println!("prompt    {}", report.prompt_path.display());
    println!("report    {}", report.report_path.display());
    if let Some(html) = &report.html_path {
        println!("html      {}", html.display());
    }
    Ok(())
}

fn simulate(
    factors: &Factors,
    stance: TribunalStance,
    iterations: usize,
    seed: Option<u64>,
    output: &Path,
) -> anyhow::Result<()> {
    factors.validate()?;
    if iterations == 0 {
        bail!("iterations must be positive");
    }

    let mut rng = risk::rng(seed);
    let samples = risk::simulate(factors, stance, iterations, &mut rng);
    let (metrics, page) = risk::report::build(&samples)?;

    std::fs::write(output, page)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("stance        {stance}");
    println!("median        {:.1}", metrics.median);
    println!("pessimistic   {:.1}", metrics.pessimistic);
    println!("optimistic    {:.1}", metrics.optimistic);
    println!("success       {:.1}%", metrics.success_probability);
    println!("report        {}", output.display());
    Ok(())
}

async fn run_chat(db_path: &str, settings: &Settings, model: Model) -> anyhow::Result<()> {
    let client = gemini(db_path, settings)?;
    let chats = ChatStore::new(db_path)?;
    let co_counsel = CoCounsel::new(client.clone(), model);
    let session_id = Uuid::new_v4().to_string();

    let auth_status = auth::status(&AuthStorage::open(db_path)?, PROVIDER, API_KEY_ENV)?;
    print_banner(&BannerInfo {
        mode: "chat",
        model: model.id(),
        auth_status: &auth_status,
        cases_dir: &settings.cases_dir,
        db: db_path,
    });

    // Async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\ncounsel> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "quit" || message == "exit" {
            break;
        }

        let history = chats.history(&session_id)?;
        let user = ChatMessage::now(ChatRole::User, message);
        let spinner = Spinner::start("thinking");

        // Ctrl+C during a reply drops the reply, not the session
        let reply = tokio::select! {
            reply = co_counsel.respond(&history, message) => Some(reply),
            _ = tokio::signal::ctrl_c() => None,
        };
        spinner.stop().await;

        match reply {
            Some(reply) => {
                println!("\n{reply}");
                chats.append(&session_id, &user)?;
                chats.append(&session_id, &ChatMessage::now(ChatRole::Assistant, reply))?;
                chats.trim(&session_id, CHAT_HISTORY_LIMIT)?;
            }
            None => println!("\n\ninterrupted"),
        }
    }

    print_session_summary(client.session_usage());
    Ok(())
}

fn handle_login(db_path: &str, provider: &str, key: Option<&str>) -> anyhow::Result<()> {
    let key = match key {
        Some(key) => key.to_string(),
        None => {
            print!("Paste your {provider} API key: ");
            io::stdout().flush()?;
            let mut key = String::new();
            io::stdin().read_line(&mut key)?;
            key
        }
    };

    auth::login(db_path, provider, &key)?;
    println!("✓ Saved {provider} API key.");
    println!("  Key stored in {db_path}");
    Ok(())
}

fn handle_config(db_path: &str, action: &ConfigAction) -> anyhow::Result<()> {
    let config = Config::open(db_path)?;
    match action {
        ConfigAction::Get { key } => match config.get(key)? {
            Some(value) => println!("{value}"),
            None => println!("(unset)"),
        },
        ConfigAction::Set { key, value } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                bail!("unknown config key: {key} (known: {})", KNOWN_KEYS.join(", "));
            }
            Settings::default().apply(key, value)?;
            config.set(key, value)?;
            println!("{key} = {value}");
        }
        ConfigAction::Unset { key } => {
            config.remove(key)?;
            println!("unset {key}");
        }
        ConfigAction::List => {
            for (key, value) in config.list()? {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}
