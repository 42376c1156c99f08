//! # CourseClaw: course catalog assistant
//!
//! Usage:
//!   courseclaw                        # Build the index if needed, then chat
//!   courseclaw index --csv fall.csv   # Load a catalog export into the store
//!   courseclaw search "Phil Peterson" # Show raw retrieval hits
//!   courseclaw courses --subject PHIL # Structured lookups straight from the CSV
//!   courseclaw eval cases.toml        # Judge answers against expected ones

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use courseclaw_agent::Agent;
use courseclaw_agent::eval::{EvalSuite, run_eval};
use courseclaw_agent::judge::SimilarityJudge;
use courseclaw_core::config::expand_path;
use courseclaw_core::traits::provider::GenerateParams;
use courseclaw_core::traits::{Embedder, Provider};
use courseclaw_core::CourseClawConfig;
use courseclaw_knowledge::{
    CatalogReader, CourseCatalog, IndexBuilder, IndexReport, RecordStore, Retriever,
};
use courseclaw_providers::OpenAiCompatibleProvider;
use courseclaw_tools::{SearchCoursesTool, ToolRegistry};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "courseclaw",
    version,
    about = "🎓 CourseClaw — ask questions about the course catalog"
)]
struct Cli {
    /// Config file (default: ~/.courseclaw/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive question loop (default)
    Chat {
        /// Catalog CSV used when the store is empty
        #[arg(long)]
        csv: Option<String>,
    },
    /// Build the course index when the store is empty
    Index {
        #[arg(long)]
        csv: Option<String>,
    },
    /// Print the nearest courses for a query
    Search { query: String },
    /// List courses by instructor or subject
    Courses {
        #[arg(long, conflicts_with = "subject")]
        instructor: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        csv: Option<String>,
    },
    /// Run judged evaluation cases from a TOML file
    Eval { cases: String },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "courseclaw=debug,courseclaw_agent=debug,courseclaw_knowledge=debug,courseclaw_providers=debug,courseclaw_tools=debug"
    } else {
        "courseclaw=info,courseclaw_agent=info,courseclaw_knowledge=info,courseclaw_providers=warn,courseclaw_tools=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => CourseClawConfig::load_from(&expand_path(path))?,
        None => CourseClawConfig::load()?,
    };

    match cli.command.unwrap_or(Commands::Chat { csv: None }) {
        Commands::Chat { csv } => chat(&config, csv.as_deref()).await,
        Commands::Index { csv } => {
            let backend = connect(&config)?;
            let store = open_store(&config)?;
            let report = ensure_index(&config, &store, backend, csv.as_deref()).await?;
            if report.existing > 0 {
                println!("📦 {} courses already indexed", report.existing);
            } else {
                println!(
                    "✅ Indexed {} courses in {} batch(es)",
                    report.inserted, report.batches
                );
            }
            Ok(())
        }
        Commands::Search { query } => {
            let backend = connect(&config)?;
            let store = open_store(&config)?;
            let retriever = Retriever::new(store, backend);
            for hit in retriever.search_hits(&query).await? {
                println!("[{:>4}] {:.4}  {}", hit.id, hit.distance, hit.text);
            }
            Ok(())
        }
        Commands::Courses {
            instructor,
            subject,
            csv,
        } => list_courses(&config, instructor, subject, csv.as_deref()),
        Commands::Eval { cases } => eval(&config, &expand_path(&cases)).await,
        Commands::Config => {
            let mut shown = config.clone();
            if !shown.api_key.is_empty() {
                shown.api_key = "***".into();
            }
            print!("{}", toml::to_string_pretty(&shown)?);
            Ok(())
        }
    }
}

/// Provider used for both chat and embeddings. Fails when no key is available.
fn connect(config: &CourseClawConfig) -> Result<Arc<OpenAiCompatibleProvider>> {
    let provider = courseclaw_providers::create_provider(config).with_context(|| {
        format!(
            "cannot start provider '{}' (set OPENAI_PROJECT_KEY or api_key in the config)",
            config.provider
        )
    })?;
    Ok(Arc::new(provider))
}

fn open_store(config: &CourseClawConfig) -> Result<Arc<RecordStore>> {
    let path = config.knowledge.db_path();
    let store = RecordStore::open(&path, config.embedding.dimensions)
        .with_context(|| format!("cannot open course store at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn csv_path(config: &CourseClawConfig, csv: Option<&str>) -> PathBuf {
    csv.map(expand_path)
        .unwrap_or_else(|| config.knowledge.csv_path())
}

async fn ensure_index(
    config: &CourseClawConfig,
    store: &Arc<RecordStore>,
    embedder: Arc<dyn Embedder>,
    csv: Option<&str>,
) -> Result<IndexReport> {
    let builder = IndexBuilder::new(store.clone(), embedder);
    if store.count()? > 0 {
        return Ok(builder.build_if_empty(&[]).await?);
    }

    let path = csv_path(config, csv);
    let rows = CatalogReader::read_path(&path)
        .with_context(|| format!("cannot read catalog {}", path.display()))?;
    if rows.skipped > 0 {
        tracing::warn!("⚠️ Skipped {} malformed catalog row(s)", rows.skipped);
    }
    Ok(builder.build_if_empty(&rows.records).await?)
}

fn build_agent(
    config: &CourseClawConfig,
    backend: Arc<OpenAiCompatibleProvider>,
    store: Arc<RecordStore>,
) -> Agent {
    let retriever = Arc::new(Retriever::new(store, backend.clone()));
    let mut tools = ToolRegistry::new();
    tools.register(Box::new(SearchCoursesTool::new(retriever)));
    Agent::from_config(config, backend, tools)
}

async fn chat(config: &CourseClawConfig, csv: Option<&str>) -> Result<()> {
    let backend = connect(config)?;
    let store = open_store(config)?;
    ensure_index(config, &store, backend.clone(), csv).await?;

    let mut agent = build_agent(config, backend, store);
    tracing::info!(
        "🎓 {} ready: provider={} model={} tools={}",
        config.identity.name,
        agent.provider_name(),
        agent.model_name(),
        agent.tool_count()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    print!("Ask about courses: ");
    stdout.flush()?;
    while let Some(line) = lines.next_line().await? {
        let Some(question) = question_from(&line) else {
            print!("Ask about courses: ");
            stdout.flush()?;
            continue;
        };

        match agent.process(question).await {
            Ok(answer) => println!("{answer}"),
            Err(e) => eprintln!("❌ {e}"),
        }
        print!("\nAsk about courses: ");
        stdout.flush()?;
    }
    println!();
    Ok(())
}

/// Blank lines are skipped; anything else goes to the model unchanged.
fn question_from(line: &str) -> Option<&str> {
    if line.trim().is_empty() { None } else { Some(line) }
}

fn list_courses(
    config: &CourseClawConfig,
    instructor: Option<String>,
    subject: Option<String>,
    csv: Option<&str>,
) -> Result<()> {
    let path = csv_path(config, csv);
    let rows = CatalogReader::read_path(&path)
        .with_context(|| format!("cannot read catalog {}", path.display()))?;
    let catalog = CourseCatalog::from_records(&rows.records);

    let courses = match (&instructor, &subject) {
        (Some(name), _) => catalog.courses_by_instructor(name),
        (None, Some(subject)) => catalog.courses_by_subject(subject),
        (None, None) => {
            println!("Subjects: {}", catalog.subjects().collect::<Vec<_>>().join(", "));
            println!("Instructors: {}", catalog.instructors().count());
            return Ok(());
        }
    };

    if courses.is_empty() {
        println!("No matching courses.");
    }
    for course in courses {
        println!("{}", course.render());
    }
    Ok(())
}

async fn eval(config: &CourseClawConfig, cases: &Path) -> Result<()> {
    let suite = EvalSuite::load(cases)
        .with_context(|| format!("cannot load eval cases from {}", cases.display()))?;

    let backend = connect(config)?;
    let store = open_store(config)?;
    ensure_index(config, &store, backend.clone(), None).await?;

    let judge_params = GenerateParams {
        model: config.chat_model.clone(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };
    let judge = SimilarityJudge::new(backend.clone() as Arc<dyn Provider>, judge_params);
    let mut agent = build_agent(config, backend, store);

    let outcomes = run_eval(&mut agent, &judge, &suite).await?;
    let failed: Vec<_> = outcomes.iter().filter(|o| !o.passed()).collect();

    println!("\n{} / {} cases passed", outcomes.len() - failed.len(), outcomes.len());
    for outcome in &failed {
        println!(
            "  ❌ {}: similarity {} < {}\n     Got: {:?}",
            outcome.name, outcome.score, outcome.min_score, outcome.answer
        );
    }

    if !failed.is_empty() {
        anyhow::bail!("{} eval case(s) below threshold", failed.len());
    }
    Ok(())
}
