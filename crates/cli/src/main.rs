use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rca_agents::{analyze, AnalysisOptions, Incident, OpenAiChat};
use rca_evidence_store::{EvidenceStore, HashingEmbedder, MechanismCatalog, SharedStore};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rca")]
#[command(about = "Retrieval-augmented failure-mechanism diagnosis", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an incident: retrieve evidence, hypothesize mechanisms,
    /// generate recommendations
    Analyze(AnalyzeArgs),

    /// Rank evidence chunks for an ad hoc query (retrieval debugging)
    Retrieve(RetrieveArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to the evidence corpus (JSONL)
    #[arg(long)]
    corpus: PathBuf,

    /// Path to the mechanism reference catalog (JSON array)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Incident JSON file, or '-' for stdin
    #[arg(long, default_value = "-")]
    incident: String,

    /// Catalog mechanism id to inject ahead of retrieved handbook evidence
    #[arg(long)]
    mechanism_id: Option<String>,

    /// Combined retrieval depth before partitioning by corpus kind
    #[arg(long, default_value_t = rca_agents::DEFAULT_TOP_K)]
    top_k: usize,
}

#[derive(Args)]
struct RetrieveArgs {
    /// Path to the evidence corpus (JSONL)
    #[arg(long)]
    corpus: PathBuf,

    /// Query text
    #[arg(long)]
    query: String,

    /// Number of chunks to return
    #[arg(long, default_value_t = 8)]
    top_k: usize,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_filter = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

fn read_incident(source: &str) -> Result<Incident> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading incident from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {source}"))?
    };
    serde_json::from_str(&raw).context("parsing incident JSON")
}

async fn load_store(shared: &SharedStore, corpus: &PathBuf) -> Result<Arc<EvidenceStore>> {
    let store = shared
        .get_or_init(|| async {
            EvidenceStore::load(corpus, Arc::new(HashingEmbedder::default())).await
        })
        .await
        .context("loading evidence corpus")?;
    Ok(store)
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    dotenv::dotenv().ok();

    let shared = SharedStore::new();
    let store = load_store(&shared, &args.corpus).await?;

    let catalog = match &args.catalog {
        Some(path) => MechanismCatalog::load(path)
            .await
            .context("loading mechanism catalog")?,
        None => MechanismCatalog::new(),
    };

    let incident = read_incident(&args.incident)?;
    let model = OpenAiChat::from_env().context("configuring generative endpoint")?;

    let options = AnalysisOptions {
        top_k: args.top_k,
        reference_mechanism: args.mechanism_id,
    };

    let report = analyze(&store, &catalog, &model, incident, &options).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_retrieve(args: RetrieveArgs) -> Result<()> {
    let shared = SharedStore::new();
    let store = load_store(&shared, &args.corpus).await?;

    let hits = store.retrieve(&args.query, args.top_k).await?;
    let rows: Vec<serde_json::Value> = hits
        .iter()
        .map(|hit| {
            serde_json::json!({
                "id": hit.chunk.id,
                "kind": hit.chunk.kind,
                "source": hit.chunk.source,
                "score": hit.score,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::Retrieve(args) => run_retrieve(args).await,
    }
}
