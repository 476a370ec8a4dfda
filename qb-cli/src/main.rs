//! Query Bridge CLI: ingest documents into a durable store, then ask
//! questions answered from the indexed content.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use qb_confluence::ConfluenceClient;
use qb_rag::gemini::{GeminiEmbeddingProvider, GeminiLanguageModel};
use qb_rag::pipeline::IngestReport;
use qb_rag::{
    ConversationMemory, JsonFileVectorStore, LineChunker, PdfFileSource, RagConfig, RagPipeline,
    WikiSpaceSource,
};

#[derive(Parser)]
#[command(name = "qb", about = "Query Bridge — ask questions grounded in your own documents", version)]
struct Cli {
    /// Directory holding the durable vector store
    #[arg(long, global = true, default_value = "./qb_storage")]
    store_dir: PathBuf,

    /// Collection name inside the store
    #[arg(long, global = true, default_value = "documents")]
    collection: String,

    /// Minimum similarity a retrieved chunk must reach
    #[arg(long, global = true, default_value_t = 0.0)]
    similarity_threshold: f32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest documents into the knowledge base
    #[command(subcommand)]
    Ingest(IngestCommand),

    /// List the wiki spaces available for ingestion
    Spaces,

    /// Interactive question-answering session
    Chat,
}

#[derive(Subcommand)]
enum IngestCommand {
    /// Ingest standalone PDF files
    Pdf {
        /// PDF files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ingest every page of a wiki space (plus PDF attachments)
    Wiki {
        /// Space key to ingest
        #[arg(long)]
        space: String,
    },
}

fn confluence_client() -> anyhow::Result<Arc<ConfluenceClient>> {
    let base_url =
        std::env::var("CONFLUENCE_URL").context("CONFLUENCE_URL environment variable not set")?;
    let user =
        std::env::var("CONFLUENCE_USER").context("CONFLUENCE_USER environment variable not set")?;
    let token = std::env::var("CONFLUENCE_TOKEN")
        .context("CONFLUENCE_TOKEN environment variable not set")?;
    Ok(Arc::new(ConfluenceClient::new(base_url, user, token)?))
}

/// Build the process-lifetime pipeline: embedding provider, store handle,
/// and chunker are constructed once here and shared from then on.
fn build_pipeline(cli: &Cli, with_model: bool) -> anyhow::Result<RagPipeline> {
    let config = RagConfig::builder()
        .similarity_threshold(cli.similarity_threshold)
        .build()?;

    let mut builder = RagPipeline::builder()
        .config(config.clone())
        .embedding_provider(Arc::new(GeminiEmbeddingProvider::from_env()?))
        .vector_store(Arc::new(JsonFileVectorStore::open(&cli.store_dir)?))
        .chunker(Arc::new(LineChunker::new(config.chunk_size, config.chunk_overlap)));

    if with_model {
        builder = builder.language_model(Arc::new(GeminiLanguageModel::from_env()?));
    }

    Ok(builder.build()?)
}

fn print_report(report: &IngestReport) {
    println!(
        "Ingested {} document(s), {} chunk(s) stored.",
        report.documents_ingested, report.chunks_stored
    );
    for failure in &report.failures {
        println!("  failed: {} ({})", failure.item, failure.reason);
    }
}

async fn run_chat(cli: &Cli) -> anyhow::Result<()> {
    let pipeline = build_pipeline(cli, true)?;
    pipeline.create_collection(&cli.collection).await?;

    // One conversation memory per chat session; it dies with the session.
    let mut memory = ConversationMemory::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Query Bridge chat. Ask away; empty line or Ctrl-D quits.");
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        let answer = pipeline.ask(&cli.collection, question, &mut memory).await?;
        println!("{answer}\n");
    }

    info!(turns = memory.len(), "chat session finished");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Ingest(IngestCommand::Pdf { files }) => {
            let pipeline = build_pipeline(&cli, false)?;
            pipeline.create_collection(&cli.collection).await?;
            let source = PdfFileSource::new(files.clone());
            let report = pipeline.ingest_source(&cli.collection, &source).await?;
            print_report(&report);
        }
        Command::Ingest(IngestCommand::Wiki { space }) => {
            let pipeline = build_pipeline(&cli, false)?;
            pipeline.create_collection(&cli.collection).await?;
            let source = WikiSpaceSource::new(confluence_client()?, space);
            let report = pipeline.ingest_source(&cli.collection, &source).await?;
            print_report(&report);
        }
        Command::Spaces => {
            let client = confluence_client()?;
            for space in client.list_spaces().await? {
                println!("{}\t{}", space.key, space.name);
            }
        }
        Command::Chat => run_chat(&cli).await?,
    }

    Ok(())
}
