mod pipeline;
mod record;

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    clap::{Args, Parser, Subcommand, builder::RangedU64ValueParser},
    ragline_config::RaglineConfig,
    secrecy::Secret,
    tracing::info,
    tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::{
    pipeline::Pipeline,
    record::{RunRecord, append_record},
};

#[derive(Parser, Debug)]
#[command(name = "ragline")]
#[command(about = "Retrieve context from local documents and ask a local model about it")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./ragline.toml, then the user config dir)
    #[arg(long, global = true, env = "RAGLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Document directory, overrides `docs.dir`
    #[arg(long, global = true)]
    docs: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index, retrieve, prompt the model and print its answer (default)
    Run {
        #[command(flatten)]
        query: QueryArgs,

        /// Print `{"response", "questions", "qa_pairs"}` as JSON
        #[arg(long)]
        json: bool,

        /// Answer every generated question from its own retrieved context
        #[arg(long)]
        answer: bool,

        /// Append a JSON-lines record of the run to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Index and print the ranked chunks, without generation
    Search {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Index and print the assembled prompt, without generation
    Prompt {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug, Default)]
struct QueryArgs {
    /// Retrieval query, overrides `prompt.query`
    #[arg(short, long)]
    query: Option<String>,

    /// Number of chunks to retrieve, overrides `retrieval.top_k`
    #[arg(short = 'k', long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    top_k: Option<usize>,
}

impl QueryArgs {
    fn resolve(&self, config: &RaglineConfig) -> (String, usize) {
        (
            self.query.clone().unwrap_or_else(|| config.prompt.query.clone()),
            self.top_k.unwrap_or(config.retrieval.top_k),
        )
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&Path>, docs: Option<PathBuf>) -> anyhow::Result<RaglineConfig> {
    let mut config = match path {
        Some(path) => ragline_config::load_config(path)?,
        None => ragline_config::discover_and_load()?,
    };
    if config.embeddings.api_key.is_none()
        && let Ok(key) = std::env::var("OPENAI_API_KEY")
    {
        config.embeddings.api_key = Some(Secret::new(key));
    }
    if let Some(dir) = docs {
        config.docs.dir = dir;
    }
    config.validate()?;
    Ok(config)
}

async fn indexed_pipeline(config: &RaglineConfig) -> anyhow::Result<Pipeline> {
    let mut pipeline = Pipeline::from_config(config)?;
    let report = pipeline
        .index()
        .await
        .with_context(|| format!("failed to index {}", config.docs.dir.display()))?;
    info!(
        documents = report.documents,
        chunks = report.chunks,
        skipped = report.skipped_files,
        "index ready"
    );
    Ok(pipeline)
}

async fn run(
    config: &RaglineConfig,
    query: &QueryArgs,
    json: bool,
    answer: bool,
    save: Option<&Path>,
) -> anyhow::Result<()> {
    let (query, top_k) = query.resolve(config);
    let pipeline = indexed_pipeline(config).await?;
    let output = pipeline.run(&query, top_k, answer).await?;

    if let Some(path) = save {
        append_record(path, &RunRecord::from_output(&output))?;
    }
    if json {
        let value = serde_json::json!({
            "response": output.response,
            "questions": output.questions,
            "qa_pairs": output.qa_pairs,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if answer {
        for pair in &output.qa_pairs {
            println!("Q: {}\nA: {}\n", pair.question, pair.answer);
        }
    } else {
        println!("{}", output.response);
    }
    Ok(())
}

async fn search(config: &RaglineConfig, query: &QueryArgs) -> anyhow::Result<()> {
    let (query, top_k) = query.resolve(config);
    let pipeline = indexed_pipeline(config).await?;
    let retrieval = pipeline.retrieve(&query, top_k).await?;
    for (rank, hit) in retrieval.results.iter().enumerate() {
        println!(
            "{}. {}#{} (distance {:.4})",
            rank + 1,
            hit.path.display(),
            hit.chunk_index,
            hit.distance
        );
        println!("{}\n", hit.text);
    }
    Ok(())
}

async fn prompt(config: &RaglineConfig, query: &QueryArgs) -> anyhow::Result<()> {
    let (query, top_k) = query.resolve(config);
    let pipeline = indexed_pipeline(config).await?;
    let retrieval = pipeline.retrieve(&query, top_k).await?;
    print!("{}", pipeline.build_prompt(&retrieval.context, &query));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    let config = load_config(cli.config.as_deref(), cli.docs)?;

    match cli.command.unwrap_or(Command::Run {
        query: QueryArgs::default(),
        json: false,
        answer: false,
        save: None,
    }) {
        Command::Run {
            query,
            json,
            answer,
            save,
        } => run(&config, &query, json, answer, save.as_deref()).await,
        Command::Search { query } => search(&config, &query).await,
        Command::Prompt { query } => prompt(&config, &query).await,
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        },
    }
}
