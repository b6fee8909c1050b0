use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use gauss_doctor::config::{self, Config};
use gauss_doctor::diagnosis::{decode_lossy, DiagnosisError};
use gauss_doctor::theme::Theme;
use gauss_doctor::{
    matcher, ChatCompletionClient, ErrorInput, Orchestrator, QueryBudget, ReferenceCatalog,
    ResponseCache,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gauss-doctor", version, about = "Diagnose failed Gaussian jobs")]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a pasted error message or the tail of a log file
    Analyze {
        /// Error text
        text: Option<String>,
        /// A Gaussian .log/.out file; only its last lines are used
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Whose free-query budget to charge
        #[arg(long, default_value = "local")]
        identity: String,
    },
    /// List every known error that appears anywhere in a log file
    Scan { file: PathBuf },
    /// Write a default config file
    Init,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("gauss_doctor=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::get_config_path()?,
    };

    if matches!(cli.command, Some(Command::Init)) || !config_path.exists() {
        if config_path.exists() {
            println!("Config already exists at {:?}", config_path);
        } else {
            Config::create_default(&config_path)?;
            println!("Created default config file at {:?}", config_path);
            println!("Set OPENAI_API_KEY or add api_key to the config.");
            println!("Point storage.catalog_source at your error table.");
        }
        return Ok(());
    }

    let config = Config::load(&config_path)?;
    let theme = Theme::for_display(config.display.color_output);
    let catalog = Arc::new(
        ReferenceCatalog::load_or_empty(config.storage.catalog_source.as_deref()).await,
    );

    if let Some(Command::Scan { file }) = &cli.command {
        return scan(file, &catalog, &theme);
    }

    let cache = open_cache(&config)?;
    let mut orchestrator = Orchestrator::new(
        catalog,
        cache,
        ChatCompletionClient::new(config.ai.clone()),
        config.diagnosis.clone(),
    );

    match cli.command {
        Some(Command::Analyze {
            text,
            file,
            identity,
        }) => {
            let input = match (text, file) {
                (_, Some(path)) => read_upload(&path)?,
                (Some(text), None) => ErrorInput::Pasted(text),
                (None, None) => ErrorInput::Pasted(String::new()),
            };
            let mut budget = QueryBudget::new(identity, config.diagnosis.max_free_queries);
            run_once(&mut orchestrator, &input, &mut budget, &theme).await;
            Ok(())
        }
        _ => interactive(&mut orchestrator, &config, &theme).await,
    }
}

fn open_cache(config: &Config) -> Result<ResponseCache> {
    if !config.diagnosis.enable_cache {
        return Ok(ResponseCache::in_memory());
    }
    let path = config.cache_path()?;
    Ok(ResponseCache::open(&path).unwrap_or_else(|e| {
        warn!("{}; answers will only be remembered for this session", e);
        ResponseCache::in_memory()
    }))
}

fn read_upload(path: &Path) -> Result<ErrorInput> {
    let bytes = std::fs::read(path).with_context(|| format!("Could not read {:?}", path))?;
    Ok(ErrorInput::Upload(bytes))
}

fn scan(file: &Path, catalog: &ReferenceCatalog, theme: &Theme) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Could not read {:?}", file))?;
    let text = decode_lossy(&bytes);
    let found = matcher::find_all(&text, catalog.signatures());

    if found.is_empty() {
        println!("{}", theme.info.apply("No known errors found in this log."));
        return Ok(());
    }
    for signature in found {
        println!("{}", theme.header.apply(&signature.pattern));
        println!("{}\n", gauss_doctor::diagnosis::render_signature(signature));
    }
    Ok(())
}

async fn run_once(
    orchestrator: &mut Orchestrator<ChatCompletionClient>,
    input: &ErrorInput,
    budget: &mut QueryBudget,
    theme: &Theme,
) {
    match orchestrator.analyze(input, Some(&mut *budget)).await {
        Ok(result) => println!("{}", theme.render(&result, Some(&*budget))),
        Err(DiagnosisError::EmptyInput) => {
            eprintln!("{}", theme.warning.apply(&DiagnosisError::EmptyInput.to_string()))
        }
    }
}

async fn interactive(
    orchestrator: &mut Orchestrator<ChatCompletionClient>,
    config: &Config,
    theme: &Theme,
) -> Result<()> {
    println!("{}", "Gaussian AI Error Assistant".green().bold());
    println!(
        "Paste an error line, or '@path/to/job.log' to analyze a log file. \
         First {} AI queries are free.",
        config.diagnosis.max_free_queries
    );
    println!(
        "Known signatures: {}. Type 'exit' to quit\n",
        orchestrator.catalog().len()
    );

    let mut budget = QueryBudget::new("interactive", config.diagnosis.max_free_queries);

    loop {
        print!("gauss-doctor> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line == "exit" {
            break;
        }

        let input = match line.strip_prefix('@') {
            Some(path) => match read_upload(Path::new(path.trim())) {
                Ok(input) => input,
                Err(e) => {
                    eprintln!("{}: {:#}", "Error".red().bold(), e);
                    continue;
                }
            },
            None => ErrorInput::Pasted(line.to_string()),
        };

        run_once(orchestrator, &input, &mut budget, theme).await;
        println!();
    }

    Ok(())
}
