//! starmail CLI - GitHub stargazer contact export and NDJSON conversion.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use starmail::convert::{ndjson_to_csv, ndjson_to_xlsx, CsvOptions};
use starmail::fetch::BarProgress;
use starmail::{CheckpointStore, Config, FetchParams, GithubClient, StarFetcher};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "starmail")]
#[command(version)]
#[command(about = "Export GitHub stargazer contacts and convert NDJSON to CSV/XLSX")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults apply if missing)
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch stargazer contact records into an NDJSON file
    Fetch {
        /// Repository owner
        owner: String,

        /// Repository name
        repo: String,

        /// Path to the NDJSON output file
        #[arg(short, long)]
        output: PathBuf,

        /// Resume from an existing checkpoint instead of starting fresh
        #[arg(long)]
        resume: bool,

        /// Directory for checkpoint files
        #[arg(long, default_value = ".starmail")]
        checkpoint_dir: PathBuf,

        /// GitHub token (overrides config file and environment)
        #[arg(long)]
        token: Option<String>,
    },

    /// Convert an NDJSON file to CSV
    Csv {
        /// Path to the NDJSON input file
        input: PathBuf,

        /// Path to the CSV output file (default: input with .csv extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter (single byte)
        #[arg(long)]
        delimiter: Option<String>,

        /// Omit the header row
        #[arg(long)]
        no_headers: bool,
    },

    /// Convert an NDJSON file to an XLSX spreadsheet
    Xlsx {
        /// Path to the NDJSON input file
        input: PathBuf,

        /// Path to the XLSX output file (default: input with .xlsx extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worksheet name
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Validate configuration file and token resolution
    Validate,

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn print_example_config() {
    let example = r#"# starmail configuration file

[github]
# Token (can also use GITHUB_TOKEN env var)
# token = "ghp_..."
token_env = "GITHUB_TOKEN"
graphql_url = "https://api.github.com/graphql"
timeout_secs = 30
max_retries = 5
page_size = 100

[convert]
delimiter = ","
include_headers = true
sheet_name = "Contacts"
"#;
    println!("{example}");
}

fn default_output(input: &std::path::Path, extension: &str) -> PathBuf {
    input.with_extension(extension)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Example => {
            print_example_config();
            return Ok(());
        }

        Commands::Validate => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            config.resolve_token().context("Failed to resolve token")?;

            info!("Configuration is valid");
            info!("  GraphQL endpoint: {}", config.github.graphql_url);
            info!("  Page size: {}", config.github.page_size);
            info!("  Max retries: {}", config.github.max_retries);
            return Ok(());
        }

        Commands::Fetch {
            owner,
            repo,
            output,
            resume,
            checkpoint_dir,
            token,
        } => {
            let config = Config::load_or_default(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            let token = match token {
                Some(t) => t,
                None => config.resolve_token().context("Failed to resolve token")?,
            };

            let client = GithubClient::new(token, &config.github)?;
            let store = CheckpointStore::for_run(&checkpoint_dir, &owner, &repo)?;
            let fetcher = StarFetcher::new(client, store);

            let params = FetchParams {
                owner,
                repo,
                output: output.clone(),
                resume,
            };
            let mut progress = BarProgress::new();
            let outcome = fetcher.run(&params, &mut progress).await?;

            println!("\n=== Fetch Complete ===");
            println!("Stargazers:  {}", outcome.records_seen);
            println!("With email:  {}", outcome.records_written);
            println!("Pages:       {}", outcome.pages);
            println!("Output:      {output:?}");
        }

        Commands::Csv {
            input,
            output,
            delimiter,
            no_headers,
        } => {
            let config = Config::load_or_default(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            let output = output.unwrap_or_else(|| default_output(&input, "csv"));
            let options = CsvOptions {
                delimiter: delimiter.unwrap_or(config.convert.delimiter),
                include_headers: !no_headers && config.convert.include_headers,
            };
            let rows = ndjson_to_csv(&input, &output, &options)?;

            println!("\n=== CSV Conversion Complete ===");
            println!("Rows:        {rows}");
            println!("Output:      {output:?}");
        }

        Commands::Xlsx {
            input,
            output,
            sheet,
        } => {
            let config = Config::load_or_default(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            let output = output.unwrap_or_else(|| default_output(&input, "xlsx"));
            let sheet = sheet.unwrap_or(config.convert.sheet_name);
            let rows = ndjson_to_xlsx(&input, &output, &sheet)?;

            println!("\n=== XLSX Conversion Complete ===");
            println!("Rows:        {rows}");
            println!("Sheet:       {sheet}");
            println!("Output:      {output:?}");
        }
    }

    Ok(())
}
