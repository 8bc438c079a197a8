use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use reposnap::{
    config::Config,
    filter::{excluded_directories, recognized_extensions},
    output::{format_result_to_string, print_rate_limit, print_result, OutputFormat},
    provider::GitHubProvider,
    Session,
};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const RATE_LIMITED: u8 = 2;
}

#[derive(Parser)]
#[command(name = "reposnap")]
#[command(
    author,
    version,
    about = "Fetch the source files of a GitHub repository as a path-to-text map"
)]
struct Cli {
    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a repository and print its source files
    Scan {
        /// Repository URL or owner/name shorthand
        repo: String,

        /// GitHub access token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Only keep these extensions (e.g. py,rs)
        #[arg(short, long, value_delimiter = ',')]
        ext: Vec<String>,

        /// Branch, tag or commit to scan instead of the default branch
        #[arg(short, long)]
        branch: Option<String>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show the remaining API quota for a token
    RateLimit {
        /// GitHub access token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// List recognized extensions and excluded directories
    Extensions,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "reposnap=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            repo,
            token,
            ext,
            branch,
            format,
            output,
        } => {
            let format_str = format.unwrap_or(config.default_format.clone());
            let extensions = if ext.is_empty() {
                config.default_extensions.clone()
            } else {
                Some(ext)
            };

            run_scan(&config, &repo, token, extensions, branch, format_str, output).await
        }
        Commands::RateLimit { token } => {
            let provider = GitHubProvider::new(&config)?;
            let mut session = Session::with_config(provider, &config);
            if let Some(token) = token {
                session.authenticate(token);
            }
            let info = session.rate_limit_status().await?;
            print_rate_limit(&info);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Extensions => {
            list_extensions();
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    config: &Config,
    repo: &str,
    token: Option<String>,
    extensions: Option<Vec<String>>,
    branch: Option<String>,
    format: String,
    output_file: Option<String>,
) -> Result<u8> {
    let format = OutputFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table && output_file.is_none();

    let provider = GitHubProvider::new(config)?;
    let mut session = Session::with_config(provider, config);
    if let Some(token) = token {
        session.authenticate(token);
    }
    session.branch(branch);

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Scanning {}...", repo));
        Some(pb)
    } else {
        None
    };

    let outcome = session.scan(repo, extensions.as_deref()).await;

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let result = match outcome {
        Ok(result) => result,
        Err(e) if e.is_rate_limited() => {
            eprintln!("Error: {}", e);
            eprintln!("Wait until the reset time or use a different token.");
            return Ok(exit_codes::RATE_LIMITED);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = output_file {
        let text = format_result_to_string(result, format)?;
        std::fs::write(&path, text)?;
        println!("Results written to: {}", path);
    } else {
        print_result(result, format)?;
    }

    Ok(exit_codes::SUCCESS)
}

fn list_extensions() {
    println!("Recognized extensions:");
    println!("  {}", recognized_extensions().join(" "));
    println!();
    println!("Excluded directories (matched anywhere in a path):");
    println!("  {}", excluded_directories().join(" "));
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'reposnap config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
