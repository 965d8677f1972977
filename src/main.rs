use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use loglane::config::{self, LoggerConfig};
use loglane::export::DirectoryShare;
use loglane::logging::{self, Logger, Severity};

/// loglane - write, inspect, rotate and export the application log file
#[derive(Parser, Debug)]
#[command(name = "loglane")]
#[command(about = "Leveled logging with a single rotating log file")]
struct Args {
    /// Config file (default: ~/.loglane/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log directory, overriding the config file
    #[arg(short, long)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append a message to the log
    Write {
        /// DEV, INFO, WARN or ERROR
        #[arg(short, long, default_value = "INFO")]
        level: Severity,

        /// Prefix the message with its call site
        #[arg(long)]
        call_site: bool,

        message: Vec<String>,
    },
    /// Print the log file
    Read,
    /// Show whether the log file exists, its size and path
    Stat {
        #[arg(long)]
        json: bool,
    },
    /// Trim the log file to its newer half if it is too large
    Rotate {
        /// Threshold in megabytes (default: from config)
        #[arg(long)]
        max_mb: Option<f64>,
    },
    /// Delete the log file
    Clear,
    /// Delete everything inside a directory (default: the log directory)
    Purge { dir: Option<PathBuf> },
    /// Copy the log file into a directory for sharing
    Export {
        #[arg(long)]
        to: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_console_logging(logging::DEFAULT_FILTER)?;

    let args = Args::parse();

    let mut logger_config = match &args.config {
        Some(path) => LoggerConfig::load_from(path)?,
        None => LoggerConfig::load()?,
    };
    if let Some(dir) = args.dir {
        logger_config.log_dir = dir;
    }
    config::ensure_directories(&logger_config)?;

    let logger = Logger::from_config(&logger_config)?;

    match args.command {
        Command::Write {
            level,
            call_site,
            message,
        } => {
            if call_site {
                logger.set_call_site_printing(true);
            }
            logger.log(level, message.join(" "));
        }
        Command::Read => match logger.read_logs() {
            Some(content) => print!("{}", content),
            None => eprintln!("No log file"),
        },
        Command::Stat { json } => {
            let info = logger.log_file_info();
            if json {
                let out =
                    serde_json::to_string_pretty(&info).context("Failed to serialize stat")?;
                println!("{}", out);
            } else {
                let path = info
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("exists: {}", info.exists);
                println!("size:   {}", info.size);
                println!("path:   {}", path);
            }
        }
        Command::Rotate { max_mb } => match max_mb {
            Some(mb) => logger.rotate((mb.max(0.0) * 1024.0 * 1024.0) as u64),
            None => logger.rotate_if_needed(),
        },
        Command::Clear => logger.clear_logs(),
        Command::Purge { dir } => {
            let dir = dir.unwrap_or_else(|| logger_config.resolved_log_dir());
            if !logging::remove_all_in(&dir) {
                anyhow::bail!("Failed to delete everything in {}", dir.display());
            }
        }
        Command::Export { to } => {
            let request = logger.share_log_file(&DirectoryShare::new(&to))?;
            println!(
                "Exported {} ({}) to {}",
                request.path.display(),
                request.mime_type,
                to.display()
            );
        }
    }

    logger.flush().await;
    Ok(())
}
