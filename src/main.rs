use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use flake8_markdown::{reporting, LintConfig, Linter, RunSummary};
use std::io::Write;
use std::path::PathBuf;
use std::process::exit;

/// Run flake8 over the Python code blocks of Markdown documents.
#[derive(Debug, Parser)]
#[command(name = "flake8-markdown", version, about)]
struct Cli {
    /// Markdown files or glob patterns (`**` matches any number of directories)
    #[arg(required = true, num_args = 1.., value_name = "GLOB")]
    globs: Vec<String>,

    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Checker executable
    #[arg(long, value_name = "COMMAND")]
    checker: Option<String>,

    /// Ignore the checker's own configuration files
    #[arg(long)]
    isolated: bool,

    /// Number of documents checked concurrently
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Per-invocation checker timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,
}

impl Cli {
    fn load_config(&self) -> Result<LintConfig> {
        let mut config = LintConfig::load(self.config.as_deref())?;

        if let Some(checker) = &self.checker {
            config.checker.command = checker.clone();
        }
        if self.isolated {
            config.checker.isolated = true;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = Some(jobs);
        }
        if let Some(timeout) = self.timeout {
            config.checker.timeout_ms = Some(timeout);
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] ({}): {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn run(cli: &Cli) -> Result<RunSummary> {
    let config = cli.load_config()?;
    let jobs = config.jobs();
    log::debug!("Checking with {:?} on {} worker(s)", config.checker, jobs);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(jobs)
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let linter = Linter::from_config(&config);
    runtime.block_on(linter.run(&cli.globs, reporting::print_file_outcome))
}

pub fn main() {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(summary) => {
            reporting::log_statistics(&summary);
            reporting::report_failed_files(&summary);
            exit(summary.exit_code());
        }
        Err(e) => {
            reporting::report_fatal(&e);
            exit(1);
        }
    }
}
