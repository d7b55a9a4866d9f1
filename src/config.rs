use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Component, Path};

/// Configuration for a flake8-markdown run.
///
/// Read from the TOML file passed with `--config`. Every key is optional;
/// an empty file is equivalent to the defaults. The file is never looked up
/// implicitly.
///
/// # Example
///
/// ```toml
/// jobs = 4
///
/// [checker]
/// command = "${HOME}/.local/bin/flake8"
/// args = ["-"]
/// isolated = true
///
/// [fences]
/// plain = ["python", "py"]
/// session = ["pycon"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LintConfig {
    /// How the external checker is invoked
    pub checker: CheckerConfig,

    /// Which fence tags mark checkable blocks
    pub fences: FenceConfig,

    /// Number of documents checked concurrently (defaults to the CPU count)
    pub jobs: Option<usize>,
}

/// Invocation of the external style checker.
///
/// `command` and `args` support `${VAR_NAME}` environment variable expansion.
///
/// # Security
///
/// The command is validated so it cannot smuggle shell metacharacters or
/// parent directory traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Checker executable
    pub command: String,

    /// Arguments; the source is always fed on stdin
    pub args: Vec<String>,

    /// Pass `isolated_flag` so the checker ignores ambient configuration files
    pub isolated: bool,

    /// Flag that disables the checker's configuration discovery
    pub isolated_flag: String,

    /// Per-invocation timeout; unset or zero waits forever
    pub timeout_ms: Option<u64>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            command: "flake8".to_string(),
            args: vec!["-".to_string()],
            isolated: false,
            isolated_flag: "--isolated".to_string(),
            timeout_ms: None,
        }
    }
}

/// Fence info-string tags, matched as prefixes of the info string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FenceConfig {
    /// Tags of ordinary source blocks
    pub plain: Vec<String>,

    /// Tags of interactive session transcripts
    pub session: Vec<String>,
}

impl Default for FenceConfig {
    fn default() -> Self {
        Self {
            plain: vec!["python".to_string(), "py".to_string()],
            session: vec!["pycon".to_string()],
        }
    }
}

impl CheckerConfig {
    /// Validate the checker invocation for security and correctness
    pub fn validate(&self) -> Result<()> {
        if self.command.is_empty() {
            anyhow::bail!("Checker command cannot be empty");
        }

        let dangerous_chars = [';', '|', '&', '`', '\n', '\r'];
        if let Some(ch) = dangerous_chars.iter().find(|ch| self.command.contains(**ch)) {
            anyhow::bail!(
                "Checker command contains invalid character '{}': {}",
                ch.escape_default(),
                self.command
            );
        }

        if Path::new(&self.command)
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            anyhow::bail!("Checker command cannot contain '..': {}", self.command);
        }

        if self.isolated && self.isolated_flag.is_empty() {
            anyhow::bail!("Isolated mode requested but isolated_flag is empty");
        }

        Ok(())
    }
}

impl FenceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.plain.is_empty() {
            anyhow::bail!("At least one plain fence tag is required");
        }

        for tag in self.plain.iter().chain(&self.session) {
            if tag.is_empty() {
                anyhow::bail!("Fence tags cannot be empty");
            }
            if tag.contains(|ch: char| ch.is_whitespace() || ch == '`') {
                anyhow::bail!("Fence tag contains whitespace or backticks: {:?}", tag);
            }
        }

        Ok(())
    }
}

impl LintConfig {
    /// Loads the configuration file if one was given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a TOML configuration file and expand environment variables
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: LintConfig = toml::from_str(content)?;

        config.checker.command = expand_env_vars(&config.checker.command);
        for arg in config.checker.args.iter_mut() {
            *arg = expand_env_vars(arg);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.checker
            .validate()
            .context("Invalid [checker] configuration")?;
        self.fences
            .validate()
            .context("Invalid [fences] configuration")?;
        Ok(())
    }

    /// Effective worker count; zero or unset falls back to the CPU count.
    pub fn jobs(&self) -> usize {
        self.jobs
            .filter(|jobs| *jobs > 0)
            .unwrap_or_else(num_cpus::get)
    }
}

/// Expand `${VAR_NAME}` references in a single pass.
///
/// Expanded values are never rescanned. Unset variables and unterminated
/// references are left as written.
fn expand_env_vars(input: &str) -> String {
    let mut expanded = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            expanded.push_str(&rest[start..]);
            return expanded;
        };

        let name = &after[..end];
        match env::var(name) {
            Ok(value) => expanded.push_str(&value),
            Err(_) => {
                log::warn!(
                    "Environment variable '{}' not found, leaving unexpanded",
                    name
                );
                expanded.push_str(&rest[start..start + end + 3]);
            }
        }
        rest = &after[end + 1..];
    }

    expanded.push_str(rest);
    expanded
}
