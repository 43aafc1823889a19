use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_SET: &str = "neo";
const DEFAULT_MAX_BUILD_CHOICES: usize = 1_000;
const MAX_SESSIONS: usize = 100_000;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root simulation configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub run_id: String,
    pub session: SessionConfig,
    #[serde(default)]
    pub cards: CardsConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: SimulationConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.session.validate()?;
        self.cards.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_agents(&mut self.agents)?;
        self.session.validate_seats(self.agents.len())?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Booster draft followed by a deck build per seat.
    Draft,
    /// Six-pack sealed pool and a deck build per seat.
    Sealed,
    Blackjack,
    /// First player and mulligans over sealed pools.
    Opening,
}

impl SessionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionKind::Draft => "draft",
            SessionKind::Sealed => "sealed",
            SessionKind::Blackjack => "blackjack",
            SessionKind::Opening => "opening",
        }
    }

    /// Inclusive seat range supported by the session's processes.
    pub const fn seats(self) -> (usize, usize) {
        match self {
            SessionKind::Draft => (2, 8),
            SessionKind::Sealed => (1, 8),
            SessionKind::Blackjack => (1, 7),
            SessionKind::Opening => (1, 8),
        }
    }

    pub const fn uses_cards(self) -> bool {
        !matches!(self, SessionKind::Blackjack)
    }
}

/// Session scheduling block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub kind: SessionKind,
    pub seed: Option<u64>,
    pub count: usize,
    #[serde(default = "default_set")]
    pub set: String,
    #[serde(default = "default_max_build_choices")]
    pub max_build_choices: usize,
}

impl SessionConfig {
    fn validate(&mut self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidField {
                field: "session.count".to_string(),
                message: "number of sessions must be greater than zero".to_string(),
            });
        }

        if self.count > MAX_SESSIONS {
            return Err(ValidationError::InvalidField {
                field: "session.count".to_string(),
                message: format!("at most {MAX_SESSIONS} sessions may be requested"),
            });
        }

        if self.max_build_choices == 0 {
            return Err(ValidationError::InvalidField {
                field: "session.max_build_choices".to_string(),
                message: "deck building needs at least one choice".to_string(),
            });
        }

        self.set = self.set.trim().to_ascii_lowercase();
        if self.kind.uses_cards() && self.set.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "session.set".to_string(),
                message: "set code must not be empty".to_string(),
            });
        }

        Ok(())
    }

    fn validate_seats(&self, agents: usize) -> Result<(), ValidationError> {
        let (min, max) = self.kind.seats();
        if !(min..=max).contains(&agents) {
            return Err(ValidationError::InvalidField {
                field: "agents".to_string(),
                message: format!(
                    "{} sessions seat {min} to {max} agents but {agents} are configured",
                    self.kind.as_str()
                ),
            });
        }
        Ok(())
    }
}

fn default_set() -> String {
    DEFAULT_SET.to_string()
}

fn default_max_build_choices() -> usize {
    DEFAULT_MAX_BUILD_CHOICES
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardSourceKind {
    #[default]
    Synthetic,
    Json,
}

/// Where card records come from.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CardsConfig {
    #[serde(default)]
    pub source: CardSourceKind,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl CardsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.source == CardSourceKind::Json && self.dir.is_none() {
            return Err(ValidationError::InvalidField {
                field: "cards.dir".to_string(),
                message: "json card source requires a directory".to_string(),
            });
        }
        Ok(())
    }
}

/// Definition of a seated agent.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Fixed,
    Random,
    Biased,
    Console,
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_agents(agents: &mut [AgentConfig]) -> Result<(), ValidationError> {
    if agents.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "agents".to_string(),
            message: "at least one agent must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut consoles = 0usize;
    for agent in agents.iter_mut() {
        if agent.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "agents.name".to_string(),
                message: "agent name must not be empty".to_string(),
            });
        }

        if !agent.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: format!("agents[{}].name", agent.name),
                message: "agent name contains invalid characters".to_string(),
            });
        }

        if !seen.insert(agent.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "agents".to_string(),
                message: format!("agent name '{}' defined more than once", agent.name),
            });
        }

        if agent.kind == AgentKind::Console {
            consoles += 1;
        }

        if agent.params.is_null() {
            agent.params = serde_yaml::Value::Mapping(Default::default());
        }
    }

    if consoles > 1 {
        return Err(ValidationError::InvalidField {
            field: "agents".to_string(),
            message: "only one console agent can share the terminal".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

impl ResolvedOutputs {
    /// Directory holding the summary, also used for the telemetry log.
    pub fn summary_dir(&self) -> PathBuf {
        self.summary_md
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
