//! Configuration for jrewrite, read from `jrewrite.toml`.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! json = false
//!
//! [recipe]
//! name = "junit5.migration"
//! disabled_rules = ["org.junit.Ignore"]
//!
//! [[recipe.extra_rules]]
//! source = "com.acme.Slow"
//! target = "org.junit.jupiter.api.Tag"
//! modifier_policy = "none"
//! ```

mod diagnostics;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once, OnceLock};

use jrewrite_recipe::{junit5_rules, ModifierPolicy, RewriteError, RewriteRule, RuleTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

pub use diagnostics::ConfigDiagnostics;

pub const CONFIG_FILE_NAME: &str = "jrewrite.toml";
pub const JREWRITE_CONFIG_ENV_VAR: &str = "JREWRITE_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JrewriteConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub recipe: RecipeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    /// Also append logs to this file.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "warn".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            "off" | "none" => "off".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        })
    }

    /// The configured filter, with `RUST_LOG` directives appended when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        match env_directives {
            Some(env_directives) => {
                let config_directives = Self::normalize_level_directives(&self.level);
                tracing_subscriber::EnvFilter::try_new(format!("{config_directives},{env_directives}"))
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeConfig {
    /// Recipe run by `jrewrite rewrite` when `--recipe` is not given.
    #[serde(default = "RecipeConfig::default_name")]
    pub name: String,

    #[serde(default)]
    pub extra_rules: Vec<RuleConfig>,

    /// Source annotations of built-in rules to switch off.
    #[serde(default)]
    pub disabled_rules: Vec<String>,
}

impl RecipeConfig {
    fn default_name() -> String {
        jrewrite_recipe::UPDATE_ANNOTATIONS.to_owned()
    }

    /// Built-in rules minus the disabled ones, followed by the extra rules.
    pub fn rule_table(&self) -> Result<RuleTable, RewriteError> {
        let mut rules: Vec<RewriteRule> = junit5_rules()
            .into_iter()
            .filter(|rule| !self.disabled_rules.iter().any(|d| d == rule.source()))
            .collect();
        rules.extend(
            self.extra_rules
                .iter()
                .map(|r| RewriteRule::new(r.source.as_str(), r.target.as_str(), r.modifier_policy)),
        );
        RuleTable::new(rules)
    }

    fn validate(&self) -> Vec<String> {
        let builtin = junit5_rules();
        self.disabled_rules
            .iter()
            .filter(|d| !builtin.iter().any(|rule| rule.source() == d.as_str()))
            .map(|d| format!("recipe.disabled_rules: `{d}` is not a built-in rule"))
            .collect()
    }
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            extra_rules: Vec::new(),
            disabled_rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub modifier_policy: ModifierPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

fn toml_error(text: &str, err: toml::de::Error) -> ConfigError {
    // `Display` quotes the offending source line; keep only the message and position.
    let message = redact_quoted(err.message().trim_end());
    match err.span() {
        Some(span) => {
            let line = text[..span.start.min(text.len())].matches('\n').count() + 1;
            ConfigError::Toml(format!("{message} (line {line})"))
        }
        None => ConfigError::Toml(message),
    }
}

/// Messages such as `invalid type: string "x", expected a boolean` echo
/// config values; hide them.
fn redact_quoted(message: &str) -> String {
    static QUOTED_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = QUOTED_RE
        .get_or_init(|| regex::Regex::new(r#""(?:\\.|[^"\\])*""#).expect("valid regex"));
    re.replace_all(message, r#""<redacted>""#).into_owned()
}

impl JrewriteConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_from_path_with_diagnostics(path).map(|(config, _)| config)
    }

    /// Load a config file and report unknown keys and suspicious values.
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str_with_diagnostics(&text)
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<JrewriteConfig>(text)
                .map_err(|err| toml_error(text, err))?;
        let diagnostics = ConfigDiagnostics {
            unknown_keys,
            warnings: config.recipe.validate(),
        };
        Ok((config, diagnostics))
    }
}

/// Locate the config file for `dir`.
///
/// `JREWRITE_CONFIG_PATH` wins (relative values are taken from `dir`);
/// otherwise `jrewrite.toml` in `dir` or the nearest ancestor holding one.
pub fn discover_config_path(dir: &Path) -> Option<PathBuf> {
    discover_config_path_from(dir, std::env::var_os(JREWRITE_CONFIG_ENV_VAR).map(PathBuf::from))
}

fn discover_config_path_from(dir: &Path, from_env: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(candidate) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        let path = if candidate.is_absolute() {
            candidate
        } else {
            dir.join(candidate)
        };
        return Some(path);
    }

    dir.ancestors()
        .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Load the configuration that applies to `dir`, or the defaults when there is none.
pub fn load_for_dir(
    dir: &Path,
) -> Result<(JrewriteConfig, Option<PathBuf>, ConfigDiagnostics), ConfigError> {
    let Some(path) = discover_config_path(dir) else {
        return Ok((JrewriteConfig::default(), None, ConfigDiagnostics::default()));
    };
    let (config, diagnostics) = JrewriteConfig::load_from_path_with_diagnostics(&path)?;
    Ok((config, Some(path), diagnostics))
}

static TRACING_INIT: Once = Once::new();

/// Install the global `tracing` subscriber writing to stderr.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let file = config.file.as_ref().and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        let file_failed = config.file.is_some() && file.is_none();
        let writer = match file {
            Some(file) => BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file))),
            None => BoxMakeWriter::new(std::io::stderr),
        };

        let layer: Box<dyn Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        };

        if tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .is_ok()
            && file_failed
        {
            if let Some(path) = &config.file {
                tracing::warn!(
                    target: "jrewrite.config",
                    path = %path.display(),
                    "failed to open log file; logging to stderr only"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn level_synonyms_are_normalized() {
        assert_eq!(LoggingConfig::normalize_level_directives(" WARNING "), "warn");
        assert_eq!(LoggingConfig::normalize_level_directives(""), "warn");
        assert_eq!(
            LoggingConfig::normalize_level_directives("jrewrite.recipe=debug"),
            "jrewrite.recipe=debug"
        );
    }

    #[test]
    fn quoted_values_are_redacted() {
        assert_eq!(
            redact_quoted(r#"invalid type: string "a \"b\" c", expected a boolean"#),
            r#"invalid type: string "<redacted>", expected a boolean"#
        );
    }

    #[test]
    fn env_path_wins_over_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").expect("write");

        let from_env = discover_config_path_from(dir.path(), Some(PathBuf::from("custom.toml")));
        assert_eq!(from_env, Some(dir.path().join("custom.toml")));

        let found = discover_config_path_from(dir.path(), None);
        assert_eq!(found, Some(dir.path().join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn config_is_found_in_ancestors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("src/test/java");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").expect("write");

        assert_eq!(
            discover_config_path_from(&nested, None),
            Some(dir.path().join(CONFIG_FILE_NAME))
        );
    }
}
