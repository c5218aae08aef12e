use antlers_syntax::{DEFAULT_MAX_DEPTH, Keyword, KeywordClassifier, ParseOptions, StandardKeywords};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unknown keyword `{name}` in disabled_keywords of {config_path}")]
    UnknownKeyword { config_path: PathBuf, name: String },

    #[error("Invalid template pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory the include patterns are resolved against.
    pub root: PathBuf,
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default)]
    pub parser: ParserSettings,
}

/// Knobs handed to the parser for every template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    pub max_depth: usize,
    /// Keywords to treat as plain identifiers, e.g. `["nav"]`.
    pub disabled_keywords: Vec<String>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            disabled_keywords: Vec::new(),
        }
    }
}

fn default_include() -> Vec<String> {
    vec!["**/*.antlers.html".to_string()]
}

impl ParserSettings {
    /// The standard keyword rules minus the disabled ones. Unknown names are
    /// rejected when the config is loaded, so they are ignored here.
    pub fn keywords(&self) -> StandardKeywords {
        self.disabled_keywords
            .iter()
            .filter_map(|name| Keyword::from_name(name))
            .fold(StandardKeywords::new(), StandardKeywords::without)
    }

    pub fn parse_options<'a>(&self, keywords: &'a dyn KeywordClassifier) -> ParseOptions<'a> {
        ParseOptions {
            max_depth: self.max_depth,
            keywords,
        }
    }

    fn unknown_keyword(&self) -> Option<&str> {
        self.disabled_keywords
            .iter()
            .find(|name| Keyword::from_name(name).is_none())
            .map(String::as_str)
    }
}

impl Config {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: default_include(),
            parser: ParserSettings::default(),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        if let Some(name) = config.parser.unknown_keyword() {
            return Err(ConfigError::UnknownKeyword {
                config_path: config_path.to_path_buf(),
                name: name.to_string(),
            });
        }

        // Expand shell variables and tilde in the template root
        config.root = Self::expand_path(&config.root).unwrap_or(config.root);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/antlers");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Every file under `root` matching one of the include patterns, sorted
    /// and without duplicates.
    pub fn template_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();
        for pattern in &self.include {
            let full = self.root.join(pattern);
            let full = full.to_string_lossy();
            let paths = glob::glob(&full).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            // Unreadable entries are skipped
            files.extend(paths.filter_map(Result::ok).filter(|p| p.is_file()));
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
