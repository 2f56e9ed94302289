#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! halycon-gen Configuration
//!
//! This crate provides configuration management for halycon-gen.
//! It handles loading, saving, and validating configuration files that specify:
//! - Where upstream API models are downloaded from
//! - Which conversion service is used, and its timeout
//! - How the client generator is located, installed and invoked
//! - The dependency-tidy command run at the end
//! - Workspace layout, logging, and the failure policy
//! - The model registry (defaults to the built-in table)
//!
//! Configuration is stored in TOML format. Every section is optional; a
//! missing section or field takes the value the tool has always hard-coded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use registry::{ModelDescriptor, ModelRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upstream repository holding the Selling Partner API models.
pub const DEFAULT_SOURCE_BASE_URL: &str =
    "https://raw.githubusercontent.com/amzn/selling-partner-api-models/refs/heads/main/models";

/// Public swagger.io conversion service.
pub const DEFAULT_CONVERTER_BASE_URL: &str = "https://converter.swagger.io/api";

/// Module path passed to `go install` to obtain the generator.
pub const DEFAULT_GENERATOR_MODULE: &str =
    "github.com/oapi-codegen/oapi-codegen/v2/cmd/oapi-codegen@latest";

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize configuration to TOML format
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Configuration file was not found at the specified path
    #[error("Config file not found at: {0}")]
    NotFound(PathBuf),
    /// Could not locate the user's configuration directory
    #[error("Could not find user config directory")]
    ConfigDirUnavailable,
    /// Could not locate the user's home directory
    #[error("Could not find user home directory; set generator.executable explicitly")]
    HomeDirUnavailable,
    /// A field holds a value the pipeline cannot use
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// The configured model registry is invalid
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// What the driver does when one model fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing model; later models are not processed.
    #[default]
    Abort,
    /// Process every model and report all failures at the end.
    Isolate,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Abort => f.write_str("abort"),
            FailurePolicy::Isolate => f.write_str("isolate"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Failure policy for the driver
    pub policy: FailurePolicy,
    /// Upstream model source
    pub sources: SourceConfig,
    /// Conversion service
    pub converter: ConverterConfig,
    /// Client generator
    pub generator: GeneratorConfig,
    /// Final dependency-tidy step
    pub tidy: TidyConfig,
    /// Workspace layout
    pub workspace: WorkspaceConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Models to process, in order
    pub models: Vec<ModelDescriptor>,
}

/// Upstream model source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL each descriptor's `remote_path` is appended to
    pub base_url: String,
    /// Download timeout in seconds
    pub fetch_timeout_secs: u64,
}

/// Conversion service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Base URL of the service; `/convert` is appended
    pub base_url: String,
    /// Per-request timeout in seconds (applies to both strategies)
    pub timeout_secs: u64,
}

/// Client generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Generator executable; defaults to `$HOME/go/bin/oapi-codegen`
    pub executable: Option<PathBuf>,
    /// Whether to install the generator when it is missing
    pub install: bool,
    /// Program used to install the generator
    pub install_program: String,
    /// Arguments passed to `install_program`
    pub install_args: Vec<String>,
    /// Generation targets joined into the `-generate` flag
    pub targets: Vec<String>,
    /// Suffix applied to response type names on the primary attempt
    pub response_type_suffix: String,
    /// File name of the generated client inside each output folder
    pub output_file: String,
}

/// Dependency-tidy step configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidyConfig {
    /// Whether to run the tidy step
    pub enabled: bool,
    /// Program to run
    pub program: String,
    /// Arguments passed to `program`
    pub args: Vec<String>,
}

/// Workspace layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory every relative path is resolved against; also the working
    /// directory of external commands
    pub root: PathBuf,
    /// Directory holding downloaded and converted models
    pub models_dir: PathBuf,
    /// Prefix prepended to each model's source file name on disk
    pub model_prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (debug, info, warn, error)
    pub level: String,
    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_SOURCE_BASE_URL.to_string(), fetch_timeout_secs: 60 }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_CONVERTER_BASE_URL.to_string(), timeout_secs: 120 }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            executable: None,
            install: true,
            install_program: "go".to_string(),
            install_args: vec!["install".to_string(), DEFAULT_GENERATOR_MODULE.to_string()],
            targets: vec!["types".to_string(), "client".to_string(), "spec".to_string()],
            response_type_suffix: "Resp".to_string(),
            output_file: "client.go".to_string(),
        }
    }
}

impl Default for TidyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "go".to_string(),
            args: vec!["mod".to_string(), "tidy".to_string()],
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            models_dir: PathBuf::from("models"),
            model_prefix: "halycon_sp_api_".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".to_string(), file: None } }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::default(),
            sources: SourceConfig::default(),
            converter: ConverterConfig::default(),
            generator: GeneratorConfig::default(),
            tidy: TidyConfig::default(),
            workspace: WorkspaceConfig::default(),
            logging: LoggingConfig::default(),
            models: registry::builtin_models(),
        }
    }
}

impl SourceConfig {
    /// Download timeout as a [`Duration`]
    pub fn fetch_timeout(&self) -> Duration { Duration::from_secs(self.fetch_timeout_secs) }
}

impl ConverterConfig {
    /// Conversion timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

impl Config {
    /// Load configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path` if given, else from [`Config::default_path`] if that
    /// file exists, else fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Ok(default) if default.exists() => Self::from_file(default),
            _ => Ok(Self::default()),
        }
    }

    /// Save this configuration as a pretty-printed TOML file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Returns the default config file path:
    /// `{config_dir()}/halycon-gen/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir =
            dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?.join("halycon-gen");
        Ok(config_dir.join("config.toml"))
    }

    /// Resolve the generator executable: explicit setting first, then
    /// `$HOME/go/bin/oapi-codegen`.
    pub fn generator_executable(&self) -> Result<PathBuf, ConfigError> {
        Self::generator_executable_internal(self.generator.executable.clone(), dirs::home_dir())
    }

    /// Internal function for testing - allows injection of the home directory
    fn generator_executable_internal(
        explicit: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Result<PathBuf, ConfigError> {
        if let Some(explicit) = explicit {
            return Ok(explicit);
        }
        home.map(|h| h.join("go").join("bin").join("oapi-codegen"))
            .ok_or(ConfigError::HomeDirUnavailable)
    }

    /// Build the model registry from `models`.
    pub fn registry(&self) -> Result<ModelRegistry, ConfigError> {
        Ok(ModelRegistry::new(self.models.clone())?)
    }

    /// Check every value the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn non_empty(field: &'static str, value: &str) -> Result<(), ConfigError> {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
            Ok(())
        }

        non_empty("sources.base_url", &self.sources.base_url)?;
        non_empty("converter.base_url", &self.converter.base_url)?;
        non_empty("generator.output_file", &self.generator.output_file)?;
        non_empty("tidy.program", &self.tidy.program)?;
        non_empty("workspace.model_prefix", &self.workspace.model_prefix)?;
        if self.generator.install {
            non_empty("generator.install_program", &self.generator.install_program)?;
        }
        if self.workspace.models_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "workspace.models_dir",
                reason: "must not be empty".to_string(),
            });
        }
        if self.sources.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sources.fetch_timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.converter.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "converter.timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.generator.targets.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "generator.targets",
                reason: "must list at least one target".to_string(),
            });
        }
        if self.generator.output_file.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: "generator.output_file",
                reason: "must be a bare file name".to_string(),
            });
        }
        self.registry()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_from_file() {
        // Test successful loading with explicit TOML content
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        let toml_content = r#"
            policy = "isolate"

            [sources]
            base_url = "http://127.0.0.1:9000/models"
            fetch_timeout_secs = 5

            [converter]
            base_url = "http://127.0.0.1:9001/api"
            timeout_secs = 10

            [generator]
            executable = "/opt/bin/oapi-codegen"
            install = false

            [tidy]
            enabled = false

            [workspace]
            root = "/tmp/halycon"

            [logging]
            level = "debug"
            file = "debug.log"

            [[models]]
            source_file_name = "x.json"
            remote_path = "p/x.json"
            output_folder = "out/x"
        "#;
        fs::write(&temp_file, toml_content)
            .expect("Failed to write TOML content to temporary file");

        let loaded =
            Config::from_file(&temp_file).expect("Failed to load config from temporary file");
        assert_eq!(loaded.policy, FailurePolicy::Isolate);
        assert_eq!(loaded.sources.base_url, "http://127.0.0.1:9000/models");
        assert_eq!(loaded.sources.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(loaded.converter.timeout(), Duration::from_secs(10));
        assert_eq!(loaded.generator.executable, Some(PathBuf::from("/opt/bin/oapi-codegen")));
        assert!(!loaded.generator.install);
        // Unspecified fields keep their defaults
        assert_eq!(loaded.generator.response_type_suffix, "Resp");
        assert_eq!(loaded.generator.targets, vec!["types", "client", "spec"]);
        assert!(!loaded.tidy.enabled);
        assert_eq!(loaded.tidy.args, vec!["mod", "tidy"]);
        assert_eq!(loaded.workspace.root, PathBuf::from("/tmp/halycon"));
        assert_eq!(loaded.workspace.models_dir, PathBuf::from("models"));
        assert_eq!(loaded.logging.level, "debug");
        assert_eq!(loaded.logging.file, Some(PathBuf::from("debug.log")));
        assert_eq!(loaded.models, vec![ModelDescriptor::new("x.json", "p/x.json", "out/x")]);
        loaded.validate().expect("config is valid");

        // Test file not found error
        let result = Config::from_file("nonexistent_file.toml");
        match result.expect_err("Expected error for nonexistent file") {
            ConfigError::NotFound(p) => assert_eq!(p, PathBuf::from("nonexistent_file.toml")),
            other => panic!("Expected NotFound error, got {:?}", other),
        }

        // Test parse error
        let temp_file =
            NamedTempFile::new().expect("Failed to create temporary file for parse error test");
        fs::write(&temp_file, "invalid toml content")
            .expect("Failed to write invalid TOML content");

        let result = Config::from_file(&temp_file);
        match result.expect_err("Expected parse error for invalid TOML") {
            ConfigError::Parse(_) => {}
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_is_default() {
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        let loaded = Config::from_file(&temp_file).expect("empty TOML is valid");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_load_explicit_path() {
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        fs::write(&temp_file, "policy = \"isolate\"\n").expect("write config");
        let loaded = Config::load(Some(temp_file.path())).expect("load");
        assert_eq!(loaded.policy, FailurePolicy::Isolate);

        let missing = Config::load(Some(Path::new("does/not/exist.toml")));
        assert!(matches!(missing, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_save() {
        let config = Config::default();
        let temp_file =
            NamedTempFile::new().expect("Failed to create temporary file for save test");

        config.save(&temp_file).expect("save succeeds");

        // Verify the file was written and can be read back
        let contents = fs::read_to_string(&temp_file).expect("Failed to read saved config file");
        assert!(contents.contains("converter.swagger.io"));
        assert!(contents.contains("halycon_sp_api_"));
        assert!(contents.contains("feeds_2021-06-30.json"));
        let reloaded = Config::from_file(&temp_file).expect("reload saved config");
        assert_eq!(reloaded, config);

        // Test file write error - try to save to a non-existent directory
        let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let non_existent_subdir = temp_dir.path().join("nonexistent").join("config.toml");

        let result = config.save(&non_existent_subdir);
        match result.expect_err("Expected file write error for non-existent directory") {
            ConfigError::FileRead(_) => (), // Expected
            other => panic!("Expected FileRead error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path().expect("Failed to get default config path");
        let path_str = path.to_str().expect("Path should be valid UTF-8");
        assert!(path_str.contains("halycon-gen"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_generator_executable_internal() {
        let explicit = Config::generator_executable_internal(
            Some(PathBuf::from("/usr/local/bin/oapi-codegen")),
            Some(PathBuf::from("/home/dev")),
        )
        .expect("explicit path");
        assert_eq!(explicit, PathBuf::from("/usr/local/bin/oapi-codegen"));

        let from_home =
            Config::generator_executable_internal(None, Some(PathBuf::from("/home/dev")))
                .expect("home-relative path");
        assert_eq!(from_home, PathBuf::from("/home/dev/go/bin/oapi-codegen"));

        let missing = Config::generator_executable_internal(None, None);
        assert!(matches!(missing, Err(ConfigError::HomeDirUnavailable)));
    }

    #[test]
    fn test_validate() {
        Config::default().validate().expect("defaults are valid");

        let mut config = Config::default();
        config.sources.fetch_timeout_secs = 0;
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "sources.fetch_timeout_secs")
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }

        let mut config = Config::default();
        config.converter.base_url = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "converter.base_url", .. })
        ));

        let mut config = Config::default();
        config.generator.targets.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "generator.targets", .. })
        ));

        let mut config = Config::default();
        config.models.push(ModelDescriptor::new("bad.json", "p/bad.json", "out/"));
        assert!(matches!(config.validate(), Err(ConfigError::Registry(_))));
    }

    #[test]
    fn test_default() {
        let config = Config::default();
        assert_eq!(config.policy, FailurePolicy::Abort);
        assert_eq!(config.sources.base_url, DEFAULT_SOURCE_BASE_URL);
        assert_eq!(config.sources.fetch_timeout(), Duration::from_secs(60));
        assert_eq!(config.converter.base_url, "https://converter.swagger.io/api");
        assert_eq!(config.converter.timeout(), Duration::from_secs(120));
        assert_eq!(config.generator.install_args, vec!["install", DEFAULT_GENERATOR_MODULE]);
        assert_eq!(config.generator.output_file, "client.go");
        assert_eq!(config.workspace.models_dir, PathBuf::from("models"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, None);
        assert_eq!(config.models.len(), 6);
        assert_eq!(config.registry().expect("builtin registry"), ModelRegistry::builtin());
    }
}
