use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration: client-wide settings plus one endpoint
/// section per remote host.
///
/// The member and partner services live on different hosts but share the
/// same endpoint shape, so they are two instances of [`EndpointConfig`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Local client settings (home directory, credentials file).
    pub client: ClientConfig,
    /// Member-facing API host.
    pub member_api: EndpointConfig,
    /// Partner-facing API host.
    pub partner_api: EndpointConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Home directory for credentials and logs. Empty means the platform
    /// default (`~/.spotless`). Normalized to an absolute path on load.
    #[serde(default)]
    pub home_dir: String,
    /// Credentials file path. Empty means `<home_dir>/credentials.json`.
    /// Normalized to an absolute path on load.
    #[serde(default)]
    pub credentials_file: String,
}

/// One remote API host: base URL (including any path prefix the deployment
/// mounts the service under) and a per-request timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub base_url: String,
    /// Request timeout, human-readable ("30s", "2m").
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Logging configuration. Only the `default` section is honored; the client
/// is a single subsystem.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    pub file: String,          // "logs/spotless.log", "" disables the file sink
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>, // How many rotated files to keep
    #[serde(default)]
    pub max_size_mb: Option<u64>, // Max size of the file in MB
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            // Empty => platform default resolved on load:
            // Unix/macOS: $HOME/.spotless, Windows: %APPDATA%/.spotless
            home_dir: String::new(),
            credentials_file: String::new(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: default_timeout(),
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            // Console stays quiet so command output is readable; the file
            // sink keeps the debug trail.
            console_level: "warn".to_string(),
            file: "logs/spotless.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(20),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            member_api: EndpointConfig {
                // The member service is mounted under /api in every
                // deployment profile.
                base_url: "http://127.0.0.1:8100/api".to_string(),
                timeout: default_timeout(),
            },
            partner_api: EndpointConfig {
                base_url: "http://127.0.0.1:8200".to_string(),
                timeout: default_timeout(),
            },
            logging: Some(default_logging_config()),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file →
    /// environment variables. Also normalizes `client.home_dir` and
    /// `client.credentials_file` into absolute paths and creates the home
    /// directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(config_path.as_ref()))
            // Example: SPOTLESS__MEMBER_API__BASE_URL maps to member_api.base_url
            .merge(Env::prefixed("SPOTLESS__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())?;

        normalize_client_paths(&mut config.client)
            .context("Failed to resolve client.home_dir")?;

        Ok(config)
    }

    /// Load configuration from file or fall back to defaults. Paths are
    /// normalized in both cases.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_client_paths(&mut c.client)
                    .context("Failed to resolve client.home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(url) = &args.member_url {
            self.member_api.base_url = url.clone();
        }
        if let Some(url) = &args.partner_url {
            self.partner_api.base_url = url.clone();
        }

        // Set logging level based on verbose flags for "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }
}

/// Command line arguments structure.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub member_url: Option<String>,
    pub partner_url: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
    pub assume_yes: bool,
}

const fn default_subdir() -> &'static str {
    ".spotless"
}

/// Normalize `client.home_dir` into an absolute path (created on demand) and
/// anchor `client.credentials_file` under it when not explicitly set.
fn normalize_client_paths(client: &mut ClientConfig) -> Result<()> {
    // Treat empty string as "not provided" => None.
    let opt = if client.home_dir.trim().is_empty() {
        None
    } else {
        Some(client.home_dir.clone())
    };

    let home: PathBuf = resolve_home_dir(opt, default_subdir(), /*create*/ true)
        .context("home_dir normalization failed")?;
    client.home_dir = home.to_string_lossy().to_string();

    let creds = if client.credentials_file.trim().is_empty() {
        home.join("credentials.json")
    } else {
        let p = expand_tilde(client.credentials_file.trim())?;
        if p.is_relative() {
            home.join(p)
        } else {
            p
        }
    };
    client.credentials_file = creds.to_string_lossy().to_string();

    Ok(())
}

/// Resolve the home directory: an explicit path wins (with `~` expanded),
/// otherwise `<platform home>/<default_subdir>`.
fn resolve_home_dir(
    explicit: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let dir = match explicit {
        Some(p) => expand_tilde(p.trim())?,
        None => platform_home()?.join(default_subdir),
    };
    if create {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create home dir {}", dir.display()))?;
    }
    Ok(dir)
}

fn platform_home() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("APPDATA is not set"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set"))
    }
}

fn expand_tilde(p: &str) -> Result<PathBuf> {
    if p == "~" {
        return platform_home();
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return Ok(platform_home()?.join(rest));
    }
    Ok(PathBuf::from(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};
    use tempfile::tempdir;

    /// Helper: a normalized path should be absolute and not start with '~'.
    fn is_normalized_path(p: &str) -> bool {
        let pb = PathBuf::from(p);
        pb.is_absolute() && !p.starts_with('~')
    }

    #[test]
    fn test_default_config_structure() {
        let config = AppConfig::default();

        // raw (not yet normalized)
        assert_eq!(config.client.home_dir, "");
        assert_eq!(config.client.credentials_file, "");

        assert_eq!(config.member_api.base_url, "http://127.0.0.1:8100/api");
        assert_eq!(config.partner_api.base_url, "http://127.0.0.1:8200");
        assert_eq!(config.member_api.timeout, Duration::from_secs(30));

        // Logging defaults
        let logging = config.logging.as_ref().unwrap();
        let default_section = &logging["default"];
        assert_eq!(default_section.console_level, "warn");
        assert_eq!(default_section.file, "logs/spotless.log");
    }

    #[test]
    fn test_load_layered_normalizes_paths() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        // Keep tilde expansion inside the sandbox.
        #[cfg(target_os = "windows")]
        env::set_var("APPDATA", tmp.path());
        #[cfg(not(target_os = "windows"))]
        env::set_var("HOME", tmp.path());

        // Provide a user path with "~" to ensure expansion and normalization.
        let yaml = r#"
client:
  home_dir: "~/.test_spotless"

member_api:
  base_url: "https://members.example.com/api"
  timeout: "10s"

partner_api:
  base_url: "https://partners.example.com"

logging:
  default:
    console_level: debug
    file: "logs/default.log"
"#;
        fs::write(&cfg_path, yaml).unwrap();

        let config = AppConfig::load_layered(&cfg_path).unwrap();

        assert!(is_normalized_path(&config.client.home_dir));
        assert!(config.client.home_dir.ends_with(".test_spotless"));
        // credentials file is anchored under home_dir by default
        assert!(is_normalized_path(&config.client.credentials_file));
        assert!(config
            .client
            .credentials_file
            .ends_with("credentials.json"));

        assert_eq!(config.member_api.base_url, "https://members.example.com/api");
        assert_eq!(config.member_api.timeout, Duration::from_secs(10));
        // partner timeout falls back to the default
        assert_eq!(config.partner_api.timeout, Duration::from_secs(30));

        let logging = config.logging.as_ref().unwrap();
        let def = &logging["default"];
        assert_eq!(def.console_level, "debug");
        assert_eq!(def.file, "logs/default.log");
    }

    #[test]
    fn test_load_or_default_normalizes_home_dir_when_none() {
        // No external file => defaults, but home_dir must be normalized.
        let tmp = tempdir().unwrap();
        #[cfg(target_os = "windows")]
        env::set_var("APPDATA", tmp.path());
        #[cfg(not(target_os = "windows"))]
        env::set_var("HOME", tmp.path());
        let config = AppConfig::load_or_default(None::<&str>).unwrap();
        assert!(is_normalized_path(&config.client.home_dir));
        assert!(config.client.home_dir.ends_with(default_subdir()));
        assert!(config.client.credentials_file.ends_with("credentials.json"));
    }

    #[test]
    fn test_explicit_relative_credentials_file_is_anchored() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        let home = tmp.path().join("home");
        let home_str = home.to_string_lossy().replace('\\', "/");

        let yaml = format!(
            r#"
client:
  home_dir: "{home_str}"
  credentials_file: "creds/tokens.json"

member_api:
  base_url: "http://127.0.0.1:9100/api"

partner_api:
  base_url: "http://127.0.0.1:9200"
"#
        );
        fs::write(&cfg_path, yaml).unwrap();

        let config = AppConfig::load_layered(&cfg_path).unwrap();
        assert!(config.client.credentials_file.starts_with(&*home.to_string_lossy()));
        assert!(config.client.credentials_file.ends_with("tokens.json"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();

        let args = CliArgs {
            config: None,
            member_url: Some("http://localhost:3000/api".to_string()),
            partner_url: None,
            print_config: false,
            verbose: 2, // trace
            assume_yes: false,
        };

        config.apply_cli_overrides(&args);

        assert_eq!(config.member_api.base_url, "http://localhost:3000/api");
        assert_eq!(config.partner_api.base_url, "http://127.0.0.1:8200");

        let logging = config.logging.as_ref().unwrap();
        let default_section = &logging["default"];
        assert_eq!(default_section.console_level, "trace");
    }

    #[test]
    fn test_cli_verbose_levels_matrix() {
        for (verbose_level, expected_log_level) in [
            (0, "warn"), // unchanged from default
            (1, "debug"),
            (2, "trace"),
            (3, "trace"), // cap at trace
        ] {
            let mut config = AppConfig::default();
            let args = CliArgs {
                verbose: verbose_level,
                ..CliArgs::default()
            };

            config.apply_cli_overrides(&args);

            let logging = config.logging.as_ref().unwrap();
            let default_section = &logging["default"];
            assert_eq!(default_section.console_level, expected_log_level);
        }
    }

    #[test]
    fn test_to_yaml_roundtrip_basic() {
        let config = AppConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("member_api:"));
        assert!(yaml.contains("partner_api:"));
        assert!(yaml.contains("logging:"));

        let roundtrip: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(roundtrip.member_api.base_url, config.member_api.base_url);
    }

    #[test]
    fn test_invalid_yaml_unknown_field() {
        let invalid_yaml = r#"
client:
  home_dir: "~/.test"
  not_a_field: true

member_api:
  base_url: "http://127.0.0.1:8100/api"

partner_api:
  base_url: "http://127.0.0.1:8200"
"#;

        let result: Result<AppConfig, _> = serde_yaml::from_str(invalid_yaml);
        assert!(result.is_err());
    }
}
