/// Configuration file parser and run settings
///
/// The file format is a small ddclient-style syntax:
/// - key=value pairs, comma-separated or one per line
/// - Backslash line continuation
/// - `#` comments on their own line
/// - `-` and `_` are interchangeable in keys
///
/// Example:
/// ```text
/// provider=cloudflare, \
/// email=me@example.com, \
/// key=0123456789abcdef
/// domain=home.example.com
/// ```
///
/// Keys that are not run settings (`provider`, `server`, `ip`, `timeout`, ...)
/// are kept as named arguments for the provider: credentials and `domain`.
use crate::args::Args;
use crate::error::{Error, Result};
use crate::ip::{self, IpSource};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Provider arguments by name (`key`, `secret`, `domain`, ...)
pub type NamedArgs = BTreeMap<String, String>;

const DEFAULT_CONFIG_FILE: &str = "ddns.conf";

/// Arguments whose values are credentials
const SECRET_ARGUMENTS: &[&str] = &["key", "secret", "secret_id", "secret_key", "password", "token"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub provider: Option<String>,
    pub arguments: NamedArgs,
    pub server: Option<String>,
    pub ip: Option<String>,
    pub timeout: Option<u64>,
    pub discovery_timeout: Option<u64>,
    pub ip_services: Option<Vec<String>>,
    pub suffix_list: Option<String>,
    pub user_agent: Option<String>,
}

impl Config {
    /// Config for a provider and its named arguments, with default settings.
    pub fn from_named(provider: &str, arguments: NamedArgs) -> Self {
        Config {
            provider: Some(provider.to_string()),
            arguments,
            ..Default::default()
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read '{}': {}", path, e)))?;
        Self::parse(&content)
    }

    /// Parse configuration text into settings and named arguments.
    ///
    /// Later assignments of the same key win.
    pub fn parse(content: &str) -> Result<Self> {
        let normalized = join_continued_lines(content);
        let mut config = Config::default();

        for (number, line) in normalized.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            for part in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (key, value) = part.split_once('=').ok_or_else(|| {
                    Error::config(format!(
                        "line {}: expected key=value, found '{}'",
                        number + 1,
                        part
                    ))
                })?;
                config.set(&key.trim().replace('-', "_"), value.trim())?;
            }
        }

        Ok(config)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "provider" | "protocol" => self.provider = Some(value.to_ascii_lowercase()),
            "server" => self.server = Some(value.to_string()),
            "ip" => self.ip = Some(value.to_string()),
            "timeout" => self.timeout = Some(parse_seconds(key, value)?),
            "discovery_timeout" => self.discovery_timeout = Some(parse_seconds(key, value)?),
            "ip_services" => {
                self.ip_services = Some(value.split_whitespace().map(str::to_string).collect())
            }
            "suffix_list" => self.suffix_list = Some(value.to_string()),
            "user_agent" => self.user_agent = Some(value.to_string()),
            "" => return Err(Error::config(format!("empty key for value '{}'", value))),
            _ => {
                self.arguments.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    /// Combine an optional file-derived Config with CLI arguments, using CLI values when provided.
    ///
    /// A provider subcommand replaces the file's provider; its arguments are
    /// laid over the file's so unrelated file keys survive.
    pub fn merge(file_config: Option<Self>, args: &Args) -> Self {
        let mut base = file_config.unwrap_or_default();

        if let Some(provider) = &args.provider {
            base.provider = Some(provider.name().to_string());
            base.arguments.extend(provider.arguments());
        }

        Config {
            provider: base.provider,
            arguments: base.arguments,
            server: args.server.clone().or(base.server),
            ip: args.ip.clone().or(base.ip),
            timeout: args.timeout.or(base.timeout),
            discovery_timeout: base.discovery_timeout,
            ip_services: base.ip_services,
            suffix_list: args.suffix_list.clone().or(base.suffix_list),
            user_agent: base.user_agent,
        }
    }

    /// Load the configuration file (explicit, `./ddns.conf`, or the user's
    /// config directory) and merge it with CLI arguments.
    pub fn load(args: &Args) -> Result<Self> {
        let file_config = match &args.file {
            Some(path) => Some(Self::from_file(path)?),
            None => match default_config_path() {
                Some(path) => {
                    log::debug!("Using configuration file {}", path.display());
                    Some(Self::from_file(&path.to_string_lossy())?)
                }
                None => None,
            },
        };

        Ok(Self::merge(file_config, args))
    }

    /// Ensure a provider and a well-formed domain are present.
    pub fn validate(&self) -> Result<()> {
        match self.provider.as_deref() {
            None | Some("") => {
                return Err(Error::config(
                    "provider is required (use a provider subcommand or provider= in the file)",
                ))
            }
            Some(_) => {}
        }
        crate::domain::validate(self.domain().unwrap_or_default())?;
        if let Some(addr) = &self.ip {
            ip::parse_ip(addr)?;
        }
        Ok(())
    }

    pub fn domain(&self) -> Option<&str> {
        self.arguments.get("domain").map(String::as_str)
    }

    /// A required, non-empty named argument.
    pub fn require(&self, name: &str, provider: &str) -> Result<String> {
        match self.arguments.get(name) {
            Some(value) if !value.is_empty() => Ok(value.clone()),
            _ => Err(Error::config(format!(
                "--{} is required for {}",
                name.replace('_', "-"),
                provider
            ))),
        }
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        self.arguments.get(name).filter(|v| !v.is_empty()).cloned()
    }

    /// Values of every credential argument, for masking in output.
    pub fn secrets(&self) -> Vec<String> {
        SECRET_ARGUMENTS
            .iter()
            .filter_map(|name| self.optional(name))
            .collect()
    }

    /// Provider base URL: the configured override or the vendor default.
    pub fn server_or(&self, default: &str) -> String {
        self.server
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> u64 {
        self.timeout.unwrap_or(crate::http::DEFAULT_TIMEOUT)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| crate::USER_AGENT.to_string())
    }

    /// How the public IP is obtained for this run.
    pub fn ip_source(&self) -> IpSource {
        if let Some(addr) = &self.ip {
            return IpSource::Manual(addr.clone());
        }
        let services = self
            .ip_services
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| ip::DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect());
        IpSource::Web {
            services,
            worker_timeout: ip::WORKER_TIMEOUT,
            deadline: Duration::from_secs(self.discovery_timeout.unwrap_or(ip::DISCOVERY_TIMEOUT)),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local.to_path_buf());
    }
    dirs::config_dir()
        .map(|dir| dir.join("ddns").join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
}

fn parse_seconds(key: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::config(format!(
            "{} must be a positive number of seconds, got '{}'",
            key, value
        ))),
        Ok(seconds) => Ok(seconds),
    }
}

/// Collapse lines ending with a backslash into single lines.
fn join_continued_lines(content: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for line in content.lines() {
        let trimmed = line.trim_end();

        if let Some(stripped) = trimmed.strip_suffix('\\') {
            current_line.push_str(stripped);
            current_line.push(' ');
        } else {
            current_line.push_str(trimmed);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }
    }

    if !current_line.is_empty() {
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}
