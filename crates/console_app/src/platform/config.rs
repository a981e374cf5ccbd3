use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{bail, Context};
use console_engine::{ClientSettings, CredentialSet, Credentials};
use console_logging::console_info;
use serde::{Deserialize, Serialize};
use url::Url;

use super::cli::ConnectionArgs;
use super::logging::LogDestination;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CredentialConfig {
    username: String,
    password: String,
}

/// Shape of `console.ron`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    base_url: Option<String>,
    standard: Option<CredentialConfig>,
    elevated: Option<CredentialConfig>,
    log: Option<LogDestination>,
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub base_url: Url,
    pub credentials: CredentialSet,
    pub log: LogDestination,
}

impl ConsoleConfig {
    /// Reads the config file named by `args` (a missing file is fine) and
    /// applies the argument/env overrides on top.
    pub fn resolve(args: &ConnectionArgs) -> anyhow::Result<Self> {
        let file = load_file(&args.config)?;
        merge(file, args)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings::new(self.base_url.clone(), self.credentials.clone())
    }
}

fn load_file(path: &Path) -> anyhow::Result<FileConfig> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()));
        }
    };
    let config =
        ron::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    console_info!("Loaded config from {:?}", path);
    Ok(config)
}

fn merge(file: FileConfig, args: &ConnectionArgs) -> anyhow::Result<ConsoleConfig> {
    let raw_url = args
        .base_url
        .clone()
        .or(file.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = Url::parse(&raw_url).with_context(|| format!("invalid base url {raw_url}"))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        bail!("base url must be http or https, got {raw_url}");
    }

    let standard = credentials(
        "standard",
        args.user.as_deref(),
        args.password.as_deref(),
        file.standard,
    )?;
    let elevated = credentials(
        "elevated",
        args.admin_user.as_deref(),
        args.admin_password.as_deref(),
        file.elevated,
    )?;

    Ok(ConsoleConfig {
        base_url,
        credentials: CredentialSet { standard, elevated },
        log: args.log.or(file.log).unwrap_or_default(),
    })
}

fn credentials(
    tier: &str,
    user: Option<&str>,
    password: Option<&str>,
    file: Option<CredentialConfig>,
) -> anyhow::Result<Credentials> {
    let username = user
        .map(ToOwned::to_owned)
        .or_else(|| file.as_ref().map(|c| c.username.clone()));
    let password = password
        .map(ToOwned::to_owned)
        .or_else(|| file.map(|c| c.password));
    match (username, password) {
        (Some(username), Some(password)) => Ok(Credentials::new(username, password)),
        _ => bail!("missing {tier} credentials: set them in the config file or via arguments/env"),
    }
}
