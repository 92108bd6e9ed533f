/*
[INPUT]:  Command-line flags and an optional YAML settings file
[OUTPUT]: Resolved settings (flag > file > built-in default)
[POS]:    Configuration layer - invocation settings
[UPDATE]: When adding new options
*/

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use xsign_adapter::TokenMode;

const DEFAULT_PEMFILE: &str = "private.pem";
const DEFAULT_KEYFILE: &str = "apikey";
const DEFAULT_NONCEFILE: &str = "nonce";
const DEFAULT_REQUESTS_DIR: &str = "requests";
const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 1000;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Options shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// YAML settings file; flags override its values
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config_path: Option<PathBuf>,
    /// PKCS#1 PEM private key [default: private.pem]
    #[arg(long, value_name = "PATH", global = true)]
    pub pemfile: Option<PathBuf>,
    /// File whose bytes are sent base64url-encoded as the API key [default: apikey]
    #[arg(long, value_name = "PATH", global = true)]
    pub keyfile: Option<PathBuf>,
    /// Literal API key, used instead of --keyfile
    #[arg(long, value_name = "KEY", global = true)]
    pub apikey: Option<String>,
    /// Previous counter value (counter mode) or exact timestamp (timestamp mode)
    #[arg(long, value_name = "VALUE", global = true, allow_hyphen_values = true)]
    pub nonce: Option<String>,
    /// Counter state file [default: nonce]
    #[arg(long, value_name = "PATH", global = true)]
    pub noncefile: Option<PathBuf>,
    /// Replay protection scheme: counter or timestamp [default: counter]
    #[arg(long = "token-mode", value_name = "MODE", global = true)]
    pub token_mode: Option<TokenMode>,
    /// Directory holding request definitions [default: requests]
    #[arg(long = "requests-dir", value_name = "PATH", global = true)]
    pub requests_dir: Option<PathBuf>,
    /// Grace period for the peer to acknowledge a close [default: 1000]
    #[arg(long = "close-timeout-ms", value_name = "MS", global = true)]
    pub close_timeout_ms: Option<u64>,
    /// Tracing filter, e.g. "info" or "xsign_adapter=debug" [default: info]
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,
}

/// Settings file contents; every field is optional
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub pemfile: Option<PathBuf>,
    pub keyfile: Option<PathBuf>,
    pub apikey: Option<String>,
    pub noncefile: Option<PathBuf>,
    pub token_mode: Option<TokenMode>,
    pub requests_dir: Option<PathBuf>,
    pub close_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl FileSettings {
    /// Load settings from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parse settings file {}", path.display()))?;
        Ok(settings)
    }
}

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub pemfile: PathBuf,
    pub keyfile: PathBuf,
    pub apikey: Option<String>,
    pub nonce: Option<String>,
    pub noncefile: PathBuf,
    pub token_mode: TokenMode,
    pub requests_dir: PathBuf,
    pub close_timeout: Duration,
    pub log_level: String,
}

impl Settings {
    /// Read the settings file named by `--config`, if any, and merge it under the flags
    pub fn resolve(args: &CommonArgs) -> Result<Self> {
        let file = match &args.config_path {
            Some(path) => FileSettings::from_file(path)?,
            None => FileSettings::default(),
        };
        Ok(Self::merge(args, file))
    }

    pub fn merge(args: &CommonArgs, file: FileSettings) -> Self {
        let args = args.clone();
        Self {
            pemfile: args
                .pemfile
                .or(file.pemfile)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PEMFILE)),
            keyfile: args
                .keyfile
                .or(file.keyfile)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEYFILE)),
            apikey: args.apikey.or(file.apikey),
            nonce: args.nonce,
            noncefile: args
                .noncefile
                .or(file.noncefile)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NONCEFILE)),
            token_mode: args.token_mode.or(file.token_mode).unwrap_or_default(),
            requests_dir: args
                .requests_dir
                .or(file.requests_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REQUESTS_DIR)),
            close_timeout: Duration::from_millis(
                args.close_timeout_ms
                    .or(file.close_timeout_ms)
                    .unwrap_or(DEFAULT_CLOSE_TIMEOUT_MS),
            ),
            log_level: args
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_flags_or_file() {
        let settings = Settings::merge(&CommonArgs::default(), FileSettings::default());
        assert_eq!(settings.pemfile, PathBuf::from("private.pem"));
        assert_eq!(settings.keyfile, PathBuf::from("apikey"));
        assert_eq!(settings.noncefile, PathBuf::from("nonce"));
        assert_eq!(settings.requests_dir, PathBuf::from("requests"));
        assert_eq!(settings.token_mode, TokenMode::Counter);
        assert_eq!(settings.close_timeout, Duration::from_secs(1));
        assert_eq!(settings.log_level, "info");
        assert!(settings.apikey.is_none());
        assert!(settings.nonce.is_none());
    }

    #[test]
    fn test_file_overrides_defaults_and_flags_override_file() {
        let file: FileSettings = serde_yaml::from_str(
            "pemfile: keys/service.pem\ntoken_mode: timestamp\nclose_timeout_ms: 250\napikey: from-file\n",
        )
        .unwrap();
        let args = CommonArgs {
            apikey: Some("from-flag".to_string()),
            ..CommonArgs::default()
        };

        let settings = Settings::merge(&args, file);
        assert_eq!(settings.pemfile, PathBuf::from("keys/service.pem"));
        assert_eq!(settings.token_mode, TokenMode::Timestamp);
        assert_eq!(settings.close_timeout, Duration::from_millis(250));
        assert_eq!(settings.apikey.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_resolve_reads_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xsign.yaml");
        std::fs::write(&path, "noncefile: state/nonce\nlog_level: debug\n").unwrap();

        let args = CommonArgs {
            config_path: Some(path),
            ..CommonArgs::default()
        };
        let settings = Settings::resolve(&args).unwrap();
        assert_eq!(settings.noncefile, PathBuf::from("state/nonce"));
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_unknown_settings_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xsign.yaml");
        std::fs::write(&path, "pem_file: typo.pem\n").unwrap();
        assert!(FileSettings::from_file(&path).is_err());
    }

    #[test]
    fn test_missing_settings_file_is_an_error() {
        let args = CommonArgs {
            config_path: Some(PathBuf::from("/nonexistent/xsign.yaml")),
            ..CommonArgs::default()
        };
        assert!(Settings::resolve(&args).is_err());
    }
}
