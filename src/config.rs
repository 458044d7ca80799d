use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "schoolbooks")]
#[command(about = "Runs the schoolbooks service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

impl Cli {
    /// Resolves the config file and the directory the database lives in.
    ///
    /// With `--config` the data directory is the config file's parent,
    /// otherwise both live under `~/.schoolbooks/`.
    pub fn resolve_paths(&self) -> (PathBuf, PathBuf) {
        match &self.config_path {
            Some(path) => {
                let path = PathBuf::from(path);
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."));
                (path, dir)
            }
            None => (default_config_path(), default_config_dir()),
        }
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".schoolbooks")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    database: String,
    port: u16,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
    #[serde(default = "default_loan_period")]
    pub loan_period_days: u32,
    #[serde(default = "default_overdue_report_interval")]
    pub overdue_report_interval_seconds: u64,
}

fn default_sync_interval() -> u64 {
    60
}

fn default_loan_period() -> u32 {
    15
}

fn default_overdue_report_interval() -> u64 {
    3600
}

impl Default for App {
    fn default() -> Self {
        App {
            database: "schoolbooks.db".to_string(),
            port: 3000,
            turso_url: None,
            turso_auth_token: None,
            sync_interval_seconds: default_sync_interval(),
            loan_period_days: default_loan_period(),
            overdue_report_interval_seconds: default_overdue_report_interval(),
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// Remote URL and auth token, when both are set. Either one alone keeps
    /// the database local.
    pub fn replica_credentials(&self) -> Option<(&str, &str)> {
        match (&self.turso_url, &self.turso_auth_token) {
            (Some(url), Some(token)) => Some((url.as_str(), token.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    pub app: App,
}

impl Config {
    pub fn new(path: &Path) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find('}') {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(variable = var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}
