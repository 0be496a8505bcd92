use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use crate::language::{LanguageCatalog, LanguageProfile, StarterSnippet};
use crate::validation::SubmissionLimits;

#[derive(Parser)]
#[command(name = "approaches", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: String,

    /// Whether to flush the existing database
    #[arg(long = "flush-data", short = 'f', default_value_t = false)]
    pub flush_data: bool,
}

impl CliArgs {
    /// Load the configuration from the specified file
    pub fn to_config(&self) -> anyhow::Result<Config> {
        let file = std::fs::File::open(&self.config_path)
            .with_context(|| format!("cannot open config file {}", self.config_path))?;
        let reader = std::io::BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("cannot parse config file {}", self.config_path))?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub quota: SubmissionLimits,
    pub sandbox: SandboxConfig,
    /// Empty means the built-in catalog
    #[serde(default)]
    pub languages: LanguageConfig,
    #[serde(default)]
    pub default_language: Option<String>,
    #[serde(default)]
    pub questions: QuestionConfig,
}

impl Config {
    pub fn catalog(&self) -> anyhow::Result<LanguageCatalog> {
        if self.languages.is_empty() {
            return match &self.default_language {
                Some(name) => {
                    LanguageCatalog::new(LanguageCatalog::builtin().profiles().to_vec(), Some(name))
                }
                None => Ok(LanguageCatalog::builtin()),
            };
        }
        LanguageCatalog::new(self.languages.clone(), self.default_language.as_deref())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.catalog().context("invalid language catalog")?;

        let ratio = self.quota.quota.warning_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            anyhow::bail!("quota.warning_ratio must be in (0, 1], got {ratio}");
        }

        for (i, question) in self.questions.iter().enumerate() {
            if self.questions[..i].iter().any(|q| q.id == question.id) {
                anyhow::bail!("question {} is declared twice", question.id);
            }
        }

        if self.sandbox.url.trim().is_empty() {
            anyhow::bail!("sandbox.url must not be empty");
        }

        if self.sandbox.require_api_key && self.sandbox.api_key.is_none() {
            anyhow::bail!("sandbox.require_api_key is set but sandbox.api_key is missing");
        }

        Ok(())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Deserialize, Debug, Clone)]
pub struct SandboxConfig {
    /// Base URL, e.g. `https://emkc.org/api/v2/piston`
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub require_api_key: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

pub type LanguageConfig = Vec<LanguageProfile>;

pub type QuestionConfig = Vec<OneQuestionConfig>;

#[derive(Deserialize, Debug, Clone)]
pub struct OneQuestionConfig {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub snippets: Vec<StarterSnippet>,
}
