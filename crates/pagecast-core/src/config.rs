//! Configuration and settings management
//!
//! Settings are loaded once at startup from config files and environment
//! variables, then turned into an immutable [`JobConfig`] that the core
//! components receive by parameter.

use crate::dispatch::MultiPageStrategy;
use crate::error::{PagecastError, Result};
use crate::selector::SelectionCriteria;
use crate::storage::S3Options;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lower bound on the page count of a post
pub const DEFAULT_MIN_PAGES: u32 = 1;
/// Default upper bound on the page count of a post
pub const DEFAULT_MAX_PAGES: u32 = 20;
/// Default presigned URL lifetime in seconds
pub const DEFAULT_URL_EXPIRY_SECS: u64 = 60;
/// Longest presigned URL lifetime SigV4 accepts (seven days)
pub const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;
/// Default catalog object name, relative to the storage prefix
pub const DEFAULT_CATALOG_FILE: &str = "pages.csv";

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_bot_token: String,
    /// Destination chat: numeric id or `@channelusername`
    pub telegram_chat_id: String,

    /// Bucket holding the catalog and page images
    pub aws_s3_bucket_name: String,
    /// Key prefix for the catalog and page images (e.g. `books/novel/`)
    #[serde(default)]
    pub aws_s3_prefix: String,
    /// Endpoint override for S3-compatible storage
    pub aws_endpoint_url: Option<String>,
    /// Region override
    pub aws_region: Option<String>,

    /// Text appended to every caption after a blank line
    pub caption_signature: Option<String>,
    /// Smallest acceptable page count
    #[serde(default = "default_min_pages")]
    pub min_pages: u32,
    /// Largest acceptable page count
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Lifetime of presigned page URLs
    #[serde(default = "default_url_expiry_secs")]
    pub url_expiry_secs: u64,
    /// Catalog object name under the prefix
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,
    /// Field separator of the catalog
    #[serde(default = "default_catalog_delimiter")]
    pub catalog_delimiter: String,
    /// How multi-page posts are sent
    #[serde(default)]
    pub multi_page_strategy: MultiPageStrategy,
}

const fn default_min_pages() -> u32 {
    DEFAULT_MIN_PAGES
}

const fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

const fn default_url_expiry_secs() -> u64 {
    DEFAULT_URL_EXPIRY_SECS
}

fn default_catalog_file() -> String {
    DEFAULT_CATALOG_FILE.to_string()
}

fn default_catalog_delimiter() -> String {
    ",".to_string()
}

/// Build the layered configuration source.
///
/// # Errors
///
/// Returns a `ConfigError` if a config file is malformed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        // `APP__MIN_PAGES=2` sets `min_pages`
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain UPPER_SNAKE_CASE variables map to snake_case keys; empty means unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pagecast_core::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key is missing.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Validate settings and produce the value object handed to the core.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for a bad page range, a blank bucket name, a URL
    /// lifetime outside `1..=MAX_URL_EXPIRY_SECS` or a delimiter that is not
    /// exactly one ASCII character.
    pub fn job_config(&self) -> Result<JobConfig> {
        let criteria = SelectionCriteria::new(self.min_pages, self.max_pages)?;

        if self.aws_s3_bucket_name.trim().is_empty() {
            return Err(PagecastError::Configuration(
                "AWS_S3_BUCKET_NAME is missing".to_string(),
            ));
        }

        if !(1..=MAX_URL_EXPIRY_SECS).contains(&self.url_expiry_secs) {
            return Err(PagecastError::Configuration(format!(
                "url_expiry_secs must be between 1 and {MAX_URL_EXPIRY_SECS}, got {}",
                self.url_expiry_secs
            )));
        }

        let catalog_delimiter = match self.catalog_delimiter.as_bytes() {
            [byte] if byte.is_ascii() => *byte,
            _ => {
                return Err(PagecastError::Configuration(format!(
                    "catalog_delimiter must be a single ASCII character, got {:?}",
                    self.catalog_delimiter
                )))
            }
        };

        Ok(JobConfig {
            criteria,
            storage_prefix: self.aws_s3_prefix.clone(),
            catalog_key: format!("{}{}", self.aws_s3_prefix, self.catalog_file),
            catalog_delimiter,
            url_expiry: Duration::from_secs(self.url_expiry_secs),
            caption_signature: self
                .caption_signature
                .clone()
                .filter(|s| !s.trim().is_empty()),
            strategy: self.multi_page_strategy,
        })
    }

    /// Connection parameters for the S3 store
    #[must_use]
    pub fn s3_options(&self) -> S3Options {
        S3Options {
            bucket: self.aws_s3_bucket_name.clone(),
            endpoint_url: self.aws_endpoint_url.clone(),
            region: self.aws_region.clone(),
        }
    }
}

/// Validated, immutable settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Accepted page-count range
    pub criteria: SelectionCriteria,
    /// Prefix of page image keys
    pub storage_prefix: String,
    /// Full key of the catalog object
    pub catalog_key: String,
    /// Catalog field separator
    pub catalog_delimiter: u8,
    /// Presigned URL lifetime
    pub url_expiry: Duration,
    /// Non-blank caption signature
    pub caption_signature: Option<String>,
    /// Multi-page dispatch strategy for this run
    pub strategy: MultiPageStrategy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn settings() -> Settings {
        Settings {
            telegram_bot_token: "dummy".to_string(),
            telegram_chat_id: "@channel".to_string(),
            aws_s3_bucket_name: "bucket".to_string(),
            aws_s3_prefix: "novel/".to_string(),
            aws_endpoint_url: None,
            aws_region: None,
            caption_signature: None,
            min_pages: DEFAULT_MIN_PAGES,
            max_pages: DEFAULT_MAX_PAGES,
            url_expiry_secs: DEFAULT_URL_EXPIRY_SECS,
            catalog_file: default_catalog_file(),
            catalog_delimiter: default_catalog_delimiter(),
            multi_page_strategy: MultiPageStrategy::Sequential,
        }
    }

    // Only test touching process environment, to avoid races between tests
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_BOT_TOKEN", "dummy_token");
        env::set_var("TELEGRAM_CHAT_ID", "-100123");
        env::set_var("AWS_S3_BUCKET_NAME", "books");
        env::set_var("AWS_S3_PREFIX", "novel/");
        env::set_var("MAX_PAGES", "6");
        env::set_var("MULTI_PAGE_STRATEGY", "grouped");
        env::set_var("CAPTION_SIGNATURE", "");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_chat_id, "-100123");
        assert_eq!(settings.min_pages, DEFAULT_MIN_PAGES);
        assert_eq!(settings.max_pages, 6);
        assert_eq!(settings.multi_page_strategy, MultiPageStrategy::Grouped);
        assert_eq!(settings.caption_signature, None);

        let job = settings.job_config()?;
        assert_eq!(job.catalog_key, "novel/pages.csv");
        assert_eq!(job.url_expiry, Duration::from_secs(60));

        for key in [
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_CHAT_ID",
            "AWS_S3_BUCKET_NAME",
            "AWS_S3_PREFIX",
            "MAX_PAGES",
            "MULTI_PAGE_STRATEGY",
            "CAPTION_SIGNATURE",
        ] {
            env::remove_var(key);
        }
        Ok(())
    }

    #[test]
    fn zero_min_pages_is_configuration_error() {
        let mut s = settings();
        s.min_pages = 0;
        assert!(matches!(
            s.job_config(),
            Err(PagecastError::Configuration(_))
        ));
    }

    #[test]
    fn inverted_range_is_configuration_error() {
        let mut s = settings();
        s.min_pages = 5;
        s.max_pages = 3;
        assert!(matches!(
            s.job_config(),
            Err(PagecastError::Configuration(_))
        ));
    }

    #[test]
    fn delimiter_must_be_one_ascii_char() -> Result<()> {
        let mut s = settings();
        s.catalog_delimiter = ";".to_string();
        assert_eq!(s.job_config()?.catalog_delimiter, b';');

        s.catalog_delimiter = ";;".to_string();
        assert!(s.job_config().is_err());
        s.catalog_delimiter = "§".to_string();
        assert!(s.job_config().is_err());
        Ok(())
    }

    #[test]
    fn zero_expiry_is_rejected() {
        let mut s = settings();
        s.url_expiry_secs = 0;
        assert!(s.job_config().is_err());
    }

    #[test]
    fn expiry_over_a_week_is_configuration_error() -> Result<()> {
        let mut s = settings();
        s.url_expiry_secs = MAX_URL_EXPIRY_SECS;
        assert_eq!(s.job_config()?.url_expiry, Duration::from_secs(604_800));

        s.url_expiry_secs = 700_000;
        assert!(matches!(
            s.job_config(),
            Err(PagecastError::Configuration(_))
        ));
        Ok(())
    }

    #[test]
    fn blank_bucket_is_configuration_error() {
        let mut s = settings();
        s.aws_s3_bucket_name = "  ".to_string();
        let err = s.job_config().err();
        assert!(matches!(err, Some(PagecastError::Configuration(_))));
        assert_eq!(err.map(|e| e.exit_code()), Some(2));
    }

    #[test]
    fn blank_signature_is_dropped() -> Result<()> {
        let mut s = settings();
        s.caption_signature = Some("   ".to_string());
        assert_eq!(s.job_config()?.caption_signature, None);
        Ok(())
    }
}
