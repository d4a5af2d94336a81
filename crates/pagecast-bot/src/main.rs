use dotenvy::dotenv;
use pagecast_core::config::{JobConfig, Settings};
use pagecast_core::runner::run_once;
use pagecast_core::storage::S3Store;
use pagecast_core::PagecastError;
use pagecast_transport_telegram::TelegramMessenger;
use regex::Regex;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
struct RedactionPatterns {
    token1: Regex,
    token2: Regex,
    token3: Regex,
    aws_1: Regex,
    aws_2: Regex,
    presign_1: Regex,
    presign_2: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token1: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token2: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token3: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
            aws_1: Regex::new(r"AWS_ACCESS_KEY_ID=[^\s&]+")?,
            aws_2: Regex::new(r"AWS_SECRET_ACCESS_KEY=[^\s&]+")?,
            presign_1: Regex::new(r"(X-Amz-Signature=)[0-9a-fA-F]+")?,
            presign_2: Regex::new(r"(X-Amz-(?:Credential|Security-Token)=)[^\s&]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token1
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token2
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token3
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .aws_1
            .replace_all(&output, "AWS_ACCESS_KEY_ID=[MASKED]")
            .to_string();
        output = self
            .aws_2
            .replace_all(&output, "AWS_SECRET_ACCESS_KEY=[MASKED]")
            .to_string();
        output = self
            .presign_1
            .replace_all(&output, "${1}[MASKED]")
            .to_string();
        output = self
            .presign_2
            .replace_all(&output, "${1}[MASKED]")
            .to_string();
        output
    }
}

/// Masks secrets in every formatted log line before it reaches `inner`
struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = self.patterns.redact(&String::from_utf8_lossy(buf));
        self.inner.write_all(line.as_bytes())?;
        // Callers track the unredacted length.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Hands `tracing-subscriber` a redacting stderr writer per event
struct RedactedStderr(Arc<RedactionPatterns>);

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RedactedStderr {
    type Writer = RedactingWriter<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: io::stderr(),
            patterns: Arc::clone(&self.0),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = match RedactionPatterns::new() {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("Failed to compile regex patterns: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(patterns);

    info!("Starting Pagecast...");

    let Some((settings, job)) = init_settings() else {
        return ExitCode::from(2);
    };

    match run(&settings, &job).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ PagecastError::NoMatchingPost { .. }) => {
            warn!("Nothing to send: {}", e);
            exit_code(&e)
        }
        Err(e) => {
            error!("Run failed: {}", e);
            exit_code(&e)
        }
    }
}

async fn run(settings: &Settings, job: &JobConfig) -> Result<(), PagecastError> {
    let messenger =
        TelegramMessenger::new(settings.telegram_bot_token.clone(), &settings.telegram_chat_id)?;
    let store = S3Store::new(&settings.s3_options()).await?;
    info!(bucket = store.bucket(), catalog = %job.catalog_key, "Storage initialized.");

    let mut rng = fastrand::Rng::new();
    let summary = run_once(job, &store, &messenger, &mut rng).await?;

    info!(
        from = summary.entry.from_page,
        to = summary.entry.to_page,
        pages = summary.report.pages_sent,
        "Done."
    );
    Ok(())
}

fn exit_code(err: &PagecastError) -> ExitCode {
    u8::try_from(err.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactedStderr(patterns);

    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let filter = if debug_mode {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "pagecast_core=info,pagecast_transport_telegram=info,pagecast_bot=info,hyper=warn,h2=error,reqwest=warn,aws_config=warn,aws_smithy_runtime=warn",
            )
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Option<(Settings, JobConfig)> {
    let settings = match Settings::new() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return None;
        }
    };
    match settings.job_config() {
        Ok(job) => {
            info!(
                min_pages = job.criteria.min_pages(),
                max_pages = job.criteria.max_pages(),
                strategy = ?job.strategy,
                "Configuration loaded successfully."
            );
            Some((settings, job))
        }
        Err(e) => {
            error!("Invalid configuration: {}", e);
            None
        }
    }
}
