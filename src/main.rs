use dotenvy::dotenv;
use newsfeed_bot::api::{self, AppState};
use newsfeed_bot::bot;
use newsfeed_bot::config::Settings;
use newsfeed_bot::feed::FeedService;
use newsfeed_bot::media::TelegramFileResolver;
use newsfeed_bot::storage::{self, NewsRepository};
use newsfeed_bot::wizard::AdminWizard;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
struct RedactionPatterns {
    token1: Regex,
    token2: Regex,
    token3: Regex,
    db_password: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token1: Regex::new(r"(https?://[^/]+/(?:file/)?bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token2: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token3: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
            db_password: Regex::new(r"(postgres(?:ql)?://[^:/@\s]+:)[^@\s]+@")?,
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
            .db_password
            .replace_all(&output, "$1[MASKED]@")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length; the redacted text may differ in size
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting news feed bot...");

    let settings = init_settings();
    let repo = init_storage(&settings).await;

    let feed = FeedService::new(repo);
    let wizard = Arc::new(AdminWizard::new(feed.clone()));
    let resolver = Arc::new(TelegramFileResolver::new(
        &settings.telegram_api_url,
        settings.bot_token().map(str::to_string),
    ));

    let state = AppState {
        feed,
        resolver,
        public_base_url: settings.public_base_url(),
    };

    let listener = match api::bind(&settings.api_bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to start feed API: {e:#}");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let mut api_task = tokio::spawn(api::serve(state, listener, shutdown.clone()));

    // Whichever side stops first brings the other one down
    let api_result = tokio::select! {
        () = run_front_end(settings.clone(), wizard) => None,
        res = &mut api_task => Some(res),
    };

    info!("Shutting down...");
    shutdown.cancel();
    let api_result = match api_result {
        Some(res) => res,
        None => api_task.await,
    };
    match api_result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("Feed API error: {e:#}");
            std::process::exit(1);
        }
        Err(e) => {
            error!("Feed API task failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Run the chat bot, or just wait for Ctrl-C when no token is configured.
async fn run_front_end(settings: Arc<Settings>, wizard: Arc<AdminWizard>) {
    if let Some(token) = settings.bot_token() {
        if settings.admin_id == 0 {
            warn!("ADMIN_ID is not set: nobody can manage the feed.");
        }
        bot::run_bot(token, settings.clone(), wizard).await;
    } else {
        warn!("BOT_TOKEN is not set: running the feed API only.");
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {e}");
        }
    }
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let default_level = if debug_mode { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_storage(settings: &Settings) -> Arc<dyn NewsRepository> {
    match storage::connect(settings).await {
        Ok(repo) => {
            if let Err(e) = repo.check_connection().await {
                error!("Storage connection check returned error: {}", e);
            }
            repo
        }
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    }
}
