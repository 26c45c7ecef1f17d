use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt as _;
use mft_auth::TokenManager;
use mft_client::{FileTransferClient, RetryPolicy};
use mft_config::{Config, LogConfig, LogFormat};
use mft_types::{ListFilter, MftError, RequestContext, UploadMetadata};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::io::AsyncWriteExt as _;
use tokio_util::io::ReaderStream;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(name = "mft", about = "mft: managed file-transfer API client")]
struct Cli {
    /// Path to the YAML configuration file (`MFT_*` variables override it).
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Tenant id for multi-tenant tokens (overrides `tenant_id`).
    #[arg(long, global = true)]
    tenant: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Retrieve an access token from the identity provider and print it.
    Token,
    /// List files visible to the token.
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        page_size: u32,
        /// Only files of this business type.
        #[arg(long)]
        business_type: Option<i64>,
    },
    /// Set a file to deleted.
    Delete {
        file_id: String,
    },
    /// Upload a local file.
    Upload {
        path: PathBuf,
        /// Use this file id instead of a generated one.
        #[arg(long)]
        file_id: Option<String>,
        #[arg(long)]
        business_type: Option<i64>,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Download a file to a path (default: stdout).
    Download {
        file_id: String,
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
    }
}

/// Everything a command needs, built once from the configuration.
struct App {
    tokens: Arc<TokenManager>,
    client: FileTransferClient,
    context: RequestContext,
    retry: RetryPolicy,
}

impl App {
    fn new(config: &Config, tenant: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build HTTP client")?;
        let tokens = Arc::new(TokenManager::new(http.clone(), config.credentials()?));
        let client = FileTransferClient::new(&config.api.base_url, tokens.clone())?
            .with_http(http)
            .with_tenant_header(&config.api.tenant_header)?;
        let context = match tenant {
            Some(t) => RequestContext::from_tenant(Some(t)),
            None => config.request_context(),
        };
        let retry = RetryPolicy::new(
            config.retry.max_attempts,
            Duration::from_millis(config.retry.initial_backoff_ms),
            Duration::from_millis(config.retry.max_backoff_ms),
        );
        Ok(Self {
            tokens,
            client,
            context,
            retry,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).map_err(|e| anyhow::anyhow!("config error: {e}"))?;
    init_logging(&config.log);
    let app = App::new(&config, cli.tenant.as_deref())?;

    match cli.command {
        Commands::Token => cmd_token(&app).await,
        Commands::List {
            page,
            page_size,
            business_type,
        } => {
            let filter = ListFilter {
                page_index: page,
                page_size,
                business_type_id: business_type,
            };
            cmd_list(&app, &filter).await
        }
        Commands::Delete { file_id } => cmd_delete(&app, &file_id).await,
        Commands::Upload {
            path,
            file_id,
            business_type,
            content_type,
        } => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("not a file path: {}", path.display()))?;
            let metadata = UploadMetadata::builder()
                .file_name(file_name)
                .maybe_file_id(file_id)
                .maybe_business_type_id(business_type)
                .maybe_content_type(content_type)
                .build();
            cmd_upload(&app, path, metadata).await
        }
        Commands::Download { file_id, output } => cmd_download(&app, &file_id, output).await,
    }
}

async fn cmd_token(app: &App) -> Result<()> {
    let token = app.retry.run(|| app.tokens.authenticate()).await?;
    eprintln!(
        "token generated for {}:",
        app.tokens.credentials().redacted()
    );
    println!("{}", token.value);
    if let Some(secs) = token.remaining_secs() {
        eprintln!("expires in {secs}s");
    }
    Ok(())
}

async fn cmd_list(app: &App, filter: &ListFilter) -> Result<()> {
    let page = app
        .retry
        .run(|| app.client.list_files(&app.context, filter))
        .await?;
    for file in &page.files {
        let size = file.file_size.map(|s| s.to_string()).unwrap_or_default();
        println!("{}\t{}\t{size}", file.file_id, file.file_name);
    }
    if let Some(total) = page.total {
        eprintln!("page {} ({} of {total} files)", page.page_index, page.files.len());
    }
    Ok(())
}

async fn cmd_delete(app: &App, file_id: &str) -> Result<()> {
    let deleted = app
        .retry
        .run(|| app.client.delete_file(file_id, &app.context))
        .await?;
    println!("file could be deleted: {deleted}");
    Ok(())
}

async fn cmd_upload(app: &App, path: PathBuf, metadata: UploadMetadata) -> Result<()> {
    // Each attempt reopens the file; a consumed stream cannot be replayed.
    let reference = app
        .retry
        .run(|| {
            let path = path.clone();
            let metadata = metadata.clone();
            async move {
                let file = tokio::fs::File::open(&path).await.map_err(|e| {
                    MftError::Validation(format!("cannot open {}: {e}", path.display()))
                })?;
                let body = ReaderStream::new(file)
                    .map(|chunk| chunk.map_err(|e| MftError::transport(format!("read failed: {e}"))));
                app.client.upload_file(&app.context, metadata, body).await
            }
        })
        .await?;
    println!("{}", reference.file_id);
    Ok(())
}

async fn cmd_download(app: &App, file_id: &str, output: Option<PathBuf>) -> Result<()> {
    let mut stream = app
        .retry
        .run(|| app.client.download_file(file_id, &app.context))
        .await?;
    let mut sink: Box<dyn tokio::io::AsyncWrite + Unpin + Send> = match &output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        sink.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    sink.flush().await?;
    tracing::info!(file_id, bytes = written, "download complete");
    Ok(())
}
