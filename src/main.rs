use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use state::AppState;
use thesis_search::config::{self, AppConfig};
use thesis_search::pipeline::{parse_json_line, IndexPipeline, Processed};
use thesis_search::solr::{HttpTransport, IndexConnection};

const USAGE: &str = "usage: thesis-search [serve | load <file.jsonl>]";

/// Connect to Solr and discover its cores / 连接 Solr 并发现核心
async fn connect(app_config: &AppConfig) -> anyhow::Result<Arc<IndexConnection>> {
    let transport = HttpTransport::new(&app_config.solr.url, app_config.solr.timeout())
        .context("Invalid Solr configuration")?;
    let connection = IndexConnection::connect(
        Arc::new(transport),
        app_config.solr.connection_settings(),
    )
    .await
    .with_context(|| format!("Failed to connect to Solr at {}", app_config.solr.url))?;
    Ok(Arc::new(connection))
}

/// Stream crawled JSON lines into the index / 导入爬取的 JSON 行
async fn load(app_config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let connection = connect(app_config).await?;
    let pipeline = IndexPipeline::new(connection);

    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {:?}", path))?;
    let mut lines = BufReader::new(file).lines();

    let (mut indexed, mut duplicates, mut skipped) = (0usize, 0usize, 0usize);
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let item = match parse_json_line(&line) {
            Ok(Some(item)) => item,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("Line {} skipped: {}", line_no, e);
                skipped += 1;
                continue;
            }
        };

        match pipeline.process_item(item).await {
            Ok(Processed::Indexed(_)) => indexed += 1,
            Ok(Processed::Duplicate) => duplicates += 1,
            Err(e) if e.is_validation() => {
                tracing::warn!("Line {} skipped: {}", line_no, e);
                skipped += 1;
            }
            Err(e) => {
                // flush what is queued before giving up
                if let Err(flush_err) = pipeline.close().await {
                    tracing::error!("Flush after failure also failed: {}", flush_err);
                }
                return Err(e).with_context(|| format!("Indexing failed at line {}", line_no));
            }
        }
    }

    pipeline.close().await?;
    tracing::info!(
        "Loaded {:?}: {} indexed, {} duplicates, {} skipped",
        path,
        indexed,
        duplicates,
        skipped
    );
    Ok(())
}

/// Serve the HTTP API until Ctrl-C / 启动 HTTP 服务
async fn serve(app_config: &AppConfig) -> anyhow::Result<()> {
    let connection = connect(app_config).await?;
    let state = Arc::new(AppState::new(connection.clone()));
    let app = api::router(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
        })
        .await?;

    // Submit documents still waiting in the queues / 提交队列中剩余的文档
    let results = connection.flush_all().await;
    let failed: Vec<&String> = results
        .iter()
        .filter(|(_, outcome)| outcome.is_failed())
        .map(|(core, _)| core)
        .collect();
    if !failed.is_empty() {
        anyhow::bail!("Documents left unsubmitted in core(s): {:?}", failed);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thesis_search=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config()?;
    tracing::info!(
        "thesis-search {} (built {}), Solr at {}",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME"),
        app_config.solr.url
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["serve"] => serve(&app_config).await,
        ["load", path] => load(&app_config, Path::new(path)).await,
        _ => anyhow::bail!(USAGE),
    }
}
