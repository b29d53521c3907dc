//! 시세 조회 API 서버 진입점.

use anyhow::Context;
use quote_core::{init_logging, LogConfig, QuoteConfig, DEFAULT_CONFIG_PATH};
use quote_data::{
    DurableStore, FinnhubProvider, FugleProvider, MemoryStore, QuoteOrchestrator, RedisStore,
    RedisStoreConfig,
};
use quote_api::{create_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 서버 설정 구조체.
struct ServerConfig {
    /// 바인딩할 호스트 주소
    host: String,
    /// 바인딩할 포트
    port: u16,
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드.
    fn from_env() -> Self {
        let host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self { host, port }
    }

    /// 소켓 주소 반환.
    fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// 내구성 저장소를 준비합니다. `REDIS_URL`이 없으면 메모리 저장소를 씁니다.
async fn create_store(config: &QuoteConfig) -> anyhow::Result<Arc<dyn DurableStore>> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisStore::connect(&RedisStoreConfig { url: url.clone() })
                .await
                .context("Redis 연결 실패. REDIS_URL을 확인하세요")?;
            if !store.health_check().await.unwrap_or(false) {
                warn!("Redis PING did not return PONG");
            }
            Ok(Arc::new(store))
        }
        None => {
            warn!("REDIS_URL not set, using in-memory store (cache is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    init_logging(&LogConfig::from_env()).map_err(|e| anyhow::anyhow!(e))?;
    info!("Starting quote API server...");

    let server = ServerConfig::from_env();
    let addr = server.socket_addr().map_err(|e| {
        error!(
            host = %server.host,
            port = server.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. API_HOST, API_PORT 환경변수를 확인하세요."
        );
        e
    })?;

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = QuoteConfig::load(&config_path)
        .with_context(|| format!("설정 로드 실패: {}", config_path))?;
    info!(
        config_path = %config_path,
        default_market = %config.batch.default_market,
        max_symbols = config.batch.max_symbols_per_request,
        max_sync_fetch = config.batch.max_sync_fetch,
        us_chunk_size = config.batch.us_chunk_size,
        l1_ttl_secs = config.cache.l1_ttl_secs,
        "Configuration loaded"
    );

    let store = create_store(&config).await?;
    let fugle = Arc::new(FugleProvider::from_config(&config.upstream)?);
    let finnhub = Arc::new(FinnhubProvider::from_config(&config.upstream)?);

    let orchestrator = QuoteOrchestrator::new(&config, store, fugle, finnhub);
    let state = Arc::new(AppState::new(orchestrator));
    info!(version = %state.version, "Application state initialized");

    let app = create_router(state);

    info!(%addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기 (Ctrl+C 또는 SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
