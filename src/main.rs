use imagely_api::{
    create_app,
    logging::{init_logging, log_server_ready, log_shutdown},
    services::database::ensure_schema,
    AppState,
};
use std::net::{IpAddr, SocketAddr};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let app_state = AppState::new().await?;

    if std::env::var("DB_AUTO_MIGRATE").is_ok_and(|v| v == "true") {
        tracing::info!("初始化数据表...");
        ensure_schema(app_state.db.as_ref()).await?;
    }

    tracing::info!("创建应用程序...");
    let host: IpAddr = app_state.config.server.host.parse()?;
    let addr = SocketAddr::new(host, app_state.config.server.port);
    let app = create_app(app_state);

    tracing::info!("启动 HTTP 服务器...");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    log_server_ready(&addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("监听退出信号失败: {}", e);
            }
        })
        .await;

    log_shutdown();
    result.map_err(Into::into)
}
