// src/start.rs
use std::{net::SocketAddr, time::Duration};

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use secrecy::ExposeSecret;
use tokio::{net::TcpListener, signal};

use crate::{
    core::{config::Config, log},
    routes,
    services::{auth::bootstrap_admin, email::EmailService, recaptcha::RecaptchaGate},
    state::AppState,
};

/// 启动并运行应用程序。
///
/// 1. 加载配置、初始化日志
/// 2. 连接数据库并执行迁移，按需创建超级管理员
/// 3. 连接 Redis
/// 4. 初始化邮件服务与人机校验
/// 5. 启动 HTTP 服务器，收到信号后优雅关闭
///
/// 启动阶段的任何失败都直接退出进程。
pub async fn run() {
    let config = Config::new();

    // guard 必须活到进程结束，否则文件日志会丢失
    let _guard = log::init(&config);
    tracing::info!("🔍 Config loaded successfully.");

    let mut opt = ConnectOptions::new(config.database_url.expose_secret());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("❌ Failed to connect to Database");
    tracing::info!("✅ Database connected.");

    Migrator::up(&db, None)
        .await
        .expect("❌ Failed to run database migrations");
    tracing::info!("✅ Migrations applied.");

    bootstrap_admin(&db, &config)
        .await
        .expect("❌ Failed to bootstrap admin account");

    // ConnectionManager 自带断线重连
    let client = redis::Client::open(config.redis_url.expose_secret())
        .expect("❌ Invalid Redis URL");
    let redis_manager = client
        .get_connection_manager()
        .await
        .expect("❌ Failed to connect to Redis");
    tracing::info!("✅ Redis connected.");

    let email = EmailService::from_config(&config).expect("❌ Invalid email configuration");
    let recaptcha = RecaptchaGate::from_config(&config).expect("❌ Invalid reCAPTCHA configuration");
    tracing::info!(
        "🛡️ reCAPTCHA mode: {}",
        if recaptcha.is_bypass() { "bypass" } else { "enforce" }
    );

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .expect("❌ Invalid address configuration");

    let state = AppState::new(db, redis_manager, config, email, recaptcha);

    let listener = TcpListener::bind(addr)
        .await
        .expect("❌ Failed to bind listener");
    tracing::info!("🚀 Server listening on http://{}", addr);

    let app = routes::create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("❌ Server error");
}

/// 等待 Ctrl+C 或 SIGTERM，任一到达即开始优雅关闭。
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("🛑 Signal received, starting graceful shutdown...");
}
