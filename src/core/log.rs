use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry, util::SubscriberInitExt, EnvFilter,
};

use crate::core::config::Config;

/// 初始化日志：控制台 + 按天滚动的文件。返回的 guard 必须在整个进程生命周期内持有，
/// 否则后台写线程会提前退出，文件日志丢失。
pub fn init(config: &Config) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "foundation-portal.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // 文件层：不带颜色，保留代码位置，方便线上排查
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_file(true)
        .with_line_number(true);

    // RUST_LOG 写错时退回 info，而不是直接崩溃
    let filter = EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

    registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}
