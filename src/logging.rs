// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持 RUST_LOG 覆盖;可选 JSON 输出
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志系统
///
/// # 参数
/// - `debug`: 未设置 RUST_LOG 时使用 debug 级别 (否则 info)
/// - `json`: 以 JSON 行输出
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器,例如 RUST_LOG=ml_tracking=trace
///
/// # 示例
/// ```no_run
/// use ml_tracking::logging;
/// logging::init(false, false);
/// ```
pub fn init(debug: bool, json: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    // 重复初始化 (例如嵌入测试) 时静默忽略
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
