use crate::config::Config;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 当前配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - UPSC 出题引擎");
    info!("🤖 模型: {}", config.model_name);
    info!("📚 资料库目录: {}", config.library_dir.display());
    info!("{}", "=".repeat(60));
}

/// 记录资料库扫描结果
///
/// # 参数
/// - `logs`: 扫描产生的日志行
pub fn log_scan_summary(logs: &[String]) {
    info!("\n{}", "─".repeat(60));
    if logs.is_empty() {
        info!("✓ 资料库无变化");
    } else {
        info!("📋 本次扫描共 {} 条记录", logs.len());
    }
    info!("{}", "─".repeat(60));
}

/// 记录测验得分
///
/// # 参数
/// - `topic`: 测验主题
/// - `score`: 得分
/// - `max_score`: 满分
pub fn log_quiz_result(topic: &str, score: f64, max_score: f64) {
    info!("\n{}", "=".repeat(60));
    info!("🏆 {} 最终得分: {:.2} / {}", truncate_text(topic, 40), score, max_score);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
