use std::sync::Arc;
use tokio::time::Duration;

use shared::error::AppResult;

use crate::import::PREVIEW_ROWS;
use crate::mapping::{DEFAULT_TEMPLATE_THRESHOLD, MappingResolver};
use crate::save::DEBOUNCE_MS;
use crate::storage::JsonFileStore;

/// 引擎配置 - 属性编辑与批量导入的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | SAVE_DEBOUNCE_MS | 500 | 保存防抖窗口(毫秒) |
/// | TEMPLATE_REUSE_THRESHOLD | 0.70 | 映射模板复用阈值 |
/// | IMPORT_PREVIEW_ROWS | 5 | 导入预览数据行数 |
/// | IMPORT_POLL_INTERVAL_MS | 1000 | 导入任务轮询间隔(毫秒) |
/// | IMPORT_POLL_MAX_ATTEMPTS | 120 | 导入任务最大轮询次数 |
/// | PREFERENCES_PATH | ./catalog-prefs.json | 偏好设置文件 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 日志目录，设置后按天滚动写入文件 |
///
/// # 示例
///
/// ```ignore
/// SAVE_DEBOUNCE_MS=800 LOG_LEVEL=debug cargo run
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 保存防抖窗口 (毫秒)
    pub save_debounce_ms: u64,
    /// 模板表头命中比例达到该值时复用模板
    pub template_reuse_threshold: f64,
    /// 导入预览数据行数
    pub import_preview_rows: usize,
    /// 导入任务轮询间隔 (毫秒)
    pub import_poll_interval_ms: u64,
    /// 导入任务最大轮询次数
    pub import_poll_max_attempts: u32,
    /// 偏好设置 JSON 文件路径
    pub preferences_path: String,
    /// 日志级别: trace | debug | info | warn | error
    pub log_level: String,
    /// 日志目录 (None = 仅输出到终端)
    pub log_dir: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: DEBOUNCE_MS,
            template_reuse_threshold: DEFAULT_TEMPLATE_THRESHOLD,
            import_preview_rows: PREVIEW_ROWS,
            import_poll_interval_ms: 1000,
            import_poll_max_attempts: 120,
            preferences_path: "./catalog-prefs.json".into(),
            log_level: "info".into(),
            log_dir: None,
        }
    }
}

impl EngineConfig {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            save_debounce_ms: env_parse("SAVE_DEBOUNCE_MS").unwrap_or(defaults.save_debounce_ms),
            template_reuse_threshold: env_parse("TEMPLATE_REUSE_THRESHOLD")
                .filter(|t: &f64| (0.0..=1.0).contains(t))
                .unwrap_or(defaults.template_reuse_threshold),
            import_preview_rows: env_parse("IMPORT_PREVIEW_ROWS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.import_preview_rows),
            import_poll_interval_ms: env_parse("IMPORT_POLL_INTERVAL_MS")
                .unwrap_or(defaults.import_poll_interval_ms),
            import_poll_max_attempts: env_parse("IMPORT_POLL_MAX_ATTEMPTS")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.import_poll_max_attempts),
            preferences_path: std::env::var("PREFERENCES_PATH")
                .unwrap_or(defaults.preferences_path),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
        }
    }

    /// 加载 `.env` 后读取环境变量
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn with_save_debounce_ms(mut self, ms: u64) -> Self {
        self.save_debounce_ms = ms;
        self
    }

    pub fn with_template_reuse_threshold(mut self, threshold: f64) -> Self {
        self.template_reuse_threshold = threshold;
        self
    }

    pub fn with_import_preview_rows(mut self, rows: usize) -> Self {
        self.import_preview_rows = rows;
        self
    }

    pub fn with_import_polling(mut self, interval_ms: u64, max_attempts: u32) -> Self {
        self.import_poll_interval_ms = interval_ms;
        self.import_poll_max_attempts = max_attempts;
        self
    }

    pub fn with_preferences_path(mut self, path: impl Into<String>) -> Self {
        self.preferences_path = path.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<String>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn import_poll_interval(&self) -> Duration {
        Duration::from_millis(self.import_poll_interval_ms)
    }

    pub fn mapping_resolver(&self) -> MappingResolver {
        MappingResolver::new(self.template_reuse_threshold)
    }

    /// 打开偏好设置文件
    pub fn open_preferences(&self) -> AppResult<Arc<JsonFileStore>> {
        JsonFileStore::open(&self.preferences_path).map(Arc::new)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
