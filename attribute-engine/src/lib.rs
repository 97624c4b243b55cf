//! Attribute Engine - 多语言多渠道商品属性数据与导入映射引擎
//!
//! # 架构概述
//!
//! 商品属性编辑与批量导入的核心逻辑，不含任何 UI 与传输层：
//!
//! - **值编解码** (`codec`): 11 种数据类型的 normalize / denormalize / validate
//! - **作用域键** (`scope`): (attribute, locale, channel) 规范化标识
//! - **分组归一化** (`groups`): 上游各种形态的属性分组 → 统一结构
//! - **导入映射** (`mapping`): 源表头 → 目标字段，自动匹配与模板复用
//! - **保存协调** (`save`): 防抖、乐观更新、单键单请求的保存状态机
//! - **批量导入** (`import`): 文件预览、映射确认、任务提交与轮询
//!
//! # 模块结构
//!
//! ```text
//! attribute-engine/src/
//! ├── codec/         # 值编解码策略表
//! ├── groups/        # 属性分组归一化
//! ├── import/        # 导入预览、导入会话
//! ├── save/          # 保存协调器
//! ├── catalog.rs     # 目录服务协作者 trait
//! ├── config.rs      # 环境变量配置
//! ├── logger.rs      # 日志初始化
//! ├── mapping.rs     # 列映射解析
//! ├── scope.rs       # 作用域键
//! ├── storage.rs     # 键值存储、模板、偏好
//! └── store.rs       # 内存属性值集合
//! ```

pub mod catalog;
pub mod codec;
pub mod config;
pub mod groups;
pub mod import;
pub mod logger;
pub mod mapping;
pub mod save;
pub mod scope;
pub mod storage;
pub mod store;

#[cfg(test)]
mod test_support;

// Re-export 公共类型
pub use catalog::CatalogCollaborator;
pub use config::EngineConfig;
pub use import::{ImportSession, ImportStep, SpreadsheetDecoder};
pub use mapping::{MappingResolution, MappingResolver};
pub use save::{SaveCoordinator, SaveEvent, SaveState};
pub use scope::{NO_SELECTION, ScopeKey, derive_key};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, Preferences, TemplateStore};
pub use store::ValueStore;

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use logger::{init_logger, init_logger_with_file};
