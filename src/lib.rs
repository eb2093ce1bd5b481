// ==========================================
// 产线 OEE 指标监控系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 按时间窗口计算 OEE 及其分量，越限生成告警
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 指标计算与告警
pub mod engine;

// 采集层 - 外部读数
pub mod ingest;

// 配置层 - 引擎参数与进程设置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 告警与 KPI 接口
pub mod api;

// 定时调度
pub mod scheduler;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    Alert, AlertSeverity, KpiName, KpiStatus, KpiValue, NewAlert, SensorReading, ThresholdTable,
    Thresholds, TimeWindow,
};

// 引擎
pub use engine::{AlertEmitter, EngineError, OeeEngine, OeeReport};

// API
pub use api::{AlertApi, KpiApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "产线 OEE 指标监控系统";
