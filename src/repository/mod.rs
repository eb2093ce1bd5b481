// ==========================================
// 产线 OEE 指标监控系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: `insert_in` 系列函数接受调用方的连接/事务，
//       供引擎在同一事务内完成多表写入
// ==========================================

pub mod alert_repo;
pub mod error;
pub mod kpi_value_repo;
pub mod reading_repo;
pub mod reading_store;

// 重导出核心仓储
pub use alert_repo::AlertRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use kpi_value_repo::KpiValueRepository;
pub use reading_repo::SensorReadingRepository;
pub use reading_store::{ReadingStore, SensorGate, SqliteReadingStore, ValueFilter};
