// ==========================================
// 目录数据交换 - 引擎层
// ==========================================
// 职责: 对账（按自然键 upsert）
// 红线: Engine 不拼 SQL，数据访问经由 repository
// ==========================================

pub mod reconciliation;

// 重导出核心引擎
pub use reconciliation::{
    ReconcileCounts, ReconcileError, ReconcileResult, ReconcileStage, ReconciliationService,
};
