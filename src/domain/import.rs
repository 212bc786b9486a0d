// ==========================================
// 目录数据交换 - 导入结果
// ==========================================
// 职责: 一次导入的行级汇总（数据 + 错误 + 警告）
// 红线: processed / skipped 为派生值，不冗余存储
// ==========================================

use serde::{Deserialize, Serialize};

/// 导入结果
///
/// - data: 通过全部校验的记录
/// - errors: 行级错误（"Row N: ..."）
/// - warnings: 不阻断导入的提示
/// - total_rows: 数据行总数（不含表头）
/// - source_rows: 与 data 一一对应的工作表行号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult<T> {
    pub data: Vec<T>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_rows: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_rows: Vec<usize>,
}

impl<T> ImportResult<T> {
    pub fn processed(&self) -> usize {
        self.data.len()
    }

    pub fn skipped(&self) -> usize {
        self.total_rows.saturating_sub(self.processed())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 记录一条通过校验的数据及其行号
    pub fn accept(&mut self, item: T, row_number: usize) {
        self.data.push(item);
        self.source_rows.push(row_number);
    }

    /// (行号, 记录) 迭代
    pub fn rows(&self) -> impl Iterator<Item = (usize, &T)> {
        self.source_rows.iter().copied().zip(self.data.iter())
    }
}

impl<T> Default for ImportResult<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            total_rows: 0,
            source_rows: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_counts() {
        let result = ImportResult {
            data: vec![1, 2, 3],
            errors: vec!["Row 4: code is required".to_string()],
            warnings: Vec::new(),
            total_rows: 5,
            source_rows: vec![2, 3, 5],
        };

        assert_eq!(result.processed(), 3);
        assert_eq!(result.skipped(), 2);
        assert!(result.has_errors());
    }

    #[test]
    fn test_accept_keeps_row_numbers_aligned() {
        let mut result = ImportResult::default();
        result.accept("a", 2);
        result.accept("b", 4);

        let rows: Vec<(usize, &&str)> = result.rows().collect();
        assert_eq!(rows, vec![(2, &"a"), (4, &"b")]);
    }
}
