//! 节点日志
//!
//! `Logger` 只是一个带名称的 `tracing` 事件入口：每条事件附带 `logger` 字段，
//! 输出格式与过滤由进程入口初始化的 subscriber 决定。

use std::fmt;
use std::sync::Arc;

/// FATAL 级别在 `tracing` 中映射为 ERROR 事件，并附带此严重性字段
pub const FATAL_SEVERITY: &str = "FATAL";

/// 节点日志器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    name: Arc<str>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
        }
    }

    /// 由节点完整名生成日志器名：`/wx250s/gravity_compensation` → `wx250s.gravity_compensation`
    pub fn for_node(fully_qualified_name: &str) -> Self {
        Self::new(fully_qualified_name.trim_start_matches('/').replace('/', "."))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 子日志器 `<name>.<suffix>`
    pub fn child(&self, suffix: &str) -> Self {
        Self::new(format!("{}.{}", self.name, suffix))
    }

    pub fn debug(&self, msg: impl fmt::Display) {
        tracing::debug!(logger = %self.name, "{}", msg);
    }

    pub fn info(&self, msg: impl fmt::Display) {
        tracing::info!(logger = %self.name, "{}", msg);
    }

    pub fn warn(&self, msg: impl fmt::Display) {
        tracing::warn!(logger = %self.name, "{}", msg);
    }

    pub fn error(&self, msg: impl fmt::Display) {
        tracing::error!(logger = %self.name, "{}", msg);
    }

    pub fn fatal(&self, msg: impl fmt::Display) {
        tracing::error!(logger = %self.name, severity = FATAL_SEVERITY, "{}", msg);
    }

    /// FATAL 事件，失败原因放在 `cause` 字段中（同一条日志）
    pub fn fatal_with_cause(&self, msg: impl fmt::Display, cause: impl fmt::Display) {
        tracing::error!(
            logger = %self.name,
            severity = FATAL_SEVERITY,
            cause = %cause,
            "{}",
            msg
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_names() {
        let logger = Logger::for_node("/wx250s/gravity_compensation");
        assert_eq!(logger.name(), "wx250s.gravity_compensation");
        assert_eq!(logger.child("solver").name(), "wx250s.gravity_compensation.solver");
        assert_eq!(Logger::for_node("/xs_sdk").name(), "xs_sdk");
    }
}
