//! 名称解析
//!
//! - 绝对名：`/wx250s/joint_states`，原样使用
//! - 相对名：`joint_states`，拼接节点命名空间
//! - 私有名：`~/state`，拼接节点完整名

use crate::error::{Result, RuntimeError};

/// 校验节点名（字母、数字、下划线，不以数字开头）
pub fn validate_node_name(name: &str) -> Result<()> {
    let invalid = |reason| {
        Err(RuntimeError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };
    if name.is_empty() {
        return invalid("node name must not be empty");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return invalid("node name must not start with a digit");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return invalid("node name may only contain alphanumerics and '_'");
    }
    Ok(())
}

/// 规范化命名空间：空串视为根 `/`，缺少前导 `/` 时补齐
pub fn normalize_namespace(namespace: &str) -> Result<String> {
    if namespace.is_empty() || namespace == "/" {
        return Ok("/".to_string());
    }
    let ns = if namespace.starts_with('/') {
        namespace.to_string()
    } else {
        format!("/{namespace}")
    };
    validate_absolute(&ns)?;
    Ok(ns)
}

/// 节点完整名 `<namespace>/<name>`
pub fn fully_qualified_name(namespace: &str, node_name: &str) -> String {
    if namespace == "/" {
        format!("/{node_name}")
    } else {
        format!("{namespace}/{node_name}")
    }
}

/// 将话题/服务名解析为绝对名
pub fn resolve(namespace: &str, node_name: &str, name: &str) -> Result<String> {
    let resolved = if let Some(rest) = name.strip_prefix("~/") {
        format!("{}/{rest}", fully_qualified_name(namespace, node_name))
    } else if name == "~" {
        fully_qualified_name(namespace, node_name)
    } else if name.starts_with('/') {
        name.to_string()
    } else if namespace == "/" {
        format!("/{name}")
    } else {
        format!("{namespace}/{name}")
    };
    validate_absolute(&resolved).map_err(|e| match e {
        RuntimeError::InvalidName { reason, .. } => RuntimeError::InvalidName {
            name: name.to_string(),
            reason,
        },
        other => other,
    })?;
    Ok(resolved)
}

fn validate_absolute(name: &str) -> Result<()> {
    let invalid = |reason| {
        Err(RuntimeError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };
    if name.len() <= 1 {
        return invalid("name must not be empty");
    }
    if name.contains("//") {
        return invalid("name must not contain '//'");
    }
    if name.ends_with('/') {
        return invalid("name must not end with '/'");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '/') {
        return invalid("name may only contain alphanumerics, '_' and '/'");
    }
    Ok(())
}
