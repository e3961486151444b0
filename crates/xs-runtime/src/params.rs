//! 节点参数
//!
//! 参数值来源（优先级从高到低）：
//!
//! 1. `NodeOptions` 中的覆盖值
//! 2. 命令行 `-p node:name:=value`
//! 3. 命令行 `-p name:=value`
//! 4. 参数文件中以节点名（或完整名）为键的表
//! 5. 参数文件中的通配表 `["/**"]`
//! 6. `declare_parameter` 给出的默认值
//!
//! 参数文件为 TOML：
//!
//! ```toml
//! [gravity_compensation]
//! arm_group_name = "arm"
//! motor_specs = "config/wx250s_motor_specs.toml"
//!
//! ["/**"]
//! service_timeout = 2.0
//! ```

use crate::error::{Result, RuntimeError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// 通配表名：作用于所有节点
pub const WILDCARD_TABLE: &str = "/**";

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    IntegerArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl ParameterValue {
    /// 类型名称（用于错误信息）
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::IntegerArray(_) => "integer array",
            Self::DoubleArray(_) => "double array",
            Self::StringArray(_) => "string array",
        }
    }

    fn is_empty_array(&self) -> bool {
        match self {
            Self::IntegerArray(v) => v.is_empty(),
            Self::DoubleArray(v) => v.is_empty(),
            Self::StringArray(v) => v.is_empty(),
            _ => false,
        }
    }

    /// 解析命令行给出的参数值
    ///
    /// 先按 TOML 值解析（`true`、`3`、`0.5`、`[1.0, 2.0]`、`"text"`），
    /// 失败时作为普通字符串。
    pub fn parse_cli(raw: &str) -> Self {
        #[derive(Deserialize)]
        struct Wrapper {
            v: toml::Value,
        }

        toml::from_str::<Wrapper>(&format!("v = {raw}"))
            .ok()
            .and_then(|w| Self::try_from(w.v).ok())
            .unwrap_or_else(|| Self::String(raw.to_string()))
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::IntegerArray(v) => write!(f, "{v:?}"),
            Self::DoubleArray(v) => write!(f, "{v:?}"),
            Self::StringArray(v) => write!(f, "{v:?}"),
        }
    }
}

impl TryFrom<toml::Value> for ParameterValue {
    type Error = String;

    fn try_from(value: toml::Value) -> std::result::Result<Self, Self::Error> {
        match value {
            toml::Value::Boolean(b) => Ok(Self::Bool(b)),
            toml::Value::Integer(i) => Ok(Self::Integer(i)),
            toml::Value::Float(f) => Ok(Self::Double(f)),
            toml::Value::String(s) => Ok(Self::String(s)),
            toml::Value::Array(items) => array_value(items),
            other => Err(format!("unsupported parameter value type: {}", other.type_str())),
        }
    }
}

fn array_value(items: Vec<toml::Value>) -> std::result::Result<ParameterValue, String> {
    if items.is_empty() {
        return Ok(ParameterValue::DoubleArray(Vec::new()));
    }
    if items.iter().all(|v| v.is_integer()) {
        return Ok(ParameterValue::IntegerArray(
            items.iter().filter_map(toml::Value::as_integer).collect(),
        ));
    }
    if items.iter().all(|v| v.is_integer() || v.is_float()) {
        return Ok(ParameterValue::DoubleArray(
            items
                .iter()
                .filter_map(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
                .collect(),
        ));
    }
    if items.iter().all(|v| v.is_str()) {
        return Ok(ParameterValue::StringArray(
            items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        ));
    }
    Err("arrays must hold only numbers or only strings".to_string())
}

/// 可作为参数的 Rust 类型
pub trait ParameterType: Sized {
    /// 类型名称（与 `ParameterValue::type_name` 一致）
    const TYPE_NAME: &'static str;

    /// 从参数值转换（允许整数 → 浮点、空数组 → 任意数组类型）
    fn from_value(value: &ParameterValue) -> Option<Self>;

    /// 转换为参数值
    fn into_value(self) -> ParameterValue;
}

impl ParameterType for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> ParameterValue {
        ParameterValue::Bool(self)
    }
}

impl ParameterType for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> ParameterValue {
        ParameterValue::Integer(self)
    }
}

impl ParameterType for f64 {
    const TYPE_NAME: &'static str = "double";

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Double(v) => Some(*v),
            ParameterValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    fn into_value(self) -> ParameterValue {
        ParameterValue::Double(self)
    }
}

impl ParameterType for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> ParameterValue {
        ParameterValue::String(self)
    }
}

impl ParameterType for Vec<i64> {
    const TYPE_NAME: &'static str = "integer array";

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::IntegerArray(v) => Some(v.clone()),
            v if v.is_empty_array() => Some(Vec::new()),
            _ => None,
        }
    }

    fn into_value(self) -> ParameterValue {
        ParameterValue::IntegerArray(self)
    }
}

impl ParameterType for Vec<f64> {
    const TYPE_NAME: &'static str = "double array";

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::DoubleArray(v) => Some(v.clone()),
            ParameterValue::IntegerArray(v) => Some(v.iter().map(|&i| i as f64).collect()),
            v if v.is_empty_array() => Some(Vec::new()),
            _ => None,
        }
    }

    fn into_value(self) -> ParameterValue {
        ParameterValue::DoubleArray(self)
    }
}

impl ParameterType for Vec<String> {
    const TYPE_NAME: &'static str = "string array";

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::StringArray(v) => Some(v.clone()),
            v if v.is_empty_array() => Some(Vec::new()),
            _ => None,
        }
    }

    fn into_value(self) -> ParameterValue {
        ParameterValue::StringArray(self)
    }
}

/// 命令行参数覆盖 `[node:]name:=value`
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterOverride {
    /// 限定节点名（`None` 表示作用于所有节点）
    pub node: Option<String>,
    pub name: String,
    pub value: ParameterValue,
}

impl ParameterOverride {
    /// 解析 `[node:]name:=value`
    pub fn parse(raw: &str) -> Result<Self> {
        let (lhs, value) = raw.split_once(":=").ok_or_else(|| {
            RuntimeError::InvalidArgument(format!("parameter '{raw}' must be name:=value"))
        })?;
        let (node, name) = match lhs.split_once(':') {
            Some((node, name)) => (Some(node.to_string()), name),
            None => (None, lhs),
        };
        if name.is_empty() {
            return Err(RuntimeError::InvalidArgument(format!(
                "parameter '{raw}' has an empty name"
            )));
        }
        Ok(Self {
            node,
            name: name.to_string(),
            value: ParameterValue::parse_cli(value),
        })
    }
}

/// 参数文件内容（按表名分组）
#[derive(Debug, Clone, Default)]
pub struct ParamsFile {
    tables: HashMap<String, HashMap<String, ParameterValue>>,
}

impl ParamsFile {
    /// 读取并解析参数文件
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RuntimeError::ParamsFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content).map_err(|reason| RuntimeError::ParamsFile {
            path: PathBuf::from(path),
            reason,
        })
    }

    /// 解析参数文件文本
    ///
    /// 嵌套表会被展平为以 `.` 连接的参数名。
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let root: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;
        let mut tables = HashMap::new();
        for (node, value) in root {
            let toml::Value::Table(table) = value else {
                return Err(format!("top-level key '{node}' must be a table of parameters"));
            };
            let mut params = HashMap::new();
            flatten("", table, &mut params)?;
            tables.insert(node, params);
        }
        Ok(Self { tables })
    }

    /// 查找节点参数（先精确匹配节点名或完整名，再查通配表）
    pub fn lookup(&self, node_name: &str, fqn: &str, param: &str) -> Option<&ParameterValue> {
        [node_name, fqn, WILDCARD_TABLE]
            .iter()
            .filter_map(|key| self.tables.get(*key))
            .find_map(|table| table.get(param))
    }
}

fn flatten(
    prefix: &str,
    table: toml::Table,
    out: &mut HashMap<String, ParameterValue>,
) -> std::result::Result<(), String> {
    for (key, value) in table {
        let name = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten(&name, nested, out)?,
            other => {
                let value =
                    ParameterValue::try_from(other).map_err(|e| format!("parameter '{name}': {e}"))?;
                out.insert(name, value);
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_values() {
        assert_eq!(ParameterValue::parse_cli("true"), ParameterValue::Bool(true));
        assert_eq!(ParameterValue::parse_cli("3"), ParameterValue::Integer(3));
        assert_eq!(ParameterValue::parse_cli("0.5"), ParameterValue::Double(0.5));
        assert_eq!(
            ParameterValue::parse_cli("[1, 2.5]"),
            ParameterValue::DoubleArray(vec![1.0, 2.5])
        );
        assert_eq!(
            ParameterValue::parse_cli("[\"a\", \"b\"]"),
            ParameterValue::StringArray(vec!["a".into(), "b".into()])
        );
        // 非 TOML 值按字符串处理
        assert_eq!(
            ParameterValue::parse_cli("config/specs.toml"),
            ParameterValue::String("config/specs.toml".into())
        );
    }

    #[test]
    fn test_parameter_type_coercion() {
        assert_eq!(f64::from_value(&ParameterValue::Integer(2)), Some(2.0));
        assert_eq!(i64::from_value(&ParameterValue::Double(2.0)), None);
        assert_eq!(
            Vec::<String>::from_value(&ParameterValue::DoubleArray(vec![])),
            Some(vec![])
        );
        assert_eq!(
            Vec::<f64>::from_value(&ParameterValue::IntegerArray(vec![1, 2])),
            Some(vec![1.0, 2.0])
        );
        assert_eq!(String::from_value(&ParameterValue::Bool(true)), None);
    }

    #[test]
    fn test_parameter_override_parse() {
        let o = ParameterOverride::parse("arm_group_name:=arm").unwrap();
        assert_eq!(o.node, None);
        assert_eq!(o.name, "arm_group_name");
        assert_eq!(o.value, ParameterValue::String("arm".into()));

        let o = ParameterOverride::parse("gravity_compensation:service_timeout:=2").unwrap();
        assert_eq!(o.node.as_deref(), Some("gravity_compensation"));
        assert_eq!(o.value, ParameterValue::Integer(2));

        assert!(ParameterOverride::parse("no_value").is_err());
        assert!(ParameterOverride::parse(":=1").is_err());
    }

    #[test]
    fn test_params_file_lookup() {
        let file = ParamsFile::parse(
            r#"
            [gravity_compensation]
            arm_group_name = "arm"
            limits = { velocity = 1.5 }

            ["/**"]
            arm_group_name = "all"
            service_timeout = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(
            file.lookup("gravity_compensation", "/gravity_compensation", "arm_group_name"),
            Some(&ParameterValue::String("arm".into()))
        );
        assert_eq!(
            file.lookup("other", "/other", "arm_group_name"),
            Some(&ParameterValue::String("all".into()))
        );
        assert_eq!(
            file.lookup("gravity_compensation", "/gravity_compensation", "limits.velocity"),
            Some(&ParameterValue::Double(1.5))
        );
        assert_eq!(
            file.lookup("gravity_compensation", "/gravity_compensation", "service_timeout"),
            Some(&ParameterValue::Double(2.0))
        );
        assert!(file.lookup("other", "/other", "missing").is_none());
    }

    #[test]
    fn test_params_file_rejects_bad_layout() {
        assert!(ParamsFile::parse("value = 1").is_err());
        assert!(ParamsFile::parse("[node]\nmixed = [1, \"a\"]").is_err());
    }
}
