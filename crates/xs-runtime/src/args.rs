//! 运行时命令行参数
//!
//! 进程参数中 `--runtime-args` 与 `--`（或末尾）之间的部分由运行时消费：
//!
//! ```text
//! gravity-compensation --mock --runtime-args \
//!     -p arm_group_name:=arm \
//!     --params-file config/params.toml \
//!     -r __ns:=/wx250s \
//!     -r joint_states:=/wx250s/joint_states \
//!     --log-level debug --
//! ```
//!
//! 其余参数原样保留给应用自身解析（例如 clap）。

use crate::error::{Result, RuntimeError};
use crate::params::ParameterOverride;
use std::path::PathBuf;

/// 运行时参数段起始标记
pub const RUNTIME_ARGS_FLAG: &str = "--runtime-args";

/// 重映射 `[node:]from:=to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap {
    /// 限定节点名（`None` 表示作用于所有节点）
    pub node: Option<String>,
    pub from: String,
    pub to: String,
}

impl Remap {
    /// 节点名重映射键
    pub const NODE_NAME: &'static str = "__node";
    /// 命名空间重映射键
    pub const NAMESPACE: &'static str = "__ns";

    pub fn parse(raw: &str) -> Result<Self> {
        let (lhs, to) = raw.split_once(":=").ok_or_else(|| {
            RuntimeError::InvalidArgument(format!("remap '{raw}' must be from:=to"))
        })?;
        let (node, from) = match lhs.split_once(':') {
            Some((node, from)) => (Some(node.to_string()), from),
            None => (None, lhs),
        };
        if from.is_empty() || to.is_empty() {
            return Err(RuntimeError::InvalidArgument(format!(
                "remap '{raw}' has an empty side"
            )));
        }
        Ok(Self {
            node,
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// 是否作用于指定节点
    pub fn applies_to(&self, node_name: &str) -> bool {
        self.node.as_deref().is_none_or(|n| n == node_name)
    }

    /// 是否为节点名/命名空间这类特殊重映射
    pub fn is_special(&self) -> bool {
        self.from == Self::NODE_NAME || self.from == Self::NAMESPACE
    }
}

/// 解析后的运行时参数
#[derive(Debug, Clone, Default)]
pub struct RuntimeArgs {
    pub parameter_overrides: Vec<ParameterOverride>,
    pub params_files: Vec<PathBuf>,
    pub remaps: Vec<Remap>,
    pub log_level: Option<String>,
}

impl RuntimeArgs {
    /// 拆分进程参数，返回 `(应用参数, 运行时参数)`
    ///
    /// 应用参数保留第一个元素（程序名），便于直接交给 clap。
    pub fn split<I, S>(args: I) -> Result<(Vec<String>, Self)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut app_args = Vec::new();
        let mut runtime = Self::default();
        let mut in_runtime = false;
        let mut iter = args.into_iter().map(Into::into);

        while let Some(arg) = iter.next() {
            if !in_runtime {
                if arg == RUNTIME_ARGS_FLAG {
                    in_runtime = true;
                } else {
                    app_args.push(arg);
                }
                continue;
            }

            let mut value_for = |flag: &str| {
                iter.next().ok_or_else(|| {
                    RuntimeError::InvalidArgument(format!("'{flag}' expects a value"))
                })
            };

            match arg.as_str() {
                "--" => in_runtime = false,
                "-p" | "--param" => {
                    let raw = value_for(&arg)?;
                    runtime.parameter_overrides.push(ParameterOverride::parse(&raw)?);
                },
                "--params-file" => {
                    let raw = value_for(&arg)?;
                    runtime.params_files.push(PathBuf::from(raw));
                },
                "-r" | "--remap" => {
                    let raw = value_for(&arg)?;
                    runtime.remaps.push(Remap::parse(&raw)?);
                },
                "--log-level" => {
                    let raw = value_for(&arg)?;
                    runtime.log_level = Some(raw);
                },
                other => {
                    return Err(RuntimeError::InvalidArgument(format!(
                        "unknown runtime argument '{other}'"
                    )));
                },
            }
        }

        Ok((app_args, runtime))
    }

    /// 节点名重映射（节点限定的优先）
    pub fn node_name_remap(&self, node_name: &str) -> Option<&str> {
        self.special_remap(node_name, Remap::NODE_NAME)
    }

    /// 命名空间重映射（节点限定的优先）
    pub fn namespace_remap(&self, node_name: &str) -> Option<&str> {
        self.special_remap(node_name, Remap::NAMESPACE)
    }

    fn special_remap(&self, node_name: &str, key: &str) -> Option<&str> {
        let candidates = || self.remaps.iter().filter(|r| r.from == key);
        candidates()
            .rev()
            .find(|r| r.node.as_deref() == Some(node_name))
            .or_else(|| candidates().rev().find(|r| r.node.is_none()))
            .map(|r| r.to.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterValue;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_without_runtime_args() {
        let (app, rt) = RuntimeArgs::split(args(&["prog", "--mock", "--threads", "2"])).unwrap();
        assert_eq!(app, args(&["prog", "--mock", "--threads", "2"]));
        assert!(rt.parameter_overrides.is_empty());
        assert!(rt.remaps.is_empty());
        assert!(rt.log_level.is_none());
    }

    #[test]
    fn test_split_runtime_section() {
        let (app, rt) = RuntimeArgs::split(args(&[
            "prog",
            "--mock",
            "--runtime-args",
            "-p",
            "arm_group_name:=arm",
            "--params-file",
            "params.toml",
            "-r",
            "__ns:=/wx250s",
            "--log-level",
            "debug",
            "--",
            "--threads",
            "4",
        ]))
        .unwrap();

        assert_eq!(app, args(&["prog", "--mock", "--threads", "4"]));
        assert_eq!(rt.parameter_overrides.len(), 1);
        assert_eq!(
            rt.parameter_overrides[0].value,
            ParameterValue::String("arm".into())
        );
        assert_eq!(rt.params_files, vec![PathBuf::from("params.toml")]);
        assert_eq!(rt.namespace_remap("any"), Some("/wx250s"));
        assert_eq!(rt.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_split_errors() {
        assert!(RuntimeArgs::split(args(&["prog", "--runtime-args", "-p"])).is_err());
        assert!(RuntimeArgs::split(args(&["prog", "--runtime-args", "--bogus"])).is_err());
        assert!(RuntimeArgs::split(args(&["prog", "--runtime-args", "-r", "a:="])).is_err());
    }

    #[test]
    fn test_node_scoped_remap_wins() {
        let (_, rt) = RuntimeArgs::split(args(&[
            "prog",
            "--runtime-args",
            "-r",
            "__node:=renamed",
            "-r",
            "xs_sdk:__node:=driver",
        ]))
        .unwrap();
        assert_eq!(rt.node_name_remap("xs_sdk"), Some("driver"));
        assert_eq!(rt.node_name_remap("gravity_compensation"), Some("renamed"));
        assert!(rt.remaps[1].applies_to("xs_sdk"));
        assert!(!rt.remaps[1].applies_to("other"));
        assert!(rt.remaps.iter().all(Remap::is_special));
    }
}
