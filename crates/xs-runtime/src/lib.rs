//! # XS Runtime
//!
//! 进程内节点运行时：为机械臂控制节点提供进程级生命周期、话题、服务、
//! 定时器、参数和多线程回调执行器。
//!
//! # 架构
//!
//! ```text
//! Context (每进程一个)
//!   ├── Graph: 话题/服务注册表
//!   ├── 参数覆盖（命令行、参数文件）
//!   └── ShutdownHandle（Ctrl+C / 程序请求）
//!
//! NodeHandle ──发布/请求──► 节点就绪队列 ──► MultiThreadedExecutor 工作线程
//! ```
//!
//! # 快速开始
//!
//! ```no_run
//! use xs_runtime::{Context, Executor, MultiThreadedExecutor, NodeOptions};
//!
//! # fn main() -> xs_runtime::Result<()> {
//! let context = Context::init(std::env::args())?;
//! context.install_signal_handler()?;
//!
//! let node = context.create_node("listener", NodeOptions::default())?;
//! let _sub = node.create_subscription("chatter", 10, None, |msg: String| {
//!     println!("heard: {msg}");
//! })?;
//!
//! let mut executor = MultiThreadedExecutor::new(&context);
//! executor.add_node(&node)?;
//! executor.spin()?; // 阻塞直到 Ctrl+C
//!
//! context.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod args;
mod callback_group;
mod context;
mod error;
pub mod executor;
mod graph;
pub mod logging;
pub mod names;
mod node;
pub mod params;
mod service;
mod timer;
mod topic;

pub use args::{Remap, RuntimeArgs};
pub use callback_group::{CallbackGroup, CallbackGroupType};
pub use context::{Context, ShutdownHandle};
pub use error::{Result, RuntimeError};
pub use executor::{Executor, MIN_DEFAULT_THREADS, MultiThreadedExecutor};
pub use graph::Message;
pub use logging::Logger;
pub use node::{Node, NodeHandle, NodeOptions};
pub use params::{ParameterType, ParameterValue};
pub use service::{Client, PendingResponse, Service};
pub use timer::Timer;
pub use topic::{Publisher, Subscription};
