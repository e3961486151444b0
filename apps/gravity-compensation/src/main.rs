//! 重力补偿节点进程入口
//!
//! ```text
//! gravity_compensation [--mock] [--threads N] \
//!     --runtime-args --params-file config/params.toml --log-level debug --
//! ```
//!
//! `--runtime-args` 与 `--` 之间的参数交给运行时（参数覆盖、参数文件、重映射、日志级别），
//! 其余参数由本程序解析。

use anyhow::{Context as _, anyhow};
use clap::Parser;
use std::num::NonZeroUsize;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use xs_driver::{MockArmConfig, MockArmDriver};
use xs_gravity::{GravityCompensation, launch};
use xs_runtime::{Context, Executor, MIN_DEFAULT_THREADS, MultiThreadedExecutor, NodeOptions};

/// 默认日志过滤（未设置 RUST_LOG 且未指定 `--log-level` 时）
const DEFAULT_LOG_FILTER: &str = "info";

/// X 系列机械臂重力补偿节点
#[derive(Parser, Debug)]
#[command(name = "gravity_compensation")]
#[command(about = "Gravity compensation node for X-series arms", long_about = None)]
struct Args {
    /// 在同一进程内启动模拟驱动（无需真实机械臂）
    #[arg(long)]
    mock: bool,

    /// 执行器工作线程数（至少 2）
    ///
    /// 默认: CPU 核数
    #[arg(long)]
    threads: Option<NonZeroUsize>,
}

fn init_tracing(log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid RUST_LOG directives '{directives}'"))?,
        Err(_) => {
            let level = log_level.unwrap_or(DEFAULT_LOG_FILTER);
            EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"))?
        },
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("failed to install the tracing subscriber: {e}"))
}

/// 开关服务阻塞等待驱动响应，驱动在同一进程内时需要另一个线程处理请求
fn worker_threads(requested: NonZeroUsize) -> usize {
    let threads = requested.get();
    if threads < MIN_DEFAULT_THREADS {
        warn!(
            "--threads {} is too few for blocking service calls, using {}",
            threads, MIN_DEFAULT_THREADS
        );
        return MIN_DEFAULT_THREADS;
    }
    threads
}

fn main() -> ExitCode {
    let context = match Context::init(std::env::args()) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Failed to initialize the runtime: {e}");
            return ExitCode::FAILURE;
        },
    };

    let args = match Args::try_parse_from(context.application_args()) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() { 2 } else { 0 };
            context.shutdown();
            return ExitCode::from(code);
        },
    };

    if let Err(e) = init_tracing(context.log_level()) {
        eprintln!("{e:#}");
        context.shutdown();
        return ExitCode::FAILURE;
    }

    if let Err(e) = context.install_signal_handler() {
        warn!("Ctrl+C will not stop the node cleanly: {}", e);
    }

    // 模拟驱动需要先于补偿节点注册服务
    let driver = if args.mock {
        match MockArmDriver::new(&context, MockArmConfig::default()) {
            Ok(driver) => {
                info!("Running against the mock arm driver");
                Some(driver)
            },
            Err(e) => {
                error!("Failed to start the mock arm driver: {}", e);
                context.shutdown();
                return ExitCode::FAILURE;
            },
        }
    } else {
        None
    };

    let outcome = launch(
        context,
        |context| GravityCompensation::new(context, NodeOptions::default()),
        |context| {
            let mut executor = match args.threads.map(worker_threads) {
                Some(threads) => MultiThreadedExecutor::with_threads(context, threads)
                    .unwrap_or_else(|_| MultiThreadedExecutor::new(context)),
                None => MultiThreadedExecutor::new(context),
            };
            if let Some(driver) = &driver
                && let Err(e) = executor.add_node(driver.node())
            {
                error!("Failed to add the mock arm driver to the executor: {}", e);
            }
            info!(
                "Spinning with {} worker thread(s)",
                executor.number_of_threads()
            );
            executor
        },
    );

    drop(driver);
    outcome.exit_code()
}
