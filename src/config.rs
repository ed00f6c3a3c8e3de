use crate::error::{OrderError, Result};
use clap::Args;
use std::time::Duration;

pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_PROCESS_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 2;

/// Engine settings as supplied on the command line or through the environment.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Number of concurrent order workers
    #[arg(long = "workers", env = "WORKER_COUNT", default_value_t = DEFAULT_WORKER_COUNT)]
    pub worker_count: usize,

    /// Processing timeout budget per order, in seconds
    #[arg(
        long = "timeout",
        env = "ORDER_PROCESS_TIMEOUT",
        default_value_t = DEFAULT_PROCESS_TIMEOUT_SECS
    )]
    pub process_timeout_secs: u64,

    /// Interval between status reports, in seconds
    #[arg(
        long = "report-interval",
        env = "REPORT_INTERVAL",
        default_value_t = DEFAULT_REPORT_INTERVAL_SECS
    )]
    pub report_interval_secs: u64,
}

/// Validated engine configuration. Every value is at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub worker_count: usize,
    pub process_timeout: Duration,
    pub report_interval: Duration,
}

impl EngineConfig {
    pub fn new(
        worker_count: usize,
        process_timeout_secs: u64,
        report_interval_secs: u64,
    ) -> Result<Self> {
        if worker_count == 0 {
            return Err(OrderError::ConfigError(
                "worker count must be at least 1".to_string(),
            ));
        }
        if process_timeout_secs == 0 {
            return Err(OrderError::ConfigError(
                "process timeout must be at least 1 second".to_string(),
            ));
        }
        if report_interval_secs == 0 {
            return Err(OrderError::ConfigError(
                "report interval must be at least 1 second".to_string(),
            ));
        }
        Ok(Self {
            worker_count,
            process_timeout: Duration::from_secs(process_timeout_secs),
            report_interval: Duration::from_secs(report_interval_secs),
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            process_timeout: Duration::from_secs(DEFAULT_PROCESS_TIMEOUT_SECS),
            report_interval: Duration::from_secs(DEFAULT_REPORT_INTERVAL_SECS),
        }
    }
}

impl TryFrom<EngineArgs> for EngineConfig {
    type Error = OrderError;

    fn try_from(args: EngineArgs) -> Result<Self> {
        Self::new(
            args.worker_count,
            args.process_timeout_secs,
            args.report_interval_secs,
        )
    }
}
