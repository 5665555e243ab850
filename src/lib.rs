//! Jira worklog timesheets: aggregation of logged time into day-granular
//! efforts, consolidation of same-day entries and a tabular codec.

pub mod codec;
pub mod config;
pub mod confirmation;
pub mod consolidate;
pub mod duration;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod service;
pub mod timesheet;

#[cfg(test)]
mod testing;

pub use codec::{Column, DurationFormat, GapFill, TableSpec};
pub use config::{Config, ConfigManager, OutputOptions};
pub use confirmation::{confirm_removal, stdin_confirmation};
pub use consolidate::{
    effective_start, Clock, ConsolidationReport, Consolidator, FixedClock, SystemClock,
};
pub use error::{Result, TimesheetError};
pub use pipeline::{bucket_day, build_timesheet, AuthorScope};
pub use resolver::{parse_users, resolve_accounts, ResolvedUser, UserRequest};
pub use service::TimesheetService;
pub use timesheet::{DateWindow, Effort, Timesheet, User};

/// Installs the `env_logger` backend with an `info` default; `RUST_LOG`
/// overrides it. Later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
