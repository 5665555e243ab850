//! Write path: adding and removing the caller's worklog entries.
//!
//! Remote worklogs cannot be edited in place here. Merging same-day entries
//! creates the consolidated entry first and then deletes the old ones one by
//! one after confirmation, so a declined or failed deletion leaves the old
//! entry next to the new one.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use jira_api::{Account, IssueKey, WorklogApi, WorklogEntry, WorklogId};
use log::{info, warn};

use crate::error::Result;
use crate::pipeline::bucket_day;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Outcome of a consolidation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub created: Option<WorklogEntry>,
    pub removed: Vec<WorklogId>,
    pub declined: usize,
    pub failed: usize,
}

/// Start of an entry of `duration` ending now, or midnight of `day` when
/// that start would fall on another day.
pub fn effective_start(
    now: DateTime<Utc>,
    zone: Tz,
    day: NaiveDate,
    duration: Duration,
) -> DateTime<FixedOffset> {
    let local_now = now.with_timezone(&zone);
    let start = TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| local_now.checked_sub_signed(delta));
    match start {
        Some(start) if start.date_naive() == day => start.fixed_offset(),
        _ => start_of_day(zone, day),
    }
}

fn start_of_day(zone: Tz, day: NaiveDate) -> DateTime<FixedOffset> {
    let midnight = day.and_time(NaiveTime::MIN);
    zone.from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| zone.from_utc_datetime(&midnight))
        .fixed_offset()
}

pub struct Consolidator<'a> {
    api: &'a dyn WorklogApi,
    clock: &'a dyn Clock,
}

impl<'a> Consolidator<'a> {
    pub fn new(api: &'a dyn WorklogApi, clock: &'a dyn Clock) -> Self {
        Self { api, clock }
    }

    /// Logs `duration` on `task` for `day`. With `summarize`, the caller's
    /// existing entries of that day are folded into the new entry and offered
    /// to `confirm` for deletion afterwards.
    pub async fn add<F>(
        &self,
        task: &IssueKey,
        day: NaiveDate,
        duration: Duration,
        summarize: bool,
        mut confirm: F,
    ) -> Result<ConsolidationReport>
    where
        F: FnMut(&WorklogEntry) -> bool + Send,
    {
        let me = self.api.myself().await?;
        let existing = if summarize {
            self.own_entries(task, &me, day).await?
        } else {
            Vec::new()
        };
        let total = existing
            .iter()
            .fold(duration, |sum, entry| sum + entry.duration);

        let start = effective_start(self.clock.now(), me.zone(), day, total);
        let created = self.api.add_worklog(task, start, total).await?;
        info!("Logged {} on {}", created, task);

        let mut report = ConsolidationReport {
            created: Some(created),
            ..ConsolidationReport::default()
        };
        self.remove_confirmed(task, existing, &mut confirm, &mut report)
            .await;
        Ok(report)
    }

    /// Offers every entry of the caller on `task` for `day` to `confirm` and
    /// deletes the confirmed ones.
    pub async fn remove<F>(
        &self,
        task: &IssueKey,
        day: NaiveDate,
        mut confirm: F,
    ) -> Result<ConsolidationReport>
    where
        F: FnMut(&WorklogEntry) -> bool + Send,
    {
        let me = self.api.myself().await?;
        let existing = self.own_entries(task, &me, day).await?;
        let mut report = ConsolidationReport::default();
        self.remove_confirmed(task, existing, &mut confirm, &mut report)
            .await;
        Ok(report)
    }

    async fn own_entries(
        &self,
        task: &IssueKey,
        me: &Account,
        day: NaiveDate,
    ) -> Result<Vec<WorklogEntry>> {
        let zone = me.zone();
        Ok(self
            .api
            .worklog(task)
            .await?
            .into_iter()
            .filter(|entry| entry.author.id == me.id && bucket_day(entry.started, zone) == day)
            .collect())
    }

    async fn remove_confirmed<F>(
        &self,
        task: &IssueKey,
        entries: Vec<WorklogEntry>,
        confirm: &mut F,
        report: &mut ConsolidationReport,
    ) where
        F: FnMut(&WorklogEntry) -> bool + Send,
    {
        for entry in entries {
            if !confirm(&entry) {
                report.declined += 1;
                continue;
            }
            match self.api.remove_worklog(task, &entry.id).await {
                Ok(()) => {
                    info!("Removed {} from {}", entry, task);
                    report.removed.push(entry.id);
                }
                Err(err) => {
                    warn!("Failed to remove worklog {} from {}: {}", entry.id, task, err);
                    report.failed += 1;
                }
            }
        }
    }
}
