//! Timesheet data model.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{Datelike, Months, NaiveDate};
use jira_api::AccountId;

use crate::error::{Result, TimesheetError};

/// Person an effort is attributed to. Ordering and equality follow the name
/// first so sorted timesheets group by person.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct User {
    pub name: String,
    pub id: Option<AccountId>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<AccountId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Time spent by one user on one task on one calendar day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Effort {
    pub user: Option<User>,
    pub project: String,
    pub task: String,
    pub description: String,
    pub date: NaiveDate,
    pub duration: Duration,
}

impl Effort {
    pub fn new(date: NaiveDate, duration: Duration) -> Self {
        Self {
            user: None,
            project: String::new(),
            task: String::new(),
            description: String::new(),
            date,
            duration,
        }
    }

    fn sort_key(&self) -> (Option<&str>, NaiveDate, &str, &str) {
        (
            self.user.as_ref().map(|user| user.name.as_str()),
            self.date,
            &self.project,
            &self.task,
        )
    }
}

/// Collection of efforts. Aggregation fills it in arbitrary order; call
/// [`Timesheet::sort`] before presenting it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timesheet {
    efforts: Vec<Effort>,
}

impl Timesheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effort: Effort) {
        self.efforts.push(effort);
    }

    pub fn len(&self) -> usize {
        self.efforts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.efforts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Effort> {
        self.efforts.iter()
    }

    pub fn efforts(&self) -> &[Effort] {
        &self.efforts
    }

    pub fn into_efforts(self) -> Vec<Effort> {
        self.efforts
    }

    /// Sorts by user, date, project and task.
    pub fn sort(&mut self) {
        self.efforts.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }

    /// Sum of all durations.
    pub fn total(&self) -> Duration {
        self.efforts.iter().map(|effort| effort.duration).sum()
    }

    /// Collapses to one effort per user and day. Project, task and
    /// description are dropped; the result is sorted.
    pub fn summarize(&self) -> Timesheet {
        let mut days: BTreeMap<(Option<User>, NaiveDate), Duration> = BTreeMap::new();
        for effort in &self.efforts {
            *days
                .entry((effort.user.clone(), effort.date))
                .or_default() += effort.duration;
        }
        days.into_iter()
            .map(|((user, date), duration)| Effort {
                user,
                ..Effort::new(date, duration)
            })
            .collect()
    }
}

impl FromIterator<Effort> for Timesheet {
    fn from_iter<I: IntoIterator<Item = Effort>>(iter: I) -> Self {
        Self {
            efforts: iter.into_iter().collect(),
        }
    }
}

impl Extend<Effort> for Timesheet {
    fn extend<I: IntoIterator<Item = Effort>>(&mut self, iter: I) {
        self.efforts.extend(iter);
    }
}

impl IntoIterator for Timesheet {
    type Item = Effort;
    type IntoIter = std::vec::IntoIter<Effort>;

    fn into_iter(self) -> Self::IntoIter {
        self.efforts.into_iter()
    }
}

impl<'a> IntoIterator for &'a Timesheet {
    type Item = &'a Effort;
    type IntoIter = std::slice::Iter<'a, Effort>;

    fn into_iter(self) -> Self::IntoIter {
        self.efforts.iter()
    }
}

/// Half-open day range `[from, to)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from >= to {
            return Err(TimesheetError::Validation(format!(
                "empty date window {from} .. {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Whole calendar month.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let from = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| TimesheetError::Validation(format!("invalid month {year}-{month}")))?;
        Ok(Self {
            from,
            to: next_month(from)?,
        })
    }

    /// Month containing `day`.
    pub fn month_of(day: NaiveDate) -> Result<Self> {
        Self::month(day.year(), day.month())
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day < self.to
    }
}

pub(crate) fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

pub(crate) fn next_month(day: NaiveDate) -> Result<NaiveDate> {
    first_of_month(day)
        .checked_add_months(Months::new(1))
        .ok_or_else(|| TimesheetError::Validation(format!("no month after {day}")))
}

#[cfg(test)]
mod tests {
    use super::{DateWindow, Effort, Timesheet, User};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn effort(user: &str, d: u32, task: &str, hours: u64) -> Effort {
        Effort {
            user: Some(User::new(user)),
            project: "ABC".into(),
            task: task.into(),
            description: format!("work on {task}"),
            ..Effort::new(day(d), Duration::from_secs(hours * 3600))
        }
    }

    #[test]
    fn sort_orders_by_user_date_project_task() {
        let mut sheet: Timesheet = vec![
            effort("Mia", 1, "ABC-1", 1),
            effort("John", 2, "ABC-2", 1),
            effort("John", 2, "ABC-1", 1),
            effort("John", 1, "ABC-9", 1),
        ]
        .into_iter()
        .collect();
        sheet.sort();

        let order: Vec<_> = sheet
            .iter()
            .map(|e| (e.user.as_ref().unwrap().name.as_str(), e.date, e.task.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("John", day(1), "ABC-9"),
                ("John", day(2), "ABC-1"),
                ("John", day(2), "ABC-2"),
                ("Mia", day(1), "ABC-1"),
            ]
        );
    }

    #[test]
    fn summarize_sums_per_user_and_day() {
        let sheet: Timesheet = vec![
            effort("John", 2, "ABC-2", 1),
            effort("John", 2, "ABC-1", 2),
            effort("Mia", 2, "ABC-1", 4),
        ]
        .into_iter()
        .collect();

        let summary = sheet.summarize();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary.efforts()[0].duration, Duration::from_secs(3 * 3600));
        assert!(summary.efforts()[0].task.is_empty());
        assert_eq!(summary.total(), sheet.total());
    }

    #[test]
    fn month_window_rolls_over_december() {
        let window = DateWindow::month(2023, 12).unwrap();
        assert_eq!(window.from, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(window.to, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(window.contains(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
        assert!(!window.contains(window.to));
        assert!(DateWindow::month(2024, 13).is_err());
    }

    #[test]
    fn window_requires_forward_range() {
        assert!(DateWindow::new(day(5), day(5)).is_err());
        assert!(DateWindow::new(day(5), day(6)).is_ok());
    }
}
