//! Semicolon-separated table codec for timesheets.
//!
//! Columns are positional: a table can only be read back with the column
//! configuration it was written with.

use std::io::{Read, Write};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};

use crate::config::OutputOptions;
use crate::duration;
use crate::error::{Result, TimesheetError};
use crate::timesheet::{first_of_month, next_month, DateWindow, Effort, Timesheet, User};

const DELIMITER: u8 = b';';
const WRITE_DATE_FORMAT: &str = "%Y-%m-%d";
const READ_DATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    User,
    Date,
    Project,
    Task,
    Duration,
    Description,
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::User => "User",
            Column::Date => "Date",
            Column::Project => "Project",
            Column::Task => "Task",
            Column::Duration => "Duration",
            Column::Description => "Description",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DurationFormat {
    /// `7h30m0s`
    #[default]
    Canonical,
    /// `7,50`, optionally negated.
    Decimal { negate: bool },
}

/// Zero-duration rows for days without effort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GapFill {
    #[default]
    Disabled,
    /// Through the last day of each user's month.
    MonthEnd,
    /// Through the last day of the month, but not on or after the given day.
    Until(NaiveDate),
}

/// Column layout and formatting of a table. Columns appear in the order
/// they were enabled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableSpec {
    columns: Vec<Column>,
    header: bool,
    durations: DurationFormat,
    gap_fill: GapFill,
}

impl TableSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `column` after the already enabled ones; enabling twice is a no-op.
    pub fn with(mut self, column: Column) -> Self {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_durations(mut self, format: DurationFormat) -> Self {
        self.durations = format;
        self
    }

    pub fn with_gap_fill(mut self, gap_fill: GapFill) -> Self {
        self.gap_fill = gap_fill;
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::header).collect()
    }

    fn encode(&self, effort: &Effort) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match column {
                Column::User => effort
                    .user
                    .as_ref()
                    .map(|user| user.name.clone())
                    .unwrap_or_default(),
                Column::Date => effort.date.format(WRITE_DATE_FORMAT).to_string(),
                Column::Project => effort.project.clone(),
                Column::Task => effort.task.clone(),
                Column::Duration => match self.durations {
                    DurationFormat::Canonical => duration::format_canonical(effort.duration),
                    DurationFormat::Decimal { negate } => {
                        duration::format_decimal(effort.duration, negate)
                    }
                },
                Column::Description => effort.description.clone(),
            })
            .collect()
    }

    fn decode<S: AsRef<str>>(&self, line: usize, fields: &[S]) -> Result<Effort> {
        if fields.len() != self.columns.len() {
            return Err(TimesheetError::Table(format!(
                "row {line}: expected {} fields, found {}",
                self.columns.len(),
                fields.len()
            )));
        }
        let mut effort = Effort::new(NaiveDate::default(), Duration::ZERO);
        for (column, field) in self.columns.iter().zip(fields) {
            let field = field.as_ref().trim();
            match column {
                Column::User if !field.is_empty() => effort.user = Some(User::new(field)),
                Column::User => {}
                Column::Date => effort.date = parse_date(line, field)?,
                Column::Project => effort.project = field.to_string(),
                Column::Task => effort.task = field.to_string(),
                Column::Duration => {
                    effort.duration = duration::parse(field)
                        .map_err(|err| TimesheetError::Table(format!("row {line}: {err}")))?
                }
                Column::Description => effort.description = field.to_string(),
            }
        }
        Ok(effort)
    }

    fn is_header<S: AsRef<str>>(&self, fields: &[S]) -> bool {
        fields.len() == self.columns.len()
            && fields
                .iter()
                .zip(self.headers())
                .all(|(field, name)| field.as_ref().trim().eq_ignore_ascii_case(name))
    }
}

fn parse_date(line: usize, field: &str) -> Result<NaiveDate> {
    READ_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(field, format).ok())
        .ok_or_else(|| TimesheetError::Table(format!("row {line}: invalid date '{field}'")))
}

impl Timesheet {
    /// Encodes the efforts in their current order, one row per effort plus
    /// any gap-fill rows. No header.
    pub fn to_table(&self, spec: &TableSpec) -> Vec<Vec<String>> {
        let efforts = match spec.gap_fill {
            GapFill::Disabled => self.efforts().to_vec(),
            GapFill::MonthEnd => fill_gaps(self.efforts(), None),
            GapFill::Until(until) => fill_gaps(self.efforts(), Some(until)),
        };
        efforts.iter().map(|effort| spec.encode(effort)).collect()
    }

    /// Decodes rows written with the same column layout. A leading header
    /// row is skipped.
    pub fn from_table<R, S>(rows: &[R], spec: &TableSpec) -> Result<Timesheet>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let skip = usize::from(rows.first().is_some_and(|row| spec.is_header(row.as_ref())));
        rows.iter()
            .enumerate()
            .skip(skip)
            .map(|(index, row)| spec.decode(index + 1, row.as_ref()))
            .collect()
    }

    /// Writes the table; an empty timesheet writes nothing at all.
    pub fn write_table<W: Write>(&self, writer: W, spec: &TableSpec) -> Result<()> {
        let rows = self.to_table(spec);
        if rows.is_empty() {
            return Ok(());
        }
        let mut out = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_writer(writer);
        if spec.header {
            out.write_record(spec.headers())?;
        }
        for row in rows {
            out.write_record(&row)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn read_table<R: Read>(reader: R, spec: &TableSpec) -> Result<Timesheet> {
        let mut input = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in input.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Timesheet::from_table(&rows, spec)
    }

    /// Summarizes (when asked), sorts and writes the timesheet with the
    /// column set implied by `options`.
    pub fn print<W: Write>(
        &self,
        writer: W,
        with_user: bool,
        options: &OutputOptions,
        window: Option<&DateWindow>,
    ) -> Result<()> {
        options.validate()?;
        let mut sheet = if options.summarize {
            self.summarize()
        } else {
            self.clone()
        };
        sheet.sort();
        sheet.write_table(writer, &print_spec(with_user, options, window))
    }
}

fn print_spec(with_user: bool, options: &OutputOptions, window: Option<&DateWindow>) -> TableSpec {
    let mut spec = TableSpec::new().with_header(true);
    if with_user {
        spec = spec.with(Column::User);
    }
    spec = spec.with(Column::Date);
    if !options.summarize {
        spec = spec.with(Column::Project).with(Column::Task);
    }
    spec = spec.with(Column::Duration);
    if !options.summarize {
        spec = spec.with(Column::Description);
    }
    if options.decimal {
        spec = spec.with_durations(DurationFormat::Decimal {
            negate: options.negate,
        });
    }
    if options.empty {
        spec = spec.with_gap_fill(match window {
            Some(window) => GapFill::Until(window.to),
            None => GapFill::MonthEnd,
        });
    }
    spec
}

/// Inserts zero rows for missing days of each user's block of entries,
/// month by month. `until` is an exclusive upper bound for the trailing fill.
fn fill_gaps(efforts: &[Effort], until: Option<NaiveDate>) -> Vec<Effort> {
    let mut out = Vec::with_capacity(efforts.len());
    let mut block_user: Option<&Option<User>> = None;
    let mut cursor: Option<NaiveDate> = None;

    for effort in efforts {
        let same_user = block_user == Some(&effort.user);
        let same_month = cursor.is_some_and(|next| same_month(next, effort.date));
        if !same_user || !same_month {
            if let (Some(user), Some(next)) = (block_user, cursor) {
                fill_month_tail(&mut out, user, next, until);
            }
            cursor = Some(first_of_month(effort.date));
        }
        block_user = Some(&effort.user);

        let mut next = cursor.unwrap_or(effort.date);
        while next < effort.date {
            out.push(filler(&effort.user, next));
            next = next.succ_opt().unwrap_or(effort.date);
        }
        out.push(effort.clone());
        let after = effort.date.succ_opt().unwrap_or(effort.date);
        cursor = Some(next.max(after));
    }
    if let (Some(user), Some(next)) = (block_user, cursor) {
        fill_month_tail(&mut out, user, next, until);
    }
    out
}

fn fill_month_tail(
    out: &mut Vec<Effort>,
    user: &Option<User>,
    from: NaiveDate,
    until: Option<NaiveDate>,
) {
    // `from` may already sit on the 1st of the following month.
    let month_start = if from.day() == 1 {
        match from.pred_opt() {
            Some(previous) => first_of_month(previous),
            None => return,
        }
    } else {
        first_of_month(from)
    };
    let Ok(month_end) = next_month(month_start) else {
        return;
    };
    let end = until.map_or(month_end, |until| until.min(month_end));
    let mut day = from;
    while day < end {
        out.push(filler(user, day));
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    (a.year(), a.month()) == (b.year(), b.month())
}

fn filler(user: &Option<User>, date: NaiveDate) -> Effort {
    Effort {
        user: user.clone(),
        ..Effort::new(date, Duration::ZERO)
    }
}
