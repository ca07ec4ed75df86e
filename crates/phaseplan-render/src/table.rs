//! Tabular layout and its round trip
//!
//! The write path lays a project out as a row grid; the read path recognizes
//! the same structural markers in a grid loaded back from disk.
//!
//! ## Layout
//!
//! ```text
//! | Project Title: Mini-grid rollout                                           |
//! | Calendar Format: 6-day week                                                |
//! |                                                                            |
//! | S/N | Activities/Tasks | Action | Duration | Precursor | Seq | Sched | Res | Budget |
//! | Pre-Kickoff Activities                                                     |
//! | 1   | Contract signing | ...    | 3        |           | 1   | 0     |     | 0.5    |
//! |                                                                            |
//! | Post Kick-off Activities                                                   |
//! | 1   | Procure panels   | ...    | 21       |           | 1   | 24    |     | 45     |
//! | 2   | Procure batteries| ...    | 21       |           | 1   | 24    |Ditto| 30     |
//! |                                                                            |
//! |     |                  |        |          |           |     |       |Total:| 75.5  |
//! ```
//!
//! Budgets are written in millions of the base currency.

use phaseplan_core::{
    Activity, ActivitySection, CalendarFormat, LoadError, Project, RenderError, Schedule,
    Sequence,
};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, warn};

pub const TITLE_PREFIX: &str = "Project Title:";
pub const CALENDAR_PREFIX: &str = "Calendar Format:";
pub const HEADER_MARKER: &str = "S/N";
pub const TOTAL_MARKER: &str = "Total:";

pub const COL_SERIAL: usize = 0;
pub const COL_TASK: usize = 1;
pub const COL_ACTION: usize = 2;
pub const COL_DURATION: usize = 3;
pub const COL_PRECURSOR: usize = 4;
pub const COL_SEQUENCE: usize = 5;
pub const COL_SCHEDULE: usize = 6;
pub const COL_RESOURCES: usize = 7;
pub const COL_BUDGET: usize = 8;
pub const COLUMN_COUNT: usize = 9;

pub const HEADERS: [&str; COLUMN_COUNT] = [
    HEADER_MARKER,
    "Activities/Tasks",
    "Action Needed",
    "Duration (days)",
    "Precursor",
    "Sequence",
    "Schedule (in days)",
    "Resources",
    "Budget (Million)",
];

/// Budgets on disk are divided by this factor
pub fn budget_scale() -> Decimal {
    Decimal::from(1_000_000u32)
}

// ============================================================================
// Grid model
// ============================================================================

/// A single cell value
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Cell content as it would be displayed
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Largest magnitude an `f64` holds without losing integer precision
const MAX_EXACT_INTEGER: i64 = 1 << 53;

/// Integers beyond `f64` precision are written as text so they read back exactly
impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        if value.unsigned_abs() <= MAX_EXACT_INTEGER.unsigned_abs() {
            Self::Number(value as f64)
        } else {
            Self::Text(value.to_string())
        }
    }
}

/// Row-oriented grid of cells
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, cells: Vec<Cell>) {
        self.rows.push(cells);
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(EMPTY)
    }
}

/// What a written row represents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    Title,
    CalendarFormat,
    Blank,
    Header,
    Section(ActivitySection),
    Activity { critical: bool },
    Total,
}

/// Rectangular region rendered as one merged cell (inclusive bounds)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergedRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergedRange {
    fn full_row(row: usize) -> Self {
        Self {
            first_row: row,
            first_col: 0,
            last_row: row,
            last_col: COLUMN_COUNT - 1,
        }
    }
}

/// A written table plus the presentation hints styled backends need
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    pub table: Table,
    /// One entry per table row
    pub kinds: Vec<RowKind>,
    pub merges: Vec<MergedRange>,
}

impl Layout {
    fn push(&mut self, kind: RowKind, mut cells: Vec<Cell>) {
        cells.resize(COLUMN_COUNT, Cell::Empty);
        self.kinds.push(kind);
        self.table.push_row(cells);
    }

    fn push_blank(&mut self) {
        self.push(RowKind::Blank, Vec::new());
    }

    fn next_row(&self) -> usize {
        self.table.rows.len()
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

// ============================================================================
// Serializer
// ============================================================================

/// Maps a project to the tabular layout and back
pub struct TableSerializer;

impl TableSerializer {
    /// Lay out a project and its schedule
    pub fn write(project: &Project, schedule: &Schedule) -> Layout {
        let mut layout = Layout::default();

        let title_row = layout.next_row();
        layout.push(
            RowKind::Title,
            vec![Cell::text(format!("{TITLE_PREFIX} {}", project.title))],
        );
        layout.merges.push(MergedRange::full_row(title_row));

        let calendar_row = layout.next_row();
        layout.push(
            RowKind::CalendarFormat,
            vec![Cell::text(format!("{CALENDAR_PREFIX} {}", project.calendar_format))],
        );
        layout.merges.push(MergedRange::full_row(calendar_row));
        layout.push_blank();

        layout.push(RowKind::Header, HEADERS.iter().map(|h| Cell::from(*h)).collect());

        for (idx, section) in ActivitySection::ALL.into_iter().enumerate() {
            if idx > 0 {
                layout.push_blank();
            }
            Self::write_section(&mut layout, project, schedule, section);
        }

        layout.push_blank();
        let mut total = vec![Cell::Empty; COLUMN_COUNT];
        total[COL_RESOURCES] = Cell::from(TOTAL_MARKER);
        total[COL_BUDGET] = Cell::Number(scaled_budget(schedule.total_budget));
        layout.push(RowKind::Total, total);

        debug!(rows = layout.table.rows.len(), merges = layout.merges.len(), "laid out table");
        layout
    }

    fn write_section(
        layout: &mut Layout,
        project: &Project,
        schedule: &Schedule,
        section: ActivitySection,
    ) {
        let label_row = layout.next_row();
        layout.push(RowKind::Section(section), vec![Cell::from(section.label())]);
        layout.merges.push(MergedRange::full_row(label_row));

        let mut group: Option<(Sequence, usize)> = None;
        for (serial, activity) in (1i64..).zip(project.activities_sorted(section)) {
            let row = layout.next_row();
            match group {
                Some((seq, _)) if seq == activity.sequence => {}
                _ => {
                    close_group(layout, group, row);
                    group = Some((activity.sequence, row));
                }
            }
            layout.push(
                RowKind::Activity {
                    critical: schedule.is_critical(activity),
                },
                activity_cells(serial, activity, schedule.schedule_days(activity)),
            );
        }
        let end = layout.next_row();
        close_group(layout, group, end);
    }

    /// Reject projects whose table would not read back as written.
    ///
    /// The title marker, at least one activity and a task name on every
    /// activity row are required.
    pub fn validate(project: &Project) -> Result<(), RenderError> {
        if project.title.trim().is_empty() {
            return Err(RenderError::InvalidData("project title is empty".into()));
        }
        if project.is_empty() {
            return Err(RenderError::InvalidData("project has no activities".into()));
        }
        if let Some(idx) = project.activities.iter().position(|a| a.task.trim().is_empty()) {
            return Err(RenderError::InvalidData(format!(
                "activity {} has an empty task name",
                idx + 1
            )));
        }
        Ok(())
    }

    /// Reconstruct a project from a previously written table.
    ///
    /// Unparseable numbers become 0. The calendar format comes from the
    /// optional "Calendar Format:" row and defaults otherwise.
    pub fn read(table: &Table) -> Result<Project, LoadError> {
        let header = table
            .rows
            .iter()
            .position(|row| cell_at(row, COL_SERIAL).display().trim() == HEADER_MARKER);
        let preamble = &table.rows[..header.unwrap_or(table.rows.len())];

        let title = preamble
            .iter()
            .flatten()
            .find_map(|cell| match cell {
                Cell::Text(text) => text
                    .trim_start()
                    .strip_prefix(TITLE_PREFIX)
                    .map(|rest| rest.strip_prefix(' ').unwrap_or(rest).to_string()),
                _ => None,
            })
            .ok_or(LoadError::MissingTitle)?;
        let header = header.ok_or(LoadError::MissingHeader)?;

        let mut project = Project::new(title).calendar_format(read_calendar_format(preamble));

        let mut section = ActivitySection::PreKickoff;
        for row in &table.rows[header + 1..] {
            if is_total_row(row) {
                break;
            }
            if row.iter().all(Cell::is_empty) {
                continue;
            }
            if let Some(found) = ActivitySection::from_label(&cell_at(row, COL_SERIAL).display()) {
                section = found;
                continue;
            }
            if let Some(activity) = read_activity(row, section) {
                project.add_activity(activity);
            }
        }

        debug!(
            title = %project.title,
            activities = project.len(),
            "read project from table"
        );
        Ok(project)
    }
}

fn close_group(layout: &mut Layout, group: Option<(Sequence, usize)>, end: usize) {
    if let Some((_, start)) = group {
        if end > start + 1 {
            layout.merges.push(MergedRange {
                first_row: start,
                first_col: COL_SCHEDULE,
                last_row: end - 1,
                last_col: COL_SCHEDULE,
            });
        }
    }
}

fn activity_cells(serial: i64, activity: &Activity, schedule_days: i64) -> Vec<Cell> {
    vec![
        Cell::from(serial),
        Cell::text(activity.task.as_str()),
        Cell::text(activity.action_needed.as_str()),
        Cell::from(i64::from(activity.duration)),
        Cell::text(activity.precursor.as_str()),
        Cell::from(activity.sequence),
        Cell::from(schedule_days),
        Cell::text(activity.resources.as_str()),
        Cell::Number(scaled_budget(activity.budget)),
    ]
}

fn scaled_budget(budget: Decimal) -> f64 {
    (budget / budget_scale()).to_f64().unwrap_or(0.0)
}

fn cell_at(row: &[Cell], col: usize) -> &Cell {
    const EMPTY: &Cell = &Cell::Empty;
    row.get(col).unwrap_or(EMPTY)
}

fn is_total_row(row: &[Cell]) -> bool {
    cell_at(row, COL_RESOURCES)
        .display()
        .trim()
        .eq_ignore_ascii_case(TOTAL_MARKER)
}

fn read_calendar_format(preamble: &[Vec<Cell>]) -> CalendarFormat {
    let label = preamble.iter().flatten().find_map(|cell| match cell {
        Cell::Text(text) => text.trim_start().strip_prefix(CALENDAR_PREFIX),
        _ => None,
    });
    match label.map(str::trim) {
        Some(label) => label.parse().unwrap_or_else(|_| {
            warn!(label, "unrecognized calendar format, using default");
            CalendarFormat::default()
        }),
        None => CalendarFormat::default(),
    }
}

fn read_activity(row: &[Cell], section: ActivitySection) -> Option<Activity> {
    let task = cell_at(row, COL_TASK).display();
    if task.trim().is_empty() {
        return None;
    }

    let budget = parse_budget(cell_at(row, COL_BUDGET), &task);
    Some(
        Activity::new(task.as_str(), section)
            .action_needed(cell_at(row, COL_ACTION).display())
            .duration(parse_integer(cell_at(row, COL_DURATION), &task))
            .precursor(cell_at(row, COL_PRECURSOR).display())
            .sequence(parse_integer(cell_at(row, COL_SEQUENCE), &task))
            .resources(cell_at(row, COL_RESOURCES).display())
            .budget(budget),
    )
}

/// Integer cell value; anything unparseable reads as 0
pub fn parse_integer(cell: &Cell, task: &str) -> i64 {
    let value = match cell {
        Cell::Empty => return 0,
        Cell::Number(n) => Some(*n),
        Cell::Text(text) => {
            let text = text.trim();
            if let Ok(n) = text.parse::<i64>() {
                return n;
            }
            text.parse::<f64>().ok()
        }
    };
    match value.filter(|n| n.is_finite()) {
        Some(n) => n.trunc() as i64,
        None => {
            warn!(task, cell = %cell.display(), "unparseable number, reading as 0");
            0
        }
    }
}

/// Budget cell in millions, scaled back to base currency units.
///
/// A value too large to scale reads as 0.
pub fn parse_budget(cell: &Cell, task: &str) -> Decimal {
    parse_decimal(cell, task)
        .checked_mul(budget_scale())
        .unwrap_or_else(|| {
            warn!(task, cell = %cell.display(), "budget out of range, reading as 0");
            Decimal::ZERO
        })
}

/// Decimal cell value; thousands separators are ignored and anything
/// unparseable reads as 0
pub fn parse_decimal(cell: &Cell, task: &str) -> Decimal {
    let parsed = match cell {
        Cell::Empty => return Decimal::ZERO,
        Cell::Number(n) => number_to_decimal(*n),
        Cell::Text(text) => {
            let text = text.trim().replace(',', "");
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
    };
    parsed.unwrap_or_else(|| {
        warn!(task, cell = %cell.display(), "unparseable budget, reading as 0");
        Decimal::ZERO
    })
}

/// Convert through the shortest round-trip decimal form of the float
fn number_to_decimal(n: f64) -> Option<Decimal> {
    if !n.is_finite() {
        return None;
    }
    Decimal::from_str(&n.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(n))
}
