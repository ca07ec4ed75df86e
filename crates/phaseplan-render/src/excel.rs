//! XLSX backend for the tabular layout
//!
//! Writes the [`Layout`] produced by [`TableSerializer::write`] as a styled
//! single-sheet workbook and reads the first sheet of a workbook back into a
//! [`Table`].
//!
//! ## Styling
//!
//! - Title row: merged across the sheet, bold, larger font
//! - Header row: dark blue fill, white bold text
//! - Section rows: merged, light blue fill, bold
//! - Schedule column: one merged cell per run of rows sharing a sequence
//! - Critical activities: duration in bold red
//! - Total row: bold on a yellow fill

use crate::table::{
    Cell, Layout, RowKind, Table, TableSerializer, COLUMN_COUNT, COL_BUDGET, COL_DURATION,
};
use calamine::{Data, Range, Reader, Xlsx};
use phaseplan_core::{LoadError, Project, RenderError, Renderer, Schedule};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use tracing::info;

/// Column widths, in character units, for the nine layout columns
const COLUMN_WIDTHS: [f64; COLUMN_COUNT] = [6.0, 40.0, 30.0, 15.0, 15.0, 10.0, 18.0, 20.0, 18.0];

/// Styled XLSX writer for project schedules
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    /// Worksheet name
    pub sheet_name: String,
    /// Whether to set column widths
    pub column_widths: bool,
    /// Whether to mark critical activities
    pub highlight_critical: bool,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            sheet_name: "Project Schedule".into(),
            column_widths: true,
            highlight_critical: true,
        }
    }
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set worksheet name
    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Leave column widths at the spreadsheet default
    pub fn default_widths(mut self) -> Self {
        self.column_widths = false;
        self
    }

    /// Render critical activities like any other row
    pub fn no_highlight(mut self) -> Self {
        self.highlight_critical = false;
        self
    }

    /// Generate workbook bytes for an already laid out table
    pub fn render_layout(&self, layout: &Layout) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = ExcelFormats::new();

        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&self.sheet_name)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        if self.column_widths {
            for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
                sheet.set_column_width(col as u16, *width).ok();
            }
        }

        for (row_idx, (cells, kind)) in layout.table.rows.iter().zip(&layout.kinds).enumerate() {
            let row = row_idx as u32;
            for (col, cell) in cells.iter().enumerate() {
                let format = formats.for_cell(*kind, col, self.highlight_critical);
                write_cell(sheet, row, col as u16, cell, format)?;
            }
        }

        for merge in &layout.merges {
            let format = formats.for_cell(
                layout.kinds[merge.first_row],
                merge.first_col,
                self.highlight_critical,
            );
            let (row, col) = (merge.first_row as u32, merge.first_col as u16);
            sheet
                .merge_range(row, col, merge.last_row as u32, merge.last_col as u16, "", format)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            // merge_range leaves an empty string in the anchor cell
            write_cell(sheet, row, col, layout.table.cell(merge.first_row, merge.first_col), format)?;
        }

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    /// Render and write the workbook to `path`
    pub fn write_to_file(
        &self,
        project: &Project,
        schedule: &Schedule,
        path: impl AsRef<Path>,
    ) -> Result<(), RenderError> {
        let path = path.as_ref();
        let bytes = self.render(project, schedule)?;
        std::fs::write(path, bytes)?;
        info!(path = %path.display(), "wrote workbook");
        Ok(())
    }
}

impl Renderer for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, project: &Project, schedule: &Schedule) -> Result<Vec<u8>, RenderError> {
        TableSerializer::validate(project)?;
        self.render_layout(&TableSerializer::write(project, schedule))
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: &Format,
) -> Result<(), RenderError> {
    let result = match cell {
        Cell::Empty => sheet.write_blank(row, col, format),
        Cell::Text(text) => sheet.write_string_with_format(row, col, text, format),
        Cell::Number(n) => sheet.write_number_with_format(row, col, *n, format),
    };
    result
        .map(|_| ())
        .map_err(|e| RenderError::Format(e.to_string()))
}

/// Reusable cell formats
struct ExcelFormats {
    title: Format,
    calendar: Format,
    header: Format,
    section: Format,
    text: Format,
    number: Format,
    budget: Format,
    critical: Format,
    total: Format,
    total_budget: Format,
    plain: Format,
}

impl ExcelFormats {
    fn new() -> Self {
        let bordered = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::VerticalCenter);

        Self {
            title: Format::new().set_bold().set_font_size(14),
            calendar: Format::new().set_italic(),
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(0x366092)
                .set_font_color(0xFFFFFF)
                .set_border(FormatBorder::Thin),
            section: Format::new()
                .set_bold()
                .set_background_color(0xD9E1F2)
                .set_border(FormatBorder::Thin),
            text: bordered.clone().set_text_wrap(),
            number: bordered.clone().set_align(FormatAlign::Center),
            budget: bordered.clone().set_num_format("#,##0.00"),
            critical: bordered
                .set_align(FormatAlign::Center)
                .set_bold()
                .set_font_color(0xFF0000),
            total: Format::new()
                .set_bold()
                .set_background_color(0xFFFF99)
                .set_align(FormatAlign::Right),
            total_budget: Format::new()
                .set_bold()
                .set_background_color(0xFFFF99)
                .set_num_format("#,##0.00"),
            plain: Format::new(),
        }
    }

    fn for_cell(&self, kind: RowKind, col: usize, highlight_critical: bool) -> &Format {
        match kind {
            RowKind::Title => &self.title,
            RowKind::CalendarFormat => &self.calendar,
            RowKind::Blank => &self.plain,
            RowKind::Header => &self.header,
            RowKind::Section(_) => &self.section,
            RowKind::Activity { critical } => match col {
                COL_DURATION if critical && highlight_critical => &self.critical,
                COL_BUDGET => &self.budget,
                0 | 3..=6 => &self.number,
                _ => &self.text,
            },
            RowKind::Total if col == COL_BUDGET => &self.total_budget,
            RowKind::Total => &self.total,
        }
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Load the first worksheet of an XLSX file
pub fn read_xlsx(path: impl AsRef<Path>) -> Result<Table, LoadError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = read_xlsx_from(BufReader::new(file))?;
    info!(path = %path.display(), rows = table.rows.len(), "read workbook");
    Ok(table)
}

/// Load the first worksheet of an in-memory XLSX workbook
pub fn read_xlsx_bytes(bytes: &[u8]) -> Result<Table, LoadError> {
    read_xlsx_from(Cursor::new(bytes))
}

fn read_xlsx_from<R: Read + Seek>(reader: R) -> Result<Table, LoadError> {
    let mut workbook = Xlsx::new(reader).map_err(|e| LoadError::Format(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::Format("workbook has no worksheets".into()))?
        .map_err(|e| LoadError::Format(e.to_string()))?;
    Ok(range_to_table(&range))
}

/// Calamine ranges start at the first used cell; pad back to A1
fn range_to_table(range: &Range<Data>) -> Table {
    let mut table = Table::new();
    let Some((start_row, start_col)) = range.start() else {
        return table;
    };

    for _ in 0..start_row {
        table.push_row(Vec::new());
    }
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(data_to_cell));
        table.push_row(cells);
    }
    table
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        other => Cell::text(other.to_string()),
    }
}
