//! CSV backend for the tabular layout
//!
//! The layout is written one record per row. Merges and styling are dropped,
//! so every schedule row carries its own value. Records are flexible: blank
//! rows are written as empty records and short rows are not padded on read.

use crate::table::{Cell, Table, TableSerializer};
use phaseplan_core::{LoadError, Project, RenderError, Renderer, Schedule};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// Plain CSV writer for project schedules
#[derive(Clone, Copy, Debug)]
pub struct CsvRenderer {
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvRenderer {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set field delimiter
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Render and write the CSV file to `path`
    pub fn write_to_file(
        &self,
        project: &Project,
        schedule: &Schedule,
        path: impl AsRef<Path>,
    ) -> Result<(), RenderError> {
        let path = path.as_ref();
        TableSerializer::validate(project)?;
        let table = TableSerializer::write(project, schedule).into_table();
        write_csv(&table, File::create(path)?, self.delimiter)?;
        info!(path = %path.display(), rows = table.rows.len(), "wrote csv");
        Ok(())
    }
}

impl Renderer for CsvRenderer {
    type Output = String;

    fn render(&self, project: &Project, schedule: &Schedule) -> Result<String, RenderError> {
        TableSerializer::validate(project)?;
        let table = TableSerializer::write(project, schedule).into_table();
        let mut buffer = Vec::new();
        write_csv(&table, &mut buffer, self.delimiter)?;
        String::from_utf8(buffer).map_err(|e| RenderError::Format(e.to_string()))
    }
}

/// Write every table row as one CSV record
pub fn write_csv<W: Write>(table: &Table, writer: W, delimiter: u8) -> Result<(), RenderError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .from_writer(writer);

    for row in &table.rows {
        if row.iter().all(|cell| matches!(cell, Cell::Empty)) {
            // an empty record would be skipped on read
            writer.write_record([""]).map_err(render_error)?;
        } else {
            writer
                .write_record(row.iter().map(Cell::display))
                .map_err(render_error)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Read CSV records into a table; empty fields become [`Cell::Empty`]
pub fn read_csv<R: Read>(reader: R, delimiter: u8) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut table = Table::new();
    for record in reader.records() {
        let record = record.map_err(load_error)?;
        table.push_row(record.iter().map(Cell::text).collect());
    }
    Ok(table)
}

/// Load a comma-separated file into a table
pub fn load_csv(path: impl AsRef<Path>) -> Result<Table, LoadError> {
    let path = path.as_ref();
    let table = read_csv(File::open(path)?, b',')?;
    info!(path = %path.display(), rows = table.rows.len(), "read csv");
    Ok(table)
}

fn render_error(err: csv::Error) -> RenderError {
    match err.into_kind() {
        csv::ErrorKind::Io(err) => RenderError::Io(err),
        kind => RenderError::Format(format!("csv: {kind:?}")),
    }
}

fn load_error(err: csv::Error) -> LoadError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(err) = err.into_kind() {
            return LoadError::Io(err);
        }
        return LoadError::Format("csv: io error".into());
    }
    LoadError::Format(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use phaseplan_core::{Activity, ActivitySection, Scheduler};
    use phaseplan_solver::SequenceSolver;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_writes_layout_rows() {
        let mut project = Project::new("Csv, quoted");
        project.add_activity(
            Activity::new("Survey", ActivitySection::PreKickoff)
                .action_needed("Walk \"the\" site")
                .sequence(1)
                .duration(2),
        );
        let schedule = SequenceSolver::new().schedule(&project).unwrap();
        let csv = CsvRenderer::new().render(&project, &schedule).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], "\"Project Title: Csv, quoted\",,,,,,,,");
        assert_eq!(lines[1], "Calendar Format: 5-day week,,,,,,,,");
        assert_eq!(lines[2], "\"\"");
        assert!(lines[3].starts_with("S/N,Activities/Tasks,Action Needed"));
        assert_eq!(lines[5], "1,Survey,\"Walk \"\"the\"\" site\",2,,1,0,,0");
    }

    #[test]
    fn render_rejects_untitled_and_empty_projects() {
        let mut project = Project::new(" ");
        project.add_activity(Activity::new("Survey", ActivitySection::PreKickoff));
        let schedule = SequenceSolver::new().schedule(&project).unwrap();

        let err = CsvRenderer::new().render(&project, &schedule).unwrap_err();
        assert!(matches!(err, RenderError::InvalidData(_)));
        let err = CsvRenderer::new()
            .render(&Project::new("Empty"), &schedule)
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidData(_)));
    }

    #[test]
    fn write_to_missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::new("Io");
        project.add_activity(Activity::new("Survey", ActivitySection::PreKickoff));
        let schedule = SequenceSolver::new().schedule(&project).unwrap();

        let err = CsvRenderer::new()
            .write_to_file(&project, &schedule, dir.path().join("missing/plan.csv"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Io(_)));
    }

    #[test]
    fn read_keeps_short_rows_and_blank_fields() {
        let input = "a,,b\n\"\"\nc\n";
        let table = read_csv(input.as_bytes(), b',').unwrap();
        assert_eq!(
            table.rows,
            vec![
                vec![Cell::from("a"), Cell::Empty, Cell::from("b")],
                vec![Cell::Empty],
                vec![Cell::from("c")],
            ]
        );
    }

    #[test]
    fn semicolon_delimiter() {
        let mut table = Table::new();
        table.push_row(vec![Cell::from("x"), Cell::Number(1.5)]);
        let mut buffer = Vec::new();
        write_csv(&table, &mut buffer, b';').unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "x;1.5\n");
    }

    #[test]
    fn invalid_utf8_is_a_format_error() {
        let err = read_csv(&[0xff, 0xfe, b'\n'][..], b',').unwrap_err();
        assert!(matches!(err, LoadError::Format(_)));
    }
}
