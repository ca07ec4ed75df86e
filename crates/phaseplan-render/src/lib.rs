//! # phaseplan-render
//!
//! Output backends for phaseplan schedules.
//!
//! This crate provides:
//! - The tabular layout and its round trip back into a project
//! - Styled XLSX workbooks (written with rust_xlsxwriter, read with calamine)
//! - Plain CSV files
//! - The text details report
//!
//! ## Example
//!
//! ```rust,ignore
//! use phaseplan_core::{Project, Renderer, Scheduler};
//! use phaseplan_render::{read_xlsx, DetailsRenderer, ExcelRenderer, TableSerializer};
//! use phaseplan_solver::SequenceSolver;
//!
//! let schedule = SequenceSolver::new().schedule(&project)?;
//!
//! // Styled workbook
//! ExcelRenderer::new().write_to_file(&project, &schedule, "plan.xlsx")?;
//!
//! // Text report
//! let report = DetailsRenderer::new().currency("₦").render(&project, &schedule)?;
//!
//! // And back again
//! let restored = TableSerializer::read(&read_xlsx("plan.xlsx")?)?;
//! ```

pub mod delimited;
pub mod excel;
pub mod table;
pub mod text;

pub use delimited::{load_csv, read_csv, write_csv, CsvRenderer};
pub use excel::{read_xlsx, read_xlsx_bytes, ExcelRenderer};
pub use table::{Cell, Layout, MergedRange, RowKind, Table, TableSerializer};
pub use text::{format_amount, DetailsRenderer};

use phaseplan_core::{LoadError, Project};
use std::path::Path;

/// Table file formats understood by [`load_table`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Csv,
}

impl TableFormat {
    /// Pick a format from a file extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Load a table file, choosing the backend by extension
pub fn load_table(path: impl AsRef<Path>) -> Result<Table, LoadError> {
    let path = path.as_ref();
    match TableFormat::from_path(path) {
        Some(TableFormat::Xlsx) => read_xlsx(path),
        Some(TableFormat::Csv) => load_csv(path),
        None => Err(LoadError::Format(format!(
            "unsupported table file: {}",
            path.display()
        ))),
    }
}

/// Load a previously exported table file back into a project
pub fn import_project(path: impl AsRef<Path>) -> Result<Project, LoadError> {
    TableSerializer::read(&load_table(path)?)
}
