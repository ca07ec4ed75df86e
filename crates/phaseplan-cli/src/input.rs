//! Project loading for every accepted input format

use anyhow::{bail, Context, Result};
use phaseplan_core::{Activity, CalendarFormat, Project};
use phaseplan_render::{import_project, TableFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Project definition as written by hand; the calendar may be left out
#[derive(Debug, Deserialize, Serialize)]
struct ProjectFile {
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calendar_format: Option<CalendarFormat>,
    #[serde(default)]
    activities: Vec<Activity>,
}

impl ProjectFile {
    fn into_project(self, fallback: CalendarFormat) -> Project {
        Project {
            title: self.title,
            calendar_format: self.calendar_format.unwrap_or(fallback),
            activities: self.activities,
        }
    }
}

/// Load a project from `.json`, `.toml`, `.xlsx` or `.csv`.
///
/// `fallback` is the calendar used when a definition file names none.
pub fn load_project(path: &Path, fallback: CalendarFormat) -> Result<Project> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let project = match ext.as_str() {
        "json" => {
            let contents = read(path)?;
            let file: ProjectFile = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid project definition {}", path.display()))?;
            file.into_project(fallback)
        }
        "toml" => {
            let contents = read(path)?;
            let file: ProjectFile = toml::from_str(&contents)
                .with_context(|| format!("Invalid project definition {}", path.display()))?;
            file.into_project(fallback)
        }
        _ if TableFormat::from_path(path).is_some() => import_project(path)
            .with_context(|| format!("Failed to import {}", path.display()))?,
        _ => bail!(
            "Unsupported project file {} (expected .json, .toml, .xlsx or .csv)",
            path.display()
        ),
    };

    info!(
        path = %path.display(),
        activities = project.len(),
        calendar = %project.calendar_format,
        "loaded project"
    );
    Ok(project)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Render a project as a TOML definition file
pub fn to_toml(project: &Project) -> Result<String> {
    let file = ProjectFile {
        title: project.title.clone(),
        calendar_format: Some(project.calendar_format),
        activities: project.activities.clone(),
    };
    toml::to_string_pretty(&file).context("Failed to serialize project as TOML")
}
