//! phaseplan CLI - Two-phase project schedule builder
//!
//! Command-line interface for previewing, scheduling, exporting and
//! re-importing sequence-staged project schedules.

mod config;
mod input;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use phaseplan_core::{
    Activity, ActivitySection, CalendarFormat, Project, Renderer, Schedule, Scheduler,
};
use phaseplan_render::{format_amount, CsvRenderer, DetailsRenderer, ExcelRenderer, TableFormat};
use phaseplan_solver::SequenceSolver;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::{load_settings, Settings};

#[derive(Parser)]
#[command(name = "phaseplan")]
#[command(author, version, about = "Two-phase project schedule builder", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Settings file (defaults to ./phaseplan.toml when present)
    #[arg(long, global = true, value_name = "FILE", env = "PHASEPLAN_CONFIG")]
    config: Option<PathBuf>,

    /// Override the calendar format (5, 6, 7, five_day, "6-day week", ...)
    #[arg(long, global = true, value_name = "FORMAT")]
    calendar: Option<CalendarFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schedule details report
    Preview {
        /// Project definition (.json, .toml) or exported table (.xlsx, .csv)
        #[arg(value_name = "PROJECT")]
        file: PathBuf,
    },

    /// Write the schedule table and its details report
    Export {
        /// Project definition (.json, .toml) or exported table (.xlsx, .csv)
        #[arg(value_name = "PROJECT")]
        file: PathBuf,

        /// Output table (.xlsx or .csv)
        #[arg(short, long)]
        output: PathBuf,

        /// Skip the <stem>_details.txt report
        #[arg(long)]
        no_details: bool,
    },

    /// Recover a project definition from an exported table
    Import {
        /// Exported table (.xlsx or .csv)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = DefinitionFormat::Json)]
        format: DefinitionFormat,
    },

    /// Print per-sequence schedule values and critical activities
    Schedule {
        /// Project definition (.json, .toml) or exported table (.xlsx, .csv)
        #[arg(value_name = "PROJECT")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ScheduleFormat::Text)]
        format: ScheduleFormat,
    },

    /// Create a starter project definition
    Init {
        /// Project title
        #[arg(value_name = "NAME")]
        name: String,

        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DefinitionFormat {
    Json,
    Toml,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScheduleFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;
    let app = App {
        settings,
        calendar: cli.calendar,
    };

    match cli.command {
        Commands::Preview { file } => app.preview(&file),
        Commands::Export {
            file,
            output,
            no_details,
        } => app.export(&file, &output, no_details),
        Commands::Import { file, format } => app.import(&file, format),
        Commands::Schedule { file, format } => app.schedule(&file, format),
        Commands::Init { name, output } => init(&name, &output),
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

struct App {
    settings: Settings,
    calendar: Option<CalendarFormat>,
}

impl App {
    /// Load a project and apply the calendar override
    fn load(&self, path: &Path) -> Result<Project> {
        let fallback = self.settings.calendar_format.unwrap_or_default();
        let mut project = input::load_project(path, fallback)?;
        if let Some(calendar) = self.calendar {
            project.calendar_format = calendar;
        }
        Ok(project)
    }

    fn load_scheduled(&self, path: &Path) -> Result<(Project, Schedule)> {
        let project = self.load(path)?;
        if project.title.trim().is_empty() {
            bail!("Project title is empty in {}", path.display());
        }
        let schedule = SequenceSolver::new()
            .schedule(&project)
            .with_context(|| format!("Failed to schedule {}", path.display()))?;
        Ok((project, schedule))
    }

    fn details(&self) -> DetailsRenderer {
        DetailsRenderer::new().currency(self.settings.currency())
    }

    fn preview(&self, file: &Path) -> Result<()> {
        let (project, schedule) = self.load_scheduled(file)?;
        print!("{}", self.details().render(&project, &schedule)?);
        Ok(())
    }

    fn export(&self, file: &Path, output: &Path, no_details: bool) -> Result<()> {
        let (project, schedule) = self.load_scheduled(file)?;

        match TableFormat::from_path(output) {
            Some(TableFormat::Xlsx) => ExcelRenderer::new().write_to_file(&project, &schedule, output),
            Some(TableFormat::Csv) => CsvRenderer::new().write_to_file(&project, &schedule, output),
            None => bail!(
                "Unsupported output file {} (expected .xlsx or .csv)",
                output.display()
            ),
        }
        .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Created: {}", output.display());

        if !no_details && self.settings.details() {
            let path = details_path(output);
            let report = self.details().render(&project, &schedule)?;
            fs::write(&path, report)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote details report");
            println!("Created: {}", path.display());
        }
        Ok(())
    }

    fn import(&self, file: &Path, format: DefinitionFormat) -> Result<()> {
        if TableFormat::from_path(file).is_none() {
            bail!("Expected an exported .xlsx or .csv table, got {}", file.display());
        }
        let project = self.load(file)?;
        let text = match format {
            DefinitionFormat::Json => serde_json::to_string_pretty(&project)? + "\n",
            DefinitionFormat::Toml => input::to_toml(&project)?,
        };
        print!("{text}");
        Ok(())
    }

    fn schedule(&self, file: &Path, format: ScheduleFormat) -> Result<()> {
        let (project, schedule) = self.load_scheduled(file)?;
        let critical: Vec<&Activity> = project
            .activities
            .iter()
            .filter(|a| schedule.is_critical(a))
            .collect();

        match format {
            ScheduleFormat::Text => {
                println!("Project: {}", project.title);
                println!("Calendar Format: {}", project.calendar_format);
                println!();
                println!("{:>8}  {:>8}  {:>8}", "Sequence", "Raw", "Calendar");
                for (seq, raw) in &schedule.raw_days {
                    let adjusted = schedule.calendar_days.get(seq).copied().unwrap_or(*raw);
                    println!("{seq:>8}  {raw:>8}  {adjusted:>8}");
                }
                println!();
                println!("Project duration: {} days", schedule.project_duration());
                println!(
                    "Total budget: {}{}",
                    self.settings.currency(),
                    format_amount(schedule.total_budget)
                );
                println!();
                println!("Critical activities:");
                for activity in critical {
                    println!(
                        "  [{}] sequence {}: {} ({} days)",
                        section_tag(activity.section),
                        activity.sequence,
                        activity.task,
                        activity.duration
                    );
                }
            }
            ScheduleFormat::Json => {
                let sequences: Vec<_> = schedule
                    .raw_days
                    .iter()
                    .map(|(seq, raw)| {
                        json!({
                            "sequence": seq,
                            "raw_days": raw,
                            "calendar_days": schedule.calendar_days.get(seq),
                        })
                    })
                    .collect();
                let value = json!({
                    "title": project.title,
                    "calendar_format": project.calendar_format,
                    "sequences": sequences,
                    "project_duration": schedule.project_duration(),
                    "total_budget": schedule.total_budget,
                    "critical": critical.iter().map(|a| a.key()).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
        }
        Ok(())
    }
}

fn section_tag(section: ActivitySection) -> &'static str {
    match section {
        ActivitySection::PreKickoff => "pre",
        ActivitySection::PostKickoff => "post",
    }
}

/// `<dir>/<stem>_details.txt` next to an exported table
fn details_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".into());
    output.with_file_name(format!("{stem}_details.txt"))
}

/// Keep alphanumerics, spaces, dashes and underscores
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "project".into()
    } else {
        cleaned.into()
    }
}

fn init(name: &str, dir: &Path) -> Result<()> {
    let path = dir.join(format!("{}.toml", sanitize_file_name(name)));
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let contents = format!(
        "# phaseplan project definition\n\
         # sections: pre_kickoff, post_kickoff; budgets in base currency units\n\n{}",
        input::to_toml(&starter_project(name))?
    );
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created: {}", path.display());
    Ok(())
}

fn starter_project(name: &str) -> Project {
    let mut project = Project::new(name);
    project.add_activity(
        Activity::new("Contract signing", ActivitySection::PreKickoff)
            .action_needed("Sign and countersign the contract")
            .duration(5)
            .sequence(1)
            .resources("Project manager"),
    );
    project.add_activity(
        Activity::new("Site survey", ActivitySection::PostKickoff)
            .action_needed("Survey and document every site")
            .duration(10)
            .sequence(1)
            .resources("Engineering team"),
    );
    project.add_activity(
        Activity::new("Installation", ActivitySection::PostKickoff)
            .action_needed("Install and test equipment")
            .duration(20)
            .precursor("Site survey")
            .sequence(2)
            .resources("Ditto"),
    );
    project
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_path_sits_next_to_output() {
        assert_eq!(
            details_path(Path::new("out/plan.xlsx")),
            PathBuf::from("out/plan_details.txt")
        );
        assert_eq!(details_path(Path::new("plan.csv")), PathBuf::from("plan_details.txt"));
    }

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_file_name("My Cool Project!"), "My Cool Project");
        assert_eq!(sanitize_file_name("a/b:c_d-e"), "abc_d-e");
        assert_eq!(sanitize_file_name("???"), "project");
    }

    #[test]
    fn starter_project_schedules() {
        let schedule = SequenceSolver::new().schedule(&starter_project("x")).unwrap();
        assert_eq!(schedule.raw_days_for(2), 30);
    }
}
