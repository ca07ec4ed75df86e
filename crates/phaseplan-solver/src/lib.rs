//! # phaseplan-solver
//!
//! Schedule calculator for two-phase, sequence-staged projects.
//!
//! This crate provides:
//! - Per-sequence schedule offsets (pre-kickoff anchored at 0, post-kickoff cumulative)
//! - Calendar-format adjustment (5/6/7-day working weeks)
//! - Critical-activity detection (longest activities of each sequence group)
//!
//! ## Example
//!
//! ```rust
//! use phaseplan_core::{Activity, ActivitySection, Project, Scheduler};
//! use phaseplan_solver::SequenceSolver;
//!
//! let mut project = Project::new("My Project");
//! project.add_activity(Activity::new("Survey", ActivitySection::PostKickoff).duration(5).sequence(1));
//! project.add_activity(Activity::new("Install", ActivitySection::PostKickoff).duration(2).sequence(2));
//!
//! let schedule = SequenceSolver::new().schedule(&project).unwrap();
//! assert_eq!(schedule.raw_days_for(2), 7);
//! assert_eq!(schedule.project_duration(), 9);
//! ```

pub mod calculator;

pub use calculator::{
    apply_calendar_format, calculate_schedules, critical_keys, get_max_duration_activities,
    total_budget,
};

use phaseplan_core::{Project, Schedule, ScheduleError, Scheduler};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Sequence-stage scheduler
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceSolver;

impl SequenceSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for SequenceSolver {
    fn schedule(&self, project: &Project) -> Result<Schedule, ScheduleError> {
        let shared = project.shared_sequences();
        if !shared.is_empty() {
            warn!(
                sequences = ?shared,
                "sequence numbers used in both sections; post-kickoff values win"
            );
        }

        let raw_days = calculate_schedules(project);
        let calendar_days = raw_days
            .iter()
            .map(|(&seq, &days)| Ok((seq, apply_calendar_format(days, project.calendar_format)?)))
            .collect::<Result<BTreeMap<_, _>, ScheduleError>>()?;

        let schedule = Schedule {
            calendar_format: project.calendar_format,
            raw_days,
            calendar_days,
            critical: critical_keys(project),
            total_budget: total_budget(project)?,
        };

        debug!(
            activities = project.len(),
            sequences = schedule.raw_days.len(),
            critical = schedule.critical.len(),
            duration = schedule.project_duration(),
            "scheduled project"
        );

        Ok(schedule)
    }
}
