//! Sequence-stage schedule calculation
//!
//! # Algorithm
//!
//! 1. Pre-kickoff: every sequence is anchored at day 0
//! 2. Post-kickoff: sequences run as serialized stages in ascending order;
//!    a stage lasts as long as its longest activity and stages add up
//! 3. Calendar adjustment: every full working week gains its rest days
//! 4. Critical marking: the longest activities of each sequence group
//!
//! Both passes write into one sequence keyspace. The post-kickoff pass runs
//! second, so a sequence number used in both sections ends up with its
//! post-kickoff value.

use phaseplan_core::{
    Activity, ActivityKey, ActivitySection, CalendarFormat, Project, ScheduleError, Sequence,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Raw working-day offset for every sequence in the project
pub fn calculate_schedules(project: &Project) -> BTreeMap<Sequence, i64> {
    let mut schedules = BTreeMap::new();

    for seq in project.sequences_in(ActivitySection::PreKickoff) {
        schedules.insert(seq, 0);
    }

    let post = project.activities_in(ActivitySection::PostKickoff);
    let mut cumulative = 0i64;
    for seq in project.sequences_in(ActivitySection::PostKickoff) {
        cumulative += i64::from(max_duration(&post, seq));
        schedules.insert(seq, cumulative);
    }

    schedules
}

/// Convert working days into calendar days for a working-week rule.
///
/// `raw_days + floor(raw_days / working_days) * rest_days`
pub fn apply_calendar_format(
    raw_days: i64,
    calendar_format: CalendarFormat,
) -> Result<i64, ScheduleError> {
    if raw_days < 0 {
        return Err(ScheduleError::InvalidInput(format!(
            "schedule days must not be negative, got {raw_days}"
        )));
    }
    let weeks = raw_days / calendar_format.working_days();
    Ok(raw_days + weeks * calendar_format.rest_days())
}

/// Every activity holding the maximum duration of its sequence group.
///
/// Sections in document order, sequences ascending, ties all included.
pub fn get_max_duration_activities(project: &Project) -> Vec<(&Activity, u32)> {
    let mut result = Vec::new();

    for section in ActivitySection::ALL {
        let activities = project.activities_in(section);
        for seq in project.sequences_in(section) {
            let longest = max_duration(&activities, seq);
            result.extend(
                activities
                    .iter()
                    .filter(|a| a.sequence == seq && a.duration == longest)
                    .map(|a| (*a, longest)),
            );
        }
    }

    result
}

/// Stable-identity form of [`get_max_duration_activities`]
pub fn critical_keys(project: &Project) -> BTreeSet<ActivityKey> {
    get_max_duration_activities(project)
        .into_iter()
        .map(|(activity, _)| activity.key())
        .collect()
}

/// Exact budget total over both sections
pub fn total_budget(project: &Project) -> Result<Decimal, ScheduleError> {
    project
        .total_budget()
        .ok_or_else(|| ScheduleError::InvalidInput("budget total overflows".into()))
}

fn max_duration(activities: &[&Activity], sequence: Sequence) -> u32 {
    activities
        .iter()
        .filter(|a| a.sequence == sequence)
        .map(|a| a.duration)
        .max()
        .unwrap_or(0)
}
