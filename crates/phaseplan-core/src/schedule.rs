//! Derived schedule data.
//!
//! A [`Schedule`] is never stored with the project; it is recomputed from the
//! activities whenever it is needed and carries exactly what a renderer needs:
//! per-sequence offsets, the critical set and the budget total.

use crate::{Activity, ActivitySection, CalendarFormat, Sequence};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Value identity of an activity inside its sequence group.
///
/// Activities with equal keys share section, sequence, name and duration,
/// so they are either all critical or all not.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityKey {
    pub section: ActivitySection,
    pub sequence: Sequence,
    pub task: String,
    pub duration: u32,
}

impl From<&Activity> for ActivityKey {
    fn from(activity: &Activity) -> Self {
        Self {
            section: activity.section,
            sequence: activity.sequence,
            task: activity.task.clone(),
            duration: activity.duration,
        }
    }
}

/// The result of scheduling a project
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Calendar format the adjusted values were computed with
    pub calendar_format: CalendarFormat,
    /// Raw working-day offset per sequence
    pub raw_days: BTreeMap<Sequence, i64>,
    /// Calendar-adjusted offset per sequence
    pub calendar_days: BTreeMap<Sequence, i64>,
    /// Activities holding the maximum duration of their sequence group
    pub critical: BTreeSet<ActivityKey>,
    /// Sum of all activity budgets
    pub total_budget: Decimal,
}

impl Schedule {
    /// Raw offset of a sequence (0 when unknown)
    pub fn raw_days_for(&self, sequence: Sequence) -> i64 {
        self.raw_days.get(&sequence).copied().unwrap_or(0)
    }

    /// Calendar-adjusted schedule value shown for an activity.
    ///
    /// Pre-kickoff work is always anchored at day 0.
    pub fn schedule_days(&self, activity: &Activity) -> i64 {
        match activity.section {
            ActivitySection::PreKickoff => 0,
            ActivitySection::PostKickoff => self
                .calendar_days
                .get(&activity.sequence)
                .copied()
                .unwrap_or(0),
        }
    }

    pub fn is_critical(&self, activity: &Activity) -> bool {
        self.critical.contains(&activity.key())
    }

    /// Calendar days until the last post-kickoff stage finishes
    pub fn project_duration(&self) -> i64 {
        self.calendar_days.values().copied().max().unwrap_or(0)
    }
}
