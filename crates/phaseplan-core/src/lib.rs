//! # phaseplan-core
//!
//! Core domain model and traits for the phaseplan schedule builder.
//!
//! This crate provides:
//! - Domain types: `Activity`, `Project`, `ActivitySection`, `CalendarFormat`
//! - The derived `Schedule` and the `ActivityKey` identity used for critical marking
//! - Core traits: `Scheduler`, `Renderer`
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use phaseplan_core::{Activity, ActivitySection, CalendarFormat, Project};
//!
//! let mut project = Project::new("Mini-grid rollout").calendar_format(CalendarFormat::SixDay);
//! project.add_activity(
//!     Activity::new("Site survey", ActivitySection::PostKickoff)
//!         .action_needed("Visit all candidate sites")
//!         .duration(5)
//!         .sequence(1)
//!         .resources("Field team"),
//! );
//! assert_eq!(project.sequences_in(ActivitySection::PostKickoff), vec![1]);
//! ```

pub mod schedule;

pub use schedule::{ActivityKey, Schedule};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Grouping key for concurrent activities within a section
pub type Sequence = i64;

// ============================================================================
// Section
// ============================================================================

/// The two fixed project phases
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySection {
    PreKickoff,
    PostKickoff,
}

impl ActivitySection {
    /// Both sections, in document order
    pub const ALL: [Self; 2] = [Self::PreKickoff, Self::PostKickoff];

    /// Human-readable label, as written in section rows
    pub const fn label(self) -> &'static str {
        match self {
            Self::PreKickoff => "Pre-Kickoff Activities",
            Self::PostKickoff => "Post Kick-off Activities",
        }
    }

    /// Classify free text as a section label.
    ///
    /// The text must mention the kickoff ("kickoff" or "kick-off", any case);
    /// the phase is then picked by a "pre" or "post" substring.
    pub fn from_label(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if !lower.contains("kickoff") && !lower.contains("kick-off") {
            return None;
        }
        if lower.contains("pre") {
            Some(Self::PreKickoff)
        } else if lower.contains("post") {
            Some(Self::PostKickoff)
        } else {
            None
        }
    }
}

impl fmt::Display for ActivitySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActivitySection {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "pre" | "pre_kickoff" => Ok(Self::PreKickoff),
            "post" | "post_kickoff" => Ok(Self::PostKickoff),
            _ => Self::from_label(s).ok_or_else(|| ParseLabelError::new("section", s)),
        }
    }
}

// ============================================================================
// Calendar Format
// ============================================================================

/// Working-week rule used to turn working days into calendar days
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarFormat {
    #[default]
    FiveDay,
    SixDay,
    SevenDay,
}

impl CalendarFormat {
    pub const ALL: [Self; 3] = [Self::FiveDay, Self::SixDay, Self::SevenDay];

    pub const fn label(self) -> &'static str {
        match self {
            Self::FiveDay => "5-day week",
            Self::SixDay => "6-day week",
            Self::SevenDay => "7-day week",
        }
    }

    /// Working days per week
    pub const fn working_days(self) -> i64 {
        match self {
            Self::FiveDay => 5,
            Self::SixDay => 6,
            Self::SevenDay => 7,
        }
    }

    /// Non-working days inserted after every full working week
    pub const fn rest_days(self) -> i64 {
        7 - self.working_days()
    }
}

impl fmt::Display for CalendarFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CalendarFormat {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = normalize_token(s);
        let token = token.strip_suffix("_week").unwrap_or(&token);
        match token {
            "5" | "5_day" | "five_day" => Ok(Self::FiveDay),
            "6" | "6_day" | "six_day" => Ok(Self::SixDay),
            "7" | "7_day" | "seven_day" => Ok(Self::SevenDay),
            _ => Err(ParseLabelError::new("calendar format", s)),
        }
    }
}

/// Lowercase a label and fold spaces/dashes to underscores
fn normalize_token(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

// ============================================================================
// Activity
// ============================================================================

/// A single task record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Task name
    pub task: String,
    /// What has to be done
    #[serde(default)]
    pub action_needed: String,
    /// Working days, never negative
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub duration: u32,
    /// Free-text precursor note
    #[serde(default)]
    pub precursor: String,
    /// Grouping key; equal sequences in a section run concurrently
    #[serde(default)]
    pub sequence: Sequence,
    /// Free text; "Ditto" is kept as written
    #[serde(default)]
    pub resources: String,
    /// Budget in base currency units
    #[serde(default)]
    pub budget: Decimal,
    /// Phase the activity belongs to
    pub section: ActivitySection,
}

impl Activity {
    /// Create an activity with zero duration, sequence and budget
    pub fn new(task: impl Into<String>, section: ActivitySection) -> Self {
        Self {
            task: task.into(),
            action_needed: String::new(),
            duration: 0,
            precursor: String::new(),
            sequence: 0,
            resources: String::new(),
            budget: Decimal::ZERO,
            section,
        }
    }

    pub fn action_needed(mut self, action: impl Into<String>) -> Self {
        self.action_needed = action.into();
        self
    }

    /// Set the duration; negative input is clamped to 0
    pub fn duration(mut self, days: i64) -> Self {
        self.duration = clamp_duration(days);
        self
    }

    pub fn precursor(mut self, precursor: impl Into<String>) -> Self {
        self.precursor = precursor.into();
        self
    }

    pub fn sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn resources(mut self, resources: impl Into<String>) -> Self {
        self.resources = resources.into();
        self
    }

    pub fn budget(mut self, budget: Decimal) -> Self {
        self.budget = budget;
        self
    }

    /// Value identity of this activity within its sequence group
    pub fn key(&self) -> ActivityKey {
        ActivityKey::from(self)
    }
}

/// Clamp a raw day count into the valid duration range
pub fn clamp_duration(days: i64) -> u32 {
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    i64::deserialize(deserializer).map(clamp_duration)
}

// ============================================================================
// Project
// ============================================================================

/// A titled, ordered collection of activities
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub calendar_format: CalendarFormat,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Project {
    /// Create an empty project with the default calendar format
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            calendar_format: CalendarFormat::default(),
            activities: Vec::new(),
        }
    }

    /// Set the calendar format
    pub fn calendar_format(mut self, format: CalendarFormat) -> Self {
        self.calendar_format = format;
        self
    }

    /// Append an activity
    pub fn add_activity(&mut self, activity: Activity) {
        self.activities.push(activity);
    }

    /// Remove the activity at `index`, if there is one
    pub fn remove_activity(&mut self, index: usize) -> Option<Activity> {
        (index < self.activities.len()).then(|| self.activities.remove(index))
    }

    /// Mutable access for in-place edits
    pub fn activity_mut(&mut self, index: usize) -> Option<&mut Activity> {
        self.activities.get_mut(index)
    }

    pub fn clear(&mut self) {
        self.activities.clear();
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Activities of one section, in insertion order
    pub fn activities_in(&self, section: ActivitySection) -> Vec<&Activity> {
        self.activities
            .iter()
            .filter(|a| a.section == section)
            .collect()
    }

    /// Activities of one section ordered by sequence (stable within a sequence)
    pub fn activities_sorted(&self, section: ActivitySection) -> Vec<&Activity> {
        let mut activities = self.activities_in(section);
        activities.sort_by_key(|a| a.sequence);
        activities
    }

    /// Distinct sequence values of one section, ascending
    pub fn sequences_in(&self, section: ActivitySection) -> Vec<Sequence> {
        self.activities
            .iter()
            .filter(|a| a.section == section)
            .map(|a| a.sequence)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sequence numbers used by both sections
    pub fn shared_sequences(&self) -> Vec<Sequence> {
        let pre: BTreeSet<_> = self.sequences_in(ActivitySection::PreKickoff).into_iter().collect();
        self.sequences_in(ActivitySection::PostKickoff)
            .into_iter()
            .filter(|seq| pre.contains(seq))
            .collect()
    }

    /// Exact sum of all activity budgets, `None` if it overflows
    pub fn total_budget(&self) -> Option<Decimal> {
        self.activities
            .iter()
            .try_fold(Decimal::ZERO, |total, a| total.checked_add(a.budget))
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Core scheduling abstraction
pub trait Scheduler {
    /// Derive schedule offsets and the critical set for a project
    fn schedule(&self, project: &Project) -> Result<Schedule, ScheduleError>;
}

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a project and its schedule to the output format
    fn render(&self, project: &Project, schedule: &Schedule) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Scheduling error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Error reading a project back from a tabular document
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing \"Project Title:\" cell")]
    MissingTitle,

    #[error("missing \"S/N\" header row")]
    MissingHeader,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),
}

/// Unrecognized section or calendar label
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseLabelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn post(task: &str, sequence: Sequence, duration: i64) -> Activity {
        Activity::new(task, ActivitySection::PostKickoff)
            .sequence(sequence)
            .duration(duration)
    }

    #[test]
    fn negative_duration_is_clamped() {
        let activity = Activity::new("survey", ActivitySection::PreKickoff).duration(-4);
        assert_eq!(activity.duration, 0);
    }

    #[test]
    fn non_negative_duration_is_kept() {
        for days in [0, 1, 17, 365] {
            let activity = Activity::new("survey", ActivitySection::PreKickoff).duration(days);
            assert_eq!(i64::from(activity.duration), days);
        }
    }

    #[test]
    fn oversized_duration_saturates() {
        assert_eq!(clamp_duration(i64::MAX), u32::MAX);
    }

    #[test]
    fn activity_builder() {
        let activity = Activity::new("Procure panels", ActivitySection::PostKickoff)
            .action_needed("Issue PO")
            .duration(12)
            .precursor("Design sign-off")
            .sequence(3)
            .resources("Ditto")
            .budget(dec!(2500000));

        assert_eq!(activity.task, "Procure panels");
        assert_eq!(activity.action_needed, "Issue PO");
        assert_eq!(activity.duration, 12);
        assert_eq!(activity.precursor, "Design sign-off");
        assert_eq!(activity.sequence, 3);
        assert_eq!(activity.resources, "Ditto");
        assert_eq!(activity.budget, dec!(2500000));
    }

    #[test]
    fn activities_in_keeps_insertion_order() {
        let mut project = Project::new("Test");
        project.add_activity(post("b", 2, 1));
        project.add_activity(Activity::new("pre", ActivitySection::PreKickoff));
        project.add_activity(post("a", 1, 1));

        let names: Vec<_> = project
            .activities_in(ActivitySection::PostKickoff)
            .iter()
            .map(|a| a.task.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn activities_sorted_is_stable_within_sequence() {
        let mut project = Project::new("Test");
        project.add_activity(post("late", 2, 1));
        project.add_activity(post("first", 1, 1));
        project.add_activity(post("second", 1, 1));

        let names: Vec<_> = project
            .activities_sorted(ActivitySection::PostKickoff)
            .iter()
            .map(|a| a.task.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second", "late"]);
    }

    #[test]
    fn sequences_are_distinct_and_sorted() {
        let mut project = Project::new("Test");
        for seq in [3, 1, 3, 2, 1] {
            project.add_activity(post("t", seq, 1));
        }
        assert_eq!(project.sequences_in(ActivitySection::PostKickoff), vec![1, 2, 3]);
        assert!(project.sequences_in(ActivitySection::PreKickoff).is_empty());
    }

    #[test]
    fn shared_sequences_detected() {
        let mut project = Project::new("Test");
        project.add_activity(Activity::new("p", ActivitySection::PreKickoff).sequence(1));
        project.add_activity(post("q", 1, 2));
        project.add_activity(post("r", 2, 2));
        assert_eq!(project.shared_sequences(), vec![1]);
    }

    #[test]
    fn remove_and_edit_activity() {
        let mut project = Project::new("Test");
        project.add_activity(post("a", 1, 1));
        project.add_activity(post("b", 1, 1));

        if let Some(activity) = project.activity_mut(1) {
            activity.resources = "Crew B".into();
        }
        assert_eq!(project.activities[1].resources, "Crew B");

        let removed = project.remove_activity(0).unwrap();
        assert_eq!(removed.task, "a");
        assert!(project.remove_activity(5).is_none());
        assert_eq!(project.len(), 1);

        project.clear();
        assert!(project.is_empty());
    }

    #[test]
    fn total_budget_is_order_independent() {
        let budgets = [dec!(0.1), dec!(0.2), dec!(1500000.75), dec!(3)];
        let mut forward = Project::new("F");
        let mut backward = Project::new("B");
        for b in budgets {
            forward.add_activity(post("t", 1, 1).budget(b));
        }
        for b in budgets.iter().rev() {
            backward.add_activity(Activity::new("t", ActivitySection::PreKickoff).budget(*b));
        }
        assert_eq!(forward.total_budget(), Some(dec!(1500004.05)));
        assert_eq!(forward.total_budget(), backward.total_budget());
    }

    #[test]
    fn total_budget_overflow_is_none() {
        let mut project = Project::new("Huge");
        for _ in 0..2 {
            project.add_activity(post("t", 1, 1).budget(dec!(50000000000000000000000000000)));
        }
        assert_eq!(project.total_budget(), None);
        assert_eq!(Project::new("Empty").total_budget(), Some(Decimal::ZERO));
    }

    #[test]
    fn section_from_label() {
        use ActivitySection::*;
        assert_eq!(ActivitySection::from_label("Pre-Kickoff Activities"), Some(PreKickoff));
        assert_eq!(ActivitySection::from_label("POST KICKOFF"), Some(PostKickoff));
        assert_eq!(ActivitySection::from_label("post kick-off activities"), Some(PostKickoff));
        assert_eq!(ActivitySection::from_label("Kickoff meeting"), None);
        assert_eq!(ActivitySection::from_label("Pre-installation"), None);
    }

    #[test]
    fn section_from_str() {
        assert_eq!("pre".parse(), Ok(ActivitySection::PreKickoff));
        assert_eq!("post_kickoff".parse(), Ok(ActivitySection::PostKickoff));
        assert_eq!(
            ActivitySection::PostKickoff.label().parse(),
            Ok(ActivitySection::PostKickoff)
        );
        assert!("middle".parse::<ActivitySection>().is_err());
    }

    #[test]
    fn calendar_format_from_str() {
        assert_eq!("5".parse(), Ok(CalendarFormat::FiveDay));
        assert_eq!("6-day week".parse(), Ok(CalendarFormat::SixDay));
        assert_eq!("seven_day".parse(), Ok(CalendarFormat::SevenDay));
        assert_eq!("Five-Day".parse(), Ok(CalendarFormat::FiveDay));
        let err = "4-day".parse::<CalendarFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown calendar format: \"4-day\"");
    }

    #[test]
    fn calendar_format_labels_round_trip() {
        for format in CalendarFormat::ALL {
            assert_eq!(format.label().parse(), Ok(format));
            assert_eq!(format.working_days() + format.rest_days(), 7);
        }
    }

    #[test]
    fn project_from_toml_clamps_and_defaults() {
        let input = r#"
            title = "Jigawa"
            calendar_format = "six_day"

            [[activities]]
            task = "Kickoff meeting"
            section = "pre_kickoff"
            duration = -3

            [[activities]]
            task = "Install panels"
            section = "post_kickoff"
            duration = 10
            sequence = 2
            budget = 1500000
        "#;
        let project: Project = toml::from_str(input).unwrap();

        assert_eq!(project.calendar_format, CalendarFormat::SixDay);
        assert_eq!(project.activities[0].duration, 0);
        assert_eq!(project.activities[0].action_needed, "");
        assert_eq!(project.activities[1].sequence, 2);
        assert_eq!(project.activities[1].budget, dec!(1500000));
    }

    #[test]
    fn project_from_json_defaults_calendar() {
        let input = r#"{"title": "X", "activities": [
            {"task": "a", "section": "post_kickoff", "duration": 4, "budget": 2.5}
        ]}"#;
        let project: Project = serde_json::from_str(input).unwrap();
        assert_eq!(project.calendar_format, CalendarFormat::FiveDay);
        assert_eq!(project.activities[0].budget, dec!(2.5));
    }

    #[test]
    fn load_error_display() {
        assert_eq!(LoadError::MissingHeader.to_string(), "missing \"S/N\" header row");
        assert_eq!(LoadError::MissingTitle.to_string(), "missing \"Project Title:\" cell");
    }
}
