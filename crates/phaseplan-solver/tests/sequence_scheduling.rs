//! Sequence scheduling test suite
//!
//! Properties that must hold for any project:
//! 1. Pre-kickoff sequences are anchored at day 0
//! 2. Post-kickoff stages chain by their longest activity
//! 3. Calendar adjustment inserts rest days per full working week
//! 4. Every tied longest activity is critical
//! 5. The budget total is exact and independent of order, and never wraps

use phaseplan_core::{
    Activity, ActivitySection, CalendarFormat, Project, ScheduleError, Scheduler,
};
use phaseplan_solver::SequenceSolver;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn pre(task: &str, sequence: i64, duration: i64) -> Activity {
    Activity::new(task, ActivitySection::PreKickoff)
        .sequence(sequence)
        .duration(duration)
}

fn post(task: &str, sequence: i64, duration: i64) -> Activity {
    Activity::new(task, ActivitySection::PostKickoff)
        .sequence(sequence)
        .duration(duration)
}

/// Abridged execution plan with both phases and a "Ditto" resource
fn execution_plan() -> Project {
    let mut project = Project::new("EXECUTION PLAN SCHEDULE").calendar_format(CalendarFormat::SixDay);
    project.add_activity(pre("Contract signing", 1, 3).budget(dec!(0)));
    project.add_activity(pre("Advance payment", 2, 14).budget(dec!(12500000)));
    project.add_activity(pre("Site selection", 2, 7).resources("Ditto"));
    project.add_activity(post("Procure panels", 1, 21).budget(dec!(45000000)));
    project.add_activity(post("Procure batteries", 1, 21).budget(dec!(30000000)));
    project.add_activity(post("Civil works", 2, 10).resources("Contractor"));
    project.add_activity(post("Installation", 3, 12).resources("Ditto"));
    project.add_activity(post("Commissioning", 4, 2).budget(dec!(1750000.50)));
    project
}

// ============================================================================
// Offsets
// ============================================================================

#[test]
fn pre_kickoff_sequences_are_zero() {
    let schedule = SequenceSolver::new().schedule(&execution_plan()).unwrap();
    let plan = execution_plan();
    for activity in plan.activities_in(ActivitySection::PreKickoff) {
        assert_eq!(schedule.schedule_days(activity), 0, "{}", activity.task);
    }
}

#[test]
fn post_kickoff_offsets_chain() {
    let project = execution_plan();
    let schedule = SequenceSolver::new().schedule(&project).unwrap();

    // 21, 21+10, 31+12, 43+2
    assert_eq!(schedule.raw_days_for(1), 21);
    assert_eq!(schedule.raw_days_for(2), 31);
    assert_eq!(schedule.raw_days_for(3), 43);
    assert_eq!(schedule.raw_days_for(4), 45);
}

#[test]
fn six_day_calendar_adjustment() {
    let project = execution_plan();
    let schedule = SequenceSolver::new().schedule(&project).unwrap();

    // raw + floor(raw / 6)
    assert_eq!(schedule.calendar_days[&1], 24);
    assert_eq!(schedule.calendar_days[&2], 36);
    assert_eq!(schedule.calendar_days[&3], 50);
    assert_eq!(schedule.calendar_days[&4], 52);
    assert_eq!(schedule.project_duration(), 52);
}

#[test]
fn rows_sharing_a_sequence_share_a_schedule_value() {
    let project = execution_plan();
    let schedule = SequenceSolver::new().schedule(&project).unwrap();

    let panels = &project.activities[3];
    let batteries = &project.activities[4];
    assert_eq!(schedule.schedule_days(panels), schedule.schedule_days(batteries));
}

#[test]
fn calendar_format_changes_only_adjusted_values() {
    let mut project = execution_plan();
    let six = SequenceSolver::new().schedule(&project).unwrap();
    project.calendar_format = CalendarFormat::SevenDay;
    let seven = SequenceSolver::new().schedule(&project).unwrap();

    assert_eq!(six.raw_days, seven.raw_days);
    assert_eq!(seven.raw_days, seven.calendar_days);
    assert_eq!(six.critical, seven.critical);
}

// ============================================================================
// Critical activities
// ============================================================================

#[test]
fn tied_longest_activities_are_all_critical() {
    let project = execution_plan();
    let schedule = SequenceSolver::new().schedule(&project).unwrap();

    let critical: Vec<_> = project
        .activities
        .iter()
        .filter(|a| schedule.is_critical(a))
        .map(|a| a.task.as_str())
        .collect();
    assert_eq!(
        critical,
        vec![
            "Contract signing",
            "Advance payment",
            "Procure panels",
            "Procure batteries",
            "Civil works",
            "Installation",
            "Commissioning",
        ]
    );
    assert!(!schedule.is_critical(&project.activities[2]));
}

// ============================================================================
// Budget
// ============================================================================

#[test]
fn budget_total_is_exact_and_order_independent() {
    let project = execution_plan();
    let mut reversed = project.clone();
    reversed.activities.reverse();

    let forward = SequenceSolver::new().schedule(&project).unwrap();
    let backward = SequenceSolver::new().schedule(&reversed).unwrap();

    assert_eq!(forward.total_budget, dec!(89250000.50));
    assert_eq!(forward.total_budget, backward.total_budget);
}

#[test]
fn budget_total_overflow_fails_scheduling() {
    let mut project = Project::new("Overflow");
    project.add_activity(post("Turbines", 1, 30).budget(dec!(50000000000000000000000000000)));
    project.add_activity(pre("Bond", 1, 5).budget(dec!(50000000000000000000000000000)));

    let err = SequenceSolver::new().schedule(&project).unwrap_err();
    assert_eq!(err, ScheduleError::InvalidInput("budget total overflows".into()));
}
