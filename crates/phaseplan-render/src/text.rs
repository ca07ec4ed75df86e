//! Plain-text schedule report
//!
//! The same report is printed by `phaseplan preview` and written next to
//! exported tables as `<stem>_details.txt`.

use phaseplan_core::{ActivitySection, Project, RenderError, Renderer, Schedule};
use rust_decimal::Decimal;
use std::fmt::Write;

/// Human-readable schedule summary
#[derive(Clone, Debug)]
pub struct DetailsRenderer {
    /// Symbol printed before amounts
    pub currency: String,
}

impl Default for DetailsRenderer {
    fn default() -> Self {
        Self {
            currency: "$".into(),
        }
    }
}

impl DetailsRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set currency symbol
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    fn amount(&self, value: Decimal) -> String {
        format!("{}{}", self.currency, format_amount(value))
    }
}

impl Renderer for DetailsRenderer {
    type Output = String;

    fn render(&self, project: &Project, schedule: &Schedule) -> Result<String, RenderError> {
        let mut out = String::new();
        write_report(self, &mut out, project, schedule)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        Ok(out)
    }
}

fn write_report(
    renderer: &DetailsRenderer,
    out: &mut String,
    project: &Project,
    schedule: &Schedule,
) -> std::fmt::Result {
    writeln!(out, "Project Schedule Summary")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out)?;
    writeln!(out, "Project Title: {}", project.title)?;
    writeln!(out, "Calendar Format: {}", project.calendar_format)?;
    writeln!(out, "Total Activities: {}", project.len())?;
    writeln!(out, "Total Budget: {}", renderer.amount(schedule.total_budget))?;
    writeln!(out)?;

    for section in ActivitySection::ALL {
        let activities = project.activities_sorted(section);
        if activities.is_empty() {
            continue;
        }

        writeln!(out, "{} ({} activities):", section, activities.len())?;
        writeln!(out, "{}", "-".repeat(40))?;

        let mut current = None;
        for activity in activities {
            if current != Some(activity.sequence) {
                current = Some(activity.sequence);
                writeln!(
                    out,
                    "\nSequence {} (Schedule: {} days):",
                    activity.sequence,
                    schedule.schedule_days(activity)
                )?;
            }

            let marker = if schedule.is_critical(activity) {
                " [MAX DURATION]"
            } else {
                ""
            };
            writeln!(out, "  • {}", activity.task)?;
            writeln!(out, "    Duration: {} days{marker}", activity.duration)?;
            writeln!(out, "    Action: {}", activity.action_needed)?;
            writeln!(out, "    Resources: {}", activity.resources)?;
            writeln!(out, "    Budget: {}", renderer.amount(activity.budget))?;
            if !activity.precursor.is_empty() {
                writeln!(out, "    Precursor: {}", activity.precursor)?;
            }
            writeln!(out)?;
        }
    }

    Ok(())
}

/// Two decimals with comma thousands separators, e.g. `1,250,000.50`
pub fn format_amount(value: Decimal) -> String {
    let fixed = format!("{:.2}", value.round_dp(2));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac_part}")
}
