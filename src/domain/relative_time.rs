//! Human-readable distance to a deadline ("1d 4h", "5h 30m", "12m 3s").
//!
//! All quantities are whole units, truncated toward zero, and absolute: the
//! caller decides whether the distance is "due in" or "overdue by".

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

/// Beyond this many calendar days only a day count is shown
const DETAILED_DAY_LIMIT: i64 = 3;

fn delta<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>) -> TimeDelta {
    target.with_timezone(&Utc) - now.with_timezone(&Utc)
}

/// Calendar days between the two dates in their own time zone
fn calendar_days<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>) -> i64 {
    (target.date_naive() - now.date_naive()).num_days()
}

/// Detailed breakdown for near dates, a day count for distant ones.
///
/// Distant dates (three or more calendar days away) show one day less than
/// the calendar distance, so the day after tomorrow plus one reads `2d`.
pub fn relative_time_detailed<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>) -> String {
    let days_apart = calendar_days(target, now).abs();

    if days_apart < DETAILED_DAY_LIMIT {
        let diff = delta(target, now);
        let minutes = diff.num_minutes().abs();
        let hours = diff.num_hours().abs();
        let days = diff.num_days().abs();

        if minutes < 60 {
            return format!("{}m", minutes);
        }
        if hours < 24 {
            let rest = minutes % 60;
            return if rest == 0 {
                format!("{}h", hours)
            } else {
                format!("{}h {}m", hours, rest)
            };
        }
        let rest = hours % 24;
        return if rest == 0 {
            format!("{}d", days)
        } else {
            format!("{}d {}h", days, rest)
        };
    }

    format!("{}d", (days_apart - 1).max(0))
}

/// Ticking countdown: `Xh Ym Zs`, `Ym Zs` or `Zs`
pub fn relative_time_with_seconds<Tz: TimeZone>(
    target: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> String {
    let total_seconds = delta(target, now).num_seconds().abs();
    let total_minutes = total_seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if total_minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Full deadline caption, e.g. `Due in 3h 2m 10s` or `Overdue by 1d 2h`
pub fn deadline_label<Tz: TimeZone>(
    target: &DateTime<Tz>,
    completed: bool,
    now: &DateTime<Tz>,
) -> String {
    let prefix = if target < now && !completed {
        "Overdue by "
    } else {
        "Due in "
    };

    let body = if delta(target, now).num_hours().abs() < 24 {
        relative_time_with_seconds(target, now)
    } else {
        relative_time_detailed(target, now)
    };

    format!("{}{}", prefix, body)
}
