//! Human-readable review intervals.

use neura_core::ScheduleError;

/// Render an interval in days as a label such as "6 days" or "2 weeks".
///
/// Weeks, months (30 days) and years (365 days) are rounded to the nearest
/// whole unit, ties to even.
pub fn describe_interval(days: i64) -> Result<String, ScheduleError> {
    if days <= 0 {
        return Err(ScheduleError::InvalidInterval(days));
    }

    let label = match days {
        1 => "1 day".to_string(),
        2..=6 => format!("{days} days"),
        7..=29 => plural(nearest(days, 7), "week"),
        30..=364 => plural(nearest(days, 30), "month"),
        _ => plural(nearest(days, 365), "year"),
    };
    Ok(label)
}

fn nearest(days: i64, unit: i64) -> i64 {
    (days as f64 / unit as f64).round_ties_even() as i64
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(days: i64) -> String {
        describe_interval(days).unwrap()
    }

    #[test]
    fn days() {
        assert_eq!(label(1), "1 day");
        assert_eq!(label(2), "2 days");
        assert_eq!(label(6), "6 days");
    }

    #[test]
    fn weeks() {
        assert_eq!(label(7), "1 week");
        assert_eq!(label(10), "1 week");
        assert_eq!(label(11), "2 weeks");
        assert_eq!(label(14), "2 weeks");
        assert_eq!(label(29), "4 weeks");
    }

    #[test]
    fn months() {
        assert_eq!(label(30), "1 month");
        assert_eq!(label(45), "2 months");
        assert_eq!(label(75), "2 months");
        assert_eq!(label(364), "12 months");
    }

    #[test]
    fn years() {
        assert_eq!(label(365), "1 year");
        assert_eq!(label(900), "2 years");
        assert_eq!(label(3650), "10 years");
    }

    #[test]
    fn non_positive_is_rejected() {
        assert_eq!(describe_interval(0), Err(ScheduleError::InvalidInterval(0)));
        assert_eq!(describe_interval(-3), Err(ScheduleError::InvalidInterval(-3)));
    }
}
