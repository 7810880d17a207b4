//! "Posted N ago" phrasing for historical notifications.

use chrono::Duration;

/// Catalog key and count describing an elapsed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAgo {
    /// Localization key, singular keys end in `_1`.
    pub key: &'static str,
    /// Count substituted into the template.
    pub count: i64,
}

/// Pick the largest applicable unit for an elapsed interval.
///
/// Minutes are used below an hour (one minute or less reads as singular),
/// hours below a day, days below a week and weeks beyond that. Negative
/// intervals from clock skew read as "1 minute ago".
///
/// # Examples
/// ```
/// use chrono::Duration;
/// use librecash::domain::time_ago;
///
/// assert_eq!(time_ago(Duration::hours(3)).key, "time.hours_ago");
/// assert_eq!(time_ago(Duration::days(10)).count, 1);
/// ```
#[must_use]
pub const fn time_ago(elapsed: Duration) -> TimeAgo {
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 60 {
        if minutes <= 1 {
            return TimeAgo {
                key: "time.minutes_ago_1",
                count: 1,
            };
        }
        return TimeAgo {
            key: "time.minutes_ago",
            count: minutes,
        };
    }
    if hours < 24 {
        return pick("time.hours_ago", "time.hours_ago_1", hours);
    }
    if days < 7 {
        return pick("time.days_ago", "time.days_ago_1", days);
    }
    pick("time.weeks_ago", "time.weeks_ago_1", elapsed.num_weeks())
}

const fn pick(plural: &'static str, singular: &'static str, count: i64) -> TimeAgo {
    let key = if count == 1 { singular } else { plural };
    TimeAgo { key, count }
}
