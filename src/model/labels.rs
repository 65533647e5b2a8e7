//! Header and month-band labels derived from a [`ViewWindow`].

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::timeline::{week_start_of, Granularity, ViewWindow};

/// A contiguous run of visible days sharing one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSegment {
    pub label: String,
    pub start_x: f32,
    pub width: f32,
}

/// Title shown above the grid, e.g. "Jun 9 – 15, 2024" or "June 2024".
pub fn header_label(window: &ViewWindow) -> String {
    match window.granularity() {
        Granularity::Month => window.reference().format("%B %Y").to_string(),
        Granularity::Week => {
            let first = week_start_of(window.reference(), window.week_start());
            week_range_label(first, first + Duration::days(6))
        }
    }
}

fn week_range_label(first: NaiveDate, last: NaiveDate) -> String {
    if first.year() != last.year() {
        format!(
            "{} – {}",
            first.format("%b %-d, %Y"),
            last.format("%b %-d, %Y")
        )
    } else if first.month() != last.month() {
        format!(
            "{} – {}, {}",
            first.format("%b %-d"),
            last.format("%b %-d"),
            last.year()
        )
    } else {
        format!("{} – {}, {}", first.format("%b %-d"), last.day(), last.year())
    }
}

/// Month bands above the day grid.
pub fn month_segments(window: &ViewWindow) -> Vec<MonthSegment> {
    let mut segments: Vec<MonthSegment> = Vec::new();
    let mut current: Option<(i32, u32)> = None;

    for (idx, day) in window.days().iter().enumerate() {
        let key = (day.year(), day.month());
        if current == Some(key) {
            if let Some(seg) = segments.last_mut() {
                seg.width += window.day_width();
            }
            continue;
        }
        current = Some(key);
        segments.push(MonthSegment {
            label: day.format("%B %Y").to_string(),
            start_x: idx as f32 * window.day_width(),
            width: window.day_width(),
        });
    }
    segments
}

/// Label for a single day column.
pub fn day_label(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Week => date.format("%a %-d").to_string(),
        Granularity::Month => date.day().to_string(),
    }
}
