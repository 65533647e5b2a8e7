use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

use crate::config::TimelineConfig;
use crate::model::Task;

/// Zoom level of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Week,
    Month,
}

impl Granularity {
    pub fn label(self) -> &'static str {
        match self {
            Granularity::Week => "Week",
            Granularity::Month => "Month",
        }
    }

    /// Pixels per day for this granularity.
    pub fn day_width(self, config: &TimelineConfig) -> f32 {
        match self {
            Granularity::Week => config.week_day_width,
            Granularity::Month => config.month_day_width,
        }
    }
}

/// First day of the week containing `date`.
pub fn week_start_of(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() as i64
        - week_start.num_days_from_monday() as i64)
        % 7;
    date - Duration::days(offset)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .map(|next| next - Duration::days(1))
        .unwrap_or(first)
}

/// Ordered, contiguous days shown for `reference` at `granularity`.
///
/// Week: three weeks with the reference week in the middle.
/// Month: the whole month plus padding on both sides.
pub fn compute_visible_days(
    reference: NaiveDate,
    granularity: Granularity,
    config: &TimelineConfig,
) -> Vec<NaiveDate> {
    let (first, last) = match granularity {
        Granularity::Week => {
            let week = week_start_of(reference, config.week_start);
            let first = week - Duration::days(config.week_padding_days);
            (first, week + Duration::days(6 + config.week_padding_days))
        }
        Granularity::Month => (
            first_of_month(reference) - Duration::days(config.month_padding_days),
            last_of_month(reference) + Duration::days(config.month_padding_days),
        ),
    };
    first.iter_days().take_while(|d| *d <= last).collect()
}

/// The visible range plus its pixel geometry. Derived, never persisted.
#[derive(Debug, Clone)]
pub struct ViewWindow {
    reference: NaiveDate,
    granularity: Granularity,
    days: Vec<NaiveDate>,
    day_width: f32,
    config: TimelineConfig,
}

impl ViewWindow {
    pub fn new(reference: NaiveDate, granularity: Granularity, config: &TimelineConfig) -> Self {
        Self {
            reference,
            granularity,
            days: compute_visible_days(reference, granularity, config),
            day_width: granularity.day_width(config),
            config: config.clone(),
        }
    }

    fn recompute(&mut self) {
        self.days = compute_visible_days(self.reference, self.granularity, &self.config);
        self.day_width = self.granularity.day_width(&self.config);
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// The visible days, contiguous and ascending.
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn day_width(&self) -> f32 {
        self.day_width
    }

    pub fn week_start(&self) -> Weekday {
        self.config.week_start
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.first().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }

    /// Step forward one week or one month.
    pub fn next_period(&mut self) {
        self.reference = match self.granularity {
            Granularity::Week => self.reference + Duration::days(7),
            Granularity::Month => self
                .reference
                .checked_add_months(Months::new(1))
                .unwrap_or(self.reference),
        };
        self.recompute();
    }

    pub fn previous_period(&mut self) {
        self.reference = match self.granularity {
            Granularity::Week => self.reference - Duration::days(7),
            Granularity::Month => self
                .reference
                .checked_sub_months(Months::new(1))
                .unwrap_or(self.reference),
        };
        self.recompute();
    }

    pub fn jump_to(&mut self, date: NaiveDate) {
        self.reference = date;
        self.recompute();
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        if self.granularity != granularity {
            self.granularity = granularity;
            self.recompute();
        }
    }

    /// Position of `date` in the visible sequence.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let first = self.first_day()?;
        let idx = (date - first).num_days();
        if idx < 0 || idx as usize >= self.days.len() {
            return None;
        }
        Some(idx as usize)
    }

    /// Left pixel offset of `date`; 0 when the date is not visible.
    pub fn day_position(&self, date: NaiveDate) -> f32 {
        self.index_of(date)
            .map(|idx| idx as f32 * self.day_width)
            .unwrap_or(0.0)
    }

    /// Inclusive overlap test against the visible range.
    pub fn overlaps(&self, task: &Task) -> bool {
        match (self.first_day(), self.last_day()) {
            (Some(first), Some(last)) => task.start <= last && task.end >= first,
            _ => false,
        }
    }

    /// The task's range intersected with the visible range.
    fn clip(&self, task: &Task) -> Option<(NaiveDate, NaiveDate)> {
        if !self.overlaps(task) {
            return None;
        }
        let first = self.first_day()?;
        let last = self.last_day()?;
        Some((task.start.max(first), task.end.min(last)))
    }

    /// Left edge of the task bar after clipping to the window.
    pub fn item_left(&self, task: &Task) -> f32 {
        self.clip(task)
            .map(|(start, _)| self.day_position(start))
            .unwrap_or(0.0)
    }

    /// Width of the task bar after clipping. Never less than one day.
    pub fn item_pixel_width(&self, task: &Task) -> f32 {
        let days = self
            .clip(task)
            .and_then(|(start, end)| Some((self.index_of(start)?, self.index_of(end)?)))
            .map(|(s, e)| e.saturating_sub(s) + 1)
            .unwrap_or(1);
        days.max(1) as f32 * self.day_width
    }

    /// Index of the day column under a content-relative x, if visible.
    pub fn day_at(&self, x: f32) -> Option<usize> {
        if x < 0.0 || self.day_width <= 0.0 {
            return None;
        }
        let idx = (x / self.day_width).floor() as usize;
        (idx < self.days.len()).then_some(idx)
    }

    pub fn total_width(&self) -> f32 {
        self.days.len() as f32 * self.day_width
    }

    /// Convert a pointer delta into whole days.
    pub fn days_for_delta(&self, delta_x: f32) -> i64 {
        if self.day_width <= 0.0 {
            return 0;
        }
        (delta_x / self.day_width).round() as i64
    }
}
