//! Pointer state machine for the timeline.
//!
//! `Idle -> Armed(mode) -> Idle`. A press on a bar arms a [`DragSession`];
//! moves are converted to whole-day offsets from the press position and
//! the release decides between a click (open the editor) and a drop
//! (persist the dates already applied during the drag). Only one session
//! exists at a time, so the host forwards global pointer events to the
//! controller only while [`InteractionController::is_capturing`] is true.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::config::TimelineConfig;
use crate::error::InteractionError;
use crate::model::{Task, TaskDraft, ViewWindow};

/// What a press on a bar will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    ResizeLeft,
    ResizeRight,
}

/// Ephemeral state between press and release.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub task_id: Uuid,
    pub mode: DragMode,
    pub anchor_x: f32,
    pub original_start: NaiveDate,
    pub original_end: NaiveDate,
    pub moved: bool,
    current: (NaiveDate, NaiveDate),
}

/// New dates for the dragged task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragUpdate {
    pub task_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DragUpdate {
    pub fn apply_to(&self, task: &mut Task) {
        task.start = self.start;
        task.end = self.end;
    }
}

/// Outcome of releasing the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// No session was armed.
    Idle,
    /// Press and release without crossing the movement threshold.
    Click(Uuid),
    /// The pointer moved; carries the final dates if they changed.
    Dropped(Option<DragUpdate>),
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    edge_margin: f32,
    drag_threshold: f32,
    click_suppress: Duration,
    quick_create_days: i64,
    session: Option<DragSession>,
    just_moved_until: Option<Instant>,
}

impl InteractionController {
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            edge_margin: config.edge_margin,
            drag_threshold: config.drag_threshold,
            click_suppress: Duration::from_millis(config.click_suppress_ms),
            quick_create_days: config.quick_create_days,
            session: None,
            just_moved_until: None,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_capturing(&self) -> bool {
        self.session.is_some()
    }

    /// Mode a press at `pointer_x` would arm, given the bar's rendered box.
    ///
    /// Narrow bars shrink the edge zones so the middle stays movable.
    pub fn mode_at(&self, pointer_x: f32, item_left: f32, item_width: f32) -> DragMode {
        let margin = self.edge_margin.min(item_width / 4.0);
        let offset = pointer_x - item_left;
        if offset <= margin {
            DragMode::ResizeLeft
        } else if offset >= item_width - margin {
            DragMode::ResizeRight
        } else {
            DragMode::Move
        }
    }

    /// Arm a session for `task`.
    pub fn pointer_down(
        &mut self,
        task: &Task,
        pointer_x: f32,
        item_left: f32,
        item_width: f32,
    ) -> Result<DragMode, InteractionError> {
        if let Some(active) = &self.session {
            return Err(InteractionError::SessionActive(active.task_id));
        }
        let mode = self.mode_at(pointer_x, item_left, item_width);
        debug!(task = %task.id, ?mode, pointer_x, "drag armed");
        self.session = Some(DragSession {
            task_id: task.id,
            mode,
            anchor_x: pointer_x,
            original_start: task.start,
            original_end: task.end,
            moved: false,
            current: (task.start, task.end),
        });
        Ok(mode)
    }

    /// Feed a pointer position. Returns new dates when the whole-day offset
    /// changes the task; sub-day jitter and sub-threshold travel yield `None`.
    pub fn pointer_move(&mut self, pointer_x: f32, window: &ViewWindow) -> Option<DragUpdate> {
        let session = self.session.as_mut()?;
        let delta_x = pointer_x - session.anchor_x;
        if delta_x.abs() > self.drag_threshold {
            session.moved = true;
        }
        if !session.moved {
            return None;
        }

        let whole_days = window.days_for_delta(delta_x);
        let days = chrono::Duration::days(whole_days);
        let one_day = chrono::Duration::days(1);
        // Clamps only apply to a real change; sub-day travel keeps the originals.
        let (start, end) = match session.mode {
            _ if whole_days == 0 => (session.original_start, session.original_end),
            DragMode::Move => (session.original_start + days, session.original_end + days),
            DragMode::ResizeLeft => {
                let mut start = session.original_start + days;
                if start >= session.original_end {
                    start = session.original_end - one_day;
                }
                (start, session.original_end)
            }
            DragMode::ResizeRight => {
                let mut end = session.original_end + days;
                if end <= session.original_start {
                    end = session.original_start + one_day;
                }
                (session.original_start, end)
            }
        };

        if (start, end) == session.current {
            return None;
        }
        session.current = (start, end);
        Some(DragUpdate {
            task_id: session.task_id,
            start,
            end,
        })
    }

    /// End the session.
    pub fn pointer_up(&mut self, now: Instant) -> Release {
        let Some(session) = self.session.take() else {
            return Release::Idle;
        };
        if !session.moved {
            debug!(task = %session.task_id, "click");
            return Release::Click(session.task_id);
        }

        self.just_moved_until = Some(now + self.click_suppress);
        let changed = session.current != (session.original_start, session.original_end);
        debug!(task = %session.task_id, changed, "drag released");
        Release::Dropped(changed.then_some(DragUpdate {
            task_id: session.task_id,
            start: session.current.0,
            end: session.current.1,
        }))
    }

    /// Abort the session, returning the original dates if they were changed.
    pub fn cancel(&mut self) -> Option<DragUpdate> {
        let session = self.session.take()?;
        let original = (session.original_start, session.original_end);
        (session.current != original).then_some(DragUpdate {
            task_id: session.task_id,
            start: session.original_start,
            end: session.original_end,
        })
    }

    /// False while a session is armed or shortly after a drag ended, so the
    /// click that follows a drag does not also open the editor.
    pub fn accepts_click(&self, now: Instant) -> bool {
        self.session.is_none() && self.just_moved_until.map_or(true, |until| now >= until)
    }

    /// Quick-create candidate for a click on empty canvas.
    ///
    /// `pointer_x` is relative to the visible viewport and `scroll_x` is the
    /// horizontal scroll offset of the canvas.
    pub fn canvas_click(
        &self,
        pointer_x: f32,
        scroll_x: f32,
        window: &ViewWindow,
        now: Instant,
    ) -> Option<TaskDraft> {
        if !self.accepts_click(now) {
            return None;
        }
        let idx = window.day_at(pointer_x + scroll_x)?;
        let date = *window.days().get(idx)?;
        Some(TaskDraft::quick(date, self.quick_create_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Granularity;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(granularity: Granularity) -> (InteractionController, ViewWindow) {
        let config = TimelineConfig::default();
        (
            InteractionController::new(&config),
            ViewWindow::new(date(2024, 6, 12), granularity, &config),
        )
    }

    fn press(ctl: &mut InteractionController, window: &ViewWindow, task: &Task, offset: f32) -> DragMode {
        let left = window.item_left(task);
        let width = window.item_pixel_width(task);
        ctl.pointer_down(task, left + offset, left, width).unwrap()
    }

    #[test]
    fn edge_zones_select_resize() {
        let (ctl, _) = setup(Granularity::Week);
        assert_eq!(ctl.mode_at(105.0, 100.0, 360.0), DragMode::ResizeLeft);
        assert_eq!(ctl.mode_at(450.0, 100.0, 360.0), DragMode::ResizeRight);
        assert_eq!(ctl.mode_at(250.0, 100.0, 360.0), DragMode::Move);
        // A 40px bar keeps a movable middle.
        assert_eq!(ctl.mode_at(20.0, 0.0, 40.0), DragMode::Move);
    }

    #[test]
    fn second_session_is_rejected() {
        let (mut ctl, window) = setup(Granularity::Week);
        let a = Task::new("a", date(2024, 6, 10), date(2024, 6, 12));
        let b = Task::new("b", date(2024, 6, 14), date(2024, 6, 15));
        press(&mut ctl, &window, &a, 60.0);
        let left = window.item_left(&b);
        assert_eq!(
            ctl.pointer_down(&b, left + 60.0, left, 240.0),
            Err(InteractionError::SessionActive(a.id))
        );
    }

    #[test]
    fn small_travel_is_a_click() {
        let (mut ctl, window) = setup(Granularity::Week);
        let task = Task::new("a", date(2024, 6, 10), date(2024, 6, 12));
        press(&mut ctl, &window, &task, 150.0);
        let anchor = ctl.session().unwrap().anchor_x;

        assert_eq!(ctl.pointer_move(anchor + 3.0, &window), None);
        assert_eq!(ctl.pointer_move(anchor - 2.0, &window), None);
        assert_eq!(ctl.pointer_up(Instant::now()), Release::Click(task.id));
        assert!(!ctl.is_capturing());
    }

    #[test]
    fn sub_day_travel_past_threshold_is_a_drag_without_change() {
        let (mut ctl, window) = setup(Granularity::Week);
        let task = Task::new("a", date(2024, 6, 10), date(2024, 6, 12));
        press(&mut ctl, &window, &task, 150.0);
        let anchor = ctl.session().unwrap().anchor_x;

        assert_eq!(ctl.pointer_move(anchor + 30.0, &window), None);
        assert_eq!(ctl.pointer_up(Instant::now()), Release::Dropped(None));
    }

    #[test]
    fn single_day_edge_jitter_keeps_dates() {
        let (mut ctl, window) = setup(Granularity::Month);
        let task = Task::new("a", date(2024, 6, 10), date(2024, 6, 10));

        assert_eq!(press(&mut ctl, &window, &task, 2.0), DragMode::ResizeLeft);
        let anchor = ctl.session().unwrap().anchor_x;
        assert_eq!(ctl.pointer_move(anchor + 8.0, &window), None);
        assert_eq!(ctl.pointer_move(anchor - 8.0, &window), None);
        assert_eq!(ctl.pointer_up(Instant::now()), Release::Dropped(None));

        assert_eq!(press(&mut ctl, &window, &task, 38.0), DragMode::ResizeRight);
        let anchor = ctl.session().unwrap().anchor_x;
        assert_eq!(ctl.pointer_move(anchor - 8.0, &window), None);
        assert_eq!(ctl.pointer_move(anchor + 8.0, &window), None);
        // A whole day past the start still clamps.
        let pinned = ctl.pointer_move(anchor - 40.0, &window).unwrap();
        assert_eq!((pinned.start, pinned.end), (date(2024, 6, 10), date(2024, 6, 11)));
    }

    #[test]
    fn move_shifts_both_dates_live() {
        let (mut ctl, window) = setup(Granularity::Week);
        let task = Task::new("a", date(2024, 6, 10), date(2024, 6, 12));
        press(&mut ctl, &window, &task, 150.0);
        let anchor = ctl.session().unwrap().anchor_x;

        let first = ctl.pointer_move(anchor + 125.0, &window).unwrap();
        assert_eq!((first.start, first.end), (date(2024, 6, 11), date(2024, 6, 13)));
        // Same whole-day offset: no repeated update.
        assert_eq!(ctl.pointer_move(anchor + 130.0, &window), None);
        let second = ctl.pointer_move(anchor - 240.0, &window).unwrap();
        assert_eq!((second.start, second.end), (date(2024, 6, 8), date(2024, 6, 10)));
        // Back to the origin restores the original dates.
        let back = ctl.pointer_move(anchor, &window).unwrap();
        assert_eq!((back.start, back.end), (task.start, task.end));
    }

    #[test]
    fn resize_left_pins_before_end() {
        let (mut ctl, window) = setup(Granularity::Week);
        let task = Task::new("a", date(2024, 6, 10), date(2024, 6, 12));
        assert_eq!(press(&mut ctl, &window, &task, 5.0), DragMode::ResizeLeft);
        let anchor = ctl.session().unwrap().anchor_x;

        let grow = ctl.pointer_move(anchor - 240.0, &window).unwrap();
        assert_eq!((grow.start, grow.end), (date(2024, 6, 8), date(2024, 6, 12)));

        let pinned = ctl.pointer_move(anchor + 10.0 * 120.0, &window).unwrap();
        assert_eq!((pinned.start, pinned.end), (date(2024, 6, 11), date(2024, 6, 12)));
        assert_eq!(ctl.pointer_move(anchor + 12.0 * 120.0, &window), None);
    }

    #[test]
    fn resize_right_pins_after_start() {
        let (mut ctl, window) = setup(Granularity::Month);
        let task = Task::new("a", date(2024, 6, 1), date(2024, 6, 3));
        let width = window.item_pixel_width(&task);
        assert_eq!(press(&mut ctl, &window, &task, width - 2.0), DragMode::ResizeRight);
        let anchor = ctl.session().unwrap().anchor_x;

        let update = ctl.pointer_move(anchor - 10.0 * 40.0, &window).unwrap();
        assert_eq!((update.start, update.end), (date(2024, 6, 1), date(2024, 6, 2)));
        assert!(update.end > update.start);
    }

    #[test]
    fn click_after_drag_is_suppressed_briefly() {
        let (mut ctl, window) = setup(Granularity::Month);
        let task = Task::new("a", date(2024, 6, 1), date(2024, 6, 1));
        press(&mut ctl, &window, &task, 20.0);
        let anchor = ctl.session().unwrap().anchor_x;
        ctl.pointer_move(anchor + 80.0, &window);

        let released = Instant::now();
        assert!(matches!(ctl.pointer_up(released), Release::Dropped(Some(_))));
        assert!(!ctl.accepts_click(released + Duration::from_millis(50)));
        assert!(ctl
            .canvas_click(10.0, 0.0, &window, released + Duration::from_millis(50))
            .is_none());
        assert!(ctl.accepts_click(released + Duration::from_millis(150)));
    }

    #[test]
    fn cancel_restores_original_dates() {
        let (mut ctl, window) = setup(Granularity::Week);
        let task = Task::new("a", date(2024, 6, 10), date(2024, 6, 12));
        press(&mut ctl, &window, &task, 150.0);
        let anchor = ctl.session().unwrap().anchor_x;
        ctl.pointer_move(anchor + 360.0, &window).unwrap();

        let restore = ctl.cancel().unwrap();
        assert_eq!((restore.start, restore.end), (task.start, task.end));
        assert_eq!(ctl.pointer_up(Instant::now()), Release::Idle);
    }

    #[test]
    fn canvas_click_quick_creates_three_days() {
        let (ctl, window) = setup(Granularity::Month);
        let draft = ctl
            .canvas_click(15.0, 10.0 * 40.0, &window, Instant::now())
            .unwrap();
        assert_eq!(draft.start, window.days()[10]);
        assert_eq!(draft.end, window.days()[10] + chrono::Duration::days(2));

        assert!(ctl
            .canvas_click(window.total_width() + 5.0, 0.0, &window, Instant::now())
            .is_none());
    }
}
