use std::time::Instant;

use chrono::{Datelike, NaiveDate, Weekday};
use egui::{Color32, CursorIcon, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use uuid::Uuid;

use crate::interaction::{DragMode, InteractionController, Release};
use crate::model::labels::{day_label, month_segments};
use crate::model::lanes::{assign_lanes, lane_count};
use crate::model::timeline::{first_of_month, week_start_of};
use crate::model::{Granularity, Task, TaskDraft, TaskFilter, TaskStatus, ViewWindow};
use crate::store::ItemStoreAdapter;
use crate::ui::theme;

const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const LANE_HEIGHT: f32 = theme::LANE_HEIGHT;
const LANE_GAP: f32 = theme::LANE_GAP;

/// What happened on the timeline this frame.
#[derive(Debug, Default)]
pub struct TimelineInteraction {
    /// Drag finished with new dates; persist this task.
    pub dropped: Option<Task>,
    /// A bar was clicked without dragging.
    pub open_editor: Option<Uuid>,
    /// Empty canvas was clicked.
    pub quick_create: Option<TaskDraft>,
}

/// Render the timeline canvas and route pointer input through `controller`.
pub fn show_timeline(
    adapter: &mut ItemStoreAdapter,
    controller: &mut InteractionController,
    window: &ViewWindow,
    filter: &TaskFilter,
    selected_task: Option<Uuid>,
    scroll_to_reference: &mut bool,
    ui: &mut Ui,
) -> TimelineInteraction {
    let mut interaction = TimelineInteraction::default();

    let visible: Vec<Task> = adapter.visible_items(filter, window).cloned().collect();
    let lanes = assign_lanes(&visible);
    let available = ui.available_size();
    let chart_width = window.total_width();
    let chart_height =
        HEADER_HEIGHT + lane_count(&lanes) as f32 * (LANE_HEIGHT + LANE_GAP) + 40.0;

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .drag_to_scroll(false)
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(chart_width, chart_height.max(available.y)),
                Sense::click(),
            );
            let origin = response.rect.min;
            let canvas = response.rect;

            if std::mem::take(scroll_to_reference) {
                let anchor = match window.granularity() {
                    Granularity::Week => week_start_of(window.reference(), window.week_start()),
                    Granularity::Month => first_of_month(window.reference()),
                };
                let x = origin.x + window.day_position(anchor);
                ui.scroll_to_rect(
                    Rect::from_min_size(Pos2::new(x, origin.y), Vec2::new(window.day_width(), 1.0)),
                    Some(egui::Align::Min),
                );
            }

            painter.rect_filled(canvas, 0.0, theme::BG_DARK);
            draw_day_columns(&painter, canvas, window);
            draw_timeline_header(&painter, origin, window, chart_width);
            draw_today_line(&painter, canvas, window);

            // Bars, remembered for hit testing in content coordinates.
            let mut bars: Vec<(Task, Rect)> = Vec::with_capacity(visible.len());
            for (id, lane) in &lanes {
                let Some(task) = visible.iter().find(|t| t.id == *id) else {
                    continue;
                };
                let y = origin.y + HEADER_HEIGHT + LANE_GAP + *lane as f32 * (LANE_HEIGHT + LANE_GAP);
                let rect = Rect::from_min_size(
                    Pos2::new(origin.x + window.item_left(task), y),
                    Vec2::new(window.item_pixel_width(task), LANE_HEIGHT),
                );
                let is_selected = selected_task == Some(task.id);
                let is_dragged = controller
                    .session()
                    .is_some_and(|s| adapter.store().resolve(s.task_id) == task.id);
                draw_task_bar(&painter, rect, task, is_selected || is_dragged);
                bars.push((task.clone(), rect));
            }

            let now = Instant::now();
            let (pressed, released, pointer, escape) = ui.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_released(),
                    i.pointer.latest_pos(),
                    i.key_pressed(egui::Key::Escape),
                )
            });
            let bar_under = |pos: Pos2| bars.iter().rev().find(|(_, rect)| rect.contains(pos));

            // Hover affordances
            if !controller.is_capturing() {
                if let Some((task, rect)) = pointer.filter(|p| canvas.contains(*p)).and_then(bar_under) {
                    let x = pointer.map(|p| p.x).unwrap_or(rect.left());
                    ui.ctx().set_cursor_icon(cursor_for(controller.mode_at(
                        x,
                        rect.left(),
                        rect.width(),
                    )));
                    draw_handles(&painter, *rect);
                    show_bar_tooltip(ui, task);
                }
            }

            // Press: arm a session on the bar under the pointer.
            if pressed && !controller.is_capturing() {
                if let Some(pos) = pointer.filter(|p| canvas.contains(*p)) {
                    if let Some((task, _)) = bar_under(pos) {
                        let result = controller.pointer_down(
                            task,
                            pos.x - origin.x,
                            window.item_left(task),
                            window.item_pixel_width(task),
                        );
                        if let Err(e) = result {
                            tracing::debug!(error = %e, "ignored press");
                        }
                    }
                }
            }

            // Move / release while captured. These are global: the pointer
            // may leave the canvas mid-drag.
            if controller.is_capturing() {
                if escape {
                    if let Some(restore) = controller.cancel() {
                        adapter.apply_drag(restore);
                    }
                } else {
                    if let Some(mode) = controller.session().map(|s| s.mode) {
                        ui.ctx().set_cursor_icon(match mode {
                            DragMode::Move => CursorIcon::Grabbing,
                            _ => CursorIcon::ResizeHorizontal,
                        });
                    }
                    if let Some(pos) = pointer {
                        if let Some(update) = controller.pointer_move(pos.x - origin.x, window) {
                            adapter.apply_drag(update);
                        }
                    }
                    if released {
                        match controller.pointer_up(now) {
                            Release::Click(id) => interaction.open_editor = Some(id),
                            Release::Dropped(Some(update)) => {
                                interaction.dropped = adapter.find(update.task_id).cloned();
                            }
                            Release::Dropped(None) | Release::Idle => {}
                        }
                    }
                }
                ui.ctx().request_repaint();
            } else if response.clicked() {
                // Empty canvas: quick-create under the pointer.
                if let Some(pos) = response.interact_pointer_pos() {
                    if bar_under(pos).is_none() {
                        let viewport_left = ui.clip_rect().left();
                        interaction.quick_create = controller.canvas_click(
                            pos.x - viewport_left,
                            viewport_left - origin.x,
                            window,
                            now,
                        );
                    }
                }
            }
        });

    interaction
}

fn cursor_for(mode: DragMode) -> CursorIcon {
    match mode {
        DragMode::Move => CursorIcon::Grab,
        DragMode::ResizeLeft | DragMode::ResizeRight => CursorIcon::ResizeHorizontal,
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekend shading and vertical grid lines below the header.
fn draw_day_columns(painter: &egui::Painter, canvas: Rect, window: &ViewWindow) {
    for (idx, day) in window.days().iter().enumerate() {
        let x = canvas.left() + idx as f32 * window.day_width();
        if is_weekend(*day) {
            painter.rect_filled(
                Rect::from_min_max(
                    Pos2::new(x, canvas.top() + HEADER_HEIGHT),
                    Pos2::new(x + window.day_width(), canvas.bottom()),
                ),
                0.0,
                theme::BG_WEEKEND,
            );
        }
        painter.line_segment(
            [
                Pos2::new(x, canvas.top() + HEADER_HEIGHT),
                Pos2::new(x, canvas.bottom()),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }
}

fn draw_timeline_header(painter: &egui::Painter, origin: Pos2, window: &ViewWindow, width: f32) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );

    // Month band
    for segment in month_segments(window) {
        let rect = Rect::from_min_size(
            Pos2::new(origin.x + segment.start_x, origin.y),
            Vec2::new(segment.width, theme::MONTH_BAND_HEIGHT),
        );
        painter.rect_filled(rect.shrink2(Vec2::new(0.5, 0.0)), 0.0, theme::BG_MONTH_BAND);
        painter.line_segment(
            [rect.left_top(), rect.left_bottom()],
            Stroke::new(1.0, theme::BORDER_SUBTLE),
        );
        painter.with_clip_rect(rect).text(
            Pos2::new(rect.left() + 6.0, rect.center().y),
            egui::Align2::LEFT_CENTER,
            &segment.label,
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
    }

    // Day labels
    let today = chrono::Local::now().date_naive();
    let label_y = origin.y + theme::MONTH_BAND_HEIGHT + theme::DAY_ROW_HEIGHT / 2.0;
    for (idx, day) in window.days().iter().enumerate() {
        let x = origin.x + idx as f32 * window.day_width();
        let color = if *day == today {
            theme::TODAY_LINE
        } else if is_weekend(*day) {
            theme::TEXT_DIM
        } else {
            theme::TEXT_SECONDARY
        };
        painter.text(
            Pos2::new(x + window.day_width() / 2.0, label_y),
            egui::Align2::CENTER_CENTER,
            day_label(*day, window.granularity()),
            theme::font_sub(),
            color,
        );
    }

    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
}

fn draw_today_line(painter: &egui::Painter, canvas: Rect, window: &ViewWindow) {
    let today = chrono::Local::now().date_naive();
    let Some(idx) = window.index_of(today) else {
        return;
    };
    let x = canvas.left() + (idx as f32 + 0.5) * window.day_width();
    painter.line_segment(
        [
            Pos2::new(x, canvas.top() + HEADER_HEIGHT),
            Pos2::new(x, canvas.bottom()),
        ],
        Stroke::new(1.5, theme::TODAY_LINE),
    );
}

fn draw_task_bar(painter: &egui::Painter, rect: Rect, task: &Task, highlighted: bool) {
    let bar_rect = rect.shrink2(Vec2::new(theme::BAR_INSET, 0.0));
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    // Soft shadow
    painter.rect_filled(
        bar_rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );
    painter.rect_filled(bar_rect, rounding, task.display_color());
    // Lighter top highlight
    painter.rect_filled(
        Rect::from_min_size(bar_rect.min, Vec2::new(bar_rect.width(), bar_rect.height() * 0.45)),
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );
    if task.status == TaskStatus::Completed {
        painter.rect_filled(bar_rect, rounding, theme::DONE_OVERLAY);
    }

    if highlighted {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    // Title, clipped to the bar
    if bar_rect.width() > 24.0 {
        let galley = painter.layout_no_wrap(task.title.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        painter.with_clip_rect(bar_rect.shrink(2.0)).galley(
            Pos2::new(bar_rect.left() + 6.0, text_y),
            galley,
            Color32::TRANSPARENT,
        );
    }
}

/// Pill handles on both edges of a hovered bar.
fn draw_handles(painter: &egui::Painter, rect: Rect) {
    let handle_h = rect.height() * 0.55;
    let handle_y = rect.center().y - handle_h / 2.0;
    for x in [rect.left() + theme::BAR_INSET + 2.0, rect.right() - theme::BAR_INSET - 6.0] {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(x, handle_y), Vec2::new(4.0, handle_h)),
            Rounding::same(2.0),
            theme::HANDLE_COLOR,
        );
    }
}

fn show_bar_tooltip(ui: &Ui, task: &Task) {
    egui::show_tooltip_at_pointer(
        ui.ctx(),
        ui.layer_id(),
        egui::Id::new(("task-tip", task.id)),
        |ui| {
            ui.strong(&task.title);
            ui.label(format!(
                "{} → {}",
                task.start.format("%d/%m/%Y"),
                task.end.format("%d/%m/%Y"),
            ));
            ui.label(format!("{} · {}", task.status.label(), task.priority.label()));
        },
    );
}
