use egui::{Color32, RichText, Ui};
use uuid::Uuid;

use crate::model::{Task, TaskDraft, TaskPriority, TaskStatus};
use crate::ui::theme;

/// Actions the editor can request.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    None,
    Save(TaskDraft),
    Delete(Uuid),
    Close,
}

/// The task being edited and its unsaved field values.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub task_id: Uuid,
    pub draft: TaskDraft,
    /// Opened right after a quick-create.
    pub is_new: bool,
}

impl EditorState {
    pub fn open(task: &Task, is_new: bool) -> Self {
        Self {
            task_id: task.id,
            draft: task.draft(),
            is_new,
        }
    }
}

fn field_label(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(10.0).color(theme::TEXT_DIM).strong());
}

/// Render the detail editor window.
pub fn show_task_editor(state: &mut EditorState, ctx: &egui::Context) -> EditorAction {
    let mut action = EditorAction::None;
    let mut open = true;
    let title = if state.is_new { "New Task" } else { "Edit Task" };

    egui::Window::new(title)
        .id(egui::Id::new("task_editor"))
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(theme::EDITOR_WIDTH)
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 48.0])
        .show(ctx, |ui| {
            ui.spacing_mut().item_spacing.y = 6.0;
            let draft = &mut state.draft;

            field_label(ui, "Title");
            ui.add_sized(
                [ui.available_width(), 24.0],
                egui::TextEdit::singleline(&mut draft.title)
                    .hint_text("Task title")
                    .font(egui::FontId::proportional(12.0)),
            );

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    field_label(ui, "Start");
                    ui.add(egui_extras::DatePickerButton::new(&mut draft.start).id_salt("dp_start"));
                });
                ui.add_space(12.0);
                ui.vertical(|ui| {
                    field_label(ui, "End");
                    ui.add(egui_extras::DatePickerButton::new(&mut draft.end).id_salt("dp_end"));
                });
            });

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    field_label(ui, "Status");
                    egui::ComboBox::from_id_salt("status_combo")
                        .selected_text(draft.status.label())
                        .show_ui(ui, |ui| {
                            for status in TaskStatus::all() {
                                ui.selectable_value(&mut draft.status, *status, status.label());
                            }
                        });
                });
                ui.vertical(|ui| {
                    field_label(ui, "Priority");
                    egui::ComboBox::from_id_salt("priority_combo")
                        .selected_text(RichText::new(draft.priority.label()).color(draft.priority.color()))
                        .show_ui(ui, |ui| {
                            for priority in TaskPriority::all() {
                                ui.selectable_value(
                                    &mut draft.priority,
                                    *priority,
                                    RichText::new(priority.label()).color(priority.color()),
                                );
                            }
                        });
                });
            });

            field_label(ui, "Color");
            ui.horizontal_wrapped(|ui| {
                if ui.selectable_label(draft.color.is_none(), "Auto").clicked() {
                    draft.color = None;
                }
                for color in theme::TASK_COLORS {
                    if color_swatch(ui, *color, draft.color == Some(*color)).clicked() {
                        draft.color = Some(*color);
                    }
                }
            });

            field_label(ui, "Notes");
            ui.add_sized(
                [ui.available_width(), 70.0],
                egui::TextEdit::multiline(&mut draft.description).font(egui::FontId::proportional(11.5)),
            );

            let validation = draft.validate();
            if let Err(e) = &validation {
                ui.label(RichText::new(e.to_string()).size(10.5).color(theme::TEXT_ERROR));
            }

            ui.add_space(4.0);
            ui.horizontal(|ui| {
                let save = egui::Button::new(
                    RichText::new(format!("{}  Save", egui_phosphor::regular::CHECK)).color(Color32::WHITE),
                )
                .fill(theme::ACCENT);
                if ui.add_enabled(validation.is_ok(), save).clicked() {
                    action = EditorAction::Save(draft.clone());
                }
                let delete = egui::Button::new(
                    RichText::new(format!("{}  Delete", egui_phosphor::regular::TRASH)).color(Color32::WHITE),
                )
                .fill(theme::DANGER);
                if ui.add(delete).clicked() {
                    action = EditorAction::Delete(state.task_id);
                }
            });
        });

    if !open && action == EditorAction::None {
        action = EditorAction::Close;
    }
    action
}

fn color_swatch(ui: &mut Ui, color: Color32, selected: bool) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(18.0, 18.0), egui::Sense::click());
    let painter = ui.painter();
    painter.rect_filled(rect, egui::Rounding::same(3.0), color);
    if selected {
        painter.rect_stroke(rect.expand(1.5), egui::Rounding::same(4.0), egui::Stroke::new(2.0, Color32::WHITE));
    } else if response.hovered() {
        painter.rect_stroke(rect, egui::Rounding::same(3.0), egui::Stroke::new(1.0, theme::BORDER_ACCENT));
    }
    response
}
