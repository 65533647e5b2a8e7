use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

use crate::model::labels::header_label;
use crate::model::{Granularity, TaskFilter, TaskPriority, TaskStatus, ViewWindow};
use crate::ui::theme;

/// Actions requested from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    Previous,
    Next,
    Today,
    SetGranularity(Granularity),
    NewTask,
    FilterChanged,
}

/// Render the top toolbar. Filter toggles mutate `filter` directly.
pub fn show_toolbar(window: &ViewWindow, filter: &mut TaskFilter, ui: &mut Ui) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    menu::bar(ui, |ui| {
        if ui.button(RichText::new(icons::CARET_LEFT).size(14.0)).on_hover_text("Previous").clicked() {
            action = ToolbarAction::Previous;
        }
        if ui.button("Today").clicked() {
            action = ToolbarAction::Today;
        }
        if ui.button(RichText::new(icons::CARET_RIGHT).size(14.0)).on_hover_text("Next").clicked() {
            action = ToolbarAction::Next;
        }

        ui.separator();
        for granularity in [Granularity::Week, Granularity::Month] {
            if ui
                .selectable_label(window.granularity() == granularity, granularity.label())
                .clicked()
                && window.granularity() != granularity
            {
                action = ToolbarAction::SetGranularity(granularity);
            }
        }

        ui.separator();
        if ui.button(format!("{}  New", icons::PLUS)).clicked() {
            action = ToolbarAction::NewTask;
        }

        ui.menu_button(format!("{}  Filter", icons::FUNNEL), |ui| {
            ui.label(RichText::new("Priority").small().weak());
            for priority in TaskPriority::all() {
                let mut on = filter.priorities.contains(priority);
                if ui.checkbox(&mut on, priority.label()).changed() {
                    filter.toggle_priority(*priority);
                    action = ToolbarAction::FilterChanged;
                }
            }
            ui.separator();
            ui.label(RichText::new("Status").small().weak());
            for status in TaskStatus::all() {
                let mut on = filter.statuses.contains(status);
                if ui.checkbox(&mut on, status.label()).changed() {
                    filter.toggle_status(*status);
                    action = ToolbarAction::FilterChanged;
                }
            }
            ui.separator();
            if ui.button("Show all").clicked() {
                *filter = TaskFilter::default();
                action = ToolbarAction::FilterChanged;
                ui.close_menu();
            }
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(header_label(window))
                    .font(theme::font_header())
                    .color(theme::TEXT_PRIMARY),
            );
        });
    });

    action
}
