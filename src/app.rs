use std::cell::RefCell;
use std::rc::Rc;

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::TimelineConfig;
use crate::interaction::InteractionController;
use crate::io::OfflineStore;
use crate::model::{Granularity, Task, TaskDraft, TaskFilter, TaskPriority, TaskStatus, ViewWindow};
use crate::store::{ItemStoreAdapter, Notifier};
use crate::ui;
use crate::ui::task_editor::{EditorAction, EditorState};
use crate::ui::toolbar::ToolbarAction;

/// Last message shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Notifier that feeds the status bar.
#[derive(Debug, Default)]
pub struct StatusNotifier {
    last: RefCell<Option<StatusMessage>>,
}

impl StatusNotifier {
    pub fn current(&self) -> Option<StatusMessage> {
        self.last.borrow().clone()
    }

    fn set(&self, text: &str, is_error: bool) {
        *self.last.borrow_mut() = Some(StatusMessage {
            text: text.to_string(),
            is_error,
        });
    }
}

impl Notifier for StatusNotifier {
    fn success(&self, message: &str) {
        info!("{message}");
        self.set(message, false);
    }

    fn error(&self, message: &str) {
        warn!("{message}");
        self.set(message, true);
    }
}

/// Main application state.
pub struct PlannerApp {
    adapter: ItemStoreAdapter,
    controller: InteractionController,
    window: ViewWindow,
    filter: TaskFilter,
    editor: Option<EditorState>,
    offline: OfflineStore,
    status: Rc<StatusNotifier>,
    quick_create_days: i64,
    scroll_to_reference: bool,
}

impl PlannerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: TimelineConfig) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let today = chrono::Local::now().date_naive();
        let offline = OfflineStore::default_location();
        Self::with_store(offline, config, today)
    }

    /// Build the app state around an offline store; used by `new` and tests.
    pub fn with_store(offline: OfflineStore, config: TimelineConfig, today: NaiveDate) -> Self {
        let status = Rc::new(StatusNotifier::default());
        let tasks = match offline.load() {
            Ok(Some(tasks)) => {
                info!(count = tasks.len(), path = %offline.path().display(), "loaded tasks");
                tasks
            }
            Ok(None) => sample_tasks(today),
            Err(e) => {
                warn!(error = %e, "could not load tasks; starting empty");
                status.error(&format!("Could not load tasks: {e}"));
                Vec::new()
            }
        };

        Self {
            adapter: ItemStoreAdapter::offline(tasks).with_notifier(status.clone()),
            controller: InteractionController::new(&config),
            window: ViewWindow::new(today, Granularity::Week, &config),
            filter: TaskFilter::default(),
            editor: None,
            offline,
            status,
            quick_create_days: config.quick_create_days,
            scroll_to_reference: true,
        }
    }

    pub fn adapter(&self) -> &ItemStoreAdapter {
        &self.adapter
    }

    pub fn window(&self) -> &ViewWindow {
        &self.window
    }

    pub fn editor(&self) -> Option<&EditorState> {
        self.editor.as_ref()
    }

    pub fn status(&self) -> Option<StatusMessage> {
        self.status.current()
    }

    // --- Navigation ---

    pub fn apply_toolbar(&mut self, action: ToolbarAction, today: NaiveDate) {
        match action {
            ToolbarAction::None | ToolbarAction::FilterChanged => return,
            ToolbarAction::Previous => self.window.previous_period(),
            ToolbarAction::Next => self.window.next_period(),
            ToolbarAction::Today => self.window.jump_to(today),
            ToolbarAction::SetGranularity(granularity) => self.window.set_granularity(granularity),
            ToolbarAction::NewTask => {
                let draft = TaskDraft::quick(today, self.quick_create_days);
                self.create_and_edit(draft);
                return;
            }
        }
        self.scroll_to_reference = true;
    }

    // --- Task operations ---

    fn create_and_edit(&mut self, draft: TaskDraft) {
        let task = self.adapter.submit_create(draft);
        self.editor = Some(EditorState::open(&task, true));
        self.persist();
    }

    pub fn apply_editor(&mut self, action: EditorAction) {
        match action {
            EditorAction::None => {}
            EditorAction::Close => self.editor = None,
            EditorAction::Save(draft) => {
                let Some(state) = self.editor.take() else {
                    return;
                };
                let Some(mut task) = self.adapter.find(state.task_id).cloned() else {
                    warn!(id = %state.task_id, "edited task no longer exists");
                    return;
                };
                task.apply(draft);
                if self.adapter.submit_update(&task) {
                    self.status.success(&format!("Saved '{}'", task.title));
                }
                self.persist();
            }
            EditorAction::Delete(id) => {
                self.editor = None;
                if self.adapter.submit_delete(id) {
                    self.status.success("Task deleted");
                }
                self.persist();
            }
        }
    }

    fn open_editor(&mut self, id: Uuid) {
        if let Some(task) = self.adapter.find(id) {
            self.editor = Some(EditorState::open(task, false));
        }
    }

    /// Write the collection to disk when no backend owns it.
    fn persist(&self) {
        if self.adapter.is_online() {
            return;
        }
        if let Err(e) = self.offline.save(self.adapter.tasks()) {
            warn!(error = %e, "offline save failed");
            self.status.error(&format!("Could not save changes: {e}"));
        }
    }
}

impl eframe::App for PlannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let today = chrono::Local::now().date_naive();

        if !self.adapter.poll().is_empty() {
            self.persist();
        }
        if self.adapter.in_flight() > 0 {
            ctx.request_repaint();
        }

        // Top panel: toolbar
        let mut toolbar_action = ToolbarAction::None;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar_action = ui::toolbar::show_toolbar(&self.window, &mut self.filter, ui);
        });
        self.apply_toolbar(toolbar_action, today);

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_STATUS_BAR)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    let (text, color) = match self.status.current() {
                        Some(msg) if msg.is_error => (msg.text, ui::theme::TEXT_ERROR),
                        Some(msg) => (msg.text, ui::theme::TEXT_SECONDARY),
                        None => ("Ready".to_string(), ui::theme::TEXT_SECONDARY),
                    };
                    ui.label(egui::RichText::new(text).font(ui::theme::font_small()).color(color));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let shown = self.adapter.visible_items(&self.filter, &self.window).count();
                        ui.label(
                            egui::RichText::new(format!("Tasks: {shown} / {}", self.adapter.tasks().len()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        if self.adapter.in_flight() > 0 {
                            ui.spinner();
                        }
                    });
                });
            });

        // Central panel: the timeline
        let selected = self.editor.as_ref().map(|e| self.adapter.store().resolve(e.task_id));
        let interaction = egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(ui::theme::BG_DARK))
            .show(ctx, |ui| {
                ui::timeline::show_timeline(
                    &mut self.adapter,
                    &mut self.controller,
                    &self.window,
                    &self.filter,
                    selected,
                    &mut self.scroll_to_reference,
                    ui,
                )
            })
            .inner;

        if let Some(task) = interaction.dropped {
            self.adapter.submit_update(&task);
            self.persist();
        }
        if let Some(id) = interaction.open_editor {
            self.open_editor(id);
        }
        if let Some(draft) = interaction.quick_create {
            self.create_and_edit(draft);
        }

        // Detail editor
        if let Some(state) = self.editor.as_mut() {
            let action = ui::task_editor::show_task_editor(state, ctx);
            self.apply_editor(action);
        }
    }
}

/// A few tasks around `today` for the first run.
fn sample_tasks(today: NaiveDate) -> Vec<Task> {
    let day = |offset: i64| today + Duration::days(offset);

    let mut kickoff = Task::new("Project kickoff", day(-3), day(-2));
    kickoff.status = TaskStatus::Completed;

    let mut design = Task::new("UI design", day(-1), day(4));
    design.status = TaskStatus::InProgress;

    let mut backend = Task::new("Backend API", day(1), day(9));
    backend.status = TaskStatus::InProgress;
    backend.priority = TaskPriority::Urgent;

    let mut review = Task::new("Security review", day(6), day(7));
    review.status = TaskStatus::OnHold;
    review.description = "Waiting on external auditor".to_string();

    let launch = Task::new("Launch", day(12), day(14));

    vec![kickoff, design, backend, review, launch]
}
