#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use timeline_planner::{app, logging, TimelineConfig};

fn main() -> eframe::Result<()> {
    logging::init();
    let config = TimelineConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Timeline Planner"),
        ..Default::default()
    };

    eframe::run_native(
        "Timeline Planner",
        options,
        Box::new(|cc| Ok(Box::new(app::PlannerApp::new(cc, config)))),
    )
}
