mod app;

use std::path::PathBuf;

use eframe::egui;

use crate::session::Session;
use crate::settings::Settings;
use crate::storage::FileStorage;

pub use app::TimetableApp;

const DEFAULT_WINDOW_SIZE: (f32, f32) = (1280.0, 820.0);

pub fn launch_gui(
    base_path: PathBuf,
    settings: Settings,
    session: Session<FileStorage>,
) -> eframe::Result<()> {
    let (width, height) = settings.ui.window_size.unwrap_or(DEFAULT_WINDOW_SIZE);
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Staff Timetable Maker")
            .with_inner_size([width, height])
            .with_min_inner_size([960.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Staff Timetable Maker",
        native_options,
        Box::new(move |cc| Box::new(TimetableApp::new(cc, base_path, settings, session))),
    )
}
