//! PNG export of the preview table.

mod fonts;
mod raster;
mod text;

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use image::ImageFormat;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{Result, TimetableError};
use crate::preview::PreviewTable;

pub use fonts::FontSet;

/// Exports are never rendered below this pixel density.
pub const MIN_EXPORT_SCALE: u32 = 2;

const FALLBACK_NAME: &str = "staff";

/// `timetable_<teacher>.png`, or `timetable_staff.png` without a teacher.
pub fn export_file_name(teacher: &str) -> String {
    let name = if teacher.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        teacher
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    };
    format!("timetable_{name}.png")
}

pub fn effective_scale(requested: u32) -> u32 {
    requested.max(MIN_EXPORT_SCALE)
}

pub fn encode_png(table: &PreviewTable, scale: u32, fonts: &FontSet) -> Result<Vec<u8>> {
    let image = raster::render(table, effective_scale(scale), fonts);
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| TimetableError::Export(format!("PNG encode failed: {e}")))?;
    Ok(bytes)
}

/// Renders `table` and writes it to `path`, creating parent folders as needed.
pub fn write_png(
    table: &PreviewTable,
    path: &Path,
    scale: u32,
    fonts: &FontSet,
) -> Result<PathBuf> {
    let bytes = encode_png(table, scale, fonts)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            TimetableError::Export(format!("could not create {}: {e}", parent.display()))
        })?;
    }
    fs::write(path, bytes)
        .map_err(|e| TimetableError::Export(format!("could not write {}: {e}", path.display())))?;
    info!(path = %path.display(), "timetable image saved");
    Ok(path.to_path_buf())
}

/// Writes the image into `dir` under the standard file name for `teacher`.
pub fn export_preview(
    table: &PreviewTable,
    dir: &Path,
    teacher: &str,
    scale: u32,
    fonts: &FontSet,
) -> Result<PathBuf> {
    write_png(table, &dir.join(export_file_name(teacher)), scale, fonts)
}

/// An export running off the UI thread. Poll once per frame until it yields.
pub struct ExportJob {
    target: PathBuf,
    result: Arc<Mutex<Option<Result<PathBuf>>>>,
}

impl ExportJob {
    pub fn spawn(table: PreviewTable, target: PathBuf, scale: u32, fonts: FontSet) -> Self {
        let result = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);
        let path = target.clone();
        let spawned = thread::Builder::new()
            .name("timetable-export".to_string())
            .spawn(move || {
                let outcome = write_png(&table, &path, scale, &fonts);
                if let Err(e) = &outcome {
                    warn!("export failed: {e}");
                }
                *slot.lock() = Some(outcome);
            });
        if let Err(e) = spawned {
            *result.lock() = Some(Err(TimetableError::Export(format!(
                "could not start export: {e}"
            ))));
        }
        Self { target, result }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The finished result, handed out once.
    pub fn poll(&self) -> Option<Result<PathBuf>> {
        self.result.lock().take()
    }
}
