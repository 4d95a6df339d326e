use crate::export::{export_file_name, ExportJob, FontSet};
use crate::model::{
    current_academic_year_options, parse_slot_count, CellEdit, DayCell, Semester, SessionType,
    SlotTime, Weekday, YearTag,
};
use crate::preview::PreviewTable;
use crate::session::{Action, Session};
use crate::settings::{save_settings, Settings};
use crate::storage::FileStorage;
use crate::subjects::SubjectRegistry;
use crate::theme::{
    apply_theme, ensure_theme_files, load_presets, parse_color, resolve_theme, ThemeConfig,
};
use eframe::{
    egui::{
        self, menu, Align2, Button, CentralPanel, ComboBox, Context, Grid, RichText, ScrollArea,
        TextEdit, TopBottomPanel,
    },
    App, CreationContext,
};
use rfd::FileDialog;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

const TIME_INPUT_WIDTH: f32 = 56.0;
const CELL_COMBO_WIDTH: f32 = 132.0;

pub struct TimetableApp {
    settings: Settings,
    base_path: PathBuf,
    session: Session<FileStorage>,
    theme: ThemeConfig,
    presets: Vec<ThemeConfig>,
    academic_years: Vec<String>,
    teacher_input: String,
    subject_year: YearTag,
    subject_input: String,
    slot_count_input: String,
    pending_confirmation: Option<Action>,
    alert: Option<String>,
    status: Option<String>,
    export_jobs: Vec<ExportJob>,
    export_fonts: FontSet,
    /// Slot times being typed, keyed by slot and end. Committed when the field loses focus.
    time_drafts: HashMap<(usize, SlotTime), String>,
}

impl TimetableApp {
    pub fn new(
        cc: &CreationContext<'_>,
        base_path: PathBuf,
        settings: Settings,
        session: Session<FileStorage>,
    ) -> Self {
        if let Err(e) = ensure_theme_files(&base_path) {
            warn!("could not write theme presets: {e}");
        }
        let presets = load_presets(&base_path);
        let theme = resolve_theme(&presets, settings.ui.last_theme.as_deref());
        apply_theme(&theme, &cc.egui_ctx);

        let teacher_input = session.snapshot().teacher().to_string();
        let slot_count_input = settings.default_slot_count.to_string();
        let export_fonts = FontSet::for_export(&settings.export.font_files);

        Self {
            settings,
            base_path,
            session,
            theme,
            presets,
            academic_years: current_academic_year_options(),
            teacher_input,
            subject_year: YearTag::First,
            subject_input: String::new(),
            slot_count_input,
            pending_confirmation: None,
            alert: None,
            status: None,
            export_jobs: Vec::new(),
            export_fonts,
            time_drafts: HashMap::new(),
        }
    }

    /// Destructive actions wait for the confirmation window; the rest apply now.
    fn request(&mut self, action: Action) {
        if action.confirmation_prompt().is_some() {
            self.pending_confirmation = Some(action);
        } else {
            self.dispatch(action);
        }
    }

    fn dispatch(&mut self, action: Action) {
        let added_subject = matches!(action, Action::AddSubject { .. });
        if matches!(
            action,
            Action::SetTeacher(_) | Action::CreateSlots(_) | Action::ClearAllData
        ) {
            self.time_drafts.clear();
        }
        match self.session.apply(action, &mut |_: &str| true) {
            Ok(_) => {
                if added_subject {
                    self.subject_input.clear();
                }
            }
            Err(e) if e.is_validation() => self.alert = Some(e.to_string()),
            Err(e) => {
                warn!("timetable update failed: {e}");
                self.status = Some(format!("Could not save: {e}"));
            }
        }
        self.teacher_input = self.session.snapshot().teacher().to_string();
    }

    fn switch_theme(&mut self, name: &str, ctx: &Context) {
        self.theme = resolve_theme(&self.presets, Some(name));
        apply_theme(&self.theme, ctx);
        self.settings.ui.last_theme = Some(self.theme.name.clone());
        if let Err(e) = save_settings(&self.settings, &self.base_path) {
            self.status = Some(format!("Failed to save settings: {e}"));
        }
    }

    fn danger_button(&self, label: &str) -> Button<'static> {
        Button::new(RichText::new(label.to_string()).color(egui::Color32::WHITE))
            .fill(parse_color(&self.theme.danger))
    }

    fn render_menu_bar(&mut self, ctx: &Context, ui: &mut egui::Ui) {
        menu::bar(ui, |ui| {
            ui.menu_button("View", |ui| {
                ui.label(RichText::new("Theme").strong());
                let names: Vec<String> = self.presets.iter().map(|p| p.name.clone()).collect();
                for name in names {
                    let active = self.theme.name == name;
                    if ui.selectable_label(active, &name).clicked() {
                        self.switch_theme(&name, ctx);
                        ui.close_menu();
                    }
                }
            });
            ui.menu_button("Help", |ui| {
                ui.label("Staff Individual Time Table Generator");
                ui.label(format!("Data path: {}", self.base_path.display()));
                ui.label(format!(
                    "Saved timetables: {}",
                    self.session.repository().storage().path().display()
                ));
                ui.label(format!("Exports: {}", self.settings.export_dir().display()));
            });
        });
    }

    fn render_teacher_details(&mut self, ui: &mut egui::Ui) {
        ui.heading("Teacher Details");
        ui.horizontal(|ui| {
            ui.label("Teacher:");
            let response =
                ui.add(TextEdit::singleline(&mut self.teacher_input).hint_text("Teacher Name"));
            if response.changed() {
                let name = self.teacher_input.clone();
                self.dispatch(Action::SetTeacher(name));
            }
        });

        let profile = self.session.snapshot().profile.clone();

        let mut academic_year = profile.academic_year.clone();
        ui.horizontal(|ui| {
            ui.label("Academic Year:");
            let shown = if academic_year.is_empty() {
                "Select Year (Optional)".to_string()
            } else {
                academic_year.clone()
            };
            ComboBox::from_id_source("academic_year")
                .selected_text(shown)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut academic_year, String::new(), "Select Year (Optional)");
                    for year in &self.academic_years {
                        ui.selectable_value(&mut academic_year, year.clone(), year.as_str());
                    }
                });
        });
        if academic_year != profile.academic_year {
            self.dispatch(Action::SetAcademicYear(academic_year));
        }

        let mut semester = profile.semester;
        ui.horizontal(|ui| {
            ui.label("Semester:");
            ComboBox::from_id_source("semester")
                .selected_text(semester.label())
                .show_ui(ui, |ui| {
                    for option in Semester::ALL {
                        ui.selectable_value(&mut semester, option, option.label());
                    }
                });
        });
        if semester != profile.semester {
            self.dispatch(Action::SetSemester(semester));
        }
    }

    fn render_subjects(&mut self, ui: &mut egui::Ui) {
        ui.heading("Subject Management");
        let mut add_clicked = false;
        ui.horizontal(|ui| {
            ui.label("Year:");
            ComboBox::from_id_source("subject_year")
                .selected_text(self.subject_year.label())
                .show_ui(ui, |ui| {
                    for year in YearTag::ALL {
                        ui.selectable_value(&mut self.subject_year, year, year.label());
                    }
                });
            ui.label("Subject:");
            let input = ui.add(
                TextEdit::singleline(&mut self.subject_input).hint_text("Enter subject name"),
            );
            let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Add Subject").clicked() || submitted {
                add_clicked = true;
            }
        });
        if add_clicked {
            self.dispatch(Action::AddSubject {
                year: self.subject_year,
                name: self.subject_input.clone(),
            });
        }

        ui.horizontal(|ui| {
            ui.label(RichText::new("Added Subjects").strong());
            if ui.add(self.danger_button("Clear All")).clicked() {
                self.request(Action::ClearSubjects);
            }
        });
        for (year, subjects) in self.session.snapshot().subjects.iter() {
            if !subjects.is_empty() {
                ui.label(format!("{year}: {}", subjects.join(", ")));
            }
        }

        ui.separator();
        let mut create_clicked = false;
        ui.horizontal(|ui| {
            ui.label("No. of Time Slots:");
            ui.add(TextEdit::singleline(&mut self.slot_count_input).desired_width(48.0));
            create_clicked = ui.button("Create Time Slots").clicked();
        });
        if create_clicked {
            match parse_slot_count(&self.slot_count_input) {
                Ok(count) => self.dispatch(Action::CreateSlots(count)),
                Err(e) => self.alert = Some(e.to_string()),
            }
        }
    }

    fn render_editor(&mut self, ui: &mut egui::Ui) {
        ui.heading("Timetable Editor");
        let snapshot = self.session.snapshot();
        let timetable = snapshot.timetable.clone();
        let subjects = snapshot.subjects.clone();
        let mut edits = Vec::new();
        let muted = self.theme.muted();
        let drafts = &mut self.time_drafts;

        if timetable.is_empty() {
            ui.label("No time slots yet. Choose a count above and press \"Create Time Slots\".");
        } else {
            ScrollArea::horizontal()
                .id_source("editor_scroll")
                .show(ui, |ui| {
                    Grid::new("timetable_editor")
                        .striped(true)
                        .num_columns(PreviewTable::column_headers().len())
                        .show(ui, |ui| {
                            for header in PreviewTable::column_headers() {
                                ui.label(RichText::new(header).strong());
                            }
                            ui.end_row();

                            for (index, slot) in timetable.slots().iter().enumerate() {
                                ui.horizontal(|ui| {
                                    for which in [SlotTime::Start, SlotTime::End] {
                                        let key = (index, which);
                                        let mut text = drafts
                                            .get(&key)
                                            .cloned()
                                            .unwrap_or_else(|| slot.time(which).to_string());
                                        let edit = ui.add(
                                            TextEdit::singleline(&mut text)
                                                .desired_width(TIME_INPUT_WIDTH)
                                                .hint_text("HH:MM"),
                                        );
                                        if edit.changed() {
                                            drafts.insert(key, text);
                                        }
                                        // Checked once the field is left, not per keystroke.
                                        if edit.lost_focus() {
                                            if let Some(value) = drafts.remove(&key) {
                                                edits.push(Action::SetSlotTime {
                                                    slot: index,
                                                    which,
                                                    value,
                                                });
                                            }
                                        }
                                        if which == SlotTime::Start {
                                            ui.label("to");
                                        }
                                    }
                                });
                                for day in Weekday::ALL {
                                    cell_editor(
                                        ui,
                                        index,
                                        day,
                                        slot.cell(day),
                                        &subjects,
                                        muted,
                                        &mut edits,
                                    );
                                }
                                ui.end_row();
                            }
                        });
                });
        }

        if ui.button("Generate Preview").clicked() {
            edits.push(Action::GeneratePreview);
            self.status = Some("Preview updated and saved.".to_string());
        }
        for action in edits {
            self.dispatch(action);
        }
    }

    fn render_preview(&mut self, ui: &mut egui::Ui) {
        ui.heading("Generated Timetable");
        let table = PreviewTable::from_snapshot(self.session.snapshot());
        if let Some(heading) = &table.heading {
            ui.label(RichText::new(heading).strong());
        }
        ScrollArea::horizontal()
            .id_source("preview_scroll")
            .show(ui, |ui| {
                Grid::new("timetable_preview")
                    .striped(true)
                    .min_col_width(90.0)
                    .num_columns(PreviewTable::column_headers().len())
                    .show(ui, |ui| {
                        for (r, line) in table.grid().iter().enumerate() {
                            for text in line {
                                if r == 0 {
                                    ui.label(RichText::new(*text).strong());
                                } else {
                                    ui.label(*text);
                                }
                            }
                            ui.end_row();
                        }
                    });
            });

        ui.horizontal(|ui| {
            let exporting = !self.export_jobs.is_empty();
            if ui.button("Save as Image").clicked() {
                self.start_export(table.clone());
            }
            if ui.add(self.danger_button("Clear All Data")).clicked() {
                self.request(Action::ClearAllData);
            }
            if exporting {
                ui.spinner();
            }
        });
    }

    fn start_export(&mut self, table: PreviewTable) {
        let file_name = export_file_name(self.session.snapshot().teacher());
        let export_dir = self.settings.export_dir();
        let target = FileDialog::new()
            .set_file_name(&file_name)
            .set_directory(&export_dir)
            .add_filter("PNG image", &["png"])
            .save_file();
        if let Some(target) = target {
            let job = ExportJob::spawn(
                table,
                target,
                self.settings.export.scale,
                self.export_fonts.clone(),
            );
            self.status = Some(format!("Saving {}...", job.target().display()));
            self.export_jobs.push(job);
        }
    }

    fn poll_export(&mut self, ctx: &Context) {
        if self.export_jobs.is_empty() {
            return;
        }
        let mut finished = Vec::new();
        self.export_jobs.retain(|job| match job.poll() {
            Some(result) => {
                finished.push(result);
                false
            }
            None => true,
        });
        for result in finished {
            self.status = Some(match result {
                Ok(path) => format!("Saved {}", path.display()),
                Err(e) => e.to_string(),
            });
        }
        if !self.export_jobs.is_empty() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn render_confirmation(&mut self, ctx: &Context) {
        let Some(prompt) = self
            .pending_confirmation
            .as_ref()
            .and_then(Action::confirmation_prompt)
        else {
            return;
        };
        let mut answer = None;
        egui::Window::new("Please confirm")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(prompt);
                ui.horizontal(|ui| {
                    if ui.add(self.danger_button("OK")).clicked() {
                        answer = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(false);
                    }
                });
            });
        match answer {
            Some(true) => {
                if let Some(action) = self.pending_confirmation.take() {
                    self.dispatch(action);
                }
            }
            Some(false) => self.pending_confirmation = None,
            None => {}
        }
    }

    fn render_alert(&mut self, ctx: &Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.alert = None;
                }
            });
    }
}

fn cell_editor(
    ui: &mut egui::Ui,
    slot: usize,
    day: Weekday,
    cell: &DayCell,
    subjects: &SubjectRegistry,
    muted: egui::Color32,
    edits: &mut Vec<Action>,
) {
    let mut push = |edit: CellEdit| edits.push(Action::SetDayCell { slot, day, edit });
    ui.vertical(|ui| {
        let mut year = cell.year;
        ComboBox::from_id_source(("cell_year", slot, day.index()))
            .width(CELL_COMBO_WIDTH)
            .selected_text(year.map(YearTag::as_str).unwrap_or("Select Year"))
            .show_ui(ui, |ui| {
                for tag in YearTag::ALL {
                    ui.selectable_value(&mut year, Some(tag), tag.as_str());
                }
            });
        if year != cell.year {
            push(CellEdit::Year(year));
        }

        let mut subject = cell.subject.clone();
        ui.add_enabled_ui(cell.year.is_some(), |ui| {
            let shown = if subject.is_empty() {
                "Select Subject".to_string()
            } else {
                subject.clone()
            };
            ComboBox::from_id_source(("cell_subject", slot, day.index()))
                .width(CELL_COMBO_WIDTH)
                .selected_text(shown)
                .show_ui(ui, |ui| {
                    let offered = cell.year.map(|y| subjects.subjects(y)).unwrap_or_default();
                    if offered.is_empty() {
                        ui.label(RichText::new("No subjects available").color(muted));
                    }
                    for name in offered {
                        ui.selectable_value(&mut subject, name.clone(), name.as_str());
                    }
                });
        });
        if subject != cell.subject {
            push(CellEdit::Subject(subject));
        }

        let mut kind = cell.kind;
        let shown = if kind.is_unset() { "Select Type" } else { kind.as_str() };
        ComboBox::from_id_source(("cell_type", slot, day.index()))
            .width(CELL_COMBO_WIDTH)
            .selected_text(shown)
            .show_ui(ui, |ui| {
                for option in SessionType::CHOICES {
                    ui.selectable_value(&mut kind, option, option.as_str());
                }
            });
        if kind != cell.kind {
            push(CellEdit::Type(kind));
        }
    });
}

impl App for TimetableApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_export(ctx);

        TopBottomPanel::top("menu_bar").show(ctx, |ui| self.render_menu_bar(ctx, ui));

        TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let teacher = self.session.snapshot().teacher();
                if teacher.is_empty() {
                    ui.label(
                        RichText::new("Enter a teacher name to save your timetable.")
                            .color(self.theme.muted()),
                    );
                } else {
                    ui.label(format!("Saving as: {teacher}"));
                }
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    ui.heading(RichText::new("Staff Individual Time Table Generator").size(
                        self.theme.font_size_base + 10.0,
                    ));
                    ui.separator();
                    ui.group(|ui| self.render_teacher_details(ui));
                    ui.add_space(8.0);
                    ui.group(|ui| self.render_subjects(ui));
                    ui.add_space(8.0);
                    ui.group(|ui| self.render_editor(ui));
                    ui.add_space(8.0);
                    ui.group(|ui| self.render_preview(ui));
                });
        });

        self.render_confirmation(ctx);
        self.render_alert(ctx);
    }
}
