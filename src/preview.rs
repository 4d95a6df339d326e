use crate::model::{DayCell, SlotTime, Snapshot, TimeSlot, Weekday, DAYS_PER_WEEK};

pub const TIME_COLUMN_HEADER: &str = "Time Slot";

/// Width cap for a console column; longer text is cut with an ellipsis.
const TEXT_COLUMN_MAX: usize = 28;

/// The composed timetable as it is shown and exported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewTable {
    pub heading: Option<String>,
    pub rows: Vec<PreviewRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewRow {
    pub time: String,
    pub cells: [String; DAYS_PER_WEEK],
}

impl PreviewTable {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            heading: heading(snapshot),
            rows: snapshot.timetable.slots().iter().map(preview_row).collect(),
        }
    }

    /// "Time Slot", then Monday..Saturday.
    pub fn column_headers() -> [&'static str; DAYS_PER_WEEK + 1] {
        let mut headers = [TIME_COLUMN_HEADER; DAYS_PER_WEEK + 1];
        for day in Weekday::ALL {
            headers[day.index() + 1] = day.label();
        }
        headers
    }

    /// Header row followed by each slot row, as plain strings.
    pub fn grid(&self) -> Vec<Vec<&str>> {
        let mut grid = vec![Self::column_headers().to_vec()];
        for row in &self.rows {
            let mut line = Vec::with_capacity(DAYS_PER_WEEK + 1);
            line.push(row.time.as_str());
            line.extend(row.cells.iter().map(String::as_str));
            grid.push(line);
        }
        grid
    }

    /// Fixed-width rendering for the console.
    pub fn to_text(&self) -> String {
        let grid = self.grid();
        let widths: Vec<usize> = (0..=DAYS_PER_WEEK)
            .map(|col| {
                grid.iter()
                    .map(|line| line[col].chars().count().min(TEXT_COLUMN_MAX))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        if let Some(heading) = &self.heading {
            out.push_str(heading);
            out.push('\n');
        }
        for (i, line) in grid.iter().enumerate() {
            let cells: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(text, &width)| {
                    format!("{:<width$}", truncate_for_table(text, TEXT_COLUMN_MAX))
                })
                .collect();
            out.push_str(cells.join(" | ").trim_end());
            out.push('\n');
            if i == 0 {
                let rule_len = widths.iter().sum::<usize>() + 3 * DAYS_PER_WEEK;
                out.push_str(&"-".repeat(rule_len));
                out.push('\n');
            }
        }
        out
    }
}

fn heading(snapshot: &Snapshot) -> Option<String> {
    let profile = &snapshot.profile;
    let mut parts = Vec::new();
    if !profile.name.is_empty() {
        parts.push(format!("Teacher: {}", profile.name));
    }
    if !profile.academic_year.is_empty() {
        parts.push(format!("Academic Year: {}", profile.academic_year));
    }
    if !profile.semester.is_unset() {
        parts.push(format!("Semester: {}", profile.semester.as_str()));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

fn preview_row(slot: &TimeSlot) -> PreviewRow {
    PreviewRow {
        time: time_range(slot),
        cells: std::array::from_fn(|i| cell_text(&slot.days[i])),
    }
}

/// "09:00 to 10:00", or empty unless both ends are set.
pub fn time_range(slot: &TimeSlot) -> String {
    let (start, end) = (slot.time(SlotTime::Start), slot.time(SlotTime::End));
    if start.is_empty() || end.is_empty() {
        String::new()
    } else {
        format!("{start} to {end}")
    }
}

/// Year, subject and "(type)", skipping whatever is unset.
pub fn cell_text(cell: &DayCell) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);
    if let Some(year) = cell.year {
        parts.push(year.as_str().to_string());
    }
    if !cell.subject.is_empty() {
        parts.push(cell.subject.clone());
    }
    if !cell.kind.is_unset() {
        parts.push(format!("({})", cell.kind.as_str()));
    }
    parts.join(" ")
}

fn truncate_for_table(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_len.saturating_sub(1)).collect();
    out.push('…');
    out
}
