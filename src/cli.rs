use std::io::{self, Write};

use crate::export::{export_preview, FontSet};
use crate::model::{
    current_academic_year_options, parse_slot_count, parse_slot_time, CellEdit, Semester,
    SessionType, SlotTime, Weekday, YearTag,
};
use crate::preview::PreviewTable;
use crate::session::{Action, Outcome, Session};
use crate::settings::Settings;
use crate::storage::Storage;

const HELP: &str = "\
Commands:
  teacher [name]                 set the teacher (loads their saved timetable)
  year [YYYY-YYYY]               set the academic year (blank clears)
  semester [1|2]                 set the semester (blank clears)
  subject <FY|SY|TY> <name>      add a subject for a year
  subjects                       list subjects
  clear_subjects                 remove every subject (asks first)
  slots [n]                      create n empty time slots (replaces the grid)
  time <slot> <HH:MM> <HH:MM>    set a slot's start and end ('-' clears)
  cell <slot> <day> <year|-> <Theory|Practical|-> [subject]
                                 fill one day cell
  preview                        show the timetable
  generate                       save and show the timetable
  export                         save the timetable as a PNG
  clear_all                      wipe all data for this teacher (asks first)
  help
  exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Apply(Vec<Action>),
    ListSubjects,
    Preview,
    Export,
    Help,
    Exit,
}

/// Parses one console line. `Ok(None)` for a blank line.
pub fn parse_command(
    line: &str,
    default_slots: usize,
    subjects_for: impl Fn(YearTag) -> Vec<String>,
) -> Result<Option<Command>, String> {
    let raw = line.trim_end_matches(['\r', '\n']);
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    let command = match cmd.to_lowercase().as_str() {
        "teacher" => Command::Apply(vec![Action::SetTeacher(rest.to_string())]),
        "year" => {
            if !rest.is_empty() && !current_academic_year_options().iter().any(|y| y == rest) {
                return Err(format!(
                    "Academic year must be one of: {}",
                    current_academic_year_options().join(", ")
                ));
            }
            Command::Apply(vec![Action::SetAcademicYear(rest.to_string())])
        }
        "semester" => Command::Apply(vec![Action::SetSemester(parse_semester(rest)?)]),
        "subject" => {
            let (year, name) = subject_args(raw).ok_or("Usage: subject <FY|SY|TY> <name>")?;
            Command::Apply(vec![Action::AddSubject {
                year: parse_year(year)?,
                name: name.to_string(),
            }])
        }
        "subjects" => Command::ListSubjects,
        "clear_subjects" => Command::Apply(vec![Action::ClearSubjects]),
        "slots" => {
            let count = if rest.is_empty() {
                default_slots
            } else {
                parse_slot_count(rest).map_err(|e| e.to_string())?
            };
            Command::Apply(vec![Action::CreateSlots(count)])
        }
        "time" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let [slot, start, end] = parts.as_slice() else {
                return Err("Usage: time <slot> <HH:MM> <HH:MM>".to_string());
            };
            let slot = parse_slot_number(slot)?;
            Command::Apply(vec![
                Action::SetSlotTime {
                    slot,
                    which: SlotTime::Start,
                    value: parse_time(start)?,
                },
                Action::SetSlotTime {
                    slot,
                    which: SlotTime::End,
                    value: parse_time(end)?,
                },
            ])
        }
        "cell" => parse_cell(rest, subjects_for)?,
        "preview" | "show" => Command::Preview,
        "generate" => Command::Apply(vec![Action::GeneratePreview]),
        "export" => Command::Export,
        "clear_all" => Command::Apply(vec![Action::ClearAllData]),
        "help" | "?" => Command::Help,
        "exit" | "quit" => Command::Exit,
        other => return Err(format!("Unknown command '{other}'. Type 'help'.")),
    };
    Ok(Some(command))
}

fn parse_cell(
    rest: &str,
    subjects_for: impl Fn(YearTag) -> Vec<String>,
) -> Result<Command, String> {
    const USAGE: &str = "Usage: cell <slot> <day> <year|-> <Theory|Practical|-> [subject]";
    let mut parts = rest.splitn(5, char::is_whitespace).map(str::trim);
    let (Some(slot), Some(day), Some(year), Some(kind)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(USAGE.to_string());
    };
    let subject = parts.next().unwrap_or("").trim();

    let slot = parse_slot_number(slot)?;
    let day = Weekday::parse(day).ok_or_else(|| format!("Unknown day '{day}'"))?;
    let year = if year == "-" {
        None
    } else {
        Some(parse_year(year)?)
    };
    let kind = match kind.to_lowercase().as_str() {
        "-" => SessionType::Unset,
        "theory" => SessionType::Theory,
        "practical" => SessionType::Practical,
        other => return Err(format!("Unknown session type '{other}'")),
    };

    let mut actions = vec![
        Action::SetDayCell {
            slot,
            day,
            edit: CellEdit::Year(year),
        },
        Action::SetDayCell {
            slot,
            day,
            edit: CellEdit::Type(kind),
        },
    ];
    if !subject.is_empty() {
        let Some(year) = year else {
            return Err("Pick a year before choosing a subject".to_string());
        };
        if !subjects_for(year).iter().any(|s| s == subject) {
            return Err(format!("No subject '{subject}' for {year}. Add it with 'subject'."));
        }
        actions.push(Action::SetDayCell {
            slot,
            day,
            edit: CellEdit::Subject(subject.to_string()),
        });
    }
    Ok(Command::Apply(actions))
}

/// Splits `subject <year> <name>`. The name is everything after the separator
/// following the year, spacing included, and may be blank.
fn subject_args(raw: &str) -> Option<(&str, &str)> {
    let (_, args) = raw.trim_start().split_once(char::is_whitespace)?;
    let args = args.trim_start();
    match args.split_once(char::is_whitespace) {
        Some(split) => Some(split),
        None if !args.is_empty() => Some((args, "")),
        None => None,
    }
}

fn parse_year(raw: &str) -> Result<YearTag, String> {
    YearTag::from_tag(&raw.to_uppercase()).ok_or_else(|| format!("Year must be FY, SY or TY (got '{raw}')"))
}

fn parse_semester(raw: &str) -> Result<Semester, String> {
    match raw.to_lowercase().trim_start_matches("sem").trim() {
        "" => Ok(Semester::Unset),
        "1" => Ok(Semester::First),
        "2" => Ok(Semester::Second),
        _ => Err(format!("Semester must be 1 or 2 (got '{raw}')")),
    }
}

/// One-based on the console, zero-based in the model.
fn parse_slot_number(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Slot must be a number from 1 (got '{raw}')")),
    }
}

/// Normalises to HH:MM; "-" clears the time.
fn parse_time(raw: &str) -> Result<String, String> {
    if raw == "-" {
        return Ok(String::new());
    }
    parse_slot_time(raw).map_err(|e| e.to_string())
}

fn ask_yes_no(question: &str) -> bool {
    print!("{question} (y/N): ");
    io::stdout().flush().ok();
    let mut buf = String::new();
    if io::stdin().read_line(&mut buf).is_err() {
        return false;
    }
    buf.trim().to_lowercase().starts_with('y')
}

fn print_subjects<S: Storage>(session: &Session<S>) {
    let subjects = &session.snapshot().subjects;
    if subjects.is_empty() {
        println!("No subjects added yet.");
        return;
    }
    for (year, list) in subjects.iter() {
        if !list.is_empty() {
            println!("{year}: {}", list.join(", "));
        }
    }
}

fn print_preview<S: Storage>(session: &Session<S>) {
    let table = PreviewTable::from_snapshot(session.snapshot());
    if table.rows.is_empty() {
        println!("No time slots yet. Use 'slots <n>' to create some.");
    }
    println!("\n{}", table.to_text());
}

pub fn run_cli<S: Storage>(session: &mut Session<S>, settings: &Settings) {
    println!("Staff Individual Time Table Generator (console)");
    println!("Data path: {}", settings.base_path);
    println!("Type 'help' for commands, 'exit' to quit.\n");

    session.subscribe(|snapshot| {
        if !snapshot.teacher().is_empty() {
            tracing::debug!(
                teacher = %snapshot.teacher(),
                slots = snapshot.timetable.len(),
                subjects = snapshot.subjects.len(),
                "timetable updated"
            );
        }
    });

    let mut export_fonts: Option<FontSet> = None;

    loop {
        let teacher = session.snapshot().teacher();
        let label = if teacher.is_empty() { "no teacher" } else { teacher };
        print!("[{label}] timetable> ");
        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                println!("Error reading input ({e}). Exiting.");
                break;
            }
        }

        let subjects = session.snapshot().subjects.clone();
        let parsed = parse_command(&input, settings.default_slot_count, |year| {
            subjects.subjects(year).to_vec()
        });
        let command = match parsed {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };

        match command {
            Command::Apply(actions) => {
                let show_preview = actions.contains(&Action::GeneratePreview);
                for action in actions {
                    match session.apply(action, &mut ask_yes_no) {
                        Ok(Outcome::Applied) => {}
                        Ok(Outcome::Declined) => {
                            println!("Cancelled.");
                            break;
                        }
                        Err(e) => {
                            println!("{e}");
                            break;
                        }
                    }
                }
                if show_preview {
                    print_preview(session);
                }
            }
            Command::ListSubjects => print_subjects(session),
            Command::Preview => print_preview(session),
            Command::Export => {
                let table = PreviewTable::from_snapshot(session.snapshot());
                let fonts = export_fonts
                    .get_or_insert_with(|| FontSet::for_export(&settings.export.font_files));
                match export_preview(
                    &table,
                    &settings.export_dir(),
                    session.snapshot().teacher(),
                    settings.export.scale,
                    fonts,
                ) {
                    Ok(path) => println!("Saved {}", path.display()),
                    Err(e) => println!("{e}"),
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Exit => {
                println!("Goodbye");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Option<Command>, String> {
        parse_command(line, 5, |year| match year {
            YearTag::First => vec!["Data Structures".to_string()],
            _ => Vec::new(),
        })
    }

    fn actions(line: &str) -> Vec<Action> {
        match parse(line) {
            Ok(Some(Command::Apply(actions))) => actions,
            other => panic!("{line:?} parsed to {other:?}"),
        }
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse("   "), Ok(None));
        assert!(parse("dance").is_err());
        assert_eq!(parse("EXIT"), Ok(Some(Command::Exit)));
    }

    #[test]
    fn teacher_names_keep_spaces() {
        assert_eq!(
            actions("teacher A. Sharma"),
            [Action::SetTeacher("A. Sharma".into())]
        );
        assert_eq!(actions("teacher"), [Action::SetTeacher(String::new())]);
    }

    #[test]
    fn subject_and_slots() {
        assert_eq!(
            actions("subject fy Data Structures"),
            [Action::AddSubject {
                year: YearTag::First,
                name: "Data Structures".into()
            }]
        );
        assert!(parse("subject XY Maths").is_err());
        assert!(parse("subject").is_err());
        assert_eq!(actions("slots"), [Action::CreateSlots(5)]);
        assert_eq!(actions("slots 3"), [Action::CreateSlots(3)]);
        assert!(parse("slots 0").is_err());
        assert!(parse("slots many").is_err());
    }

    #[test]
    fn subject_names_are_kept_as_typed() {
        assert_eq!(
            actions("subject SY  Lab Work \n"),
            [Action::AddSubject {
                year: YearTag::Second,
                name: " Lab Work ".into()
            }]
        );
        assert_eq!(
            actions("subject FY"),
            [Action::AddSubject {
                year: YearTag::First,
                name: String::new()
            }]
        );
        assert_eq!(
            actions("subject TY   "),
            [Action::AddSubject {
                year: YearTag::Third,
                name: "  ".into()
            }]
        );
    }

    #[test]
    fn time_is_normalised() {
        assert_eq!(
            actions("time 1 9:05 -"),
            [
                Action::SetSlotTime {
                    slot: 0,
                    which: SlotTime::Start,
                    value: "09:05".into()
                },
                Action::SetSlotTime {
                    slot: 0,
                    which: SlotTime::End,
                    value: String::new()
                },
            ]
        );
        assert!(parse("time 1 25:00 10:00").is_err());
        assert!(parse("time 0 09:00 10:00").is_err());
        assert!(parse("time 1 09:00").is_err());
    }

    #[test]
    fn cell_requires_known_subject_for_year() {
        let parsed = actions("cell 1 mon FY Theory Data Structures");
        assert_eq!(parsed.len(), 3);
        assert_eq!(
            parsed[2],
            Action::SetDayCell {
                slot: 0,
                day: Weekday::Monday,
                edit: CellEdit::Subject("Data Structures".into())
            }
        );
        assert!(parse("cell 1 mon SY Theory Data Structures").is_err());
        assert!(parse("cell 1 mon - Theory Data Structures").is_err());
        assert_eq!(actions("cell 2 sat - -").len(), 2);
        assert!(parse("cell 1 sun FY Theory").is_err());
        assert!(parse("cell 1 mon FY Lecture").is_err());
    }

    #[test]
    fn semester_forms() {
        assert_eq!(actions("semester 2"), [Action::SetSemester(Semester::Second)]);
        assert_eq!(actions("semester Sem 1"), [Action::SetSemester(Semester::First)]);
        assert_eq!(actions("semester"), [Action::SetSemester(Semester::Unset)]);
        assert!(parse("semester 3").is_err());
    }

    #[test]
    fn academic_year_must_be_offered() {
        let offered = current_academic_year_options().remove(0);
        assert_eq!(
            actions(&format!("year {offered}")),
            [Action::SetAcademicYear(offered)]
        );
        assert!(parse("year 1999-2000").is_err());
        assert_eq!(actions("year"), [Action::SetAcademicYear(String::new())]);
    }
}
