//! The session controller: one in-memory snapshot, mutated only through [`Action`]s.
//!
//! Every applied action is persisted (once a teacher name is set) and then broadcast to
//! subscribers so front-ends can re-render.

use tracing::{debug, info};

use crate::error::Result;
use crate::model::{CellEdit, Semester, SlotTime, Snapshot, TimetableGrid, Weekday, YearTag};
use crate::storage::{SnapshotRepository, Storage};

pub const CLEAR_SUBJECTS_PROMPT: &str = "Clear all subjects for all years?";
pub const CLEAR_ALL_PROMPT: &str = "Clear ALL data including timetable entries?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Switches the active teacher, loading their stored timetable if one exists.
    SetTeacher(String),
    SetAcademicYear(String),
    SetSemester(Semester),
    AddSubject { year: YearTag, name: String },
    ClearSubjects,
    /// Replaces the whole grid. Not confirmed, unlike the other destructive actions.
    CreateSlots(usize),
    SetSlotTime {
        slot: usize,
        which: SlotTime,
        value: String,
    },
    SetDayCell {
        slot: usize,
        day: Weekday,
        edit: CellEdit,
    },
    GeneratePreview,
    ClearAllData,
}

impl Action {
    /// The question to ask before applying, for destructive actions.
    pub fn confirmation_prompt(&self) -> Option<&'static str> {
        match self {
            Action::ClearSubjects => Some(CLEAR_SUBJECTS_PROMPT),
            Action::ClearAllData => Some(CLEAR_ALL_PROMPT),
            _ => None,
        }
    }
}

/// Interactive yes/no collaborator for destructive actions.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Declined,
}

type Subscriber = Box<dyn FnMut(&Snapshot)>;

pub struct Session<S> {
    state: Snapshot,
    repo: SnapshotRepository<S>,
    subscribers: Vec<Subscriber>,
}

impl<S: Storage> Session<S> {
    /// A blank session. Nothing is read from `repo` until a teacher is set.
    pub fn new(repo: SnapshotRepository<S>) -> Self {
        Self {
            state: Snapshot::default(),
            repo,
            subscribers: Vec::new(),
        }
    }

    /// A session resumed from the active-teacher pointer, as on application start.
    pub fn restore(repo: SnapshotRepository<S>) -> Self {
        let mut session = Self::new(repo);
        if let Some(teacher) = session.repo.current_teacher() {
            session.switch_teacher(teacher);
            info!(teacher = %session.state.teacher(), "restored active timetable");
        }
        session
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn repository(&self) -> &SnapshotRepository<S> {
        &self.repo
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&Snapshot) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Applies one action. Validation failures leave the state untouched.
    pub fn apply(&mut self, action: Action, confirm: &mut dyn Confirm) -> Result<Outcome> {
        if let Some(prompt) = action.confirmation_prompt() {
            if !confirm.confirm(prompt) {
                debug!(?action, "declined");
                return Ok(Outcome::Declined);
            }
        }

        debug!(?action, "applying");
        match action {
            Action::SetTeacher(name) => self.switch_teacher(name),
            Action::SetAcademicYear(year) => self.state.profile.academic_year = year,
            Action::SetSemester(semester) => self.state.profile.semester = semester,
            Action::AddSubject { year, name } => {
                self.state.subjects.add(year, &name)?;
            }
            Action::ClearSubjects => self.state.subjects.clear(),
            Action::CreateSlots(count) => {
                self.state.timetable = TimetableGrid::with_slots(count)?;
            }
            Action::SetSlotTime { slot, which, value } => {
                self.state.timetable.set_slot_time(slot, which, value)?
            }
            Action::SetDayCell { slot, day, edit } => {
                self.state.timetable.set_day_cell(slot, day, edit)?
            }
            Action::GeneratePreview => {}
            Action::ClearAllData => {
                self.clear_all()?;
                self.notify();
                return Ok(Outcome::Applied);
            }
        }

        self.persist()?;
        self.notify();
        Ok(Outcome::Applied)
    }

    fn switch_teacher(&mut self, name: String) {
        self.state.profile.name = name;
        if self.state.teacher().is_empty() {
            return;
        }
        if let Some(stored) = self.repo.load(self.state.teacher()) {
            debug!(teacher = %self.state.teacher(), "loaded stored timetable");
            self.state.adopt(stored);
        }
    }

    /// Storage goes first so a failed removal leaves the session as it was.
    fn clear_all(&mut self) -> Result<()> {
        self.repo.clear_current_teacher()?;
        if !self.state.teacher().is_empty() {
            self.repo.delete(self.state.teacher())?;
        }
        let previous = std::mem::take(&mut self.state);
        info!(teacher = %previous.teacher(), "cleared all timetable data");
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        let teacher = self.state.teacher();
        if teacher.is_empty() {
            return Ok(());
        }
        self.repo.set_current_teacher(teacher)?;
        self.repo.save(&self.state)
    }

    fn notify(&mut self) {
        for subscriber in &mut self.subscribers {
            subscriber(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::TimetableError;
    use crate::model::SessionType;
    use crate::preview::PreviewTable;
    use crate::storage::{MemoryStorage, CURRENT_TEACHER_KEY};

    fn yes(_: &str) -> bool {
        true
    }

    fn no(_: &str) -> bool {
        false
    }

    fn session() -> Session<MemoryStorage> {
        Session::new(SnapshotRepository::new(MemoryStorage::new()))
    }

    fn run(session: &mut Session<MemoryStorage>, actions: Vec<Action>) {
        for action in actions {
            session.apply(action, &mut yes).unwrap();
        }
    }

    #[test]
    fn end_to_end_preview() {
        let mut session = session();
        run(
            &mut session,
            vec![
                Action::SetTeacher("A. Sharma".into()),
                Action::AddSubject {
                    year: YearTag::First,
                    name: "Data Structures".into(),
                },
                Action::CreateSlots(1),
                Action::SetSlotTime {
                    slot: 0,
                    which: SlotTime::Start,
                    value: "09:00".into(),
                },
                Action::SetSlotTime {
                    slot: 0,
                    which: SlotTime::End,
                    value: "10:00".into(),
                },
                Action::SetDayCell {
                    slot: 0,
                    day: Weekday::Monday,
                    edit: CellEdit::Year(Some(YearTag::First)),
                },
                Action::SetDayCell {
                    slot: 0,
                    day: Weekday::Monday,
                    edit: CellEdit::Subject("Data Structures".into()),
                },
                Action::SetDayCell {
                    slot: 0,
                    day: Weekday::Monday,
                    edit: CellEdit::Type(SessionType::Theory),
                },
                Action::GeneratePreview,
            ],
        );

        let preview = PreviewTable::from_snapshot(session.snapshot());
        assert_eq!(preview.rows.len(), 1);
        let row = &preview.rows[0];
        assert_eq!(row.time, "09:00 to 10:00");
        assert_eq!(row.cells[0], "FY Data Structures (Theory)");
        assert!(row.cells[1..].iter().all(String::is_empty));

        let stored = session.repository().load("A. Sharma").unwrap();
        assert_eq!(&stored, session.snapshot());
        assert_eq!(
            session.repository().current_teacher().as_deref(),
            Some("A. Sharma")
        );
    }

    #[test]
    fn nothing_is_persisted_without_a_teacher() {
        let mut session = session();
        run(
            &mut session,
            vec![
                Action::SetAcademicYear("2026-2027".into()),
                Action::CreateSlots(2),
                Action::GeneratePreview,
            ],
        );
        assert_eq!(session.snapshot().timetable.len(), 2);
        assert!(session.repository().storage().is_empty());
    }

    #[test]
    fn blank_subject_leaves_state_and_storage_alone() {
        let mut session = session();
        run(&mut session, vec![Action::SetTeacher("T".into())]);
        let before = session.snapshot().clone();

        let err = session
            .apply(
                Action::AddSubject {
                    year: YearTag::Second,
                    name: "  ".into(),
                },
                &mut yes,
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.snapshot(), &before);
        assert_eq!(session.repository().load("T"), Some(before));
    }

    #[test]
    fn malformed_slot_time_is_rejected() {
        let mut session = session();
        run(
            &mut session,
            vec![Action::SetTeacher("T".into()), Action::CreateSlots(1)],
        );
        let before = session.snapshot().clone();

        let err = session
            .apply(
                Action::SetSlotTime {
                    slot: 0,
                    which: SlotTime::Start,
                    value: "abc".into(),
                },
                &mut yes,
            )
            .unwrap_err();
        assert!(matches!(err, TimetableError::InvalidTime(_)));
        assert!(err.is_validation());
        assert_eq!(session.snapshot(), &before);

        run(
            &mut session,
            vec![Action::SetSlotTime {
                slot: 0,
                which: SlotTime::Start,
                value: "9:30".into(),
            }],
        );
        assert_eq!(session.snapshot().timetable.slot(0).unwrap().time_start, "09:30");
    }

    #[test]
    fn zero_slots_rejected_and_grid_kept() {
        let mut session = session();
        run(&mut session, vec![Action::CreateSlots(4)]);
        let err = session.apply(Action::CreateSlots(0), &mut yes).unwrap_err();
        assert!(matches!(err, TimetableError::InvalidSlotCount(_)));
        assert_eq!(session.snapshot().timetable.len(), 4);
    }

    #[test]
    fn create_slots_replaces_without_asking() {
        let mut session = session();
        run(
            &mut session,
            vec![
                Action::CreateSlots(5),
                Action::SetSlotTime {
                    slot: 4,
                    which: SlotTime::Start,
                    value: "15:00".into(),
                },
            ],
        );
        let outcome = session.apply(Action::CreateSlots(3), &mut no).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(session.snapshot().timetable, TimetableGrid::with_slots(3).unwrap());
    }

    #[test]
    fn unknown_teacher_keeps_current_state() {
        let mut session = session();
        run(
            &mut session,
            vec![
                Action::SetAcademicYear("2027-2028".into()),
                Action::SetSemester(Semester::Second),
                Action::AddSubject {
                    year: YearTag::Third,
                    name: "Optics".into(),
                },
                Action::CreateSlots(2),
            ],
        );
        let before = session.snapshot().clone();

        run(&mut session, vec![Action::SetTeacher("New Person".into())]);

        let after = session.snapshot();
        assert_eq!(after.teacher(), "New Person");
        assert_eq!(after.profile.academic_year, before.profile.academic_year);
        assert_eq!(after.profile.semester, before.profile.semester);
        assert_eq!(after.subjects, before.subjects);
        assert_eq!(after.timetable, before.timetable);
    }

    #[test]
    fn known_teacher_loads_stored_snapshot() {
        let mut session = session();
        run(
            &mut session,
            vec![
                Action::SetTeacher("P. Nair".into()),
                Action::SetSemester(Semester::First),
                Action::CreateSlots(2),
                Action::SetTeacher("Other".into()),
                Action::SetSemester(Semester::Second),
                Action::CreateSlots(6),
                Action::SetTeacher("P. Nair".into()),
            ],
        );
        assert_eq!(session.snapshot().profile.semester, Semester::First);
        assert_eq!(session.snapshot().timetable.len(), 2);
        assert_eq!(
            session.repository().current_teacher().as_deref(),
            Some("P. Nair")
        );
    }

    #[test]
    fn declined_confirmation_changes_nothing() {
        let mut session = session();
        run(
            &mut session,
            vec![
                Action::SetTeacher("D".into()),
                Action::AddSubject {
                    year: YearTag::First,
                    name: "Logic".into(),
                },
            ],
        );
        let before = session.snapshot().clone();

        let mut asked = Vec::new();
        let mut record_no = |prompt: &str| {
            asked.push(prompt.to_string());
            false
        };
        for action in [Action::ClearSubjects, Action::ClearAllData] {
            let outcome = session.apply(action, &mut record_no).unwrap();
            assert_eq!(outcome, Outcome::Declined);
        }
        assert_eq!(asked, [CLEAR_SUBJECTS_PROMPT, CLEAR_ALL_PROMPT]);
        assert_eq!(session.snapshot(), &before);
        assert_eq!(session.repository().load("D"), Some(before));
    }

    #[test]
    fn clear_subjects_after_confirmation() {
        let mut session = session();
        run(
            &mut session,
            vec![
                Action::SetTeacher("E".into()),
                Action::AddSubject {
                    year: YearTag::Second,
                    name: "Statistics".into(),
                },
                Action::ClearSubjects,
            ],
        );
        assert!(session.snapshot().subjects.is_empty());
        assert!(session.repository().load("E").unwrap().subjects.is_empty());
    }

    #[test]
    fn clear_all_data_wipes_state_and_storage() {
        let mut session = session();
        run(
            &mut session,
            vec![
                Action::SetTeacher("F".into()),
                Action::SetAcademicYear("2026-2027".into()),
                Action::CreateSlots(3),
                Action::ClearAllData,
            ],
        );
        assert_eq!(session.snapshot(), &Snapshot::default());
        let storage = session.repository().storage();
        assert_eq!(storage.get_item(CURRENT_TEACHER_KEY).unwrap(), None);
        assert!(storage.is_empty());

        run(&mut session, vec![Action::SetTeacher("F".into())]);
        assert_eq!(session.snapshot().timetable.len(), 0);
        assert!(session.snapshot().profile.academic_year.is_empty());
    }

    /// Accepts writes but refuses every removal.
    #[derive(Default)]
    struct NoRemovals(MemoryStorage);

    impl Storage for NoRemovals {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            self.0.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
            self.0.set_item(key, value)
        }

        fn remove_item(&mut self, _key: &str) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[test]
    fn failed_clear_all_keeps_memory_and_storage_in_step() {
        let mut session = Session::new(SnapshotRepository::new(NoRemovals::default()));
        session.apply(Action::SetTeacher("K".into()), &mut yes).unwrap();
        session.apply(Action::CreateSlots(2), &mut yes).unwrap();
        let before = session.snapshot().clone();

        let err = session.apply(Action::ClearAllData, &mut yes).unwrap_err();
        assert!(matches!(err, TimetableError::Storage(_)));
        assert_eq!(session.snapshot(), &before);
        assert_eq!(session.repository().load("K"), Some(before));
        assert_eq!(session.repository().current_teacher().as_deref(), Some("K"));
    }

    #[test]
    fn restore_follows_active_pointer() {
        let mut first = session();
        run(
            &mut first,
            vec![
                Action::SetTeacher("G".into()),
                Action::AddSubject {
                    year: YearTag::First,
                    name: "Botany".into(),
                },
            ],
        );
        let saved = first.snapshot().clone();

        let mut storage = MemoryStorage::new();
        for key in [CURRENT_TEACHER_KEY, "timetable_G"] {
            let value = first.repository().storage().get_item(key).unwrap().unwrap();
            storage.set_item(key, &value).unwrap();
        }

        let resumed = Session::restore(SnapshotRepository::new(storage));
        assert_eq!(resumed.snapshot(), &saved);
    }

    #[test]
    fn subscribers_see_each_applied_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut session = session();
        let sink = Rc::clone(&seen);
        session.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.timetable.len()));

        run(&mut session, vec![Action::CreateSlots(2), Action::CreateSlots(4)]);
        let _ = session.apply(Action::CreateSlots(0), &mut yes);
        session.apply(Action::ClearAllData, &mut no).unwrap();

        assert_eq!(*seen.borrow(), [2, 4]);
    }
}
