use std::fmt;

use chrono::{Datelike, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};
use crate::subjects::SubjectRegistry;

/// Number of teaching days per row, Monday through Saturday.
pub const DAYS_PER_WEEK: usize = 6;

/// How many academic years the year picker offers.
pub const ACADEMIC_YEAR_CHOICES: i32 = 5;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum YearTag {
    #[serde(rename = "FY")]
    First,
    #[serde(rename = "SY")]
    Second,
    #[serde(rename = "TY")]
    Third,
}

impl YearTag {
    pub const ALL: [YearTag; 3] = [YearTag::First, YearTag::Second, YearTag::Third];

    pub fn as_str(self) -> &'static str {
        match self {
            YearTag::First => "FY",
            YearTag::Second => "SY",
            YearTag::Third => "TY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            YearTag::First => "First Year (FY)",
            YearTag::Second => "Second Year (SY)",
            YearTag::Third => "Third Year (TY)",
        }
    }

    /// Parses "FY"/"SY"/"TY". Anything else, including "", is no year.
    pub fn from_tag(raw: &str) -> Option<YearTag> {
        YearTag::ALL.into_iter().find(|tag| tag.as_str() == raw)
    }
}

impl fmt::Display for YearTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; DAYS_PER_WEEK] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    /// Accepts a full name or a three letter prefix, any case.
    pub fn parse(raw: &str) -> Option<Weekday> {
        let wanted = raw.trim().to_lowercase();
        if wanted.len() < 3 {
            return None;
        }
        Weekday::ALL
            .into_iter()
            .find(|day| day.label().to_lowercase().starts_with(&wanted))
    }
}

/// Lecture or lab. `Unset` is stored as the empty string.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum SessionType {
    #[default]
    Unset,
    Theory,
    Practical,
}

impl SessionType {
    pub const CHOICES: [SessionType; 2] = [SessionType::Theory, SessionType::Practical];

    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Unset => "",
            SessionType::Theory => "Theory",
            SessionType::Practical => "Practical",
        }
    }

    pub fn is_unset(self) -> bool {
        self == SessionType::Unset
    }
}

impl From<String> for SessionType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Theory" => SessionType::Theory,
            "Practical" => SessionType::Practical,
            _ => SessionType::Unset,
        }
    }
}

impl From<SessionType> for String {
    fn from(value: SessionType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Semester {
    #[default]
    Unset,
    First,
    Second,
}

impl Semester {
    pub const ALL: [Semester; 3] = [Semester::Unset, Semester::First, Semester::Second];

    /// Stored value, e.g. "Sem 1".
    pub fn as_str(self) -> &'static str {
        match self {
            Semester::Unset => "",
            Semester::First => "Sem 1",
            Semester::Second => "Sem 2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Semester::Unset => "Select Semester (Optional)",
            Semester::First => "Semester 1",
            Semester::Second => "Semester 2",
        }
    }

    pub fn is_unset(self) -> bool {
        self == Semester::Unset
    }
}

impl From<String> for Semester {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Sem 1" => Semester::First,
            "Sem 2" => Semester::Second,
            _ => Semester::Unset,
        }
    }
}

impl From<Semester> for String {
    fn from(value: Semester) -> Self {
        value.as_str().to_string()
    }
}

/// One weekday cell of a slot.
///
/// `subject` is expected to come from the registry list of `year`, but nothing here
/// checks that: changing `year` leaves a previously chosen subject in place.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DayCell {
    #[serde(with = "blank_year")]
    pub year: Option<YearTag>,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub subject: String,
    #[serde(rename = "type", deserialize_with = "null_as_default::deserialize")]
    pub kind: SessionType,
}

impl DayCell {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.subject.is_empty() && self.kind.is_unset()
    }

    fn apply(&mut self, edit: CellEdit) {
        match edit {
            CellEdit::Year(year) => self.year = year,
            CellEdit::Subject(subject) => self.subject = subject,
            CellEdit::Type(kind) => self.kind = kind,
        }
    }
}

/// A single-field edit of a [`DayCell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEdit {
    Year(Option<YearTag>),
    Subject(String),
    Type(SessionType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotTime {
    Start,
    End,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeSlot {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub time_start: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub time_end: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub days: [DayCell; DAYS_PER_WEEK],
}

impl TimeSlot {
    pub fn cell(&self, day: Weekday) -> &DayCell {
        &self.days[day.index()]
    }

    pub fn time(&self, which: SlotTime) -> &str {
        match which {
            SlotTime::Start => &self.time_start,
            SlotTime::End => &self.time_end,
        }
    }
}

/// Ordered rows of the timetable. Recreated wholesale, never resized in place.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct TimetableGrid {
    slots: Vec<TimeSlot>,
}

impl TimetableGrid {
    /// A grid of `count` empty slots. Zero is rejected.
    pub fn with_slots(count: usize) -> Result<Self> {
        if count < 1 {
            return Err(TimetableError::InvalidSlotCount(count.to_string()));
        }
        Ok(Self {
            slots: vec![TimeSlot::default(); count],
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&TimeSlot> {
        self.slots.get(index)
    }

    /// Sets one end of a slot. `value` must be blank or a 24-hour `H:MM`/`HH:MM` time
    /// and is stored as `HH:MM`.
    pub fn set_slot_time(&mut self, index: usize, which: SlotTime, value: String) -> Result<()> {
        let value = parse_slot_time(&value)?;
        let slot = self.slot_mut(index)?;
        match which {
            SlotTime::Start => slot.time_start = value,
            SlotTime::End => slot.time_end = value,
        }
        Ok(())
    }

    pub fn set_day_cell(&mut self, index: usize, day: Weekday, edit: CellEdit) -> Result<()> {
        let slot = self.slot_mut(index)?;
        slot.days[day.index()].apply(edit);
        Ok(())
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut TimeSlot> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(TimetableError::SlotOutOfRange { index, len })
    }
}

/// Normalises a slot time to `HH:MM`. Blank input clears the time.
pub fn parse_slot_time(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(String::new());
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| TimetableError::InvalidTime(raw.to_string()))
}

/// Parses the "No. of Time Slots" input. Non-numeric or below one is rejected.
pub fn parse_slot_count(raw: &str) -> Result<usize> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => {
            usize::try_from(n).map_err(|_| TimetableError::InvalidSlotCount(raw.to_string()))
        }
        _ => Err(TimetableError::InvalidSlotCount(raw.to_string())),
    }
}

/// Who the timetable belongs to. `name` is the persistence key.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct TeacherProfile {
    #[serde(rename = "teacher", deserialize_with = "null_as_default::deserialize")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub academic_year: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub semester: Semester,
}

/// The unit of persistence: everything stored for one teacher.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Snapshot {
    #[serde(flatten)]
    pub profile: TeacherProfile,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub subjects: SubjectRegistry,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub timetable: TimetableGrid,
}

impl Snapshot {
    pub fn teacher(&self) -> &str {
        &self.profile.name
    }

    /// Replaces everything but the teacher name with `stored`.
    pub fn adopt(&mut self, stored: Snapshot) {
        self.profile.academic_year = stored.profile.academic_year;
        self.profile.semester = stored.profile.semester;
        self.subjects = stored.subjects;
        self.timetable = stored.timetable;
    }
}

/// "2026-2027" style labels starting at `first_year`.
pub fn academic_year_options(first_year: i32) -> Vec<String> {
    (0..ACADEMIC_YEAR_CHOICES)
        .map(|i| format!("{}-{}", first_year + i, first_year + i + 1))
        .collect()
}

pub fn current_academic_year_options() -> Vec<String> {
    academic_year_options(chrono::Local::now().year())
}

/// Reads a JSON `null` as the field's default, the way a missing field already is.
pub(crate) mod null_as_default {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }
}

mod blank_year {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::YearTag;

    pub fn serialize<S: Serializer>(year: &Option<YearTag>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(year.map(YearTag::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<YearTag>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(YearTag::from_tag))
    }
}
