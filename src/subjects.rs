use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};
use crate::model::{null_as_default, YearTag};

/// Subject names offered per year, in the order they were added.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SubjectRegistry {
    #[serde(rename = "FY", deserialize_with = "null_as_default::deserialize")]
    first: Vec<String>,
    #[serde(rename = "SY", deserialize_with = "null_as_default::deserialize")]
    second: Vec<String>,
    #[serde(rename = "TY", deserialize_with = "null_as_default::deserialize")]
    third: Vec<String>,
}

impl SubjectRegistry {
    pub fn subjects(&self, year: YearTag) -> &[String] {
        match year {
            YearTag::First => &self.first,
            YearTag::Second => &self.second,
            YearTag::Third => &self.third,
        }
    }

    fn subjects_mut(&mut self, year: YearTag) -> &mut Vec<String> {
        match year {
            YearTag::First => &mut self.first,
            YearTag::Second => &mut self.second,
            YearTag::Third => &mut self.third,
        }
    }

    /// Appends `name` under `year` unless it is already listed there.
    ///
    /// Blank names are rejected. The name is kept exactly as typed; only the blank
    /// check looks at the trimmed form. Returns whether the list grew.
    pub fn add(&mut self, year: YearTag, name: &str) -> Result<bool> {
        if name.trim().is_empty() {
            return Err(TimetableError::BlankSubject);
        }
        let list = self.subjects_mut(year);
        if list.iter().any(|existing| existing == name) {
            return Ok(false);
        }
        list.push(name.to_string());
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.first.clear();
        self.second.clear();
        self.third.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty() && self.third.is_empty()
    }

    pub fn len(&self) -> usize {
        self.first.len() + self.second.len() + self.third.len()
    }

    /// (year, subjects) in FY, SY, TY order.
    pub fn iter(&self) -> impl Iterator<Item = (YearTag, &[String])> {
        YearTag::ALL
            .into_iter()
            .map(move |year| (year, self.subjects(year)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        let mut registry = SubjectRegistry::default();
        registry.add(YearTag::Second, "Networks").unwrap();
        let before = registry.clone();

        for blank in ["", "   ", "\t\n"] {
            let err = registry.add(YearTag::First, blank).unwrap_err();
            assert!(matches!(err, TimetableError::BlankSubject));
        }
        assert_eq!(registry, before);
    }

    #[test]
    fn duplicate_add_is_idempotent() {
        let mut registry = SubjectRegistry::default();
        assert!(registry.add(YearTag::First, "Data Structures").unwrap());
        assert!(!registry.add(YearTag::First, "Data Structures").unwrap());
        assert_eq!(registry.subjects(YearTag::First), ["Data Structures"]);
    }

    #[test]
    fn equality_is_case_sensitive_and_untrimmed() {
        let mut registry = SubjectRegistry::default();
        registry.add(YearTag::Third, "DBMS").unwrap();
        registry.add(YearTag::Third, "dbms").unwrap();
        registry.add(YearTag::Third, " DBMS").unwrap();
        assert_eq!(registry.subjects(YearTag::Third), ["DBMS", "dbms", " DBMS"]);
    }

    #[test]
    fn years_are_independent_and_ordered() {
        let mut registry = SubjectRegistry::default();
        registry.add(YearTag::Second, "Zoology").unwrap();
        registry.add(YearTag::Second, "Algebra").unwrap();
        registry.add(YearTag::First, "Zoology").unwrap();

        assert_eq!(registry.subjects(YearTag::Second), ["Zoology", "Algebra"]);
        assert_eq!(registry.subjects(YearTag::First), ["Zoology"]);
        assert!(registry.subjects(YearTag::Third).is_empty());
        assert_eq!(registry.len(), 3);

        let years: Vec<YearTag> = registry.iter().map(|(year, _)| year).collect();
        assert_eq!(years, YearTag::ALL);
    }

    #[test]
    fn clear_empties_every_year() {
        let mut registry = SubjectRegistry::default();
        for year in YearTag::ALL {
            registry.add(year, "Seminar").unwrap();
        }
        registry.clear();
        assert!(registry.is_empty());
    }
}
