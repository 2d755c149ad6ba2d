//! Preference lists: which attributes take part in dominance, and in which
//! direction each one improves.

use serde::{Deserialize, Serialize};
use skyline_core::schema::Schema;

use crate::error::{OpError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Smaller is better.
    #[default]
    Minimize,
    /// Larger is better.
    Maximize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Preference {
    pub index: usize,
    #[serde(default)]
    pub direction: Direction,
}

impl Preference {
    pub fn min(index: usize) -> Self {
        Self {
            index,
            direction: Direction::Minimize,
        }
    }

    pub fn max(index: usize) -> Self {
        Self {
            index,
            direction: Direction::Maximize,
        }
    }
}

/// Ordered, non-empty set of distinct attribute preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Preference>", into = "Vec<Preference>")]
pub struct PreferenceList(Vec<Preference>);

impl PreferenceList {
    pub fn new(prefs: Vec<Preference>) -> Result<Self> {
        if prefs.is_empty() {
            return Err(OpError::Config("preference list is empty".into()));
        }
        for (i, p) in prefs.iter().enumerate() {
            if prefs[..i].iter().any(|q| q.index == p.index) {
                return Err(OpError::Config(format!(
                    "attribute {} listed twice in preference list",
                    p.index
                )));
            }
        }
        Ok(Self(prefs))
    }

    /// Every index minimized.
    pub fn minimize(indices: &[usize]) -> Result<Self> {
        Self::new(indices.iter().map(|&i| Preference::min(i)).collect())
    }

    pub fn as_slice(&self) -> &[Preference] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|p| p.index)
    }

    /// Check every index against `schema`.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for p in &self.0 {
            if p.index >= schema.len() {
                return Err(OpError::Schema(format!(
                    "preference attribute {} out of range for schema of {} fields",
                    p.index,
                    schema.len()
                )));
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<Preference>> for PreferenceList {
    type Error = OpError;

    fn try_from(prefs: Vec<Preference>) -> Result<Self> {
        Self::new(prefs)
    }
}

impl From<PreferenceList> for Vec<Preference> {
    fn from(list: PreferenceList) -> Self {
        list.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyline_core::schema::{DataType, Field};

    #[test]
    fn rejects_empty_and_duplicates() {
        assert!(PreferenceList::minimize(&[]).is_err());
        assert!(PreferenceList::minimize(&[1, 0, 1]).is_err());
        assert!(PreferenceList::new(vec![Preference::min(0), Preference::max(0)]).is_err());
    }

    #[test]
    fn validate_checks_schema_bounds() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int32),
            Field::new("b", DataType::Int32),
        ]);
        assert!(PreferenceList::minimize(&[1, 0]).unwrap().validate(&schema).is_ok());
        assert!(PreferenceList::minimize(&[2]).unwrap().validate(&schema).is_err());
    }

    #[test]
    fn deserializing_enforces_invariants() {
        let ok: PreferenceList =
            serde_json::from_str(r#"[{"index":0},{"index":2,"direction":"Maximize"}]"#).unwrap();
        assert_eq!(ok.as_slice(), &[Preference::min(0), Preference::max(2)]);

        let dup = serde_json::from_str::<PreferenceList>(r#"[{"index":0},{"index":0}]"#);
        assert!(dup.is_err());
    }
}
