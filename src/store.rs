use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::LoadError;
use crate::model::{EmployeeRecord, Roster};

/// Predicates for the filter-search endpoint. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    pub skills: Vec<String>,
    pub min_experience: Option<u32>,
    pub availability: Option<String>,
    pub project: Option<String>,
}

impl EmployeeFilter {
    pub fn matches(&self, e: &EmployeeRecord) -> bool {
        if !self.skills.iter().all(|s| e.has_skill(s)) {
            return false;
        }
        // A zero floor filters nothing.
        if let Some(min) = self.min_experience.filter(|m| *m > 0) {
            if e.experience_years < min {
                return false;
            }
        }
        if let Some(a) = self.availability.as_deref() {
            if e.availability.label() != a {
                return false;
            }
        }
        if let Some(p) = self.project.as_deref() {
            if !e.worked_on(p) {
                return false;
            }
        }
        true
    }
}

/// In-memory roster. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<EmployeeRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_json(&raw)?;
        info!(path = %path.display(), employees = store.len(), "roster loaded");
        Ok(store)
    }

    pub fn from_json(raw: &str) -> Result<Self, LoadError> {
        let roster: Roster = serde_json::from_str(raw)?;
        Ok(Self::new(roster.employees))
    }

    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&EmployeeRecord> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Document text of every record, in roster order.
    pub fn documents(&self) -> Vec<String> {
        self.records.iter().map(EmployeeRecord::document).collect()
    }

    pub fn search(&self, filter: &EmployeeFilter) -> Vec<&EmployeeRecord> {
        self.records.iter().filter(|e| filter.matches(e)).collect()
    }
}
