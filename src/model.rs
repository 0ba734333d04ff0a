use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an employee can take on new work.
///
/// Labels outside the known pair are kept verbatim so that the roster file
/// can grow new states without a code change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Availability {
    Available,
    Busy,
    Other(String),
}

impl Availability {
    pub fn label(&self) -> &str {
        match self {
            Availability::Available => "available",
            Availability::Busy => "busy",
            Availability::Other(label) => label,
        }
    }
}

impl From<String> for Availability {
    fn from(label: String) -> Self {
        match label.as_str() {
            "available" => Availability::Available,
            "busy" => Availability::Busy,
            _ => Availability::Other(label),
        }
    }
}

impl From<&str> for Availability {
    fn from(label: &str) -> Self {
        Availability::from(label.to_string())
    }
}

impl From<Availability> for String {
    fn from(a: Availability) -> Self {
        a.label().to_string()
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the roster. Identity is the record's position in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub name: String,
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub projects: Vec<String>,
    pub availability: Availability,
}

impl EmployeeRecord {
    /// Text form fed to the encoder when the index is built.
    pub fn document(&self) -> String {
        format!(
            "{} {} {} years {} {}",
            self.name,
            self.skills.join(", "),
            self.experience_years,
            self.projects.join(", "),
            self.availability
        )
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    pub fn worked_on(&self, project: &str) -> bool {
        self.projects.iter().any(|p| p == project)
    }
}

/// On-disk roster layout: `{"employees": [...]}`.
#[derive(Debug, Deserialize, Serialize)]
pub struct Roster {
    pub employees: Vec<EmployeeRecord>,
}

/// A single nearest-neighbour result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub position: usize,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asha() -> EmployeeRecord {
        EmployeeRecord {
            name: "Asha".into(),
            skills: vec!["Python".into(), "SQL".into()],
            experience_years: 5,
            projects: vec!["Billing".into()],
            availability: Availability::Available,
        }
    }

    #[test]
    fn document_joins_fields_in_order() {
        assert_eq!(asha().document(), "Asha Python, SQL 5 years Billing available");
    }

    #[test]
    fn unknown_availability_round_trips_its_label() {
        let json = r#"{"name":"Ravi","skills":[],"experience_years":2,"projects":[],"availability":"on leave"}"#;
        let rec: EmployeeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.availability, Availability::Other("on leave".into()));
        assert_eq!(rec.availability.to_string(), "on leave");

        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["availability"], "on leave");
    }

    #[test]
    fn missing_field_is_rejected() {
        let json = r#"{"name":"Ravi","skills":[],"projects":[],"availability":"busy"}"#;
        assert!(serde_json::from_str::<EmployeeRecord>(json).is_err());
    }
}
