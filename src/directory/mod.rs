//! Municipal departments, urgency levels and the authority directory
//!
//! The department set is closed: adding one means extending [`Department`]
//! and the `[[department]]` table in `rules.toml` together.

use crate::error::{Result, TriageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Municipal responsibility area
///
/// Declaration order is the classifier's tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "PWD")]
    Pwd,
    #[serde(rename = "Jal Board")]
    JalBoard,
    Sanitation,
    Electricity,
    Parks,
    Traffic,
    Health,
    Infrastructure,
    General,
}

impl Department {
    /// All departments in tie-break priority order
    pub const ALL: [Department; 9] = [
        Department::Pwd,
        Department::JalBoard,
        Department::Sanitation,
        Department::Electricity,
        Department::Parks,
        Department::Traffic,
        Department::Health,
        Department::Infrastructure,
        Department::General,
    ];

    /// Display name used by the UI and the rule table
    pub fn name(self) -> &'static str {
        match self {
            Department::Pwd => "PWD",
            Department::JalBoard => "Jal Board",
            Department::Sanitation => "Sanitation",
            Department::Electricity => "Electricity",
            Department::Parks => "Parks",
            Department::Traffic => "Traffic",
            Department::Health => "Health",
            Department::Infrastructure => "Infrastructure",
            Department::General => "General",
        }
    }

    /// Position in [`Department::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Department {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        Department::ALL
            .into_iter()
            .find(|d| {
                d.name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .eq_ignore_ascii_case(&wanted)
            })
            .ok_or_else(|| TriageError::InvalidConfigValue {
                path: "department".to_string(),
                message: format!("Unknown department '{}'", s),
            })
    }
}

/// Three-level severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }

    /// Hours the responsible authority has to acknowledge a complaint
    pub fn sla_hours(self) -> u32 {
        match self {
            Urgency::High => 24,
            Urgency::Medium => 72,
            Urgency::Low => 168,
        }
    }

    /// Human-readable SLA ("24 hours", "72 hours", "7 days")
    pub fn sla_label(self) -> &'static str {
        match self {
            Urgency::High => "24 hours",
            Urgency::Medium => "72 hours",
            Urgency::Low => "7 days",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            other => Err(TriageError::InvalidConfigValue {
                path: "urgency".to_string(),
                message: format!("Urgency must be low, medium or high, got '{}'", other),
            }),
        }
    }
}

/// Government body notified about complaints of one department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub name: String,
    pub email: String,
    pub zone: String,
    /// Short label shown in feed notifications
    pub short_name: String,
}

/// Department → authority lookup
///
/// Construction guarantees every department has exactly one entry, so
/// lookups never fail.
#[derive(Debug, Clone)]
pub struct Directory {
    authorities: Vec<Authority>,
}

impl Directory {
    /// Build directory from (department, authority) pairs
    pub fn new(entries: impl IntoIterator<Item = (Department, Authority)>) -> Result<Self> {
        let mut slots: Vec<Option<Authority>> = vec![None; Department::ALL.len()];

        for (department, authority) in entries {
            let slot = &mut slots[department.index()];
            if slot.is_some() {
                return Err(TriageError::Rules(format!(
                    "Department '{}' is listed more than once",
                    department
                )));
            }
            *slot = Some(authority);
        }

        let missing: Vec<&str> = Department::ALL
            .iter()
            .filter(|d| slots[d.index()].is_none())
            .map(|d| d.name())
            .collect();
        if !missing.is_empty() {
            return Err(TriageError::Rules(format!(
                "Missing departments in rule table: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            authorities: slots.into_iter().flatten().collect(),
        })
    }

    /// Authority responsible for a department
    pub fn authority(&self, department: Department) -> &Authority {
        &self.authorities[department.index()]
    }

    /// Iterate all (department, authority) pairs in priority order
    pub fn iter(&self) -> impl Iterator<Item = (Department, &Authority)> {
        Department::ALL.into_iter().zip(self.authorities.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority(name: &str) -> Authority {
        Authority {
            name: name.to_string(),
            email: format!("{}@example.gov.in", name.to_lowercase()),
            zone: "Delhi".to_string(),
            short_name: name.to_string(),
        }
    }

    #[test]
    fn test_department_names_round_trip_through_from_str() {
        for dept in Department::ALL {
            assert_eq!(dept.name().parse::<Department>().unwrap(), dept);
        }
        assert_eq!("jal-board".parse::<Department>().unwrap(), Department::JalBoard);
        assert_eq!("pwd".parse::<Department>().unwrap(), Department::Pwd);
        assert!("Fire Brigade".parse::<Department>().is_err());
    }

    #[test]
    fn test_department_serde_uses_display_names() {
        let json = serde_json::to_string(&Department::JalBoard).unwrap();
        assert_eq!(json, "\"Jal Board\"");
        let back: Department = serde_json::from_str("\"PWD\"").unwrap();
        assert_eq!(back, Department::Pwd);
    }

    #[test]
    fn test_urgency_sla() {
        assert_eq!(Urgency::High.sla_label(), "24 hours");
        assert_eq!(Urgency::Medium.sla_label(), "72 hours");
        assert_eq!(Urgency::Low.sla_label(), "7 days");
        assert_eq!(Urgency::Low.sla_hours(), 7 * 24);
    }

    #[test]
    fn test_directory_requires_every_department() {
        let partial = vec![(Department::Pwd, authority("PWD"))];
        let err = Directory::new(partial).unwrap_err();
        assert!(err.to_string().contains("Missing departments"));
    }

    #[test]
    fn test_directory_rejects_duplicates() {
        let mut entries: Vec<_> = Department::ALL
            .iter()
            .map(|d| (*d, authority(d.name())))
            .collect();
        entries.push((Department::Parks, authority("Parks again")));
        assert!(Directory::new(entries).is_err());
    }

    #[test]
    fn test_directory_lookup() {
        let entries = Department::ALL.iter().map(|d| (*d, authority(d.name())));
        let directory = Directory::new(entries).unwrap();

        assert_eq!(directory.authority(Department::Traffic).name, "Traffic");
        assert_eq!(directory.iter().count(), Department::ALL.len());
    }
}
