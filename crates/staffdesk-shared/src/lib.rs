use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub mod calendar_date;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "employeeId", default)]
    pub employee_code: String,
    #[serde(default)]
    pub profile_pic: Option<String>,
    /// Kept as the backend sends it; rendered verbatim.
    #[serde(default)]
    pub joining_date: String,
}

/// Identifier and name of an employee, as used by the assignment selector
/// and embedded in projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmployeeRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl From<&Employee> for EmployeeRef {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id.clone(),
            name: employee.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::NotStarted,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::NotStarted => "Not Started",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
        }
    }

    /// Accepts the display label in any case, with spaces, dashes,
    /// underscores or nothing between the words.
    pub fn parse_label(raw: &str) -> Option<Self> {
        let folded = fold_label(raw);
        Self::ALL
            .into_iter()
            .find(|status| fold_label(status.label()) == folded)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProjectPriority {
    Low,
    Medium,
    High,
}

impl ProjectPriority {
    pub const ALL: [ProjectPriority; 3] = [
        ProjectPriority::Low,
        ProjectPriority::Medium,
        ProjectPriority::High,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProjectPriority::Low => "Low",
            ProjectPriority::Medium => "Medium",
            ProjectPriority::High => "High",
        }
    }

    pub fn parse_label(raw: &str) -> Option<Self> {
        let folded = fold_label(raw);
        Self::ALL
            .into_iter()
            .find(|priority| fold_label(priority.label()) == folded)
    }
}

impl fmt::Display for ProjectPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn fold_label(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Completion percentage; always within `0..=100`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Progress(u8);

impl Progress {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|value| *value <= Self::MAX)
            .map(Self)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Progress {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("progress out of range 0..=100: {value}"))
    }
}

impl From<Progress> for u8 {
    fn from(progress: Progress) -> Self {
        progress.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub progress: Progress,
    pub priority: ProjectPriority,
    #[serde(with = "calendar_date")]
    pub start_date: NaiveDate,
    #[serde(with = "calendar_date")]
    pub end_date: NaiveDate,
    #[serde(default, deserialize_with = "embedded_employee")]
    pub assigned_person: Option<EmployeeRef>,
}

impl Project {
    pub fn assigned_name(&self) -> Option<&str> {
        self.assigned_person
            .as_ref()
            .map(|person| person.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// The backend may embed the assigned person as an object or leave it as
/// a bare identifier when it did not populate the reference.
fn embedded_employee<'de, D>(deserializer: D) -> Result<Option<EmployeeRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Embedded {
        Object(EmployeeRef),
        Id(String),
    }

    Ok(
        Option::<Embedded>::deserialize(deserializer)?.map(|embedded| match embedded {
            Embedded::Object(person) => person,
            Embedded::Id(id) => EmployeeRef {
                id,
                name: String::new(),
            },
        }),
    )
}

/// Body of the create and update project requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub name: String,
    pub description: String,
    pub priority: ProjectPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(with = "calendar_date")]
    pub start_date: NaiveDate,
    #[serde(with = "calendar_date")]
    pub end_date: NaiveDate,
    /// Identifier of the selected employee.
    pub assigned_person: String,
}

impl ProjectInput {
    /// The record an accepted update stands for. Fields the input leaves
    /// out keep the values of `base`.
    pub fn apply_to(&self, base: &Project, assigned: EmployeeRef) -> Project {
        Project {
            id: base.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status.unwrap_or(base.status),
            progress: self.progress.unwrap_or(base.progress),
            priority: self.priority,
            start_date: self.start_date,
            end_date: self.end_date,
            assigned_person: Some(assigned),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{Employee, Progress, Project, ProjectInput, ProjectPriority, ProjectStatus};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn decodes_project_with_timestamp_dates() {
        let raw = json!({
            "_id": "P1",
            "name": "Website Revamp",
            "description": "Redesign",
            "status": "In Progress",
            "progress": 40,
            "priority": "High",
            "startDate": "2024-01-01T00:00:00.000Z",
            "endDate": "2024-03-01",
            "assignedPerson": { "_id": "E1", "name": "Ada" }
        });

        let project: Project = serde_json::from_value(raw).expect("decode project");
        assert_eq!(project.id.as_deref(), Some("P1"));
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.progress.value(), 40);
        assert_eq!(project.start_date, ymd(2024, 1, 1));
        assert_eq!(project.end_date, ymd(2024, 3, 1));
        assert_eq!(project.assigned_name(), Some("Ada"));
    }

    #[test]
    fn missing_status_and_progress_default() {
        let raw = json!({
            "_id": "P2",
            "name": "Intranet",
            "priority": "Low",
            "startDate": "2024-05-01",
            "endDate": "2024-06-01",
            "assignedPerson": "E9"
        });

        let project: Project = serde_json::from_value(raw).expect("decode project");
        assert_eq!(project.status, ProjectStatus::NotStarted);
        assert_eq!(project.progress, Progress::default());
        let person = project.assigned_person.as_ref().expect("assigned");
        assert_eq!(person.id, "E9");
        assert_eq!(project.assigned_name(), None);
    }

    #[test]
    fn progress_above_hundred_is_rejected() {
        let raw = json!({
            "name": "Broken",
            "priority": "Medium",
            "progress": 140,
            "startDate": "2024-05-01",
            "endDate": "2024-06-01"
        });

        assert!(serde_json::from_value::<Project>(raw).is_err());
        assert!(Progress::new(-1).is_none());
        assert_eq!(Progress::new(100).map(Progress::value), Some(100));
    }

    #[test]
    fn decodes_employee_with_null_avatar() {
        let raw = json!({
            "_id": "E1",
            "name": "Ada",
            "phone": "555-0100",
            "email": "ada@example.com",
            "employeeId": "EMP-001",
            "profilePic": null,
            "joiningDate": "2023-04-01"
        });

        let employee: Employee = serde_json::from_value(raw).expect("decode employee");
        assert_eq!(employee.employee_code, "EMP-001");
        assert!(employee.profile_pic.is_none());
        assert_eq!(employee.joining_date, "2023-04-01");
    }

    #[test]
    fn input_serializes_calendar_dates_and_selector_id() {
        let input = ProjectInput {
            name: "Website Revamp".to_string(),
            description: "Redesign".to_string(),
            priority: ProjectPriority::High,
            status: None,
            progress: None,
            start_date: ymd(2024, 1, 1),
            end_date: ymd(2024, 3, 1),
            assigned_person: "E1".to_string(),
        };

        let value = serde_json::to_value(&input).expect("encode input");
        assert_eq!(
            value,
            json!({
                "name": "Website Revamp",
                "description": "Redesign",
                "priority": "High",
                "startDate": "2024-01-01",
                "endDate": "2024-03-01",
                "assignedPerson": "E1"
            })
        );
    }

    #[test]
    fn labels_parse_loosely() {
        assert_eq!(
            ProjectStatus::parse_label("in-progress"),
            Some(ProjectStatus::InProgress)
        );
        assert_eq!(
            ProjectStatus::parse_label("Not Started"),
            Some(ProjectStatus::NotStarted)
        );
        assert_eq!(ProjectPriority::parse_label("HIGH"), Some(ProjectPriority::High));
        assert_eq!(ProjectPriority::parse_label("urgent"), None);
    }
}
