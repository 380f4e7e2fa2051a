use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use staffdesk_shared::{
    EmployeeRef, Progress, Project, ProjectInput, ProjectPriority, ProjectStatus,
};

use crate::dates::parse_form_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Add,
    Edit,
}

/// `None` is an untouched widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<ProjectPriority>,
    pub status: Option<ProjectStatus>,
    pub progress: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub assigned_person: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.messages().join(" "))]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.message).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProject {
    pub input: ProjectInput,
    pub assigned: EmployeeRef,
}

impl ProjectForm {
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: Some(project.name.clone()),
            description: Some(project.description.clone()),
            priority: Some(project.priority),
            status: Some(project.status),
            progress: Some(i64::from(project.progress.value())),
            start_date: Some(project.start_date),
            end_date: Some(project.end_date),
            assigned_person: project.assigned_person.as_ref().map(|p| p.id.clone()),
        }
    }

    /// Applies one `key:value` token. An empty value clears the field.
    pub fn set_field(&mut self, token: &str, today: NaiveDate) -> anyhow::Result<()> {
        let (key, value) = token
            .split_once(':')
            .or_else(|| token.split_once('='))
            .ok_or_else(|| anyhow!("expected field:value, got: {token}"))?;
        let value = value.trim();
        let key = key.trim().to_ascii_lowercase();

        match key.as_str() {
            "name" => self.name = non_empty(value),
            "description" | "desc" => self.description = non_empty(value),
            "priority" | "pri" => {
                self.priority = non_empty(value)
                    .map(|raw| {
                        ProjectPriority::parse_label(&raw)
                            .ok_or_else(|| anyhow!("unknown priority: {raw} (Low, Medium, High)"))
                    })
                    .transpose()?;
            }
            "status" => {
                self.status = non_empty(value)
                    .map(|raw| {
                        ProjectStatus::parse_label(&raw).ok_or_else(|| {
                            anyhow!("unknown status: {raw} (Not Started, In Progress, Completed)")
                        })
                    })
                    .transpose()?;
            }
            "progress" => {
                self.progress = non_empty(value)
                    .map(|raw| {
                        raw.trim_end_matches('%')
                            .trim()
                            .parse::<i64>()
                            .with_context(|| format!("progress must be a whole number: {raw}"))
                    })
                    .transpose()?;
            }
            "start" | "startdate" | "start_date" => {
                self.start_date = non_empty(value)
                    .map(|raw| parse_form_date(&raw, today))
                    .transpose()
                    .context("invalid start date")?;
            }
            "end" | "enddate" | "end_date" => {
                self.end_date = non_empty(value)
                    .map(|raw| parse_form_date(&raw, today))
                    .transpose()
                    .context("invalid end date")?;
            }
            "assigned" | "assignee" | "assignedperson" | "assigned_person" => {
                self.assigned_person = non_empty(value);
            }
            other => return Err(anyhow!("unknown project field: {other}")),
        }
        Ok(())
    }

    // Start and end dates are not compared with each other.
    pub fn validate(
        &self,
        kind: FormKind,
        employees: &[EmployeeRef],
    ) -> Result<ValidProject, FormErrors> {
        let mut errors = Vec::new();
        let mut fail = |field: &'static str, message: &'static str| {
            errors.push(FieldError { field, message });
        };

        let name = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
        if name.is_none() {
            fail("name", "Please input the project name!");
        }
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if description.is_none() {
            fail("description", "Please input the description!");
        }
        if self.priority.is_none() {
            fail("priority", "Please select the priority!");
        }
        if kind == FormKind::Edit && self.status.is_none() {
            fail("status", "Please select the status!");
        }

        let progress = match self.progress {
            Some(raw) => {
                let progress = Progress::new(raw);
                if progress.is_none() {
                    fail("progress", "Progress must be between 0 and 100!");
                }
                progress
            }
            None => {
                if kind == FormKind::Edit {
                    fail("progress", "Please input the progress!");
                }
                None
            }
        };

        if self.start_date.is_none() {
            fail("startDate", "Please select the start date!");
        }
        if self.end_date.is_none() {
            fail("endDate", "Please select the end date!");
        }

        let assigned = match self.assigned_person.as_deref() {
            Some(id) => {
                let found = employees.iter().find(|e| e.id == id).cloned();
                if found.is_none() {
                    fail("assignedPerson", "Selected employee is not available!");
                }
                found
            }
            None => {
                fail("assignedPerson", "Please select the assigned person!");
                None
            }
        };

        match (
            name,
            description,
            self.priority,
            self.start_date,
            self.end_date,
            assigned,
        ) {
            (
                Some(name),
                Some(description),
                Some(priority),
                Some(start_date),
                Some(end_date),
                Some(assigned),
            ) if errors.is_empty() => Ok(ValidProject {
                input: ProjectInput {
                    name: name.to_string(),
                    description: description.to_string(),
                    priority,
                    status: self.status,
                    progress,
                    start_date,
                    end_date,
                    assigned_person: assigned.id.clone(),
                },
                assigned,
            }),
            _ => Err(FormErrors(errors)),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
