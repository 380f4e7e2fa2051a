//! Screens return [`Request`]s and take [`Response`]s; they never call the
//! backend themselves.

pub mod employees;
pub mod projects;

use staffdesk_shared::{Employee, EmployeeRef, Project, ProjectInput};

use crate::backend::BackendError;
use crate::form::FormErrors;

pub use employees::EmployeeScreen;
pub use projects::{ProjectModal, ProjectScreen};

pub trait Keyed {
    fn key(&self) -> Option<&str>;
}

impl Keyed for Employee {
    fn key(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl Keyed for EmployeeRef {
    fn key(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl Keyed for Project {
    fn key(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordList<R> {
    items: Vec<R>,
}

impl<R> Default for RecordList<R> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<R: Keyed> RecordList<R> {
    pub fn replace_all(&mut self, items: Vec<R>) {
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn prepend(&mut self, item: R) {
        self.items.insert(0, item);
    }

    pub fn replace_by_key(&mut self, key: &str, item: R) -> bool {
        match self.items.iter_mut().find(|r| r.key() == Some(key)) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove_by_key(&mut self, key: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|r| r.key() != Some(key));
        before - self.items.len()
    }

    pub fn find(&self, key: &str) -> Option<&R> {
        self.items.iter().find(|r| r.key() == Some(key))
    }

    // Key first, then 1-based row number.
    pub fn select(&self, selector: &str) -> Option<&R> {
        self.find(selector).or_else(|| {
            selector
                .trim_start_matches('#')
                .parse::<usize>()
                .ok()
                .and_then(|row| row.checked_sub(1))
                .and_then(|idx| self.items.get(idx))
        })
    }

    pub fn as_slice(&self) -> &[R] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// Pairs a mutation request with its response.
pub type Ticket = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    FetchEmployees,
    FetchEmployeeRefs,
    FetchProjects,
    CreateProject {
        ticket: Ticket,
        input: ProjectInput,
    },
    UpdateProject {
        ticket: Ticket,
        id: String,
        input: ProjectInput,
    },
    DeleteProject {
        ticket: Ticket,
        id: String,
    },
}

#[derive(Debug)]
pub enum Response {
    EmployeesLoaded(Result<Vec<Employee>, BackendError>),
    EmployeeRefsLoaded(Result<Vec<EmployeeRef>, BackendError>),
    ProjectsLoaded(Result<Vec<Project>, BackendError>),
    ProjectCreated {
        ticket: Ticket,
        result: Result<Project, BackendError>,
    },
    ProjectUpdated {
        ticket: Ticket,
        id: String,
        result: Result<(), BackendError>,
    },
    ProjectDeleted {
        ticket: Ticket,
        id: String,
        result: Result<(), BackendError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Open,
    Submitting(Ticket),
}

#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("close the open {open} dialog first")]
    ModalBusy { open: &'static str },
    #[error("no dialog is open")]
    NoModal,
    #[error("the open {open} dialog cannot do that")]
    WrongModal { open: &'static str },
    #[error("the {open} dialog is waiting for the backend")]
    Submitting { open: &'static str },
    #[error("no record matches {0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(FormErrors),
}

#[cfg(test)]
mod tests {
    use staffdesk_shared::EmployeeRef;

    use super::RecordList;

    fn person(id: &str) -> EmployeeRef {
        EmployeeRef {
            id: id.to_string(),
            name: format!("name-{id}"),
        }
    }

    fn ids(list: &RecordList<EmployeeRef>) -> Vec<&str> {
        list.as_slice().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn replace_all_keeps_order_verbatim() {
        let mut list = RecordList::default();
        list.replace_all(vec![person("b"), person("a"), person("c")]);
        assert_eq!(ids(&list), vec!["b", "a", "c"]);
    }

    #[test]
    fn remove_by_key_leaves_others_untouched() {
        let mut list = RecordList::default();
        list.replace_all(vec![person("a"), person("b"), person("c")]);
        assert_eq!(list.remove_by_key("b"), 1);
        assert_eq!(ids(&list), vec!["a", "c"]);
        assert_eq!(list.remove_by_key("zzz"), 0);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn replace_by_key_swaps_in_place() {
        let mut list = RecordList::default();
        list.replace_all(vec![person("a"), person("b"), person("c")]);
        let mut renamed = person("b");
        renamed.name = "Bea".to_string();

        assert!(list.replace_by_key("b", renamed));
        assert_eq!(ids(&list), vec!["a", "b", "c"]);
        assert_eq!(list.as_slice()[1].name, "Bea");
        assert!(!list.replace_by_key("d", person("d")));
    }

    #[test]
    fn select_falls_back_to_row_number() {
        let mut list = RecordList::default();
        list.replace_all(vec![person("a"), person("b")]);
        list.prepend(person("z"));

        assert_eq!(list.select("b").map(|r| r.id.as_str()), Some("b"));
        assert_eq!(list.select("1").map(|r| r.id.as_str()), Some("z"));
        assert_eq!(list.select("#3").map(|r| r.id.as_str()), Some("b"));
        assert!(list.select("0").is_none());
        assert!(list.select("9").is_none());
    }
}
