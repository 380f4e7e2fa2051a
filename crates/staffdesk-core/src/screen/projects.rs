use std::collections::BTreeMap;

use staffdesk_shared::{EmployeeRef, Project};
use tracing::{debug, info, instrument, warn};

use super::{ModalPhase, Notice, RecordList, Request, Response, ScreenError, Ticket};
use crate::form::{FormKind, ProjectForm};

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectModal {
    Add {
        phase: ModalPhase,
    },
    Edit {
        target: Project,
        form: ProjectForm,
        phase: ModalPhase,
    },
    View {
        project: Project,
    },
    Delete {
        target: Project,
        phase: ModalPhase,
    },
}

impl ProjectModal {
    pub fn name(&self) -> &'static str {
        match self {
            ProjectModal::Add { .. } => "add project",
            ProjectModal::Edit { .. } => "edit project",
            ProjectModal::View { .. } => "view project",
            ProjectModal::Delete { .. } => "delete project",
        }
    }

    pub fn phase(&self) -> ModalPhase {
        match self {
            ProjectModal::Add { phase }
            | ProjectModal::Edit { phase, .. }
            | ProjectModal::Delete { phase, .. } => *phase,
            ProjectModal::View { .. } => ModalPhase::Open,
        }
    }

    fn reopen(&mut self) {
        match self {
            ProjectModal::Add { phase }
            | ProjectModal::Edit { phase, .. }
            | ProjectModal::Delete { phase, .. } => *phase = ModalPhase::Open,
            ProjectModal::View { .. } => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct ProjectScreen {
    projects: RecordList<Project>,
    employees: RecordList<EmployeeRef>,
    modal: Option<ProjectModal>,
    pending_updates: BTreeMap<Ticket, Project>,
    last_ticket: Ticket,
    loading_projects: bool,
    loading_employees: bool,
    notices: Vec<Notice>,
}

impl ProjectScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> &[Project] {
        self.projects.as_slice()
    }

    pub fn employees(&self) -> &[EmployeeRef] {
        self.employees.as_slice()
    }

    pub fn modal(&self) -> Option<&ProjectModal> {
        self.modal.as_ref()
    }

    pub fn select(&self, selector: &str) -> Result<&Project, ScreenError> {
        self.projects
            .select(selector)
            .ok_or_else(|| ScreenError::NotFound(selector.to_string()))
    }

    pub fn is_loading(&self) -> bool {
        self.loading_projects || self.loading_employees
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn next_ticket(&mut self) -> Ticket {
        self.last_ticket += 1;
        self.last_ticket
    }

    #[instrument(skip(self))]
    pub fn mount(&mut self) -> Vec<Request> {
        self.loading_projects = true;
        self.loading_employees = true;
        vec![Request::FetchProjects, Request::FetchEmployeeRefs]
    }

    #[instrument(skip(self, response))]
    pub fn handle(&mut self, response: Response) {
        match response {
            Response::ProjectsLoaded(Ok(projects)) => {
                info!(count = projects.len(), "projects loaded");
                self.loading_projects = false;
                self.projects.replace_all(projects);
            }
            Response::ProjectsLoaded(Err(err)) => {
                warn!(error = %err, "project fetch failed");
                self.loading_projects = false;
                self.projects.clear();
                self.notices.push(Notice::error("Failed to fetch projects"));
            }
            Response::EmployeeRefsLoaded(Ok(employees)) => {
                info!(count = employees.len(), "assignable employees loaded");
                self.loading_employees = false;
                self.employees.replace_all(employees);
            }
            Response::EmployeeRefsLoaded(Err(err)) => {
                warn!(error = %err, "employee reference fetch failed");
                self.loading_employees = false;
                self.employees.clear();
                self.notices.push(Notice::error("Failed to fetch employees"));
            }
            Response::ProjectCreated { ticket, result } => match result {
                Ok(project) => {
                    info!(ticket, id = ?project.id, "project created");
                    self.projects.prepend(project);
                    self.settle(ticket, true);
                    self.notices
                        .push(Notice::success("Project created successfully!"));
                }
                Err(err) => {
                    warn!(ticket, error = %err, "project create failed");
                    self.settle(ticket, false);
                    self.notices.push(Notice::error("Failed to create project!"));
                }
            },
            Response::ProjectUpdated { ticket, id, result } => {
                let replacement = self.pending_updates.remove(&ticket);
                match result {
                    Ok(()) => {
                        match replacement {
                            Some(project) => {
                                if !self.projects.replace_by_key(&id, project) {
                                    warn!(id = %id, "updated project no longer listed; local list not reconciled");
                                }
                            }
                            None => warn!(ticket, id = %id, "update confirmed without a pending record"),
                        }
                        self.settle(ticket, true);
                        self.notices
                            .push(Notice::success("Project edited successfully!"));
                    }
                    Err(err) => {
                        warn!(ticket, id = %id, error = %err, "project update failed");
                        self.settle(ticket, false);
                        self.notices.push(Notice::error("Failed to edit project!"));
                    }
                }
            }
            Response::ProjectDeleted { ticket, id, result } => match result {
                Ok(()) => {
                    if self.projects.remove_by_key(&id) == 0 {
                        warn!(id = %id, "deleted project was not listed locally");
                    }
                    self.settle(ticket, true);
                    self.notices
                        .push(Notice::success("Project deleted successfully!"));
                }
                Err(err) => {
                    warn!(ticket, id = %id, error = %err, "project delete failed");
                    self.settle(ticket, false);
                    self.notices.push(Notice::error("Failed to delete project!"));
                }
            },
            other => warn!(?other, "project screen ignored unrelated response"),
        }
    }

    /// Closes or reopens the dialog waiting on `ticket`. Any other dialog is
    /// left alone.
    fn settle(&mut self, ticket: Ticket, succeeded: bool) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };
        if modal.phase() != ModalPhase::Submitting(ticket) {
            debug!(ticket, open = modal.name(), "response does not belong to the open dialog");
            return;
        }
        if succeeded {
            self.modal = None;
        } else {
            modal.reopen();
        }
    }

    fn ensure_idle(&self) -> Result<(), ScreenError> {
        match &self.modal {
            Some(modal) => Err(ScreenError::ModalBusy { open: modal.name() }),
            None => Ok(()),
        }
    }

    #[instrument(skip(self))]
    pub fn open_add(&mut self) -> Result<(), ScreenError> {
        self.ensure_idle()?;
        self.modal = Some(ProjectModal::Add {
            phase: ModalPhase::Open,
        });
        Ok(())
    }

    /// Opens the edit dialog and returns its pre-populated form.
    #[instrument(skip(self, target), fields(id = ?target.id))]
    pub fn open_edit(&mut self, target: Project) -> Result<ProjectForm, ScreenError> {
        self.ensure_idle()?;
        let form = ProjectForm::from_project(&target);
        self.modal = Some(ProjectModal::Edit {
            target,
            form: form.clone(),
            phase: ModalPhase::Open,
        });
        Ok(form)
    }

    #[instrument(skip(self, project), fields(id = ?project.id))]
    pub fn open_view(&mut self, project: Project) -> Result<(), ScreenError> {
        self.ensure_idle()?;
        self.modal = Some(ProjectModal::View { project });
        Ok(())
    }

    #[instrument(skip(self, target), fields(id = ?target.id))]
    pub fn open_delete(&mut self, target: Project) -> Result<(), ScreenError> {
        self.ensure_idle()?;
        self.modal = Some(ProjectModal::Delete {
            target,
            phase: ModalPhase::Open,
        });
        Ok(())
    }

    /// A request already sent still lands in the list when it completes.
    pub fn cancel(&mut self) {
        if let Some(modal) = self.modal.take() {
            info!(dialog = modal.name(), phase = ?modal.phase(), "dialog closed");
        }
    }

    /// `Ok(None)` means the edited record has no identifier; the dialog is
    /// closed and an error notice queued.
    #[instrument(skip(self, form))]
    pub fn submit(&mut self, form: ProjectForm) -> Result<Option<Request>, ScreenError> {
        let kind = match &self.modal {
            None => return Err(ScreenError::NoModal),
            Some(ProjectModal::Add {
                phase: ModalPhase::Open,
            }) => FormKind::Add,
            Some(ProjectModal::Edit {
                phase: ModalPhase::Open,
                ..
            }) => FormKind::Edit,
            Some(modal @ (ProjectModal::Add { .. } | ProjectModal::Edit { .. })) => {
                return Err(ScreenError::Submitting { open: modal.name() });
            }
            Some(modal) => return Err(ScreenError::WrongModal { open: modal.name() }),
        };

        let valid = form
            .validate(kind, self.employees.as_slice())
            .map_err(ScreenError::Invalid)?;

        match self.modal.take() {
            Some(ProjectModal::Edit { target, .. }) => {
                let Some(id) = target.id.clone() else {
                    warn!("edit submitted for a project without an identifier");
                    self.notices.push(Notice::error("Unable to edit project."));
                    return Ok(None);
                };
                let ticket = self.next_ticket();
                let replacement = valid.input.apply_to(&target, valid.assigned);
                self.pending_updates.insert(ticket, replacement);
                self.modal = Some(ProjectModal::Edit {
                    target,
                    form,
                    phase: ModalPhase::Submitting(ticket),
                });
                Ok(Some(Request::UpdateProject {
                    ticket,
                    id,
                    input: valid.input,
                }))
            }
            _ => {
                let ticket = self.next_ticket();
                self.modal = Some(ProjectModal::Add {
                    phase: ModalPhase::Submitting(ticket),
                });
                Ok(Some(Request::CreateProject {
                    ticket,
                    input: valid.input,
                }))
            }
        }
    }

    /// `Ok(None)` means the record has no identifier; the dialog is closed
    /// and an error notice queued.
    #[instrument(skip(self))]
    pub fn confirm_delete(&mut self) -> Result<Option<Request>, ScreenError> {
        match self.modal.take() {
            Some(ProjectModal::Delete {
                target,
                phase: ModalPhase::Open,
            }) => match target.id.clone() {
                Some(id) => {
                    let ticket = self.next_ticket();
                    self.modal = Some(ProjectModal::Delete {
                        target,
                        phase: ModalPhase::Submitting(ticket),
                    });
                    Ok(Some(Request::DeleteProject { ticket, id }))
                }
                None => {
                    warn!("delete confirmed for a project without an identifier");
                    self.notices
                        .push(Notice::error("Unable to delete project."));
                    Ok(None)
                }
            },
            Some(modal) => {
                let open = modal.name();
                let busy = matches!(modal, ProjectModal::Delete { .. });
                self.modal = Some(modal);
                if busy {
                    Err(ScreenError::Submitting { open })
                } else {
                    Err(ScreenError::WrongModal { open })
                }
            }
            None => Err(ScreenError::NoModal),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use staffdesk_shared::{EmployeeRef, Progress, Project, ProjectPriority, ProjectStatus};

    use super::{ProjectModal, ProjectScreen};
    use crate::backend::BackendError;
    use crate::form::ProjectForm;
    use crate::screen::{ModalPhase, NoticeLevel, Request, Response, ScreenError, Ticket};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn person(id: &str, name: &str) -> EmployeeRef {
        EmployeeRef {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn project(id: Option<&str>, name: &str) -> Project {
        Project {
            id: id.map(str::to_string),
            name: name.to_string(),
            description: format!("{name} description"),
            status: ProjectStatus::InProgress,
            progress: Progress::new(30).expect("progress"),
            priority: ProjectPriority::Medium,
            start_date: ymd(2024, 1, 10),
            end_date: ymd(2024, 2, 10),
            assigned_person: Some(person("E1", "Ada")),
        }
    }

    fn loaded() -> ProjectScreen {
        let mut screen = ProjectScreen::new();
        let requests = screen.mount();
        assert_eq!(
            requests,
            vec![Request::FetchProjects, Request::FetchEmployeeRefs]
        );
        screen.handle(Response::ProjectsLoaded(Ok(vec![
            project(Some("P1"), "Alpha"),
            project(Some("P2"), "Beta"),
            project(Some("P3"), "Gamma"),
        ])));
        screen.handle(Response::EmployeeRefsLoaded(Ok(vec![
            person("E1", "Ada"),
            person("E2", "Grace"),
        ])));
        assert!(!screen.is_loading());
        screen
    }

    fn unavailable() -> BackendError {
        BackendError::Unavailable("connection reset".to_string())
    }

    fn names(screen: &ProjectScreen) -> Vec<&str> {
        screen.projects().iter().map(|p| p.name.as_str()).collect()
    }

    fn submit_rename(screen: &mut ProjectScreen, selector: &str, name: &str) -> Ticket {
        let target = screen.select(selector).expect("target").clone();
        let mut form = screen.open_edit(target).expect("edit");
        form.name = Some(name.to_string());
        match screen.submit(form).expect("submit") {
            Some(Request::UpdateProject { ticket, .. }) => ticket,
            other => panic!("expected update request, got {other:?}"),
        }
    }

    #[test]
    fn fetch_failures_are_independent() {
        let mut screen = ProjectScreen::new();
        screen.mount();
        screen.handle(Response::EmployeeRefsLoaded(Err(unavailable())));
        screen.handle(Response::ProjectsLoaded(Ok(vec![project(Some("P1"), "Alpha")])));

        assert_eq!(names(&screen), vec!["Alpha"]);
        assert!(screen.employees().is_empty());
        let notices = screen.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Failed to fetch employees");
    }

    #[test]
    fn only_one_dialog_at_a_time() {
        let mut screen = loaded();
        let beta = screen.select("P2").expect("P2").clone();
        screen.open_view(beta.clone()).expect("view");
        assert!(matches!(
            screen.open_delete(beta.clone()),
            Err(ScreenError::ModalBusy { open: "view project" })
        ));
        screen.cancel();
        screen.open_delete(beta).expect("delete after closing view");
    }

    #[test]
    fn invalid_form_keeps_dialog_open_without_request() {
        let mut screen = loaded();
        screen.open_add().expect("add");
        let result = screen.submit(ProjectForm::default());
        assert!(matches!(result, Err(ScreenError::Invalid(_))));
        assert_eq!(
            screen.modal(),
            Some(&ProjectModal::Add {
                phase: ModalPhase::Open
            })
        );
    }

    #[test]
    fn failed_create_reopens_dialog_and_keeps_list() {
        let mut screen = loaded();
        screen.open_add().expect("add");
        let mut form = ProjectForm::from_project(&project(None, "Delta"));
        form.status = None;
        form.progress = None;
        let request = screen.submit(form).expect("submit").expect("request");
        let Request::CreateProject { ticket, .. } = request else {
            panic!("expected create request");
        };
        assert_eq!(
            screen.modal().map(ProjectModal::phase),
            Some(ModalPhase::Submitting(ticket))
        );

        screen.handle(Response::ProjectCreated {
            ticket,
            result: Err(unavailable()),
        });
        assert_eq!(names(&screen), vec!["Alpha", "Beta", "Gamma"]);
        assert_eq!(
            screen.modal().map(ProjectModal::phase),
            Some(ModalPhase::Open)
        );
        assert_eq!(screen.take_notices()[0].message, "Failed to create project!");
    }

    #[test]
    fn edit_replaces_only_the_matching_entry() {
        let mut screen = loaded();
        let beta = screen.select("P2").expect("P2").clone();
        let mut form = screen.open_edit(beta).expect("edit");
        form.name = Some("Beta v2".to_string());
        form.status = Some(ProjectStatus::Completed);
        form.progress = Some(100);
        form.assigned_person = Some("E2".to_string());
        form.end_date = Some(ymd(2024, 4, 1));

        let request = screen.submit(form).expect("submit").expect("request");
        let Request::UpdateProject { ticket, id, input } = request else {
            panic!("expected update request");
        };
        assert_eq!(id, "P2");
        assert_eq!(input.assigned_person, "E2");

        screen.handle(Response::ProjectUpdated {
            ticket,
            id,
            result: Ok(()),
        });
        assert_eq!(names(&screen), vec!["Alpha", "Beta v2", "Gamma"]);
        let updated = &screen.projects()[1];
        assert_eq!(updated.id.as_deref(), Some("P2"));
        assert_eq!(updated.status, ProjectStatus::Completed);
        assert_eq!(updated.end_date, ymd(2024, 4, 1));
        assert_eq!(updated.assigned_name(), Some("Grace"));
        assert_eq!(screen.projects()[0], project(Some("P1"), "Alpha"));
        assert!(screen.modal().is_none());
    }

    #[test]
    fn failed_edit_leaves_list_unchanged() {
        let mut screen = loaded();
        let before = screen.projects().to_vec();
        let ticket = submit_rename(&mut screen, "P1", "Renamed");

        screen.handle(Response::ProjectUpdated {
            ticket,
            id: "P1".to_string(),
            result: Err(unavailable()),
        });
        assert_eq!(screen.projects(), before.as_slice());
        assert_eq!(screen.take_notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn overlapping_edits_of_one_record_keep_their_own_values() {
        let mut screen = loaded();
        let first = submit_rename(&mut screen, "P2", "First");
        screen.cancel();
        let second = submit_rename(&mut screen, "P2", "Second");
        assert_ne!(first, second);

        screen.handle(Response::ProjectUpdated {
            ticket: first,
            id: "P2".to_string(),
            result: Ok(()),
        });
        assert_eq!(names(&screen), vec!["Alpha", "First", "Gamma"]);
        assert_eq!(
            screen.modal().map(ProjectModal::phase),
            Some(ModalPhase::Submitting(second))
        );

        screen.handle(Response::ProjectUpdated {
            ticket: second,
            id: "P2".to_string(),
            result: Err(unavailable()),
        });
        assert_eq!(names(&screen), vec!["Alpha", "First", "Gamma"]);
        assert_eq!(
            screen.modal().map(ProjectModal::phase),
            Some(ModalPhase::Open)
        );
        let messages: Vec<String> = screen
            .take_notices()
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(
            messages,
            vec!["Project edited successfully!", "Failed to edit project!"]
        );
    }

    #[test]
    fn missing_identifier_aborts_without_request() {
        let mut screen = loaded();
        screen.handle(Response::ProjectsLoaded(Ok(vec![project(None, "Orphan")])));

        let orphan = screen.select("1").expect("row 1").clone();
        let form = screen.open_edit(orphan.clone()).expect("edit");
        assert_eq!(screen.submit(form).expect("submit"), None);
        assert!(screen.modal().is_none());

        screen.open_delete(orphan).expect("delete");
        assert_eq!(screen.confirm_delete().expect("confirm"), None);
        assert!(screen.modal().is_none());

        let messages: Vec<String> = screen
            .take_notices()
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(
            messages,
            vec!["Unable to edit project.", "Unable to delete project."]
        );
        assert_eq!(names(&screen), vec!["Orphan"]);
    }

    #[test]
    fn delete_failure_keeps_record() {
        let mut screen = loaded();
        let gamma = screen.select("P3").expect("P3").clone();
        screen.open_delete(gamma).expect("delete");
        let request = screen.confirm_delete().expect("confirm");
        let Some(Request::DeleteProject { ticket, id }) = request else {
            panic!("expected delete request");
        };
        assert_eq!(id, "P3");
        assert!(matches!(
            screen.confirm_delete(),
            Err(ScreenError::Submitting { .. })
        ));

        screen.handle(Response::ProjectDeleted {
            ticket,
            id,
            result: Err(unavailable()),
        });
        assert_eq!(screen.projects().len(), 3);
        assert_eq!(
            screen.modal().map(ProjectModal::phase),
            Some(ModalPhase::Open)
        );
    }

    #[test]
    fn late_create_still_lands_after_cancel() {
        let mut screen = loaded();
        screen.open_add().expect("add");
        let mut form = ProjectForm::from_project(&project(None, "Late"));
        form.status = None;
        let Some(Request::CreateProject { ticket, .. }) = screen.submit(form).expect("submit")
        else {
            panic!("expected create request");
        };
        screen.cancel();
        screen.open_view(project(Some("P1"), "Alpha")).expect("view");

        screen.handle(Response::ProjectCreated {
            ticket,
            result: Ok(project(Some("P9"), "Late")),
        });
        assert_eq!(names(&screen), vec!["Late", "Alpha", "Beta", "Gamma"]);
        assert!(matches!(screen.modal(), Some(ProjectModal::View { .. })));
    }

    #[test]
    fn submit_requires_a_form_dialog() {
        let mut screen = loaded();
        assert!(matches!(
            screen.submit(ProjectForm::default()),
            Err(ScreenError::NoModal)
        ));
        screen
            .open_view(project(Some("P1"), "Alpha"))
            .expect("view");
        assert!(matches!(
            screen.submit(ProjectForm::default()),
            Err(ScreenError::WrongModal { .. })
        ));
        assert!(matches!(
            screen.confirm_delete(),
            Err(ScreenError::WrongModal { .. })
        ));
    }
}
