//! Executes screen requests against a backend and routes the responses
//! back to the screens.

use futures::future::join_all;
use tracing::{debug, instrument};

use crate::backend::Backend;
use crate::screen::{EmployeeScreen, Notice, ProjectScreen, Request, Response};

#[instrument(skip(backend))]
pub async fn execute<B: Backend + ?Sized>(backend: &B, request: Request) -> Response {
    match request {
        Request::FetchEmployees => Response::EmployeesLoaded(backend.list_employees().await),
        Request::FetchEmployeeRefs => {
            Response::EmployeeRefsLoaded(backend.list_employee_refs().await)
        }
        Request::FetchProjects => Response::ProjectsLoaded(backend.list_projects().await),
        Request::CreateProject { ticket, input } => Response::ProjectCreated {
            ticket,
            result: backend.create_project(&input).await,
        },
        Request::UpdateProject { ticket, id, input } => {
            let result = backend.update_project(&id, &input).await;
            Response::ProjectUpdated { ticket, id, result }
        }
        Request::DeleteProject { ticket, id } => {
            let result = backend.delete_project(&id).await;
            Response::ProjectDeleted { ticket, id, result }
        }
    }
}

/// Runs every request at once and returns the responses in request order.
pub async fn execute_all<B: Backend + ?Sized>(backend: &B, requests: Vec<Request>) -> Vec<Response> {
    if requests.len() > 1 {
        debug!(count = requests.len(), "running requests concurrently");
    }
    join_all(
        requests
            .into_iter()
            .map(|request| execute(backend, request)),
    )
    .await
}

pub struct Workspace<B> {
    backend: B,
    pub employees: EmployeeScreen,
    pub projects: ProjectScreen,
    employees_mounted: bool,
    projects_mounted: bool,
}

impl<B: Backend> Workspace<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            employees: EmployeeScreen::new(),
            projects: ProjectScreen::new(),
            employees_mounted: false,
            projects_mounted: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[instrument(skip(self))]
    pub async fn mount_employees(&mut self) {
        let request = self.employees.mount();
        self.employees_mounted = true;
        self.run(vec![request]).await;
    }

    #[instrument(skip(self))]
    pub async fn mount_projects(&mut self) {
        let requests = self.projects.mount();
        self.projects_mounted = true;
        self.run(requests).await;
    }

    /// Mounts on first use only.
    pub async fn ensure_employees(&mut self) {
        if !self.employees_mounted {
            self.mount_employees().await;
        }
    }

    pub async fn ensure_projects(&mut self) {
        if !self.projects_mounted {
            self.mount_projects().await;
        }
    }

    pub async fn run(&mut self, requests: Vec<Request>) {
        for response in execute_all(&self.backend, requests).await {
            self.route(response);
        }
    }

    pub async fn run_one(&mut self, request: Option<Request>) {
        if let Some(request) = request {
            self.run(vec![request]).await;
        }
    }

    fn route(&mut self, response: Response) {
        match response {
            Response::EmployeesLoaded(_) => self.employees.handle(response),
            _ => self.projects.handle(response),
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut notices = self.employees.take_notices();
        notices.extend(self.projects.take_notices());
        notices
    }
}
