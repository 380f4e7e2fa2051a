use staffdesk_shared::Employee;
use tracing::{info, instrument, warn};

use super::{Keyed, Notice, RecordList, Request, Response, ScreenError};

/// Where new employees are created; this screen only links to it.
pub const ADD_EMPLOYEE_ROUTE: &str = "/c/employees/add";

#[derive(Debug, Default)]
pub struct EmployeeScreen {
    employees: RecordList<Employee>,
    deleting: Option<Employee>,
    loading: bool,
    notices: Vec<Notice>,
}

impl EmployeeScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn employees(&self) -> &[Employee] {
        self.employees.as_slice()
    }

    pub fn select(&self, selector: &str) -> Result<&Employee, ScreenError> {
        self.employees
            .select(selector)
            .ok_or_else(|| ScreenError::NotFound(selector.to_string()))
    }

    /// The record held by the open delete confirmation, if any.
    pub fn deleting(&self) -> Option<&Employee> {
        self.deleting.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    #[instrument(skip(self))]
    pub fn mount(&mut self) -> Request {
        self.loading = true;
        Request::FetchEmployees
    }

    #[instrument(skip(self, response))]
    pub fn handle(&mut self, response: Response) {
        match response {
            Response::EmployeesLoaded(Ok(employees)) => {
                info!(count = employees.len(), "employees loaded");
                self.loading = false;
                self.employees.replace_all(employees);
            }
            Response::EmployeesLoaded(Err(err)) => {
                warn!(error = %err, "employee fetch failed");
                self.loading = false;
                self.employees.clear();
                self.notices.push(Notice::error("Failed to fetch employees"));
            }
            other => warn!(?other, "employee screen ignored unrelated response"),
        }
    }

    #[instrument(skip(self, employee), fields(id = %employee.id))]
    pub fn open_delete(&mut self, employee: Employee) -> Result<(), ScreenError> {
        if self.deleting.is_some() {
            return Err(ScreenError::ModalBusy { open: "delete" });
        }
        self.deleting = Some(employee);
        Ok(())
    }

    /// Removes the held record from the local list. No backend call is
    /// made; the backend keeps the employee.
    #[instrument(skip(self))]
    pub fn confirm_delete(&mut self) -> Result<(), ScreenError> {
        let target = self.deleting.take().ok_or(ScreenError::NoModal)?;
        let removed = target
            .key()
            .map(|id| self.employees.remove_by_key(id))
            .unwrap_or_default();
        warn!(
            id = %target.id,
            removed,
            "employee removed locally only; backend delete is not wired"
        );
        self.notices
            .push(Notice::success("Employee deleted successfully"));
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        if let Some(target) = self.deleting.take() {
            info!(id = %target.id, "employee delete cancelled");
        }
    }

    pub fn edit(&mut self, employee: &Employee) {
        info!(id = %employee.id, "employee edit requested");
        self.notices
            .push(Notice::info("Editing employees is not implemented yet"));
    }

    pub fn view(&mut self, employee: &Employee) {
        info!(id = %employee.id, "employee details requested");
        self.notices
            .push(Notice::info("Employee details are not implemented yet"));
    }

    pub fn add(&self) -> &'static str {
        ADD_EMPLOYEE_ROUTE
    }
}

#[cfg(test)]
mod tests {
    use staffdesk_shared::Employee;

    use super::EmployeeScreen;
    use crate::backend::BackendError;
    use crate::screen::{NoticeLevel, Request, Response, ScreenError};

    fn employee(id: &str, name: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: name.to_string(),
            phone: "555-0100".to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            employee_code: format!("EMP-{id}"),
            profile_pic: None,
            joining_date: "2023-04-01".to_string(),
        }
    }

    fn loaded() -> EmployeeScreen {
        let mut screen = EmployeeScreen::new();
        assert_eq!(screen.mount(), Request::FetchEmployees);
        screen.handle(Response::EmployeesLoaded(Ok(vec![
            employee("E1", "Ada"),
            employee("E2", "Grace"),
            employee("E3", "Linus"),
        ])));
        screen
    }

    #[test]
    fn fetch_replaces_list_exactly() {
        let screen = loaded();
        let ids: Vec<&str> = screen.employees().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E2", "E3"]);
        assert!(!screen.is_loading());
    }

    #[test]
    fn fetch_failure_empties_list_and_notifies() {
        let mut screen = loaded();
        screen.mount();
        screen.handle(Response::EmployeesLoaded(Err(BackendError::Unavailable(
            "connection refused".to_string(),
        ))));

        assert!(screen.employees().is_empty());
        let notices = screen.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Failed to fetch employees");
    }

    #[test]
    fn confirm_delete_removes_locally() {
        let mut screen = loaded();
        let target = screen.select("E2").expect("E2").clone();
        screen.open_delete(target).expect("open");
        assert_eq!(screen.deleting().map(|e| e.id.as_str()), Some("E2"));

        screen.confirm_delete().expect("confirm");
        let ids: Vec<&str> = screen.employees().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E3"]);
        assert!(screen.deleting().is_none());
        assert_eq!(screen.take_notices()[0].level, NoticeLevel::Success);
    }

    #[test]
    fn cancel_delete_keeps_list() {
        let mut screen = loaded();
        let target = screen.select("1").expect("row 1").clone();
        screen.open_delete(target).expect("open");
        screen.cancel_delete();

        assert_eq!(screen.employees().len(), 3);
        assert!(screen.deleting().is_none());
        assert!(matches!(screen.confirm_delete(), Err(ScreenError::NoModal)));
    }

    #[test]
    fn second_delete_dialog_is_rejected() {
        let mut screen = loaded();
        screen
            .open_delete(employee("E1", "Ada"))
            .expect("first dialog");
        assert!(matches!(
            screen.open_delete(employee("E2", "Grace")),
            Err(ScreenError::ModalBusy { .. })
        ));
    }

    #[test]
    fn edit_and_view_leave_state_alone() {
        let mut screen = loaded();
        let target = employee("E1", "Ada");
        screen.edit(&target);
        screen.view(&target);
        assert_eq!(screen.employees().len(), 3);
        assert_eq!(screen.take_notices().len(), 2);
        assert_eq!(screen.add(), "/c/employees/add");
    }
}
