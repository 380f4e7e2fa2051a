use std::io::{self, BufRead, Write};

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument};

use crate::backend::Backend;
use crate::cli::Invocation;
use crate::dates;
use crate::driver::Workspace;
use crate::form::ProjectForm;
use crate::render::ScreenView;
use crate::screen::{ProjectModal, ScreenError};

pub fn known_command_names() -> Vec<&'static str> {
    vec!["employees", "projects", "shell", "help", "version"]
}

pub fn known_actions(command: &str) -> Vec<&'static str> {
    match command {
        "employees" => vec!["list", "delete", "edit", "view", "add", "export"],
        "projects" => vec!["list", "view", "add", "edit", "delete", "export"],
        _ => vec![],
    }
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    /// Leave the dialog open and answer with a later command.
    Later,
}

pub trait Confirm {
    fn confirm(&mut self, question: &str) -> anyhow::Result<Confirmation>;
}

/// Asks on the terminal; anything but `y`/`yes` declines.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> anyhow::Result<Confirmation> {
        print!("{question} [y/N] ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("failed reading confirmation")?;
        Ok(parse_answer(&answer))
    }
}

/// Never answers; the shell resolves dialogs with `confirm`/`cancel`.
#[derive(Debug, Default)]
pub struct Deferred;

impl Confirm for Deferred {
    fn confirm(&mut self, _question: &str) -> anyhow::Result<Confirmation> {
        Ok(Confirmation::Later)
    }
}

fn parse_answer(answer: &str) -> Confirmation {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Confirmation::Yes,
        _ => Confirmation::No,
    }
}

#[instrument(skip(ws, view, confirm, inv), fields(command = %inv.command, action = %inv.action))]
pub async fn dispatch<B, V, C>(
    ws: &mut Workspace<B>,
    view: &mut V,
    confirm: &mut C,
    inv: Invocation,
) -> anyhow::Result<()>
where
    B: Backend,
    V: ScreenView,
    C: Confirm + ?Sized,
{
    debug!(args = ?inv.args, "dispatching command");

    let result = match inv.command.as_str() {
        "employees" => dispatch_employees(ws, view, confirm, &inv.action, &inv.args).await,
        "projects" => dispatch_projects(ws, view, confirm, &inv.action, &inv.args).await,
        "help" => cmd_help(view),
        "version" => view.line(env!("CARGO_PKG_VERSION")),
        "shell" => Err(anyhow!("already inside the shell")),
        other => Err(anyhow!("unknown command: {other}")),
    };

    let notices = ws.take_notices();
    view.notices(&notices)?;
    result
}

async fn dispatch_employees<B, V, C>(
    ws: &mut Workspace<B>,
    view: &mut V,
    confirm: &mut C,
    action: &str,
    args: &[String],
) -> anyhow::Result<()>
where
    B: Backend,
    V: ScreenView,
    C: Confirm + ?Sized,
{
    ws.ensure_employees().await;

    match action {
        "list" => view.employees(ws.employees.employees()),
        "delete" => {
            let (selector, assume_yes) = selector_and_flags(args, "employees delete")?;
            let target = ws.employees.select(&selector)?.clone();
            ws.employees.open_delete(target.clone())?;
            view.confirm_employee_delete(&target)?;

            match answer(confirm, assume_yes, "Delete this employee?")? {
                Confirmation::Yes => {
                    ws.employees.confirm_delete()?;
                    view.employees(ws.employees.employees())
                }
                Confirmation::No => {
                    ws.employees.cancel_delete();
                    view.line("Delete cancelled.")
                }
                Confirmation::Later => view.line("Type `confirm` to delete or `cancel` to keep it."),
            }
        }
        "edit" => {
            let (selector, _) = selector_and_flags(args, "employees edit")?;
            let target = ws.employees.select(&selector)?.clone();
            ws.employees.edit(&target);
            Ok(())
        }
        "view" => {
            let (selector, _) = selector_and_flags(args, "employees view")?;
            let target = ws.employees.select(&selector)?.clone();
            ws.employees.view(&target);
            Ok(())
        }
        "add" => {
            let route = ws.employees.add();
            info!(route, "employee creation lives on another screen");
            view.line(&format!("New employees are added at {route}"))
        }
        "export" => {
            let json = serde_json::to_string_pretty(ws.employees.employees())
                .context("failed to encode employees")?;
            view.line(&json)
        }
        other => Err(anyhow!("unknown employees action: {other}")),
    }
}

async fn dispatch_projects<B, V, C>(
    ws: &mut Workspace<B>,
    view: &mut V,
    confirm: &mut C,
    action: &str,
    args: &[String],
) -> anyhow::Result<()>
where
    B: Backend,
    V: ScreenView,
    C: Confirm + ?Sized,
{
    ws.ensure_projects().await;

    match action {
        "list" => view.projects(ws.projects.projects()),
        "view" => {
            let (selector, _) = selector_and_flags(args, "projects view")?;
            let target = ws.projects.select(&selector)?.clone();
            ws.projects.open_view(target.clone())?;
            let shown = view.project_detail(&target);
            ws.projects.cancel();
            shown
        }
        "add" => {
            ws.projects.open_add()?;
            let form = build_form(ProjectForm::default(), args);
            submit_form(ws, view, form).await
        }
        "edit" => {
            let (selector, fields) = args
                .split_first()
                .ok_or_else(|| anyhow!("projects edit: an id or row number is required"))?;
            let target = ws.projects.select(selector)?.clone();
            let prefilled = ws.projects.open_edit(target)?;
            let form = build_form(prefilled, fields);
            submit_form(ws, view, form).await
        }
        "delete" => {
            let (selector, assume_yes) = selector_and_flags(args, "projects delete")?;
            let target = ws.projects.select(&selector)?.clone();
            ws.projects.open_delete(target.clone())?;
            view.confirm_project_delete(&target)?;

            match answer(confirm, assume_yes, "Delete this project?")? {
                Confirmation::Yes => confirm_project_delete(ws, view).await,
                Confirmation::No => {
                    ws.projects.cancel();
                    view.line("Delete cancelled.")
                }
                Confirmation::Later => view.line("Type `confirm` to delete or `cancel` to keep it."),
            }
        }
        "export" => {
            let json = serde_json::to_string_pretty(ws.projects.projects())
                .context("failed to encode projects")?;
            view.line(&json)
        }
        other => Err(anyhow!("unknown projects action: {other}")),
    }
}

/// Resolves whichever delete dialog is open.
pub async fn confirm_open<B, V>(ws: &mut Workspace<B>, view: &mut V) -> anyhow::Result<()>
where
    B: Backend,
    V: ScreenView,
{
    if ws.employees.deleting().is_some() {
        ws.employees.confirm_delete()?;
        return view.employees(ws.employees.employees());
    }
    match ws.projects.modal() {
        Some(ProjectModal::Delete { .. }) => confirm_project_delete(ws, view).await,
        Some(other) => Err(anyhow!("the {} dialog has nothing to confirm", other.name())),
        None => Err(ScreenError::NoModal.into()),
    }
}

/// Closes every open dialog without changing any list.
pub fn cancel_open<B: Backend>(ws: &mut Workspace<B>) {
    ws.employees.cancel_delete();
    ws.projects.cancel();
}

async fn confirm_project_delete<B, V>(ws: &mut Workspace<B>, view: &mut V) -> anyhow::Result<()>
where
    B: Backend,
    V: ScreenView,
{
    let request = ws.projects.confirm_delete()?;
    ws.run_one(request).await;
    view.projects(ws.projects.projects())
}

/// Applies `field:value` tokens in order; later tokens win.
fn build_form(mut form: ProjectForm, tokens: &[String]) -> anyhow::Result<ProjectForm> {
    let today = dates::today();
    for token in tokens {
        form.set_field(token, today)?;
    }
    Ok(form)
}

async fn submit_form<B, V>(
    ws: &mut Workspace<B>,
    view: &mut V,
    form: anyhow::Result<ProjectForm>,
) -> anyhow::Result<()>
where
    B: Backend,
    V: ScreenView,
{
    let outcome = match form.map(|form| ws.projects.submit(form)) {
        Ok(Ok(request)) => {
            ws.run_one(request).await;
            Ok(())
        }
        Ok(Err(ScreenError::Invalid(errors))) => {
            view.form_errors(&errors)?;
            Err(anyhow!("project form is incomplete"))
        }
        Ok(Err(err)) => Err(err.into()),
        Err(err) => Err(err),
    };

    // A one-shot command cannot keep a form dialog open for another try.
    if matches!(
        ws.projects.modal(),
        Some(ProjectModal::Add { .. } | ProjectModal::Edit { .. })
    ) {
        ws.projects.cancel();
    }

    outcome?;
    view.projects(ws.projects.projects())
}

fn answer<C: Confirm + ?Sized>(
    confirm: &mut C,
    assume_yes: bool,
    question: &str,
) -> anyhow::Result<Confirmation> {
    if assume_yes {
        return Ok(Confirmation::Yes);
    }
    confirm.confirm(question)
}

fn selector_and_flags(args: &[String], usage: &str) -> anyhow::Result<(String, bool)> {
    let assume_yes = args.iter().any(|a| a == "--yes" || a == "-y");
    let selector = args
        .iter()
        .find(|a| !a.starts_with('-'))
        .ok_or_else(|| anyhow!("{usage}: an id or row number is required"))?;
    Ok((selector.clone(), assume_yes))
}

fn cmd_help<V: ScreenView>(view: &mut V) -> anyhow::Result<()> {
    let lines = [
        "usage: staffdesk [-v|-q] [--rc KEY=VALUE] [--config PATH] <command> [action] [args]",
        "",
        "employees list                     show all employees",
        "employees delete <id|row> [--yes]  remove an employee from the local list",
        "employees edit|view <id|row>       not implemented yet",
        "employees add                      show where employees are created",
        "employees export                   print the loaded employees as JSON",
        "projects list                      show all projects",
        "projects view <id|row>             show every field of a project",
        "projects add field:value...        create a project",
        "projects edit <id|row> field:value...  change a project",
        "projects delete <id|row> [--yes]   delete a project",
        "projects export                    print the loaded projects as JSON",
        "shell                              interactive session (confirm, cancel, refresh, quit)",
        "",
        "fields: name: description: priority: status: progress: start: end: assigned:",
        "dates:  YYYY-MM-DD, today, tomorrow, yesterday",
    ];
    for line in lines {
        view.line(line)?;
    }
    Ok(())
}
