use std::io::{self, IsTerminal, Stdout, Write};

use staffdesk_shared::{Employee, Project, ProjectPriority, ProjectStatus};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::{Config, DEFAULT_DESCRIPTION_WIDTH};
use crate::dates::format_long;
use crate::form::FormErrors;
use crate::screen::{Notice, NoticeLevel};

/// What the screens need from a display surface.
pub trait ScreenView {
    fn employees(&mut self, employees: &[Employee]) -> anyhow::Result<()>;
    fn projects(&mut self, projects: &[Project]) -> anyhow::Result<()>;
    fn project_detail(&mut self, project: &Project) -> anyhow::Result<()>;
    fn confirm_employee_delete(&mut self, employee: &Employee) -> anyhow::Result<()>;
    fn confirm_project_delete(&mut self, project: &Project) -> anyhow::Result<()>;
    fn form_errors(&mut self, errors: &FormErrors) -> anyhow::Result<()>;
    fn notices(&mut self, notices: &[Notice]) -> anyhow::Result<()>;
    fn line(&mut self, text: &str) -> anyhow::Result<()>;
    /// Writes `text` without a newline and flushes.
    fn prompt(&mut self, text: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagColor {
    Green,
    Blue,
    Orange,
    Red,
    Yellow,
}

impl TagColor {
    fn ansi(self) -> &'static str {
        match self {
            TagColor::Green => "32",
            TagColor::Blue => "34",
            TagColor::Orange => "38;5;208",
            TagColor::Red => "31",
            TagColor::Yellow => "33",
        }
    }
}

pub fn status_color(status: ProjectStatus) -> TagColor {
    match status {
        ProjectStatus::Completed => TagColor::Green,
        ProjectStatus::InProgress => TagColor::Blue,
        ProjectStatus::NotStarted => TagColor::Orange,
    }
}

pub fn priority_color(priority: ProjectPriority) -> TagColor {
    match priority {
        ProjectPriority::High => TagColor::Red,
        ProjectPriority::Medium => TagColor::Yellow,
        ProjectPriority::Low => TagColor::Green,
    }
}

/// Cuts `text` to at most `width` display columns, ending in `…` when
/// anything was dropped. Only the first line is kept.
pub fn truncate(text: &str, width: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    let clipped = first_line.len() != text.trim_end().len();
    if !clipped && UnicodeWidthStr::width(first_line) <= width {
        return first_line.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in first_line.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

#[derive(Debug, Clone)]
pub struct Renderer<W> {
    out: W,
    color: bool,
    description_width: usize,
}

impl Renderer<Stdout> {
    pub fn stdout(cfg: &Config) -> anyhow::Result<Self> {
        let tty = io::stdout().is_terminal();
        Self::new(io::stdout(), cfg, tty)
    }
}

impl<W: Write> Renderer<W> {
    /// `color_capable` says whether the writer can show ANSI colours at
    /// all; the `color` setting can only turn them off.
    pub fn new(out: W, cfg: &Config, color_capable: bool) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true) && color_capable;
        let description_width = cfg
            .get_usize("description.width")?
            .unwrap_or(DEFAULT_DESCRIPTION_WIDTH);

        Ok(Self {
            out,
            color,
            description_width,
        })
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, color: TagColor) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{}m{text}\x1b[0m", color.ansi())
    }

    fn tag(&self, text: &str, color: TagColor) -> String {
        self.paint(&format!("[{text}]"), color)
    }
}

impl<W: Write> ScreenView for Renderer<W> {
    #[tracing::instrument(skip_all, fields(count = employees.len()))]
    fn employees(&mut self, employees: &[Employee]) -> anyhow::Result<()> {
        let headers = ["Employee ID", "Name", "Contacts", "Date of Joining", "Key"];

        let rows = employees
            .iter()
            .map(|employee| {
                let mut contacts = format!("Phone: {}\nEmail: {}", employee.phone, employee.email);
                if let Some(pic) = employee.profile_pic.as_deref().filter(|p| !p.is_empty()) {
                    contacts.push_str(&format!("\nAvatar: {pic}"));
                }
                vec![
                    employee.employee_code.clone(),
                    employee.name.clone(),
                    contacts,
                    employee.joining_date.clone(),
                    employee.id.clone(),
                ]
            })
            .collect();

        write_table(&mut self.out, &headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(count = projects.len()))]
    fn projects(&mut self, projects: &[Project]) -> anyhow::Result<()> {
        let headers = [
            "#",
            "Project Name",
            "Description",
            "Status",
            "Progress",
            "Priority",
            "Dates",
            "Assigned",
            "ID",
        ];

        let rows = projects
            .iter()
            .enumerate()
            .map(|(idx, project)| {
                vec![
                    (idx + 1).to_string(),
                    project.name.clone(),
                    truncate(&project.description, self.description_width),
                    self.tag(project.status.label(), status_color(project.status)),
                    project.progress.to_string(),
                    self.tag(project.priority.label(), priority_color(project.priority)),
                    format!(
                        "Start: {}\nEnd: {}",
                        format_long(project.start_date),
                        format_long(project.end_date)
                    ),
                    project.assigned_name().unwrap_or("Not Assigned").to_string(),
                    project.id.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();

        write_table(&mut self.out, &headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(id = ?project.id))]
    fn project_detail(&mut self, project: &Project) -> anyhow::Result<()> {
        let status = self.tag(project.status.label(), status_color(project.status));
        let priority = self.tag(project.priority.label(), priority_color(project.priority));
        let out = &mut self.out;

        writeln!(out, "Project Name:    {}", project.name)?;
        writeln!(out, "Description:     {}", project.description)?;
        writeln!(out, "Priority:        {priority}")?;
        writeln!(out, "Status:          {status}")?;
        writeln!(out, "Progress:        {}", project.progress)?;
        writeln!(out, "Start Date:      {}", format_long(project.start_date))?;
        writeln!(out, "End Date:        {}", format_long(project.end_date))?;
        writeln!(
            out,
            "Assigned Person: {}",
            project.assigned_name().unwrap_or("Not Assigned")
        )?;
        writeln!(out, "ID:              {}", project.id.as_deref().unwrap_or("-"))?;
        Ok(())
    }

    fn confirm_employee_delete(&mut self, employee: &Employee) -> anyhow::Result<()> {
        writeln!(self.out, "Are you sure you want to delete this employee?")?;
        writeln!(self.out, "Name: {}", employee.name)?;
        Ok(())
    }

    fn confirm_project_delete(&mut self, project: &Project) -> anyhow::Result<()> {
        writeln!(self.out, "Are you sure you want to delete this project?")?;
        writeln!(self.out, "Project Name: {}", project.name)?;
        Ok(())
    }

    fn form_errors(&mut self, errors: &FormErrors) -> anyhow::Result<()> {
        for error in &errors.0 {
            let marker = self.paint("!", TagColor::Red);
            writeln!(self.out, "{marker} {:<15} {}", error.field, error.message)?;
        }
        Ok(())
    }

    fn notices(&mut self, notices: &[Notice]) -> anyhow::Result<()> {
        for notice in notices {
            let marker = match notice.level {
                NoticeLevel::Success => self.paint("✓", TagColor::Green),
                NoticeLevel::Error => self.paint("✗", TagColor::Red),
                NoticeLevel::Info => "·".to_string(),
            };
            writeln!(self.out, "{marker} {}", notice.message)?;
        }
        Ok(())
    }

    fn line(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> anyhow::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Writes an aligned table. Cells may span several lines; each row is as
/// tall as its tallest cell.
fn write_table<W: Write>(
    mut writer: W,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(*header))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            for line in cell.lines() {
                widths[idx] = widths[idx].max(visible_width(line));
            }
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "{:width$} ", header, width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        let cells: Vec<Vec<&str>> = row.iter().map(|cell| cell.lines().collect()).collect();
        let height = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);

        for line_idx in 0..height {
            for idx in 0..column_count {
                let text = cells
                    .get(idx)
                    .and_then(|lines| lines.get(line_idx))
                    .copied()
                    .unwrap_or_default();
                let padding = widths[idx].saturating_sub(visible_width(text));
                write!(writer, "{}{} ", text, " ".repeat(padding))?;
            }
            writeln!(writer)?;
        }
    }

    Ok(())
}

fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(s).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
