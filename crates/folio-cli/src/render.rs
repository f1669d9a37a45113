//! Plain-text views of store records

use folio_store::model::detail::{link_type_name, task_state_name};
use folio_store::{DetailRecord, Project, Season, StatusColumn};
use std::fmt::Write;

pub(crate) fn board(columns: &[StatusColumn]) -> String {
    let mut out = String::new();
    for column in columns {
        let _ = writeln!(out, "{} ({})", column.meta.label, column.projects.len());
        for project in &column.projects {
            let _ = writeln!(out, "  {}", project_line(project));
        }
    }
    out.trim_end().to_string()
}

fn project_line(project: &Project) -> String {
    let mut line = format!("{:<24} {} [{}]", project.id, project.title, project.category);
    if let Some(jevm) = &project.jevm {
        let _ = write!(line, " jevm {}/{:.1}", jevm.sum(), jevm.average());
    }
    line
}

pub(crate) fn project(project: &Project, record: &DetailRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", project.title, project.id);
    let _ = writeln!(out, "status: {}  category: {}", project.status, project.category);

    let detail = &record.detail;
    if let Some(outcomes) = detail.focus.as_ref().and_then(|f| f.outcomes.as_ref()) {
        let _ = writeln!(out, "\nfocus:");
        for outcome in outcomes {
            let _ = writeln!(out, "  - {outcome}");
        }
    }
    if !detail.tasks.is_empty() {
        let _ = writeln!(out, "\ntasks:");
        for task in &detail.tasks {
            let estimate = task.estimate.map(|e| format!(" ~{e}")).unwrap_or_default();
            let _ = writeln!(
                out,
                "  [{:<7}] {} {}{estimate}",
                task_state_name(task.state),
                task.id,
                task.title
            );
        }
    }
    if !detail.links.is_empty() {
        let _ = writeln!(out, "\nlinks:");
        for link in &detail.links {
            let _ = writeln!(out, "  {} {}", link_type_name(link.link_type), link.to_id);
        }
    }
    if !record.notes.is_empty() {
        let _ = writeln!(out, "\n{}", record.notes);
    }
    out.trim_end().to_string()
}

pub(crate) fn season(season: &Season) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} .. {}  {}", season.id, season.start, season.end, season.theme);
    for initiative in &season.initiatives {
        let _ = writeln!(out, "  {:?} {}", initiative.role, initiative.project_id);
        for outcome in &initiative.outcomes {
            let _ = writeln!(out, "      - {outcome}");
        }
    }
    for week in &season.weekly {
        let _ = writeln!(out, "  week {}: {}", week.week_start, week.picks.join(", "));
    }
    out.trim_end().to_string()
}

pub(crate) fn seasons(seasons: &[Season], current: Option<&str>) -> String {
    seasons
        .iter()
        .map(|s| {
            let marker = if Some(s.id.as_str()) == current { "*" } else { " " };
            format!("{marker} {} {} .. {}  {}", s.id, s.start, s.end, s.theme)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
