//! `folio` - command line front end for the folio store

mod render;

use anyhow::{anyhow, bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use folio_store::prelude::*;
use folio_store::{Jevm, PivotCost, Promotion};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("folio")
        .version(folio_store::VERSION)
        .about("Projects, seasons and weekly picks kept in plain YAML files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("data-root")
                .long("data-root")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Data directory (overrides DATA_DIR)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("YAML file with store settings"),
        )
        .arg(
            Arg::new("auto-commit")
                .long("auto-commit")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Commit changed files to git after every write"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .subcommand(Command::new("projects").about("List projects grouped by status"))
        .subcommand(Command::new("categories").about("List project categories"))
        .subcommand(
            Command::new("show")
                .about("Show a project with its tasks, links and notes")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("create")
                .about("Create a project")
                .arg(Arg::new("title").required(true))
                .arg(Arg::new("id").long("id").help("Explicit id instead of the title slug"))
                .arg(Arg::new("status").long("status").help("Initial status (default: incubate)"))
                .arg(Arg::new("category").long("category").help("Category (default: exploration)"))
                .arg(
                    Arg::new("pivot-cost")
                        .long("pivot-cost")
                        .value_parser(["low", "medium", "high"]),
                ),
        )
        .subcommand(
            Command::new("move")
                .about("Move a project to another status")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("to").required(true))
                .arg(
                    Arg::new("index")
                        .long("index")
                        .value_parser(value_parser!(usize))
                        .help("Position in the target status (default: end)"),
                ),
        )
        .subcommand(
            Command::new("reorder")
                .about("Reorder the projects of one status")
                .arg(Arg::new("status").required(true))
                .arg(Arg::new("ids").required(true).num_args(1..)),
        )
        .subcommand(
            Command::new("rename")
                .about("Give a project a new id")
                .arg(Arg::new("old").required(true))
                .arg(Arg::new("new").required(true))
                .arg(Arg::new("title").long("title").help("New title (default: keep)")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a project and its detail folder")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("score")
                .about("Set or clear joy / energy / value / market scores (0-4)")
                .arg(Arg::new("id").required(true))
                .arg(
                    Arg::new("scores")
                        .num_args(4)
                        .value_parser(value_parser!(u8))
                        .required_unless_present("clear")
                        .value_names(["JOY", "ENERGY", "VALUE", "MARKET"]),
                )
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("scores"),
                ),
        )
        .subcommand(
            Command::new("notes")
                .about("Print or replace a project's notes")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("set").long("set").help("Replace the notes with this text")),
        )
        .subcommand(
            Command::new("task")
                .about("Manage tasks of a project")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("titles").required(true).num_args(1..))
                        .arg(
                            Arg::new("estimate")
                                .long("estimate")
                                .value_parser(value_parser!(u32)),
                        ),
                )
                .subcommand(
                    Command::new("state")
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("task").required(true))
                        .arg(
                            Arg::new("state")
                                .required(true)
                                .value_parser(["todo", "doing", "blocked", "done"]),
                        ),
                )
                .subcommand(
                    Command::new("done")
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("task").required(true)),
                )
                .subcommand(
                    Command::new("remove")
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("task").required(true)),
                )
                .subcommand(
                    Command::new("reorder")
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("tasks").required(true).num_args(1..)),
                )
                .subcommand(
                    Command::new("promote")
                        .about("Turn a task into its own project")
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("task").required(true))
                        .arg(Arg::new("title").long("title"))
                        .arg(Arg::new("status").long("status"))
                        .arg(Arg::new("category").long("category")),
                )
                .subcommand(
                    Command::new("demote")
                        .about("Add a child project back to its parent as a task")
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("child").required(true)),
                ),
        )
        .subcommand(
            Command::new("link")
                .about("Manage links between projects")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("to").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["depends_on", "relates_to", "part_of"]),
                        ),
                )
                .subcommand(
                    Command::new("remove")
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("to").required(true)),
                ),
        )
        .subcommand(Command::new("seasons").about("List seasons"))
        .subcommand(
            Command::new("season")
                .about("Manage one season")
                .subcommand_required(true)
                .subcommand(Command::new("show").arg(Arg::new("id").required(true)))
                .subcommand(Command::new("current").about("Show the current season"))
                .subcommand(
                    Command::new("create")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("start").long("start").required(true))
                        .arg(Arg::new("end").long("end").required(true))
                        .arg(Arg::new("theme").long("theme").default_value("")),
                )
                .subcommand(Command::new("set-current").arg(Arg::new("id").required(true)))
                .subcommand(
                    Command::new("initiative")
                        .about("Add, re-role or remove a project in a season")
                        .arg(Arg::new("season").required(true))
                        .arg(Arg::new("project").required(true))
                        .arg(
                            Arg::new("role")
                                .long("role")
                                .default_value("supporting")
                                .value_parser(["lead", "supporting"]),
                        )
                        .arg(
                            Arg::new("remove")
                                .long("remove")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("outcomes")
                        .arg(Arg::new("season").required(true))
                        .arg(Arg::new("project").required(true))
                        .arg(Arg::new("outcomes").num_args(0..=3)),
                )
                .subcommand(
                    Command::new("picks")
                        .arg(Arg::new("season").required(true))
                        .arg(Arg::new("week").required(true).help("Week start, YYYY-MM-DD"))
                        .arg(Arg::new("projects").num_args(0..=6)),
                )
                .subcommand(
                    Command::new("rename")
                        .arg(Arg::new("old").required(true))
                        .arg(Arg::new("new").required(true))
                        .arg(Arg::new("theme").long("theme")),
                )
                .subcommand(Command::new("delete").arg(Arg::new("id").required(true))),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    tracing::debug!(data_root = %config.data_root.display(), auto_commit = config.auto_commit, "opening store");

    let folio = Portfolio::open(&config);
    let out = Output {
        json: matches.get_flag("json"),
    };

    match matches.subcommand() {
        Some(("task", args)) => run_task(&folio, &out, args).await,
        Some(("link", args)) => run_link(&folio, &out, args).await,
        Some(("seasons", _)) => {
            let seasons = folio.list_seasons().await?;
            let current = folio.current_season().await?.map(|s| s.id);
            out.emit(&seasons, || render::seasons(&seasons, current.as_deref()))
        }
        Some(("season", args)) => run_season(&folio, &out, args).await,
        Some((name, args)) => run_project(&folio, &out, name, args).await,
        None => Ok(()),
    }
}

fn load_config(matches: &ArgMatches) -> Result<StoreConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            StoreConfig::from_yaml(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => StoreConfig::from_env(),
    };
    if let Some(root) = matches.get_one::<PathBuf>("data-root") {
        config.data_root.clone_from(root);
    }
    if matches.get_flag("auto-commit") {
        config.auto_commit = true;
    }
    Ok(config)
}

async fn run_project(folio: &Portfolio, out: &Output, name: &str, args: &ArgMatches) -> Result<()> {
    match name {
        "projects" => {
            let board = folio.board().await?;
            out.emit(&board, || render::board(&board))
        }
        "categories" => {
            let categories = folio.categories().await?;
            out.emit(&categories, || categories.join("\n"))
        }
        "show" => {
            let id = arg(args, "id")?;
            let project = folio
                .project(id)
                .await?
                .ok_or_else(|| anyhow!("project {id} not found"))?;
            let record = folio.detail(id).await?;
            out.emit(
                &json!({ "project": project, "detail": record.detail, "notes": record.notes }),
                || render::project(&project, &record),
            )
        }
        "create" => {
            let input = NewProject {
                title: arg(args, "title")?.to_string(),
                id: args.get_one::<String>("id").cloned(),
                status: args.get_one::<String>("status").cloned(),
                category: args.get_one::<String>("category").cloned(),
                pivot_cost: args
                    .get_one::<String>("pivot-cost")
                    .map(String::as_str)
                    .map(parse_pivot_cost)
                    .transpose()?,
                jevm: None,
            };
            let id = folio.create_project(input).await?;
            out.done(&json!({ "id": id }), format!("created {id}"))
        }
        "move" => {
            let (id, to) = (arg(args, "id")?, arg(args, "to")?);
            let index = args.get_one::<usize>("index").copied();
            let from = partition_of(folio, id).await?;
            folio.move_project(id, &from, to, index).await?;
            out.done(&json!({ "id": id, "from": from, "to": to }), format!("{id}: {from} -> {to}"))
        }
        "reorder" => {
            let status = arg(args, "status")?;
            folio.reorder_status(status, &many(args, "ids")).await?;
            out.done(&json!({ "status": status }), format!("reordered {status}"))
        }
        "rename" => {
            let (old, new) = (arg(args, "old")?, arg(args, "new")?);
            let title = args.get_one::<String>("title").map_or("", String::as_str);
            folio.rename_project(old, new, title).await?;
            out.done(&json!({ "from": old, "to": new }), format!("renamed {old} -> {new}"))
        }
        "delete" => {
            let id = arg(args, "id")?;
            folio.delete_project(id).await?;
            out.done(&json!({ "deleted": id }), format!("deleted {id}"))
        }
        "score" => {
            let id = arg(args, "id")?;
            if args.get_flag("clear") {
                folio.clear_jevm(id).await?;
                return out.done(&json!({ "id": id, "jevm": null }), format!("cleared scores of {id}"));
            }
            let scores: Vec<u8> = args
                .get_many::<u8>("scores")
                .map(|v| v.copied().collect())
                .unwrap_or_default();
            let &[joy, energy, value, market] = scores.as_slice() else {
                bail!("expected four scores");
            };
            let jevm = Jevm::new(joy, energy, value, market).map_err(|e| anyhow!(e))?;
            folio.set_jevm(id, jevm).await?;
            out.done(
                &json!({ "id": id, "jevm": jevm }),
                format!("{id}: sum {} avg {:.1}", jevm.sum(), jevm.average()),
            )
        }
        "notes" => {
            let id = arg(args, "id")?;
            if let Some(text) = args.get_one::<String>("set") {
                folio.update_notes(id, text).await?;
                return out.done(&json!({ "id": id }), format!("updated notes of {id}"));
            }
            let notes = folio.detail(id).await?.notes;
            out.emit(&json!({ "id": id, "notes": notes }), || notes.clone())
        }
        other => bail!("unknown command {other}"),
    }
}

async fn run_task(folio: &Portfolio, out: &Output, args: &ArgMatches) -> Result<()> {
    let Some((name, args)) = args.subcommand() else {
        return Ok(());
    };
    let project = arg(args, "project")?;
    match name {
        "add" => {
            let titles = many(args, "titles");
            let ids = match (titles.as_slice(), args.get_one::<u32>("estimate")) {
                ([title], estimate) => vec![folio.add_task(project, title, estimate.copied()).await?],
                (_, Some(_)) => bail!("--estimate applies to a single task"),
                (_, None) => folio.add_tasks(project, &titles).await?,
            };
            out.done(&json!({ "project": project, "tasks": ids }), format!("added {}", ids.join(", ")))
        }
        "state" | "done" => {
            let task = arg(args, "task")?;
            let state: TaskState = match args.get_one::<String>("state") {
                Some(s) => s.parse().map_err(|e: String| anyhow!(e))?,
                None => TaskState::Done,
            };
            let mut patch = TaskPatch::new(task);
            patch.state = Some(state);
            folio.update_task(project, patch).await?;
            out.done(&json!({ "project": project, "task": task }), format!("{project}/{task} updated"))
        }
        "remove" => {
            let task = arg(args, "task")?;
            if !folio.remove_task(project, task).await? {
                bail!("task {task} not found in {project}");
            }
            out.done(&json!({ "project": project, "removed": task }), format!("removed {project}/{task}"))
        }
        "reorder" => {
            folio.reorder_tasks(project, &many(args, "tasks")).await?;
            out.done(&json!({ "project": project }), format!("reordered tasks of {project}"))
        }
        "promote" => {
            let task = arg(args, "task")?;
            let options = Promotion {
                title: args.get_one::<String>("title").cloned(),
                status: args.get_one::<String>("status").cloned(),
                category: args.get_one::<String>("category").cloned(),
            };
            let child = folio.promote_task_to_project(project, task, options).await?;
            out.done(&json!({ "parent": project, "project": child }), format!("promoted {task} to {child}"))
        }
        "demote" => {
            let child = arg(args, "child")?;
            let task = folio.demote_project_to_task(project, child).await?;
            out.done(&json!({ "parent": project, "task": task }), format!("added task {task} to {project}"))
        }
        other => bail!("unknown task command {other}"),
    }
}

async fn run_link(folio: &Portfolio, out: &Output, args: &ArgMatches) -> Result<()> {
    let Some((name, args)) = args.subcommand() else {
        return Ok(());
    };
    let (project, to) = (arg(args, "project")?, arg(args, "to")?);
    match name {
        "add" => {
            let link_type: Option<LinkType> = args
                .get_one::<String>("type")
                .map(|s| s.parse().map_err(|e: String| anyhow!(e)))
                .transpose()?;
            folio.add_link(project, to, link_type).await?;
            out.done(&json!({ "project": project, "to": to }), format!("linked {project} -> {to}"))
        }
        "remove" => {
            folio.remove_link(project, to).await?;
            out.done(&json!({ "project": project, "to": to }), format!("unlinked {project} -> {to}"))
        }
        other => bail!("unknown link command {other}"),
    }
}

async fn run_season(folio: &Portfolio, out: &Output, args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        Some(("show", args)) => {
            let id = arg(args, "id")?;
            let season = folio
                .season(id)
                .await?
                .ok_or_else(|| anyhow!("season {id} not found"))?;
            out.emit(&season, || render::season(&season))
        }
        Some(("current", _)) => {
            let season = folio.current_season().await?;
            out.emit(&season, || {
                season
                    .as_ref()
                    .map_or_else(|| "no current season".to_string(), render::season)
            })
        }
        Some(("create", args)) => {
            let id = folio
                .create_season(NewSeason {
                    id: arg(args, "id")?.to_string(),
                    theme: arg(args, "theme")?.to_string(),
                    start: arg(args, "start")?.to_string(),
                    end: arg(args, "end")?.to_string(),
                })
                .await?;
            out.done(&json!({ "id": id }), format!("created season {id}"))
        }
        Some(("set-current", args)) => {
            let id = arg(args, "id")?;
            folio.set_current_season(id).await?;
            out.done(&json!({ "current": id }), format!("current season is {id}"))
        }
        Some(("initiative", args)) => {
            let (season, project) = (arg(args, "season")?, arg(args, "project")?);
            if args.get_flag("remove") {
                folio.remove_initiative(season, project).await?;
                return out.done(
                    &json!({ "season": season, "removed": project }),
                    format!("removed {project} from {season}"),
                );
            }
            let role: Role = arg(args, "role")?.parse().map_err(|e: String| anyhow!(e))?;
            folio.add_initiative(season, project, role).await?;
            out.done(
                &json!({ "season": season, "project": project, "role": role }),
                format!("{project} is {} in {season}", arg(args, "role")?),
            )
        }
        Some(("outcomes", args)) => {
            let (season, project) = (arg(args, "season")?, arg(args, "project")?);
            folio.save_outcomes(season, project, &many(args, "outcomes")).await?;
            out.done(&json!({ "season": season, "project": project }), format!("saved outcomes of {project}"))
        }
        Some(("picks", args)) => {
            let (season, week) = (arg(args, "season")?, arg(args, "week")?);
            folio.set_weekly_picks(season, week, &many(args, "projects")).await?;
            out.done(&json!({ "season": season, "week_start": week }), format!("saved picks for {week}"))
        }
        Some(("rename", args)) => {
            let (old, new) = (arg(args, "old")?, arg(args, "new")?);
            let theme = match args.get_one::<String>("theme") {
                Some(theme) => theme.clone(),
                None => folio
                    .season(old)
                    .await?
                    .ok_or_else(|| anyhow!("season {old} not found"))?
                    .theme,
            };
            folio.update_season_meta(old, new, &theme).await?;
            out.done(&json!({ "from": old, "to": new }), format!("renamed season {old} -> {new}"))
        }
        Some(("delete", args)) => {
            let id = arg(args, "id")?;
            folio.delete_season(id).await?;
            out.done(&json!({ "deleted": id }), format!("deleted season {id}"))
        }
        _ => Ok(()),
    }
}

/// Prints either JSON or human text
struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            let text = text();
            if !text.is_empty() {
                println!("{text}");
            }
        }
        Ok(())
    }

    fn done(&self, value: &serde_json::Value, message: String) -> Result<()> {
        self.emit(value, || message)
    }
}

/// Status key of the file that holds `id`, which may differ from the
/// entry's own `status` field
async fn partition_of(folio: &Portfolio, id: &str) -> Result<String> {
    let raw = folio
        .projects()
        .find_raw(id)
        .await?
        .ok_or_else(|| anyhow!("project {id} not found"))?;
    Ok(raw.status)
}

fn arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument <{name}>"))
}

fn many(args: &ArgMatches, name: &str) -> Vec<String> {
    args.get_many::<String>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn parse_pivot_cost(value: &str) -> Result<PivotCost> {
    match value {
        "low" => Ok(PivotCost::Low),
        "medium" => Ok(PivotCost::Medium),
        "high" => Ok(PivotCost::High),
        other => bail!("unknown pivot cost {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_test_utils::TestRoot;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_override_environment_config() {
        let matches = cli()
            .try_get_matches_from(["folio", "projects", "--data-root", "/tmp/folio", "--auto-commit"])
            .unwrap();
        let config = load_config(&matches).unwrap();
        assert_eq!(config.data_root, PathBuf::from("/tmp/folio"));
        assert!(config.auto_commit);
    }

    #[test]
    fn score_needs_four_values_or_clear() {
        assert!(cli().try_get_matches_from(["folio", "score", "a", "1", "2"]).is_err());
        assert!(cli().try_get_matches_from(["folio", "score", "a", "--clear"]).is_ok());
        assert!(cli()
            .try_get_matches_from(["folio", "score", "a", "1", "2", "3", "4"])
            .is_ok());
    }

    #[test]
    fn picks_are_limited_to_six() {
        let seven = ["folio", "season", "picks", "2025Q3", "2025-07-07", "a", "b", "c", "d", "e", "f", "g"];
        assert!(cli().try_get_matches_from(seven).is_err());
    }

    #[tokio::test]
    async fn move_source_is_the_owning_partition() {
        let root = TestRoot::new();
        root.write_partition("active", "projects:\n  - id: a\n    title: A\n    status: incubate\n");
        let folio = root.portfolio();

        assert_eq!(folio.project("a").await.unwrap().unwrap().status, "incubate");
        let from = partition_of(&folio, "a").await.unwrap();
        assert_eq!(from, "active");

        folio.move_project("a", &from, "done", None).await.unwrap();
        let raw = folio.projects().find_raw("a").await.unwrap().unwrap();
        assert_eq!(raw.status, "done");
        assert!(partition_of(&folio, "missing").await.is_err());
    }

    #[test]
    fn pivot_cost_names() {
        assert_eq!(parse_pivot_cost("medium").unwrap(), PivotCost::Medium);
        assert!(parse_pivot_cost("huge").is_err());
    }
}
