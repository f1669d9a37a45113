use folio_store::prelude::*;
use folio_store::{Entity, Jevm, Promotion, StatusColor};
use folio_test_utils::{ids, strings, TestRoot};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_create_project_slugs_and_dedupes() {
    let root = TestRoot::new();
    let folio = root.portfolio();

    let first = folio
        .create_project(NewProject::titled("  Garden Planner! "))
        .await
        .unwrap();
    let second = folio
        .create_project(NewProject::titled("Garden planner"))
        .await
        .unwrap();
    let third = folio
        .create_project(NewProject::titled("garden   planner"))
        .await
        .unwrap();
    assert_eq!(
        [first.as_str(), second.as_str(), third.as_str()],
        ["garden-planner", "garden-planner-2", "garden-planner-3"]
    );

    let entry = &root.partition_entries("incubate")[0];
    assert_eq!(entry.get("title").and_then(|v| v.as_str()), Some("Garden Planner!"));
    assert_eq!(entry.get("category").and_then(|v| v.as_str()), Some("exploration"));
    assert!(entry.get("pivot_cost").is_some_and(|v| v.is_null()));
}

#[tokio::test]
async fn test_create_project_validation() {
    let root = TestRoot::new();
    let folio = root.portfolio();

    let err = folio.create_project(NewProject::titled("   ")).await.unwrap_err();
    assert!(err.is_validation());

    let mut input = NewProject::titled("Scores");
    input.jevm = Some(Jevm {
        joy: 7,
        energy: 0,
        value: 0,
        market: 0,
    });
    assert!(folio.create_project(input).await.unwrap_err().is_validation());

    let mut input = NewProject::titled("???");
    input.status = Some("active".into());
    let id = folio.create_project(input).await.unwrap();
    assert_eq!(id, "project");
    assert_eq!(root.partition_ids("active"), strings(&["project"]));
}

#[tokio::test]
async fn test_update_status_moves_to_end() {
    let root = TestRoot::new();
    root.seed_partition("incubate", &["a"]);
    root.seed_partition("active", &["x", "y"]);
    let folio = root.portfolio();

    folio.update_status("a", "active").await.unwrap();
    assert_eq!(root.partition_ids("active"), strings(&["x", "y", "a"]));
    assert!(root.partition_ids("incubate").is_empty());

    folio.update_status("a", "active").await.unwrap();
    assert!(folio.update_status("zz", "active").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_jevm_set_and_clear() {
    let root = TestRoot::new();
    root.seed_partition("active", &["a"]);
    let folio = root.portfolio();

    folio.set_jevm("a", Jevm::new(4, 4, 2, 2).unwrap()).await.unwrap();
    let project = folio.project("a").await.unwrap().unwrap();
    let jevm = project.jevm.unwrap();
    assert_eq!(jevm.sum(), 12);
    assert!((jevm.average() - 3.0).abs() < f64::EPSILON);

    folio.clear_jevm("a").await.unwrap();
    assert_eq!(folio.project("a").await.unwrap().unwrap().jevm, None);
}

#[tokio::test]
async fn test_rename_project_checks() {
    let root = TestRoot::new();
    root.seed_partition("active", &["a", "b"]);
    let folio = root.portfolio();

    assert!(folio.rename_project("a", "a", "A").await.unwrap_err().is_validation());
    assert!(folio.rename_project("a", " ", "A").await.unwrap_err().is_validation());
    assert!(folio.rename_project("zz", "q", "Q").await.unwrap_err().is_not_found());
    let err = folio.rename_project("a", "b", "B").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::AlreadyExists { entity: Entity::Project, .. }
    ));

    folio.rename_project("a", "alpha", "Alpha").await.unwrap();
    let all = folio.list_projects().await.unwrap();
    assert_eq!(ids(&all), vec!["b", "alpha"]);
    assert_eq!(all[1].title, "Alpha");
    assert_eq!(all[1].category, "test");
}

#[tokio::test]
async fn test_tasks_lifecycle() {
    let root = TestRoot::new();
    root.seed_partition("active", &["p"]);
    let folio = root.portfolio();

    let first = folio.add_task("p", "Write docs", Some(3)).await.unwrap();
    let again = folio.add_task("p", "Write docs", None).await.unwrap();
    let bulk = folio
        .add_tasks("p", &strings(&["Ship it", "", "   ", "!!!"]))
        .await
        .unwrap();
    assert_eq!(first, "write-docs");
    assert_eq!(again, "write-docs-2");
    assert_eq!(bulk, strings(&["ship-it", "task"]));

    let detail = folio.detail("p").await.unwrap().detail;
    let orders: Vec<_> = detail.tasks.iter().map(|t| t.order).collect();
    assert_eq!(orders, vec![Some(1), Some(2), Some(3), Some(4)]);
    assert!(detail.tasks.iter().all(|t| t.state == TaskState::Todo));

    let mut patch = TaskPatch::new("write-docs");
    patch.state = Some(TaskState::Done);
    patch.estimate = Some(None);
    folio.update_task("p", patch).await.unwrap();
    let detail = folio.detail("p").await.unwrap().detail;
    let task = detail.task("write-docs").unwrap();
    assert_eq!(task.state, TaskState::Done);
    assert_eq!(task.estimate, None);

    let err = folio.update_task("p", TaskPatch::new("nope")).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: Entity::Task, .. }));

    folio
        .reorder_tasks("p", &strings(&["task", "ship-it"]))
        .await
        .unwrap();
    let detail = folio.detail("p").await.unwrap().detail;
    let order: Vec<_> = detail
        .tasks
        .iter()
        .map(|t| (t.id.as_str(), t.order))
        .collect();
    assert_eq!(
        order,
        vec![
            ("task", Some(1)),
            ("ship-it", Some(2)),
            ("write-docs", Some(3)),
            ("write-docs-2", Some(4)),
        ]
    );

    assert!(folio.remove_task("p", "ship-it").await.unwrap());
    assert!(!folio.remove_task("p", "ship-it").await.unwrap());
    assert_eq!(folio.detail("p").await.unwrap().detail.tasks.len(), 3);
}

#[tokio::test]
async fn test_links_add_and_remove() {
    let root = TestRoot::new();
    let folio = root.portfolio();

    folio.add_link("p", "q", None).await.unwrap();
    folio.add_link("p", "q", Some(LinkType::DependsOn)).await.unwrap();
    folio.add_link("p", "q", None).await.unwrap();
    folio.add_link("p", "r", Some(LinkType::PartOf)).await.unwrap();

    let links = folio.detail("p").await.unwrap().detail.links;
    assert_eq!(links.len(), 3);
    assert_eq!(links[0].link_type, LinkType::RelatesTo);

    folio.remove_link("p", "q").await.unwrap();
    let links = folio.detail("p").await.unwrap().detail.links;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].to_id, "r");
}

#[tokio::test]
async fn test_promote_and_demote() {
    let root = TestRoot::new();
    root.seed_partition("active", &["parent"]);
    let folio = root.portfolio();
    let task_id = folio.add_task("parent", "Build shed", None).await.unwrap();
    folio.add_task("parent", "Paint", None).await.unwrap();

    let child = folio
        .promote_task_to_project("parent", &task_id, Promotion::default())
        .await
        .unwrap();
    assert_eq!(child, "build-shed");
    assert_eq!(root.partition_ids("incubate"), strings(&["build-shed"]));

    let detail = folio.detail("parent").await.unwrap().detail;
    assert!(detail.task(&task_id).is_none());
    assert_eq!(detail.links.len(), 1);
    assert_eq!(detail.links[0].link_type, LinkType::PartOf);

    let err = folio
        .promote_task_to_project("parent", "missing", Promotion::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let new_task = folio.demote_project_to_task("parent", &child).await.unwrap();
    assert_eq!(new_task, "build-shed");
    let detail = folio.detail("parent").await.unwrap().detail;
    assert!(detail.links.is_empty());
    assert_eq!(detail.tasks.len(), 2);
    assert_eq!(detail.tasks[1].order, Some(2));
    assert!(folio.project(&child).await.unwrap().is_some());

    let err = folio.demote_project_to_task("parent", "ghost").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_season_actions() {
    let root = TestRoot::new();
    let folio = root.portfolio();

    let err = folio
        .create_season(NewSeason {
            id: "2025Q3".into(),
            theme: "t".into(),
            start: String::new(),
            end: "2025-09-30".into(),
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let id = folio
        .create_season(NewSeason {
            id: "2025Q3".into(),
            theme: " Build ".into(),
            start: "2025-07-01".into(),
            end: "2025-09-30".into(),
        })
        .await
        .unwrap();
    assert!(folio
        .add_initiative("nope", "p", Role::Lead)
        .await
        .unwrap_err()
        .is_not_found());

    folio.add_initiative(&id, "p", Role::Supporting).await.unwrap();
    folio
        .save_outcomes(&id, "p", &strings(&["one", " ", "two", "three", "four"]))
        .await
        .unwrap();
    folio.add_initiative(&id, "p", Role::Lead).await.unwrap();

    let initiative = folio.initiative_for_project(&id, "p").await.unwrap().unwrap();
    assert_eq!(initiative.role, Role::Lead);
    assert_eq!(initiative.outcomes, strings(&["one", "two", "three"]));
    assert_eq!(folio.initiative_for_project(&id, "q").await.unwrap(), None);

    assert!(folio
        .set_weekly_picks(&id, "next monday", &strings(&["x"]))
        .await
        .unwrap_err()
        .is_validation());

    folio.set_current_season(&id).await.unwrap();
    folio.update_season_meta(&id, "2025Q4", "Ship").await.unwrap();
    let current = folio.current_season().await.unwrap().unwrap();
    assert_eq!(current.id, "2025Q4");
    assert_eq!(current.theme, "Ship");

    folio.update_season_meta("2025Q4", "2025Q4", "Polish").await.unwrap();
    assert_eq!(folio.season("2025Q4").await.unwrap().unwrap().theme, "Polish");

    folio.delete_season("2025Q4").await.unwrap();
    assert!(folio.list_seasons().await.unwrap().is_empty());
    assert_eq!(folio.current_season().await.unwrap(), None);
}

#[tokio::test]
async fn test_board_groups_by_status() {
    let root = TestRoot::new();
    root.seed_partition("incubate", &["i"]);
    root.write_partition("active", "meta:\n  color: blue\nprojects:\n  - id: a\n");
    root.write("projects.yaml", "projects:\n  - id: l\n    title: L\n    status: someday\n");
    let folio = root.portfolio();

    let board = folio.board().await.unwrap();
    let columns: Vec<_> = board
        .iter()
        .map(|c| (c.meta.key.as_str(), ids(&c.projects)))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("active", vec!["a"]),
            ("incubate", vec!["i"]),
            ("someday", vec!["l"]),
        ]
    );
    assert_eq!(board[0].meta.color, StatusColor::Blue);
}

#[tokio::test]
async fn test_notes_round_trip_through_portfolio() {
    let root = TestRoot::new();
    let folio = root.portfolio();
    folio.update_notes("p", "# Plan\n\nsteps\n").await.unwrap();
    assert_eq!(folio.detail("p").await.unwrap().notes, "# Plan\n\nsteps");
    assert!(folio.update_notes("", "x").await.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_path_like_ids_are_rejected_before_touching_disk() {
    let root = TestRoot::new();
    root.seed_partition("active", &["a"]);
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    let folio = root.portfolio();

    for id in ["..", ".", "../x", "a/b", "a\\b"] {
        assert!(folio.delete_project(id).await.unwrap_err().is_validation(), "{id:?}");
        assert!(folio.delete_season(id).await.unwrap_err().is_validation(), "{id:?}");
    }
    let err = folio
        .create_season(NewSeason {
            id: "../x".into(),
            theme: "escape".into(),
            start: "2025-07-01".into(),
            end: "2025-09-30".into(),
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(!root.path().join("x").exists());
    assert!(!root.path().parent().unwrap().join("x").join("season.yaml").exists());

    assert!(root.exists("projects/active.yaml"));
    assert!(root.exists("seasons/2025Q3/season.yaml"));
    assert_eq!(root.partition_ids("active"), strings(&["a"]));
}

#[tokio::test]
async fn test_status_keys_must_be_file_names() {
    let root = TestRoot::new();
    root.seed_partition("active", &["a"]);
    let folio = root.portfolio();

    assert!(folio.update_status("a", "").await.unwrap_err().is_validation());
    assert!(folio.update_status("a", "../active").await.unwrap_err().is_validation());
    assert!(folio.reorder_status("..", &strings(&["a"])).await.unwrap_err().is_validation());

    let mut input = NewProject::titled("Sneaky");
    input.id = Some("../../etc".into());
    assert!(folio.create_project(input).await.unwrap_err().is_validation());

    assert_eq!(root.partition_ids("active"), strings(&["a"]));
    assert!(!root.exists("projects/.yaml"));
}
