use chrono::NaiveDate;
use folio_store::prelude::*;
use folio_store::{Entity, Season};
use folio_test_utils::{strings, TestRoot};
use pretty_assertions::assert_eq;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_initiative_upsert_twice_promotes_to_lead_first() {
    let root = TestRoot::new();
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    let store = root.portfolio().seasons().clone();

    store
        .upsert_initiative("2025Q3", "other", Role::Supporting, None)
        .await
        .unwrap();
    store
        .upsert_initiative("2025Q3", "p", Role::Supporting, None)
        .await
        .unwrap();
    store
        .upsert_initiative("2025Q3", "p", Role::Lead, None)
        .await
        .unwrap();

    let season = store.read("2025Q3").await.unwrap().unwrap();
    let ids: Vec<_> = season
        .initiatives
        .iter()
        .map(|i| (i.project_id.as_str(), i.role))
        .collect();
    assert_eq!(ids, vec![("p", Role::Lead), ("other", Role::Supporting)]);
}

#[tokio::test]
async fn test_leads_keep_relative_order() {
    let root = TestRoot::new();
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    let store = root.portfolio().seasons().clone();

    for (id, role) in [
        ("s1", Role::Supporting),
        ("l1", Role::Lead),
        ("s2", Role::Supporting),
        ("l2", Role::Lead),
    ] {
        store.upsert_initiative("2025Q3", id, role, None).await.unwrap();
    }

    let season = store.read("2025Q3").await.unwrap().unwrap();
    let ids: Vec<_> = season.initiatives.iter().map(|i| i.project_id.as_str()).collect();
    assert_eq!(ids, vec!["l1", "l2", "s1", "s2"]);
}

#[tokio::test]
async fn test_weekly_picks_sorted_by_week_start() {
    let root = TestRoot::new();
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    let store = root.portfolio().seasons().clone();

    store
        .set_weekly_picks("2025Q3", "2025-07-14", &strings(&["a"]))
        .await
        .unwrap();
    store
        .set_weekly_picks("2025Q3", "2025-07-07", &strings(&["b"]))
        .await
        .unwrap();

    let season = store.read("2025Q3").await.unwrap().unwrap();
    let weeks: Vec<_> = season.weekly.iter().map(|w| w.week_start.as_str()).collect();
    assert_eq!(weeks, vec!["2025-07-07", "2025-07-14"]);
}

#[tokio::test]
async fn test_remove_initiative_ignores_unknown_ids() {
    let root = TestRoot::new();
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    let store = root.portfolio().seasons().clone();
    store
        .upsert_initiative("2025Q3", "p", Role::Lead, None)
        .await
        .unwrap();

    store.remove_initiative("2025Q3", "nobody").await.unwrap();
    store.remove_initiative("2025Q3", "p").await.unwrap();
    let season = store.read("2025Q3").await.unwrap().unwrap();
    assert!(season.initiatives.is_empty());
}

#[tokio::test]
async fn test_rename_follows_pointer_and_checks_collisions() {
    let root = TestRoot::new();
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    root.seed_season("2025Q4", "2025-10-01", "2025-12-31");
    let store = root.portfolio().seasons().clone();
    store.set_current_id("2025Q3").await.unwrap();

    let err = store.rename("2025Q3", "2025Q4").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::AlreadyExists { entity: Entity::Season, .. }
    ));
    let err = store.rename("1999Q1", "2000Q1").await.unwrap_err();
    assert!(err.is_not_found());

    store.rename("2025Q3", "2026Q1").await.unwrap();
    assert!(root.exists("seasons/2026Q1/season.yaml"));
    assert!(!root.exists("seasons/2025Q3"));
    assert_eq!(root.read("seasons/current.txt"), "2026Q1\n");

    store.rename("2026Q1", "2026Q1").await.unwrap();
}

#[tokio::test]
async fn test_delete_clears_matching_pointer_only() {
    let root = TestRoot::new();
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    root.seed_season("2025Q4", "2025-10-01", "2025-12-31");
    let store = root.portfolio().seasons().clone();
    store.set_current_id("2025Q4").await.unwrap();

    store.delete("2025Q3").await.unwrap();
    assert_eq!(root.read("seasons/current.txt"), "2025Q4\n");

    store.delete("2025Q4").await.unwrap();
    assert_eq!(root.read("seasons/current.txt"), "\n");
    assert_eq!(store.read_pointer().await.unwrap(), None);
    assert!(store.list_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_current_season_fallbacks() {
    let root = TestRoot::new();
    let store = root.portfolio().seasons().clone();
    assert_eq!(store.read_current_id_at(day("2025-08-01")).await.unwrap(), None);

    root.seed_season("2025Q2", "2025-04-01", "2025-06-30");
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    root.write("seasons/notes/readme.md", "not a season");

    assert_eq!(
        store.read_current_id_at(day("2025-05-05")).await.unwrap().as_deref(),
        Some("2025Q2")
    );
    assert_eq!(
        store.read_current_id_at(day("2031-01-01")).await.unwrap().as_deref(),
        Some("2025Q3")
    );

    root.write("seasons/current.txt", "  \n");
    assert_eq!(
        store.read_current_id_at(day("2025-05-05")).await.unwrap().as_deref(),
        Some("2025Q2")
    );
}

#[tokio::test]
async fn test_create_writes_document_without_id() {
    let root = TestRoot::new();
    let store = root.portfolio().seasons().clone();
    store
        .create(&Season::new("2025Q3", "Build", "2025-07-01", "2025-09-30"))
        .await
        .unwrap();

    assert_eq!(
        root.read("seasons/2025Q3/season.yaml"),
        "theme: Build\nstart: 2025-07-01\nend: 2025-09-30\ninitiatives: []\nweekly: []\n"
    );
    assert_eq!(store.list_ids().await.unwrap(), strings(&["2025Q3"]));
}

#[tokio::test]
async fn test_fallback_uses_last_folder_even_when_unreadable() {
    let root = TestRoot::new();
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    root.write("seasons/2025Q4/season.yaml", "theme: no dates yet\n");
    let store = root.portfolio().seasons().clone();

    assert_eq!(
        store.read_current_id_at(day("2031-01-01")).await.unwrap().as_deref(),
        Some("2025Q4")
    );
    assert_eq!(
        store.read_current_id_at(day("2025-08-01")).await.unwrap().as_deref(),
        Some("2025Q3")
    );
}

#[tokio::test]
async fn test_pointer_outside_seasons_dir_is_ignored() {
    let root = TestRoot::new();
    root.seed_season("2025Q3", "2025-07-01", "2025-09-30");
    root.write("seasons/current.txt", "../projects\n");
    let store = root.portfolio().seasons().clone();

    assert_eq!(store.read_pointer().await.unwrap(), None);
    assert_eq!(
        store.read_current_id_at(day("2025-08-01")).await.unwrap().as_deref(),
        Some("2025Q3")
    );
    assert!(store.set_current_id("../x").await.unwrap_err().is_validation());
}
