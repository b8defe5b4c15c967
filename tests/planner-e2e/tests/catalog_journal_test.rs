use anyhow::Result;
use async_trait::async_trait;
use meal_planner_engine::catalog::{CatalogSource, FileCatalogSource, parse_catalog};
use meal_planner_engine::config;
use meal_planner_engine::error::PlannerResult;
use meal_planner_engine::logging::{ActivityEventType, ActivityLogger, LogLevel, read_events};
use meal_planner_engine::selection::SelectionOrigin;
use meal_planner_engine::storage::{FileStore, InMemoryStore};
use meal_planner_engine::{CatalogStatus, PlannerError, Recipe, SelectionStore, aggregate};
use std::path::PathBuf;
use std::sync::Mutex;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/recipes.json")
}

/// Fails until `recover` is called, then serves the fixture catalog.
struct FlakySource {
    healthy: Mutex<bool>,
}

impl FlakySource {
    fn new() -> Self {
        Self {
            healthy: Mutex::new(false),
        }
    }

    fn recover(&self) {
        *self.healthy.lock().unwrap() = true;
    }
}

#[async_trait]
impl CatalogSource for FlakySource {
    async fn load_catalog(&self) -> PlannerResult<Vec<Recipe>> {
        if !*self.healthy.lock().unwrap() {
            return Err(PlannerError::Load("connection refused".to_string()));
        }
        let content = std::fs::read_to_string(fixture_path())
            .map_err(|e| PlannerError::Load(e.to_string()))?;
        parse_catalog(&content, false)
    }
}

#[tokio::test]
async fn test_failed_load_blocks_mutations_until_retry() -> Result<()> {
    let source = FlakySource::new();
    let mut store = SelectionStore::new(InMemoryStore::new()).with_seed(11);

    let err = store.load(&source).await.unwrap_err();
    assert_eq!(err.to_string(), "failed to load recipes: connection refused");
    assert_eq!(store.error(), Some("failed to load recipes: connection refused"));
    assert!(store.selected_recipes().is_empty());
    assert_eq!(store.dismiss("lentil-soup"), Err(PlannerError::CatalogNotReady));
    assert_eq!(store.reset(), Err(PlannerError::CatalogNotReady));

    source.recover();
    assert_eq!(store.load(&source).await?, SelectionOrigin::Random);
    assert_eq!(store.status(), &CatalogStatus::Ready);
    assert!(store.error().is_none());
    let first = store.selected_recipes()[0].id.clone();
    store.dismiss(&first)?;
    Ok(())
}

#[tokio::test]
async fn test_yaml_catalog_matches_json_catalog() -> Result<()> {
    let json = tokio::fs::read_to_string(fixture_path()).await?;
    let document: serde_json::Value = serde_json::from_str(&json)?;

    let tmp = tempfile::tempdir()?;
    let yaml_path = tmp.path().join("recipes.yaml");
    // JSON is valid YAML, so the fixture can be reused as-is.
    tokio::fs::write(&yaml_path, serde_json::to_string_pretty(&document)?).await?;

    let from_yaml = FileCatalogSource::new(&yaml_path).load_catalog().await?;
    let from_json = FileCatalogSource::new(fixture_path()).load_catalog().await?;
    assert_eq!(from_yaml, from_json);
    Ok(())
}

#[tokio::test]
async fn test_planner_session_is_journaled() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let work_dir = tmp.path();
    let planner_config = config::ensure_planner_dir(work_dir).await?;
    let logger = ActivityLogger::new(&config::logs_dir(work_dir)).await?;

    let mut store = SelectionStore::new(FileStore::new(planner_config.state_dir(work_dir)))
        .with_seed(5);
    let origin = store.load(&FileCatalogSource::new(fixture_path())).await?;
    logger
        .log_catalog_loaded(store.all_recipes().len(), "fixtures/recipes.json")
        .await?;
    let selected: Vec<String> = store.selected_recipes().iter().map(|r| r.id.clone()).collect();
    logger
        .log_selection(origin == SelectionOrigin::Restored, &selected)
        .await?;

    let victim = selected[0].clone();
    store.dismiss(&victim)?;
    let selected: Vec<String> = store.selected_recipes().iter().map(|r| r.id.clone()).collect();
    logger.log_dismissed(&victim, &selected, true).await?;

    let list = aggregate(store.selected_recipes());
    logger.log_grocery_list(list.total_items()).await?;

    let events = read_events(logger.path()).await?;
    let kinds: Vec<ActivityEventType> = events.iter().map(|e| e.event_type.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            ActivityEventType::CatalogLoaded,
            ActivityEventType::SelectionInitialized,
            ActivityEventType::RecipeDismissed,
            ActivityEventType::GroceryListGenerated,
        ]
    );
    assert_eq!(events[0].details.as_ref().unwrap()["recipes"], 10);
    assert_eq!(events[2].level, LogLevel::Info);
    assert_eq!(
        events[3].details.as_ref().unwrap()["items"],
        list.total_items()
    );

    assert!(work_dir.join(".mealplanner/state/food-planner-selected-ids.json").exists());
    assert!(work_dir.join(".mealplanner/state/food-planner-dismissed-ids.json").exists());
    Ok(())
}
