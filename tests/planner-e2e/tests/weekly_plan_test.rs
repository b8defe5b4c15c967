use anyhow::Result;
use chrono::NaiveDate;
use meal_planner_engine::catalog::FileCatalogSource;
use meal_planner_engine::export::{self, GROCERY_LIST_FILE, MEAL_PLAN_FILE};
use meal_planner_engine::selection::SelectionOrigin;
use meal_planner_engine::storage::{
    DISMISSED_IDS_KEY, InMemoryStore, SELECTED_IDS_KEY, read_ids, write_ids,
};
use meal_planner_engine::{Category, INITIAL_COUNT, SelectionStore, aggregate};
use std::path::PathBuf;

fn fixture_catalog() -> FileCatalogSource {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    FileCatalogSource::new(manifest_dir.join("fixtures/recipes.json"))
}

fn ids(store: &SelectionStore<InMemoryStore>) -> Vec<String> {
    store.selected_recipes().iter().map(|r| r.id.clone()).collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn names(list: &meal_planner_engine::GroceryList, category: Category) -> Vec<&str> {
    list.items(category).iter().map(|i| i.name.as_str()).collect()
}

#[tokio::test]
async fn test_week_of_dismissals_and_additions() -> Result<()> {
    let storage = InMemoryStore::new();
    let mut store = SelectionStore::new(storage.clone()).with_seed(42);

    let origin = store.load(&fixture_catalog()).await?;
    assert_eq!(origin, SelectionOrigin::Random);
    assert_eq!(store.all_recipes().len(), 10);
    assert_eq!(store.selected_count(), INITIAL_COUNT);

    // Dismissing at the initial size swaps the slot in place.
    let first = ids(&store);
    store.dismiss(&first[2])?;
    let after = ids(&store);
    assert_eq!(after.len(), INITIAL_COUNT);
    assert_eq!(after[0], first[0]);
    assert_eq!(after[1], first[1]);
    assert_eq!(after[3], first[3]);
    assert!(!after.contains(&first[2]));
    assert!(store.dismissed_ids().contains(&first[2]));

    // The dismissed recipe is still searchable and can come back.
    let back = store
        .search_recipes("")
        .into_iter()
        .find(|r| r.id == first[2])
        .expect("dismissed recipe should be searchable");
    store.add_recipe(back)?;
    assert_eq!(store.selected_count(), INITIAL_COUNT + 1);
    assert!(store.dismissed_ids().is_empty());

    // Above the initial size a dismissal shrinks the selection.
    let victim = ids(&store)[0].clone();
    store.dismiss(&victim)?;
    assert_eq!(store.selected_count(), INITIAL_COUNT);
    assert!(!ids(&store).contains(&victim));

    assert_eq!(read_ids(&storage, SELECTED_IDS_KEY), Some(ids(&store)));
    assert_eq!(
        read_ids(&storage, DISMISSED_IDS_KEY),
        Some(vec![victim.clone()])
    );

    // A fresh session on the same storage picks up where this one stopped.
    let expected = ids(&store);
    let mut next = SelectionStore::new(storage.clone()).with_seed(7);
    assert_eq!(next.load(&fixture_catalog()).await?, SelectionOrigin::Restored);
    assert_eq!(ids(&next), expected);
    assert!(next.dismissed_ids().contains(&victim));

    next.reset()?;
    assert_eq!(next.selected_count(), INITIAL_COUNT);
    assert_eq!(read_ids(&storage, DISMISSED_IDS_KEY), Some(Vec::new()));
    Ok(())
}

#[tokio::test]
async fn test_dismissing_with_every_other_recipe_dismissed_shrinks() -> Result<()> {
    let storage = InMemoryStore::new();
    let selected = strings(&[
        "spaghetti-bolognese",
        "chicken-stir-fry",
        "veggie-omelette",
        "salmon-tray-bake",
    ]);
    let dismissed = strings(&[
        "berry-smoothie",
        "lentil-soup",
        "fish-tacos",
        "mushroom-risotto",
        "greek-salad",
        "peas-and-pasta",
    ]);
    write_ids(&storage, SELECTED_IDS_KEY, &selected)?;
    write_ids(&storage, DISMISSED_IDS_KEY, &dismissed)?;

    let mut store = SelectionStore::new(storage.clone()).with_seed(1);
    assert_eq!(store.load(&fixture_catalog()).await?, SelectionOrigin::Restored);
    assert!(store.available_for_suggestion().is_empty());

    store.dismiss("chicken-stir-fry")?;
    assert_eq!(
        ids(&store),
        strings(&["spaghetti-bolognese", "veggie-omelette", "salmon-tray-bake"])
    );
    assert_eq!(store.dismissed_ids().len(), 7);
    Ok(())
}

#[tokio::test]
async fn test_grocery_list_for_restored_week() -> Result<()> {
    let storage = InMemoryStore::new();
    write_ids(
        &storage,
        SELECTED_IDS_KEY,
        &strings(&[
            "spaghetti-bolognese",
            "chicken-stir-fry",
            "lentil-soup",
            "mushroom-risotto",
        ]),
    )?;
    let mut store = SelectionStore::new(storage).with_seed(3);
    store.load(&fixture_catalog()).await?;

    let list = aggregate(store.selected_recipes());
    assert_eq!(list.total_items(), 17);
    assert!(list.frozen.is_empty());

    assert_eq!(
        names(&list, Category::Produce),
        vec!["bell pepper", "broccoli", "carrot", "garlic", "mushrooms", "onion"]
    );
    assert_eq!(
        names(&list, Category::Meat),
        vec!["chicken breast", "ground beef"]
    );
    assert_eq!(names(&list, Category::Dairy), vec!["butter", "parmesan"]);
    assert_eq!(
        names(&list, Category::Pantry),
        vec![
            "arborio rice",
            "crushed tomatoes",
            "red lentils",
            "rice",
            "soy sauce",
            "spaghetti",
            "vegetable stock"
        ]
    );

    let garlic = list.produce.iter().find(|i| i.name == "garlic").unwrap();
    assert_eq!(garlic.quantity, 5.0);
    assert_eq!(garlic.unit, "cloves");

    // "l" and "L" share a key; the first unit label seen is kept.
    let stock = list.pantry.iter().find(|i| i.name == "vegetable stock").unwrap();
    assert_eq!(stock.quantity, 2.0);
    assert_eq!(stock.unit, "l");

    let parmesan = list.dairy.iter().find(|i| i.name == "parmesan").unwrap();
    assert_eq!(parmesan.quantity, 90.0);
    Ok(())
}

#[tokio::test]
async fn test_export_documents_for_selection() -> Result<()> {
    let storage = InMemoryStore::new();
    write_ids(
        &storage,
        SELECTED_IDS_KEY,
        &strings(&["berry-smoothie", "peas-and-pasta"]),
    )?;
    let mut store = SelectionStore::new(storage).with_seed(9);
    store.load(&fixture_catalog()).await?;

    let tmp = tempfile::tempdir()?;
    let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

    let plan_path = tmp.path().join(MEAL_PLAN_FILE);
    export::write_document(
        &plan_path,
        &export::render_meal_plan(store.selected_recipes(), date),
    )
    .await?;
    let plan = tokio::fs::read_to_string(&plan_path).await?;
    assert!(plan.starts_with("Weekly Meal Plan\nOctober 19, 2026\n"));
    assert!(plan.find("Berry Smoothie").unwrap() < plan.find("Peas and Pasta").unwrap());
    assert!(plan.contains("Prep: 5 min | Cook: 0 min | Serves: 1"));
    assert!(plan.contains("  • Yogurt (0.50 cup)"));

    let list = aggregate(store.selected_recipes());
    let list_path = tmp.path().join(GROCERY_LIST_FILE);
    export::write_document(&list_path, &export::render_grocery_list(&list, date)).await?;
    let groceries = tokio::fs::read_to_string(&list_path).await?;
    assert!(groceries.contains("DAIRY\n[ ] Butter (1 tbsp)\n[ ] Milk (0.50 cup)\n[ ] Yogurt (0.50 cup)"));
    assert!(groceries.contains("FROZEN\n[ ] Frozen berries (1 cup)\n[ ] Frozen peas (1 cup)"));
    assert!(!groceries.contains("MEAT"));
    assert!(!groceries.contains("PRODUCE"));
    Ok(())
}
