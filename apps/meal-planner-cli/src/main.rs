use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use meal_planner_engine::{
    GroceryList, Recipe, SelectionStore, aggregate, capitalize_first,
    catalog::FileCatalogSource,
    config::{self, PlannerConfig},
    export::{self, GROCERY_LIST_FILE, MEAL_PLAN_FILE},
    format_quantity,
    logging::ActivityLogger,
    selection::SelectionOrigin,
    storage::FileStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Plan the week's recipes and build the grocery list", long_about = None)]
struct Args {
    /// Project directory holding `.mealplanner/` (default: current directory)
    #[arg(short, long, default_value = ".")]
    work_dir: PathBuf,

    /// Recipe catalog file (overrides config)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory for saved selection state (overrides config)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Seed for reproducible random picks
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Show the current selection (default)
    Show,
    /// Show one recipe in full
    Recipe { id: String },
    /// Drop a recipe from the selection and stop suggesting it
    Dismiss { id: String },
    /// Add a recipe to the selection; prompts when no id is given
    Add {
        id: Option<String>,
        /// Pre-filter the interactive picker
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Search recipes that are not already selected
    Search { query: Option<String> },
    /// Clear dismissals and draw a fresh selection
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the grocery list for the current selection
    Groceries,
    /// Write the meal plan and grocery list as text files
    Export {
        /// Output directory (overrides config)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Only the meal plan
        #[arg(long, conflicts_with = "groceries")]
        recipes: bool,
        /// Only the grocery list
        #[arg(long)]
        groceries: bool,
    },
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("info,meal_planner_cli=debug,meal_planner_engine=debug")
    } else {
        EnvFilter::new("warn,meal_planner_cli=info,meal_planner_engine=info")
    };

    fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

struct Paths {
    catalog: PathBuf,
    state_dir: PathBuf,
    export_dir: PathBuf,
    logs_dir: PathBuf,
}

fn resolve_paths(args: &Args, config: &PlannerConfig) -> Paths {
    Paths {
        catalog: args
            .catalog
            .clone()
            .unwrap_or_else(|| config.catalog_path(&args.work_dir)),
        state_dir: args
            .state_dir
            .clone()
            .unwrap_or_else(|| config.state_dir(&args.work_dir)),
        export_dir: config.export_dir(&args.work_dir),
        logs_dir: config::logs_dir(&args.work_dir),
    }
}

fn selected_ids(store: &SelectionStore<FileStore>) -> Vec<String> {
    store
        .selected_recipes()
        .iter()
        .map(|r| r.id.clone())
        .collect()
}

async fn load_store(
    args: &Args,
    paths: &Paths,
    logger: &ActivityLogger,
) -> Result<SelectionStore<FileStore>> {
    let mut store = SelectionStore::new(FileStore::new(&paths.state_dir));
    if let Some(seed) = args.seed {
        store = store.with_seed(seed);
    }

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message("Loading recipes...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = store.load(&FileCatalogSource::new(&paths.catalog)).await;
    spinner.finish_and_clear();

    match result {
        Ok(origin) => {
            let source = paths.catalog.display().to_string();
            logger
                .log_catalog_loaded(store.all_recipes().len(), &source)
                .await?;
            logger
                .log_selection(origin == SelectionOrigin::Restored, &selected_ids(&store))
                .await?;
            Ok(store)
        }
        Err(e) => {
            logger.log_catalog_failed(&e.to_string()).await?;
            println!("{}", style(e.to_string()).red());
            Err(e).context("Cannot plan without a recipe catalog")
        }
    }
}

fn print_selection(store: &SelectionStore<FileStore>) {
    println!(
        "\n{}",
        style(format!("THIS WEEK ({} recipes)", store.selected_count()))
            .bold()
            .cyan()
    );
    if store.selected_recipes().is_empty() {
        println!("  {}", style("Nothing selected. Use `add` to pick a recipe.").dim());
        return;
    }
    for (i, recipe) in store.selected_recipes().iter().enumerate() {
        println!(
            "  {}. {} {}",
            i + 1,
            style(&recipe.name).bold(),
            style(format!(
                "[{}] {} min, serves {}",
                recipe.id,
                recipe.total_time(),
                recipe.servings
            ))
            .dim()
        );
    }
}

fn print_recipe(recipe: &Recipe) {
    println!("\n{}", style(&recipe.name).bold().green());
    println!(
        "{}",
        style(format!(
            "Prep: {} min | Cook: {} min | Serves: {}",
            recipe.prep_time, recipe.cook_time, recipe.servings
        ))
        .dim()
    );
    println!("\n{}:", style("Ingredients").bold());
    for ingredient in &recipe.ingredients {
        println!(
            "  • {} ({})",
            capitalize_first(&ingredient.name),
            format_quantity(ingredient.quantity, &ingredient.unit)
        );
    }
    println!("\n{}:", style("Instructions").bold());
    for (i, step) in recipe.steps().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}

fn print_search_results(results: &[Arc<Recipe>]) {
    if results.is_empty() {
        println!("{}", style("No recipes found.").yellow());
        return;
    }
    for recipe in results {
        println!("  {} {}", style(&recipe.id).dim(), recipe.name);
    }
}

fn print_grocery_list(list: &GroceryList) {
    println!(
        "\n{}",
        style(format!("GROCERY LIST ({} items)", list.total_items()))
            .bold()
            .cyan()
    );
    for (category, items) in list.iter() {
        if items.is_empty() {
            continue;
        }
        println!("\n{}:", style(category.label()).bold().green());
        for item in items {
            println!(
                "  ☐ {} {}",
                capitalize_first(&item.name),
                style(format_quantity(item.quantity, &item.unit)).dim()
            );
        }
    }
}

fn pick_recipe(store: &SelectionStore<FileStore>, query: Option<String>) -> Result<Option<Arc<Recipe>>> {
    let query = match query {
        Some(q) => q,
        None => Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Search recipes (blank for all)")
            .allow_empty(true)
            .interact_text()?,
    };
    let results = store.search_recipes(&query);
    if results.is_empty() {
        println!("{}", style("No recipes match.").yellow());
        return Ok(None);
    }
    let options: Vec<String> = results.iter().map(|r| r.name.clone()).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Add which recipe?")
        .items(&options)
        .default(0)
        .interact()?;
    Ok(results.get(selection).cloned())
}

async fn export_documents(
    store: &SelectionStore<FileStore>,
    out_dir: &Path,
    meal_plan: bool,
    groceries: bool,
    logger: &ActivityLogger,
) -> Result<Vec<PathBuf>> {
    let today = chrono::Local::now().date_naive();
    let mut written = Vec::new();

    if meal_plan {
        let path = out_dir.join(MEAL_PLAN_FILE);
        export::write_document(&path, &export::render_meal_plan(store.selected_recipes(), today))
            .await?;
        logger.log_exported(&path).await?;
        written.push(path);
    }
    if groceries {
        let list = aggregate(store.selected_recipes());
        let path = out_dir.join(GROCERY_LIST_FILE);
        export::write_document(&path, &export::render_grocery_list(&list, today)).await?;
        logger.log_exported(&path).await?;
        written.push(path);
    }
    Ok(written)
}

async fn run(args: Args) -> Result<()> {
    if !args.work_dir.exists() {
        tokio::fs::create_dir_all(&args.work_dir).await?;
    }
    let config = config::ensure_planner_dir(&args.work_dir).await?;
    let paths = resolve_paths(&args, &config);
    let logger = ActivityLogger::new(&paths.logs_dir).await?;

    let mut store = load_store(&args, &paths, &logger).await?;

    let command = args.command.unwrap_or(Command::Show);
    if let Err(e) = execute(command, &mut store, &paths, &logger).await {
        logger.log_error(&format!("{:#}", e)).await?;
        return Err(e);
    }
    Ok(())
}

async fn execute(
    command: Command,
    store: &mut SelectionStore<FileStore>,
    paths: &Paths,
    logger: &ActivityLogger,
) -> Result<()> {
    match command {
        Command::Show => print_selection(store),
        Command::Recipe { id } => match store.find(&id) {
            Some(recipe) => print_recipe(&recipe),
            None => anyhow::bail!("No recipe with id '{}'", id),
        },
        Command::Dismiss { id } => {
            let before = store.selected_count();
            store.dismiss(&id)?;
            let shrunk = store.selected_count() < before;
            logger.log_dismissed(&id, &selected_ids(store), !shrunk).await?;
            if shrunk {
                println!("{}", style(format!("Removed {}.", id)).yellow());
            } else {
                println!("{}", style(format!("Dismissed {}.", id)).yellow());
            }
            print_selection(store);
        }
        Command::Add { id, query } => {
            let recipe = match id {
                Some(id) => Some(
                    store
                        .find(&id)
                        .with_context(|| format!("No recipe with id '{}'", id))?,
                ),
                None => pick_recipe(store, query)?,
            };
            if let Some(recipe) = recipe {
                if store.selected_recipes().iter().any(|r| r.id == recipe.id) {
                    warn!("{} is already selected", recipe.id);
                    println!("{}", style(format!("{} is already selected.", recipe.name)).yellow());
                } else {
                    store.add_recipe(Arc::clone(&recipe))?;
                    logger.log_added(&recipe.id).await?;
                    println!("{}", style(format!("Added {}.", recipe.name)).green());
                }
            }
            print_selection(store);
        }
        Command::Search { query } => {
            print_search_results(&store.search_recipes(query.as_deref().unwrap_or("")));
        }
        Command::Reset { yes } => {
            let confirmed = yes
                || Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("This will clear all your selections and start fresh. Are you sure?")
                    .default(false)
                    .interact()
                    .context("Failed to read confirmation")?;
            if !confirmed {
                println!("{}", style("Aborted.").red());
                return Ok(());
            }
            store.reset()?;
            logger.log_reset(&selected_ids(store)).await?;
            info!("Selection reset");
            print_selection(store);
        }
        Command::Groceries => {
            let list = aggregate(store.selected_recipes());
            logger.log_grocery_list(list.total_items()).await?;
            print_grocery_list(&list);
        }
        Command::Export {
            out,
            recipes,
            groceries,
        } => {
            let out_dir = out.unwrap_or_else(|| paths.export_dir.clone());
            let both = !recipes && !groceries;
            let written =
                export_documents(store, &out_dir, both || recipes, both || groceries, logger)
                    .await?;
            for path in written {
                println!("{} {}", style("Wrote").green(), path.display());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug);
    run(args).await
}
