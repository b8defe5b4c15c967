use crate::catalog::CatalogSource;
use crate::domain::recipe::Recipe;
use crate::error::{PlannerError, PlannerResult};
use crate::storage::{DISMISSED_IDS_KEY, KeyValueStore, SELECTED_IDS_KEY, read_ids, write_ids};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of recipes a fresh selection starts with. Dismissing a recipe keeps
/// the selection at this size while replacements are available.
pub const INITIAL_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogStatus {
    Loading,
    Ready,
    Failed(String),
}

/// How the current selection came to be after a catalog load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    Restored,
    Random,
}

/// The week's recipe selection.
///
/// Canonical state is the catalog, the ordered selection and the set of
/// dismissed ids. Every other view is derived from those on each call, and
/// every mutation ends by writing both id lists to the key-value store.
pub struct SelectionStore<S: KeyValueStore> {
    storage: S,
    rng: StdRng,
    status: CatalogStatus,
    catalog: Vec<Arc<Recipe>>,
    by_id: HashMap<String, usize>,
    selected: Vec<Arc<Recipe>>,
    dismissed: BTreeSet<String>,
}

impl<S: KeyValueStore> SelectionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            rng: StdRng::from_os_rng(),
            status: CatalogStatus::Loading,
            catalog: Vec::new(),
            by_id: HashMap::new(),
            selected: Vec::new(),
            dismissed: BTreeSet::new(),
        }
    }

    /// Replaces the random source with a seeded one so shuffles and
    /// replacement draws are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Fetches the catalog and restores or initializes the selection.
    ///
    /// On failure the store keeps an empty catalog and selection and reports
    /// the error through [`SelectionStore::error`]. The same error is returned.
    pub async fn load<C: CatalogSource + ?Sized>(
        &mut self,
        source: &C,
    ) -> PlannerResult<SelectionOrigin> {
        self.status = CatalogStatus::Loading;
        match source.load_catalog().await {
            Ok(recipes) => Ok(self.initialize(recipes)),
            Err(e) => {
                warn!("Recipe catalog failed to load: {}", e);
                self.catalog.clear();
                self.by_id.clear();
                self.selected.clear();
                self.status = CatalogStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Installs a loaded catalog, then restores saved state or falls back to a
    /// random selection.
    ///
    /// Saved dismissals are taken as-is. Saved selections are mapped through
    /// the catalog; ids that no longer exist are dropped, and if nothing is
    /// left the selection is drawn at random instead.
    pub fn initialize(&mut self, recipes: Vec<Recipe>) -> SelectionOrigin {
        self.catalog = recipes.into_iter().map(Arc::new).collect();
        self.by_id = self
            .catalog
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        self.status = CatalogStatus::Ready;
        self.selected.clear();
        self.dismissed.clear();

        if let Some(saved) = read_ids(&self.storage, DISMISSED_IDS_KEY) {
            if !saved.is_empty() {
                self.dismissed = saved.into_iter().collect();
            }
        }

        let restored: Vec<Arc<Recipe>> = read_ids(&self.storage, SELECTED_IDS_KEY)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.find(id))
            .collect();

        let origin = if restored.is_empty() {
            self.random_init();
            SelectionOrigin::Random
        } else {
            self.selected = restored;
            SelectionOrigin::Restored
        };
        info!(
            "Selection {:?} with {} recipes ({} dismissed, catalog of {})",
            origin,
            self.selected.len(),
            self.dismissed.len(),
            self.catalog.len()
        );
        self.persist();
        origin
    }

    fn random_init(&mut self) {
        let mut shuffled = self.catalog.clone();
        shuffled.shuffle(&mut self.rng);
        shuffled.truncate(INITIAL_COUNT);
        self.selected = shuffled;
    }

    fn ensure_ready(&self) -> PlannerResult<()> {
        match self.status {
            CatalogStatus::Ready => Ok(()),
            _ => Err(PlannerError::CatalogNotReady),
        }
    }

    /// Rejects a recipe for auto-suggestion and takes it out of the selection.
    ///
    /// While the selection is at or below [`INITIAL_COUNT`] the dismissed slot
    /// is refilled in place with a random undismissed, unselected recipe when
    /// one exists. Larger selections simply shrink.
    pub fn dismiss(&mut self, recipe_id: &str) -> PlannerResult<()> {
        self.ensure_ready()?;
        let current_count = self.selected.len();
        self.dismissed.insert(recipe_id.to_string());

        let replacement = if current_count <= INITIAL_COUNT {
            self.random_suggestion()
        } else {
            None
        };

        match replacement {
            Some(replacement) => {
                debug!("Replacing {} with {}", recipe_id, replacement.id);
                for slot in self.selected.iter_mut().filter(|r| r.id == recipe_id) {
                    *slot = Arc::clone(&replacement);
                }
            }
            None => {
                debug!("Removing {} without replacement", recipe_id);
                self.selected.retain(|r| r.id != recipe_id);
            }
        }

        self.persist();
        Ok(())
    }

    fn random_suggestion(&mut self) -> Option<Arc<Recipe>> {
        let available = self.available_for_suggestion();
        available.choose(&mut self.rng).cloned()
    }

    /// Appends a recipe to the selection, making it eligible for suggestion
    /// again if it had been dismissed. Already-selected recipes are not
    /// checked for; offer candidates from [`SelectionStore::search_recipes`].
    pub fn add_recipe(&mut self, recipe: Arc<Recipe>) -> PlannerResult<()> {
        self.ensure_ready()?;
        self.dismissed.remove(&recipe.id);
        debug!("Adding {} to selection", recipe.id);
        self.selected.push(recipe);
        self.persist();
        Ok(())
    }

    /// Forgets every dismissal and saved selection and draws a new one.
    pub fn reset(&mut self) -> PlannerResult<()> {
        self.ensure_ready()?;
        for key in [SELECTED_IDS_KEY, DISMISSED_IDS_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to clear {}: {}", key, e);
            }
        }
        self.dismissed.clear();
        self.random_init();
        info!("Selection reset to {} recipes", self.selected.len());
        self.persist();
        Ok(())
    }

    fn persist(&self) {
        let selected: Vec<String> = self.selected.iter().map(|r| r.id.clone()).collect();
        let dismissed: Vec<String> = self.dismissed.iter().cloned().collect();
        for (key, ids) in [(SELECTED_IDS_KEY, selected), (DISMISSED_IDS_KEY, dismissed)] {
            if let Err(e) = write_ids(&self.storage, key, &ids) {
                warn!("Failed to persist {}: {}", key, e);
            }
        }
    }

    fn selected_ids(&self) -> HashSet<&str> {
        self.selected.iter().map(|r| r.id.as_str()).collect()
    }

    /// Catalog recipes that are neither selected nor dismissed.
    pub fn available_for_suggestion(&self) -> Vec<Arc<Recipe>> {
        let selected = self.selected_ids();
        self.catalog
            .iter()
            .filter(|r| !selected.contains(r.id.as_str()) && !self.dismissed.contains(&r.id))
            .cloned()
            .collect()
    }

    /// Catalog recipes that are not selected. Dismissed recipes stay here so
    /// they can be added back.
    pub fn available_for_search(&self) -> Vec<Arc<Recipe>> {
        let selected = self.selected_ids();
        self.catalog
            .iter()
            .filter(|r| !selected.contains(r.id.as_str()))
            .cloned()
            .collect()
    }

    pub fn search_recipes(&self, query: &str) -> Vec<Arc<Recipe>> {
        let query = query.trim().to_lowercase();
        let candidates = self.available_for_search();
        if query.is_empty() {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|r| r.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn selected_recipes(&self) -> &[Arc<Recipe>] {
        &self.selected
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn dismissed_ids(&self) -> &BTreeSet<String> {
        &self.dismissed
    }

    pub fn all_recipes(&self) -> &[Arc<Recipe>] {
        &self.catalog
    }

    pub fn find(&self, recipe_id: &str) -> Option<Arc<Recipe>> {
        self.by_id
            .get(recipe_id)
            .map(|&i| Arc::clone(&self.catalog[i]))
    }

    pub fn status(&self) -> &CatalogStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == CatalogStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            CatalogStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}
