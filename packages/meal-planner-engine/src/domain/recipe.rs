use serde::{Deserialize, Serialize};

/// Grocery store section an ingredient is bought from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Produce,
    Meat,
    Dairy,
    Pantry,
    Frozen,
}

impl Category {
    /// Every category, in the order grocery lists are rendered.
    pub const ALL: [Category; 5] = [
        Category::Produce,
        Category::Meat,
        Category::Dairy,
        Category::Pantry,
        Category::Frozen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "produce",
            Category::Meat => "meat",
            Category::Dairy => "dairy",
            Category::Pantry => "pantry",
            Category::Frozen => "frozen",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::Meat => "Meat",
            Category::Dairy => "Dairy",
            Category::Pantry => "Pantry",
            Category::Frozen => "Frozen",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    /// Free-text unit label. Case and surrounding whitespace are ignored when
    /// merging, but the label is otherwise never converted.
    pub unit: String,
    pub category: Category,
}

impl Ingredient {
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub ingredients: Vec<Ingredient>,
    /// Newline-delimited steps.
    #[serde(default)]
    pub instructions: String,
    pub prep_time: u32,
    pub cook_time: u32,
    pub servings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl Recipe {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: String::new(),
            ingredients: Vec::new(),
            instructions: String::new(),
            prep_time: 0,
            cook_time: 0,
            servings: 1,
            categories: None,
        }
    }

    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn with_times(mut self, prep_time: u32, cook_time: u32) -> Self {
        self.prep_time = prep_time;
        self.cook_time = cook_time;
        self
    }

    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = servings;
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Prep plus cook minutes, widened so catalog extremes cannot overflow.
    pub fn total_time(&self) -> u64 {
        u64::from(self.prep_time) + u64::from(self.cook_time)
    }

    /// Instruction steps with blank lines removed.
    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.instructions
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

/// On-disk layout of a recipe catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipesFile {
    pub recipes: Vec<Recipe>,
}
