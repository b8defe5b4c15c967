use crate::domain::recipe::{Category, Ingredient, Recipe};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// One line of the shopping list: every ingredient sharing a normalization key,
/// merged into a single quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryItem {
    /// Normalization key, `name-unit` lowercased and trimmed.
    pub id: String,
    pub name: String,
    pub quantity: f64,
    /// Unit label as written on the first ingredient that produced this item.
    pub unit: String,
    pub category: Category,
}

/// Grocery items partitioned into the five store sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroceryList {
    pub produce: Vec<GroceryItem>,
    pub meat: Vec<GroceryItem>,
    pub dairy: Vec<GroceryItem>,
    pub pantry: Vec<GroceryItem>,
    pub frozen: Vec<GroceryItem>,
}

impl GroceryList {
    pub fn items(&self, category: Category) -> &[GroceryItem] {
        match category {
            Category::Produce => &self.produce,
            Category::Meat => &self.meat,
            Category::Dairy => &self.dairy,
            Category::Pantry => &self.pantry,
            Category::Frozen => &self.frozen,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<GroceryItem> {
        match category {
            Category::Produce => &mut self.produce,
            Category::Meat => &mut self.meat,
            Category::Dairy => &mut self.dairy,
            Category::Pantry => &mut self.pantry,
            Category::Frozen => &mut self.frozen,
        }
    }

    /// Buckets in rendering order, empty ones included.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[GroceryItem])> {
        Category::ALL.into_iter().map(move |c| (c, self.items(c)))
    }

    pub fn total_items(&self) -> usize {
        self.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }
}

pub fn normalization_key(name: &str, unit: &str) -> String {
    format!(
        "{}-{}",
        name.trim().to_lowercase(),
        unit.trim().to_lowercase()
    )
}

/// Merges the ingredients of `recipes` into a categorized shopping list.
///
/// Ingredients are keyed by lowercased, trimmed name and unit. The first
/// ingredient seen for a key decides the item's unit label and category; later
/// ones only contribute their quantity. Each bucket is sorted by name with a
/// stable comparison, so equal names keep their first-seen order.
pub fn aggregate<R: Borrow<Recipe>>(recipes: &[R]) -> GroceryList {
    let mut items: Vec<GroceryItem> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for recipe in recipes {
        for ingredient in &recipe.borrow().ingredients {
            let key = normalization_key(&ingredient.name, &ingredient.unit);
            match index.get(&key) {
                Some(&pos) => merge_into(&mut items[pos], ingredient),
                None => {
                    index.insert(key.clone(), items.len());
                    items.push(GroceryItem {
                        id: key,
                        name: ingredient.name.trim().to_lowercase(),
                        quantity: ingredient.quantity,
                        unit: ingredient.unit.clone(),
                        category: ingredient.category,
                    });
                }
            }
        }
    }

    let mut list = GroceryList::default();
    for item in items {
        list.bucket_mut(item.category).push(item);
    }
    for category in Category::ALL {
        list.bucket_mut(category)
            .sort_by(|a, b| compare_names(&a.name, &b.name));
    }
    list
}

fn merge_into(item: &mut GroceryItem, ingredient: &Ingredient) {
    if item.category != ingredient.category {
        debug!(
            key = %item.id,
            kept = %item.category,
            ignored = %ingredient.category,
            "Ingredient category differs from first occurrence"
        );
    }
    item.quantity += ingredient.quantity;
}

/// Renders a quantity rounded to two decimals followed by its unit.
///
/// Whole values print without decimals (`2 cup`), anything else prints with
/// exactly two (`1.50 cup`).
pub fn format_quantity(quantity: f64, unit: &str) -> String {
    let rounded = (quantity * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.0} {}", rounded, unit)
    } else {
        format!("{:.2} {}", rounded, unit)
    }
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collation used to order grocery names.
///
/// Letters compare case-insensitively with common Latin accents folded onto
/// their base letter and ligatures expanded (`ß` as `ss`, `œ` as `oe`);
/// strings equal under that folding fall back to their raw code point order,
/// so `e` sorts before `é` and both before `f`. Scripts outside Latin keep
/// code point order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

fn fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        match lower {
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'þ' => out.push_str("th"),
            other => out.push(fold_char(other)),
        }
    }
    out
}

fn fold_char(lower: char) -> char {
    match lower {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'đ' | 'ď' | 'ð' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ł' | 'ľ' | 'ĺ' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ř' => 'r',
        'ś' | 'š' | 'ş' => 's',
        'ť' | 'ţ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}
