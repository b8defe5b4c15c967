//! Plain-text documents for printing or sharing the week's plan.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::borrow::Borrow;
use std::fmt::Write as _;
use std::path::Path;

use crate::domain::recipe::Recipe;
use crate::grocery::{GroceryList, capitalize_first, format_quantity};

pub const MEAL_PLAN_FILE: &str = "weekly-meal-plan.txt";
pub const GROCERY_LIST_FILE: &str = "grocery-list.txt";

const DIVIDER: &str = "----------------------------------------";

/// Long US-style date, e.g. `October 19, 2026`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub fn render_meal_plan<R: Borrow<Recipe>>(recipes: &[R], date: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Weekly Meal Plan");
    let _ = writeln!(out, "{}", format_date(date));

    for recipe in recipes {
        let recipe = recipe.borrow();
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", recipe.name);
        let _ = writeln!(
            out,
            "Prep: {} min | Cook: {} min | Serves: {}",
            recipe.prep_time, recipe.cook_time, recipe.servings
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Ingredients:");
        for ingredient in &recipe.ingredients {
            let _ = writeln!(
                out,
                "  • {} ({})",
                capitalize_first(&ingredient.name),
                format_quantity(ingredient.quantity, &ingredient.unit)
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Instructions:");
        for line in recipe.instructions.lines() {
            let _ = writeln!(out, "  {}", line);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", DIVIDER);
    }
    out
}

/// Renders non-empty categories only, each item with a checkbox.
pub fn render_grocery_list(list: &GroceryList, date: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Grocery List");
    let _ = writeln!(out, "{}", format_date(date));

    for (category, items) in list.iter() {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", category.label().to_uppercase());
        for item in items {
            let _ = writeln!(
                out,
                "[ ] {} ({})",
                capitalize_first(&item.name),
                format_quantity(item.quantity, &item.unit)
            );
        }
    }
    out
}

pub async fn write_document(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
