use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEventType {
    CatalogLoaded,
    CatalogFailed,
    SelectionRestored,
    SelectionInitialized,
    RecipeDismissed,
    RecipeAdded,
    SelectionReset,
    GroceryListGenerated,
    DocumentExported,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One line of the activity journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: String,
    pub event_type: ActivityEventType,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ActivityEvent {
    pub fn new(
        event_type: ActivityEventType,
        level: LogLevel,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event_type,
            level,
            message: message.into(),
            details,
        }
    }

    pub fn info(event_type: ActivityEventType, message: impl Into<String>) -> Self {
        Self::new(event_type, LogLevel::Info, message, None)
    }

    pub fn info_with_details(
        event_type: ActivityEventType,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::new(event_type, LogLevel::Info, message, Some(details))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ActivityEventType::Error, LogLevel::Error, message, None)
    }
}

/// Appends planner activity to `activity.jsonl`, one JSON event per line.
pub struct ActivityLogger {
    log_file_path: PathBuf,
}

impl ActivityLogger {
    /// Creates the logs directory if needed.
    pub async fn new(logs_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(logs_dir)
            .await
            .context("Failed to create logs directory")?;
        Ok(Self {
            log_file_path: logs_dir.join("activity.jsonl"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_file_path
    }

    /// Each call opens, appends and flushes so a crash loses at most the
    /// event being written.
    pub async fn log(&self, event: ActivityEvent) -> Result<()> {
        let mut line = serde_json::to_string(&event).context("Failed to serialize log event")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .context("Failed to open log file")?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn log_catalog_loaded(&self, recipe_count: usize, source: &str) -> Result<()> {
        self.log(ActivityEvent::info_with_details(
            ActivityEventType::CatalogLoaded,
            format!("Loaded {} recipes from {}", recipe_count, source),
            serde_json::json!({ "recipes": recipe_count, "source": source }),
        ))
        .await
    }

    pub async fn log_catalog_failed(&self, error: &str) -> Result<()> {
        self.log(ActivityEvent::new(
            ActivityEventType::CatalogFailed,
            LogLevel::Error,
            format!("Catalog failed to load: {}", error),
            None,
        ))
        .await
    }

    pub async fn log_selection(&self, restored: bool, selected_ids: &[String]) -> Result<()> {
        let event_type = if restored {
            ActivityEventType::SelectionRestored
        } else {
            ActivityEventType::SelectionInitialized
        };
        self.log(ActivityEvent::info_with_details(
            event_type,
            format!("Selection of {} recipes", selected_ids.len()),
            serde_json::json!({ "selected": selected_ids }),
        ))
        .await
    }

    /// A dismissal that left its slot empty is journaled at `warn`.
    pub async fn log_dismissed(
        &self,
        recipe_id: &str,
        selected_ids: &[String],
        replaced: bool,
    ) -> Result<()> {
        let (level, message) = if replaced {
            (LogLevel::Info, format!("Dismissed {}", recipe_id))
        } else {
            (
                LogLevel::Warn,
                format!("Dismissed {} without a replacement", recipe_id),
            )
        };
        self.log(ActivityEvent::new(
            ActivityEventType::RecipeDismissed,
            level,
            message,
            Some(serde_json::json!({
                "recipe_id": recipe_id,
                "selected": selected_ids,
                "replaced": replaced,
            })),
        ))
        .await
    }

    pub async fn log_added(&self, recipe_id: &str) -> Result<()> {
        self.log(ActivityEvent::info_with_details(
            ActivityEventType::RecipeAdded,
            format!("Added {}", recipe_id),
            serde_json::json!({ "recipe_id": recipe_id }),
        ))
        .await
    }

    pub async fn log_reset(&self, selected_ids: &[String]) -> Result<()> {
        self.log(ActivityEvent::info_with_details(
            ActivityEventType::SelectionReset,
            "Selection reset",
            serde_json::json!({ "selected": selected_ids }),
        ))
        .await
    }

    pub async fn log_grocery_list(&self, item_count: usize) -> Result<()> {
        self.log(ActivityEvent::info_with_details(
            ActivityEventType::GroceryListGenerated,
            format!("Grocery list with {} items", item_count),
            serde_json::json!({ "items": item_count }),
        ))
        .await
    }

    pub async fn log_exported(&self, path: &Path) -> Result<()> {
        self.log(ActivityEvent::info_with_details(
            ActivityEventType::DocumentExported,
            format!("Exported {}", path.display()),
            serde_json::json!({ "path": path.display().to_string() }),
        ))
        .await
    }

    pub async fn log_error(&self, message: &str) -> Result<()> {
        self.log(ActivityEvent::error(message)).await
    }
}

/// Reads back every event in a journal. Lines that fail to parse are skipped.
pub async fn read_events(path: &Path) -> Result<Vec<ActivityEvent>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}
