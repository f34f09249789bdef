//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use linknest_core::{Folder, Link, QueryHit, StorageError, Store, StoreStats};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// A link in a result list, serialized with its score
#[derive(Serialize)]
struct HitView<'a> {
    #[serde(flatten)]
    link: &'a Link,
    score: u32,
}

/// A folder with the number of links filed under it
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FolderView<'a> {
    #[serde(flatten)]
    folder: &'a Folder,
    link_count: usize,
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single link
    pub fn print_link(&self, link: &Link, store: &Store) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", link.id);
                println!("Title:       {}", link.title);
                println!("URL:         {}", link.url);
                if !link.description.is_empty() {
                    println!("Description: {}", link.description);
                }
                if !link.tags.is_empty() {
                    println!("Tags:        {}", link.tags.join(", "));
                }
                println!("Folder:      {}", folder_label(link, store));
                println!("Created:     {}", link.created_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(link),
            OutputFormat::Quiet => {
                println!("{}", link.id);
            }
        }
    }

    /// Print an ordered result list
    ///
    /// Scores are shown only when a search produced them.
    pub fn print_hits(&self, hits: &[QueryHit<'_>], store: &Store) {
        match self.format {
            OutputFormat::Human => {
                if hits.is_empty() {
                    println!("No links found.");
                    return;
                }
                for hit in hits {
                    let link = hit.link;
                    let score = if hit.score > 0 {
                        format!(" ({})", hit.score)
                    } else {
                        String::new()
                    };
                    println!(
                        "{} | {}{} | {} | {}",
                        short_id(&link.id.to_string()),
                        truncate(&link.title, 35),
                        score,
                        truncate(&link.url, 40),
                        truncate(&folder_label(link, store), 15)
                    );
                }
                println!("\n{} link(s)", hits.len());
            }
            OutputFormat::Json => {
                let views: Vec<HitView<'_>> = hits
                    .iter()
                    .map(|hit| HitView {
                        link: hit.link,
                        score: hit.score,
                    })
                    .collect();
                print_json(&views);
            }
            OutputFormat::Quiet => {
                for hit in hits {
                    println!("{}", hit.link.id);
                }
            }
        }
    }

    /// Print a single folder
    pub fn print_folder(&self, folder: &Folder) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", folder.id);
                println!("Name:    {}", folder.name);
                println!("Created: {}", folder.created_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(folder),
            OutputFormat::Quiet => {
                println!("{}", folder.id);
            }
        }
    }

    /// Print folders with their link counts
    pub fn print_folders(&self, folders: &[(&Folder, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if folders.is_empty() {
                    println!("No folders yet.");
                    return;
                }
                for (folder, count) in folders {
                    println!(
                        "{} | {} ({})",
                        short_id(&folder.id.to_string()),
                        folder.name,
                        count
                    );
                }
                println!("\n{} folder(s)", folders.len());
            }
            OutputFormat::Json => {
                let views: Vec<FolderView<'_>> = folders
                    .iter()
                    .map(|(folder, link_count)| FolderView {
                        folder,
                        link_count: *link_count,
                    })
                    .collect();
                print_json(&views);
            }
            OutputFormat::Quiet => {
                for (folder, _) in folders {
                    println!("{}", folder.id);
                }
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print collection statistics
    pub fn print_stats(&self, stats: &StoreStats) {
        match self.format {
            OutputFormat::Human => {
                println!("LinkNest Stats");
                println!("==============");
                println!();
                println!("  Links:       {}", stats.total_links);
                println!("  Folders:     {}", stats.total_folders);
                println!("  Unfiled:     {}", stats.unfiled_links);
                println!("  Unique tags: {}", stats.unique_tags);
                if !stats.top_tags.is_empty() {
                    println!();
                    println!("Top tags:");
                    for (tag, count) in &stats.top_tags {
                        println!("  {} ({})", tag, count);
                    }
                }
            }
            OutputFormat::Json => {
                let top_tags: Vec<_> = stats
                    .top_tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&serde_json::json!({
                    "totalLinks": stats.total_links,
                    "totalFolders": stats.total_folders,
                    "unfiledLinks": stats.unfiled_links,
                    "uniqueTags": stats.unique_tags,
                    "topTags": top_tags,
                }));
            }
            OutputFormat::Quiet => {
                println!("{}", stats.total_links);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warn(&self, msg: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", msg);
        }
    }

    /// Report a storage problem with its hint, even in quiet mode
    pub fn storage_problem(&self, error: &StorageError) {
        eprintln!("⚠ {}", error);
        if let Some(hint) = error.hint() {
            eprintln!("  {}", hint);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Folder name for display, "(unfiled)" when there is none
fn folder_label(link: &Link, store: &Store) -> String {
    link.folder_id
        .and_then(|id| store.get_folder(id))
        .map(|f| f.name.clone())
        .unwrap_or_else(|| "(unfiled)".to_string())
}

/// First eight characters of an id
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linknest_core::LinkDraft;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ünïcödé títle", 8), "ünïcö...");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0b7e6d4c-1f2a-4b3c"), "0b7e6d4c");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_folder_label() {
        let mut store = Store::in_memory();
        let folder = store.add_folder("Reading").id;
        let filed = store
            .add_link(LinkDraft::new("https://a.example", "A").in_folder(folder))
            .clone();
        let loose = store
            .add_link(LinkDraft::new("https://b.example", "B"))
            .clone();

        assert_eq!(folder_label(&filed, &store), "Reading");
        assert_eq!(folder_label(&loose, &store), "(unfiled)");
    }

    #[test]
    fn test_hit_view_flattens_link() {
        let mut store = Store::in_memory();
        let link = store
            .add_link(LinkDraft::new("https://a.example", "A"))
            .clone();
        let value = serde_json::to_value(HitView {
            link: &link,
            score: 65,
        })
        .unwrap();

        assert_eq!(value["score"], 65);
        assert_eq!(value["title"], "A");
        assert!(value.get("createdAt").is_some());
    }
}
