//! Command handler for the lexd CLI

use std::fmt::Write;

use anyhow::{Context, Result};
use lexdict::{Dictionary, FavoriteRecord, HistoryRecord, Word, WordItem, WordsPage};

use crate::{CacheAction, Command, FavoritesAction, HistoryAction};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct CommandHandler<'a> {
    dictionary: &'a Dictionary,
    json: bool,
}

impl<'a> CommandHandler<'a> {
    pub fn new(dictionary: &'a Dictionary, json: bool) -> Self {
        Self { dictionary, json }
    }

    /// Run one command and return what should be printed
    pub async fn handle(&self, cmd: Command) -> Result<String> {
        match cmd {
            Command::Lookup { word } => self.handle_lookup(&word).await,
            Command::Favorites { action } => {
                self.handle_favorites(action.unwrap_or(FavoritesAction::List)).await
            }
            Command::History { action } => {
                self.handle_history(action.unwrap_or(HistoryAction::List)).await
            }
            Command::Words { page, count } => self.handle_words(page, count).await,
            Command::Search { prefix, limit } => self.handle_search(&prefix, limit).await,
            Command::Cache { action } => self.handle_cache(action),
            Command::Compact => self.handle_compact(),
        }
    }

    async fn handle_lookup(&self, word: &str) -> Result<String> {
        let entry = self.dictionary.view_word(word).await?;
        if self.json {
            return Ok(serde_json::to_string_pretty(&entry)?);
        }
        let favorite = self.dictionary.controller().is_favorite(&entry.word);
        Ok(render_word(&entry, favorite))
    }

    async fn handle_favorites(&self, action: FavoritesAction) -> Result<String> {
        let controller = self.dictionary.controller();
        match action {
            FavoritesAction::List => {}
            FavoritesAction::Add { word } => controller.add_favorite(&word).await?,
            FavoritesAction::Remove { word } => controller.remove_favorite(&word).await?,
            FavoritesAction::Toggle { word } => {
                let now_favorite = controller.toggle_favorite(&word).await?;
                if !self.json {
                    let verb = if now_favorite { "added" } else { "removed" };
                    return Ok(format!("{} {}", verb, word));
                }
            }
        }

        let favorites = controller.favorites();
        if self.json {
            return Ok(serde_json::to_string_pretty(&favorites)?);
        }
        Ok(render_favorites(&favorites))
    }

    async fn handle_history(&self, action: HistoryAction) -> Result<String> {
        let controller = self.dictionary.controller();
        if action == HistoryAction::Clear {
            controller.clear_history().await?;
        }

        let history = controller.history();
        if self.json {
            return Ok(serde_json::to_string_pretty(&history)?);
        }
        Ok(render_history(&history))
    }

    async fn handle_words(&self, page: usize, count: bool) -> Result<String> {
        let words = self.dictionary.words()?;
        let result = if count {
            words.list_words_counted(page).await?
        } else {
            words.list_words(page).await?
        };

        if self.json {
            return Ok(serde_json::to_string_pretty(&result.words)?);
        }
        Ok(render_page(page, &result))
    }

    async fn handle_search(&self, prefix: &str, limit: usize) -> Result<String> {
        let found = self
            .dictionary
            .words()?
            .search_words(prefix, limit)
            .await
            .with_context(|| format!("search for '{}' failed", prefix))?;

        if self.json {
            return Ok(serde_json::to_string_pretty(&found)?);
        }
        Ok(render_items(&found))
    }

    fn handle_cache(&self, action: CacheAction) -> Result<String> {
        let lookup = self.dictionary.lookup();
        match action {
            CacheAction::Clear => {
                lookup.clear_cache();
                Ok("OK".to_string())
            }
            CacheAction::Remove { word } => {
                lookup.invalidate(&word);
                Ok("OK".to_string())
            }
        }
    }

    fn handle_compact(&self) -> Result<String> {
        let reclaimed = self.dictionary.compact()?;
        Ok(format!("reclaimed {} bytes", reclaimed))
    }
}

fn render_word(word: &Word, favorite: bool) -> String {
    let mut out = String::new();
    let star = if favorite { " *" } else { "" };
    match word.display_phonetic() {
        Some(phonetic) => {
            let _ = writeln!(out, "{} {}{}", word.word, phonetic, star);
        }
        None => {
            let _ = writeln!(out, "{}{}", word.word, star);
        }
    }
    if let Some(audio) = word.audio_url() {
        let _ = writeln!(out, "audio: {}", audio);
    }

    for meaning in &word.meanings {
        let _ = writeln!(out, "\n{}", meaning.part_of_speech);
        for (i, definition) in meaning.definitions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, definition.definition);
            if let Some(example) = &definition.example {
                let _ = writeln!(out, "     \"{}\"", example);
            }
            if !definition.synonyms.is_empty() {
                let _ = writeln!(out, "     synonyms: {}", definition.synonyms.join(", "));
            }
        }
    }

    if let Some(origin) = &word.origin {
        let _ = writeln!(out, "\norigin: {}", origin);
    }
    out.trim_end().to_string()
}

fn render_favorites(favorites: &[FavoriteRecord]) -> String {
    if favorites.is_empty() {
        return "(no favorites)".to_string();
    }
    favorites
        .iter()
        .map(|fav| format!("{}  {}", fav.added_at.format(TIME_FORMAT), fav.word))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_history(history: &[HistoryRecord]) -> String {
    if history.is_empty() {
        return "(no history)".to_string();
    }
    history
        .iter()
        .map(|item| format!("{}  {}", item.viewed_at.format(TIME_FORMAT), item.word))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_items(items: &[WordItem]) -> String {
    if items.is_empty() {
        return "(no matches)".to_string();
    }
    items
        .iter()
        .map(|item| item.word.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_page(page: usize, result: &WordsPage) -> String {
    let mut out = render_items(&result.words);
    let _ = write!(out, "\n-- page {}", page);
    if let Some(total) = result.total {
        let _ = write!(out, " of {} words", total);
    }
    if result.has_more {
        let _ = write!(out, ", next: --page {}", page + 1);
    }
    out
}
