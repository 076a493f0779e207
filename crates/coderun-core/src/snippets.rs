//! Saved snippets, independent of any session.
//!
//! The shelf only caches what the backend returned. Selecting a snippet yields an
//! [`EditorSeed`], which the caller turns into a [`StartRequest`] when it wants to run
//! it; nothing here touches the live session.

use coderun_client::SnippetClient;
use coderun_types::{NewSnippet, Snippet};

use crate::errors::SessionError;
use crate::session::{ExecutionMode, StartRequest};

/// Code and language to load into the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSeed {
    pub code: String,
    pub language: String,
}

impl EditorSeed {
    pub fn into_request(self, mode: ExecutionMode) -> StartRequest {
        match mode {
            ExecutionMode::OneShot => StartRequest::one_shot(self.code, self.language),
            ExecutionMode::Interactive => StartRequest::interactive(self.code, self.language),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnippetShelf {
    snippets: Vec<Snippet>,
}

impl SnippetShelf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a snippet by id.
    pub fn add(&mut self, snippet: Snippet) {
        match self.snippets.iter_mut().find(|existing| existing.id == snippet.id) {
            Some(existing) => *existing = snippet,
            None => self.snippets.push(snippet),
        }
    }

    pub fn extend(&mut self, snippets: impl IntoIterator<Item = Snippet>) {
        for snippet in snippets {
            self.add(snippet);
        }
    }

    pub fn list(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn get(&self, id: u64) -> Option<&Snippet> {
        self.snippets.iter().find(|snippet| snippet.id == id)
    }

    /// Replace the shelf with the backend's current list.
    pub async fn refresh(&mut self, client: &SnippetClient) -> Result<usize, SessionError> {
        let snippets = client.list().await?;
        log::debug!("Fetched {} snippets", snippets.len());
        self.snippets.clear();
        self.extend(snippets);
        Ok(self.snippets.len())
    }

    pub async fn save(
        &mut self,
        client: &SnippetClient,
        snippet: NewSnippet,
    ) -> Result<Snippet, SessionError> {
        let created = client.save(&snippet).await?;
        log::info!("Saved snippet {} as '{}'", created.id, created.title);
        self.add(created.clone());
        Ok(created)
    }

    pub fn select(&self, id: u64) -> Option<EditorSeed> {
        self.get(id).map(|snippet| EditorSeed {
            code: snippet.code.clone(),
            language: snippet.language_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(id: u64, title: &str, language: &str) -> Snippet {
        Snippet {
            id,
            title: title.to_string(),
            code: format!("print('{}')", title),
            language_name: language.to_string(),
            is_public: false,
        }
    }

    #[test]
    fn test_add_replaces_by_id() {
        let mut shelf = SnippetShelf::new();
        shelf.add(snippet(1, "first", "Python"));
        shelf.add(snippet(2, "second", "C"));
        shelf.add(snippet(1, "renamed", "Python"));

        assert_eq!(shelf.list().len(), 2);
        assert_eq!(shelf.get(1).unwrap().title, "renamed");
    }

    #[test]
    fn test_select_seeds_editor() {
        let mut shelf = SnippetShelf::new();
        shelf.extend([snippet(7, "hello", "C++")]);

        let seed = shelf.select(7).unwrap();
        assert_eq!(seed.code, "print('hello')");
        assert_eq!(seed.language, "C++");
        assert!(shelf.select(8).is_none());

        let request = seed.into_request(ExecutionMode::Interactive);
        assert_eq!(request.mode, ExecutionMode::Interactive);
        assert_eq!(request.language, "C++");
        assert!(request.captured_input.is_none());
    }
}
