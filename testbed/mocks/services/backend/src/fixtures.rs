use coderun_types::{Language, NewSnippet, Snippet};
use serde::{Deserialize, Serialize};

/// A snippet seeded into the mock before any client call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetSeed {
    pub title: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub is_public: bool,
}

/// In-memory snippet store.
#[derive(Debug, Clone)]
pub struct SnippetFixture {
    snippets: Vec<Snippet>,
    next_id: u64,
}

impl SnippetFixture {
    pub fn new() -> Self {
        Self {
            snippets: Vec::new(),
            next_id: 1,
        }
    }

    pub fn from_yaml(yaml_content: &str) -> anyhow::Result<Self> {
        let seeds: Vec<SnippetSeed> = serde_yaml::from_str(yaml_content)?;
        let mut fixture = Self::new();
        for seed in seeds {
            fixture.insert(NewSnippet {
                title: seed.title,
                code: seed.code,
                language: seed.language,
                is_public: seed.is_public,
            });
        }
        Ok(fixture)
    }

    pub fn create_test_fixture() -> Self {
        let mut fixture = Self::new();
        fixture.insert(NewSnippet::new(
            "Hello",
            "print(\"hello\")",
            Language::Python,
        ));
        fixture.insert(NewSnippet::new(
            "Echo",
            "input(\"Enter n: \")\nprint you typed $input",
            Language::Python,
        ));
        fixture
    }

    pub fn insert(&mut self, snippet: NewSnippet) -> Snippet {
        let created = Snippet {
            id: self.next_id,
            title: snippet.title,
            code: snippet.code,
            language_name: snippet.language,
            is_public: snippet.is_public,
        };
        self.next_id += 1;
        self.snippets.push(created.clone());
        created
    }

    pub fn all(&self) -> &[Snippet] {
        &self.snippets
    }
}

impl Default for SnippetFixture {
    fn default() -> Self {
        Self::new()
    }
}
