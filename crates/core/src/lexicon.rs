use std::sync::Arc;

/// The fixed set of technical terms the context accumulator watches for.
/// Terms are stored lowercased; matching is plain substring containment
/// against the lowercased input, not tokenization.
pub const TECHNICAL_TERMS: &[&str] = &[
    // Languages
    "python",
    "javascript",
    "typescript",
    "java",
    "cpp",
    "c++",
    "c#",
    "ruby",
    "go",
    "golang",
    "rust",
    "swift",
    "kotlin",
    "php",
    // Frontend
    "react",
    "vue",
    "angular",
    "svelte",
    "nextjs",
    "vite",
    "webpack",
    "html",
    "css",
    "tailwind",
    "bootstrap",
    "redux",
    // Backend
    "node",
    "nodejs",
    "express",
    "fastapi",
    "flask",
    "django",
    "spring",
    "asp.net",
    "laravel",
    "graphql",
    "rest api",
    // Database
    "sql",
    "mysql",
    "postgres",
    "postgresql",
    "mongodb",
    "redis",
    "cassandra",
    "dynamodb",
    "firebase",
    "sqlite",
    // Infrastructure / Tools
    "docker",
    "kubernetes",
    "k8s",
    "aws",
    "azure",
    "gcp",
    "git",
    "github",
    "gitlab",
    "jenkins",
    "ci/cd",
    "nginx",
    "apache",
    // AI / ML
    "pytorch",
    "tensorflow",
    "keras",
    "openai",
    "llm",
    "bert",
    "transformer",
    "nlp",
    "pandas",
    "numpy",
    "scikit-learn",
];

/// Immutable term list shared across sessions. Built once at startup and
/// read concurrently without synchronization.
#[derive(Debug)]
pub struct Lexicon {
    terms: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(TECHNICAL_TERMS.iter().map(|t| t.to_string()))
    }
}

impl Lexicon {
    pub fn new(terms: impl IntoIterator<Item = String>) -> Self {
        Self {
            terms: terms.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns every term that appears anywhere in the lowercased text.
    pub fn find_mentions(&self, text: &str) -> Vec<&str> {
        let lowered = text.to_lowercase();
        self.terms
            .iter()
            .filter(|term| lowered.contains(term.as_str()))
            .map(|term| term.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_are_case_insensitive_substrings() {
        let lexicon = Lexicon::default();
        let mentions = lexicon.find_mentions("I built the API with FastAPI and Postgres");
        assert!(mentions.contains(&"fastapi"));
        assert!(mentions.contains(&"postgres"));
    }

    #[test]
    fn no_mentions_in_plain_text() {
        let lexicon = Lexicon::default();
        assert!(lexicon.find_mentions("hello there, nice weather").is_empty());
    }

    #[test]
    fn empty_text_yields_nothing() {
        let lexicon = Lexicon::default();
        assert!(lexicon.find_mentions("").is_empty());
    }
}
