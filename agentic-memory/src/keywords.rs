//! Domain-vocabulary keyword extraction used by continuation decisions.

use std::collections::HashSet;

/// Curated domain vocabulary: technology terms and common programming
/// nouns. Tokens outside this set only count as keywords if they were
/// originally capitalised in the source text (likely a proper noun).
const DOMAIN_VOCABULARY: &[&str] = &[
    "api", "endpoint", "database", "function", "component", "module", "class",
    "struct", "interface", "server", "client", "request", "response", "route",
    "handler", "middleware", "schema", "query", "mutation", "calculator",
    "parser", "compiler", "token", "service", "worker", "queue", "cache",
    "session", "auth", "token", "json", "yaml", "toml", "http", "https",
    "rest", "grpc", "websocket", "socket", "thread", "async", "await",
    "python", "rust", "javascript", "typescript", "golang", "java", "react",
    "vue", "angular", "django", "flask", "express", "tokio", "cargo", "crate",
    "test", "file", "directory", "config", "docker", "kubernetes", "git",
    "branch", "commit", "repository", "array", "list", "map", "vector",
    "string", "integer", "boolean", "float", "loop", "recursion", "algorithm",
    "sort", "search", "tree", "graph", "node", "edge", "multiply", "divide",
    "subtract", "add",
];

/// Explicit continuation tokens: if any appears in a request, the request
/// continues the active context regardless of keyword overlap.
pub const CONTINUATION_TOKENS: &[&str] = &[
    "continue", "next", "keep going", "proceed", "finish", "done?", "status",
    "progress",
];

/// Generic tokens that, alone, don't indicate continuation without either
/// extra overlap or an explicit task-continuation phrase.
pub const GENERIC_TOKENS: &[&str] = &[
    "create", "implement", "function", "next", "step", "simple", "basic",
];

/// Tokenise on non-alphabetic boundaries, lowercase, retain alphabetic
/// tokens of length >= 2, then keep those in the domain vocabulary or that
/// were capitalised in the source (likely proper nouns).
pub fn extract_keywords(text: &str) -> HashSet<String> {
    let mut keywords = HashSet::new();
    for raw in text.split(|c: char| !c.is_alphabetic()) {
        if raw.chars().count() < 2 {
            continue;
        }
        let lower = raw.to_lowercase();
        let capitalised = raw.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
        if DOMAIN_VOCABULARY.contains(&lower.as_str()) || capitalised {
            keywords.insert(lower);
        }
    }
    keywords
}

/// Whether `keyword` is a generic token (from [`GENERIC_TOKENS`]) rather
/// than a specific domain noun.
pub fn is_generic(keyword: &str) -> bool {
    GENERIC_TOKENS.contains(&keyword)
}
