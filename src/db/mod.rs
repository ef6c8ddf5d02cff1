mod repository;
mod schema;

pub use repository::Repository;

// Id counter collections.
pub const ARTICLES: &str = "articles";
pub const VOCABULARY: &str = "vocabulary";
pub const QUIZ_QUESTIONS: &str = "quiz_questions";
pub const SOURCE_CACHE: &str = "source_cache";
