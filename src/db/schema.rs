pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- per-collection id counters
CREATE TABLE IF NOT EXISTS id_counters (
    collection TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);

-- learner_config table
CREATE TABLE IF NOT EXISTS learner_config (
    learner_id TEXT PRIMARY KEY,
    config TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- articles table
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY,
    learner_id TEXT NOT NULL,
    title TEXT NOT NULL,
    summary TEXT NOT NULL,
    body TEXT NOT NULL,
    translation TEXT NOT NULL,
    grammar_points TEXT NOT NULL,
    sources TEXT NOT NULL,
    category TEXT NOT NULL,
    region TEXT NOT NULL,
    topic TEXT NOT NULL,
    level INTEGER NOT NULL,
    word_count INTEGER NOT NULL,
    new_word_count INTEGER NOT NULL,
    review_word_count INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_learner_created ON articles(learner_id, created_at DESC);

-- vocabulary table (one row per learner and word)
CREATE TABLE IF NOT EXISTS vocabulary (
    id INTEGER PRIMARY KEY,
    learner_id TEXT NOT NULL,
    key TEXT NOT NULL,
    simplified TEXT NOT NULL,
    traditional TEXT,
    pinyin TEXT NOT NULL,
    meaning TEXT NOT NULL,
    part_of_speech TEXT,
    level INTEGER,
    category TEXT,
    status TEXT NOT NULL,
    seen_count INTEGER NOT NULL DEFAULT 0,
    tested_count INTEGER NOT NULL DEFAULT 0,
    tested_correct_count INTEGER NOT NULL DEFAULT 0,
    correct_in_context_count INTEGER NOT NULL DEFAULT 0,
    streak INTEGER NOT NULL DEFAULT 0,
    consecutive_failures INTEGER NOT NULL DEFAULT 0,
    first_seen_article_id INTEGER,
    first_seen_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL,
    last_tested_at TEXT,
    next_review_at TEXT,
    UNIQUE(learner_id, key)
);

CREATE INDEX IF NOT EXISTS idx_vocabulary_learner_status ON vocabulary(learner_id, status, seen_count DESC);
CREATE INDEX IF NOT EXISTS idx_vocabulary_learner_review ON vocabulary(learner_id, next_review_at);

-- article_vocabulary join table
CREATE TABLE IF NOT EXISTS article_vocabulary (
    article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    vocabulary_id INTEGER NOT NULL REFERENCES vocabulary(id) ON DELETE CASCADE,
    learner_id TEXT NOT NULL,
    is_new INTEGER NOT NULL DEFAULT 0,
    is_review INTEGER NOT NULL DEFAULT 0,
    context_sentence TEXT,
    PRIMARY KEY(article_id, vocabulary_id)
);

-- quiz_questions table
CREATE TABLE IF NOT EXISTS quiz_questions (
    id INTEGER PRIMARY KEY,
    article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    learner_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    question TEXT NOT NULL,
    question_type TEXT NOT NULL,
    correct_answer TEXT NOT NULL,
    options TEXT NOT NULL,
    hint TEXT,
    vocabulary_id INTEGER REFERENCES vocabulary(id) ON DELETE SET NULL,
    answered_correctly INTEGER,
    answered_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_quiz_questions_article ON quiz_questions(article_id, position);

-- source_cache table (findings already used, per learner)
CREATE TABLE IF NOT EXISTS source_cache (
    id INTEGER PRIMARY KEY,
    learner_id TEXT NOT NULL,
    cache_key TEXT NOT NULL,
    article_id INTEGER REFERENCES articles(id) ON DELETE SET NULL,
    headline TEXT NOT NULL,
    source_name TEXT NOT NULL,
    url TEXT,
    finding TEXT NOT NULL,
    cached_at TEXT NOT NULL,
    UNIQUE(learner_id, cache_key)
);

CREATE INDEX IF NOT EXISTS idx_source_cache_learner ON source_cache(learner_id, cached_at DESC);
"#;
