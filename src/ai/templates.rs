use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    TopicDiscovery,
    Passage,
    Quiz,
}

impl Template {
    fn file_name(&self) -> &'static str {
        match self {
            Template::TopicDiscovery => "topic.md",
            Template::Passage => "passage.md",
            Template::Quiz => "quiz.md",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            Template::TopicDiscovery => include_str!("../../prompts/topic.md"),
            Template::Passage => include_str!("../../prompts/passage.md"),
            Template::Quiz => include_str!("../../prompts/quiz.md"),
        }
    }
}

// Prompt text, read at most once per template and then served from memory.
// Files in `dir` override the prompts compiled into the binary.
pub struct Templates {
    dir: Option<PathBuf>,
    cache: Mutex<HashMap<Template, Arc<str>>>,
}

impl Templates {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, template: Template) -> Result<Arc<str>> {
        let mut cache = self.cache.lock().await;
        if let Some(text) = cache.get(&template) {
            return Ok(Arc::clone(text));
        }

        let text: Arc<str> = match &self.dir {
            Some(dir) => {
                let path = dir.join(template.file_name());
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => {
                        tracing::debug!("Loaded prompt override {:?}", path);
                        text.into()
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => template.builtin().into(),
                    Err(e) => return Err(e.into()),
                }
            }
            None => template.builtin().into(),
        };

        cache.insert(template, Arc::clone(&text));
        Ok(text)
    }

    pub async fn render(&self, template: Template, vars: &[(&str, String)]) -> Result<String> {
        let text = self.get(template).await?;
        Ok(fill(&text, vars))
    }
}

// Substitutes `${name}` placeholders. Unknown placeholders are left as-is.
pub fn fill(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("${{{}}}", name), value)
    })
}
