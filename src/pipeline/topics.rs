use crate::models::{LearnerConfig, Overrides, RecentArticle};

// Runs whose category and region are avoided for the next one.
pub const ROTATION_WINDOW: usize = 3;
// Runs whose titles are shown to the generator to steer away from.
pub const SIMILARITY_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPlan {
    pub category: String,
    pub region: String,
    pub topic_hint: Option<String>,
    pub avoid_titles: Vec<String>,
}

// Picks category and region for the next run. `recent` is newest first.
pub fn plan_topic(config: &LearnerConfig, overrides: &Overrides, recent: &[RecentArticle]) -> TopicPlan {
    let recent_categories: Vec<&str> = recent
        .iter()
        .take(ROTATION_WINDOW)
        .map(|a| a.category.as_str())
        .collect();
    let recent_regions: Vec<&str> = recent
        .iter()
        .take(ROTATION_WINDOW)
        .map(|a| a.region.as_str())
        .collect();

    let category = overrides
        .category
        .clone()
        .unwrap_or_else(|| rotate(&config.categories, &recent_categories, "general"));
    let region = overrides
        .region
        .clone()
        .unwrap_or_else(|| rotate(&config.regions, &recent_regions, "global"));

    TopicPlan {
        category,
        region,
        topic_hint: overrides.topic.clone(),
        avoid_titles: recent
            .iter()
            .take(SIMILARITY_WINDOW)
            .map(|a| a.title.clone())
            .collect(),
    }
}

// First option not used in the window, in configured order. When every
// option was used, the one used longest ago.
fn rotate(options: &[String], recently_used: &[&str], fallback: &str) -> String {
    let last_use = |option: &String| {
        recently_used
            .iter()
            .position(|used| used.eq_ignore_ascii_case(option))
    };

    if let Some(unused) = options.iter().find(|o| last_use(o).is_none()) {
        return unused.clone();
    }

    options
        .iter()
        .max_by_key(|o| last_use(o))
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearnerDefaults;
    use chrono::Utc;

    fn recent(category: &str, region: &str) -> RecentArticle {
        RecentArticle {
            id: 0,
            title: format!("{} in {}", category, region),
            category: category.to_string(),
            region: region.to_string(),
            created_at: Utc::now(),
        }
    }

    fn config(categories: &[&str], regions: &[&str]) -> LearnerConfig {
        let mut config = LearnerDefaults::default().to_learner_config();
        config.categories = categories.iter().map(|s| s.to_string()).collect();
        config.regions = regions.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn test_skips_recently_used() {
        let config = config(&["tech", "food", "sports"], &["taiwan", "europe"]);
        let history = vec![recent("tech", "taiwan")];
        let plan = plan_topic(&config, &Overrides::default(), &history);
        assert_eq!(plan.category, "food");
        assert_eq!(plan.region, "europe");
        assert_eq!(plan.avoid_titles, vec!["tech in taiwan".to_string()]);
    }

    #[test]
    fn test_only_last_three_runs_count() {
        let config = config(&["tech", "food", "sports", "travel"], &["global"]);
        let history = vec![
            recent("food", "global"),
            recent("sports", "global"),
            recent("travel", "global"),
            recent("tech", "global"),
        ];
        let plan = plan_topic(&config, &Overrides::default(), &history);
        assert_eq!(plan.category, "tech");
    }

    #[test]
    fn test_all_used_picks_oldest() {
        let config = config(&["tech", "food"], &["global"]);
        let history = vec![recent("food", "global"), recent("tech", "global")];
        let plan = plan_topic(&config, &Overrides::default(), &history);
        assert_eq!(plan.category, "tech");
        assert_eq!(plan.region, "global");
    }

    #[test]
    fn test_overrides_win() {
        let config = config(&["tech"], &["global"]);
        let overrides = Overrides {
            category: Some("tech".to_string()),
            region: Some("taiwan".to_string()),
            topic: Some("night markets".to_string()),
            level: None,
        };
        let plan = plan_topic(&config, &overrides, &[recent("tech", "taiwan")]);
        assert_eq!(plan.category, "tech");
        assert_eq!(plan.region, "taiwan");
        assert_eq!(plan.topic_hint.as_deref(), Some("night markets"));
    }

    #[test]
    fn test_similarity_window_caps_titles() {
        let config = config(&["tech"], &["global"]);
        let history: Vec<_> = (0..15).map(|_| recent("tech", "global")).collect();
        let plan = plan_topic(&config, &Overrides::default(), &history);
        assert_eq!(plan.avoid_titles.len(), SIMILARITY_WINDOW);
    }
}
