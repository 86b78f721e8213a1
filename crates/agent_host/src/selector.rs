//! Chooses model, tools and reasoning budget for a chat turn.
//!
//! Decision order (first match wins):
//! 1. extended reasoning on → reasoning model, maximum budget, no tools
//! 2. search on → grounded model, web search tool, prompt scoped to the wiki
//! 3. otherwise → reasoning model with the backend's default budget

use providers::BackendTool;
use shared::agent_api::RequestConfig;
use shared::settings::ModelCatalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPlan {
    pub model: String,
    pub tools: Vec<BackendTool>,
    pub reasoning_budget: Option<u32>,
    /// Clause appended to the outgoing prompt text
    pub prompt_suffix: Option<String>,
}

impl RequestPlan {
    pub fn apply_to_prompt(&self, prompt: &str) -> String {
        match &self.prompt_suffix {
            Some(suffix) => format!("{}{}", prompt, suffix),
            None => prompt.to_string(),
        }
    }

    pub fn uses_search(&self) -> bool {
        self.tools.contains(&BackendTool::WebSearch)
    }
}

pub fn select_plan(config: &RequestConfig, catalog: &ModelCatalog) -> RequestPlan {
    if config.extended_reasoning_enabled {
        return RequestPlan {
            model: catalog.reasoning_model.clone(),
            tools: Vec::new(),
            reasoning_budget: Some(catalog.max_reasoning_budget),
            prompt_suffix: None,
        };
    }

    if config.search_enabled {
        return RequestPlan {
            model: catalog.grounded_model.clone(),
            tools: vec![BackendTool::WebSearch],
            reasoning_budget: None,
            prompt_suffix: Some(format!(" site:{}", catalog.search_domain)),
        };
    }

    RequestPlan {
        model: catalog.reasoning_model.clone(),
        tools: Vec::new(),
        reasoning_budget: None,
        prompt_suffix: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::agent_api::TopicCategory;

    fn config(reasoning: bool, search: bool) -> RequestConfig {
        RequestConfig {
            search_enabled: search,
            extended_reasoning_enabled: reasoning,
            topic_category: TopicCategory::General,
        }
    }

    #[test]
    fn test_reasoning_suppresses_search() {
        let catalog = ModelCatalog::default();
        for search in [true, false] {
            let plan = select_plan(&config(true, search), &catalog);
            assert!(plan.tools.is_empty());
            assert_eq!(plan.model, "gemini-3-pro-preview");
            assert_eq!(plan.reasoning_budget, Some(32768));
            assert_eq!(plan.apply_to_prompt("whip"), "whip");
        }
    }

    #[test]
    fn test_search_uses_grounded_model_and_domain_clause() {
        let plan = select_plan(&config(false, true), &ModelCatalog::default());
        assert_eq!(plan.model, "gemini-2.5-flash");
        assert_eq!(plan.tools, vec![BackendTool::WebSearch]);
        assert!(plan.uses_search());
        assert_eq!(plan.reasoning_budget, None);
        assert_eq!(
            plan.apply_to_prompt("best slayer helm"),
            "best slayer helm site:oldschool.runescape.wiki"
        );
    }

    #[test]
    fn test_default_plan() {
        let plan = select_plan(&config(false, false), &ModelCatalog::default());
        assert_eq!(plan.model, "gemini-3-pro-preview");
        assert!(plan.tools.is_empty());
        assert_eq!(plan.reasoning_budget, None);
        assert_eq!(plan.prompt_suffix, None);
    }
}
