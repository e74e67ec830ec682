//! Learning-plan generation for a set of skill gaps.

use serde::{Deserialize, Serialize};

use crate::llm_client::ChatCompletion;
use crate::prompts::{PromptBuilder, TaskPrompt};
use crate::tasks::{run_list, TaskOutcome};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningResource {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanItem {
    pub skill: String,
    pub priority: String,
    pub resources: Vec<LearningResource>,
}

impl Default for PlanItem {
    fn default() -> Self {
        Self {
            skill: String::new(),
            priority: "medium".to_string(),
            resources: vec![],
        }
    }
}

pub async fn generate_learning_plan(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    gaps: &[String],
    role: &str,
) -> TaskOutcome<Vec<PlanItem>> {
    let task = TaskPrompt::LearningPlan { gaps, role };
    run_list(llm, prompts, &task, vec![]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::{prompt_builder, ScriptedCompletion};
    use crate::tasks::FallbackReason;

    #[tokio::test]
    async fn test_plan_parsed_from_wrapped_reply() {
        let llm = ScriptedCompletion::replying(
            r#"Sure! {"plan": [{"skill": "Kubernetes", "priority": "high", "resources": [{"title": "CKA Course", "type": "course", "platform": "Udemy"}]}]}"#,
        );
        let gaps = vec!["Kubernetes".to_string()];
        let outcome = generate_learning_plan(&llm, &prompt_builder(), &gaps, "DevOps Engineer").await;

        let plan = outcome.into_inner();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].priority, "high");
        assert_eq!(plan[0].resources[0].kind, "course");
    }

    #[tokio::test]
    async fn test_plan_fallback_is_empty() {
        let llm = ScriptedCompletion::replying("no plan today");
        let outcome =
            generate_learning_plan(&llm, &prompt_builder(), &["Go".to_string()], "SWE").await;
        assert_eq!(outcome.fallback_reason(), Some(FallbackReason::ExtractionFailed));
        assert!(outcome.into_inner().is_empty());
    }

    #[test]
    fn test_resource_serializes_type() {
        let value = serde_json::to_value(LearningResource {
            title: "Book".to_string(),
            kind: "book".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(value["type"], "book");
        assert!(value.get("url").is_none());
    }
}
