//! Job recommendations, seeded with the skills-gap match against reference data.

use serde::{Deserialize, Serialize};

use crate::llm_client::ChatCompletion;
use crate::market::skills_gap_analysis;
use crate::prompts::{PromptBuilder, TaskPrompt};
use crate::tasks::{run_list, TaskOutcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRecommendation {
    pub title: String,
    pub match_percent: u32,
    pub skills_matched: Vec<String>,
    pub skills_to_learn: Vec<String>,
    #[serde(alias = "salary_range_usd")]
    pub salary_range: String,
    pub growth_outlook: String,
}

impl Default for JobRecommendation {
    fn default() -> Self {
        Self {
            title: String::new(),
            match_percent: 0,
            skills_matched: vec![],
            skills_to_learn: vec![],
            salary_range: String::new(),
            growth_outlook: "moderate".to_string(),
        }
    }
}

pub async fn recommend_jobs(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    skills: &[String],
    role: &str,
    location: &str,
) -> TaskOutcome<Vec<JobRecommendation>> {
    let gap = skills_gap_analysis(skills, role);
    let task = TaskPrompt::JobRecommendations {
        skills,
        role,
        location,
        match_percent: gap.match_percent,
    };

    run_list(llm, prompts, &task, vec![])
        .await
        .map(|jobs| {
            jobs.into_iter()
                .filter(|j: &JobRecommendation| !j.title.trim().is_empty())
                .collect()
        })
}
