//! Resume analysis, enhancement, and generation.

use serde::{Deserialize, Serialize};

use crate::llm_client::extract::try_extract_json;
use crate::llm_client::ChatCompletion;
use crate::prompts::{PromptBuilder, TaskPrompt};
use crate::tasks::{complete_text, conform_record, run_record, FallbackReason, TaskOutcome};

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Improvement {
    pub priority: String,
    pub issue: String,
    pub fix: String,
}

impl Default for Improvement {
    fn default() -> Self {
        Self {
            priority: "medium".to_string(),
            issue: String::new(),
            fix: String::new(),
        }
    }
}

/// ATS-style resume score. `Default` is the fallback record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeAnalysis {
    pub score: u32,
    pub grade: String,
    pub summary: String,
    pub skills_found: Vec<String>,
    pub skills_hot: Vec<String>,
    pub skills_outdated: Vec<String>,
    pub gaps: Vec<String>,
    pub improvements: Vec<Improvement>,
    pub certifications_recommended: Vec<String>,
    pub market_readiness: String,
    pub career_trajectory: String,
}

impl Default for ResumeAnalysis {
    fn default() -> Self {
        Self {
            score: 50,
            grade: "C".to_string(),
            summary: "Parse error".to_string(),
            skills_found: vec![],
            skills_hot: vec![],
            skills_outdated: vec![],
            gaps: vec![],
            improvements: vec![],
            certifications_recommended: vec![],
            market_readiness: "medium".to_string(),
            career_trajectory: "stable".to_string(),
        }
    }
}

pub async fn analyze_resume(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    resume_text: &str,
    target_role: &str,
) -> TaskOutcome<ResumeAnalysis> {
    let task = TaskPrompt::ResumeAnalysis {
        resume_text,
        target_role,
    };
    run_record(llm, prompts, &task, ResumeAnalysis::default()).await
}

// ────────────────────────────────────────────────────────────────────────────
// Enhancement
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeChange {
    pub section: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeEnhancement {
    pub enhanced_resume: String,
    pub changes_made: Vec<ResumeChange>,
    pub score_before: u32,
    pub score_after: u32,
    pub market_readiness_before: String,
    pub market_readiness_after: String,
}

impl ResumeEnhancement {
    pub(crate) fn unchanged(text: &str) -> Self {
        Self {
            enhanced_resume: text.to_string(),
            ..Default::default()
        }
    }
}

/// Enhances a resume. A reply that is not JSON is taken as the enhanced resume
/// itself; a failed call hands back the submitted resume.
pub async fn enhance_resume(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    resume_text: &str,
    target_role: &str,
    focus_areas: &[String],
) -> TaskOutcome<ResumeEnhancement> {
    let task = TaskPrompt::ResumeEnhancement {
        resume_text,
        target_role,
        focus_areas,
    };
    let kind = task.kind();

    let text = match complete_text(llm, prompts, &task).await {
        Ok(text) => text,
        Err(_) => {
            return TaskOutcome::fallback(
                kind,
                ResumeEnhancement::unchanged(resume_text),
                FallbackReason::CompletionUnavailable,
            )
        }
    };

    let base = ResumeEnhancement::unchanged(resume_text);
    match try_extract_json(&text).and_then(|v| conform_record(v, &base)) {
        Some(enhancement) => TaskOutcome::Generated(enhancement),
        None => TaskOutcome::fallback(
            kind,
            ResumeEnhancement::unchanged(text.trim()),
            FallbackReason::ExtractionFailed,
        ),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceItem {
    pub title: String,
    pub company: String,
    pub duration: String,
    pub location: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationItem {
    pub degree: String,
    pub field: String,
    pub institution: String,
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectItem {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
}

/// Structured profile a resume is generated from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: Option<String>,
    pub portfolio: Option<String>,
    pub summary: Option<String>,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub tools: Vec<String>,
    pub languages: Vec<String>,
    pub certifications: Vec<String>,
    pub projects: Vec<ProjectItem>,
    pub achievements: Vec<String>,
    pub target_role: Option<String>,
}

/// Generates a markdown resume. A failed call renders one locally from the profile.
pub async fn generate_resume(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    profile: &ResumeProfile,
) -> TaskOutcome<String> {
    let task = TaskPrompt::ResumeGeneration { profile };

    match complete_text(llm, prompts, &task).await {
        Ok(text) => TaskOutcome::Generated(text.trim().to_string()),
        Err(_) => TaskOutcome::fallback(
            task.kind(),
            render_markdown(profile),
            FallbackReason::CompletionUnavailable,
        ),
    }
}

/// Plain markdown rendering of a profile. Empty sections are omitted.
pub fn render_markdown(profile: &ResumeProfile) -> String {
    let mut out = format!("# {}\n", non_empty_or(&profile.name, "Your Name"));

    let contact = [&profile.email, &profile.phone, &profile.location]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>();
    if !contact.is_empty() {
        out.push_str(&format!("{}\n", contact.join(" | ")));
    }

    let links = [&profile.linkedin, &profile.portfolio]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>();
    if !links.is_empty() {
        out.push_str(&format!("{}\n", links.join(" | ")));
    }

    if let Some(summary) = profile.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(&format!("\n## Summary\n{summary}\n"));
    }

    if !profile.experience.is_empty() {
        out.push_str("\n## Experience\n");
        for e in &profile.experience {
            out.push_str(&format!("### {} - {}\n", e.title, e.company));
            if !e.duration.is_empty() {
                out.push_str(&format!("*{}*\n", e.duration));
            }
            for h in &e.highlights {
                out.push_str(&format!("- {h}\n"));
            }
        }
    }

    if !profile.education.is_empty() {
        out.push_str("\n## Education\n");
        for e in &profile.education {
            let mut line = format!("- {}", e.degree);
            if !e.field.is_empty() {
                line.push_str(&format!(" in {}", e.field));
            }
            if !e.institution.is_empty() {
                line.push_str(&format!(", {}", e.institution));
            }
            if !e.year.is_empty() {
                line.push_str(&format!(" ({})", e.year));
            }
            out.push_str(&line);
            out.push('\n');
        }
    }

    let skill_groups = [
        ("Technical", &profile.technical_skills),
        ("Tools", &profile.tools),
        ("Soft skills", &profile.soft_skills),
        ("Languages", &profile.languages),
    ];
    if skill_groups.iter().any(|(_, items)| !items.is_empty()) {
        out.push_str("\n## Skills\n");
        for (label, items) in skill_groups.iter().filter(|(_, items)| !items.is_empty()) {
            out.push_str(&format!("**{label}:** {}\n", items.join(", ")));
        }
    }

    push_bullets(&mut out, "Certifications", &profile.certifications);

    if !profile.projects.is_empty() {
        out.push_str("\n## Projects\n");
        for p in &profile.projects {
            if p.description.is_empty() {
                out.push_str(&format!("- **{}**\n", p.name));
            } else {
                out.push_str(&format!("- **{}**: {}\n", p.name, p.description));
            }
        }
    }

    push_bullets(&mut out, "Achievements", &profile.achievements);
    out
}

fn push_bullets(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n## {heading}\n"));
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::{prompt_builder, ScriptedCompletion};

    #[tokio::test]
    async fn test_analysis_parses_fenced_reply() {
        let llm = ScriptedCompletion::replying(
            "Here you go:\n```json\n{\"score\": 82, \"grade\": \"B\", \"summary\": \"Solid\", \
             \"skills_found\": [\"Rust\"], \"improvements\": [{\"priority\": \"high\", \
             \"issue\": \"No metrics\", \"fix\": \"Quantify impact\"}]}\n```",
        );
        let outcome = analyze_resume(&llm, &prompt_builder(), "resume", "SRE").await;

        assert!(!outcome.is_fallback());
        let analysis = outcome.into_inner();
        assert_eq!(analysis.score, 82);
        assert_eq!(analysis.grade, "B");
        assert_eq!(analysis.skills_found, vec!["Rust"]);
        assert_eq!(analysis.improvements[0].fix, "Quantify impact");
        // Absent in the reply: filled from the fallback record.
        assert_eq!(analysis.market_readiness, "medium");
        assert_eq!(analysis.career_trajectory, "stable");
    }

    #[tokio::test]
    async fn test_analysis_completion_failure_returns_fallback() {
        let llm = ScriptedCompletion::failing();
        let outcome = analyze_resume(&llm, &prompt_builder(), "resume", "").await;

        assert_eq!(
            outcome.fallback_reason(),
            Some(FallbackReason::CompletionUnavailable)
        );
        let analysis = outcome.into_inner();
        assert_eq!(analysis.score, 50);
        assert_eq!(analysis.grade, "C");
        assert_eq!(analysis.summary, "Parse error");
        assert!(analysis.skills_found.is_empty());
    }

    #[tokio::test]
    async fn test_analysis_prose_reply_returns_fallback() {
        let llm = ScriptedCompletion::replying("I cannot score this resume.");
        let outcome = analyze_resume(&llm, &prompt_builder(), "resume", "").await;
        assert_eq!(outcome.fallback_reason(), Some(FallbackReason::ExtractionFailed));
        assert_eq!(outcome.value(), &ResumeAnalysis::default());
    }

    #[tokio::test]
    async fn test_analysis_request_uses_budget() {
        let llm = ScriptedCompletion::replying("{}");
        analyze_resume(&llm, &prompt_builder(), "resume", "").await;
        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, 1500);
    }

    #[tokio::test]
    async fn test_enhancement_json_reply() {
        let llm = ScriptedCompletion::replying(
            r##"{"enhanced_resume": "# Better", "changes_made": [{"section": "Summary", "before": "a", "after": "b"}], "score_before": 60, "score_after": 85}"##,
        );
        let outcome =
            enhance_resume(&llm, &prompt_builder(), "# Original", "", &[]).await;
        let enhancement = outcome.into_inner();
        assert_eq!(enhancement.enhanced_resume, "# Better");
        assert_eq!(enhancement.changes_made.len(), 1);
        assert_eq!(enhancement.score_after, 85);
    }

    #[tokio::test]
    async fn test_enhancement_prose_reply_becomes_resume() {
        let llm = ScriptedCompletion::replying("  # Jane Doe\nRewritten resume  ");
        let outcome =
            enhance_resume(&llm, &prompt_builder(), "# Original", "", &[]).await;
        assert_eq!(outcome.fallback_reason(), Some(FallbackReason::ExtractionFailed));
        let enhancement = outcome.into_inner();
        assert_eq!(enhancement.enhanced_resume, "# Jane Doe\nRewritten resume");
        assert!(enhancement.changes_made.is_empty());
    }

    #[tokio::test]
    async fn test_enhancement_failure_returns_original() {
        let llm = ScriptedCompletion::failing();
        let outcome =
            enhance_resume(&llm, &prompt_builder(), "# Original", "", &[]).await;
        assert_eq!(outcome.into_inner().enhanced_resume, "# Original");
    }

    #[tokio::test]
    async fn test_generation_failure_renders_locally() {
        let profile = ResumeProfile {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            experience: vec![ExperienceItem {
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                duration: "2021-2024".to_string(),
                highlights: vec!["Cut p99 latency by 40%".to_string()],
                ..Default::default()
            }],
            technical_skills: vec!["Rust".to_string(), "Go".to_string()],
            ..Default::default()
        };
        let llm = ScriptedCompletion::failing();
        let outcome = generate_resume(&llm, &prompt_builder(), &profile).await;

        assert!(outcome.is_fallback());
        let md = outcome.into_inner();
        assert!(md.starts_with("# Jane Doe\njane@example.com\n"));
        assert!(md.contains("### Engineer - Acme\n*2021-2024*\n- Cut p99 latency by 40%"));
        assert!(md.contains("**Technical:** Rust, Go"));
        assert!(!md.contains("## Education"));
    }

    #[tokio::test]
    async fn test_generation_returns_model_markdown() {
        let llm = ScriptedCompletion::replying("\n# Jane Doe\n\n## Experience\n");
        let outcome = generate_resume(&llm, &prompt_builder(), &ResumeProfile::default()).await;
        assert_eq!(
            outcome,
            TaskOutcome::Generated("# Jane Doe\n\n## Experience".to_string())
        );
    }

    #[test]
    fn test_render_markdown_empty_profile() {
        assert_eq!(render_markdown(&ResumeProfile::default()), "# Your Name\n");
    }

    #[test]
    fn test_profile_accepts_partial_json() {
        let profile: ResumeProfile = serde_json::from_str(
            r#"{"name": "A", "education": [{"degree": "BSc"}], "target_role": "SRE"}"#,
        )
        .unwrap();
        assert_eq!(profile.education[0].degree, "BSc");
        assert_eq!(profile.target_role.as_deref(), Some("SRE"));
        assert!(profile.experience.is_empty());
    }
}
