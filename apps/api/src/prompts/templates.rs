// All LLM prompt constants for the task orchestrators.
// Placeholders are `{name}` and are filled in one pass by `fill_template`.

pub const RESUME_ANALYSIS_SYSTEM: &str = "Expert ATS resume analyzer. \
    Score resumes on: Contact(10), Summary(15), Experience(30), Skills(15), Education(10), ATS(10), Impact(10). \
    Consider hot and outdated skills.";

pub const RESUME_ANALYSIS_PROMPT: &str = r#"{market_context}
{target_line}
Return JSON: {"score":0-100,"grade":"A-F","summary":"...","skills_found":[],"skills_hot":[],"skills_outdated":[],"gaps":[],"improvements":[{"priority":"high|medium|low","issue":"...","fix":"..."}],"certifications_recommended":[],"market_readiness":"high|medium|low","career_trajectory":"growing|stable|at_risk"}

Resume:
{resume_text}"#;

pub const RESUME_ENHANCE_SYSTEM: &str = "Expert resume writer. \
    Use action verbs, quantify achievements, add hot skills.";

pub const RESUME_ENHANCE_PROMPT: &str = r#"{market_context}
Enhance for: {focus}. Target: {target_role}
Return JSON: {"enhanced_resume":"markdown","changes_made":[{"section":"...","before":"...","after":"..."}],"score_before":0,"score_after":0,"market_readiness_before":"low","market_readiness_after":"high"}

Resume:
{resume_text}"#;

pub const RESUME_GENERATE_SYSTEM: &str = "Expert resume writer. \
    ATS-friendly, action verbs, quantified achievements, hot skills: AI/ML, Cloud, Data. \
    Respond with the resume in markdown only.";

pub const RESUME_GENERATE_PROMPT: &str = r#"{market_context}
Create markdown resume:
Name: {name} | {email} | {phone} | {location}
{links_line}Summary: {summary}
Experience: {experience}
Education: {education}
Skills: {skills}
Certifications: {certifications}
Projects: {projects}
Target: {target_role}"#;

pub const INTERVIEW_SYSTEM: &str = "Senior interviewer. \
    Test theory and practice. STAR for behavioral questions. Easy to hard progression.";

pub const INTERVIEW_QUESTIONS_PROMPT: &str = r#"Generate {count} interview questions for {role} in {domain}. Difficulty: {difficulty}.
Return JSON: [{"text":"...","type":"technical|behavioral","expected_points":[],"difficulty":"easy|medium|hard"}]"#;

pub const EVALUATION_SYSTEM: &str = "Fair interviewer. \
    Score: relevance, depth, examples, communication.";

pub const EVALUATION_PROMPT: &str = r#"Question: {question}
Expected: {expected_points}
Answer: {answer}
Return JSON: {"score":0-100,"grade":"A-F","feedback":"...","strengths":[],"improvements":[],"would_hire":true|false}"#;

pub const LEARNING_SYSTEM: &str = "Career mentor building focused, practical learning plans \
    from free and paid resources.";

pub const LEARNING_PROMPT: &str = r#"{market_context}
Learning plan for: {gaps}. Role: {role}
Return JSON: [{"skill":"...","priority":"high|medium|low","resources":[{"title":"...","type":"course|video|book|project","platform":"..."}]}]"#;

pub const QUIZ_SYSTEM: &str = "Educator. \
    Test understanding, use plausible wrong answers, include code if relevant.";

pub const QUIZ_PROMPT: &str = r#"Generate {count} multiple-choice questions for {skill} ({difficulty}).
Return JSON: [{"question":"...","options":["A) ...","B) ...","C) ...","D) ..."],"correct":"A","explanation":"..."}]"#;

pub const JOBS_SYSTEM: &str = "Career advisor matching candidates to realistic roles \
    using current labor-market demand.";

pub const JOBS_PROMPT: &str = r#"{market_context}
Suggest 5 jobs for: {role}{location_line}
Skills: {skills}. Match: {match_percent}%
Return JSON: [{"title":"...","match_percent":0-100,"skills_matched":[],"skills_to_learn":[],"salary_range":"...","growth_outlook":"strong|moderate|weak"}]"#;
