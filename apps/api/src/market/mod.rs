//! Job-market reference data (2025-2030) and pure lookups over it.
//!
//! Static data only: nothing here performs I/O. `context` builds the cached
//! prompt snippet; `handlers` exposes the public market endpoints.

pub mod context;
pub mod handlers;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct GrowingRole {
    pub role: &'static str,
    pub growth: &'static str,
    pub demand: &'static str,
    pub salary_range: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecliningRole {
    pub role: &'static str,
    pub decline: &'static str,
    pub automation_risk: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillDemand {
    pub skill: &'static str,
    pub demand: &'static str,
    pub growth: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SoftSkill {
    pub skill: &'static str,
    pub importance: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndustryOutlook {
    #[serde(skip)]
    pub key: &'static str,
    pub outlook: &'static str,
    pub growth: &'static str,
    pub trends: &'static [&'static str],
    pub hot_areas: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct Certification {
    pub name: &'static str,
    pub field: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone)]
pub struct SalaryBand {
    pub level: &'static str,
    pub ranges: &'static [(&'static str, &'static str)],
}

pub const FASTEST_GROWING_GLOBAL: &[GrowingRole] = &[
    GrowingRole { role: "Big Data Specialist", growth: "60%+", demand: "very_high", salary_range: "90,000-180,000" },
    GrowingRole { role: "AI/ML Engineer", growth: "55%+", demand: "very_high", salary_range: "120,000-250,000" },
    GrowingRole { role: "FinTech Engineer", growth: "50%+", demand: "very_high", salary_range: "100,000-200,000" },
    GrowingRole { role: "Cybersecurity Specialist", growth: "35%+", demand: "very_high", salary_range: "95,000-175,000" },
    GrowingRole { role: "Cloud Architect", growth: "30%+", demand: "very_high", salary_range: "130,000-220,000" },
    GrowingRole { role: "Renewable Energy Engineer", growth: "30%+", demand: "high", salary_range: "80,000-140,000" },
    GrowingRole { role: "DevOps Engineer", growth: "25%+", demand: "very_high", salary_range: "100,000-180,000" },
    GrowingRole { role: "Full Stack Developer", growth: "22%+", demand: "high", salary_range: "90,000-160,000" },
    GrowingRole { role: "Healthcare Professional", growth: "20%+", demand: "very_high", salary_range: "60,000-150,000" },
    GrowingRole { role: "UX/UI Designer", growth: "18%+", demand: "high", salary_range: "75,000-140,000" },
];

/// Salary ranges in INR.
pub const FASTEST_GROWING_INDIA: &[GrowingRole] = &[
    GrowingRole { role: "AI/ML Specialist", growth: "65%+", demand: "very_high", salary_range: "15,00,000-50,00,000" },
    GrowingRole { role: "Big Data Engineer", growth: "60%+", demand: "very_high", salary_range: "12,00,000-40,00,000" },
    GrowingRole { role: "Cloud Architect", growth: "50%+", demand: "very_high", salary_range: "18,00,000-55,00,000" },
    GrowingRole { role: "Cybersecurity Analyst", growth: "45%+", demand: "very_high", salary_range: "10,00,000-35,00,000" },
    GrowingRole { role: "DevOps Engineer", growth: "40%+", demand: "very_high", salary_range: "12,00,000-38,00,000" },
    GrowingRole { role: "Digital Marketing Manager", growth: "35%+", demand: "high", salary_range: "8,00,000-25,00,000" },
    GrowingRole { role: "Full Stack Developer", growth: "30%+", demand: "high", salary_range: "8,00,000-30,00,000" },
    GrowingRole { role: "Renewable Energy Engineer", growth: "30%+", demand: "high", salary_range: "7,00,000-20,00,000" },
    GrowingRole { role: "UX/UI Designer", growth: "25%+", demand: "high", salary_range: "6,00,000-22,00,000" },
    GrowingRole { role: "Healthcare IT Specialist", growth: "25%+", demand: "high", salary_range: "8,00,000-25,00,000" },
];

pub const DECLINING_ROLES: &[DecliningRole] = &[
    DecliningRole { role: "Data Entry Clerk", decline: "-30%", automation_risk: "very_high" },
    DecliningRole { role: "Bank Teller", decline: "-25%", automation_risk: "very_high" },
    DecliningRole { role: "Postal Service Clerk", decline: "-20%", automation_risk: "high" },
    DecliningRole { role: "Cashier", decline: "-15%", automation_risk: "high" },
    DecliningRole { role: "Bookkeeping Clerk", decline: "-12%", automation_risk: "high" },
    DecliningRole { role: "Administrative Assistant", decline: "-10%", automation_risk: "medium" },
];

pub const TOP_SKILLS: &[SkillDemand] = &[
    SkillDemand { skill: "AI/Machine Learning", demand: "critical", growth: "65%" },
    SkillDemand { skill: "Data Analytics & Big Data", demand: "critical", growth: "58%" },
    SkillDemand { skill: "Cloud Computing (AWS/Azure/GCP)", demand: "critical", growth: "45%" },
    SkillDemand { skill: "Cybersecurity", demand: "critical", growth: "40%" },
    SkillDemand { skill: "Python", demand: "very_high", growth: "35%" },
    SkillDemand { skill: "DevOps & CI/CD", demand: "very_high", growth: "32%" },
    SkillDemand { skill: "JavaScript/TypeScript", demand: "very_high", growth: "25%" },
    SkillDemand { skill: "SQL & Database Management", demand: "high", growth: "20%" },
    SkillDemand { skill: "Kubernetes & Containerization", demand: "high", growth: "38%" },
    SkillDemand { skill: "API Development", demand: "high", growth: "22%" },
];

pub const TOP_SOFT_SKILLS: &[SoftSkill] = &[
    SoftSkill { skill: "Creative Thinking", importance: "critical" },
    SoftSkill { skill: "Analytical Thinking", importance: "critical" },
    SoftSkill { skill: "Resilience & Adaptability", importance: "very_high" },
    SoftSkill { skill: "Leadership & Mentoring", importance: "very_high" },
    SoftSkill { skill: "Communication", importance: "very_high" },
    SoftSkill { skill: "Problem Solving", importance: "high" },
    SoftSkill { skill: "Collaboration", importance: "high" },
    SoftSkill { skill: "Time Management", importance: "high" },
];

pub const INDUSTRIES: &[IndustryOutlook] = &[
    IndustryOutlook {
        key: "technology",
        outlook: "very_strong",
        growth: "17-18%",
        trends: &[
            "AI integration across all roles",
            "Skills-based hiring over degrees",
            "Remote/hybrid work standard",
            "Senior roles in high demand, junior market competitive",
        ],
        hot_areas: &["AI/ML", "Cloud", "Security", "DevOps"],
    },
    IndustryOutlook {
        key: "healthcare",
        outlook: "very_strong",
        growth: "15-20%",
        trends: &[
            "Persistent workforce shortages",
            "Telehealth expansion",
            "Mental health focus",
            "Tech-savvy talent preferred",
        ],
        hot_areas: &["Nursing", "Mental Health", "Health IT", "Telehealth"],
    },
    IndustryOutlook {
        key: "finance",
        outlook: "stable",
        growth: "8-12%",
        trends: &[
            "Compliance and risk management priority",
            "FinTech disruption",
            "Data-driven decision making",
            "AI in financial analysis",
        ],
        hot_areas: &["FinTech", "Risk Management", "Data Analytics", "Compliance"],
    },
    IndustryOutlook {
        key: "data_science",
        outlook: "very_strong",
        growth: "35%+",
        trends: &[
            "Cross-functional skills valued",
            "NLP and deep learning focus",
            "Cloud skills essential",
            "Business outcome orientation",
        ],
        hot_areas: &["ML Engineering", "NLP", "Computer Vision", "MLOps"],
    },
    IndustryOutlook {
        key: "marketing",
        outlook: "moderate",
        growth: "6-10%",
        trends: &[
            "ROI-focused hiring",
            "Digital/performance marketing priority",
            "Content + analytics combo",
            "Generalist roles declining",
        ],
        hot_areas: &["Performance Marketing", "SEO", "Marketing Analytics", "Content Strategy"],
    },
    IndustryOutlook {
        key: "renewable_energy",
        outlook: "strong",
        growth: "30%+",
        trends: &[
            "Green transition acceleration",
            "Government incentives",
            "Solar and wind expansion",
            "EV infrastructure growth",
        ],
        hot_areas: &["Solar Engineering", "Wind Energy", "EV Technology", "Sustainability"],
    },
];

pub const TOP_CERTIFICATIONS: &[Certification] = &[
    Certification { name: "AWS Solutions Architect", field: "Cloud", value: "very_high" },
    Certification { name: "Google Cloud Professional", field: "Cloud", value: "very_high" },
    Certification { name: "Azure Administrator", field: "Cloud", value: "high" },
    Certification { name: "CISSP", field: "Cybersecurity", value: "very_high" },
    Certification { name: "CEH (Certified Ethical Hacker)", field: "Cybersecurity", value: "high" },
    Certification { name: "PMP", field: "Project Management", value: "high" },
    Certification { name: "Scrum Master", field: "Agile", value: "high" },
    Certification { name: "TensorFlow Developer", field: "AI/ML", value: "high" },
    Certification { name: "Kubernetes Administrator (CKA)", field: "DevOps", value: "high" },
    Certification { name: "Data Engineering Professional", field: "Data", value: "high" },
];

/// USD salary benchmarks by experience level.
pub const SALARY_BANDS: &[SalaryBand] = &[
    SalaryBand {
        level: "entry_level",
        ranges: &[
            ("software_engineer", "70,000-95,000"),
            ("data_analyst", "55,000-75,000"),
            ("cybersecurity_analyst", "65,000-85,000"),
            ("devops_engineer", "75,000-100,000"),
            ("ml_engineer", "85,000-115,000"),
        ],
    },
    SalaryBand {
        level: "mid_level",
        ranges: &[
            ("software_engineer", "100,000-140,000"),
            ("data_scientist", "95,000-135,000"),
            ("cybersecurity_engineer", "100,000-140,000"),
            ("devops_engineer", "110,000-150,000"),
            ("ml_engineer", "130,000-180,000"),
        ],
    },
    SalaryBand {
        level: "senior",
        ranges: &[
            ("software_engineer", "150,000-220,000"),
            ("data_scientist", "140,000-200,000"),
            ("security_architect", "160,000-230,000"),
            ("cloud_architect", "170,000-250,000"),
            ("ml_architect", "180,000-280,000"),
        ],
    },
];

pub const KEY_INSIGHTS: &[&str] = &[
    "39-40% of core job skills will change by 2030",
    "AI will impact nearly every sector, creating new roles while automating others",
    "Skills-based hiring is replacing degree requirements at many companies",
    "Remote work remains standard for tech roles",
    "India's tech sector targeting $500B revenue by 2030",
    "Healthcare and green energy are recession-resistant growth areas",
    "Upskilling in AI/ML provides the highest career ROI",
];

/// Skills expected for common roles. Matched by substring of the target role.
const ROLE_SKILLS: &[(&str, &[&str])] = &[
    ("software engineer", &["python", "javascript", "sql", "git", "api development", "cloud computing"]),
    ("data scientist", &["python", "sql", "machine learning", "data analytics", "statistics", "tensorflow"]),
    ("ml engineer", &["python", "tensorflow", "pytorch", "mlops", "cloud computing", "docker"]),
    ("devops engineer", &["kubernetes", "docker", "ci/cd", "aws", "terraform", "linux"]),
    ("cybersecurity", &["security", "networking", "linux", "python", "compliance", "incident response"]),
    ("cloud architect", &["aws", "azure", "gcp", "kubernetes", "networking", "security"]),
    ("full stack", &["javascript", "react", "node.js", "python", "sql", "api development"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outlook {
    Growing,
    Declining,
    Stable,
}

impl Outlook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outlook::Growing => "growing",
            Outlook::Declining => "declining",
            Outlook::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleOutlook {
    pub role: String,
    pub outlook: Outlook,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_rate: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_risk: Option<&'static str>,
    pub recommendation: &'static str,
}

/// Outlook for a role: substring match against growing, then declining roles.
/// An empty role is always `stable`.
pub fn role_outlook(role: &str) -> RoleOutlook {
    let needle = role.trim().to_lowercase();

    if !needle.is_empty() {
        if let Some(job) = FASTEST_GROWING_GLOBAL
            .iter()
            .find(|j| j.role.to_lowercase().contains(&needle))
        {
            return RoleOutlook {
                role: job.role.to_string(),
                outlook: Outlook::Growing,
                growth_rate: Some(job.growth),
                demand: Some(job.demand),
                salary_range: Some(job.salary_range),
                decline_rate: None,
                automation_risk: None,
                recommendation: "Strong career choice with excellent growth prospects",
            };
        }

        if let Some(job) = DECLINING_ROLES
            .iter()
            .find(|j| j.role.to_lowercase().contains(&needle))
        {
            return RoleOutlook {
                role: job.role.to_string(),
                outlook: Outlook::Declining,
                growth_rate: None,
                demand: None,
                salary_range: None,
                decline_rate: Some(job.decline),
                automation_risk: Some(job.automation_risk),
                recommendation: "Consider upskilling to adjacent tech-enabled roles",
            };
        }
    }

    RoleOutlook {
        role: role.to_string(),
        outlook: Outlook::Stable,
        growth_rate: None,
        demand: None,
        salary_range: None,
        decline_rate: None,
        automation_risk: None,
        recommendation: "Research specific industry trends for this role",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillsGap {
    pub target_role: String,
    pub skills_matched: Vec<String>,
    pub skills_missing: Vec<String>,
    pub match_percent: u32,
    pub priority_skills: Vec<String>,
    pub market_demand_skills: Vec<&'static str>,
}

/// Compares current skills against the skill set expected for the target role.
/// Unknown roles are measured against the top global in-demand skills.
pub fn skills_gap_analysis<S: AsRef<str>>(current_skills: &[S], target_role: &str) -> SkillsGap {
    let current: Vec<String> = current_skills
        .iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .collect();
    let target = target_role.to_lowercase();

    let needed: Vec<String> = ROLE_SKILLS
        .iter()
        .find(|(key, _)| target.contains(key))
        .map(|(_, skills)| skills.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|| {
            TOP_SKILLS
                .iter()
                .take(6)
                .map(|s| s.skill.to_lowercase())
                .collect()
        });

    let (skills_matched, skills_missing): (Vec<String>, Vec<String>) =
        needed.iter().cloned().partition(|s| current.contains(s));

    let match_percent = if needed.is_empty() {
        0
    } else {
        (skills_matched.len() * 100 / needed.len()) as u32
    };

    SkillsGap {
        target_role: target_role.to_string(),
        priority_skills: skills_missing.iter().take(3).cloned().collect(),
        skills_matched,
        skills_missing,
        match_percent,
        market_demand_skills: TOP_SKILLS.iter().take(5).map(|s| s.skill).collect(),
    }
}

pub fn find_industry(name: &str) -> Option<&'static IndustryOutlook> {
    let key = normalize_key(name);
    INDUSTRIES.iter().find(|i| i.key == key)
}

pub fn find_salary_band(level: &str) -> Option<&'static SalaryBand> {
    let key = normalize_key(level);
    SALARY_BANDS.iter().find(|b| b.level == key)
}

/// Lowercases and maps `-` and spaces to `_`, e.g. "Data Science" -> "data_science".
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['-', ' '], "_")
}
