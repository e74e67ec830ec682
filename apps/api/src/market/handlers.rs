//! Public job-market endpoints. No auth: the data is static reference material.

use axum::{
    extract::{Path, Query},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::market::{
    find_industry, find_salary_band, normalize_key, role_outlook, skills_gap_analysis,
    RoleOutlook, SkillsGap, DECLINING_ROLES, FASTEST_GROWING_GLOBAL, FASTEST_GROWING_INDIA,
    INDUSTRIES, KEY_INSIGHTS, TOP_CERTIFICATIONS, TOP_SKILLS, TOP_SOFT_SKILLS,
};

const DEFAULT_SALARY_LEVEL: &str = "mid_level";

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegionQuery {
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Deserialize)]
pub struct LevelQuery {
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SkillGapRequest {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub role: String,
}

/// GET /jobs/market/summary
///
/// With a known `field`, returns that industry's outlook; otherwise a cross-industry overview.
pub async fn handle_market_summary(Query(params): Query<SummaryQuery>) -> Json<Value> {
    Json(market_summary(params.field.as_deref()))
}

pub fn market_summary(field: Option<&str>) -> Value {
    let top_skills: Vec<_> = TOP_SKILLS.iter().take(5).collect();

    if let Some(industry) = field.and_then(find_industry) {
        return json!({
            "field": industry.key,
            "outlook": industry,
            "top_skills": top_skills,
            "key_insights": &KEY_INSIGHTS[..3],
        });
    }

    let industry_outlook: Map<String, Value> = INDUSTRIES
        .iter()
        .map(|i| (i.key.to_string(), Value::from(i.outlook)))
        .collect();

    json!({
        "fastest_growing": &FASTEST_GROWING_GLOBAL[..5],
        "top_skills": top_skills,
        "industry_outlook": industry_outlook,
        "key_insights": KEY_INSIGHTS,
    })
}

/// GET /jobs/market/fastest-growing
pub async fn handle_fastest_growing(Query(params): Query<RegionQuery>) -> Json<Value> {
    if params.region.eq_ignore_ascii_case("india") {
        return Json(json!({
            "region": "India",
            "jobs": FASTEST_GROWING_INDIA,
            "source": "WEF Future of Jobs Report 2025, India Employment Forum",
        }));
    }
    Json(json!({
        "region": "Global",
        "jobs": FASTEST_GROWING_GLOBAL,
        "source": "WEF Future of Jobs Report 2025, BLS",
    }))
}

/// GET /jobs/market/declining
pub async fn handle_declining() -> Json<Value> {
    Json(json!({
        "warning": "These roles face high automation risk by 2030",
        "jobs": DECLINING_ROLES,
        "recommendation": "Consider upskilling to tech-adjacent roles",
    }))
}

/// GET /jobs/market/skills
pub async fn handle_in_demand_skills() -> Json<Value> {
    Json(json!({
        "technical_skills": TOP_SKILLS,
        "soft_skills": TOP_SOFT_SKILLS,
        "certifications": TOP_CERTIFICATIONS,
        "key_insight": KEY_INSIGHTS[0],
    }))
}

/// GET /jobs/market/salaries
///
/// Unknown levels fall back to mid-level.
pub async fn handle_salaries(Query(params): Query<LevelQuery>) -> Json<Value> {
    let band = params
        .level
        .as_deref()
        .and_then(find_salary_band)
        .or_else(|| find_salary_band(DEFAULT_SALARY_LEVEL));

    let (level, ranges) = match band {
        Some(b) => (
            b.level,
            b.ranges
                .iter()
                .map(|(role, range)| (role.to_string(), Value::from(*range)))
                .collect::<Map<_, _>>(),
        ),
        None => (DEFAULT_SALARY_LEVEL, Map::new()),
    };

    Json(json!({
        "level": level,
        "salaries_usd": ranges,
        "note": "Salaries vary by location, company size, and specific skills",
    }))
}

/// GET /jobs/market/industry/:industry
pub async fn handle_industry(Path(industry): Path<String>) -> Json<Value> {
    match find_industry(&industry) {
        Some(found) => {
            let mut body = json!({ "industry": found.key });
            if let (Value::Object(map), Ok(Value::Object(fields))) =
                (&mut body, serde_json::to_value(found))
            {
                map.extend(fields);
            }
            Json(body)
        }
        None => Json(json!({
            "error": format!("Industry '{}' not found", normalize_key(&industry)),
            "available": INDUSTRIES.iter().map(|i| i.key).collect::<Vec<_>>(),
        })),
    }
}

/// GET /jobs/market/role/:role
pub async fn handle_role_outlook(Path(role): Path<String>) -> Json<RoleOutlook> {
    Json(role_outlook(&role))
}

/// POST /jobs/market/skill-gap
pub async fn handle_skill_gap(Json(req): Json<SkillGapRequest>) -> Json<SkillsGap> {
    Json(skills_gap_analysis(&req.skills, &req.role))
}
