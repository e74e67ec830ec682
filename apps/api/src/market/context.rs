//! Market context: the reference-data snippet spliced into prompts.
//!
//! Cached per process, keyed by the lowercased role truncated to 20 characters.
//! Keys are bounded by the distinct role strings seen, so the cache is never evicted.
//! Rendering is deterministic, so two requests racing on a miss store the same value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::market::{role_outlook, DECLINING_ROLES, TOP_CERTIFICATIONS, TOP_SKILLS};

const CACHE_KEY_CHARS: usize = 20;

#[derive(Debug, Default)]
pub struct MarketContext {
    cache: Mutex<HashMap<String, Arc<str>>>,
}

impl MarketContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the market-context block for a target role, rendering it on first use.
    pub fn context_for(&self, target_role: &str) -> Arc<str> {
        let key = cache_key(target_role);

        if let Some(hit) = self.lock().get(&key) {
            return Arc::clone(hit);
        }

        let rendered: Arc<str> = render_context(target_role).into();
        Arc::clone(self.lock().entry(key).or_insert(rendered))
    }

    pub fn cached_entries(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<str>>> {
        // Entries are immutable once inserted; a poisoned map is still consistent.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn cache_key(target_role: &str) -> String {
    target_role
        .to_lowercase()
        .chars()
        .take(CACHE_KEY_CHARS)
        .collect()
}

fn render_context(target_role: &str) -> String {
    let hot_skills = TOP_SKILLS
        .iter()
        .take(5)
        .map(|s| s.skill)
        .collect::<Vec<_>>()
        .join(", ");
    let certs = TOP_CERTIFICATIONS
        .iter()
        .take(4)
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ");
    let declining = DECLINING_ROLES
        .iter()
        .take(3)
        .map(|r| r.role)
        .collect::<Vec<_>>()
        .join(", ");
    let outlook = role_outlook(target_role).outlook;

    format!(
        "MARKET DATA (2025-2030):\n\
         - Hot Skills: {hot_skills}\n\
         - Top Certs: {certs}\n\
         - Declining: {declining}\n\
         - Role: {}\n",
        outlook.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_lists_reference_data() {
        let ctx = MarketContext::new().context_for("Cloud Architect");
        assert!(ctx.starts_with("MARKET DATA (2025-2030):"));
        assert!(ctx.contains("- Hot Skills: AI/Machine Learning, Data Analytics & Big Data"));
        assert!(ctx.contains("- Top Certs: AWS Solutions Architect"));
        assert!(ctx.contains("- Declining: Data Entry Clerk, Bank Teller, Postal Service Clerk"));
        assert!(ctx.contains("- Role: growing"));
    }

    #[test]
    fn test_repeat_lookup_is_a_cache_hit() {
        let market = MarketContext::new();
        let first = market.context_for("DevOps Engineer");
        let second = market.context_for("DevOps Engineer");
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(market.cached_entries(), 1);
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let market = MarketContext::new();
        let a = market.context_for("Bank Teller");
        let b = market.context_for("BANK TELLER");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.contains("- Role: declining"));
    }

    #[test]
    fn test_key_truncated_to_twenty_chars() {
        assert_eq!(cache_key("Senior Platform Engineer II"), "senior platform engi");

        // Roles sharing the first 20 characters share one entry.
        let market = MarketContext::new();
        let a = market.context_for("Senior Platform Engineer I");
        let b = market.context_for("Senior Platform Engineer II");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(market.cached_entries(), 1);
    }

    #[test]
    fn test_empty_role_is_stable() {
        let ctx = MarketContext::new().context_for("");
        assert!(ctx.contains("- Role: stable"));
    }
}
