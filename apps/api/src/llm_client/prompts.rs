// Shared prompt fragments and prompt-building utilities.
// Task-specific templates live in `crate::prompts::templates`.

/// Appended to every system instruction that expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with valid JSON only. \
    Do NOT include any text outside the JSON. \
    Do NOT include explanations or apologies.";

/// Hard character cutoff that bounds prompt size. Not sentence-aware: the tail is
/// dropped mid-word if the budget ends there.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Joins at most `limit` items with `", "`.
pub fn join_limited<S: AsRef<str>>(items: &[S], limit: usize) -> String {
    items
        .iter()
        .take(limit)
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fills `{key}` placeholders in one pass over the template. Substituted text is not
/// scanned again, and braces that do not name a known key are kept as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let filled = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });
        match filled {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_within_budget_is_identity() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_is_hard_cutoff() {
        assert_eq!(truncate_chars("Led the team. Shipped it.", 10), "Led the te");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn test_join_limited() {
        let skills = ["rust", "go", "python"];
        assert_eq!(join_limited(&skills, 2), "rust, go");
        assert_eq!(join_limited::<&str>(&[], 3), "");
    }

    #[test]
    fn test_fill_template_single_pass() {
        let filled = fill_template(
            "Name: {name} | Target: {target_role}",
            &[("name", "{target_role}"), ("target_role", "Data Engineer")],
        );
        assert_eq!(filled, "Name: {target_role} | Target: Data Engineer");
    }

    #[test]
    fn test_fill_template_keeps_unknown_braces() {
        let filled = fill_template(r#"Reply {"score": 0} for {skill} {x"#, &[("skill", "SQL")]);
        assert_eq!(filled, r#"Reply {"score": 0} for SQL {x"#);
    }
}
