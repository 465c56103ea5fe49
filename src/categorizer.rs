use crate::settings::RuleConfig;

pub const FALLBACK_NAME: &str = "Uncategorized";

/// Ordered categorization rules with the fallback resolved once at startup.
/// Immutable for the process lifetime; rule changes never re-categorize
/// rows written earlier.
#[derive(Debug, Clone)]
pub struct Ruleset {
    rules: Vec<RuleConfig>,
    fallback: String,
}

impl Ruleset {
    pub fn new(rules: Vec<RuleConfig>) -> Self {
        let fallback = rules
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(FALLBACK_NAME))
            .or_else(|| rules.last())
            .map(|r| r.name.clone())
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        Self { rules, fallback }
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// First keyword hit wins, in configured rule order then keyword order.
    /// Matching is case-insensitive substring, not word-boundary: "util"
    /// matches "utilities". Kept deliberately for compatibility.
    pub fn classify(&self, description: &str) -> &str {
        if description.trim().is_empty() {
            return &self.fallback;
        }
        let desc_upper = description.to_uppercase();
        for rule in &self.rules {
            for keyword in &rule.keywords {
                if keyword.trim().is_empty() {
                    continue;
                }
                if desc_upper.contains(&keyword.to_uppercase()) {
                    return &rule.name;
                }
            }
        }
        &self.fallback
    }
}
