use once_cell::sync::Lazy;
use regex::Regex;

use crate::entities::education::EducationLevel;

struct LevelRule {
    level: EducationLevel,
    patterns: Vec<Regex>,
}

fn rule(level: EducationLevel, patterns: &[&str]) -> LevelRule {
    LevelRule {
        level,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(p).expect("level pattern is valid"))
            .collect(),
    }
}

// Evaluated top to bottom, first match wins.
static LEVEL_RULES: Lazy<Vec<LevelRule>> = Lazy::new(|| {
    vec![
        rule(EducationLevel::PhD, &[r"\b(phd|doctor of philosophy|dphil)\b"]),
        rule(EducationLevel::MPhil, &[r"\bmphil\b"]),
        rule(
            EducationLevel::Master,
            &[
                r"\b(ms|msc|mtech|meng|mba|mca|llm|md|mpt|mph|med|ma|mcom|mfin|mf)\b",
                r"master",
            ],
        ),
        rule(
            EducationLevel::Bachelor,
            &[r"\b(be|btech|bsc|ba|beng|bcom|bba|bca|llb)\b", r"bachelor"],
        ),
        rule(
            EducationLevel::DiplomaCertificate,
            &[
                r"postgraduate diploma|pg diploma|graduate diploma",
                r"diploma|certificate|associate",
            ],
        ),
        rule(EducationLevel::HighSchool, &[r"high school|higher secondary|hsc"]),
        rule(EducationLevel::SecondarySchool, &[r"secondary"]),
        rule(EducationLevel::PrimarySchool, &[r"primary"]),
    ]
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Lower-cases, drops periods and collapses runs of whitespace: `"M.Sc.  CS"` → `"msc cs"`.
pub fn normalize_degree_text(degree: &str) -> String {
    let lowered = degree.to_lowercase().replace('.', "");
    WHITESPACE.replace_all(&lowered, " ").into_owned()
}

/// Maps free-text degree input onto the level taxonomy, if any rule matches.
pub fn suggest_level(degree: &str) -> Option<EducationLevel> {
    let text = normalize_degree_text(degree);
    if text.trim().is_empty() {
        return None;
    }

    LEVEL_RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| p.is_match(&text)))
        .map(|rule| rule.level.clone())
}

/// Whether a suggestion may replace the currently selected level.
/// Only an unset level or `Other` is ever replaced; a custom label is kept.
pub fn may_adopt(current: Option<&EducationLevel>) -> bool {
    matches!(current, None | Some(EducationLevel::Other))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_map_to_levels() {
        let cases = [
            ("Ph.D. in Physics", EducationLevel::PhD),
            ("DPhil", EducationLevel::PhD),
            ("MPhil Economics", EducationLevel::MPhil),
            ("M.Sc. Computer Science", EducationLevel::Master),
            ("MBA", EducationLevel::Master),
            ("Master of Arts", EducationLevel::Master),
            ("B.Tech", EducationLevel::Bachelor),
            ("Bachelor of Commerce", EducationLevel::Bachelor),
            ("LLB", EducationLevel::Bachelor),
            ("PG Diploma in Management", EducationLevel::DiplomaCertificate),
            ("Associate Degree", EducationLevel::DiplomaCertificate),
            ("Higher Secondary Certificate", EducationLevel::DiplomaCertificate),
            ("HSC", EducationLevel::HighSchool),
            ("Senior Secondary", EducationLevel::SecondarySchool),
            ("Primary education", EducationLevel::PrimarySchool),
        ];
        for (input, expected) in cases {
            assert_eq!(suggest_level(input), Some(expected), "input: {input}");
        }
    }

    #[test]
    fn priority_order_is_respected() {
        assert_eq!(suggest_level("MA then PhD"), Some(EducationLevel::PhD));
        assert_eq!(suggest_level("BSc and MSc"), Some(EducationLevel::Master));
        assert_eq!(suggest_level("MPhil (Master track)"), Some(EducationLevel::MPhil));
    }

    #[test]
    fn short_tokens_need_word_boundaries() {
        assert_eq!(suggest_level("Mathematics"), None);
        assert_eq!(suggest_level("Basket weaving"), None);
        assert_eq!(suggest_level(""), None);
        assert_eq!(suggest_level("   "), None);
    }

    #[test]
    fn normalization_strips_periods_and_spaces() {
        assert_eq!(normalize_degree_text("  M.Sc.   CS "), " msc cs ");
    }

    #[test]
    fn adopts_only_over_unset_or_other() {
        assert!(may_adopt(None));
        assert!(may_adopt(Some(&EducationLevel::Other)));
        assert!(!may_adopt(Some(&EducationLevel::Bachelor)));
        assert!(!may_adopt(Some(&EducationLevel::Custom("Apprenticeship".into()))));
    }
}
