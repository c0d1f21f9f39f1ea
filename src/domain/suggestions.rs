use serde::Deserialize;

pub const INSTITUTION_SUGGESTIONS: &[&str] = &[
    "Harvard University",
    "Stanford University",
    "MIT",
    "University of Oxford",
    "Cambridge University",
    "Yale University",
    "Princeton University",
    "Columbia University",
    "University of California, Berkeley",
    "University of Toronto",
    "McGill University",
];

pub const DEGREE_SUGGESTIONS: &[&str] = &[
    "Bachelor of Science",
    "Bachelor of Arts",
    "Bachelor of Engineering",
    "Bachelor of Technology",
    "Master of Science",
    "Master of Arts",
    "Master of Business Administration",
    "Master of Engineering",
    "Doctor of Philosophy",
    "Bachelor of Commerce",
    "Bachelor of Computer Applications",
    "Master of Computer Applications",
    "Bachelor of Law",
    "Master of Law",
];

pub const FIELD_SUGGESTIONS: &[&str] = &[
    "Computer Science",
    "Engineering",
    "Business Administration",
    "Medicine",
    "Law",
    "Psychology",
    "Biology",
    "Chemistry",
    "Physics",
    "Mathematics",
    "Economics",
    "Marketing",
    "Finance",
    "Mechanical Engineering",
    "Civil Engineering",
    "Electrical Engineering",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    School,
    Degree,
    Field,
}

impl SuggestionKind {
    pub fn catalogue(&self) -> &'static [&'static str] {
        match self {
            SuggestionKind::School => INSTITUTION_SUGGESTIONS,
            SuggestionKind::Degree => DEGREE_SUGGESTIONS,
            SuggestionKind::Field => FIELD_SUGGESTIONS,
        }
    }
}

/// Catalogue entries containing `typed` (case-insensitive), excluding an exact
/// match. Nothing is offered until more than one character has been typed.
pub fn filter_suggestions(typed: &str, catalogue: &[&'static str]) -> Vec<&'static str> {
    if typed.chars().count() <= 1 {
        return Vec::new();
    }
    let needle = typed.to_lowercase();
    catalogue
        .iter()
        .copied()
        .filter(|s| {
            let candidate = s.to_lowercase();
            candidate.contains(&needle) && candidate != needle
        })
        .collect()
}
