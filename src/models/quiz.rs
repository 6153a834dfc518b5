use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: QuizCategory,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub status: QuizStatus,
    #[serde(default)]
    pub visibility: QuizVisibility,
    #[serde(default = "default_passing_percentage")]
    pub passing_percentage: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_true")]
    pub allow_multiple_attempts: bool,
    #[serde(default)]
    pub randomize_questions: bool,
    #[serde(default)]
    pub randomize_options: bool,
    #[serde(default)]
    pub negative_marking: bool,
}

impl Quiz {
    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }
}

/// Browse filter: case-insensitive search over title and description, plus
/// an optional category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizFilter {
    pub search: String,
    pub category: Option<QuizCategory>,
}

impl QuizFilter {
    pub fn new(search: impl Into<String>, category: Option<QuizCategory>) -> Self {
        Self {
            search: search.into(),
            category,
        }
    }

    pub fn matches(&self, quiz: &Quiz) -> bool {
        let term = self.search.trim().to_lowercase();
        let text_match = term.is_empty()
            || quiz.title.to_lowercase().contains(&term)
            || quiz.description.to_lowercase().contains(&term);
        text_match && self.category.map_or(true, |category| quiz.category == category)
    }

    pub fn apply<'a>(&self, quizzes: &'a [Quiz]) -> Vec<&'a Quiz> {
        quizzes.iter().filter(|quiz| self.matches(quiz)).collect()
    }
}

fn default_time_limit() -> u32 {
    30
}

fn default_passing_percentage() -> u32 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizCategory {
    #[default]
    Java,
    Dsa,
    Aptitude,
    GeneralKnowledge,
    Science,
    Mathematics,
    History,
    Geography,
    Sports,
    Technology,
    Programming,
    Databases,
    WebDevelopment,
    MobileDevelopment,
    CloudComputing,
    ArtificialIntelligence,
    Cybersecurity,
    Other,
}

impl QuizCategory {
    pub const ALL: [QuizCategory; 18] = [
        QuizCategory::Java,
        QuizCategory::Dsa,
        QuizCategory::Aptitude,
        QuizCategory::GeneralKnowledge,
        QuizCategory::Science,
        QuizCategory::Mathematics,
        QuizCategory::History,
        QuizCategory::Geography,
        QuizCategory::Sports,
        QuizCategory::Technology,
        QuizCategory::Programming,
        QuizCategory::Databases,
        QuizCategory::WebDevelopment,
        QuizCategory::MobileDevelopment,
        QuizCategory::CloudComputing,
        QuizCategory::ArtificialIntelligence,
        QuizCategory::Cybersecurity,
        QuizCategory::Other,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            QuizCategory::Java => "Java",
            QuizCategory::Dsa => "Data Structures & Algorithms",
            QuizCategory::Aptitude => "Aptitude",
            QuizCategory::GeneralKnowledge => "General Knowledge",
            QuizCategory::Science => "Science",
            QuizCategory::Mathematics => "Mathematics",
            QuizCategory::History => "History",
            QuizCategory::Geography => "Geography",
            QuizCategory::Sports => "Sports",
            QuizCategory::Technology => "Technology",
            QuizCategory::Programming => "Programming",
            QuizCategory::Databases => "Databases",
            QuizCategory::WebDevelopment => "Web Development",
            QuizCategory::MobileDevelopment => "Mobile Development",
            QuizCategory::CloudComputing => "Cloud Computing",
            QuizCategory::ArtificialIntelligence => "Artificial Intelligence",
            QuizCategory::Cybersecurity => "Cybersecurity",
            QuizCategory::Other => "Other",
        }
    }
}

impl FromStr for QuizCategory {
    type Err = String;

    /// Accepts the wire name (`WEB_DEVELOPMENT`) or the display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        QuizCategory::ALL
            .iter()
            .copied()
            .find(|category| {
                category.display_name().eq_ignore_ascii_case(wanted)
                    || serde_json::to_value(category)
                        .ok()
                        .and_then(|v| v.as_str().map(|name| name.eq_ignore_ascii_case(wanted)))
                        .unwrap_or(false)
            })
            .ok_or_else(|| format!("'{}' is not a quiz category", wanted))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizVisibility {
    #[default]
    Public,
    Private,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(id: i64, title: &str, description: &str, category: QuizCategory) -> Quiz {
        let mut quiz: Quiz = serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "description": description
        }))
        .unwrap();
        quiz.category = category;
        quiz
    }

    fn catalog() -> Vec<Quiz> {
        vec![
            quiz(1, "Java Streams", "Collectors and lambdas", QuizCategory::Java),
            quiz(2, "SQL joins", "Inner, outer and cross JOIN", QuizCategory::Databases),
            quiz(3, "Rust traits", "Generics in practice", QuizCategory::Programming),
        ]
    }

    fn ids(quizzes: Vec<&Quiz>) -> Vec<i64> {
        quizzes.into_iter().map(|q| q.id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let quizzes = catalog();
        assert_eq!(ids(QuizFilter::default().apply(&quizzes)), vec![1, 2, 3]);
    }

    #[test]
    fn search_covers_title_and_description_case_insensitively() {
        let quizzes = catalog();
        assert_eq!(ids(QuizFilter::new("JOIN", None).apply(&quizzes)), vec![2]);
        assert_eq!(ids(QuizFilter::new("  generics ", None).apply(&quizzes)), vec![3]);
        assert!(QuizFilter::new("haskell", None).apply(&quizzes).is_empty());
    }

    #[test]
    fn category_narrows_search_results() {
        let quizzes = catalog();
        let filter = QuizFilter::new("", Some(QuizCategory::Java));
        assert_eq!(ids(filter.apply(&quizzes)), vec![1]);

        let filter = QuizFilter::new("sql", Some(QuizCategory::Programming));
        assert!(filter.apply(&quizzes).is_empty());
    }

    #[test]
    fn categories_parse_from_wire_or_display_name() {
        assert_eq!("WEB_DEVELOPMENT".parse(), Ok(QuizCategory::WebDevelopment));
        assert_eq!("data structures & algorithms".parse(), Ok(QuizCategory::Dsa));
        assert!("cooking".parse::<QuizCategory>().is_err());
    }
}
