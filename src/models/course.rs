use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::text::text_or_number;

/// One recommended course, keyed the way the recommendation engine writes it
/// (column names of the course catalogue).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Course {
    #[serde(rename = "Course Title")]
    pub title: String,
    #[serde(rename = "Keyword", default, deserialize_with = "text_or_number")]
    pub keyword: Option<String>,
    #[serde(rename = "What you will learn", default, deserialize_with = "text_or_number")]
    pub what_you_will_learn: Option<String>,
    #[serde(rename = "Instructor", default, deserialize_with = "text_or_number")]
    pub instructor: Option<String>,
    #[serde(rename = "Level", default, deserialize_with = "text_or_number")]
    pub level: Option<String>,
    #[serde(
        rename = "Duration to complete (Approx.)",
        alias = "Duration to complete",
        default,
        deserialize_with = "text_or_number"
    )]
    pub duration_hours: Option<String>,
    #[serde(rename = "Offered By", default, deserialize_with = "text_or_number")]
    pub offered_by: Option<String>,
    #[serde(rename = "Rating", default, deserialize_with = "text_or_number")]
    pub rating: Option<String>,
    #[serde(rename = "Number of Review", default, deserialize_with = "text_or_number")]
    pub review_count: Option<String>,
    #[serde(rename = "Schedule", default, deserialize_with = "text_or_number")]
    pub schedule: Option<String>,
    #[serde(rename = "Modules", default, deserialize_with = "text_or_number")]
    pub modules: Option<String>,
    #[serde(rename = "Course Url", default, deserialize_with = "text_or_number")]
    pub url: Option<String>,
}

impl Course {
    #[cfg(test)]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            keyword: None,
            what_you_will_learn: None,
            instructor: None,
            level: None,
            duration_hours: None,
            offered_by: None,
            rating: None,
            review_count: None,
            schedule: None,
            modules: None,
            url: None,
        }
    }
}

/// Document at `recommendations/<uid>`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RecommendationDocument {
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// `recommendations/<uid>` as stored. Rows are kept untyped so one malformed
/// row does not hide the rest of the list.
#[derive(Debug, Deserialize, Default)]
pub struct StoredRecommendations {
    #[serde(default)]
    courses: Option<Vec<Value>>,
}

/// A stored row that is not a course.
#[derive(Debug)]
pub struct RejectedRow {
    pub position: usize,
    pub error: serde_json::Error,
}

impl StoredRecommendations {
    /// Decodes every row on its own; good rows keep their stored order.
    pub fn decode(self) -> (RecommendationDocument, Vec<RejectedRow>) {
        let mut courses = Vec::new();
        let mut rejected = Vec::new();
        for (position, row) in self.courses.unwrap_or_default().into_iter().enumerate() {
            match serde_json::from_value::<Course>(row) {
                Ok(course) => courses.push(course),
                Err(error) => rejected.push(RejectedRow { position, error }),
            }
        }
        (RecommendationDocument { courses }, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_engine_output() {
        let raw = serde_json::json!({
            "courses": [{
                "Course Title": "Machine Learning",
                "Keyword": "Data Science",
                "What you will learn": "Regression, classification",
                "Instructor": "Andrew Ng",
                "Level": "Beginner level",
                "Duration to complete (Approx.)": 61.0,
                "Offered By": "Stanford",
                "Rating": 4.9,
                "Number of Review": 12345,
                "Schedule": "Flexible schedule",
                "Modules": "Week 1",
                "Course Url": "https://example.org/ml"
            }]
        });
        let stored: StoredRecommendations = serde_json::from_value(raw).unwrap();
        let (doc, rejected) = stored.decode();
        assert!(rejected.is_empty());
        let course = &doc.courses[0];
        assert_eq!(course.title, "Machine Learning");
        assert_eq!(course.duration_hours.as_deref(), Some("61.0"));
        assert_eq!(course.rating.as_deref(), Some("4.9"));
        assert_eq!(course.review_count.as_deref(), Some("12345"));
        assert_eq!(course.url.as_deref(), Some("https://example.org/ml"));
    }

    #[test]
    fn test_short_duration_key_is_accepted() {
        let raw = serde_json::json!({"Course Title": "A", "Duration to complete": "12"});
        let course: Course = serde_json::from_value(raw).unwrap();
        assert_eq!(course.duration_hours.as_deref(), Some("12"));
    }

    #[test]
    fn test_document_without_courses_is_empty() {
        for raw in [serde_json::json!({}), serde_json::json!({"courses": null})] {
            let stored: StoredRecommendations = serde_json::from_value(raw).unwrap();
            let (doc, rejected) = stored.decode();
            assert!(doc.courses.is_empty());
            assert!(rejected.is_empty());
        }
    }

    #[test]
    fn test_bad_rows_are_rejected_one_by_one() {
        let raw = serde_json::json!({
            "courses": [
                {"Course Title": "Good"},
                {"Course Title": null},
                {"Course Title": "Nested", "Rating": {"value": 4}},
                "not a row",
                {"Course Title": "Also good", "Rating": 4.2}
            ]
        });
        let stored: StoredRecommendations = serde_json::from_value(raw).unwrap();
        let (doc, rejected) = stored.decode();

        let titles: Vec<&str> = doc.courses.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Good", "Also good"]);
        let positions: Vec<usize> = rejected.iter().map(|r| r.position).collect();
        assert_eq!(positions, [1, 2, 3]);
    }
}
