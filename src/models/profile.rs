use serde::{Deserialize, Serialize};

use super::text::text_or_number;

/// Canonical shape of a `userData/<uid>` document.
///
/// Two forms write to the same document: the first-time setup form and the
/// later edit form. Each owns a disjoint subset of the fields and only ever
/// merge-writes that subset, so neither clobbers the other.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    // setup form
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "text_or_number")]
    pub career_goals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "text_or_number")]
    pub skills: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "text_or_number")]
    pub interests: Option<String>,

    // edit form
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "text_or_number")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "text_or_number")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "text_or_number")]
    pub job_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "text_or_number")]
    pub interested_courses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "text_or_number")]
    pub liked_courses: Option<String>,
}

impl ProfileRecord {
    /// Overlays every field set in `other` onto `self`.
    #[cfg(test)]
    pub fn merge(&mut self, other: ProfileRecord) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.career_goals, other.career_goals);
        take(&mut self.skills, other.skills);
        take(&mut self.interests, other.interests);
        take(&mut self.name, other.name);
        take(&mut self.age, other.age);
        take(&mut self.job_role, other.job_role);
        take(&mut self.interested_courses, other.interested_courses);
        take(&mut self.liked_courses, other.liked_courses);
    }
}

/// Fields of the first-time setup form. All three are required on submit.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SetupFields {
    #[serde(default)]
    pub career_goals: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub interests: String,
}

impl SetupFields {
    pub fn from_record(record: &ProfileRecord) -> Self {
        Self {
            career_goals: record.career_goals.clone().unwrap_or_default(),
            skills: record.skills.clone().unwrap_or_default(),
            interests: record.interests.clone().unwrap_or_default(),
        }
    }

    pub fn to_record(&self) -> ProfileRecord {
        ProfileRecord {
            career_goals: Some(self.career_goals.clone()),
            skills: Some(self.skills.clone()),
            interests: Some(self.interests.clone()),
            ..Default::default()
        }
    }

    /// Name of the first blank field, if any.
    pub fn first_missing(&self) -> Option<&'static str> {
        [
            ("career goals", &self.career_goals),
            ("skills", &self.skills),
            ("interests", &self.interests),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label)
    }
}

/// Fields of the later edit form. Everything is optional free text.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct EditFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub job_role: String,
    #[serde(default)]
    pub interested_courses: String,
    #[serde(default)]
    pub liked_courses: String,
}

impl EditFields {
    pub fn from_record(record: &ProfileRecord) -> Self {
        Self {
            name: record.name.clone().unwrap_or_default(),
            age: record.age.clone().unwrap_or_default(),
            job_role: record.job_role.clone().unwrap_or_default(),
            interested_courses: record.interested_courses.clone().unwrap_or_default(),
            liked_courses: record.liked_courses.clone().unwrap_or_default(),
        }
    }

    pub fn to_record(&self) -> ProfileRecord {
        ProfileRecord {
            name: Some(self.name.clone()),
            age: Some(self.age.clone()),
            job_role: Some(self.job_role.clone()),
            interested_courses: Some(self.interested_courses.clone()),
            liked_courses: Some(self.liked_courses.clone()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_record_only_carries_setup_keys() {
        let fields = SetupFields {
            career_goals: "Lead a team".to_string(),
            skills: "Rust".to_string(),
            interests: "Systems".to_string(),
        };
        let json = serde_json::to_value(fields.to_record()).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(json.get("careerGoals").is_some());
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_edit_record_writes_blank_fields() {
        let fields = EditFields {
            name: "Ada".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(fields.to_record()).unwrap();
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["jobRole"], "");
        assert!(json.get("skills").is_none());
    }

    #[test]
    fn test_both_shapes_coexist_in_one_document() {
        let raw = serde_json::json!({
            "careerGoals": "Data science",
            "skills": "Python",
            "interests": "AI",
            "name": "Ada",
            "age": 36,
        });
        let record: ProfileRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(SetupFields::from_record(&record).skills, "Python");
        assert_eq!(EditFields::from_record(&record).age, "36");
        assert_eq!(EditFields::from_record(&record).job_role, "");
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut record = SetupFields {
            career_goals: "a".into(),
            skills: "b".into(),
            interests: "c".into(),
        }
        .to_record();
        record.merge(EditFields { name: "Ada".into(), ..Default::default() }.to_record());
        assert_eq!(record.skills.as_deref(), Some("b"));
        assert_eq!(record.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_first_missing_reports_blank_field() {
        let fields = SetupFields {
            career_goals: "x".into(),
            skills: "   ".into(),
            interests: String::new(),
        };
        assert_eq!(fields.first_missing(), Some("skills"));

        let full = SetupFields {
            career_goals: "x".into(),
            skills: "y".into(),
            interests: "z".into(),
        };
        assert_eq!(full.first_missing(), None);
    }
}
