use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// Stored problem document (collection `problems`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    pub sheet: ObjectId,
    #[serde(default)]
    pub section: String,
    pub created_at: BsonDateTime,
}

/// Just enough of a problem to count progress.
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemRef {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub sheet: ObjectId,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProblemRequest {
    pub title: String,
    pub link: String,
    pub difficulty: Option<Difficulty>,
    pub tags: Option<Vec<String>>,
    pub section: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub link: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub sheet: String,
    pub section: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl From<Problem> for ProblemView {
    fn from(p: Problem) -> Self {
        ProblemView {
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: p.title,
            link: p.link,
            difficulty: p.difficulty,
            tags: p.tags,
            sheet: p.sheet.to_hex(),
            section: p.section,
            created_at: super::to_iso(p.created_at),
            is_completed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_defaults_to_medium_and_rejects_unknown() {
        let req: CreateProblemRequest = serde_json::from_value(serde_json::json!({
            "title": "Two Sum",
            "link": "https://leetcode.com/problems/two-sum/",
            "section": "Arrays"
        }))
        .unwrap();
        assert_eq!(req.difficulty.unwrap_or_default(), Difficulty::Medium);

        let bad = serde_json::from_value::<CreateProblemRequest>(serde_json::json!({
            "title": "x", "link": "y", "section": "z", "difficulty": "Insane"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn view_omits_completion_unless_set() {
        let problem = Problem {
            id: Some(ObjectId::new()),
            title: "Valid Anagram".into(),
            link: "https://leetcode.com/problems/valid-anagram/".into(),
            difficulty: Difficulty::Easy,
            tags: vec!["Arrays".into()],
            sheet: ObjectId::new(),
            section: "Arrays".into(),
            created_at: BsonDateTime::now(),
        };
        let mut view = ProblemView::from(problem);
        assert!(serde_json::to_value(&view).unwrap().get("isCompleted").is_none());

        view.is_completed = Some(true);
        assert_eq!(serde_json::to_value(&view).unwrap()["isCompleted"], true);
    }
}
