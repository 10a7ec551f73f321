use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Stored user document (collection `users`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    /// bcrypt hash
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leetcode_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codeforces_username: Option<String>,
    #[serde(default)]
    pub completed_problems: Vec<ObjectId>,
    /// One entry per "mark completed" toggle.
    #[serde(default)]
    pub activity_log: Vec<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,
}

impl User {
    pub fn has_completed(&self, problem_id: &ObjectId) -> bool {
        self.completed_problems.contains(problem_id)
    }
}

/// What clients get to see of a user.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub leetcode_username: Option<String>,
    pub codeforces_username: Option<String>,
    pub completed_problems: Vec<String>,
    pub created_at: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            leetcode_username: user.leetcode_username,
            codeforces_username: user.codeforces_username,
            completed_problems: user.completed_problems.iter().map(|id| id.to_hex()).collect(),
            created_at: user.created_at.map(super::to_iso),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_drops_password_and_hexes_ids() {
        let problem = ObjectId::new();
        let user = User {
            id: Some(ObjectId::new()),
            name: Some("Ada".into()),
            email: "ada@example.com".into(),
            password: "$2b$10$hash".into(),
            leetcode_username: Some("ada_lc".into()),
            codeforces_username: None,
            completed_problems: vec![problem],
            activity_log: vec![],
            created_at: None,
        };

        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["leetcodeUsername"], "ada_lc");
        assert_eq!(json["completedProblems"][0], problem.to_hex());
    }

    #[test]
    fn old_documents_without_progress_fields_still_load() {
        let doc = mongodb::bson::doc! {
            "_id": ObjectId::new(),
            "email": "old@example.com",
            "password": "hash",
        };
        let user: User = mongodb::bson::from_document(doc).unwrap();
        assert!(user.completed_problems.is_empty());
        assert!(user.activity_log.is_empty());
    }
}
