use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::ProblemView;

fn default_public() -> bool {
    true
}

/// Stored sheet document (collection `sheets`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_by: ObjectId,
    #[serde(default = "default_public")]
    pub is_public: bool,
    /// Section names in display order.
    #[serde(default)]
    pub sections: Vec<String>,
    pub created_at: BsonDateTime,
}

impl Sheet {
    pub fn is_owned_by(&self, user_id: &ObjectId) -> bool {
        &self.created_by == user_id
    }

    pub fn is_visible_to(&self, user_id: &ObjectId) -> bool {
        self.is_public || self.is_owned_by(user_id)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSheetRequest {
    pub title: String,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub sections: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSheetRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
    pub is_public: bool,
    pub sections: Vec<String>,
    pub created_at: String,
}

impl From<Sheet> for SheetView {
    fn from(sheet: Sheet) -> Self {
        SheetView {
            id: sheet.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: sheet.title,
            description: sheet.description,
            created_by: sheet.created_by.to_hex(),
            is_public: sheet.is_public,
            sections: sheet.sections,
            created_at: super::to_iso(sheet.created_at),
        }
    }
}

/// Row of the sheet listing.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    #[serde(flatten)]
    pub sheet: SheetView,
    pub questions: u64,
    pub progress: u32,
    pub followers: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SectionView {
    pub name: String,
    pub total: u64,
    pub completed: u64,
    pub problems: Vec<ProblemView>,
}

/// Sheet with its problems grouped by section. `sections` here carries the
/// grouped view rather than the bare names.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetDetail {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
    pub is_public: bool,
    pub created_at: String,
    pub questions: u64,
    pub sections: Vec<SectionView>,
}

impl SheetDetail {
    pub fn new(sheet: SheetView, sections: Vec<SectionView>) -> Self {
        SheetDetail {
            id: sheet.id,
            title: sheet.title,
            description: sheet.description,
            created_by: sheet.created_by,
            is_public: sheet.is_public,
            created_at: sheet.created_at,
            questions: sections.iter().map(|s| s.total).sum(),
            sections,
        }
    }
}
