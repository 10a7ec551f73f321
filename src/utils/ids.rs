use mongodb::bson::oid::ObjectId;

use super::error::AppError;

/// Parses a hex ObjectId from a path segment, naming the entity in the error.
pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::bad_request(format!("Invalid {} ID", what)))
}
