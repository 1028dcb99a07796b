use ascend_core::{AppError, AppResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Document;

/// Decodes one document into a typed entity, injecting the document id.
pub fn decode_document<T: DeserializeOwned>(document: Document) -> AppResult<T> {
    let Document { id, mut data } = document;
    if let Value::Object(map) = &mut data {
        map.insert("id".to_owned(), Value::String(id));
    }

    serde_json::from_value(data)
        .map_err(|error| AppError::Internal(format!("document decode failed: {error}")))
}

/// Decodes a snapshot, skipping documents that fail to parse.
///
/// Backend collections accumulate malformed records over time; a bad document
/// must not take down the whole subscription, so it is logged and dropped.
#[must_use]
pub fn decode_snapshot<T: DeserializeOwned>(documents: Vec<Document>) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document.id.clone();
            match decode_document(document) {
                Ok(entity) => Some(entity),
                Err(error) => {
                    tracing::warn!(%id, %error, "skipping malformed document");
                    None
                }
            }
        })
        .collect()
}

/// Encodes a typed entity into a document payload, stripping the id field.
///
/// The id travels separately as the document key; repeating it inside the
/// payload would let the two drift apart.
pub fn encode_entity<T: Serialize>(entity: &T) -> AppResult<Value> {
    let mut value = serde_json::to_value(entity)
        .map_err(|error| AppError::Internal(format!("entity encode failed: {error}")))?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }

    Ok(value)
}
