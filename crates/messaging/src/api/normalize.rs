//! Wire-to-domain normalization for messages

use super::wire::MessageRecord;
use crate::models::{Attachment, Message};

/// Error for records that cannot form a valid message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("message {id} has neither content nor an attachment")]
pub struct EmptyMessageRecord {
    pub id: i64,
}

/// Convert a server record into a [`Message`]
///
/// Empty content counts as absent. An attachment requires both the stored
/// file path and the original file name.
pub fn normalize_message(record: MessageRecord) -> Result<Message, EmptyMessageRecord> {
    let content = record.content.filter(|c| !c.is_empty());

    let attachment = if record.has_attachment {
        match (record.file_path, record.file_name) {
            (Some(file_path), Some(file_name)) => Some(Attachment {
                file_name,
                file_size: record.file_size.unwrap_or(0),
                file_path,
                file_type: record.file_type,
            }),
            _ => None,
        }
    } else {
        None
    };

    if content.is_none() && attachment.is_none() {
        return Err(EmptyMessageRecord { id: record.id });
    }

    Ok(Message {
        id: record.id.into(),
        conversation_id: record.conversation_id.into(),
        sender_id: record.sender_id.into(),
        content,
        created_at: record.created_at,
        is_system_message: record.is_system_message,
        attachment,
    })
}

/// Normalize a batch, dropping (and logging) invalid records
pub(crate) fn normalize_messages(records: Vec<MessageRecord>) -> Vec<Message> {
    records
        .into_iter()
        .filter_map(|record| match normalize_message(record) {
            Ok(message) => Some(message),
            Err(e) => {
                log::warn!("Skipping message: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> MessageRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_message() {
        let message = normalize_message(record(json!({
            "id": 1, "conversation_id": 2, "sender_id": 3,
            "content": "hi", "created_at": "2024-03-01T10:00:00Z",
            "is_system_message": false, "has_attachment": false,
            "file_name": null, "file_path": null, "file_size": null, "file_type": null
        })))
        .unwrap();
        assert_eq!(message.content.as_deref(), Some("hi"));
        assert!(message.attachment.is_none());
        assert_eq!(message.sender_id.as_i64(), 3);
    }

    #[test]
    fn test_file_only_message() {
        let message = normalize_message(record(json!({
            "id": 1, "conversation_id": 2, "sender_id": 3,
            "content": null, "created_at": "2024-03-01T10:00:00Z",
            "has_attachment": true, "file_name": "cv.pdf",
            "file_path": "0f3a.pdf", "file_size": 2048, "file_type": "application/pdf"
        })))
        .unwrap();
        assert!(message.content.is_none());
        let attachment = message.attachment.unwrap();
        assert_eq!(attachment.file_name, "cv.pdf");
        assert_eq!(attachment.file_path, "0f3a.pdf");
        assert_eq!(attachment.file_size, 2048);
    }

    #[test]
    fn test_empty_message_rejected() {
        let err = normalize_message(record(json!({
            "id": 9, "conversation_id": 2, "sender_id": 3,
            "content": "", "created_at": "2024-03-01T10:00:00Z",
            "has_attachment": false
        })))
        .unwrap_err();
        assert_eq!(err, EmptyMessageRecord { id: 9 });
    }

    #[test]
    fn test_batch_skips_invalid() {
        let records = vec![
            record(json!({"id": 1, "conversation_id": 2, "sender_id": 3, "content": "a", "created_at": "2024-03-01T10:00:00Z"})),
            record(json!({"id": 2, "conversation_id": 2, "sender_id": 3, "created_at": "2024-03-01T10:00:01Z"})),
            record(json!({"id": 3, "conversation_id": 2, "sender_id": 3, "content": "c", "created_at": "2024-03-01T10:00:02Z"})),
        ];
        let ids: Vec<i64> = normalize_messages(records).iter().map(|m| m.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
