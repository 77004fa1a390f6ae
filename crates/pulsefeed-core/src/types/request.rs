//! Request and response records for the command stream
//!
//! Incoming records arrive as free-form JSON maps and are converted to a
//! typed [`Command`] at the decode boundary. Records that do not name a
//! known command, or that are missing a required field, convert to `None`
//! and are dropped by the caller without a response.

use serde::Serialize;
use serde_json::{Number, Value};

/// A decoded client command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a post, or update the body of an existing timestamp.
    Add {
        /// Correlation id echoed in the response
        id: Number,
        /// Post payload
        body: String,
        /// Post key
        timestamp: f64,
    },
    /// Remove the post with exactly this timestamp.
    Remove {
        /// Correlation id echoed in the response
        id: Number,
        /// Post key
        timestamp: f64,
    },
    /// Ask whether a live post with exactly this timestamp exists.
    Contains {
        /// Correlation id echoed in the response
        id: Number,
        /// Post key
        timestamp: f64,
    },
    /// Request a snapshot of the whole feed, most-recent-first.
    Feed {
        /// Correlation id echoed in the response
        id: Number,
    },
    /// Control record: shut the server down. Produces no response.
    Done,
}

impl Command {
    /// Convert a decoded JSON record into a typed command.
    ///
    /// Returns `None` for unknown commands and for known commands with
    /// missing or mistyped fields.
    pub fn from_value(record: &Value) -> Option<Self> {
        let command = record.get("command")?.as_str()?;
        if command == "DONE" {
            return Some(Command::Done);
        }
        let id = match record.get("id")? {
            Value::Number(id) => id.clone(),
            _ => return None,
        };
        match command {
            "ADD" => Some(Command::Add {
                id,
                body: record.get("body")?.as_str()?.to_owned(),
                timestamp: record.get("timestamp")?.as_f64()?,
            }),
            "REMOVE" => Some(Command::Remove {
                id,
                timestamp: record.get("timestamp")?.as_f64()?,
            }),
            "CONTAINS" => Some(Command::Contains {
                id,
                timestamp: record.get("timestamp")?.as_f64()?,
            }),
            "FEED" => Some(Command::Feed { id }),
            _ => None,
        }
    }
}

/// A single entry of a feed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    /// Post payload
    pub body: String,
    /// Post key
    pub timestamp: f64,
}

/// Response record, correlated to its command by `id`.
///
/// Exactly one of `success` and `feed` is present; the absent field is
/// omitted from the encoding rather than emitted as null.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// Correlation id echoed from the command
    pub id: Number,
    /// Operation outcome, for ADD / REMOVE / CONTAINS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Feed snapshot, for FEED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Vec<PostView>>,
}

impl Response {
    /// Build a `{id, success}` response.
    pub fn status(id: Number, success: bool) -> Self {
        Self {
            id,
            success: Some(success),
            feed: None,
        }
    }

    /// Build a `{id, feed}` response.
    pub fn snapshot(id: Number, feed: Vec<PostView>) -> Self {
        Self {
            id,
            success: None,
            feed: Some(feed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_every_command() {
        let add = json!({"command": "ADD", "id": 1, "body": "hello", "timestamp": 100.0});
        assert_eq!(
            Command::from_value(&add),
            Some(Command::Add {
                id: Number::from(1),
                body: "hello".to_owned(),
                timestamp: 100.0
            })
        );

        let remove = json!({"command": "REMOVE", "id": 2, "timestamp": 5.5});
        assert_eq!(
            Command::from_value(&remove),
            Some(Command::Remove {
                id: Number::from(2),
                timestamp: 5.5
            })
        );

        let contains = json!({"command": "CONTAINS", "id": 3, "timestamp": 5.5});
        assert_eq!(
            Command::from_value(&contains),
            Some(Command::Contains {
                id: Number::from(3),
                timestamp: 5.5
            })
        );

        let feed = json!({"command": "FEED", "id": 4});
        assert_eq!(
            Command::from_value(&feed),
            Some(Command::Feed {
                id: Number::from(4)
            })
        );

        let done = json!({"command": "DONE"});
        assert_eq!(Command::from_value(&done), Some(Command::Done));
    }

    #[test]
    fn done_needs_no_id() {
        let done = json!({"command": "DONE", "id": 99});
        assert_eq!(Command::from_value(&done), Some(Command::Done));
    }

    #[test]
    fn unknown_command_is_dropped() {
        let record = json!({"command": "XYZ", "id": 1});
        assert_eq!(Command::from_value(&record), None);
    }

    #[test]
    fn missing_or_mistyped_fields_are_dropped() {
        let no_body = json!({"command": "ADD", "id": 1, "timestamp": 1.0});
        assert_eq!(Command::from_value(&no_body), None);

        let no_id = json!({"command": "REMOVE", "timestamp": 1.0});
        assert_eq!(Command::from_value(&no_id), None);

        let bad_timestamp = json!({"command": "CONTAINS", "id": 1, "timestamp": "soon"});
        assert_eq!(Command::from_value(&bad_timestamp), None);

        let no_command = json!({"id": 1});
        assert_eq!(Command::from_value(&no_command), None);
    }

    #[test]
    fn status_response_omits_feed_field() {
        let encoded =
            serde_json::to_value(Response::status(Number::from(7), false)).unwrap();
        assert_eq!(encoded, json!({"id": 7, "success": false}));
    }

    #[test]
    fn snapshot_response_omits_success_field() {
        let posts = vec![PostView {
            body: "a".to_owned(),
            timestamp: 10.0,
        }];
        let encoded =
            serde_json::to_value(Response::snapshot(Number::from(8), posts)).unwrap();
        assert_eq!(
            encoded,
            json!({"id": 8, "feed": [{"body": "a", "timestamp": 10.0}]})
        );
    }
}
