//! Builds `_bulk` payloads for the mirror store.
//!
//! Each notification becomes two newline-terminated JSON records: an `update`
//! action addressed by `<unix timestamp>_<host>`, followed by the document with
//! `doc_as_upsert` set. Mirrors from the same host within the same second land
//! on the same document id and merge instead of duplicating.

use crate::core::NotificationRequest;
use chrono::{DateTime, SecondsFormat, TimeZone};
use serde::Serialize;

pub const MIRROR_INDEX: &str = "prowl";
pub const MIRROR_TYPE: &str = "events";

#[derive(Serialize)]
struct BulkAction<'a> {
    update: BulkTarget<'a>,
}

#[derive(Serialize)]
struct BulkTarget<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
    #[serde(rename = "_type")]
    doc_type: &'static str,
    #[serde(rename = "_index")]
    index: &'static str,
}

#[derive(Serialize)]
struct BulkUpdate<'a> {
    doc: MirrorRecord<'a>,
    doc_as_upsert: bool,
}

/// The document stored for each delivered notification.
#[derive(Debug, Serialize, PartialEq)]
pub struct MirrorRecord<'a> {
    pub application: &'a str,
    pub event: &'a str,
    pub description: &'a str,
    pub value: u8,
    /// Unix timestamp in seconds, as a string.
    pub timestamp: String,
    /// RFC 3339 timestamp.
    pub timestamp2: String,
}

impl<'a> MirrorRecord<'a> {
    pub fn new<Tz: TimeZone>(request: &'a NotificationRequest, moment: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            application: &request.app_name,
            event: &request.event,
            description: &request.description,
            value: 1,
            timestamp: moment.timestamp().to_string(),
            timestamp2: moment.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Returns the upsert id for a record mirrored by `host` at `moment`.
pub fn document_id<Tz: TimeZone>(host: &str, moment: &DateTime<Tz>) -> String {
    format!("{}_{}", moment.timestamp(), host)
}

/// Encodes the two-line bulk payload for one notification.
pub fn encode_bulk_payload<Tz: TimeZone>(
    host: &str,
    request: &NotificationRequest,
    moment: &DateTime<Tz>,
) -> Result<String, serde_json::Error>
where
    Tz::Offset: std::fmt::Display,
{
    let id = document_id(host, moment);
    let action = BulkAction {
        update: BulkTarget {
            id: &id,
            doc_type: MIRROR_TYPE,
            index: MIRROR_INDEX,
        },
    };
    let update = BulkUpdate {
        doc: MirrorRecord::new(request, moment),
        doc_as_upsert: true,
    };

    let mut payload = serde_json::to_string(&action)?;
    payload.push('\n');
    payload.push_str(&serde_json::to_string(&update)?);
    payload.push('\n');
    Ok(payload)
}
