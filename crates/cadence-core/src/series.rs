//! Series identity: which recurring definition a task row belongs to.
//!
//! New definitions receive a UUIDv7 series id at creation. Rows written before
//! series ids existed are grouped by a fingerprint over the fields that define
//! a series; reconciliation persists that fingerprint onto the template row so
//! it is only ever derived once.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Task;

/// Prefix marking series ids that were derived rather than assigned.
pub const FINGERPRINT_PREFIX: &str = "fp-";

const FINGERPRINT_HEX_LEN: usize = 32;

/// Fresh id for a newly created recurring definition.
pub fn assign_series_id() -> String {
    Uuid::now_v7().to_string()
}

/// Stable hash over the identity-defining fields of a recurring row.
///
/// Description and checklist are not part of the identity, so cosmetic edits
/// keep a row in its series.
pub fn fingerprint(task: &Task) -> String {
    let pattern = normalize(task.recurring_pattern.as_deref());
    let interval = task.recurring_interval.unwrap_or(1).max(1).to_string();
    let schedule_from = match normalize(task.schedule_from.as_deref()) {
        anchor if anchor.is_empty() => "due_date".to_string(),
        anchor => anchor,
    };
    let fields: [&str; 8] = [
        task.title.trim(),
        task.assignee.as_deref().unwrap_or_default(),
        task.client.as_deref().unwrap_or_default(),
        task.space.as_deref().unwrap_or_default(),
        task.campaign.as_deref().unwrap_or_default(),
        &pattern,
        &interval,
        &schedule_from,
    ];

    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update([0x1f]);
    }
    let digest = format!("{:x}", hasher.finalize());
    format!("{}{}", FINGERPRINT_PREFIX, &digest[..FINGERPRINT_HEX_LEN])
}

/// The stored series id if present, otherwise the fingerprint.
pub fn resolve_series_id(task: &Task) -> String {
    match task.recurrence_series_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => fingerprint(task),
    }
}

fn normalize(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}
