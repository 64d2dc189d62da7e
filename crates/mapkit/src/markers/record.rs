use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::projection::WorldPoint;

pub const DEFAULT_MARKER_COLOR: &str = "#e74c3c";
const ID_PREFIX: &str = "marker_";
const ID_SUFFIX_LEN: usize = 9;
const UNIX_EPOCH_RFC3339: &str = "1970-01-01T00:00:00Z";
const FALLBACK_RGBA: [u8; 4] = [231, 76, 60, 255];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// `marker_{unix_millis}_{random}`; callers check for collisions.
    pub fn generate() -> Self {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let random = Uuid::new_v4().simple().to_string();
        let suffix = &random[..ID_SUFFIX_LEN];
        Self(format!("{ID_PREFIX}{millis}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub id: MarkerId,
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub timestamp: String,
    pub color: String,
}

impl MarkerRecord {
    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.y)
    }

    pub fn apply(&mut self, patch: &MarkerPatch) {
        if let Some(name) = patch.name.as_ref() {
            self.name = name.clone();
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
    }

    pub fn coords_label(&self) -> String {
        format!("X: {:.2} | Y: {:.2}", self.x, self.y)
    }

    pub fn rgba(&self) -> [u8; 4] {
        parse_hex_color(&self.color).unwrap_or(FALLBACK_RGBA)
    }
}

/// Partial update; `None` fields keep the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerPatch {
    pub name: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl MarkerPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn position(position: WorldPoint) -> Self {
        Self {
            name: None,
            x: Some(position.x),
            y: Some(position.y),
        }
    }
}

pub(crate) fn creation_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| UNIX_EPOCH_RFC3339.to_string())
}

pub fn parse_hex_color(raw: &str) -> Option<[u8; 4]> {
    let hex = raw.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> MarkerRecord {
        MarkerRecord {
            id: MarkerId::new("m1"),
            x: 1.0,
            y: 2.0,
            name: "Bank".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            color: DEFAULT_MARKER_COLOR.to_string(),
        }
    }

    #[test]
    fn generated_ids_follow_format_and_differ() {
        let a = MarkerId::generate();
        let b = MarkerId::generate();
        assert_ne!(a, b);
        let rest = a.as_str().strip_prefix(ID_PREFIX).expect("prefix");
        let (millis, suffix) = rest.split_once('_').expect("separator");
        assert!(millis.parse::<i128>().is_ok());
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut record = sample_record();
        record.apply(&MarkerPatch::name("Vault"));
        assert_eq!(record.name, "Vault");
        assert_eq!((record.x, record.y), (1.0, 2.0));

        record.apply(&MarkerPatch::position(WorldPoint::new(-4.5, 9.0)));
        assert_eq!(record.name, "Vault");
        assert_eq!((record.x, record.y), (-4.5, 9.0));
    }

    #[test]
    fn record_json_uses_plain_field_names() {
        let value = serde_json::to_value(sample_record()).expect("to_value");
        assert_eq!(value["id"], "m1");
        assert_eq!(value["name"], "Bank");
        assert_eq!(value["color"], DEFAULT_MARKER_COLOR);
    }

    #[test]
    fn hex_colors_parse_and_reject_garbage() {
        assert_eq!(parse_hex_color("#3498db"), Some([0x34, 0x98, 0xdb, 255]));
        assert_eq!(parse_hex_color("3498db"), None);
        assert_eq!(parse_hex_color("#34"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        let mut record = sample_record();
        record.color = "red".to_string();
        assert_eq!(record.rgba(), FALLBACK_RGBA);
    }

    #[test]
    fn creation_timestamp_is_rfc3339() {
        let stamp = creation_timestamp();
        assert!(OffsetDateTime::parse(&stamp, &Rfc3339).is_ok());
    }
}
