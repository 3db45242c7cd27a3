// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "照明设备")]
    Lighting,
    #[serde(rename = "通信设备")]
    Communication,
    #[serde(rename = "医疗设备")]
    Medical,
    #[serde(rename = "水上救援设备")]
    WaterRescue,
    #[serde(rename = "特殊设备")]
    Special,
    #[serde(rename = "消防设备")]
    Firefighting,
    #[serde(rename = "基础设备")]
    Basic,
}

impl Category {
    pub const ALL: [Self; 7] = [
        Self::Lighting,
        Self::Communication,
        Self::Medical,
        Self::WaterRescue,
        Self::Special,
        Self::Firefighting,
        Self::Basic,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lighting => "照明设备",
            Self::Communication => "通信设备",
            Self::Medical => "医疗设备",
            Self::WaterRescue => "水上救援设备",
            Self::Special => "特殊设备",
            Self::Firefighting => "消防设备",
            Self::Basic => "基础设备",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "在库")]
    InStock,
    #[serde(rename = "损坏")]
    Damaged,
    #[serde(rename = "使用中")]
    InUse,
}

impl Status {
    pub const ALL: [Self; 3] = [Self::InStock, Self::Damaged, Self::InUse];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "在库",
            Self::Damaged => "损坏",
            Self::InUse => "使用中",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "在库" => Some(Self::InStock),
            "损坏" => Some(Self::Damaged),
            "使用中" => Some(Self::InUse),
            _ => None,
        }
    }
}

/// Who is looking at the table. Only [`Role::Admin`] may create, edit or
/// delete records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    pub const fn can_mutate(self) -> bool {
        matches!(self, Self::Admin)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" | "0" => Some(Self::Admin),
            "viewer" | "1" => Some(Self::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub category: Category,
    pub name: String,
    pub status: Status,
    pub reason: String,
    #[serde(rename = "createTime")]
    pub created_at: String,
}

impl Record {
    /// Render key for the table; equal to the identifier.
    pub const fn key(&self) -> i64 {
        self.id.get()
    }

    pub fn created_at_time(&self) -> Option<PrimitiveDateTime> {
        parse_timestamp(&self.created_at)
    }
}

pub fn format_timestamp(value: PrimitiveDateTime) -> String {
    value
        .format(&format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_default()
}

pub fn now_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    format_timestamp(PrimitiveDateTime::new(now.date(), now.time()))
}

/// Accepts `YYYY-MM-DD HH:MM:SS` and the date-only `YYYY-MM-DD` form, which
/// reads as midnight.
pub fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(value) = PrimitiveDateTime::parse(
        trimmed,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Some(value);
    }
    Date::parse(trimmed, &format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
}

#[cfg(test)]
mod tests {
    use super::{Category, Record, Role, Status, parse_timestamp};
    use crate::RecordId;
    use anyhow::Result;

    #[test]
    fn category_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("厨房设备"), None);
    }

    #[test]
    fn status_parse_rejects_unknown_label() {
        assert_eq!(Status::parse("损坏"), Some(Status::Damaged));
        assert_eq!(Status::parse("lost"), None);
    }

    #[test]
    fn role_flag_maps_legacy_values() {
        assert_eq!(Role::parse("0"), Some(Role::Admin));
        assert_eq!(Role::parse("Viewer"), Some(Role::Viewer));
        assert!(Role::Admin.can_mutate());
        assert!(!Role::Viewer.can_mutate());
    }

    #[test]
    fn record_uses_wire_field_names() -> Result<()> {
        let raw = r#"{"id":3,"type":"照明设备","name":"手电筒","status":"在库","reason":"例行检查","createTime":"2026-03-01 08:30:00"}"#;
        let record: Record = serde_json::from_str(raw)?;
        assert_eq!(record.id, RecordId::new(3));
        assert_eq!(record.category, Category::Lighting);
        assert_eq!(record.status, Status::InStock);
        assert_eq!(record.key(), 3);

        let encoded = serde_json::to_value(&record)?;
        assert_eq!(encoded["type"], "照明设备");
        assert_eq!(encoded["createTime"], "2026-03-01 08:30:00");
        Ok(())
    }

    #[test]
    fn timestamps_accept_date_only_form() {
        let full = parse_timestamp("2026-03-01 08:30:00").expect("full timestamp parses");
        let day = parse_timestamp("2026-03-01").expect("date-only timestamp parses");
        assert!(day < full);
        assert!(parse_timestamp("yesterday").is_none());
    }
}
