//! Mapper configuration
//!
//! Process-level defaults shared by every mapper built from one
//! [`AutoMapper`](crate::AutoMapper). Per-call settings live in
//! [`MapOptions`](crate::MapOptions).
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

/// Default strftime format for date-time to string conversions
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// How member names become map keys when one side is a generic shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameConvention {
    /// Keys equal member names
    #[default]
    Identity,
    SnakeCase,
    CamelCase,
}

impl NameConvention {
    /// Map key for a member name
    pub fn key_for(&self, member: &str) -> String {
        match self {
            NameConvention::Identity => member.to_string(),
            NameConvention::SnakeCase => member.to_case(Case::Snake),
            NameConvention::CamelCase => member.to_case(Case::Camel),
        }
    }
}

/// Mapper-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Format used between date-times and strings
    pub datetime_format: String,

    /// Map key naming for From-Source and From-Target plans
    pub name_convention: NameConvention,

    /// Map non-public members of every class
    pub map_private_members: bool,

    /// Nesting budget applied when a call sets none
    pub max_depth: Option<usize>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            name_convention: NameConvention::Identity,
            map_private_members: false,
            max_depth: None,
        }
    }
}

impl MapperConfig {
    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = format.into();
        self
    }

    pub fn with_name_convention(mut self, convention: NameConvention) -> Self {
        self.name_convention = convention;
        self
    }

    pub fn with_private_members(mut self, enabled: bool) -> Self {
        self.map_private_members = enabled;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Reject formats chrono cannot render
    pub fn validate(&self) -> crate::Result<()> {
        validate_datetime_format(&self.datetime_format)
    }
}

/// Check a strftime format before any value is rendered with it
pub fn validate_datetime_format(format: &str) -> crate::Result<()> {
    use chrono::format::{Item, StrftimeItems};

    if format.is_empty() {
        return Err(crate::Error::configuration("datetime_format cannot be empty"));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(crate::Error::configuration(format!(
            "Invalid datetime_format '{}'",
            format
        )));
    }
    Ok(())
}
