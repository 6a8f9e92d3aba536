//! Execution context
//!
//! [`MapOptions`] is the per-call options bag. [`MapContext`] threads it
//! through one `map` call together with the property path used in errors,
//! the per-member depth counters and the stack of mappers being executed.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use crate::registry::MapperRegistry;
use crate::shape::{ShapeId, ShapePair};
use crate::{Result, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Hook run on a member result: `(whole source, result) -> new result`
pub type MemberCallback = Arc<dyn Fn(&Value, Value) -> Value + Send + Sync>;

/// Per-call options
#[derive(Clone, Default)]
pub struct MapOptions {
    /// Only members in these groups (or without groups) are mapped
    pub groups: Option<Vec<String>>,
    /// Overrides the configured date-time format
    pub datetime_format: Option<String>,
    /// Nesting budget for object members
    pub max_depth: Option<usize>,
    /// Null results are not written
    pub skip_null_values: bool,
    /// Nested objects of a supplied target are populated in place
    pub deep_target_to_populate: bool,
    /// Callbacks keyed by target member name
    pub callbacks: HashMap<String, MemberCallback>,
}

impl fmt::Debug for MapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapOptions")
            .field("groups", &self.groups)
            .field("datetime_format", &self.datetime_format)
            .field("max_depth", &self.max_depth)
            .field("skip_null_values", &self.skip_null_values)
            .field("deep_target_to_populate", &self.deep_target_to_populate)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = Some(format.into());
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn skip_null_values(mut self) -> Self {
        self.skip_null_values = true;
        self
    }

    pub fn deep_target_to_populate(mut self) -> Self {
        self.deep_target_to_populate = true;
        self
    }

    /// Run `callback` on the result of `member` before it is written
    pub fn with_callback<F>(mut self, member: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Value, Value) -> Value + Send + Sync + 'static,
    {
        self.callbacks.insert(member.into(), Arc::new(callback));
        self
    }

    /// Reject a date-time format override chrono cannot render
    pub fn validate(&self) -> Result<()> {
        match &self.datetime_format {
            Some(format) => crate::config::validate_datetime_format(format),
            None => Ok(()),
        }
    }
}

enum PathSegment {
    Field(String),
    Index(usize),
    Key(String),
}

/// State of one `map` call
pub struct MapContext<'a> {
    registry: &'a MapperRegistry,
    options: &'a MapOptions,
    groups: Option<HashSet<&'a str>>,
    datetime_format: &'a str,
    max_depth: Option<usize>,
    path: Vec<PathSegment>,
    depth_counters: HashMap<String, usize>,
    nesting: Vec<ShapePair>,
}

impl<'a> MapContext<'a> {
    pub fn new(registry: &'a MapperRegistry, options: &'a MapOptions) -> Self {
        let config = registry.config();
        Self {
            registry,
            options,
            groups: options
                .groups
                .as_ref()
                .map(|groups| groups.iter().map(String::as_str).collect()),
            datetime_format: options
                .datetime_format
                .as_deref()
                .unwrap_or(&config.datetime_format),
            max_depth: options.max_depth.or(config.max_depth),
            path: Vec::new(),
            depth_counters: HashMap::new(),
            nesting: Vec::new(),
        }
    }

    pub fn options(&self) -> &'a MapOptions {
        self.options
    }

    pub fn registry(&self) -> &'a MapperRegistry {
        self.registry
    }

    /// Effective date-time format of the call
    pub fn datetime_format(&self) -> &'a str {
        self.datetime_format
    }

    /// Property path of the value being mapped, e.g. `$.orders[0].customer`
    pub fn path(&self) -> String {
        let mut rendered = String::from("$");
        for segment in &self.path {
            match segment {
                PathSegment::Field(name) => {
                    rendered.push('.');
                    rendered.push_str(name);
                }
                PathSegment::Index(index) => rendered.push_str(&format!("[{}]", index)),
                PathSegment::Key(key) => rendered.push_str(&format!("[{:?}]", key)),
            }
        }
        rendered
    }

    pub(crate) fn push_field(&mut self, name: &str) {
        self.path.push(PathSegment::Field(name.to_string()));
    }

    pub(crate) fn push_index(&mut self, index: usize) {
        self.path.push(PathSegment::Index(index));
    }

    pub(crate) fn push_key(&mut self, key: &str) {
        self.path.push(PathSegment::Key(key.to_string()));
    }

    pub(crate) fn pop(&mut self) {
        self.path.pop();
    }

    /// Whether a member passes the call's group filter.
    ///
    /// Members without groups always pass. Members with groups pass only when
    /// the call selects one of them.
    pub(crate) fn in_groups(&self, source_groups: &[String], target_groups: &[String]) -> bool {
        if source_groups.is_empty() && target_groups.is_empty() {
            return true;
        }
        match &self.groups {
            None => false,
            Some(selected) => source_groups
                .iter()
                .chain(target_groups)
                .any(|g| selected.contains(g.as_str())),
        }
    }

    /// Number of mappers currently executing below the root one
    pub fn nesting_depth(&self) -> usize {
        self.nesting.len().saturating_sub(1)
    }

    /// Whether object members of the current mapper must be skipped
    pub(crate) fn nesting_exhausted(&self) -> bool {
        self.max_depth
            .is_some_and(|max| self.nesting_depth() >= max)
    }

    /// Enter a member with a max-depth setting; `false` when its budget is spent
    pub(crate) fn enter_depth(&mut self, key: &str, max: usize) -> bool {
        let count = self.depth_counters.entry(key.to_string()).or_insert(0);
        if *count >= max {
            return false;
        }
        *count += 1;
        true
    }

    pub(crate) fn leave_depth(&mut self, key: &str) {
        if let Some(count) = self.depth_counters.get_mut(key) {
            *count = count.saturating_sub(1);
        }
    }

    pub(crate) fn enter_mapper(&mut self, pair: ShapePair) {
        self.nesting.push(pair);
    }

    pub(crate) fn leave_mapper(&mut self) {
        self.nesting.pop();
    }

    /// Map a nested value to `target` through the registry.
    ///
    /// The mapper is chosen by the runtime shape of `value`, so subtypes and
    /// generic values bind to their own mapper.
    pub fn map_nested(
        &mut self,
        value: &Value,
        target: &ShapeId,
        existing: Option<Value>,
    ) -> Result<Value> {
        let registry = self.registry;
        registry.map_in_context(value, target, existing, self)
    }
}
