//! Plan persistence
//!
//! Plans are keyed by mapper name, which is unique per shape pair. A store
//! is only a cache: the registry rebuilds any plan it cannot load and never
//! fails a mapping because a store is unavailable.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use crate::plan::MappingPlan;
use crate::{Error, Result};
use anyhow::Context;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Persistent cache of mapping plans
pub trait PlanStore: Send + Sync {
    /// Load the plan saved under a mapper name
    fn load(&self, mapper_name: &str) -> Result<Option<MappingPlan>>;

    /// Save a plan under its mapper name
    fn save(&self, plan: &MappingPlan) -> Result<()>;

    /// Drop every saved plan
    fn clear(&self) -> Result<()>;
}

/// In-process store holding serialized plans
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    plans: Mutex<HashMap<String, String>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plans.lock().map(|plans| plans.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> Error {
    Error::Store {
        message: "Plan store lock poisoned".to_string(),
        source: anyhow::anyhow!("poisoned mutex"),
    }
}

impl PlanStore for MemoryPlanStore {
    fn load(&self, mapper_name: &str) -> Result<Option<MappingPlan>> {
        let plans = self.plans.lock().map_err(|_| poisoned())?;
        plans
            .get(mapper_name)
            .map(|json| decode(mapper_name, json))
            .transpose()
    }

    fn save(&self, plan: &MappingPlan) -> Result<()> {
        let json = serde_json::to_string(plan)?;
        self.plans
            .lock()
            .map_err(|_| poisoned())?
            .insert(plan.mapper_name.clone(), json);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.plans.lock().map_err(|_| poisoned())?.clear();
        Ok(())
    }
}

/// One JSON file per plan: `{dir}/{mapper_name}.json`
#[derive(Debug, Clone)]
pub struct FilePlanStore {
    dir: PathBuf,
}

impl FilePlanStore {
    /// Create the store, creating its directory when missing
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::Io {
            message: format!("Failed to create plan directory {}", dir.display()),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, mapper_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", mapper_name))
    }
}

impl PlanStore for FilePlanStore {
    fn load(&self, mapper_name: &str) -> Result<Option<MappingPlan>> {
        let path = self.path_for(mapper_name);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Store {
                    message: format!("Failed to read plan {}", path.display()),
                    source: e.into(),
                })
            }
        };
        debug!(path = %path.display(), "Loaded plan from store");
        decode(mapper_name, &json).map(Some)
    }

    fn save(&self, plan: &MappingPlan) -> Result<()> {
        let path = self.path_for(&plan.mapper_name);
        let json = serde_json::to_string_pretty(plan)?;
        // write-then-rename
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &path))
            .with_context(|| format!("Failed to write plan {}", path.display()))
            .map_err(|e| Error::Store {
                message: format!("Failed to save plan {}", plan.mapper_name),
                source: e,
            })
    }

    fn clear(&self) -> Result<()> {
        let entries = fs::read_dir(&self.dir).map_err(|e| Error::Io {
            message: format!("Failed to list plan directory {}", self.dir.display()),
            source: e,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).map_err(|e| Error::Io {
                    message: format!("Failed to remove plan {}", path.display()),
                    source: e,
                })?;
            }
        }
        Ok(())
    }
}

fn decode(mapper_name: &str, json: &str) -> Result<MappingPlan> {
    serde_json::from_str(json).map_err(|e| Error::Store {
        message: format!("Stored plan {} is corrupt", mapper_name),
        source: e.into(),
    })
}
