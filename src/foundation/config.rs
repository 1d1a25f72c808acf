use crate::canvas::CanvasOpts;
use crate::foundation::error::{VgirError, VgirResult};
use crate::ir::pool::PoolOpts;
use crate::render::cache::CacheOpts;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Aggregated runtime options, loadable from JSON.
///
/// Missing sections fall back to their defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VgirConfig {
    pub pool: PoolOpts,
    pub canvas: CanvasOpts,
    pub cache: CacheOpts,
}

impl VgirConfig {
    /// Parse a configuration from a JSON reader and validate it.
    pub fn from_reader<R: std::io::Read>(r: R) -> VgirResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| VgirError::argument(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> VgirResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> VgirResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            VgirError::argument(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> VgirResult<()> {
        self.pool.validate()?;
        self.cache.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
