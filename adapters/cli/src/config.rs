//! Run configuration and level files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use marble_smash_core::{Level, LevelConfig, LevelSequence};
use marble_smash_system_director::DirectorTuning;
use serde::Deserialize;

/// Level replayed after the last designed level when the config names none.
const DEFAULT_LOOP_START: u32 = 1;

/// Contents of a run configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunConfig {
    /// Level files in play order, relative to the configuration file.
    pub(crate) levels: Vec<PathBuf>,
    /// 1-based level the sequence loops back to.
    pub(crate) loop_start: Option<u32>,
    /// Spawn director tuning overrides.
    pub(crate) director: DirectorTuning,
}

pub(crate) fn parse_run_config(contents: &str) -> Result<RunConfig> {
    toml::from_str(contents).context("failed to parse run configuration toml contents")
}

/// Reads a run configuration and resolves its level paths against its directory.
pub(crate) fn load_run_config(path: &Path) -> Result<RunConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read run configuration at {}", path.display()))?;
    let mut config = parse_run_config(&contents)
        .with_context(|| format!("invalid run configuration {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.levels = config
        .levels
        .into_iter()
        .map(|level| base.join(level))
        .collect();
    Ok(config)
}

pub(crate) fn parse_level(contents: &str) -> Result<Level> {
    let config: LevelConfig =
        toml::from_str(contents).context("failed to parse level toml contents")?;
    config.validate().context("level configuration is invalid")
}

/// Loads and validates every level file into a sequence.
pub(crate) fn load_sequence(paths: &[PathBuf], loop_start: Option<u32>) -> Result<LevelSequence> {
    if paths.is_empty() {
        bail!("no level files given; pass --level or a --config listing levels");
    }

    let mut levels = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read level file at {}", path.display()))?;
        let level = parse_level(&contents)
            .with_context(|| format!("failed to load level {}", path.display()))?;
        levels.push(level);
    }

    LevelSequence::new(levels, loop_start.unwrap_or(DEFAULT_LOOP_START))
        .context("failed to build level sequence")
}
