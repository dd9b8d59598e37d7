use crate::model::{ScenarioResult, SuiteReport};
use crate::runner::{ErrorCode, HarnessError, HarnessResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct ArtifactsWriterConfig {
    pub dir: PathBuf,
    pub overwrite: bool,
}

/// Writes the suite report and captured streams to a directory.
///
/// Layout:
/// - `report.json`
/// - `scenarios/<id>/stdout`, `scenarios/<id>/stderr`
/// - `checksums.json`, FNV-1a of every other file, rewritten after each write
pub struct ArtifactsWriter {
    dir: PathBuf,
    checksums: BTreeMap<String, String>,
}

impl ArtifactsWriter {
    pub fn new(config: ArtifactsWriterConfig) -> HarnessResult<Self> {
        if config.dir.exists() {
            if !config.overwrite {
                return Err(HarnessError::new(
                    ErrorCode::Io,
                    "artifacts directory exists and overwrite is disabled",
                    Some(serde_json::json!({ "dir": config.dir })),
                ));
            }
        } else {
            fs::create_dir_all(&config.dir)
                .map_err(|err| HarnessError::io("failed to create artifacts dir", err))?;
        }
        Ok(Self {
            dir: config.dir,
            checksums: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_report(&mut self, report: &SuiteReport) -> HarnessResult<()> {
        self.write_json("report.json", report)
    }

    /// Write a scenario's captured streams. Scenarios that never got to read
    /// their output back write nothing.
    pub fn write_captured(&mut self, result: &ScenarioResult) -> HarnessResult<()> {
        let Some(captured) = &result.captured else {
            return Ok(());
        };
        let base = format!("scenarios/{}", result.scenario_id);
        self.write_bytes(&format!("{base}/stdout"), captured.stdout.as_bytes())?;
        self.write_bytes(&format!("{base}/stderr"), captured.stderr.as_bytes())
    }

    fn write_json<T: Serialize>(&mut self, name: &str, value: &T) -> HarnessResult<()> {
        let data = serde_json::to_vec_pretty(value)
            .map_err(|err| HarnessError::io("failed to serialize artifact", err))?;
        self.write_bytes(name, &data)
    }

    fn write_bytes(&mut self, name: &str, data: &[u8]) -> HarnessResult<()> {
        let path = self.dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| HarnessError::io("failed to create artifacts dir", err))?;
        }
        fs::write(&path, data)
            .map_err(|err| HarnessError::io(format!("failed to write artifact {name}"), err))?;
        self.checksums
            .insert(name.to_string(), format!("{:016x}", fnv1a_hash(data)));
        self.write_checksums()
    }

    fn write_checksums(&self) -> HarnessResult<()> {
        let data = serde_json::to_vec_pretty(&self.checksums)
            .map_err(|err| HarnessError::io("failed to serialize checksums", err))?;
        fs::write(self.dir.join("checksums.json"), data)
            .map_err(|err| HarnessError::io("failed to write checksums", err))
    }
}

fn fnv1a_hash(data: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    data.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}
