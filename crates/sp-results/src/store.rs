//! Run storage.
//!
//! Layout under the store root:
//!
//! ```text
//! <run_id>/manifest.json   pretty-printed RunManifest
//! <run_id>/samples.jsonl   one Sample per line
//! ```

use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};
use sp_sim::Sample;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "manifest.json";
const SAMPLES_FILE: &str = "samples.jsonl";

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Store next to a configuration file, under `.spm/runs`.
    pub fn for_config(config_path: &Path) -> ResultsResult<Self> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: format!("{} has no parent directory", config_path.display()),
            })?;
        Self::new(config_dir.join(".spm").join("runs"))
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn run_file(&self, run_id: &str, name: &str) -> PathBuf {
        self.root_dir.join(run_id).join(name)
    }

    /// Contents of one file of a stored run; `RunNotFound` if it is missing.
    fn read_run_file(&self, run_id: &str, name: &str) -> ResultsResult<String> {
        let path = self.run_file(run_id, name);
        if !path.is_file() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(fs::read_to_string(path)?)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_file(run_id, MANIFEST_FILE).is_file()
    }

    /// Samples are written before the manifest, so a run only becomes
    /// visible to `has_run` once both files are complete.
    pub fn save_run(&self, manifest: &RunManifest, samples: &[Sample]) -> ResultsResult<()> {
        fs::create_dir_all(self.root_dir.join(&manifest.run_id))?;

        let mut lines = String::with_capacity(samples.len() * 320);
        for sample in samples {
            lines.push_str(&serde_json::to_string(sample)?);
            lines.push('\n');
        }
        fs::write(self.run_file(&manifest.run_id, SAMPLES_FILE), lines)?;

        fs::write(
            self.run_file(&manifest.run_id, MANIFEST_FILE),
            serde_json::to_string_pretty(manifest)?,
        )?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let content = self.read_run_file(run_id, MANIFEST_FILE)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_samples(&self, run_id: &str) -> ResultsResult<Vec<Sample>> {
        let content = self.read_run_file(run_id, SAMPLES_FILE)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(ResultsError::from))
            .collect()
    }

    /// Manifests of stored runs for one configuration name, oldest first.
    /// Directories without a readable manifest are skipped.
    pub fn list_runs(&self, config_name: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        if !self.root_dir.is_dir() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().into_owned();
            if let Ok(manifest) = self.load_manifest(&run_id)
                && manifest.config_name == config_name
            {
                runs.push(manifest);
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.root_dir.join(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
