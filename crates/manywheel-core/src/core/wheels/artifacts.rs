use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

use manywheel_domain::{has_wheel_extension, is_platform_independent};

#[derive(Clone, Debug, Serialize)]
pub(crate) struct ArtifactSummary {
    pub filename: String,
    pub bytes: u64,
    pub sha256: String,
    pub platform_independent: bool,
}

/// Wheel files directly inside `dir`, sorted by path.
pub(crate) fn wheel_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut wheels = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_wheel(&path) {
            wheels.push(path);
        }
    }
    wheels.sort();
    Ok(wheels)
}

pub(crate) fn collect_artifact_summaries(dir: &Path) -> Result<Vec<ArtifactSummary>> {
    let mut entries = Vec::new();
    for path in wheel_files(dir)? {
        let filename = file_name(&path);
        entries.push(ArtifactSummary {
            bytes: fs::metadata(&path)?.len(),
            sha256: compute_file_sha256(&path)?,
            platform_independent: is_platform_independent(&filename),
            filename,
        });
    }
    Ok(entries)
}

pub(crate) fn compute_file_sha256(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub(crate) fn is_wheel(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(has_wheel_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_files_ignore_other_entries() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("b-1.0-py3-none-any.whl"), b"b").unwrap();
        fs::write(temp.path().join("a-1.0-cp27-cp27mu-linux_x86_64.whl"), b"a").unwrap();
        fs::write(temp.path().join("a-1.0.tar.gz"), b"sdist").unwrap();
        fs::create_dir(temp.path().join("nested.whl")).unwrap();

        let names: Vec<String> = wheel_files(temp.path())
            .unwrap()
            .iter()
            .map(|path| file_name(path))
            .collect();
        assert_eq!(
            names,
            vec!["a-1.0-cp27-cp27mu-linux_x86_64.whl", "b-1.0-py3-none-any.whl"]
        );
    }

    #[test]
    fn summaries_hash_and_classify_wheels() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("six-1.16.0-py2.py3-none-any.whl"), b"abc").unwrap();

        let summaries = collect_artifact_summaries(temp.path()).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].bytes, 3);
        assert!(summaries[0].platform_independent);
        assert_eq!(
            summaries[0].sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn missing_directory_has_no_wheels() {
        let temp = tempfile::tempdir().unwrap();
        assert!(wheel_files(&temp.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn uppercase_pure_wheels_are_listed_and_classified() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("six-1.16.0-py2.py3-none-any.WHL"), b"six").unwrap();

        let summaries = collect_artifact_summaries(temp.path()).unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].platform_independent);
    }
}
