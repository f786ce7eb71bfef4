//! The suite manifest: the caller-side description of one run.
//!
//! A manifest is YAML naming the tests (in run order), the report
//! directory, the directory holding the bundled XSpec stylesheets, and the
//! engine command lines. The harness never discovers or sorts anything;
//! the manifest order is the execution order.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::HarnessError;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Directory the report files are written into.
    pub report_dir: PathBuf,
    /// Directory holding the bundled XSpec stylesheets.
    pub resources: PathBuf,
    pub engine: EngineConfig,
    pub tests: Vec<TestEntry>,
}

/// Argv prefixes for the external processor's two entry points.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub transform: Vec<String>,
    pub query: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestEntry {
    pub name: String,
    pub file: PathBuf,
}

impl Manifest {
    /// Load a manifest, resolving its relative paths against the
    /// manifest's own directory.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = fs::read_to_string(path).map_err(|source| HarnessError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: Manifest =
            serde_yaml::from_str(&text).map_err(|source| HarnessError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(base) = path.parent() {
            manifest.resolve_against(base);
        }
        Ok(manifest)
    }

    fn resolve_against(&mut self, base: &Path) {
        self.report_dir = rebase(base, &self.report_dir);
        self.resources = rebase(base, &self.resources);
        for test in &mut self.tests {
            test.file = rebase(base, &test.file);
        }
    }

    /// The ordered name → file mapping handed to the runner.
    pub fn test_mapping(&self) -> Vec<(String, PathBuf)> {
        self.tests
            .iter()
            .map(|test| (test.name.clone(), test.file.clone()))
            .collect()
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const MANIFEST: &str = r#"
report_dir: target/xspec-reports
resources: vendor/xspec
engine:
  transform: ["java", "-cp", "saxon.jar", "net.sf.saxon.Transform"]
  query: ["java", "-cp", "saxon.jar", "net.sf.saxon.Query"]
tests:
  - name: formatting
    file: specs/formatting.xspec
  - name: validation
    file: specs/validation.xspec
"#;

    #[test]
    fn manifests_parse_and_keep_test_order() {
        let manifest: Manifest = serde_yaml::from_str(MANIFEST).unwrap();
        let names: Vec<_> = manifest.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["formatting", "validation"]);
        assert_eq!(manifest.engine.transform[0], "java");
    }

    #[test]
    fn relative_paths_resolve_against_the_manifest_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.yaml");
        fs::write(&path, MANIFEST).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.report_dir, dir.path().join("target/xspec-reports"));
        assert_eq!(
            manifest.tests[0].file,
            dir.path().join("specs/formatting.xspec")
        );
    }

    #[test]
    fn absolute_paths_are_left_alone() {
        assert_eq!(
            rebase(Path::new("/base"), Path::new("/abs/file.xspec")),
            PathBuf::from("/abs/file.xspec")
        );
        assert_eq!(
            rebase(Path::new("/base"), Path::new("rel.xspec")),
            PathBuf::from("/base/rel.xspec")
        );
    }

    #[test]
    fn unreadable_manifests_are_fatal() {
        let err = Manifest::load(Path::new("/no/such/suite.yaml")).unwrap_err();
        assert!(matches!(err, HarnessError::ManifestRead { .. }));
    }

    #[test]
    fn malformed_manifests_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.yaml");
        fs::write(&path, "tests: {not: [a, list").unwrap();
        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, HarnessError::ManifestParse { .. }));
    }
}
