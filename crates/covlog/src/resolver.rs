//! Path resolver and router.
//!
//! The capture names every counter file by the absolute path it had on the
//! build host. Staged dumps are matched to those paths by file name, decoded
//! and written back next to the object files so that `lcov --capture` can
//! pair them with their `.gcno` notes.

use crate::config::PipelineConfig;
use crate::hexdump::decode_xxd;
use crate::result::{CovlogError, CovlogResult};
use crate::splitter::{CoverageArtifact, COUNTER_SUFFIX};
use indexmap::IndexSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A dump decoded into its original build directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCoverageFile {
    /// Counter file name
    pub key: String,
    /// Directory the counter file was captured from
    pub dir: PathBuf,
    /// Decoded counter file, `<dir>/<key>`
    pub counter_file: PathBuf,
}

impl ResolvedCoverageFile {
    /// Translation unit name without extensions (`Idle.cpp.gcda` -> `Idle`)
    #[must_use]
    pub fn unit_stem(&self) -> &str {
        self.key.split('.').next().unwrap_or(&self.key)
    }
}

/// Why an artifact was not routed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// No captured path carries this file name
    NoDestination,
    /// Captured directory no longer exists on this host
    MissingDirectory(PathBuf),
    /// Hex dump could not be decoded
    Malformed(String),
}

/// An artifact left in the working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedArtifact {
    /// The staged artifact
    pub artifact: CoverageArtifact,
    /// Reason it was skipped
    pub reason: SkipReason,
}

/// Result of routing one capture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingOutcome {
    /// Module name derived from the first captured path
    pub module_name: Option<String>,
    /// Counter files written, in artifact order
    pub resolved: Vec<ResolvedCoverageFile>,
    /// Artifacts that could not be routed
    pub skipped: Vec<SkippedArtifact>,
}

impl RoutingOutcome {
    /// Distinct destination directories in first-resolved order
    #[must_use]
    pub fn destination_dirs(&self) -> IndexSet<PathBuf> {
        self.resolved.iter().map(|r| r.dir.clone()).collect()
    }
}

/// Matches staged dumps to captured counter paths
#[derive(Debug, Clone)]
pub struct PathResolver {
    path_pattern: Regex,
    project_segment: String,
    build_segment: String,
}

impl PathResolver {
    /// Build a resolver from pipeline settings
    pub fn new(config: &PipelineConfig) -> CovlogResult<Self> {
        let pattern = format!(
            r"{}\S+{}",
            regex::escape(&config.search_root),
            regex::escape(COUNTER_SUFFIX)
        );
        let path_pattern = Regex::new(&pattern)
            .map_err(|e| CovlogError::config(format!("invalid search root: {e}")))?;

        Ok(Self {
            path_pattern,
            project_segment: config.project_segment.clone(),
            build_segment: config.build_segment.clone(),
        })
    }

    /// Every counter path in the log, deduplicated in first-seen order
    #[must_use]
    pub fn candidate_paths(&self, text: &str) -> IndexSet<PathBuf> {
        self.path_pattern
            .find_iter(text)
            .map(|m| PathBuf::from(m.as_str()))
            .collect()
    }

    /// Module name encoded in a counter path
    ///
    /// `/home/u/p/Application/States/CMakeFiles/x.dir/A.cpp.gcda` gives
    /// `States`.
    #[must_use]
    pub fn module_name(&self, path: &Path) -> Option<String> {
        derive_module_name(
            &path.to_string_lossy(),
            &self.project_segment,
            &self.build_segment,
        )
    }

    /// Run all three routing steps over a sanitized log
    pub fn resolve(
        &self,
        text: &str,
        artifacts: &[CoverageArtifact],
    ) -> CovlogResult<RoutingOutcome> {
        let candidates = self.candidate_paths(text);
        let module_name = candidates.first().and_then(|p| self.module_name(p));
        info!(
            candidates = candidates.len(),
            module = module_name.as_deref().unwrap_or("<unknown>"),
            "collected counter paths"
        );

        let mut outcome = route_artifacts(artifacts, &candidates)?;
        outcome.module_name = module_name;
        Ok(outcome)
    }
}

/// Strip through `project_segment`, cut at `build_segment`, keep the
/// leading component
#[must_use]
pub fn derive_module_name(path: &str, project_segment: &str, build_segment: &str) -> Option<String> {
    let (_, after_project) = path.split_once(project_segment)?;
    let before_build = after_project
        .find(build_segment)
        .map_or(after_project, |end| &after_project[..end]);
    let module = before_build.split('/').next().unwrap_or_default();
    (!module.is_empty()).then(|| module.to_string())
}

/// Decode each artifact into the directory its counter path names
///
/// Destination files are overwritten, so rerunning over the same capture
/// gives the same result.
pub fn route_artifacts(
    artifacts: &[CoverageArtifact],
    candidates: &IndexSet<PathBuf>,
) -> CovlogResult<RoutingOutcome> {
    let mut outcome = RoutingOutcome::default();

    for artifact in artifacts {
        let dirs: IndexSet<&Path> = candidates
            .iter()
            .filter(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == artifact.key))
            .filter_map(|p| p.parent())
            .collect();

        let Some(dir) = dirs.first().copied() else {
            warn!(artifact = %artifact.key, "no matching path found, skipping");
            outcome.skipped.push(SkippedArtifact {
                artifact: artifact.clone(),
                reason: SkipReason::NoDestination,
            });
            continue;
        };
        if dirs.len() > 1 {
            warn!(
                artifact = %artifact.key,
                chosen = %dir.display(),
                ignored = dirs.len() - 1,
                "counter path captured in several directories, using the first"
            );
        }
        if !dir.is_dir() {
            warn!(artifact = %artifact.key, dir = %dir.display(), "destination directory missing, skipping");
            outcome.skipped.push(SkippedArtifact {
                artifact: artifact.clone(),
                reason: SkipReason::MissingDirectory(dir.to_path_buf()),
            });
            continue;
        }

        let bytes = match decode_xxd(&artifact.key, &artifact.read_dump()?) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(artifact = %artifact.key, error = %e, "undecodable dump, skipping");
                outcome.skipped.push(SkippedArtifact {
                    artifact: artifact.clone(),
                    reason: SkipReason::Malformed(e.to_string()),
                });
                continue;
            }
        };

        let counter_file = dir.join(&artifact.key);
        std::fs::write(&counter_file, &bytes).map_err(|e| CovlogError::file_io(&counter_file, e))?;
        std::fs::remove_file(&artifact.path).map_err(|e| CovlogError::file_io(&artifact.path, e))?;
        info!(artifact = %artifact.key, dir = %dir.display(), bytes = bytes.len(), "moved counter file");

        outcome.resolved.push(ResolvedCoverageFile {
            key: artifact.key.clone(),
            dir: dir.to_path_buf(),
            counter_file,
        });
    }

    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hexdump::encode_xxd;
    use crate::splitter::{split_blocks, write_artifacts};
    use tempfile::TempDir;

    fn resolver_for(root: &Path) -> PathResolver {
        let config = PipelineConfig::new().with_search_root(format!("{}/", root.display()));
        PathResolver::new(&config).unwrap()
    }

    /// Build `<root>/proj/Application/<module>/CMakeFiles/<module>.dir`
    fn build_dir(root: &Path, module: &str) -> PathBuf {
        let dir = root
            .join("proj/Application")
            .join(module)
            .join("CMakeFiles")
            .join(format!("{module}.dir"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn capture(entries: &[(&Path, &str)]) -> String {
        let mut text = String::from("boot\n");
        for (path, blob) in entries {
            text.push_str("Emitting\n");
            text.push_str(&encode_xxd(blob.as_bytes()));
            text.push_str(&format!("{}\n", path.display()));
        }
        text
    }

    mod module_name_tests {
        use super::*;

        #[test]
        fn test_typical_path() {
            let name = derive_module_name(
                "/home/dev/proj/Application/States/CMakeFiles/states.dir/Idle.cpp.gcda",
                "Application/",
                "CMakeFiles",
            );
            assert_eq!(name.as_deref(), Some("States"));
        }

        #[test]
        fn test_nested_module_keeps_leading_component() {
            let name = derive_module_name(
                "/home/dev/Application/Motor/Driver/CMakeFiles/d.dir/Pwm.c.gcda",
                "Application/",
                "CMakeFiles",
            );
            assert_eq!(name.as_deref(), Some("Motor"));
        }

        #[test]
        fn test_missing_project_segment() {
            assert_eq!(
                derive_module_name("/home/dev/other/CMakeFiles/x.gcda", "Application/", "CMakeFiles"),
                None
            );
        }

        #[test]
        fn test_empty_module() {
            assert_eq!(
                derive_module_name("/home/Application/CMakeFiles/x.gcda", "Application/", "CMakeFiles"),
                None
            );
        }
    }

    mod candidate_tests {
        use super::*;

        #[test]
        fn test_extracts_and_dedups_in_order() {
            let resolver = PathResolver::new(&PipelineConfig::new()).unwrap();
            let text = "x /home/a/B.cpp.gcda y\n/home/a/A.cpp.gcda\n/home/a/B.cpp.gcda\n/opt/C.cpp.gcda\n";
            let paths: Vec<_> = resolver.candidate_paths(text).into_iter().collect();
            assert_eq!(
                paths,
                vec![PathBuf::from("/home/a/B.cpp.gcda"), PathBuf::from("/home/a/A.cpp.gcda")]
            );
        }

        #[test]
        fn test_no_paths() {
            let resolver = PathResolver::new(&PipelineConfig::new()).unwrap();
            assert!(resolver.candidate_paths("nothing here\n").is_empty());
        }
    }

    #[test]
    fn test_unit_stem() {
        let resolved = ResolvedCoverageFile {
            key: "Idle.cpp.gcda".to_string(),
            dir: PathBuf::from("/b/states"),
            counter_file: PathBuf::from("/b/states/Idle.cpp.gcda"),
        };
        assert_eq!(resolved.unit_stem(), "Idle");
    }

    mod routing_tests {
        use super::*;

        #[test]
        fn test_routes_and_deletes_artifact() {
            let temp = TempDir::new().unwrap();
            let work = temp.path().join("work");
            std::fs::create_dir(&work).unwrap();
            let dir = build_dir(temp.path(), "States");
            let counter = dir.join("Idle.cpp.gcda");
            let text = capture(&[(counter.as_path(), "adcg-idle")]);

            let artifacts = write_artifacts(split_blocks(&text), &work).unwrap();
            let outcome = resolver_for(temp.path()).resolve(&text, &artifacts).unwrap();

            assert_eq!(outcome.module_name.as_deref(), Some("States"));
            assert_eq!(outcome.resolved.len(), 1);
            assert_eq!(outcome.resolved[0].counter_file, counter);
            assert_eq!(std::fs::read(&counter).unwrap(), b"adcg-idle");
            assert!(!artifacts[0].path.exists());
        }

        #[test]
        fn test_unmatched_artifact_is_skipped() {
            let temp = TempDir::new().unwrap();
            let staged = temp.path().join("Ghost.cpp.gcda.xxd");
            std::fs::write(&staged, "00000000: 41  A\n").unwrap();
            let artifact = CoverageArtifact { key: "Ghost.cpp.gcda".into(), path: staged.clone() };

            let outcome = route_artifacts(&[artifact], &IndexSet::new()).unwrap();
            assert!(outcome.resolved.is_empty());
            assert_eq!(outcome.skipped[0].reason, SkipReason::NoDestination);
            assert!(staged.exists());
        }

        #[test]
        fn test_missing_directory_is_skipped() {
            let temp = TempDir::new().unwrap();
            let staged = temp.path().join("A.cpp.gcda.xxd");
            std::fs::write(&staged, "00000000: 41  A\n").unwrap();
            let artifact = CoverageArtifact { key: "A.cpp.gcda".into(), path: staged };
            let gone = temp.path().join("removed/A.cpp.gcda");
            let candidates: IndexSet<PathBuf> = [gone].into_iter().collect();

            let outcome = route_artifacts(&[artifact], &candidates).unwrap();
            assert!(matches!(outcome.skipped[0].reason, SkipReason::MissingDirectory(_)));
        }

        #[test]
        fn test_garbled_offset_is_skipped() {
            let temp = TempDir::new().unwrap();
            let work = temp.path().join("work");
            std::fs::create_dir(&work).unwrap();
            let dir = build_dir(temp.path(), "States");
            let good = dir.join("Idle.cpp.gcda");
            let bad = dir.join("Run.cpp.gcda");
            let mut text = capture(&[(good.as_path(), "adcg-idle")]);
            text.push_str(&format!(
                "Emitting\nfffffffffffffffe: 4142 4344  ABCD\n{}\n",
                bad.display()
            ));

            let artifacts = write_artifacts(split_blocks(&text), &work).unwrap();
            let outcome = resolver_for(temp.path()).resolve(&text, &artifacts).unwrap();

            assert_eq!(outcome.resolved.len(), 1);
            assert_eq!(outcome.resolved[0].counter_file, good);
            assert_eq!(outcome.skipped.len(), 1);
            assert_eq!(outcome.skipped[0].artifact.key, "Run.cpp.gcda");
            assert!(matches!(outcome.skipped[0].reason, SkipReason::Malformed(_)));
            assert!(!bad.exists());
        }

        #[test]
        fn test_malformed_dump_is_skipped() {
            let temp = TempDir::new().unwrap();
            let dir = build_dir(temp.path(), "States");
            let staged = temp.path().join("A.cpp.gcda.xxd");
            std::fs::write(&staged, "00000000: zz  ?\n").unwrap();
            let artifact = CoverageArtifact { key: "A.cpp.gcda".into(), path: staged };
            let candidates: IndexSet<PathBuf> = [dir.join("A.cpp.gcda")].into_iter().collect();

            let outcome = route_artifacts(&[artifact], &candidates).unwrap();
            assert!(matches!(outcome.skipped[0].reason, SkipReason::Malformed(_)));
            assert!(!dir.join("A.cpp.gcda").exists());
        }

        #[test]
        fn test_one_destination_per_artifact() {
            let temp = TempDir::new().unwrap();
            let first = build_dir(temp.path(), "States");
            let second = build_dir(temp.path(), "Motor");
            let text = capture(&[(first.join("Common.cpp.gcda").as_path(), "one")])
                + &format!("{}\n", second.join("Common.cpp.gcda").display());

            let artifacts = write_artifacts(split_blocks(&text), temp.path()).unwrap();
            let outcome = resolver_for(temp.path()).resolve(&text, &artifacts).unwrap();

            assert_eq!(outcome.resolved.len(), 1);
            assert_eq!(outcome.resolved[0].dir, first);
            assert!(!second.join("Common.cpp.gcda").exists());
        }

        #[test]
        fn test_shared_directory_deduplicated() {
            let temp = TempDir::new().unwrap();
            let dir = build_dir(temp.path(), "States");
            let text = capture(&[
                (dir.join("Idle.cpp.gcda").as_path(), "idle"),
                (dir.join("Run.cpp.gcda").as_path(), "run"),
            ]);

            let artifacts = write_artifacts(split_blocks(&text), temp.path()).unwrap();
            let outcome = resolver_for(temp.path()).resolve(&text, &artifacts).unwrap();

            assert_eq!(outcome.resolved.len(), 2);
            let dirs: Vec<_> = outcome.destination_dirs().into_iter().collect();
            assert_eq!(dirs, vec![dir]);
        }

        #[test]
        fn test_rerun_is_idempotent() {
            let temp = TempDir::new().unwrap();
            let work = temp.path().join("work");
            std::fs::create_dir(&work).unwrap();
            let dir = build_dir(temp.path(), "States");
            let text = capture(&[(dir.join("Idle.cpp.gcda").as_path(), "\u{0}\u{1}counters")]);
            let resolver = resolver_for(temp.path());

            let mut snapshots = Vec::new();
            for _ in 0..2 {
                let artifacts = write_artifacts(split_blocks(&text), &work).unwrap();
                let outcome = resolver.resolve(&text, &artifacts).unwrap();
                assert_eq!(outcome.resolved.len(), 1);

                let mut listing: Vec<_> = std::fs::read_dir(&dir)
                    .unwrap()
                    .map(|e| e.unwrap().file_name())
                    .collect();
                listing.sort();
                snapshots.push((listing, std::fs::read(dir.join("Idle.cpp.gcda")).unwrap()));
            }

            assert_eq!(snapshots[0], snapshots[1]);
            assert_eq!(snapshots[0].0.len(), 1);
        }
    }
}
