//! YAML test suite loading
//!
//! A suite is either a top-level list of test definitions or a mapping with
//! a `tests` list. Definitions that fail to decode or validate are skipped
//! with a warning; duplicate names reject the whole suite.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use skillbench_core::definition::TestDefinition;
use skillbench_core::error::{BenchError, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum SuiteFile {
    List(Vec<serde_yaml::Value>),
    Wrapped { tests: Vec<serde_yaml::Value> },
}

pub fn load_suite(path: &Path) -> Result<Vec<TestDefinition>> {
    let content = fs::read_to_string(path)
        .map_err(|e| BenchError::failed(&format!("read {}", path.display()), e))?;
    parse_suite(&content, path)
}

pub fn parse_suite(content: &str, path: &Path) -> Result<Vec<TestDefinition>> {
    let invalid = |reason: String| BenchError::InvalidSuite {
        path: path.to_path_buf(),
        reason,
    };

    let entries = match serde_yaml::from_str::<SuiteFile>(content) {
        Ok(SuiteFile::List(entries)) | Ok(SuiteFile::Wrapped { tests: entries }) => entries,
        Err(e) => return Err(invalid(e.to_string())),
    };

    let mut seen = HashSet::new();
    let mut tests = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let test = match serde_yaml::from_value::<TestDefinition>(entry) {
            Ok(test) => test,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping undecodable test definition");
                continue;
            }
        };
        if let Err(e) = test.validate() {
            tracing::warn!(index, error = %e, "skipping invalid test definition");
            continue;
        }
        if !seen.insert(test.name.clone()) {
            return Err(invalid(format!("duplicate test name {:?}", test.name)));
        }
        tests.push(test);
    }

    if tests.is_empty() {
        return Err(BenchError::NoTests);
    }
    Ok(tests)
}
