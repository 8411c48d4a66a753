//! Generated-file header and artifact writes.
//!
//! Artifacts are written through a temporary file in the destination
//! directory and persisted over the target, so an interrupted run never
//! leaves a half-written source file behind.

use crate::error::{GenError, GenResult};
use chrono::{DateTime, Datelike, Local};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File stem of the factory registration unit.
pub const FACTORY_STEM: &str = "Factory";
/// File stem of the execution test unit.
pub const EXECUTION_TEST_STEM: &str = "BlockExecutionTestAuto";

/// Line that carries the generation timestamp; everything after it is
/// reproducible for identical inputs.
pub const TIMESTAMP_MARKER: &str = "// This file was auto-generated on ";

#[derive(Clone, Debug)]
pub struct FileHeader {
    pub holder: String,
    pub start_year: i32,
    pub generated_at: DateTime<Local>,
}

impl FileHeader {
    pub fn now(holder: impl Into<String>, start_year: i32) -> Self {
        Self {
            holder: holder.into(),
            start_year,
            generated_at: Local::now(),
        }
    }

    /// Header followed by a blank line and the rendered body.
    pub fn prepend(&self, body: &str) -> String {
        format!("{self}\n{body}")
    }
}

impl fmt::Display for FileHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "// Copyright (c) {}-{} {}",
            self.start_year,
            self.generated_at.year(),
            self.holder
        )?;
        writeln!(f, "// SPDX-License-Identifier: BSD-3-Clause")?;
        writeln!(f)?;
        writeln!(f, "//")?;
        writeln!(
            f,
            "{TIMESTAMP_MARKER}{}.",
            self.generated_at.format("%Y-%m-%d %H:%M:%S%.6f")
        )?;
        writeln!(f, "//")
    }
}

pub fn artifact_name(stem: &str, extension: &str) -> String {
    format!("{stem}.{extension}")
}

/// Write `contents` to `dir/file_name`, replacing any existing file.
pub fn write_artifact(dir: &Path, file_name: &str, contents: &str) -> GenResult<PathBuf> {
    let target = dir.join(file_name);
    let io_error = |source| GenError::Io {
        path: target.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(|source| GenError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut staged = NamedTempFile::new_in(dir).map_err(io_error)?;
    staged.write_all(contents.as_bytes()).map_err(io_error)?;
    staged.flush().map_err(io_error)?;
    staged.persist(&target).map_err(|err| io_error(err.error))?;

    log::info!("wrote {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_header() -> FileHeader {
        FileHeader {
            holder: "Nicholas Corgan".to_string(),
            start_year: 2019,
            generated_at: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 6).unwrap(),
        }
    }

    #[test]
    fn header_layout() {
        let text = fixed_header().prepend("#include <vector>\n");
        assert_eq!(
            text,
            "// Copyright (c) 2019-2024 Nicholas Corgan\n\
             // SPDX-License-Identifier: BSD-3-Clause\n\
             \n\
             //\n\
             // This file was auto-generated on 2024-03-09 14:05:06.000000.\n\
             //\n\
             \n\
             #include <vector>\n"
        );
    }

    #[test]
    fn write_artifact_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let name = artifact_name(FACTORY_STEM, "cpp");
        std::fs::write(dir.path().join(&name), "stale").unwrap();

        let path = write_artifact(dir.path(), &name, "fresh").unwrap();
        assert_eq!(path, dir.path().join("Factory.cpp"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_artifact_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("gen").join("src");
        let path = write_artifact(&nested, "BlockExecutionTestAuto.cpp", "body").unwrap();
        assert!(path.is_file());
    }
}
