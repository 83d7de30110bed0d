//! In-memory build contexts.
//!
//! An image build takes its context as a tar stream. Tests describe the
//! context as a handful of named files, so the archive is assembled in
//! memory rather than from a directory on disk.

use mqfixture_common::constants::BUILD_CONTEXT_FILE_MODE;
use mqfixture_common::error::{FixtureError, Result};

/// A single file of a build context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    /// Path of the file inside the context.
    pub name: String,
    /// File contents.
    pub body: String,
}

impl ContextFile {
    /// Creates a context file.
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// Packs the files into a tar archive, one entry per file with mode 0600,
/// in the order given.
///
/// # Errors
///
/// Returns an error if an entry name is not a valid archive path.
pub fn pack(files: &[ContextFile]) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    for file in files {
        let data = file.body.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(BUILD_CONTEXT_FILE_MODE);
        header.set_cksum();
        builder
            .append_data(&mut header, &file.name, data)
            .map_err(|e| FixtureError::io(&file.name, e))?;
    }
    tracing::debug!(entries = files.len(), "build context packed");
    builder
        .into_inner()
        .map_err(|e| FixtureError::io("build context", e))
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn entries(archive: &[u8]) -> Vec<(String, u32, String)> {
        let mut reader = tar::Archive::new(archive);
        reader
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let name = entry.path().unwrap().to_string_lossy().into_owned();
                let mode = entry.header().mode().unwrap();
                let mut body = String::new();
                let _ = entry.read_to_string(&mut body).unwrap();
                (name, mode, body)
            })
            .collect()
    }

    #[test]
    fn single_dockerfile_entry() {
        let archive = pack(&[ContextFile::new("Dockerfile", "FROM scratch")]).unwrap();
        assert_eq!(
            entries(&archive),
            vec![("Dockerfile".into(), 0o600, "FROM scratch".into())]
        );
    }

    #[test]
    fn preserves_order_and_nested_paths() {
        let archive = pack(&[
            ContextFile::new("Dockerfile", "FROM mq\nCOPY etc/mqm /etc/mqm"),
            ContextFile::new("etc/mqm/20-config.mqsc", "DEFINE QLOCAL(Q1)"),
        ])
        .unwrap();
        let names: Vec<_> = entries(&archive).into_iter().map(|(n, _, _)| n).collect();
        assert_eq!(names, vec!["Dockerfile", "etc/mqm/20-config.mqsc"]);
    }

    #[test]
    fn empty_file_set_is_a_valid_archive() {
        let archive = pack(&[]).unwrap();
        assert!(entries(&archive).is_empty());
    }

    #[test]
    fn rejects_parent_directory_paths() {
        assert!(pack(&[ContextFile::new("../escape", "x")]).is_err());
    }
}
