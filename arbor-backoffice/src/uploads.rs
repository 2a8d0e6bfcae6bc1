//! Files uploaded alongside a save request.
//!
//! An [`UploadSet`] owns the temporary files. They are removed exactly once,
//! either by an explicit [`UploadSet::cleanup`] or when the set is dropped.

use crate::config::BackofficeConfig;
use crate::error::BackofficeResult;
use arbor_model::ConversionFile;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// One temporary upload, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub property_alias: String,
    pub culture: Option<String>,
    /// File name as sent by the client.
    pub file_name: String,
    pub temp_path: PathBuf,
}

/// Scoped ownership of a request's temporary upload files.
#[derive(Debug)]
pub struct UploadSet {
    staging_dir: PathBuf,
    files: Vec<UploadedFile>,
    cleaned: bool,
}

impl Default for UploadSet {
    fn default() -> Self {
        Self::for_config(&BackofficeConfig::default())
    }
}

impl UploadSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// An empty set that stages under `config.upload_temp_dir`.
    pub fn for_config(config: &BackofficeConfig) -> Self {
        Self::in_dir(&config.upload_temp_dir)
    }

    /// An empty set that stages under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            staging_dir: dir.to_path_buf(),
            files: Vec::new(),
            cleaned: false,
        }
    }

    /// Writes `contents` to a fresh file in the staging directory and adds
    /// it to the set.
    pub fn stage(
        &mut self,
        property_alias: &str,
        culture: Option<&str>,
        file_name: &str,
        contents: &[u8],
    ) -> BackofficeResult<&UploadedFile> {
        fs::create_dir_all(&self.staging_dir)?;
        let temp_path = self.staging_dir.join(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, contents)?;
        debug!("Staged upload {} for {} at {:?}", file_name, property_alias, temp_path);
        self.files.push(UploadedFile {
            property_alias: property_alias.to_string(),
            culture: culture.map(str::to_string),
            file_name: file_name.to_string(),
            temp_path,
        });
        Ok(&self.files[self.files.len() - 1])
    }

    /// Files declared for `alias` in `culture`, with sanitised names.
    pub fn matching(&self, alias: &str, culture: Option<&str>) -> Vec<ConversionFile> {
        self.files
            .iter()
            .filter(|f| f.property_alias == alias && f.culture.as_deref() == culture)
            .map(|f| ConversionFile {
                property_alias: f.property_alias.clone(),
                culture: f.culture.clone(),
                file_name: sanitize_file_name(&f.file_name),
                temp_path: f.temp_path.clone(),
            })
            .collect()
    }

    /// Deletes the temporary files. Only the first call does any work.
    /// Returns how many files were removed.
    pub fn cleanup(&mut self) -> usize {
        if self.cleaned {
            return 0;
        }
        self.cleaned = true;

        let mut removed = 0;
        for file in &self.files {
            match fs::remove_file(&file.temp_path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Upload {:?} already gone", file.temp_path);
                }
                Err(e) => warn!("Failed to remove upload {:?}: {}", file.temp_path, e),
            }
        }
        removed
    }
}

impl Drop for UploadSet {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Makes a client-supplied file name safe to store.
///
/// Directory parts (including Windows paths sent by old browsers) are
/// stripped, characters outside `[A-Za-z0-9._-]` become `-`, runs of `-`
/// collapse, and the extension is lowercased.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();

    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        if c == '-' && cleaned.ends_with('-') {
            continue;
        }
        cleaned.push(c);
    }
    let cleaned = cleaned.trim_matches('-');

    let (stem, ext) = match cleaned.rfind('.') {
        Some(dot) => cleaned.split_at(dot),
        None => (cleaned, ""),
    };
    let stem = if stem.trim_matches('.').is_empty() { "file" } else { stem };
    let ext = if ext == "." { "" } else { ext };
    format!("{stem}{}", ext.to_ascii_lowercase())
}
