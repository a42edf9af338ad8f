/*!
`DocumentStore`: attachment bodies under the managed `uploads/`
directory.

Requests reference their documents by base-directory-relative paths
(`uploads/<name>`), never absolute ones, so the whole data directory
can move between machines without breaking a stored request.
*/
use std::path::{Path, PathBuf};

use rand::{distributions, Rng};

use super::StoreError;

pub const UPLOADS_DIR: &str = "uploads";

const DEFAULT_SUFFIX_LENGTH: usize = 8;
const DEFAULT_SUFFIX_CHARS: &str =
"abcdefghijklmnopqrstuvwxyz0123456789";

pub struct DocumentStore {
    base_dir: PathBuf,
    suffix_chars: Vec<char>,
    suffix_length: usize,
}

impl DocumentStore {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        log::trace!(
            "DocumentStore::new( {:?} ) called.", base_dir.as_ref()
        );

        let suffix_chars: Vec<char> = DEFAULT_SUFFIX_CHARS.chars().collect();
        let suffix_length = DEFAULT_SUFFIX_LENGTH;

        Self {
            base_dir: base_dir.as_ref().to_owned(),
            suffix_chars,
            suffix_length,
        }
    }

    /// Set characters to use when generating storage-name suffixes.
    ///
    /// Will quietly do nothing if `new_chars` has zero length.
    pub fn set_suffix_chars(&mut self, new_chars: &str) {
        if !new_chars.is_empty() {
            self.suffix_chars = new_chars.chars().collect();
        }
    }

    /// Set the length of storage-name suffixes to generate.
    ///
    /// Will quietly do nothing if set to zero.
    pub fn set_suffix_length(&mut self, new_length: usize) {
        if new_length > 0 {
            self.suffix_length = new_length;
        }
    }

    /// Generate a fresh storage-name suffix based on the current values
    /// of self.suffix_chars and self.suffix_length.
    fn generate_suffix(&self) -> String {
        // self.suffix_chars should never have zero length.
        let dist = distributions::Slice::new(&self.suffix_chars).unwrap();
        let rng = rand::thread_rng();
        let new_suffix: String = rng.sample_iter(&dist)
            .take(self.suffix_length)
            .collect();
        new_suffix
    }

    /// Storage name for an uploaded file: the original name with a
    /// random suffix spliced in ahead of the extension, so two uploads
    /// of `form.pdf` never land on the same bytes.
    fn storage_name(&self, original: &Path) -> String {
        let stem = original.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_owned());
        match original.extension() {
            Some(ext) => format!(
                "{}-{}.{}", stem, self.generate_suffix(), ext.to_string_lossy()
            ),
            None => format!("{}-{}", stem, self.generate_suffix()),
        }
    }

    /// Copies a user-chosen file into managed storage.
    ///
    /// Creates `uploads/` on first use. Returns the relative reference
    /// to store in a request's `documents` list.
    pub fn attach<P: AsRef<Path>>(&self, source: P) -> Result<String, StoreError> {
        let source = source.as_ref();
        log::trace!("DocumentStore::attach( {:?} ) called.", source);

        let uploads = self.base_dir.join(UPLOADS_DIR);
        std::fs::create_dir_all(&uploads)?;

        let name = self.storage_name(source);
        std::fs::copy(source, uploads.join(&name))?;

        let rel = format!("{}/{}", UPLOADS_DIR, &name);
        log::info!("Attached {:?} as {:?}.", source, &rel);
        Ok(rel)
    }

    /// Joins a stored relative reference back onto the base directory.
    pub fn resolve(&self, rel: &str) -> Result<PathBuf, StoreError> {
        log::trace!("DocumentStore::resolve( {:?} ) called.", rel);

        let path = self.base_dir.join(rel);
        if !path.is_file() {
            return Err(StoreError::NotFound(rel.to_owned()));
        }
        Ok(path)
    }

    /// Copies a stored attachment out to a caller-chosen destination;
    /// the reviewer-facing "download" path.
    pub fn export<P: AsRef<Path>>(&self, rel: &str, dest: P) -> Result<(), StoreError> {
        let dest = dest.as_ref();
        log::trace!("DocumentStore::export( {:?}, {:?} ) called.", rel, dest);

        let source = self.resolve(rel)?;
        std::fs::copy(&source, dest)?;
        Ok(())
    }
}
