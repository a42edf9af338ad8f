/*!
Flat-file persistence.

Three stores, one per concern:

  * [`accounts::AccountStore`] — the four role-partitioned account maps.
  * [`requests::RequestStore`] — aid requests in one JSON document.
  * [`docs::DocumentStore`] — attachment bodies under `uploads/`.

All three load once at startup and persist synchronously after each
mutation. Rewrites go through a fresh file handle so a failed open
leaves the old file intact; there is no write batching and no journal.
*/
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

pub mod accounts;
pub mod docs;
pub mod requests;

use crate::request::Status;

/// Everything that can go wrong in a store operation.
///
/// Load-time parse failures never surface as `Parse` from a store
/// `load`; they are logged and the offending record skipped. The
/// variant exists for the conversions and for callers that decode
/// single records themselves.
#[derive(Debug, PartialEq)]
pub enum StoreError {
    Parse(String),
    DuplicateKey(String),
    NotFound(String),
    DepartmentMismatch { department: String, aid_type: String },
    AlreadyDecided { request_id: String, status: Status },
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StoreError::Parse(msg) => write!(f, "parse error: {}", msg),
            StoreError::DuplicateKey(key) => write!(
                f, "key {:?} already exists", key
            ),
            StoreError::NotFound(key) => write!(
                f, "no record with key {:?}", key
            ),
            StoreError::DepartmentMismatch { department, aid_type } => write!(
                f,
                "a {} reviewer cannot decide a {} request",
                department, aid_type
            ),
            StoreError::AlreadyDecided { request_id, status } => write!(
                f, "request {} has already been {}", request_id, status
            ),
            StoreError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> StoreError {
        StoreError::Io(format!("{}", &e))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> StoreError {
        StoreError::Parse(format!("{}", &e))
    }
}

/// Appends one record line to a backing file, creating it if absent.
///
/// This is the cheap path for insert-only mutations; anything that can
/// touch an existing line goes through [`rewrite_lines`] instead.
pub(crate) fn append_line(path: &Path, line: &str) -> Result<(), StoreError> {
    log::trace!("append_line( {:?}, {:?} ) called.", path, line);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Regenerates a backing file from the current in-memory records.
///
/// Opens the destination fresh and truncates; the caller holds the
/// records, so a crash mid-write is recovered by reloading the file on
/// next start.
pub(crate) fn rewrite_lines<I>(path: &Path, lines: I) -> Result<(), StoreError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    log::trace!("rewrite_lines( {:?} ) called.", path);

    let mut buff = String::new();
    for line in lines {
        writeln!(&mut buff, "{}", line.as_ref())
            .map_err(|e| StoreError::Io(format!("{}", &e)))?;
    }

    let mut file = File::create(path)?;
    file.write_all(buff.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    #[test]
    fn append_then_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt");

        append_line(&path, "one:1").unwrap();
        append_line(&path, "two:2").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one:1\ntwo:2\n");

        rewrite_lines(&path, ["three:3"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "three:3\n");
    }

    #[test]
    fn error_display() {
        let e = StoreError::DepartmentMismatch {
            department: "Counseling".to_owned(),
            aid_type: "Counselling".to_owned(),
        };
        assert_eq!(
            format!("{}", &e),
            "a Counseling reviewer cannot decide a Counselling request"
        );
    }
}
