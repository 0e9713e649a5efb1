//! The validation gate: admission rules for submitted files.
//!
//! Validation is all-or-nothing per submission. If any file in the
//! newly submitted set fails a rule, the whole submission is rejected
//! with a single error naming the violated rule, and the previously
//! accepted batch (if any) is left untouched. Only metadata is
//! inspected; file content is never opened here.

use mediabatch_common::{MediaKind, SourceFile, ValidationError};

/// Validate a submitted set of files against the rules for `kind`.
///
/// Rules:
/// - every file's MIME type must match the kind (`image/` or `video/` prefix)
/// - every file must be within the kind's size limit
///   (20 MiB for images, 200 MiB for videos)
///
/// # Errors
///
/// Returns the first violation found; no partial admission.
pub fn validate_submission(
    kind: MediaKind,
    files: &[SourceFile],
) -> Result<(), ValidationError> {
    if files.is_empty() {
        return Err(ValidationError::Empty);
    }

    for file in files {
        if !kind.matches_mime(&file.mime) {
            return Err(ValidationError::WrongKind {
                name: file.name.clone(),
                mime: file.mime.clone(),
                expected: kind,
            });
        }
        if file.size() > kind.size_limit() {
            return Err(ValidationError::TooLarge {
                name: file.name.clone(),
                size: file.size(),
                limit: kind.size_limit(),
            });
        }
    }

    Ok(())
}
