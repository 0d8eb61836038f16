//! Validation of outbound content.

use std::fmt;

use crate::outbound::{OutboundAttachments, OutboundDraft};

/// Maximum length of outbound text, in characters.
pub const MAX_TEXT_LENGTH: usize = 4096;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Neither text nor attachments.
    EmptyMessage,
    /// Text longer than the provider accepts.
    TooLong { max: usize, actual: usize },
    /// An attachment without a path.
    EmptyAttachmentPath,
    /// A file attachment set with no files in it.
    EmptyFileList,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyMessage => write!(f, "message has no text or attachments"),
            ValidationError::TooLong { max, actual } => {
                write!(f, "text is too long ({} chars, max {})", actual, max)
            }
            ValidationError::EmptyAttachmentPath => write!(f, "attachment path cannot be empty"),
            ValidationError::EmptyFileList => write!(f, "file attachment list cannot be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate replacement text for an edit.
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    check_length(text)
}

/// Validate a draft before it is sent.
///
/// A draft needs non-blank text, an attachment set, or both.
pub fn validate_draft(draft: &OutboundDraft) -> Result<(), ValidationError> {
    let text = draft.text.as_deref().map(str::trim).filter(|t| !t.is_empty());

    match &draft.attachments {
        OutboundAttachments::None => {
            if text.is_none() {
                return Err(ValidationError::EmptyMessage);
            }
        }
        OutboundAttachments::Files(files) => {
            if files.is_empty() {
                return Err(ValidationError::EmptyFileList);
            }
            if files.iter().any(|f| f.path.trim().is_empty()) {
                return Err(ValidationError::EmptyAttachmentPath);
            }
        }
        OutboundAttachments::Voice(voice) => {
            if voice.path.trim().is_empty() {
                return Err(ValidationError::EmptyAttachmentPath);
            }
        }
    }

    match draft.text.as_deref() {
        Some(text) => check_length(text),
        None => Ok(()),
    }
}

fn check_length(text: &str) -> Result<(), ValidationError> {
    let actual = text.chars().count();
    if actual > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            max: MAX_TEXT_LENGTH,
            actual,
        });
    }
    Ok(())
}
