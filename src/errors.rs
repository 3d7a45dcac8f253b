use thiserror::Error;

/// Errors produced while parsing a patch stream.
///
/// Most of these degrade rather than abort: a malformed escape leaves the
/// filename unset, a hunk error stops hunk accumulation for the current patch
/// only, and truncated input ends the scan with whatever was parsed so far.
/// Only I/O errors escape [`read_patch_file`](crate::read_patch_file).
#[derive(Debug, Error)]
pub enum PatchError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A line ended at end-of-input without a terminating newline.
    #[error("line {line} is truncated (no terminating newline)")]
    TruncatedInput { line: usize },

    /// A C-string filename contained an escape sequence outside the
    /// supported set.
    #[error("invalid escape sequence '\\{seq}' in quoted filename")]
    MalformedEscape { seq: String },

    /// A hunk body ended, or hit an unclassifiable line, with its declared
    /// line counts not yet satisfied.
    #[error("hunk body ends early at line {line}")]
    HunkUnderrun { line: usize },

    /// A hunk body line appeared after its declared line count was already
    /// exhausted.
    #[error("extra '{op}' line at line {line} overruns the declared hunk length")]
    HunkOverrun { line: usize, op: char },

    /// A line that was required to be a normal or ed command did not match
    /// the command grammar.
    #[error("malformed diff command at line {line}")]
    InvalidCommand { line: usize },
}
