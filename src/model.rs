use std::rc::Rc;

use chrono::{DateTime, FixedOffset};

use crate::lexical;
use crate::timestamp;

/// The operation performed by one hunk body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Delete,
    Add,
    Context,
}

impl ChangeOp {
    /// The leading character this operation carries in a unified hunk.
    pub fn as_char(self) -> char {
        match self {
            ChangeOp::Delete => '-',
            ChangeOp::Add => '+',
            ChangeOp::Context => ' ',
        }
    }
}

/// An atomic hunk line: an operation and its text payload, without the
/// leading operation character. The trailing newline is retained.
///
/// Changes are immutable once constructed. Context changes are shared
/// between the source and destination sequences of their hunk, so they are
/// handled behind `Rc`; `Rc::ptr_eq` tests that sharing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub op: ChangeOp,
    pub text: String,
}

impl Change {
    pub fn new(op: ChangeOp, text: impl Into<String>) -> Self {
        Change {
            op,
            text: text.into(),
        }
    }
}

/// A contiguous change region: positional metadata plus the ordered source
/// and destination line sequences. `begin`/`end` locate the hunk in the
/// input stream as line positions.
#[derive(Debug, Default)]
pub struct Hunk {
    pub srcline: Option<usize>,
    pub dstline: Option<usize>,
    pub section: Option<String>,
    pub src: Vec<Rc<Change>>,
    pub dst: Vec<Rc<Change>>,
    pub begin: Option<usize>,
    pub end: Option<usize>,
}

/// Per-side file metadata accumulated from header lines.
#[derive(Debug, Clone, Default)]
pub struct FileInfo {
    pub name: Option<String>,
    pub timestr: Option<String>,
    pub stamp: Option<DateTime<FixedOffset>>,
    pub mode: Option<u32>,
    pub copy: bool,
    pub rename: bool,
}

impl FileInfo {
    /// Record the file name. The name `/dev/null` appears in patches
    /// regardless of how the null device is spelled locally; it marks the
    /// file as nonexistent and pins the stamp to the epoch.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = match name {
            Some(name) if name == "/dev/null" => {
                self.stamp = Some(timestamp::epoch());
                None
            }
            Some(name) if name.is_empty() => None,
            other => other,
        };
    }

    /// Record the verbatim timestamp text and, when the collaborator can
    /// interpret it, the parsed stamp. Parse failure is not an error.
    pub fn set_timestr(&mut self, timestr: Option<&str>) {
        self.timestr = None;
        self.stamp = None;
        if let Some(timestr) = timestr {
            let timestr = timestr.trim_end();
            if !timestr.is_empty() {
                self.stamp = timestamp::parse(timestr).ok();
                self.timestr = Some(timestr.to_string());
            }
        }
    }

    /// Split a header suffix like `path\ttimestamp` and record both parts.
    pub fn set_spec(&mut self, spec: &str) {
        let (name, timestr) = lexical::parse_name(spec, true);
        self.set_timestr(Some(&timestr));
        self.set_name(name);
    }
}

/// The filename/metadata header of one patch: both sides' file info, the
/// optional `Index:` label, and the line range the header occupies.
#[derive(Debug, Default)]
pub struct Header {
    pub old: FileInfo,
    pub new: FileInfo,
    pub index: Option<String>,
    pub begin: Option<usize>,
    pub end: Option<usize>,
}

/// The patch dialects this parser recognizes. `Any` is accepted by
/// [`read_patch_file`](crate::read_patch_file) to leave detection
/// unrestricted; parsed patches always carry a concrete dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    Any,
    Context,
    Normal,
    Ed,
    NewContext,
    Unified,
    GitBinary,
}

/// Header, hunks and stream positions common to every patch dialect.
#[derive(Debug, Default)]
pub struct PatchBody {
    pub header: Header,
    pub hunks: Vec<Hunk>,
    pub begin: Option<usize>,
    pub end: Option<usize>,
}

/// One parsed patch, tagged by dialect.
///
/// Context, new-context and git-binary patches are recognized but their
/// hunk bodies are not parsed; they carry an empty hunk list.
#[derive(Debug)]
pub enum Patch {
    Normal(PatchBody),
    Ed(PatchBody),
    Context(PatchBody),
    NewContext(PatchBody),
    Unified(PatchBody),
    GitBinary(PatchBody),
}

impl Patch {
    pub(crate) fn new(diff_type: DiffType, header: Header) -> Self {
        let body = PatchBody {
            begin: header.begin,
            header,
            ..Default::default()
        };
        match diff_type {
            DiffType::Normal => Patch::Normal(body),
            DiffType::Ed => Patch::Ed(body),
            DiffType::Context => Patch::Context(body),
            DiffType::NewContext => Patch::NewContext(body),
            DiffType::Unified => Patch::Unified(body),
            DiffType::GitBinary => Patch::GitBinary(body),
            DiffType::Any => unreachable!("a patch always has a concrete dialect"),
        }
    }

    pub fn diff_type(&self) -> DiffType {
        match self {
            Patch::Normal(_) => DiffType::Normal,
            Patch::Ed(_) => DiffType::Ed,
            Patch::Context(_) => DiffType::Context,
            Patch::NewContext(_) => DiffType::NewContext,
            Patch::Unified(_) => DiffType::Unified,
            Patch::GitBinary(_) => DiffType::GitBinary,
        }
    }

    pub fn body(&self) -> &PatchBody {
        match self {
            Patch::Normal(body)
            | Patch::Ed(body)
            | Patch::Context(body)
            | Patch::NewContext(body)
            | Patch::Unified(body)
            | Patch::GitBinary(body) => body,
        }
    }

    pub(crate) fn body_mut(&mut self) -> &mut PatchBody {
        match self {
            Patch::Normal(body)
            | Patch::Ed(body)
            | Patch::Context(body)
            | Patch::NewContext(body)
            | Patch::Unified(body)
            | Patch::GitBinary(body) => body,
        }
    }

    pub fn header(&self) -> &Header {
        &self.body().header
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.body().hunks
    }

    pub fn begin(&self) -> Option<usize> {
        self.body().begin
    }

    pub fn end(&self) -> Option<usize> {
        self.body().end
    }
}

/// The raw line region preceding the first patch, preserved verbatim so the
/// original stream can be reconstructed around the parsed patches.
#[derive(Debug, Default)]
pub struct FileHeader {
    pub lines: Vec<String>,
}

/// The result of parsing one input stream: the preamble, the patches in
/// stream order, and the revision named by a `Prereq:` line if one was seen.
#[derive(Debug, Default)]
pub struct PatchFile {
    pub preamble: FileHeader,
    pub patches: Vec<Patch>,
    pub revision: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp;

    #[test]
    fn test_dev_null_collapses_and_pins_stamp_to_epoch() {
        let mut info = FileInfo::default();
        info.set_name(Some("/dev/null".to_string()));
        assert_eq!(info.name, None);
        assert_eq!(info.stamp, Some(timestamp::epoch()));
    }

    #[test]
    fn test_set_spec_splits_name_and_timestamp() {
        let mut info = FileInfo::default();
        info.set_spec("src/lib.rs\t2020-01-01 00:00:00 +0000\n");
        assert_eq!(info.name.as_deref(), Some("src/lib.rs"));
        assert_eq!(info.timestr.as_deref(), Some("2020-01-01 00:00:00 +0000"));
        assert!(info.stamp.is_some());
    }

    #[test]
    fn test_set_spec_keeps_timestr_when_date_is_unparseable() {
        let mut info = FileInfo::default();
        info.set_spec("file\tnot a date\n");
        assert_eq!(info.name.as_deref(), Some("file"));
        assert_eq!(info.timestr.as_deref(), Some("not a date"));
        assert_eq!(info.stamp, None);
    }

    #[test]
    fn test_set_spec_dev_null_wins_over_timestamp() {
        let mut info = FileInfo::default();
        info.set_spec("/dev/null\t2020-01-01 00:00:00 +0000\n");
        assert_eq!(info.name, None);
        assert_eq!(info.stamp, Some(timestamp::epoch()));
    }

    #[test]
    fn test_change_op_chars() {
        assert_eq!(ChangeOp::Delete.as_char(), '-');
        assert_eq!(ChangeOp::Add.as_char(), '+');
        assert_eq!(ChangeOp::Context.as_char(), ' ');
    }
}
