//! `patchfile` parses the common textual diff dialects — normal, ed,
//! context, new-context, unified, and git-extended unified including binary
//! payloads — into a structured representation of each patch's header,
//! hunks, and line operations.
//!
//! The parser detects each dialect from a small leading context and
//! tolerates the usual damage patches pick up in transit: indentation,
//! CR line endings, RFC-934 `"- "` mail quoting, `#` comment lines, and
//! chopped trailing blanks. It neither applies nor generates patches, and
//! the hunk bodies of context, new-context and git-binary patches are
//! recognized but not parsed.
//!
//! ```
//! use patchfile::{read_patch_file, DiffType, LineBuffer, Patch, Reader};
//!
//! let input = "\
//! --- a/greeting\t2020-01-01 00:00:00 +0000
//! +++ b/greeting\t2020-01-01 00:00:01 +0000
//! @@ -1,2 +1,2 @@
//!  hello
//! -world
//! +WORLD
//! ";
//! let mut reader = Reader::new(LineBuffer::from(input));
//! let patch_file = read_patch_file(&mut reader, DiffType::Any, true).unwrap();
//! assert_eq!(patch_file.patches.len(), 1);
//! assert!(matches!(patch_file.patches[0], Patch::Unified(_)));
//! ```

mod errors;
mod header;
mod hunks;
mod lexical;
mod model;
mod patchfile;
mod reader;
mod timestamp;

pub use errors::PatchError;
pub use lexical::{ed_command, fetchmode, parse_c_name, parse_name, unescape_c_string};
pub use model::{
    Change, ChangeOp, DiffType, FileHeader, FileInfo, Header, Hunk, Patch, PatchBody, PatchFile,
};
pub use patchfile::read_patch_file;
pub use reader::{LineBuffer, LineSource, Reader, StreamSource};
pub use timestamp::{epoch, DateUnparseable};
