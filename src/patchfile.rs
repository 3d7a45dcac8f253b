use crate::errors::PatchError;
use crate::header;
use crate::model::{DiffType, FileHeader, PatchFile};
use crate::reader::{LineSource, Reader};

/// Parse every patch in the stream behind `reader`.
///
/// `diff_type` restricts which dialects may be detected (`DiffType::Any`
/// leaves detection unrestricted); `need_header` requires a filename header
/// before headerless normal/ed hunks are admissible (it is implied off for
/// `DiffType::Normal` and `DiffType::Ed`).
///
/// The region before the first patch is preserved verbatim as the
/// preamble; an input containing no patch at all yields zero patches and
/// the whole stream as preamble. Malformed hunks and truncated input
/// degrade to a partial result — only I/O errors are returned.
pub fn read_patch_file<S: LineSource>(
    reader: &mut Reader<S>,
    diff_type: DiffType,
    need_header: bool,
) -> Result<PatchFile, PatchError> {
    let startpos = reader.get_pos(0);
    let mut patch_file = PatchFile::default();
    let mut preamble: Option<FileHeader> = None;

    while let Some(next) = header::next_patch(
        reader,
        diff_type,
        need_header,
        &mut patch_file.revision,
    )? {
        let header::NextPatch { mut patch, start } = next;
        reader.set_pos(start)?;
        patch.parse_hunks(reader)?;
        if preamble.is_none() {
            let end = patch.header().begin;
            preamble = Some(FileHeader {
                lines: reader.get_raw_lines(startpos, end)?,
            });
        }
        patch_file.patches.push(patch);
    }

    patch_file.preamble = match preamble {
        Some(preamble) => preamble,
        None => FileHeader {
            lines: reader.get_raw_lines(startpos, None)?,
        },
    };
    Ok(patch_file)
}
