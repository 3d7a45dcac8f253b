use crate::errors::PatchError;
use crate::lexical::{self, GIT_INDEX_REGEX, NORMAL_CMD_REGEX};
use crate::model::{DiffType, Header, Patch};
use crate::reader::{LineSource, Reader};

/// The next patch found by the header scan: a skeleton patch carrying the
/// accumulated header, and the position its hunk parsing starts from.
pub(crate) struct NextPatch {
    pub(crate) patch: Patch,
    pub(crate) start: usize,
}

/// Strip up to `nesting` levels of RFC-934 `"- "` mail quoting.
fn dequote(line: &str, nesting: usize) -> &str {
    let mut line = line;
    let mut nesting = nesting;
    while nesting > 0 && line.starts_with("- ") {
        line = &line[2..];
        nesting -= 1;
    }
    line
}

/// Scan forward from the reader's position for the next patch, accumulating
/// header fields until a hunk trigger decides the dialect.
///
/// Lines are consumed raw (indent-stripped, CR-aware) and classified by
/// their lead prefix; most prefixes fill in header fields, and a few decide
/// the dialect and end the scan. Ed commands are only *noted* until their
/// terminating `.` confirms the dialect; git extended headers with no
/// following hunks form a header-only unified patch. Returns `None` when
/// the stream runs out with no patch found.
pub(crate) fn next_patch<S: LineSource>(
    reader: &mut Reader<S>,
    diff_type: DiffType,
    mut need_header: bool,
    revision: &mut Option<String>,
) -> Result<Option<NextPatch>, PatchError> {
    // Ed and normal format patches don't have filename headers.
    if matches!(diff_type, DiffType::Ed | DiffType::Normal) {
        need_header = false;
    }

    let mut hdr = Header::default();
    let mut edcmdpos: Option<usize> = None;
    let mut git_diff = false;
    let mut exthdrs = false;
    let mut found: Option<(DiffType, usize)> = None;

    reader.rfc934_nesting = 0;

    while found.is_none() {
        match reader.get_raw_line() {
            Ok(true) => {}
            // Truncated input ends the scan like end-of-stream does.
            Ok(false) | Err(PatchError::TruncatedInput { .. }) => break,
            Err(err) => return Err(err),
        }
        let mut indent = reader.strip_indent();
        let stripped = reader.line.clone();
        let strip_cr = stripped.ends_with("\r\n");
        // Once a `--- ` marker has fixed the mail-quoting level, classify
        // subsequent lines with the quoting removed.
        let mut line = dequote(&stripped, reader.rfc934_nesting).to_string();

        if matches!(diff_type, DiffType::Any | DiffType::Normal)
            && !need_header
            && NORMAL_CMD_REGEX.is_match(&line)
        {
            reader.strip_cr = strip_cr;
            // A command line alone is ambiguous; peek at the next line for
            // a normal hunk body before committing.
            match reader.get_raw_line() {
                Ok(true) => {}
                Ok(false) | Err(PatchError::TruncatedInput { .. }) => break,
                Err(err) => return Err(err),
            }
            indent = reader.strip_indent();
            let peeked = reader.line.clone();
            line = dequote(&peeked, reader.rfc934_nesting).to_string();
            if line.starts_with("< ") || line.starts_with("> ") {
                reader.indent = indent;
                found = Some((DiffType::Normal, reader.get_pos(-2)));
            }
        } else if matches!(diff_type, DiffType::Any | DiffType::Ed)
            && !need_header
            && edcmdpos.is_none()
            && lexical::ed_command(&line).is_some()
        {
            // Not confirmed until the terminating '.' shows up; note the
            // position and keep scanning.
            edcmdpos = Some(reader.get_pos(-1));
            reader.indent = indent;
            reader.strip_cr = strip_cr;
        } else if matches!(
            diff_type,
            DiffType::Any | DiffType::Context | DiffType::NewContext
        ) && line.starts_with("*** ")
        {
            hdr.begin = Some(reader.get_pos(-1));
            // The context file syntax lists the new name first; old and new
            // are swapped when the star divider confirms the dialect.
            hdr.new.set_spec(&line[4..]);
            need_header = false;
        } else if let Some(spec) = line.strip_prefix("+++ ") {
            hdr.new.set_spec(spec);
            reader.strip_cr = strip_cr;
            need_header = false;
        } else if let Some(value) = line.strip_prefix("Index:") {
            if hdr.begin.is_none() {
                hdr.begin = Some(reader.get_pos(-1));
            }
            let value = value.trim_start();
            hdr.index = if value.starts_with('"') {
                match lexical::parse_c_name(value) {
                    (Some(name), _) => Some(name),
                    (None, _) => Some(value.trim_end().to_string()),
                }
            } else {
                Some(value.trim_end().to_string())
            };
            reader.strip_cr = strip_cr;
            need_header = false;
        } else if let Some(value) = line.strip_prefix("Prereq:") {
            if hdr.begin.is_none() {
                hdr.begin = Some(reader.get_pos(-1));
            }
            if let Some(token) = value.split_whitespace().next() {
                *revision = Some(token.to_string());
            }
        } else if matches!(diff_type, DiffType::Any | DiffType::Unified)
            && line.starts_with("diff --git ")
        {
            if exthdrs {
                // The previous git entry had extended headers but no hunks;
                // close it out and revisit this line on the next scan.
                hdr.end = Some(reader.get_pos(-2));
                found = Some((DiffType::Unified, reader.get_pos(-1)));
            } else {
                hdr.begin = Some(reader.get_pos(-1));
                hdr.old.name = None;
                hdr.new.name = None;
                let (old_name, rest) = lexical::parse_name(&line[11..], false);
                if let (Some(old_name), false) = (old_name, rest.is_empty()) {
                    let (new_name, rest) = lexical::parse_name(rest.trim_start(), false);
                    if let (Some(new_name), true) = (new_name, rest.trim().is_empty()) {
                        hdr.old.set_name(Some(old_name));
                        hdr.new.set_name(Some(new_name));
                    }
                }
                git_diff = true;
                need_header = false;
            }
        } else if git_diff && line.starts_with("index ") {
            if let Some(caps) = GIT_INDEX_REGEX.captures(line[6..].trim_end()) {
                if let Some(mode) = caps.get(1) {
                    let mode = lexical::fetchmode(mode.as_str());
                    hdr.old.mode = Some(mode);
                    hdr.new.mode = Some(mode);
                }
                exthdrs = true;
            }
        } else if git_diff && line.starts_with("old mode ") {
            hdr.old.mode = Some(lexical::fetchmode(&line[9..]));
            exthdrs = true;
        } else if git_diff && line.starts_with("new mode ") {
            hdr.new.mode = Some(lexical::fetchmode(&line[9..]));
            exthdrs = true;
        } else if let Some(mode) = line.strip_prefix("deleted file mode ") {
            if git_diff {
                hdr.old.mode = Some(lexical::fetchmode(mode));
                exthdrs = true;
            }
        } else if let Some(mode) = line.strip_prefix("new file mode ") {
            if git_diff {
                hdr.new.mode = Some(lexical::fetchmode(mode));
                exthdrs = true;
            }
        } else if git_diff && line.starts_with("rename from ") {
            hdr.old.rename = true;
            exthdrs = true;
        } else if git_diff && line.starts_with("rename to ") {
            hdr.new.rename = true;
            exthdrs = true;
        } else if git_diff && line.starts_with("copy from ") {
            hdr.old.copy = true;
            exthdrs = true;
        } else if git_diff && line.starts_with("copy to ") {
            hdr.new.copy = true;
            exthdrs = true;
        } else if git_diff && line.starts_with("GIT binary patch") {
            hdr.end = Some(reader.get_pos(-2));
            found = Some((DiffType::GitBinary, reader.get_pos(-1)));
        } else {
            // Count RFC-934 quoting on the un-dequoted text; this marker is
            // where the nesting level is inferred from.
            let mut i = 0;
            while stripped[i..].starts_with("- ") {
                i += 2;
            }
            if let Some(spec) = stripped[i..].strip_prefix("--- ") {
                if hdr.begin.is_none() {
                    hdr.begin = Some(reader.get_pos(-1));
                }
                hdr.old.set_spec(spec);
                // Only a real old-file marker (its timestamp parses) is
                // trusted to establish the quoting level.
                if hdr.old.stamp.is_some() {
                    reader.rfc934_nesting = i / 2;
                }
                reader.strip_cr = strip_cr;
                need_header = false;
            }
        }

        if !need_header {
            if let (Some(pos), true) = (edcmdpos, line == ".\n") {
                found = Some((DiffType::Ed, pos));
            } else if matches!(diff_type, DiffType::Any | DiffType::Unified)
                && line.starts_with("@@ -")
            {
                reader.indent = indent;
                hdr.end = Some(reader.get_pos(-2));
                found = Some((DiffType::Unified, reader.get_pos(-1)));
            } else if matches!(
                diff_type,
                DiffType::Any | DiffType::Context | DiffType::NewContext
            ) && line.starts_with("********")
            {
                let previndent = indent;
                match reader.get_raw_line() {
                    Ok(true) => {}
                    Ok(false) | Err(PatchError::TruncatedInput { .. }) => break,
                    Err(err) => return Err(err),
                }
                let indent = reader.strip_indent();
                let peeked = reader.line.clone();
                let second = dequote(&peeked, reader.rfc934_nesting);
                if previndent == indent && second.starts_with("*** ") {
                    // The names were recorded backwards; swap them now that
                    // the divider has confirmed a context dialect.
                    std::mem::swap(&mut hdr.old, &mut hdr.new);
                    reader.indent = indent;
                    reader.strip_cr = strip_cr;
                    hdr.end = Some(reader.get_pos(-2));
                    // A new-style context header ends in a star.
                    let dialect = if second.ends_with("*\n") || second.ends_with("*\r\n") {
                        DiffType::NewContext
                    } else {
                        DiffType::Context
                    };
                    found = Some((dialect, reader.get_pos(-1)));
                }
            }
        }
    }

    let (dialect, start) = match found {
        Some(found) => found,
        None => {
            if let Some(pos) = edcmdpos {
                // Nothing but deletes: the terminating '.' never appeared.
                (DiffType::Ed, pos)
            } else if exthdrs {
                hdr.end = Some(reader.get_pos(-1));
                (DiffType::Unified, reader.get_pos(0))
            } else {
                return Ok(None);
            }
        }
    };

    // Normal and ed patches carry no header lines; pin the header to the
    // patch start so the preamble region stays well-defined.
    if hdr.begin.is_none() {
        hdr.begin = Some(start);
    }
    Ok(Some(NextPatch {
        patch: Patch::new(dialect, hdr),
        start,
    }))
}
