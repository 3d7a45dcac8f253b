use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::PatchError;
use crate::model::{Change, ChangeOp, Hunk};
use crate::reader::{LineSource, Reader};

// Unified hunk header format. See
// https://www.gnu.org/software/diffutils/manual/html_node/Detailed-Unified.html
lazy_static! {
    static ref UNIFIED_HUNK_REGEX: Regex =
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(?: (.*))?").unwrap();
}

/// Given a reader positioned at a candidate `@@ -S[,P] +D[,R] @@` line,
/// consume the whole hunk and return it, or back the reader up and decline.
///
/// The body loop enforces the declared line counts and tolerates two
/// well-known mail-transport corruptions: trailing blank lines chopped off
/// entirely (a blank context line is synthesized while fewer than three
/// replacement lines remain) and context lines whose leading space was
/// eaten (a line opening with `\t` or `\n` counts as context with the full
/// line as payload).
pub(crate) fn parse<S: LineSource>(reader: &mut Reader<S>) -> Result<Option<Hunk>, PatchError> {
    if !reader.get_line(true)? {
        return Ok(None);
    }
    let parsed = UNIFIED_HUNK_REGEX.captures(&reader.line).map(|caps| {
        (
            caps[1].parse::<usize>().unwrap(),
            caps.get(2).map(|m| m.as_str().parse::<usize>().unwrap()),
            caps[3].parse::<usize>().unwrap(),
            caps.get(4).map(|m| m.as_str().parse::<usize>().unwrap()),
            caps.get(5).map(|m| m.as_str().to_string()),
        )
    });
    let (mut srcline, declared_ptrn, mut dstline, declared_repl, section) = match parsed {
        Some(parsed) => parsed,
        None => {
            reader.set_pos(reader.get_pos(-1))?;
            return Ok(None);
        }
    };

    // A declared count of zero means the line number is the anchor *after*
    // which to insert, not a line of the hunk itself.
    let mut ptrn_lines = declared_ptrn.unwrap_or(1);
    if declared_ptrn == Some(0) {
        srcline += 1;
    }
    let mut repl_lines = declared_repl.unwrap_or(1);
    if declared_repl == Some(0) {
        dstline += 1;
    }

    let mut hunk = Hunk {
        begin: Some(reader.get_pos(-1)),
        srcline: Some(srcline),
        dstline: Some(dstline),
        section,
        ..Default::default()
    };

    while ptrn_lines > 0 || repl_lines > 0 {
        let fetched = match reader.get_line(true) {
            Ok(fetched) => fetched,
            Err(PatchError::TruncatedInput { .. }) => false,
            Err(err) => return Err(err),
        };
        let line = if !fetched || reader.line.is_empty() {
            if repl_lines < 3 {
                // Assume trailing blank lines got chopped in transit.
                " \n".to_string()
            } else {
                return Err(PatchError::HunkUnderrun {
                    line: reader.get_pos(0),
                });
            }
        } else {
            reader.line.clone()
        };

        match line.as_bytes()[0] {
            b'-' => {
                if ptrn_lines == 0 {
                    return Err(PatchError::HunkOverrun {
                        line: reader.get_pos(-1),
                        op: '-',
                    });
                }
                ptrn_lines -= 1;
                hunk.src
                    .push(Rc::new(Change::new(ChangeOp::Delete, &line[1..])));
            }
            b'+' => {
                if repl_lines == 0 {
                    return Err(PatchError::HunkOverrun {
                        line: reader.get_pos(-1),
                        op: '+',
                    });
                }
                repl_lines -= 1;
                hunk.dst.push(Rc::new(Change::new(ChangeOp::Add, &line[1..])));
            }
            first @ (b' ' | b'=' | b'\t' | b'\n') => {
                if ptrn_lines == 0 || repl_lines == 0 {
                    return Err(PatchError::HunkOverrun {
                        line: reader.get_pos(-1),
                        op: ' ',
                    });
                }
                ptrn_lines -= 1;
                repl_lines -= 1;
                // '=' is an alternate context marker some generators emit;
                // a tab or newline first byte means the leading space was
                // eaten and the whole line is the payload.
                let text = match first {
                    b'\t' | b'\n' => line.as_str(),
                    _ => &line[1..],
                };
                let change = Rc::new(Change::new(ChangeOp::Context, text));
                hunk.src.push(Rc::clone(&change));
                hunk.dst.push(change);
            }
            _ => {
                return Err(PatchError::HunkUnderrun {
                    line: reader.get_pos(-1),
                });
            }
        }
    }
    hunk.end = Some(reader.get_pos(-1));
    Ok(Some(hunk))
}
