use std::rc::Rc;

use crate::errors::PatchError;
use crate::lexical::NORMAL_CMD_REGEX;
use crate::model::{Change, ChangeOp, Hunk};
use crate::reader::{LineSource, Reader};

/// Given a reader positioned at a candidate `L1[,L2](a|c|d)L3[,L4]` line,
/// consume the whole hunk and return it, or back the reader up and decline.
///
/// The pattern body is `< ` lines, the replacement body is `> ` lines, and
/// a `---` divider separates the two for `c` commands. `a` commands have no
/// pattern body; `d` commands have no replacement body (their `L3[,L4]`
/// range describes resulting positions, not lines).
pub(crate) fn parse<S: LineSource>(reader: &mut Reader<S>) -> Result<Option<Hunk>, PatchError> {
    if !reader.get_line(true)? {
        return Ok(None);
    }
    let parsed = NORMAL_CMD_REGEX.captures(&reader.line).map(|caps| {
        (
            caps[1].parse::<usize>().unwrap(),
            caps.get(2).map(|m| m.as_str().parse::<usize>().unwrap()),
            caps[3].as_bytes()[0] as char,
            caps[4].parse::<usize>().unwrap(),
            caps.get(5).map(|m| m.as_str().parse::<usize>().unwrap()),
        )
    });
    let (srcline, src_last, command, dstline, dst_last) = match parsed {
        Some(parsed) => parsed,
        None => {
            reader.set_pos(reader.get_pos(-1))?;
            return Ok(None);
        }
    };

    let ptrn_lines = match src_last {
        Some(last) => (last + 1).saturating_sub(srcline),
        None if command == 'a' => 0,
        None => 1,
    };
    let repl_lines = match dst_last {
        Some(last) => (last + 1).saturating_sub(dstline),
        None => 1,
    };

    let mut hunk = Hunk {
        begin: Some(reader.get_pos(-1)),
        srcline: Some(srcline),
        dstline: Some(dstline),
        ..Default::default()
    };

    for _ in 0..ptrn_lines {
        let text = expect_body_line(reader, '<')?;
        hunk.src.push(Rc::new(Change::new(ChangeOp::Delete, text)));
    }
    if command == 'c' {
        if !reader.get_line(true)? {
            return Err(PatchError::HunkUnderrun {
                line: reader.get_pos(0),
            });
        }
        if reader.line.trim_end() != "---" {
            return Err(PatchError::InvalidCommand {
                line: reader.get_pos(-1),
            });
        }
    }
    if command != 'd' {
        for _ in 0..repl_lines {
            let text = expect_body_line(reader, '>')?;
            hunk.dst.push(Rc::new(Change::new(ChangeOp::Add, text)));
        }
    }
    hunk.end = Some(reader.get_pos(-1));
    Ok(Some(hunk))
}

/// Consume one `< ` or `> ` body line and return its payload. A bare
/// marker with no trailing space is a blank payload whose space was
/// chopped in transit.
fn expect_body_line<S: LineSource>(
    reader: &mut Reader<S>,
    marker: char,
) -> Result<String, PatchError> {
    if !reader.get_line(true)? {
        return Err(PatchError::HunkUnderrun {
            line: reader.get_pos(0),
        });
    }
    let rest = match reader.line.strip_prefix(marker) {
        Some(rest) => rest,
        None => {
            return Err(PatchError::InvalidCommand {
                line: reader.get_pos(-1),
            })
        }
    };
    match rest.strip_prefix(' ') {
        Some(text) => Ok(text.to_string()),
        None if rest == "\n" => Ok(rest.to_string()),
        None => Err(PatchError::InvalidCommand {
            line: reader.get_pos(-1),
        }),
    }
}
