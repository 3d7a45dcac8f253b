use crate::errors::PatchError;
use crate::lexical;
use crate::model::Hunk;
use crate::reader::{LineSource, Reader};

/// Given a reader positioned at a candidate ed command line, consume the
/// hunk and return it, or back the reader up and decline.
///
/// `d` and `s/.//` commands are complete on their command line. `a`, `i`
/// and `c` commands carry a body that runs to a lone `.`; body lines are
/// literal text, so comment skipping is off while consuming them.
pub(crate) fn parse<S: LineSource>(reader: &mut Reader<S>) -> Result<Option<Hunk>, PatchError> {
    if !reader.get_line(true)? {
        return Ok(None);
    }
    let command = match lexical::ed_command(&reader.line) {
        Some(command) => command,
        None => {
            reader.set_pos(reader.get_pos(-1))?;
            return Ok(None);
        }
    };
    let mut hunk = Hunk {
        begin: Some(reader.get_pos(-1)),
        ..Default::default()
    };
    if command == 'd' || command == 's' {
        hunk.end = hunk.begin;
        return Ok(Some(hunk));
    }
    loop {
        if !reader.get_line(false)? {
            return Err(PatchError::HunkUnderrun {
                line: reader.get_pos(0),
            });
        }
        if reader.line == ".\n" {
            hunk.end = Some(reader.get_pos(-1));
            return Ok(Some(hunk));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::LineBuffer;

    fn reader(input: &str) -> Reader<LineBuffer> {
        Reader::new(LineBuffer::from(input))
    }

    #[test]
    fn test_append_command_runs_to_dot() {
        let mut reader = reader("3a\nfoo\nbar\n.\n");
        let hunk = parse(&mut reader).unwrap().unwrap();
        assert_eq!(hunk.begin, Some(0));
        assert_eq!(hunk.end, Some(3));
    }

    #[test]
    fn test_delete_command_is_single_line() {
        let mut reader = reader("5d\nnext\n");
        let hunk = parse(&mut reader).unwrap().unwrap();
        assert_eq!(hunk.begin, Some(0));
        assert_eq!(hunk.end, Some(0));
        assert!(reader.get_line(true).unwrap());
        assert_eq!(reader.line, "next\n");
    }

    #[test]
    fn test_substitute_command_is_single_line() {
        let mut reader = reader("12s/.//\n");
        let hunk = parse(&mut reader).unwrap().unwrap();
        assert_eq!(hunk.end, hunk.begin);
    }

    #[test]
    fn test_body_keeps_comment_lines() {
        // '#' lines inside an append body are payload, not comments.
        let mut reader = reader("1a\n# literal\n.\n");
        let hunk = parse(&mut reader).unwrap().unwrap();
        assert_eq!(hunk.end, Some(2));
    }

    #[test]
    fn test_unterminated_body_is_an_underrun() {
        let mut reader = reader("1a\nno terminator\n");
        assert!(matches!(
            parse(&mut reader),
            Err(PatchError::HunkUnderrun { .. })
        ));
    }

    #[test]
    fn test_non_command_backtracks() {
        let mut reader = reader("plain text\n");
        assert!(parse(&mut reader).unwrap().is_none());
        assert!(reader.get_line(true).unwrap());
        assert_eq!(reader.line, "plain text\n");
    }
}
