use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use crate::errors::PatchError;

/// A positioned source of raw patch lines.
///
/// Positions are line numbers; `seek_line` accepts any previously visited
/// position. Lines are returned verbatim, terminators included.
pub trait LineSource {
    fn pos(&self) -> usize;
    fn seek_line(&mut self, pos: usize) -> Result<(), PatchError>;
    fn next_line(&mut self) -> Result<Option<String>, PatchError>;
    fn raw_lines(&mut self, start: usize, end: Option<usize>) -> Result<Vec<String>, PatchError>;
}

/// An in-memory line source. Positions are indices into the line vector.
#[derive(Debug, Default)]
pub struct LineBuffer {
    lines: Vec<String>,
    lineno: usize,
}

impl LineBuffer {
    pub fn new(lines: Vec<String>) -> Self {
        LineBuffer { lines, lineno: 0 }
    }
}

impl From<&str> for LineBuffer {
    fn from(input: &str) -> Self {
        LineBuffer::new(input.split_inclusive('\n').map(String::from).collect())
    }
}

impl LineSource for LineBuffer {
    fn pos(&self) -> usize {
        self.lineno
    }

    fn seek_line(&mut self, pos: usize) -> Result<(), PatchError> {
        self.lineno = pos;
        Ok(())
    }

    fn next_line(&mut self) -> Result<Option<String>, PatchError> {
        match self.lines.get(self.lineno) {
            Some(line) => {
                self.lineno += 1;
                Ok(Some(line.clone()))
            }
            None => Ok(None),
        }
    }

    fn raw_lines(&mut self, start: usize, end: Option<usize>) -> Result<Vec<String>, PatchError> {
        let end = end.unwrap_or(self.lines.len()).min(self.lines.len());
        Ok(self.lines[start.min(end)..end].to_vec())
    }
}

/// A line source over a seekable byte stream.
///
/// A line-to-byte-offset index grows monotonically as lines are first
/// visited, so seeking back to any previously seen line is O(1). Reading
/// past the end of the index extends it.
pub struct StreamSource<R: Read + Seek> {
    inner: BufReader<R>,
    lineno: usize,
    line2pos: Vec<u64>,
}

impl<R: Read + Seek> StreamSource<R> {
    pub fn new(inner: R) -> Result<Self, PatchError> {
        let mut inner = BufReader::new(inner);
        let start = inner.stream_position()?;
        Ok(StreamSource {
            inner,
            lineno: 0,
            line2pos: vec![start],
        })
    }
}

impl<R: Read + Seek> LineSource for StreamSource<R> {
    fn pos(&self) -> usize {
        self.lineno
    }

    fn seek_line(&mut self, pos: usize) -> Result<(), PatchError> {
        self.inner.seek(SeekFrom::Start(self.line2pos[pos]))?;
        self.lineno = pos;
        Ok(())
    }

    fn next_line(&mut self) -> Result<Option<String>, PatchError> {
        let mut line = String::new();
        if self.inner.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        self.lineno += 1;
        if self.line2pos.len() <= self.lineno {
            self.line2pos.push(self.inner.stream_position()?);
        }
        Ok(Some(line))
    }

    fn raw_lines(&mut self, start: usize, end: Option<usize>) -> Result<Vec<String>, PatchError> {
        let oldpos = self.lineno;
        self.seek_line(start)?;
        let mut lines = Vec::new();
        while end.map_or(true, |end| self.lineno < end) {
            match self.next_line()? {
                Some(line) => lines.push(line),
                None => break,
            }
        }
        self.seek_line(oldpos)?;
        Ok(lines)
    }
}

/// Measure the indentation prefix of `line`, counting a tab as advancing to
/// the next multiple of `tab_size` and a space (or literal 'X') as one
/// column, stopping once `limit` columns have been reached. Returns the
/// indent width and the byte length of the prefix.
fn measure_indent(line: &str, limit: usize, tab_size: usize) -> (usize, usize) {
    let mut width = 0;
    for (i, byte) in line.bytes().enumerate() {
        if width >= limit {
            return (width, i);
        }
        match byte {
            b'\t' => width += tab_size - width % tab_size,
            b' ' | b'X' => width += 1,
            _ => return (width, i),
        }
    }
    (width, line.len())
}

/// Line-at-a-time patch input with backtracking.
///
/// `get_line` applies the post-processing pipeline — indentation stripping
/// up to `indent` columns, removal of `rfc934_nesting` levels of `"- "` mail
/// quoting, `#` comment skipping, and CR stripping — and leaves the result
/// in `line`. `get_raw_line` bypasses everything but comment skipping.
///
/// Backtracking is by position token only: a caller that rejects a peeked
/// line restores it with `set_pos(get_pos(-1))`.
pub struct Reader<S> {
    source: S,
    pub tab_size: usize,
    pub indent: usize,
    pub rfc934_nesting: usize,
    pub strip_cr: bool,
    pub line: String,
}

impl<S: LineSource> Reader<S> {
    pub fn new(source: S) -> Self {
        Reader {
            source,
            tab_size: 8,
            indent: 0,
            rfc934_nesting: 0,
            strip_cr: false,
            line: String::new(),
        }
    }

    /// Replace the input, keeping the processing configuration.
    pub fn set(&mut self, source: S) {
        self.source = source;
        self.line.clear();
    }

    /// The current position, shifted by `lineoff` lines.
    pub fn get_pos(&self, lineoff: isize) -> usize {
        self.source.pos().saturating_add_signed(lineoff)
    }

    pub fn set_pos(&mut self, pos: usize) -> Result<(), PatchError> {
        self.source.seek_line(pos)
    }

    fn pget_line(
        &mut self,
        indent: usize,
        rfc934_nesting: usize,
        strip_cr: bool,
        skip_comments: bool,
    ) -> Result<bool, PatchError> {
        loop {
            let raw = match self.source.next_line()? {
                Some(raw) => raw,
                None => return Ok(false),
            };

            let (_, mut i) = measure_indent(&raw, indent, self.tab_size);
            let mut nesting = rfc934_nesting;
            while nesting > 0 && raw[i..].starts_with("- ") {
                i += 2;
                nesting -= 1;
            }
            if skip_comments && raw[i..].starts_with('#') {
                continue;
            }
            if !raw.ends_with('\n') {
                return Err(PatchError::TruncatedInput {
                    line: self.source.pos(),
                });
            }
            self.line = if strip_cr && raw.ends_with("\r\n") {
                let mut line = raw[i..raw.len() - 2].to_string();
                line.push('\n');
                line
            } else {
                raw[i..].to_string()
            };
            return Ok(true);
        }
    }

    /// Fetch the next line through the post-processing pipeline. Returns
    /// false at end of input.
    pub fn get_line(&mut self, skip_comments: bool) -> Result<bool, PatchError> {
        self.pget_line(self.indent, self.rfc934_nesting, self.strip_cr, skip_comments)
    }

    /// Fetch the next line without indent, quoting or CR processing.
    /// Comment lines are still skipped.
    pub fn get_raw_line(&mut self) -> Result<bool, PatchError> {
        self.pget_line(0, 0, false, true)
    }

    /// The verbatim line range `[start, end)`, or from `start` to the end
    /// of input when `end` is `None`.
    pub fn get_raw_lines(
        &mut self,
        start: usize,
        end: Option<usize>,
    ) -> Result<Vec<String>, PatchError> {
        self.source.raw_lines(start, end)
    }

    /// Strip all leading indentation from the current line and return its
    /// width in columns.
    pub fn strip_indent(&mut self) -> usize {
        let (width, i) = measure_indent(&self.line, usize::MAX, self.tab_size);
        self.line.drain(..i);
        width
    }
}
