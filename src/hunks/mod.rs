pub(crate) mod ed;
pub(crate) mod normal;
pub(crate) mod unified;

use crate::errors::PatchError;
use crate::model::{Hunk, Patch};
use crate::reader::{LineSource, Reader};

// Context, new-context and git-binary bodies are recognized by the dialect
// discriminator but not parsed; their hunk parser declines immediately and
// scanning resumes after the recognition point.
fn decline<S: LineSource>(_reader: &mut Reader<S>) -> Result<Option<Hunk>, PatchError> {
    Ok(None)
}

impl Patch {
    /// Run this dialect's hunk parser until it declines, appending each
    /// parsed hunk. A malformed hunk stops accumulation; the patch keeps
    /// the hunks parsed before it. Only I/O errors propagate.
    pub(crate) fn parse_hunks<S: LineSource>(
        &mut self,
        reader: &mut Reader<S>,
    ) -> Result<(), PatchError> {
        if self.body().begin.is_none() {
            self.body_mut().begin = Some(reader.get_pos(0));
        }
        loop {
            let parsed = match self {
                Patch::Normal(_) => normal::parse(reader),
                Patch::Ed(_) => ed::parse(reader),
                Patch::Unified(_) => unified::parse(reader),
                Patch::Context(_) | Patch::NewContext(_) | Patch::GitBinary(_) => decline(reader),
            };
            match parsed {
                Ok(Some(hunk)) => self.body_mut().hunks.push(hunk),
                Ok(None) => break,
                Err(PatchError::Io(err)) => return Err(err.into()),
                Err(_) => break,
            }
        }
        self.body_mut().end = Some(reader.get_pos(-1));
        Ok(())
    }
}
