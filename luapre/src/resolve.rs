//! Evaluator/resolver.
//!
//! Walks the block tree depth-first in document order, running scripts and
//! testing guards against the live environment.  Each conditional is
//! annotated with the [`Branch`] it selected; only the selected branch is
//! descended into, so scripts inside a dropped branch never run.

use tracing::debug;

use crate::error::Error;
use crate::script::Interpreter;
use crate::source::Document;
use crate::tree::{Block, Branch};

/// Resolve `blocks` in place.  The first failing script or guard aborts the
/// walk.
pub fn resolve<I>(blocks: &mut [Block<'_>], interp: &mut I, doc: &Document) -> Result<(), Error>
where
    I: Interpreter + ?Sized,
{
    for block in blocks.iter_mut() {
        match block {
            Block::Literal(_) => {}
            Block::Script(script) => {
                let chunk = doc.chunk_name(script.offset);
                debug!(%chunk, level = script.level, "lua > {}", script.source.trim());
                interp
                    .exec(script.source, &chunk)
                    .map_err(|e| Error::from_script(e, script.offset))?;
            }
            Block::Conditional(cond) => {
                let chunk = doc.chunk_name(cond.offset);
                let truthy = interp
                    .test(cond.guard, &chunk)
                    .map_err(|e| Error::from_script(e, cond.offset))?;

                let branch = match (truthy, cond.else_blocks.is_some()) {
                    (true, _) => Branch::Then,
                    (false, true) => Branch::Else,
                    (false, false) => Branch::Neither,
                };
                debug!(%chunk, guard = cond.guard, ?branch, "resolved conditional");
                cond.branch = Some(branch);

                match branch {
                    Branch::Then => resolve(&mut cond.then_blocks, interp, doc)?,
                    Branch::Else => {
                        if let Some(else_blocks) = cond.else_blocks.as_mut() {
                            resolve(else_blocks, interp, doc)?;
                        }
                    }
                    Branch::Neither => {}
                }
            }
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
