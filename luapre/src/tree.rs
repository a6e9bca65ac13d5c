//! Block tree builder.
//!
//! Turns the flat token stream into nested [`Block`]s.  Depth is data: every
//! directive token carries its level, and the builder keeps an explicit stack
//! of open conditionals keyed by that level, so an inner `end` can never
//! close an outer block.

use crate::error::{Error, ErrorKind};
use crate::scan::{Token, TokenKind};

/// Which child sequence of a conditional contributes to output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Then,
    Else,
    /// Falsy guard and no else branch.
    Neither,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block<'a> {
    /// Host text, emitted verbatim.
    Literal(&'a str),
    /// Executed once for its side effects on the environment.
    Script(Script<'a>),
    Conditional(Conditional<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script<'a> {
    pub source: &'a str,
    pub level: usize,
    /// Byte offset of the directive's opening marker.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional<'a> {
    pub guard: &'a str,
    pub level: usize,
    pub offset: usize,
    pub then_blocks: Vec<Block<'a>>,
    pub else_blocks: Option<Vec<Block<'a>>>,
    /// Set by the resolver; `None` until then (and for conditionals inside
    /// branches that were never selected).
    pub branch: Option<Branch>,
}

/// Build the root block sequence from `tokens`.
pub fn build(tokens: Vec<Token<'_>>) -> Result<Vec<Block<'_>>, Error> {
    let mut builder = Builder::default();
    let mut tokens = tokens.into_iter();
    while let Some(tok) = tokens.next() {
        let offset = tok.span.start;
        match tok.kind {
            TokenKind::Literal(text) => builder.push(Block::Literal(text)),
            TokenKind::ScriptOpen { level, source } => {
                match tokens.next().map(|t| t.kind) {
                    Some(TokenKind::ScriptClose { level: close }) if close == level => {}
                    _ => {
                        return Err(unbalanced(
                            format!("script block at level {level} is not closed at the same level"),
                            offset,
                        ))
                    }
                }
                builder.push(Block::Script(Script {
                    source,
                    level,
                    offset,
                }));
            }
            TokenKind::ScriptClose { level } => {
                return Err(unbalanced(
                    format!("script close at level {level} without an open script"),
                    offset,
                ))
            }
            TokenKind::CondOpen { level, guard } => builder.open(level, guard, offset, false)?,
            TokenKind::CondElseIf { level, guard } => {
                builder.switch_to_else(level, "elseif", offset)?;
                builder.open(level, guard, offset, true)?;
            }
            TokenKind::CondElse { level } => builder.switch_to_else(level, "else", offset)?,
            TokenKind::CondClose { level } => builder.close(level, offset)?,
        }
    }
    builder.finish()
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// A conditional still being collected.
struct Frame<'a> {
    cond: Conditional<'a>,
    in_else: bool,
    /// Opened by `elseif`: closes together with its parent.
    chained: bool,
}

#[derive(Default)]
struct Builder<'a> {
    root: Vec<Block<'a>>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Builder<'a> {
    /// Append to whatever sequence is currently collecting.
    fn push(&mut self, block: Block<'a>) {
        match self.stack.last_mut() {
            None => self.root.push(block),
            Some(frame) if frame.in_else => frame
                .cond
                .else_blocks
                .get_or_insert_with(Vec::new)
                .push(block),
            Some(frame) => frame.cond.then_blocks.push(block),
        }
    }

    fn open(&mut self, level: usize, guard: &'a str, offset: usize, chained: bool) -> Result<(), Error> {
        if let Some(top) = self.stack.last() {
            // An elseif reopens at its own conditional's level; that frame is
            // the chain parent, not an enclosing block.
            let enclosing = top.cond.level;
            if level <= enclosing && !(chained && level == enclosing) {
                return Err(unbalanced(
                    format!(
                        "conditional at level {level} nested inside level {enclosing}; \
                         inner directives need more sigils than their enclosing block"
                    ),
                    offset,
                ));
            }
        }
        self.stack.push(Frame {
            cond: Conditional {
                guard,
                level,
                offset,
                then_blocks: Vec::new(),
                else_blocks: None,
                branch: None,
            },
            in_else: false,
            chained,
        });
        Ok(())
    }

    fn switch_to_else(&mut self, level: usize, what: &str, offset: usize) -> Result<(), Error> {
        let Some(top) = self.stack.last_mut() else {
            return Err(Error::new(
                ErrorKind::UnexpectedElse(format!("`{what}` at level {level} outside any conditional")),
                offset,
            ));
        };
        if top.cond.level != level {
            return Err(unbalanced(
                format!(
                    "`{what}` at level {level} but the innermost open conditional is at level {}",
                    top.cond.level
                ),
                offset,
            ));
        }
        if top.in_else {
            return Err(Error::new(
                ErrorKind::UnexpectedElse(format!(
                    "`{what}` at level {level} after this conditional's else branch"
                )),
                offset,
            ));
        }
        top.in_else = true;
        top.cond.else_blocks = Some(Vec::new());
        Ok(())
    }

    fn close(&mut self, level: usize, offset: usize) -> Result<(), Error> {
        let Some(mut frame) = self.stack.pop() else {
            return Err(unbalanced(format!("`end` at level {level} with nothing open"), offset));
        };
        if frame.cond.level != level {
            let open = frame.cond.level;
            self.stack.push(frame);
            return Err(unbalanced(
                format!("`end` at level {level} but the innermost open conditional is at level {open}"),
                offset,
            ));
        }
        // Fold an elseif chain back into the conditional that started it.
        while frame.chained {
            let block = Block::Conditional(frame.cond);
            let Some(parent) = self.stack.pop() else {
                return Err(unbalanced(format!("`elseif` at level {level} without its `if`"), offset));
            };
            frame = parent;
            frame
                .cond
                .else_blocks
                .get_or_insert_with(Vec::new)
                .push(block);
        }
        self.push(Block::Conditional(frame.cond));
        Ok(())
    }

    fn finish(self) -> Result<Vec<Block<'a>>, Error> {
        // The bottom frame is the outermost unclosed conditional; chained
        // frames always sit above the `if` that began their chain.
        if let Some(frame) = self.stack.into_iter().next() {
            return Err(Error::new(
                ErrorKind::UnterminatedBlock(format!(
                    "`if {}` at level {} is never closed by `end`",
                    frame.cond.guard, frame.cond.level
                )),
                frame.cond.offset,
            ));
        }
        Ok(self.root)
    }
}

fn unbalanced(msg: String, offset: usize) -> Error {
    Error::new(ErrorKind::UnbalancedDirective(msg), offset)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{scan, Syntax};

    fn tree(src: &str) -> Vec<Block<'_>> {
        build(scan(src, &Syntax::default()).expect("scan failed")).expect("build failed")
    }

    fn tree_err(src: &str) -> Error {
        build(scan(src, &Syntax::default()).expect("scan failed")).expect_err("expected build error")
    }

    fn cond<'b, 'a>(b: &'b Block<'a>) -> &'b Conditional<'a> {
        match b {
            Block::Conditional(c) => c,
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn literal_only() {
        assert_eq!(tree("abc"), vec![Block::Literal("abc")]);
    }

    #[test]
    fn script_leaf() {
        let blocks = tree("\"\"\"%x = 1%\"\"\"rest");
        assert!(matches!(&blocks[0], Block::Script(s) if s.source == "x = 1" && s.offset == 0));
        assert_eq!(blocks[1], Block::Literal("rest"));
    }

    #[test]
    fn if_else_end() {
        let blocks = tree("<\"\"\"%if a then%\"\"\"A\"\"\"%else%\"\"\"B\"\"\"%end%\"\"\">");
        assert_eq!(blocks.len(), 3);
        let c = cond(&blocks[1]);
        assert_eq!(c.guard, "a");
        assert_eq!(c.then_blocks, vec![Block::Literal("A")]);
        assert_eq!(c.else_blocks, Some(vec![Block::Literal("B")]));
        assert_eq!(blocks[2], Block::Literal(">"));
    }

    #[test]
    fn if_without_else_has_no_else_branch() {
        let blocks = tree("\"\"\"%if a then%\"\"\"A\"\"\"%end%\"\"\"");
        assert!(cond(&blocks[0]).else_blocks.is_none());
    }

    #[test]
    fn empty_else_is_present_but_empty() {
        let blocks = tree("\"\"\"%if a then%\"\"\"A\"\"\"%else%\"\"\"\"\"\"%end%\"\"\"");
        assert_eq!(cond(&blocks[0]).else_blocks, Some(vec![]));
    }

    #[test]
    fn nested_levels() {
        let src = "\"\"\"%if a then%\"\"\"\
                   x\"\"\"%%if b then%%\"\"\"y\"\"\"%%end%%\"\"\"z\
                   \"\"\"%else%\"\"\"w\"\"\"%end%\"\"\"";
        let blocks = tree(src);
        assert_eq!(blocks.len(), 1);
        let outer = cond(&blocks[0]);
        assert_eq!(outer.then_blocks.len(), 3);
        let inner = cond(&outer.then_blocks[1]);
        assert_eq!(inner.guard, "b");
        assert_eq!(inner.level, 2);
        assert_eq!(inner.then_blocks, vec![Block::Literal("y")]);
        assert_eq!(outer.else_blocks, Some(vec![Block::Literal("w")]));
    }

    #[test]
    fn three_deep() {
        let src = "\"\"\"%if a then%\"\"\"\"\"\"%%if b then%%\"\"\"\"\"\"%%%if c then%%%\"\"\"deep\
                   \"\"\"%%%end%%%\"\"\"\"\"\"%%end%%\"\"\"\"\"\"%end%\"\"\"";
        let blocks = tree(src);
        let a = cond(&blocks[0]);
        let b = cond(&a.then_blocks[0]);
        let c = cond(&b.then_blocks[0]);
        assert_eq!(c.then_blocks, vec![Block::Literal("deep")]);
    }

    #[test]
    fn elseif_chain_nests_in_else() {
        let src = "\"\"\"%if a then%\"\"\"A\"\"\"%elseif b then%\"\"\"B\
                   \"\"\"%else%\"\"\"C\"\"\"%end%\"\"\"tail";
        let blocks = tree(src);
        assert_eq!(blocks.len(), 2);
        let a = cond(&blocks[0]);
        assert_eq!(a.then_blocks, vec![Block::Literal("A")]);
        let else_blocks = a.else_blocks.as_ref().unwrap();
        assert_eq!(else_blocks.len(), 1);
        let b = cond(&else_blocks[0]);
        assert_eq!(b.guard, "b");
        assert_eq!(b.then_blocks, vec![Block::Literal("B")]);
        assert_eq!(b.else_blocks, Some(vec![Block::Literal("C")]));
        assert_eq!(blocks[1], Block::Literal("tail"));
    }

    #[test]
    fn unmatched_end_is_unbalanced() {
        let err = tree_err("text\"\"\"%end%\"\"\"");
        assert!(matches!(err.kind, ErrorKind::UnbalancedDirective(_)));
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn end_at_wrong_level_is_unbalanced() {
        let err = tree_err("\"\"\"%if a then%\"\"\"\"\"\"%%end%%\"\"\"");
        assert!(matches!(err.kind, ErrorKind::UnbalancedDirective(_)));
    }

    #[test]
    fn nested_conditional_needs_more_sigils() {
        let err = tree_err("\"\"\"%if a then%\"\"\"\"\"\"%if b then%\"\"\"\"\"\"%end%\"\"\"\"\"\"%end%\"\"\"");
        assert!(matches!(err.kind, ErrorKind::UnbalancedDirective(m) if m.contains("more sigils")));
    }

    #[test]
    fn scripts_may_use_any_level_inside_conditionals() {
        let blocks = tree("\"\"\"%if a then%\"\"\"\"\"\"%x = 1%\"\"\"\"\"\"%end%\"\"\"");
        assert!(matches!(&cond(&blocks[0]).then_blocks[0], Block::Script(_)));
    }

    #[test]
    fn orphan_else() {
        let err = tree_err("\"\"\"%else%\"\"\"");
        assert!(matches!(err.kind, ErrorKind::UnexpectedElse(_)));
    }

    #[test]
    fn duplicate_else() {
        let err = tree_err("\"\"\"%if a then%\"\"\"\"\"\"%else%\"\"\"\"\"\"%else%\"\"\"\"\"\"%end%\"\"\"");
        assert!(matches!(err.kind, ErrorKind::UnexpectedElse(_)));
    }

    #[test]
    fn else_at_wrong_level_is_unbalanced() {
        let err = tree_err("\"\"\"%if a then%\"\"\"\"\"\"%%else%%\"\"\"\"\"\"%end%\"\"\"");
        assert!(matches!(err.kind, ErrorKind::UnbalancedDirective(_)));
    }

    #[test]
    fn unclosed_if_is_unterminated() {
        let err = tree_err("ab\"\"\"%if a then%\"\"\"body");
        assert!(matches!(err.kind, ErrorKind::UnterminatedBlock(_)));
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn unclosed_inner_reports_outermost() {
        let err = tree_err("\"\"\"%if a then%\"\"\"x\"\"\"%%if b then%%\"\"\"");
        assert!(matches!(err.kind, ErrorKind::UnterminatedBlock(m) if m.contains("if a")));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn unclosed_elseif_reports_chain_start() {
        let err = tree_err("\"\"\"%if a then%\"\"\"\"\"\"%elseif b then%\"\"\"");
        assert!(matches!(err.kind, ErrorKind::UnterminatedBlock(m) if m.contains("if a")));
    }
}
