//! Text assembler.
//!
//! Concatenates literal text verbatim and, for each conditional, the
//! assembled text of the branch the resolver selected.  Scripts and
//! unselected branches contribute nothing; directive syntax never reaches the
//! output because it never became a literal block.

use crate::tree::{Block, Branch};

/// Assemble a resolved block sequence.
pub fn assemble(blocks: &[Block<'_>]) -> String {
    let mut out = String::new();
    assemble_into(blocks, &mut out);
    out
}

fn assemble_into(blocks: &[Block<'_>], out: &mut String) {
    for block in blocks {
        match block {
            Block::Literal(text) => out.push_str(text),
            Block::Script(_) => {}
            Block::Conditional(cond) => match cond.branch {
                Some(Branch::Then) => assemble_into(&cond.then_blocks, out),
                Some(Branch::Else) => {
                    if let Some(else_blocks) = &cond.else_blocks {
                        assemble_into(else_blocks, out);
                    }
                }
                Some(Branch::Neither) | None => {}
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Conditional, Script};

    fn cond<'a>(branch: Option<Branch>, then_blocks: Vec<Block<'a>>, else_blocks: Option<Vec<Block<'a>>>) -> Block<'a> {
        Block::Conditional(Conditional {
            guard: "g",
            level: 1,
            offset: 0,
            then_blocks,
            else_blocks,
            branch,
        })
    }

    #[test]
    fn literals_concatenate_in_order() {
        let blocks = vec![Block::Literal("a"), Block::Literal("b")];
        assert_eq!(assemble(&blocks), "ab");
    }

    #[test]
    fn scripts_emit_nothing() {
        let blocks = vec![
            Block::Literal("x"),
            Block::Script(Script {
                source: "y = 1",
                level: 1,
                offset: 1,
            }),
            Block::Literal("z"),
        ];
        assert_eq!(assemble(&blocks), "xz");
    }

    #[test]
    fn selected_branch_only() {
        let then_b = vec![Block::Literal("T")];
        let else_b = Some(vec![Block::Literal("E")]);
        assert_eq!(assemble(&[cond(Some(Branch::Then), then_b.clone(), else_b.clone())]), "T");
        assert_eq!(assemble(&[cond(Some(Branch::Else), then_b.clone(), else_b.clone())]), "E");
        assert_eq!(assemble(&[cond(Some(Branch::Neither), then_b.clone(), None)]), "");
        assert_eq!(assemble(&[cond(None, then_b, else_b)]), "");
    }

    #[test]
    fn nested_selection() {
        let inner = cond(Some(Branch::Else), vec![Block::Literal("no")], Some(vec![Block::Literal("yes")]));
        let outer = cond(Some(Branch::Then), vec![Block::Literal("<"), inner, Block::Literal(">")], None);
        assert_eq!(assemble(&[Block::Literal("["), outer, Block::Literal("]")]), "[<yes>]");
    }
}
