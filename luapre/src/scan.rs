//! Delimiter scanner.
//!
//! One left-to-right pass over the document, producing a flat token stream:
//! literal host text and directive markers.  A directive region is
//!
//! ```text
//! """%%  body  %%"""
//! ```
//!
//! where the fence (`"""`) and sigil (`%`) come from [`Syntax`] and the
//! number of sigils is the directive's nesting level.  The body is classified
//! by shape:
//!
//! | Body                  | Token                         |
//! |-----------------------|-------------------------------|
//! | `if <guard> then`     | [`TokenKind::CondOpen`]       |
//! | `elseif <guard> then` | [`TokenKind::CondElseIf`]     |
//! | `else`                | [`TokenKind::CondElse`]       |
//! | `end`                 | [`TokenKind::CondClose`]      |
//! | anything else         | [`TokenKind::ScriptOpen`] + [`TokenKind::ScriptClose`] |
//!
//! A fence that is not followed by a sigil is ordinary host text.

use serde::Deserialize;

use crate::error::{Error, ErrorKind};

/// Directive delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Syntax {
    pub fence: String,
    pub sigil: char,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            fence: "\"\"\"".to_owned(),
            sigil: '%',
        }
    }
}

impl Syntax {
    /// The opening marker at `level` (e.g. `"""%%` for level 2).
    pub fn open_marker(&self, level: usize) -> String {
        let mut s = self.fence.clone();
        s.extend(std::iter::repeat(self.sigil).take(level));
        s
    }

    /// The closing marker at `level` (e.g. `%%"""` for level 2).
    pub fn close_marker(&self, level: usize) -> String {
        let mut s: String = std::iter::repeat(self.sigil).take(level).collect();
        s.push_str(&self.fence);
        s
    }
}

/// Byte range into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// Host text between directives, passed through verbatim.
    Literal(&'a str),
    /// Start of a script block; `source` is the body to execute.
    ScriptOpen { level: usize, source: &'a str },
    ScriptClose { level: usize },
    CondOpen { level: usize, guard: &'a str },
    CondElseIf { level: usize, guard: &'a str },
    CondElse { level: usize },
    CondClose { level: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// Scan `src` into tokens.
///
/// Errors carry the byte offset of the offending directive's opening marker.
pub fn scan<'a>(src: &'a str, syntax: &Syntax) -> Result<Vec<Token<'a>>, Error> {
    Scanner::new(src, syntax).run()
}

// ── Scanner ───────────────────────────────────────────────────────────────────

struct Scanner<'a, 's> {
    src: &'a str,
    syntax: &'s Syntax,
    /// Start of the pending literal run.
    literal_start: usize,
    /// Where the next fence search begins.
    pos: usize,
    tokens: Vec<Token<'a>>,
}

impl<'a, 's> Scanner<'a, 's> {
    fn new(src: &'a str, syntax: &'s Syntax) -> Self {
        Self {
            src,
            syntax,
            literal_start: 0,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, Error> {
        let fence = self.syntax.fence.as_str();
        if fence.is_empty() {
            return Err(Error::new(
                ErrorKind::MalformedDirective("directive fence must not be empty".into()),
                0,
            ));
        }

        while let Some(rel) = self.src[self.pos..].find(fence) {
            let at = self.pos + rel;
            let level = self.sigil_run(at + fence.len());
            if level == 0 {
                // Plain fence (e.g. a docstring); step one char so overlapping
                // fences like `""""%` are still seen.
                self.pos = at + next_char_len(self.src, at);
                continue;
            }
            self.flush_literal(at);
            let end = self.directive(at, level)?;
            self.literal_start = end;
            self.pos = end;
        }
        self.flush_literal(self.src.len());
        Ok(self.tokens)
    }

    /// Number of consecutive sigils starting at byte `from`.
    fn sigil_run(&self, from: usize) -> usize {
        self.src[from..]
            .chars()
            .take_while(|&c| c == self.syntax.sigil)
            .count()
    }

    fn flush_literal(&mut self, end: usize) {
        if end > self.literal_start {
            self.tokens.push(Token {
                kind: TokenKind::Literal(&self.src[self.literal_start..end]),
                span: Span {
                    start: self.literal_start,
                    end,
                },
            });
        }
    }

    /// Consume the directive whose opening marker starts at `at`; returns the
    /// offset just past its closing marker.
    fn directive(&mut self, at: usize, level: usize) -> Result<usize, Error> {
        let fence = self.syntax.fence.as_str();
        let sigil_len = self.syntax.sigil.len_utf8();
        let body_start = at + fence.len() + level * sigil_len;

        let malformed = |msg: String| Error::new(ErrorKind::MalformedDirective(msg), at);

        // The region ends at the first close marker of its own level that is
        // not part of a longer sigil run; lower-level markers stay in the body.
        let close = self.syntax.close_marker(level);
        let mut from = body_start;
        let close_at = loop {
            let Some(rel) = self.src[from..].find(&close) else {
                return Err(malformed(format!(
                    "directive opened with `{}` is never closed by `{close}`",
                    self.syntax.open_marker(level)
                )));
            };
            let candidate = from + rel;
            if self.src[body_start..candidate].ends_with(self.syntax.sigil) {
                from = candidate + sigil_len;
                continue;
            }
            break candidate;
        };

        let body = &self.src[body_start..close_at];
        let end = close_at + close.len();
        let span = Span { start: at, end };

        let kinds = classify(body, level).map_err(malformed)?;
        self.tokens
            .extend(kinds.into_iter().map(|kind| Token { kind, span }));
        Ok(end)
    }
}

/// Classify a directive body by shape.
fn classify(body: &str, level: usize) -> Result<Vec<TokenKind<'_>>, String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err("empty directive".to_owned());
    }
    for shape in shapes(trimmed) {
        match shape {
            "else" => return Ok(vec![TokenKind::CondElse { level }]),
            "end" => return Ok(vec![TokenKind::CondClose { level }]),
            _ => {}
        }
        if let Some(guard) = guard_of(shape, "if") {
            return nonempty(guard, "if").map(|guard| vec![TokenKind::CondOpen { level, guard }]);
        }
        if let Some(guard) = guard_of(shape, "elseif") {
            return nonempty(guard, "elseif")
                .map(|guard| vec![TokenKind::CondElseIf { level, guard }]);
        }
    }
    Ok(vec![
        TokenKind::ScriptOpen {
            level,
            source: body,
        },
        TokenKind::ScriptClose { level },
    ])
}

/// The body as written, then with each trailing `--` line comment cut off
/// (`if x then -- note` → `if x then`).
fn shapes(s: &str) -> impl Iterator<Item = &str> {
    let cuts = s
        .match_indices("--")
        .filter(move |&(i, _)| !s[i..].contains('\n'))
        .map(move |(i, _)| s[..i].trim_end());
    std::iter::once(s).chain(cuts)
}

/// If `s` has the shape `<keyword> <guard> then`, return the raw guard.
///
/// `if x then` → `Some("x")`; `if x then y = 1 end` → `None` (that is a
/// complete Lua statement and runs as a script).
fn guard_of<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let inner = rest.strip_suffix("then")?;
    if !inner.is_empty() && !inner.ends_with(|c: char| c.is_whitespace() || c == ')') {
        return None;
    }
    Some(inner.trim())
}

fn nonempty<'a>(guard: &'a str, keyword: &str) -> Result<&'a str, String> {
    if guard.is_empty() {
        Err(format!("`{keyword}` directive has no guard expression"))
    } else {
        Ok(guard)
    }
}

fn next_char_len(s: &str, at: usize) -> usize {
    s[at..].chars().next().map(char::len_utf8).unwrap_or(1)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
