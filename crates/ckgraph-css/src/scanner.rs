//! Lexical preparation and block structure of a stylesheet.
//!
//! The scanner does not parse declarations. It blanks out everything that
//! could contain braces or selector-like text without being structure
//! (comments, strings, attribute selectors) and then splits the source into
//! statements: rule preludes and at-rules, each with its line.

/// At-rules whose blocks hold ordinary rules
pub const GROUP_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "layer",
    "container",
    "scope",
    "starting-style",
];

/// At-rules whose blocks are not selector rules; contents are ignored
pub const SKIPPED_AT_RULES: &[&str] = &["keyframes", "font-face", "page"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `selector { declarations }`
    Rule,
    /// A rule inside another rule's block, as in `.card { .title { } }`
    NestedRule,
    /// `@media (...) { rules }`
    GroupAtRule,
    /// `@keyframes name { ... }` and any other at-rule with a block
    SkippedAtRule,
    /// Block-less at-rule such as `@import`
    AtStatement,
    /// A block nested deeper than the limit; it is not entered
    TooDeep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    /// Prelude with strings and attribute selectors blanked
    pub prelude: String,
    /// The same prelude with only comments removed
    pub raw: String,
    /// Line of the prelude's first character
    pub line: usize,
}

impl Statement {
    /// Lowercase at-keyword without the `@`
    pub fn at_keyword(&self) -> Option<String> {
        let rest = self.prelude.strip_prefix('@')?;
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '(' || c == '"' || c == '\'')
            .unwrap_or(rest.len());
        Some(rest[..end].to_ascii_lowercase())
    }

    /// Prelude text on one line
    pub fn condensed(&self) -> String {
        self.raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Two views of the source with the same byte layout as the original:
/// `raw` has comments blanked, `masked` additionally blanks string contents
/// and attribute selectors. Newlines are kept in both.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub raw: String,
    pub masked: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Comment,
    Str { quote: char, in_brackets: bool },
    Brackets,
}

pub fn prepare(source: &str) -> Prepared {
    let mut raw = String::with_capacity(source.len());
    let mut masked = String::with_capacity(source.len());
    let mut state = State::Normal;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    blank(&mut raw, "/*");
                    blank(&mut masked, "/*");
                    state = State::Comment;
                }
                '"' | '\'' => {
                    raw.push(c);
                    masked.push(c);
                    state = State::Str {
                        quote: c,
                        in_brackets: false,
                    };
                }
                '[' => {
                    raw.push(c);
                    masked.push(c);
                    state = State::Brackets;
                }
                _ => {
                    raw.push(c);
                    masked.push(c);
                }
            },
            State::Comment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    blank(&mut raw, "*/");
                    blank(&mut masked, "*/");
                    state = State::Normal;
                } else {
                    blank_char(&mut raw, c);
                    blank_char(&mut masked, c);
                }
            }
            State::Str { quote, in_brackets } => {
                raw.push(c);
                let back = if in_brackets { State::Brackets } else { State::Normal };
                if c == quote {
                    if in_brackets {
                        blank_char(&mut masked, c);
                    } else {
                        masked.push(c);
                    }
                    state = back;
                } else if c == '\n' {
                    // Unterminated string ends at the line break
                    masked.push(c);
                    state = back;
                } else if c == '\\' {
                    blank_char(&mut masked, c);
                    if let Some(escaped) = chars.next() {
                        raw.push(escaped);
                        blank_char(&mut masked, escaped);
                    }
                } else {
                    blank_char(&mut masked, c);
                }
            }
            State::Brackets => {
                raw.push(c);
                match c {
                    ']' => {
                        masked.push(c);
                        state = State::Normal;
                    }
                    '"' | '\'' => {
                        blank_char(&mut masked, c);
                        state = State::Str {
                            quote: c,
                            in_brackets: true,
                        };
                    }
                    _ => blank_char(&mut masked, c),
                }
            }
        }
    }

    Prepared { raw, masked }
}

fn blank(out: &mut String, text: &str) {
    for c in text.chars() {
        blank_char(out, c);
    }
}

fn blank_char(out: &mut String, c: char) {
    if c == '\n' {
        out.push('\n');
    } else {
        out.extend(std::iter::repeat(' ').take(c.len_utf8()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    /// Top level or a grouping at-rule: holds rules
    Rules,
    /// A rule's body: declarations and nested rules
    Declarations,
    /// Contents that are not scanned
    Opaque,
}

/// Split a prepared stylesheet into statements, in source order.
pub fn scan(prepared: &Prepared, max_depth: usize) -> Vec<Statement> {
    let masked = prepared.masked.as_str();
    let lines = LineIndex::new(masked);
    let mut statements = Vec::new();
    let mut stack: Vec<Block> = Vec::new();
    let mut start = 0;

    let in_rules = |stack: &[Block]| stack.last().map_or(true, |b| *b == Block::Rules);

    for (i, byte) in masked.bytes().enumerate() {
        match byte {
            b'{' => {
                let parent = stack.last().copied().unwrap_or(Block::Rules);
                let statement = slice(prepared, &lines, start, i);
                let block = match statement {
                    _ if parent == Block::Opaque => Block::Opaque,
                    Some(mut statement) if stack.len() >= max_depth => {
                        statement.kind = StatementKind::TooDeep;
                        statements.push(statement);
                        Block::Opaque
                    }
                    Some(mut statement) if statement.prelude.starts_with('@') => {
                        let keyword = statement.at_keyword().unwrap_or_default();
                        let group = GROUP_AT_RULES.contains(&keyword.as_str());
                        statement.kind = if group {
                            StatementKind::GroupAtRule
                        } else {
                            StatementKind::SkippedAtRule
                        };
                        statements.push(statement);
                        // A grouping rule nested in a style rule holds declarations
                        if group {
                            parent
                        } else {
                            Block::Opaque
                        }
                    }
                    Some(mut statement) => {
                        if parent == Block::Declarations {
                            statement.kind = StatementKind::NestedRule;
                        }
                        statements.push(statement);
                        Block::Declarations
                    }
                    None => Block::Declarations,
                };
                stack.push(block);
                start = i + 1;
            }
            b'}' => {
                stack.pop();
                start = i + 1;
            }
            b';' => {
                if in_rules(&stack) {
                    at_statement(prepared, &lines, start, i, &mut statements);
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_rules(&stack) {
        at_statement(prepared, &lines, start, masked.len(), &mut statements);
    }
    statements
}

fn at_statement(prepared: &Prepared, lines: &LineIndex, start: usize, end: usize, out: &mut Vec<Statement>) {
    if let Some(mut statement) = slice(prepared, lines, start, end) {
        if statement.prelude.starts_with('@') {
            statement.kind = StatementKind::AtStatement;
            out.push(statement);
        }
    }
}

/// The trimmed prelude between two structural characters, as a `Rule`.
fn slice(prepared: &Prepared, lines: &LineIndex, start: usize, end: usize) -> Option<Statement> {
    let text = &prepared.masked[start..end];
    let lead = text.len() - text.trim_start().len();
    let prelude = text.trim();
    if prelude.is_empty() {
        return None;
    }
    let from = start + lead;
    let to = from + prelude.len();
    Some(Statement {
        kind: StatementKind::Rule,
        prelude: prelude.to_string(),
        raw: prepared.raw[from..to].to_string(),
        line: lines.line_at(from),
    })
}

/// Byte offset to 1-based line number
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.bytes().enumerate().filter(|(_, b)| *b == b'\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_at(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}
