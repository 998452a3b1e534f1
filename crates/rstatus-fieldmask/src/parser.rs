//! Mask grammar: lexer and parser.

use std::fmt;

use crate::{Error, FieldKey, Mask};

/// Characters skipped between tokens.
const SPACE_CHARS: &[char] = &[' ', '\r', '\n', '\t'];

/// Longest context snippet shown in parse errors.
const MAX_CONTEXT: usize = 30;

/// How many characters before the error position the snippet starts.
const CONTEXT_BACK: usize = 12;

/// Combining enclosing square, drawn over the character at the error.
const ERROR_MARK: char = '\u{20de}';

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Comma,
    Dot,
    LeftBrace,
    RightBrace,
    Wildcard,
    Key(String),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, value) = match &self.kind {
            TokenKind::Comma => ("COMMA", ",".to_string()),
            TokenKind::Dot => ("DOT", ".".to_string()),
            TokenKind::LeftBrace => ("LBRACE", "(".to_string()),
            TokenKind::RightBrace => ("RBRACE", ")".to_string()),
            TokenKind::Wildcard => ("WILD_CARD", "*".to_string()),
            TokenKind::Key(key) => ("KEY", key.clone()),
        };
        write!(
            f,
            "Token{}({} pos {})",
            name,
            serde_json::Value::String(value),
            self.pos
        )
    }
}

fn context_around(source: &[char], pos: usize) -> String {
    let start = pos.saturating_sub(CONTEXT_BACK);
    let delta = pos - start;

    let tail: Vec<char> = source[start.min(source.len())..].to_vec();
    let mut snippet: Vec<char> = if tail.len() > MAX_CONTEXT {
        let mut cut = tail[..MAX_CONTEXT - 3].to_vec();
        cut.extend("...".chars());
        cut
    } else {
        tail
    };
    let mark_at = delta.min(snippet.len());
    snippet.insert(mark_at, ERROR_MARK);

    let marked: String = snippet.into_iter().collect();
    format!(
        "at position {} near {}",
        pos,
        serde_json::Value::String(marked)
    )
}

fn parse_error(source: &[char], pos: usize, summary: impl Into<String>) -> Error {
    Error::Parse {
        summary: summary.into(),
        position: pos,
        context: context_around(source, pos),
    }
}

struct Lexer<'a> {
    source: &'a [char],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a [char]) -> Self {
        Self { source, pos: 0 }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        while self
            .source
            .get(self.pos)
            .is_some_and(|c| SPACE_CHARS.contains(c))
        {
            self.pos += 1;
        }
        let Some(&c) = self.source.get(self.pos) else {
            return Ok(None);
        };

        let start = self.pos;
        let single = |kind| {
            Some(Token { kind, pos: start })
        };
        let token = match c {
            ',' => single(TokenKind::Comma),
            '.' => single(TokenKind::Dot),
            '(' => single(TokenKind::LeftBrace),
            ')' => single(TokenKind::RightBrace),
            '*' => single(TokenKind::Wildcard),
            '"' => return self.scan_quoted_key().map(Some),
            c if is_plain_key_char(c) => return Ok(Some(self.scan_plain_key())),
            _ => return Err(parse_error(self.source, self.pos, "unexpected symbol")),
        };
        self.pos += 1;
        Ok(token)
    }

    fn scan_plain_key(&mut self) -> Token {
        let start = self.pos;
        while self.source.get(self.pos).is_some_and(|&c| is_plain_key_char(c)) {
            self.pos += 1;
        }
        Token {
            kind: TokenKind::Key(self.source[start..self.pos].iter().collect()),
            pos: start,
        }
    }

    fn scan_quoted_key(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        self.pos += 1;
        while let Some(&c) = self.source.get(self.pos) {
            match c {
                '"' => {
                    self.pos += 1;
                    let raw: String = self.source[start..self.pos].iter().collect();
                    let key = serde_json::from_str::<String>(&raw)
                        .map_err(|e| parse_error(self.source, start, e.to_string()))?;
                    return Ok(Token {
                        kind: TokenKind::Key(key),
                        pos: start,
                    });
                }
                '\\' => self.pos += 2,
                _ => self.pos += 1,
            }
        }
        Err(parse_error(self.source, start, "unterminated quoted string"))
    }
}

fn is_plain_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// One step of a branch.
#[derive(Debug, Clone)]
enum Segment {
    Key(FieldKey),
    Any,
    Group(Vec<Vec<Segment>>),
}

/// Open parenthesized group (the root counts as one without a brace).
struct Group {
    branches: Vec<Vec<Segment>>,
    current: Vec<Segment>,
    open_pos: usize,
}

impl Group {
    fn new(open_pos: usize) -> Self {
        Self {
            branches: Vec::new(),
            current: Vec::new(),
            open_pos,
        }
    }

    fn close(mut self) -> Vec<Vec<Segment>> {
        self.branches.push(self.current);
        self.branches
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Key,
    Separator,
    GroupStart,
}

/// Parse a mask string. Blank input gives an empty mask.
pub fn parse(source: &str) -> Result<Mask, Error> {
    if source.trim_matches(SPACE_CHARS).is_empty() {
        return Ok(Mask::new());
    }
    let chars: Vec<char> = source.chars().collect();
    let tokens = Lexer::new(&chars).tokenize()?;

    let mut stack = vec![Group::new(0)];
    let mut state = State::Key;
    let mut i = 0;

    while let Some(token) = tokens.get(i) {
        // The stack is never empty: the root group is only popped below.
        let Some(top) = stack.last_mut() else {
            break;
        };
        match state {
            State::GroupStart => {
                state = if token.kind == TokenKind::RightBrace {
                    State::Separator
                } else {
                    State::Key
                };
                continue;
            }
            State::Key => match &token.kind {
                TokenKind::Key(key) => {
                    top.current.push(Segment::Key(FieldKey::new(key.clone())));
                    state = State::Separator;
                }
                TokenKind::Wildcard => {
                    top.current.push(Segment::Any);
                    state = State::Separator;
                }
                TokenKind::LeftBrace => {
                    stack.push(Group::new(token.pos));
                    state = State::GroupStart;
                }
                _ => {
                    return Err(parse_error(
                        &chars,
                        token.pos,
                        format!("unexpected token {}, expecting field or submask", token),
                    ))
                }
            },
            State::Separator => match &token.kind {
                TokenKind::Dot => state = State::Key,
                TokenKind::Comma => {
                    let branch = std::mem::take(&mut top.current);
                    top.branches.push(branch);
                    state = State::Key;
                }
                TokenKind::RightBrace => {
                    if stack.len() == 1 {
                        return Err(parse_error(&chars, token.pos, "unmatched right brace"));
                    }
                    if let Some(group) = stack.pop() {
                        let branches = group.close();
                        if let Some(parent) = stack.last_mut() {
                            parent.current.push(Segment::Group(branches));
                        }
                    }
                }
                _ => {
                    return Err(parse_error(
                        &chars,
                        token.pos,
                        format!(
                            "unexpected token {}, expecting separator or closing brace",
                            token
                        ),
                    ))
                }
            },
        }
        i += 1;
    }

    if stack.len() > 1 {
        let open_pos = stack.last().map(|g| g.open_pos).unwrap_or_default();
        return Err(parse_error(&chars, open_pos, "unclosed left brace"));
    }
    if state != State::Separator {
        return Err(Error::UnexpectedEnd);
    }

    let mut root = Mask::new();
    if let Some(group) = stack.pop() {
        for branch in group.close() {
            apply(&mut root, &branch);
        }
    }
    Ok(root)
}

/// Extend `node` along `segments`; a group fans out into each of its
/// branches, each followed by whatever comes after the group.
fn apply(node: &mut Mask, segments: &[Segment]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    match first {
        Segment::Key(key) => {
            let child = node.field_parts.entry(key.clone()).or_default();
            apply(child, rest);
        }
        Segment::Any => {
            let child = node.any.get_or_insert_with(Default::default);
            apply(child, rest);
        }
        Segment::Group(branches) => {
            for branch in branches {
                let mut joined = branch.clone();
                joined.extend(rest.iter().cloned());
                apply(node, &joined);
            }
        }
    }
}
