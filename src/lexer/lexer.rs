use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    LineIndex, Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

fn pattern(regex: &str, handler: RegexHandler) -> RegexPattern {
    // Every pattern is anchored so a match can only start at the cursor.
    RegexPattern {
        regex: Regex::new(&format!("^(?:{})", regex)).expect("lexer pattern must compile"),
        handler,
    }
}

lazy_static! {
    // Order matters: longer operators come before their prefixes.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        pattern("[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
        pattern("[0-9]+(\\.[0-9]+)?", number_handler),
        pattern("\\n", newline_handler),
        pattern("[ \\t\\r]+", skip_handler),
        pattern("\"([^\"\\\\\\n]|\\\\.)*\"", string_handler),
        pattern("//[^\\n]*", skip_handler),
        pattern("\\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{")),
        pattern("\\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}")),
        pattern("\\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
        pattern("\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
        pattern("==", MK_DEFAULT_HANDLER!(TokenKind::Equals, "==")),
        pattern("!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=")),
        pattern("!", MK_DEFAULT_HANDLER!(TokenKind::Not, "!")),
        pattern("=", MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=")),
        pattern("<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
        pattern("<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
        pattern(">=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
        pattern(">", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
        pattern("\\|\\|", MK_DEFAULT_HANDLER!(TokenKind::Or, "||")),
        pattern("&&", MK_DEFAULT_HANDLER!(TokenKind::And, "&&")),
        pattern("&", MK_DEFAULT_HANDLER!(TokenKind::Ampersand, "&")),
        pattern(";", MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";")),
        pattern(",", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
        pattern("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
        pattern("-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
        pattern("/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
        pattern("\\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    file: Rc<String>,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            pos: 0,
            tokens: vec![],
            source,
            file: file_name,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Span covering `len` bytes from the cursor.
    pub fn span_of(&self, len: usize) -> Span {
        Span {
            start: Position(self.pos as u32, Rc::clone(&self.file)),
            end: Position((self.pos + len) as u32, Rc::clone(&self.file)),
        }
    }

    /// Inserts a statement terminator if the last token can end a statement.
    fn terminate_statement(&mut self) {
        let ends_statement = self
            .tokens
            .last()
            .map(|token| token.kind.ends_statement())
            .unwrap_or(false);

        if ends_statement {
            let span = self.span_of(0);
            self.push(MK_TOKEN!(TokenKind::Semicolon, String::from("\n"), span));
        }
    }

    fn matched_len(&self, regex: &Regex) -> usize {
        regex.find(self.remainder()).map(|m| m.end()).unwrap_or(0)
    }
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = lexer.matched_len(regex);
    let matched = lexer.remainder()[..len].to_string();
    let kind = if matched.contains('.') {
        TokenKind::Float
    } else {
        TokenKind::Int
    };

    let span = lexer.span_of(len);
    lexer.push(MK_TOKEN!(kind, matched, span));
    lexer.advance_n(len);
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = lexer.matched_len(regex);
    lexer.advance_n(len);
}

fn newline_handler(lexer: &mut Lexer, _regex: &Regex) {
    lexer.terminate_statement();
    lexer.advance_n(1);
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = lexer.matched_len(regex);
    let string_literal = &lexer.remainder()[1..len - 1];

    let mut result = String::new();
    let mut chars = string_literal.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.peek() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('0') => result.push('\0'),
            // Unknown escapes keep the backslash and the character.
            Some(other) => {
                result.push(ch);
                result.push(*other);
            }
            None => {
                result.push(ch);
                continue;
            }
        }
        chars.next();
    }

    let span = lexer.span_of(len);
    lexer.push(MK_TOKEN!(TokenKind::String, result, span));
    lexer.advance_n(len);
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = lexer.matched_len(regex);
    let value = lexer.remainder()[..len].to_string();
    let kind = RESERVED_LOOKUP
        .get(value.as_str())
        .copied()
        .unwrap_or(TokenKind::Identifier);

    let span = lexer.span_of(len);
    lexer.push(MK_TOKEN!(kind, value, span));
    lexer.advance_n(len);
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let pattern = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex),
            None => {
                let token = lex.remainder().chars().next().unwrap_or_default().to_string();
                let location = LineIndex::new(&lex.source).location(lex.pos as u32, &lex.file);
                return Err(Error::new(ErrorImpl::UnrecognisedToken { token }, location));
            }
        }
    }

    lex.terminate_statement();

    let span = lex.span_of(0);
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), span));
    tracing::trace!(count = lex.tokens.len(), file = %lex.file, "tokenized source");
    Ok(lex.tokens)
}
