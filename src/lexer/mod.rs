//! Lexer: turns source text into a stream of [`Token`]s on demand.
pub mod keywords;

use std::iter::Peekable;
use std::str::Chars;

use crate::token::{lookup_ident, Position, Token, TokenKind};

/// Scans one [`Token`] at a time from a source buffer.
///
/// Tracks `(line, column, offset)` alongside a peekable character
/// iterator; whitespace and comments are skipped between tokens.
pub struct Lexer<'a> {
    file: String,
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(file: impl Into<String>, source: &'a str) -> Self {
        Self {
            file: file.into(),
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    fn pos(&self) -> Position {
        Position::new(self.file.clone(), self.line, self.column, self.offset)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek2(&self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    // `//` line comment, and the `//-` variant: both run to end of line.
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => break,
                            Some('*') => {
                                self.bump();
                                if self.peek() == Some('/') {
                                    self.bump();
                                    break;
                                }
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Scan and return the next token. Returns an `Eof` token forever once
    /// the source is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos();

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, "", start);
        };

        match c {
            'A'..='Z' | 'a'..='z' | '_' => self.lex_ident(start),
            '0'..='9' => self.lex_number(start),
            '"' => self.lex_string(start),
            _ => self.lex_operator(start),
        }
    }

    /// `spec.md` §4.1: identifiers match `[A-Za-z_][A-Za-z_]*` exactly,
    /// so neither digits nor non-ASCII letters continue one.
    fn lex_ident(&mut self, start: Position) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = lookup_ident(&s);
        Token::new(kind, s, start)
    }

    fn lex_number(&mut self, start: Position) -> Token {
        let mut s = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.bump();
            } else if c == '.' && !is_float && matches!(self.peek2(), Some(d) if d.is_ascii_digit())
            {
                is_float = true;
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        Token::new(kind, s, start)
    }

    fn lex_string(&mut self, start: Position) -> Token {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                None => break,
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    s.push('\\');
                    self.bump();
                    if let Some(escaped) = self.peek() {
                        s.push(escaped);
                        self.bump();
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.bump();
                }
            }
        }
        let unescaped = unescape::unescape(&s).unwrap_or(s);
        Token::new(TokenKind::Str, unescaped, start)
    }

    fn lex_operator(&mut self, start: Position) -> Token {
        let c = self.bump().expect("checked by caller");
        macro_rules! two_char {
            ($second:literal, $double:expr, $single:expr) => {{
                if self.peek() == Some($second) {
                    self.bump();
                    Token::new($double, format!("{c}{}", $second), start)
                } else {
                    Token::new($single, c.to_string(), start)
                }
            }};
        }

        match c {
            '=' => two_char!('=', TokenKind::Eq, TokenKind::Assign),
            '!' => two_char!('=', TokenKind::NotEq, TokenKind::Bang),
            '<' => two_char!('=', TokenKind::LtEq, TokenKind::Lt),
            '>' => two_char!('=', TokenKind::GtEq, TokenKind::Gt),
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                    Token::new(TokenKind::AndAnd, "&&", start)
                } else {
                    Token::new(TokenKind::Illegal, "&", start)
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                    Token::new(TokenKind::OrOr, "||", start)
                } else {
                    Token::new(TokenKind::Illegal, "|", start)
                }
            }
            '+' => Token::new(TokenKind::Plus, "+", start),
            '-' => Token::new(TokenKind::Minus, "-", start),
            '*' => Token::new(TokenKind::Star, "*", start),
            '/' => Token::new(TokenKind::Slash, "/", start),
            '%' => Token::new(TokenKind::Percent, "%", start),
            ',' => Token::new(TokenKind::Comma, ",", start),
            ';' => Token::new(TokenKind::Semicolon, ";", start),
            ':' => Token::new(TokenKind::Colon, ":", start),
            '.' => Token::new(TokenKind::Dot, ".", start),
            '(' => Token::new(TokenKind::LParen, "(", start),
            ')' => Token::new(TokenKind::RParen, ")", start),
            '{' => Token::new(TokenKind::LBrace, "{", start),
            '}' => Token::new(TokenKind::RBrace, "}", start),
            '[' => Token::new(TokenKind::LBracket, "[", start),
            ']' => Token::new(TokenKind::RBracket, "]", start),
            other => Token::new(TokenKind::Illegal, other.to_string(), start),
        }
    }

    /// Drain the full token stream, ending with a final `Eof` token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = vec![];
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new("<test>", src)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_idents() {
        assert_eq!(
            kinds("var foo = 42;"),
            vec![
                TokenKind::Var,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_multi_char_operators() {
        assert_eq!(
            kinds("a == b != c && d || e <= f >= g"),
            vec![
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Ident,
                TokenKind::NotEq,
                TokenKind::Ident,
                TokenKind::AndAnd,
                TokenKind::Ident,
                TokenKind::OrOr,
                TokenKind::Ident,
                TokenKind::LtEq,
                TokenKind::Ident,
                TokenKind::GtEq,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn lone_ampersand_and_pipe_are_illegal() {
        assert_eq!(kinds("&"), vec![TokenKind::Illegal, TokenKind::Eof]);
        assert_eq!(kinds("|"), vec![TokenKind::Illegal, TokenKind::Eof]);
    }

    #[test]
    fn float_requires_digit_after_dot() {
        let tokens = Lexer::new("<test>", "1.5").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].literal, "1.5");
    }

    #[test]
    fn skips_line_block_and_dash_comments() {
        let src = "var a = 1; // comment\n/* block */ var b = 2; //-trailing\n";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Var,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Var,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_still_returns_token() {
        let tokens = Lexer::new("<test>", "\"abc").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].literal, "abc");
    }
}
