//! Reserved-word table, built once and consulted by [`crate::token::lookup_ident`].
//!
//! Built as a lazily-initialized map, one insertion per entry, instead
//! of a long `match` arm.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::token::TokenKind;

pub static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("var", TokenKind::Var);
    m.insert("func", TokenKind::Func);
    m.insert("class", TokenKind::Class);
    m.insert("if", TokenKind::If);
    m.insert("else", TokenKind::Else);
    m.insert("elif", TokenKind::Elif);
    m.insert("while", TokenKind::While);
    m.insert("for", TokenKind::For);
    m.insert("break", TokenKind::Break);
    m.insert("continue", TokenKind::Continue);
    m.insert("return", TokenKind::Return);
    m.insert("true", TokenKind::True);
    m.insert("false", TokenKind::False);
    m.insert("null", TokenKind::Null);
    m.insert("import", TokenKind::Import);
    m.insert("from", TokenKind::From);
    m.insert("as", TokenKind::As);
    m.insert("try", TokenKind::Try);
    m.insert("catch", TokenKind::Catch);
    m.insert("finally", TokenKind::Finally);
    m.insert("throw", TokenKind::Throw);
    m.insert("raise", TokenKind::Raise);
    m.insert("and", TokenKind::And);
    m.insert("or", TokenKind::Or);
    m.insert("not", TokenKind::Not);
    m.insert("in", TokenKind::In);
    m.insert("is", TokenKind::Is);
    m.insert("with", TokenKind::With);
    m.insert("yield", TokenKind::Yield);
    m.insert("global", TokenKind::Global);
    m.insert("nonlocal", TokenKind::Nonlocal);
    m.insert("lambda", TokenKind::Lambda);
    m.insert("del", TokenKind::Del);
    m.insert("assert", TokenKind::Assert);
    m.insert("pass", TokenKind::Pass);
    m
});
