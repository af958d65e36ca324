//! This lexer tokenizes DM-1000 assembly source.
use std::collections::VecDeque;
use std::fmt;

use super::ast::{lookup_directive, lookup_op, DIRECTIVES, OPS};
use super::error::AsmError;

/// A single lexical token. Tokens carry no position of their own; instead
/// every line break emits a `Newline` marker carrying the 1-based number of
/// the line that follows it, and each stage tracks the active line from
/// those markers.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    /// Label or operand name.
    Ident(String),
    /// Non-negative integer literal.
    Num(u32),
    /// One of `+ - * ( )`.
    Op(char),
    /// Instruction mnemonic; index into [`OPS`].
    Mnemonic(usize),
    /// Directive; index into [`DIRECTIVES`].
    Dir(usize),
    /// `:` after a label name.
    Colon,
    /// `,` between argument groups.
    Comma,
    /// End of a source line; payload is the number of the next line.
    Newline(usize),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier `{}`", name),
            Token::Num(n) => write!(f, "number `{}`", n),
            Token::Op(c) => write!(f, "`{}`", c),
            Token::Mnemonic(idx) => write!(f, "mnemonic `{}`", OPS[*idx].mnemonic),
            Token::Dir(idx) => write!(f, "directive `#{}`", DIRECTIVES[*idx].name),
            Token::Colon => write!(f, "`:`"),
            Token::Comma => write!(f, "`,`"),
            Token::Newline(_) => write!(f, "end of line"),
        }
    }
}

/// Tokenizes a whole source text block. Input is case-insensitive; every
/// alphabetic character is folded to upper case before classification. The
/// last line is terminated by a marker whether or not the text ends in a
/// newline.
pub fn tokenize(source: &str) -> Result<VecDeque<Token>, AsmError> {
    let mut tokens: VecDeque<Token> = VecDeque::with_capacity(256);

    for (index, line) in source.lines().enumerate() {
        let line_num = index + 1;
        tokenize_line(&line.to_ascii_uppercase(), line_num, &mut tokens)?;
        tokens.push_back(Token::Newline(line_num + 1));
    }

    Ok(tokens)
}

fn tokenize_line(
    line: &str,
    line_num: usize,
    out: &mut VecDeque<Token>,
) -> Result<(), AsmError> {
    let mut iter = line.chars().peekable();

    while let Some(c) = iter.next() {
        match c {
            ' ' | '\t' | '\x0B' | '\x0C' | '\r' => {}

            '+' | '-' | '*' | '(' | ')' => out.push_back(Token::Op(c)),
            ':' => out.push_back(Token::Colon),
            ',' => out.push_back(Token::Comma),

            // Comment: discard the rest of the line.
            ';' => break,

            '#' => {
                let mut name = String::new();
                while let Some(&next) = iter.peek() {
                    if next.is_ascii_alphabetic() {
                        name.push(next);
                        iter.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(AsmError::UnterminatedToken { line: line_num });
                }
                match lookup_directive(&name) {
                    Some(idx) => out.push_back(Token::Dir(idx)),
                    None => return Err(AsmError::UnknownDirective { name, line: line_num }),
                }
            }

            _ if c.is_ascii_digit() => {
                let mut digits = String::new();
                digits.push(c);
                while let Some(&next) = iter.peek() {
                    if next.is_ascii_digit() {
                        digits.push(next);
                        iter.next();
                    } else {
                        break;
                    }
                }
                let value = digits
                    .parse::<u32>()
                    .map_err(|_| AsmError::LiteralOverflow { line: line_num })?;
                out.push_back(Token::Num(value));
            }

            _ if c.is_ascii_alphabetic() => {
                let mut name = String::new();
                name.push(c);
                while let Some(&next) = iter.peek() {
                    if next.is_ascii_alphanumeric() {
                        name.push(next);
                        iter.next();
                    } else {
                        break;
                    }
                }
                match lookup_op(&name) {
                    Some(idx) => out.push_back(Token::Mnemonic(idx)),
                    None => out.push_back(Token::Ident(name)),
                }
            }

            _ => return Err(AsmError::UnexpectedChar { ch: c, line: line_num }),
        }
    }

    Ok(())
}
