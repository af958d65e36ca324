//! Arithmetic evaluation of operand expressions.
//!
//! An argument group reaches the relocation pass as its raw token run. This
//! module evaluates such a run against the completed label table with a
//! small recursive-descent walk, one precedence layer per method:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor ('*' factor)*
//! factor := NUM | IDENT | '-' factor | '(' expr ')'
//! ```
//!
//! Identifiers are substituted directly with their label address; a name
//! absent from the table is fatal.

use std::collections::HashMap;

use super::error::EvalError;
use super::lexer::Token;

/// Evaluates one argument's token run. Called exactly once per deferred
/// relocation entry, after pass 1 has completed the label table.
pub fn eval(tokens: &[Token], labels: &HashMap<String, u32>) -> Result<i64, EvalError> {
    let mut state = Eval {
        tokens,
        pos: 0,
        labels,
    };
    let value = state.expr()?;
    match state.peek() {
        Some(tok) => Err(EvalError::Grammar(format!("unexpected {}", tok))),
        None => Ok(value),
    }
}

struct Eval<'a> {
    tokens: &'a [Token],
    pos: usize,
    labels: &'a HashMap<String, u32>,
}

impl<'a> Eval<'a> {
    fn expr(&mut self) -> Result<i64, EvalError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Op('+')) => {
                    self.pos += 1;
                    acc += self.term()?;
                }
                Some(Token::Op('-')) => {
                    self.pos += 1;
                    acc -= self.term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<i64, EvalError> {
        let mut acc = self.factor()?;
        while let Some(Token::Op('*')) = self.peek() {
            self.pos += 1;
            acc *= self.factor()?;
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<i64, EvalError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(i64::from(*n)),
            Some(Token::Ident(name)) => match self.labels.get(name) {
                Some(&addr) => Ok(i64::from(addr)),
                None => Err(EvalError::UndefinedLabel(name.clone())),
            },
            Some(Token::Op('-')) => Ok(-self.factor()?),
            Some(Token::Op('(')) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::Op(')')) => Ok(value),
                    Some(tok) => Err(EvalError::Grammar(format!(
                        "expected `)`, found {}",
                        tok
                    ))),
                    None => Err(EvalError::Grammar("missing `)`".to_string())),
                }
            }
            Some(tok) => Err(EvalError::Grammar(format!("unexpected {}", tok))),
            None => Err(EvalError::Grammar("expression ends early".to_string())),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }
}
