//! The Parser module takes a token stream from the lexer and converts it
//! into the structural expression sequence the code generator walks.
//!
//! Argument groups are collected raw: everything between separators stays a
//! token run, so an operand can be an arbitrary arithmetic expression over
//! labels. Only the group count is validated here, against the declared
//! arity of the directive or mnemonic.
use std::collections::VecDeque;
use std::mem;

use super::ast::{Arg, Expr, DIRECTIVES, OPS};
use super::error::AsmError;
use super::lexer::Token;

pub struct Parser {
    tokens: VecDeque<Token>,
    ast: VecDeque<Expr>,
    line: usize,
}

impl Parser {
    pub fn new(tokens: VecDeque<Token>) -> Self {
        let capacity = tokens.capacity();
        Parser {
            tokens,
            ast: VecDeque::with_capacity(capacity),
            line: 1,
        }
    }

    /// Run the parser, consuming itself and returning the expression list.
    pub fn run(mut self) -> Result<VecDeque<Expr>, AsmError> {
        loop {
            match self.expression()? {
                Some(expr) => self.ast.push_back(expr),
                None => break,
            }
        }
        Ok(self.ast)
    }

    /// Consumes tokens to produce the next expression, or None at the end
    /// of the stream.
    fn expression(&mut self) -> Result<Option<Expr>, AsmError> {
        let cur_tok = match self.consume() {
            Some(tok) => tok,
            None => return Ok(None),
        };

        match cur_tok {
            Token::Newline(n) => {
                self.line = n;
                Ok(Some(Expr::Line(n)))
            }

            // An identifier at top level can only be a label declaration.
            Token::Ident(name) => match self.consume() {
                Some(Token::Colon) => Ok(Some(Expr::Label(name))),
                _ => Err(AsmError::UnexpectedToken {
                    found: format!("identifier `{}` (labels need a `:`)", name),
                    line: self.line,
                }),
            },

            Token::Mnemonic(idx) => {
                let args = self.argument_groups();
                let def = &OPS[idx];
                if args.len() != def.args {
                    return Err(AsmError::WrongArgCount {
                        name: def.mnemonic,
                        expected: def.args,
                        got: args.len(),
                        line: self.line,
                    });
                }
                Ok(Some(Expr::Inst(idx, args)))
            }

            Token::Dir(idx) => {
                let args = self.argument_groups();
                let def = &DIRECTIVES[idx];
                if args.len() != def.args {
                    return Err(AsmError::WrongArgCount {
                        name: def.name,
                        expected: def.args,
                        got: args.len(),
                        line: self.line,
                    });
                }
                Ok(Some(Expr::Dir(def.dir, args)))
            }

            other => Err(AsmError::UnexpectedToken {
                found: other.to_string(),
                line: self.line,
            }),
        }
    }

    /// Comma-separated group collection. Tokens accumulate into the current
    /// group until a separator closes it or a line marker stops collection;
    /// the marker is left for the top-level loop. A trailing non-empty
    /// group closes implicitly at line end.
    fn argument_groups(&mut self) -> Vec<Arg> {
        let mut groups: Vec<Arg> = Vec::new();
        let mut current: Arg = Vec::new();

        loop {
            match self.tokens.front() {
                None | Some(Token::Newline(_)) => break,
                Some(Token::Comma) => {
                    self.consume();
                    groups.push(mem::take(&mut current));
                }
                Some(_) => {
                    if let Some(tok) = self.consume() {
                        current.push(tok);
                    }
                }
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }

        groups
    }

    /// Pops a token off the input stream and returns it.
    /// Returns None if no tokens are left.
    #[inline]
    fn consume(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }
}
