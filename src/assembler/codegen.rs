//! Two-pass code generation.
//!
//! Pass 1 walks the expression sequence once, emitting base words and
//! recording label addresses plus a fixup for every operand. No operand is
//! ever baked in during pass 1, even a plain literal: label addresses are
//! not final until the whole sequence has been walked, and routing every
//! operand through the same deferred path keeps the two passes uniform.
//!
//! The relocation pass then evaluates each fixup against the completed
//! label table and merges the result into its cell.
use std::collections::{HashMap, VecDeque};

use super::ast::{Arg, Directive, Expr, OPCODE_SHIFT, OPS, RAM_SIZE};
use super::error::AsmError;
use super::eval::eval;
use super::lexer::Token;

/// A memory cell whose final value depends on the completed label table.
/// Recorded during pass 1, patched during the relocation pass. The line is
/// kept so relocation failures can name the operand's source line.
struct Fixup {
    addr: usize,
    tokens: Arg,
    line: usize,
}

/// One assembly session. All mutable generation state lives here, so a run
/// starts from fresh zero-initialized state and sessions never share
/// anything.
pub struct Assembler {
    ram: Vec<u32>,
    origin: usize,
    labels: HashMap<String, u32>,
    fixups: Vec<Fixup>,
    line: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler {
            ram: vec![0; RAM_SIZE],
            origin: 0,
            labels: HashMap::new(),
            fixups: Vec::new(),
            line: 1,
        }
    }

    /// Runs both passes, consuming the session and returning the finished
    /// memory image. The image always has length [`RAM_SIZE`].
    pub fn run(mut self, ast: &VecDeque<Expr>) -> Result<Vec<u32>, AsmError> {
        let mut i = 0;
        while i < ast.len() {
            i = self.step(ast, i)?;
        }
        debug!(
            "pass 1 complete: {} label(s), {} fixup(s)",
            self.labels.len(),
            self.fixups.len()
        );

        self.relocate()?;
        Ok(self.ram)
    }

    /// Processes the expression at index `i` and returns the index to
    /// continue from.
    fn step(&mut self, ast: &VecDeque<Expr>, i: usize) -> Result<usize, AsmError> {
        match &ast[i] {
            Expr::Line(n) => {
                self.line = *n;
                Ok(i + 1)
            }

            // Duplicate declarations overwrite: last write wins.
            Expr::Label(name) => {
                self.labels.insert(name.clone(), self.origin as u32);
                Ok(i + 1)
            }

            Expr::Inst(idx, args) => {
                let def = &OPS[*idx];
                if def.args == 1 {
                    self.fixups.push(Fixup {
                        addr: self.origin,
                        tokens: args[0].clone(),
                        line: self.line,
                    });
                }
                self.emit(def.opcode * OPCODE_SHIFT)?;
                Ok(i + 1)
            }

            Expr::Dir(Directive::Org, args) => {
                self.origin = self.literal(&args[0])? as usize;
                Ok(i + 1)
            }

            Expr::Dir(Directive::Times, args) => {
                let count = self.literal(&args[0])?;
                // Line markers sit between this directive's line and the
                // expression it repeats; step over them (processing each
                // once) to find the target.
                let mut target = i + 1;
                while let Some(Expr::Line(n)) = ast.get(target) {
                    self.line = *n;
                    target += 1;
                }
                if target >= ast.len() {
                    return Err(AsmError::MissingRepeatTarget { line: self.line });
                }
                for _ in 0..count {
                    self.step(ast, target)?;
                }
                // Advance past the target unconditionally, whatever
                // repeating it did internally.
                Ok(target + 1)
            }

            Expr::Dir(Directive::Dv, args) => {
                self.fixups.push(Fixup {
                    addr: self.origin,
                    tokens: args[0].clone(),
                    line: self.line,
                });
                self.emit(0)?;
                Ok(i + 1)
            }
        }
    }

    /// Directive arguments steer pass 1 itself, so unlike instruction
    /// operands they must already be literal.
    fn literal(&self, arg: &Arg) -> Result<u32, AsmError> {
        match arg.as_slice() {
            [Token::Num(n)] => Ok(*n),
            _ => Err(AsmError::NonLiteralArg { line: self.line }),
        }
    }

    /// Writes one word at the origin and advances it.
    fn emit(&mut self, word: u32) -> Result<(), AsmError> {
        if self.origin >= self.ram.len() {
            return Err(AsmError::Capacity {
                addr: self.origin,
                cap: self.ram.len(),
                line: self.line,
            });
        }
        self.ram[self.origin] = word;
        self.origin += 1;
        Ok(())
    }

    /// Second pass: evaluate every fixup, in recorded order, against the
    /// now-complete label table and merge it into its cell.
    fn relocate(&mut self) -> Result<(), AsmError> {
        for fixup in &self.fixups {
            let value = eval(&fixup.tokens, &self.labels).map_err(|e| e.at(fixup.line))?;
            self.ram[fixup.addr] = merge(self.ram[fixup.addr], value, fixup.line)?;
        }
        Ok(())
    }
}

/// Merges an evaluated operand into the base word already at a cell. An
/// instruction cell packs `opcode * 1000 + operand`, so the operand must
/// fit below the opcode field; a declare-value cell (base 0) takes the
/// whole word. Values that cannot be packed are rejected here rather than
/// silently corrupting the opcode digits.
fn merge(base: u32, value: i64, line: usize) -> Result<u32, AsmError> {
    let fits = if base == 0 {
        value >= 0 && value <= i64::from(u32::MAX)
    } else {
        value >= 0 && value < i64::from(OPCODE_SHIFT)
    };
    if !fits {
        return Err(AsmError::OperandRange { value, line });
    }
    Ok(base + value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::lexer::tokenize;
    use crate::assembler::parser::Parser;

    fn assemble(source: &str) -> Result<Vec<u32>, AsmError> {
        let ast = Parser::new(tokenize(source).expect("tokenize failed"))
            .run()
            .expect("parse failed");
        Assembler::new().run(&ast)
    }

    #[test]
    fn test_operand_resolved_in_second_pass() {
        // TAKE = opcode 1: 1 * 1000 + 5.
        let ram = assemble("TAKE 5").expect("assemble failed");
        assert_eq!(ram[0], 1005);
    }

    #[test]
    fn test_label_round_trip() {
        // LOOP binds to 0; JMP = opcode 5.
        let ram = assemble("LOOP: JMP LOOP").expect("assemble failed");
        assert_eq!(ram[0], 5000);
    }

    #[test]
    fn test_forward_reference() {
        // L is declared after the cell that references it.
        let ram = assemble("#DV L\nL: HLT").expect("assemble failed");
        assert_eq!(ram[0], 1);
        assert_eq!(ram[1], 10000);
    }

    #[test]
    fn test_org_places_next_write() {
        let ram = assemble("#ORG 10\nHLT").expect("assemble failed");
        for addr in 0..10 {
            assert_eq!(ram[addr], 0);
        }
        assert_eq!(ram[10], 10000);
    }

    #[test]
    fn test_org_requires_literal() {
        assert_eq!(
            assemble("L:\n#ORG L"),
            Err(AsmError::NonLiteralArg { line: 2 })
        );
    }

    #[test]
    fn test_times_repeats_next_expression() {
        let ram = assemble("#TIMES 3\nINC 5").expect("assemble failed");
        // INC = opcode 7, repeated at 0..3.
        assert_eq!(&ram[0..4], &[7005, 7005, 7005, 0]);
    }

    #[test]
    fn test_times_zero() {
        let ram = assemble("#TIMES 0\nINC 5\nHLT").expect("assemble failed");
        // The target is skipped entirely; HLT lands at 0.
        assert_eq!(ram[0], 10000);
        assert_eq!(ram[1], 0);
    }

    #[test]
    fn test_times_repeats_side_effects() {
        // Repeating a directive repeats its effects: three cells reserved,
        // three fixups recorded.
        let ram = assemble("#TIMES 3\n#DV 9\nL: JMP L").expect("assemble failed");
        assert_eq!(&ram[0..3], &[9, 9, 9]);
        assert_eq!(ram[3], 5003);
    }

    #[test]
    fn test_times_without_target() {
        assert_eq!(
            assemble("#TIMES 3"),
            Err(AsmError::MissingRepeatTarget { line: 2 })
        );
    }

    #[test]
    fn test_declare_value_reserves_cell() {
        let ram = assemble("#DV 7\n#DV 8").expect("assemble failed");
        assert_eq!(&ram[0..3], &[7, 8, 0]);
    }

    #[test]
    fn test_operand_arithmetic_over_labels() {
        // TABLE = 2; operand = 2*2+1 = 5.
        let ram = assemble("TAKE (TABLE*2)+1\nHLT\nTABLE: #DV 0")
            .expect("assemble failed");
        assert_eq!(ram[0], 1005);
    }

    #[test]
    fn test_duplicate_label_last_write_wins() {
        let ram = assemble("L: HLT\nL: JMP L").expect("assemble failed");
        // Both declarations exist; the second (address 1) wins.
        assert_eq!(ram[1], 5001);
    }

    #[test]
    fn test_capacity_exceeded() {
        assert_eq!(
            assemble("#ORG 999\nHLT\nHLT"),
            Err(AsmError::Capacity {
                addr: 1000,
                cap: RAM_SIZE,
                line: 3,
            })
        );
        // The cursor must not wrap around to cell 0.
        assert_eq!(
            assemble("#ORG 1000\nHLT"),
            Err(AsmError::Capacity {
                addr: 1000,
                cap: RAM_SIZE,
                line: 2,
            })
        );
    }

    #[test]
    fn test_undefined_label_names_operand_line() {
        assert_eq!(
            assemble("HLT\nJMP NOWHERE"),
            Err(AsmError::UndefinedLabel {
                name: "NOWHERE".to_string(),
                line: 2,
            })
        );
    }

    #[test]
    fn test_operand_must_fit_below_opcode_field() {
        assert_eq!(
            assemble("JMP 1500"),
            Err(AsmError::OperandRange {
                value: 1500,
                line: 1,
            })
        );
        assert_eq!(
            assemble("TAKE 0-5"),
            Err(AsmError::OperandRange { value: -5, line: 1 })
        );
    }

    #[test]
    fn test_declare_value_takes_whole_word() {
        // Data cells are not split into opcode/operand fields; a full
        // instruction-sized word is a legal value.
        let ram = assemble("#DV 10000").expect("assemble failed");
        assert_eq!(ram[0], 10000);
    }

    #[test]
    fn test_malformed_operand_fails_in_relocation() {
        assert!(matches!(
            assemble("TAKE 1+"),
            Err(AsmError::Arithmetic { line: 1, .. })
        ));
    }
}
