//! The Assembler module is in charge of taking DM-1000 source text and
//! producing the machine's finished memory image.
//!
//! It does this in three stages: a lexer turns the text into a typed token
//! stream, a non-lookahead parser groups the tokens into structural
//! expressions, and a two-pass code generator emits words, deferring every
//! operand to a relocation pass that runs once the label table is complete.
//!
//! A run either returns the full image or a single [`error::AsmError`];
//! there is no partial output.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::io;

use self::error::AsmError;

/// Assembles a source text block into a complete memory image. The
/// returned vector always has length [`ast::RAM_SIZE`].
pub fn assemble(source: &str) -> Result<Vec<u32>, AsmError> {
    let tokens = lexer::tokenize(source)?;
    debug!("lexer produced {} token(s)", tokens.len());

    let ast = parser::Parser::new(tokens).run()?;
    debug!("parser produced {} expression(s)", ast.len());

    codegen::Assembler::new().run(&ast)
}

/// The collaborator that commits finished memory words into a running
/// machine. How the words are stored or persisted is its business, not the
/// assembler's.
pub trait MemorySink {
    fn commit(&mut self, value: u32, address: usize) -> io::Result<()>;
}

/// Pushes every cell of a finished image into the sink in address order.
pub fn commit_image(image: &[u32], sink: &mut dyn MemorySink) -> io::Result<()> {
    for (address, &value) in image.iter().enumerate() {
        sink.commit(value, address)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ast::RAM_SIZE;
    use super::*;

    #[test]
    fn test_image_length_is_always_ram_size() {
        assert_eq!(assemble("").expect("assemble failed").len(), RAM_SIZE);
        assert_eq!(assemble("HLT").expect("assemble failed").len(), RAM_SIZE);
        assert_eq!(
            assemble("#ORG 500\n#TIMES 100\n#DV 1")
                .expect("assemble failed")
                .len(),
            RAM_SIZE
        );
    }

    #[test]
    fn test_reference_program() {
        // TAKE = opcode 1 with operand 5, HLT = opcode 10, rest untouched.
        let ram = assemble("TAKE 5\nHLT").expect("assemble failed");
        assert_eq!(ram[0], 1005);
        assert_eq!(ram[1], 10000);
        assert!(ram[2..].iter().all(|&cell| cell == 0));
    }

    #[test]
    fn test_case_insensitive_source() {
        assert_eq!(
            assemble("take 5\nhlt").expect("assemble failed"),
            assemble("TAKE 5\nHLT").expect("assemble failed")
        );
    }

    #[test]
    fn test_counting_loop_program() {
        let source = "
            #ORG 10
            LOOP:  TAKE COUNT
                   SUB ONE
                   SAVE COUNT
                   TST COUNT
                   JMP LOOP
                   HLT
            COUNT: #DV 5
            ONE:   #DV LOOP-9
        ";
        let ram = assemble(source).expect("assemble failed");
        // LOOP = 10, COUNT = 16, ONE = 17.
        assert_eq!(ram[10], 1016); // TAKE COUNT
        assert_eq!(ram[11], 3017); // SUB ONE
        assert_eq!(ram[12], 4016); // SAVE COUNT
        assert_eq!(ram[13], 6016); // TST COUNT
        assert_eq!(ram[14], 5010); // JMP LOOP
        assert_eq!(ram[15], 10000); // HLT
        assert_eq!(ram[16], 5); // COUNT
        assert_eq!(ram[17], 1); // ONE = 10 - 9
    }

    #[test]
    fn test_unknown_directive_fails_before_generation() {
        assert_eq!(
            assemble("#FOO 1"),
            Err(AsmError::UnknownDirective {
                name: "FOO".to_string(),
                line: 1,
            })
        );
    }

    #[test]
    fn test_no_partial_image_on_failure() {
        // A capacity overrun late in the program still yields only the error.
        assert!(matches!(
            assemble("#ORG 998\nHLT\nHLT\nHLT"),
            Err(AsmError::Capacity { .. })
        ));
    }

    #[test]
    fn test_commit_image_visits_cells_in_order() {
        struct Recorder {
            seen: Vec<(u32, usize)>,
        }
        impl MemorySink for Recorder {
            fn commit(&mut self, value: u32, address: usize) -> io::Result<()> {
                self.seen.push((value, address));
                Ok(())
            }
        }

        let image = assemble("TAKE 5\nHLT").expect("assemble failed");
        let mut sink = Recorder { seen: Vec::new() };
        commit_image(&image, &mut sink).expect("commit failed");

        assert_eq!(sink.seen.len(), RAM_SIZE);
        assert_eq!(sink.seen[0], (1005, 0));
        assert_eq!(sink.seen[1], (10000, 1));
        assert_eq!(sink.seen[999], (0, 999));
    }
}
