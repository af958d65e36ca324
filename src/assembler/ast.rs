//! This module holds the data model shared by the parser and the code
//! generator, plus the fixed vocabulary of the DM-1000 machine.
//!
//! The DM-1000 stores decimal words: a cell holds `opcode * 1000 + operand`,
//! where the operand is a RAM address below 1000. Execution begins at cell 0.
//! Comments are prefixed with semicolons (;) and are single-line only.
//! Source is case-insensitive.
//!
//! Supported instructions:
//!
//! ```text
//! TAKE ADDR  ; ACC <= RAM[ADDR]
//! ADD  ADDR  ; ACC <= ACC + RAM[ADDR]
//! SUB  ADDR  ; ACC <= ACC - RAM[ADDR]
//! SAVE ADDR  ; RAM[ADDR] <= ACC
//! JMP  ADDR  ; PC <= ADDR
//! TST  ADDR  ; skip the next word if RAM[ADDR] is zero
//! INC  ADDR  ; RAM[ADDR] <= RAM[ADDR] + 1
//! DEC  ADDR  ; RAM[ADDR] <= RAM[ADDR] - 1
//! NULL ADDR  ; RAM[ADDR] <= 0
//! HLT        ; stop the machine
//! ```
//!
//! Assembler directives:
//!
//! ```text
//! #ORG N     ; move the write cursor to address N
//! #TIMES N   ; repeat the next expression N times
//! #DV EXPR   ; reserve a cell holding the value of EXPR
//! ```
//!
//! Example source file:
//!
//! ```text
//! #ORG 10
//! loop:  take count    ; operands may be labels,
//!        sub one       ; plain addresses,
//!        save count
//!        tst count
//!        jmp loop
//!        hlt
//! count: #dv 5
//! one:   #dv loop-9    ; or arithmetic over both
//! ```

use super::lexer::Token;

/// Number of memory cells in the target machine.
pub const RAM_SIZE: usize = 1000;

/// Multiplier that shifts an opcode into the thousands digits of a word.
/// Operand values merged below it must stay strictly smaller.
pub const OPCODE_SHIFT: u32 = 1000;

/// One entry of the fixed instruction table.
pub struct OpDef {
    pub mnemonic: &'static str,
    pub opcode: u32,
    pub args: usize,
}

/// The fixed instruction table. `Token::Mnemonic` carries an index into it.
pub const OPS: &[OpDef] = &[
    OpDef { mnemonic: "TAKE", opcode: 1, args: 1 },
    OpDef { mnemonic: "ADD", opcode: 2, args: 1 },
    OpDef { mnemonic: "SUB", opcode: 3, args: 1 },
    OpDef { mnemonic: "SAVE", opcode: 4, args: 1 },
    OpDef { mnemonic: "JMP", opcode: 5, args: 1 },
    OpDef { mnemonic: "TST", opcode: 6, args: 1 },
    OpDef { mnemonic: "INC", opcode: 7, args: 1 },
    OpDef { mnemonic: "DEC", opcode: 8, args: 1 },
    OpDef { mnemonic: "NULL", opcode: 9, args: 1 },
    OpDef { mnemonic: "HLT", opcode: 10, args: 0 },
];

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Directive {
    /// `#ORG` - set the write cursor.
    Org,
    /// `#TIMES` - repeat the next expression.
    Times,
    /// `#DV` - reserve a cell holding a value.
    Dv,
}

/// One entry of the fixed directive table.
pub struct DirDef {
    pub name: &'static str,
    pub dir: Directive,
    pub args: usize,
}

/// The fixed directive table. `Token::Dir` carries an index into it.
pub const DIRECTIVES: &[DirDef] = &[
    DirDef { name: "ORG", dir: Directive::Org, args: 1 },
    DirDef { name: "TIMES", dir: Directive::Times, args: 1 },
    DirDef { name: "DV", dir: Directive::Dv, args: 1 },
];

pub fn lookup_op(name: &str) -> Option<usize> {
    OPS.iter().position(|op| op.mnemonic == name)
}

pub fn lookup_directive(name: &str) -> Option<usize> {
    DIRECTIVES.iter().position(|d| d.name == name)
}

/// One argument group: the raw token run between separators. Groups are
/// kept un-evaluated so an operand can be an arbitrary arithmetic
/// expression over labels; the evaluator runs during the relocation pass.
pub type Arg = Vec<Token>;

/// One structural expression of the source program.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Expr {
    /// `NAME:` - binds NAME to the current origin.
    Label(String),
    /// Instruction (index into [`OPS`]) with its argument groups.
    Inst(usize, Vec<Arg>),
    /// Directive with its argument groups.
    Dir(Directive, Vec<Arg>),
    /// Start of source line N. Emitted for every physical line.
    Line(usize),
}
