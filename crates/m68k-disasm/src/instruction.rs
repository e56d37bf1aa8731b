//! Decoded instruction model.
//!
//! [`Instruction`] is a value type produced by the decoder and consumed
//! immediately by the text formatter, the control-flow analyzer or the
//! lifter; nothing here persists. The conditional families (Bcc, DBcc,
//! Scc, TRAPcc and the FP predicates) carry their condition in the
//! mnemonic so the suffix never has to be re-derived from opcode bits.

use core::fmt;

use crate::flags::{Condition, FpCondition};
use crate::operand::Operand;

/// Integer operation size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Byte,
    Word,
    Long,
}

impl Size {
    /// Decode a 2-bit size field; 3 is reserved.
    #[must_use]
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits & 3 {
            0 => Some(Self::Byte),
            1 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    /// Width in bytes.
    #[must_use]
    pub fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
        }
    }

    /// `.b`, `.w`, `.l`.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Byte => ".b",
            Self::Word => ".w",
            Self::Long => ".l",
        }
    }
}

/// FP data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpSize {
    Long,
    Single,
    Extended,
    Packed,
    Word,
    Double,
    Byte,
}

impl FpSize {
    /// Decode a 3-bit source/destination specifier field. Encoding 7
    /// (packed with dynamic k-factor) is unsupported.
    #[must_use]
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits & 7 {
            0 => Some(Self::Long),
            1 => Some(Self::Single),
            2 => Some(Self::Extended),
            3 => Some(Self::Packed),
            4 => Some(Self::Word),
            5 => Some(Self::Double),
            6 => Some(Self::Byte),
            _ => None,
        }
    }

    /// Actual storage width in bytes.
    #[must_use]
    pub fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long | Self::Single => 4,
            Self::Double => 8,
            Self::Extended | Self::Packed => 12,
        }
    }

    /// `.l`, `.s`, `.x`, `.p`, `.w`, `.d`, `.b`.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Long => ".l",
            Self::Single => ".s",
            Self::Extended => ".x",
            Self::Packed => ".p",
            Self::Word => ".w",
            Self::Double => ".d",
            Self::Byte => ".b",
        }
    }
}

/// Size attached to a decoded instruction, selecting the mnemonic suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSpec {
    Int(Size),
    Fp(FpSize),
}

impl SizeSpec {
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Int(size) => size.suffix(),
            Self::Fp(size) => size.suffix(),
        }
    }

    /// Integer size, if this is an integer size spec.
    #[must_use]
    pub fn int(self) -> Option<Size> {
        match self {
            Self::Int(size) => Some(size),
            Self::Fp(_) => None,
        }
    }
}

/// Rounding prefix of the 68040 FP arithmetic encodings: `fsadd`, `fdmul`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FpRounding {
    #[default]
    None,
    Single,
    Double,
}

impl FpRounding {
    fn prefix(self) -> &'static str {
        match self {
            Self::None => "f",
            Self::Single => "fs",
            Self::Double => "fd",
        }
    }
}

/// Instruction mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    // Group 0x0: immediates, bit ops, system transfers
    Ori,
    Andi,
    Subi,
    Addi,
    Eori,
    Cmpi,
    Btst,
    Bchg,
    Bclr,
    Bset,
    Movep,
    Moves,
    Cas,
    Cas2,
    Callm,
    Rtm,
    Chk2,
    Cmp2,
    // Groups 0x1-0x3
    Move,
    Movea,
    // Group 0x4: miscellaneous
    Lea,
    Chk,
    Extb,
    Negx,
    Clr,
    Neg,
    Not,
    Swap,
    Pea,
    Ext,
    Movem,
    Nbcd,
    Link,
    Unlk,
    Reset,
    Nop,
    Stop,
    Rte,
    Rtd,
    Rts,
    Trapv,
    Rtr,
    Movec,
    Jsr,
    Jmp,
    Trap,
    Illegal,
    Bkpt,
    Bgnd,
    Tas,
    Tst,
    Muls,
    Mulu,
    Divs,
    Divu,
    Divsl,
    Divul,
    // Group 0x5
    Addq,
    Subq,
    Scc(Condition),
    Dbcc(Condition),
    Trapcc(Condition),
    // Group 0x6
    Bra,
    Bsr,
    Bcc(Condition),
    // Group 0x7
    Moveq,
    // Groups 0x8, 0x9, 0xb, 0xc, 0xd
    Or,
    Sbcd,
    Pack,
    Unpk,
    Sub,
    Suba,
    Subx,
    Cmp,
    Cmpa,
    Cmpm,
    Eor,
    And,
    Abcd,
    Exg,
    Add,
    Adda,
    Addx,
    // Group 0xe: shifts, rotates, bit fields
    Asl,
    Asr,
    Lsl,
    Lsr,
    Rol,
    Ror,
    Roxl,
    Roxr,
    Bftst,
    Bfextu,
    Bfchg,
    Bfexts,
    Bfclr,
    Bffo,
    Bfset,
    Bfins,
    // Group 0xf: FP and cache/MMU
    Fmove(FpRounding),
    Fmovem,
    Fadd(FpRounding),
    Fsub(FpRounding),
    Fmul(FpRounding),
    Fdiv(FpRounding),
    Fsqrt(FpRounding),
    Fabs(FpRounding),
    Fneg(FpRounding),
    Fcmp(FpRounding),
    Ftst(FpRounding),
    Fbcc(FpCondition),
    Fscc(FpCondition),
    Ftrapcc(FpCondition),
    Fsave,
    Frestore,
    Cinv,
    Cpush,
    Pflush,
}

impl Mnemonic {
    /// Lowercase mnemonic text without a size suffix.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Ori => "ori".into(),
            Self::Andi => "andi".into(),
            Self::Subi => "subi".into(),
            Self::Addi => "addi".into(),
            Self::Eori => "eori".into(),
            Self::Cmpi => "cmpi".into(),
            Self::Btst => "btst".into(),
            Self::Bchg => "bchg".into(),
            Self::Bclr => "bclr".into(),
            Self::Bset => "bset".into(),
            Self::Movep => "movep".into(),
            Self::Moves => "moves".into(),
            Self::Cas => "cas".into(),
            Self::Cas2 => "cas2".into(),
            Self::Callm => "callm".into(),
            Self::Rtm => "rtm".into(),
            Self::Chk2 => "chk2".into(),
            Self::Cmp2 => "cmp2".into(),
            Self::Move => "move".into(),
            Self::Movea => "movea".into(),
            Self::Lea => "lea".into(),
            Self::Chk => "chk".into(),
            Self::Extb => "extb".into(),
            Self::Negx => "negx".into(),
            Self::Clr => "clr".into(),
            Self::Neg => "neg".into(),
            Self::Not => "not".into(),
            Self::Swap => "swap".into(),
            Self::Pea => "pea".into(),
            Self::Ext => "ext".into(),
            Self::Movem => "movem".into(),
            Self::Nbcd => "nbcd".into(),
            Self::Link => "link".into(),
            Self::Unlk => "unlk".into(),
            Self::Reset => "reset".into(),
            Self::Nop => "nop".into(),
            Self::Stop => "stop".into(),
            Self::Rte => "rte".into(),
            Self::Rtd => "rtd".into(),
            Self::Rts => "rts".into(),
            Self::Trapv => "trapv".into(),
            Self::Rtr => "rtr".into(),
            Self::Movec => "movec".into(),
            Self::Jsr => "jsr".into(),
            Self::Jmp => "jmp".into(),
            Self::Trap => "trap".into(),
            Self::Illegal => "illegal".into(),
            Self::Bkpt => "bkpt".into(),
            Self::Bgnd => "bgnd".into(),
            Self::Tas => "tas".into(),
            Self::Tst => "tst".into(),
            Self::Muls => "muls".into(),
            Self::Mulu => "mulu".into(),
            Self::Divs => "divs".into(),
            Self::Divu => "divu".into(),
            Self::Divsl => "divsl".into(),
            Self::Divul => "divul".into(),
            Self::Addq => "addq".into(),
            Self::Subq => "subq".into(),
            Self::Scc(cond) => format!("s{}", cond.suffix()),
            Self::Dbcc(cond) => format!("db{}", cond.suffix()),
            Self::Trapcc(cond) => format!("trap{}", cond.suffix()),
            Self::Bra => "bra".into(),
            Self::Bsr => "bsr".into(),
            Self::Bcc(cond) => format!("b{}", cond.suffix()),
            Self::Moveq => "moveq".into(),
            Self::Or => "or".into(),
            Self::Sbcd => "sbcd".into(),
            Self::Pack => "pack".into(),
            Self::Unpk => "unpk".into(),
            Self::Sub => "sub".into(),
            Self::Suba => "suba".into(),
            Self::Subx => "subx".into(),
            Self::Cmp => "cmp".into(),
            Self::Cmpa => "cmpa".into(),
            Self::Cmpm => "cmpm".into(),
            Self::Eor => "eor".into(),
            Self::And => "and".into(),
            Self::Abcd => "abcd".into(),
            Self::Exg => "exg".into(),
            Self::Add => "add".into(),
            Self::Adda => "adda".into(),
            Self::Addx => "addx".into(),
            Self::Asl => "asl".into(),
            Self::Asr => "asr".into(),
            Self::Lsl => "lsl".into(),
            Self::Lsr => "lsr".into(),
            Self::Rol => "rol".into(),
            Self::Ror => "ror".into(),
            Self::Roxl => "roxl".into(),
            Self::Roxr => "roxr".into(),
            Self::Bftst => "bftst".into(),
            Self::Bfextu => "bfextu".into(),
            Self::Bfchg => "bfchg".into(),
            Self::Bfexts => "bfexts".into(),
            Self::Bfclr => "bfclr".into(),
            Self::Bffo => "bffo".into(),
            Self::Bfset => "bfset".into(),
            Self::Bfins => "bfins".into(),
            Self::Fmove(r) => format!("{}move", r.prefix()),
            Self::Fmovem => "fmovem".into(),
            Self::Fadd(r) => format!("{}add", r.prefix()),
            Self::Fsub(r) => format!("{}sub", r.prefix()),
            Self::Fmul(r) => format!("{}mul", r.prefix()),
            Self::Fdiv(r) => format!("{}div", r.prefix()),
            Self::Fsqrt(r) => format!("{}sqrt", r.prefix()),
            Self::Fabs(r) => format!("{}abs", r.prefix()),
            Self::Fneg(r) => format!("{}neg", r.prefix()),
            Self::Fcmp(r) => format!("{}cmp", r.prefix()),
            Self::Ftst(r) => format!("{}tst", r.prefix()),
            Self::Fbcc(cond) => format!("fb{}", cond.suffix()),
            Self::Fscc(cond) => format!("fs{}", cond.suffix()),
            Self::Ftrapcc(cond) => format!("ftrap{}", cond.suffix()),
            Self::Fsave => "fsave".into(),
            Self::Frestore => "frestore".into(),
            Self::Cinv => "cinv".into(),
            Self::Cpush => "cpush".into(),
            Self::Pflush => "pflush".into(),
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    /// Total encoded length in bytes, opcode word included.
    pub length: usize,
    /// Operation size, when the encoding carries one.
    pub size: Option<SizeSpec>,
    pub source: Option<Operand>,
    pub dest: Option<Operand>,
    pub third: Option<Operand>,
}

impl Instruction {
    /// Integer operation width in bytes, if sized.
    #[must_use]
    pub fn size_bytes(&self) -> Option<u32> {
        self.size.and_then(SizeSpec::int).map(Size::bytes)
    }
}

/// Sentinel for undecodable input: the decoder never throws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unimplemented {
    /// Bytes attributable to the failed decode: the input length for
    /// short input, otherwise 2 plus the extension bytes counted before
    /// the failure.
    pub length: usize,
}

impl fmt::Display for Unimplemented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unimplemented")
    }
}

#[cfg(test)]
mod tests {
    use super::{FpRounding, Mnemonic, Size, SizeSpec};
    use crate::flags::Condition;

    #[test]
    fn conditional_mnemonics_compose_their_suffix() {
        assert_eq!(Mnemonic::Bcc(Condition::Equal).name(), "beq");
        assert_eq!(Mnemonic::Dbcc(Condition::False).name(), "dbf");
        assert_eq!(Mnemonic::Trapcc(Condition::OverflowSet).name(), "trapvs");
        assert_eq!(Mnemonic::Scc(Condition::High).name(), "shi");
    }

    #[test]
    fn fp_rounding_prefixes() {
        assert_eq!(Mnemonic::Fadd(FpRounding::None).name(), "fadd");
        assert_eq!(Mnemonic::Fadd(FpRounding::Single).name(), "fsadd");
        assert_eq!(Mnemonic::Fsqrt(FpRounding::Double).name(), "fdsqrt");
    }

    #[test]
    fn size_field_reserves_encoding_3() {
        assert_eq!(Size::from_bits(0), Some(Size::Byte));
        assert_eq!(Size::from_bits(2), Some(Size::Long));
        assert_eq!(Size::from_bits(3), None);
        assert_eq!(SizeSpec::Int(Size::Word).suffix(), ".w");
    }
}
