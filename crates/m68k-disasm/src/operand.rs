//! Operand model: one tagged variant per addressing mode.
//!
//! Every operand knows its actual byte width (1/2/4 for integer operands,
//! up to 12 for FP formats) and exposes five pure functions over the IL
//! builder:
//!
//! - `format`: disassembly tokens
//! - `address_il`: the effective address as an IL expression
//! - `source_il` / `dest_il`: read / write the operand
//! - `pre_il` / `post_il`: predecrement and postincrement side effects
//!
//! Register-pair and register-list operands have no single-expression
//! source or destination; the instructions that use them (CAS2, MOVEM,
//! the 64-bit multiplies and divides) walk the registers themselves.

use crate::flags::{Flag, FlagWrite};
use crate::il::IlBuilder;
use crate::registers::Reg;
use crate::tokens::Token;

/// Base register of a displacement or index effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseReg {
    /// Program counter; addresses resolve against `addr + 2`.
    Pc,
    /// An address register.
    Reg(Reg),
}

/// Index register part of an extension word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexReg {
    /// D0-D7 or A0-A7.
    pub reg: Reg,
    /// Long index; word indexes are sign-extended.
    pub long: bool,
    /// 1, 2, 4 or 8.
    pub scale: u8,
}

/// Host-float rendering of an FP immediate. Compares by bit pattern so
/// NaN payloads stay equal to themselves.
#[derive(Debug, Clone, Copy)]
pub struct FpValue(pub f64);

impl PartialEq for FpValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FpValue {}

/// Size of the address field of an absolute operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsoluteField {
    Word,
    Long,
}

impl AbsoluteField {
    fn bytes(self) -> u32 {
        match self {
            Self::Word => 2,
            Self::Long => 4,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Word => ").w",
            Self::Long => ").l",
        }
    }
}

/// A decoded operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `d0`, `a3`, `sr`, `ccr`, `usp`, a MOVEC control register.
    RegDirect { size: u32, reg: Reg },
    /// `d0:d1` (CAS2, 64-bit mul/div).
    RegDirectPair { size: u32, reg1: Reg, reg2: Reg },
    /// `d0-d7/a0-sp` (MOVEM).
    RegMovemList { size: u32, regs: Vec<Reg> },
    /// `(a0)`.
    RegIndirect { size: u32, reg: Reg },
    /// `(a0):(a1)` (CAS2).
    RegIndirectPair { size: u32, reg1: Reg, reg2: Reg },
    /// `(a0)+`.
    RegIndirectPostInc { size: u32, reg: Reg },
    /// `-(a0)`.
    RegIndirectPreDec { size: u32, reg: Reg },
    /// `$1234(a0)` or `($00001234)` PC-relative.
    RegIndirectDisp { size: u32, base: BaseReg, disp: i32 },
    /// `($12,a0,d1.l*4)`: brief or full extension word, no indirection.
    RegIndirectIndex {
        size: u32,
        base: Option<BaseReg>,
        disp: i32,
        index: Option<IndexReg>,
    },
    /// `([$12,a0],d1.l*4,$56)`: memory indirect, post-indexed.
    MemIndirectPostIndex {
        size: u32,
        base: Option<BaseReg>,
        disp: i32,
        index: Option<IndexReg>,
        outer: i32,
    },
    /// `([$12,a0,d1.l*4],$56)`: memory indirect, pre-indexed.
    MemIndirectPreIndex {
        size: u32,
        base: Option<BaseReg>,
        disp: i32,
        index: Option<IndexReg>,
        outer: i32,
    },
    /// `($1234).w` / `($12345678).l`; `address` is already extended to the
    /// variant's address width.
    Absolute {
        size: u32,
        address: u32,
        field: AbsoluteField,
        width: u32,
    },
    /// `#$1234`.
    Immediate { size: u32, value: i64 },
    /// `fp3`.
    FpRegDirect { size: u32, reg: Reg },
    /// FP immediate: raw encoding bits plus a display rendering.
    FpImmediate {
        size: u32,
        bits: u128,
        value: FpValue,
        text: String,
    },
    /// `fp0-fp7` (FMOVEM).
    FpMovemList { size: u32, regs: Vec<Reg> },
    /// `fpcr/fpsr/fpiar` (FMOVEM of system control registers).
    FpScMovemList { size: u32, regs: Vec<Reg> },
}

/// Hex rendering that keeps the sign outside the digits: `$1234`, `$-4`.
/// Width counts total characters, sign included.
fn signed_hex(value: i64, width: usize) -> String {
    if value < 0 {
        let digits = width.saturating_sub(1);
        format!("-{:0digits$x}", -value)
    } else {
        format!("{value:0width$x}")
    }
}

/// Contiguous catalogue runs rendered as `r0-r7`, groups joined by `/`.
/// `index` maps a register to its catalogue position; `run_break` is the
/// position that never continues a run (a0 in the integer catalogue, so
/// data and address registers don't merge).
fn format_reg_list(regs: &[Reg], index: impl Fn(Reg) -> u8, run_break: Option<u8>) -> Vec<Token> {
    if regs.is_empty() {
        return Vec::new();
    }
    let mut tokens = vec![Token::register(regs[0].name())];
    let mut last = regs[0];
    let mut in_run = false;
    for &reg in &regs[1..] {
        let follows = index(reg) == index(last) + 1 && Some(index(reg)) != run_break;
        if follows {
            in_run = true;
            last = reg;
        } else {
            if in_run {
                tokens.push(Token::separator("-"));
                tokens.push(Token::register(last.name()));
            }
            tokens.push(Token::separator("/"));
            tokens.push(Token::register(reg.name()));
            in_run = false;
            last = reg;
        }
    }
    if in_run {
        tokens.push(Token::separator("-"));
        tokens.push(Token::register(last.name()));
    }
    tokens
}

fn format_index_tokens(tokens: &mut Vec<Token>, index: Option<IndexReg>) {
    if let Some(ix) = index {
        tokens.push(Token::separator(","));
        tokens.push(Token::register(ix.reg.name()));
        tokens.push(Token::text("."));
        tokens.push(Token::text(if ix.long { "l" } else { "w" }));
        if ix.scale != 1 {
            tokens.push(Token::separator("*"));
            tokens.push(Token::integer(format!("{}", ix.scale), u64::from(ix.scale)));
        }
    }
}

impl Operand {
    /// Actual byte width of the operand.
    #[must_use]
    pub fn size(&self) -> u32 {
        match self {
            Self::RegDirect { size, .. }
            | Self::RegDirectPair { size, .. }
            | Self::RegMovemList { size, .. }
            | Self::RegIndirect { size, .. }
            | Self::RegIndirectPair { size, .. }
            | Self::RegIndirectPostInc { size, .. }
            | Self::RegIndirectPreDec { size, .. }
            | Self::RegIndirectDisp { size, .. }
            | Self::RegIndirectIndex { size, .. }
            | Self::MemIndirectPostIndex { size, .. }
            | Self::MemIndirectPreIndex { size, .. }
            | Self::Absolute { size, .. }
            | Self::Immediate { size, .. }
            | Self::FpRegDirect { size, .. }
            | Self::FpImmediate { size, .. }
            | Self::FpMovemList { size, .. }
            | Self::FpScMovemList { size, .. } => *size,
        }
    }

    /// Copy of the operand with a different byte width. Used where the
    /// instruction widens its destination (ADDA, the word divides, the
    /// register forms of the bit instructions).
    #[must_use]
    pub fn with_size(&self, new_size: u32) -> Self {
        let mut op = self.clone();
        match &mut op {
            Self::RegDirect { size, .. }
            | Self::RegDirectPair { size, .. }
            | Self::RegMovemList { size, .. }
            | Self::RegIndirect { size, .. }
            | Self::RegIndirectPair { size, .. }
            | Self::RegIndirectPostInc { size, .. }
            | Self::RegIndirectPreDec { size, .. }
            | Self::RegIndirectDisp { size, .. }
            | Self::RegIndirectIndex { size, .. }
            | Self::MemIndirectPostIndex { size, .. }
            | Self::MemIndirectPreIndex { size, .. }
            | Self::Absolute { size, .. }
            | Self::Immediate { size, .. }
            | Self::FpRegDirect { size, .. }
            | Self::FpImmediate { size, .. }
            | Self::FpMovemList { size, .. }
            | Self::FpScMovemList { size, .. } => *size = new_size,
        }
        op
    }

    /// Disassembly tokens. `addr` is the instruction address, used by
    /// PC-relative operands.
    #[must_use]
    pub fn format(&self, addr: u32) -> Vec<Token> {
        match self {
            Self::RegDirect { reg, .. } | Self::FpRegDirect { reg, .. } => {
                vec![Token::register(reg.name())]
            }
            Self::RegDirectPair { reg1, reg2, .. } => vec![
                Token::register(reg1.name()),
                Token::separator(":"),
                Token::register(reg2.name()),
            ],
            Self::RegMovemList { regs, .. } => format_reg_list(
                regs,
                |r| r.movem_index().unwrap_or(0),
                Some(8), // a run never crosses d7 into a0
            ),
            Self::FpMovemList { regs, .. } => format_reg_list(
                regs,
                |r| match r {
                    Reg::Fp(n) => n,
                    _ => 0,
                },
                None,
            ),
            Self::FpScMovemList { regs, .. } => {
                // The move order is fixed as fpcr, fpsr, then fpiar.
                let mut tokens = Vec::new();
                for reg in [Reg::Fpcr, Reg::Fpsr, Reg::Fpiar] {
                    if regs.contains(&reg) {
                        if !tokens.is_empty() {
                            tokens.push(Token::separator("/"));
                        }
                        tokens.push(Token::register(reg.name()));
                    }
                }
                tokens
            }
            Self::RegIndirect { reg, .. } => vec![
                Token::begin_memory("("),
                Token::register(reg.name()),
                Token::end_memory(")"),
            ],
            Self::RegIndirectPair { reg1, reg2, .. } => vec![
                Token::begin_memory("("),
                Token::register(reg1.name()),
                Token::end_memory(")"),
                Token::separator(":"),
                Token::begin_memory("("),
                Token::register(reg2.name()),
                Token::end_memory(")"),
            ],
            Self::RegIndirectPostInc { reg, .. } => vec![
                Token::begin_memory("("),
                Token::register(reg.name()),
                Token::end_memory(")"),
                Token::text("+"),
            ],
            Self::RegIndirectPreDec { reg, .. } => vec![
                Token::text("-"),
                Token::begin_memory("("),
                Token::register(reg.name()),
                Token::end_memory(")"),
            ],
            Self::RegIndirectDisp { base, disp, .. } => match base {
                BaseReg::Pc => {
                    let target = addr.wrapping_add(2).wrapping_add(*disp as u32);
                    vec![
                        Token::begin_memory("("),
                        Token::possible_address(format!("${target:08x}"), u64::from(target)),
                        Token::end_memory(")"),
                    ]
                }
                BaseReg::Reg(reg) => vec![
                    Token::integer(
                        format!("${}", signed_hex(i64::from(*disp), 4)),
                        *disp as u64,
                    ),
                    Token::begin_memory("("),
                    Token::register(reg.name()),
                    Token::end_memory(")"),
                ],
            },
            Self::RegIndirectIndex {
                base, disp, index, ..
            } => {
                let mut tokens = vec![
                    Token::begin_memory("("),
                    Token::integer(format!("${}", signed_hex(i64::from(*disp), 0)), *disp as u64),
                ];
                if let Some(base) = base {
                    tokens.push(Token::separator(","));
                    tokens.push(Token::register(match base {
                        BaseReg::Pc => "pc",
                        BaseReg::Reg(r) => r.name(),
                    }));
                }
                format_index_tokens(&mut tokens, *index);
                tokens.push(Token::end_memory(")"));
                tokens
            }
            Self::MemIndirectPostIndex {
                base,
                disp,
                index,
                outer,
                ..
            } => {
                let mut tokens = vec![
                    Token::begin_memory("("),
                    Token::begin_memory("["),
                    Token::integer(format!("${}", signed_hex(i64::from(*disp), 0)), *disp as u64),
                ];
                if let Some(base) = base {
                    tokens.push(Token::separator(","));
                    tokens.push(Token::register(match base {
                        BaseReg::Pc => "pc",
                        BaseReg::Reg(r) => r.name(),
                    }));
                }
                tokens.push(Token::end_memory("]"));
                format_index_tokens(&mut tokens, *index);
                if *outer != 0 {
                    tokens.push(Token::separator(","));
                    tokens.push(Token::integer(
                        format!("${}", signed_hex(i64::from(*outer), 0)),
                        *outer as u64,
                    ));
                }
                tokens.push(Token::end_memory(")"));
                tokens
            }
            Self::MemIndirectPreIndex {
                base,
                disp,
                index,
                outer,
                ..
            } => {
                let mut tokens = vec![
                    Token::begin_memory("("),
                    Token::begin_memory("["),
                    Token::integer(format!("${}", signed_hex(i64::from(*disp), 0)), *disp as u64),
                ];
                if let Some(base) = base {
                    tokens.push(Token::separator(","));
                    tokens.push(Token::register(match base {
                        BaseReg::Pc => "pc",
                        BaseReg::Reg(r) => r.name(),
                    }));
                }
                format_index_tokens(&mut tokens, *index);
                tokens.push(Token::end_memory("]"));
                if *outer != 0 {
                    tokens.push(Token::separator(","));
                    tokens.push(Token::integer(
                        format!("${}", signed_hex(i64::from(*outer), 0)),
                        *outer as u64,
                    ));
                }
                tokens.push(Token::end_memory(")"));
                tokens
            }
            Self::Absolute { address, field, .. } => {
                let digits = field.bytes() as usize;
                vec![
                    Token::begin_memory("("),
                    Token::possible_address(
                        format!("${address:0digits$x}"),
                        u64::from(*address),
                    ),
                    Token::end_memory(field.suffix()),
                ]
            }
            Self::Immediate { size, value } => vec![
                Token::text("#"),
                Token::integer(
                    format!("${}", signed_hex(*value, *size as usize)),
                    *value as u64,
                ),
            ],
            Self::FpImmediate { text, bits, .. } => vec![
                Token::text("#"),
                Token::integer(text.clone(), *bits as u64),
            ],
        }
    }

    /// Predecrement side effect, emitted before the main semantic.
    pub fn pre_il<B: IlBuilder>(&self, il: &mut B) -> Option<B::Expr> {
        match self {
            Self::RegIndirectPreDec { size, reg } => {
                let base = il.reg(4, *reg);
                let step = il.const_int(4, u64::from(*size));
                let next = il.sub(4, base, step, FlagWrite::None);
                Some(il.set_reg(4, *reg, next, FlagWrite::None))
            }
            _ => None,
        }
    }

    /// Postincrement side effect, emitted after the main semantic.
    pub fn post_il<B: IlBuilder>(&self, il: &mut B) -> Option<B::Expr> {
        match self {
            Self::RegIndirectPostInc { size, reg } => {
                let base = il.reg(4, *reg);
                let step = il.const_int(4, u64::from(*size));
                let next = il.add(4, base, step, FlagWrite::None);
                Some(il.set_reg(4, *reg, next, FlagWrite::None))
            }
            _ => None,
        }
    }

    /// Effective address of the operand. Operands without one (register
    /// direct, immediates, register lists) produce `unimplemented`.
    pub fn address_il<B: IlBuilder>(&self, il: &mut B, addr: u32) -> B::Expr {
        match self {
            Self::RegIndirect { reg, .. }
            | Self::RegIndirectPostInc { reg, .. }
            | Self::RegIndirectPreDec { reg, .. } => il.reg(4, *reg),
            Self::RegIndirectDisp { base, disp, .. } => match base {
                BaseReg::Pc => {
                    let target = addr.wrapping_add(2).wrapping_add(*disp as u32);
                    il.const_pointer(4, u64::from(target))
                }
                BaseReg::Reg(reg) => {
                    let base = il.reg(4, *reg);
                    let off = il.const_int(4, *disp as i64 as u64);
                    il.add(4, base, off, FlagWrite::None)
                }
            },
            Self::RegIndirectIndex {
                base, disp, index, ..
            } => {
                let base_off = Self::base_offset_il(il, addr, *base, *disp);
                match index {
                    None => base_off,
                    Some(ix) => {
                        let scaled = Self::index_il(il, *ix);
                        il.add(4, base_off, scaled, FlagWrite::None)
                    }
                }
            }
            Self::MemIndirectPostIndex {
                base,
                disp,
                index,
                outer,
                ..
            } => {
                let base_off = Self::base_offset_il(il, addr, *base, *disp);
                let inner = il.load(4, base_off);
                let scaled = match index {
                    None => il.const_int(4, 0),
                    Some(ix) => Self::index_il(il, *ix),
                };
                let od = il.const_int(4, *outer as i64 as u64);
                let outer_sum = il.add(4, scaled, od, FlagWrite::None);
                il.add(4, inner, outer_sum, FlagWrite::None)
            }
            Self::MemIndirectPreIndex {
                base,
                disp,
                index,
                outer,
                ..
            } => {
                let base_off = Self::base_offset_il(il, addr, *base, *disp);
                let scaled = match index {
                    None => il.const_int(4, 0),
                    Some(ix) => Self::index_il(il, *ix),
                };
                let indexed = il.add(4, base_off, scaled, FlagWrite::None);
                let inner = il.load(4, indexed);
                let od = il.const_int(4, *outer as i64 as u64);
                il.add(4, inner, od, FlagWrite::None)
            }
            Self::Absolute {
                address,
                field,
                width,
                ..
            } => {
                let value = il.const_int(field.bytes(), u64::from(*address));
                il.sign_extend(*width, value, FlagWrite::None)
            }
            _ => il.unimplemented(),
        }
    }

    fn base_offset_il<B: IlBuilder>(
        il: &mut B,
        addr: u32,
        base: Option<BaseReg>,
        disp: i32,
    ) -> B::Expr {
        match base {
            None => il.const_int(4, disp as i64 as u64),
            Some(base) => {
                let base_il = match base {
                    BaseReg::Pc => il.const_pointer(4, u64::from(addr.wrapping_add(2))),
                    BaseReg::Reg(reg) => il.reg(4, reg),
                };
                let off = il.const_int(4, disp as i64 as u64);
                il.add(4, base_il, off, FlagWrite::None)
            }
        }
    }

    fn index_il<B: IlBuilder>(il: &mut B, ix: IndexReg) -> B::Expr {
        let reg = il.reg(if ix.long { 4 } else { 2 }, ix.reg);
        let scale = il.const_int(1, u64::from(ix.scale));
        il.mult(4, reg, scale, FlagWrite::None)
    }

    /// Read the operand's value.
    pub fn source_il<B: IlBuilder>(&self, il: &mut B, addr: u32) -> B::Expr {
        match self {
            Self::RegDirect { size, reg } => {
                if *reg == Reg::Ccr {
                    // Materialize the CCR byte from the individual flags.
                    let c = il.flag_bit(1, Flag::C, 0);
                    let v = il.flag_bit(1, Flag::V, 1);
                    let z = il.flag_bit(1, Flag::Z, 2);
                    let n = il.flag_bit(1, Flag::N, 3);
                    let x = il.flag_bit(1, Flag::X, 4);
                    let cv = il.or_expr(1, c, v, FlagWrite::None);
                    let cvz = il.or_expr(1, cv, z, FlagWrite::None);
                    let cvzn = il.or_expr(1, cvz, n, FlagWrite::None);
                    il.or_expr(1, cvzn, x, FlagWrite::None)
                } else {
                    il.reg(*size, *reg)
                }
            }
            Self::FpRegDirect { size, reg } => il.reg(*size, *reg),
            Self::RegIndirect { size, .. }
            | Self::RegIndirectPostInc { size, .. }
            | Self::RegIndirectPreDec { size, .. }
            | Self::RegIndirectDisp { size, .. }
            | Self::RegIndirectIndex { size, .. }
            | Self::MemIndirectPostIndex { size, .. }
            | Self::MemIndirectPreIndex { size, .. }
            | Self::Absolute { size, .. } => {
                let ea = self.address_il(il, addr);
                il.load(*size, ea)
            }
            Self::Immediate { size, value } => il.const_int(*size, *value as u64),
            Self::FpImmediate { size, bits, .. } => il.const_int(*size, *bits as u64),
            // Pairs and lists are walked by the instructions that use them.
            Self::RegDirectPair { .. }
            | Self::RegIndirectPair { .. }
            | Self::RegMovemList { .. }
            | Self::FpMovemList { .. }
            | Self::FpScMovemList { .. } => il.unimplemented(),
        }
    }

    /// Write `value` to the operand, tagging the expression with `flags`.
    pub fn dest_il<B: IlBuilder>(
        &self,
        il: &mut B,
        addr: u32,
        value: B::Expr,
        flags: FlagWrite,
    ) -> B::Expr {
        match self {
            Self::RegDirect { size, reg } => {
                if *reg == Reg::Ccr {
                    return il.unimplemented();
                }
                match *size {
                    1 => {
                        if reg.is_address() {
                            // Byte writes to address registers are illegal.
                            il.unimplemented()
                        } else {
                            // Keep the upper 24 bits of the register.
                            let keep_mask = il.const_int(4, 0xffff_ff00);
                            let old = il.reg(4, *reg);
                            let kept = il.and_expr(4, keep_mask, old, FlagWrite::None);
                            let value_mask = il.const_int(4, 0xff);
                            let low = il.and_expr(4, value_mask, value, FlagWrite::None);
                            let merged = il.or_expr(4, kept, low, FlagWrite::None);
                            il.set_reg(4, *reg, merged, flags)
                        }
                    }
                    2 => {
                        if reg.is_address() {
                            // Word writes to address registers sign-extend.
                            let wide = il.sign_extend(4, value, FlagWrite::None);
                            il.set_reg(4, *reg, wide, flags)
                        } else {
                            let keep_mask = il.const_int(4, 0xffff_0000);
                            let old = il.reg(4, *reg);
                            let kept = il.and_expr(4, keep_mask, old, FlagWrite::None);
                            let value_mask = il.const_int(4, 0xffff);
                            let low = il.and_expr(4, value_mask, value, FlagWrite::None);
                            let merged = il.or_expr(4, kept, low, FlagWrite::None);
                            il.set_reg(4, *reg, merged, flags)
                        }
                    }
                    _ => il.set_reg(4, *reg, value, flags),
                }
            }
            Self::FpRegDirect { size, reg } => {
                if *size == 10 {
                    // FP data registers extend inbound values.
                    let wide = il.sign_extend(*size, value, FlagWrite::None);
                    il.set_reg(*size, *reg, wide, flags)
                } else {
                    il.set_reg(*size, *reg, value, flags)
                }
            }
            Self::RegIndirect { size, .. }
            | Self::RegIndirectPostInc { size, .. }
            | Self::RegIndirectPreDec { size, .. }
            | Self::RegIndirectIndex { size, .. }
            | Self::MemIndirectPostIndex { size, .. }
            | Self::MemIndirectPreIndex { size, .. }
            | Self::Absolute { size, .. } => {
                if self.is_pc_relative() {
                    return il.unimplemented();
                }
                let ea = self.address_il(il, addr);
                il.store(*size, ea, value, flags)
            }
            Self::RegIndirectDisp { size, base, .. } => match base {
                BaseReg::Pc => il.unimplemented(),
                BaseReg::Reg(_) => {
                    let ea = self.address_il(il, addr);
                    il.store(*size, ea, value, flags)
                }
            },
            Self::Immediate { .. } | Self::FpImmediate { .. } => il.unimplemented(),
            Self::RegDirectPair { .. }
            | Self::RegIndirectPair { .. }
            | Self::RegMovemList { .. }
            | Self::FpMovemList { .. }
            | Self::FpScMovemList { .. } => il.unimplemented(),
        }
    }

    /// True for the PC-relative forms, which are read-only.
    #[must_use]
    pub fn is_pc_relative(&self) -> bool {
        match self {
            Self::RegIndirectDisp { base, .. } => *base == BaseReg::Pc,
            Self::RegIndirectIndex { base, .. }
            | Self::MemIndirectPostIndex { base, .. }
            | Self::MemIndirectPreIndex { base, .. } => *base == Some(BaseReg::Pc),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AbsoluteField, BaseReg, IndexReg, Operand};
    use crate::registers::Reg;
    use crate::tokens::render;

    fn movem(regs: &[Reg]) -> Operand {
        Operand::RegMovemList {
            size: 4,
            regs: regs.to_vec(),
        }
    }

    #[test]
    fn movem_list_renders_runs_and_groups() {
        let op = movem(&[
            Reg::D(0),
            Reg::D(1),
            Reg::D(2),
            Reg::A(0),
            Reg::A(2),
            Reg::A(4),
            Reg::A(5),
            Reg::A(6),
            Reg::A(7),
        ]);
        assert_eq!(render(&op.format(0)), "d0-d2/a0/a2/a4-sp");
    }

    #[test]
    fn movem_run_never_crosses_into_a0() {
        let all: Vec<Reg> = (0..16).map(Reg::from_movem_index).collect();
        assert_eq!(render(&movem(&all).format(0)), "d0-d7/a0-sp");
    }

    #[test]
    fn pc_displacement_renders_resolved_address() {
        let op = Operand::RegIndirectDisp {
            size: 2,
            base: BaseReg::Pc,
            disp: 0x10,
        };
        assert_eq!(render(&op.format(0x1000)), "($00001012)");
    }

    #[test]
    fn negative_displacement_keeps_sign_outside_digits() {
        let op = Operand::RegIndirectDisp {
            size: 2,
            base: BaseReg::Reg(Reg::A(0)),
            disp: -4,
        };
        assert_eq!(render(&op.format(0)), "$-004(a0)");
    }

    #[test]
    fn indexed_operand_renders_scale_only_when_scaled() {
        let op = Operand::RegIndirectIndex {
            size: 4,
            base: Some(BaseReg::Reg(Reg::A(1))),
            disp: 0x12,
            index: Some(IndexReg {
                reg: Reg::D(3),
                long: true,
                scale: 4,
            }),
        };
        assert_eq!(render(&op.format(0)), "($12,a1,d3.l*4)");

        let unscaled = Operand::RegIndirectIndex {
            size: 4,
            base: Some(BaseReg::Reg(Reg::A(1))),
            disp: 0x12,
            index: Some(IndexReg {
                reg: Reg::D(3),
                long: false,
                scale: 1,
            }),
        };
        assert_eq!(render(&unscaled.format(0)), "($12,a1,d3.w)");
    }

    #[test]
    fn memory_indirect_renders_inner_brackets() {
        let op = Operand::MemIndirectPostIndex {
            size: 4,
            base: Some(BaseReg::Reg(Reg::A(0))),
            disp: 0x12,
            index: Some(IndexReg {
                reg: Reg::A(1),
                long: true,
                scale: 4,
            }),
            outer: 0x34,
        };
        assert_eq!(render(&op.format(0)), "([$12,a0],a1.l*4,$34)");

        let pre = Operand::MemIndirectPreIndex {
            size: 4,
            base: Some(BaseReg::Reg(Reg::A(0))),
            disp: 0x12,
            index: Some(IndexReg {
                reg: Reg::A(1),
                long: true,
                scale: 4,
            }),
            outer: 0x34,
        };
        assert_eq!(render(&pre.format(0)), "([$12,a0,a1.l*4],$34)");
    }

    #[test]
    fn absolute_operand_shows_field_width() {
        let short = Operand::Absolute {
            size: 2,
            address: 0x1234,
            field: AbsoluteField::Word,
            width: 4,
        };
        assert_eq!(render(&short.format(0)), "($1234).w");

        let long = Operand::Absolute {
            size: 2,
            address: 0x0001_0000,
            field: AbsoluteField::Long,
            width: 4,
        };
        assert_eq!(render(&long.format(0)), "($10000).l");
    }

    #[test]
    fn fp_sc_list_renders_in_fixed_order() {
        let op = Operand::FpScMovemList {
            size: 4,
            regs: vec![Reg::Fpiar, Reg::Fpcr],
        };
        assert_eq!(render(&op.format(0)), "fpcr/fpiar");
    }
}
