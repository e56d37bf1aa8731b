//! IR lifting.
//!
//! One decoded instruction expands to a short IL sequence: predecrement
//! side effects first, then the instruction semantic, then postincrement
//! side effects. MOVEM is the exception: it performs its own address
//! arithmetic and suppresses the operand-level effects.
//!
//! Flag policy:
//! - arithmetic (add/sub/neg and the X-chained forms) writes all five
//!   flags;
//! - logical operations, moves and compares write NZVC;
//! - explicit transfers to CCR/SR decompose into per-flag assignments.
//!
//! Instructions with no faithful architecture-neutral model (BCD, bit
//! fields, FP arithmetic, cache/MMU control) emit exactly one
//! `unimplemented` node; they still decoded, so text output stays
//! accurate.

use crate::M68k;
use crate::flags::{Condition, Flag, FlagWrite};
use crate::il::{FlagCond, IlBuilder};
use crate::instruction::{Instruction, Mnemonic, Unimplemented};
use crate::operand::Operand;
use crate::registers::Reg;

const SP: Reg = Reg::A(7);
const TEMP0: Reg = Reg::Temp(0);

fn emit_unimplemented<B: IlBuilder>(il: &mut B) {
    let expr = il.unimplemented();
    il.emit(expr);
}

impl M68k {
    /// Emit the IL for one instruction. Returns the bytes consumed.
    pub fn lift<B: IlBuilder>(&self, ins: &Instruction, addr: u32, il: &mut B) -> usize {
        if ins.mnemonic == Mnemonic::Movem {
            // movem overrides the operand-level pre/post effects
            self.lift_instruction(ins, addr, il);
            return ins.length;
        }

        for operand in [&ins.source, &ins.dest, &ins.third].into_iter().flatten() {
            if let Some(expr) = operand.pre_il(il) {
                il.emit(expr);
            }
        }

        self.lift_instruction(ins, addr, il);

        for operand in [&ins.source, &ins.dest, &ins.third].into_iter().flatten() {
            if let Some(expr) = operand.post_il(il) {
                il.emit(expr);
            }
        }
        ins.length
    }

    /// IL for input the decoder rejected: a single `unimplemented` node.
    pub fn lift_unimplemented<B: IlBuilder>(&self, sentinel: Unimplemented, il: &mut B) -> usize {
        emit_unimplemented(il);
        sentinel.length
    }

    fn lift_instruction<B: IlBuilder>(&self, ins: &Instruction, addr: u32, il: &mut B) {
        let size = ins.size_bytes().unwrap_or(4);
        let src = ins.source.as_ref();
        let dst = ins.dest.as_ref();
        let third = ins.third.as_ref();

        match ins.mnemonic {
            Mnemonic::Move | Mnemonic::Moveq => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                if ins.mnemonic == Mnemonic::Move
                    && matches!(
                        dest,
                        Operand::RegDirect {
                            reg: Reg::Ccr | Reg::Sr,
                            ..
                        }
                    )
                {
                    // Decompose into the five flag-bit assignments.
                    let value = source.source_il(il, addr);
                    let assign = il.set_reg(1, TEMP0, value, FlagWrite::None);
                    il.emit(assign);
                    for flag in [Flag::C, Flag::V, Flag::Z, Flag::N, Flag::X] {
                        let loaded = il.reg(1, TEMP0);
                        let mask = il.const_int(1, 1 << flag.ccr_bit());
                        let bit = il.test_bit(1, loaded, mask);
                        let set = il.set_flag(flag, bit);
                        il.emit(set);
                    }
                    return;
                }
                let control = |op: &Operand| {
                    matches!(
                        op,
                        Operand::RegDirect {
                            reg: Reg::Usp | Reg::Ccr | Reg::Sr,
                            ..
                        }
                    )
                };
                let flags = if control(source) || control(dest) {
                    FlagWrite::None
                } else {
                    FlagWrite::Nzvc
                };
                let value = source.source_il(il, addr);
                let assign = dest.dest_il(il, addr, value, flags);
                il.emit(assign);
            }

            Mnemonic::Movea | Mnemonic::Movec => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let value = source.source_il(il, addr);
                let assign = dest.dest_il(il, addr, value, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Clr => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let zero = il.const_int(4, 0);
                let assign = dest.dest_il(il, addr, zero, FlagWrite::Nzvc);
                il.emit(assign);
            }

            Mnemonic::Add | Mnemonic::Addi | Mnemonic::Addq => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let sum = il.add(size, a, b, FlagWrite::All);
                let assign = dest.dest_il(il, addr, sum, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Adda => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let dest = dest.with_size(4);
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let wide = il.sign_extend(4, b, FlagWrite::None);
                let sum = il.add(4, a, wide, FlagWrite::None);
                let assign = dest.dest_il(il, addr, sum, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Addx => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let sum = il.add(size, a, b, FlagWrite::All);
                let x = il.flag(Flag::X);
                let chained = il.add(size, sum, x, FlagWrite::All);
                let assign = dest.dest_il(il, addr, chained, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Sub | Mnemonic::Subi | Mnemonic::Subq => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let diff = il.sub(size, a, b, FlagWrite::All);
                let assign = dest.dest_il(il, addr, diff, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Suba => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let dest = dest.with_size(4);
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let wide = il.sign_extend(4, b, FlagWrite::None);
                let diff = il.sub(4, a, wide, FlagWrite::None);
                let assign = dest.dest_il(il, addr, diff, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Subx => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let diff = il.sub(size, a, b, FlagWrite::All);
                let x = il.flag(Flag::X);
                let chained = il.sub(size, diff, x, FlagWrite::All);
                let assign = dest.dest_il(il, addr, chained, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Neg => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let value = dest.source_il(il, addr);
                let negated = il.neg(size, value, FlagWrite::All);
                let assign = dest.dest_il(il, addr, negated, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Negx => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let value = dest.source_il(il, addr);
                let negated = il.neg(size, value, FlagWrite::All);
                let x = il.flag(Flag::X);
                let chained = il.sub(size, negated, x, FlagWrite::All);
                let assign = dest.dest_il(il, addr, chained, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Pack => {
                let (Some(source), Some(dest), Some(adjust)) = (src, dst, third) else {
                    return emit_unimplemented(il);
                };
                let a = source.source_il(il, addr);
                let b = adjust.source_il(il, addr);
                let sum = il.add(2, a, b, FlagWrite::None);
                let hold = il.set_reg(2, TEMP0, sum, FlagWrite::None);
                il.emit(hold);
                let low = {
                    let t = il.reg(2, TEMP0);
                    let mask = il.const_int(2, 0x000F);
                    il.and_expr(2, t, mask, FlagWrite::None)
                };
                let high = {
                    let t = il.reg(2, TEMP0);
                    let mask = il.const_int(2, 0x0F00);
                    let masked = il.and_expr(2, t, mask, FlagWrite::None);
                    let shift = il.const_int(1, 4);
                    il.logical_shift_right(2, masked, shift, FlagWrite::None)
                };
                let packed = il.or_expr(1, low, high, FlagWrite::None);
                let assign = dest.dest_il(il, addr, packed, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Unpk => {
                let (Some(source), Some(dest), Some(adjust)) = (src, dst, third) else {
                    return emit_unimplemented(il);
                };
                let value = source.source_il(il, addr);
                let hold = il.set_reg(1, TEMP0, value, FlagWrite::None);
                il.emit(hold);
                let low = {
                    let t = il.reg(1, TEMP0);
                    let mask = il.const_int(1, 0x0F);
                    il.and_expr(2, t, mask, FlagWrite::None)
                };
                let high = {
                    let t = il.reg(1, TEMP0);
                    let mask = il.const_int(1, 0xF0);
                    let masked = il.and_expr(2, t, mask, FlagWrite::None);
                    let shift = il.const_int(1, 4);
                    il.shift_left(2, masked, shift, FlagWrite::None)
                };
                let spread = il.or_expr(2, low, high, FlagWrite::None);
                let b = adjust.source_il(il, addr);
                let sum = il.add(2, spread, b, FlagWrite::None);
                let assign = dest.dest_il(il, addr, sum, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Muls | Mnemonic::Mulu => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                match dest {
                    Operand::RegDirectPair { reg1, reg2, .. } => {
                        let a = source.source_il(il, addr);
                        let b = il.reg(4, *reg2);
                        let product = il.mult(4, a, b, FlagWrite::Nzvc);
                        let assign = il.set_reg_split(4, *reg1, *reg2, product, FlagWrite::None);
                        il.emit(assign);
                    }
                    Operand::RegDirect { reg, .. } => {
                        let a = source.source_il(il, addr);
                        let b = dest.source_il(il, addr);
                        let product = il.mult(4, a, b, FlagWrite::Nzvc);
                        let assign = il.set_reg(4, *reg, product, FlagWrite::None);
                        il.emit(assign);
                    }
                    _ => emit_unimplemented(il),
                }
            }

            Mnemonic::Divs | Mnemonic::Divu => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let signed = ins.mnemonic == Mnemonic::Divs;
                if ins.size_bytes() == Some(2) {
                    // Word divide: 32-bit result, remainder packed in the
                    // upper half, so widen the destination first.
                    let rem = {
                        let a = dest.source_il(il, addr);
                        let b = source.source_il(il, addr);
                        if signed {
                            il.mod_signed(2, a, b)
                        } else {
                            il.mod_unsigned(2, a, b)
                        }
                    };
                    let shift = il.const_int(1, 16);
                    let high = il.shift_left(4, rem, shift, FlagWrite::None);
                    let quot = {
                        let a = dest.source_il(il, addr);
                        let b = source.source_il(il, addr);
                        if signed {
                            il.div_signed(2, a, b, FlagWrite::Nzvc)
                        } else {
                            il.div_unsigned(2, a, b, FlagWrite::Nzvc)
                        }
                    };
                    let packed = il.or_expr(4, high, quot, FlagWrite::None);
                    let dest = dest.with_size(4);
                    let assign = dest.dest_il(il, addr, packed, FlagWrite::None);
                    il.emit(assign);
                } else if let Operand::RegDirectPair { reg1, reg2, .. } = dest {
                    // 64/32 divide: the pair holds the 64-bit dividend.
                    let dividend = |il: &mut B| {
                        let hi = il.reg(4, *reg1);
                        let shift = il.const_int(1, 32);
                        let high = il.shift_left(8, hi, shift, FlagWrite::None);
                        let lo = il.reg(4, *reg2);
                        il.or_expr(8, high, lo, FlagWrite::None)
                    };
                    let rem = {
                        let a = dividend(il);
                        let b = source.source_il(il, addr);
                        if signed {
                            il.mod_signed(4, a, b)
                        } else {
                            il.mod_unsigned(4, a, b)
                        }
                    };
                    let hold = il.set_reg(4, TEMP0, rem, FlagWrite::None);
                    il.emit(hold);
                    let quot = {
                        let a = dividend(il);
                        let b = source.source_il(il, addr);
                        if signed {
                            il.div_signed(4, a, b, FlagWrite::Nzvc)
                        } else {
                            il.div_unsigned(4, a, b, FlagWrite::Nzvc)
                        }
                    };
                    let set_quot = il.set_reg(4, *reg2, quot, FlagWrite::None);
                    il.emit(set_quot);
                    let saved = il.reg(4, TEMP0);
                    let set_rem = il.set_reg(4, *reg1, saved, FlagWrite::None);
                    il.emit(set_rem);
                } else {
                    let a = dest.source_il(il, addr);
                    let b = source.source_il(il, addr);
                    let quot = if signed {
                        il.div_signed(4, a, b, FlagWrite::Nzvc)
                    } else {
                        il.div_unsigned(4, a, b, FlagWrite::Nzvc)
                    };
                    let assign = dest.dest_il(il, addr, quot, FlagWrite::None);
                    il.emit(assign);
                }
            }

            Mnemonic::Divsl | Mnemonic::Divul => {
                let (Some(source), Some(Operand::RegDirectPair { reg1, reg2, .. })) = (src, dst)
                else {
                    return emit_unimplemented(il);
                };
                let signed = ins.mnemonic == Mnemonic::Divsl;
                let rem = {
                    let a = il.reg(4, *reg2);
                    let b = source.source_il(il, addr);
                    if signed {
                        il.mod_signed(4, a, b)
                    } else {
                        il.mod_unsigned(4, a, b)
                    }
                };
                let set_rem = il.set_reg(4, *reg1, rem, FlagWrite::None);
                il.emit(set_rem);
                let quot = {
                    let a = il.reg(4, *reg2);
                    let b = source.source_il(il, addr);
                    if signed {
                        il.div_signed(4, a, b, FlagWrite::Nzvc)
                    } else {
                        il.div_unsigned(4, a, b, FlagWrite::Nzvc)
                    }
                };
                let set_quot = il.set_reg(4, *reg2, quot, FlagWrite::None);
                il.emit(set_quot);
            }

            Mnemonic::Cas => {
                let (Some(compare), Some(update), Some(memory)) = (src, dst, third) else {
                    return emit_unimplemented(il);
                };
                let (skip, skip_found) = skip_label(ins, addr, il);

                let mem = memory.source_il(il, addr);
                let cmp = compare.source_il(il, addr);
                let test = il.sub(size, mem, cmp, FlagWrite::Nzvc);
                il.emit(test);

                let equal = il.create_label();
                let not_equal = il.create_label();
                let cond = il.flag_condition(FlagCond::Equal);
                let branch = il.if_expr(cond, &equal, &not_equal);
                il.emit(branch);

                il.mark_label(&equal);
                let new_value = update.source_il(il, addr);
                let store = memory.dest_il(il, addr, new_value, FlagWrite::None);
                il.emit(store);
                let done = il.goto(&skip);
                il.emit(done);

                il.mark_label(&not_equal);
                let observed = memory.source_il(il, addr);
                let reload = compare.dest_il(il, addr, observed, FlagWrite::None);
                il.emit(reload);

                if !skip_found {
                    il.mark_label(&skip);
                }
            }

            Mnemonic::Cas2 => {
                let (
                    Some(Operand::RegDirectPair {
                        reg1: c1, reg2: c2, ..
                    }),
                    Some(Operand::RegDirectPair {
                        reg1: u1, reg2: u2, ..
                    }),
                    Some(Operand::RegIndirectPair {
                        reg1: a1, reg2: a2, ..
                    }),
                ) = (src, dst, third)
                else {
                    return emit_unimplemented(il);
                };
                let (skip, skip_found) = skip_label(ins, addr, il);

                let load1 = {
                    let ea = il.reg(4, *a1);
                    il.load(size, ea)
                };
                let cmp1 = il.reg(size, *c1);
                let test1 = il.sub(size, load1, cmp1, FlagWrite::Nzvc);
                il.emit(test1);

                let equal = il.create_label();
                let not_equal = il.create_label();
                let check2 = il.create_label();
                let cond1 = il.flag_condition(FlagCond::Equal);
                let branch1 = il.if_expr(cond1, &check2, &not_equal);
                il.emit(branch1);

                il.mark_label(&check2);
                let load2 = {
                    let ea = il.reg(4, *a2);
                    il.load(size, ea)
                };
                let cmp2 = il.reg(size, *c2);
                let test2 = il.sub(size, load2, cmp2, FlagWrite::Nzvc);
                il.emit(test2);
                let cond2 = il.flag_condition(FlagCond::Equal);
                let branch2 = il.if_expr(cond2, &equal, &not_equal);
                il.emit(branch2);

                il.mark_label(&equal);
                for (mem, update) in [(a1, u1), (a2, u2)] {
                    let value = il.reg(size, *update);
                    let ea = il.reg(4, *mem);
                    let store = il.store(size, ea, value, FlagWrite::None);
                    il.emit(store);
                }
                let done = il.goto(&skip);
                il.emit(done);

                il.mark_label(&not_equal);
                for (mem, compare) in [(a1, c1), (a2, c2)] {
                    let ea = il.reg(4, *mem);
                    let value = il.load(size, ea);
                    let reload = il.set_reg(size, *compare, value, FlagWrite::None);
                    il.emit(reload);
                }
                let done = il.goto(&skip);
                il.emit(done);

                if !skip_found {
                    il.mark_label(&skip);
                }
            }

            Mnemonic::Chk => {
                let (Some(bound), Some(value)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let (skip, skip_found) = skip_label(ins, addr, il);
                let trap = il.create_label();
                let check = il.create_label();

                let a = value.source_il(il, addr);
                let zero = il.const_int(size, 0);
                let below = il.compare_unsigned_less_than(size, a, zero);
                let branch = il.if_expr(below, &trap, &check);
                il.emit(branch);

                il.mark_label(&check);
                let a = value.source_il(il, addr);
                let b = bound.source_il(il, addr);
                let above = il.compare_unsigned_greater_than(size, a, b);
                let branch = il.if_expr(above, &trap, &skip);
                il.emit(branch);

                il.mark_label(&trap);
                let call = il.system_call();
                il.emit(call);
                let done = il.goto(&skip);
                il.emit(done);

                if !skip_found {
                    il.mark_label(&skip);
                }
            }

            Mnemonic::Chk2 | Mnemonic::Cmp2 => {
                let (Some(bounds), Some(value)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let (skip, skip_found) = skip_label(ins, addr, il);

                let base = bounds.address_il(il, addr);
                let hold = il.set_reg(4, TEMP0, base, FlagWrite::None);
                il.emit(hold);

                if ins.mnemonic == Mnemonic::Chk2 {
                    let trap = il.create_label();
                    let check = il.create_label();

                    let a = value.source_il(il, addr);
                    let lower = {
                        let t = il.reg(4, TEMP0);
                        il.load(size, t)
                    };
                    let below = il.compare_unsigned_less_than(size, a, lower);
                    let branch = il.if_expr(below, &trap, &check);
                    il.emit(branch);

                    il.mark_label(&check);
                    let a = value.source_il(il, addr);
                    let upper = {
                        let t = il.reg(4, TEMP0);
                        let offset = il.const_int(4, u64::from(size));
                        let ea = il.add(4, t, offset, FlagWrite::None);
                        il.load(size, ea)
                    };
                    let above = il.compare_unsigned_greater_than(size, a, upper);
                    let branch = il.if_expr(above, &trap, &skip);
                    il.emit(branch);

                    il.mark_label(&trap);
                    let call = il.system_call();
                    il.emit(call);
                    let done = il.goto(&skip);
                    il.emit(done);
                } else {
                    let check = il.create_label();

                    let a = value.source_il(il, addr);
                    let lower = {
                        let t = il.reg(4, TEMP0);
                        il.load(size, t)
                    };
                    let test = il.sub(size, a, lower, FlagWrite::Nzvc);
                    il.emit(test);
                    let cond = il.flag_condition(FlagCond::UnsignedLessThan);
                    let branch = il.if_expr(cond, &skip, &check);
                    il.emit(branch);

                    il.mark_label(&check);
                    let a = value.source_il(il, addr);
                    let upper = {
                        let t = il.reg(4, TEMP0);
                        let offset = il.const_int(4, u64::from(size));
                        let ea = il.add(4, t, offset, FlagWrite::None);
                        il.load(size, ea)
                    };
                    let test = il.sub(size, a, upper, FlagWrite::Nzvc);
                    il.emit(test);
                    let done = il.goto(&skip);
                    il.emit(done);
                }

                if !skip_found {
                    il.mark_label(&skip);
                }
            }

            Mnemonic::Btst | Mnemonic::Bchg | Mnemonic::Bclr | Mnemonic::Bset => {
                let (Some(number), Some(target)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                // Bit numbers wrap at the operand width: 32 for register
                // targets, 8 for memory bytes.
                let width = 8 * target.size();
                let bit_mask = |il: &mut B| {
                    let n = number.source_il(il, addr);
                    let modulus = il.const_int(1, u64::from(width));
                    let bit = il.mod_unsigned(1, n, modulus);
                    let one = il.const_int(4, 1);
                    il.shift_left(4, one, bit, FlagWrite::None)
                };

                let current = target.source_il(il, addr);
                let mask = bit_mask(il);
                let tested = il.test_bit(4, current, mask);
                let zero = il.const_int(4, 0);
                let is_set = il.compare_not_equal(4, tested, zero);
                let set_z = il.set_flag(Flag::Z, is_set);
                il.emit(set_z);

                let updated = match ins.mnemonic {
                    Mnemonic::Bchg => {
                        let current = target.source_il(il, addr);
                        let mask = bit_mask(il);
                        Some(il.xor_expr(4, current, mask, FlagWrite::None))
                    }
                    Mnemonic::Bclr => {
                        let current = target.source_il(il, addr);
                        let mask = bit_mask(il);
                        let inverted = il.not_expr(4, mask, FlagWrite::None);
                        Some(il.and_expr(4, current, inverted, FlagWrite::None))
                    }
                    Mnemonic::Bset => {
                        let current = target.source_il(il, addr);
                        let mask = bit_mask(il);
                        Some(il.or_expr(4, current, mask, FlagWrite::None))
                    }
                    _ => None,
                };
                if let Some(updated) = updated {
                    let assign = target.dest_il(il, addr, updated, FlagWrite::None);
                    il.emit(assign);
                }
            }

            Mnemonic::Asl
            | Mnemonic::Asr
            | Mnemonic::Lsl
            | Mnemonic::Lsr
            | Mnemonic::Rol
            | Mnemonic::Ror
            | Mnemonic::Roxl
            | Mnemonic::Roxr => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                // The memory forms shift by one.
                let count = match src {
                    Some(source) => source.source_il(il, addr),
                    None => il.const_int(1, 1),
                };
                let value = dest.source_il(il, addr);
                let shifted = match ins.mnemonic {
                    Mnemonic::Asl | Mnemonic::Lsl => {
                        il.shift_left(size, value, count, FlagWrite::All)
                    }
                    Mnemonic::Asr => il.arith_shift_right(size, value, count, FlagWrite::All),
                    Mnemonic::Lsr => il.logical_shift_right(size, value, count, FlagWrite::All),
                    Mnemonic::Rol => il.rotate_left(size, value, count, FlagWrite::All),
                    Mnemonic::Ror => il.rotate_right(size, value, count, FlagWrite::All),
                    Mnemonic::Roxl => {
                        let x = il.flag(Flag::X);
                        il.rotate_left_carry(size, value, count, x, FlagWrite::All)
                    }
                    _ => {
                        let x = il.flag(Flag::X);
                        il.rotate_right_carry(size, value, count, x, FlagWrite::All)
                    }
                };
                let assign = dest.dest_il(il, addr, shifted, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Cmp | Mnemonic::Cmpi | Mnemonic::Cmpm => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let test = il.sub(size, a, b, FlagWrite::Nzvc);
                il.emit(test);
            }

            Mnemonic::Cmpa => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let dest = dest.with_size(4);
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let wide = il.sign_extend(4, b, FlagWrite::None);
                let test = il.sub(4, a, wide, FlagWrite::Nzvc);
                il.emit(test);
            }

            Mnemonic::Tas => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let value = dest.source_il(il, addr);
                let hold = il.set_reg(1, TEMP0, value, FlagWrite::Nzvc);
                il.emit(hold);
                let loaded = il.reg(1, TEMP0);
                let mask = il.const_int(1, 0x80);
                let set = il.or_expr(1, loaded, mask, FlagWrite::None);
                let assign = dest.dest_il(il, addr, set, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Tst => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let value = dest.source_il(il, addr);
                let zero = il.const_int(4, 0);
                let test = il.sub(size, value, zero, FlagWrite::Nzvc);
                il.emit(test);
            }

            Mnemonic::And | Mnemonic::Andi => {
                if lift_ccr_immediate(ins, il, |il, flag, set| {
                    // AND clears every flag not named in the mask.
                    if !set {
                        let zero = il.const_int(1, 0);
                        let assign = il.set_flag(flag, zero);
                        il.emit(assign);
                    }
                }) {
                    return;
                }
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let result = il.and_expr(size, a, b, FlagWrite::Nzvc);
                let assign = dest.dest_il(il, addr, result, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Or | Mnemonic::Ori => {
                if lift_ccr_immediate(ins, il, |il, flag, set| {
                    // OR sets exactly the named flags.
                    if set {
                        let one = il.const_int(1, 1);
                        let assign = il.set_flag(flag, one);
                        il.emit(assign);
                    }
                }) {
                    return;
                }
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let result = il.or_expr(size, a, b, FlagWrite::Nzvc);
                let assign = dest.dest_il(il, addr, result, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Eor | Mnemonic::Eori => {
                if lift_ccr_immediate(ins, il, |il, flag, set| {
                    // EOR toggles the named flags.
                    if set {
                        let current = il.flag(flag);
                        let one = il.const_int(1, 1);
                        let toggled = il.xor_expr(1, current, one, FlagWrite::None);
                        let assign = il.set_flag(flag, toggled);
                        il.emit(assign);
                    }
                }) {
                    return;
                }
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let a = dest.source_il(il, addr);
                let b = source.source_il(il, addr);
                let result = il.xor_expr(size, a, b, FlagWrite::Nzvc);
                let assign = dest.dest_il(il, addr, result, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Not => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let value = dest.source_il(il, addr);
                let inverted = il.not_expr(size, value, FlagWrite::Nzvc);
                let assign = dest.dest_il(il, addr, inverted, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Swap => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let value = dest.source_il(il, addr);
                let half = il.const_int(1, 16);
                let rotated = il.rotate_right(4, value, half, FlagWrite::None);
                let assign = dest.dest_il(il, addr, rotated, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Exg => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let a = source.source_il(il, addr);
                let hold = il.set_reg(4, TEMP0, a, FlagWrite::None);
                il.emit(hold);
                let b = dest.source_il(il, addr);
                let first = source.dest_il(il, addr, b, FlagWrite::None);
                il.emit(first);
                let saved = il.reg(4, TEMP0);
                let second = dest.dest_il(il, addr, saved, FlagWrite::None);
                il.emit(second);
            }

            Mnemonic::Ext => match dst {
                Some(dest) => match dest {
                    Operand::RegDirect { size: 2, reg } => {
                        // ext.w: byte to word, upper word untouched
                        let value = il.reg(1, *reg);
                        let wide = il.sign_extend(2, value, FlagWrite::Nzvc);
                        let assign = dest.dest_il(il, addr, wide, FlagWrite::None);
                        il.emit(assign);
                    }
                    Operand::RegDirect { size: 4, reg } => {
                        // ext.l: word to long
                        let value = il.reg(2, *reg);
                        let wide = il.sign_extend(4, value, FlagWrite::Nzvc);
                        let assign = dest.dest_il(il, addr, wide, FlagWrite::None);
                        il.emit(assign);
                    }
                    _ => emit_unimplemented(il),
                },
                None => emit_unimplemented(il),
            },

            Mnemonic::Extb => match dst {
                Some(dest) => match dest {
                    Operand::RegDirect { reg, .. } => {
                        let value = il.reg(1, *reg);
                        let wide = il.sign_extend(4, value, FlagWrite::Nzvc);
                        let assign = dest.dest_il(il, addr, wide, FlagWrite::None);
                        il.emit(assign);
                    }
                    _ => emit_unimplemented(il),
                },
                None => emit_unimplemented(il),
            },

            Mnemonic::Movem => self.lift_movem(ins, addr, il),

            Mnemonic::Lea => {
                let (Some(source), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let ea = source.address_il(il, addr);
                let assign = dest.dest_il(il, addr, ea, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Pea => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let ea = dest.address_il(il, addr);
                let pushed = il.push(4, ea);
                il.emit(pushed);
            }

            Mnemonic::Link => {
                let (Some(frame), Some(displacement)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let old = frame.source_il(il, addr);
                let pushed = il.push(4, old);
                il.emit(pushed);
                let sp_now = il.reg(4, SP);
                let assign = frame.dest_il(il, addr, sp_now, FlagWrite::None);
                il.emit(assign);
                let sp_now = il.reg(4, SP);
                let disp = displacement.source_il(il, addr);
                let wide = il.sign_extend(4, disp, FlagWrite::None);
                let moved = il.add(4, sp_now, wide, FlagWrite::None);
                let set_sp = il.set_reg(4, SP, moved, FlagWrite::None);
                il.emit(set_sp);
            }

            Mnemonic::Unlk => {
                let Some(frame) = src else {
                    return emit_unimplemented(il);
                };
                let value = frame.source_il(il, addr);
                let set_sp = il.set_reg(4, SP, value, FlagWrite::None);
                il.emit(set_sp);
                let popped = il.pop(4);
                let assign = frame.dest_il(il, addr, popped, FlagWrite::None);
                il.emit(assign);
            }

            Mnemonic::Jmp | Mnemonic::Bra => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let target = Self::static_target(dest, addr);
                if let Some(label) = target.and_then(|t| il.label_for_address(t)) {
                    let jump = il.goto(&label);
                    il.emit(jump);
                } else {
                    let ea = dest.address_il(il, addr);
                    let jump = il.jump(ea);
                    il.emit(jump);
                }
            }

            Mnemonic::Jsr | Mnemonic::Bsr => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let ea = dest.address_il(il, addr);
                let call = il.call(ea);
                il.emit(call);
            }

            Mnemonic::Bcc(cond) => {
                let (Some(dest), Some(flag_cond)) = (dst, cond.flag_cond()) else {
                    return emit_unimplemented(il);
                };
                let cond_il = il.flag_condition(flag_cond);

                let target = Self::static_target(dest, addr);
                let mut indirect = false;
                let t = match target.and_then(|t| il.label_for_address(t)) {
                    Some(label) => label,
                    None => {
                        indirect = true;
                        il.create_label()
                    }
                };
                let (f, f_found) = skip_label(ins, addr, il);

                let branch = il.if_expr(cond_il, &t, &f);
                il.emit(branch);

                if indirect {
                    il.mark_label(&t);
                    let ea = dest.address_il(il, addr);
                    let jump = il.jump(ea);
                    il.emit(jump);
                }
                if !f_found {
                    il.mark_label(&f);
                }
            }

            Mnemonic::Dbcc(cond) => {
                let (Some(counter), Some(dest)) = (src, dst) else {
                    return emit_unimplemented(il);
                };
                let cond_il = match cond.flag_cond() {
                    Some(fc) => il.flag_condition(fc),
                    None if cond == Condition::True => il.const_int(1, 1),
                    None => il.const_int(1, 0),
                };

                let target = Self::static_target(dest, addr);
                let mut indirect = false;
                let branch_label = match target.and_then(|t| il.label_for_address(t)) {
                    Some(label) => label,
                    None => {
                        indirect = true;
                        il.create_label()
                    }
                };
                let (skip, skip_found) = skip_label(ins, addr, il);
                let decrement = il.create_label();

                // Condition true: fall through without touching the counter.
                let test = il.if_expr(cond_il, &skip, &decrement);
                il.emit(test);

                il.mark_label(&decrement);
                let value = counter.source_il(il, addr);
                let one = il.const_int(2, 1);
                let next = il.sub(2, value, one, FlagWrite::None);
                let hold = il.set_reg(2, TEMP0, next, FlagWrite::None);
                il.emit(hold);
                let saved = il.reg(2, TEMP0);
                let write_back = counter.dest_il(il, addr, saved, FlagWrite::None);
                il.emit(write_back);

                let saved = il.reg(2, TEMP0);
                let minus_one = il.const_int(2, (-1i64) as u64);
                let expired = il.compare_equal(2, saved, minus_one);
                let branch = il.if_expr(expired, &skip, &branch_label);
                il.emit(branch);

                if indirect {
                    il.mark_label(&branch_label);
                    let ea = dest.address_il(il, addr);
                    let jump = il.jump(ea);
                    il.emit(jump);
                }
                if !skip_found {
                    il.mark_label(&skip);
                }
            }

            Mnemonic::Scc(cond) => {
                let Some(dest) = dst else {
                    return emit_unimplemented(il);
                };
                let cond_il = match cond.flag_cond() {
                    Some(fc) => il.flag_condition(fc),
                    None if cond == Condition::True => il.const_int(1, 1),
                    None => il.const_int(1, 0),
                };
                let (skip, skip_found) = skip_label(ins, addr, il);
                let set_dest = il.create_label();
                let clear_dest = il.create_label();

                let branch = il.if_expr(cond_il, &set_dest, &clear_dest);
                il.emit(branch);

                il.mark_label(&set_dest);
                let one = il.const_int(1, 1);
                let assign = dest.dest_il(il, addr, one, FlagWrite::None);
                il.emit(assign);
                let done = il.goto(&skip);
                il.emit(done);

                il.mark_label(&clear_dest);
                let zero = il.const_int(1, 0);
                let assign = dest.dest_il(il, addr, zero, FlagWrite::None);
                il.emit(assign);
                let done = il.goto(&skip);
                il.emit(done);

                if !skip_found {
                    il.mark_label(&skip);
                }
            }

            Mnemonic::Rtd => {
                let Some(Operand::Immediate { value, .. }) = dst else {
                    return emit_unimplemented(il);
                };
                let popped = il.pop(4);
                let hold = il.set_reg(4, TEMP0, popped, FlagWrite::None);
                il.emit(hold);
                let sp_now = il.reg(4, SP);
                let disp = il.const_int(2, *value as u64);
                let wide = il.sign_extend(4, disp, FlagWrite::None);
                let moved = il.add(4, sp_now, wide, FlagWrite::None);
                let set_sp = il.set_reg(4, SP, moved, FlagWrite::None);
                il.emit(set_sp);
                let target = il.reg(4, TEMP0);
                let ret = il.ret(target);
                il.emit(ret);
            }

            Mnemonic::Rte => {
                let status = il.pop(2);
                let set_sr = il.set_reg(2, Reg::Sr, status, FlagWrite::None);
                il.emit(set_sr);
                let target = il.pop(4);
                let ret = il.ret(target);
                il.emit(ret);
            }

            Mnemonic::Rtr => {
                let ccr = il.pop(2);
                let set_ccr = il.set_reg(2, Reg::Ccr, ccr, FlagWrite::None);
                il.emit(set_ccr);
                let target = il.pop(4);
                let ret = il.ret(target);
                il.emit(ret);
            }

            Mnemonic::Rts => {
                let target = il.pop(4);
                let ret = il.ret(target);
                il.emit(ret);
            }

            Mnemonic::Trapv | Mnemonic::Trapcc(_) => {
                let cond_il = match ins.mnemonic {
                    Mnemonic::Trapcc(cond) => match cond.flag_cond() {
                        Some(fc) => il.flag_condition(fc),
                        None if cond == Condition::True => il.const_int(1, 1),
                        None => il.const_int(1, 0),
                    },
                    _ => il.flag_condition(FlagCond::Overflow),
                };
                let (skip, skip_found) = skip_label(ins, addr, il);
                let trap = il.create_label();

                let branch = il.if_expr(cond_il, &trap, &skip);
                il.emit(branch);

                il.mark_label(&trap);
                let call = il.system_call();
                il.emit(call);
                let done = il.goto(&skip);
                il.emit(done);

                if !skip_found {
                    il.mark_label(&skip);
                }
            }

            Mnemonic::Trap | Mnemonic::Illegal | Mnemonic::Bkpt => {
                let call = il.system_call();
                il.emit(call);
            }

            Mnemonic::Bgnd | Mnemonic::Nop | Mnemonic::Reset | Mnemonic::Stop => {
                let nop = il.nop();
                il.emit(nop);
            }

            // BCD arithmetic, MOVEP/MOVES, module calls, bit fields, FP
            // arithmetic and cache/MMU control have no faithful
            // architecture-neutral model.
            _ => emit_unimplemented(il),
        }
    }

    fn lift_movem<B: IlBuilder>(&self, ins: &Instruction, addr: u32, il: &mut B) {
        let size = ins.size_bytes().unwrap_or(4);

        if let Some(Operand::RegMovemList { regs, .. }) = &ins.source {
            // Store direction.
            let Some(dest) = &ins.dest else {
                return emit_unimplemented(il);
            };
            let total = regs.len() as u64 * u64::from(size);

            if let Operand::RegIndirectPreDec { reg: an, .. } = dest {
                let base = dest.address_il(il, addr);
                let hold = il.set_reg(4, TEMP0, base, FlagWrite::None);
                il.emit(hold);

                let update_an = |il: &mut B| {
                    let start = il.reg(4, TEMP0);
                    let span = il.const_int(4, total);
                    let next = il.sub(4, start, span, FlagWrite::None);
                    let assign = il.set_reg(4, *an, next, FlagWrite::None);
                    il.emit(assign);
                };

                // The 68020 and later write the decremented address
                // register before the stores; earlier parts after.
                if self.config.movem_store_decremented {
                    update_an(il);
                }
                for (k, reg) in regs.iter().rev().enumerate() {
                    let start = il.reg(4, TEMP0);
                    let offset = il.const_int(4, (k as u64 + 1) * u64::from(size));
                    let ea = il.sub(4, start, offset, FlagWrite::None);
                    let value = il.reg(size, *reg);
                    let store = il.store(size, ea, value, FlagWrite::None);
                    il.emit(store);
                }
                if !self.config.movem_store_decremented {
                    update_an(il);
                }
            } else {
                let base = dest.address_il(il, addr);
                let hold = il.set_reg(4, TEMP0, base, FlagWrite::None);
                il.emit(hold);
                for (k, reg) in regs.iter().enumerate() {
                    let start = il.reg(4, TEMP0);
                    let offset = il.const_int(4, k as u64 * u64::from(size));
                    let ea = il.add(4, start, offset, FlagWrite::None);
                    let value = il.reg(size, *reg);
                    let store = il.store(size, ea, value, FlagWrite::None);
                    il.emit(store);
                }
            }
            return;
        }

        // Load direction.
        let (Some(source), Some(Operand::RegMovemList { regs, .. })) = (&ins.source, &ins.dest)
        else {
            return emit_unimplemented(il);
        };
        let base = source.address_il(il, addr);
        let hold = il.set_reg(4, TEMP0, base, FlagWrite::None);
        il.emit(hold);
        for (k, reg) in regs.iter().enumerate() {
            let start = il.reg(4, TEMP0);
            let offset = il.const_int(4, k as u64 * u64::from(size));
            let ea = il.add(4, start, offset, FlagWrite::None);
            let value = il.load(size, ea);
            let assign = il.set_reg(size, *reg, value, FlagWrite::None);
            il.emit(assign);
        }
        if let Operand::RegIndirectPostInc { reg: an, .. } = source {
            let start = il.reg(4, TEMP0);
            let span = il.const_int(4, regs.len() as u64 * u64::from(size));
            let next = il.add(4, start, span, FlagWrite::None);
            let assign = il.set_reg(4, *an, next, FlagWrite::None);
            il.emit(assign);
        }
    }

}

/// Constant-folded flag updates for `andi/ori/eori #imm,ccr|sr`.
/// Returns true when handled. `apply` receives each flag and whether its
/// bit is named in the immediate.
fn lift_ccr_immediate<B: IlBuilder>(
    ins: &Instruction,
    il: &mut B,
    apply: impl Fn(&mut B, Flag, bool),
) -> bool {
    if !matches!(ins.mnemonic, Mnemonic::Andi | Mnemonic::Ori | Mnemonic::Eori) {
        return false;
    }
    let Some(Operand::RegDirect {
        reg: Reg::Ccr | Reg::Sr,
        ..
    }) = &ins.dest
    else {
        return false;
    };
    let Some(Operand::Immediate { value, .. }) = &ins.source else {
        return false;
    };
    for flag in [Flag::C, Flag::V, Flag::Z, Flag::N, Flag::X] {
        let named = *value & (1 << flag.ccr_bit()) != 0;
        apply(il, flag, named);
    }
    true
}

/// Label for the fall-through address, plus whether it was already
/// registered (and therefore must not be re-marked here).
fn skip_label<B: IlBuilder>(ins: &Instruction, addr: u32, il: &mut B) -> (B::Label, bool) {
    match il.label_for_address(addr.wrapping_add(ins.length as u32)) {
        Some(label) => (label, true),
        None => (il.create_label(), false),
    }
}
