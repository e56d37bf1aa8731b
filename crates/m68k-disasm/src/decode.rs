//! Instruction decoding.
//!
//! Two-level dispatch: the top nibble of the opcode word selects a group
//! handler, which then matches sub-patterns with mask-and-compare chains.
//! Every handler returns either a complete [`Instruction`] or the
//! [`Unimplemented`] sentinel; nothing here panics on arbitrary input.
//!
//! Byte lengths: an instruction is 2 (opcode word) plus the extension
//! bytes consumed by its operands, never more than the variant's
//! `max_instr_length`. A failed decode reports 2 plus the extension bytes
//! counted before the failure; input shorter than one word reports the
//! input length.

use crate::M68k;
use crate::ea::{decode_ea, decode_fp_ea, read_i16, read_u8, read_u16, read_u32};
use crate::flags::{Condition, FpCondition};
use crate::instruction::{FpRounding, FpSize, Instruction, Mnemonic, Size, SizeSpec, Unimplemented};
use crate::operand::{BaseReg, Operand};
use crate::registers::Reg;
use crate::tokens::{Token, TokenKind};

type DecodeResult = Result<Instruction, Unimplemented>;

fn unimpl(length: usize) -> DecodeResult {
    Err(Unimplemented { length })
}

/// Slice past `n` bytes without panicking on short input.
fn tail(data: &[u8], n: usize) -> &[u8] {
    data.get(n..).unwrap_or(&[])
}

fn instr(
    mnemonic: Mnemonic,
    length: usize,
    size: Option<SizeSpec>,
    source: Option<Operand>,
    dest: Option<Operand>,
    third: Option<Operand>,
) -> DecodeResult {
    Ok(Instruction {
        mnemonic,
        length,
        size,
        source,
        dest,
        third,
    })
}

fn int_size(size: Size) -> Option<SizeSpec> {
    Some(SizeSpec::Int(size))
}

impl M68k {
    /// Decode one instruction from a big-endian byte stream.
    pub fn decode(&self, data: &[u8], addr: u32) -> DecodeResult {
        if data.len() < 2 {
            return unimpl(data.len());
        }
        let Some(op) = read_u16(data, 0) else {
            return unimpl(data.len());
        };

        let result = match op >> 12 {
            // Bit manipulation / MOVEP / immediates
            0x0 => self.decode_group0(op, data),
            // MOVE.b / MOVE.l / MOVE.w (+ MOVEA)
            0x1 | 0x2 | 0x3 => self.decode_move(op, data),
            // Miscellaneous: LEA, CLR, MOVEM, JSR, RTS, ...
            0x4 => self.decode_misc(op, data),
            // ADDQ/SUBQ/Scc/DBcc/TRAPcc
            0x5 => self.decode_quick(op, data),
            // Bcc/BRA/BSR
            0x6 => self.decode_branch(op, data),
            // MOVEQ
            0x7 => self.decode_moveq(op),
            // OR/DIVU/DIVS/SBCD/PACK/UNPK
            0x8 => self.decode_or(op, data),
            // SUB/SUBA/SUBX
            0x9 => self.decode_addsub(op, data, false),
            // Line A: unassigned
            0xA => unimpl(2),
            // CMP/CMPA/CMPM/EOR
            0xB => self.decode_cmp_eor(op, data),
            // AND/MULU/MULS/ABCD/EXG
            0xC => self.decode_and(op, data),
            // ADD/ADDA/ADDX
            0xD => self.decode_addsub(op, data, true),
            // Shifts, rotates, bit fields
            0xE => self.decode_shift(op, data),
            // FP and cache/MMU
            _ => self.decode_line_f(op, data),
        };

        if result.is_err() {
            log::debug!("undecodable opcode ${op:04x} at ${addr:08x}");
        }
        result
    }

    // --- Group 0x0: immediates, bit ops, MOVEP, MOVES, CAS, CHK2 ---

    fn decode_group0(&self, op: u16, data: &[u8]) -> DecodeResult {
        let cfg = &self.config;
        let msb = op >> 8;

        // RTM, CALLM, CHK2, CMP2
        if op & 0xF9C0 == 0x00C0 {
            if op & 0xFFF0 == 0x06C0 {
                let dest = Operand::RegDirect {
                    size: 4,
                    reg: Reg::from_index4((op & 15) as u8),
                };
                return instr(Mnemonic::Rtm, 2, None, None, Some(dest), None);
            }
            if op & 0xFFC0 == 0x06C0 {
                let Some(value) = read_u8(data, 3) else {
                    return unimpl(2);
                };
                let source = Operand::Immediate {
                    size: 1,
                    value: i64::from(value),
                };
                let Some((dest, extra_dest)) = decode_ea(cfg, op >> 3, op, tail(data, 4), 1) else {
                    return unimpl(4);
                };
                return instr(
                    Mnemonic::Callm,
                    4 + extra_dest,
                    None,
                    Some(source),
                    Some(dest),
                    None,
                );
            }
            let Some(size) = Size::from_bits(op >> 9) else {
                return unimpl(2);
            };
            let Some(extra) = read_u16(data, 2) else {
                return unimpl(2);
            };
            let mnemonic = if extra & 0x0800 != 0 {
                Mnemonic::Chk2
            } else {
                Mnemonic::Cmp2
            };
            let Some((source, extra_source)) = decode_ea(cfg, op >> 3, op, tail(data, 4), 1) else {
                return unimpl(4);
            };
            let dest = Operand::RegDirect {
                size: size.bytes(),
                reg: Reg::from_index4((extra >> 12) as u8),
            };
            return instr(
                mnemonic,
                4 + extra_source,
                int_size(size),
                Some(source),
                Some(dest),
                None,
            );
        }

        // CAS / CAS2
        if matches!(op & 0xFFC0, 0x0AC0 | 0x0CC0 | 0x0EC0) {
            let Some(size) = Size::from_bits(((op >> 9) & 3).wrapping_sub(1)) else {
                return unimpl(2);
            };
            if op & 0xF9FF == 0x08FC {
                let (Some(extra1), Some(extra2)) = (read_u16(data, 2), read_u16(data, 4)) else {
                    return unimpl(2);
                };
                let source = Operand::RegDirectPair {
                    size: size.bytes(),
                    reg1: Reg::D((extra1 & 7) as u8),
                    reg2: Reg::D((extra2 & 7) as u8),
                };
                let dest = Operand::RegDirectPair {
                    size: size.bytes(),
                    reg1: Reg::D(((extra1 >> 6) & 7) as u8),
                    reg2: Reg::D(((extra2 >> 6) & 7) as u8),
                };
                let third = Operand::RegIndirectPair {
                    size: size.bytes(),
                    reg1: Reg::from_index4((extra1 >> 12) as u8),
                    reg2: Reg::from_index4((extra2 >> 12) as u8),
                };
                return instr(
                    Mnemonic::Cas2,
                    6,
                    int_size(size),
                    Some(source),
                    Some(dest),
                    Some(third),
                );
            }
            let Some(extra) = read_u16(data, 2) else {
                return unimpl(2);
            };
            let source = Operand::RegDirect {
                size: size.bytes(),
                reg: Reg::D((extra & 7) as u8),
            };
            let dest = Operand::RegDirect {
                size: size.bytes(),
                reg: Reg::D(((extra >> 6) & 7) as u8),
            };
            let Some((third, extra_third)) =
                decode_ea(cfg, op >> 3, op, tail(data, 4), size.bytes())
            else {
                return unimpl(4);
            };
            return instr(
                Mnemonic::Cas,
                4 + extra_third,
                int_size(size),
                Some(source),
                Some(dest),
                Some(third),
            );
        }

        // ORI, ANDI, SUBI, ADDI, EORI, CMPI
        if matches!(msb, 0x00 | 0x02 | 0x04 | 0x06 | 0x0A | 0x0C) {
            let mnemonic = match (op >> 9) & 7 {
                0 => Mnemonic::Ori,
                1 => Mnemonic::Andi,
                2 => Mnemonic::Subi,
                3 => Mnemonic::Addi,
                5 => Mnemonic::Eori,
                _ => Mnemonic::Cmpi,
            };
            let Some(size) = Size::from_bits(op >> 6) else {
                return unimpl(2);
            };
            let Some((source, extra_source)) =
                decode_ea(cfg, 7, 4, tail(data, 2), size.bytes())
            else {
                return unimpl(2);
            };
            // Register field 111/100 with the size bit selects CCR or SR.
            let (dest, extra_dest) = if op & 0x00FF == 0x003C {
                (
                    Operand::RegDirect {
                        size: size.bytes(),
                        reg: Reg::Ccr,
                    },
                    0,
                )
            } else if op & 0x00FF == 0x007C {
                (
                    Operand::RegDirect {
                        size: size.bytes(),
                        reg: Reg::Sr,
                    },
                    0,
                )
            } else {
                match decode_ea(cfg, op >> 3, op, tail(data, 2 + extra_source), size.bytes()) {
                    Some(pair) => pair,
                    None => return unimpl(2 + extra_source),
                }
            };
            return instr(
                mnemonic,
                2 + extra_source + extra_dest,
                int_size(size),
                Some(source),
                Some(dest),
                None,
            );
        }

        // BTST/BCHG/BCLR/BSET with immediate bit number
        if msb == 0x08 {
            let mnemonic = match (op >> 6) & 3 {
                0 => Mnemonic::Btst,
                1 => Mnemonic::Bchg,
                2 => Mnemonic::Bclr,
                _ => Mnemonic::Bset,
            };
            let Some(bit) = read_u8(data, 3) else {
                return unimpl(2);
            };
            let source = Operand::Immediate {
                size: 1,
                value: i64::from(bit),
            };
            let Some((dest, extra_dest)) = decode_ea(cfg, op >> 3, op, tail(data, 4), 1) else {
                return unimpl(4);
            };
            // Register destinations test the full long word.
            let dest = if matches!(dest, Operand::RegDirect { .. }) {
                dest.with_size(4)
            } else {
                dest
            };
            return instr(mnemonic, 4 + extra_dest, None, Some(source), Some(dest), None);
        }

        // MOVEP and the dynamic-bit-number forms of BTST/BCHG/BCLR/BSET
        if msb & 0xF1 == 0x01 {
            if op & 0xF138 == 0x0108 {
                let size = if op & 0x0040 != 0 {
                    Size::Long
                } else {
                    Size::Word
                };
                let Some((source, extra_source)) = decode_ea(cfg, 5, op, tail(data, 2), 1) else {
                    return unimpl(2);
                };
                let dest = Operand::RegDirect {
                    size: size.bytes(),
                    reg: Reg::D(((op >> 9) & 7) as u8),
                };
                let (source, dest) = if op & 0x0080 != 0 {
                    (dest, source)
                } else {
                    (source, dest)
                };
                return instr(
                    Mnemonic::Movep,
                    2 + extra_source,
                    int_size(size),
                    Some(source),
                    Some(dest),
                    None,
                );
            }
            let mnemonic = match (op >> 6) & 3 {
                0 => Mnemonic::Btst,
                1 => Mnemonic::Bchg,
                2 => Mnemonic::Bclr,
                _ => Mnemonic::Bset,
            };
            let source = Operand::RegDirect {
                size: 1,
                reg: Reg::D(((op >> 9) & 7) as u8),
            };
            let Some((dest, extra_dest)) = decode_ea(cfg, op >> 3, op, tail(data, 2), 1) else {
                return unimpl(2);
            };
            let dest = if matches!(dest, Operand::RegDirect { .. }) {
                dest.with_size(4)
            } else {
                dest
            };
            return instr(mnemonic, 2 + extra_dest, None, Some(source), Some(dest), None);
        }

        // MOVES
        if op & 0xFF00 == 0x0E00 {
            let Some(extra) = read_u16(data, 2) else {
                return unimpl(2);
            };
            let Some(size) = Size::from_bits(op >> 6) else {
                return unimpl(2);
            };
            let dest = Operand::RegDirect {
                size: size.bytes(),
                reg: Reg::from_index4((extra >> 12) as u8),
            };
            let Some((source, extra_source)) =
                decode_ea(cfg, op >> 3, op, tail(data, 4), size.bytes())
            else {
                return unimpl(4);
            };
            let (source, dest) = if extra & 0x0800 != 0 {
                (dest, source)
            } else {
                (source, dest)
            };
            return instr(
                Mnemonic::Moves,
                4 + extra_source,
                int_size(size),
                Some(source),
                Some(dest),
                None,
            );
        }

        unimpl(2)
    }

    // --- Groups 0x1-0x3: MOVE / MOVEA ---

    fn decode_move(&self, op: u16, data: &[u8]) -> DecodeResult {
        let size = match op >> 12 {
            1 => Size::Byte,
            2 => Size::Long,
            _ => Size::Word,
        };
        let Some((source, extra_source)) =
            decode_ea(&self.config, op >> 3, op, tail(data, 2), size.bytes())
        else {
            return unimpl(2);
        };
        let Some((dest, extra_dest)) = decode_ea(
            &self.config,
            op >> 6,
            op >> 9,
            tail(data, 2 + extra_source),
            size.bytes(),
        ) else {
            return unimpl(2 + extra_source);
        };
        if matches!(dest, Operand::Immediate { .. }) {
            return unimpl(2 + extra_source);
        }
        // Destination mode 001 promotes to MOVEA; byte writes to address
        // registers are illegal.
        let mnemonic = match &dest {
            Operand::RegDirect { reg, .. } if reg.is_address() => {
                if size == Size::Byte {
                    return unimpl(2 + extra_source);
                }
                Mnemonic::Movea
            }
            _ => Mnemonic::Move,
        };
        instr(
            mnemonic,
            2 + extra_source + extra_dest,
            int_size(size),
            Some(source),
            Some(dest),
            None,
        )
    }

    // --- Group 0x4: miscellaneous ---

    fn decode_misc(&self, op: u16, data: &[u8]) -> DecodeResult {
        let cfg = &self.config;
        let msb = op >> 8;

        let mut mnemonic: Option<Mnemonic> = None;
        let mut size: Option<Size> = None;
        let mut source: Option<Operand> = None;
        let mut dest: Option<Operand> = None;
        let mut extra_source = 0usize;
        let mut extra_dest = 0usize;
        let mut skip_ea = false;

        if op & 0xF100 == 0x4100 {
            // LEA, EXTB, CHK
            if op & 0xF1C0 == 0x41C0 {
                if op & 0x0038 != 0 {
                    mnemonic = Some(Mnemonic::Lea);
                    dest = Some(Operand::RegDirect {
                        size: 4,
                        reg: Reg::A(((op >> 9) & 7) as u8),
                    });
                } else {
                    mnemonic = Some(Mnemonic::Extb);
                }
                size = Some(Size::Long);
            } else {
                mnemonic = Some(Mnemonic::Chk);
                let chk_size = if op & 0x0080 != 0 {
                    Size::Word
                } else {
                    Size::Long
                };
                size = Some(chk_size);
                dest = Some(Operand::RegDirect {
                    size: chk_size.bytes(),
                    reg: Reg::D(((op >> 9) & 7) as u8),
                });
            }
        } else if msb == 0x40 {
            // MOVE from SR, NEGX
            if op & 0xFFC0 == 0x40C0 {
                mnemonic = Some(Mnemonic::Move);
                size = Some(Size::Word);
                source = Some(Operand::RegDirect {
                    size: 2,
                    reg: Reg::Sr,
                });
            } else {
                mnemonic = Some(Mnemonic::Negx);
                size = Size::from_bits(op >> 6);
            }
        } else if msb == 0x42 {
            // MOVE from CCR, CLR
            if op & 0xFFC0 == 0x42C0 {
                mnemonic = Some(Mnemonic::Move);
                size = Some(Size::Word);
                source = Some(Operand::RegDirect {
                    size: 2,
                    reg: Reg::Ccr,
                });
            } else {
                mnemonic = Some(Mnemonic::Clr);
                size = Size::from_bits(op >> 6);
            }
        } else if msb == 0x44 {
            // MOVE to CCR, NEG
            if op & 0xFFC0 == 0x44C0 {
                mnemonic = Some(Mnemonic::Move);
                size = Some(Size::Word);
                dest = Some(Operand::RegDirect {
                    size: 2,
                    reg: Reg::Ccr,
                });
            } else {
                mnemonic = Some(Mnemonic::Neg);
                size = Size::from_bits(op >> 6);
            }
        } else if msb == 0x46 {
            // MOVE to SR, NOT
            if op & 0xFFC0 == 0x46C0 {
                mnemonic = Some(Mnemonic::Move);
                size = Some(Size::Word);
                dest = Some(Operand::RegDirect {
                    size: 2,
                    reg: Reg::Sr,
                });
            } else {
                mnemonic = Some(Mnemonic::Not);
                size = Size::from_bits(op >> 6);
            }
        } else if msb == 0x48 || msb == 0x4C {
            // LINK.l, NBCD, MOVEM, EXT, SWAP, BKPT, PEA, long MUL/DIV
            if op & 0xFFF8 == 0x4808 {
                mnemonic = Some(Mnemonic::Link);
                size = Some(Size::Long);
                match decode_ea(cfg, 7, 4, tail(data, 2), 4) {
                    Some((d, extra)) => {
                        dest = Some(d);
                        extra_dest = extra;
                    }
                    None => return unimpl(2),
                }
            } else if op & 0xFFC0 == 0x4800 {
                mnemonic = Some(Mnemonic::Nbcd);
                match decode_ea(cfg, op >> 3, op, tail(data, 2), 1) {
                    Some((d, extra)) => {
                        dest = Some(d);
                        extra_dest = extra;
                    }
                    None => return unimpl(2),
                }
                skip_ea = true;
            } else if op & 0xFB80 == 0x4880 {
                let movem_size = if op & 0x0040 != 0 {
                    Size::Long
                } else {
                    Size::Word
                };
                size = Some(movem_size);
                if op & 0x0038 != 0 {
                    mnemonic = Some(Mnemonic::Movem);
                    extra_source = 2;
                    let Some(mask) = read_u16(data, 2) else {
                        return unimpl(2);
                    };
                    // Predecrement destinations store the list with the
                    // mask bit order reversed.
                    let mut regs = Vec::new();
                    for k in 0..16u8 {
                        let selected = if op & 0x0038 == 0x0020 {
                            (mask << k) & 0x8000 != 0
                        } else {
                            (mask >> k) & 0x0001 != 0
                        };
                        if selected {
                            regs.push(Reg::from_movem_index(k));
                        }
                    }
                    source = Some(Operand::RegMovemList {
                        size: movem_size.bytes(),
                        regs,
                    });
                } else {
                    mnemonic = Some(Mnemonic::Ext);
                }
                match decode_ea(
                    cfg,
                    op >> 3,
                    op,
                    tail(data, 2 + extra_source),
                    movem_size.bytes(),
                ) {
                    Some((d, extra)) => {
                        dest = Some(d);
                        extra_dest = extra;
                    }
                    None => return unimpl(2 + extra_source),
                }
                skip_ea = true;
                if op & 0x0400 != 0 {
                    core::mem::swap(&mut source, &mut dest);
                }
            } else if op & 0xFFF8 == 0x4840 {
                mnemonic = Some(Mnemonic::Swap);
                match decode_ea(cfg, op >> 3, op, tail(data, 2), 4) {
                    Some((d, extra)) => {
                        dest = Some(d);
                        extra_dest = extra;
                    }
                    None => return unimpl(2),
                }
                skip_ea = true;
            } else if op & 0xFFF8 == 0x4848 {
                mnemonic = Some(Mnemonic::Bkpt);
                source = Some(Operand::Immediate {
                    size: 1,
                    value: i64::from(op & 7),
                });
                skip_ea = true;
            } else if op & 0xFFC0 == 0x4840 {
                mnemonic = Some(Mnemonic::Pea);
                size = Some(Size::Long);
            } else if msb == 0x4C {
                // MULS.l/MULU.l/DIVS.l/DIVU.l/DIVSL/DIVUL
                size = Some(Size::Long);
                extra_dest = 2;
                let Some(extra) = read_u16(data, 2) else {
                    return unimpl(2);
                };
                match decode_ea(cfg, op >> 3, op, tail(data, 4), 4) {
                    Some((s, es)) => {
                        source = Some(s);
                        extra_source = es;
                    }
                    None => return unimpl(4),
                }
                let dh = Reg::D((extra & 7) as u8);
                let dl = Reg::D(((extra >> 12) & 7) as u8);
                let pair = Operand::RegDirectPair {
                    size: 4,
                    reg1: dh,
                    reg2: dl,
                };
                if op & 0x0040 != 0 {
                    let signed = extra & 0x0800 != 0;
                    if extra & 0x0400 != 0 {
                        // 64/32 divide
                        mnemonic = Some(if signed { Mnemonic::Divs } else { Mnemonic::Divu });
                        dest = Some(pair);
                    } else if dh != dl {
                        // 32/32 with separate remainder register
                        mnemonic = Some(if signed { Mnemonic::Divsl } else { Mnemonic::Divul });
                        dest = Some(pair);
                    } else {
                        mnemonic = Some(if signed { Mnemonic::Divs } else { Mnemonic::Divu });
                        dest = Some(Operand::RegDirect { size: 4, reg: dl });
                    }
                } else {
                    let signed = extra & 0x0800 != 0;
                    mnemonic = Some(if signed { Mnemonic::Muls } else { Mnemonic::Mulu });
                    dest = if extra & 0x0400 != 0 {
                        Some(pair)
                    } else {
                        Some(Operand::RegDirect { size: 4, reg: dl })
                    };
                }
                skip_ea = true;
            }
        } else if msb == 0x4A {
            // BGND, ILLEGAL, TAS, TST
            if op == 0x4AFA {
                mnemonic = Some(Mnemonic::Bgnd);
                skip_ea = true;
            } else if op == 0x4AFC {
                mnemonic = Some(Mnemonic::Illegal);
                skip_ea = true;
            } else if op & 0xFFC0 == 0x4AC0 {
                mnemonic = Some(Mnemonic::Tas);
                skip_ea = true;
                match decode_ea(cfg, op >> 3, op, tail(data, 2), 1) {
                    Some((d, extra)) => {
                        dest = Some(d);
                        extra_dest = extra;
                    }
                    None => return unimpl(2),
                }
            } else {
                mnemonic = Some(Mnemonic::Tst);
                size = Size::from_bits(op >> 6);
            }
        } else if msb == 0x4E {
            if op & 0xFFF0 == 0x4E40 {
                mnemonic = Some(Mnemonic::Trap);
                source = Some(Operand::Immediate {
                    size: 1,
                    value: i64::from(op & 15),
                });
                skip_ea = true;
            } else if op & 0xFFF0 == 0x4E50 {
                if op & 0xFFF8 == 0x4E50 {
                    mnemonic = Some(Mnemonic::Link);
                    match decode_ea(cfg, 7, 4, tail(data, 2), 2) {
                        Some((d, extra)) => {
                            dest = Some(d);
                            extra_dest = extra;
                        }
                        None => return unimpl(2),
                    }
                } else {
                    mnemonic = Some(Mnemonic::Unlk);
                }
                source = Some(Operand::RegDirect {
                    size: 4,
                    reg: Reg::A((op & 7) as u8),
                });
                skip_ea = true;
            } else if op & 0xFFF0 == 0x4E60 {
                mnemonic = Some(Mnemonic::Move);
                size = Some(Size::Long);
                let an = Operand::RegDirect {
                    size: 4,
                    reg: Reg::A((op & 7) as u8),
                };
                let usp = Operand::RegDirect {
                    size: 4,
                    reg: Reg::Usp,
                };
                if op & 0x08 != 0 {
                    source = Some(usp);
                    dest = Some(an);
                } else {
                    source = Some(an);
                    dest = Some(usp);
                }
                skip_ea = true;
            } else if op == 0x4E70 {
                mnemonic = Some(Mnemonic::Reset);
                skip_ea = true;
            } else if op == 0x4E71 {
                mnemonic = Some(Mnemonic::Nop);
                skip_ea = true;
            } else if op == 0x4E72 {
                mnemonic = Some(Mnemonic::Stop);
                let Some(imm) = read_u16(data, 2) else {
                    return unimpl(2);
                };
                source = Some(Operand::Immediate {
                    size: 2,
                    value: i64::from(imm),
                });
                extra_source = 2;
                skip_ea = true;
            } else if op == 0x4E73 {
                mnemonic = Some(Mnemonic::Rte);
                skip_ea = true;
            } else if op == 0x4E74 {
                mnemonic = Some(Mnemonic::Rtd);
                match decode_ea(cfg, 7, 4, tail(data, 2), 2) {
                    Some((d, extra)) => {
                        dest = Some(d);
                        extra_dest = extra;
                    }
                    None => return unimpl(2),
                }
                skip_ea = true;
            } else if op == 0x4E75 {
                mnemonic = Some(Mnemonic::Rts);
                skip_ea = true;
            } else if op == 0x4E76 {
                mnemonic = Some(Mnemonic::Trapv);
                skip_ea = true;
            } else if op == 0x4E77 {
                mnemonic = Some(Mnemonic::Rtr);
                skip_ea = true;
            } else if op & 0xFFFE == 0x4E7A {
                // MOVEC: the control register comes from the variant table.
                size = Some(Size::Long);
                let Some(extended) = read_u16(data, 2) else {
                    return unimpl(2);
                };
                let Some(control) = cfg.control_register(extended & 0x0FFF) else {
                    return unimpl(4);
                };
                mnemonic = Some(Mnemonic::Movec);
                let ctrl = Operand::RegDirect {
                    size: 4,
                    reg: control,
                };
                let general = Operand::RegDirect {
                    size: 4,
                    reg: Reg::from_index4((extended >> 12) as u8),
                };
                if op & 1 != 0 {
                    source = Some(general);
                    dest = Some(ctrl);
                } else {
                    source = Some(ctrl);
                    dest = Some(general);
                }
                extra_source = 2;
                skip_ea = true;
            } else if op & 0xFF80 == 0x4E80 {
                mnemonic = Some(if op & 0xFFC0 == 0x4E80 {
                    Mnemonic::Jsr
                } else {
                    Mnemonic::Jmp
                });
                match decode_ea(cfg, op >> 3, op, tail(data, 2), 4) {
                    Some((d, extra)) => {
                        dest = Some(d);
                        extra_dest = extra;
                    }
                    None => return unimpl(2),
                }
                skip_ea = true;
            }
        }

        let Some(mnemonic) = mnemonic else {
            return unimpl(2);
        };

        if !skip_ea {
            let ea_size = match size {
                Some(s) => s.bytes(),
                None => return unimpl(2),
            };
            if dest.is_none() {
                match decode_ea(cfg, op >> 3, op, tail(data, 2 + extra_source), ea_size) {
                    Some((d, extra)) => {
                        dest = Some(d);
                        extra_dest = extra;
                    }
                    None => return unimpl(2 + extra_source),
                }
            } else {
                match decode_ea(cfg, op >> 3, op, tail(data, 2 + extra_dest), ea_size) {
                    Some((s, extra)) => {
                        source = Some(s);
                        extra_source = extra;
                    }
                    None => return unimpl(2 + extra_dest),
                }
            }
        }

        instr(
            mnemonic,
            2 + extra_source + extra_dest,
            size.map(SizeSpec::Int),
            source,
            dest,
            None,
        )
    }

    // --- Group 0x5: ADDQ/SUBQ/Scc/DBcc/TRAPcc ---

    fn decode_quick(&self, op: u16, data: &[u8]) -> DecodeResult {
        let cfg = &self.config;
        if op & 0xF0C0 == 0x50C0 {
            let cond = Condition::from_bits(((op >> 8) & 0xF) as u8);
            if op & 0xF0F8 == 0x50C8 {
                // DBcc: the displacement word follows the opcode.
                let source = Operand::RegDirect {
                    size: 2,
                    reg: Reg::D((op & 7) as u8),
                };
                let Some(disp) = read_i16(data, 2) else {
                    return unimpl(2);
                };
                let dest = Operand::RegIndirectDisp {
                    size: 4,
                    base: BaseReg::Pc,
                    disp: i32::from(disp),
                };
                return instr(
                    Mnemonic::Dbcc(cond),
                    4,
                    None,
                    Some(source),
                    Some(dest),
                    None,
                );
            }
            if matches!(op & 0xF0FF, 0x50FA | 0x50FB | 0x50FC) {
                return match op & 7 {
                    2 => {
                        let Some(imm) = read_u16(data, 2) else {
                            return unimpl(2);
                        };
                        let source = Operand::Immediate {
                            size: 2,
                            value: i64::from(imm),
                        };
                        instr(Mnemonic::Trapcc(cond), 4, None, Some(source), None, None)
                    }
                    3 => {
                        let Some(imm) = read_u32(data, 2) else {
                            return unimpl(2);
                        };
                        let source = Operand::Immediate {
                            size: 4,
                            value: i64::from(imm),
                        };
                        instr(Mnemonic::Trapcc(cond), 6, None, Some(source), None, None)
                    }
                    _ => instr(Mnemonic::Trapcc(cond), 2, None, None, None, None),
                };
            }
            // Scc
            let Some((dest, extra_dest)) = decode_ea(cfg, op >> 3, op, tail(data, 2), 1) else {
                return unimpl(2);
            };
            return instr(
                Mnemonic::Scc(cond),
                2 + extra_dest,
                int_size(Size::Byte),
                None,
                Some(dest),
                None,
            );
        }

        let mnemonic = if op & 0x0100 != 0 {
            Mnemonic::Subq
        } else {
            Mnemonic::Addq
        };
        let quick = {
            let v = (op >> 9) & 7;
            if v == 0 { 8 } else { i64::from(v) }
        };
        let Some(size) = Size::from_bits(op >> 6) else {
            return unimpl(2);
        };
        let source = Operand::Immediate {
            size: 1,
            value: quick,
        };
        let Some((dest, extra_dest)) = decode_ea(cfg, op >> 3, op, tail(data, 2), size.bytes())
        else {
            return unimpl(2);
        };
        instr(
            mnemonic,
            2 + extra_dest,
            int_size(size),
            Some(source),
            Some(dest),
            None,
        )
    }

    // --- Group 0x6: Bcc/BRA/BSR ---
    //
    // Encoding: 0110 CCCC DDDDDDDD
    //   DDDDDDDD = 8-bit displacement; 0 = 16-bit follows, 0xFF = 32-bit
    //   follows.

    fn decode_branch(&self, op: u16, data: &[u8]) -> DecodeResult {
        let mnemonic = match (op >> 8) & 0xF {
            0 => Mnemonic::Bra,
            1 => Mnemonic::Bsr,
            cond => Mnemonic::Bcc(Condition::from_bits(cond as u8)),
        };
        let (disp, length) = match op & 0xFF {
            0 => {
                let Some(d16) = read_i16(data, 2) else {
                    return unimpl(2);
                };
                (i32::from(d16), 4)
            }
            0xFF => {
                let Some(d32) = read_u32(data, 2) else {
                    return unimpl(2);
                };
                (d32 as i32, 6)
            }
            d8 => (i32::from(d8 as u8 as i8), 2),
        };
        let dest = Operand::RegIndirectDisp {
            size: 4,
            base: BaseReg::Pc,
            disp,
        };
        instr(mnemonic, length, None, None, Some(dest), None)
    }

    // --- Group 0x7: MOVEQ ---

    fn decode_moveq(&self, op: u16) -> DecodeResult {
        let value = i64::from(op & 0xFF);
        let value = if value & 0x80 != 0 {
            value | 0xFFFF_FF00
        } else {
            value
        };
        let source = Operand::Immediate { size: 4, value };
        let dest = Operand::RegDirect {
            size: 4,
            reg: Reg::D(((op >> 9) & 7) as u8),
        };
        instr(
            Mnemonic::Moveq,
            2,
            int_size(Size::Long),
            Some(source),
            Some(dest),
            None,
        )
    }

    // --- Group 0x8: OR/DIVU/DIVS/SBCD/PACK/UNPK ---

    fn decode_or(&self, op: u16, data: &[u8]) -> DecodeResult {
        let cfg = &self.config;
        if op & 0xF0C0 == 0x80C0 {
            // DIVS.w / DIVU.w
            let mnemonic = if op & 0x0100 != 0 {
                Mnemonic::Divs
            } else {
                Mnemonic::Divu
            };
            let dest = Operand::RegDirect {
                size: 2,
                reg: Reg::D(((op >> 9) & 7) as u8),
            };
            let Some((source, extra_source)) = decode_ea(cfg, op >> 3, op, tail(data, 2), 2)
            else {
                return unimpl(2);
            };
            return instr(
                mnemonic,
                2 + extra_source,
                int_size(Size::Word),
                Some(source),
                Some(dest),
                None,
            );
        }
        if op & 0xF1F0 == 0x8100 {
            // SBCD
            let (source, dest) = if op & 8 != 0 {
                (
                    Operand::RegIndirectPreDec {
                        size: 1,
                        reg: Reg::A((op & 7) as u8),
                    },
                    Operand::RegIndirectPreDec {
                        size: 1,
                        reg: Reg::A(((op >> 9) & 7) as u8),
                    },
                )
            } else {
                (
                    Operand::RegDirect {
                        size: 1,
                        reg: Reg::D((op & 7) as u8),
                    },
                    Operand::RegDirect {
                        size: 1,
                        reg: Reg::D(((op >> 9) & 7) as u8),
                    },
                )
            };
            return instr(Mnemonic::Sbcd, 2, None, Some(source), Some(dest), None);
        }
        if op & 0xF130 == 0x8100 {
            // PACK/UNPK with a 16-bit adjustment word
            let predec = op & 8 != 0;
            let rx = ((op >> 9) & 7) as u8;
            let ry = (op & 7) as u8;
            let (mnemonic, src_size, dst_size) = if op & 0x0040 != 0 {
                (Mnemonic::Pack, 2, 1)
            } else {
                (Mnemonic::Unpk, 1, 2)
            };
            let (source, dest) = if predec {
                (
                    Operand::RegIndirectPreDec {
                        size: src_size,
                        reg: Reg::A(ry),
                    },
                    Operand::RegIndirectPreDec {
                        size: dst_size,
                        reg: Reg::A(rx),
                    },
                )
            } else {
                (
                    Operand::RegDirect {
                        size: src_size,
                        reg: Reg::D(ry),
                    },
                    Operand::RegDirect {
                        size: dst_size,
                        reg: Reg::D(rx),
                    },
                )
            };
            let Some(adjust) = read_u16(data, 2) else {
                return unimpl(2);
            };
            let third = Operand::Immediate {
                size: 2,
                value: i64::from(adjust),
            };
            return instr(mnemonic, 4, None, Some(source), Some(dest), Some(third));
        }

        self.decode_logic(op, data, Mnemonic::Or)
    }

    /// Shared register-EA form of OR and AND.
    fn decode_logic(&self, op: u16, data: &[u8], mnemonic: Mnemonic) -> DecodeResult {
        let opmode = (op >> 6) & 7;
        let Some(size) = Size::from_bits(op >> 6) else {
            return unimpl(2);
        };
        let dest = Operand::RegDirect {
            size: size.bytes(),
            reg: Reg::D(((op >> 9) & 7) as u8),
        };
        let Some((source, extra_source)) =
            decode_ea(&self.config, op >> 3, op, tail(data, 2), size.bytes())
        else {
            return unimpl(2);
        };
        let (source, dest) = if opmode & 4 != 0 {
            (dest, source)
        } else {
            (source, dest)
        };
        instr(
            mnemonic,
            2 + extra_source,
            int_size(size),
            Some(source),
            Some(dest),
            None,
        )
    }

    // --- Groups 0x9 and 0xD: SUB/SUBA/SUBX, ADD/ADDA/ADDX ---

    fn decode_addsub(&self, op: u16, data: &[u8], is_add: bool) -> DecodeResult {
        let cfg = &self.config;
        let opmode = (op >> 6) & 7;
        let mut mnemonic = if is_add { Mnemonic::Add } else { Mnemonic::Sub };

        let (size, mut dest) = if opmode == 3 || opmode == 7 {
            mnemonic = if is_add { Mnemonic::Adda } else { Mnemonic::Suba };
            let size = if opmode == 3 { Size::Word } else { Size::Long };
            (
                size,
                Operand::RegDirect {
                    size: 4,
                    reg: Reg::A(((op >> 9) & 7) as u8),
                },
            )
        } else {
            let Some(size) = Size::from_bits(op >> 6) else {
                return unimpl(2);
            };
            (
                size,
                Operand::RegDirect {
                    size: size.bytes(),
                    reg: Reg::D(((op >> 9) & 7) as u8),
                },
            )
        };

        let Some((mut source, extra_source)) =
            decode_ea(cfg, op >> 3, op, tail(data, 2), size.bytes())
        else {
            return unimpl(2);
        };

        if matches!(mnemonic, Mnemonic::Add | Mnemonic::Sub) && opmode & 4 != 0 {
            if let Operand::RegDirect { reg, .. } = source {
                // Register source with a register-EA opmode is ADDX/SUBX;
                // EA mode 001 selects the -(Ay),-(Ax) memory form.
                mnemonic = if is_add { Mnemonic::Addx } else { Mnemonic::Subx };
                if reg.is_address() {
                    source = Operand::RegIndirectPreDec {
                        size: size.bytes(),
                        reg,
                    };
                    dest = Operand::RegIndirectPreDec {
                        size: size.bytes(),
                        reg: Reg::A(((op >> 9) & 7) as u8),
                    };
                }
            } else {
                core::mem::swap(&mut source, &mut dest);
            }
        }

        instr(
            mnemonic,
            2 + extra_source,
            int_size(size),
            Some(source),
            Some(dest),
            None,
        )
    }

    // --- Group 0xB: CMP/CMPA/CMPM/EOR ---

    fn decode_cmp_eor(&self, op: u16, data: &[u8]) -> DecodeResult {
        let cfg = &self.config;
        let opmode = (op >> 6) & 7;
        let mut mnemonic = Mnemonic::Cmp;

        let (size, mut dest) = if opmode == 3 || opmode == 7 {
            mnemonic = Mnemonic::Cmpa;
            let size = if opmode == 3 { Size::Word } else { Size::Long };
            (
                size,
                Operand::RegDirect {
                    size: size.bytes(),
                    reg: Reg::A(((op >> 9) & 7) as u8),
                },
            )
        } else {
            let Some(size) = Size::from_bits(op >> 6) else {
                return unimpl(2);
            };
            (
                size,
                Operand::RegDirect {
                    size: size.bytes(),
                    reg: Reg::D(((op >> 9) & 7) as u8),
                },
            )
        };

        let Some((mut source, extra_source)) =
            decode_ea(cfg, op >> 3, op, tail(data, 2), size.bytes())
        else {
            return unimpl(2);
        };

        if mnemonic == Mnemonic::Cmp && opmode & 4 != 0 {
            if op & 0x0038 == 0x0008 {
                mnemonic = Mnemonic::Cmpm;
                source = Operand::RegIndirectPostInc {
                    size: size.bytes(),
                    reg: Reg::A((op & 7) as u8),
                };
                dest = Operand::RegIndirectPostInc {
                    size: size.bytes(),
                    reg: Reg::A(((op >> 9) & 7) as u8),
                };
            } else {
                mnemonic = Mnemonic::Eor;
                core::mem::swap(&mut source, &mut dest);
            }
        }

        instr(
            mnemonic,
            2 + extra_source,
            int_size(size),
            Some(source),
            Some(dest),
            None,
        )
    }

    // --- Group 0xC: AND/MULU/MULS/ABCD/EXG ---

    fn decode_and(&self, op: u16, data: &[u8]) -> DecodeResult {
        let cfg = &self.config;
        if op & 0xF0C0 == 0xC0C0 {
            // MULS.w / MULU.w
            let mnemonic = if op & 0x0100 != 0 {
                Mnemonic::Muls
            } else {
                Mnemonic::Mulu
            };
            let Some((source, extra_source)) = decode_ea(cfg, op >> 3, op, tail(data, 2), 2)
            else {
                return unimpl(2);
            };
            let dest = Operand::RegDirect {
                size: 2,
                reg: Reg::D(((op >> 9) & 7) as u8),
            };
            return instr(
                mnemonic,
                2 + extra_source,
                int_size(Size::Word),
                Some(source),
                Some(dest),
                None,
            );
        }
        if op & 0xF130 == 0xC100 {
            if op & 0xF1F0 == 0xC100 {
                // ABCD
                let (source, dest) = if op & 0x0008 != 0 {
                    (
                        Operand::RegIndirectPreDec {
                            size: 1,
                            reg: Reg::A((op & 7) as u8),
                        },
                        Operand::RegIndirectPreDec {
                            size: 1,
                            reg: Reg::A(((op >> 9) & 7) as u8),
                        },
                    )
                } else {
                    (
                        Operand::RegDirect {
                            size: 1,
                            reg: Reg::D((op & 7) as u8),
                        },
                        Operand::RegDirect {
                            size: 1,
                            reg: Reg::D(((op >> 9) & 7) as u8),
                        },
                    )
                };
                return instr(Mnemonic::Abcd, 2, None, Some(source), Some(dest), None);
            }
            // EXG: opmode selects D/D, A/A, or D/A exchange.
            let rx = ((op >> 9) & 7) as u8;
            let ry = (op & 7) as u8;
            let (source, dest) = if op & 0xF1F8 == 0xC148 {
                (
                    Operand::RegDirect {
                        size: 4,
                        reg: Reg::A(rx),
                    },
                    Operand::RegDirect {
                        size: 4,
                        reg: Reg::A(ry),
                    },
                )
            } else if op & 0xF1F8 == 0xC188 {
                (
                    Operand::RegDirect {
                        size: 4,
                        reg: Reg::D(rx),
                    },
                    Operand::RegDirect {
                        size: 4,
                        reg: Reg::A(ry),
                    },
                )
            } else {
                (
                    Operand::RegDirect {
                        size: 4,
                        reg: Reg::D(rx),
                    },
                    Operand::RegDirect {
                        size: 4,
                        reg: Reg::D(ry),
                    },
                )
            };
            return instr(
                Mnemonic::Exg,
                2,
                int_size(Size::Long),
                Some(source),
                Some(dest),
                None,
            );
        }

        self.decode_logic(op, data, Mnemonic::And)
    }

    // --- Group 0xE: shifts, rotates, bit fields ---

    fn decode_shift(&self, op: u16, data: &[u8]) -> DecodeResult {
        let cfg = &self.config;

        fn shift_mnemonic(style: u16, left: bool) -> Mnemonic {
            match (style & 3, left) {
                (0, true) => Mnemonic::Asl,
                (0, false) => Mnemonic::Asr,
                (1, true) => Mnemonic::Lsl,
                (1, false) => Mnemonic::Lsr,
                (2, true) => Mnemonic::Roxl,
                (2, false) => Mnemonic::Roxr,
                (_, true) => Mnemonic::Rol,
                (_, false) => Mnemonic::Ror,
            }
        }

        if op & 0xF8C0 == 0xE0C0 {
            // Memory form: shift by one, word sized.
            let mnemonic = shift_mnemonic((op >> 9) & 3, op & 0x0100 != 0);
            let Some((dest, extra_dest)) = decode_ea(cfg, op >> 3, op, tail(data, 2), 2) else {
                return unimpl(2);
            };
            return instr(
                mnemonic,
                2 + extra_dest,
                int_size(Size::Word),
                None,
                Some(dest),
                None,
            );
        }

        if op & 0xF8C0 == 0xE8C0 {
            // Bit fields: decode the mnemonic and destination; the
            // offset/width extension word is not modeled.
            let mnemonic = match (op >> 8) & 7 {
                0 => Mnemonic::Bftst,
                1 => Mnemonic::Bfextu,
                2 => Mnemonic::Bfchg,
                3 => Mnemonic::Bfexts,
                4 => Mnemonic::Bfclr,
                5 => Mnemonic::Bffo,
                6 => Mnemonic::Bfset,
                _ => Mnemonic::Bfins,
            };
            let mut length = 4;
            let dest = match decode_ea(cfg, op >> 3, op, tail(data, 4), 4) {
                Some((d, extra)) => {
                    length += extra;
                    Some(d)
                }
                None => None,
            };
            return instr(mnemonic, length, None, None, dest, None);
        }

        // Register form: immediate 1-8 or a count register, mod 64.
        let Some(size) = Size::from_bits(op >> 6) else {
            return unimpl(2);
        };
        let mnemonic = shift_mnemonic((op >> 3) & 3, op & 0x0100 != 0);
        let source = if (op >> 5) & 1 != 0 {
            Operand::RegDirect {
                size: 4,
                reg: Reg::D(((op >> 9) & 7) as u8),
            }
        } else {
            let count = {
                let v = (op >> 9) & 7;
                if v == 0 { 8 } else { i64::from(v) }
            };
            Operand::Immediate {
                size: 1,
                value: count,
            }
        };
        let dest = Operand::RegDirect {
            size: size.bytes(),
            reg: Reg::D((op & 7) as u8),
        };
        instr(
            mnemonic,
            2,
            int_size(size),
            Some(source),
            Some(dest),
            None,
        )
    }

    // --- Group 0xF: FP and cache/MMU ---

    fn decode_line_f(&self, op: u16, data: &[u8]) -> DecodeResult {
        if op & 0xFE00 == 0xF200 {
            return self.decode_fpu(op, data);
        }
        if op & 0xFF20 == 0xF400 {
            return instr(Mnemonic::Cinv, 2, None, None, None, None);
        }
        if op & 0xFF20 == 0xF420 {
            return instr(Mnemonic::Cpush, 2, None, None, None, None);
        }
        if op & 0xFFE0 == 0xF500 {
            return instr(Mnemonic::Pflush, 2, None, None, None, None);
        }
        unimpl(2)
    }

    fn decode_fpu(&self, op: u16, data: &[u8]) -> DecodeResult {
        let cfg = &self.config;
        let fp_op = (op >> 6) & 7;

        if fp_op == 0 {
            let Some(extra) = read_u16(data, 2) else {
                return unimpl(2);
            };
            let mut length = 4usize;
            let sub = extra >> 13;

            if sub & 5 == 0 {
                // General arithmetic: FP register or memory source.
                let dst_reg = ((extra >> 7) & 7) as u8;
                let src_spec = (extra >> 10) & 7;
                let opmode = extra & 0x7F;
                let r_m = (extra >> 14) & 1;

                let mut size = SizeSpec::Fp(FpSize::Extended);
                let source;
                let dest;
                if r_m == 0 {
                    source = Some(Operand::FpRegDirect {
                        size: 10,
                        reg: Reg::Fp(src_spec as u8),
                    });
                    dest = Some(Operand::FpRegDirect {
                        size: 10,
                        reg: Reg::Fp(dst_reg),
                    });
                } else {
                    if src_spec == 7 {
                        // FMOVECR, not modeled
                        return unimpl(4);
                    }
                    let Some(fp_size) = FpSize::from_bits(src_spec) else {
                        return unimpl(4);
                    };
                    size = SizeSpec::Fp(fp_size);
                    dest = Some(Operand::FpRegDirect {
                        size: 10,
                        reg: Reg::Fp(dst_reg),
                    });
                    let Some((s, extra_source)) = decode_fp_ea(
                        cfg,
                        op >> 3,
                        op,
                        tail(data, length),
                        fp_size.bytes(),
                        Some(fp_size),
                    ) else {
                        return unimpl(4);
                    };
                    source = Some(s);
                    length += extra_source;
                }

                if opmode >> 3 == 6 {
                    // FSINCOS, not modeled
                    return unimpl(length);
                }
                let rounding = if opmode >> 6 != 0 {
                    if (opmode >> 2) & 1 != 0 {
                        FpRounding::Double
                    } else {
                        FpRounding::Single
                    }
                } else {
                    FpRounding::None
                };
                let mnemonic = if opmode == 4 || opmode & 0x63 == 0x41 {
                    Mnemonic::Fsqrt(rounding)
                } else {
                    match opmode & 0x3B {
                        0x00 => Mnemonic::Fmove(rounding),
                        0x18 => Mnemonic::Fabs(rounding),
                        0x1A => Mnemonic::Fneg(rounding),
                        0x20 => Mnemonic::Fdiv(rounding),
                        0x22 => Mnemonic::Fadd(rounding),
                        0x23 => Mnemonic::Fmul(rounding),
                        0x28 => Mnemonic::Fsub(rounding),
                        0x38 => Mnemonic::Fcmp(rounding),
                        0x3A => Mnemonic::Ftst(rounding),
                        _ => return unimpl(length),
                    }
                };
                return instr(mnemonic, length, Some(size), source, dest, None);
            }

            if sub == 3 {
                // FMOVE FP register to memory
                let source = Operand::FpRegDirect {
                    size: 10,
                    reg: Reg::Fp(((extra >> 7) & 7) as u8),
                };
                let Some(fp_size) = FpSize::from_bits(extra >> 10) else {
                    return unimpl(4);
                };
                let Some((dest, extra_dest)) = decode_fp_ea(
                    cfg,
                    op >> 3,
                    op,
                    tail(data, length),
                    fp_size.bytes(),
                    Some(fp_size),
                ) else {
                    return unimpl(4);
                };
                length += extra_dest;
                return instr(
                    Mnemonic::Fmove(FpRounding::None),
                    length,
                    Some(SizeSpec::Fp(fp_size)),
                    Some(source),
                    Some(dest),
                    None,
                );
            }

            if sub & 6 == 4 {
                // FMOVE/FMOVEM of system control registers; always 32-bit.
                let Some((ea, extra_ea)) = decode_fp_ea(cfg, op >> 3, op, tail(data, length), 4, None)
                else {
                    return unimpl(4);
                };
                length += extra_ea;
                let fpscr = (extra >> 10) & 7;
                let (mnemonic, reg_op) = match fpscr {
                    1 => (
                        Mnemonic::Fmove(FpRounding::None),
                        Operand::FpRegDirect {
                            size: 4,
                            reg: Reg::Fpiar,
                        },
                    ),
                    2 => (
                        Mnemonic::Fmove(FpRounding::None),
                        Operand::FpRegDirect {
                            size: 4,
                            reg: Reg::Fpsr,
                        },
                    ),
                    4 => (
                        Mnemonic::Fmove(FpRounding::None),
                        Operand::FpRegDirect {
                            size: 4,
                            reg: Reg::Fpcr,
                        },
                    ),
                    _ => {
                        let mut regs = Vec::new();
                        for (bit, reg) in [(1, Reg::Fpiar), (2, Reg::Fpsr), (4, Reg::Fpcr)] {
                            if fpscr & bit != 0 {
                                regs.push(reg);
                            }
                        }
                        (Mnemonic::Fmovem, Operand::FpScMovemList { size: 4, regs })
                    }
                };
                let (source, dest) = if (extra >> 13) & 1 != 0 {
                    (reg_op, ea)
                } else {
                    (ea, reg_op)
                };
                return instr(
                    mnemonic,
                    length,
                    Some(SizeSpec::Fp(FpSize::Long)),
                    Some(source),
                    Some(dest),
                    None,
                );
            }

            // sub & 6 == 6: FMOVEM of FP data registers, extended precision.
            let Some((ea, extra_ea)) =
                decode_fp_ea(cfg, op >> 3, op, tail(data, length), 12, Some(FpSize::Extended))
            else {
                return unimpl(4);
            };
            length += extra_ea;
            let mode_field = (extra >> 11) & 3;
            let reg_op = if mode_field == 0 || mode_field == 2 {
                // Static register list; the bit order flips with the mode.
                let list = extra & 0xFF;
                let mut regs = Vec::new();
                for i in 0..8u16 {
                    let bit = if mode_field != 0 { 7 - i } else { i };
                    if (1 << bit) & list != 0 {
                        regs.push(Reg::Fp(i as u8));
                    }
                }
                Operand::FpMovemList { size: 10, regs }
            } else {
                // Dynamic list held in a data register.
                Operand::RegDirect {
                    size: 1,
                    reg: Reg::D(((extra >> 4) & 7) as u8),
                }
            };
            let (source, dest) = if (extra >> 13) & 1 != 0 {
                (reg_op, ea)
            } else {
                (ea, reg_op)
            };
            return instr(
                Mnemonic::Fmovem,
                length,
                Some(SizeSpec::Fp(FpSize::Extended)),
                Some(source),
                Some(dest),
                None,
            );
        }

        if fp_op == 1 {
            let Some(extra) = read_u16(data, 2) else {
                return unimpl(2);
            };
            let mode = (op >> 3) & 7;
            let trap_mode = op & 7;
            if mode == 1 {
                // FDBcc, not modeled
                return unimpl(2);
            }
            if mode == 7 && trap_mode > 1 {
                let Some(cond) = FpCondition::from_bits((extra & 0x3F) as u8) else {
                    return unimpl(4);
                };
                let mut length = 4usize;
                let mut size = None;
                let mut dest = None;
                if trap_mode & 2 == 2 {
                    let fp_size = if trap_mode == 2 {
                        FpSize::Word
                    } else {
                        FpSize::Long
                    };
                    size = Some(SizeSpec::Fp(fp_size));
                    let Some((d, extra_dest)) =
                        decode_fp_ea(cfg, 7, 4, tail(data, length), fp_size.bytes(), None)
                    else {
                        return unimpl(4);
                    };
                    dest = Some(d);
                    length += extra_dest;
                }
                return instr(Mnemonic::Ftrapcc(cond), length, size, None, dest, None);
            }
            let Some(cond) = FpCondition::from_bits((extra & 0x3F) as u8) else {
                return unimpl(4);
            };
            let mut length = 4usize;
            let Some((dest, extra_dest)) = decode_fp_ea(cfg, op >> 3, op, tail(data, length), 1, None)
            else {
                return unimpl(4);
            };
            length += extra_dest;
            return instr(
                Mnemonic::Fscc(cond),
                length,
                Some(SizeSpec::Fp(FpSize::Byte)),
                None,
                Some(dest),
                None,
            );
        }

        if fp_op & 2 == 2 {
            // FBcc with a 16- or 32-bit displacement
            let Some(cond) = FpCondition::from_bits((op & 0x3F) as u8) else {
                return unimpl(2);
            };
            let (disp, length) = if fp_op & 1 == 0 {
                let Some(d16) = read_i16(data, 2) else {
                    return unimpl(2);
                };
                (i32::from(d16), 4)
            } else {
                let Some(d32) = read_u32(data, 2) else {
                    return unimpl(2);
                };
                (d32 as i32, 6)
            };
            let dest = Operand::RegIndirectDisp {
                size: 4,
                base: BaseReg::Pc,
                disp,
            };
            return instr(Mnemonic::Fbcc(cond), length, None, None, Some(dest), None);
        }

        // fp_op & 4: FSAVE/FRESTORE. State frames vary in size; the
        // largest 68040 frame bounds the operand.
        let mnemonic = if fp_op == 4 {
            Mnemonic::Fsave
        } else {
            Mnemonic::Frestore
        };
        let mut length = 2usize;
        let Some((source, extra_source)) = decode_fp_ea(cfg, op >> 3, op, tail(data, 2), 96, None)
        else {
            return unimpl(2);
        };
        length += extra_source;
        instr(mnemonic, length, None, Some(source), None, None)
    }

    // --- Text formatting ---

    /// Render a decoded instruction as a token stream:
    /// `mnemonic.size  src, dst[, third]`.
    #[must_use]
    pub fn format(&self, instruction: &Instruction, addr: u32) -> Vec<Token> {
        let mut name = instruction.mnemonic.name();
        if let Some(size) = instruction.size {
            name.push_str(size.suffix());
        }
        let mut tokens = vec![Token::new(TokenKind::Instruction, format!("{name:<10}"))];

        let mut first = true;
        for operand in [&instruction.source, &instruction.dest, &instruction.third]
            .into_iter()
            .flatten()
        {
            if !first {
                tokens.push(Token::separator(", "));
            }
            first = false;
            tokens.extend(operand.format(addr));
        }
        tokens
    }
}
