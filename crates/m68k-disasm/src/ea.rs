//! Effective-address decoding.
//!
//! A 6-bit mode+register field plus zero or more trailing extension bytes
//! designate one operand. Modes 0-6 use the register field directly; mode
//! 7 overloads it to select absolute, PC-relative and immediate forms.
//!
//! Extension word layout (modes 6 and 7/3):
//!
//! ```text
//! 15-12: index register (D0-D7/A0-A7)
//!    11: index size (0 = word, 1 = long)
//! 10- 9: scale (1 << value)
//!     8: brief (0) / full (1)
//! ```
//!
//! A brief word carries a signed 8-bit displacement in bits 7-0. A full
//! word (68020+ only, gated on the variant's `memory_indirect`) adds
//! base/index suppression, a sized base displacement, and an optional
//! memory-indirect stage with an outer displacement.

use crate::instruction::FpSize;
use crate::model::VariantConfig;
use crate::operand::{AbsoluteField, BaseReg, FpValue, IndexReg, Operand};
use crate::registers::Reg;

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_i16(data: &[u8], offset: usize) -> Option<i16> {
    read_u16(data, offset).map(|v| v as i16)
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn read_i32(data: &[u8], offset: usize) -> Option<i32> {
    read_u32(data, offset).map(|v| v as i32)
}

/// Decode one effective address.
///
/// `data` holds the bytes following the fields already consumed; `size`
/// is the operand byte width. Returns the operand and the number of
/// extension bytes consumed, or `None` for unrecognized or unsupported
/// encodings.
pub(crate) fn decode_ea(
    cfg: &VariantConfig,
    mode: u16,
    register: u16,
    data: &[u8],
    size: u32,
) -> Option<(Operand, usize)> {
    let mode = (mode & 0x07) as u8;
    let register = (register & 0x07) as u8;

    let index_base = match mode {
        0 => {
            return Some((
                Operand::RegDirect {
                    size,
                    reg: Reg::D(register),
                },
                0,
            ));
        }
        1 => {
            return Some((
                Operand::RegDirect {
                    size,
                    reg: Reg::A(register),
                },
                0,
            ));
        }
        2 => {
            return Some((
                Operand::RegIndirect {
                    size,
                    reg: Reg::A(register),
                },
                0,
            ));
        }
        3 => {
            return Some((
                Operand::RegIndirectPostInc {
                    size,
                    reg: Reg::A(register),
                },
                0,
            ));
        }
        4 => {
            return Some((
                Operand::RegIndirectPreDec {
                    size,
                    reg: Reg::A(register),
                },
                0,
            ));
        }
        5 => {
            let disp = read_i16(data, 0)?;
            return Some((
                Operand::RegIndirectDisp {
                    size,
                    base: BaseReg::Reg(Reg::A(register)),
                    disp: i32::from(disp),
                },
                2,
            ));
        }
        6 => BaseReg::Reg(Reg::A(register)),
        _ => match register {
            0 => {
                // Absolute short: extend bit 15 to the variant's address
                // width (24 bits on the 68000 bus, 32 elsewhere).
                let mut address = u32::from(read_u16(data, 0)?);
                if address & 0x8000 != 0 {
                    address |= if cfg.address_width == 4 {
                        0xFFFF_0000
                    } else {
                        0x00FF_0000
                    };
                }
                return Some((
                    Operand::Absolute {
                        size,
                        address,
                        field: AbsoluteField::Word,
                        width: cfg.address_width,
                    },
                    2,
                ));
            }
            1 => {
                let address = read_u32(data, 0)?;
                return Some((
                    Operand::Absolute {
                        size,
                        address,
                        field: AbsoluteField::Long,
                        width: cfg.address_width,
                    },
                    4,
                ));
            }
            2 => {
                let disp = read_i16(data, 0)?;
                return Some((
                    Operand::RegIndirectDisp {
                        size,
                        base: BaseReg::Pc,
                        disp: i32::from(disp),
                    },
                    2,
                ));
            }
            3 => BaseReg::Pc,
            4 => {
                return match size {
                    1 => {
                        // Byte immediates occupy the low byte of a word.
                        let value = read_u8(data, 1)? as i8;
                        Some((
                            Operand::Immediate {
                                size,
                                value: i64::from(value),
                            },
                            2,
                        ))
                    }
                    2 => {
                        let value = read_i16(data, 0)?;
                        Some((
                            Operand::Immediate {
                                size,
                                value: i64::from(value),
                            },
                            2,
                        ))
                    }
                    4 => {
                        let value = read_i32(data, 0)?;
                        Some((
                            Operand::Immediate {
                                size,
                                value: i64::from(value),
                            },
                            4,
                        ))
                    }
                    _ => None,
                };
            }
            _ => return None,
        },
    };

    // Modes 6 and 7/3: extension word keyed off An or PC.
    let extra = read_u16(data, 0)?;
    let index = IndexReg {
        reg: Reg::from_index4((extra >> 12) as u8),
        long: extra & 0x0800 != 0,
        scale: 1 << ((extra >> 9) & 3),
    };

    if extra & 0x0100 == 0 {
        // Brief extension word: signed 8-bit displacement.
        let d8 = (extra & 0xFF) as u8 as i8;
        return Some((
            Operand::RegIndirectIndex {
                size,
                base: Some(index_base),
                disp: i32::from(d8),
                index: Some(index),
            },
            2,
        ));
    }

    // Full extension word.
    if !cfg.memory_indirect {
        log::debug!("full extension word ${extra:04x} rejected: variant has no memory indirect");
        return None;
    }

    let base = if (extra >> 7) & 1 == 0 {
        Some(index_base)
    } else {
        None
    };
    let index = if (extra >> 6) & 1 == 0 {
        Some(index)
    } else {
        None
    };

    let mut length = 2;
    let bd = match (extra >> 4) & 3 {
        2 => {
            let bd = read_i16(data, length)?;
            length += 2;
            i32::from(bd)
        }
        3 => {
            let bd = read_i32(data, length)?;
            length += 4;
            bd
        }
        _ => 0,
    };
    let od = match extra & 3 {
        2 => {
            let od = read_i16(data, length)?;
            length += 2;
            i32::from(od)
        }
        3 => {
            let od = read_i32(data, length)?;
            length += 4;
            od
        }
        _ => 0,
    };

    let op = if extra & 7 == 0 {
        Operand::RegIndirectIndex {
            size,
            base,
            disp: bd,
            index,
        }
    } else if (extra >> 2) & 1 != 0 {
        Operand::MemIndirectPostIndex {
            size,
            base,
            disp: bd,
            index,
            outer: od,
        }
    } else {
        Operand::MemIndirectPreIndex {
            size,
            base,
            disp: bd,
            index,
            outer: od,
        }
    };
    Some((op, length))
}

/// Decode an FP effective address.
///
/// Wraps [`decode_ea`] with the mode restrictions the FPU imposes, and
/// produces [`Operand::FpImmediate`] for single/double/extended immediate
/// data.
pub(crate) fn decode_fp_ea(
    cfg: &VariantConfig,
    mode: u16,
    register: u16,
    data: &[u8],
    size: u32,
    fp_format: Option<FpSize>,
) -> Option<(Operand, usize)> {
    let mode_bits = (mode & 0x07) as u8;
    let register_bits = (register & 0x07) as u8;

    match mode_bits {
        // Registers cannot hold the wide FP formats.
        0 | 1 => {
            if size <= 4 {
                return decode_ea(cfg, mode, register, data, size);
            }
        }
        2..=6 => return decode_ea(cfg, mode, register, data, size),
        _ => {
            if register_bits == 1 {
                return decode_ea(cfg, mode, register, data, size);
            }
            if register_bits == 4 {
                match fp_format {
                    Some(FpSize::Single) => {
                        let bytes = data.get(..4)?;
                        let value = f64::from(f32::from_be_bytes([
                            bytes[0], bytes[1], bytes[2], bytes[3],
                        ]));
                        return Some((fp_immediate(size, bytes, value), 4));
                    }
                    Some(FpSize::Double) => {
                        let bytes = data.get(..8)?;
                        let mut raw = [0u8; 8];
                        raw.copy_from_slice(bytes);
                        let value = f64::from_be_bytes(raw);
                        return Some((fp_immediate(size, bytes, value), 8));
                    }
                    Some(FpSize::Extended) => {
                        let bytes = data.get(..12)?;
                        let value = extended_to_f64(bytes);
                        return Some((fp_immediate(size, bytes, value), 12));
                    }
                    _ => {
                        if size <= 4 {
                            return decode_ea(cfg, mode, register, data, size);
                        }
                    }
                }
            }
        }
    }

    log::debug!("unsupported FP effective address: mode {mode_bits} register {register_bits}");
    None
}

fn fp_immediate(size: u32, bytes: &[u8], value: f64) -> Operand {
    let mut bits: u128 = 0;
    for &b in bytes {
        bits = (bits << 8) | u128::from(b);
    }
    Operand::FpImmediate {
        size,
        bits,
        value: FpValue(value),
        text: format!("${}", format_scientific(value)),
    }
}

/// Convert the 96-bit extended-precision encoding to a host float for
/// display. Precision beyond f64 is intentionally dropped.
///
/// Layout: sign bit 95, 15-bit exponent at bits 94-80 (bias 0x3FFF),
/// 16 zero-pad bits, then a 64-bit mantissa with an explicit integer bit
/// at bit 63.
pub(crate) fn extended_to_f64(bytes: &[u8]) -> f64 {
    let mut raw: u128 = 0;
    for &b in bytes.iter().take(12) {
        raw = (raw << 8) | u128::from(b);
    }
    let mantissa = (raw & ((1u128 << 64) - 1)) as u64;
    let exp = ((raw >> 80) & 0x7FFF) as i32;
    let negative = (raw >> 95) & 1 != 0;

    let magnitude = if exp == 0x7FFF {
        if mantissa == 0 { f64::INFINITY } else { f64::NAN }
    } else {
        // Explicit integer bit at mantissa bit 63.
        (mantissa as f64) * 2f64.powi(exp - 0x3FFF - 63)
    };
    if negative { -magnitude } else { magnitude }
}

/// Scientific notation with a signed two-digit exponent: `2.5000e+02`.
pub(crate) fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    let formatted = format!("{value:.4e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            if exp < 0 {
                format!("{mantissa}e-{:02}", -exp)
            } else {
                format!("{mantissa}e+{exp:02}")
            }
        }
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_ea, extended_to_f64, format_scientific};
    use crate::model::CpuModel;
    use crate::operand::{AbsoluteField, BaseReg, Operand};
    use crate::registers::Reg;

    #[test]
    fn absolute_short_extends_to_bus_width() {
        let m68000 = CpuModel::M68000.config();
        let (op, len) = decode_ea(&m68000, 7, 0, &[0x80, 0x00], 2).unwrap();
        assert_eq!(len, 2);
        assert_eq!(
            op,
            Operand::Absolute {
                size: 2,
                address: 0x00FF_8000,
                field: AbsoluteField::Word,
                width: 3,
            }
        );

        let m68020 = CpuModel::M68020.config();
        let (op, _) = decode_ea(&m68020, 7, 0, &[0x80, 0x00], 2).unwrap();
        assert_eq!(
            op,
            Operand::Absolute {
                size: 2,
                address: 0xFFFF_8000,
                field: AbsoluteField::Word,
                width: 4,
            }
        );
    }

    #[test]
    fn brief_extension_word_decodes_index_and_scale() {
        let cfg = CpuModel::M68020.config();
        // d3.l * 4, displacement -2
        let word = ((0x3u16 << 12) | 0x0800 | (2 << 9) | 0xFE).to_be_bytes();
        let (op, len) = decode_ea(&cfg, 6, 1, &word, 4).unwrap();
        assert_eq!(len, 2);
        match op {
            Operand::RegIndirectIndex {
                base, disp, index, ..
            } => {
                assert_eq!(base, Some(BaseReg::Reg(Reg::A(1))));
                assert_eq!(disp, -2);
                let ix = index.unwrap();
                assert_eq!(ix.reg, Reg::D(3));
                assert!(ix.long);
                assert_eq!(ix.scale, 4);
            }
            other => panic!("unexpected operand {other:?}"),
        }
    }

    #[test]
    fn full_extension_word_needs_memory_indirect_variant() {
        // Full word, base displacement word, pre-indexed with word od.
        let word: u16 = (0x2 << 12) | 0x0100 | (2 << 4) | 2;
        let mut data = word.to_be_bytes().to_vec();
        data.extend_from_slice(&[0x00, 0x10]); // bd
        data.extend_from_slice(&[0x00, 0x20]); // od

        let m68000 = CpuModel::M68000.config();
        assert!(decode_ea(&m68000, 6, 0, &data, 4).is_none());

        let m68020 = CpuModel::M68020.config();
        let (op, len) = decode_ea(&m68020, 6, 0, &data, 4).unwrap();
        assert_eq!(len, 6);
        match op {
            Operand::MemIndirectPreIndex { disp, outer, .. } => {
                assert_eq!(disp, 0x10);
                assert_eq!(outer, 0x20);
            }
            other => panic!("unexpected operand {other:?}"),
        }
    }

    #[test]
    fn immediate_widths_follow_operand_size() {
        let cfg = CpuModel::M68000.config();
        let (op, len) = decode_ea(&cfg, 7, 4, &[0x00, 0xFE], 1).unwrap();
        assert_eq!(len, 2);
        assert_eq!(op, Operand::Immediate { size: 1, value: -2 });

        let (op, len) = decode_ea(&cfg, 7, 4, &[0x12, 0x34, 0x56, 0x78], 4).unwrap();
        assert_eq!(len, 4);
        assert_eq!(
            op,
            Operand::Immediate {
                size: 4,
                value: 0x1234_5678,
            }
        );
    }

    #[test]
    fn short_buffers_fail_cleanly() {
        let cfg = CpuModel::M68000.config();
        assert!(decode_ea(&cfg, 7, 4, &[0x12], 2).is_none());
        assert!(decode_ea(&cfg, 5, 0, &[], 2).is_none());
    }

    #[test]
    fn extended_precision_display_value() {
        // 1.0 in extended precision: exponent 0x3FFF, integer bit set.
        let bytes = [0x3F, 0xFF, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let value = extended_to_f64(&bytes);
        assert!((value - 1.0).abs() < 1e-12);
        assert_eq!(format_scientific(value), "1.0000e+00");
        assert_eq!(format_scientific(250.0), "2.5000e+02");
        assert_eq!(format_scientific(0.25), "2.5000e-01");
    }
}
