//! Motorola 68k register catalogue.
//!
//! - D0-D7: 8 data registers (32-bit)
//! - A0-A7: 8 address registers (32-bit, A7 is the stack pointer and
//!   prints as `sp`)
//! - SR/CCR: status register and its condition-code low byte
//! - FP0-FP7: FPU data registers (80-bit extended precision)
//! - FPCR/FPSR/FPIAR: FPU system control registers
//! - Control registers reachable through MOVEC, present per CPU model

use core::fmt;

/// A register as named by the decoder and the lifter.
///
/// `Temp` registers are IL-level temporaries; they never appear in decoded
/// operands or formatted text, only in lifted expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    /// Data register D0-D7.
    D(u8),
    /// Address register A0-A7. A7 is the stack pointer.
    A(u8),
    /// Status register (16-bit).
    Sr,
    /// Condition code register (low byte of SR).
    Ccr,
    /// User stack pointer.
    Usp,
    /// FPU data register FP0-FP7.
    Fp(u8),
    /// FPU control register.
    Fpcr,
    /// FPU status register.
    Fpsr,
    /// FPU instruction address register.
    Fpiar,
    // Control registers (MOVEC); availability depends on the CPU model.
    Sfc,
    Dfc,
    Vbr,
    Cacr,
    Caar,
    Msp,
    Isp,
    Tc,
    Itt0,
    Itt1,
    Dtt0,
    Dtt1,
    Mmusr,
    Urp,
    Srp,
    Iacr0,
    Iacr1,
    Dacr0,
    Dacr1,
    /// IL temporary, lifter-internal.
    Temp(u32),
}

const D_NAMES: [&str; 8] = ["d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7"];
const A_NAMES: [&str; 8] = ["a0", "a1", "a2", "a3", "a4", "a5", "a6", "sp"];
const FP_NAMES: [&str; 8] = ["fp0", "fp1", "fp2", "fp3", "fp4", "fp5", "fp6", "fp7"];

impl Reg {
    /// Register name as it appears in disassembly text.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::D(n) => D_NAMES[(n & 7) as usize],
            Self::A(n) => A_NAMES[(n & 7) as usize],
            Self::Sr => "sr",
            Self::Ccr => "ccr",
            Self::Usp => "usp",
            Self::Fp(n) => FP_NAMES[(n & 7) as usize],
            Self::Fpcr => "fpcr",
            Self::Fpsr => "fpsr",
            Self::Fpiar => "fpiar",
            Self::Sfc => "sfc",
            Self::Dfc => "dfc",
            Self::Vbr => "vbr",
            Self::Cacr => "cacr",
            Self::Caar => "caar",
            Self::Msp => "msp",
            Self::Isp => "isp",
            Self::Tc => "tc",
            Self::Itt0 => "itt0",
            Self::Itt1 => "itt1",
            Self::Dtt0 => "dtt0",
            Self::Dtt1 => "dtt1",
            Self::Mmusr => "mmusr",
            Self::Urp => "urp",
            Self::Srp => "srp",
            Self::Iacr0 => "iacr0",
            Self::Iacr1 => "iacr1",
            Self::Dacr0 => "dacr0",
            Self::Dacr1 => "dacr1",
            Self::Temp(_) => "temp",
        }
    }

    /// Register for a 4-bit index-register field: 0-7 select D0-D7,
    /// 8-15 select A0-A7.
    #[must_use]
    pub fn from_index4(n: u8) -> Self {
        if n & 0x8 == 0 {
            Self::D(n & 7)
        } else {
            Self::A(n & 7)
        }
    }

    /// True for A0-A7, the registers that reject byte-sized writes.
    #[must_use]
    pub fn is_address(self) -> bool {
        matches!(self, Self::A(_))
    }

    /// Position in the MOVEM catalogue d0..d7,a0..a6,sp, or `None` for
    /// registers outside it.
    #[must_use]
    pub fn movem_index(self) -> Option<u8> {
        match self {
            Self::D(n) => Some(n & 7),
            Self::A(n) => Some(8 + (n & 7)),
            _ => None,
        }
    }

    /// Register at a MOVEM catalogue position (0-15).
    #[must_use]
    pub fn from_movem_index(n: u8) -> Self {
        Self::from_index4(n)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temp(n) => write!(f, "temp{n}"),
            _ => f.write_str(self.name()),
        }
    }
}
