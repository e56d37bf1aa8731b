//! Motorola 68000-family instruction decoder and IR lifter.
//!
//! One [`M68k`] instance is bound to a CPU model and decodes one
//! instruction per call from a big-endian byte stream: mnemonic, operand
//! size, up to three typed operands, and total length. On top of the
//! decoded form it offers text formatting as a token stream, branch
//! classification for flow analysis, and lifting into an
//! architecture-neutral IR through the caller-supplied [`IlBuilder`]
//! trait.
//!
//! The core is purely computational: no I/O, no globals, bounded work
//! per call. Instances are cheap values; independent instances may
//! decode in parallel as long as each IL builder stays single-caller.

pub mod branches;
mod decode;
mod ea;
pub mod flags;
pub mod il;
pub mod instruction;
mod lift;
pub mod model;
pub mod operand;
mod patch;
pub mod registers;
pub mod tokens;

pub use branches::{Branch, BranchKind};
pub use flags::{Condition, Flag, FlagWrite, FpCondition};
pub use il::{FlagCond, IlBuilder};
pub use instruction::{FpSize, Instruction, Mnemonic, Size, SizeSpec, Unimplemented};
pub use model::{CpuModel, VariantConfig};
pub use operand::{AbsoluteField, BaseReg, FpValue, IndexReg, Operand};
pub use registers::Reg;
pub use tokens::{Token, TokenKind};

/// Decoder, formatter, flow analyzer and lifter for one CPU model.
#[derive(Debug, Clone, Copy)]
pub struct M68k {
    model: CpuModel,
    config: VariantConfig,
}

impl M68k {
    /// Decoder for the given CPU model.
    #[must_use]
    pub fn new(model: CpuModel) -> Self {
        Self {
            model,
            config: model.config(),
        }
    }

    #[must_use]
    pub fn model(&self) -> CpuModel {
        self.model
    }

    #[must_use]
    pub fn config(&self) -> &VariantConfig {
        &self.config
    }
}
