//! Branch classification.
//!
//! A lightweight second pass over a decoded instruction: no lifting, just
//! the control-flow shape and, where the destination is statically
//! encoded, the concrete target address. Disassembly drivers use this to
//! build their flow graphs before any IL exists.

use crate::M68k;
use crate::instruction::{Instruction, Mnemonic};
use crate::operand::{BaseReg, Operand};

/// Branch classification reported to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// `jmp`/`bra`.
    Unconditional,
    /// `jsr`/`bsr`.
    Call,
    /// `rtd`/`rte`/`rtr`/`rts`.
    FunctionReturn,
    /// Conditional branch taken.
    True,
    /// Conditional branch not taken.
    False,
    /// Computed destination; no static target.
    Unresolved,
}

/// One outgoing edge of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    pub kind: BranchKind,
    pub target: Option<u32>,
}

impl M68k {
    /// Outgoing control-flow edges of one instruction. Empty for
    /// sequential instructions.
    #[must_use]
    pub fn branch_info(&self, ins: &Instruction, addr: u32) -> Vec<Branch> {
        match ins.mnemonic {
            Mnemonic::Rtd | Mnemonic::Rte | Mnemonic::Rtr | Mnemonic::Rts => vec![Branch {
                kind: BranchKind::FunctionReturn,
                target: None,
            }],
            Mnemonic::Jmp | Mnemonic::Bra | Mnemonic::Jsr | Mnemonic::Bsr => {
                let (unresolved, target) = match &ins.dest {
                    Some(dest) => Self::classify_target(dest, addr),
                    None => (false, None),
                };
                let kind = if unresolved {
                    BranchKind::Unresolved
                } else if matches!(ins.mnemonic, Mnemonic::Jsr | Mnemonic::Bsr) {
                    BranchKind::Call
                } else {
                    BranchKind::Unconditional
                };
                vec![Branch { kind, target }]
            }
            Mnemonic::Bcc(_) | Mnemonic::Fbcc(_) => {
                let target = ins
                    .dest
                    .as_ref()
                    .and_then(|dest| Self::static_target(dest, addr));
                vec![
                    Branch {
                        kind: BranchKind::True,
                        target,
                    },
                    Branch {
                        kind: BranchKind::False,
                        target: Some(addr.wrapping_add(ins.length as u32)),
                    },
                ]
            }
            // DBcc falls through when the condition holds and branches
            // while the counter has not expired, inverted against Bcc.
            Mnemonic::Dbcc(_) => {
                let target = ins
                    .dest
                    .as_ref()
                    .and_then(|dest| Self::static_target(dest, addr));
                vec![
                    Branch {
                        kind: BranchKind::True,
                        target: Some(addr.wrapping_add(ins.length as u32)),
                    },
                    Branch {
                        kind: BranchKind::False,
                        target,
                    },
                ]
            }
            _ => Vec::new(),
        }
    }

    /// Statically known destination address of an operand, if any.
    #[must_use]
    pub(crate) fn static_target(operand: &Operand, addr: u32) -> Option<u32> {
        match operand {
            Operand::Absolute { address, .. } => Some(*address),
            Operand::RegIndirectDisp {
                base: BaseReg::Pc,
                disp,
                ..
            } => Some(addr.wrapping_add(2).wrapping_add(*disp as u32)),
            _ => None,
        }
    }

    /// Target classification for unconditional flow: whether the
    /// destination is register-computed (unresolved), and the static
    /// target when one exists.
    fn classify_target(operand: &Operand, addr: u32) -> (bool, Option<u32>) {
        match operand {
            Operand::Absolute { address, .. } => (false, Some(*address)),
            Operand::RegIndirect { .. } => (true, None),
            Operand::RegIndirectDisp {
                base: BaseReg::Pc,
                disp,
                ..
            } => (false, Some(addr.wrapping_add(2).wrapping_add(*disp as u32))),
            Operand::RegIndirectDisp { .. } | Operand::RegIndirectIndex { .. } => (true, None),
            _ => (false, None),
        }
    }
}
