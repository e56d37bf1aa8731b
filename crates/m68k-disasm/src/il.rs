//! IR builder contract.
//!
//! The lifter is written against this trait rather than any concrete host
//! IL. Every operation is purely algebraic: the builder hands back opaque
//! expression handles which the lifter threads into larger expressions and
//! finally emits as statements with [`IlBuilder::emit`].
//!
//! Sizes are byte widths (1, 2, 4, ... up to 12 for FP extended values).
//! Arithmetic and store operations take a [`FlagWrite`] class describing
//! which condition flags the host should recompute from the expression.

use crate::flags::{Flag, FlagWrite};
use crate::registers::Reg;

/// Flag condition consumed by conditional IL. Mirrors the usual
/// IL flag-condition set: unsigned/signed orderings plus the direct
/// flag tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagCond {
    UnsignedLessThan,
    UnsignedLessOrEqual,
    UnsignedGreaterOrEqual,
    UnsignedGreaterThan,
    SignedLessThan,
    SignedLessOrEqual,
    SignedGreaterOrEqual,
    SignedGreaterThan,
    Equal,
    NotEqual,
    Overflow,
    NoOverflow,
    Positive,
    Negative,
}

/// Host-supplied IR builder.
///
/// One builder instance accumulates the IL of a single instruction; the
/// lifter never retains expressions across calls. Implementations decide
/// what an expression handle is: an index into an arena, a tree node, or
/// an eagerly evaluated value.
pub trait IlBuilder {
    /// Opaque expression handle.
    type Expr;
    /// Branch label handle.
    type Label;

    // --- Constants ---

    /// Integer constant of the given byte width.
    fn const_int(&mut self, size: u32, value: u64) -> Self::Expr;
    /// Pointer-typed constant (candidate code/data address).
    fn const_pointer(&mut self, size: u32, value: u64) -> Self::Expr;

    // --- Registers ---

    fn reg(&mut self, size: u32, reg: Reg) -> Self::Expr;
    fn set_reg(&mut self, size: u32, reg: Reg, value: Self::Expr, flags: FlagWrite) -> Self::Expr;
    /// Split assignment: `hi:lo = value` where `value` is twice `size` wide.
    fn set_reg_split(
        &mut self,
        size: u32,
        hi: Reg,
        lo: Reg,
        value: Self::Expr,
        flags: FlagWrite,
    ) -> Self::Expr;

    // --- Memory ---

    fn load(&mut self, size: u32, addr: Self::Expr) -> Self::Expr;
    fn store(&mut self, size: u32, addr: Self::Expr, value: Self::Expr, flags: FlagWrite)
    -> Self::Expr;
    fn push(&mut self, size: u32, value: Self::Expr) -> Self::Expr;
    fn pop(&mut self, size: u32) -> Self::Expr;

    // --- Flags ---

    fn flag(&mut self, flag: Flag) -> Self::Expr;
    fn set_flag(&mut self, flag: Flag, value: Self::Expr) -> Self::Expr;
    /// Flag value positioned at `bit` within an integer of `size` bytes.
    fn flag_bit(&mut self, size: u32, flag: Flag, bit: u32) -> Self::Expr;
    fn flag_condition(&mut self, cond: FlagCond) -> Self::Expr;

    // --- Arithmetic ---

    fn add(&mut self, size: u32, a: Self::Expr, b: Self::Expr, flags: FlagWrite) -> Self::Expr;
    fn sub(&mut self, size: u32, a: Self::Expr, b: Self::Expr, flags: FlagWrite) -> Self::Expr;
    fn neg(&mut self, size: u32, value: Self::Expr, flags: FlagWrite) -> Self::Expr;
    fn mult(&mut self, size: u32, a: Self::Expr, b: Self::Expr, flags: FlagWrite) -> Self::Expr;
    fn div_signed(&mut self, size: u32, a: Self::Expr, b: Self::Expr, flags: FlagWrite)
    -> Self::Expr;
    fn div_unsigned(
        &mut self,
        size: u32,
        a: Self::Expr,
        b: Self::Expr,
        flags: FlagWrite,
    ) -> Self::Expr;
    fn mod_signed(&mut self, size: u32, a: Self::Expr, b: Self::Expr) -> Self::Expr;
    fn mod_unsigned(&mut self, size: u32, a: Self::Expr, b: Self::Expr) -> Self::Expr;

    // --- Bitwise ---

    fn and_expr(&mut self, size: u32, a: Self::Expr, b: Self::Expr, flags: FlagWrite)
    -> Self::Expr;
    fn or_expr(&mut self, size: u32, a: Self::Expr, b: Self::Expr, flags: FlagWrite) -> Self::Expr;
    fn xor_expr(&mut self, size: u32, a: Self::Expr, b: Self::Expr, flags: FlagWrite)
    -> Self::Expr;
    fn not_expr(&mut self, size: u32, value: Self::Expr, flags: FlagWrite) -> Self::Expr;

    // --- Shifts and rotates ---

    fn shift_left(&mut self, size: u32, value: Self::Expr, count: Self::Expr, flags: FlagWrite)
    -> Self::Expr;
    fn logical_shift_right(
        &mut self,
        size: u32,
        value: Self::Expr,
        count: Self::Expr,
        flags: FlagWrite,
    ) -> Self::Expr;
    fn arith_shift_right(
        &mut self,
        size: u32,
        value: Self::Expr,
        count: Self::Expr,
        flags: FlagWrite,
    ) -> Self::Expr;
    fn rotate_left(&mut self, size: u32, value: Self::Expr, count: Self::Expr, flags: FlagWrite)
    -> Self::Expr;
    fn rotate_right(
        &mut self,
        size: u32,
        value: Self::Expr,
        count: Self::Expr,
        flags: FlagWrite,
    ) -> Self::Expr;
    /// Rotate through the supplied carry expression (ROXL).
    fn rotate_left_carry(
        &mut self,
        size: u32,
        value: Self::Expr,
        count: Self::Expr,
        carry: Self::Expr,
        flags: FlagWrite,
    ) -> Self::Expr;
    /// Rotate through the supplied carry expression (ROXR).
    fn rotate_right_carry(
        &mut self,
        size: u32,
        value: Self::Expr,
        count: Self::Expr,
        carry: Self::Expr,
        flags: FlagWrite,
    ) -> Self::Expr;

    // --- Width changes ---

    fn sign_extend(&mut self, size: u32, value: Self::Expr, flags: FlagWrite) -> Self::Expr;
    fn zero_extend(&mut self, size: u32, value: Self::Expr) -> Self::Expr;

    // --- Comparisons ---

    fn compare_equal(&mut self, size: u32, a: Self::Expr, b: Self::Expr) -> Self::Expr;
    fn compare_not_equal(&mut self, size: u32, a: Self::Expr, b: Self::Expr) -> Self::Expr;
    fn compare_unsigned_less_than(&mut self, size: u32, a: Self::Expr, b: Self::Expr)
    -> Self::Expr;
    fn compare_unsigned_greater_than(
        &mut self,
        size: u32,
        a: Self::Expr,
        b: Self::Expr,
    ) -> Self::Expr;
    /// Non-zero iff `value & mask` is non-zero.
    fn test_bit(&mut self, size: u32, value: Self::Expr, mask: Self::Expr) -> Self::Expr;

    // --- Control flow ---

    fn jump(&mut self, target: Self::Expr) -> Self::Expr;
    fn call(&mut self, target: Self::Expr) -> Self::Expr;
    fn ret(&mut self, target: Self::Expr) -> Self::Expr;
    fn system_call(&mut self) -> Self::Expr;
    fn nop(&mut self) -> Self::Expr;
    fn unimplemented(&mut self) -> Self::Expr;

    fn if_expr(&mut self, cond: Self::Expr, t: &Self::Label, f: &Self::Label) -> Self::Expr;
    fn goto(&mut self, label: &Self::Label) -> Self::Expr;

    // --- Labels ---

    /// Fresh unplaced label.
    fn create_label(&mut self) -> Self::Label;
    /// Place a label at the current IL position.
    fn mark_label(&mut self, label: &Self::Label);
    /// Label already registered for an instruction address, if any.
    fn label_for_address(&mut self, addr: u32) -> Option<Self::Label>;

    // --- Statements ---

    /// Append an expression as an IL statement.
    fn emit(&mut self, expr: Self::Expr);
}
