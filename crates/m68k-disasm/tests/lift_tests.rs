//! Lifter coverage: IL structure (node kinds, flag-write classes) and
//! concrete semantics via the straight-line evaluator in `common`.

mod common;

use common::{BinOp, Machine, MockIl, Node};
use m68k_disasm::{CpuModel, Flag, FlagWrite, M68k, Reg};

fn lift(model: CpuModel, bytes: &[u8], addr: u32) -> MockIl {
    let m68k = M68k::new(model);
    let ins = m68k.decode(bytes, addr).expect("decode failed");
    let mut il = MockIl::new();
    let consumed = m68k.lift(&ins, addr, &mut il);
    assert_eq!(consumed, ins.length);
    il
}

/// Lift and execute on a fresh machine prepared by `setup`.
fn run(model: CpuModel, bytes: &[u8], addr: u32, setup: impl FnOnce(&mut Machine)) -> Machine {
    let il = lift(model, bytes, addr);
    let mut machine = Machine::new();
    setup(&mut machine);
    machine.run(&il);
    machine
}

#[test]
fn nop_lifts_to_a_single_nop_node() {
    let il = lift(CpuModel::M68000, &[0x4E, 0x71], 0x1000);
    assert_eq!(il.stmt_nodes(), vec![&Node::Nop]);
}

#[test]
fn trap_lifts_to_a_system_call() {
    let il = lift(CpuModel::M68000, &[0x4E, 0x42], 0x1000);
    assert_eq!(il.stmt_nodes(), vec![&Node::SystemCall]);
}

#[test]
fn undecodable_input_lifts_to_one_unimplemented_node() {
    let m68k = M68k::new(CpuModel::M68000);
    let sentinel = m68k.decode(&[0xFF, 0xFF], 0x1000).unwrap_err();
    let mut il = MockIl::new();
    let consumed = m68k.lift_unimplemented(sentinel, &mut il);
    assert_eq!(consumed, 2);
    assert_eq!(il.stmt_nodes(), vec![&Node::Unimplemented]);
}

#[test]
fn bcd_and_movep_decode_but_lift_unimplemented() {
    // abcd d0,d0
    let il = lift(CpuModel::M68000, &[0xC1, 0x00], 0x1000);
    assert_eq!(il.stmt_nodes(), vec![&Node::Unimplemented]);
    // movep.w $10(a0),d0
    let il = lift(CpuModel::M68000, &[0x01, 0x08, 0x00, 0x10], 0x1000);
    assert_eq!(il.stmt_nodes(), vec![&Node::Unimplemented]);
}

#[test]
fn arithmetic_writes_all_five_flags() {
    let il = lift(CpuModel::M68000, &[0xD0, 0x41], 0x1000);
    let adds = il.count(|n| {
        matches!(
            n,
            Node::Binary {
                op: BinOp::Add,
                flags: FlagWrite::All,
                ..
            }
        )
    });
    assert_eq!(adds, 1);
}

#[test]
fn logic_writes_nzvc() {
    // and.w d1,d0
    let il = lift(CpuModel::M68000, &[0xC0, 0x41], 0x1000);
    let ands = il.count(|n| {
        matches!(
            n,
            Node::Binary {
                op: BinOp::And,
                flags: FlagWrite::Nzvc,
                ..
            }
        )
    });
    assert_eq!(ands, 1);
    assert_eq!(
        il.count(|n| matches!(n, Node::Binary { flags: FlagWrite::All, .. })),
        0
    );
}

#[test]
fn move_to_ccr_decomposes_into_flag_bits() {
    // move.w d0,ccr
    let il = lift(CpuModel::M68000, &[0x44, 0xC0], 0x1000);
    let flag_sets = il
        .stmt_nodes()
        .into_iter()
        .filter(|n| matches!(n, Node::SetFlag { .. }))
        .count();
    assert_eq!(flag_sets, 5);
}

#[test]
fn ccr_immediates_constant_fold() {
    // andi.b #$15,ccr names c, z, x: only v and n get cleared.
    let il = lift(CpuModel::M68000, &[0x02, 0x3C, 0x00, 0x15], 0x1000);
    let cleared: Vec<Flag> = il
        .stmt_nodes()
        .into_iter()
        .filter_map(|n| match n {
            Node::SetFlag { flag, .. } => Some(*flag),
            _ => None,
        })
        .collect();
    assert_eq!(cleared, vec![Flag::V, Flag::N]);

    // ori.b #$01,ccr sets only carry.
    let il = lift(CpuModel::M68000, &[0x00, 0x3C, 0x00, 0x01], 0x1000);
    let set: Vec<Flag> = il
        .stmt_nodes()
        .into_iter()
        .filter_map(|n| match n {
            Node::SetFlag { flag, .. } => Some(*flag),
            _ => None,
        })
        .collect();
    assert_eq!(set, vec![Flag::C]);

    // eori.b #$10,ccr toggles only x.
    let il = lift(CpuModel::M68000, &[0x0A, 0x3C, 0x00, 0x10], 0x1000);
    let toggled: Vec<Flag> = il
        .stmt_nodes()
        .into_iter()
        .filter_map(|n| match n {
            Node::SetFlag { flag, .. } => Some(*flag),
            _ => None,
        })
        .collect();
    assert_eq!(toggled, vec![Flag::X]);
}

#[test]
fn rts_ends_in_a_return() {
    let il = lift(CpuModel::M68000, &[0x4E, 0x75], 0x1000);
    assert!(matches!(il.stmt_nodes().last(), Some(Node::Ret(_))));
}

#[test]
fn moveq_sign_extends_to_full_width() {
    let machine = run(CpuModel::M68000, &[0x70, 0xFF], 0x1000, |_| {});
    assert_eq!(machine.reg(Reg::D(0)), 0xFFFF_FFFF);
}

#[test]
fn word_add_preserves_upper_register_bits() {
    let machine = run(CpuModel::M68000, &[0xD0, 0x41], 0x1000, |m| {
        m.set_reg(Reg::D(0), 0xAAAA_0001);
        m.set_reg(Reg::D(1), 0x0000_0002);
    });
    assert_eq!(machine.reg(Reg::D(0)), 0xAAAA_0003);
}

#[test]
fn addx_chains_the_extend_flag() {
    // addx.w d1,d0
    let machine = run(CpuModel::M68000, &[0xD1, 0x41], 0x1000, |m| {
        m.set_reg(Reg::D(0), 1);
        m.set_reg(Reg::D(1), 2);
        m.flags.insert(Flag::X, true);
    });
    assert_eq!(machine.reg(Reg::D(0)), 4);
}

#[test]
fn movem_push_then_pop_round_trips() {
    for model in [CpuModel::M68000, CpuModel::M68020] {
        // movem.l d0/a0,-(sp)
        let store = lift(model, &[0x48, 0xE7, 0x80, 0x80], 0x1000);
        let mut machine = Machine::new();
        machine.set_reg(Reg::D(0), 0x1111_1111);
        machine.set_reg(Reg::A(0), 0x2222_2222);
        machine.set_reg(Reg::A(7), 0x2000);
        machine.run(&store);
        assert_eq!(machine.reg(Reg::A(7)), 0x2000 - 8);

        // Clobber, then movem.l (sp)+,d0/a0
        machine.set_reg(Reg::D(0), 0);
        machine.set_reg(Reg::A(0), 0);
        let load = lift(model, &[0x4C, 0xDF, 0x01, 0x01], 0x1004);
        machine.run(&load);

        assert_eq!(machine.reg(Reg::D(0)), 0x1111_1111);
        assert_eq!(machine.reg(Reg::A(0)), 0x2222_2222);
        assert_eq!(machine.reg(Reg::A(7)), 0x2000);
    }
}

#[test]
fn movem_store_order_is_variant_specific() {
    // Both orderings must leave the same memory image and final An.
    let mut images = Vec::new();
    for model in [CpuModel::M68000, CpuModel::M68020] {
        let il = lift(model, &[0x48, 0xE7, 0x80, 0x80], 0x1000);
        let mut machine = Machine::new();
        machine.set_reg(Reg::D(0), 0xDEAD_BEEF);
        machine.set_reg(Reg::A(0), 0xCAFE_F00D);
        machine.set_reg(Reg::A(7), 0x2000);
        machine.run(&il);
        let image: Vec<u8> = (0x1FF8u32..0x2000)
            .map(|a| machine.mem.get(&a).copied().unwrap_or(0))
            .collect();
        images.push((machine.reg(Reg::A(7)), image));
    }
    assert_eq!(images[0], images[1]);
    // d0 lands at the lower address, a0 above it.
    assert_eq!(
        images[0].1,
        vec![0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE, 0xF0, 0x0D]
    );
}

#[test]
fn neg_not_swap_are_involutions() {
    for (bytes, value) in [
        ([0x44u8, 0x40u8], 0xAAAA_1234u64), // neg.w d0
        ([0x46, 0x40], 0xAAAA_1234),        // not.w d0
        ([0x48, 0x40], 0x1234_5678),        // swap d0
    ] {
        let first = run(CpuModel::M68000, &bytes, 0x1000, |m| {
            m.set_reg(Reg::D(0), value);
        });
        let il = lift(CpuModel::M68000, &bytes, 0x1000);
        let mut second = first;
        second.run(&il);
        assert_eq!(second.reg(Reg::D(0)), value, "{bytes:02x?}");
    }
}

#[test]
fn ext_is_idempotent() {
    // ext.w d0: byte to word, upper word preserved
    let machine = run(CpuModel::M68000, &[0x48, 0x80], 0x1000, |m| {
        m.set_reg(Reg::D(0), 0xAAAA_0085);
    });
    assert_eq!(machine.reg(Reg::D(0)), 0xAAAA_FF85);

    let il = lift(CpuModel::M68000, &[0x48, 0x80], 0x1000);
    let mut again = machine;
    again.run(&il);
    assert_eq!(again.reg(Reg::D(0)), 0xAAAA_FF85);

    // ext.l d0: word to long
    let machine = run(CpuModel::M68000, &[0x48, 0xC0], 0x1000, |m| {
        m.set_reg(Reg::D(0), 0x0000_8000);
    });
    assert_eq!(machine.reg(Reg::D(0)), 0xFFFF_8000);
}

#[test]
fn link_and_unlk_round_trip_the_frame() {
    // link a6,#-8
    let linked = run(CpuModel::M68000, &[0x4E, 0x56, 0xFF, 0xF8], 0x1000, |m| {
        m.set_reg(Reg::A(7), 0x2000);
        m.set_reg(Reg::A(6), 0x1234_5678);
    });
    assert_eq!(linked.reg(Reg::A(6)), 0x1FFC);
    assert_eq!(linked.reg(Reg::A(7)), 0x1FF4);

    // unlk a6
    let il = lift(CpuModel::M68000, &[0x4E, 0x5E], 0x1004);
    let mut unlinked = linked;
    unlinked.run(&il);
    assert_eq!(unlinked.reg(Reg::A(6)), 0x1234_5678);
    assert_eq!(unlinked.reg(Reg::A(7)), 0x2000);
}

#[test]
fn lea_computes_without_touching_memory() {
    // lea $1234(a0),a1
    let machine = run(CpuModel::M68000, &[0x43, 0xE8, 0x12, 0x34], 0x1000, |m| {
        m.set_reg(Reg::A(0), 0x1000);
    });
    assert_eq!(machine.reg(Reg::A(1)), 0x2234);
    assert!(machine.mem.is_empty());
}

#[test]
fn pea_pushes_the_effective_address() {
    // pea (a0)
    let machine = run(CpuModel::M68000, &[0x48, 0x50], 0x1000, |m| {
        m.set_reg(Reg::A(7), 0x2000);
        m.set_reg(Reg::A(0), 0x0000_4321);
    });
    assert_eq!(machine.reg(Reg::A(7)), 0x1FFC);
    let pushed: Vec<u8> = (0x1FFCu32..0x2000)
        .map(|a| machine.mem.get(&a).copied().unwrap_or(0))
        .collect();
    assert_eq!(pushed, vec![0x00, 0x00, 0x43, 0x21]);
}

#[test]
fn postincrement_and_predecrement_step_by_size() {
    // move.w (a0)+,d0
    let machine = run(CpuModel::M68000, &[0x30, 0x18], 0x1000, |m| {
        m.set_reg(Reg::A(0), 0x3000);
        m.mem.insert(0x3000, 0x12);
        m.mem.insert(0x3001, 0x34);
    });
    assert_eq!(machine.reg(Reg::D(0)) & 0xFFFF, 0x1234);
    assert_eq!(machine.reg(Reg::A(0)), 0x3002);

    // move.l d0,-(a0)
    let machine = run(CpuModel::M68000, &[0x21, 0x00], 0x1000, |m| {
        m.set_reg(Reg::A(0), 0x3004);
        m.set_reg(Reg::D(0), 0xAABB_CCDD);
    });
    assert_eq!(machine.reg(Reg::A(0)), 0x3000);
    let stored: Vec<u8> = (0x3000u32..0x3004)
        .map(|a| machine.mem.get(&a).copied().unwrap_or(0))
        .collect();
    assert_eq!(stored, vec![0xAA, 0xBB, 0xCC, 0xDD]);
}

#[test]
fn word_divide_packs_remainder_high() {
    // divu.w d1,d0
    let machine = run(CpuModel::M68000, &[0x80, 0xC1], 0x1000, |m| {
        m.set_reg(Reg::D(0), 100);
        m.set_reg(Reg::D(1), 7);
    });
    assert_eq!(machine.reg(Reg::D(0)), (2 << 16) | 14);
}

#[test]
fn long_multiply_uses_a_split_assignment() {
    // mulu.l d1,d2:d4
    let il = lift(CpuModel::M68020, &[0x4C, 0x01, 0x44, 0x02], 0x1000);
    assert_eq!(
        il.count(|n| matches!(
            n,
            Node::SetRegSplit {
                hi: Reg::D(2),
                lo: Reg::D(4),
                ..
            }
        )),
        1
    );
}

#[test]
fn bcc_uses_registered_labels() {
    let m68k = M68k::new(CpuModel::M68000);
    let ins = m68k.decode(&[0x67, 0xFE], 0x1000).unwrap();
    let mut il = MockIl::new();
    il.address_labels.insert(0x1000, 7);
    m68k.lift(&ins, 0x1000, &mut il);

    // The true edge goes straight to the registered label; the false
    // edge is an anonymous fall-through label marked afterwards.
    let stmts = il.stmt_nodes();
    match stmts.first() {
        Some(Node::If { t, .. }) => assert_eq!(*t, 7),
        other => panic!("expected If, got {other:?}"),
    }
    assert_eq!(il.marks.len(), 1);
}

#[test]
fn scc_writes_both_arms() {
    let il = lift(CpuModel::M68000, &[0x57, 0xC0], 0x1000);
    let stores = il.count(|n| matches!(n, Node::SetReg { reg: Reg::D(0), .. }));
    assert_eq!(stores, 2);
    assert_eq!(il.count(|n| matches!(n, Node::If { .. })), 1);
}

#[test]
fn cas_compares_then_branches() {
    let il = lift(CpuModel::M68020, &[0x0A, 0xD0, 0x00, 0x81], 0x1000);
    assert_eq!(il.count(|n| matches!(n, Node::If { .. })), 1);
    assert_eq!(
        il.count(|n| matches!(
            n,
            Node::Binary {
                op: BinOp::Sub,
                flags: FlagWrite::Nzvc,
                ..
            }
        )),
        1
    );
    assert_eq!(il.count(|n| matches!(n, Node::Store { .. })), 1);
}

#[test]
fn fp_arithmetic_is_marked_unimplemented() {
    let il = lift(CpuModel::M68040, &[0xF2, 0x00, 0x05, 0x22], 0x1000);
    assert_eq!(il.stmt_nodes(), vec![&Node::Unimplemented]);
}
