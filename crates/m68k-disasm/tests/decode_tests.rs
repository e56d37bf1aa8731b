//! End-to-end decode and format coverage: one scenario per decoder
//! group, plus branch classification.

use m68k_disasm::tokens::render;
use m68k_disasm::{Branch, BranchKind, CpuModel, M68k, Unimplemented};
use pretty_assertions::assert_eq;

/// Decode and render, trimming the mnemonic padding when the instruction
/// has no operands.
fn disasm(model: CpuModel, bytes: &[u8], addr: u32) -> (usize, String) {
    let m68k = M68k::new(model);
    let ins = m68k
        .decode(bytes, addr)
        .unwrap_or_else(|u| panic!("decode failed with {u:?}"));
    let text = render(&m68k.format(&ins, addr));
    (ins.length, text.trim_end().to_string())
}

fn branches(model: CpuModel, bytes: &[u8], addr: u32) -> Vec<Branch> {
    let m68k = M68k::new(model);
    let ins = m68k.decode(bytes, addr).expect("decode failed");
    m68k.branch_info(&ins, addr)
}

#[test]
fn move_word_immediate() {
    let (len, text) = disasm(CpuModel::M68000, &[0x30, 0x3C, 0x12, 0x34], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "move.w    #$1234, d0");
}

#[test]
fn rts_is_a_function_return() {
    let (len, text) = disasm(CpuModel::M68000, &[0x4E, 0x75], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "rts");
    assert_eq!(
        branches(CpuModel::M68000, &[0x4E, 0x75], 0x1000),
        vec![Branch {
            kind: BranchKind::FunctionReturn,
            target: None,
        }]
    );
}

#[test]
fn bsr_with_16_bit_displacement() {
    let bytes = [0x61, 0x00, 0x00, 0x10];
    let (len, text) = disasm(CpuModel::M68000, &bytes, 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "bsr       ($00001012)");
    assert_eq!(
        branches(CpuModel::M68000, &bytes, 0x1000),
        vec![Branch {
            kind: BranchKind::Call,
            target: Some(0x1012),
        }]
    );
}

#[test]
fn beq_to_itself() {
    let bytes = [0x67, 0xFE];
    let (len, text) = disasm(CpuModel::M68000, &bytes, 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "beq       ($00001000)");
    assert_eq!(
        branches(CpuModel::M68000, &bytes, 0x1000),
        vec![
            Branch {
                kind: BranchKind::True,
                target: Some(0x1000),
            },
            Branch {
                kind: BranchKind::False,
                target: Some(0x1002),
            },
        ]
    );
}

#[test]
fn movem_store_to_predecrement() {
    let (len, text) = disasm(CpuModel::M68000, &[0x48, 0xE7, 0x80, 0x80], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "movem.l   d0/a0, -(sp)");
}

#[test]
fn movem_load_from_postincrement() {
    let (len, text) = disasm(CpuModel::M68000, &[0x4C, 0xDF, 0x01, 0x01], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "movem.l   (sp)+, d0/a0");
}

#[test]
fn nop_decodes_alone() {
    let (len, text) = disasm(CpuModel::M68000, &[0x4E, 0x71], 0x2000);
    assert_eq!(len, 2);
    assert_eq!(text, "nop");
}

#[test]
fn add_register_to_register() {
    let (len, text) = disasm(CpuModel::M68000, &[0xD0, 0x41], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "add.w     d1, d0");
}

#[test]
fn moveq_sign_extends() {
    let (len, text) = disasm(CpuModel::M68000, &[0x70, 0xFF], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "moveq.l   #$ffffffff, d0");
}

#[test]
fn move_to_address_register_promotes_to_movea() {
    let (len, text) = disasm(CpuModel::M68000, &[0x30, 0x41], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "movea.w   d1, a0");
}

#[test]
fn byte_move_to_address_register_is_rejected() {
    let m68k = M68k::new(CpuModel::M68000);
    assert_eq!(
        m68k.decode(&[0x14, 0x41], 0x1000),
        Err(Unimplemented { length: 2 })
    );
}

#[test]
fn lea_pc_relative() {
    let (len, text) = disasm(CpuModel::M68000, &[0x41, 0xFA, 0x00, 0x0A], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "lea       ($0000100c), a0");
}

#[test]
fn immediate_logic_on_status_flags() {
    let (len, text) = disasm(CpuModel::M68000, &[0x00, 0x3C, 0x00, 0x1F], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "ori.b     #$1f, ccr");

    let (len, text) = disasm(CpuModel::M68000, &[0x02, 0x7C, 0x27, 0x1F], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "andi.w    #$271f, sr");
}

#[test]
fn static_bit_test_widens_register_target() {
    let m68k = M68k::new(CpuModel::M68000);
    let ins = m68k.decode(&[0x08, 0x00, 0x00, 0x07], 0x1000).unwrap();
    assert_eq!(ins.length, 4);
    assert_eq!(ins.dest.as_ref().map(m68k_disasm::Operand::size), Some(4));
    let text = render(&m68k.format(&ins, 0x1000));
    assert_eq!(text.trim_end(), "btst      #$7, d0");
}

#[test]
fn dbf_branches_invert_against_bcc() {
    let bytes = [0x51, 0xC8, 0xFF, 0xFE];
    let (len, text) = disasm(CpuModel::M68000, &bytes, 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "dbf       d0, ($00001000)");
    assert_eq!(
        branches(CpuModel::M68000, &bytes, 0x1000),
        vec![
            Branch {
                kind: BranchKind::True,
                target: Some(0x1004),
            },
            Branch {
                kind: BranchKind::False,
                target: Some(0x1000),
            },
        ]
    );
}

#[test]
fn scc_is_byte_sized() {
    let (len, text) = disasm(CpuModel::M68000, &[0x57, 0xC0], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "seq.b     d0");
}

#[test]
fn jsr_absolute_long() {
    let bytes = [0x4E, 0xB9, 0x00, 0x00, 0x12, 0x34];
    let (len, text) = disasm(CpuModel::M68000, &bytes, 0x1000);
    assert_eq!(len, 6);
    assert_eq!(text, "jsr       ($1234).l");
    assert_eq!(
        branches(CpuModel::M68000, &bytes, 0x1000),
        vec![Branch {
            kind: BranchKind::Call,
            target: Some(0x1234),
        }]
    );
}

#[test]
fn jmp_through_register_is_unresolved() {
    let bytes = [0x4E, 0xD0];
    let (len, text) = disasm(CpuModel::M68000, &bytes, 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "jmp       (a0)");
    assert_eq!(
        branches(CpuModel::M68000, &bytes, 0x1000),
        vec![Branch {
            kind: BranchKind::Unresolved,
            target: None,
        }]
    );
}

#[test]
fn movec_needs_the_variant_control_register() {
    let bytes = [0x4E, 0x7A, 0x08, 0x01];
    let (len, text) = disasm(CpuModel::M68010, &bytes, 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "movec.l   vbr, d0");

    // The 68000 has no control registers at all.
    let m68k = M68k::new(CpuModel::M68000);
    assert_eq!(
        m68k.decode(&bytes, 0x1000),
        Err(Unimplemented { length: 4 })
    );
}

#[test]
fn bra_with_32_bit_displacement() {
    let bytes = [0x60, 0xFF, 0x00, 0x00, 0x10, 0x00];
    let (len, text) = disasm(CpuModel::M68020, &bytes, 0x1000);
    assert_eq!(len, 6);
    assert_eq!(text, "bra       ($00002002)");
    assert_eq!(
        branches(CpuModel::M68020, &bytes, 0x1000),
        vec![Branch {
            kind: BranchKind::Unconditional,
            target: Some(0x2002),
        }]
    );
}

#[test]
fn cmpi_and_addq() {
    let (len, text) = disasm(CpuModel::M68000, &[0x0C, 0x40, 0x00, 0x05], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "cmpi.w    #$5, d0");

    let (len, text) = disasm(CpuModel::M68000, &[0x52, 0x40], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "addq.w    #$1, d0");
}

#[test]
fn cas_reads_the_extension_registers() {
    let (len, text) = disasm(CpuModel::M68020, &[0x0A, 0xD0, 0x00, 0x81], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "cas.b     d1, d2, (a0)");
}

#[test]
fn pc_indexed_brief_extension() {
    let (len, text) = disasm(CpuModel::M68000, &[0x30, 0x3B, 0x20, 0x04], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "move.w    ($4,pc,d2.w), d0");
}

#[test]
fn full_extension_word_is_68020_only() {
    let bytes = [0x30, 0x30, 0x1D, 0x26, 0x00, 0x10, 0x00, 0x20];
    let (len, text) = disasm(CpuModel::M68020, &bytes, 0x1000);
    assert_eq!(len, 8);
    assert_eq!(text, "move.w    ([$10,a0],d1.l*4,$20), d0");

    let m68k = M68k::new(CpuModel::M68000);
    assert_eq!(m68k.decode(&bytes, 0x1000), Err(Unimplemented { length: 2 }));
}

#[test]
fn trap_link_and_unlk() {
    let (len, text) = disasm(CpuModel::M68000, &[0x4E, 0x42], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "trap      #$2");

    let (len, text) = disasm(CpuModel::M68000, &[0x4E, 0x56, 0xFF, 0xF8], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "link      a6, #$-8");

    let (len, text) = disasm(CpuModel::M68000, &[0x4E, 0x5E], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "unlk      a6");
}

#[test]
fn misc_single_operand_forms() {
    let (_, text) = disasm(CpuModel::M68000, &[0x4A, 0x40], 0x1000);
    assert_eq!(text, "tst.w     d0");

    let (_, text) = disasm(CpuModel::M68000, &[0x42, 0x67], 0x1000);
    assert_eq!(text, "clr.w     -(sp)");

    let (_, text) = disasm(CpuModel::M68000, &[0xE5, 0x41], 0x1000);
    assert_eq!(text, "asl.w     #$2, d1");

    let (_, text) = disasm(CpuModel::M68000, &[0x48, 0x40], 0x1000);
    assert_eq!(text, "swap      d0");

    let (_, text) = disasm(CpuModel::M68000, &[0x48, 0x80], 0x1000);
    assert_eq!(text, "ext.w     d0");
}

#[test]
fn short_input_reports_its_own_length() {
    let m68k = M68k::new(CpuModel::M68000);
    assert_eq!(m68k.decode(&[], 0), Err(Unimplemented { length: 0 }));
    assert_eq!(m68k.decode(&[0x4E], 0), Err(Unimplemented { length: 1 }));
}

#[test]
fn line_a_is_unassigned() {
    let m68k = M68k::new(CpuModel::M68040);
    assert_eq!(m68k.decode(&[0xA0, 0x00], 0), Err(Unimplemented { length: 2 }));
}

#[test]
fn fbcc_conditional_branch() {
    let bytes = [0xF2, 0x81, 0x00, 0x10];
    let (len, text) = disasm(CpuModel::M68040, &bytes, 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "fbeq      ($00001012)");
    assert_eq!(
        branches(CpuModel::M68040, &bytes, 0x1000),
        vec![
            Branch {
                kind: BranchKind::True,
                target: Some(0x1012),
            },
            Branch {
                kind: BranchKind::False,
                target: Some(0x1004),
            },
        ]
    );
}

#[test]
fn fp_moves_and_arithmetic() {
    let (len, text) = disasm(CpuModel::M68040, &[0xF2, 0x10, 0x65, 0x80], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "fmove.s   fp3, (a0)");

    let (len, text) = disasm(CpuModel::M68040, &[0xF2, 0x00, 0x05, 0x22], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "fadd.x    fp1, fp2");

    let (len, text) = disasm(CpuModel::M68040, &[0xF2, 0x27, 0xF0, 0xC0], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "fmovem.x  fp0-fp1, -(sp)");

    let (len, text) = disasm(CpuModel::M68040, &[0xF2, 0x00, 0x90, 0x00], 0x1000);
    assert_eq!(len, 4);
    assert_eq!(text, "fmove.l   d0, fpcr");
}

#[test]
fn fsave_and_cache_control() {
    let (len, text) = disasm(CpuModel::M68040, &[0xF3, 0x10], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "fsave     (a0)");

    let (len, text) = disasm(CpuModel::M68040, &[0xF4, 0x08], 0x1000);
    assert_eq!(len, 2);
    assert_eq!(text, "cinv");
}
