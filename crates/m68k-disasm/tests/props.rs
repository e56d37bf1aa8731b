//! Universal decoder properties over arbitrary byte streams.

use std::collections::HashSet;

use m68k_disasm::tokens::TokenKind;
use m68k_disasm::{Condition, CpuModel, M68k, Mnemonic, Operand, SizeSpec};
use proptest::prelude::*;

const MODELS: [CpuModel; 4] = [
    CpuModel::M68000,
    CpuModel::M68010,
    CpuModel::M68020,
    CpuModel::M68040,
];

/// Every register name that may legally appear in formatted output.
fn register_catalogue() -> HashSet<&'static str> {
    let mut names: HashSet<&'static str> = [
        "d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7", //
        "a0", "a1", "a2", "a3", "a4", "a5", "a6", "sp", //
        "sr", "ccr", "usp", "pc", //
        "fp0", "fp1", "fp2", "fp3", "fp4", "fp5", "fp6", "fp7", //
        "fpcr", "fpsr", "fpiar",
    ]
    .into_iter()
    .collect();
    for model in MODELS {
        for (_, reg) in model.config().control_registers {
            names.insert(reg.name());
        }
    }
    names
}

proptest! {
    /// Decoded lengths are bounded and even, and re-decoding exactly the
    /// consumed prefix yields the same instruction.
    #[test]
    fn decode_prefix_property(
        bytes in proptest::collection::vec(any::<u8>(), 0..26),
        model_index in 0usize..MODELS.len(),
    ) {
        let m68k = M68k::new(MODELS[model_index]);
        if let Ok(ins) = m68k.decode(&bytes, 0x1000) {
            prop_assert!(ins.length >= 2);
            prop_assert!(ins.length <= 22);
            prop_assert_eq!(ins.length % 2, 0);
            if ins.length <= bytes.len() {
                let again = m68k.decode(&bytes[..ins.length], 0x1000);
                prop_assert_eq!(again, Ok(ins));
            }
        }
    }

    /// Formatted output uses only catalogue register names, and the
    /// mnemonic suffix agrees with the decoded size.
    #[test]
    fn format_emits_legal_tokens(
        bytes in proptest::collection::vec(any::<u8>(), 2..26),
        model_index in 0usize..MODELS.len(),
    ) {
        let m68k = M68k::new(MODELS[model_index]);
        if let Ok(ins) = m68k.decode(&bytes, 0x1000) {
            let catalogue = register_catalogue();
            let tokens = m68k.format(&ins, 0x1000);

            prop_assert_eq!(tokens[0].kind, TokenKind::Instruction);
            if let Some(size) = ins.size {
                prop_assert!(
                    tokens[0].text.trim_end().ends_with(size.suffix()),
                    "suffix mismatch: {:?} for {:?}",
                    tokens[0].text,
                    size
                );
            }
            for token in &tokens {
                if token.kind == TokenKind::Register {
                    prop_assert!(
                        catalogue.contains(token.text.as_str()),
                        "unknown register {:?}",
                        token.text
                    );
                }
            }
        }
    }

    /// Opcode `0x5?C8` is always DBcc with the condition taken from bits
    /// 11-8.
    #[test]
    fn dbcc_condition_encoding(cc in 0u8..16, reg in 0u8..8, disp in any::<i16>()) {
        let op = 0x50C8 | (u16::from(cc) << 8) | u16::from(reg);
        let mut bytes = op.to_be_bytes().to_vec();
        bytes.extend_from_slice(&disp.to_be_bytes());
        let ins = M68k::new(CpuModel::M68000).decode(&bytes, 0x1000).unwrap();
        prop_assert_eq!(ins.mnemonic, Mnemonic::Dbcc(Condition::from_bits(cc)));
        prop_assert_eq!(ins.length, 4);
    }

    /// A zero 8-bit displacement selects a 16-bit displacement word; 0xFF
    /// selects a 32-bit displacement.
    #[test]
    fn bcc_displacement_widths(cc in 2u8..16, d16 in any::<i16>(), d32 in any::<u32>()) {
        let m68k = M68k::new(CpuModel::M68020);

        let mut bytes = vec![0x60 | cc, 0x00];
        bytes.extend_from_slice(&d16.to_be_bytes());
        let ins = m68k.decode(&bytes, 0x1000).unwrap();
        prop_assert_eq!(ins.length, 4);

        let mut bytes = vec![0x60 | cc, 0xFF];
        bytes.extend_from_slice(&d32.to_be_bytes());
        let ins = m68k.decode(&bytes, 0x1000).unwrap();
        prop_assert_eq!(ins.length, 6);
        prop_assert_eq!(ins.mnemonic, Mnemonic::Bcc(Condition::from_bits(cc)));
    }

    /// Byte-sized moves to address registers are rejected on every model.
    #[test]
    fn byte_address_register_writes_are_rejected(
        src in 0u8..8,
        dst in 0u8..8,
        model_index in 0usize..MODELS.len(),
    ) {
        // move.b Dsrc,Adst
        let op = 0x1040 | (u16::from(dst) << 9) | u16::from(src);
        let result = M68k::new(MODELS[model_index]).decode(&op.to_be_bytes(), 0x1000);
        prop_assert!(result.is_err());
    }

    /// MOVEQ sign-extends its 8-bit immediate to 32 bits.
    #[test]
    fn moveq_immediate_sign_extension(value in any::<u8>(), reg in 0u8..8) {
        let bytes = [0x70 | (reg << 1), value];
        let ins = M68k::new(CpuModel::M68000).decode(&bytes, 0x1000).unwrap();
        prop_assert_eq!(ins.mnemonic, Mnemonic::Moveq);
        let expected = u64::from(value as i8 as i32 as u32);
        match ins.source {
            Some(Operand::Immediate { value: v, .. }) => {
                prop_assert_eq!(v as u64, expected);
            }
            other => prop_assert!(false, "unexpected source {:?}", other),
        }
    }

    /// PC-relative displacements resolve against the word after the
    /// opcode.
    #[test]
    fn pc_relative_addresses_resolve_past_the_opcode(disp in any::<i16>(), addr in any::<u32>()) {
        // lea (d16,pc),a0
        let mut bytes = vec![0x41, 0xFA];
        bytes.extend_from_slice(&disp.to_be_bytes());
        let m68k = M68k::new(CpuModel::M68000);
        let ins = m68k.decode(&bytes, addr).unwrap();
        let expected = addr.wrapping_add(2).wrapping_add(disp as u32);
        let rendered = m68k.format(&ins, addr);
        let address_token = rendered
            .iter()
            .find(|t| t.kind == TokenKind::PossibleAddress)
            .expect("pc-relative operand renders an address");
        prop_assert_eq!(address_token.value, Some(u64::from(expected)));
    }

    /// Integer size suffixes match the instruction's decoded size class.
    #[test]
    fn size_suffix_matches_decoded_width(
        bytes in proptest::collection::vec(any::<u8>(), 2..10),
    ) {
        let m68k = M68k::new(CpuModel::M68000);
        if let Ok(ins) = m68k.decode(&bytes, 0x1000) {
            if let Some(SizeSpec::Int(size)) = ins.size {
                let tokens = m68k.format(&ins, 0x1000);
                prop_assert!(tokens[0].text.trim_end().ends_with(size.suffix()));
            }
        }
    }
}
