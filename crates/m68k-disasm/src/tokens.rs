//! Disassembly text tokens.
//!
//! `format` renders an instruction as a token stream rather than a flat
//! string so drivers can colorize registers, link possible addresses, and
//! split operands without re-parsing.

use core::fmt;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Mnemonic with size suffix, padded.
    Instruction,
    /// Register name.
    Register,
    /// Numeric literal.
    Integer,
    /// Numeric literal that may be a code or data address.
    PossibleAddress,
    /// `,`, `:`, `-`, `/`, `*` between operand parts.
    OperandSeparator,
    /// `(` or `[` opening a memory operand.
    BeginMemoryOperand,
    /// `)`, `]`, `).w`, `).l` closing a memory operand.
    EndMemoryOperand,
    /// Glue text: `#`, `+`, `.l`, ...
    Text,
}

/// One piece of rendered disassembly text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Numeric payload for integer and address tokens.
    pub value: Option<u64>,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(kind: TokenKind, text: impl Into<String>, value: u64) -> Self {
        Self {
            kind,
            text: text.into(),
            value: Some(value),
        }
    }

    #[must_use]
    pub fn register(name: impl Into<String>) -> Self {
        Self::new(TokenKind::Register, name)
    }

    #[must_use]
    pub fn integer(text: impl Into<String>, value: u64) -> Self {
        Self::with_value(TokenKind::Integer, text, value)
    }

    #[must_use]
    pub fn possible_address(text: impl Into<String>, value: u64) -> Self {
        Self::with_value(TokenKind::PossibleAddress, text, value)
    }

    #[must_use]
    pub fn separator(text: impl Into<String>) -> Self {
        Self::new(TokenKind::OperandSeparator, text)
    }

    #[must_use]
    pub fn begin_memory(text: impl Into<String>) -> Self {
        Self::new(TokenKind::BeginMemoryOperand, text)
    }

    #[must_use]
    pub fn end_memory(text: impl Into<String>) -> Self {
        Self::new(TokenKind::EndMemoryOperand, text)
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Text, text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Join a token stream back into plain text (tests and simple drivers).
#[must_use]
pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}
