#![forbid(unsafe_code)]

//! Opcode table: byte values, canonical names and input aliases.
//!
//! Canonical names carry the `OP_` prefix. Lookup by name is
//! case-insensitive and the prefix is optional, so `dup`, `DUP` and
//! `OP_DUP` all resolve to `0x76`.

// ---------------------------------------------------------------------------
// Byte constants
// ---------------------------------------------------------------------------

pub const OP_0: u8 = 0x00;
/// Largest direct push opcode (pushes 75 bytes).
pub const OP_PUSHBYTES_75: u8 = 0x4b;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_IF: u8 = 0x63;
pub const OP_NOTIF: u8 = 0x64;
pub const OP_VERIF: u8 = 0x65;
pub const OP_VERNOTIF: u8 = 0x66;
pub const OP_ELSE: u8 = 0x67;
pub const OP_ENDIF: u8 = 0x68;
pub const OP_VERIFY: u8 = 0x69;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_NIP: u8 = 0x77;
pub const OP_CAT: u8 = 0x7e;
pub const OP_SIZE: u8 = 0x82;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_NEGATE: u8 = 0x8f;
pub const OP_ABS: u8 = 0x90;
pub const OP_NOT: u8 = 0x91;
pub const OP_ADD: u8 = 0x93;
pub const OP_SUB: u8 = 0x94;
pub const OP_MUL: u8 = 0x95;
pub const OP_DIV: u8 = 0x96;
pub const OP_MOD: u8 = 0x97;
pub const OP_BOOLAND: u8 = 0x9a;
pub const OP_BOOLOR: u8 = 0x9b;
pub const OP_NUMEQUAL: u8 = 0x9c;
pub const OP_NUMEQUALVERIFY: u8 = 0x9d;
pub const OP_LESSTHAN: u8 = 0x9f;
pub const OP_GREATERTHAN: u8 = 0xa0;
pub const OP_LESSTHANOREQUAL: u8 = 0xa1;
pub const OP_GREATERTHANOREQUAL: u8 = 0xa2;
pub const OP_MIN: u8 = 0xa3;
pub const OP_MAX: u8 = 0xa4;
pub const OP_WITHIN: u8 = 0xa5;
pub const OP_RIPEMD160: u8 = 0xa6;
pub const OP_SHA1: u8 = 0xa7;
pub const OP_SHA256: u8 = 0xa8;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_HASH256: u8 = 0xaa;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;
pub const OP_CHECKLOCKTIMEVERIFY: u8 = 0xb1;
pub const OP_CHECKSEQUENCEVERIFY: u8 = 0xb2;
pub const OP_INVALIDOPCODE: u8 = 0xff;

/// Prefix used to spell bytes that have no assigned opcode.
pub const UNKNOWN_PREFIX: &str = "OP_UNKNOWN_0x";

// ---------------------------------------------------------------------------
// Name table
// ---------------------------------------------------------------------------

const NAMES: &[(u8, &str)] = &[
    (0x00, "OP_0"),
    (0x4c, "OP_PUSHDATA1"),
    (0x4d, "OP_PUSHDATA2"),
    (0x4e, "OP_PUSHDATA4"),
    (0x4f, "OP_1NEGATE"),
    (0x50, "OP_RESERVED"),
    (0x51, "OP_1"),
    (0x52, "OP_2"),
    (0x53, "OP_3"),
    (0x54, "OP_4"),
    (0x55, "OP_5"),
    (0x56, "OP_6"),
    (0x57, "OP_7"),
    (0x58, "OP_8"),
    (0x59, "OP_9"),
    (0x5a, "OP_10"),
    (0x5b, "OP_11"),
    (0x5c, "OP_12"),
    (0x5d, "OP_13"),
    (0x5e, "OP_14"),
    (0x5f, "OP_15"),
    (0x60, "OP_16"),
    (0x61, "OP_NOP"),
    (0x62, "OP_VER"),
    (0x63, "OP_IF"),
    (0x64, "OP_NOTIF"),
    (0x65, "OP_VERIF"),
    (0x66, "OP_VERNOTIF"),
    (0x67, "OP_ELSE"),
    (0x68, "OP_ENDIF"),
    (0x69, "OP_VERIFY"),
    (0x6a, "OP_RETURN"),
    (0x6b, "OP_TOALTSTACK"),
    (0x6c, "OP_FROMALTSTACK"),
    (0x6d, "OP_2DROP"),
    (0x6e, "OP_2DUP"),
    (0x6f, "OP_3DUP"),
    (0x70, "OP_2OVER"),
    (0x71, "OP_2ROT"),
    (0x72, "OP_2SWAP"),
    (0x73, "OP_IFDUP"),
    (0x74, "OP_DEPTH"),
    (0x75, "OP_DROP"),
    (0x76, "OP_DUP"),
    (0x77, "OP_NIP"),
    (0x78, "OP_OVER"),
    (0x79, "OP_PICK"),
    (0x7a, "OP_ROLL"),
    (0x7b, "OP_ROT"),
    (0x7c, "OP_SWAP"),
    (0x7d, "OP_TUCK"),
    (0x7e, "OP_CAT"),
    (0x7f, "OP_SUBSTR"),
    (0x80, "OP_LEFT"),
    (0x81, "OP_RIGHT"),
    (0x82, "OP_SIZE"),
    (0x83, "OP_INVERT"),
    (0x84, "OP_AND"),
    (0x85, "OP_OR"),
    (0x86, "OP_XOR"),
    (0x87, "OP_EQUAL"),
    (0x88, "OP_EQUALVERIFY"),
    (0x89, "OP_RESERVED1"),
    (0x8a, "OP_RESERVED2"),
    (0x8b, "OP_1ADD"),
    (0x8c, "OP_1SUB"),
    (0x8d, "OP_2MUL"),
    (0x8e, "OP_2DIV"),
    (0x8f, "OP_NEGATE"),
    (0x90, "OP_ABS"),
    (0x91, "OP_NOT"),
    (0x92, "OP_0NOTEQUAL"),
    (0x93, "OP_ADD"),
    (0x94, "OP_SUB"),
    (0x95, "OP_MUL"),
    (0x96, "OP_DIV"),
    (0x97, "OP_MOD"),
    (0x98, "OP_LSHIFT"),
    (0x99, "OP_RSHIFT"),
    (0x9a, "OP_BOOLAND"),
    (0x9b, "OP_BOOLOR"),
    (0x9c, "OP_NUMEQUAL"),
    (0x9d, "OP_NUMEQUALVERIFY"),
    (0x9e, "OP_NUMNOTEQUAL"),
    (0x9f, "OP_LESSTHAN"),
    (0xa0, "OP_GREATERTHAN"),
    (0xa1, "OP_LESSTHANOREQUAL"),
    (0xa2, "OP_GREATERTHANOREQUAL"),
    (0xa3, "OP_MIN"),
    (0xa4, "OP_MAX"),
    (0xa5, "OP_WITHIN"),
    (0xa6, "OP_RIPEMD160"),
    (0xa7, "OP_SHA1"),
    (0xa8, "OP_SHA256"),
    (0xa9, "OP_HASH160"),
    (0xaa, "OP_HASH256"),
    (0xab, "OP_CODESEPARATOR"),
    (0xac, "OP_CHECKSIG"),
    (0xad, "OP_CHECKSIGVERIFY"),
    (0xae, "OP_CHECKMULTISIG"),
    (0xaf, "OP_CHECKMULTISIGVERIFY"),
    (0xb0, "OP_NOP1"),
    (0xb1, "OP_CHECKLOCKTIMEVERIFY"),
    (0xb2, "OP_CHECKSEQUENCEVERIFY"),
    (0xb3, "OP_NOP4"),
    (0xb4, "OP_NOP5"),
    (0xb5, "OP_NOP6"),
    (0xb6, "OP_NOP7"),
    (0xb7, "OP_NOP8"),
    (0xb8, "OP_NOP9"),
    (0xb9, "OP_NOP10"),
    (0xff, "OP_INVALIDOPCODE"),
];

const ALIASES: &[(&str, u8)] = &[
    ("OP_FALSE", OP_0),
    ("OP_TRUE", OP_1),
    ("OP_NOP2", OP_CHECKLOCKTIMEVERIFY),
    ("OP_NOP3", OP_CHECKSEQUENCEVERIFY),
];

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Returns true for the direct push opcodes `0x01..=0x4b`.
#[inline]
pub fn is_direct_push(byte: u8) -> bool {
    (0x01..=OP_PUSHBYTES_75).contains(&byte)
}

/// Returns true for `OP_PUSHDATA1`, `OP_PUSHDATA2` and `OP_PUSHDATA4`.
#[inline]
pub fn is_pushdata(byte: u8) -> bool {
    matches!(byte, OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4)
}

/// Canonical name of an assigned opcode.
///
/// Direct pushes and unassigned bytes have no name.
#[must_use]
pub fn name_of(byte: u8) -> Option<&'static str> {
    NAMES
        .binary_search_by_key(&byte, |&(b, _)| b)
        .ok()
        .map(|i| NAMES[i].1)
}

/// Spelling used by the disassembler for any non-push byte.
#[must_use]
pub fn display_name(byte: u8) -> String {
    match name_of(byte) {
        Some(name) => name.to_string(),
        None => format!("{UNKNOWN_PREFIX}{byte:02x}"),
    }
}

/// Resolve an opcode name (or alias, or `OP_UNKNOWN_0xNN`) to its byte.
///
/// The `OP_` prefix is optional and matching ignores ASCII case.
#[must_use]
pub fn from_name(name: &str) -> Option<u8> {
    let upper = name.to_ascii_uppercase();
    let full = if upper.starts_with("OP_") {
        upper
    } else {
        format!("OP_{upper}")
    };

    if let Some(&(byte, _)) = NAMES.iter().find(|(_, n)| *n == full) {
        return Some(byte);
    }
    if let Some(&(_, byte)) = ALIASES.iter().find(|(n, _)| *n == full) {
        return Some(byte);
    }

    // Unassigned bytes round-trip through their generated spelling.
    let digits = full.strip_prefix("OP_UNKNOWN_0X")?;
    if digits.len() != 2 {
        return None;
    }
    let byte = u8::from_str_radix(digits, 16).ok()?;
    if name_of(byte).is_none() && !is_direct_push(byte) {
        Some(byte)
    } else {
        None
    }
}

/// Coarse opcode classes used for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeClass {
    /// `OP_IF`, `OP_NOTIF`, `OP_ELSE`, `OP_ENDIF`, `OP_VERIF`, `OP_VERNOTIF`.
    FlowControl,
    /// `OP_BOOLAND`, `OP_BOOLOR`, `OP_NOT`.
    Boolean,
    /// Everything else.
    Other,
}

/// Classify an opcode byte.
#[must_use]
pub fn class_of(byte: u8) -> OpcodeClass {
    match byte {
        OP_IF | OP_NOTIF | OP_ELSE | OP_ENDIF | OP_VERIF | OP_VERNOTIF => OpcodeClass::FlowControl,
        OP_BOOLAND | OP_BOOLOR | OP_NOT => OpcodeClass::Boolean,
        _ => OpcodeClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_table_is_sorted() {
        assert!(NAMES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn names_resolve_both_ways() {
        for &(byte, name) in NAMES {
            assert_eq!(from_name(name), Some(byte), "{name}");
            assert_eq!(name_of(byte), Some(name));
        }
    }

    #[test]
    fn prefix_and_case_are_optional() {
        assert_eq!(from_name("dup"), Some(0x76));
        assert_eq!(from_name("Op_Dup"), Some(0x76));
        assert_eq!(from_name("CHECKSIG"), Some(OP_CHECKSIG));
    }

    #[test]
    fn aliases() {
        assert_eq!(from_name("OP_TRUE"), Some(OP_1));
        assert_eq!(from_name("false"), Some(OP_0));
        assert_eq!(from_name("NOP2"), Some(OP_CHECKLOCKTIMEVERIFY));
    }

    #[test]
    fn unknown_bytes_round_trip() {
        assert_eq!(display_name(0xba), "OP_UNKNOWN_0xba");
        assert_eq!(from_name("OP_UNKNOWN_0xba"), Some(0xba));
        // Assigned bytes must use their real name.
        assert_eq!(from_name("OP_UNKNOWN_0x76"), None);
        // Direct pushes are not opcodes.
        assert_eq!(from_name("OP_UNKNOWN_0x05"), None);
    }

    #[test]
    fn direct_pushes_have_no_name() {
        assert!(is_direct_push(0x01));
        assert!(is_direct_push(0x4b));
        assert!(!is_direct_push(0x00));
        assert!(name_of(0x20).is_none());
    }

    #[test]
    fn classes() {
        assert_eq!(class_of(OP_IF), OpcodeClass::FlowControl);
        assert_eq!(class_of(OP_ENDIF), OpcodeClass::FlowControl);
        assert_eq!(class_of(OP_BOOLOR), OpcodeClass::Boolean);
        assert_eq!(class_of(OP_NOT), OpcodeClass::Boolean);
        assert_eq!(class_of(OP_CHECKSIG), OpcodeClass::Other);
    }

    #[test]
    fn unknown_name() {
        assert_eq!(from_name("PUSH"), None);
        assert_eq!(from_name(""), None);
    }
}
