#![forbid(unsafe_code)]

//! The canonical script: raw bytes plus instruction decoding and building.
//!
//! Every textual format converts to and from [`Script`]. Any byte string is
//! a valid `Script`; malformed pushes only surface when decoding
//! instructions.

use std::fmt;

use crate::opcodes::{
    self, OP_0, OP_1, OP_1NEGATE, OP_CHECKMULTISIG, OP_CHECKMULTISIGVERIFY, OP_CHECKSIG,
    OP_CHECKSIGVERIFY, OP_EQUAL, OP_EQUALVERIFY, OP_NUMEQUAL, OP_NUMEQUALVERIFY, OP_PUSHDATA1,
    OP_PUSHDATA2, OP_PUSHDATA4, OP_VERIFY,
};

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// A script in canonical (serialized) form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Script {
    bytes: Vec<u8>,
}

impl Script {
    /// Wrap raw bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the script, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the script has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode a hex string. See [`crate::hex::decode`].
    pub fn from_hex(text: &str) -> Result<Self, crate::hex::HexError> {
        crate::hex::decode(text).map(Self::new)
    }

    /// Lower-case hex serialization.
    #[must_use]
    pub fn to_hex(&self) -> String {
        crate::hex::encode(&self.bytes)
    }

    /// Canonical assembly. See [`crate::asm::disassemble`].
    #[must_use]
    pub fn to_asm(&self) -> String {
        crate::asm::disassemble(self)
    }

    /// Iterate over decoded instructions.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            bytes: &self.bytes,
            pos: 0,
            done: false,
        }
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_asm())
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// A data push. `opcode` is the push opcode actually used
    /// (`0x00..=0x4b` or one of the PUSHDATA opcodes).
    Push { opcode: u8, data: &'a [u8] },
    /// Any non-push opcode.
    Op(u8),
}

/// A push whose length prefix or payload runs past the end of the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedPush {
    /// Byte offset of the push opcode.
    pub offset: usize,
}

impl fmt::Display for TruncatedPush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "truncated push at byte {}", self.offset)
    }
}

impl std::error::Error for TruncatedPush {}

/// Iterator over a script's instructions.
///
/// Stops after yielding the first [`TruncatedPush`].
pub struct Instructions<'a> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Instructions<'a> {
    /// Byte offset of the next instruction.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn slice_at(&self, start: usize, len: usize) -> Option<&'a [u8]> {
        let end = start.checked_add(len)?;
        self.bytes.get(start..end)
    }

    fn read_len(&self, start: usize, width: usize) -> Option<usize> {
        let raw = self.slice_at(start, width)?;
        let mut value = 0usize;
        for (i, &b) in raw.iter().enumerate() {
            value |= (b as usize) << (8 * i);
        }
        Some(value)
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, TruncatedPush>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.bytes.len() {
            return None;
        }

        let offset = self.pos;
        let opcode = self.bytes[offset];
        let header = match opcode {
            OP_PUSHDATA1 => 1,
            OP_PUSHDATA2 => 2,
            OP_PUSHDATA4 => 4,
            _ => 0,
        };

        let decoded = if opcode == OP_0 {
            Some((Instruction::Push { opcode, data: &[] }, 1))
        } else if opcodes::is_direct_push(opcode) {
            let len = opcode as usize;
            self.slice_at(offset + 1, len)
                .map(|data| (Instruction::Push { opcode, data }, 1 + len))
        } else if header > 0 {
            self.read_len(offset + 1, header).and_then(|len| {
                self.slice_at(offset + 1 + header, len)
                    .map(|data| (Instruction::Push { opcode, data }, 1 + header + len))
            })
        } else {
            Some((Instruction::Op(opcode), 1))
        };

        match decoded {
            Some((instruction, consumed)) => {
                self.pos += consumed;
                Some(Ok(instruction))
            }
            None => {
                self.done = true;
                Some(Err(TruncatedPush { offset }))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Script numbers
// ---------------------------------------------------------------------------

/// Minimal little-endian sign-magnitude encoding of a script number.
#[must_use]
pub fn encode_num(value: i64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    // The top bit of the last byte is the sign; add a byte if it is taken.
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// A PUSHDATA payload that does not fit its length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushTooLarge {
    pub opcode: u8,
    pub len: usize,
}

impl fmt::Display for PushTooLarge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cannot push {} bytes",
            opcodes::display_name(self.opcode),
            self.len
        )
    }
}

impl std::error::Error for PushTooLarge {}

/// Incremental script construction.
#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    bytes: Vec<u8>,
    last_opcode: Option<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a non-push opcode.
    pub fn push_opcode(&mut self, opcode: u8) -> &mut Self {
        self.bytes.push(opcode);
        self.last_opcode = Some(opcode);
        self
    }

    /// Append a minimal push of `data`.
    pub fn push_slice(&mut self, data: &[u8]) -> &mut Self {
        let opcode = match data.len() {
            0 => OP_0,
            n if n <= opcodes::OP_PUSHBYTES_75 as usize => n as u8,
            n if n <= 0xff => OP_PUSHDATA1,
            n if n <= 0xffff => OP_PUSHDATA2,
            _ => OP_PUSHDATA4,
        };
        self.write_push(opcode, data);
        self
    }

    /// Append a push using an explicit PUSHDATA opcode.
    pub fn push_pushdata(&mut self, opcode: u8, data: &[u8]) -> Result<&mut Self, PushTooLarge> {
        let max = match opcode {
            OP_PUSHDATA1 => 0xff,
            OP_PUSHDATA2 => 0xffff,
            _ => u32::MAX as usize,
        };
        if !opcodes::is_pushdata(opcode) || data.len() > max {
            return Err(PushTooLarge {
                opcode,
                len: data.len(),
            });
        }
        self.write_push(opcode, data);
        Ok(self)
    }

    /// Append a script number, using the small-integer opcodes when possible.
    pub fn push_int(&mut self, value: i64) -> &mut Self {
        match value {
            0 => self.push_slice(&[]),
            -1 => self.push_opcode(OP_1NEGATE),
            1..=16 => self.push_opcode(OP_1 + (value as u8 - 1)),
            _ => self.push_slice(&encode_num(value)),
        }
    }

    /// Append bytes verbatim.
    pub fn push_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self.last_opcode = None;
        self
    }

    /// Append `OP_VERIFY`, fusing it with a preceding comparison or
    /// signature check that has a `VERIFY` form.
    pub fn push_verify(&mut self) -> &mut Self {
        let fused = match self.last_opcode {
            Some(OP_EQUAL) => Some(OP_EQUALVERIFY),
            Some(OP_NUMEQUAL) => Some(OP_NUMEQUALVERIFY),
            Some(OP_CHECKSIG) => Some(OP_CHECKSIGVERIFY),
            Some(OP_CHECKMULTISIG) => Some(OP_CHECKMULTISIGVERIFY),
            _ => None,
        };
        match fused {
            Some(opcode) => {
                self.bytes.pop();
                self.push_opcode(opcode)
            }
            None => self.push_opcode(OP_VERIFY),
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Finish building.
    #[must_use]
    pub fn into_script(self) -> Script {
        Script::new(self.bytes)
    }

    fn write_push(&mut self, opcode: u8, data: &[u8]) {
        self.bytes.push(opcode);
        let len = data.len();
        match opcode {
            OP_PUSHDATA1 => self.bytes.push(len as u8),
            OP_PUSHDATA2 => self.bytes.extend_from_slice(&(len as u16).to_le_bytes()),
            OP_PUSHDATA4 => self.bytes.extend_from_slice(&(len as u32).to_le_bytes()),
            _ => {}
        }
        self.bytes.extend_from_slice(data);
        self.last_opcode = None;
    }
}
