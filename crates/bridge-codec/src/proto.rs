//! Hand-framed protobuf encoding
//!
//! Only what the forwarding messages need: varint fields (wire type 0) and
//! length-delimited fields (wire type 2). Each field is
//! `tag = (field_number << 3) | wire_type` followed by its value:
//! ```text
//! varint:           <tag> <base-128 value>
//! length-delimited: <tag> <base-128 length> <bytes>
//! ```

use crate::error::CodecError;

pub const WIRE_VARINT: u8 = 0;
pub const WIRE_FIXED64: u8 = 1;
pub const WIRE_LEN: u8 = 2;
pub const WIRE_FIXED32: u8 = 5;

/// Encode a u64 value as unsigned base-128 and append to the buffer.
pub fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        if (value & !0x7F) == 0 {
            buf.push(value as u8);
            break;
        } else {
            buf.push(((value & 0x7F) | 0x80) as u8);
            value >>= 7;
        }
    }
}

/// Decode a base-128 value starting at `pos`; returns the value and the
/// position just past it.
pub fn read_varint(bytes: &[u8], pos: usize) -> Result<(u64, usize), CodecError> {
    let mut result: u64 = 0;
    let mut shift = 0;
    let mut i = pos;
    loop {
        let byte = *bytes.get(i).ok_or(CodecError::Truncated {
            what: "varint",
            needed: i + 1 - pos,
            available: bytes.len().saturating_sub(pos),
        })?;
        if shift == 63 && byte > 1 {
            return Err(CodecError::malformed("varint", "value exceeds 64 bits"));
        }
        result |= u64::from(byte & 0x7F) << shift;
        i += 1;
        if byte & 0x80 == 0 {
            return Ok((result, i));
        }
        shift += 7;
        if shift > 63 {
            return Err(CodecError::malformed("varint", "more than 10 bytes"));
        }
    }
}

fn put_tag(buf: &mut Vec<u8>, field: u32, wire_type: u8) {
    put_varint(buf, (u64::from(field) << 3) | u64::from(wire_type));
}

/// Builder for a flat protobuf message.
///
/// Scalar fields holding their default value (empty string, zero) are omitted,
/// matching proto3 marshalling. Embedded messages are always written.
#[derive(Debug, Default)]
pub struct ProtoWriter {
    buf: Vec<u8>,
}

impl ProtoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(mut self, field: u32, value: &str) -> Self {
        if !value.is_empty() {
            self.put_len_delimited(field, value.as_bytes());
        }
        self
    }

    pub fn bytes(mut self, field: u32, value: &[u8]) -> Self {
        if !value.is_empty() {
            self.put_len_delimited(field, value);
        }
        self
    }

    /// Optional bytes field: omitted entirely when `None`.
    pub fn optional_bytes(self, field: u32, value: Option<&[u8]>) -> Self {
        match value {
            Some(v) => self.bytes(field, v),
            None => self,
        }
    }

    /// Embedded message, written even when its encoding is empty.
    pub fn message(mut self, field: u32, encoded: &[u8]) -> Self {
        self.put_len_delimited(field, encoded);
        self
    }

    pub fn uint(mut self, field: u32, value: u64) -> Self {
        if value != 0 {
            put_tag(&mut self.buf, field, WIRE_VARINT);
            put_varint(&mut self.buf, value);
        }
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn put_len_delimited(&mut self, field: u32, value: &[u8]) {
        put_tag(&mut self.buf, field, WIRE_LEN);
        put_varint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(value);
    }
}

/// A decoded field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Bytes(&'a [u8]),
    /// Fixed-width values are not used by these messages and are only skipped
    Fixed,
}

impl<'a> FieldValue<'a> {
    pub fn as_bytes(&self, field: u32) -> Result<&'a [u8], CodecError> {
        match self {
            Self::Bytes(b) => Ok(b),
            Self::Varint(_) => Err(CodecError::UnexpectedWireType {
                field,
                wire_type: WIRE_VARINT,
            }),
            Self::Fixed => Err(CodecError::UnexpectedWireType {
                field,
                wire_type: WIRE_FIXED64,
            }),
        }
    }

    pub fn as_string(&self, field: u32) -> Result<String, CodecError> {
        let bytes = self.as_bytes(field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 { field })
    }

    pub fn as_u64(&self, field: u32) -> Result<u64, CodecError> {
        match self {
            Self::Varint(v) => Ok(*v),
            _ => Err(CodecError::UnexpectedWireType {
                field,
                wire_type: WIRE_LEN,
            }),
        }
    }
}

/// Iterator over the `(field_number, value)` pairs of an encoded message
#[derive(Debug, Clone)]
pub struct ProtoReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ProtoReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_field(&mut self) -> Result<(u32, FieldValue<'a>), CodecError> {
        let (tag, next) = read_varint(self.bytes, self.pos)?;
        let field = u32::try_from(tag >> 3)
            .map_err(|_| CodecError::malformed("protobuf tag", "field number too large"))?;
        if field == 0 {
            return Err(CodecError::malformed("protobuf tag", "field number 0"));
        }
        let wire_type = (tag & 0x07) as u8;

        match wire_type {
            WIRE_VARINT => {
                let (value, next) = read_varint(self.bytes, next)?;
                self.pos = next;
                Ok((field, FieldValue::Varint(value)))
            }
            WIRE_LEN => {
                let (len, start) = read_varint(self.bytes, next)?;
                let len = usize::try_from(len)
                    .map_err(|_| CodecError::malformed("protobuf field", "length too large"))?;
                let end = start.checked_add(len).filter(|end| *end <= self.bytes.len());
                let end = end.ok_or(CodecError::Truncated {
                    what: "length-delimited field",
                    needed: len,
                    available: self.bytes.len().saturating_sub(start),
                })?;
                self.pos = end;
                Ok((field, FieldValue::Bytes(&self.bytes[start..end])))
            }
            WIRE_FIXED64 | WIRE_FIXED32 => {
                let width = if wire_type == WIRE_FIXED64 { 8 } else { 4 };
                if next + width > self.bytes.len() {
                    return Err(CodecError::Truncated {
                        what: "fixed-width field",
                        needed: width,
                        available: self.bytes.len() - next,
                    });
                }
                self.pos = next + width;
                Ok((field, FieldValue::Fixed))
            }
            other => Err(CodecError::UnexpectedWireType {
                field,
                wire_type: other,
            }),
        }
    }
}

impl<'a> Iterator for ProtoReader<'a> {
    type Item = Result<(u32, FieldValue<'a>), CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let item = self.read_field();
        if item.is_err() {
            // Stop after the first framing error
            self.pos = self.bytes.len();
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_encoding() {
        let mut buf = Vec::new();

        // 0 -> single byte 0x00
        put_varint(&mut buf, 0);
        assert_eq!(buf, [0x00]);

        // 127 -> single byte 0x7F
        buf.clear();
        put_varint(&mut buf, 127);
        assert_eq!(buf, [0x7F]);

        // 128 -> two bytes: 0x80 0x01
        buf.clear();
        put_varint(&mut buf, 128);
        assert_eq!(buf, [0x80, 0x01]);

        // 300 -> 0xAC 0x02
        buf.clear();
        put_varint(&mut buf, 300);
        assert_eq!(buf, [0xAC, 0x02]);
    }

    #[test]
    fn test_varint_decode_max_and_overflow() {
        let mut buf = Vec::new();
        put_varint(&mut buf, u64::MAX);
        assert_eq!(buf.len(), 10);
        assert_eq!(read_varint(&buf, 0).unwrap(), (u64::MAX, 10));

        let overflow = [0xFF; 11];
        assert!(read_varint(&overflow, 0).is_err());
        assert!(read_varint(&[0x80], 0).is_err());
    }

    #[test]
    fn test_writer_omits_defaults() {
        let encoded = ProtoWriter::new()
            .string(1, "")
            .uint(2, 0)
            .bytes(3, &[])
            .optional_bytes(4, None)
            .finish();
        assert!(encoded.is_empty());
    }

    #[test]
    fn test_writer_layout() {
        let encoded = ProtoWriter::new()
            .string(1, "adym")
            .uint(2, 150)
            .message(3, &[])
            .finish();
        assert_eq!(
            encoded,
            vec![0x0a, 0x04, b'a', b'd', b'y', b'm', 0x10, 0x96, 0x01, 0x1a, 0x00]
        );
    }

    #[test]
    fn test_reader_roundtrip_and_skip_fixed() {
        let mut encoded = ProtoWriter::new().string(1, "x").uint(2, 7).finish();
        // field 4, fixed32
        encoded.extend_from_slice(&[0x25, 1, 2, 3, 4]);

        let fields: Vec<_> = ProtoReader::new(&encoded)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], (1, FieldValue::Bytes(b"x")));
        assert_eq!(fields[1], (2, FieldValue::Varint(7)));
        assert_eq!(fields[2], (4, FieldValue::Fixed));
    }

    #[test]
    fn test_reader_truncated_length() {
        // field 1, len 5, only 2 bytes follow
        let encoded = [0x0a, 0x05, b'a', b'b'];
        let mut reader = ProtoReader::new(&encoded);
        assert!(matches!(
            reader.next(),
            Some(Err(CodecError::Truncated { .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_field_value_type_mismatch() {
        let value = FieldValue::Varint(1);
        assert!(value.as_string(1).is_err());
        assert!(FieldValue::Bytes(b"ok").as_u64(2).is_err());
    }
}
