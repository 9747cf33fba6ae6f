//! A growable byte buffer with typed readers and writers for the SSH
//! primitive wire types: `byte`, `uint32`, `string`, `mpint` and
//! `name-list`.

use num_bigint::BigUint;

use crate::error::{Error, Result};

/// A growable, appendable byte buffer used to assemble or inspect a
/// packet's payload.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Create a buffer pre-loaded with `bytes`, for decoding.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Drop all content, keeping the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Reserve room for at least `n` more bytes.
    pub fn grow(&mut self, n: usize) {
        self.bytes.reserve(n);
    }

    /// Append raw bytes verbatim.
    pub fn append(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Borrow the buffer's content.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the buffer, returning its content.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write a single octet.
    pub fn write_u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    /// Write a 32-bit big-endian integer.
    pub fn write_u32_be(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_be_bytes());
    }

    /// Write a length-prefixed byte string.
    pub fn write_string(&mut self, data: &[u8]) {
        self.write_u32_be(data.len() as u32);
        self.bytes.extend_from_slice(data);
    }

    /// Write a comma-separated name-list.
    pub fn write_name_list<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = names
            .into_iter()
            .map(|n| n.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(",");

        self.write_string(joined.as_bytes());
    }

    /// Write a non-negative big integer as a minimally-encoded `mpint`.
    pub fn write_mpint(&mut self, v: &BigUint) {
        if v == &BigUint::from(0u8) {
            self.write_string(&[]);
            return;
        }

        let mut bytes = v.to_bytes_be();
        if bytes[0] & 0x80 != 0 {
            bytes.insert(0, 0);
        }

        self.write_string(&bytes);
    }
}

/// A cursor reading typed values out of a byte slice, tracking position.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over `data`, starting at offset 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of unread bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Truncated);
        }

        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a single octet.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a 32-bit big-endian integer.
    pub fn read_u32_be(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().expect("4 bytes")))
    }

    /// Read a length-prefixed byte string, borrowing from the source.
    pub fn read_string(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32_be()? as usize;
        self.take(len)
    }

    /// Read an `mpint` as a non-negative big integer.
    ///
    /// Negative `mpint`s (high bit set without a leading zero byte) are
    /// never produced by this protocol's positive-only quantities
    /// (`e`, `f`, `K`), so encountering one is treated as malformed input.
    pub fn read_mpint(&mut self) -> Result<BigUint> {
        let bytes = self.read_string()?;

        if bytes.is_empty() {
            return Ok(BigUint::from(0u8));
        }

        if bytes[0] & 0x80 != 0 {
            return Err(Error::InvalidMpint);
        }

        Ok(BigUint::from_bytes_be(bytes))
    }

    /// Read a remaining raw slice without any length prefix.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_round_trip() {
        let mut buf = Buffer::new();
        buf.write_u32_be(0xdead_beef);

        let mut r = Reader::new(buf.as_slice());
        assert_eq!(r.read_u32_be().unwrap(), 0xdead_beef);
    }

    #[test]
    fn string_round_trip() {
        let mut buf = Buffer::new();
        buf.write_string(b"hello");

        let mut r = Reader::new(buf.as_slice());
        assert_eq!(r.read_string().unwrap(), b"hello");
    }

    #[test]
    fn truncated_string_errors() {
        let mut buf = Buffer::new();
        buf.write_u32_be(10);
        buf.append(b"short");

        let mut r = Reader::new(buf.as_slice());
        assert!(matches!(r.read_string(), Err(Error::Truncated)));
    }

    #[test]
    fn mpint_zero_is_empty_string() {
        let mut buf = Buffer::new();
        buf.write_mpint(&BigUint::from(0u8));
        assert_eq!(buf.as_slice(), &0u32.to_be_bytes());
    }

    #[test]
    fn mpint_high_bit_gets_leading_zero() {
        // 0x80 alone would look negative; encoding must prefix a zero byte.
        let mut buf = Buffer::new();
        buf.write_mpint(&BigUint::from(0x80u8));

        let mut r = Reader::new(buf.as_slice());
        let s = r.read_string().unwrap();
        assert_eq!(s, &[0x00, 0x80]);
    }

    #[test]
    fn mpint_round_trip() {
        let v = BigUint::from(0x1234_5678_9abc_def0u64);

        let mut buf = Buffer::new();
        buf.write_mpint(&v);

        let mut r = Reader::new(buf.as_slice());
        assert_eq!(r.read_mpint().unwrap(), v);
    }

    #[test]
    fn name_list_joins_with_commas() {
        let mut buf = Buffer::new();
        buf.write_name_list(["a", "bb", "ccc"]);

        let mut r = Reader::new(buf.as_slice());
        assert_eq!(r.read_string().unwrap(), b"a,bb,ccc");
    }
}
