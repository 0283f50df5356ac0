//! A small ABI codec covering the types profile calls and proposal records use.
//!
//! Supported: `bytes32`, `address`, `bytes`, `bytes32[]`, `address[]`,
//! `bytes[]`, in tuples with standard head/tail layout.

use bytes::Bytes;

use crate::error::{CoreError, Result};
use crate::types::Address;

const WORD: usize = 32;

/// One value to encode.
#[derive(Debug, Clone)]
pub(crate) enum Token<'a> {
    Word([u8; 32]),
    Bytes(&'a [u8]),
    WordArray(Vec<[u8; 32]>),
    BytesArray(&'a [Bytes]),
}

pub(crate) fn uint_word(value: usize) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&(value as u64).to_be_bytes());
    out
}

pub(crate) fn address_word(address: &Address) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(&address.0);
    out
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

fn encode_bytes_tail(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&uint_word(data.len()));
    out.extend_from_slice(data);
    out.resize(out.len() + padded_len(data.len()) - data.len(), 0);
}

fn encode_bytes_array_tail(out: &mut Vec<u8>, items: &[Bytes]) {
    out.extend_from_slice(&uint_word(items.len()));
    let heads = WORD * items.len();
    let mut tail = Vec::new();
    for item in items {
        out.extend_from_slice(&uint_word(heads + tail.len()));
        encode_bytes_tail(&mut tail, item);
    }
    out.extend_from_slice(&tail);
}

/// Encode a tuple with head/tail layout.
pub(crate) fn encode_tuple(tokens: &[Token<'_>]) -> Vec<u8> {
    let head_size = WORD * tokens.len();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Word(word) => head.extend_from_slice(word),
            dynamic => {
                head.extend_from_slice(&uint_word(head_size + tail.len()));
                match dynamic {
                    Token::Bytes(data) => encode_bytes_tail(&mut tail, data),
                    Token::WordArray(words) => {
                        tail.extend_from_slice(&uint_word(words.len()));
                        for word in words {
                            tail.extend_from_slice(word);
                        }
                    }
                    Token::BytesArray(items) => encode_bytes_array_tail(&mut tail, items),
                    Token::Word(_) => unreachable!("static token in dynamic branch"),
                }
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Bounds-checked reader over an encoded tuple.
pub(crate) struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn slice(&self, at: usize, len: usize) -> Result<&'a [u8]> {
        let end = at
            .checked_add(len)
            .ok_or_else(|| CoreError::AbiDecode("offset overflow".into()))?;
        self.data
            .get(at..end)
            .ok_or_else(|| CoreError::AbiDecode(format!("read past end at {}", at)))
    }

    pub(crate) fn word(&self, at: usize) -> Result<[u8; 32]> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.slice(at, WORD)?);
        Ok(out)
    }

    pub(crate) fn uint(&self, at: usize) -> Result<usize> {
        let word = self.word(at)?;
        if word[..24].iter().any(|b| *b != 0) {
            return Err(CoreError::AbiDecode(format!("integer too large at {}", at)));
        }
        let mut be = [0u8; 8];
        be.copy_from_slice(&word[24..]);
        usize::try_from(u64::from_be_bytes(be))
            .map_err(|_| CoreError::AbiDecode(format!("integer too large at {}", at)))
    }

    pub(crate) fn address(&self, at: usize) -> Result<Address> {
        let word = self.word(at)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(CoreError::AbiDecode(format!("dirty address word at {}", at)));
        }
        Address::from_slice(&word[12..])
    }

    /// Follow the head slot `slot` of a tuple starting at `base`.
    pub(crate) fn follow(&self, base: usize, slot: usize) -> Result<usize> {
        let offset = self.uint(base + WORD * slot)?;
        base.checked_add(offset)
            .ok_or_else(|| CoreError::AbiDecode("offset overflow".into()))
    }

    fn count(&self, at: usize) -> Result<usize> {
        let n = self.uint(at)?;
        // every element occupies at least one word
        if n > self.data.len() / WORD {
            return Err(CoreError::AbiDecode(format!("array length {} exceeds input", n)));
        }
        Ok(n)
    }

    pub(crate) fn bytes_at(&self, at: usize) -> Result<Bytes> {
        let len = self.uint(at)?;
        Ok(Bytes::copy_from_slice(self.slice(at + WORD, len)?))
    }

    pub(crate) fn words_at(&self, at: usize) -> Result<Vec<[u8; 32]>> {
        let n = self.count(at)?;
        (0..n).map(|i| self.word(at + WORD * (i + 1))).collect()
    }

    pub(crate) fn addresses_at(&self, at: usize) -> Result<Vec<Address>> {
        let n = self.count(at)?;
        (0..n).map(|i| self.address(at + WORD * (i + 1))).collect()
    }

    pub(crate) fn bytes_array_at(&self, at: usize) -> Result<Vec<Bytes>> {
        let n = self.count(at)?;
        let base = at + WORD;
        (0..n)
            .map(|i| {
                let pos = self.follow(base, i)?;
                self.bytes_at(pos)
            })
            .collect()
    }
}

/// `abi.encode(address[])`.
pub fn encode_address_array(addresses: &[Address]) -> Bytes {
    let words = addresses.iter().map(address_word).collect();
    Bytes::from(encode_tuple(&[Token::WordArray(words)]))
}

/// Inverse of [`encode_address_array`].
pub fn decode_address_array(data: &[u8]) -> Result<Vec<Address>> {
    let decoder = Decoder::new(data);
    let at = decoder.follow(0, 0)?;
    decoder.addresses_at(at)
}

/// `abi.encode(bytes[])`.
pub fn encode_bytes_array(items: &[Bytes]) -> Bytes {
    Bytes::from(encode_tuple(&[Token::BytesArray(items)]))
}

/// Inverse of [`encode_bytes_array`].
pub fn decode_bytes_array(data: &[u8]) -> Result<Vec<Bytes>> {
    let decoder = Decoder::new(data);
    let at = decoder.follow(0, 0)?;
    decoder.bytes_array_at(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_array_layout() {
        let a = Address::from_bytes([0x11; 20]);
        let encoded = encode_address_array(&[a]);

        assert_eq!(encoded.len(), 96);
        assert_eq!(encoded[31], 0x20);
        assert_eq!(encoded[63], 1);
        assert_eq!(&encoded[76..96], &[0x11; 20]);
        assert_eq!(decode_address_array(&encoded).unwrap(), vec![a]);
    }

    #[test]
    fn test_bytes_array_layout() {
        let items = vec![Bytes::from_static(b"\x01\x02"), Bytes::new()];
        let encoded = encode_bytes_array(&items);

        // offset, len, two element offsets, (len + one padded word), len
        assert_eq!(encoded.len(), 32 * 7);
        assert_eq!(encoded[95], 0x40);
        assert_eq!(encoded[127], 0x80);
        assert_eq!(decode_bytes_array(&encoded).unwrap(), items);
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let encoded = encode_bytes_array(&[Bytes::from_static(b"hello")]);
        let err = decode_bytes_array(&encoded[..encoded.len() - 40]).unwrap_err();
        assert!(matches!(err, CoreError::AbiDecode(_)));
    }

    #[test]
    fn test_absurd_length_is_rejected() {
        let mut data = vec![0u8; 64];
        data[31] = 0x20;
        data[32..].copy_from_slice(&[0xff; 32]);
        assert!(decode_address_array(&data).is_err());
    }

    #[test]
    fn test_dirty_address_rejected() {
        let mut encoded = encode_address_array(&[Address::from_bytes([1; 20])]).to_vec();
        encoded[64] = 0xff;
        assert!(decode_address_array(&encoded).is_err());
    }
}
