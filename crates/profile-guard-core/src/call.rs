//! Typed profile operations and their ABI call payloads.
//!
//! A controller never forwards raw bytes: payloads are decoded into an
//! [`Operation`] first so authorization can inspect what the call does.

use bytes::Bytes;
use std::fmt;

use crate::abi::{address_word, encode_tuple, Decoder, Token};
use crate::error::{CoreError, Result};
use crate::types::{Address, DataKey};

/// `setData(bytes32,bytes)`
pub const SET_DATA_SELECTOR: [u8; 4] = [0x7f, 0x23, 0x69, 0x0c];
/// `setData(bytes32[],bytes[])`
pub const SET_DATA_BATCH_SELECTOR: [u8; 4] = [0x14, 0xa6, 0xe2, 0x93];
/// `transferOwnership(address)`
pub const TRANSFER_OWNERSHIP_SELECTOR: [u8; 4] = [0xf2, 0xfd, 0xe3, 0x8b];
/// `claimOwnership()`
pub const CLAIM_OWNERSHIP_SELECTOR: [u8; 4] = [0x4e, 0x71, 0xe0, 0xc8];

/// A mutating call on the profile.
#[derive(Clone, PartialEq, Eq)]
pub enum Operation {
    SetData { key: DataKey, value: Bytes },
    SetDataBatch { keys: Vec<DataKey>, values: Vec<Bytes> },
    TransferOwnership { candidate: Address },
    ClaimOwnership,
}

impl Operation {
    /// The 4-byte function selector.
    pub fn selector(&self) -> [u8; 4] {
        match self {
            Operation::SetData { .. } => SET_DATA_SELECTOR,
            Operation::SetDataBatch { .. } => SET_DATA_BATCH_SELECTOR,
            Operation::TransferOwnership { .. } => TRANSFER_OWNERSHIP_SELECTOR,
            Operation::ClaimOwnership => CLAIM_OWNERSHIP_SELECTOR,
        }
    }

    /// The function name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::SetData { .. } | Operation::SetDataBatch { .. } => "setData",
            Operation::TransferOwnership { .. } => "transferOwnership",
            Operation::ClaimOwnership => "claimOwnership",
        }
    }

    /// Encode as a call payload: selector followed by the argument tuple.
    pub fn encode(&self) -> Bytes {
        let mut out = self.selector().to_vec();
        match self {
            Operation::SetData { key, value } => {
                out.extend(encode_tuple(&[Token::Word(key.0), Token::Bytes(value)]));
            }
            Operation::SetDataBatch { keys, values } => {
                let words = keys.iter().map(|k| k.0).collect();
                out.extend(encode_tuple(&[
                    Token::WordArray(words),
                    Token::BytesArray(values),
                ]));
            }
            Operation::TransferOwnership { candidate } => {
                out.extend_from_slice(&address_word(candidate));
            }
            Operation::ClaimOwnership => {}
        }
        Bytes::from(out)
    }

    /// Decode a call payload.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < 4 {
            return Err(CoreError::AbiDecode("payload shorter than a selector".into()));
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&payload[..4]);
        let args = Decoder::new(&payload[4..]);

        match selector {
            SET_DATA_SELECTOR => {
                let key = DataKey(args.word(0)?);
                let value = args.bytes_at(args.follow(0, 1)?)?;
                Ok(Operation::SetData { key, value })
            }
            SET_DATA_BATCH_SELECTOR => {
                let keys = args
                    .words_at(args.follow(0, 0)?)?
                    .into_iter()
                    .map(DataKey)
                    .collect();
                let values = args.bytes_array_at(args.follow(0, 1)?)?;
                Ok(Operation::SetDataBatch { keys, values })
            }
            TRANSFER_OWNERSHIP_SELECTOR => Ok(Operation::TransferOwnership {
                candidate: args.address(0)?,
            }),
            CLAIM_OWNERSHIP_SELECTOR => Ok(Operation::ClaimOwnership),
            other => Err(CoreError::UnknownSelector(other)),
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SetData { key, value } => f
                .debug_struct("SetData")
                .field("key", key)
                .field("value", &hex::encode(value))
                .finish(),
            Operation::SetDataBatch { keys, values } => f
                .debug_struct("SetDataBatch")
                .field("keys", &keys.len())
                .field("values", &values.len())
                .finish(),
            Operation::TransferOwnership { candidate } => f
                .debug_struct("TransferOwnership")
                .field("candidate", candidate)
                .finish(),
            Operation::ClaimOwnership => f.write_str("ClaimOwnership"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keccak256;

    #[test]
    fn test_selectors_match_signatures() {
        let sel = |sig: &str| {
            let h = keccak256(sig.as_bytes());
            [h[0], h[1], h[2], h[3]]
        };
        assert_eq!(sel("setData(bytes32,bytes)"), SET_DATA_SELECTOR);
        assert_eq!(sel("setData(bytes32[],bytes[])"), SET_DATA_BATCH_SELECTOR);
        assert_eq!(sel("transferOwnership(address)"), TRANSFER_OWNERSHIP_SELECTOR);
        assert_eq!(sel("claimOwnership()"), CLAIM_OWNERSHIP_SELECTOR);
    }

    #[test]
    fn test_claim_ownership_payload_is_selector_only() {
        assert_eq!(Operation::ClaimOwnership.encode().as_ref(), &CLAIM_OWNERSHIP_SELECTOR);
    }

    #[test]
    fn test_set_data_layout() {
        let op = Operation::SetData {
            key: DataKey::from_bytes([0xaa; 32]),
            value: Bytes::from_static(&[0x0f]),
        };
        let payload = op.encode();

        // selector, key, offset, length, one padded word
        assert_eq!(payload.len(), 4 + 32 * 4);
        assert_eq!(payload[4 + 63], 0x40);
        assert_eq!(Operation::decode(&payload).unwrap(), op);
    }

    #[test]
    fn test_batch_decodes() {
        let op = Operation::SetDataBatch {
            keys: vec![DataKey::from_bytes([1; 32]), DataKey::from_bytes([2; 32])],
            values: vec![Bytes::from_static(b"one"), Bytes::new()],
        };
        assert_eq!(Operation::decode(&op.encode()).unwrap(), op);
    }

    #[test]
    fn test_unknown_selector() {
        let err = Operation::decode(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert_eq!(err, CoreError::UnknownSelector([0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn test_short_payload() {
        assert!(Operation::decode(&[0x4e, 0x71]).is_err());
    }
}
