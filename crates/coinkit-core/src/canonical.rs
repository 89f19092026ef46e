//! Canonical CBOR encoding for coins.
//!
//! RFC 8949 core deterministic encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use the smallest valid encoding
//! - Definite lengths only
//!
//! The same coin must produce identical bytes on every platform, since its
//! digest is what signatures and chain links bind to. Decoding is strict: a
//! byte string that decodes but does not re-encode identically is rejected.

use ciborium::value::Value;

use crate::chain::ChainImage;
use crate::coin::{Coin, CoinStatus};
use crate::commitment::Commitment;
use crate::error::{CoreError, Result};
use crate::types::{CoinDigest, Stamp};
use crate::validation::validate_coin_structure;

/// Coin field keys. Keys 0-23 encode as single bytes.
mod keys {
    pub const VERSION: u64 = 0;
    pub const STAMP: u64 = 1;
    pub const COMMITMENT: u64 = 2;
    pub const HASH_IMAGE: u64 = 3;
    pub const PREDECESSOR: u64 = 4;
    pub const STATUS: u64 = 5;
    pub const ORIGIN: u64 = 6;
}

/// A CBOR data item the coin encoding uses.
enum Item<'a> {
    Uint(u64),
    Bytes(&'a [u8]),
    Text(&'a str),
    Null,
}

/// Encode a coin to canonical CBOR bytes.
pub fn canonical_coin_bytes(coin: &Coin) -> Vec<u8> {
    let entries = [
        (keys::VERSION, Item::Uint(coin.version)),
        (keys::STAMP, Item::Text(coin.stamp.as_str())),
        (keys::COMMITMENT, Item::Bytes(coin.commitment.as_bytes())),
        (keys::HASH_IMAGE, Item::Bytes(coin.hash_image.as_bytes())),
        (keys::PREDECESSOR, optional_item(&coin.predecessor)),
        (keys::STATUS, Item::Uint(coin.status.to_u8().into())),
        (keys::ORIGIN, optional_item(&coin.origin)),
    ];

    let mut buf = Vec::with_capacity(160);
    encode_map_canonical(&mut buf, &entries);
    buf
}

fn optional_item(digest: &Option<CoinDigest>) -> Item<'_> {
    match digest {
        Some(digest) => Item::Bytes(digest.as_bytes()),
        None => Item::Null,
    }
}

fn encode_item(buf: &mut Vec<u8>, item: &Item<'_>) {
    match item {
        Item::Uint(n) => encode_uint(buf, 0, *n),
        Item::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Item::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Item::Null => buf.push(0xf6),
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map with integer keys, sorted by encoded key bytes.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(u64, Item<'_>)]) {
    let mut pairs: Vec<(Vec<u8>, &Item<'_>)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::with_capacity(9);
            encode_uint(&mut key_buf, 0, *k);
            (key_buf, v)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_item(buf, value);
    }
}

/// Decode a coin from canonical bytes.
pub fn decode_coin(bytes: &[u8]) -> Result<Coin> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let coin = cbor_value_to_coin(&value)?;

    if canonical_coin_bytes(&coin) != bytes {
        return Err(CoreError::DecodingError("non-canonical coin encoding".into()));
    }
    validate_coin_structure(&coin)?;
    Ok(coin)
}

fn cbor_value_to_coin(value: &Value) -> Result<Coin> {
    let map = match value {
        Value::Map(m) => m,
        _ => return Err(malformed("expected map")),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == i128::from(key)))
            .map(|(_, v)| v)
    };

    let version = match get(keys::VERSION) {
        Some(Value::Integer(i)) => u64::try_from(*i).map_err(|_| malformed("invalid version"))?,
        _ => return Err(malformed("missing version")),
    };

    let stamp = match get(keys::STAMP) {
        Some(Value::Text(s)) => Stamp::new(s.as_str())?,
        _ => return Err(malformed("missing stamp")),
    };

    let commitment = Commitment(bytes32(get(keys::COMMITMENT), "invalid commitment")?);
    let hash_image = ChainImage(bytes32(get(keys::HASH_IMAGE), "invalid hash image")?);

    let predecessor = optional_digest(get(keys::PREDECESSOR), "invalid predecessor")?;
    let origin = optional_digest(get(keys::ORIGIN), "invalid origin")?;

    let status = match get(keys::STATUS) {
        Some(Value::Integer(i)) => u8::try_from(*i)
            .ok()
            .and_then(CoinStatus::from_u8)
            .ok_or_else(|| malformed("invalid status"))?,
        _ => return Err(malformed("missing status")),
    };

    Ok(Coin {
        version,
        stamp,
        commitment,
        hash_image,
        predecessor,
        origin,
        status,
    })
}

fn optional_digest(value: Option<&Value>, what: &'static str) -> Result<Option<CoinDigest>> {
    match value {
        Some(Value::Null) => Ok(None),
        other => bytes32(other, what).map(|b| Some(CoinDigest(b))),
    }
}

fn bytes32(value: Option<&Value>, what: &'static str) -> Result<[u8; 32]> {
    match value {
        Some(Value::Bytes(b)) => b.as_slice().try_into().map_err(|_| malformed(what)),
        _ => Err(malformed(what)),
    }
}

fn malformed(what: &str) -> CoreError {
    CoreError::DecodingError(format!("malformed coin: {}", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Blind;

    fn sample() -> Coin {
        Coin {
            version: 300,
            stamp: Stamp::new("s1").unwrap(),
            commitment: Commitment::new(7, &Blind::random()),
            hash_image: ChainImage([0x11; 32]),
            predecessor: Some(CoinDigest([0x22; 32])),
            origin: None,
            status: CoinStatus::Active,
        }
    }

    #[test]
    fn test_canonical_encoding_deterministic() {
        let coin = sample();
        assert_eq!(canonical_coin_bytes(&coin), canonical_coin_bytes(&coin));
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();

        encode_uint(&mut buf, 0, 0);
        assert_eq!(buf, vec![0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 0, 256);
        assert_eq!(buf, vec![0x19, 0x01, 0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, 65536);
        assert_eq!(buf, vec![0x1a, 0x00, 0x01, 0x00, 0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, u64::MAX);
        assert_eq!(buf[0], 0x1b);
        assert_eq!(buf.len(), 9);
    }

    #[test]
    fn test_map_layout() {
        let bytes = canonical_coin_bytes(&sample());
        // Seven-entry map, key 0 then version 300 in two bytes.
        assert_eq!(bytes[0], 0xa7);
        assert_eq!(bytes[1], 0x00);
        assert_eq!(&bytes[2..5], &[0x19, 0x01, 0x2c]);
        // Key 1 then the two-character stamp.
        assert_eq!(&bytes[5..9], &[0x01, 0x62, b's', b'1']);
    }

    #[test]
    fn test_map_key_ordering() {
        let mut buf = Vec::new();
        let entries = [
            (8, Item::Uint(80)),
            (0, Item::Uint(0)),
            (5, Item::Uint(50)),
        ];
        encode_map_canonical(&mut buf, &entries);
        assert_eq!(buf, vec![0xa3, 0x00, 0x00, 0x05, 0x18, 50, 0x08, 0x18, 80]);
    }

    #[test]
    fn test_coin_roundtrip() {
        let coin = sample();
        let decoded = decode_coin(&canonical_coin_bytes(&coin)).unwrap();
        assert_eq!(decoded, coin);

        let genesis = Coin {
            version: 0,
            predecessor: None,
            ..sample()
        };
        assert_eq!(decode_coin(&canonical_coin_bytes(&genesis)).unwrap(), genesis);

        let swapped_in = Coin {
            origin: Some(CoinDigest([0x33; 32])),
            ..genesis
        };
        assert_eq!(
            decode_coin(&canonical_coin_bytes(&swapped_in)).unwrap(),
            swapped_in
        );
    }

    #[test]
    fn test_non_canonical_rejected() {
        // Same map with the version encoded in a needlessly wide form.
        let coin = Coin {
            version: 1,
            ..sample()
        };
        let mut bytes = canonical_coin_bytes(&coin);
        assert_eq!(bytes[2], 0x01);
        bytes.splice(2..3, [0x18, 0x01]);
        assert!(matches!(
            decode_coin(&bytes),
            Err(CoreError::DecodingError(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode_coin(&[]).is_err());
        assert!(decode_coin(&[0x01, 0x02]).is_err());
        assert!(decode_coin(&[0xa0]).is_err());
    }

    #[test]
    fn test_structural_check_on_decode() {
        // Version 3 without a predecessor decodes but is structurally invalid.
        let coin = Coin {
            version: 3,
            predecessor: None,
            ..sample()
        };
        assert!(decode_coin(&canonical_coin_bytes(&coin)).is_err());
    }
}
