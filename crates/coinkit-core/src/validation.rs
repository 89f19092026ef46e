//! Coin validation: structural checks that need no secrets.

use crate::coin::Coin;
use crate::error::ValidationError;

/// Validate a coin's structure against a chain length.
///
/// This performs:
/// - Commitment decoding
/// - Predecessor and origin presence rules
/// - Version range check
/// - Terminal status placement
pub fn validate_coin(coin: &Coin, chain_length: u64) -> Result<(), ValidationError> {
    validate_coin_structure(coin)?;

    if coin.version > chain_length {
        return Err(ValidationError::VersionOutOfRange {
            version: coin.version,
            stamp: coin.stamp.to_string(),
            chain_length,
        });
    }

    Ok(())
}

/// Validate a coin's structure without chain context.
///
/// Used when decoding, where the chain length of the issuing engine is not
/// known.
pub fn validate_coin_structure(coin: &Coin) -> Result<(), ValidationError> {
    // 1. Commitment must be a curve point
    if coin.commitment.point().is_err() {
        return Err(ValidationError::BadCommitment {
            version: coin.version,
            stamp: coin.stamp.to_string(),
        });
    }

    // 2. Genesis has no predecessor, everything else has one
    match (coin.version, &coin.predecessor) {
        (0, Some(_)) => {
            return Err(ValidationError::UnexpectedPredecessor {
                version: coin.version,
                stamp: coin.stamp.to_string(),
            })
        }
        (v, None) if v > 0 => {
            return Err(ValidationError::MissingPredecessor {
                version: coin.version,
                stamp: coin.stamp.to_string(),
            })
        }
        _ => {}
    }

    // 3. Only a chain's first coin can name the token it was swapped from
    if coin.version > 0 && coin.origin.is_some() {
        return Err(ValidationError::UnexpectedOrigin {
            version: coin.version,
            stamp: coin.stamp.to_string(),
        });
    }

    // 4. Tokens are always minted at a derived version
    if coin.version == 0 && coin.status.is_terminal() {
        return Err(ValidationError::TerminalAtGenesis {
            version: coin.version,
            stamp: coin.stamp.to_string(),
            status: coin.status.as_str(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainImage;
    use crate::coin::CoinStatus;
    use crate::commitment::Commitment;
    use crate::curve::Blind;
    use crate::types::{CoinDigest, Stamp};

    fn coin(version: u64, predecessor: Option<CoinDigest>, status: CoinStatus) -> Coin {
        Coin {
            version,
            stamp: Stamp::new("s1").unwrap(),
            commitment: Commitment::new(5, &Blind::random()),
            hash_image: ChainImage([0u8; 32]),
            predecessor,
            origin: None,
            status,
        }
    }

    #[test]
    fn test_valid_coins() {
        validate_coin(&coin(0, None, CoinStatus::Active), 16).unwrap();
        validate_coin(&coin(3, Some(CoinDigest([1; 32])), CoinStatus::Released), 16).unwrap();
    }

    #[test]
    fn test_bad_commitment() {
        let mut c = coin(0, None, CoinStatus::Active);
        c.commitment = Commitment([0xff; 32]);
        assert!(matches!(
            validate_coin_structure(&c),
            Err(ValidationError::BadCommitment { .. })
        ));
    }

    #[test]
    fn test_predecessor_rules() {
        assert!(matches!(
            validate_coin_structure(&coin(0, Some(CoinDigest([1; 32])), CoinStatus::Active)),
            Err(ValidationError::UnexpectedPredecessor { version: 0, .. })
        ));
        assert!(matches!(
            validate_coin_structure(&coin(2, None, CoinStatus::Active)),
            Err(ValidationError::MissingPredecessor { version: 2, .. })
        ));
    }

    #[test]
    fn test_origin_only_at_genesis() {
        let mut swapped_in = coin(0, None, CoinStatus::Active);
        swapped_in.origin = Some(CoinDigest([9; 32]));
        assert!(validate_coin_structure(&swapped_in).is_ok());

        let mut later = coin(1, Some(CoinDigest([1; 32])), CoinStatus::Active);
        later.origin = Some(CoinDigest([9; 32]));
        assert!(matches!(
            validate_coin_structure(&later),
            Err(ValidationError::UnexpectedOrigin { version: 1, .. })
        ));
    }

    #[test]
    fn test_version_range() {
        let c = coin(17, Some(CoinDigest([1; 32])), CoinStatus::Active);
        assert!(validate_coin_structure(&c).is_ok());
        assert!(matches!(
            validate_coin(&c, 16),
            Err(ValidationError::VersionOutOfRange {
                chain_length: 16,
                ..
            })
        ));
    }

    #[test]
    fn test_terminal_at_genesis() {
        let err = validate_coin_structure(&coin(0, None, CoinStatus::Swapped)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TerminalAtGenesis {
                status: "swapped",
                ..
            }
        ));
    }
}
