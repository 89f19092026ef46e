//! Derivation vectors for deterministic verification.
//!
//! A wallet recovers its coins from the password alone, so derivation must
//! produce identical bytes on every platform and in every release. Each
//! vector fixes a password, stamp, version and amount; the outputs are the
//! derived key, blind, commitment and chain image.

use serde::{Deserialize, Serialize};

use coinkit_core::{
    chain_seed, derive_blind, derive_key, image_at, stretch_password, Commitment, KeySource,
    Password, Stamp, StretchParams,
};

/// Chain length the vectors are computed for.
pub const VECTOR_CHAIN_LENGTH: u64 = 64;

/// A derivation vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub password: &'static str,
    pub stamp: &'static str,
    pub version: u64,
    pub amount: u64,
    /// Expected outputs, hex encoded.
    pub expected: ExpectedOutput,
}

/// Pinned outputs of one vector.
#[derive(Debug, Clone, Copy)]
pub struct ExpectedOutput {
    pub derived_key: &'static str,
    pub blind: &'static str,
    pub commitment: &'static str,
    pub chain_image: &'static str,
}

/// Outputs of one vector, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorOutput {
    pub name: String,
    pub derived_key: String,
    pub blind: String,
    pub commitment: String,
    pub chain_image: String,
}

/// Get all derivation vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "genesis of a small coin",
            password: "correct horse battery staple",
            stamp: "stamp-0001",
            version: 0,
            amount: 100,
            expected: ExpectedOutput {
                derived_key: "7ca19ea92a526ba03e7db323b1d9719aebb482b72e2b2fcb84708b62276f000b",
                blind: "8715c62597f116373ce6f9bcf3ea357ebe00b1089cc9c0b96f222efade13f20a",
                commitment: "66040d38b73c1454e9a40eae696da38c345f80c201608f5aa4eca4bc95ca0d0c",
                chain_image: "1f6af59f845ec4a220ed3015e3dcd3345359c8718eed3227aea10e5ad97ace77",
            },
        },
        GoldenVector {
            name: "first derivation",
            password: "correct horse battery staple",
            stamp: "stamp-0001",
            version: 1,
            amount: 100,
            expected: ExpectedOutput {
                derived_key: "444144f9eba09398919e1f1967e5d50dcdb38571fa0b8e2697f4c039e880b50d",
                blind: "242448c80fef55982071481e9fbc09c7dd868753359a97d07404dfc5c91ecb03",
                commitment: "1a09936d76d4ce77e5f73ed43159f5201e4f795face679733d763f25ea58ed3d",
                chain_image: "173788ef2bc7ff06d064e4f48e5b892dde72fcc6adbebc8a76b54950b54d4411",
            },
        },
        GoldenVector {
            name: "zero amount",
            password: "p",
            stamp: "s",
            version: 0,
            amount: 0,
            expected: ExpectedOutput {
                derived_key: "401ff7b74d0a7b219d48e83c71ab9df6b08aa468edee89234c2017e7e9fe4e7d",
                blind: "79962ecfd6b6e9ac04b8559dc8198b42248cb8d054981233a68d65b01aac6806",
                commitment: "cad3175a32749ba03c9086c499147acd55e478e301cabbda67512eb4efaf227e",
                chain_image: "a14578499b48f15c7439b2577ec3cc3a5b41b024f0a139eda54a254765526ac8",
            },
        },
        GoldenVector {
            name: "last version of the chain",
            password: "p",
            stamp: "s",
            version: VECTOR_CHAIN_LENGTH,
            amount: u64::MAX,
            expected: ExpectedOutput {
                derived_key: "69f28fcefc63c960cd7a9a42634e2e9f3d09960a2dbff289afcd0f4954802677",
                blind: "46b039e7eec7b52539591203f82b33b18721c788485c1d3b68c8e92543ffd901",
                commitment: "1a2991d7debe5d0e5e57f4f1b9b7b1cd2a6edf9d786f38004c18faa98c836430",
                chain_image: "c1ecd52bd009ad93d3354cdda2aa6f60592df5e502c1ae47394d15bae7a456d2",
            },
        },
    ]
}

/// Compute the outputs of `vector`.
pub fn generate_vector(vector: &GoldenVector) -> VectorOutput {
    let password = Password::new(vector.password);
    let stamp = Stamp::new(vector.stamp).expect("vector stamp is non-empty");
    let params = StretchParams::MINIMAL;

    let derived_key = derive_key(
        &KeySource::Password {
            password: &password,
            version: vector.version,
            stamp: &stamp,
        },
        32,
        &params,
    )
    .expect("key derivation");

    let key = stretch_password(&password, &params).expect("password is non-empty");
    let blind = derive_blind(&key, vector.version, &stamp).expect("blind derivation");
    let seed = chain_seed(&key, &stamp).expect("chain seed");
    let image = image_at(&seed, vector.version, VECTOR_CHAIN_LENGTH).expect("version in range");

    VectorOutput {
        name: vector.name.to_string(),
        derived_key: derived_key.to_hex().to_string(),
        blind: hex::encode(*blind.to_bytes()),
        commitment: hex::encode(Commitment::new(vector.amount, &blind).as_bytes()),
        chain_image: hex::encode(image.as_bytes()),
    }
}

/// Check every vector against its pinned outputs.
///
/// Returns `(name, mismatched fields)`; an empty list means the vector holds.
pub fn verify_all_vectors() -> Vec<(String, Vec<&'static str>)> {
    all_vectors()
        .iter()
        .map(|v| {
            let output = generate_vector(v);
            let mut mismatched = Vec::new();
            if output.derived_key != v.expected.derived_key {
                mismatched.push("derived_key");
            }
            if output.blind != v.expected.blind {
                mismatched.push("blind");
            }
            if output.commitment != v.expected.commitment {
                mismatched.push("commitment");
            }
            if output.chain_image != v.expected.chain_image {
                mismatched.push("chain_image");
            }
            (output.name, mismatched)
        })
        .collect()
}

/// All vector outputs as pretty JSON, for pinning or for other implementations.
pub fn vectors_json() -> String {
    let outputs: Vec<VectorOutput> = all_vectors().iter().map(generate_vector).collect();
    serde_json::to_string_pretty(&outputs).expect("vector outputs serialize")
}
