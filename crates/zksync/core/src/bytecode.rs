use alloy_primitives::{Address, B256, keccak256};
use sha2::{Digest, Sha256};

/// Maximum number of 32-byte words in a zk bytecode.
pub const MAX_BYTECODE_WORDS: usize = (1 << 16) - 1;

/// Reasons a bytecode cannot be hashed for zkSync.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BytecodeHashError {
    /// The length is not a multiple of 32.
    #[error("bytecode length {0} is not a multiple of 32 bytes")]
    NotWordAligned(usize),
    /// The number of words is even.
    #[error("bytecode has an even number of words ({0})")]
    EvenWordCount(usize),
    /// The number of words does not fit in two bytes.
    #[error("bytecode has {0} words, at most {MAX_BYTECODE_WORDS} are allowed")]
    TooLong(usize),
}

/// Computes the versioned zk bytecode hash.
///
/// The layout is `[version = 1, 0, word count as big-endian u16, sha256(code)[4..]]`.
pub fn hash_bytecode(code: &[u8]) -> Result<B256, BytecodeHashError> {
    if code.len() % 32 != 0 {
        return Err(BytecodeHashError::NotWordAligned(code.len()));
    }
    let words = code.len() / 32;
    if words > MAX_BYTECODE_WORDS {
        return Err(BytecodeHashError::TooLong(words));
    }
    if words % 2 == 0 {
        return Err(BytecodeHashError::EvenWordCount(words));
    }

    let mut hash: [u8; 32] = Sha256::digest(code).into();
    hash[0] = 1;
    hash[1] = 0;
    hash[2..4].copy_from_slice(&(words as u16).to_be_bytes());
    Ok(B256::from(hash))
}

/// Address of a contract deployed through the system contract deployer with `create2`.
///
/// `keccak256(keccak256("zksyncCreate2") ++ sender ++ salt ++ bytecodeHash ++ keccak256(input))`,
/// where `sender` is left-padded to 32 bytes.
pub fn compute_create2_address(
    sender: Address,
    bytecode_hash: B256,
    salt: B256,
    constructor_input: &[u8],
) -> Address {
    let prefix = keccak256("zksyncCreate2");
    let input_hash = keccak256(constructor_input);

    let mut bytes = Vec::with_capacity(32 * 5);
    bytes.extend_from_slice(prefix.as_slice());
    bytes.extend_from_slice(sender.into_word().as_slice());
    bytes.extend_from_slice(salt.as_slice());
    bytes.extend_from_slice(bytecode_hash.as_slice());
    bytes.extend_from_slice(input_hash.as_slice());

    Address::from_word(keccak256(bytes))
}
