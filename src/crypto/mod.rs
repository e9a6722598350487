pub mod address;
pub mod ecdsa;
pub mod nonce;

// Re-export main functions for easier access
pub use address::{parse_address, Address};
pub use ecdsa::{
    decode_signature, hash_personal_message, keccak256, recover_address, sign_personal_message,
};
