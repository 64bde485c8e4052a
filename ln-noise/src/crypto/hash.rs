use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Hash output length (SHA-256 = 32 bytes).
pub const HASH_LEN: usize = 32;

/// Compute the SHA-256 hash of input.
pub fn hash(input: &[u8]) -> [u8; HASH_LEN] {
    Sha256::digest(input).into()
}

/// Compute SHA-256 of two concatenated inputs without allocating.
pub fn hash_two(a: &[u8], b: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(a);
    hasher.update(b);
    hasher.finalize().into()
}

/// HKDF-SHA256 with the chaining key as salt, an empty info string and two
/// 32-byte output blocks.
///
/// Returns `(output1, output2)`. Used both to mix a DH result into the
/// chaining key and to rotate transport keys.
pub fn hkdf2(
    chaining_key: &[u8; HASH_LEN],
    input_key_material: &[u8],
) -> (Zeroizing<[u8; HASH_LEN]>, Zeroizing<[u8; HASH_LEN]>) {
    let hk = Hkdf::<Sha256>::new(Some(chaining_key), input_key_material);
    let mut okm = Zeroizing::new([0u8; 2 * HASH_LEN]);
    let Ok(()) = hk.expand(&[], okm.as_mut_slice()) else {
        unreachable!("64 bytes is a valid HKDF-SHA256 output length");
    };

    let mut output1 = Zeroizing::new([0u8; HASH_LEN]);
    let mut output2 = Zeroizing::new([0u8; HASH_LEN]);
    output1.copy_from_slice(&okm[..HASH_LEN]);
    output2.copy_from_slice(&okm[HASH_LEN..]);
    (output1, output2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_known_value() {
        assert_eq!(
            hex::encode(hash(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hash_two_equals_concatenated_hash() {
        let a = b"hello";
        let b = b"world";
        let mut combined = Vec::new();
        combined.extend_from_slice(a);
        combined.extend_from_slice(b);
        assert_eq!(hash_two(a, b), hash(&combined));
    }

    #[test]
    fn hkdf2_produces_different_outputs() {
        let ck = [0x01u8; HASH_LEN];
        let (o1, o2) = hkdf2(&ck, b"ikm");
        assert_ne!(*o1, *o2);
    }

    #[test]
    fn hkdf2_depends_on_chaining_key() {
        let (a, _) = hkdf2(&[0x01u8; HASH_LEN], b"ikm");
        let (b, _) = hkdf2(&[0x02u8; HASH_LEN], b"ikm");
        assert_ne!(*a, *b);
    }

    #[test]
    fn hkdf2_matches_rfc5869_expand() {
        let ck = [0x42u8; HASH_LEN];
        let (o1, o2) = hkdf2(&ck, b"ikm");

        let mut okm = [0u8; 64];
        Hkdf::<Sha256>::new(Some(&ck), b"ikm")
            .expand(&[], &mut okm)
            .unwrap();
        assert_eq!(&okm[..32], &*o1);
        assert_eq!(&okm[32..], &*o2);
    }
}
