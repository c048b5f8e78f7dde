use crate::error::TrackerError;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// One-way salted password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, TrackerError>;

    /// Never fails on a mismatch or a malformed hash; both are `false`.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// bcrypt with an embedded random salt per call.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, TrackerError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> BcryptHasher {
        BcryptHasher::new(MIN_COST)
    }

    #[test]
    fn verifies_only_the_matching_plaintext() {
        let h = hasher();
        for pw in ["pw123", "", "ünïcödé pass", "a much longer passphrase with spaces"] {
            let hash = h.hash(pw).expect("hash");
            assert!(h.verify(pw, &hash), "{pw:?} should verify");
            assert!(!h.verify("other", &hash));
        }
    }

    #[test]
    fn same_plaintext_gets_a_fresh_salt() {
        let h = hasher();
        let a = h.hash("pw123").expect("hash");
        let b = h.hash("pw123").expect("hash");
        assert_ne!(a, b);
        assert!(h.verify("pw123", &a));
        assert!(h.verify("pw123", &b));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!hasher().verify("pw123", "not-a-bcrypt-hash"));
    }

    #[test]
    fn cost_is_clamped_into_bcrypt_range() {
        let h = BcryptHasher::new(1);
        let hash = h.hash("x").expect("hash");
        assert!(hash.starts_with("$2b$04$"));
    }
}
