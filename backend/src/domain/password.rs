//! One-way password hashing with Argon2id.
//!
//! Digests are PHC strings carrying the algorithm identifier and cost
//! parameters, so they stay verifiable after a future cost change without
//! forcing a rehash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::password_hash::{PasswordHasher as _, PasswordVerifier as _};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::debug;

/// Minimum permitted iteration count.
pub const MIN_TIME_COST: u32 = 4;
/// Minimum permitted memory cost, in KiB (64 MiB).
pub const MIN_MEMORY_COST_KIB: u32 = 64 * 1024;
/// Minimum permitted lane count.
pub const MIN_PARALLELISM: u32 = 4;

/// Errors raised while configuring or running the hasher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordHashError {
    /// A cost parameter fell below its required floor.
    #[error("{parameter} must be at least {floor}")]
    CostBelowFloor {
        parameter: &'static str,
        floor: u32,
    },
    /// The underlying algorithm rejected the configuration or input.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
}

/// Argon2id cost parameters. Floors are enforced, not defaults: a
/// configuration below [`MIN_TIME_COST`], [`MIN_MEMORY_COST_KIB`], or
/// [`MIN_PARALLELISM`] is rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherParams {
    time_cost: u32,
    memory_cost_kib: u32,
    parallelism: u32,
}

impl HasherParams {
    /// Validate and construct cost parameters.
    pub fn new(
        time_cost: u32,
        memory_cost_kib: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordHashError> {
        if time_cost < MIN_TIME_COST {
            return Err(PasswordHashError::CostBelowFloor {
                parameter: "time cost",
                floor: MIN_TIME_COST,
            });
        }
        if memory_cost_kib < MIN_MEMORY_COST_KIB {
            return Err(PasswordHashError::CostBelowFloor {
                parameter: "memory cost (KiB)",
                floor: MIN_MEMORY_COST_KIB,
            });
        }
        if parallelism < MIN_PARALLELISM {
            return Err(PasswordHashError::CostBelowFloor {
                parameter: "parallelism",
                floor: MIN_PARALLELISM,
            });
        }
        Ok(Self {
            time_cost,
            memory_cost_kib,
            parallelism,
        })
    }

    /// Iteration count.
    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    /// Memory cost in KiB.
    pub fn memory_cost_kib(&self) -> u32 {
        self.memory_cost_kib
    }

    /// Lane count.
    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }
}

impl Default for HasherParams {
    fn default() -> Self {
        Self {
            time_cost: MIN_TIME_COST,
            memory_cost_kib: MIN_MEMORY_COST_KIB,
            parallelism: MIN_PARALLELISM,
        }
    }
}

/// Memory-hard password hasher.
#[derive(Clone)]
pub struct PasswordHasher {
    argon: Argon2<'static>,
}

impl PasswordHasher {
    /// Build a hasher with the given cost parameters.
    pub fn new(params: HasherParams) -> Result<Self, PasswordHashError> {
        let params = Params::new(
            params.memory_cost_kib,
            params.time_cost,
            params.parallelism,
            None,
        )
        .map_err(|error| PasswordHashError::Hashing {
            message: error.to_string(),
        })?;
        Ok(Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password into a PHC digest with a fresh salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|error| PasswordHashError::Hashing {
                message: error.to_string(),
            })
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// Verification honours the parameters embedded in the digest rather
    /// than this hasher's configuration. A malformed digest is treated as a
    /// non-match and never raises.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            debug!("rejected malformed password digest");
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HasherParams::default()).expect("floor params are valid")
    }

    #[rstest]
    fn round_trip_verifies(hasher: PasswordHasher) {
        let digest = hasher.hash("correct horse battery staple").expect("hashes");
        assert!(hasher.verify("correct horse battery staple", &digest));
        assert!(!hasher.verify("correct horse battery stable", &digest));
    }

    #[rstest]
    fn digests_embed_algorithm_and_cost_parameters(hasher: PasswordHasher) {
        let digest = hasher.hash("hunter2").expect("hashes");
        assert!(digest.starts_with("$argon2id$"));
        assert!(digest.contains("m=65536,t=4,p=4"));
    }

    #[rstest]
    fn salts_differ_between_calls(hasher: PasswordHasher) {
        let first = hasher.hash("hunter2").expect("hashes");
        let second = hasher.hash("hunter2").expect("hashes");
        assert_ne!(first, second);
        assert!(hasher.verify("hunter2", &first));
        assert!(hasher.verify("hunter2", &second));
    }

    #[rstest]
    #[case("")]
    #[case("not a digest")]
    #[case("$argon2id$v=19$truncated")]
    fn malformed_digests_verify_false_without_panicking(
        hasher: PasswordHasher,
        #[case] digest: &str,
    ) {
        assert!(!hasher.verify("hunter2", digest));
    }

    #[rstest]
    #[case(3, MIN_MEMORY_COST_KIB, MIN_PARALLELISM)]
    #[case(MIN_TIME_COST, 1024, MIN_PARALLELISM)]
    #[case(MIN_TIME_COST, MIN_MEMORY_COST_KIB, 1)]
    fn sub_floor_parameters_are_rejected(
        #[case] time_cost: u32,
        #[case] memory_cost_kib: u32,
        #[case] parallelism: u32,
    ) {
        assert!(matches!(
            HasherParams::new(time_cost, memory_cost_kib, parallelism),
            Err(PasswordHashError::CostBelowFloor { .. })
        ));
    }
}
