//! TOTP code generation for the GitHub two-factor prompt.

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use totp_rs::{Algorithm, Secret, TOTP};

use crate::clock::Clock;

/// Generator for the codes GitHub expects: RFC 6238 with SHA-1, 6 digits,
/// and a 30 second step.
pub struct TotpGenerator {
    totp: TOTP,
}

impl TotpGenerator {
    /// Build a generator from a base32-encoded shared secret.
    ///
    /// Whitespace is tolerated and case is normalized, so secrets can be
    /// pasted straight from the provider's setup page.
    pub fn from_base32(secret: &SecretString) -> Result<Self> {
        let normalized = secret
            .expose_secret()
            .split_whitespace()
            .collect::<String>()
            .to_uppercase();

        let bytes = Secret::Encoded(normalized)
            .to_bytes()
            .map_err(|e| anyhow::anyhow!("Invalid base32 TOTP secret: {e:?}"))?;

        // new_unchecked: GitHub secrets are shorter than the RFC 4226
        // recommended minimum that TOTP::new enforces.
        let totp = TOTP::new_unchecked(Algorithm::SHA1, 6, 1, 30, bytes);

        Ok(Self { totp })
    }

    /// The 6-digit code for the clock's current time step.
    pub fn generate(&self, clock: &dyn Clock) -> String {
        self.totp.generate(clock.unix_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    /// Base32 encoding of the RFC 6238 SHA-1 test key "12345678901234567890".
    const RFC_TEST_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn generator(secret: &str) -> TotpGenerator {
        TotpGenerator::from_base32(&SecretString::from(secret.to_string())).unwrap()
    }

    #[test]
    fn rfc6238_sha1_vectors() {
        // Last 6 digits of the RFC 6238 Appendix B expected values.
        let totp = generator(RFC_TEST_SECRET);
        assert_eq!(totp.generate(&FixedClock::at_unix(59)), "287082");
        assert_eq!(totp.generate(&FixedClock::at_unix(1111111109)), "081804");
        assert_eq!(totp.generate(&FixedClock::at_unix(1234567890)), "005924");
    }

    #[test]
    fn code_is_stable_within_a_step() {
        let totp = generator(RFC_TEST_SECRET);
        assert_eq!(
            totp.generate(&FixedClock::at_unix(30)),
            totp.generate(&FixedClock::at_unix(59))
        );
    }

    #[test]
    fn secret_normalization_tolerates_paste_formats() {
        let spaced = generator("gezd gnbv gy3t qojq gezd gnbv gy3t qojq");
        let plain = generator(RFC_TEST_SECRET);
        assert_eq!(
            spaced.generate(&FixedClock::at_unix(59)),
            plain.generate(&FixedClock::at_unix(59))
        );
    }

    #[test]
    fn short_provider_secret_accepted() {
        // 16-character secrets (80 bits) are what GitHub actually issues.
        let totp = generator("JBSWY3DPEHPK3PXP");
        let code = totp.generate(&FixedClock::at_unix(59));
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn invalid_base32_rejected() {
        assert!(TotpGenerator::from_base32(&SecretString::from("not base32!".to_string())).is_err());
    }
}
