//! # Signed URL Generation
//!
//! A signed URL grants temporary access to one object with a fixed
//! disposition. The object key travels base64-encoded in the path, so the
//! URL needs no further escaping.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::errors::{StorageError, StorageResult};

/// How a client should present the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Save as a file
    Attachment,
    /// Render in the browser
    Inline,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Attachment => "attachment",
            Disposition::Inline => "inline",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Disposition {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attachment" => Ok(Disposition::Attachment),
            "inline" => Ok(Disposition::Inline),
            _ => Err(StorageError::InvalidSignature),
        }
    }
}

/// Signed URL generator
pub struct SignedUrlGenerator {
    secret: Vec<u8>,
    default_expiry: Duration,
    base_url: String,
}

impl fmt::Debug for SignedUrlGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedUrlGenerator")
            .field("default_expiry", &self.default_expiry)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SignedUrlGenerator {
    /// Create a new generator issuing URLs under `base_url`
    pub fn new(secret: &[u8], base_url: impl Into<String>) -> Self {
        Self {
            secret: secret.to_vec(),
            default_expiry: Duration::hours(1),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a generator with a random secret; URLs die with the process
    pub fn ephemeral(base_url: impl Into<String>) -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(&secret, base_url)
    }

    /// Override the default lifetime of issued URLs
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.default_expiry = expiry;
        self
    }

    pub fn default_expiry(&self) -> Duration {
        self.default_expiry
    }

    /// Generate a signed URL
    pub fn generate(
        &self,
        key: &str,
        disposition: Disposition,
        expires_at: Option<DateTime<Utc>>,
    ) -> SignedUrl {
        let expires = expires_at.unwrap_or_else(|| Utc::now() + self.default_expiry);
        let expires_at = expires.timestamp();
        let signature = self.sign(key, expires_at, disposition);

        SignedUrl {
            key: key.to_string(),
            expires_at,
            disposition,
            signature,
        }
    }

    /// Verify a signed URL
    pub fn verify(&self, url: &SignedUrl) -> StorageResult<()> {
        // Check expiry
        if Utc::now().timestamp() > url.expires_at {
            return Err(StorageError::UrlExpired);
        }

        // Verify signature
        let expected = self.sign(&url.key, url.expires_at, url.disposition);
        if !bool::from(expected.as_bytes().ct_eq(url.signature.as_bytes())) {
            return Err(StorageError::InvalidSignature);
        }

        Ok(())
    }

    /// Full URL for a signed object
    pub fn to_url(&self, url: &SignedUrl) -> String {
        format!(
            "{}/object/{}?expires={}&disposition={}&signature={}",
            self.base_url,
            URL_SAFE_NO_PAD.encode(url.key.as_bytes()),
            url.expires_at,
            url.disposition,
            url.signature
        )
    }

    fn sign(&self, key: &str, expires_at: i64, disposition: Disposition) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(format!("{}\n{}\n{}", key, expires_at, disposition).as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// A signed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub key: String,
    /// Unix seconds
    pub expires_at: i64,
    pub disposition: Disposition,
    pub signature: String,
}

impl SignedUrl {
    /// Rebuild from the pieces of an incoming `/object/{token}` request
    pub fn from_parts(
        encoded_key: &str,
        expires_at: i64,
        disposition: &str,
        signature: &str,
    ) -> StorageResult<Self> {
        let key = URL_SAFE_NO_PAD
            .decode(encoded_key)
            .ok()
            .and_then(|b| String::from_utf8(b).ok())
            .ok_or(StorageError::InvalidSignature)?;

        Ok(Self {
            key,
            expires_at,
            disposition: disposition.parse()?,
            signature: signature.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> SignedUrlGenerator {
        SignedUrlGenerator::new(b"test-secret", "https://files.example.com/")
    }

    #[test]
    fn test_generate_and_verify() {
        let generator = generator();

        let signed = generator.generate("avatars/123.png", Disposition::Inline, None);
        assert!(!signed.signature.is_empty());
        assert!(generator.verify(&signed).is_ok());
    }

    #[test]
    fn test_default_expiry_is_one_hour() {
        let generator = generator();
        let signed = generator.generate("a.png", Disposition::Attachment, None);

        let remaining = signed.expires_at - Utc::now().timestamp();
        assert!((3595..=3600).contains(&remaining));
    }

    #[test]
    fn test_expired_url() {
        let generator = generator();
        let expired = generator.generate(
            "file.json",
            Disposition::Attachment,
            Some(Utc::now() - Duration::hours(1)),
        );

        assert!(matches!(generator.verify(&expired), Err(StorageError::UrlExpired)));
    }

    #[test]
    fn test_invalid_signature() {
        let generator = generator();
        let mut signed = generator.generate("file.json", Disposition::Attachment, None);
        signed.signature = "bad-signature".to_string();

        assert!(matches!(generator.verify(&signed), Err(StorageError::InvalidSignature)));
    }

    #[test]
    fn test_disposition_is_signed() {
        let generator = generator();
        let mut signed = generator.generate("file.json", Disposition::Inline, None);
        signed.disposition = Disposition::Attachment;

        assert!(generator.verify(&signed).is_err());
    }

    #[test]
    fn test_other_secret_rejects() {
        let signed = generator().generate("file.json", Disposition::Inline, None);
        let other = SignedUrlGenerator::ephemeral("http://x");

        assert!(matches!(other.verify(&signed), Err(StorageError::InvalidSignature)));
    }

    #[test]
    fn test_to_url_round_trips_through_parts() {
        let generator = generator();
        let signed = generator.generate("docs/report 1.pdf", Disposition::Attachment, None);

        let url = generator.to_url(&signed);
        assert!(url.starts_with("https://files.example.com/object/"));
        assert!(url.contains("disposition=attachment"));

        let token = url
            .trim_start_matches("https://files.example.com/object/")
            .split('?')
            .next()
            .unwrap();
        let rebuilt =
            SignedUrl::from_parts(token, signed.expires_at, "attachment", &signed.signature).unwrap();
        assert_eq!(rebuilt, signed);
        assert!(generator.verify(&rebuilt).is_ok());
    }
}
