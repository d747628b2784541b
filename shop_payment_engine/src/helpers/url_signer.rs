//! Signed, time-limited links.
//!
//! A link is signed by appending the issue time (`issued=<unix seconds>`) and then an HMAC-SHA256 of everything up to
//! that point (`hash=<base64url>`). Changing any character of the link, including the issue time, invalidates it.
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;
use shop_common::Secret;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const HASH_PARAM: &str = "&hash=";
const ISSUED_PARAM: &str = "issued=";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("The link is not signed")]
    MissingSignature,
    #[error("The link signature is invalid")]
    InvalidSignature,
    #[error("The link does not carry a valid issue time")]
    MissingTimestamp,
    #[error("The link has expired")]
    Expired,
    #[error("The signing key is unusable")]
    InvalidKey,
}

#[derive(Clone)]
pub struct UrlSigner {
    secret: Secret<String>,
}

impl UrlSigner {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, SignerError> {
        HmacSha256::new_from_slice(self.secret.reveal().as_bytes()).map_err(|_| SignerError::InvalidKey)
    }

    /// Signs `url` with the current time as the issue time.
    pub fn sign(&self, url: &str) -> Result<String, SignerError> {
        self.sign_at(url, Utc::now())
    }

    pub fn sign_at(&self, url: &str, issued: DateTime<Utc>) -> Result<String, SignerError> {
        let separator = if url.contains('?') { '&' } else { '?' };
        let unsigned = format!("{url}{separator}{ISSUED_PARAM}{}", issued.timestamp());
        let mut mac = self.mac()?;
        mac.update(unsigned.as_bytes());
        let hash = base64::encode_config(mac.finalize().into_bytes(), base64::URL_SAFE_NO_PAD);
        Ok(format!("{unsigned}{HASH_PARAM}{hash}"))
    }

    /// Checks the signature of a link in constant time. The issue time is not checked here; see [`Self::expired`].
    pub fn verify(&self, signed_url: &str) -> Result<(), SignerError> {
        let (unsigned, hash) = signed_url.rsplit_once(HASH_PARAM).ok_or(SignerError::MissingSignature)?;
        let signature =
            base64::decode_config(hash, base64::URL_SAFE_NO_PAD).map_err(|_| SignerError::InvalidSignature)?;
        let mut mac = self.mac()?;
        mac.update(unsigned.as_bytes());
        mac.verify_slice(&signature).map_err(|_| SignerError::InvalidSignature)?;
        trace!("🔐️ Link signature verified");
        Ok(())
    }

    /// Returns true if the link was issued more than `minutes` ago.
    pub fn expired(&self, signed_url: &str, minutes: i64) -> Result<bool, SignerError> {
        self.expired_at(signed_url, minutes, Utc::now())
    }

    pub fn expired_at(&self, signed_url: &str, minutes: i64, now: DateTime<Utc>) -> Result<bool, SignerError> {
        let issued = issued_at(signed_url)?;
        Ok(now - issued > Duration::minutes(minutes))
    }

    /// Verifies the signature and then the age of the link.
    pub fn check(&self, signed_url: &str, minutes: i64) -> Result<(), SignerError> {
        self.verify(signed_url)?;
        if self.expired(signed_url, minutes)? {
            return Err(SignerError::Expired);
        }
        Ok(())
    }
}

fn issued_at(signed_url: &str) -> Result<DateTime<Utc>, SignerError> {
    let unsigned = signed_url.rsplit_once(HASH_PARAM).map(|(u, _)| u).unwrap_or(signed_url);
    let (_, issued) = unsigned.rsplit_once(ISSUED_PARAM).ok_or(SignerError::MissingTimestamp)?;
    let seconds = issued.parse::<i64>().map_err(|_| SignerError::MissingTimestamp)?;
    DateTime::from_timestamp(seconds, 0).ok_or(SignerError::MissingTimestamp)
}
