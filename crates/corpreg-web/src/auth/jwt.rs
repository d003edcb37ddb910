use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
    /// Issuance of this token; bounds how long it may be refreshed.
    pub orig_iat: u64,
}

/// Signs and verifies bearer tokens.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &Claims) -> anyhow::Result<String>;

    /// Checks the signature and decodes the claims. Expiry is only enforced
    /// when `check_expiry` is set.
    fn verify(&self, token: &str, check_expiry: bool) -> anyhow::Result<Claims>;
}

/// HMAC-SHA256 JWTs via `jsonwebtoken`, with no expiry leeway.
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    fn verify(&self, token: &str, check_expiry: bool) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = check_expiry;

        let token_data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: u64) -> Claims {
        Claims {
            sub: "admin".to_string(),
            exp,
            orig_iat: exp.saturating_sub(3600),
        }
    }

    fn now() -> u64 {
        jsonwebtoken::get_current_timestamp()
    }

    #[test]
    fn signed_token_verifies() {
        let signer = JwtSigner::new("a-test-secret-that-is-long-enough");
        let c = claims(now() + 600);
        let token = signer.sign(&c).unwrap();
        assert_eq!(signer.verify(&token, true).unwrap(), c);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtSigner::new("secret-one-secret-one-secret-one")
            .sign(&claims(now() + 600))
            .unwrap();
        let other = JwtSigner::new("secret-two-secret-two-secret-two");
        assert!(other.verify(&token, true).is_err());
        assert!(other.verify(&token, false).is_err());
    }

    #[test]
    fn expiry_is_enforced_only_when_asked() {
        let signer = JwtSigner::new("a-test-secret-that-is-long-enough");
        let token = signer.sign(&claims(now() - 10)).unwrap();
        assert!(signer.verify(&token, true).is_err());
        assert_eq!(signer.verify(&token, false).unwrap().sub, "admin");
    }

    #[test]
    fn garbage_is_rejected() {
        let signer = JwtSigner::new("a-test-secret-that-is-long-enough");
        assert!(signer.verify("not.a.jwt", false).is_err());
        assert!(signer.verify("", false).is_err());
    }
}
