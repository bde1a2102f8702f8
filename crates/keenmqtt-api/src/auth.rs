// NDM challenge/response authentication
//
// `GET /auth` answers 200 while the session cookie is valid. Otherwise it
// answers 401 with a realm and a one-time challenge; the client proves the
// password with `sha256(challenge + md5(login:realm:password))`.

use md5::{Digest, Md5};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use sha2::Sha256;
use tracing::{debug, info};

use crate::client::RouterClient;
use crate::error::Error;
use crate::transport::RCI_CONTENT_TYPE;

const AUTH_PATH: &str = "/auth";
const REALM_HEADER: &str = "X-NDM-Realm";
const CHALLENGE_HEADER: &str = "X-NDM-Challenge";

/// Router login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub login: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: SecretString) -> Self {
        Self {
            login: login.into(),
            password,
        }
    }

    /// Compute the hashed password for a realm/challenge pair.
    pub fn challenge_response(&self, realm: &str, challenge: &str) -> String {
        let digest = Md5::digest(format!(
            "{}:{}:{}",
            self.login,
            realm,
            self.password.expose_secret()
        ));
        let ha1 = hex::encode(digest);

        let mut sha = Sha256::new();
        sha.update(challenge.as_bytes());
        sha.update(ha1.as_bytes());
        hex::encode(sha.finalize())
    }
}

impl RouterClient {
    /// Establish a session unless the current one is still valid.
    ///
    /// Concurrent callers are serialized; the second caller usually finds
    /// the session already restored and returns without logging in again.
    pub async fn authenticate(&self) -> Result<(), Error> {
        let _guard = self.auth_lock().lock().await;

        let url = self.base_url().join(AUTH_PATH)?;
        debug!("GET {}", url);

        let resp = self
            .http()
            .get(url.clone())
            .header(CONTENT_TYPE, RCI_CONTENT_TYPE)
            .send()
            .await
            .map_err(Error::Transport)?;

        match resp.status() {
            StatusCode::OK => {
                debug!("session still valid");
                return Ok(());
            }
            StatusCode::UNAUTHORIZED => {}
            status => {
                return Err(Error::Authentication {
                    message: format!("unexpected HTTP {status} from {AUTH_PATH}"),
                });
            }
        }

        let realm = header_value(&resp, REALM_HEADER)?;
        let challenge = header_value(&resp, CHALLENGE_HEADER)?;
        let credentials = self.credentials();

        let body = json!({
            "login": credentials.login,
            "password": credentials.challenge_response(&realm, &challenge),
        });

        debug!("POST {}", url);
        let resp = self
            .http()
            .post(url)
            .header(CONTENT_TYPE, RCI_CONTENT_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        info!(realm = %realm, "authenticated with router");
        Ok(())
    }
}

fn header_value(resp: &reqwest::Response, name: &str) -> Result<String, Error> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| Error::Authentication {
            message: format!("missing {name} header in {AUTH_PATH} response"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_response_matches_known_vector() {
        let credentials = Credentials::new("admin", "secret".to_string().into());

        let hashed = credentials.challenge_response("Keenetic Giga", "ABCDEF0123456789");

        assert_eq!(
            hashed,
            "5c269cb91791bd81a932b6b9e42ea7aadf458d8fd81a486fea22d696fc210e8c"
        );
    }

    #[test]
    fn challenge_response_depends_on_challenge() {
        let credentials = Credentials::new("admin", "secret".to_string().into());

        let first = credentials.challenge_response("realm", "one");
        let second = credentials.challenge_response("realm", "two");

        assert_ne!(first, second);
        assert_eq!(first.len(), 64);
    }
}
