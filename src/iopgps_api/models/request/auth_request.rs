use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/auth/`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthRequest {
    pub appid: String,
    pub time: String,
    pub signature: String,
}

impl AuthRequest {
    /// Builds a request signed with `md5(md5(key) + time)`, both digests lowercase hex.
    pub fn signed(appid: &str, key: &str, timestamp: i64) -> Self {
        let time = timestamp.to_string();
        Self {
            appid: appid.to_string(),
            signature: sign(key, &time),
            time,
        }
    }
}

fn md5_hex(input: &[u8]) -> String {
    hex::encode(Md5::digest(input))
}

pub fn sign(key: &str, time: &str) -> String {
    let key_digest = md5_hex(key.as_bytes());
    md5_hex(format!("{}{}", key_digest, time).as_bytes())
}
