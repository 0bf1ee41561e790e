use crate::config::AppConfig;
use crate::models::context::{Capability, RequestContext};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// LMS 宿主签发的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    #[serde(default)]
    pub capabilities: Vec<Capability>, // 当前上下文中的权限快照
    pub exp: usize,  // Expiration time (时间戳)
    pub iat: usize,  // Issued at (签发时间)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// 转换为请求上下文，sub 不是整数时返回 None
    pub fn into_context(self) -> Option<RequestContext> {
        let user_id = self.sub.parse::<i64>().ok()?;
        let capabilities: HashSet<Capability> = self.capabilities.into_iter().collect();
        Some(RequestContext::new(user_id, capabilities))
    }
}

pub struct JwtUtils;

impl JwtUtils {
    // 获取 JWT 密钥
    fn get_secret() -> String {
        AppConfig::get().jwt.secret.clone()
    }

    fn validation() -> Validation {
        let config = AppConfig::get();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.jwt.leeway;
        if let Some(issuer) = &config.jwt.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }

    // 验证 JWT token
    pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let secret = Self::get_secret();
        let decoding_key = DecodingKey::from_secret(secret.as_ref());

        decode::<Claims>(token, &decoding_key, &Self::validation())
            .map(|token_data| token_data.claims)
    }

    // 签发令牌，供宿主联调与测试使用
    pub fn generate_token(
        user_id: i64,
        capabilities: &[Capability],
        expiry: chrono::Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let config = AppConfig::get();
        let now = chrono::Utc::now();

        let claims = Claims {
            sub: user_id.to_string(),
            capabilities: capabilities.to_vec(),
            exp: (now + expiry).timestamp() as usize,
            iat: now.timestamp() as usize,
            iss: config.jwt.issuer.clone(),
        };

        let secret = Self::get_secret();
        let encoding_key = EncodingKey::from_secret(secret.as_ref());

        encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_into_context() {
        let claims = Claims {
            sub: "42".to_string(),
            capabilities: vec![Capability::Submit, Capability::PeerAssess],
            exp: 0,
            iat: 0,
            iss: None,
        };
        let ctx = claims.into_context().expect("numeric subject");
        assert_eq!(ctx.user_id, 42);
        assert!(ctx.has(Capability::Submit));
        assert!(!ctx.has(Capability::ManageActivity));
    }

    #[test]
    fn test_claims_with_bad_subject() {
        let claims = Claims {
            sub: "admin".to_string(),
            capabilities: vec![],
            exp: 0,
            iat: 0,
            iss: None,
        };
        assert!(claims.into_context().is_none());
    }
}
