use serde::{Deserialize, Serialize};

/// JWT claims structure identifying a signed-in player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub player_id: String,
    pub phone_number: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Request payload for phase one of phone verification
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub phone_number: String,
}

/// Request payload for phase two of phone verification
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub verification_id: String,
    pub code: String,
}

/// Response for a completed sign-in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub token: String, // The JWT session token
    pub player_id: String,
    pub first_login: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_claims_serialization() {
        let claims = SessionClaims {
            player_id: "p1".to_string(),
            phone_number: "+254712345678".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("p1"));

        let deserialized: SessionClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }
}
