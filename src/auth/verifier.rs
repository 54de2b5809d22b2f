use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::generators::{CodeGenerator, RandomCodeGenerator};
use crate::shared::AppError;

/// Wrong codes allowed per verification before it is discarded
const MAX_ATTEMPTS: u32 = 5;

/// Handle returned by phase one; phase two redeems it together with the code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingVerification {
    pub verification_id: String,
    pub phone_number: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity asserted by the provider after a successful verification
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityCredential {
    pub uid: String,
    pub phone_number: String,
}

/// Phone-verification identity provider
#[async_trait]
pub trait PhoneVerifier: Send + Sync {
    /// Sends a code to the phone and opens a pending verification
    async fn send_code(&self, phone_number: &str) -> Result<PendingVerification, AppError>;

    /// Redeems a pending verification
    async fn verify_code(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<IdentityCredential, AppError>;
}

struct PendingCode {
    phone_number: String,
    code: String,
    expires_at: DateTime<Utc>,
    failed_attempts: u32,
}

#[derive(Default)]
struct VerifierState {
    pending: HashMap<String, PendingCode>, // verification_id -> code
    uids: HashMap<String, String>,         // phone_number -> uid
}

/// In-process phone verifier. Codes are logged instead of sent by SMS.
pub struct InMemoryPhoneVerifier {
    generator: Arc<dyn CodeGenerator>,
    code_ttl: Duration,
    state: Mutex<VerifierState>,
}

impl InMemoryPhoneVerifier {
    pub fn new(code_ttl_secs: i64) -> Self {
        Self::with_generator(Arc::new(RandomCodeGenerator::new()), code_ttl_secs)
    }

    pub fn with_generator(generator: Arc<dyn CodeGenerator>, code_ttl_secs: i64) -> Self {
        Self {
            generator,
            code_ttl: Duration::seconds(code_ttl_secs),
            state: Mutex::new(VerifierState::default()),
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }
}

#[async_trait]
impl PhoneVerifier for InMemoryPhoneVerifier {
    #[instrument(skip(self))]
    async fn send_code(&self, phone_number: &str) -> Result<PendingVerification, AppError> {
        let now = Utc::now();
        let code = self.generator.generate();
        let pending = PendingVerification {
            verification_id: Uuid::new_v4().to_string(),
            phone_number: phone_number.to_string(),
            expires_at: now + self.code_ttl,
        };

        let mut state = self.state.lock().await;
        state.pending.retain(|_, p| p.expires_at > now);
        state.pending.insert(
            pending.verification_id.clone(),
            PendingCode {
                phone_number: phone_number.to_string(),
                code: code.clone(),
                expires_at: pending.expires_at,
                failed_attempts: 0,
            },
        );

        // Development stand-in for SMS delivery
        info!(
            verification_id = %pending.verification_id,
            code = %code,
            "Verification code issued"
        );

        Ok(pending)
    }

    #[instrument(skip(self, code))]
    async fn verify_code(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<IdentityCredential, AppError> {
        let mut state = self.state.lock().await;

        let Some(pending) = state.pending.get_mut(verification_id) else {
            warn!("Unknown verification id");
            return Err(AppError::Unauthorized(
                "Verification ID is unknown. Please resend code.".to_string(),
            ));
        };

        if pending.expires_at <= Utc::now() {
            state.pending.remove(verification_id);
            warn!("Verification code expired");
            return Err(AppError::Unauthorized(
                "Verification code expired. Please resend code.".to_string(),
            ));
        }

        if pending.code != code.trim() {
            pending.failed_attempts += 1;
            let attempts = pending.failed_attempts;
            warn!(attempts, "Verification code mismatch");

            if attempts >= MAX_ATTEMPTS {
                state.pending.remove(verification_id);
                return Err(AppError::Unauthorized(
                    "Too many attempts. Please resend code.".to_string(),
                ));
            }
            return Err(AppError::Unauthorized(
                "Invalid verification code".to_string(),
            ));
        }

        let phone_number = pending.phone_number.clone();
        state.pending.remove(verification_id);

        let uid = state
            .uids
            .entry(phone_number.clone())
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        debug!(uid = %uid, "Phone number verified");
        Ok(IdentityCredential { uid, phone_number })
    }
}
