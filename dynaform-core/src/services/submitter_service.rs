use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};
use tracing::{info, warn};

use crate::collaborators::Messenger;
use crate::database::entities::submitters;
use crate::errors::{SubmitterError, SubmitterResult};
use crate::services::otp_store::OtpStore;
use crate::services::ValidationService;

/// How long an issued passcode stays valid.
pub const OTP_TTL: Duration = Duration::from_secs(10 * 60);

/// Registration and passcode verification of end-users.
#[derive(Clone)]
pub struct SubmitterService {
    db: DatabaseConnection,
    otp_store: Arc<dyn OtpStore>,
    messenger: Option<Arc<dyn Messenger>>,
}

impl SubmitterService {
    pub fn new(
        db: DatabaseConnection,
        otp_store: Arc<dyn OtpStore>,
        messenger: Option<Arc<dyn Messenger>>,
    ) -> Self {
        Self {
            db,
            otp_store,
            messenger,
        }
    }

    /// Register on first contact. Returns the submitter and whether it was just created.
    pub async fn register(&self, identifier: &str) -> SubmitterResult<(submitters::Model, bool)> {
        get_or_create(&self.db, identifier).await
    }

    pub async fn find(&self, identifier: &str) -> SubmitterResult<submitters::Model> {
        find_active(&self.db, identifier)
            .await?
            .ok_or_else(|| SubmitterError::NotFound(identifier.to_string()))
    }

    /// Issue a six digit passcode and send it to the submitter. A delivery failure
    /// is reported but leaves the registration and the issued code in place.
    pub async fn issue_otp(&self, identifier: &str) -> SubmitterResult<()> {
        let submitter = self.find(identifier).await?;
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.otp_store
            .put(&submitter.identifier, code.clone(), OTP_TTL)
            .await;

        let Some(messenger) = &self.messenger else {
            warn!("No messenger configured; passcode for {} not delivered", submitter.identifier);
            return Err(SubmitterError::DeliveryFailed(
                "messaging is not configured".to_string(),
            ));
        };

        let body = format!("Your verification code is {}. It expires in 10 minutes.", code);
        messenger
            .send(&submitter.identifier, &body)
            .await
            .map_err(|e| {
                warn!("Passcode delivery to {} failed: {}", submitter.identifier, e);
                SubmitterError::DeliveryFailed(e.to_string())
            })?;

        info!("Issued passcode for submitter {}", submitter.id);
        Ok(())
    }

    /// Check a passcode. The stored code is consumed by the first attempt whether or not it matches.
    pub async fn verify_otp(&self, identifier: &str, code: &str) -> SubmitterResult<submitters::Model> {
        let submitter = self.find(identifier).await?;
        let stored = self.otp_store.get(&submitter.identifier).await;
        self.otp_store.delete(&submitter.identifier).await;

        match stored {
            None => Err(SubmitterError::OtpExpired),
            Some(expected) if expected != code.trim() => Err(SubmitterError::OtpMismatch),
            Some(_) => self.set_verified(submitter, None).await,
        }
    }

    /// Record a verification done elsewhere, e.g. by an identity provider.
    pub async fn mark_verified(
        &self,
        identifier: &str,
        verification_ref: &str,
    ) -> SubmitterResult<submitters::Model> {
        let submitter = self.find(identifier).await?;
        self.set_verified(submitter, Some(verification_ref.to_string())).await
    }

    async fn set_verified(
        &self,
        submitter: submitters::Model,
        verification_ref: Option<String>,
    ) -> SubmitterResult<submitters::Model> {
        let mut active: submitters::ActiveModel = submitter.into();
        active.is_verified = Set(true);
        if verification_ref.is_some() {
            active.verification_ref = Set(verification_ref);
        }
        let submitter = active.update(&self.db).await?;
        info!("Submitter {} verified", submitter.id);
        Ok(submitter)
    }
}

pub async fn find_active<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
) -> Result<Option<submitters::Model>, DbErr> {
    submitters::Entity::find()
        .filter(submitters::Column::Identifier.eq(ValidationService::normalize_identifier(identifier)))
        .filter(submitters::Column::IsActive.eq(true))
        .one(conn)
        .await
}

/// Validate the identifier and return its submitter, creating it on first contact.
/// A deactivated submitter is not revived.
pub async fn get_or_create<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
) -> SubmitterResult<(submitters::Model, bool)> {
    let identifier = ValidationService::validate_identifier(identifier)?;
    if let Some(existing) = submitters::Entity::find()
        .filter(submitters::Column::Identifier.eq(identifier.as_str()))
        .one(conn)
        .await?
    {
        if !existing.is_active {
            warn!("Refusing deactivated submitter {}", existing.id);
            return Err(SubmitterError::NotFound(identifier));
        }
        return Ok((existing, false));
    }

    let created = submitters::ActiveModel {
        identifier: Set(identifier),
        is_active: Set(true),
        is_verified: Set(false),
        verification_ref: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    info!("Registered submitter {} ({})", created.id, created.identifier);
    Ok((created, true))
}
