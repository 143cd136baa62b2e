use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::collaborators::{AssetStore, GatewayOrder, PaymentGateway};
use crate::common::db_errors::{log_db_error, DbErrorKind};
use crate::database::entities::{forms, payments};
use crate::errors::{PaymentError, PaymentResult, SubmissionError};
use crate::form_types::{minor_to_decimal, RawSubmission};
use crate::services::signature;
use crate::services::submission_validator::{SubmissionValidator, ValidationMode};
use crate::services::submission_writer::{
    ensure_no_submission, new_submission_id, persist_values, resolve_files,
};
use crate::services::submitter_service::find_active;
use crate::services::{FormService, SchemaAssembler};

#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// Shared secret used by the gateway to sign callbacks.
    pub key_secret: String,
    pub currency: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            key_secret: String::new(),
            currency: "INR".to_string(),
        }
    }
}

/// Gateway callback plus the values the submitter filled in.
#[derive(Debug, Clone)]
pub struct PaidSubmission {
    pub form_id: i32,
    pub identifier: String,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub raw: RawSubmission,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidReceipt {
    pub submission_id: String,
    pub payment_record_id: i32,
    pub amount: Decimal,
    pub currency: String,
    pub value_count: usize,
}

/// Keeps payment capture and submission persistence atomic.
#[derive(Clone)]
pub struct PaymentCoordinator {
    db: DatabaseConnection,
    assets: Arc<dyn AssetStore>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    settings: PaymentSettings,
}

impl PaymentCoordinator {
    pub fn new(
        db: DatabaseConnection,
        assets: Arc<dyn AssetStore>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            db,
            assets,
            gateway,
            settings,
        }
    }

    /// Open a gateway order for a fee-bearing form.
    pub async fn create_order(&self, form_id: i32) -> PaymentResult<GatewayOrder> {
        let form = FormService::find_active_form(&self.db, form_id)
            .await?
            .ok_or(PaymentError::FormNotFound(form_id))?;
        if !form.requires_payment() {
            return Err(PaymentError::NoFeeConfigured(form_id));
        }
        let Some(gateway) = &self.gateway else {
            return Err(PaymentError::Gateway(
                "payment gateway is not configured".to_string(),
            ));
        };

        let receipt = format!("receipt_{}", Uuid::new_v4().simple());
        let order = gateway
            .create_order(form.fee(), &self.settings.currency, &receipt)
            .await
            .map_err(|e| {
                error!("Gateway order creation for form {} failed: {}", form_id, e);
                PaymentError::Gateway(e.to_string())
            })?;

        info!(
            "Created order {} for form {} ({} {})",
            order.order_id,
            form_id,
            minor_to_decimal(order.amount_minor),
            order.currency
        );
        Ok(order)
    }

    /// Verify the gateway signature, then store the submission and its payment
    /// record in one transaction. Any failure leaves no rows behind.
    pub async fn submit_paid(&self, paid: PaidSubmission) -> PaymentResult<PaidReceipt> {
        if self.settings.key_secret.is_empty() {
            warn!("Refusing paid submission for form {}: no payment secret", paid.form_id);
            return Err(PaymentError::Gateway(
                "payment secret not configured".to_string(),
            ));
        }

        let submitter = find_active(&self.db, &paid.identifier)
            .await?
            .ok_or_else(|| PaymentError::SubmitterNotFound(paid.identifier.clone()))?;

        if !signature::verify(
            &self.settings.key_secret,
            &paid.order_id,
            &paid.payment_id,
            &paid.signature,
        ) {
            warn!(
                "Signature mismatch for order {} (form {})",
                paid.order_id, paid.form_id
            );
            return Err(PaymentError::InvalidSignature);
        }
        ensure_payment_unused(&self.db, &paid.payment_id).await?;

        let schema = SchemaAssembler::load(&self.db, paid.form_id, None)
            .await?
            .ok_or(PaymentError::FormNotFound(paid.form_id))?;
        let entries =
            SubmissionValidator::validate(&schema, &paid.raw, ValidationMode::Complete).await?;
        if entries.is_empty() {
            return Err(SubmissionError::EmptySubmission.into());
        }

        let values = resolve_files(self.assets.as_ref(), entries).await?;

        let txn = self.db.begin().await?;
        let form = forms::Entity::find_by_id(paid.form_id)
            .one(&txn)
            .await?
            .ok_or(PaymentError::FormNotFound(paid.form_id))?;
        if form.single_submission {
            ensure_no_submission(&txn, paid.form_id, submitter.id).await?;
        }

        let submission_id = new_submission_id();
        let value_count =
            persist_values(&txn, paid.form_id, submitter.id, &submission_id, &values).await?;

        let amount_minor = form.fee();

        let record = payments::ActiveModel {
            form_id: Set(paid.form_id),
            submission_id: Set(submission_id.clone()),
            submitter_id: Set(submitter.id),
            gateway_order_id: Set(paid.order_id.clone()),
            gateway_payment_id: Set(paid.payment_id.clone()),
            gateway_signature: Set(paid.signature.clone()),
            amount_minor: Set(amount_minor),
            currency: Set(self.settings.currency.clone()),
            status: Set(payments::STATUS_CAPTURED.to_string()),
            paid_at: Set(Utc::now()),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| match DbErrorKind::from_db_err(&e) {
            DbErrorKind::UniqueViolation => PaymentError::AlreadyUsed(paid.payment_id.clone()),
            _ => log_db_error("insert payment", e).into(),
        })?;

        txn.commit().await?;

        info!(
            "Captured payment {} for submission {} on form {}",
            paid.payment_id, submission_id, paid.form_id
        );
        Ok(PaidReceipt {
            submission_id,
            payment_record_id: record.id,
            amount: minor_to_decimal(amount_minor),
            currency: record.currency,
            value_count,
        })
    }
}

/// A gateway payment id pays for at most one submission.
async fn ensure_payment_unused<C: ConnectionTrait>(conn: &C, payment_id: &str) -> PaymentResult<()> {
    let used = payments::Entity::find()
        .filter(payments::Column::GatewayPaymentId.eq(payment_id))
        .count(conn)
        .await?;
    if used > 0 {
        warn!("Payment {} was already used for a submission", payment_id);
        return Err(PaymentError::AlreadyUsed(payment_id.to_string()));
    }
    Ok(())
}
