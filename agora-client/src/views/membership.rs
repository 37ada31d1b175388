//! Membership checkout: payment intent, card confirmation, upgrade.

use agora_core::{
    AgoraResult, AuthUid, PostQuota, RoleInfo, Subscription, ValidationError,
};

use super::helpers::{account_email, fetch_post_count, fetch_role, report_failure, require_session};
use crate::app::App;
use crate::keys::affected;
use crate::notifications::Toast;
use crate::payment::{CardHandle, PaymentConfirmation};

pub const UPGRADE_SUCCESS: &str = "Payment successful! You are now a Premium member with a Gold badge.";

#[derive(Debug, Clone, PartialEq)]
pub struct MembershipStatus {
    pub role: RoleInfo,
    pub post_count: u64,
    pub quota: PostQuota,
    pub price_usd: u32,
}

impl MembershipStatus {
    pub fn is_premium(&self) -> bool {
        self.role.subscription == Subscription::Premium
    }
}

#[derive(Debug, Clone)]
pub struct MembershipView {
    app: App,
}

impl MembershipView {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    pub fn price_usd(&self) -> u32 {
        self.app.config.membership.price_usd
    }

    pub async fn status(&self) -> AgoraResult<MembershipStatus> {
        let user = self.app.session.require("view your membership")?;
        let email = account_email(&user)?;
        let (role, count) = tokio::try_join!(
            fetch_role(&self.app, &email),
            fetch_post_count(&self.app, &user.uid)
        )?;
        Ok(MembershipStatus {
            quota: PostQuota::evaluate(count.count, &role),
            post_count: count.count,
            role: role.as_ref().clone(),
            price_usd: self.price_usd(),
        })
    }

    /// Pay and upgrade. The subscription only changes after the processor
    /// reports success and the backend accepts the upgrade.
    pub async fn checkout(&self, card: &CardHandle) -> AgoraResult<PaymentConfirmation> {
        let user = require_session(&self.app, "become a member")?;
        let email = account_email(&user)?;
        let result = self.pay_and_upgrade(card, &email, &user.uid).await;
        match &result {
            Ok(confirmation) => {
                tracing::info!(payment_intent = %confirmation.id, "membership upgraded");
                self.app.events.toast(Toast::success(UPGRADE_SUCCESS));
            }
            Err(err) => report_failure(&self.app, err, "Payment failed"),
        }
        result
    }

    async fn pay_and_upgrade(
        &self,
        card: &CardHandle,
        email: &str,
        uid: &AuthUid,
    ) -> AgoraResult<PaymentConfirmation> {
        let role = fetch_role(&self.app, email).await?;
        if role.subscription == Subscription::Premium {
            return Err(ValidationError::InvalidValue {
                field: "subscription".to_string(),
                reason: "You are already a Premium member".to_string(),
            }
            .into());
        }

        let intent = self.app.api.create_payment_intent(self.price_usd()).await?;
        let secret = intent.require_secret()?;
        let billing_email = intent.email.as_deref().unwrap_or(email);
        let confirmation = self
            .app
            .payments
            .confirm_card_payment(secret, card, Some(billing_email))
            .await?;
        confirmation.ensure_succeeded()?;

        self.app
            .cache
            .mutate(
                self.app.api.upgrade_membership(&confirmation.id),
                &affected::membership_upgraded(email, uid),
            )
            .await?;
        Ok(confirmation)
    }
}
