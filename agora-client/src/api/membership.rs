use agora_core::{AgoraResult, Subscription};
use reqwest::Method;

use super::ApiClient;
use crate::payment::PaymentIntentSecret;
use crate::types::{PaymentIntentBody, UpgradeBody};

impl ApiClient {
    pub async fn create_payment_intent(&self, price_usd: u32) -> AgoraResult<PaymentIntentSecret> {
        let body = PaymentIntentBody { price: price_usd };
        self.send_json(Method::POST, &["create-payment-intent"], &body)
            .await
    }

    pub async fn upgrade_membership(&self, payment_intent_id: &str) -> AgoraResult<()> {
        let body = UpgradeBody {
            payment_intent_id: payment_intent_id.to_string(),
            subscription: Subscription::Premium,
        };
        self.send_unit(Method::POST, &["user", "membership", "upgrade"], Some(&body))
            .await
    }
}
