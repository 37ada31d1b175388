//! Membership rules: post quota for free accounts and checkout pricing.

use crate::entities::RoleInfo;
use crate::enums::Subscription;
use crate::error::ValidationError;

/// Posts a free account may create before it must upgrade.
pub const FREE_POST_LIMIT: u64 = 5;

/// Membership price in whole US dollars.
pub const MEMBERSHIP_PRICE_USD: u32 = 10;

/// Whether an account may create another post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostQuota {
    Unlimited,
    Remaining(u64),
    Exhausted,
}

impl PostQuota {
    /// Premium members and admins are never limited.
    pub fn evaluate(post_count: u64, account: &RoleInfo) -> Self {
        if account.role.is_admin() || account.subscription == Subscription::Premium {
            return PostQuota::Unlimited;
        }
        match FREE_POST_LIMIT.checked_sub(post_count) {
            Some(0) | None => PostQuota::Exhausted,
            Some(left) => PostQuota::Remaining(left),
        }
    }

    pub fn allows_post(&self) -> bool {
        !matches!(self, PostQuota::Exhausted)
    }

    pub fn ensure_allows_post(&self) -> Result<(), ValidationError> {
        if self.allows_post() {
            Ok(())
        } else {
            Err(ValidationError::LimitReached {
                limit: FREE_POST_LIMIT,
                reason: format!(
                    "You've reached the maximum of {} posts. Become a Premium member to post more!",
                    FREE_POST_LIMIT
                ),
            })
        }
    }
}

/// Convert a whole-dollar price into the smallest currency unit.
pub fn price_in_cents(price_usd: u32) -> u64 {
    u64::from(price_usd) * 100
}
