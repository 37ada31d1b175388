//! Profile page: account details, badge, name and photo updates.

use agora_core::{require_text, AgoraError, AgoraResult, Badge, RoleInfo};

use super::helpers::{account_email, announce, fetch_role, report_failure, require_session};
use crate::app::App;
use crate::identity::ProfileUpdate;
use crate::keys::affected;
use crate::session::UserIdentity;
use crate::types::{ProfileFields, ProfileUpdateBody};
use crate::upload::ImageFile;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub identity: UserIdentity,
    pub role: RoleInfo,
    pub badge: Badge,
}

#[derive(Debug, Clone)]
pub struct ProfileView {
    app: App,
}

impl ProfileView {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    pub async fn load(&self) -> AgoraResult<ProfileSummary> {
        let identity = self.app.session.require("view your profile")?;
        let role = fetch_role(&self.app, &account_email(&identity)?).await?;
        Ok(ProfileSummary {
            badge: role.subscription.badge(),
            role: role.as_ref().clone(),
            identity,
        })
    }

    /// Update the display name and/or photo, in the identity provider first
    /// and then in the backend's user record.
    pub async fn update(&self, name: Option<&str>, photo: Option<ImageFile>) -> AgoraResult<UserIdentity> {
        let user = require_session(&self.app, "update your profile")?;
        let email = account_email(&user)?;
        let display_name = name
            .map(|n| require_text("name", n).map(str::to_string))
            .transpose()?;

        let photo_url = match photo {
            Some(image) => {
                image.validate(self.app.config.upload.max_bytes)?;
                match self.app.uploader.upload(image).await {
                    Ok(url) => Some(url),
                    Err(err) => {
                        report_failure(&self.app, &err, "Failed to upload photo");
                        return Err(err);
                    }
                }
            }
            None => None,
        };

        let update = ProfileUpdate {
            display_name: display_name.clone(),
            photo_url: photo_url.clone(),
        };
        let body = ProfileUpdateBody {
            email: email.clone(),
            updates: ProfileFields {
                name: display_name,
                photo_url,
            },
        };

        let result = async {
            let identity = self.app.session.update_profile(&update).await?;
            self.app
                .cache
                .mutate(
                    self.app.api.update_profile(&body),
                    &affected::profile_updated(&email),
                )
                .await?;
            Ok::<_, AgoraError>(identity)
        }
        .await;
        announce(&self.app, result, "Profile updated successfully!", "Failed to update profile")
    }
}
