use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, MIN_PASSWORD_LEN};
use crate::db::models::{ProfileSnapshot, User};
use crate::error::{AppError, AppResult};
use crate::profile::patch::{Patch, ProfileChanges, ProfileUpdate};
use crate::users::repository::UserRepository;

/// Which profile fields an update changed. Serialized as a field-name →
/// bool map for the client's "updated" badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDiff {
    pub first_name: bool,
    pub last_name: bool,
    pub nickname: bool,
    pub email: bool,
    pub date_of_birth: bool,
    pub profile_picture: bool,
    pub is_anonymous: bool,
    pub password: bool,
}

impl ProfileDiff {
    /// Diff of `changes` against the stored record they are about to replace.
    pub fn against_stored(user: &User, changes: &ProfileChanges) -> Self {
        ProfileDiff {
            first_name: changes.first_name.changes(user.first_name.as_ref()),
            last_name: changes.last_name.changes(user.last_name.as_ref()),
            nickname: changes.nickname.changes(user.nickname.as_ref()),
            email: false,
            date_of_birth: changes.date_of_birth.changes(user.date_of_birth.as_ref()),
            profile_picture: changes
                .profile_picture
                .changes(user.profile_picture.as_ref()),
            is_anonymous: changes
                .is_anonymous
                .is_some_and(|value| value != user.is_anonymous),
            password: changes.password_hash.is_some(),
        }
    }

    pub fn any(&self) -> bool {
        self.changed_fields().next().is_some()
    }

    /// Wire names of the changed fields.
    pub fn changed_fields(&self) -> impl Iterator<Item = &'static str> {
        [
            ("firstName", self.first_name),
            ("lastName", self.last_name),
            ("nickname", self.nickname),
            ("email", self.email),
            ("dateOfBirth", self.date_of_birth),
            ("profilePicture", self.profile_picture),
            ("isAnonymous", self.is_anonymous),
            ("password", self.password),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub profile: ProfileSnapshot,
    pub changed: ProfileDiff,
}

/// Merges partial profile updates into stored users.
///
/// Concurrent updates to the same user are last-write-wins per field: each
/// update is one `UPDATE` of the columns it names, with no version check.
#[derive(Clone)]
pub struct ProfileReconciler {
    users: Arc<dyn UserRepository>,
    bcrypt_cost: u32,
}

impl ProfileReconciler {
    pub fn new(users: Arc<dyn UserRepository>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    pub async fn get_profile(&self, email: &str) -> AppResult<ProfileSnapshot> {
        if email.is_empty() {
            return Err(AppError::Validation("Email is required".into()));
        }
        self.users
            .find_by_email(email)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    #[tracing::instrument(name = "profile.update", skip(self, update))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> AppResult<UpdateOutcome> {
        if update.is_empty() {
            return Err(AppError::NoFields);
        }

        let requested_email = update.email.clone();
        let changes = self.validate(update).await?;

        let current = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        match requested_email {
            Patch::Value(ref email) if *email == current.email => {}
            Patch::Absent => {}
            _ => return Err(AppError::Validation("Email cannot be changed".into())),
        }

        let changed = ProfileDiff::against_stored(&current, &changes);

        if !self.users.apply_changes(user_id, &changes).await? {
            return Err(AppError::NotFound("User not found".into()));
        }

        let profile = self
            .users
            .find_by_id(user_id)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        tracing::info!(
            user_id,
            changed = ?changed.changed_fields().collect::<Vec<_>>(),
            "Profile updated"
        );

        Ok(UpdateOutcome { profile, changed })
    }

    /// Turn the wire body into storage-ready changes, hashing any new password.
    async fn validate(&self, update: ProfileUpdate) -> AppResult<ProfileChanges> {
        let date_of_birth = match update.date_of_birth {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(ref raw) if raw.is_empty() => Patch::Null,
            Patch::Value(raw) => Patch::Value(
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                    AppError::Validation("Date of birth must be YYYY-MM-DD".into())
                })?,
            ),
        };

        let is_anonymous = match update.is_anonymous {
            Patch::Absent => None,
            Patch::Value(value) => Some(value),
            Patch::Null => {
                return Err(AppError::Validation("isAnonymous cannot be null".into()))
            }
        };

        let password_hash = match update.password {
            Patch::Value(password) if !password.is_empty() => {
                if password.chars().count() < MIN_PASSWORD_LEN {
                    return Err(AppError::Validation(format!(
                        "Password must be at least {} characters",
                        MIN_PASSWORD_LEN
                    )));
                }
                Some(hash_password(password, self.bcrypt_cost).await?)
            }
            _ => None,
        };

        Ok(ProfileChanges {
            first_name: update.first_name,
            last_name: update.last_name,
            nickname: update.nickname,
            date_of_birth,
            profile_picture: update.profile_picture,
            is_anonymous,
            password_hash,
        })
    }
}
