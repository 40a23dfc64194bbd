use std::path::PathBuf;

use chrono::NaiveDate;

use crate::auth::Registration;
use crate::client::api::{ApiClient, ClientError};
use crate::client::session::{SessionData, SessionStore};
use crate::client::validation::{validate_profile_form, ProfileForm};
use crate::db::models::{ProfileSnapshot, ReviewWithAuthor, UserSummary};
use crate::profile::{Patch, ProfileDiff, ProfileUpdate};
use crate::reviews::ReviewSubmission;

/// How many suggested accounts the feed shows.
pub const SUGGESTION_LIMIT: u32 = 3;

/// Result of [`Session::save_profile`].
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// Fields to badge as updated.
    pub diff: ProfileDiff,
    /// False when the server was unreachable and only the cache was written.
    pub synced: bool,
    /// The profile now in the cache.
    pub profile: ProfileSnapshot,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// The profile as it will look once `form` is applied on top of `base`.
fn apply_form(base: &ProfileSnapshot, form: &ProfileForm) -> ProfileSnapshot {
    ProfileSnapshot {
        first_name: non_empty(&form.first_name),
        last_name: non_empty(&form.last_name),
        nickname: non_empty(&form.nickname),
        email: form.email.trim().to_string(),
        date_of_birth: form.birth_date(),
        profile_picture: form
            .profile_picture
            .clone()
            .or_else(|| base.profile_picture.clone()),
        is_anonymous: form.is_anonymous,
        ..base.clone()
    }
}

/// What the user believes changed: cached profile against submitted values.
fn client_diff(before: &ProfileSnapshot, after: &ProfileSnapshot, form: &ProfileForm) -> ProfileDiff {
    ProfileDiff {
        first_name: before.first_name != after.first_name,
        last_name: before.last_name != after.last_name,
        nickname: before.nickname != after.nickname,
        email: before.email != after.email,
        date_of_birth: before.date_of_birth != after.date_of_birth,
        profile_picture: before.profile_picture != after.profile_picture,
        is_anonymous: before.is_anonymous != after.is_anonymous,
        password: form.wants_password_change(),
    }
}

fn update_body(form: &ProfileForm) -> ProfileUpdate {
    ProfileUpdate {
        first_name: Patch::Value(form.first_name.trim().to_string()),
        last_name: Patch::Value(form.last_name.trim().to_string()),
        nickname: non_empty(&form.nickname).into(),
        email: Patch::Value(form.email.trim().to_string()),
        date_of_birth: Patch::Value(form.date_of_birth.trim().to_string()),
        profile_picture: form
            .profile_picture
            .clone()
            .map_or(Patch::Absent, Patch::Value),
        is_anonymous: Patch::Value(form.is_anonymous),
        password: if form.wants_password_change() {
            Patch::Value(form.password.clone())
        } else {
            Patch::Absent
        },
    }
}

/// A user's view of the service: API calls plus the cached session.
pub struct Session {
    api: ApiClient,
    store: SessionStore,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: SessionStore::ephemeral(),
        }
    }

    /// Pick up a remembered session from `path`, if one was saved.
    pub fn resume(api: ApiClient, path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        Ok(Self {
            api,
            store: SessionStore::resume(path)?,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn current(&self) -> Option<&SessionData> {
        self.store.get()
    }

    pub fn profile(&self) -> Option<&ProfileSnapshot> {
        self.current().and_then(|data| data.profile.as_ref())
    }

    fn require(&self) -> Result<&SessionData, ClientError> {
        self.current().ok_or(ClientError::NotLoggedIn)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Registration, ClientError> {
        self.api.register(email, password, confirm_password).await
    }

    /// Log in and cache the session. With `remember` the session is written to
    /// `path`; without it any session previously remembered there is dropped.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        remember: bool,
        path: impl Into<PathBuf>,
    ) -> Result<&SessionData, ClientError> {
        let login = self.api.login(email, password).await?;

        let path = path.into();
        if !remember {
            SessionStore::forget(&path)?;
        }
        let mut store = SessionStore::for_login(remember, path);
        store.set(SessionData {
            token: login.token,
            user_id: login.user_id,
            email: login.profile.email.clone(),
            profile: Some(login.profile),
        })?;
        self.store = store;

        tracing::info!(remember, "Logged in");
        self.require()
    }

    /// Re-read the profile from the server into the cache.
    pub async fn refresh_profile(&mut self) -> Result<ProfileSnapshot, ClientError> {
        let email = self.require()?.email.clone();
        let profile = self.api.get_profile(&email).await?;
        self.store.set_profile(profile.clone())?;
        Ok(profile)
    }

    /// Validate `form`, send it, and update the cache.
    ///
    /// If the server cannot be reached the cache is still updated and the
    /// outcome carries the locally computed diff with `synced == false`. A
    /// server that answers with an error leaves the cache untouched.
    pub async fn save_profile(
        &mut self,
        form: &ProfileForm,
        today: NaiveDate,
    ) -> Result<SaveOutcome, ClientError> {
        let errors = validate_profile_form(form, today);
        if !errors.is_empty() {
            return Err(ClientError::Invalid(errors));
        }

        let cached = self.profile().cloned();
        let base = match cached {
            Some(profile) => profile,
            None => self.refresh_profile().await?,
        };
        let token = self.require()?.token.clone();
        let submitted = apply_form(&base, form);

        match self.api.update_profile(&token, &update_body(form)).await {
            Ok(reply) => {
                self.store.set_profile(reply.profile.clone())?;
                Ok(SaveOutcome {
                    diff: reply.changed,
                    synced: true,
                    profile: reply.profile,
                })
            }
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "Profile saved locally only");
                let diff = client_diff(&base, &submitted, form);
                self.store.set_profile(submitted.clone())?;
                Ok(SaveOutcome {
                    diff,
                    synced: false,
                    profile: submitted,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Post a review as the logged-in user unless the submission names one.
    pub async fn submit_review(
        &self,
        mut submission: ReviewSubmission,
    ) -> Result<String, ClientError> {
        if submission.user_id.is_none() {
            submission.user_id = Some(self.require()?.user_id.clone());
        }
        self.api.submit_review(&submission).await
    }

    pub async fn feed(&self) -> Result<Vec<ReviewWithAuthor>, ClientError> {
        self.api.list_reviews().await
    }

    /// Newest accounts other than the logged-in user.
    pub async fn suggested_accounts(&self) -> Result<Vec<UserSummary>, ClientError> {
        let exclude = self.current().map(|data| data.email.as_str());
        self.api.list_users(exclude, Some(SUGGESTION_LIMIT)).await
    }

    /// Forget the session locally. Tokens are not revoked server-side.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.store.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }
}
