//! Profile store: the user's profile plus authentication/onboarding flags.
//!
//! Independent of the job store. Unlike it, the entire state is durable and
//! rewritten on every mutation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{ProfileUpdate, UserProfile};
use crate::storage::Storage;

const USER_STORAGE: &str = "user-storage";

#[derive(Debug, Default, Serialize, Deserialize)]
struct DurableUserState {
    profile: UserProfile,
    #[serde(default)]
    is_onboarded: bool,
    #[serde(default)]
    is_authenticated: bool,
    #[serde(default)]
    auth_token: Option<String>,
}

pub struct ProfileStore {
    storage: Storage,
    pub profile: UserProfile,
    pub is_onboarded: bool,
    pub is_authenticated: bool,
    auth_token: Option<String>,
}

impl ProfileStore {
    pub fn new(storage: Storage) -> Self {
        let durable: DurableUserState = match storage.load(USER_STORAGE) {
            Ok(Some(state)) => state,
            Ok(None) => DurableUserState::default(),
            Err(e) => {
                warn!(error = %e, "failed to load user storage, starting with defaults");
                DurableUserState::default()
            }
        };

        Self {
            storage,
            profile: durable.profile,
            is_onboarded: durable.is_onboarded,
            is_authenticated: durable.is_authenticated,
            auth_token: durable.auth_token,
        }
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
        self.persist();
    }

    /// Shallow merge: only the fields present in the update change.
    pub fn update_profile(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.profile.name = name;
        }
        if let Some(email) = update.email {
            self.profile.email = email;
        }
        if let Some(phone) = update.phone {
            self.profile.phone = Some(phone);
        }
        if let Some(location) = update.location {
            self.profile.location = Some(location);
        }
        if let Some(title) = update.title {
            self.profile.title = Some(title);
        }
        if let Some(about) = update.about {
            self.profile.about = Some(about);
        }
        if let Some(skills) = update.skills {
            self.profile.skills = skills;
        }
        self.persist();
    }

    pub fn set_onboarded(&mut self, value: bool) {
        self.is_onboarded = value;
        self.persist();
    }

    pub fn set_authenticated(&mut self, value: bool, token: Option<String>) {
        self.is_authenticated = value;
        self.auth_token = token;
        self.persist();
    }

    /// Resets to an empty default profile and clears authentication.
    pub fn logout(&mut self) {
        self.profile = UserProfile::default();
        self.is_authenticated = false;
        self.auth_token = None;
        self.persist();
    }

    fn persist(&self) {
        let durable = DurableUserState {
            profile: self.profile.clone(),
            is_onboarded: self.is_onboarded,
            is_authenticated: self.is_authenticated,
            auth_token: self.auth_token.clone(),
        };
        if let Err(e) = self.storage.save(USER_STORAGE, &durable) {
            warn!(error = %e, "failed to persist user storage");
        }
    }
}
