//! Authentication slice: the login session and profile of the current user

use std::fmt;

use serde::{Deserialize, Serialize};

use super::actions::Action;

/// Login session state
///
/// `is_logged_in` is only ever set by a transition, together with `token`.
/// Callers must not edit `token` directly.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthState {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub cover: Option<String>,
    pub is_logged_in: bool,
    pub token: Option<String>,
    pub msg: String,
}

// Keeps the session credential out of logs.
impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("user_id", &self.user_id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("avatar", &self.avatar)
            .field("cover", &self.cover)
            .field("is_logged_in", &self.is_logged_in)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("msg", &self.msg)
            .finish()
    }
}

/// Pure reducer for the auth slice
///
/// An absent state is replaced by `AuthState::default()` before the action
/// is evaluated. Actions meant for other slices return the state unchanged.
pub fn reduce_auth(state: Option<AuthState>, action: &Action) -> AuthState {
    let state = state.unwrap_or_default();
    match action {
        Action::LoginSuccess(payload) => AuthState {
            user_id: payload.user_id.clone(),
            first_name: payload.user_profile.first_name.clone(),
            last_name: payload.user_profile.last_name.clone(),
            avatar: payload.avatar_img.clone(),
            cover: payload.cover_img.clone(),
            is_logged_in: true,
            token: payload.token.clone(),
            msg: String::new(),
        },

        Action::LoginFail(payload) => AuthState {
            msg: payload.msg.clone().unwrap_or_default(),
            ..AuthState::default()
        },

        Action::Logout => AuthState::default(),

        // Profile fields are cleared even when the token is still valid.
        Action::CheckAuthStatus(payload) => {
            let token = payload.token.clone().filter(|t| !t.is_empty());
            AuthState {
                is_logged_in: token.is_some(),
                token,
                msg: payload.msg.clone().unwrap_or_default(),
                ..AuthState::default()
            }
        }

        Action::UpdateAvatarImage(avatar) => AuthState {
            avatar: avatar.clone(),
            ..state
        },

        Action::UpdateCoverImage(cover) => AuthState {
            cover: cover.clone(),
            ..state
        },

        Action::SelectTab(_) | Action::Unrecognized(_) => state,
    }
}
