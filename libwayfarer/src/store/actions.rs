//! Actions for the reducer pattern
//!
//! Every state transition is requested by dispatching an [`Action`]. Each
//! recognized transition is tagged by an [`ActionType`] from the registry, so
//! dispatchers and reducers agree on vocabulary.
//!
//! # Wire form
//!
//! Actions cross process boundaries (CLI input, tests, persisted fixtures) as
//! `{ "type": "<tag>", "data": <payload> }`. Decoding never fails on the
//! payload: any field that is missing or has the wrong JSON type degrades to
//! absent on its own, and an unknown tag decodes to [`Action::Unrecognized`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::tab::Tab;

/// Symbolic identifier of a recognized transition
///
/// Marked non-exhaustive so new tags can be added without changing the
/// identity of existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ActionType {
    LoginSuccess,
    LoginFail,
    Logout,
    CheckAuthStatus,
    UpdateAvatarImage,
    UpdateCoverImage,
    TabHome,
    TabExplore,
    TabMyTrips,
    TabGroup,
    TabMessage,
    TabProfile,
}

impl ActionType {
    /// Every registered tag, in registry order
    pub const ALL: [ActionType; 12] = [
        ActionType::LoginSuccess,
        ActionType::LoginFail,
        ActionType::Logout,
        ActionType::CheckAuthStatus,
        ActionType::UpdateAvatarImage,
        ActionType::UpdateCoverImage,
        ActionType::TabHome,
        ActionType::TabExplore,
        ActionType::TabMyTrips,
        ActionType::TabGroup,
        ActionType::TabMessage,
        ActionType::TabProfile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::LoginSuccess => "login-success",
            ActionType::LoginFail => "login-fail",
            ActionType::Logout => "logout",
            ActionType::CheckAuthStatus => "check-auth-status",
            ActionType::UpdateAvatarImage => "update-avatar-image",
            ActionType::UpdateCoverImage => "update-cover-image",
            ActionType::TabHome => "tab-home",
            ActionType::TabExplore => "tab-explore",
            ActionType::TabMyTrips => "tab-my-trips",
            ActionType::TabGroup => "tab-group",
            ActionType::TabMessage => "tab-message",
            ActionType::TabProfile => "tab-profile",
        }
    }

    /// The tab selected by this tag, if it is a tab-selection tag
    pub fn tab(&self) -> Option<Tab> {
        match self {
            ActionType::TabHome => Some(Tab::Home),
            ActionType::TabExplore => Some(Tab::Explore),
            ActionType::TabMyTrips => Some(Tab::MyTrips),
            ActionType::TabGroup => Some(Tab::Group),
            ActionType::TabMessage => Some(Tab::Message),
            ActionType::TabProfile => Some(Tab::Profile),
            _ => None,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown action type: '{}'", s))
    }
}

impl From<Tab> for ActionType {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::Home => ActionType::TabHome,
            Tab::Explore => ActionType::TabExplore,
            Tab::MyTrips => ActionType::TabMyTrips,
            Tab::Group => ActionType::TabGroup,
            Tab::Message => ActionType::TabMessage,
            Tab::Profile => ActionType::TabProfile,
        }
    }
}

/// A request to transition state
///
/// One variant per recognized transition, each carrying only the fields it
/// needs. Actions are immutable data; the reducers (see `auth.rs`, `tab.rs`)
/// decide what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAction", into = "RawAction")]
pub enum Action {
    // === Auth ===
    /// Login completed; carries the session and profile
    LoginSuccess(LoginPayload),

    /// Login rejected
    LoginFail(FailurePayload),

    /// User logged out
    Logout,

    /// Stored session was revalidated
    CheckAuthStatus(AuthStatusPayload),

    /// Avatar image reference changed
    UpdateAvatarImage(Option<String>),

    /// Cover image reference changed
    UpdateCoverImage(Option<String>),

    // === Navigation ===
    /// Top-level tab selected
    SelectTab(Tab),

    /// A tag outside the registry; every slice ignores it
    Unrecognized(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginPayload {
    pub user_id: Option<String>,
    pub user_profile: UserProfile,
    pub avatar_img: Option<String>,
    pub cover_img: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailurePayload {
    pub msg: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthStatusPayload {
    pub token: Option<String>,
    pub msg: Option<String>,
}

impl Action {
    /// Registry tag for this action; `None` for unrecognized tags
    pub fn action_type(&self) -> Option<ActionType> {
        match self {
            Action::LoginSuccess(_) => Some(ActionType::LoginSuccess),
            Action::LoginFail(_) => Some(ActionType::LoginFail),
            Action::Logout => Some(ActionType::Logout),
            Action::CheckAuthStatus(_) => Some(ActionType::CheckAuthStatus),
            Action::UpdateAvatarImage(_) => Some(ActionType::UpdateAvatarImage),
            Action::UpdateCoverImage(_) => Some(ActionType::UpdateCoverImage),
            Action::SelectTab(tab) => Some(ActionType::from(*tab)),
            Action::Unrecognized(_) => None,
        }
    }

    /// Tag as it appears on the wire
    pub fn type_name(&self) -> &str {
        match self {
            Action::Unrecognized(kind) => kind,
            other => other.action_type().map(|t| t.as_str()).unwrap_or_default(),
        }
    }
}

/// Untyped wire form of an action
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    data: Value,
}

/// Reads `key` as a string, accepting numbers for identifiers
fn field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_value(data: &Value) -> Option<String> {
    data.as_str().map(str::to_owned)
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        let Ok(kind) = raw.kind.parse::<ActionType>() else {
            return Action::Unrecognized(raw.kind);
        };
        let data = &raw.data;

        if let Some(tab) = kind.tab() {
            return Action::SelectTab(tab);
        }

        match kind {
            ActionType::LoginSuccess => {
                let profile = data.get("userProfile").unwrap_or(&Value::Null);
                Action::LoginSuccess(LoginPayload {
                    user_id: field(data, "userId"),
                    user_profile: UserProfile {
                        first_name: field(profile, "firstName"),
                        last_name: field(profile, "lastName"),
                    },
                    avatar_img: field(data, "avatarImg"),
                    cover_img: field(data, "coverImg"),
                    token: field(data, "token"),
                })
            }
            ActionType::LoginFail => Action::LoginFail(FailurePayload {
                msg: field(data, "msg"),
            }),
            ActionType::Logout => Action::Logout,
            ActionType::CheckAuthStatus => Action::CheckAuthStatus(AuthStatusPayload {
                token: field(data, "token"),
                msg: field(data, "msg"),
            }),
            ActionType::UpdateAvatarImage => Action::UpdateAvatarImage(string_value(data)),
            ActionType::UpdateCoverImage => Action::UpdateCoverImage(string_value(data)),
            // Tab tags are handled above
            _ => Action::Unrecognized(raw.kind),
        }
    }
}

/// Inserts `value` under `key` only when present
fn put(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        let kind = action.type_name().to_string();
        let data = match action {
            Action::LoginSuccess(p) => {
                let mut profile = Map::new();
                put(&mut profile, "firstName", &p.user_profile.first_name);
                put(&mut profile, "lastName", &p.user_profile.last_name);

                let mut map = Map::new();
                put(&mut map, "userId", &p.user_id);
                map.insert("userProfile".to_string(), Value::Object(profile));
                put(&mut map, "avatarImg", &p.avatar_img);
                put(&mut map, "coverImg", &p.cover_img);
                put(&mut map, "token", &p.token);
                Value::Object(map)
            }
            Action::LoginFail(p) => match p.msg {
                Some(msg) => json!({ "msg": msg }),
                None => Value::Null,
            },
            Action::CheckAuthStatus(p) => {
                let mut map = Map::new();
                put(&mut map, "token", &p.token);
                put(&mut map, "msg", &p.msg);
                Value::Object(map)
            }
            Action::UpdateAvatarImage(image) | Action::UpdateCoverImage(image) => {
                image.map(Value::String).unwrap_or(Value::Null)
            }
            Action::Logout | Action::SelectTab(_) | Action::Unrecognized(_) => Value::Null,
        };
        RawAction { kind, data }
    }
}
