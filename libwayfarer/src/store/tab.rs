//! Navigation slice: which top-level tab is active

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::actions::Action;

/// Top-level navigation tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    Home,
    Explore,
    MyTrips,
    Group,
    Message,
    Profile,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Home,
        Tab::Explore,
        Tab::MyTrips,
        Tab::Group,
        Tab::Message,
        Tab::Profile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Home => "home",
            Tab::Explore => "explore",
            Tab::MyTrips => "my-trips",
            Tab::Group => "group",
            Tab::Message => "message",
            Tab::Profile => "profile",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Invalid tab: '{}'. Valid options: home, explore, my-trips, group, message, profile",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabState {
    pub active_tab: Tab,
}

/// Pure reducer for the navigation slice
///
/// `SelectTab` sets the active tab; every other action leaves the slice as is.
pub fn reduce_tab(state: Option<TabState>, action: &Action) -> TabState {
    let state = state.unwrap_or_default();
    match action {
        Action::SelectTab(tab) => TabState { active_tab: *tab },
        _ => state,
    }
}
