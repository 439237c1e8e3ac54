use serde::{Deserialize, Serialize};

/// Where a layer sits in the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Hidden,
    Output,
}

impl Role {
    /// The byte this role is stored as.
    pub fn tag(&self) -> u8 {
        match self {
            Role::Hidden => 0,
            Role::Output => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Role::Hidden),
            1 => Some(Role::Output),
            _ => None,
        }
    }
}
