use serde::{Deserialize, Serialize};

/// The inbound surface a turn arrived on (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Chat,
    Whatsapp,
    Email,
    Phone,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Chat => "CHAT",
            Channel::Whatsapp => "WHATSAPP",
            Channel::Email => "EMAIL",
            Channel::Phone => "PHONE",
        }
    }

    /// §4.10 — chat/WhatsApp tolerate more tool-loop round-trips than email.
    pub fn is_synchronous(&self) -> bool {
        matches!(self, Channel::Chat | Channel::Whatsapp | Channel::Phone)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CHAT" => Ok(Channel::Chat),
            "WHATSAPP" => Ok(Channel::Whatsapp),
            "EMAIL" => Ok(Channel::Email),
            "PHONE" => Ok(Channel::Phone),
            other => Err(crate::error::CoreError::Internal(format!(
                "unknown channel: {other}"
            ))),
        }
    }
}
