use crate::config::Config;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub anonymous: bool,
}

impl Session {
    pub fn signed_in(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            anonymous: false,
        }
    }

    pub fn anonymous() -> Self {
        let stamp = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_micros());

        Self {
            user_id: format!("anon-{stamp:x}"),
            anonymous: true,
        }
    }

    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|user_id| !user_id.is_empty())
            .map(|user_id| Self {
                user_id: user_id.to_string(),
                anonymous: config.anonymous_session,
            })
    }
}
