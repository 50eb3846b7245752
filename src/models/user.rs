use std::fmt;

use serde::{Deserialize, Serialize};

use super::wire;

/// `GET /auth/profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub room_number: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_serviceprovider: bool,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.email)
    }
}

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub access_token: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user)
            .field("access_token", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_and_redaction() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"user": {"id": 1, "email": "r@hostel.edu", "username": "resident1", "room_number": "B-204", "is_superuser": false, "is_serviceprovider": false}, "access_token": "abc.def"}"#,
        )
        .unwrap();
        assert_eq!(resp.user.id, "1");
        assert_eq!(resp.user.display_name(), "resident1");
        assert!(!format!("{resp:?}").contains("abc.def"));

        let req = LoginRequest {
            email: "r@hostel.edu".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{req:?}").contains("hunter2"));
    }
}
