use serde::{Deserialize, Serialize};

/// Identity provider an account was created through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
    Local,
    Google,
    Apple,
    Facebook,
    Okta,
}

/// Role names as the backend spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum UserRole {
    #[serde(rename = "EXPEDITEUR")]
    Expediteur,
    #[serde(rename = "LIVREUR")]
    Livreur,
    #[serde(rename = "GESTIONNAIRE")]
    Gestionnaire,
    #[serde(rename = "DESTINATAIRE")]
    Destinataire,
    #[serde(rename = "client")]
    Client,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Expediteur => "EXPEDITEUR",
            UserRole::Livreur => "LIVREUR",
            UserRole::Gestionnaire => "GESTIONNAIRE",
            UserRole::Destinataire => "DESTINATAIRE",
            UserRole::Client => "client",
        }
    }

    /// Parse a role name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        [
            UserRole::Expediteur,
            UserRole::Livreur,
            UserRole::Gestionnaire,
            UserRole::Destinataire,
            UserRole::Client,
        ]
        .into_iter()
        .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct Permission {
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct Role {
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub role_name: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub permissions: Vec<Permission>,
}

/// Account as returned by `/users` and `/auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub nom: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub prenom: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub telephone: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub adress: String,
    pub role: Option<Role>,
    pub provider: Option<Provider>,
    pub provider_id: Option<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub enable: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.role_name.as_str())
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role_name() == Some(role.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_response() {
        let json = r#"{"id":"7c1e","nom":"Benali","prenom":"Amina","username":"amina","email":"amina@example.com","telephone":"0600000000","adress":"12 rue des Lilas","role":{"id":"r1","roleName":"LIVREUR","permissions":[{"id":"p1","name":"COLIS_READ"}]},"provider":"LOCAL","providerId":null,"enable":true}"#;

        let user: User = serde_json::from_str(json).expect("Failed to parse user test JSON");
        assert_eq!(user.full_name(), "Amina Benali");
        assert_eq!(user.role_name(), Some("LIVREUR"));
        assert!(user.has_role(UserRole::Livreur));
        assert!(!user.has_role(UserRole::Gestionnaire));
        assert_eq!(user.provider, Some(Provider::Local));
        assert_eq!(user.role.unwrap().permissions[0].name, "COLIS_READ");
    }

    #[test]
    fn test_user_tolerates_missing_fields() {
        let user: User = serde_json::from_str(r#"{"id":"u1","username":"gest"}"#).unwrap();
        assert_eq!(user.username, "gest");
        assert!(user.role.is_none());
        assert!(!user.enable);
    }

    #[test]
    fn test_user_tolerates_null_fields() {
        let json = r#"{"id":"u9","nom":null,"prenom":"Sara","username":"sara","email":null,"telephone":null,"adress":null,"role":{"id":"r2","roleName":"EXPEDITEUR","permissions":null},"provider":"GOOGLE","providerId":"g-123","enable":null}"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.full_name(), "Sara");
        assert_eq!(user.telephone, "");
        assert!(!user.enable);
        assert!(user.has_role(UserRole::Expediteur));
        assert!(user.role.unwrap().permissions.is_empty());
    }

    #[test]
    fn test_user_role_parse() {
        assert_eq!(UserRole::parse("livreur"), Some(UserRole::Livreur));
        assert_eq!(UserRole::parse("GESTIONNAIRE"), Some(UserRole::Gestionnaire));
        assert_eq!(UserRole::parse("Client"), Some(UserRole::Client));
        assert_eq!(UserRole::parse("admin"), None);
        assert_eq!(serde_json::to_string(&UserRole::Client).unwrap(), r#""client""#);
    }
}
