use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::movie::MovieId;

/// Server-confirmed favorite movie ids.
pub type FavoriteSet = BTreeSet<MovieId>;

/// Last-known server representation of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Birthday", default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(rename = "FavoriteMovies", alias = "Favoritemovies", alias = "favoriteMovies", default)]
    pub favorite_movies: Vec<MovieId>,
}

impl Profile {
    /// Favorite ids in list order with duplicates dropped.
    pub fn favorite_ids(&self) -> Vec<MovieId> {
        let mut seen = FavoriteSet::new();
        self.favorite_movies
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect()
    }

    pub fn favorite_set(&self) -> FavoriteSet {
        self.favorite_movies.iter().cloned().collect()
    }

    pub fn is_favorite(&self, movie_id: &str) -> bool {
        self.favorite_movies.iter().any(|id| id == movie_id)
    }
}

/// Login input
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        validate_username(&self.username)?;
        validate_password(&self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration input
#[derive(Clone, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Birthday", skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        validate_email(&self.email)?;
        if let Some(birthday) = &self.birthday {
            validate_birthday(birthday)?;
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("birthday", &self.birthday)
            .finish_non_exhaustive()
    }
}

/// Partial profile update. Absent fields are left alone by the server.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(rename = "Username", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "Birthday", skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(rename = "Password", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.birthday.is_none() && self.password.is_none()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.is_empty() {
            return Err(ModelError::validation("profile update has no fields"));
        }
        if let Some(username) = &self.username { validate_username(username)?; }
        if let Some(email) = &self.email { validate_email(email)?; }
        if let Some(birthday) = &self.birthday { validate_birthday(birthday)?; }
        if let Some(password) = &self.password { validate_password(password)?; }
        Ok(())
    }
}

impl fmt::Debug for ProfilePatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilePatch")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("birthday", &self.birthday)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    if username.trim().is_empty() {
        return Err(ModelError::validation("username required"));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ModelError::validation("username must be alphanumeric"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ModelError> {
    if password.is_empty() {
        return Err(ModelError::validation("password required"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
        _ => Err(ModelError::validation("invalid email")),
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn validate_birthday(birthday: &str) -> Result<(), ModelError> {
    let raw = birthday.trim();
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(raw).is_ok() {
        Ok(())
    } else {
        Err(ModelError::validation("birthday must be YYYY-MM-DD"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_reads_either_favorites_spelling() {
        let a: Profile = serde_json::from_value(json!({
            "_id": "abc", "Username": "alice", "Email": "a@b.com", "FavoriteMovies": ["m1", "m2"]
        }))
        .unwrap();
        let b: Profile = serde_json::from_value(json!({
            "Username": "alice", "Favoritemovies": ["m1", "m2"]
        }))
        .unwrap();
        assert_eq!(a.favorite_movies, b.favorite_movies);
        assert_eq!(b.email, "");
        assert!(a.is_favorite("m2"));
        assert!(!a.is_favorite("m3"));
    }

    #[test]
    fn favorite_ids_keep_order_and_drop_duplicates() {
        let profile = Profile {
            username: "alice".into(),
            email: String::new(),
            birthday: None,
            favorite_movies: vec!["m3".into(), "m1".into(), "m3".into(), "m2".into()],
        };
        assert_eq!(profile.favorite_ids(), vec!["m3", "m1", "m2"]);
        assert_eq!(profile.favorite_set().len(), 3);
    }

    #[test]
    fn patch_skips_absent_fields() {
        let patch = ProfilePatch { email: Some("a@b.com".into()), ..Default::default() };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, json!({ "Email": "a@b.com" }));
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(ProfilePatch::default().validate().is_err());
    }

    #[test]
    fn credentials_validation() {
        assert!(Credentials::new("alice", "pw").validate().is_ok());
        assert!(Credentials::new("", "pw").validate().is_err());
        assert!(Credentials::new("al ice", "pw").validate().is_err());
        assert!(Credentials::new("alice", "").validate().is_err());
    }

    #[test]
    fn debug_never_prints_passwords() {
        let creds = Credentials::new("alice", "hunter2");
        let patch = ProfilePatch { password: Some("hunter2".into()), ..Default::default() };
        let reg = Registration { username: "alice".into(), password: "hunter2".into(), email: "a@b.com".into(), birthday: None };
        for rendered in [format!("{creds:?}"), format!("{patch:?}"), format!("{reg:?}")] {
            assert!(!rendered.contains("hunter2"), "{rendered}");
        }
    }

    #[test]
    fn email_and_birthday_rules() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@b@c").is_err());
        assert!(validate_birthday("1990-02-28").is_ok());
        assert!(validate_birthday("1990-02-28T00:00:00.000Z").is_ok());
        assert!(validate_birthday("28/02/1990").is_err());
    }

    #[test]
    fn registration_serializes_backend_names() {
        let reg = Registration { username: "alice".into(), password: "pw".into(), email: "a@b.com".into(), birthday: Some("1990-01-01".into()) };
        assert!(reg.validate().is_ok());
        let value = serde_json::to_value(&reg).unwrap();
        assert_eq!(value["Username"], "alice");
        assert_eq!(value["Birthday"], "1990-01-01");
        assert_eq!(reg.credentials().username, "alice");
    }
}
