use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Role reported at login when a stored record has none.
pub const DEFAULT_ROLE: &str = "usuario";

/// Strings stay as they are; null, numbers and any other shape read as empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// One user of the collection, as persisted and as returned by `list`.
///
/// Field names on the wire match the existing data files: `nombre`, `email`,
/// `password` (always an argon2 hash) and `rol`. Any other keys a stored
/// object carries are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserRecord {
    #[serde(rename = "nombre", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(rename = "password", default, deserialize_with = "lenient_string")]
    pub password_hash: String,
    #[serde(rename = "rol", default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: role.into(),
            extra: Map::new(),
        }
    }

    /// Case-insensitive email comparison against an already lowercased address.
    /// Records without an email never match.
    pub fn has_email(&self, normalized: &str) -> bool {
        !self.email.is_empty() && self.email.to_lowercase() == normalized
    }
}

/// One element of the stored array.
///
/// Objects decode as users; anything else is carried verbatim so positions
/// and content survive a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StoredEntry {
    User(UserRecord),
    Unrecognised(Value),
}

impl StoredEntry {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => match serde_json::from_value(Value::Object(map.clone())) {
                Ok(user) => StoredEntry::User(user),
                Err(_) => StoredEntry::Unrecognised(Value::Object(map)),
            },
            other => StoredEntry::Unrecognised(other),
        }
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            StoredEntry::User(u) => Some(u),
            StoredEntry::Unrecognised(_) => None,
        }
    }
}

impl From<UserRecord> for StoredEntry {
    fn from(user: UserRecord) -> Self { StoredEntry::User(user) }
}

/// Login input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Create input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserInput {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "rol")]
    pub role: String,
}

/// Edit input. `index` stays optional so a missing one can be reported as a
/// validation failure rather than a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditUserInput {
    pub index: Option<usize>,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    #[serde(rename = "rol")]
    pub role: String,
}

/// Successful login: the role only, never the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_uses_stored_field_names() {
        let r = UserRecord::new("Ana", "ana@x.com", "$argon2id$...", "admin");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(
            v,
            json!({"nombre": "Ana", "email": "ana@x.com", "password": "$argon2id$...", "rol": "admin"})
        );
    }

    #[test]
    fn legacy_record_without_role_loads() {
        let r: UserRecord = serde_json::from_value(json!({"nombre": "Old", "email": "old@x.com"})).unwrap();
        assert_eq!(r.role, "");
        assert_eq!(r.password_hash, "");
    }

    #[test]
    fn has_email_ignores_stored_case() {
        let r = UserRecord { email: "Ana@X.com".into(), ..Default::default() };
        assert!(r.has_email("ana@x.com"));
        assert!(!r.has_email("ana@y.com"));
        assert!(!UserRecord::default().has_email(""));
    }

    #[test]
    fn null_and_non_string_fields_read_as_empty() {
        let r: UserRecord =
            serde_json::from_value(json!({"nombre": 7, "email": "a@x.com", "password": null, "rol": null})).unwrap();
        assert_eq!(r, UserRecord::new("", "a@x.com", "", ""));
    }

    #[test]
    fn unknown_keys_round_trip() {
        let stored = json!({"nombre": "Ana", "email": "a@x.com", "password": "h", "rol": "admin", "telefono": "555"});
        let entry = StoredEntry::from_value(stored.clone());
        assert_eq!(entry.user().map(|u| u.extra.get("telefono")), Some(Some(&json!("555"))));
        assert_eq!(serde_json::to_value(&entry).unwrap(), stored);
    }

    #[test]
    fn non_objects_are_kept_verbatim() {
        for raw in [json!(42), json!("x"), json!(null), json!(["a", "b"])] {
            let entry = StoredEntry::from_value(raw.clone());
            assert!(entry.user().is_none());
            assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
        }
    }
}
