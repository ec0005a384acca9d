use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Uniform response wrapper shared by every directory operation.
///
/// Serializes as `{"ok":true,"data":...}` on success and
/// `{"ok":false,"error":"..."}` on failure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { ok: false, data: None, error: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_omits_error() {
        let env = Envelope::success(json!([1, 2]));
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v, json!({"ok": true, "data": [1, 2]}));
    }

    #[test]
    fn failure_envelope_omits_data() {
        let env: Envelope<()> = Envelope::failure("bad input");
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v, json!({"ok": false, "error": "bad input"}));
    }
}
