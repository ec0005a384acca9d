//! Request-to-command resolution.
//!
//! The endpoint is action-dispatched: an `action` field plus the HTTP verb
//! select one of the five commands through [`ROUTES`]. Fields come from up to
//! three sources (JSON body, form body, query string) consulted in that order.

use serde_json::{Map, Value};

use super::domain::{CreateUserInput, EditUserInput, LoginInput};
use crate::errors::DirectoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Delete,
    Other,
}

impl Verb {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Verb::Get,
            "POST" => Verb::Post,
            "DELETE" => Verb::Delete,
            _ => Verb::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Login,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "list" => Some(Action::List),
            "login" => Some(Action::Login),
            "create" => Some(Action::Create),
            "edit" => Some(Action::Edit),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Login => "login",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

/// Every accepted (verb, action) pair. Anything else is unsupported.
pub const ROUTES: &[(Verb, Action)] = &[
    (Verb::Get, Action::List),
    (Verb::Post, Action::Login),
    (Verb::Post, Action::Create),
    (Verb::Post, Action::Edit),
    (Verb::Post, Action::Delete),
    (Verb::Delete, Action::Delete),
];

/// Action used when a request names none.
pub const DEFAULT_ACTION: &str = "list";

pub fn route(verb: Verb, action: &str) -> Result<Action, DirectoryError> {
    let action = Action::parse(action.trim()).ok_or(DirectoryError::UnsupportedAction)?;
    ROUTES
        .iter()
        .find(|(v, a)| *v == verb && *a == action)
        .map(|(_, a)| *a)
        .ok_or(DirectoryError::UnsupportedAction)
}

/// Layered view over request field sources, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct RequestFields {
    layers: Vec<Map<String, Value>>,
}

impl RequestFields {
    pub fn new() -> Self { Self::default() }

    /// Add a lower-priority source than those already present.
    pub fn with_layer(mut self, layer: Map<String, Value>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Add a source of plain string pairs (form body or query string).
    pub fn with_pairs<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = pairs.into_iter().map(|(k, v)| (k.into(), Value::String(v.into()))).collect();
        self.with_layer(map)
    }

    /// First non-null value for `name` across the layers.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.layers.iter().find_map(|l| l.get(name).filter(|v| !v.is_null()))
    }

    /// Field rendered as text; absent fields read as `None`.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Bool(true) => "1".into(),
            Value::Bool(false) => String::new(),
            other => other.to_string(),
        })
    }

    /// Field as text, empty when absent.
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    /// Positional index. Absent, blank or non-integer values read as `None`
    /// (reported as missing); negative integers can never address a record.
    pub fn index(&self) -> Result<Option<usize>, DirectoryError> {
        let parsed = match self.get("index") {
            None => return Ok(None),
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            Some(_) => None,
        };
        match parsed {
            None => Ok(None),
            Some(i) if i < 0 => Err(DirectoryError::index_not_found()),
            Some(i) => usize::try_from(i).map(Some).map_err(|_| DirectoryError::index_not_found()),
        }
    }
}

/// One resolved directory operation with its typed input.
#[derive(Debug, Clone)]
pub enum Command {
    List,
    Login(LoginInput),
    Create(CreateUserInput),
    Edit(EditUserInput),
    Delete { index: Option<usize> },
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Command::List => Action::List,
            Command::Login(_) => Action::Login,
            Command::Create(_) => Action::Create,
            Command::Edit(_) => Action::Edit,
            Command::Delete { .. } => Action::Delete,
        }
    }

    /// Resolve the action for `verb` and pull its inputs from `fields`.
    ///
    /// # Examples
    /// ```
    /// use service::directory::dispatch::{Command, RequestFields, Verb};
    /// let fields = RequestFields::new().with_pairs([("action", "delete"), ("index", "2")]);
    /// let cmd = Command::from_request(Verb::Post, &fields).unwrap();
    /// assert!(matches!(cmd, Command::Delete { index: Some(2) }));
    /// ```
    pub fn from_request(verb: Verb, fields: &RequestFields) -> Result<Self, DirectoryError> {
        let action_name = fields.text("action").unwrap_or_else(|| DEFAULT_ACTION.to_string());
        let action = route(verb, &action_name)?;
        let cmd = match action {
            Action::List => Command::List,
            Action::Login => Command::Login(LoginInput {
                email: fields.text_or_empty("email"),
                password: fields.text_or_empty("password"),
            }),
            Action::Create => Command::Create(CreateUserInput {
                name: fields.text_or_empty("nombre"),
                email: fields.text_or_empty("email"),
                password: fields.text_or_empty("password"),
                role: fields.text_or_empty("rol"),
            }),
            Action::Edit => Command::Edit(EditUserInput {
                index: fields.index()?,
                name: fields.text_or_empty("nombre"),
                email: fields.text_or_empty("email"),
                password: fields.text("password"),
                role: fields.text_or_empty("rol"),
            }),
            Action::Delete => Command::Delete { index: fields.index()? },
        };
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn route_table_accepts_only_listed_pairs() {
        assert_eq!(route(Verb::Get, "list").unwrap(), Action::List);
        assert_eq!(route(Verb::Post, "create").unwrap(), Action::Create);
        assert_eq!(route(Verb::Delete, "delete").unwrap(), Action::Delete);
        assert_eq!(route(Verb::Post, "delete").unwrap(), Action::Delete);

        for (verb, action) in [
            (Verb::Get, "create"),
            (Verb::Get, "delete"),
            (Verb::Get, "login"),
            (Verb::Post, "list"),
            (Verb::Delete, "edit"),
            (Verb::Other, "list"),
            (Verb::Post, "purge"),
        ] {
            let err = route(verb, action).unwrap_err();
            assert_eq!(err.status(), 400, "{verb:?} {action}");
        }
    }

    #[test]
    fn missing_action_defaults_to_list() {
        let cmd = Command::from_request(Verb::Get, &RequestFields::new()).unwrap();
        assert!(matches!(cmd, Command::List));
    }

    #[test]
    fn body_fields_take_priority_over_query() {
        let fields = RequestFields::new()
            .with_layer(body(json!({"action": "create", "email": "body@x.com"})))
            .with_pairs([("action", "list"), ("email", "query@x.com"), ("nombre", "FromQuery")]);
        let cmd = Command::from_request(Verb::Post, &fields).unwrap();
        match cmd {
            Command::Create(input) => {
                assert_eq!(input.email, "body@x.com");
                assert_eq!(input.name, "FromQuery");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn null_body_field_falls_back() {
        let fields = RequestFields::new()
            .with_layer(body(json!({"index": null})))
            .with_pairs([("index", "1")]);
        assert_eq!(fields.index().unwrap(), Some(1));
    }

    #[test]
    fn index_accepts_numbers_and_numeric_strings() {
        let f = RequestFields::new().with_layer(body(json!({"index": 3})));
        assert_eq!(f.index().unwrap(), Some(3));
        let f = RequestFields::new().with_pairs([("index", " 4 ")]);
        assert_eq!(f.index().unwrap(), Some(4));
        let f = RequestFields::new().with_pairs([("index", "abc")]);
        assert_eq!(f.index().unwrap(), None);
        let f = RequestFields::new().with_layer(body(json!({"index": -1})));
        assert_eq!(f.index().unwrap_err().status(), 404);
    }

    #[test]
    fn edit_password_absent_vs_present() {
        let f = RequestFields::new().with_layer(body(json!({"action": "edit", "index": 0})));
        match Command::from_request(Verb::Post, &f).unwrap() {
            Command::Edit(input) => assert!(input.password.is_none()),
            other => panic!("unexpected {other:?}"),
        }
        let f = RequestFields::new().with_layer(body(json!({"action": "edit", "index": 0, "password": "newpass99"})));
        match Command::from_request(Verb::Post, &f).unwrap() {
            Command::Edit(input) => assert_eq!(input.password.as_deref(), Some("newpass99")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn verb_parse_is_case_insensitive() {
        assert_eq!(Verb::parse("get"), Verb::Get);
        assert_eq!(Verb::parse("DELETE"), Verb::Delete);
        assert_eq!(Verb::parse("PUT"), Verb::Other);
    }
}
