//! Event keys: named channels, unique tokens and the wildcard

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Literal that selects the wildcard key
pub const WILDCARD: &str = "*";

/// Identifier of an event channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Named event, compared by string equality
    Name(Arc<str>),
    /// Unique token, compared by identity
    Token(Token),
    /// Receives every emission regardless of key
    Wildcard,
}

impl EventKey {
    /// Create a named key. `"*"` yields [`EventKey::Wildcard`].
    pub fn name(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        if name == WILDCARD {
            EventKey::Wildcard
        } else {
            EventKey::Name(Arc::from(name))
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, EventKey::Wildcard)
    }
}

impl From<&str> for EventKey {
    fn from(name: &str) -> Self {
        Self::name(name)
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        Self::name(name)
    }
}

impl From<&String> for EventKey {
    fn from(name: &String) -> Self {
        Self::name(name)
    }
}

impl From<Token> for EventKey {
    fn from(token: Token) -> Self {
        EventKey::Token(token)
    }
}

impl From<&Token> for EventKey {
    fn from(token: &Token) -> Self {
        EventKey::Token(token.clone())
    }
}

impl From<&EventKey> for EventKey {
    fn from(key: &EventKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Name(name) => f.write_str(name),
            EventKey::Token(token) => fmt::Display::fmt(token, f),
            EventKey::Wildcard => f.write_str(WILDCARD),
        }
    }
}

/// Opaque, symbol-like unique key
///
/// Every call to [`Token::new`] or [`Token::described`] yields a token that
/// is distinct from all others. The description is cosmetic and does not
/// take part in equality.
#[derive(Clone)]
pub struct Token {
    id: Uuid,
    description: Option<Arc<str>>,
}

impl Token {
    pub fn new() -> Self {
        Self {
            id: next_token_id(),
            description: None,
        }
    }

    /// Create a token carrying a description for display
    pub fn described(description: impl AsRef<str>) -> Self {
        Self {
            id: next_token_id(),
            description: Some(Arc::from(description.as_ref())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Monotonic counter instead of `Uuid::new_v4()`, no RNG needed for uniqueness
fn next_token_id() -> Uuid {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    Uuid::from_u128(seq as u128)
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id.as_u128())
            .field("description", &self.description)
            .finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(desc) => write!(f, "Token({})", desc),
            None => write!(f, "Token(#{})", self.id.as_u128()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_is_wildcard() {
        assert_eq!(EventKey::from("*"), EventKey::Wildcard);
        assert!(EventKey::from(String::from("*")).is_wildcard());
        assert!(!EventKey::from("**").is_wildcard());
    }

    #[test]
    fn test_names_compare_by_value() {
        assert_eq!(EventKey::from("click"), EventKey::from(String::from("click")));
        assert_ne!(EventKey::from("click"), EventKey::from("hover"));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = Token::described("ready");
        let b = Token::described("ready");

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(EventKey::from(&a), EventKey::from(&b));
        // Same description, distinct keys
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_token_never_equals_name() {
        let token = Token::described("click");
        assert_ne!(EventKey::from(token), EventKey::from("click"));
    }

    #[test]
    fn test_display() {
        assert_eq!(EventKey::Wildcard.to_string(), "*");
        assert_eq!(EventKey::from("tick").to_string(), "tick");
        assert_eq!(EventKey::from(Token::described("boot")).to_string(), "Token(boot)");
    }
}
