//! Schema declaration sent to the store at startup.

/// The canonical account schema: a term-indexed `name`, an integer
/// `balance`, and a `user` type grouping the two.
pub const ACCOUNT_SCHEMA: &str = "\
name: string @index(term) .
balance: int .
type user {
    name
    balance
}
";

/// A schema declaration in the store's text form.
///
/// Installation is a one-time idempotent side-effecting call; the text is
/// interpreted entirely by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    text: String,
}

impl Schema {
    /// Wraps raw schema text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The canonical account schema.
    #[must_use]
    pub fn account() -> Self {
        Self::new(ACCOUNT_SCHEMA)
    }

    /// Returns the declaration text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::account()
    }
}
