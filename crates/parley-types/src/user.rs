use serde::{Deserialize, Serialize};

/// The identity every backend call is made on behalf of.
///
/// Injected from configuration and passed explicitly into each API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl UserIdentity {
    pub const DEFAULT_ID: &str = "local-user";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Name to greet the user with; falls back to the id.
    pub fn display(&self) -> &str {
        let name = self.display_name.trim();
        if name.is_empty() { self.id.as_str() } else { name }
    }
}

impl Default for UserIdentity {
    fn default() -> Self {
        Self {
            id: Self::DEFAULT_ID.to_string(),
            display_name: String::new(),
            email: String::new(),
            roles: Vec::new(),
        }
    }
}
