use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Keeps secrets such as backend tokens out of `Debug` output and log lines.
/// Serialization still writes the real value.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value() {
        let token = Masked("s3cret".to_string());
        assert_eq!(format!("{:?}", token), "********");
        assert_eq!(token.to_string(), "********");
        assert_eq!(token.expose(), "s3cret");
    }

    #[test]
    fn test_deserializes_transparently() {
        let token: Masked<String> = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(token.into_inner(), "abc");
    }
}
