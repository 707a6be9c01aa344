//! JSON parsing for nested trees
//!
//! serde_json caps nesting at 128, and every outline level costs two of those
//! (the node object and its `children` array). Trees are parsed with the cap
//! lifted and the stack grown on demand instead.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Deserialize JSON of arbitrary nesting depth
pub fn from_json_unbounded<T: DeserializeOwned>(json: &str) -> serde_json::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn nested_arrays(depth: usize) -> String {
        format!("{}{}", "[".repeat(depth), "]".repeat(depth))
    }

    #[test]
    fn test_parses_past_default_nesting_limit() {
        let json = nested_arrays(1000);
        assert!(serde_json::from_str::<Value>(&json).is_err());
        assert!(from_json_unbounded::<Value>(&json).is_ok());
    }

    #[test]
    fn test_rejects_trailing_input() {
        assert!(from_json_unbounded::<Value>("[] []").is_err());
        assert!(from_json_unbounded::<Value>("[1").is_err());
    }
}
