//! Query-string escaping for command payloads.
//!
//! The arm's HTTP parser only understands a handful of escapes, so this is
//! deliberately not a general URL encoder: exactly `{ } " : ,` become `%XX`
//! and a space becomes `+`. Every other byte goes through untouched.

use std::fmt::Write as _;

/// Escape a JSON payload for the `json=` query parameter.
pub fn escape_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len() * 3);
    for ch in json.chars() {
        match ch {
            ' ' => out.push('+'),
            '{' | '}' | '"' | ':' | ',' => {
                // Infallible: writing into a String.
                let _ = write!(out, "%{:02X}", u32::from(ch));
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_json;

    #[test]
    fn escapes_the_fixed_character_set() {
        assert_eq!(escape_json(r#"{"T":100}"#), "%7B%22T%22%3A100%7D");
    }

    #[test]
    fn space_becomes_plus() {
        assert_eq!(escape_json("a b"), "a+b");
    }

    #[test]
    fn leaves_other_characters_alone() {
        // '.', '-', '&', '=' and '%' are outside the device's escape set.
        assert_eq!(escape_json("-0.25&x=%"), "-0.25&x=%");
    }

    #[test]
    fn move_command_round_trip_text() {
        let json = r#"{"T":101,"joint":2,"rad":0.60,"spd":0,"acc":10}"#;
        assert_eq!(
            escape_json(json),
            "%7B%22T%22%3A101%2C%22joint%22%3A2%2C%22rad%22%3A0.60%2C%22spd%22%3A0%2C%22acc%22%3A10%7D"
        );
    }
}
