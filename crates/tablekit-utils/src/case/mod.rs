#[cfg(test)]
mod tests;

use convert_case::{Case, Casing};

/// Identifiers that keep their spelling under every convention.
const RESERVED_KEY_NAMES: [&str; 2] = ["PK", "SK"];

///
/// camel_case
///
/// Lower camel case with acronym handling: `UserID` -> `userID`,
/// `URLValue` -> `urlValue`. `PK` and `SK` pass through untouched.
///

#[must_use]
pub fn camel_case(name: &str) -> String {
    if name.is_empty() || RESERVED_KEY_NAMES.contains(&name) {
        return name.to_string();
    }

    // separated words go through the generic converter
    if name.contains(['_', '-', ' ']) {
        return name.to_case(Case::Camel);
    }

    let chars: Vec<char> = name.chars().collect();
    if chars.len() == 1 {
        return name.to_lowercase();
    }

    // lowercase the leading run of capitals, but keep the capital that
    // starts the next word
    let mut boundary = 1;
    while boundary < chars.len() && chars[boundary].is_uppercase() {
        if boundary + 1 < chars.len() && !chars[boundary + 1].is_uppercase() {
            break;
        }
        boundary += 1;
    }

    let prefix: String = chars[..boundary].iter().collect::<String>().to_lowercase();
    let rest: String = chars[boundary..].iter().collect();

    format!("{prefix}{rest}")
}

///
/// snake_case
///
/// Snake case with acronym handling: `UserID` -> `user_id`,
/// `URLValue` -> `url_value`.
///

#[must_use]
pub fn snake_case(name: &str) -> String {
    if name.is_empty() || RESERVED_KEY_NAMES.contains(&name) {
        return name.to_string();
    }

    name.to_case(Case::Snake)
}
