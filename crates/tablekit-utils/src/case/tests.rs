use super::*;

#[test]
fn camel_case_lowers_leading_word() {
    assert_eq!(camel_case("FirstName"), "firstName");
    assert_eq!(camel_case("CreatedAt"), "createdAt");
    assert_eq!(camel_case("ID"), "id");
    assert_eq!(camel_case("X"), "x");
}

#[test]
fn camel_case_handles_acronym_prefix() {
    assert_eq!(camel_case("URLValue"), "urlValue");
    assert_eq!(camel_case("UserID"), "userID");
}

#[test]
fn camel_case_keeps_reserved_key_names() {
    assert_eq!(camel_case("PK"), "PK");
    assert_eq!(camel_case("SK"), "SK");
}

#[test]
fn camel_case_converts_separated_words() {
    assert_eq!(camel_case("first_name"), "firstName");
}

#[test]
fn snake_case_splits_words() {
    assert_eq!(snake_case("FirstName"), "first_name");
    assert_eq!(snake_case("createdAt"), "created_at");
    assert_eq!(snake_case("PK"), "PK");
}
