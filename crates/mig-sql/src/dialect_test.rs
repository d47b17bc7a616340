use super::*;

#[test]
fn test_mysql_tokenize() {
    let dialect = MySqlDialect::new();
    let tokens = dialect.tokenize("SELECT `id` FROM users").unwrap();
    assert!(tokens.iter().any(|t| matches!(t, Token::Word(w) if w.value == "id")));
}

#[test]
fn test_quote_ident() {
    let dialect = MySqlDialect::new();
    assert_eq!(dialect.quote_ident("user"), "`user`");
    assert_eq!(dialect.quote_ident("user`name"), "`user``name`");
    assert_eq!(dialect.name(), "mysql");
}

#[test]
fn test_quote_string_escapes() {
    assert_eq!(quote_string("plain"), "'plain'");
    assert_eq!(quote_string("it's"), "'it''s'");
    assert_eq!(quote_string("a\\b"), "'a\\\\b'");
}

#[test]
fn test_tokenize_error_is_reported() {
    let dialect = MySqlDialect::new();
    let result = dialect.tokenize("SELECT 'unterminated");
    assert!(matches!(result, Err(SqlError::Tokenize { .. })));
}

#[test]
fn test_parse_location_from_error() {
    assert_eq!(
        parse_location_from_error("Unterminated string literal at Line: 3, Column: 14"),
        (3, 14)
    );
    assert_eq!(parse_location_from_error("no location"), (0, 0));
}
