// key=value 形式の解析

use crate::core::error::KeyValueError;

/// `key=value` 形式の文字列を (key, value) に分割
///
/// 最初の `=` で分割し、キーと値の前後の空白を取り除きます。
/// 値に含まれる `=` はそのまま保持されます。
pub fn parse_key_value(input: &str) -> Result<(String, String), KeyValueError> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| KeyValueError::InvalidFormat {
            input: input.to_string(),
        })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(KeyValueError::EmptyKey {
            input: input.to_string(),
        });
    }

    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_pair() {
        assert_eq!(
            parse_key_value("KEY=value").unwrap(),
            ("KEY".to_string(), "value".to_string())
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(
            parse_key_value("  KEY  =  value  ").unwrap(),
            ("KEY".to_string(), "value".to_string())
        );
    }

    #[test]
    fn test_parse_empty_value() {
        assert_eq!(
            parse_key_value("KEY=").unwrap(),
            ("KEY".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_keeps_later_equals_in_value() {
        assert_eq!(
            parse_key_value("URL=postgres://h/db?sslmode=disable").unwrap(),
            (
                "URL".to_string(),
                "postgres://h/db?sslmode=disable".to_string()
            )
        );
    }

    #[test]
    fn test_parse_missing_separator() {
        let err = parse_key_value("KEY").unwrap_err();

        assert_eq!(
            err,
            KeyValueError::InvalidFormat {
                input: "KEY".to_string()
            }
        );
        assert_eq!(err.to_string(), "invalid format: KEY (expected key=value)");
    }

    #[test]
    fn test_parse_empty_key() {
        assert!(matches!(
            parse_key_value("=value"),
            Err(KeyValueError::EmptyKey { .. })
        ));
    }
}
