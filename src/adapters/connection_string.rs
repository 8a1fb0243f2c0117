// 接続文字列ビルダー
//
// DatabaseConfig から sqlx の Any ドライバー向け接続文字列を生成する。

use crate::core::config::{DatabaseConfig, Dialect};

/// 接続文字列を生成
pub fn build_connection_string(config: &DatabaseConfig) -> String {
    if let Some(url) = config.url.as_deref() {
        return url.to_string();
    }

    match config.dialect {
        Dialect::PostgreSQL => {
            let user = config.user.as_deref().unwrap_or("postgres");
            let auth = match config.password.as_deref() {
                Some(password) if !password.is_empty() => format!(
                    "{}:{}",
                    urlencoding::encode(user),
                    urlencoding::encode(password)
                ),
                _ => urlencoding::encode(user).to_string(),
            };
            let mut url = format!(
                "postgresql://{}@{}:{}/{}",
                auth,
                config.host,
                config.resolved_port(),
                config.database
            );
            if let Some(ssl_mode) = &config.ssl_mode {
                url.push_str(&format!("?sslmode={}", ssl_mode));
            }
            url
        }
        // 存在しない場合はファイルを作成する
        Dialect::SQLite => format!("sqlite://{}?mode=rwc", config.database),
    }
}

/// 接続文字列からパスワードを伏せた表示用文字列を生成
pub fn redact_connection_string(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((auth, host)) = rest.split_once('@') else {
        return url.to_string();
    };
    match auth.split_once(':') {
        Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
        None => url.to_string(),
    }
}
