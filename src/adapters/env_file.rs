// .envファイルアダプター
//
// 読み込みは dotenvy に任せ（コメント、`export` プレフィックス、クォートを解釈）、
// 書き出しは `KEY=VALUE` 形式で、必要な値のみクォートします。

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

/// .envファイルを読み込み、ファイル内の出現順で (key, value) を返す
pub fn read_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    ensure_file_exists(path)?;

    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open .env file: {:?}", path))?;

    let mut pairs = Vec::new();
    for item in iter {
        let (key, value) = item.with_context(|| format!("Failed to parse .env file: {:?}", path))?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

/// (key, value) を .env 形式でファイルに書き出す
pub fn write_env_file<'a, I>(path: &Path, pairs: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fs::write(path, render_env(pairs))
        .with_context(|| format!("Failed to write .env file: {:?}", path))
}

/// (key, value) を .env 形式の文字列に変換
pub fn render_env<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut content = String::new();
    for (key, value) in pairs {
        content.push_str(key);
        content.push('=');
        content.push_str(&format_env_value(value));
        content.push('\n');
    }
    content
}

/// 値を .env 出力用に整形
///
/// 読み戻したときに同じ値になるよう、必要な場合のみクォートします。
/// - `$` を含む値は変数展開を避けるためシングルクォート
/// - 空白・クォート・バッククォート・`#` を含む値はダブルクォート（`\\` `"` `$` 改行をエスケープ）
///
/// dotenvy は `\r` エスケープを受け付けないため、CR はクォート内にそのまま書きます。
pub fn format_env_value(value: &str) -> String {
    let has_dollar = value.contains('$');
    let needs_quotes = has_dollar
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '#' | '\\'));
    if !needs_quotes {
        return value.to_string();
    }

    if has_dollar && !value.contains(['\'', '\n', '\r']) {
        return format!("'{}'", value);
    }

    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

/// パスが存在する通常ファイルであることを確認
pub fn ensure_file_exists(path: &Path) -> Result<()> {
    let metadata =
        fs::metadata(path).map_err(|_| anyhow!("File does not exist: {}", path.display()))?;
    if metadata.is_dir() {
        return Err(anyhow!("Expected file, got directory: {}", path.display()));
    }
    Ok(())
}
