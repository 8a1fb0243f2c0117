// 子プロセス実行
//
// 保存済みの変数を環境に注入してシェルコマンドを起動し、終了コードを返します。
// 標準入出力は親プロセスから引き継ぎます。

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::env;
use std::process::Command;
use tracing::debug;

/// シグナル終了などで終了コードが得られない場合に返す値
pub const FALLBACK_EXIT_CODE: i32 = 1;

/// プラットフォームのシェルでコマンドを組み立てる
fn shell_command(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command_line]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command_line]);
        cmd
    }
}

/// 現在の環境変数に `vars` を重ねた環境でコマンドを実行
///
/// 同名の変数は `vars` 側が優先されます。
pub fn run_with_env<'a, I>(command_line: &str, vars: I) -> Result<i32>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if command_line.trim().is_empty() {
        return Err(anyhow!("No command specified for --run"));
    }

    let mut env_vars: HashMap<String, String> = env::vars().collect();
    let mut injected = 0usize;
    for (key, value) in vars {
        env_vars.insert(key.to_string(), value.to_string());
        injected += 1;
    }

    debug!(command = command_line, injected, "Running command with injected variables");

    let mut cmd = shell_command(command_line);
    cmd.env_clear();
    cmd.envs(&env_vars);

    let status = cmd
        .status()
        .with_context(|| format!("Failed to run command: {}", command_line))?;

    Ok(status.code().unwrap_or(FALLBACK_EXIT_CODE))
}
