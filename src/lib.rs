// envkeeperライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメイン（モデル、設定、エラー、マイグレーション）
// - adapters: データベースと.envファイルへのアクセスを抽象化
// - services: 設定解決、マイグレーション探索、key=value解析、子プロセス実行

pub mod cli;
pub mod core;
pub mod adapters;
pub mod services;
