// ドメインモデル
//
// プロジェクト・環境・環境変数の3エンティティと、
// 変数スロットの存在状態を表す型を定義します。

use chrono::{DateTime, Utc};
use serde::Serialize;

/// プロジェクト
///
/// `deleted_at` が設定されている行は論理削除済みとして扱います。
/// 名前の一意性は有効な行の間でのみ保証されます。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Project {
    /// 論理削除されていないか
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// 環境（development, sit, uat など）
///
/// 全プロジェクトで共有され、論理削除されません。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 環境変数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvVariable {
    pub id: String,
    pub project_id: String,
    pub environment_id: String,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EnvVariable {
    /// 論理削除されていないか
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// (project, environment, key) スロットの現在の状態
///
/// 変数の設定時はこの3状態のいずれかに応じて
/// 挿入・更新・再有効化のどれか1つを実行します。
#[derive(Debug, Clone, PartialEq)]
pub enum VariableSlot {
    /// 行が存在しない
    Vacant,
    /// 有効な行が存在する
    Active(EnvVariable),
    /// 論理削除済みの行が存在する
    Deleted(EnvVariable),
}

impl VariableSlot {
    /// 既存行（有無を問わず）から状態を決定
    pub fn from_existing(existing: Option<EnvVariable>) -> Self {
        match existing {
            None => VariableSlot::Vacant,
            Some(var) if var.is_active() => VariableSlot::Active(var),
            Some(var) => VariableSlot::Deleted(var),
        }
    }
}

/// 変数設定の結果種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOutcome {
    Created,
    Updated,
    Reactivated,
}

impl std::fmt::Display for SetOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetOutcome::Created => write!(f, "created"),
            SetOutcome::Updated => write!(f, "updated"),
            SetOutcome::Reactivated => write!(f, "reactivated"),
        }
    }
}
