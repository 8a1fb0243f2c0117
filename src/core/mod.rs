// Core Domain
// 設定、エラー、ドメインモデル、マイグレーションモデル

pub mod config;
pub mod error;
pub mod migration;
pub mod models;
pub mod naming;
