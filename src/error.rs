use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::naming::Field;

/// 未知のフィールド名
#[derive(Debug, Error)]
#[error("不明なフィールドです: '{0}' (creator, unique_id, game_title, genre, platform のいずれか)")]
pub struct FieldParseError(pub String);

/// フィールド順の指定が不正
#[derive(Debug, Error)]
pub enum FieldOrderError {
    #[error("フィールドは5つ指定してください（指定数: {0}）")]
    WrongLength(usize),

    #[error("フィールドが重複しています: {0}")]
    Repeated(Field),

    #[error(transparent)]
    UnknownField(#[from] FieldParseError),
}

/// 1件ごとのリネーム失敗。バッチ全体は止めない
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("新しい名前にパス区切りや特殊な要素は使えません: {0:?}")]
    InvalidName(String),

    #[error("変更先が既に存在します: {0:?}")]
    TargetExists(PathBuf),

    #[error("変更元が見つかりません: {0:?}")]
    SourceMissing(PathBuf),

    #[error("アクセスが拒否されました: {0:?}")]
    PermissionDenied(PathBuf),

    #[error("リネームに失敗: {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RenameError {
    /// `fs::rename` の失敗を分類する
    pub fn from_io(source: io::Error, from: PathBuf, to: PathBuf) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::SourceMissing(from),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(from),
            io::ErrorKind::AlreadyExists => Self::TargetExists(to),
            _ => Self::Io { path: from, source },
        }
    }
}

/// 設定ファイルの読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("設定ファイルを読み込めません: {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("設定ファイルの形式が不正です: {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("設定ファイルの field_order が不正です: {0}")]
    FieldOrder(#[from] FieldOrderError),
}
