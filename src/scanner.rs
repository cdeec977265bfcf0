use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;

/// フォルダ/拡張子なしを表す指定
pub const FOLDER_SENTINEL: &str = "";

/// 既定で対象とする拡張子
pub const DEFAULT_EXTENSIONS: [&str; 4] = [".zip", ".rar", ".7z", FOLDER_SENTINEL];

/// ファイル情報
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    /// 小文字・ドット付き（例: `.zip`）。拡張子なしは空文字
    pub extension: String,
    pub is_dir: bool,
}

/// 対象とする拡張子の集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    entries: BTreeSet<String>,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: extensions
                .into_iter()
                .map(|ext| Self::normalize(ext.as_ref()))
                .collect(),
        }
    }

    /// `ZIP` / `.zip` / ` .Zip ` はすべて `.zip` として扱う
    pub fn normalize(extension: &str) -> String {
        let trimmed = extension.trim().to_lowercase();
        if trimmed.is_empty() || trimmed.starts_with('.') {
            trimmed
        } else {
            format!(".{trimmed}")
        }
    }

    pub fn includes_folders(&self) -> bool {
        self.entries.contains(FOLDER_SENTINEL)
    }

    pub fn accepts(&self, info: &FileInfo) -> bool {
        if info.is_dir {
            return self.includes_folders();
        }
        self.includes_folders() || self.entries.contains(&info.extension)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

/// ルート直下のファイル/フォルダを列挙する
pub struct Collector;

impl Collector {
    /// 直下の項目のうちフィルタに一致するものを返す（再帰しない）
    ///
    /// 並び順はファイルシステムの列挙順のまま。ソートが必要なら呼び出し側で行う。
    pub fn list_items(root: &Path, filter: &ExtensionFilter) -> Result<Vec<FileInfo>> {
        if !root.is_dir() {
            bail!("フォルダが見つかりません: {:?}", root);
        }

        let mut items = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let entry =
                entry.with_context(|| format!("ディレクトリの読み込みに失敗: {:?}", root))?;

            let path = entry.path();
            let is_dir = path.is_dir();
            if !is_dir && !path.is_file() {
                log::debug!("ファイルでもフォルダでもない項目を無視: {:?}", path);
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            let extension = if is_dir {
                String::new()
            } else {
                path.extension()
                    .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                    .unwrap_or_default()
            };

            let info = FileInfo {
                name,
                extension,
                is_dir,
            };
            if filter.accepts(&info) {
                items.push(info);
            }
        }

        log::info!("{:?} から {}件の項目を取得", root, items.len());
        Ok(items)
    }

    pub fn list_names(root: &Path, filter: &ExtensionFilter) -> Result<Vec<String>> {
        Ok(Self::list_items(root, filter)?
            .into_iter()
            .map(|info| info.name)
            .collect())
    }
}
