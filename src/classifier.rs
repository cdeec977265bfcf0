use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::naming::{NamingRule, ParsedName, Platform};

/// 同じ固有IDを持つ有効項目のまとまり
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub unique_id: String,
    pub names: Vec<String>,
    pub platforms: Vec<Platform>,
}

impl DuplicateGroup {
    fn new(unique_id: &str) -> Self {
        Self {
            unique_id: unique_id.to_string(),
            names: Vec::new(),
            platforms: Vec::new(),
        }
    }

    fn push(&mut self, name: &str, platform: Platform) {
        self.names.push(name.to_string());
        if !self.platforms.contains(&platform) {
            self.platforms.push(platform);
        }
    }

    /// ID は全プラットフォーム共通のキーとして比較しているため、
    /// 別プラットフォーム同士の偶然の一致もここに含まれる
    pub fn is_cross_platform(&self) -> bool {
        self.platforms.len() > 1
    }
}

/// 分類結果
#[derive(Debug, Clone, Default)]
pub struct ClassificationResult {
    pub valid: Vec<(String, ParsedName)>,
    pub invalid: Vec<String>,
    /// 重複グループに属する全項目（先頭の1件も含む）
    pub duplicate: Vec<String>,
    pub duplicate_groups: Vec<DuplicateGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Valid,
    Duplicate,
    Invalid,
}

impl ItemStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::Valid => "有効",
            ItemStatus::Duplicate => "重複",
            ItemStatus::Invalid => "無効",
        }
    }
}

/// レポート1行分
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedName>,
}

impl ReportRow {
    fn column(&self, key: SortKey) -> String {
        let parsed = self.parsed.as_ref();
        match key {
            SortKey::Item => self.name.clone(),
            SortKey::Status => self.status.label().to_string(),
            SortKey::Platform => parsed.map_or("-".into(), |p| p.platform.to_string()),
            SortKey::Genre => parsed.map_or("-".into(), |p| p.genre.to_string()),
            SortKey::Id => parsed.map_or("-".into(), |p| p.unique_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Item,
    Status,
    Platform,
    Genre,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub duplicate: usize,
}

impl ClassificationResult {
    pub fn summary(&self) -> Summary {
        Summary {
            total: self.valid.len() + self.invalid.len(),
            valid: self.valid.len(),
            invalid: self.invalid.len(),
            duplicate: self.duplicate.len(),
        }
    }

    /// 有効（重複含む）の行を先に、無効の行を後に並べる
    pub fn rows(&self) -> Vec<ReportRow> {
        let duplicates: HashSet<&str> = self.duplicate.iter().map(String::as_str).collect();

        let valid_rows = self.valid.iter().map(|(name, parsed)| ReportRow {
            name: name.clone(),
            status: if duplicates.contains(name.as_str()) {
                ItemStatus::Duplicate
            } else {
                ItemStatus::Valid
            },
            parsed: Some(parsed.clone()),
        });
        let invalid_rows = self.invalid.iter().map(|name| ReportRow {
            name: name.clone(),
            status: ItemStatus::Invalid,
            parsed: None,
        });

        valid_rows.chain(invalid_rows).collect()
    }

    pub fn parsed(&self, name: &str) -> Option<&ParsedName> {
        self.valid
            .iter()
            .find(|(valid_name, _)| valid_name == name)
            .map(|(_, parsed)| parsed)
    }
}

/// 表示列で行を並べ替える（安定ソート）
pub fn sort_rows(rows: &mut [ReportRow], key: SortKey, descending: bool) {
    rows.sort_by(|a, b| {
        let ordering: Ordering = a.column(key).cmp(&b.column(key));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// 項目一覧を 有効 / 無効 / 重複 に分類
pub struct Classifier;

impl Classifier {
    pub fn classify<S: AsRef<str>>(items: &[S]) -> ClassificationResult {
        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<DuplicateGroup> = Vec::new();

        for item in items {
            let name = item.as_ref();
            match NamingRule::parse(name) {
                Some(parsed) => {
                    let idx = *group_index
                        .entry(parsed.unique_id.clone())
                        .or_insert_with(|| {
                            groups.push(DuplicateGroup::new(&parsed.unique_id));
                            groups.len() - 1
                        });
                    groups[idx].push(name, parsed.platform);
                    valid.push((name.to_string(), parsed));
                }
                None => {
                    log::debug!("命名規則に一致しません: {name}");
                    invalid.push(name.to_string());
                }
            }
        }

        groups.retain(|group| group.names.len() > 1);
        for group in groups.iter().filter(|g| g.is_cross_platform()) {
            log::warn!(
                "固有ID {} が複数のプラットフォームで使われています: {:?}",
                group.unique_id,
                group.platforms
            );
        }

        let duplicate = groups
            .iter()
            .flat_map(|group| group.names.iter().cloned())
            .collect();

        ClassificationResult {
            valid,
            invalid,
            duplicate,
            duplicate_groups: groups,
        }
    }
}
