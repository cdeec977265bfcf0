use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{FieldOrderError, FieldParseError};

/// ジャンルタグ（括弧内の3文字コード）
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Genre {
    RPG,
    ACT,
    SIM,
    ADV,
    VOD,
    SHT,
    NOV,
    ANO,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::RPG,
        Genre::ACT,
        Genre::SIM,
        Genre::ADV,
        Genre::VOD,
        Genre::SHT,
        Genre::NOV,
        Genre::ANO,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::RPG => "RPG",
            Genre::ACT => "ACT",
            Genre::SIM => "SIM",
            Genre::ADV => "ADV",
            Genre::VOD => "VOD",
            Genre::SHT => "SHT",
            Genre::NOV => "NOV",
            Genre::ANO => "ANO",
        }
    }

    /// 大文字のトークンと完全一致した場合のみ受理する
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|genre| genre.as_str() == token)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 配信元プラットフォーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Platform {
    DLsite,
    VNdb,
    Getchu,
    Fanza,
    Steam,
}

impl Platform {
    /// 文法を試す順番。Fanza/Steam は ID が無制約なので最後に回す
    pub const ALL: [Platform; 5] = [
        Platform::DLsite,
        Platform::VNdb,
        Platform::Getchu,
        Platform::Fanza,
        Platform::Steam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::DLsite => "DLsite",
            Platform::VNdb => "VNdb",
            Platform::Getchu => "Getchu",
            Platform::Fanza => "Fanza",
            Platform::Steam => "Steam",
        }
    }

    /// 名前の末尾に付くリテラル（例: `_DLsite`）
    pub fn suffix(&self) -> String {
        format!("_{}", self.as_str())
    }

    fn id_pattern(&self) -> &'static str {
        match self {
            Platform::DLsite => r"[RV]J\d+",
            Platform::VNdb => r"v\d+",
            Platform::Getchu => r"\d+",
            Platform::Fanza | Platform::Steam => r".+?",
        }
    }

    /// プラットフォームごとの固有ID規則
    pub fn accepts_id(&self, id: &str) -> bool {
        match self {
            Platform::DLsite => ["RJ", "VJ"]
                .into_iter()
                .any(|prefix| id.strip_prefix(prefix).is_some_and(is_digits)),
            Platform::VNdb => id.strip_prefix('v').is_some_and(is_digits),
            Platform::Getchu => is_digits(id),
            Platform::Fanza | Platform::Steam => !id.is_empty(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_numeric)
}

/// 命名規則に一致した名前の構造
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedName {
    pub creator: String,
    pub unique_id: String,
    pub game_title: String,
    pub genre: Genre,
    pub platform: Platform,
}

impl ParsedName {
    pub fn fields(&self) -> NameFields {
        NameFields {
            creator: self.creator.clone(),
            unique_id: self.unique_id.clone(),
            game_title: self.game_title.clone(),
            genre: self.genre.to_string(),
            platform: self.platform.to_string(),
        }
    }
}

struct Grammar {
    platform: Platform,
    pattern: Regex,
}

// `[制作者]-[ID] タイトル (ジャンル)_Platform...` 形式。
// 末尾のプラットフォーム名はそれぞれ異なるので、どの名前も高々1つの文法にしか
// 構造的に一致しない。順番に依存しているのは ID が無制約な Fanza/Steam だけ。
static GRAMMARS: LazyLock<Vec<Grammar>> = LazyLock::new(|| {
    Platform::ALL
        .into_iter()
        .map(|platform| {
            let pattern = format!(
                r"^\[(.+?)\]-\[({})\] (.+?) \(([A-Z]+)\){}.*$",
                platform.id_pattern(),
                regex::escape(&platform.suffix())
            );
            Grammar {
                platform,
                pattern: Regex::new(&pattern).expect("naming grammar must compile"),
            }
        })
        .collect()
});

/// ファイル名の命名規則チェック
pub struct NamingRule;

impl NamingRule {
    /// ゲーム名規則:
    /// [制作者]-[固有ID] タイトル (ジャンル)_[DLsite|VNdb|Getchu|Fanza|Steam]...
    ///
    /// 構造が一致してもジャンルや ID が規則外なら `None`。
    pub fn parse(name: &str) -> Option<ParsedName> {
        GRAMMARS.iter().find_map(|grammar| {
            let caps = grammar.pattern.captures(name)?;
            let genre = Genre::from_token(&caps[4])?;
            let unique_id = &caps[2];
            if !grammar.platform.accepts_id(unique_id) {
                log::debug!(
                    "{} の ID 規則に合いません: {unique_id}",
                    grammar.platform
                );
                return None;
            }

            Some(ParsedName {
                creator: caps[1].to_string(),
                unique_id: unique_id.to_string(),
                game_title: caps[3].to_string(),
                genre,
                platform: grammar.platform,
            })
        })
    }
}

/// 名前を構成するフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Creator,
    UniqueId,
    GameTitle,
    Genre,
    Platform,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Creator,
        Field::UniqueId,
        Field::GameTitle,
        Field::Genre,
        Field::Platform,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Field::Creator => "creator",
            Field::UniqueId => "unique_id",
            Field::GameTitle => "game_title",
            Field::Genre => "genre",
            Field::Platform => "platform",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Creator => "制作者",
            Field::UniqueId => "固有ID",
            Field::GameTitle => "タイトル",
            Field::Genre => "ジャンル",
            Field::Platform => "プラットフォーム",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "creator" => Ok(Field::Creator),
            "unique_id" | "id" => Ok(Field::UniqueId),
            "game_title" | "title" => Ok(Field::GameTitle),
            "genre" => Ok(Field::Genre),
            "platform" => Ok(Field::Platform),
            _ => Err(FieldParseError(s.trim().to_string())),
        }
    }
}

/// 5つのフィールドの並び順（必ず全フィールドを1回ずつ含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOrder([Field; 5]);

impl FieldOrder {
    pub fn new(fields: &[Field]) -> Result<Self, FieldOrderError> {
        let order: [Field; 5] = fields
            .try_into()
            .map_err(|_| FieldOrderError::WrongLength(fields.len()))?;
        for (idx, field) in order.iter().enumerate() {
            if order[..idx].contains(field) {
                return Err(FieldOrderError::Repeated(*field));
            }
        }
        Ok(Self(order))
    }

    pub fn fields(&self) -> [Field; 5] {
        self.0
    }
}

impl Default for FieldOrder {
    fn default() -> Self {
        Self(Field::ALL)
    }
}

impl FromStr for FieldOrder {
    type Err = FieldOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .split(',')
            .filter(|token| !token.trim().is_empty())
            .map(Field::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&fields)
    }
}

impl fmt::Display for FieldOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.0.iter().map(Field::key).collect();
        f.write_str(&keys.join(","))
    }
}

/// リネーム前にユーザーが編集するフィールド値
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFields {
    pub creator: String,
    pub unique_id: String,
    pub game_title: String,
    pub genre: String,
    pub platform: String,
}

impl NameFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Creator => &self.creator,
            Field::UniqueId => &self.unique_id,
            Field::GameTitle => &self.game_title,
            Field::Genre => &self.genre,
            Field::Platform => &self.platform,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Creator => &mut self.creator,
            Field::UniqueId => &mut self.unique_id,
            Field::GameTitle => &mut self.game_title,
            Field::Genre => &mut self.genre,
            Field::Platform => &mut self.platform,
        };
        *slot = value.into();
    }
}

/// フィールド値を `order` の順に `[F0]-[F1] F2 (F3)_F4` へ並べる
pub fn compute_new_name(fields: &NameFields, order: &FieldOrder) -> String {
    let [f0, f1, f2, f3, f4] = order.fields().map(|field| fields.get(field));
    format!("[{f0}]-[{f1}] {f2} ({f3})_{f4}")
}
