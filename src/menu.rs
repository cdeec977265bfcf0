use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use inquire::{Confirm, MultiSelect, Select, Text};

use crate::naming::{Field, FieldOrder, NameFields};
use crate::scanner::{DEFAULT_EXTENSIONS, ExtensionFilter};

#[derive(Clone, Copy)]
pub enum MenuAction {
    Validate,
    Rename,
    Exit,
}

pub struct Menu;

#[derive(Clone)]
struct MenuChoice {
    label: &'static str,
    action: MenuAction,
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

#[derive(Clone)]
struct ExtensionChoice(String);

impl fmt::Display for ExtensionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "フォルダ/拡張子なし")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Menu {
    pub fn show_main_menu() -> Result<MenuAction> {
        let choices = vec![
            MenuChoice {
                label: "フォルダ内の名前を検証する",
                action: MenuAction::Validate,
            },
            MenuChoice {
                label: "選択した項目をリネームする（プレビュー後に適用）",
                action: MenuAction::Rename,
            },
            MenuChoice {
                label: "終了する",
                action: MenuAction::Exit,
            },
        ];

        let selected =
            Select::new("実行したいアクションを選択してください", choices)
                .prompt()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        Ok(selected.action)
    }

    pub fn ask_root() -> Result<PathBuf> {
        let path = Text::new("フォルダのパス")
            .with_default(".")
            .prompt()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        Ok(PathBuf::from(path.trim()))
    }

    /// 既定の拡張子から選び、任意の拡張子を追加できる
    pub fn ask_extensions() -> Result<ExtensionFilter> {
        let choices: Vec<ExtensionChoice> = DEFAULT_EXTENSIONS
            .iter()
            .map(|ext| ExtensionChoice(ext.to_string()))
            .collect();
        let all: Vec<usize> = (0..choices.len()).collect();

        let mut selected: Vec<String> = MultiSelect::new("対象とする拡張子", choices)
            .with_default(&all)
            .prompt()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?
            .into_iter()
            .map(|choice| choice.0)
            .collect();

        let custom = Text::new("追加の拡張子（カンマ区切り、空欄でスキップ）")
            .prompt()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        selected.extend(
            custom
                .split(',')
                .map(str::trim)
                .filter(|ext| !ext.is_empty())
                .map(str::to_string),
        );

        Ok(ExtensionFilter::new(selected))
    }

    pub fn select_items(names: Vec<String>) -> Result<Vec<String>> {
        MultiSelect::new("リネームする項目を選択してください", names)
            .with_page_size(15)
            .prompt()
            .map_err(|e| anyhow::anyhow!(e.to_string()))
    }

    pub fn ask_field_order(current: FieldOrder) -> Result<FieldOrder> {
        let answer = Text::new("フィールド順（[0]-[1] 2 (3)_4 の順に並べる）")
            .with_default(&current.to_string())
            .with_validator(|input: &str| {
                Ok(match input.parse::<FieldOrder>() {
                    Ok(_) => inquire::validator::Validation::Valid,
                    Err(e) => inquire::validator::Validation::Invalid(e.to_string().into()),
                })
            })
            .prompt()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        Ok(answer.parse()?)
    }

    /// 1件だけ選択された場合に各フィールドを編集する
    pub fn edit_fields(current: &NameFields) -> Result<Vec<(Field, String)>> {
        let mut overrides = Vec::new();
        for field in Field::ALL {
            let original = current.get(field);
            let value = Text::new(&format!("{}:", field.label()))
                .with_default(original)
                .prompt()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            if value != original {
                overrides.push((field, value));
            }
        }
        Ok(overrides)
    }

    pub fn confirm_execution(action_count: usize) -> Result<bool> {
        Confirm::new(&format!("{action_count}件の変更を適用しますか？"))
            .with_default(true)
            .prompt()
            .map_err(|e| anyhow::anyhow!(e.to_string()))
    }
}
