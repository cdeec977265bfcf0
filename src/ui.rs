use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::classifier::{
    ClassificationResult, DuplicateGroup, ItemStatus, ReportRow, SortKey, Summary, sort_rows,
};
use crate::naming::FieldOrder;
use crate::renamer::{RenamePlan, RenameSummary};
use crate::scanner::ExtensionFilter;

pub struct UI;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    root: &'a Path,
    summary: Summary,
    items: Vec<ReportRow>,
    duplicate_groups: &'a [DuplicateGroup],
}

impl UI {
    pub fn print_title() {
        println!("{}", "namecheck".bright_cyan().bold());
        println!(
            "{}",
            "ゲームのファイル/フォルダ名を検証・整形するツール".bright_black()
        );
        println!("{}", "引数なしで実行すると、インタラクティブメニューが表示されます。".bright_black());
        Self::separator();
    }

    pub fn separator() {
        println!(
            "{}",
            "──────────────────────────────────────────────".bright_black()
        );
    }

    pub fn section(title: &str) {
        println!("\n{}", format!("■ {}", title).bright_white().bold());
        Self::separator();
    }

    pub fn info(message: &str) {
        println!("{}", format!("ℹ {message}").bright_blue());
    }

    pub fn success(message: &str) {
        println!("{}", format!("✓ {message}").bright_green().bold());
    }

    pub fn warning(message: &str) {
        println!("{}", format!("⚠ {message}").bright_yellow());
    }

    pub fn error(message: &str) {
        println!("{}", format!("✗ {message}").bright_red().bold());
    }

    pub fn loading(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(80));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message.to_string());
        pb
    }

    pub fn progress(len: usize) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap()
                .progress_chars("=> "),
        );
        pb
    }

    pub fn render_classification(
        root: &Path,
        filter: &ExtensionFilter,
        result: &ClassificationResult,
        sort: Option<(SortKey, bool)>,
        verbose: bool,
    ) {
        let extensions: Vec<&str> = filter
            .iter()
            .map(|ext| if ext.is_empty() { "(フォルダ/拡張子なし)" } else { ext })
            .collect();
        println!("{} {}", "対象フォルダ:".bright_cyan().bold(), root.display());
        println!("{} {}", "対象拡張子:".bright_cyan(), extensions.join(" "));

        let mut rows = result.rows();
        if let Some((key, descending)) = sort {
            sort_rows(&mut rows, key, descending);
        }
        Self::preview_lines(rows.iter().map(Self::format_row), verbose);

        let cross_platform = result
            .duplicate_groups
            .iter()
            .filter(|group| group.is_cross_platform());
        for group in cross_platform {
            let platforms: Vec<&str> = group.platforms.iter().map(|p| p.as_str()).collect();
            Self::warning(&format!(
                "固有ID {} は別プラットフォーム間で重複しています（{}）",
                group.unique_id,
                platforms.join(" / ")
            ));
        }

        let summary = result.summary();
        Self::separator();
        println!("{} {}", "総項目数:".bright_cyan(), summary.total);
        println!("{} {}", "有効:".bright_green(), summary.valid);
        println!("{} {}", "無効:".bright_red(), summary.invalid);
        println!("{} {}", "重複:".bright_yellow(), summary.duplicate);
    }

    pub fn render_json(root: &Path, result: &ClassificationResult) -> Result<()> {
        let report = JsonReport {
            generated_at: Local::now().to_rfc3339(),
            root,
            summary: result.summary(),
            items: result.rows(),
            duplicate_groups: &result.duplicate_groups,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

    pub fn render_plan(plan: &RenamePlan, order: &FieldOrder, verbose: bool) {
        println!("{} {}", "フィールド順:".bright_cyan(), order);
        println!("{} {}", "リネーム数:".bright_cyan(), plan.actions.len());
        if !plan.actions.is_empty() {
            let lines = plan
                .actions
                .iter()
                .map(|action| format!("✎ {} → {}", action.old_name, action.new_name));
            Self::preview_lines(lines, verbose);
        }
        if !plan.unchanged.is_empty() {
            Self::info(&format!("既に正規形の項目: {}件", plan.unchanged.len()));
        }
        if !plan.unparsed.is_empty() {
            Self::warning(&format!(
                "命名規則に一致しないためスキップ: {}件",
                plan.unparsed.len()
            ));
            Self::preview_lines(
                plan.unparsed.iter().map(|name| format!("  {}", name.bright_black())),
                verbose,
            );
        }
    }

    pub fn render_rename_summary(summary: &RenameSummary) {
        Self::section("リネーム結果");
        Self::success(&format!("{}件の項目をリネームしました。", summary.renamed.len()));
        if !summary.failed.is_empty() {
            Self::error(&format!("{}件の項目で失敗しました。", summary.failed.len()));
            Self::print_failures(summary);
        }
    }

    /// ドライランの結果。適用時に失敗する項目を先に示す
    pub fn render_dry_run(summary: &RenameSummary) {
        if summary.failed.is_empty() {
            Self::success(&format!("{}件すべて適用できます。", summary.renamed.len()));
        } else {
            Self::warning(&format!(
                "{}件の項目は適用時に失敗します。",
                summary.failed.len()
            ));
            Self::print_failures(summary);
        }
    }

    fn print_failures(summary: &RenameSummary) {
        for (action, error) in &summary.failed {
            println!("  ✗ {}", action.old_name);
            println!("    {}", error.to_string().bright_red());
        }
    }

    fn format_row(row: &ReportRow) -> String {
        let (platform, genre, id) = match &row.parsed {
            Some(parsed) => (
                parsed.platform.to_string(),
                parsed.genre.to_string(),
                parsed.unique_id.clone(),
            ),
            None => ("-".into(), "-".into(), "-".into()),
        };
        let status = match row.status {
            ItemStatus::Valid => row.status.label().bright_green(),
            ItemStatus::Duplicate => row.status.label().bright_yellow(),
            ItemStatus::Invalid => row.status.label().bright_red(),
        };
        format!("{status} {} [{platform} / {genre} / {id}]", row.name)
    }

    fn preview_lines<I>(lines: I, verbose: bool)
    where
        I: Iterator<Item = String>,
    {
        let limit = if verbose { usize::MAX } else { 10 };
        let mut count = 0usize;

        for line in lines {
            if count < limit {
                println!("{line}");
            }
            count += 1;
        }

        if count > limit {
            println!(
                "{}",
                format!("  ...あと {} 件", count - limit).bright_black()
            );
        }
    }
}
