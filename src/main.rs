mod classifier;
mod error;
mod menu;
mod naming;
mod renamer;
mod scanner;
mod settings;
mod ui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use classifier::{ClassificationResult, Classifier, SortKey};
use menu::{Menu, MenuAction};
use naming::{Field, FieldOrder};
use renamer::Renamer;
use scanner::{Collector, ExtensionFilter};
use settings::Settings;
use ui::UI;

#[derive(Parser, Debug)]
#[command(name = "namecheck")]
#[command(about = "ゲームのファイル/フォルダ名を命名規則で検証し、まとめてリネームする CLI ツール")]
struct Cli {
    /// 検証するフォルダ（直下の項目のみ対象）
    #[arg(long, value_name = "PATH", default_value = ".")]
    root: PathBuf,

    /// JSON 設定ファイル（extensions / field_order）
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// 対象とする拡張子。空文字 "" でフォルダ/拡張子なしも対象にする
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// 一覧を並べ替える列
    #[arg(long, value_enum)]
    sort: Option<SortColumn>,

    /// 降順で並べ替える
    #[arg(long, requires = "sort")]
    descending: bool,

    /// 分類結果を JSON で出力する
    #[arg(long, conflicts_with = "rename")]
    json: bool,

    /// 有効な項目のリネームを計画する
    #[arg(long)]
    rename: bool,

    /// リネーム対象を名前で指定する（省略時は有効な項目すべて）
    #[arg(long = "select", value_name = "NAME", requires = "rename")]
    selected: Vec<String>,

    /// フィールド順（例: creator,unique_id,game_title,genre,platform）
    #[arg(long, value_name = "FIELDS", requires = "rename")]
    order: Option<String>,

    /// フィールド値を上書きする（1件選択時のみ）
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_override, requires = "rename")]
    overrides: Vec<(Field, String)>,

    /// プランされた変更を適用する
    #[arg(long, requires = "rename")]
    apply: bool,

    /// 確認無しで適用する（--apply を前提にする）
    #[arg(long, alias = "y", requires = "rename")]
    yes: bool,

    /// すべての詳細を表示する
    #[arg(long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SortColumn {
    Item,
    Status,
    Platform,
    Genre,
    Id,
}

impl From<SortColumn> for SortKey {
    fn from(column: SortColumn) -> Self {
        match column {
            SortColumn::Item => SortKey::Item,
            SortColumn::Status => SortKey::Status,
            SortColumn::Platform => SortKey::Platform,
            SortColumn::Genre => SortKey::Genre,
            SortColumn::Id => SortKey::Id,
        }
    }
}

fn parse_override(raw: &str) -> Result<(Field, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("FIELD=VALUE の形式で指定してください: {raw}"))?;
    let field = field.parse::<Field>().map_err(|e| e.to_string())?;
    Ok((field, value.to_string()))
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    if std::env::args().len() == 1 {
        init_logging(false);
        return run_interactive_mode();
    }
    let args = Cli::parse();
    init_logging(args.verbose);
    run_cli_mode(args)
}

fn run_cli_mode(args: Cli) -> Result<()> {
    let settings = Settings::load_or_default(args.config.as_deref())?;
    let filter = if args.extensions.is_empty() {
        settings.extension_filter()
    } else {
        ExtensionFilter::new(&args.extensions)
    };
    let order = match &args.order {
        Some(order) => order.parse::<FieldOrder>()?,
        None => settings.field_order()?,
    };

    let result = classify_folder(&args.root, &filter, !args.json)?;
    if args.json {
        return UI::render_json(&args.root, &result);
    }

    let sort = args.sort.map(|column| (SortKey::from(column), args.descending));
    UI::render_classification(&args.root, &filter, &result, sort, args.verbose);

    if !args.rename {
        return Ok(());
    }

    let selection: Vec<String> = if args.selected.is_empty() {
        result.valid.iter().map(|(name, _)| name.clone()).collect()
    } else {
        args.selected.clone()
    };
    if !args.overrides.is_empty() && selection.len() != 1 {
        bail!("--set は項目を1件だけ選択したときに使用できます（選択数: {}）", selection.len());
    }

    let dry_run = !(args.apply || args.yes);
    let renamer = Renamer::new(&args.root, dry_run);
    let plan = renamer.plan_selection(&selection, &order, &args.overrides);

    UI::section("リネーム計画");
    UI::render_plan(&plan, &order, args.verbose);

    if plan.is_empty() {
        println!("変更が必要な項目はありません。");
        return Ok(());
    }

    if dry_run {
        let summary = renamer.rename_batch(&plan.actions, None);
        UI::render_dry_run(&summary);
        println!("\n--apply を付けると、上記の変更を適用します。");
        return Ok(());
    }

    if !args.yes && !confirm("変更を適用しますか？")? {
        println!("適用をキャンセルしました。");
        return Ok(());
    }

    let pb = UI::progress(plan.actions.len());
    let summary = renamer.rename_batch(&plan.actions, Some(&pb));
    pb.finish_and_clear();
    UI::render_rename_summary(&summary);

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N]: ");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let normalized = input.trim().to_ascii_lowercase();
    Ok(matches!(normalized.as_str(), "y" | "yes"))
}

fn classify_folder(
    root: &Path,
    filter: &ExtensionFilter,
    show_spinner: bool,
) -> Result<ClassificationResult> {
    let spinner = show_spinner.then(|| UI::loading("フォルダを検証中..."));
    let items = Collector::list_names(root, filter);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    Ok(Classifier::classify(&items?))
}

fn run_interactive_mode() -> Result<()> {
    UI::print_title();

    loop {
        let outcome = match Menu::show_main_menu()? {
            MenuAction::Validate => handle_validate_flow(),
            MenuAction::Rename => handle_rename_flow(),
            MenuAction::Exit => {
                UI::info("終了します。");
                break;
            }
        };
        // フォルダ読み込みの失敗はメニューに戻る
        if let Err(e) = outcome {
            UI::error(&format!("{e:#}"));
        }
    }

    Ok(())
}

fn handle_validate_flow() -> Result<()> {
    let root = Menu::ask_root()?;
    let filter = Menu::ask_extensions()?;

    UI::section("名前の検証");
    let result = classify_folder(&root, &filter, true)?;
    UI::render_classification(&root, &filter, &result, None, false);
    Ok(())
}

fn handle_rename_flow() -> Result<()> {
    let root = Menu::ask_root()?;
    let filter = Menu::ask_extensions()?;
    let result = classify_folder(&root, &filter, true)?;

    let candidates: Vec<String> = result.valid.iter().map(|(name, _)| name.clone()).collect();
    if candidates.is_empty() {
        UI::warning("命名規則に一致する項目がありません。");
        return Ok(());
    }

    let selection = Menu::select_items(candidates)?;
    if selection.is_empty() {
        UI::warning("項目が選択されていません。");
        return Ok(());
    }

    let order = Menu::ask_field_order(FieldOrder::default())?;
    let overrides = match selection.as_slice() {
        [single] => match result.parsed(single) {
            Some(parsed) => Menu::edit_fields(&parsed.fields())?,
            None => Vec::new(),
        },
        _ => Vec::new(),
    };

    let renamer = Renamer::new(&root, false);
    let plan = renamer.plan_selection(&selection, &order, &overrides);

    UI::section("リネーム計画");
    UI::render_plan(&plan, &order, false);

    if plan.is_empty() {
        UI::success("変更は不要です。");
        return Ok(());
    }

    if Menu::confirm_execution(plan.actions.len())? {
        let pb = UI::progress(plan.actions.len());
        let summary = renamer.rename_batch(&plan.actions, Some(&pb));
        pb.finish_and_clear();
        UI::render_rename_summary(&summary);
    } else {
        UI::warning("適用をキャンセルしました。");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_field_overrides() {
        let (field, value) = parse_override("title=New = Title").unwrap();
        assert_eq!(field, Field::GameTitle);
        assert_eq!(value, "New = Title");
        assert!(parse_override("title").is_err());
        assert!(parse_override("store=Steam").is_err());
    }

    #[test]
    fn accepts_folder_sentinel_and_rename_flags() {
        let cli = Cli::try_parse_from([
            "namecheck", "--root", "games", "--ext", "", "--ext", "zip", "--rename", "--select",
            "a", "--set", "genre=ADV", "--sort", "id", "--descending",
        ])
        .unwrap();
        assert_eq!(cli.extensions, vec!["", "zip"]);
        assert_eq!(cli.overrides, vec![(Field::Genre, "ADV".to_string())]);
        assert!(ExtensionFilter::new(&cli.extensions).includes_folders());
        assert!(matches!(cli.sort, Some(SortColumn::Id)));
    }

    #[test]
    fn json_output_conflicts_with_rename() {
        assert!(Cli::try_parse_from(["namecheck", "--json", "--rename"]).is_err());
    }

    #[test]
    fn rename_options_require_rename() {
        let order = "creator,unique_id,game_title,genre,platform";
        let cases: [&[&str]; 3] = [&["--apply"], &["--yes"], &["--order", order]];
        for flags in cases {
            let mut argv = vec!["namecheck"];
            argv.extend_from_slice(flags);
            assert!(Cli::try_parse_from(argv.clone()).is_err(), "{flags:?}");
            argv.push("--rename");
            assert!(Cli::try_parse_from(argv).is_ok(), "{flags:?}");
        }
    }

    #[test]
    fn override_with_a_separator_cannot_leave_the_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let old = "[Circle]-[RJ01] Title (ACT)_DLsite";
        std::fs::create_dir(dir.path().join(old)).unwrap();

        let cli = Cli::try_parse_from([
            "namecheck", "--rename", "--select", old, "--set", "creator=a/b",
        ])
        .unwrap();
        let renamer = Renamer::new(dir.path(), false);
        let plan = renamer.plan_selection(&cli.selected, &FieldOrder::default(), &cli.overrides);
        let summary = renamer.rename_batch(&plan.actions, None);

        assert!(summary.renamed.is_empty());
        assert!(matches!(summary.failed[0].1, crate::error::RenameError::InvalidName(_)));
        assert!(dir.path().join(old).is_dir());
    }
}
