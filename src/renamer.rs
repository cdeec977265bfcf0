use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use indicatif::ProgressBar;

use crate::error::RenameError;
use crate::naming::{Field, FieldOrder, NameFields, NamingRule, compute_new_name};

/// 1件分のリネーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameAction {
    pub source: PathBuf,
    pub target: PathBuf,
    pub old_name: String,
    pub new_name: String,
}

/// 選択項目から作ったリネーム計画
#[derive(Debug, Default)]
pub struct RenamePlan {
    pub actions: Vec<RenameAction>,
    /// 既に正規形になっている項目
    pub unchanged: Vec<String>,
    /// 命名規則に一致せず対象外の項目
    pub unparsed: Vec<String>,
}

impl RenamePlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// リネーム実行（ドライラン/実行モード）
pub struct Renamer {
    root: PathBuf,
    dry_run: bool,
}

impl Renamer {
    pub fn new(root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            dry_run,
        }
    }

    /// 新しい名前を決める。ファイルなら元の拡張子を引き継ぐ
    pub fn plan(&self, old_name: &str, fields: &NameFields, order: &FieldOrder) -> RenameAction {
        let source = self.root.join(old_name);
        let mut new_name = compute_new_name(fields, order);

        if source.is_file() {
            if let Some(ext) = Path::new(old_name).extension() {
                new_name.push('.');
                new_name.push_str(&ext.to_string_lossy());
            }
        }

        RenameAction {
            target: self.root.join(&new_name),
            source,
            old_name: old_name.to_string(),
            new_name,
        }
    }

    /// 選択された項目をまとめて計画する
    ///
    /// `overrides` は1件だけ選択されている場合にのみ適用される。
    pub fn plan_selection(
        &self,
        names: &[String],
        order: &FieldOrder,
        overrides: &[(Field, String)],
    ) -> RenamePlan {
        let mut plan = RenamePlan::default();
        let single = names.len() == 1;

        for name in names {
            let Some(parsed) = NamingRule::parse(name) else {
                plan.unparsed.push(name.clone());
                continue;
            };

            let mut fields = parsed.fields();
            if single {
                for (field, value) in overrides {
                    fields.set(*field, value.clone());
                }
            }

            let action = self.plan(name, &fields, order);
            if action.new_name == action.old_name {
                plan.unchanged.push(name.clone());
            } else {
                plan.actions.push(action);
            }
        }

        plan
    }

    /// 1件リネームする。既存の項目は上書きしない
    ///
    /// 新しい名前は単一のパス要素でなければならず、ルート外へは移動しない。
    pub fn rename(&self, action: &RenameAction) -> Result<(), RenameError> {
        if !is_plain_name(&action.new_name) {
            return Err(RenameError::InvalidName(action.new_name.clone()));
        }
        if fs::symlink_metadata(&action.source).is_err() {
            return Err(RenameError::SourceMissing(action.source.clone()));
        }
        if fs::symlink_metadata(&action.target).is_ok() && !is_case_only_change(action) {
            return Err(RenameError::TargetExists(action.target.clone()));
        }

        if self.dry_run {
            log::info!("[DRY RUN] リネーム: {:?} → {:?}", action.source, action.target);
            return Ok(());
        }

        fs::rename(&action.source, &action.target).map_err(|e| {
            RenameError::from_io(e, action.source.clone(), action.target.clone())
        })
    }

    /// 順番にリネームする。失敗した項目があっても残りは続行する
    pub fn rename_batch(
        &self,
        actions: &[RenameAction],
        progress: Option<&ProgressBar>,
    ) -> RenameSummary {
        let mut summary = RenameSummary::default();

        for action in actions {
            if let Some(pb) = progress {
                pb.set_message(action.old_name.clone());
            }

            match self.rename(action) {
                Ok(()) => summary.renamed.push(action.clone()),
                Err(e) => {
                    log::warn!("{}: {e}", action.old_name);
                    summary.failed.push((action.clone(), e));
                }
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        log::info!(
            "リネーム完了: 成功 {}件 / 失敗 {}件",
            summary.renamed.len(),
            summary.failed.len()
        );
        summary
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => part == OsStr::new(name),
        _ => false,
    }
}

/// 大文字小文字だけの変更で、変更先が変更元そのものを指している
/// （大文字小文字を区別しないファイルシステム）
fn is_case_only_change(action: &RenameAction) -> bool {
    action.old_name.to_lowercase() == action.new_name.to_lowercase()
        && same_entry(&action.source, &action.target)
}

#[cfg(unix)]
fn same_entry(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_entry(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[derive(Debug, Default)]
pub struct RenameSummary {
    pub renamed: Vec<RenameAction>,
    pub failed: Vec<(RenameAction, RenameError)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DLSITE: &str = "[Circle]-[RJ01] Title (ACT)_DLsite";

    fn swapped_order() -> FieldOrder {
        "game_title,unique_id,creator,genre,platform".parse().unwrap()
    }

    #[test]
    fn file_keeps_its_extension() {
        let dir = TempDir::new().unwrap();
        let old = format!("{DLSITE}.zip");
        fs::write(dir.path().join(&old), b"data").unwrap();

        let renamer = Renamer::new(dir.path(), false);
        let plan = renamer.plan_selection(&[old.clone()], &swapped_order(), &[]);
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(
            plan.actions[0].new_name,
            "[Title]-[RJ01] Circle (ACT)_DLsite.zip"
        );

        let summary = renamer.rename_batch(&plan.actions, None);
        assert_eq!(summary.renamed.len(), 1);
        assert!(dir.path().join("[Title]-[RJ01] Circle (ACT)_DLsite.zip").is_file());
        assert!(!dir.path().join(&old).exists());
    }

    #[test]
    fn directory_gets_no_extension() {
        let dir = TempDir::new().unwrap();
        let old = "[Circle]-[RJ01] Vol.2 (ACT)_DLsite";
        fs::create_dir(dir.path().join(old)).unwrap();

        let renamer = Renamer::new(dir.path(), false);
        let fields = NamingRule::parse(old).unwrap().fields();
        let action = renamer.plan(old, &fields, &swapped_order());
        assert_eq!(action.new_name, "[Vol.2]-[RJ01] Circle (ACT)_DLsite");

        renamer.rename(&action).unwrap();
        assert!(dir.path().join(&action.new_name).is_dir());
    }

    #[test]
    fn canonical_and_unparsed_items_are_not_planned() {
        let dir = TempDir::new().unwrap();
        let renamer = Renamer::new(dir.path(), false);
        let names = vec![DLSITE.to_string(), "junk".to_string()];
        let plan = renamer.plan_selection(&names, &FieldOrder::default(), &[]);
        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, vec![DLSITE]);
        assert_eq!(plan.unparsed, vec!["junk"]);
    }

    #[test]
    fn overrides_only_apply_to_a_single_selection() {
        let dir = TempDir::new().unwrap();
        let renamer = Renamer::new(dir.path(), true);
        let overrides = vec![(Field::GameTitle, "Renamed".to_string())];

        let plan = renamer.plan_selection(&[DLSITE.to_string()], &FieldOrder::default(), &overrides);
        assert_eq!(plan.actions[0].new_name, "[Circle]-[RJ01] Renamed (ACT)_DLsite");

        let names = vec![DLSITE.to_string(), "[Other]-[RJ02] Two (RPG)_DLsite".to_string()];
        let plan = renamer.plan_selection(&names, &FieldOrder::default(), &overrides);
        assert!(plan.is_empty());
        assert_eq!(plan.unchanged.len(), 2);
    }

    #[test]
    fn existing_target_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(DLSITE)).unwrap();
        fs::create_dir(dir.path().join("[Title]-[RJ01] Circle (ACT)_DLsite")).unwrap();

        let renamer = Renamer::new(dir.path(), false);
        let plan = renamer.plan_selection(&[DLSITE.to_string()], &swapped_order(), &[]);
        let err = renamer.rename(&plan.actions[0]).unwrap_err();
        assert!(matches!(err, RenameError::TargetExists(_)));
        assert!(dir.path().join(DLSITE).is_dir());
    }

    #[test]
    fn batch_continues_after_a_failure() {
        let dir = TempDir::new().unwrap();
        let present = "[B]-[RJ02] Two (RPG)_DLsite";
        fs::create_dir(dir.path().join(present)).unwrap();

        let renamer = Renamer::new(dir.path(), false);
        let names = vec![DLSITE.to_string(), present.to_string()];
        let plan = renamer.plan_selection(&names, &swapped_order(), &[]);
        assert_eq!(plan.actions.len(), 2);

        let summary = renamer.rename_batch(&plan.actions, None);
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(summary.failed[0].1, RenameError::SourceMissing(_)));
        assert_eq!(summary.renamed.len(), 1);
        assert!(dir.path().join("[Two]-[RJ02] B (RPG)_DLsite").is_dir());
    }

    #[test]
    fn new_name_must_stay_in_the_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(DLSITE)).unwrap();
        fs::create_dir(dir.path().join("[sub")).unwrap();

        let renamer = Renamer::new(dir.path(), false);
        for value in ["sub/x", "no/dir"] {
            let overrides = vec![(Field::Creator, value.to_string())];
            let plan =
                renamer.plan_selection(&[DLSITE.to_string()], &FieldOrder::default(), &overrides);
            let err = renamer.rename(&plan.actions[0]).unwrap_err();
            assert!(matches!(err, RenameError::InvalidName(_)));
        }

        assert!(dir.path().join(DLSITE).is_dir());
        assert_eq!(fs::read_dir(dir.path().join("[sub")).unwrap().count(), 0);
        assert!(is_plain_name("[A]-[RJ01] T (ACT)_DLsite.zip"));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name("a/"));
    }

    #[cfg(unix)]
    #[test]
    fn case_only_change_of_the_same_entry_is_allowed() {
        let dir = TempDir::new().unwrap();
        let old = format!("{DLSITE}.zip");
        let upper = "[CIRCLE]-[RJ01] Title (ACT)_DLsite.zip";
        fs::write(dir.path().join(&old), b"data").unwrap();
        // 大文字小文字を区別しないファイルシステムと同じく、変更先が同じ実体を指す
        fs::hard_link(dir.path().join(&old), dir.path().join(upper)).unwrap();

        let renamer = Renamer::new(dir.path(), false);
        let overrides = vec![(Field::Creator, "CIRCLE".to_string())];
        let plan = renamer.plan_selection(&[old.clone()], &FieldOrder::default(), &overrides);
        assert_eq!(plan.actions[0].new_name, upper);
        renamer.rename(&plan.actions[0]).unwrap();

        let other = "[Other]-[RJ02] Two (RPG)_DLsite.zip";
        fs::write(dir.path().join(other), b"one").unwrap();
        fs::write(dir.path().join("[OTHER]-[RJ02] Two (RPG)_DLsite.zip"), b"two").unwrap();
        let overrides = vec![(Field::Creator, "OTHER".to_string())];
        let plan =
            renamer.plan_selection(&[other.to_string()], &FieldOrder::default(), &overrides);
        let err = renamer.rename(&plan.actions[0]).unwrap_err();
        assert!(matches!(err, RenameError::TargetExists(_)));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_folder_reports_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let other = "[B]-[RJ02] Two (RPG)_DLsite";
        fs::create_dir(dir.path().join(DLSITE)).unwrap();
        fs::create_dir(dir.path().join(other)).unwrap();

        let renamer = Renamer::new(dir.path(), false);
        let names = vec![DLSITE.to_string(), other.to_string()];
        let plan = renamer.plan_selection(&names, &swapped_order(), &[]);

        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();
        // root では書き込み権限が無視される
        let enforced = fs::write(dir.path().join("writable"), b"").is_err();
        let summary = renamer.rename_batch(&plan.actions, None);
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

        if enforced {
            assert_eq!(summary.failed.len(), 2);
            assert!(summary
                .failed
                .iter()
                .all(|(_, e)| matches!(e, RenameError::PermissionDenied(_))));
            assert!(dir.path().join(DLSITE).is_dir());
            assert!(dir.path().join(other).is_dir());
        }
    }

    #[test]
    fn dry_run_reports_conflicts_without_touching_the_disk() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(DLSITE)).unwrap();
        fs::create_dir(dir.path().join("[B]-[RJ02] Two (RPG)_DLsite")).unwrap();
        fs::create_dir(dir.path().join("[Two]-[RJ02] B (RPG)_DLsite")).unwrap();

        let renamer = Renamer::new(dir.path(), true);
        let names = vec![DLSITE.to_string(), "[B]-[RJ02] Two (RPG)_DLsite".to_string()];
        let plan = renamer.plan_selection(&names, &swapped_order(), &[]);
        let summary = renamer.rename_batch(&plan.actions, None);
        assert_eq!(summary.renamed.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(summary.failed[0].1, RenameError::TargetExists(_)));
        assert!(dir.path().join(DLSITE).is_dir());
    }

    #[test]
    fn dry_run_leaves_the_disk_untouched() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(DLSITE)).unwrap();

        let renamer = Renamer::new(dir.path(), true);
        let plan = renamer.plan_selection(&[DLSITE.to_string()], &swapped_order(), &[]);
        let summary = renamer.rename_batch(&plan.actions, None);
        assert_eq!(summary.renamed.len(), 1);
        assert!(dir.path().join(DLSITE).is_dir());
        assert!(!plan.actions[0].target.exists());
    }
}
