/*!
 * Integration tests for folder cleaning runs
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use tgclean::app_config::Config;
use tgclean::app_controller::{Controller, FileStatus};
use tgclean::errors::{AppError, ConfigError, FileError};
use tgclean::file_utils::FileManager;
use tgclean::summary::RunSummary;
use crate::common;
use crate::common::mock_store::{Fault, FaultyStore};

fn controller(config: Config) -> Result<Controller> {
    Ok(Controller::with_config(config)?.with_progress(false))
}

fn relative(paths: &[PathBuf], root: &Path) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

/// Test a full run: labels cleaned, originals backed up, summary filled in
#[tokio::test]
async fn test_run_folder_withWordListsAndParentheses_shouldCleanAndBackUp() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().join("corpus");
    let dirty = common::create_textgrid(&root, "a.TextGrid", &["I TEH Recieve it", "word (extra info) end"])?;
    let clean = common::create_textgrid(&root, "b.TextGrid", &["already clean"])?;
    let original = fs::read_to_string(&dirty)?;
    let (wrong, correct) = common::create_word_lists(temp_dir.path(), &["teh", "recieve"], &["the", "receive"])?;

    let mut config = Config::default();
    config.transforms.remove_parentheses = true;
    config.wrong_words = Some(wrong);
    config.correct_words = Some(correct);

    let summary = controller(config)?.run_folder(&root).await?;

    assert_eq!(common::read_labels(&dirty)?, vec!["i the receive it", "word end"]);
    assert_eq!(fs::read_to_string(FileManager::backup_path(&dirty))?, original);
    assert!(!FileManager::backup_path(&clean).exists());

    assert_eq!(relative(&summary.modified, &root), vec!["a.TextGrid"]);
    assert_eq!(relative(&summary.unchanged, &root), vec!["b.TextGrid"]);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.backups_created, 1);
    assert_eq!(summary.labels_changed, 2);
    assert_eq!(summary.substitutions.get("teh"), Some(&1));
    Ok(())
}

/// Test that only changed label literals differ from the original bytes
#[tokio::test]
async fn test_run_folder_withOneDirtyLabel_shouldOnlyChangeThatLiteral() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_textgrid(temp_dir.path(), "a.TextGrid", &["ok", "HELLO", "fine"])?;
    let original = fs::read_to_string(&file)?;

    controller(Config::default())?.run_folder(temp_dir.path()).await?;

    let cleaned = fs::read_to_string(&file)?;
    assert_eq!(cleaned, original.replacen("\"HELLO\"", "\"hello\"", 1));
    Ok(())
}

/// Test recursive discovery at depth two
#[tokio::test]
async fn test_run_folder_withRecursion_shouldReachNestedFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let nested = common::create_textgrid(root, "speaker1/session1/deep.TextGrid", &["UPPER"])?;
    let top = common::create_textgrid(root, "top.TextGrid", &["UPPER"])?;

    let summary = controller(Config::default())?.run_folder(root).await?;
    assert_eq!(relative(&summary.modified, root), vec!["top.TextGrid"]);
    assert_eq!(common::read_labels(&nested)?, vec!["UPPER"]);

    let mut config = Config::default();
    config.recursive = true;
    let summary = controller(config)?.run_folder(root).await?;
    assert_eq!(relative(&summary.modified, root), vec!["speaker1/session1/deep.TextGrid"]);
    assert_eq!(relative(&summary.unchanged, root), vec!["top.TextGrid"]);
    assert_eq!(common::read_labels(&nested)?, vec!["upper"]);
    assert_eq!(common::read_labels(&top)?, vec!["upper"]);
    Ok(())
}

/// Test that a mismatched word list fails before any file is touched
#[tokio::test]
async fn test_with_config_withMismatchedWordLists_shouldFailBeforeProcessing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_textgrid(temp_dir.path(), "a.TextGrid", &["UPPER"])?;
    let original = fs::read(&file)?;
    let (wrong, correct) = common::create_word_lists(
        temp_dir.path(),
        &["a", "b", "c", "d", "e"],
        &["1", "2", "3", "4"],
    )?;

    let mut config = Config::default();
    config.wrong_words = Some(wrong);
    config.correct_words = Some(correct);

    let result = Controller::with_config(config);
    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::WordListLengthMismatch { wrong: 5, correct: 4 }))
    ));
    assert_eq!(fs::read(&file)?, original);
    assert!(!FileManager::backup_path(&file).exists());
    Ok(())
}

/// Test that a missing root folder is a configuration error
#[tokio::test]
async fn test_run_folder_withMissingRoot_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let result = controller(Config::default())?
        .run_folder(temp_dir.path().join("nope"))
        .await;
    assert!(matches!(result, Err(AppError::Config(ConfigError::InvalidRoot(_)))));
    Ok(())
}

/// Test that a failed backup leaves the original untouched and the run going
#[tokio::test]
async fn test_run_folder_withBlockedBackup_shouldLeaveOriginalUntouched() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let blocked = common::create_textgrid(root, "a.TextGrid", &["UPPER"])?;
    let other = common::create_textgrid(root, "b.TextGrid", &["UPPER"])?;
    let original = fs::read(&blocked)?;
    fs::create_dir(FileManager::backup_path(&blocked))?;

    let summary = controller(Config::default())?.run_folder(root).await?;

    assert_eq!(fs::read(&blocked)?, original);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].path, blocked);
    assert_eq!(summary.failed[0].kind, "io");
    assert_eq!(common::read_labels(&other)?, vec!["upper"]);
    Ok(())
}

/// Test that a write failing after the backup keeps both copies of the original
#[tokio::test]
async fn test_run_folder_withFailingWrite_shouldKeepBackupAndOriginal() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let failing = common::create_textgrid(root, "a.TextGrid", &["UPPER"])?;
    let other = common::create_textgrid(root, "b.TextGrid", &["UPPER"])?;
    let original = fs::read(&failing)?;

    let store = Arc::new(FaultyStore::new(&failing, Fault::WriteFails));
    let summary = controller(Config::default())?
        .with_store(store)
        .run_folder(root)
        .await?;

    assert_eq!(fs::read(&failing)?, original);
    assert_eq!(fs::read(FileManager::backup_path(&failing))?, original);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].path, failing);
    assert_eq!(summary.failed[0].kind, "io");
    assert!(summary.failed[0].reason.contains("cannot write"));
    assert_eq!(summary.modified, vec![other.clone()]);
    assert_eq!(common::read_labels(&other)?, vec!["upper"]);
    Ok(())
}

/// Test that a panicking worker is recorded as a failure and the run goes on
#[tokio::test]
async fn test_run_folder_withPanickingWorker_shouldRecordUnexpectedFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let first = common::create_textgrid(root, "a.TextGrid", &["UPPER"])?;
    let crashing = common::create_textgrid(root, "b.TextGrid", &["UPPER"])?;
    let last = common::create_textgrid(root, "c.TextGrid", &["UPPER"])?;
    let original = fs::read(&crashing)?;

    let mut config = Config::default();
    config.jobs = 2;
    let store = Arc::new(FaultyStore::new(&crashing, Fault::ReadPanics));
    let summary = controller(config)?.with_store(store).run_folder(root).await?;

    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].path, crashing);
    assert_eq!(summary.failed[0].kind, "unexpected");
    assert_eq!(summary.modified, vec![first, last]);
    assert_eq!(fs::read(&crashing)?, original);
    assert!(!FileManager::backup_path(&crashing).exists());
    Ok(())
}

/// Test that a second run keeps the backup of the very first original
#[tokio::test]
async fn test_run_folder_twice_shouldKeepFirstBackup() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_textgrid(temp_dir.path(), "a.TextGrid", &["Well-KNOWN"])?;
    let original = fs::read(&file)?;

    controller(Config::default())?.run_folder(temp_dir.path()).await?;
    assert_eq!(common::read_labels(&file)?, vec!["well-known"]);

    let mut config = Config::default();
    config.transforms.replace_hyphens = true;
    let summary = controller(config)?.run_folder(temp_dir.path()).await?;

    assert_eq!(common::read_labels(&file)?, vec!["well known"]);
    assert_eq!(summary.backups_created, 0);
    assert_eq!(fs::read(FileManager::backup_path(&file))?, original);
    Ok(())
}

/// Test that --no-backup writes without creating backups
#[tokio::test]
async fn test_run_folder_withoutBackup_shouldNotCreateBakFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_textgrid(temp_dir.path(), "a.TextGrid", &["UPPER"])?;

    let mut config = Config::default();
    config.backup = false;
    let summary = controller(config)?.run_folder(temp_dir.path()).await?;

    assert_eq!(summary.modified.len(), 1);
    assert!(!FileManager::backup_path(&file).exists());
    assert_eq!(common::read_labels(&file)?, vec!["upper"]);
    Ok(())
}

/// Test that a dry run reports changes without writing anything
#[tokio::test]
async fn test_run_folder_withDryRun_shouldNotWrite() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_textgrid(temp_dir.path(), "a.TextGrid", &["UPPER"])?;
    let original = fs::read(&file)?;

    let mut config = Config::default();
    config.dry_run = true;
    let summary = controller(config)?.run_folder(temp_dir.path()).await?;

    assert!(summary.dry_run);
    assert_eq!(summary.modified, vec![file.clone()]);
    assert_eq!(fs::read(&file)?, original);
    assert!(!FileManager::backup_path(&file).exists());
    Ok(())
}

/// Test that malformed files are reported while the others are processed
#[tokio::test]
async fn test_run_folder_withMalformedFile_shouldRecordFailureAndContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let broken = common::create_test_file(root, "a.TextGrid", "File type = \"ooTextFile\"\nObject class = \"Pitch\"\n")?;
    let good = common::create_textgrid(root, "b.TextGrid", &["UPPER"])?;

    let summary = controller(Config::default())?.run_folder(root).await?;

    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].path, broken);
    assert_eq!(summary.failed[0].kind, "format");
    assert_eq!(summary.modified, vec![good]);
    assert!(!FileManager::backup_path(&broken).exists());
    Ok(())
}

/// Test that parallel runs produce the same summary as sequential runs
#[tokio::test]
async fn test_run_folder_withJobs_shouldMatchSequentialSummary() -> Result<()> {
    async fn run(jobs: usize) -> Result<(tempfile::TempDir, RunSummary)> {
        let temp_dir = common::create_temp_dir()?;
        for index in 0..12 {
            let label = if index % 3 == 0 { "already clean" } else { "Needs (WORK)" };
            common::create_textgrid(temp_dir.path(), &format!("sub{}/f{:02}.TextGrid", index % 2, index), &[label])?;
        }
        common::create_test_file(temp_dir.path(), "sub0/zz.TextGrid", "garbage")?;

        let mut config = Config::default();
        config.recursive = true;
        config.jobs = jobs;
        config.transforms.remove_parentheses = true;
        let summary = controller(config)?.run_folder(temp_dir.path()).await?;
        Ok((temp_dir, summary))
    }

    let (seq_dir, sequential) = run(1).await?;
    let (par_dir, parallel) = run(4).await?;

    assert_eq!(relative(&sequential.modified, seq_dir.path()), relative(&parallel.modified, par_dir.path()));
    assert_eq!(relative(&sequential.unchanged, seq_dir.path()), relative(&parallel.unchanged, par_dir.path()));
    assert_eq!(sequential.failed.len(), 1);
    assert_eq!(parallel.failed.len(), 1);
    assert_eq!(sequential.labels_changed, parallel.labels_changed);
    assert_eq!(sequential.modified.len(), 8);
    Ok(())
}

/// Test single-file processing through the controller
#[test]
fn test_process_file_withUnchangedFile_shouldNotWrite() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_textgrid(temp_dir.path(), "a.TextGrid", &["clean"])?;

    let outcome = controller(Config::default())?.process_file(&file)?;
    assert_eq!(outcome.status, FileStatus::Unchanged);
    assert!(outcome.backup.is_none());
    assert!(!FileManager::backup_path(&file).exists());

    let missing = controller(Config::default())?.process_file(temp_dir.path().join("missing.TextGrid"));
    assert!(matches!(missing, Err(FileError::Read { .. })));
    Ok(())
}

/// Test that the JSON report is written with the run's results
#[tokio::test]
async fn test_summary_write_json_shouldContainResults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().join("corpus");
    common::create_textgrid(&root, "a.TextGrid", &["UPPER"])?;

    let summary = controller(Config::default())?.run_folder(&root).await?;
    let report = temp_dir.path().join("report.json");
    summary.write_json(&report)?;

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report)?)?;
    assert_eq!(json["modified"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(json["labels_changed"], 1);
    assert_eq!(json["dry_run"], false);
    Ok(())
}
