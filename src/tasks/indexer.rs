use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::error::Error;
use crate::file_list::FileList;
use crate::indirection::IndirectionResolver;

// Paths are handed to the shared list in batches to keep lock traffic low.
const APPEND_BATCH: usize = 64;

/// Counters for one traversal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexReport {
    pub files: usize,
    pub links_followed: usize,
    pub skipped: usize,
}

/// One-shot background traversal feeding the list sampler.
///
/// Runs on the blocking pool; the list is marked complete when the walk ends,
/// whether it finished or was cancelled.
#[instrument(skip(resolver, files, cancel), fields(root = %root.display()))]
pub async fn run<R>(
    root: PathBuf,
    resolver: Arc<R>,
    files: FileList,
    cancel: CancellationToken,
    log_skips: bool,
) -> Result<IndexReport>
where
    R: IndirectionResolver + 'static,
{
    let report = tokio::task::spawn_blocking({
        let files = files.clone();
        move || index_tree(&root, resolver.as_ref(), &files, &cancel, log_skips)
    })
    .await
    .context("indexer worker panicked")?;
    files.mark_complete();
    info!(
        files = report.files,
        links_followed = report.links_followed,
        skipped = report.skipped,
        "tree index complete"
    );
    Ok(report)
}

/// Recursively append every regular file under `root` to `files`.
///
/// Indirections are followed: a target directory is walked as if it were in
/// place, a target file is appended, and unresolvable ones are skipped.
/// Unreadable subtrees are skipped and the walk continues. Each canonical
/// directory is walked at most once, so link cycles terminate.
pub fn index_tree<R: IndirectionResolver + ?Sized>(
    root: &Path,
    resolver: &R,
    files: &FileList,
    cancel: &CancellationToken,
    log_skips: bool,
) -> IndexReport {
    let mut report = IndexReport::default();
    let mut pending = vec![root.to_path_buf()];
    let mut walked: HashSet<PathBuf> = HashSet::new();
    let mut batch = Vec::with_capacity(APPEND_BATCH);

    while let Some(start) = pending.pop() {
        let start = if resolver.is_indirection(&start) {
            match resolver.resolve(&start) {
                Ok(target) => target,
                Err(err) => {
                    skip(&mut report, log_skips, &err);
                    continue;
                }
            }
        } else {
            start
        };
        let canonical = match fs::canonicalize(&start) {
            Ok(path) => path,
            Err(err) => {
                skip(&mut report, log_skips, &Error::Io(err));
                continue;
            }
        };
        let mut entries = WalkDir::new(&canonical).follow_links(false).into_iter();
        while let Some(entry) = entries.next() {
            if cancel.is_cancelled() {
                debug!("cancelled; stopping traversal");
                files.extend(batch.drain(..));
                return report;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source
                        .path()
                        .map_or_else(|| canonical.clone(), Path::to_path_buf);
                    skip(&mut report, log_skips, &Error::Traversal { path, source });
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                // links are not followed, so paths under a canonical start stay canonical
                if !walked.insert(entry.path().to_path_buf()) {
                    debug!(dir = %entry.path().display(), "already indexed; pruning");
                    entries.skip_current_dir();
                }
                continue;
            }

            let path = entry.path();
            if resolver.is_indirection(path) {
                match resolver.resolve(path) {
                    Ok(target) if target.is_dir() => {
                        report.links_followed += 1;
                        pending.push(target);
                    }
                    Ok(target) if target.is_file() => {
                        report.links_followed += 1;
                        report.files += 1;
                        batch.push(target);
                    }
                    Ok(target) => skip(&mut report, log_skips, &Error::NotAFile(target)),
                    Err(err) => skip(&mut report, log_skips, &err),
                }
            } else if entry.file_type().is_file() {
                report.files += 1;
                batch.push(path.to_path_buf());
            }

            if batch.len() >= APPEND_BATCH {
                files.extend(batch.drain(..));
            }
        }
        files.extend(batch.drain(..));
    }

    report
}

fn skip(report: &mut IndexReport, log_skips: bool, err: &Error) {
    report.skipped += 1;
    if log_skips {
        warn!(error = %err, "skipping during index");
    } else {
        debug!(error = %err, "skipping during index");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indirection::ShortcutResolver;
    use crate::indirection::lnk;

    fn names(files: &FileList, root: &Path) -> Vec<String> {
        let root = fs::canonicalize(root).unwrap();
        let mut out: Vec<String> = files
            .snapshot()
            .into_iter()
            .map(|p| {
                p.strip_prefix(&root)
                    .unwrap_or(&p)
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn indexes_every_regular_file_recursively() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("top.jpg"), b"x").unwrap();
        fs::write(root.join("a/b/c/deep.png"), b"x").unwrap();
        fs::write(root.join("a/notes.txt"), b"x").unwrap();

        let files = FileList::new();
        let report = index_tree(root, &ShortcutResolver, &files, &CancellationToken::new(), true);

        assert_eq!(names(&files, root), vec!["a/b/c/deep.png", "a/notes.txt", "top.jpg"]);
        assert_eq!(report.files, 3);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn follows_shell_links_and_skips_dangling_ones() {
        let tmp = tempfile::tempdir().unwrap();
        let show = tmp.path().join("show");
        let outside = tmp.path().join("outside");
        fs::create_dir_all(&show).unwrap();
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("far.jpg"), b"x").unwrap();
        fs::write(show.join("near.jpg"), b"x").unwrap();
        fs::write(show.join("outside.lnk"), lnk::tests::build(&outside, true)).unwrap();
        fs::write(show.join("dead.lnk"), lnk::tests::build(&tmp.path().join("nowhere"), true))
            .unwrap();

        let files = FileList::new();
        let report = index_tree(&show, &ShortcutResolver, &files, &CancellationToken::new(), false);

        let mut got: Vec<PathBuf> = files.snapshot();
        got.sort();
        let mut want = vec![
            fs::canonicalize(outside.join("far.jpg")).unwrap(),
            fs::canonicalize(show.join("near.jpg")).unwrap(),
        ];
        want.sort();
        assert_eq!(got, want);
        assert_eq!(report.links_followed, 1);
        assert_eq!(report.skipped, 1);
    }

    #[cfg(unix)]
    #[test]
    fn link_cycle_is_indexed_once() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/pic.jpg"), b"x").unwrap();
        std::os::unix::fs::symlink(root, root.join("sub/back-to-root")).unwrap();

        let files = FileList::new();
        index_tree(root, &ShortcutResolver, &files, &CancellationToken::new(), true);
        assert_eq!(names(&files, root), vec!["sub/pic.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn link_to_ancestor_does_not_list_files_twice() {
        let tmp = tempfile::tempdir().unwrap();
        let show = tmp.path().join("show");
        fs::create_dir_all(show.join("nested")).unwrap();
        fs::write(show.join("pic.jpg"), b"x").unwrap();
        fs::write(show.join("nested/deep.jpg"), b"x").unwrap();
        fs::write(tmp.path().join("beside.jpg"), b"x").unwrap();
        std::os::unix::fs::symlink("..", show.join("up")).unwrap();

        let files = FileList::new();
        let report = index_tree(&show, &ShortcutResolver, &files, &CancellationToken::new(), true);

        assert_eq!(
            names(&files, tmp.path()),
            vec!["beside.jpg", "show/nested/deep.jpg", "show/pic.jpg"]
        );
        assert_eq!(report.files, 3);
    }

    #[cfg(unix)]
    #[test]
    fn link_to_named_pipe_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tmp.path().join("outside");
        let show = tmp.path().join("show");
        fs::create_dir_all(&outside).unwrap();
        fs::create_dir_all(&show).unwrap();
        crate::sampler::testing::make_fifo(&outside.join("pipe"));
        fs::write(show.join("pic.jpg"), b"x").unwrap();
        std::os::unix::fs::symlink(outside.join("pipe"), show.join("pipe-link")).unwrap();

        let files = FileList::new();
        let report = index_tree(&show, &ShortcutResolver, &files, &CancellationToken::new(), false);

        assert_eq!(names(&files, &show), vec!["pic.jpg"]);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn skip_records_follow_logging_flag() {
        use crate::logging::testing::Captured;

        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("dead.lnk"), lnk::tests::build(&tmp.path().join("gone"), true))
            .unwrap();
        fs::write(tmp.path().join("bad.lnk"), b"not a shell link").unwrap();

        for (log_skips, expected) in [(true, 2), (false, 0)] {
            let captured = Captured::default();
            let files = FileList::new();
            let cancel = CancellationToken::new();
            let report = tracing::subscriber::with_default(captured.subscriber(), || {
                index_tree(tmp.path(), &ShortcutResolver, &files, &cancel, log_skips)
            });
            assert_eq!(report.skipped, 2);
            assert_eq!(captured.count("skipping during index"), expected);
        }
    }

    #[test]
    fn missing_root_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let files = FileList::new();
        let report = index_tree(
            &tmp.path().join("absent"),
            &ShortcutResolver,
            &files,
            &CancellationToken::new(),
            true,
        );
        assert!(files.is_empty());
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_marks_list_complete() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("one.jpg"), b"x").unwrap();
        let files = FileList::new();

        let report = run(
            tmp.path().to_path_buf(),
            Arc::new(ShortcutResolver),
            files.clone(),
            CancellationToken::new(),
            true,
        )
        .await
        .unwrap();

        assert!(files.is_complete());
        assert_eq!(report.files, 1);
        assert_eq!(files.len(), 1);
    }
}
