//! Fetch loop orchestrator.
//!
//! Append-then-checkpoint ordering: a crash after the sink append but before
//! the checkpoint write re-appends that page on resume. The sink is never
//! rewritten or deduplicated here.

use crate::checkpoint::CheckpointStore;
use crate::fetch::ProgressSink;
use crate::models::{FetchOutcome, Result, StarRecord, StargazerPage, StarmailError};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// One paginated request against the stargazer source.
///
/// Implemented by [`crate::client::GithubClient`]; tests script their own.
pub trait PageSource {
    fn fetch_page(
        &self,
        owner: &str,
        repo: &str,
        after: Option<&str>,
    ) -> impl std::future::Future<Output = Result<StargazerPage>> + Send;
}

/// Parameters for one fetch run.
#[derive(Debug, Clone)]
pub struct FetchParams {
    pub owner: String,
    pub repo: String,
    /// Append-only NDJSON sink
    pub output: PathBuf,
    /// Resume from an existing checkpoint instead of starting fresh
    pub resume: bool,
}

/// Drives the fetch loop against a page source and checkpoint store.
pub struct StarFetcher<S> {
    source: S,
    store: CheckpointStore,
}

impl<S: PageSource> StarFetcher<S> {
    pub fn new(source: S, store: CheckpointStore) -> Self {
        Self { source, store }
    }

    /// Run the loop to completion.
    pub async fn run(
        &self,
        params: &FetchParams,
        progress: &mut dyn ProgressSink,
    ) -> Result<FetchOutcome> {
        // INIT: a non-resuming run discards prior state; whenever no
        // checkpoint exists, stale sink output is cleared too.
        if !params.resume {
            self.store.reset()?;
        }

        if self.store.exists() {
            info!(checkpoint = %self.store.path().display(), "Resuming from checkpoint");
        } else {
            remove_if_present(&params.output)?;
        }

        let mut state = self.store.load();
        let start_count = state.count;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&params.output)
            .map_err(|e| StarmailError::io("opening output sink", e))?;
        let mut writer = BufWriter::new(file);

        let mut outcome = FetchOutcome::default();

        loop {
            let page = self
                .source
                .fetch_page(&params.owner, &params.repo, state.after.as_deref())
                .await?;
            outcome.total_count = page.total_count;

            // A zero-record page ends the run even if the source claims more
            // pages exist; malformed responses must not loop forever.
            if page.nodes.is_empty() {
                break;
            }

            outcome.pages += 1;
            state.count += page.nodes.len() as u64;

            // APPENDING: accepted records, in page order.
            for node in &page.nodes {
                if let Some(record) = StarRecord::from_node(node) {
                    let json = serde_json::to_string(&record).map_err(|e| {
                        StarmailError::Internal(format!("Serializing record: {e}"))
                    })?;
                    writeln!(writer, "{json}")
                        .map_err(|e| StarmailError::io("appending to sink", e))?;
                    outcome.records_written += 1;
                }
            }
            writer
                .flush()
                .map_err(|e| StarmailError::io("flushing sink", e))?;

            let percent = if page.total_count == 0 {
                100.0
            } else {
                (state.count as f64 / page.total_count as f64) * 100.0
            };
            progress.report(percent);

            // CHECKPOINTING: only worth persisting when there is a cursor to
            // resume from.
            state.after = page.end_cursor.clone();
            if state.after.is_some() {
                self.store.save(&state)?;
            }

            if !page.has_next_page {
                break;
            }
        }

        // DONE
        progress.report(100.0);
        self.store.reset()?;

        outcome.records_seen = state.count;
        info!(
            seen = state.count,
            written = outcome.records_written,
            resumed_from = start_count,
            pages = outcome.pages,
            "Fetch complete"
        );

        Ok(outcome)
    }
}

fn remove_if_present(path: &std::path::Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StarmailError::io("clearing output sink", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::FetchCheckpoint;
    use crate::fetch::progress::test_support::RecordingProgress;
    use crate::models::StargazerNode;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn node(login: &str, email: &str) -> StargazerNode {
        StargazerNode {
            name: None,
            login: login.to_string(),
            email: email.to_string(),
        }
    }

    fn page(
        total: u64,
        has_next: bool,
        cursor: Option<&str>,
        nodes: Vec<StargazerNode>,
    ) -> StargazerPage {
        StargazerPage {
            total_count: total,
            has_next_page: has_next,
            end_cursor: cursor.map(str::to_string),
            nodes,
        }
    }

    /// Serves a scripted page sequence and records the cursors requested.
    struct ScriptedSource {
        pages: Mutex<Vec<StargazerPage>>,
        cursors_seen: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(mut pages: Vec<StargazerPage>) -> Self {
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
                cursors_seen: Mutex::new(Vec::new()),
            }
        }

        fn cursors(&self) -> Vec<Option<String>> {
            self.cursors_seen.lock().unwrap().clone()
        }
    }

    impl PageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            _owner: &str,
            _repo: &str,
            after: Option<&str>,
        ) -> Result<StargazerPage> {
            self.cursors_seen
                .lock()
                .unwrap()
                .push(after.map(str::to_string));
            self.pages
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| StarmailError::Internal("script exhausted".to_string()))
        }
    }

    fn params(dir: &TempDir, resume: bool) -> FetchParams {
        FetchParams {
            owner: "oomol".to_string(),
            repo: "demo".to_string(),
            output: dir.path().join("stars.ndjson"),
            resume,
        }
    }

    fn sink_lines(path: &std::path::Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn full_run_appends_filtered_records_and_removes_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::for_run(dir.path(), "oomol", "demo").unwrap();
        let source = ScriptedSource::new(vec![
            page(
                4,
                true,
                Some("c1"),
                vec![node("a", "a@example.com"), node("b", "")],
            ),
            page(
                4,
                false,
                Some("c2"),
                vec![node("c", "c@example.com"), node("d", "d@example.com")],
            ),
        ]);

        let fetcher = StarFetcher::new(source, store);
        let mut progress = RecordingProgress::default();
        let outcome = fetcher
            .run(&params(&dir, false), &mut progress)
            .await
            .unwrap();

        assert_eq!(outcome.records_seen, 4);
        assert_eq!(outcome.records_written, 3);
        assert_eq!(outcome.pages, 2);

        let lines = sink_lines(&dir.path().join("stars.ndjson"));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], r#"{"name":"a","email":"a@example.com"}"#);

        // Checkpoint must not exist after a successful completion.
        assert!(!dir.path().join("oomol-demo-checkpoint.json").exists());

        // Cursor chaining: none, then the first page's end cursor.
        assert_eq!(
            fetcher.source.cursors(),
            vec![None, Some("c1".to_string())]
        );
    }

    #[tokio::test]
    async fn zero_node_page_terminates_despite_has_next_page() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::for_run(dir.path(), "oomol", "demo").unwrap();
        let source = ScriptedSource::new(vec![
            page(10, true, Some("c1"), vec![node("a", "a@example.com")]),
            page(10, true, Some("c2"), vec![]),
            // Never reached; the script would error if requested.
        ]);

        let fetcher = StarFetcher::new(source, store);
        let mut progress = RecordingProgress::default();
        let outcome = fetcher
            .run(&params(&dir, false), &mut progress)
            .await
            .unwrap();

        assert_eq!(outcome.pages, 1);
        assert_eq!(fetcher.source.cursors().len(), 2);
        assert!(!dir.path().join("oomol-demo-checkpoint.json").exists());
    }

    #[tokio::test]
    async fn resume_continues_from_cursor_without_clearing_sink() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::for_run(dir.path(), "oomol", "demo").unwrap();

        // State left behind by an interrupted run.
        let sink = dir.path().join("stars.ndjson");
        fs::write(&sink, "{\"name\":\"old\",\"email\":\"old@example.com\"}\n").unwrap();
        store
            .save(&FetchCheckpoint {
                count: 2,
                after: Some("c1".to_string()),
            })
            .unwrap();

        let source = ScriptedSource::new(vec![page(
            3,
            false,
            Some("c2"),
            vec![node("new", "new@example.com")],
        )]);
        let fetcher = StarFetcher::new(source, store);
        let mut progress = RecordingProgress::default();
        let outcome = fetcher
            .run(&params(&dir, true), &mut progress)
            .await
            .unwrap();

        // Prior sink content survives, new record is appended after it.
        let lines = sink_lines(&sink);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("old@example.com"));
        assert!(lines[1].contains("new@example.com"));

        // Fetch restarted from the persisted cursor, count carried over.
        assert_eq!(fetcher.source.cursors(), vec![Some("c1".to_string())]);
        assert_eq!(outcome.records_seen, 3);
    }

    #[tokio::test]
    async fn non_resuming_run_clears_sink_and_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::for_run(dir.path(), "oomol", "demo").unwrap();

        let sink = dir.path().join("stars.ndjson");
        fs::write(&sink, "stale line\n").unwrap();
        store
            .save(&FetchCheckpoint {
                count: 99,
                after: Some("stale".to_string()),
            })
            .unwrap();

        let source = ScriptedSource::new(vec![page(
            1,
            false,
            None,
            vec![node("a", "a@example.com")],
        )]);
        let fetcher = StarFetcher::new(source, store);
        let mut progress = RecordingProgress::default();
        fetcher
            .run(&params(&dir, false), &mut progress)
            .await
            .unwrap();

        // Stale checkpoint ignored: the run started from no cursor.
        assert_eq!(fetcher.source.cursors(), vec![None]);

        // Stale output gone.
        let lines = sink_lines(&sink);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("a@example.com"));
    }

    #[tokio::test]
    async fn resume_with_no_checkpoint_clears_stale_sink() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::for_run(dir.path(), "oomol", "demo").unwrap();

        let sink = dir.path().join("stars.ndjson");
        fs::write(&sink, "stale line\n").unwrap();

        let source = ScriptedSource::new(vec![page(
            1,
            false,
            None,
            vec![node("a", "a@example.com")],
        )]);
        let fetcher = StarFetcher::new(source, store);
        let mut progress = RecordingProgress::default();
        fetcher
            .run(&params(&dir, true), &mut progress)
            .await
            .unwrap();

        let lines = sink_lines(&sink);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].contains("stale"));
    }

    #[tokio::test]
    async fn checkpoint_persisted_mid_run_carries_count_and_cursor() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::for_run(dir.path(), "oomol", "demo").unwrap();
        let source = ScriptedSource::new(vec![
            page(4, true, Some("c1"), vec![node("a", "a@example.com")]),
            // The run dies here: script exhausted simulates a crash.
        ]);

        let fetcher = StarFetcher::new(source, store);
        let mut progress = RecordingProgress::default();
        let err = fetcher.run(&params(&dir, false), &mut progress).await;
        assert!(err.is_err());

        let store = CheckpointStore::for_run(dir.path(), "oomol", "demo").unwrap();
        let checkpoint = store.load();
        assert_eq!(checkpoint.count, 1);
        assert_eq!(checkpoint.after.as_deref(), Some("c1"));

        // Partial sink output remains for the resumed run to append after.
        assert_eq!(sink_lines(&dir.path().join("stars.ndjson")).len(), 1);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_exactly_100() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::for_run(dir.path(), "oomol", "demo").unwrap();
        let source = ScriptedSource::new(vec![
            page(4, true, Some("c1"), vec![node("a", "a@x.com"), node("b", "b@x.com")]),
            page(4, false, None, vec![node("c", "c@x.com"), node("d", "d@x.com")]),
        ]);

        let fetcher = StarFetcher::new(source, store);
        let mut progress = RecordingProgress::default();
        fetcher
            .run(&params(&dir, false), &mut progress)
            .await
            .unwrap();

        assert_eq!(progress.reports, vec![50.0, 100.0, 100.0]);
        assert!(progress
            .reports
            .windows(2)
            .all(|pair| pair[0] <= pair[1]));
        assert_eq!(*progress.reports.last().unwrap(), 100.0);
    }
}
