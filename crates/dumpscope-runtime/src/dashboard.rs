// Dashboard shell - session state and the async ingestion boundary
//
// One owner mutates the session through `&mut self`; ingestion runs on spawned
// tokio tasks and reports back over an unbounded channel. Completions are only
// applied when the owner asks for them (`next_event` / `drain_events`), so
// every reaction is discrete: an upload lands in the store in one step or
// not at all.
//
// `clear` starts a new epoch. Completions carry the epoch their upload was
// started in and anything older than the current epoch is dropped.

use dumpscope_engine::{ViewComposer, ViewModel, ViewOptions};
use dumpscope_types::{RecordFilter, TABS, Tab, TabInfo, validate_batch};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::events::{DashboardEvent, UploadId, UploadRef, UploadStatus};
use crate::ingest::{IngestOutput, IngestionError, Ingestor, Upload};
use crate::store::RecordStore;

struct Completion {
    epoch: u64,
    id: UploadId,
    result: Result<IngestOutput, IngestionError>,
}

pub struct Dashboard<I: Ingestor> {
    ingestor: Arc<I>,
    composer: ViewComposer,
    active_tab: Tab,
    filters: HashMap<Tab, RecordFilter>,
    uploads: Vec<UploadRef>,
    store: RecordStore,
    epoch: u64,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<I: Ingestor> Dashboard<I> {
    pub fn new(ingestor: I, options: ViewOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            ingestor: Arc::new(ingestor),
            composer: ViewComposer::new(options),
            active_tab: Tab::default(),
            filters: HashMap::new(),
            uploads: Vec::new(),
            store: RecordStore::new(),
            epoch: 0,
            tx,
            rx,
        }
    }

    /// Fixed tab list, in display order
    pub fn tabs(&self) -> &'static [TabInfo] {
        &TABS
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    /// Replace the filter of one tab; other tabs keep theirs
    pub fn set_filter(&mut self, tab: Tab, filter: RecordFilter) {
        self.filters.insert(tab, filter);
    }

    pub fn filter(&self, tab: Tab) -> RecordFilter {
        self.filters.get(&tab).cloned().unwrap_or_default()
    }

    pub fn uploads(&self) -> &[UploadRef] {
        &self.uploads
    }

    pub fn upload_status(&self, id: UploadId) -> Option<&UploadStatus> {
        self.uploads.iter().find(|u| u.id == id).map(|u| &u.status)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Hand an upload to the ingestor in the background.
    ///
    /// Must be called from within a tokio runtime. The upload is `Pending`
    /// until its completion is applied by `next_event` or `drain_events`.
    pub fn upload(&mut self, upload: Upload) -> UploadId {
        let id = UploadId::new();

        if !upload.has_accepted_extension() {
            tracing::warn!(
                upload = %upload.name,
                "unrecognized file extension, forwarding to ingestor anyway"
            );
        }
        tracing::info!(
            upload = %upload.name,
            %id,
            bytes = upload.bytes.len(),
            "dispatching upload"
        );

        self.uploads.push(UploadRef {
            id,
            name: upload.name.clone(),
            status: UploadStatus::Pending,
        });

        let ingestor = Arc::clone(&self.ingestor);
        let tx = self.tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            // Submit runs in its own task so a panic surfaces as a join error
            let worker = tokio::spawn(async move { ingestor.submit(upload).await });
            let result = match worker.await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!(%id, error = %err, "ingestion task aborted");
                    Err(IngestionError::new(format!("ingestion task panicked: {}", err)))
                }
            };
            // The receiver lives as long as the dashboard; a send error only
            // means the session is gone.
            let _ = tx.send(Completion { epoch, id, result });
        });

        id
    }

    fn has_pending(&self) -> bool {
        self.uploads
            .iter()
            .any(|u| u.status == UploadStatus::Pending)
    }

    /// Wait for the next upload of the current session to complete and apply
    /// it. Returns `None` when no upload is pending.
    pub async fn next_event(&mut self) -> Option<DashboardEvent> {
        while self.has_pending() {
            let completion = self.rx.recv().await?;
            if let Some(event) = self.apply(completion) {
                return Some(event);
            }
        }
        None
    }

    /// Apply every completion that has already arrived, without waiting.
    pub fn drain_events(&mut self) -> Vec<DashboardEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(event) = self.apply(completion) {
                events.push(event);
            }
        }
        events
    }

    fn apply(&mut self, completion: Completion) -> Option<DashboardEvent> {
        let Completion { epoch, id, result } = completion;

        if epoch != self.epoch {
            tracing::debug!(%id, "ignoring completion of an upload started before clear");
            return None;
        }
        let index = self.uploads.iter().position(|u| u.id == id)?;
        let name = self.uploads[index].name.clone();

        let (status, event) = match result {
            Ok(IngestOutput { records, rejected }) => {
                let batch = validate_batch(records);
                for invalid in rejected.iter().chain(&batch.rejected) {
                    tracing::debug!(upload = %name, "record rejected: {}", invalid);
                }
                let accepted = batch.accepted_count();
                let rejected = rejected.len() + batch.rejected_count();
                self.store.append(batch.accepted, rejected);
                tracing::info!(upload = %name, accepted, rejected, "upload ingested");

                (
                    UploadStatus::Ingested { accepted, rejected },
                    DashboardEvent::UploadIngested {
                        id,
                        accepted,
                        rejected,
                    },
                )
            }
            Err(err) => {
                tracing::warn!(upload = %name, "{}", err);
                (
                    UploadStatus::Failed {
                        reason: err.reason.clone(),
                    },
                    DashboardEvent::UploadFailed {
                        id,
                        reason: err.reason,
                    },
                )
            }
        };

        self.uploads[index].status = status;
        Some(event)
    }

    /// View of the active tab under its filter
    pub fn view(&self) -> ViewModel {
        self.view_of(self.active_tab)
    }

    pub fn view_of(&self, tab: Tab) -> ViewModel {
        self.composer
            .render(self.store.records(), tab, &self.filter(tab))
            .with_revision(self.store.revision())
    }

    /// Discard all records and uploads. Tab selection and filters stay.
    pub fn clear(&mut self) {
        self.epoch += 1;
        self.uploads.clear();
        self.store.clear();
        tracing::info!(epoch = self.epoch, "session cleared");
    }
}
