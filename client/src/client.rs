//! Client facade — owns the subprocess and the three protocol workers.
//!
//! One writer task drains the outbound queue strictly in FIFO order onto
//! the transport; one reader task pulls lines off the server's stdout
//! and pushes decoded messages onto the response queue; one router task
//! drains that queue, classifies each message, and delivers results and
//! notifications. Sending a request never blocks the editor-event caller
//! beyond bounded-channel backpressure.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};

use crate::classify::{Classified, Notification, RouterCommand, classify};
use crate::codec::{LineReader, LineWriter};
use crate::error::Error;
use crate::events::{AnalysisEvent, StopReason};
use crate::protocol::{self, ContentChange, Request, WireError};
use crate::registry::{RequestKind, TokenRegistry, ViewContext};
use crate::roots::RootSet;
use crate::transport::ServerProcess;
use anser_types::AnalyzerConfig;

const WRITER_CHANNEL_CAPACITY: usize = 64;

const ROUTER_CHANNEL_CAPACITY: usize = 256;

/// How long the reader waits before retrying a transient end-of-stream.
const EOF_RETRY: Duration = Duration::from_millis(250);

/// One item on the outbound request queue.
#[derive(Debug)]
pub(crate) enum WriterCommand {
    Send(Value),
    /// Coordinated-shutdown sentinel; closes the stream and ends the loop.
    Shutdown,
}

/// Handle to one running analysis server.
///
/// Dropping the handle kills the child (`kill_on_drop`); prefer
/// [`AnalysisClient::shutdown`] for an orderly stop.
pub struct AnalysisClient {
    config: AnalyzerConfig,
    child: ServerProcess,
    writer_tx: mpsc::Sender<WriterCommand>,
    router_tx: mpsc::Sender<RouterCommand>,
    registry: Arc<TokenRegistry>,
    roots: Mutex<RootSet>,
    /// Documents with edits the server has not seen as an overlay yet.
    unsaved: Mutex<HashSet<ViewContext>>,
    /// True while our end of the child's stdin is open. The reader uses
    /// this to tell a transient end-of-stream from a final one.
    stdin_open: Arc<AtomicBool>,
    #[allow(dead_code)]
    writer_handle: tokio::task::JoinHandle<()>,
    #[allow(dead_code)]
    reader_handle: tokio::task::JoinHandle<()>,
    #[allow(dead_code)]
    router_handle: tokio::task::JoinHandle<()>,
}

impl AnalysisClient {
    /// Spawn the server and the protocol workers.
    ///
    /// Notifications are delivered on `event_tx`. Fails with
    /// [`Error::Launch`] or [`Error::ExecutableNotFound`] if the server
    /// cannot be started; there is no automatic respawn. Must be called
    /// from within a tokio runtime.
    pub fn start(
        config: AnalyzerConfig,
        event_tx: mpsc::Sender<AnalysisEvent>,
    ) -> Result<Self, Error> {
        let (child, stdin, stdout) = ServerProcess::spawn(&config)?;
        tracing::info!(executable = %config.executable, "analysis server started");

        let stdin_open = Arc::new(AtomicBool::new(true));
        let registry = Arc::new(TokenRegistry::new());

        let (writer_tx, writer_rx) = mpsc::channel(WRITER_CHANNEL_CAPACITY);
        let (router_tx, router_rx) = mpsc::channel(ROUTER_CHANNEL_CAPACITY);

        let writer_handle = tokio::spawn(run_writer(writer_rx, LineWriter::new(stdin)));
        let reader_handle = tokio::spawn(run_reader(
            LineReader::new(stdout),
            router_tx.clone(),
            event_tx.clone(),
            stdin_open.clone(),
        ));
        let router_handle = tokio::spawn(run_router(router_rx, registry.clone(), event_tx));

        let roots = Mutex::new(RootSet::new(config.excluded_roots.clone()));

        Ok(Self {
            config,
            child,
            writer_tx,
            router_tx,
            registry,
            roots,
            unsaved: Mutex::new(HashSet::new()),
            stdin_open,
            writer_handle,
            reader_handle,
            router_handle,
        })
    }

    /// Register the analysis root `path` belongs to.
    ///
    /// Resolves `path` through the configured project-manifest markers
    /// and, if the root set actually changed, sends the full set to the
    /// server. Idempotent; a no-op for empty paths.
    pub async fn add_root(&self, context: ViewContext, path: &Path) {
        let request = {
            let mut roots = self.lock_roots();
            if !roots.add(path, &self.config.root_markers) {
                return;
            }
            let token = self.registry.issue(context, RequestKind::SetRoots, None);
            protocol::set_analysis_roots(token, roots.included(), roots.excluded())
        };
        tracing::info!("sending set roots request");
        self.enqueue(request).await;
    }

    /// Send a content overlay for one file.
    pub async fn update_content(&self, context: ViewContext, file: &Path, change: ContentChange) {
        let token = self
            .registry
            .issue(context, RequestKind::UpdateContent, None);
        let mut files = HashMap::new();
        files.insert(file.to_string_lossy().into_owned(), change);
        tracing::info!(file = %file.display(), "sending update content request");
        self.enqueue(protocol::update_content(token, files)).await;
    }

    /// Start a top-level-declarations search.
    ///
    /// Returns the issued token. Results arrive as
    /// [`AnalysisEvent::SearchResults`] carrying a search id; the server
    /// may reassign the token before results flow, in which case the
    /// events carry the reassigned id.
    pub async fn find_top_level_declarations(
        &self,
        context: ViewContext,
        pattern: &str,
    ) -> String {
        let token = self.registry.issue(context, RequestKind::Search, None);
        tracing::info!("sending top level declarations request");
        self.enqueue(protocol::find_top_level_declarations(token.clone(), pattern))
            .await;
        token
    }

    /// Ask the server for its version. The receiver completes with the
    /// response payload, or not at all if the client shuts down first.
    pub async fn request_server_version(&self, context: ViewContext) -> oneshot::Receiver<Value> {
        let (tx, rx) = oneshot::channel();
        let token = self.registry.issue(context, RequestKind::Version, Some(tx));
        self.enqueue(protocol::server_get_version(token)).await;
        rx
    }

    /// The buffer's content changed; remember that it has edits the
    /// server has not seen yet.
    pub fn document_modified(&self, context: ViewContext) {
        self.lock_unsaved().insert(context);
    }

    /// The buffer sat idle: overlay its contents if it carries unsaved
    /// edits, otherwise do nothing.
    pub async fn document_idle(&self, context: ViewContext, file: &Path, text: &str) {
        if !self.lock_unsaved().contains(&context) {
            return;
        }
        self.update_content(
            context,
            file,
            ContentChange::Add {
                content: text.to_string(),
            },
        )
        .await;
    }

    /// The buffer was saved: drop the overlay, the filesystem is current.
    pub async fn document_saved(&self, context: ViewContext, file: &Path) {
        self.lock_unsaved().remove(&context);
        self.update_content(context, file, ContentChange::Remove)
            .await;
    }

    /// A document gained focus: make sure its project root is analyzed.
    pub async fn document_activated(&self, context: ViewContext, file: &Path) {
        self.add_root(context, file).await;
    }

    /// A document/window closed: forget its outstanding requests.
    pub fn document_closed(&self, context: ViewContext) {
        self.lock_unsaved().remove(&context);
        self.registry.prune(context);
    }

    /// True while the server's input stream is still open on our side.
    pub fn is_running(&self) -> bool {
        self.stdin_open.load(Ordering::SeqCst)
    }

    /// Stop the client: close the server's input stream, signal both
    /// worker queues, then terminate the process. Outstanding
    /// continuations are dropped, never completed.
    pub async fn shutdown(mut self) {
        self.stdin_open.store(false, Ordering::SeqCst);
        let _ = self.writer_tx.send(WriterCommand::Shutdown).await;
        let _ = self.router_tx.send(RouterCommand::Shutdown).await;
        self.child.stop().await;
        tracing::info!("analysis server stopped");
    }

    async fn enqueue(&self, request: Request) {
        if self
            .writer_tx
            .send(WriterCommand::Send(request.into_value()))
            .await
            .is_err()
        {
            tracing::warn!("request dropped, dispatcher is gone");
        }
    }

    fn lock_roots(&self) -> std::sync::MutexGuard<'_, RootSet> {
        self.roots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_unsaved(&self) -> std::sync::MutexGuard<'_, HashSet<ViewContext>> {
        self.unsaved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Outbound worker: drains the request queue strictly in FIFO order onto
/// the transport. Requests are never reordered or batched; the server
/// must see them in submission order.
pub(crate) async fn run_writer<W: AsyncWrite + Unpin>(
    mut rx: mpsc::Receiver<WriterCommand>,
    mut writer: LineWriter<W>,
) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WriterCommand::Send(frame) => {
                // Requests are fire-and-forget from here; a dead transport
                // fails every later send and is surfaced via logs.
                if let Err(e) = writer.write_message(&frame).await {
                    tracing::warn!("analysis server write error: {e}");
                }
            }
            WriterCommand::Shutdown => {
                writer.close();
                break;
            }
        }
    }
    tracing::debug!("request dispatcher exiting");
}

/// Reader worker: pulls lines off the server's stdout and pushes decoded
/// messages onto the response queue.
pub(crate) async fn run_reader<R: AsyncRead + Unpin>(
    mut reader: LineReader<R>,
    router_tx: mpsc::Sender<RouterCommand>,
    event_tx: mpsc::Sender<AnalysisEvent>,
    stdin_open: Arc<AtomicBool>,
) {
    loop {
        match reader.read_message().await {
            Ok(Some(msg)) => {
                if router_tx.send(RouterCommand::Message(msg)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                // The server can be slow to flush: end-of-stream while our
                // end of its stdin is still open is transient.
                if stdin_open.load(Ordering::SeqCst) {
                    tokio::time::sleep(EOF_RETRY).await;
                    continue;
                }
                tracing::info!("analysis server closed stdout");
                let _ = event_tx
                    .send(AnalysisEvent::ServerStopped {
                        reason: StopReason::Exited,
                    })
                    .await;
                break;
            }
            Err(e @ (Error::Decode(_) | Error::OversizedLine { .. })) => {
                tracing::warn!("discarding malformed server line: {e}");
            }
            Err(e) => {
                tracing::warn!("analysis server read error: {e}");
                let _ = event_tx
                    .send(AnalysisEvent::ServerStopped {
                        reason: StopReason::Failed(e.to_string()),
                    })
                    .await;
                break;
            }
        }
    }
    tracing::debug!("reader exiting");
}

/// Routing worker: drains the response queue, classifies each message,
/// and delivers results to their continuations and notifications to the
/// event channel. Runs apart from the reader and the writer so a slow
/// consumer cannot stall outbound sends.
pub(crate) async fn run_router(
    mut rx: mpsc::Receiver<RouterCommand>,
    registry: Arc<TokenRegistry>,
    event_tx: mpsc::Sender<AnalysisEvent>,
) {
    while let Some(cmd) = rx.recv().await {
        match classify(cmd, &registry) {
            Classified::Shutdown => break,
            other => route(other, &event_tx).await,
        }
    }
    tracing::debug!("response router exiting");
}

/// Deliver one classified message. Failures here are logged and
/// contained; a single bad response must never kill the router.
async fn route(classified: Classified, event_tx: &mpsc::Sender<AnalysisEvent>) {
    match classified {
        Classified::Shutdown => {}
        Classified::Result { pending, payload } => match pending.reply {
            Some(reply) => {
                if reply.send(payload).is_err() {
                    tracing::debug!("response dropped, requester went away");
                }
            }
            None => tracing::trace!("consumed response to fire-and-forget request"),
        },
        Classified::Reassigned { old, new } => {
            tracing::debug!(%old, %new, "search token reassigned");
        }
        Classified::Notification(notification) => {
            let event = match notification {
                Notification::Errors(p) => AnalysisEvent::Diagnostics {
                    file: p.file,
                    items: p.errors.iter().map(WireError::to_diagnostic).collect(),
                },
                Notification::Navigation(p) => AnalysisEvent::Navigation(p),
                Notification::Completions(p) => AnalysisEvent::Completions(p),
                Notification::SearchResults(p) => AnalysisEvent::SearchResults(p),
                Notification::Status(p) => AnalysisEvent::Status {
                    message: p.status.message,
                },
            };
            if event_tx.send(event).await.is_err() {
                tracing::warn!("dropping event, notification sink closed");
            }
        }
        Classified::DecodeError { kind, source } => {
            tracing::warn!(?kind, error = %source, "failed to decode known notification");
        }
        Classified::Unrecognized => {
            tracing::trace!("ignoring unrecognized server message");
        }
    }
}
