//! Synchronization, CRUD and filtering over one server connection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tasklink_core::{Clock, SystemClock, Task, TaskFilter, TaskId};
use tasklink_proto::{Decoder, Encoder, ProtocolError, Request};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::cache::{Snapshot, TaskCache};
use crate::config::{ClientConfig, FilterMode};
use crate::connection::{Connection, Connector, Endpoint, TcpConnector, Timeouts};
use crate::error::Result;

/// Whether a synchronization observed different data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The new snapshot differs in length or in at least one element.
    Changed,
    /// Both snapshots are element-wise equal.
    Unchanged,
}

impl SyncOutcome {
    /// Compare two snapshots by length and element-wise equality, in order.
    #[must_use]
    pub fn between(previous: &[Task], current: &[Task]) -> Self {
        if previous == current {
            Self::Unchanged
        } else {
            Self::Changed
        }
    }

    /// Whether data changed.
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Client-side task repository backed by a remote task server.
///
/// Every operation that touches the channel holds it for the whole
/// request/response exchange, so at most one request is ever in flight.
/// A failed exchange triggers exactly one reconnect before the call returns;
/// the failed command itself is never re-sent.
pub struct TaskClient<C: Connector = TcpConnector> {
    connection: Mutex<Connection<C>>,
    cache: TaskCache,
    clock: Arc<dyn Clock>,
    filter_mode: FilterMode,
}

impl TaskClient<TcpConnector> {
    /// Connect over TCP as described by `config` and perform an initial load.
    ///
    /// A failed initial load is logged and leaves the cache empty; the client
    /// is still returned so the caller can retry with [`load`](Self::load).
    ///
    /// # Errors
    /// Returns [`ClientError::Connectivity`](crate::ClientError::Connectivity) when the server cannot be reached.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let client = Self::new(TcpConnector, config.timeouts()).with_filter_mode(config.filter.mode);
        client.open(config.endpoint())?;
        if let Err(err) = client.load() {
            warn!(error = %err, "Initial load failed");
        }
        Ok(client)
    }
}

impl<C: Connector> TaskClient<C> {
    /// Create a client with a closed connection and an empty cache.
    pub fn new(connector: C, timeouts: Timeouts) -> Self {
        Self {
            connection: Mutex::new(Connection::new(connector, timeouts)),
            cache: TaskCache::new(),
            clock: Arc::new(SystemClock),
            filter_mode: FilterMode::Local,
        }
    }

    /// Use `clock` as the source of "today" for filters.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Choose where filters run. Fixed for the lifetime of the client.
    #[must_use]
    pub const fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    /// Filter mode of this client.
    #[must_use]
    pub const fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    /// Open the channel to `endpoint`.
    ///
    /// # Errors
    /// Returns [`ClientError::Connectivity`](crate::ClientError::Connectivity) when the server cannot be reached.
    pub fn open(&self, endpoint: Endpoint) -> Result<()> {
        self.lock_connection().open(endpoint)
    }

    /// Re-dial the last known endpoint, dropping the current channel.
    ///
    /// # Errors
    /// Returns an error when no endpoint is known or dialing fails.
    pub fn reconnect(&self) -> Result<()> {
        self.lock_connection().reconnect()
    }

    /// Close the channel.
    pub fn close(&self) {
        self.lock_connection().close();
    }

    /// Whether a channel is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.lock_connection().is_open()
    }

    /// Fetch the full snapshot and replace the cache with it.
    ///
    /// On failure the previous snapshot stays in place.
    ///
    /// # Errors
    /// Returns the transport or protocol error of the exchange.
    pub fn load(&self) -> Result<()> {
        let mut connection = self.lock_connection();
        self.load_locked(&mut connection).map(|_| ())
    }

    /// Load and report whether the server's data differs from the cached snapshot.
    ///
    /// The new snapshot is kept either way. On failure the previous snapshot
    /// stays in place.
    ///
    /// # Errors
    /// Returns the transport or protocol error of the exchange.
    pub fn synchronize(&self) -> Result<SyncOutcome> {
        let mut connection = self.lock_connection();
        let previous = self.cache.snapshot();
        let current = self.load_locked(&mut connection)?;
        drop(connection);
        let outcome = SyncOutcome::between(&previous, &current);
        debug!(?outcome, previous = previous.len(), current = current.len(), "Synchronized");
        Ok(outcome)
    }

    /// The current snapshot.
    #[must_use]
    pub fn get_all(&self) -> Snapshot {
        self.cache.snapshot()
    }

    /// A single cached task.
    #[must_use]
    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.cache.get(id)
    }

    /// Time of the last successful load.
    #[must_use]
    pub fn loaded_at(&self) -> Option<OffsetDateTime> {
        self.cache.loaded_at()
    }

    /// Create `draft` on the server and return its canonical record.
    ///
    /// The cache is not touched; the returned task replaces the caller's draft.
    ///
    /// # Errors
    /// Returns the transport or protocol error of the exchange.
    pub fn add(&self, draft: &Task) -> Result<Task> {
        let request = Request::AddTask(draft.clone());
        let created = self.exchange(&request, |decoder| decoder.task())?;
        info!(id = %created.id, "Added task");
        Ok(created)
    }

    /// Ask the server to archive `task`.
    ///
    /// On acknowledgement `task.archived` is set and the cache publishes a
    /// snapshot with the same flag flipped. A refusal (`Ok(false)`) changes
    /// nothing.
    ///
    /// # Errors
    /// Returns the transport or protocol error of the exchange.
    pub fn remove(&self, task: &mut Task) -> Result<bool> {
        let request = Request::Remove(task.id);
        let acknowledged = self.exchange(&request, |decoder| decoder.ack())?;
        if acknowledged {
            task.archived = true;
            self.cache.archive(task.id);
            info!(id = %task.id, "Removed task");
        } else {
            warn!(id = %task.id, "Server refused to remove task");
        }
        Ok(acknowledged)
    }

    /// Send the full record of `task` to the server.
    ///
    /// Fire-and-forget: success only means the bytes were written. Call
    /// [`synchronize`](Self::synchronize) to observe whether the server applied it.
    ///
    /// # Errors
    /// Returns the transport or protocol error of the exchange.
    pub fn update(&self, task: &Task) -> Result<()> {
        self.exchange(&Request::UpdateTask(task.clone()), |_| Ok(()))?;
        debug!(id = %task.id, "Sent task update");
        Ok(())
    }

    /// Produce a task view.
    ///
    /// In [`FilterMode::Local`] the whole pipeline runs over the cached
    /// snapshot with a single "today" from the clock. In
    /// [`FilterMode::Server`] the tag query, description query and special
    /// filter are sent with `FILTER`; the completion and due-soon switches
    /// have no wire field in that mode and are not applied.
    ///
    /// # Errors
    /// Local filtering cannot fail; server filtering returns the transport or
    /// protocol error of the exchange.
    pub fn filter(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        match self.filter_mode {
            FilterMode::Local => {
                let snapshot = self.cache.snapshot();
                let today = self.clock.today();
                let view = filter.apply(&snapshot, today);
                debug!(%filter, %today, matched = view.len(), "Filtered snapshot");
                Ok(view)
            }
            FilterMode::Server => {
                let request = Request::Filter {
                    index: filter.special.map_or(0, |special| special.index()),
                    tags: filter.tag_query(),
                    description: filter.text_query().to_owned(),
                };
                let view = self.exchange(&request, |decoder| decoder.tasks())?;
                debug!(%filter, matched = view.len(), "Server filtered tasks");
                Ok(view)
            }
        }
    }

    fn load_locked(&self, connection: &mut Connection<C>) -> Result<Snapshot> {
        let tasks = Self::exchange_locked(connection, &Request::LoadInfo, |decoder| decoder.tasks())?;
        info!(tasks = tasks.len(), "Loaded task snapshot");
        Ok(self.cache.replace(tasks))
    }

    fn exchange<T>(
        &self,
        request: &Request,
        read_reply: impl FnOnce(&mut Decoder<&mut C::Stream>) -> std::result::Result<T, ProtocolError>,
    ) -> Result<T> {
        let mut connection = self.lock_connection();
        Self::exchange_locked(&mut connection, request, read_reply)
    }

    fn exchange_locked<T>(
        connection: &mut Connection<C>,
        request: &Request,
        read_reply: impl FnOnce(&mut Decoder<&mut C::Stream>) -> std::result::Result<T, ProtocolError>,
    ) -> Result<T> {
        let command = request.command();
        let result = connection.stream().and_then(|stream| {
            Encoder::new(&mut *stream).request(request)?;
            Ok(read_reply(&mut Decoder::new(stream))?)
        });
        match result {
            Ok(value) => {
                debug!(%command, "Exchange completed");
                Ok(value)
            }
            Err(err) => {
                warn!(%command, error = %err, kind = ?err.kind(), "Exchange failed, reconnecting");
                if let Err(reconnect_err) = connection.reconnect() {
                    warn!(error = %reconnect_err, "Reconnect failed");
                }
                Err(err)
            }
        }
    }

    fn lock_connection(&self) -> MutexGuard<'_, Connection<C>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Connector> std::fmt::Debug for TaskClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskClient")
            .field("tasks", &self.cache.snapshot().len())
            .field("filter_mode", &self.filter_mode)
            .finish_non_exhaustive()
    }
}
