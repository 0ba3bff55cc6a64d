//! In-process task server speaking the wire protocol over loopback TCP.

#![allow(dead_code)]

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use anyhow::Result;
use tasklink_client::{ClientConfig, FilterMode, ServerConfig};
use tasklink_core::{Task, TaskFilterBuilder, TaskId};
use tasklink_proto::{Command, Decoder, Encoder, Request};
use time::Date;
use time::macros::date;

/// Date the server uses as "today" when it evaluates special filters.
pub const SERVER_TODAY: Date = date!(2025 - 03 - 10);

#[derive(Debug, Default)]
pub struct ServerState {
    pub tasks: Vec<Task>,
    pub next_id: i32,
    pub connections: usize,
    pub received: Vec<Command>,
    pub refuse_removes: bool,
    pub corrupt_next_load: bool,
    pub drop_next_load: bool,
}

pub struct TestServer {
    port: u16,
    state: Arc<Mutex<ServerState>>,
}

impl TestServer {
    /// Bind an ephemeral port and serve connections one at a time.
    pub fn start(tasks: Vec<Task>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let next_id = tasks.iter().map(|task| task.id.get()).max().unwrap_or(0) + 1;
        let state = Arc::new(Mutex::new(ServerState {
            tasks,
            next_id,
            ..ServerState::default()
        }));

        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                lock(&shared).connections += 1;
                serve(stream, &shared);
            }
        });

        Ok(Self { port, state })
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: self.port,
            },
            ..ClientConfig::default()
        }
    }

    pub fn server_filter_config(&self) -> ClientConfig {
        let mut config = self.config();
        config.filter.mode = FilterMode::Server;
        config
    }

    pub fn state(&self) -> MutexGuard<'_, ServerState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<ServerState>) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn serve(mut stream: TcpStream, state: &Mutex<ServerState>) {
    loop {
        let Ok(request) = Decoder::new(&mut stream).request() else {
            return;
        };
        let mut guard = lock(state);
        guard.received.push(request.command());
        if request == Request::LoadInfo && guard.drop_next_load {
            guard.drop_next_load = false;
            return;
        }
        if request == Request::LoadInfo && guard.corrupt_next_load {
            guard.corrupt_next_load = false;
            drop(guard);
            // Valid length prefix followed by a body that is not JSON.
            let _ = stream.write_all(&[0, 0, 0, 4, b'n', b'o', b'p', b'e']);
            return;
        }
        let mut encoder = Encoder::new(&mut stream);
        let written = match request {
            Request::LoadInfo => encoder.tasks(&guard.tasks),
            Request::AddTask(mut draft) => {
                draft.id = TaskId(guard.next_id);
                guard.next_id += 1;
                guard.tasks.push(draft.clone());
                encoder.task(&draft)
            }
            Request::Remove(id) => {
                let refuse = guard.refuse_removes;
                let target = guard.tasks.iter_mut().find(|task| task.id == id);
                let acknowledged = match target {
                    Some(task) if !refuse => {
                        task.archived = true;
                        true
                    }
                    _ => false,
                };
                encoder.ack(acknowledged)
            }
            Request::UpdateTask(task) => {
                if let Some(existing) = guard.tasks.iter_mut().find(|existing| existing.id == task.id) {
                    *existing = task;
                }
                Ok(())
            }
            Request::Filter {
                index,
                tags,
                description,
            } => {
                let filter = TaskFilterBuilder::new()
                    .with_tags(&tags)
                    .with_text(&description)
                    .with_special_index(index)
                    .build();
                encoder.tasks(&filter.apply(&guard.tasks, SERVER_TODAY))
            }
        };
        if written.and_then(|()| encoder.flush()).is_err() {
            return;
        }
    }
}
