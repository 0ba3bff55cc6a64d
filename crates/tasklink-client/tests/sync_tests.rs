#![allow(missing_docs)]

mod support;

use std::sync::Arc;

use anyhow::Result;
use support::{SERVER_TODAY, TestServer};
use tasklink_client::{ClientConfig, ErrorKind, ServerConfig, SyncOutcome, TaskClient};
use tasklink_core::{FixedClock, SpecialFilter, Subtask, Task, TaskFilterBuilder, TaskId};
use tasklink_proto::Command;
use time::macros::date;

fn seeded_tasks() -> Vec<Task> {
    vec![
        Task {
            id: TaskId(1),
            ..Task::draft("Buy milk").with_tag("home").with_date(date!(2025 - 03 - 12))
        },
        Task {
            id: TaskId(2),
            ..Task::draft("Write report")
                .with_tag("work")
                .with_date(date!(2025 - 03 - 20))
                .with_subtask(Subtask::new("outline").completed())
        },
        Task {
            id: TaskId(3),
            done: true,
            ..Task::draft("File taxes").with_tag("home")
        },
    ]
}

fn connect(config: &ClientConfig) -> Result<TaskClient> {
    let client = TaskClient::connect(config)?.with_clock(Arc::new(FixedClock(SERVER_TODAY)));
    Ok(client)
}

#[test]
fn test_connect_performs_initial_load() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;

    assert!(client.is_connected());
    assert_eq!(client.get_all().as_slice(), seeded_tasks().as_slice());
    assert!(client.loaded_at().is_some());
    assert_eq!(server.state().received, vec![Command::LoadInfo]);
    Ok(())
}

#[test]
fn test_add_is_visible_after_synchronize() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;

    let created = client.add(&Task::draft("Call plumber").with_tag("home"))?;
    assert_eq!(created.id, TaskId(4));
    assert!(client.get_task(created.id).is_none());

    assert_eq!(client.synchronize()?, SyncOutcome::Changed);
    assert_eq!(client.get_task(created.id), Some(created));
    assert_eq!(client.synchronize()?, SyncOutcome::Unchanged);
    Ok(())
}

#[test]
fn test_remove_archives_and_hides_task_from_views() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;

    let mut target = client.get_task(TaskId(1)).unwrap_or_default();
    assert!(client.remove(&mut target)?);
    assert!(target.archived);

    let view = client.filter(&TaskFilterBuilder::new().with_tags("home").build())?;
    assert_eq!(view.iter().map(|task| task.id).collect::<Vec<_>>(), vec![TaskId(3)]);

    // The server archived it too, so a reload observes no difference.
    assert_eq!(client.synchronize()?, SyncOutcome::Unchanged);
    Ok(())
}

#[test]
fn test_added_task_round_trips_through_remove_and_filter() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;

    let created = client.add(&Task::draft("Renew passport").with_tag("admin"))?;
    assert!(created.id.is_assigned());
    assert!(client.synchronize()?.is_changed());

    let mut target = client
        .get_task(created.id)
        .unwrap_or_else(|| panic!("synchronized cache must contain the new task"));
    assert!(client.remove(&mut target)?);

    let everything = client.filter(&TaskFilterBuilder::new().build())?;
    assert!(everything.iter().all(|task| task.id != created.id));
    assert_eq!(everything.len(), seeded_tasks().len());
    Ok(())
}

#[test]
fn test_concurrent_calls_share_one_connection() -> Result<()> {
    const THREADS: usize = 8;
    const ROUNDS: usize = 20;

    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;

    let created_ids = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|worker| {
                let client = &client;
                scope.spawn(move || -> Result<Vec<TaskId>> {
                    let mut ids = Vec::with_capacity(ROUNDS);
                    for round in 0..ROUNDS {
                        let created = client.add(&Task::draft(format!("worker {worker} round {round}")))?;
                        ids.push(created.id);
                        client.load()?;
                    }
                    Ok(ids)
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().unwrap_or_else(|_| panic!("worker thread panicked")))
            .collect::<Result<Vec<_>>>()
    })?;

    let mut ids: Vec<TaskId> = created_ids.into_iter().flatten().collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), THREADS * ROUNDS);

    client.load()?;
    assert_eq!(client.get_all().len(), seeded_tasks().len() + THREADS * ROUNDS);
    assert_eq!(server.state().connections, 1);
    Ok(())
}

#[test]
fn test_refused_remove_is_not_an_error() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;
    server.state().refuse_removes = true;

    let mut target = client.get_task(TaskId(2)).unwrap_or_default();
    assert!(!client.remove(&mut target)?);
    assert!(!target.archived);
    assert_eq!(client.get_task(TaskId(2)).map(|task| task.archived), Some(false));

    client.synchronize()?;
    assert_eq!(server.state().connections, 1);
    Ok(())
}

#[test]
fn test_update_is_observed_by_synchronize() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;

    let mut edited = client.get_task(TaskId(2)).unwrap_or_default();
    edited.description = "Write quarterly report".into();
    client.update(&edited)?;

    assert!(client.synchronize()?.is_changed());
    assert_eq!(client.get_task(TaskId(2)), Some(edited));
    assert_eq!(
        server.state().received,
        vec![Command::LoadInfo, Command::UpdateTask, Command::LoadInfo]
    );
    Ok(())
}

#[test]
fn test_malformed_load_keeps_cache_and_reconnects_once() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;
    let before = client.get_all();
    server.state().corrupt_next_load = true;

    let err = client
        .synchronize()
        .err()
        .unwrap_or_else(|| panic!("malformed snapshot must fail"));
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(Arc::ptr_eq(&before, &client.get_all()));
    assert!(client.is_connected());

    assert_eq!(client.synchronize()?, SyncOutcome::Unchanged);
    assert_eq!(server.state().connections, 2);
    Ok(())
}

#[test]
fn test_dropped_connection_during_load_keeps_cache() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;
    let before = client.get_all();
    server.state().drop_next_load = true;

    assert!(client.load().is_err());
    assert!(Arc::ptr_eq(&before, &client.get_all()));

    client.add(&Task::draft("after reconnect"))?;
    assert_eq!(server.state().connections, 2);
    assert_eq!(
        server.state().received,
        vec![Command::LoadInfo, Command::LoadInfo, Command::AddTask]
    );
    Ok(())
}

#[test]
fn test_local_filter_combines_predicates() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.config())?;

    let open_and_soon = TaskFilterBuilder::new()
        .with_completion_switches(true, false, false)
        .due_soon(true)
        .build();
    let view = client.filter(&open_and_soon)?;
    assert_eq!(view.iter().map(|task| task.id).collect::<Vec<_>>(), vec![TaskId(1)]);

    let by_text = client.filter(&TaskFilterBuilder::new().with_text("REPORT").build())?;
    assert_eq!(by_text.iter().map(|task| task.id).collect::<Vec<_>>(), vec![TaskId(2)]);

    // Local filtering never touches the channel.
    assert_eq!(server.state().received, vec![Command::LoadInfo]);
    Ok(())
}

#[test]
fn test_server_filter_mode_sends_filter_command() -> Result<()> {
    let server = TestServer::start(seeded_tasks())?;
    let client = connect(&server.server_filter_config())?;

    let filter = TaskFilterBuilder::new()
        .with_tags("home")
        .special(Some(SpecialFilter::UpcomingTop3))
        .build();
    let view = client.filter(&filter)?;
    assert_eq!(view.iter().map(|task| task.id).collect::<Vec<_>>(), vec![TaskId(1)]);
    assert_eq!(
        server.state().received,
        vec![Command::LoadInfo, Command::Filter]
    );
    Ok(())
}

#[test]
fn test_connect_to_closed_port_is_a_connectivity_error() -> Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);

    let mut config = ClientConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port,
        },
        ..ClientConfig::default()
    };
    config.connection.connect_timeout_secs = 1;

    let err = TaskClient::connect(&config)
        .err()
        .unwrap_or_else(|| panic!("closed port must refuse"));
    assert!(err.is_retryable());
    Ok(())
}
