//! Sequential and parallel dispatch loops.
//!
//! The queue itself is lock-free; the mutex + condition variable pair
//! exists so an idle consumer can sleep and so shutdown cannot race a
//! consumer going to sleep. `queued` and `done` are atomics so the
//! consumer exit checks after processing need no lock.

use std::io::{Read, Write};
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};
use std::sync::atomic::{AtomicBool, AtomicI64};
use std::sync::{Condvar, Mutex};
use std::thread;

use tracing::{debug, info, warn};

use pulsefeed_core::structures::feed::{create_feed, Feed};
use pulsefeed_core::structures::queue::MsQueue;
use pulsefeed_core::types::{Command, Response};

use crate::core::config::{Config, Mode};
use crate::server::codec::{RequestReader, ResponseWriter};

/// Shared state for the parallel dispatch handshake.
struct DispatchState {
    lock: Mutex<()>,
    available: Condvar,
    /// The producer saw DONE (or EOF, treated the same).
    done: AtomicBool,
    /// Enqueued but not yet fully processed commands.
    queued: AtomicI64,
}

/// Run the server against the given streams. Returns once the input is
/// drained, every queued command is processed, and every worker has
/// exited.
pub fn run<R: Read, W: Write + Send>(config: &Config, input: R, output: W) {
    let feed = create_feed(config.feed);
    let mut reader = RequestReader::new(input);
    let writer = ResponseWriter::new(output);

    match config.mode {
        Mode::Sequential => {
            info!("Starting sequential dispatch");
            sequential(&mut reader, feed.as_ref(), &writer);
        }
        Mode::Parallel => {
            info!("Starting parallel dispatch with {} consumers", config.consumers);
            if config.consumers == 0 {
                warn!("Parallel mode with zero consumers: requests will not be processed");
            }
            parallel(config.consumers, &mut reader, feed.as_ref(), &writer);
        }
    }

    let mut output = writer.into_inner();
    if let Err(e) = output.flush() {
        warn!("failed to flush output stream: {e}");
    }
    debug!("dispatch complete");
}

/// Handle every record on the calling thread until DONE or EOF.
fn sequential<R: Read, W: Write>(
    reader: &mut RequestReader<R>,
    feed: &dyn Feed,
    writer: &ResponseWriter<W>,
) {
    while let Some(command) = reader.next() {
        if matches!(command, Command::Done) {
            break;
        }
        process(&command, feed, writer);
    }
}

/// Producer/consumer dispatch over the lock-free queue.
fn parallel<R: Read, W: Write + Send>(
    consumers: usize,
    reader: &mut RequestReader<R>,
    feed: &dyn Feed,
    writer: &ResponseWriter<W>,
) {
    let state = DispatchState {
        lock: Mutex::new(()),
        available: Condvar::new(),
        done: AtomicBool::new(false),
        queued: AtomicI64::new(0),
    };
    let queue: MsQueue<Command> = MsQueue::new();

    // The scope joins every consumer before returning.
    thread::scope(|scope| {
        for _ in 0..consumers {
            scope.spawn(|| consumer(&state, &queue, feed, writer));
        }
        producer(reader, &state, &queue);
    });
}

/// Decode records and feed the queue; on DONE or EOF flag shutdown and
/// wake everyone.
fn producer<R: Read>(
    reader: &mut RequestReader<R>,
    state: &DispatchState,
    queue: &MsQueue<Command>,
) {
    loop {
        match reader.next() {
            // EOF without DONE still has to drain and stop the
            // consumers, so both cases shut down the same way.
            Some(Command::Done) | None => {
                let _guard = state.lock.lock().unwrap();
                state.done.store(true, Release);
                state.available.notify_all();
                return;
            }
            Some(command) => {
                queue.enqueue(command);
                state.queued.fetch_add(1, AcqRel);
                state.available.notify_one();
            }
        }
    }
}

/// Drain the queue until shutdown is flagged and no work remains.
fn consumer<W: Write>(
    state: &DispatchState,
    queue: &MsQueue<Command>,
    feed: &dyn Feed,
    writer: &ResponseWriter<W>,
) {
    loop {
        let command = {
            let mut guard = state.lock.lock().unwrap();
            while state.queued.load(Acquire) == 0 && !state.done.load(Acquire) {
                guard = state.available.wait(guard).unwrap();
            }
            if state.queued.load(Acquire) == 0 && state.done.load(Acquire) {
                return;
            }
            // Dequeue while holding the lock: having observed
            // `queued > 0` under the mutex, the pop and the counter
            // cannot be separated by a full drain elsewhere.
            queue.dequeue()
        };

        // `None` here means another consumer won the race for the last
        // element but has not decremented `queued` yet.
        if let Some(command) = command {
            process(&command, feed, writer);
            state.queued.fetch_sub(1, AcqRel);
        }

        if state.done.load(Acquire) && state.queued.load(Acquire) <= 0 {
            return;
        }
    }
}

/// Apply one command to the feed and emit its response.
fn process<W: Write>(command: &Command, feed: &dyn Feed, writer: &ResponseWriter<W>) {
    let response = match command {
        Command::Add {
            id,
            body,
            timestamp,
        } => {
            feed.add(body, *timestamp);
            Response::status(id.clone(), true)
        }
        Command::Remove { id, timestamp } => Response::status(id.clone(), feed.remove(*timestamp)),
        Command::Contains { id, timestamp } => {
            Response::status(id.clone(), feed.contains(*timestamp))
        }
        Command::Feed { id } => Response::snapshot(id.clone(), feed.show()),
        // DONE is a control record handled by the drivers; it never
        // produces a response.
        Command::Done => return,
    };
    writer.write(&response);
}
