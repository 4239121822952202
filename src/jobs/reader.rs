//! Background readers for a child's stdout/stderr.
//!
//! Each piped stream gets its own thread that reads until EOF and forwards
//! chunks over a channel, so the OS pipe buffer never fills while the
//! controller is busy with other children. The controller only ever calls
//! `try_recv` while a child runs, and blocks only once the child has exited.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use std::io::{ErrorKind, Read};
use std::process::Child;
use std::thread::{self, JoinHandle};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Accumulated output of one child.
#[derive(Debug, Default)]
pub struct Captured {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Captured {
    fn push(&mut self, stream: Stream, chunk: Vec<u8>) {
        match stream {
            Stream::Stdout => self.stdout.extend_from_slice(&chunk),
            Stream::Stderr => self.stderr.extend_from_slice(&chunk),
        }
    }
}

pub struct PipeReader {
    rx: Receiver<(Stream, Vec<u8>)>,
    handles: Vec<JoinHandle<()>>,
}

fn spawn_reader<R: Read + Send + 'static>(
    mut pipe: R,
    stream: Stream,
    tx: Sender<(Stream, Vec<u8>)>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(?stream, error = %e, "pipe read failed");
                    break;
                }
            }
        }
    })
}

impl PipeReader {
    /// Take whichever of the child's stdout/stderr are piped.
    pub fn attach(child: &mut Child) -> Self {
        let (tx, rx) = unbounded();
        let mut handles = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            handles.push(spawn_reader(out, Stream::Stdout, tx.clone()));
        }
        if let Some(err) = child.stderr.take() {
            handles.push(spawn_reader(err, Stream::Stderr, tx.clone()));
        }
        Self { rx, handles }
    }

    /// Move whatever has arrived so far into `captured`, without blocking.
    pub fn drain(&self, captured: &mut Captured) {
        loop {
            match self.rx.try_recv() {
                Ok((stream, chunk)) => captured.push(stream, chunk),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Block until both streams hit EOF, collecting the remainder.
    pub fn finish(self, captured: &mut Captured) {
        let PipeReader { rx, handles } = self;
        // the channel disconnects once every reader thread has dropped its sender
        for (stream, chunk) in rx.iter() {
            captured.push(stream, chunk);
        }
        for handle in handles {
            let _ = handle.join();
        }
    }
}
