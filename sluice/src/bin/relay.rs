//! Line relay through a bounded queue.
//!
//! A reader thread pushes every stdin line into the queue, blocking while it
//! is full, and ends the stream with an end marker. The main thread drains the
//! queue to stdout until it sees that marker.
//!
//! Byte mode ends on the text `\0EOF\0` at the end of what has been read so
//! far, so input containing that exact text can end the relay early. Record
//! mode ends on an empty record and skips input lines that contain a NUL byte,
//! since those cannot be framed as one record.
//!
//! # Usage
//!
//! ```sh
//! sluice-relay 256 < input.txt > output.txt
//! sluice-relay 64 --records --list < input.txt
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

use minstant::Instant;
use sluice::config::{DEFAULT_MAX_CAPACITY, MIN_CAPACITY};
use sluice::sync::TERMINATOR;
use sluice::{Backend, ByteQueue, Flags, QueueConfig, QueueError, RecordQueue};
use thiserror::Error;

/// Marks the end of the relayed byte stream. Record mode ends with an empty
/// record instead.
const SENTINEL: &[u8] = b"\\0EOF\\0";

/// Bytes copied per peek in byte mode.
const CHUNK: usize = 64;

#[derive(Debug, Error)]
enum RelayError {
    #[error("queue: {0}")]
    Queue(#[from] QueueError),
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Usage(String),
    #[error("reader thread panicked")]
    ReaderPanicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Bytes,
    Records,
}

#[derive(Debug)]
struct Args {
    config: QueueConfig,
    mode: Mode,
}

/// Either queue, behind the two calls the reader needs.
trait Sink: Send + Sync {
    /// Returns `false` for lines this queue cannot carry intact.
    fn accepts(&self, _line: &[u8]) -> bool {
        true
    }

    fn push_line(&self, line: &[u8]) -> Result<(), QueueError>;

    /// Queues the end-of-stream marker.
    fn finish(&self) -> Result<(), QueueError>;
}

impl Sink for ByteQueue {
    fn push_line(&self, line: &[u8]) -> Result<(), QueueError> {
        self.push(line, Flags::WAIT)
    }

    fn finish(&self) -> Result<(), QueueError> {
        // A byte stream has no framing, so the sentinel may go in pieces.
        for piece in SENTINEL.chunks(self.max_capacity() - 1) {
            self.push(piece, Flags::WAIT)?;
        }
        Ok(())
    }
}

impl Sink for RecordQueue {
    // A NUL would cut the line short, or turn it into the end record.
    fn accepts(&self, line: &[u8]) -> bool {
        !line.contains(&TERMINATOR)
    }

    fn push_line(&self, line: &[u8]) -> Result<(), QueueError> {
        self.push(line, Flags::WAIT)
    }

    fn finish(&self) -> Result<(), QueueError> {
        self.push(b"", Flags::WAIT)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("sluice-relay: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), RelayError> {
    let _ = sluice::try_init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Args { config, mode } = parse_args(&args)?;

    eprintln!(
        "sluice-relay: max_capacity={} mode={mode:?} backend={:?}",
        config.max_capacity, config.backend
    );

    let start = Instant::now();
    let (lines, bytes) = match mode {
        Mode::Bytes => {
            let queue = Arc::new(ByteQueue::with_config(config)?);
            let reader = spawn_reader(Arc::clone(&queue))?;
            let bytes = drain_bytes(&queue, &mut io::stdout().lock())?;
            (join_reader(reader)?, bytes)
        }
        Mode::Records => {
            let queue = Arc::new(RecordQueue::with_config(config)?);
            let reader = spawn_reader(Arc::clone(&queue))?;
            let bytes = drain_records(&queue, &mut io::stdout().lock())?;
            (join_reader(reader)?, bytes)
        }
    };

    eprintln!(
        "sluice-relay: {lines} lines, {bytes} bytes in {:?}",
        start.elapsed()
    );
    Ok(())
}

fn spawn_reader<Q: Sink + 'static>(
    queue: Arc<Q>,
) -> Result<thread::JoinHandle<Result<u64, RelayError>>, RelayError> {
    let handle = thread::Builder::new()
        .name("relay-reader".into())
        .spawn(move || read_lines(io::stdin().lock(), &*queue))?;
    Ok(handle)
}

fn join_reader(handle: thread::JoinHandle<Result<u64, RelayError>>) -> Result<u64, RelayError> {
    handle.join().map_err(|_| RelayError::ReaderPanicked)?
}

/// Pushes `input` line by line, newline included, then the end marker.
fn read_lines(mut input: impl BufRead, queue: &dyn Sink) -> Result<u64, RelayError> {
    let mut line = Vec::new();
    let mut count = 0;

    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if !queue.accepts(&line) {
            eprintln!("WARN: line contains a NUL byte. Discarding.");
            continue;
        }
        match queue.push_line(&line) {
            Ok(()) => count += 1,
            Err(QueueError::ElementTooLarge { len, max_capacity }) => {
                eprintln!("WARN: {len}-byte line does not fit a {max_capacity}-byte queue. Discarding.");
            }
            Err(e) => {
                // Unblock the writer before bailing out.
                let _ = queue.finish();
                return Err(e.into());
            }
        }
    }

    queue.finish()?;
    Ok(count)
}

/// Copies the byte stream to `out` with peek and discard, holding back just
/// enough bytes to recognise a sentinel split across peeks.
fn drain_bytes(queue: &ByteQueue, out: &mut impl Write) -> Result<u64, RelayError> {
    let mut chunk = [0u8; CHUNK];
    let mut pending = Vec::with_capacity(CHUNK + SENTINEL.len());
    let mut written = 0u64;

    loop {
        let n = queue.peek(&mut chunk, Flags::WAIT);
        queue.discard(n)?;
        pending.extend_from_slice(&chunk[..n]);

        if pending.ends_with(SENTINEL) {
            let body = pending.len() - SENTINEL.len();
            out.write_all(&pending[..body])?;
            written += body as u64;
            break;
        }

        let ready = pending.len().saturating_sub(SENTINEL.len() - 1);
        out.write_all(&pending[..ready])?;
        written += ready as u64;
        pending.drain(..ready);
    }

    out.flush()?;
    Ok(written)
}

/// Pops whole records to `out` until the empty end record.
fn drain_records(queue: &RecordQueue, out: &mut impl Write) -> Result<u64, RelayError> {
    let mut written = 0u64;

    while let Some(record) = queue.pop_record(Flags::WAIT) {
        if record.is_empty() {
            break;
        }
        out.write_all(&record)?;
        written += record.len() as u64;
    }

    out.flush()?;
    Ok(written)
}

fn parse_args(args: &[String]) -> Result<Args, RelayError> {
    let mut max_capacity = DEFAULT_MAX_CAPACITY;
    let mut mode = Mode::Bytes;
    let mut backend = Backend::Ring;

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--records" | "-r" => mode = Mode::Records,
            "--list" | "-l" => backend = Backend::List,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => {
                return Err(RelayError::Usage(format!("unknown argument: {flag}")));
            }
            size => {
                max_capacity = match size.parse::<usize>() {
                    Ok(n) if n >= MIN_CAPACITY => n,
                    _ => {
                        eprintln!("WARN: Invalid size parameter. It must be greater than 1.");
                        DEFAULT_MAX_CAPACITY
                    }
                };
            }
        }
    }

    Ok(Args {
        config: QueueConfig::new(max_capacity)
            .with_flags(Flags::SHRINK)
            .with_backend(backend),
        mode,
    })
}

fn print_usage() {
    eprintln!(
        r#"sluice-relay - relay stdin to stdout through a bounded queue

USAGE:
    sluice-relay [MAX_CAPACITY] [OPTIONS]

ARGS:
    MAX_CAPACITY            Queue ceiling in bytes, at least 2 (default: 4096)

OPTIONS:
    -r, --records           Relay NUL-terminated records instead of raw bytes
    -l, --list              Use the list backend instead of the ring arena
    -h, --help              Print this help message

EXAMPLE:
    sluice-relay 256 < input.txt > output.txt
"#
    );
}
