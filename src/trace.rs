use std::{
    fs,
    io::{self, BufRead, BufReader, Read},
    path::PathBuf,
    thread::{self, JoinHandle},
};

use crossbeam::channel::{Receiver, Sender};
use xz2::read::XzDecoder;

use crate::{cache::AccessKind, error::TraceError};

/// One memory access read from a trace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// Explicit cycle, if the trace line carried one.
    pub cycle: Option<u64>,
    pub kind: AccessKind,
    pub address: u64,
}

fn parse_u64(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|err| format!("bad number {text:?}: {err}"))
}

fn parse_kind(text: &str) -> Result<AccessKind, String> {
    match text {
        "r" | "R" => Ok(AccessKind::Read),
        "w" | "W" => Ok(AccessKind::Write),
        _ => Err(format!("expected R or W, found {text:?}")),
    }
}

/// Parses `[cycle] (R|W) <address>`. Blank lines and `#` comments yield
/// `None`.
pub fn parse_line(line: &str) -> Result<Option<Access>, String> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    let fields = line.split_whitespace().collect::<Vec<_>>();
    let access = match fields.as_slice() {
        [kind, address] => Access {
            cycle: None,
            kind: parse_kind(kind)?,
            address: parse_u64(address)?,
        },
        [cycle, kind, address] => Access {
            cycle: Some(parse_u64(cycle)?),
            kind: parse_kind(kind)?,
            address: parse_u64(address)?,
        },
        _ => return Err(format!("expected 2 or 3 fields, found {}", fields.len())),
    };
    Ok(Some(access))
}

/// Streams blocks of parsed accesses from a background reader thread.
///
/// The channel closes at the end of the file; a read or parse failure is
/// delivered as the final `Err` block.
pub struct Trace {
    pub rec: Receiver<Result<Vec<Access>, TraceError>>,
    _thread: JoinHandle<()>,
}

impl Trace {
    pub fn read(
        path: PathBuf,
        accesses_per_block: usize,
        blocks_per_queue: usize,
    ) -> io::Result<Trace> {
        let file = fs::File::open(&path)?;
        let stream: Box<dyn Read + Send> = if path.extension().is_some_and(|ext| ext == "xz") {
            Box::new(XzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let (sender, receiver) = crossbeam::channel::bounded(blocks_per_queue);

        let t = thread::spawn(move || {
            Trace::run_thread(BufReader::new(stream), accesses_per_block.max(1), sender)
        });

        Ok(Trace {
            rec: receiver,
            _thread: t,
        })
    }

    fn run_thread(
        stream: impl BufRead,
        accesses_per_block: usize,
        queue: Sender<Result<Vec<Access>, TraceError>>,
    ) {
        let mut buffer = Vec::with_capacity(accesses_per_block);
        for (idx, line) in stream.lines().enumerate() {
            let parsed = line
                .map_err(TraceError::from)
                .and_then(|line| {
                    parse_line(&line).map_err(|reason| TraceError::Parse {
                        line: idx + 1,
                        reason,
                    })
                });
            match parsed {
                Ok(Some(access)) => buffer.push(access),
                Ok(None) => {}
                Err(err) => {
                    if !buffer.is_empty() && queue.send(Ok(buffer)).is_err() {
                        return;
                    }
                    let _ = queue.send(Err(err));
                    return;
                }
            }
            if buffer.len() == accesses_per_block {
                let full = std::mem::replace(&mut buffer, Vec::with_capacity(accesses_per_block));
                if queue.send(Ok(full)).is_err() {
                    return;
                }
            }
        }
        if !buffer.is_empty() {
            let _ = queue.send(Ok(buffer));
        }
    }
}
