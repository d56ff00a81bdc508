//! The engine collaborator.
//!
//! [`Engine`] is the only thing the feature computer needs from a chess
//! engine: a ranked list of lines for a position. [`UciEngine`] provides
//! it by driving an external UCI process such as Stockfish.

use std::{
    collections::{BTreeMap, HashSet},
    io::{self, BufRead, BufReader, Write},
    process::{Child, ChildStdin, Command, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use shakmaty::{Chess, EnPassantMode, fen::Fen};

use crate::{
    config::EngineConfig,
    error::PlayabilityError,
    types::AnalysisLine,
    uci::{parse_info_line, parse_option_name},
};

pub trait Engine {
    /// Searches `position` to `depth` and returns up to `multipv` lines,
    /// scored from the side to move's point of view.
    fn analyse(
        &mut self,
        position: &Chess,
        depth: u32,
        multipv: usize,
    ) -> Result<Vec<AnalysisLine>, PlayabilityError>;
}

impl<E: Engine + ?Sized> Engine for &mut E {
    fn analyse(
        &mut self,
        position: &Chess,
        depth: u32,
        multipv: usize,
    ) -> Result<Vec<AnalysisLine>, PlayabilityError> {
        (**self).analyse(position, depth, multipv)
    }
}

pub struct UciEngine {
    child: Child,
    stdin: io::BufWriter<ChildStdin>,
    rx: Receiver<String>,
    options: HashSet<String>,
    timeout: Option<Duration>,
    multipv: usize,
    /// A search was abandoned and its output has not been drained yet.
    stale: bool,
    pub id_name: Option<String>,
}

/// How long an abandoned search gets to answer `stop` with `bestmove`.
const STOP_GRACE: Duration = Duration::from_secs(2);

impl UciEngine {
    pub fn spawn(config: &EngineConfig) -> Result<Self, PlayabilityError> {
        let mut child = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PlayabilityError::EngineProtocol("no stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PlayabilityError::EngineProtocol("no stdout".into()))?;

        let (tx, rx) = mpsc::channel::<String>();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let mut engine = Self {
            child,
            stdin: io::BufWriter::new(stdin),
            rx,
            options: HashSet::new(),
            timeout: config.timeout_ms.map(Duration::from_millis),
            multipv: 1,
            stale: false,
            id_name: None,
        };

        engine.write_line("uci")?;
        loop {
            let line = engine.read_line(engine.deadline())?;
            if let Some(name) = line.strip_prefix("id name ") {
                engine.id_name = Some(name.to_string());
            } else if let Some(name) = parse_option_name(&line) {
                engine.options.insert(name);
            } else if line == "uciok" {
                break;
            }
        }

        engine.set_option_if_available("Threads", &config.threads.to_string())?;
        engine.set_option_if_available("Hash", &config.hash_mb.to_string())?;
        engine.sync_ready()?;
        engine.write_line("ucinewgame")?;
        engine.sync_ready()?;

        log::info!(
            "engine ready: {} ({} threads, {} MB hash)",
            engine.id_name.as_deref().unwrap_or("unknown"),
            config.threads,
            config.hash_mb
        );
        Ok(engine)
    }

    fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|t| Instant::now() + t)
    }

    fn write_line(&mut self, s: &str) -> Result<(), PlayabilityError> {
        log::debug!("> {s}");
        self.stdin.write_all(s.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&self, deadline: Option<Instant>) -> Result<String, PlayabilityError> {
        let line = match deadline {
            None => self
                .rx
                .recv()
                .map_err(|_| PlayabilityError::EngineDisconnected)?,
            Some(deadline) => {
                let remain = deadline.saturating_duration_since(Instant::now());
                self.rx.recv_timeout(remain).map_err(|e| match e {
                    RecvTimeoutError::Timeout => {
                        PlayabilityError::EngineTimeout(self.timeout.unwrap_or_default())
                    }
                    RecvTimeoutError::Disconnected => PlayabilityError::EngineDisconnected,
                })?
            }
        };
        log::trace!("< {line}");
        Ok(line)
    }

    fn set_option_if_available(&mut self, name: &str, value: &str) -> Result<(), PlayabilityError> {
        if self.options.contains(name) {
            self.write_line(&format!("setoption name {name} value {value}"))?;
        }
        Ok(())
    }

    fn sync_ready(&mut self) -> Result<(), PlayabilityError> {
        self.write_line("isready")?;
        let deadline = self.deadline();
        while self.read_line(deadline)? != "readyok" {}
        Ok(())
    }

    /// Stops the running search, discards its output up to `bestmove`
    /// and waits for the engine to be idle again.
    fn abandon_search(&mut self) -> Result<(), PlayabilityError> {
        self.write_line("stop")?;
        let deadline = Some(Instant::now() + STOP_GRACE);
        while !self.read_line(deadline)?.starts_with("bestmove") {}
        self.stale = false;
        self.sync_ready()
    }

    fn collect_lines(&mut self) -> Result<BTreeMap<usize, AnalysisLine>, PlayabilityError> {
        // later info lines for the same index supersede earlier ones
        let mut lines: BTreeMap<usize, AnalysisLine> = BTreeMap::new();
        let deadline = self.deadline();
        loop {
            let line = self.read_line(deadline)?;
            if line.starts_with("bestmove") {
                return Ok(lines);
            }
            if let Some(info) = parse_info_line(&line) {
                lines.insert(info.multipv, info);
            }
        }
    }
}

impl Engine for UciEngine {
    fn analyse(
        &mut self,
        position: &Chess,
        depth: u32,
        multipv: usize,
    ) -> Result<Vec<AnalysisLine>, PlayabilityError> {
        if self.stale {
            log::warn!("draining an abandoned search before the next request");
            self.abandon_search()?;
        }

        let multipv = multipv.max(1);
        if multipv != self.multipv {
            self.write_line(&format!("setoption name MultiPV value {multipv}"))?;
            self.multipv = multipv;
        }

        let fen = Fen::from_position(position, EnPassantMode::Legal);
        self.write_line(&format!("position fen {fen}"))?;
        self.write_line(&format!("go depth {depth}"))?;

        let lines = match self.collect_lines() {
            Err(PlayabilityError::EngineTimeout(limit)) => {
                self.stale = true;
                if let Err(e) = self.abandon_search() {
                    log::warn!("engine did not settle after stop: {e}");
                }
                return Err(PlayabilityError::EngineTimeout(limit));
            }
            other => other?,
        };

        log::debug!("depth {depth}: engine returned {} of {multipv} lines", lines.len());
        Ok(lines.into_values().collect())
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.write_line("quit");
        let deadline = Instant::now() + Duration::from_millis(300);
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
