//! The log of one batch run.
//!
//! Lines go to `<logs>/<batch>.log` and to an optional [`LogSink`]. Solver
//! output is held in a bounded tail so a failed run can be replayed without
//! flooding the log of a successful one.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogConfig, LogLevel, LogSink, MessagePrefix};

struct LogState {
    file: Option<BufWriter<File>>,
    tail: VecDeque<String>,
    last_progress: u32,
}

pub struct BatchLogger {
    name: String,
    log_path: Option<PathBuf>,
    config: LogConfig,
    sink: Option<LogSink>,
    state: Mutex<LogState>,
}

impl BatchLogger {
    /// Log to `<log_dir>/<name>.log`, creating the directory if needed.
    pub fn new(
        name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        sink: Option<LogSink>,
    ) -> io::Result<Self> {
        let mut logger = Self::sink_only(name, config, sink);

        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("{}.log", file_stem(&logger.name)));
        logger.state.get_mut().file = Some(BufWriter::new(File::create(&path)?));
        logger.log_path = Some(path);
        Ok(logger)
    }

    /// No log file; used when the logs directory cannot be created.
    pub fn sink_only(name: impl Into<String>, config: LogConfig, sink: Option<LogSink>) -> Self {
        let state = LogState {
            file: None,
            tail: VecDeque::with_capacity(config.error_tail),
            last_progress: 0,
        };
        Self {
            name: name.into(),
            log_path: None,
            config,
            sink,
            state: Mutex::new(state),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level >= self.config.level {
            self.emit(message);
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.tagged(LogLevel::Warn, MessagePrefix::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.tagged(LogLevel::Error, MessagePrefix::Error, message);
    }

    pub fn skip(&self, message: &str) {
        self.tagged(LogLevel::Warn, MessagePrefix::Skip, message);
    }

    pub fn command(&self, command_line: &str) {
        self.tagged(LogLevel::Info, MessagePrefix::Command, command_line);
    }

    pub fn phase(&self, title: &str) {
        self.tagged(LogLevel::Info, MessagePrefix::Phase, title);
    }

    pub fn success(&self, message: &str) {
        self.tagged(LogLevel::Info, MessagePrefix::Success, message);
    }

    /// `Progress: n/total (p%)`. Compact mode only logs when `p` crosses a
    /// step boundary, and always logs 100%. Returns whether a line was written.
    pub fn progress(&self, processed: usize, total: usize) -> bool {
        let percent = match total {
            0 => 100,
            _ => (processed * 100 / total) as u32,
        };

        let step = self.config.progress_step;
        if self.config.compact && step > 0 {
            let mut state = self.state.lock();
            if percent < 100 && percent / step <= state.last_progress / step {
                return false;
            }
            state.last_progress = percent;
        }

        self.info(&format!("Progress: {}/{} ({}%)", processed, total, percent));
        true
    }

    /// One line of solver output. Logged immediately unless compact.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        let capacity = self.config.error_tail;
        if capacity > 0 {
            let mut state = self.state.lock();
            while state.tail.len() >= capacity {
                state.tail.pop_front();
            }
            state.tail.push_back(line.to_string());
        }

        if !self.config.compact {
            let stream = if is_stderr { "[stderr] " } else { "" };
            self.emit(&format!("{}{}", stream, line));
        }
    }

    /// Replay the retained solver output under a `[tool/tail]` header.
    pub fn show_tail(&self, tool: &str) {
        let lines = self.tail();
        if lines.is_empty() {
            return;
        }
        self.emit(&format!("[{}/tail]", tool));
        for line in &lines {
            self.emit(line);
        }
    }

    pub fn clear_tail(&self) {
        self.state.lock().tail.clear();
    }

    pub fn tail(&self) -> Vec<String> {
        self.state.lock().tail.iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(file) = self.state.lock().file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Flush and release the file. Later lines only reach the sink.
    pub fn close(&self) {
        if let Some(mut file) = self.state.lock().file.take() {
            let _ = file.flush();
        }
    }

    fn tagged(&self, level: LogLevel, prefix: MessagePrefix, message: &str) {
        self.log(level, &prefix.format(message));
    }

    fn emit(&self, message: &str) {
        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        };

        if let Some(file) = self.state.lock().file.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
        if let Some(sink) = &self.sink {
            sink(&line);
        }
    }
}

impl Drop for BatchLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Batch name with path separators and reserved characters replaced.
fn file_stem(name: &str) -> String {
    name.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}
