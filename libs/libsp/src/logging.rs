//! `log` backend printing to the SPMC console

use core::fmt::{self, Write};

use libffa::{CONSOLE_LOG_MAX_CHARS, Conduit, Ffa};
use log::{LevelFilter, Metadata, Record};

/// Buffers formatted output into FFA_CONSOLE_LOG_32 sized chunks.
#[derive(Debug)]
struct ConsoleWriter<C: Conduit> {
    ffa: Ffa<C>,
    buffer: [u8; CONSOLE_LOG_MAX_CHARS],
    len: usize,
}

impl<C: Conduit> ConsoleWriter<C> {
    fn flush(&mut self) -> fmt::Result {
        if self.len == 0 {
            return Ok(());
        }

        let result = self.ffa.console_log(&self.buffer[..self.len]);
        self.len = 0;

        result.map_err(|_| fmt::Error)
    }
}

impl<C: Conduit> Write for ConsoleWriter<C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &byte in s.as_bytes() {
            if self.len == CONSOLE_LOG_MAX_CHARS {
                self.flush()?;
            }

            self.buffer[self.len] = byte;
            self.len += 1;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct ConsoleLogger<C: Conduit> {
    writer: spin::Mutex<ConsoleWriter<C>>,
}

impl<C: Conduit> ConsoleLogger<C> {
    pub const fn new(ffa: Ffa<C>) -> Self {
        Self {
            writer: spin::Mutex::new(ConsoleWriter {
                ffa,
                buffer: [0; CONSOLE_LOG_MAX_CHARS],
                len: 0,
            }),
        }
    }
}

impl<C: Conduit + Send> log::Log for ConsoleLogger<C> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut writer = self.writer.lock();
            // Nowhere to report a console failure
            let _ = writeln!(writer, "{} - {}", record.level(), record.args());
            let _ = writer.flush();
        }
    }

    fn flush(&self) {}
}

/// Install `logger` as the `log` backend.
pub fn init<C: Conduit + Send>(logger: &'static ConsoleLogger<C>, level: LevelFilter) {
    // If set_logger fails, a logger is already there and there is nobody to tell
    let _ = log::set_logger(logger);
    log::set_max_level(level);
}
