//! ## clocksim-telemetry::event_log
//! **Per-machine event log file**
//!
//! Layout of `<dir>/machine_<id>.log`:
//!
//! ```text
//! Machine 1 initialized with clock rate 4
//!
//! Time,Event,Queue Length,Logical Clock
//! 2025-02-03 14:05:09.042,internal,0,1
//! CONN_LOG: 2025-02-03 14:05:09.292,127.0.0.1:5001,success
//! 2025-02-03 14:05:09.292,send,0,2
//! ```
//!
//! Each line is flushed as it is written so the file can be tailed during a run.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use clocksim_core::events::CSV_HEADER;
use clocksim_core::{ConnectionStatus, EventRecord, EventSink, SinkError};

pub struct FileEventLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileEventLog {
    /// File name used for a machine's log inside the log directory.
    pub fn file_name(machine_id: u32) -> String {
        format!("machine_{}.log", machine_id)
    }

    /// Creates (or truncates) the machine's log and writes the header.
    pub fn create<P: AsRef<Path>>(dir: P, machine_id: u32, tick_rate: u32) -> Result<Self, SinkError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(machine_id));

        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(
            writer,
            "Machine {} initialized with clock rate {}",
            machine_id, tick_rate
        )?;
        writeln!(writer)?;
        writeln!(writer, "{}", CSV_HEADER)?;
        writer.flush()?;

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, line: &str) -> Result<(), SinkError> {
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

impl EventSink for FileEventLog {
    fn append(&self, record: &EventRecord) -> Result<(), SinkError> {
        self.write_line(&record.to_row())
    }

    fn append_connection(&self, status: &ConnectionStatus) -> Result<(), SinkError> {
        self.write_line(&status.to_line())
    }
}
