use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// One file under `<root>/log/`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
enum LogFile {
    /// Commit-path diagnostics.
    Error,
    /// Startup and catalog summaries.
    Game,
    /// Creature relocations and role hand-offs.
    Move,
}

impl LogFile {
    const ALL: [LogFile; 3] = [LogFile::Error, LogFile::Game, LogFile::Move];

    fn file_name(self) -> &'static str {
        match self {
            LogFile::Error => "error.log",
            LogFile::Game => "game.log",
            LogFile::Move => "move.log",
        }
    }

    fn has_header(self) -> bool {
        !matches!(self, LogFile::Error)
    }
}

struct Logger {
    files: Mutex<BTreeMap<LogFile, File>>,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

const RULE: &str = "-------------------------------------------------------------------------------";
const BANNER: &str = "Tibia - Tile Engine";

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Opens the log files under `<root>/log/`. Every `log_*` call before this
/// is dropped.
pub fn init(root: &Path) -> Result<(), String> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let dir = root.join("log");
    std::fs::create_dir_all(&dir)
        .map_err(|err| format!("cannot create {}: {}", dir.display(), err))?;

    let mut files = BTreeMap::new();
    for log_file in LogFile::ALL {
        let name = log_file.file_name();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(name))
            .map_err(|err| format!("cannot open log {}: {}", name, err))?;
        let empty = file.metadata().map_or(true, |meta| meta.len() == 0);
        if log_file.has_header() && empty {
            let started = CivilTime::from_unix(now()).header_stamp();
            write!(file, "{RULE}\n{BANNER}\n{name} - started {started}\n")
                .map_err(|err| format!("cannot write header of {}: {}", name, err))?;
        }
        files.insert(log_file, file);
    }

    LOGGER
        .set(Logger {
            files: Mutex::new(files),
        })
        .map_err(|_| "logging already initialized".to_string())
}

pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

pub fn log_game(message: &str) {
    append(LogFile::Game, message);
}

pub fn log_error(message: &str) {
    append(LogFile::Error, message);
}

pub fn log_move(message: &str) {
    append(LogFile::Move, message);
}

fn append(log_file: LogFile, message: &str) {
    let Some(logger) = LOGGER.get() else {
        return;
    };
    let Ok(mut files) = logger.files.lock() else {
        return;
    };
    if let Some(file) = files.get_mut(&log_file) {
        let stamp = CivilTime::from_unix(now()).stamp();
        let _ = writeln!(file, "{stamp} (0): {message}").and_then(|()| file.flush());
    }
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

/// A UTC calendar time, good from the epoch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CivilTime {
    year: i64,
    month: usize,
    day: u32,
    seconds_of_day: u32,
    weekday: usize,
}

impl CivilTime {
    fn from_unix(ts: i64) -> Self {
        let ts = ts.max(0);
        let days = ts / 86_400;
        // Days counted from 0000-03-01, so leap days fall at the end of a year.
        let shifted = days + 719_468;
        let era = shifted.div_euclid(146_097);
        let day_of_era = shifted.rem_euclid(146_097);
        let year_of_era =
            (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
        let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
        let march_month = (5 * day_of_year + 2) / 153;
        let day = day_of_year - (153 * march_month + 2) / 5 + 1;
        let month = if march_month < 10 {
            march_month + 3
        } else {
            march_month - 9
        };
        let year = year_of_era + era * 400 + i64::from(month <= 2);
        Self {
            year,
            month: month as usize,
            day: day as u32,
            seconds_of_day: (ts % 86_400) as u32,
            weekday: (days + 4).rem_euclid(7) as usize,
        }
    }

    fn clock(&self) -> (u32, u32, u32) {
        (
            self.seconds_of_day / 3_600,
            self.seconds_of_day / 60 % 60,
            self.seconds_of_day % 60,
        )
    }

    /// `dd.mm.yyyy hh:mm:ss`
    fn stamp(&self) -> String {
        let (hour, minute, second) = self.clock();
        format!(
            "{:02}.{:02}.{} {:02}:{:02}:{:02}",
            self.day, self.month, self.year, hour, minute, second
        )
    }

    /// `Www Mmm dd hh:mm:ss yyyy`
    fn header_stamp(&self) -> String {
        let (hour, minute, second) = self.clock();
        format!(
            "{} {} {:>2} {:02}:{:02}:{:02} {}",
            WEEKDAYS[self.weekday % 7],
            MONTHS[(self.month + 11) % 12],
            self.day,
            hour,
            minute,
            second,
            self.year
        )
    }
}
