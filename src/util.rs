use crate::error::PlayerError;
use crate::midi_importer::{MidiOptions, import_midi_file};
use crate::model::config::Args;
use crate::model::song::Song;
use crate::sheet_parser::{SheetOptions, import_sheet_file};
use log::info;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongFormat {
    Sheet,
    Midi,
}

impl SongFormat {
    pub fn from_path(path: &Path) -> Result<SongFormat, PlayerError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("sheet") | Some("txt") => Ok(SongFormat::Sheet),
            Some("mid") | Some("midi") => Ok(SongFormat::Midi),
            _ => Err(PlayerError::InvalidFormat(format!(
                "unsupported song file '{}'",
                path.display()
            ))),
        }
    }
}

pub fn sheet_options(args: &Args) -> SheetOptions {
    SheetOptions {
        newline_delay: !args.no_newline_delay,
        polynote_delay: args.polynote_delay,
        tempo: args.tempo,
        transpose: args.transpose,
    }
}

pub fn midi_options(args: &Args) -> MidiOptions {
    MidiOptions {
        transpose: args.transpose.unwrap_or(0),
    }
}

/// Reads a song file, choosing the parser by extension. MIDI translation reports
/// its progress through `progress`; sheets are parsed in one step.
pub fn load_song_file<P: AsRef<Path>>(
    path: P,
    sheet: &SheetOptions,
    midi: &MidiOptions,
    progress: impl FnMut(f64),
) -> Result<Song, PlayerError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PlayerError::FileNotFound(path.to_path_buf()));
    }

    match SongFormat::from_path(path)? {
        SongFormat::Sheet => Ok(Song::Beat(import_sheet_file(path, sheet)?)),
        SongFormat::Midi => Ok(Song::Timed(import_midi_file(path, midi, progress)?)),
    }
}

/// Blocks until the focused window's title is `title`, giving up after `timeout`.
#[cfg(target_os = "windows")]
pub fn wait_for_active_window(title: &str, timeout: Duration) -> anyhow::Result<()> {
    use log::debug;
    use std::time::Instant;

    info!(
        "Waiting at most {} SECONDS for the active window to be {}..!",
        timeout.as_secs(),
        title
    );

    let now = Instant::now();
    loop {
        if let Ok(active_window) = active_win_pos_rs::get_active_window() {
            debug!("Active window: \"{}\"", active_window.title);
            if active_window.title == title {
                return Ok(());
            }
        }

        if now.elapsed() > timeout {
            anyhow::bail!("Active window title was never {}..!", title);
        }

        spin_sleep::sleep(Duration::from_millis(50));
    }
}

#[cfg(not(target_os = "windows"))]
pub fn wait_for_active_window(title: &str, _timeout: Duration) -> anyhow::Result<()> {
    info!(
        "Window focus checks are only supported on Windows, not waiting for {}..!",
        title
    );
    Ok(())
}
