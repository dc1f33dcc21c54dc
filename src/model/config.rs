use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "SHEET_PLAYER",
    about = "Play a sheet or MIDI song as key presses!"
)]
pub struct Args {
    /// Path to the target song: a `.sheet`/`.txt` sheet or a `.mid`/`.midi` file.
    pub song: PathBuf,

    /// Overrides the tempo header of a sheet (BPM).
    #[arg(long)]
    pub tempo: Option<u32>,

    /// Overrides the transpose header of a sheet, or shifts MIDI notes by N semitones.
    #[arg(short, long, allow_hyphen_values = true)]
    pub transpose: Option<i32>,

    /// Don't treat line breaks in a sheet as one-beat rests.
    #[arg(long = "no-newline-delay", default_value_t = false)]
    pub no_newline_delay: bool,

    /// Stagger the keys of bracketed chords instead of striking them together.
    #[arg(long, default_value_t = false)]
    pub polynote_delay: bool,

    /// Dry run (print first dry_run_max events and exit).
    #[arg(short, long, default_value_t = false)]
    pub dry_run: bool,

    /// Maximum events to print in dry run.
    #[arg(long, default_value_t = 80)]
    pub dry_run_max: usize,

    /// Print the whole translated song as JSON during a dry run.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Prints extra information to the terminal.
    #[arg(short, long)]
    pub verbose: bool,

    /// Delays the start of the performance by N seconds.
    #[arg(long = "delay-start", default_value_t = 0)]
    pub delay_start: u64,

    /// Waits (at most 30 seconds) for a window with this title to be focused before playing.
    #[arg(long = "focus-window")]
    pub focus_window: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "SHEET_PLAYER",
            "songs/ode.sheet",
            "--tempo",
            "90",
            "-t",
            "-3",
            "--no-newline-delay",
            "--delay-start",
            "2",
        ])
        .unwrap();

        assert_eq!(args.song, PathBuf::from("songs/ode.sheet"));
        assert_eq!(args.tempo, Some(90));
        assert_eq!(args.transpose, Some(-3));
        assert!(args.no_newline_delay);
        assert!(!args.polynote_delay);
        assert_eq!(args.delay_start, 2);
        assert_eq!(args.focus_window, None);
    }
}
