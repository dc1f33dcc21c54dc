use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether a rest counts in measure beats or in dotted beats. Both currently
/// resolve to the same multiplier against the beat delay.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestUnit {
    Measure,
    Dotted,
}

/// A symbolic pause in a sheet body.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rest {
    /// `|`, also produced by a space (and by a line break when newline delay is on).
    Bar,
    /// `-`
    Dash,
    /// `--`
    DoubleDash,
    /// `----`
    QuadDash,
    /// `~`, also used to stagger bracket members when polynote delay is on.
    Tilde,
    /// `#`
    Hash,
    /// `<`
    Less,
    /// `>`
    Greater,
}

pub const WAIT_CASES: &[(&str, Rest)] = &[
    ("|", Rest::Bar),
    ("-", Rest::Dash),
    ("--", Rest::DoubleDash),
    ("----", Rest::QuadDash),
    ("~", Rest::Tilde),
    ("#", Rest::Hash),
    ("<", Rest::Less),
    (">", Rest::Greater),
];

impl Rest {
    pub fn from_symbol(symbol: &str) -> Option<Rest> {
        WAIT_CASES
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, rest)| *rest)
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Rest::Bar => "|",
            Rest::Dash => "-",
            Rest::DoubleDash => "--",
            Rest::QuadDash => "----",
            Rest::Tilde => "~",
            Rest::Hash => "#",
            Rest::Less => "<",
            Rest::Greater => ">",
        }
    }

    /// How many beat delays this rest lasts.
    pub const fn beats(self) -> u32 {
        match self {
            Rest::Bar => 1,
            Rest::Dash | Rest::Tilde => 2,
            Rest::DoubleDash | Rest::Hash => 4,
            Rest::QuadDash | Rest::Less => 8,
            Rest::Greater => 16,
        }
    }

    pub const fn unit(self) -> RestUnit {
        match self {
            Rest::Bar | Rest::Dash | Rest::DoubleDash | Rest::QuadDash => RestUnit::Measure,
            Rest::Tilde | Rest::Hash | Rest::Less | Rest::Greater => RestUnit::Dotted,
        }
    }

    pub(crate) const fn is_dash(self) -> bool {
        matches!(self, Rest::Dash | Rest::DoubleDash | Rest::QuadDash)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum NoteToken {
    Single(char),
    /// Keys struck together with no delay between them.
    Chord(Vec<char>),
    Wait(Rest),
}

impl NoteToken {
    /// The key symbols this token strikes, in order.
    pub fn keys(&self) -> &[char] {
        match self {
            NoteToken::Single(key) => std::slice::from_ref(key),
            NoteToken::Chord(keys) => keys,
            NoteToken::Wait(_) => &[],
        }
    }
}

/// A song whose timing is derived from its tempo at playback time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BeatSong {
    pub title: Option<String>,
    pub tempo: u32,
    pub transpose: i32,
    pub notes: Vec<NoteToken>,
}

impl BeatSong {
    /// One beat unit: `60 / tempo / 2` seconds.
    pub fn beat_delay(&self) -> Duration {
        beat_delay(self.tempo)
    }
}

pub fn beat_delay(tempo: u32) -> Duration {
    Duration::from_secs_f64(30.0 / tempo.max(1) as f64)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TimedNote {
    pub token: NoteToken,
    pub time_ms: u64,
}

/// A song whose notes carry absolute millisecond offsets from the song start.
/// `notes` is sorted by `time_ms`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TimedSong {
    pub title: Option<String>,
    pub tempo: u32,
    pub transpose: i32,
    pub total_duration_ms: u64,
    pub notes: Vec<TimedNote>,
}

impl TimedSong {
    pub fn last_time_ms(&self) -> u64 {
        self.notes.last().map(|n| n.time_ms).unwrap_or(0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Song {
    Beat(BeatSong),
    Timed(TimedSong),
}

impl Song {
    pub fn title(&self) -> Option<&str> {
        match self {
            Song::Beat(song) => song.title.as_deref(),
            Song::Timed(song) => song.title.as_deref(),
        }
    }

    pub fn tempo(&self) -> u32 {
        match self {
            Song::Beat(song) => song.tempo,
            Song::Timed(song) => song.tempo,
        }
    }

    pub fn transpose(&self) -> i32 {
        match self {
            Song::Beat(song) => song.transpose,
            Song::Timed(song) => song.transpose,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Song::Beat(song) => song.notes.len(),
            Song::Timed(song) => song.notes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BeatSong> for Song {
    fn from(song: BeatSong) -> Self {
        Song::Beat(song)
    }
}

impl From<TimedSong> for Song {
    fn from(song: TimedSong) -> Self {
        Song::Timed(song)
    }
}
