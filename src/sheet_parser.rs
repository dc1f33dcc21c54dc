use crate::error::PlayerError;
use crate::model::song::*;
use log::debug;
use std::fs;
use std::io;
use std::path::Path;

/// Switches and header overrides for reading a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetOptions {
    /// Treat every line break as a one-beat rest.
    pub newline_delay: bool,
    /// Stagger bracket members with `~` rests instead of striking them as a chord.
    pub polynote_delay: bool,
    /// Replaces the tempo header when set.
    pub tempo: Option<u32>,
    /// Replaces the transpose header when set.
    pub transpose: Option<i32>,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            newline_delay: true,
            polynote_delay: false,
            tempo: None,
            transpose: None,
        }
    }
}

pub fn import_sheet_file<P: AsRef<Path>>(
    path: P,
    options: &SheetOptions,
) -> Result<BeatSong, PlayerError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PlayerError::FileNotFound(path.to_path_buf()),
        io::ErrorKind::InvalidData => {
            PlayerError::InvalidFormat(format!("{} is not valid UTF-8", path.display()))
        }
        _ => PlayerError::Io(e),
    })?;

    let mut song = parse_sheet(&text, options)?;
    song.title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string());

    Ok(song)
}

/// Parses sheet text: a tempo line, a transpose line, then the note body.
pub fn parse_sheet(text: &str, options: &SheetOptions) -> Result<BeatSong, PlayerError> {
    let mut lines = text.splitn(3, '\n');

    let tempo_line = lines.next().unwrap_or_default();
    let header_tempo = parse_header::<u32>(tempo_line, "tempo")?;
    let transpose_line = lines
        .next()
        .ok_or_else(|| PlayerError::InvalidFormat("missing transpose header".into()))?;
    let header_transpose = parse_header::<i32>(transpose_line, "transpose")?;
    let body = lines.next().unwrap_or_default();

    let tempo = options.tempo.unwrap_or(header_tempo);
    if tempo == 0 {
        return Err(PlayerError::InvalidFormat(
            "tempo must be greater than 0".into(),
        ));
    }

    let notes = tokenize(body, options.newline_delay, options.polynote_delay)?;
    debug!(
        "Parsed sheet: tempo {} transpose {} with {} tokens",
        tempo,
        options.transpose.unwrap_or(header_transpose),
        notes.len()
    );

    Ok(BeatSong {
        title: None,
        tempo,
        transpose: options.transpose.unwrap_or(header_transpose),
        notes,
    })
}

fn parse_header<T: std::str::FromStr>(line: &str, name: &str) -> Result<T, PlayerError> {
    let line = line.trim();
    line.parse::<T>().map_err(|_| {
        PlayerError::InvalidFormat(format!("{name} header must be an integer, got '{line}'"))
    })
}

/// Single left-to-right scan over a sheet body. Bracket spans are consumed whole,
/// so whitespace inside them never turns into rests.
pub fn tokenize(
    body: &str,
    newline_delay: bool,
    polynote_delay: bool,
) -> Result<Vec<NoteToken>, PlayerError> {
    let mut tokens = Vec::new();
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ' ' => tokens.push(NoteToken::Wait(Rest::Bar)),
            '\n' => {
                if newline_delay {
                    tokens.push(NoteToken::Wait(Rest::Bar));
                }
            }
            '[' => {
                let mut members = Vec::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    if !inner.is_whitespace() {
                        members.push(inner);
                    }
                }
                if !closed {
                    return Err(PlayerError::InvalidFormat(
                        "unterminated '[' in sheet body".into(),
                    ));
                }
                push_bracket(&mut tokens, members, polynote_delay);
            }
            '-' => {
                let mut run = 1;
                while chars.next_if_eq(&'-').is_some() {
                    run += 1;
                }
                push_dashes(&mut tokens, run);
            }
            c if c.is_whitespace() => {}
            c => {
                let mut buf = [0u8; 4];
                match Rest::from_symbol(c.encode_utf8(&mut buf)) {
                    Some(rest) => tokens.push(NoteToken::Wait(rest)),
                    None => tokens.push(NoteToken::Single(c)),
                }
            }
        }
    }

    Ok(tokens)
}

fn push_bracket(tokens: &mut Vec<NoteToken>, members: Vec<char>, polynote_delay: bool) {
    if !polynote_delay || members.len() < 2 {
        tokens.push(NoteToken::Chord(members));
        return;
    }

    for (i, key) in members.into_iter().enumerate() {
        if i > 0 {
            tokens.push(NoteToken::Wait(Rest::Tilde));
        }
        tokens.push(NoteToken::Single(key));
    }
}

// A dash run is split greedily into the longest dash rests that fit it.
fn push_dashes(tokens: &mut Vec<NoteToken>, mut run: usize) {
    while run > 0 {
        let rest = match run {
            4.. => Rest::QuadDash,
            2 | 3 => Rest::DoubleDash,
            _ => Rest::Dash,
        };
        run -= rest.symbol().len();
        tokens.push(NoteToken::Wait(rest));
    }
}

/// Renders tokens back into sheet body text. The result re-parses to the same
/// tokens with newline delay off: one-beat rests become spaces and neighbouring
/// dash rests are kept apart with a line break.
pub fn render_body(tokens: &[NoteToken]) -> String {
    let mut out = String::new();
    let mut last_was_dash = false;

    for token in tokens {
        match token {
            NoteToken::Single(key) => out.push(*key),
            NoteToken::Chord(keys) => {
                out.push('[');
                out.extend(keys.iter());
                out.push(']');
            }
            NoteToken::Wait(Rest::Bar) => out.push(' '),
            NoteToken::Wait(rest) => {
                if rest.is_dash() && last_was_dash {
                    out.push('\n');
                }
                out.push_str(rest.symbol());
            }
        }
        last_was_dash = matches!(token, NoteToken::Wait(rest) if rest.is_dash());
    }

    out
}

impl BeatSong {
    /// Full sheet text including both header lines.
    pub fn to_sheet(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.tempo,
            self.transpose,
            render_body(&self.notes)
        )
    }
}
