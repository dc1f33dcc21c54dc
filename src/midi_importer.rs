use crate::error::PlayerError;
use crate::model::mappings::symbol_for_midi;
use crate::model::song::*;
use log::{debug, info};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::io;
use std::path::Path;

const DEFAULT_MPQN: u32 = 500_000;
const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MidiOptions {
    /// Semitones added to every note number before the symbol lookup.
    pub transpose: i32,
}

pub fn import_midi_file<P: AsRef<Path>>(
    path: P,
    options: &MidiOptions,
    progress: impl FnMut(f64),
) -> Result<TimedSong, PlayerError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PlayerError::FileNotFound(path.to_path_buf()),
        _ => PlayerError::Io(e),
    })?;

    let mut song = midi_bytes_to_song(&bytes, options, progress)?;
    song.title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string());

    info!(
        "Imported '{}' with {} notes over {}ms..!",
        path.display(),
        song.notes.len(),
        song.total_duration_ms
    );

    Ok(song)
}

pub fn midi_bytes_to_song(
    bytes: &[u8],
    options: &MidiOptions,
    progress: impl FnMut(f64),
) -> Result<TimedSong, PlayerError> {
    let smf = Smf::parse(bytes)
        .map_err(|e| PlayerError::InvalidFormat(format!("failed to parse MIDI: {e}")))?;

    translate(&smf, options, progress)
}

/// Walks every track in file order against one running clock and records the
/// onset of each mappable note. Progress is reported after every event.
pub fn translate(
    smf: &Smf,
    options: &MidiOptions,
    mut progress: impl FnMut(f64),
) -> Result<TimedSong, PlayerError> {
    let ticks_per_beat = ticks_per_beat(smf)?;

    debug!("Ticks per quarter note: {}", ticks_per_beat);
    debug!(
        "MIDI format: {:?}, tracks: {}",
        smf.header.format,
        smf.tracks.len()
    );

    let total_events: usize = smf.tracks.iter().map(|track| track.len()).sum();
    if total_events == 0 {
        return Err(PlayerError::EmptyTrack);
    }

    let mut mpqn = DEFAULT_MPQN;
    let mut absolute_ms = 0.0;
    let mut processed = 0;
    let mut dropped = 0;
    let mut notes: Vec<TimedNote> = Vec::new();

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        for event in track.iter() {
            // a tempo event also times its own delta
            if let TrackEventKind::Meta(MetaMessage::Tempo(micro)) = &event.kind {
                mpqn = micro.as_int();
            }
            absolute_ms += ticks_to_ms(event.delta.as_int() as u64, mpqn, ticks_per_beat);

            match &event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(_)) => {
                    debug!(
                        "Tempo change at {:.3}ms -> {} us/qn (track {})",
                        absolute_ms, mpqn, track_idx
                    );
                }
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, vel },
                    ..
                } if vel.as_int() > 0 => {
                    let note_id = key.as_int() as i32 + options.transpose;
                    let symbol = u8::try_from(note_id).ok().and_then(symbol_for_midi);

                    if let Some(symbol) = symbol {
                        notes.push(TimedNote {
                            token: NoteToken::Single(symbol),
                            time_ms: absolute_ms.round() as u64,
                        });
                    } else {
                        dropped += 1;
                        debug!(
                            "No key for MIDI {}: dropping note at {:.3}ms..!",
                            note_id, absolute_ms
                        );
                    }
                }
                _ => {}
            }

            processed += 1;
            progress(processed as f64 / total_events as f64 * 100.0);
        }
    }

    if notes.is_empty() {
        return Err(PlayerError::EmptyTrack);
    }

    if dropped > 0 {
        info!("Dropped {} note(s) outside of the playable range..!", dropped);
    }

    Ok(TimedSong {
        title: None,
        tempo: (MICROSECONDS_PER_MINUTE / mpqn.max(1) as f64).round() as u32,
        transpose: options.transpose,
        total_duration_ms: file_length_ms(smf, ticks_per_beat).round() as u64,
        notes,
    })
}

fn ticks_per_beat(smf: &Smf) -> Result<u64, PlayerError> {
    match smf.header.timing {
        Timing::Metrical(t) if t.as_int() > 0 => Ok(t.as_int() as u64),
        Timing::Metrical(_) => Err(PlayerError::InvalidFormat(
            "MIDI header declares zero ticks per beat".into(),
        )),
        Timing::Timecode(_fps, _subframe) => Err(PlayerError::InvalidFormat(
            "SMPTE timecode midi timing is not currently supported..!".into(),
        )),
    }
}

fn ticks_to_ms(ticks: u64, mpqn: u32, ticks_per_beat: u64) -> f64 {
    ticks as f64 * mpqn as f64 / ticks_per_beat as f64 / 1000.0
}

/// Playback length of the whole file with all tracks merged by absolute tick,
/// so tempo changes in one track apply to every other track.
fn file_length_ms(smf: &Smf, ticks_per_beat: u64) -> f64 {
    let mut timeline: Vec<(u64, Option<u32>)> = Vec::new();

    for track in smf.tracks.iter() {
        let mut abs_tick: u64 = 0;
        for event in track.iter() {
            abs_tick = abs_tick.saturating_add(event.delta.as_int() as u64);
            let tempo = match &event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(micro)) => Some(micro.as_int()),
                _ => None,
            };
            timeline.push((abs_tick, tempo));
        }
    }

    timeline.sort_by_key(|(tick, _)| *tick);

    let mut ms = 0.0;
    let mut last_tick = 0;
    let mut mpqn = DEFAULT_MPQN;
    for (tick, tempo) in timeline {
        ms += ticks_to_ms(tick - last_tick, mpqn, ticks_per_beat);
        last_tick = tick;
        if let Some(tempo) = tempo {
            mpqn = tempo;
        }
    }

    ms
}
