use SHEET_PLAYER::{
    Args, DefaultActuator, KeyActuator, Player, Song, load_song_file, midi_options, sheet_options,
    wait_for_active_window,
};
use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, warn};
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Importing song: '{}'...", args.song.display());
    let song = load_song_file(
        &args.song,
        &sheet_options(&args),
        &midi_options(&args),
        |percent| debug!("Translating MIDI: {:.1}%", percent),
    )?;

    debug!(
        "Imported song '{}' at {} BPM (transpose {}) with {} events..!",
        song.title().unwrap_or("<unknown>"),
        song.tempo(),
        song.transpose(),
        song.len()
    );

    if args.dry_run {
        return preview(&song, &args);
    }

    if let Some(title) = args.focus_window.as_deref() {
        wait_for_active_window(title, Duration::from_secs(30))?;
    }

    let player = Player::new(
        DefaultActuator::new(),
        args.verbose,
        Duration::from_secs(args.delay_start),
    )
    .with_progress_sink(|percent| debug!("Progress: {:.1}%", percent))
    .with_error_sink(|message| error!("Playback error: {}", message));

    player.load(song)?;
    let player = Arc::new(player);

    let player_for_handler = Arc::clone(&player);
    ctrlc::set_handler(move || {
        warn!("Ctrl-C received, stopping playback..!");
        if let Err(why) = player_for_handler.stop() {
            error!("{}", why);
        }
    })?;

    spawn_console_controls(Arc::clone(&player));

    player.play()?;
    info!("Controls: [p] pause/resume, [t <bpm>] tempo, [s] stop");
    player.join()?;

    info!(
        "Playback {:?} at {:.1}%, exiting..!",
        player.state(),
        player.progress()
    );

    Ok(())
}

fn preview(song: &Song, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(song)?);
        return Ok(());
    }

    info!("Previewing at most {} events..!", args.dry_run_max);
    match song {
        Song::Beat(song) => {
            for (i, token) in song.notes.iter().take(args.dry_run_max).enumerate() {
                info!("Token {}: {:?}", i, token);
            }
        }
        Song::Timed(song) => {
            for (i, note) in song.notes.iter().take(args.dry_run_max).enumerate() {
                info!(
                    "Event {}: keys={:?} time_ms={}",
                    i,
                    note.token.keys(),
                    note.time_ms
                );
            }
        }
    }

    Ok(())
}

/// Reads playback commands from stdin until it closes.
fn spawn_console_controls<A: KeyActuator + 'static>(player: Arc<Player<A>>) {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };

            let mut words = line.split_whitespace();
            let result = match words.next() {
                Some("p") => player.pause(),
                Some("s") | Some("q") => player.stop(),
                Some("t") => match words.next().and_then(|w| w.parse::<u32>().ok()) {
                    Some(tempo) => player.set_tempo(tempo),
                    None => {
                        warn!("Usage: t <bpm>");
                        Ok(())
                    }
                },
                Some(other) => {
                    warn!("Unknown command '{}'..!", other);
                    Ok(())
                }
                None => Ok(()),
            };

            if let Err(why) = result {
                error!("{}", why);
            }
        }
    });
}
