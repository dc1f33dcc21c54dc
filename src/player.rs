use crate::engine::{KeyActuator, raise_playback_priority};
use crate::error::PlayerError;
use crate::model::song::*;
use log::{debug, error, info, warn};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Deadlines closer than this are finished with a spin sleep instead of a condvar wait.
const SPIN_WINDOW: Duration = Duration::from_millis(2);

pub type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;
pub type ErrorSink = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Stopped,
    Finished,
}

impl PlaybackState {
    pub const fn is_active(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

#[derive(Debug)]
struct Session {
    song: Option<Arc<Song>>,
    state: PlaybackState,
    stop_requested: bool,
    tempo_override: Option<u32>,
    /// Instant at which song time zero is due, before any pauses.
    started_at: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl Session {
    fn new(song: Option<Arc<Song>>) -> Self {
        Self {
            song,
            state: PlaybackState::Idle,
            stop_requested: false,
            tempo_override: None,
            started_at: Instant::now(),
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    /// Song time zero shifted by every completed pause.
    fn origin(&self) -> Instant {
        self.started_at + self.paused_total
    }

    fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += paused_at.elapsed();
        }
        self.state = PlaybackState::Playing;
    }

    fn reset_pause_clock(&mut self) {
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
    }
}

#[derive(Debug)]
struct Shared {
    session: Mutex<Session>,
    signal: Condvar,
    progress: AtomicU64,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

fn poisoned<T>(_: PoisonError<T>) -> PlayerError {
    PlayerError::UnexpectedState("playback state lock poisoned".into())
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, Session>, PlayerError> {
        self.session.lock().map_err(poisoned)
    }

    fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Acquire))
    }

    fn set_progress(&self, percent: f64) {
        self.progress.store(percent.to_bits(), Ordering::Release);
    }

    /// Blocks until `offset` of non-paused song time has elapsed, or a stop is requested.
    /// Pausing freezes the wait; the deadline moves back by the paused duration.
    fn wait_until(&self, offset: Duration, sleeper: &SpinSleeper) -> Result<Flow, PlayerError> {
        let mut session = self.lock()?;

        loop {
            if session.stop_requested {
                return Ok(Flow::Stop);
            }

            if session.state == PlaybackState::Paused {
                session = self.signal.wait(session).map_err(poisoned)?;
                continue;
            }

            let target = session.origin() + offset;
            let now = Instant::now();
            if now >= target {
                return Ok(Flow::Continue);
            }

            let remaining = target - now;
            if remaining <= SPIN_WINDOW {
                drop(session);
                sleeper.sleep(remaining);
                session = self.lock()?;
                continue;
            }

            let (guard, _) = self
                .signal
                .wait_timeout(session, remaining - SPIN_WINDOW)
                .map_err(poisoned)?;
            session = guard;
        }
    }

    fn elapsed_ms(&self) -> f64 {
        self.lock()
            .map(|s| {
                Instant::now()
                    .saturating_duration_since(s.origin())
                    .as_secs_f64()
                    * 1000.0
            })
            .unwrap_or(0.0)
    }
}

/// Writes the terminal state on every way out of the playback thread.
struct SessionExit<'a> {
    shared: &'a Shared,
    outcome: PlaybackState,
}

impl Drop for SessionExit<'_> {
    fn drop(&mut self) {
        let mut session = self
            .shared
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if session.state.is_active() {
            session.state = self.outcome;
        }
        session.reset_pause_clock();
        self.shared.signal.notify_all();
    }
}

enum Walk {
    Finished,
    Stopped,
}

/// Everything the playback thread needs, moved into it at `play`.
struct Worker<A: KeyActuator> {
    shared: Arc<Shared>,
    actuator: Arc<A>,
    song: Arc<Song>,
    progress_sink: ProgressSink,
    error_sink: ErrorSink,
    verbose: bool,
    sleeper: SpinSleeper,
}

impl<A: KeyActuator> Worker<A> {
    fn run(self) {
        raise_playback_priority();

        let mut exit = SessionExit {
            shared: &self.shared,
            outcome: PlaybackState::Stopped,
        };

        let result = match &*self.song {
            Song::Beat(song) => self.walk_beats(song),
            Song::Timed(song) => self.walk_timed(song),
        };

        match result {
            Ok(Walk::Finished) => {
                exit.outcome = PlaybackState::Finished;
                info!("Playback thread finished all events..!");
            }
            Ok(Walk::Stopped) => {
                warn!(
                    "Playback stopped via control message after {:.3}ms..!",
                    self.shared.elapsed_ms()
                );
            }
            Err(why) => {
                error!("Playback halted: {}", why);
                (self.error_sink)(&why.to_string());
            }
        }

        if let Err(why) = self.actuator.all_keys_up() {
            warn!("Error releasing keys after playback: {:?}", why);
        }
    }

    fn report(&self, percent: f64) {
        self.shared.set_progress(percent);
        (self.progress_sink)(percent);
    }

    fn strike(&self, token: &NoteToken, scheduled_ms: f64) -> Result<(), PlayerError> {
        if self.verbose && !token.keys().is_empty() {
            info!(
                "{:30} | at {:>13.3}ms | scheduled for: {:>13.3}ms",
                format!("Sending keys {:?}", token.keys()),
                self.shared.elapsed_ms(),
                scheduled_ms
            );
        }

        for &symbol in token.keys() {
            self.actuator
                .strike(symbol)
                .map_err(|why| PlayerError::ActuationFailure(format!("{symbol:?}: {why:#}")))?;
        }

        Ok(())
    }

    fn tempo(&self, song: &BeatSong) -> Result<u32, PlayerError> {
        Ok(self.shared.lock()?.tempo_override.unwrap_or(song.tempo))
    }

    fn walk_beats(&self, song: &BeatSong) -> Result<Walk, PlayerError> {
        let total = song.notes.len();
        let mut cursor = Duration::ZERO;

        for (index, token) in song.notes.iter().enumerate() {
            if self.shared.wait_until(cursor, &self.sleeper)? == Flow::Stop {
                return Ok(Walk::Stopped);
            }

            self.strike(token, cursor.as_secs_f64() * 1000.0)?;

            let beats = match token {
                NoteToken::Wait(rest) => rest.beats(),
                NoteToken::Single(_) | NoteToken::Chord(_) => 1,
            };
            cursor += beat_delay(self.tempo(song)?) * beats;

            if self.shared.wait_until(cursor, &self.sleeper)? == Flow::Stop {
                return Ok(Walk::Stopped);
            }

            self.report((index + 1) as f64 / total as f64 * 100.0);
        }

        if total == 0 {
            self.report(100.0);
        }

        Ok(Walk::Finished)
    }

    fn walk_timed(&self, song: &TimedSong) -> Result<Walk, PlayerError> {
        let total_ms = song.last_time_ms();

        for note in song.notes.iter() {
            // late notes go out immediately, there is no catch-up
            let due = Duration::from_millis(note.time_ms);
            if self.shared.wait_until(due, &self.sleeper)? == Flow::Stop {
                return Ok(Walk::Stopped);
            }

            self.strike(&note.token, note.time_ms as f64)?;

            let percent = if total_ms == 0 {
                100.0
            } else {
                note.time_ms as f64 / total_ms as f64 * 100.0
            };
            self.report(percent);
        }

        if song.notes.is_empty() {
            self.report(100.0);
        }

        Ok(Walk::Finished)
    }
}

/// Plays one song at a time on a background thread against a shared actuator.
pub struct Player<A: KeyActuator> {
    delay: Duration,
    verbose: bool,
    actuator: Arc<A>,
    shared: Arc<Shared>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
    progress_sink: ProgressSink,
    error_sink: ErrorSink,
}

impl<A: KeyActuator + 'static> Player<A> {
    /// `delay` is waited (and can be cancelled) before the first event of every session.
    pub fn new(actuator: A, verbose: bool, delay: Duration) -> Self {
        Self {
            delay,
            verbose,
            actuator: Arc::new(actuator),
            shared: Arc::new(Shared {
                session: Mutex::new(Session::new(None)),
                signal: Condvar::new(),
                progress: AtomicU64::new(0f64.to_bits()),
            }),
            worker_handle: Mutex::new(None),
            progress_sink: Arc::new(|_: f64| {}),
            error_sink: Arc::new(|message: &str| error!("{}", message)),
        }
    }

    pub fn with_progress_sink(mut self, sink: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress_sink = Arc::new(sink);
        self
    }

    pub fn with_error_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.error_sink = Arc::new(sink);
        self
    }

    /// Stops and joins any running session, then adopts `song` and returns to `Idle`.
    pub fn load(&self, song: impl Into<Song>) -> Result<(), PlayerError> {
        let song = song.into();
        self.stop()?;

        info!(
            "Loaded song: '{}' with {} events..!",
            song.title().unwrap_or("No Title"),
            song.len()
        );

        *self.shared.lock()? = Session::new(Some(Arc::new(song)));
        self.shared.set_progress(0.0);

        Ok(())
    }

    /// Starts the loaded song from `Idle`, or resumes it from `Paused`.
    /// Does nothing while already playing.
    pub fn play(&self) -> Result<(), PlayerError> {
        let Ok(mut wh) = self.worker_handle.lock() else {
            return Err(poisoned_handle());
        };
        let mut session = self.shared.lock()?;

        match session.state {
            PlaybackState::Playing => {
                debug!("Playback already running..!");
                return Ok(());
            }
            PlaybackState::Paused => {
                session.resume();
                self.shared.signal.notify_all();
                info!("Playback resumed..!");
                return Ok(());
            }
            PlaybackState::Stopped | PlaybackState::Finished => {
                warn!("Playback session is over, load a song to play again..!");
                return Ok(());
            }
            PlaybackState::Idle => {}
        }

        let song = session.song.clone().ok_or(PlayerError::NoSongLoaded)?;

        session.state = PlaybackState::Playing;
        session.stop_requested = false;
        session.started_at = Instant::now() + self.delay;
        session.reset_pause_clock();
        drop(session);

        self.shared.set_progress(0.0);

        let worker = Worker {
            shared: Arc::clone(&self.shared),
            actuator: Arc::clone(&self.actuator),
            song,
            progress_sink: Arc::clone(&self.progress_sink),
            error_sink: Arc::clone(&self.error_sink),
            verbose: self.verbose,
            sleeper: SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread),
        };

        info!(
            "Starting playback {}..!",
            if self.delay.is_zero() {
                "now".to_owned()
            } else {
                format!("in {:.3} seconds", self.delay.as_secs_f64())
            }
        );

        *wh = Some(thread::spawn(move || worker.run()));

        Ok(())
    }

    /// Toggles between `Playing` and `Paused`. Paused time is excluded from song time.
    pub fn pause(&self) -> Result<(), PlayerError> {
        let mut session = self.shared.lock()?;

        match session.state {
            PlaybackState::Playing => {
                session.state = PlaybackState::Paused;
                session.paused_at = Some(Instant::now());
                info!("Playback paused..!");
            }
            PlaybackState::Paused => {
                session.resume();
                info!("Playback resumed..!");
            }
            state => {
                debug!("Nothing to pause in state {:?}..!", state);
                return Ok(());
            }
        }

        self.shared.signal.notify_all();
        Ok(())
    }

    /// Cancels the running session and blocks until its thread has exited.
    pub fn stop(&self) -> Result<(), PlayerError> {
        {
            let mut session = self.shared.lock()?;
            if session.state.is_active() {
                session.stop_requested = true;
                self.shared.signal.notify_all();
            } else {
                debug!("No worker is running playback ({:?})..!", session.state);
            }
        }

        let handle = {
            let Ok(mut wh) = self.worker_handle.lock() else {
                return Err(poisoned_handle());
            };
            wh.take()
        };

        let mut session = match handle {
            Some(handle) => {
                if handle.join().is_err() {
                    warn!("Playback thread panicked..!");
                }
                debug!("Playback thread joined..!");
                self.shared.lock()?
            }
            None => {
                // another caller is joining; wait for the thread to write its exit state
                let mut session = self.shared.lock()?;
                while session.state.is_active() && session.stop_requested {
                    session = self.shared.signal.wait(session).map_err(poisoned)?;
                }
                session
            }
        };

        if session.state.is_active() {
            session.state = PlaybackState::Stopped;
        }
        if session.stop_requested {
            info!("Stopped playback thread..!");
        }
        session.stop_requested = false;
        session.reset_pause_clock();

        Ok(())
    }

    /// Blocks until the running session ends on its own or is stopped.
    pub fn join(&self) -> Result<(), PlayerError> {
        let handle = {
            let Ok(mut wh) = self.worker_handle.lock() else {
                return Err(poisoned_handle());
            };
            wh.take()
        };

        if let Some(handle) = handle
            && handle.join().is_err()
        {
            warn!("Playback thread panicked..!");
        }

        Ok(())
    }

    /// Changes the beat delay of a sheet song from its next token on.
    pub fn set_tempo(&self, tempo: u32) -> Result<(), PlayerError> {
        if tempo == 0 {
            return Err(PlayerError::InvalidFormat(
                "tempo must be greater than 0".into(),
            ));
        }

        let mut session = self.shared.lock()?;
        if let Some(Song::Timed(_)) = session.song.as_deref() {
            debug!("Tempo override ignored for a timestamped song..!");
            return Ok(());
        }

        session.tempo_override = Some(tempo);
        info!("Tempo set to {} BPM..!", tempo);
        Ok(())
    }

    pub fn progress(&self) -> f64 {
        self.shared.progress()
    }

    pub fn state(&self) -> PlaybackState {
        self.shared
            .lock()
            .map(|s| s.state)
            .unwrap_or(PlaybackState::Stopped)
    }
}

fn poisoned_handle() -> PlayerError {
    PlayerError::UnexpectedState("worker handle lock poisoned".into())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::Key;
    use anyhow::anyhow;

    #[derive(Default)]
    struct Recorder {
        presses: Mutex<Vec<(Instant, char, bool)>>,
        fail_on: Option<char>,
    }

    impl KeyActuator for Recorder {
        fn key_down(&self, _key: Key) -> anyhow::Result<()> {
            Ok(())
        }

        fn key_up(&self, _key: Key) -> anyhow::Result<()> {
            Ok(())
        }

        fn press_release(&self, key: char, shifted: bool) -> anyhow::Result<()> {
            if Some(key) == self.fail_on {
                return Err(anyhow!("injection refused for {:?}", key));
            }
            self.presses
                .lock()
                .unwrap()
                .push((Instant::now(), key, shifted));
            Ok(())
        }
    }

    fn recorder_player(fail_on: Option<char>) -> Player<Recorder> {
        env_logger::try_init().unwrap_or(());
        Player::new(
            Recorder {
                fail_on,
                ..Recorder::default()
            },
            true,
            Duration::ZERO,
        )
    }

    fn presses(player: &Player<Recorder>) -> Vec<(Instant, char, bool)> {
        player.actuator.presses.lock().unwrap().clone()
    }

    fn keys(player: &Player<Recorder>) -> String {
        presses(player).iter().map(|(_, key, _)| *key).collect()
    }

    fn beat_song(tempo: u32, notes: Vec<NoteToken>) -> BeatSong {
        BeatSong {
            title: Some("test".into()),
            tempo,
            transpose: 0,
            notes,
        }
    }

    fn timed_song(times: &[(char, u64)]) -> TimedSong {
        TimedSong {
            title: Some("test".into()),
            tempo: 120,
            transpose: 0,
            total_duration_ms: times.last().map(|(_, t)| *t).unwrap_or(0),
            notes: times
                .iter()
                .map(|&(key, time_ms)| TimedNote {
                    token: NoteToken::Single(key),
                    time_ms,
                })
                .collect(),
        }
    }

    #[test]
    fn beat_song_paces_by_beat_delay() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let player = recorder_player(None).with_progress_sink(move |p| sink.lock().unwrap().push(p));

        let notes = "abcd".chars().map(NoteToken::Single).collect();
        player.load(beat_song(120, notes)).unwrap();

        let started = Instant::now();
        player.play().unwrap();
        player.join().unwrap();

        assert!(started.elapsed() >= Duration::from_millis(750));
        assert_eq!(keys(&player), "abcd");
        assert_eq!(player.progress(), 100.0);
        assert_eq!(player.state(), PlaybackState::Finished);

        let presses = presses(&player);
        for pair in presses.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(240));
        }

        let reports = reports.lock().unwrap();
        assert_eq!(*reports, vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn chords_and_rests() {
        let player = recorder_player(None);
        let notes = vec![
            NoteToken::Chord(vec!['a', 'S', '!']),
            NoteToken::Wait(Rest::Dash),
            NoteToken::Single('b'),
        ];
        // 50ms per beat
        player.load(beat_song(600, notes)).unwrap();
        player.play().unwrap();
        player.join().unwrap();

        let presses = presses(&player);
        assert_eq!(
            presses.iter().map(|p| (p.1, p.2)).collect::<Vec<_>>(),
            vec![('a', false), ('s', true), ('1', false), ('b', false)]
        );
        assert!(presses[2].0 - presses[0].0 < Duration::from_millis(20));
        // chord beat + two-beat dash
        assert!(presses[3].0 - presses[0].0 >= Duration::from_millis(140));
    }

    #[test]
    fn timed_song_progress() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let player = recorder_player(None).with_progress_sink(move |p| sink.lock().unwrap().push(p));

        player
            .load(timed_song(&[('a', 0), ('b', 100), ('c', 200)]))
            .unwrap();

        let started = Instant::now();
        player.play().unwrap();
        player.join().unwrap();

        let presses = presses(&player);
        assert_eq!(keys(&player), "abc");
        assert!(presses[1].0 - started >= Duration::from_millis(100));
        assert!(presses[2].0 - started >= Duration::from_millis(200));
        assert_eq!(*reports.lock().unwrap(), vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn pause_shifts_later_events() {
        let player = recorder_player(None);
        player
            .load(timed_song(&[('a', 0), ('b', 300), ('c', 600)]))
            .unwrap();

        let started = Instant::now();
        player.play().unwrap();
        thread::sleep(Duration::from_millis(100));
        player.pause().unwrap();
        assert_eq!(player.state(), PlaybackState::Paused);
        thread::sleep(Duration::from_millis(400));
        player.pause().unwrap();
        player.join().unwrap();

        let presses = presses(&player);
        assert_eq!(keys(&player), "abc");

        let b = (presses[1].0 - started).as_millis();
        let c = (presses[2].0 - started).as_millis();
        assert!((690..=800).contains(&b), "b at {b}ms");
        assert!((990..=1100).contains(&c), "c at {c}ms");
        assert!(c - b >= 295 && c - b <= 350, "gap {}ms", c - b);
    }

    #[test]
    fn pause_freezes_beat_position() {
        let player = recorder_player(None);
        let notes = "ab".chars().map(NoteToken::Single).collect();
        player.load(beat_song(120, notes)).unwrap();

        player.play().unwrap();
        thread::sleep(Duration::from_millis(50));
        player.pause().unwrap();
        thread::sleep(Duration::from_millis(500));
        assert_eq!(keys(&player), "a");
        player.play().unwrap();
        player.join().unwrap();

        let presses = presses(&player);
        assert_eq!(keys(&player), "ab");
        assert!(presses[1].0 - presses[0].0 >= Duration::from_millis(700));
    }

    #[test]
    fn stop_is_prompt_and_player_is_reusable() {
        let player = recorder_player(None);
        let notes = "qwertyuiop".chars().map(NoteToken::Single).collect();
        player.load(beat_song(30, notes)).unwrap();

        player.play().unwrap();
        thread::sleep(Duration::from_millis(200));

        let asked = Instant::now();
        player.stop().unwrap();
        assert!(asked.elapsed() < Duration::from_millis(100));
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert_eq!(keys(&player), "q");

        // the finished session cannot be replayed without a new load
        player.play().unwrap();
        assert_eq!(player.state(), PlaybackState::Stopped);

        player.load(timed_song(&[('z', 0), ('x', 10)])).unwrap();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.progress(), 0.0);
        player.play().unwrap();
        player.join().unwrap();

        assert_eq!(keys(&player), "qzx");
        assert_eq!(player.state(), PlaybackState::Finished);
    }

    #[test]
    fn stop_while_paused() {
        let player = recorder_player(None);
        let notes = "qwer".chars().map(NoteToken::Single).collect();
        player.load(beat_song(60, notes)).unwrap();

        player.play().unwrap();
        thread::sleep(Duration::from_millis(50));
        player.pause().unwrap();
        assert_eq!(player.state(), PlaybackState::Paused);

        let asked = Instant::now();
        player.stop().unwrap();
        assert!(asked.elapsed() < Duration::from_millis(100));
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert_eq!(keys(&player), "q");

        player.load(timed_song(&[('z', 0)])).unwrap();
        player.play().unwrap();
        player.join().unwrap();

        assert_eq!(keys(&player), "qz");
        assert_eq!(player.state(), PlaybackState::Finished);
    }

    #[test]
    fn load_replaces_a_running_session() {
        let player = recorder_player(None);
        let notes = "asdf".chars().map(NoteToken::Single).collect();
        player.load(beat_song(30, notes)).unwrap();
        player.play().unwrap();
        thread::sleep(Duration::from_millis(100));

        player.load(beat_song(600, vec![NoteToken::Single('m')])).unwrap();
        player.play().unwrap();
        player.join().unwrap();

        assert_eq!(keys(&player), "am");
    }

    #[test]
    fn play_while_playing_does_not_restart() {
        let player = recorder_player(None);
        let notes = "abc".chars().map(NoteToken::Single).collect();
        player.load(beat_song(600, notes)).unwrap();

        player.play().unwrap();
        thread::sleep(Duration::from_millis(60));
        player.play().unwrap();
        player.join().unwrap();

        assert_eq!(keys(&player), "abc");
    }

    #[test]
    fn actuation_failure_halts_playback() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let player = recorder_player(Some('x'))
            .with_error_sink(move |message| sink.lock().unwrap().push(message.to_owned()));

        let notes = "axb".chars().map(NoteToken::Single).collect();
        player.load(beat_song(600, notes)).unwrap();
        player.play().unwrap();
        player.join().unwrap();

        assert_eq!(keys(&player), "a");
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert!((player.progress() - 100.0 / 3.0).abs() < 1e-9);

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("key actuation failed"), "{}", errors[0]);
    }

    #[test]
    fn idle_controls_are_harmless() {
        let player = recorder_player(None);
        assert!(matches!(player.play(), Err(PlayerError::NoSongLoaded)));
        assert!(player.stop().is_ok());
        assert!(player.pause().is_ok());
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn tempo_override_speeds_up_sheet() {
        let player = recorder_player(None);
        let notes = "abc".chars().map(NoteToken::Single).collect();
        player.load(beat_song(60, notes)).unwrap();
        player.set_tempo(600).unwrap();
        assert!(player.set_tempo(0).is_err());

        let started = Instant::now();
        player.play().unwrap();
        player.join().unwrap();

        assert_eq!(keys(&player), "abc");
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn start_delay_is_waited() {
        env_logger::try_init().unwrap_or(());
        let player = Player::new(Recorder::default(), false, Duration::from_millis(200));
        player.load(timed_song(&[('a', 0)])).unwrap();

        let started = Instant::now();
        player.play().unwrap();
        player.join().unwrap();

        assert!(presses(&player)[0].0 - started >= Duration::from_millis(200));
    }

    #[test]
    fn stop_during_start_delay() {
        env_logger::try_init().unwrap_or(());
        let player = Player::new(Recorder::default(), false, Duration::from_secs(5));
        player.load(timed_song(&[('a', 0)])).unwrap();

        player.play().unwrap();
        let asked = Instant::now();
        player.stop().unwrap();

        assert!(asked.elapsed() < Duration::from_millis(100));
        assert!(presses(&player).is_empty());
    }
}
