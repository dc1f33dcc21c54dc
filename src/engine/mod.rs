use crate::model::mappings::keystroke_for;
use std::time::Duration;

mod console;
#[cfg(all(target_os = "windows", feature = "wininput"))]
mod windows;

pub use console::ConsoleActuator;
#[cfg(all(target_os = "windows", feature = "wininput"))]
pub use self::windows::WindowsActuator;

#[cfg(all(target_os = "windows", feature = "wininput"))]
pub type DefaultActuator = WindowsActuator;
#[cfg(not(all(target_os = "windows", feature = "wininput")))]
pub type DefaultActuator = ConsoleActuator;

/// How long a key stays down during a press.
pub const HOLD: Duration = Duration::from_millis(1);

/// A physical key the actuator can hold down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Shift,
    Char(char),
}

pub trait KeyActuator: Send + Sync {
    fn key_down(&self, key: Key) -> anyhow::Result<()>;

    fn key_up(&self, key: Key) -> anyhow::Result<()>;

    /// Taps `key`, wrapped in shift when `shifted` is set.
    /// Shift is always released, even if the tap itself failed.
    fn press_release(&self, key: char, shifted: bool) -> anyhow::Result<()> {
        if shifted {
            self.key_down(Key::Shift)?;
        }

        let tap = self.key_down(Key::Char(key)).and_then(|_| {
            spin_sleep::sleep(HOLD);
            self.key_up(Key::Char(key))
        });

        if shifted {
            let released = self.key_up(Key::Shift);
            tap?;
            return released;
        }

        tap
    }

    /// Types one song symbol, resolving digit remaps and shift first.
    fn strike(&self, symbol: char) -> anyhow::Result<()> {
        let stroke = keystroke_for(symbol);
        self.press_release(stroke.key, stroke.shifted)
    }

    /// Called once a session ends so nothing is left held down.
    fn all_keys_up(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Platform hook for the playback thread.
pub fn raise_playback_priority() {
    #[cfg(all(target_os = "windows", feature = "wininput"))]
    self::windows::set_playback_thread_high_priority();
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<(bool, Key)>>,
        fail_on: Option<char>,
    }

    impl KeyActuator for Journal {
        fn key_down(&self, key: Key) -> anyhow::Result<()> {
            if key == Key::Char(self.fail_on.unwrap_or('\0')) {
                return Err(anyhow!("cannot press {:?}", key));
            }
            self.events.lock().unwrap().push((true, key));
            Ok(())
        }

        fn key_up(&self, key: Key) -> anyhow::Result<()> {
            self.events.lock().unwrap().push((false, key));
            Ok(())
        }
    }

    #[test]
    fn shifted_press_order() {
        let journal = Journal::default();
        journal.strike('Q').unwrap();

        assert_eq!(
            *journal.events.lock().unwrap(),
            vec![
                (true, Key::Shift),
                (true, Key::Char('q')),
                (false, Key::Char('q')),
                (false, Key::Shift),
            ]
        );
    }

    #[test]
    fn plain_and_remapped_presses() {
        let journal = Journal::default();
        journal.strike('a').unwrap();
        journal.strike('@').unwrap();

        assert_eq!(
            *journal.events.lock().unwrap(),
            vec![
                (true, Key::Char('a')),
                (false, Key::Char('a')),
                (true, Key::Char('2')),
                (false, Key::Char('2')),
            ]
        );
    }

    #[test]
    fn shift_released_on_failure() {
        let journal = Journal {
            fail_on: Some('z'),
            ..Journal::default()
        };

        assert!(journal.strike('Z').is_err());
        assert_eq!(
            *journal.events.lock().unwrap(),
            vec![(true, Key::Shift), (false, Key::Shift)]
        );
    }
}
