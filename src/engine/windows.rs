use crate::engine::{Key, KeyActuator};
use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::mem::size_of;
use windows::Win32::System::Threading::{
    GetCurrentThread, SetThreadPriority, THREAD_PRIORITY_HIGHEST,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP, SendInput,
    VIRTUAL_KEY, VK_SHIFT, VkKeyScanW,
};

/// Injects keystrokes into the focused window with `SendInput`.
#[derive(Clone, Debug, Default)]
pub struct WindowsActuator;

impl WindowsActuator {
    pub fn new() -> Self {
        Self
    }

    /// Resolves a key to its virtual-key code on the active keyboard layout.
    fn virtual_key(key: Key) -> Result<VIRTUAL_KEY> {
        match key {
            Key::Shift => Ok(VK_SHIFT),
            Key::Char(c) => {
                let mut utf16 = [0u16; 2];
                let encoded = c.encode_utf16(&mut utf16);
                if encoded.len() != 1 {
                    return Err(anyhow!("No virtual key for {:?}", c));
                }

                // low byte is the vk code, high byte the shift state we manage ourselves
                let scan = unsafe { VkKeyScanW(encoded[0]) };
                if scan == -1 {
                    return Err(anyhow!("No virtual key for {:?} on this layout", c));
                }

                Ok(VIRTUAL_KEY((scan as u16) & 0xff))
            }
        }
    }

    fn build_input(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        let ki = KEYBDINPUT {
            wVk: vk,
            wScan: 0,
            dwFlags: flags,
            time: 0,
            dwExtraInfo: 0,
        };

        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 { ki },
        }
    }

    /// Low-level wrapper around SendInput: sends a slice of INPUTs and checks the result.
    fn send_inputs(inputs: &[INPUT]) -> Result<()> {
        unsafe {
            let sent = SendInput(inputs, size_of::<INPUT>() as i32);
            if sent == inputs.len() as u32 {
                Ok(())
            } else {
                Err(anyhow!(
                    "SendInput failed: requested {}, sent {}",
                    inputs.len(),
                    sent
                ))
            }
        }
    }
}

impl KeyActuator for WindowsActuator {
    fn key_down(&self, key: Key) -> Result<()> {
        let vk = Self::virtual_key(key)?;
        debug!("WindowsActuator::key_down {:?} => {:?}", key, vk);

        Self::send_inputs(&[Self::build_input(vk, KEYBD_EVENT_FLAGS(0))])
    }

    fn key_up(&self, key: Key) -> Result<()> {
        let vk = Self::virtual_key(key)?;
        debug!("WindowsActuator::key_up {:?} => {:?}", key, vk);

        Self::send_inputs(&[Self::build_input(vk, KEYEVENTF_KEYUP)])
    }

    fn all_keys_up(&self) -> Result<()> {
        self.key_up(Key::Shift)
    }
}

pub fn set_playback_thread_high_priority() {
    unsafe {
        let h = GetCurrentThread();
        let ok = SetThreadPriority(h, THREAD_PRIORITY_HIGHEST);

        if ok.is_ok() {
            debug!("Playback thread priority set to HIGHEST..!");
        } else {
            warn!("Failed to set playback thread priority..!");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolves_layout_keys() {
        assert_eq!(WindowsActuator::virtual_key(Key::Shift).unwrap(), VK_SHIFT);
        assert_eq!(
            WindowsActuator::virtual_key(Key::Char('a')).unwrap(),
            VIRTUAL_KEY(0x41)
        );
        assert_eq!(
            WindowsActuator::virtual_key(Key::Char('1')).unwrap(),
            VIRTUAL_KEY(0x31)
        );
    }
}
