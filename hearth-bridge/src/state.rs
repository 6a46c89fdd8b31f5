//! Last-commanded fireplace state

use hearth_proto::{FRAME_LEN, Level, flame_frame};

/// What the bridge believes the fireplace is doing.
///
/// There is no readback channel: this is the last state a confirmed write
/// put the device in, and it can drift if someone uses the vendor remote.
/// It resets to the device's power-on defaults on every process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub is_on: bool,
    pub flame_height: Level,
    pub flame_speed: Level,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            is_on: false,
            flame_height: Level::MAX,
            flame_speed: Level::MAX,
        }
    }
}

impl DeviceState {
    /// The combined flame frame for the current height and speed pair.
    pub fn flame_frame(&self) -> [u8; FRAME_LEN] {
        flame_frame(self.flame_height, self.flame_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_power_on() {
        let state = DeviceState::default();
        assert!(!state.is_on);
        assert_eq!(state.flame_height.get(), 7);
        assert_eq!(state.flame_speed.get(), 7);
    }

    #[test]
    fn flame_frame_uses_current_pair() {
        let state = DeviceState {
            is_on: true,
            flame_height: Level::new(3).unwrap(),
            flame_speed: Level::new(5).unwrap(),
        };
        let frame = state.flame_frame();
        assert_eq!(frame[3], 3);
        assert_eq!(frame[4], 5);
    }
}
