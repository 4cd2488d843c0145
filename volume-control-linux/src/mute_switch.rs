/// How a mute request maps onto an element's playback switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchWrite {
    /// Write this value to every channel's switch (0 = off = muted).
    Set(i32),
    /// Nothing to do: an element without a switch is never muted.
    Skip,
    /// Muting needs a switch the element does not have.
    Unsupported,
}

pub fn switch_write(has_switch: bool, muted: bool) -> SwitchWrite {
    match (has_switch, muted) {
        (true, true) => SwitchWrite::Set(0),
        (true, false) => SwitchWrite::Set(1),
        (false, false) => SwitchWrite::Skip,
        (false, true) => SwitchWrite::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_off_means_muted() {
        assert_eq!(switch_write(true, true), SwitchWrite::Set(0));
        assert_eq!(switch_write(true, false), SwitchWrite::Set(1));
    }

    #[test]
    fn switchless_element_can_always_be_unmuted() {
        assert_eq!(switch_write(false, false), SwitchWrite::Skip);
        assert_eq!(switch_write(false, true), SwitchWrite::Unsupported);
    }
}
