/// State of a mixer handle's poll descriptors after a poll.
///
/// `snd_mixer_handle_events` reads until the control device has nothing
/// left, and on a blocking handle that read waits for the next change. It
/// may only be called once a poll reported the handle readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerReadiness {
    /// Nothing queued; cached element values are current.
    Idle,
    /// Events queued; handle them before reading element values.
    Pending,
    /// The device reported an error or hang-up.
    Gone,
}

impl MixerReadiness {
    /// Classify a poll result. `ready` is the count returned by `poll`;
    /// `readable` and `failed` come from the handle's returned events.
    pub fn classify(ready: usize, readable: bool, failed: bool) -> Self {
        if ready == 0 {
            Self::Idle
        } else if failed {
            Self::Gone
        } else if readable {
            Self::Pending
        } else {
            Self::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_ready_never_handles_events() {
        assert_eq!(MixerReadiness::classify(0, false, false), MixerReadiness::Idle);
        // Stale revents from an earlier poll are ignored.
        assert_eq!(MixerReadiness::classify(0, true, false), MixerReadiness::Idle);
    }

    #[test]
    fn readable_handle_has_pending_events() {
        assert_eq!(MixerReadiness::classify(1, true, false), MixerReadiness::Pending);
    }

    #[test]
    fn error_wins_over_readable() {
        assert_eq!(MixerReadiness::classify(1, true, true), MixerReadiness::Gone);
        assert_eq!(MixerReadiness::classify(2, false, true), MixerReadiness::Gone);
    }

    #[test]
    fn ready_without_input_is_idle() {
        assert_eq!(MixerReadiness::classify(1, false, false), MixerReadiness::Idle);
    }
}
