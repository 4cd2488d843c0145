/// Controller lifecycle state.
///
/// ```text
/// Unbound ── bind() ──▶ Bound { muted } ── unbind()/dispose() ──▶ Unbound
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Unbound,
    Bound { muted: bool },
}

impl ControllerState {
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound { .. })
    }

    pub fn is_muted(&self) -> bool {
        matches!(self, Self::Bound { muted: true })
    }
}
