use std::time::Duration;

use serde_json::Value;

use super::results::HorseId;

/// Color bound to a locked cup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Win color.
    pub const GOLD: Rgb = Rgb::new(255, 215, 0);
    /// Place color.
    pub const SILVER: Rgb = Rgb::new(192, 192, 192);
    /// Show color.
    pub const BRONZE: Rgb = Rgb::new(205, 127, 50);

    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Cup addressed by an unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CupTarget {
    /// A single cup.
    Cup(HorseId),
    /// Every cup on the board.
    All,
}

/// Animation started automatically once a timed sequence has run for `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub animation: String,
    pub delay: Duration,
}

/// Side effect on the physical board produced by a state transition.
///
/// Intents are dispatched once, in the order they were produced, after the
/// transition that produced them has been applied in memory.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Bind `cup` to `color` until it is unlocked.
    Lock { cup: HorseId, color: Rgb },
    /// Release one or all cups.
    Unlock(CupTarget),
    /// Start a named display sequence, cancelling any pending follow-up.
    Animation {
        name: String,
        params: Option<Value>,
        follow_up: Option<FollowUp>,
    },
}

impl Intent {
    /// Release every cup.
    pub fn unlock_all() -> Self {
        Intent::Unlock(CupTarget::All)
    }

    /// Start `name` without parameters or follow-up.
    pub fn animation(name: impl Into<String>) -> Self {
        Intent::Animation {
            name: name.into(),
            params: None,
            follow_up: None,
        }
    }

    /// Start `name` and schedule `follow_up` after it.
    pub fn timed_animation(name: impl Into<String>, follow_up: FollowUp) -> Self {
        Intent::Animation {
            name: name.into(),
            params: None,
            follow_up: Some(follow_up),
        }
    }

    /// Short label used in logs and notifications.
    pub fn describe(&self) -> String {
        match self {
            Intent::Lock { cup, .. } => format!("lock cup #{cup}"),
            Intent::Unlock(CupTarget::Cup(cup)) => format!("unlock cup #{cup}"),
            Intent::Unlock(CupTarget::All) => "unlock all cups".to_string(),
            Intent::Animation { name, .. } => format!("animation `{name}`"),
        }
    }
}
