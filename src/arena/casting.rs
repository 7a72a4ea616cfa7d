//! Cast and channel state machine.
//!
//! A unit is idle, casting, or channeling. Casts complete on a fixed tick
//! computed from the haste-scaled cast time and can be pushed back by
//! physical hits. Channels tick at a fixed interval until their duration runs
//! out.

use super::abilities::{AbilityId, SpellSchool};
use super::constants::{CHANNEL_TICK_INTERVAL, MAX_PUSHBACKS, PUSHBACK_TICKS};
use super::unit::ActorId;

/// Effective cast ticks for a base cast time: `max(1, round(base / haste))`.
pub fn effective_cast_ticks(base_ticks: u64, haste: f32) -> u64 {
    let haste = if haste > 0.0 { haste } else { 1.0 };
    ((base_ticks as f32 / haste).round() as u64).max(1)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastState {
    pub ability: AbilityId,
    pub target: ActorId,
    pub school: SpellSchool,
    pub started_at: u64,
    pub completes_at: u64,
    pub pushbacks: u8,
    pub uninterruptible: bool,
    pub castable_while_moving: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelState {
    pub ability: AbilityId,
    pub target: ActorId,
    pub school: SpellSchool,
    pub started_at: u64,
    pub ends_at: u64,
    pub next_tick_at: u64,
    pub ticks_done: u32,
    pub uninterruptible: bool,
    pub castable_while_moving: bool,
}

/// What a unit is doing with its cast bar.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CastSlot {
    #[default]
    Idle,
    Casting(CastState),
    Channeling(ChannelState),
}

/// Progress reported by [`CastSlot::poll`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CastPoll {
    pub cast_completed: Option<CastState>,
    /// Channel tick that fired this step, with its 1-based index
    pub channel_tick: Option<(ChannelState, u32)>,
    pub channel_completed: Option<ChannelState>,
}

impl CastSlot {
    pub fn is_idle(&self) -> bool {
        matches!(self, CastSlot::Idle)
    }

    pub fn is_casting(&self) -> bool {
        matches!(self, CastSlot::Casting(_))
    }

    pub fn is_channeling(&self) -> bool {
        matches!(self, CastSlot::Channeling(_))
    }

    pub fn ability(&self) -> Option<AbilityId> {
        match self {
            CastSlot::Idle => None,
            CastSlot::Casting(c) => Some(c.ability),
            CastSlot::Channeling(c) => Some(c.ability),
        }
    }

    pub fn school(&self) -> Option<SpellSchool> {
        match self {
            CastSlot::Idle => None,
            CastSlot::Casting(c) => Some(c.school),
            CastSlot::Channeling(c) => Some(c.school),
        }
    }

    pub fn is_interruptible(&self) -> bool {
        match self {
            CastSlot::Idle => false,
            CastSlot::Casting(c) => !c.uninterruptible,
            CastSlot::Channeling(c) => !c.uninterruptible,
        }
    }

    /// Whether moving would cancel what is in progress.
    pub fn blocks_movement(&self) -> bool {
        match self {
            CastSlot::Idle => false,
            CastSlot::Casting(c) => !c.castable_while_moving,
            CastSlot::Channeling(c) => !c.castable_while_moving,
        }
    }

    /// Delay the current cast by one pushback step. Channels and
    /// uninterruptible casts are unaffected, as is a cast already pushed back
    /// the maximum number of times.
    pub fn apply_pushback(&mut self) -> bool {
        match self {
            CastSlot::Casting(cast) if !cast.uninterruptible && cast.pushbacks < MAX_PUSHBACKS => {
                cast.pushbacks += 1;
                cast.completes_at += PUSHBACK_TICKS;
                true
            }
            _ => false,
        }
    }

    /// Stop whatever is in progress and return it.
    pub fn cancel(&mut self) -> CastSlot {
        std::mem::take(self)
    }

    /// Advance to `now`. A channel's final tick and its completion are
    /// reported on the same step.
    pub fn poll(&mut self, now: u64) -> CastPoll {
        let mut poll = CastPoll::default();
        match self {
            CastSlot::Idle => {}
            CastSlot::Casting(cast) => {
                if now >= cast.completes_at {
                    poll.cast_completed = Some(*cast);
                    *self = CastSlot::Idle;
                }
            }
            CastSlot::Channeling(channel) => {
                if now >= channel.next_tick_at && channel.next_tick_at <= channel.ends_at {
                    channel.ticks_done += 1;
                    channel.next_tick_at += CHANNEL_TICK_INTERVAL;
                    poll.channel_tick = Some((*channel, channel.ticks_done));
                }
                if now >= channel.ends_at {
                    poll.channel_completed = Some(*channel);
                    *self = CastSlot::Idle;
                }
            }
        }
        poll
    }
}
