//! Human input adapter.
//!
//! Input capture happens outside the engine; whatever captures keys or gamepad
//! buttons pushes [`InputCommand`]s through an [`InputHandle`]. The adapter
//! drains them at the next decision phase, so commands always land on a tick
//! boundary.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use bevy::math::Vec3;

use super::{DecisionMaker, Orders};
use crate::arena::abilities::AbilityId;
use crate::arena::combat_core::Match;
use crate::arena::unit::ActorId;

/// One player command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputCommand {
    UseAbility { ability: AbilityId, target: Option<ActorId> },
    MoveTo(Vec3),
    Stop,
    SetTarget(Option<ActorId>),
    Dodge(Vec3),
    CancelCast,
}

/// Shared command queue between an input source and the adapter.
#[derive(Clone, Debug, Default)]
pub struct InputHandle(Arc<Mutex<VecDeque<InputCommand>>>);

impl InputHandle {
    pub fn push(&self, command: InputCommand) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push_back(command);
    }

    pub fn pending(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn drain(&self) -> Vec<InputCommand> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).drain(..).collect()
    }
}

/// Decision maker that replays queued player commands.
#[derive(Debug)]
pub struct InputController {
    handle: InputHandle,
}

impl InputController {
    pub fn new() -> (Self, InputHandle) {
        let handle = InputHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

impl DecisionMaker for InputController {
    fn decide(&mut self, _world: &Match, orders: &mut Orders, _tick: u64) {
        for command in self.handle.drain() {
            match command {
                InputCommand::UseAbility { ability, target } => orders.queue_action(ability, target),
                InputCommand::MoveTo(destination) => orders.move_to(destination),
                InputCommand::Stop => orders.stop(),
                InputCommand::SetTarget(target) => orders.set_target(target),
                InputCommand::Dodge(direction) => orders.dodge(direction),
                InputCommand::CancelCast => orders.cancel_cast(),
            }
        }
    }
}
