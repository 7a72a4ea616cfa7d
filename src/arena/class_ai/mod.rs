//! Decision Makers
//!
//! Every combatant is driven by a [`DecisionMaker`]: the scripted controller,
//! the human input adapter or an idle dummy.
//!
//! ## Architecture
//!
//! Decisions work in two phases:
//! 1. **Observation**: the controller reads the match through a shared
//!    reference, usually wrapped in a [`CombatContext`]
//! 2. **Orders**: it writes what it wants into [`Orders`]; the match applies
//!    them before the action phase of the same tick
//!
//! Controllers never mutate the match directly, so every controller sees the
//! same state regardless of which one runs first.

pub mod input;
pub mod scripted;

use bevy::math::Vec3;

use super::abilities::AbilityId;
use super::auras::{AuraCategory, AuraId};
use super::combat_core::Match;
use super::crowd_control::DrCategory;
use super::match_config::ControllerKind;
use super::unit::{ActorId, Unit};

use input::{InputController, InputHandle};
use scripted::ScriptedController;

/// Anything that can drive a combatant.
pub trait DecisionMaker: Send + Sync {
    /// Called once per tick, before resolution, while the actor is alive.
    fn decide(&mut self, world: &Match, orders: &mut Orders, tick: u64);
}

/// Movement request for the coming movement phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveIntent {
    MoveTo(Vec3),
    Stop,
}

/// What a controller asked for this tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Orders {
    actor: ActorId,
    pub(crate) actions: Vec<(AbilityId, Option<ActorId>)>,
    pub(crate) move_intent: Option<MoveIntent>,
    /// `Some(None)` clears the selection
    pub(crate) target: Option<Option<ActorId>>,
    pub(crate) dodge: Option<Vec3>,
    pub(crate) cancel: bool,
}

impl Orders {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            actions: Vec::new(),
            move_intent: None,
            target: None,
            dodge: None,
            cancel: false,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn queue_action(&mut self, ability: AbilityId, target: Option<ActorId>) {
        self.actions.push((ability, target));
    }

    pub fn move_to(&mut self, destination: Vec3) {
        self.move_intent = Some(MoveIntent::MoveTo(destination));
    }

    pub fn stop(&mut self) {
        self.move_intent = Some(MoveIntent::Stop);
    }

    pub fn set_target(&mut self, target: Option<ActorId>) {
        self.target = Some(target);
    }

    pub fn dodge(&mut self, direction: Vec3) {
        self.dodge = Some(direction);
    }

    pub fn cancel_cast(&mut self) {
        self.cancel = true;
    }

    pub fn queued(&self) -> &[(AbilityId, Option<ActorId>)] {
        &self.actions
    }

    pub fn move_intent(&self) -> Option<MoveIntent> {
        self.move_intent
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
            && self.move_intent.is_none()
            && self.target.is_none()
            && self.dodge.is_none()
            && !self.cancel
    }
}

/// Read-only view of the match from one combatant's side.
#[derive(Clone, Copy)]
pub struct CombatContext<'a> {
    pub world: &'a Match,
    /// The combatant making the decision
    pub self_id: ActorId,
}

impl<'a> CombatContext<'a> {
    pub fn new(world: &'a Match, self_id: ActorId) -> Self {
        Self { world, self_id }
    }

    pub fn self_unit(&self) -> Option<&'a Unit> {
        self.world.unit(self.self_id)
    }

    /// The other combatant, whether or not it is targetable.
    pub fn enemy_unit(&self) -> Option<&'a Unit> {
        self.world.opponent_of(self.self_id)
    }

    /// Currently selected target (if any)
    pub fn target_unit(&self) -> Option<&'a Unit> {
        self.world.target_of(self.self_id).and_then(|t| self.world.unit(t))
    }

    /// Check if self has a specific aura
    pub fn has_aura(&self, aura: AuraId) -> bool {
        self.self_unit().is_some_and(|u| u.auras.has(aura))
    }

    /// Check if target has a specific aura
    pub fn target_has_aura(&self, aura: AuraId) -> bool {
        self.target_unit().is_some_and(|u| u.auras.has(aura))
    }

    /// Stunned, feared, polymorphed or otherwise unable to act.
    pub fn is_incapacitated(&self) -> bool {
        self.self_unit().is_some_and(|u| u.cc.prevents_action())
    }

    /// Check if an actor is currently under any crowd control that stops it
    /// acting or moving. Used to avoid overlapping CC.
    pub fn is_ccd(&self, actor: ActorId) -> bool {
        self.world
            .unit(actor)
            .is_some_and(|u| u.cc.prevents_action() || u.cc.prevents_movement())
    }

    pub fn target_is_immune(&self) -> bool {
        self.target_unit().is_some_and(Unit::is_cc_immune)
    }

    /// Check if an actor is DR-immune to a CC category right now.
    pub fn is_dr_immune(&self, actor: ActorId, category: DrCategory) -> bool {
        self.world
            .unit(actor)
            .is_some_and(|u| u.cc.dr.is_immune(category, self.world.current_tick()))
    }

    pub fn distance_to_target(&self) -> Option<f32> {
        Some(self.self_unit()?.distance_to(self.target_unit()?))
    }

    pub fn has_line_of_sight_to_target(&self) -> bool {
        match (self.self_unit(), self.target_unit()) {
            (Some(me), Some(target)) => self.world.layout().has_line_of_sight(me.position, target.position),
            _ => false,
        }
    }
}

/// Calculate dispel priority for a debuff.
/// Higher values = more urgent to dispel.
pub fn dispel_priority(aura: AuraId) -> i32 {
    match aura {
        AuraId::MortalWound => 70, // Healing reduction
        AuraId::Agony | AuraId::Corruption | AuraId::Rupture => 50,
        AuraId::Exposed => 40,
        AuraId::Chilled | AuraId::Hamstring | AuraId::DodgeSlow => 20, // Minor
        _ => 0,
    }
}

/// Highest dispel priority among the dispellable debuffs on `unit`.
pub fn most_urgent_debuff(unit: &Unit) -> Option<(AuraId, i32)> {
    unit.auras
        .iter()
        .filter(|a| a.spec.category == AuraCategory::Debuff && a.spec.dispellable)
        .map(|a| (a.id(), dispel_priority(a.id())))
        .filter(|(_, priority)| *priority > 0)
        .max_by_key(|(_, priority)| *priority)
}

/// Never acts. Used for training dummies and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleController;

impl DecisionMaker for IdleController {
    fn decide(&mut self, _world: &Match, _orders: &mut Orders, _tick: u64) {}
}

/// Build the controller a setup asks for. Human slots also return the handle
/// commands are pushed through.
pub fn controller_for(kind: ControllerKind, actor: ActorId) -> (Box<dyn DecisionMaker>, Option<InputHandle>) {
    match kind {
        ControllerKind::Scripted { difficulty } => (Box::new(ScriptedController::new(actor, difficulty)), None),
        ControllerKind::Human => {
            let (controller, handle) = InputController::new();
            (Box::new(controller), Some(handle))
        }
        ControllerKind::Idle => (Box::new(IdleController), None),
    }
}
