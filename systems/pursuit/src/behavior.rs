//! Enemy behaviour state machine expressed as static transition tables.

use veiled_hollow_core::MovementProfile;

use BehaviorState::{Attack, Dead, Dying, Hurt, Idle, Pursue, Retreat, Waiting};
use Guard::{
    AnimationFinished, Damaged, HealthDepleted, TargetInAttackRange, TargetInNoticeRange,
    TargetOutOfAttackRange, TargetOutOfNoticeRange,
};

/// Behaviour state of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BehaviorState {
    /// Standing still, or emerged and waiting to burrow for stationary kinds.
    Idle,
    /// Walking toward the target along the planned path.
    Pursue,
    /// Playing the attack animation.
    Attack,
    /// Recoiling from a hit.
    Hurt,
    /// Burrowed underground until the target comes close.
    Waiting,
    /// Burrowing back underground.
    Retreat,
    /// Playing the death animation.
    Dying,
    /// Finished dying; produces no more intents.
    Dead,
}

impl BehaviorState {
    /// Reports whether the enemy can still act.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        !matches!(self, Self::Dying | Self::Dead)
    }
}

/// Condition that must hold for a transition to fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Guard {
    /// Target within attack radius and the attack cooldown has elapsed.
    TargetInAttackRange,
    /// Target within notice radius.
    TargetInNoticeRange,
    /// Target beyond notice radius.
    TargetOutOfNoticeRange,
    /// Target beyond attack radius.
    TargetOutOfAttackRange,
    /// The current state's animation has played through.
    AnimationFinished,
    /// The enemy was hit since the previous update.
    Damaged,
    /// The enemy has no health left.
    HealthDepleted,
}

/// One edge of the behaviour state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// State the transition leaves.
    pub from: BehaviorState,
    /// State the transition enters.
    pub to: BehaviorState,
    /// Condition required to fire.
    pub guard: Guard,
}

const fn edge(from: BehaviorState, to: BehaviorState, guard: Guard) -> Transition {
    Transition { from, to, guard }
}

/// Transitions for enemies that walk toward their target, in priority order.
pub const MOBILE_TRANSITIONS: &[Transition] = &[
    edge(Idle, Dying, HealthDepleted),
    edge(Pursue, Dying, HealthDepleted),
    edge(Attack, Dying, HealthDepleted),
    edge(Hurt, Dying, HealthDepleted),
    edge(Idle, Hurt, Damaged),
    edge(Pursue, Hurt, Damaged),
    edge(Attack, Hurt, Damaged),
    edge(Hurt, Idle, AnimationFinished),
    edge(Idle, Attack, TargetInAttackRange),
    edge(Pursue, Attack, TargetInAttackRange),
    edge(Idle, Pursue, TargetInNoticeRange),
    edge(Pursue, Idle, TargetOutOfNoticeRange),
    edge(Attack, Idle, AnimationFinished),
    edge(Dying, Dead, AnimationFinished),
];

/// Transitions for burrowing enemies that never leave their cell, in priority order.
pub const STATIONARY_TRANSITIONS: &[Transition] = &[
    edge(Idle, Dying, HealthDepleted),
    edge(Attack, Dying, HealthDepleted),
    edge(Hurt, Dying, HealthDepleted),
    edge(Waiting, Dying, HealthDepleted),
    edge(Retreat, Dying, HealthDepleted),
    edge(Idle, Hurt, Damaged),
    edge(Attack, Hurt, Damaged),
    edge(Waiting, Hurt, Damaged),
    edge(Retreat, Hurt, Damaged),
    edge(Hurt, Idle, AnimationFinished),
    edge(Waiting, Attack, TargetInAttackRange),
    edge(Idle, Attack, TargetInAttackRange),
    edge(Attack, Idle, AnimationFinished),
    edge(Idle, Retreat, TargetOutOfAttackRange),
    edge(Retreat, Waiting, AnimationFinished),
    edge(Dying, Dead, AnimationFinished),
];

/// Transition table for the movement profile.
#[must_use]
pub fn transitions(profile: MovementProfile) -> &'static [Transition] {
    match profile {
        MovementProfile::Mobile => MOBILE_TRANSITIONS,
        MovementProfile::Stationary => STATIONARY_TRANSITIONS,
    }
}

/// Snapshot of everything the guards inspect for one enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Conditions {
    /// Distance between the enemy and its target, in world units.
    pub target_distance: f32,
    /// Attack radius of the enemy kind.
    pub attack_radius: f32,
    /// Notice radius of the enemy kind.
    pub notice_radius: f32,
    /// Whether the attack cooldown has elapsed.
    pub attack_ready: bool,
    /// Whether the current state's animation has played through.
    pub animation_finished: bool,
    /// Whether the enemy was hit since the previous update.
    pub damaged: bool,
    /// Whether the enemy has no health left.
    pub health_depleted: bool,
}

impl Conditions {
    /// Evaluates a guard against the snapshot.
    #[must_use]
    pub fn holds(&self, guard: Guard) -> bool {
        match guard {
            Guard::TargetInAttackRange => {
                self.attack_ready && self.target_distance <= self.attack_radius
            }
            Guard::TargetInNoticeRange => self.target_distance <= self.notice_radius,
            Guard::TargetOutOfNoticeRange => self.target_distance > self.notice_radius,
            Guard::TargetOutOfAttackRange => self.target_distance > self.attack_radius,
            Guard::AnimationFinished => self.animation_finished,
            Guard::Damaged => self.damaged,
            Guard::HealthDepleted => self.health_depleted,
        }
    }
}

/// First transition out of `state` whose guard holds, if any.
#[must_use]
pub fn next_state(
    table: &[Transition],
    state: BehaviorState,
    conditions: &Conditions,
) -> Option<BehaviorState> {
    table
        .iter()
        .find(|transition| transition.from == state && conditions.holds(transition.guard))
        .map(|transition| transition.to)
}
