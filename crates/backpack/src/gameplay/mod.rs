//! # Gameplay Adapter
//!
//! Routes gated player actions through the ledger.
//!
//! ```text
//! action ──▶ has(player, item)? ──yes──▶ consume + enhanced effect + cue
//!                    │
//!                    no
//!                    ▼
//!            StandardBehavior
//! ```
//!
//! The gate holds no state of its own; everything it decides comes from the
//! ledger at the tick it was built for.

use backpack_economy::catalog::{HERB, POTION, SHIELD, SWORD};
use backpack_economy::{ItemId, Ledger, Tick};

/// Invulnerability duration granted by the standard power-up, in tics.
pub const INVULN_TICS: u32 = 30 * 35;

/// Berserk strength duration added by an enhanced power-up, in tics.
pub const STRENGTH_TICS: u32 = 60 * 35;

/// Health ceiling for enhanced healing.
pub const ENHANCED_MAX_HEALTH: i32 = 200;

/// Melee damage count with a Sword.
pub const ENHANCED_MELEE_DAMAGE: u32 = 20;
/// Melee attack speed with a Sword.
pub const ENHANCED_MELEE_SPEED: u32 = 10;
/// Ranged damage count with a Shield.
pub const ENHANCED_RANGED_DAMAGE: u32 = 15;
/// Ranged attack speed with a Shield.
pub const ENHANCED_RANGED_SPEED: u32 = 12;

/// Timed player powers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PowerUp {
    /// God mode.
    Invulnerability = 0,
    /// Berserk.
    Strength = 1,
    /// Partial invisibility.
    Invisibility = 2,
    /// Radiation suit.
    IronFeet = 3,
    /// Computer map.
    AllMap = 4,
    /// Light amplification.
    Infrared = 5,
}

impl PowerUp {
    /// Number of power slots.
    pub const COUNT: usize = 6;

    /// Slot index in [`PlayerState::powers`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The parts of a player the adapter reads and writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    /// Ledger identity of the player.
    pub identity: String,
    /// Damage applied by the current attack.
    pub damage_count: u32,
    /// Tics between attacks.
    pub attack_speed: u32,
    /// Current health.
    pub health: i32,
    /// Remaining tics per power.
    pub powers: [u32; PowerUp::COUNT],
}

impl PlayerState {
    /// A fresh player at 100 health.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            damage_count: 10,
            attack_speed: 15,
            health: 100,
            powers: [0; PowerUp::COUNT],
        }
    }

    /// Remaining tics of `power`.
    #[inline]
    #[must_use]
    pub const fn power(&self, power: PowerUp) -> u32 {
        self.powers[power.index()]
    }
}

/// Mobj spawned as feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Blood splat.
    Blood,
    /// Megasphere flash.
    MegaHealth,
    /// Invulnerability sphere flash.
    Invulnerability,
}

/// Sound started as feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sound {
    /// Chainsaw rev.
    SawUp,
    /// Shotgun blast.
    Shotgun,
}

/// Presentation side effect of an enhanced action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Spawn an effect at the player.
    Spawn(Effect),
    /// Start a sound at the player.
    Sound(Sound),
}

/// Non-enhanced versions of every gated action.
pub trait StandardBehavior {
    /// Standard melee attack.
    fn fire_melee(&mut self, player: &mut PlayerState);

    /// Standard ranged attack.
    fn fire_ranged(&mut self, player: &mut PlayerState);

    /// Standard health pickup. Returns whether it was taken.
    fn give_health(&mut self, player: &mut PlayerState, amount: i32) -> bool;

    /// Standard power-up pickup. Returns whether it was taken.
    fn give_power(&mut self, player: &mut PlayerState, power: PowerUp) -> bool;
}

/// Receives the effects and sounds of enhanced actions.
pub trait Presentation {
    /// Plays `cue` for `player`.
    fn cue(&mut self, player: &PlayerState, cue: Cue);
}

/// What a gated action ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// An entitlement was spent on the enhanced effect.
    Enhanced,
    /// The standard behavior ran; `applied` is its own result.
    Standard {
        /// Whether the standard behavior took effect.
        applied: bool,
    },
}

impl Outcome {
    /// True if the action took effect either way.
    #[inline]
    #[must_use]
    pub const fn applied(self) -> bool {
        matches!(self, Self::Enhanced | Self::Standard { applied: true })
    }
}

/// One tick's view of the ledger for gated actions.
pub struct EntitlementGate<'a, S, P> {
    ledger: &'a mut Ledger,
    standard: &'a mut S,
    presentation: &'a mut P,
    now: Tick,
}

impl<'a, S: StandardBehavior, P: Presentation> EntitlementGate<'a, S, P> {
    /// Creates a gate over `ledger` at tick `now`.
    pub fn new(
        ledger: &'a mut Ledger,
        standard: &'a mut S,
        presentation: &'a mut P,
        now: Tick,
    ) -> Self {
        Self {
            ledger,
            standard,
            presentation,
            now,
        }
    }

    /// Melee attack, enhanced by a Sword.
    pub fn fire_melee(&mut self, player: &mut PlayerState) -> Outcome {
        if !self.redeem(player, SWORD) {
            self.standard.fire_melee(player);
            return Outcome::Standard { applied: true };
        }

        player.damage_count = ENHANCED_MELEE_DAMAGE;
        player.attack_speed = ENHANCED_MELEE_SPEED;
        self.presentation.cue(player, Cue::Spawn(Effect::Blood));
        self.presentation.cue(player, Cue::Sound(Sound::SawUp));
        Outcome::Enhanced
    }

    /// Ranged attack, enhanced by a Shield.
    pub fn fire_ranged(&mut self, player: &mut PlayerState) -> Outcome {
        if !self.redeem(player, SHIELD) {
            self.standard.fire_ranged(player);
            return Outcome::Standard { applied: true };
        }

        player.damage_count = ENHANCED_RANGED_DAMAGE;
        player.attack_speed = ENHANCED_RANGED_SPEED;
        self.presentation.cue(player, Cue::Spawn(Effect::Blood));
        self.presentation.cue(player, Cue::Sound(Sound::Shotgun));
        Outcome::Enhanced
    }

    /// Health pickup, doubled by a Herb up to [`ENHANCED_MAX_HEALTH`].
    pub fn give_health(&mut self, player: &mut PlayerState, amount: i32) -> Outcome {
        if !self.redeem(player, HERB) {
            let applied = self.standard.give_health(player, amount);
            return Outcome::Standard { applied };
        }

        player.health = player
            .health
            .saturating_add(amount.saturating_mul(2))
            .min(ENHANCED_MAX_HEALTH);
        self.presentation.cue(player, Cue::Spawn(Effect::MegaHealth));
        Outcome::Enhanced
    }

    /// Power-up pickup. A Potion doubles invulnerability and adds strength.
    ///
    /// Unlike the other gated actions, only [`PowerUp::Invulnerability`] is
    /// gated: every other power takes the standard path and the held Potion
    /// is not consumed, since it has no enhanced effect for that power.
    pub fn give_power(&mut self, player: &mut PlayerState, power: PowerUp) -> Outcome {
        if power != PowerUp::Invulnerability || !self.redeem(player, POTION) {
            let applied = self.standard.give_power(player, power);
            return Outcome::Standard { applied };
        }

        player.powers[PowerUp::Invulnerability.index()] = INVULN_TICS * 2;
        player.powers[PowerUp::Strength.index()] = STRENGTH_TICS;
        self.presentation
            .cue(player, Cue::Spawn(Effect::Invulnerability));
        Outcome::Enhanced
    }

    fn redeem(&mut self, player: &PlayerState, item_id: ItemId) -> bool {
        if !self.ledger.has(&player.identity, item_id, self.now) {
            return false;
        }
        self.ledger.consume(&player.identity, item_id, self.now)
    }
}
