//! Static tower, enemy and branch tables together with stat composition.

use serde::{Deserialize, Serialize};

use crate::{Rgb, MAX_TOWER_LEVEL};

/// Enumerates the tower archetypes available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TowerKind {
    /// Fast single-target tower that sets targets on fire.
    Pulse,
    /// Weak tower that slows what it hits.
    Snare,
    /// Heavy tower whose hits chain to nearby enemies and stun the target.
    Arc,
}

impl TowerKind {
    /// Every tower kind in display order.
    pub const ALL: [TowerKind; 3] = [TowerKind::Pulse, TowerKind::Snare, TowerKind::Arc];

    /// Stable lowercase identifier used in persisted data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pulse => "pulse",
            Self::Snare => "snare",
            Self::Arc => "arc",
        }
    }

    /// Static configuration of the tower kind.
    #[must_use]
    pub const fn profile(self) -> &'static TowerProfile {
        match self {
            Self::Pulse => &PULSE,
            Self::Snare => &SNARE,
            Self::Arc => &ARC,
        }
    }

    /// The two mutually exclusive branches offered at the first upgrade.
    #[must_use]
    pub const fn branches(self) -> [BranchId; 2] {
        match self {
            Self::Pulse => [BranchId::Inferno, BranchId::Overclock],
            Self::Snare => [BranchId::Cryo, BranchId::Tether],
            Self::Arc => [BranchId::Storm, BranchId::Emp],
        }
    }
}

/// Static configuration describing a tower kind at level 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerProfile {
    /// Human readable name.
    pub label: &'static str,
    /// Purchase cost in credits.
    pub cost: u32,
    /// Base attack radius in world units.
    pub range: f32,
    /// Base damage per hit.
    pub damage: f32,
    /// Base seconds between shots.
    pub cooldown: f32,
    /// Movement multiplier applied to hit enemies.
    pub slow_factor: Option<f32>,
    /// Seconds the slow lasts.
    pub slow_time: f32,
    /// Burn damage per second applied to hit enemies.
    pub burn_dps: f32,
    /// Seconds the burn lasts.
    pub burn_time: f32,
    /// Number of additional enemies a hit jumps to.
    pub chain_count: u32,
    /// Radius around the primary target searched for chain victims.
    pub chain_range: f32,
    /// Fraction of the hit damage dealt to chain victims.
    pub chain_falloff: f32,
    /// Seconds the primary target is stunned.
    pub emp_time: f32,
    /// Colour used for the tower and its shots.
    pub color: Rgb,
}

const PULSE: TowerProfile = TowerProfile {
    label: "Pulse",
    cost: 70,
    range: 95.0,
    damage: 10.0,
    cooldown: 0.55,
    slow_factor: None,
    slow_time: 0.0,
    burn_dps: 6.0,
    burn_time: 2.2,
    chain_count: 0,
    chain_range: 0.0,
    chain_falloff: 0.0,
    emp_time: 0.0,
    color: Rgb::from_rgb(0x00, 0xff, 0x99),
};

const SNARE: TowerProfile = TowerProfile {
    label: "Snare",
    cost: 90,
    range: 80.0,
    damage: 6.0,
    cooldown: 0.85,
    slow_factor: Some(0.5),
    slow_time: 1.2,
    burn_dps: 0.0,
    burn_time: 0.0,
    chain_count: 0,
    chain_range: 0.0,
    chain_falloff: 0.0,
    emp_time: 0.0,
    color: Rgb::from_rgb(0x00, 0xcc, 0x55),
};

const ARC: TowerProfile = TowerProfile {
    label: "Arc",
    cost: 120,
    range: 120.0,
    damage: 18.0,
    cooldown: 1.15,
    slow_factor: None,
    slow_time: 0.0,
    burn_dps: 0.0,
    burn_time: 0.0,
    chain_count: 2,
    chain_range: 70.0,
    chain_falloff: 0.65,
    emp_time: 0.35,
    color: Rgb::from_rgb(0x66, 0xff, 0xcc),
};

/// Enumerates the enemy archetypes that waves are composed of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Baseline walker.
    Basic,
    /// Quick and fragile.
    Fast,
    /// Slow and armored.
    Tank,
    /// Armored walker that periodically raises a shield.
    Shield,
    /// Very fast, very fragile.
    Swarm,
    /// Heals over time.
    Regen,
    /// Appears every fifth wave, spawns minions and shields itself.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in display order.
    pub const ALL: [EnemyKind; 7] = [
        EnemyKind::Basic,
        EnemyKind::Fast,
        EnemyKind::Tank,
        EnemyKind::Shield,
        EnemyKind::Swarm,
        EnemyKind::Regen,
        EnemyKind::Boss,
    ];

    /// Stable lowercase identifier used in persisted data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Fast => "fast",
            Self::Tank => "tank",
            Self::Shield => "shield",
            Self::Swarm => "swarm",
            Self::Regen => "regen",
            Self::Boss => "boss",
        }
    }

    /// Static configuration of the enemy kind.
    #[must_use]
    pub const fn profile(self) -> &'static EnemyProfile {
        match self {
            Self::Basic => &BASIC,
            Self::Fast => &FAST,
            Self::Tank => &TANK,
            Self::Shield => &SHIELD,
            Self::Swarm => &SWARM,
            Self::Regen => &REGEN,
            Self::Boss => &BOSS,
        }
    }
}

/// Periodic damage-reduction shield carried by some enemy kinds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShieldCycle {
    /// Seconds between the end of one shield and the next raise.
    pub interval: f32,
    /// Seconds the shield stays up.
    pub duration: f32,
}

/// Periodic minion release carried by the boss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinionCycle {
    /// Seconds between two releases.
    pub interval: f32,
    /// Kind of enemy released.
    pub kind: EnemyKind,
}

/// Static configuration describing an enemy kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    /// Human readable name.
    pub label: &'static str,
    /// Hit points at spawn.
    pub hp: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Credits granted on kill.
    pub reward: u32,
    /// Fraction of incoming damage absorbed, in `[0, 1)`.
    pub armor: f32,
    /// Hit points restored per second.
    pub regen: f32,
    /// Periodic shield, if any.
    pub shield: Option<ShieldCycle>,
    /// Periodic minion release, if any.
    pub minions: Option<MinionCycle>,
    /// Colour used when drawing the enemy.
    pub color: Rgb,
}

const fn enemy(label: &'static str, hp: f32, speed: f32, reward: u32, color: Rgb) -> EnemyProfile {
    EnemyProfile {
        label,
        hp,
        speed,
        reward,
        armor: 0.0,
        regen: 0.0,
        shield: None,
        minions: None,
        color,
    }
}

const BASIC: EnemyProfile = enemy("Basic", 40.0, 55.0, 10, Rgb::from_rgb(0x00, 0xff, 0x66));
const FAST: EnemyProfile = enemy("Fast", 26.0, 85.0, 9, Rgb::from_rgb(0x66, 0xff, 0x99));
const TANK: EnemyProfile = EnemyProfile {
    armor: 0.2,
    ..enemy("Tank", 90.0, 38.0, 16, Rgb::from_rgb(0x00, 0xcc, 0x55))
};
const SHIELD: EnemyProfile = EnemyProfile {
    armor: 0.35,
    shield: Some(ShieldCycle {
        interval: 4.0,
        duration: 1.5,
    }),
    ..enemy("Shield", 60.0, 46.0, 13, Rgb::from_rgb(0x33, 0xff, 0xcc))
};
const SWARM: EnemyProfile = enemy("Swarm", 18.0, 95.0, 6, Rgb::from_rgb(0x00, 0xff, 0xcc));
const REGEN: EnemyProfile = EnemyProfile {
    regen: 6.0,
    ..enemy("Regen", 70.0, 42.0, 14, Rgb::from_rgb(0x5b, 0xff, 0xb3))
};
const BOSS: EnemyProfile = EnemyProfile {
    armor: 0.25,
    shield: Some(ShieldCycle {
        interval: 5.0,
        duration: 1.5,
    }),
    minions: Some(MinionCycle {
        interval: 4.0,
        kind: EnemyKind::Swarm,
    }),
    ..enemy("Boss", 260.0, 30.0, 40, Rgb::from_rgb(0xb6, 0xff, 0xea))
};

/// Identifies a specialisation branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchId {
    /// Pulse: stronger and longer burns.
    Inferno,
    /// Pulse: faster firing with some armor pierce.
    Overclock,
    /// Snare: deeper slows.
    Cryo,
    /// Snare: heavier, piercing hits.
    Tether,
    /// Arc: more and better chain jumps.
    Storm,
    /// Arc: longer stuns.
    Emp,
}

impl BranchId {
    /// Every branch in display order.
    pub const ALL: [BranchId; 6] = [
        BranchId::Inferno,
        BranchId::Overclock,
        BranchId::Cryo,
        BranchId::Tether,
        BranchId::Storm,
        BranchId::Emp,
    ];

    /// Stable lowercase identifier used in persisted data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inferno => "inferno",
            Self::Overclock => "overclock",
            Self::Cryo => "cryo",
            Self::Tether => "tether",
            Self::Storm => "storm",
            Self::Emp => "emp",
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inferno => "Inferno",
            Self::Overclock => "Overclock",
            Self::Cryo => "Cryo",
            Self::Tether => "Tether",
            Self::Storm => "Storm",
            Self::Emp => "EMP",
        }
    }

    /// Tower kind that offers the branch.
    #[must_use]
    pub const fn tower(self) -> TowerKind {
        match self {
            Self::Inferno | Self::Overclock => TowerKind::Pulse,
            Self::Cryo | Self::Tether => TowerKind::Snare,
            Self::Storm | Self::Emp => TowerKind::Arc,
        }
    }

    /// Modifiers of the given tier; tier 1 applies from level 2, tier 2 from level 3.
    #[must_use]
    pub const fn tier(self, tier: u8) -> BranchModifiers {
        let id = BranchModifiers::IDENTITY;
        match (self, tier) {
            (Self::Inferno, 1) => BranchModifiers {
                burn_dps_add: 4.0,
                burn_time_mul: 1.25,
                ..id
            },
            (Self::Inferno, 2) => BranchModifiers {
                burn_dps_add: 6.0,
                burn_time_mul: 1.2,
                damage_mul: 1.1,
                ..id
            },
            (Self::Overclock, 1) => BranchModifiers {
                cooldown_mul: 0.8,
                damage_mul: 1.1,
                ..id
            },
            (Self::Overclock, 2) => BranchModifiers {
                cooldown_mul: 0.85,
                range_mul: 1.1,
                pierce_add: 0.1,
                ..id
            },
            (Self::Cryo, 1) => BranchModifiers {
                slow_set: Some(0.35),
                ..id
            },
            (Self::Cryo, 2) => BranchModifiers {
                slow_set: Some(0.25),
                range_mul: 1.1,
                ..id
            },
            (Self::Tether, 1) => BranchModifiers {
                damage_mul: 1.3,
                pierce_add: 0.15,
                ..id
            },
            (Self::Tether, 2) => BranchModifiers {
                damage_mul: 1.3,
                pierce_add: 0.1,
                range_mul: 1.1,
                ..id
            },
            (Self::Storm, 1) => BranchModifiers {
                chain_add: 1,
                chain_range_add: 15.0,
                ..id
            },
            (Self::Storm, 2) => BranchModifiers {
                chain_add: 1,
                falloff_max: Some(0.8),
                ..id
            },
            (Self::Emp, 1) => BranchModifiers {
                emp_add: 0.25,
                ..id
            },
            (Self::Emp, 2) => BranchModifiers {
                emp_add: 0.35,
                cooldown_mul: 0.9,
                ..id
            },
            _ => id,
        }
    }
}

/// Stat modifiers contributed by one branch tier.
///
/// Range, damage, cooldown and burn duration compose multiplicatively. Burn
/// damage, chain count, chain range, stun time and pierce compose additively.
/// Chain falloff takes the maximum and the slow factor is set outright.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchModifiers {
    /// Range multiplier.
    pub range_mul: f32,
    /// Damage multiplier.
    pub damage_mul: f32,
    /// Cooldown multiplier.
    pub cooldown_mul: f32,
    /// Burn duration multiplier.
    pub burn_time_mul: f32,
    /// Burn damage per second added.
    pub burn_dps_add: f32,
    /// Chain jumps added.
    pub chain_add: u32,
    /// Chain radius added.
    pub chain_range_add: f32,
    /// Stun seconds added.
    pub emp_add: f32,
    /// Armor pierce added.
    pub pierce_add: f32,
    /// Lower bound raised onto the chain falloff.
    pub falloff_max: Option<f32>,
    /// Slow factor replacing the current one.
    pub slow_set: Option<f32>,
}

impl BranchModifiers {
    /// Modifiers that leave every stat untouched.
    pub const IDENTITY: BranchModifiers = BranchModifiers {
        range_mul: 1.0,
        damage_mul: 1.0,
        cooldown_mul: 1.0,
        burn_time_mul: 1.0,
        burn_dps_add: 0.0,
        chain_add: 0,
        chain_range_add: 0.0,
        emp_add: 0.0,
        pierce_add: 0.0,
        falloff_max: None,
        slow_set: None,
    };

    fn apply(&self, stats: &mut TowerStats) {
        stats.range *= self.range_mul;
        stats.damage *= self.damage_mul;
        stats.cooldown *= self.cooldown_mul;
        stats.burn_time *= self.burn_time_mul;
        stats.burn_dps += self.burn_dps_add;
        stats.chain_count += self.chain_add;
        stats.chain_range += self.chain_range_add;
        stats.emp_time += self.emp_add;
        stats.armor_pierce += self.pierce_add;
        if let Some(falloff) = self.falloff_max {
            stats.chain_falloff = stats.chain_falloff.max(falloff);
        }
        if let Some(slow) = self.slow_set {
            stats.slow_factor = Some(slow);
        }
    }
}

/// Range, damage and cooldown multipliers indexed by `level - 1`.
const LEVEL_MULTIPLIERS: [(f32, f32, f32); 3] = [(1.0, 1.0, 1.0), (1.2, 1.4, 0.85), (1.45, 1.8, 0.72)];

/// Effective stats of a tower for its kind, level and branch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerStats {
    /// Attack radius.
    pub range: f32,
    /// Damage per hit.
    pub damage: f32,
    /// Seconds between shots.
    pub cooldown: f32,
    /// Armor fraction ignored by hits.
    pub armor_pierce: f32,
    /// Movement multiplier applied to the primary target.
    pub slow_factor: Option<f32>,
    /// Seconds the slow lasts.
    pub slow_time: f32,
    /// Burn damage per second.
    pub burn_dps: f32,
    /// Seconds the burn lasts.
    pub burn_time: f32,
    /// Additional enemies hit per volley.
    pub chain_count: u32,
    /// Chain search radius around the primary target.
    pub chain_range: f32,
    /// Damage fraction dealt to chain victims.
    pub chain_falloff: f32,
    /// Seconds the primary target is stunned.
    pub emp_time: f32,
}

impl TowerStats {
    /// Computes effective stats. Levels outside `1..=3` are clamped and a
    /// branch that belongs to another tower kind is ignored.
    #[must_use]
    pub fn resolve(kind: TowerKind, level: u8, branch: Option<BranchId>) -> Self {
        let profile = kind.profile();
        let level = level.clamp(1, MAX_TOWER_LEVEL);
        let (range_mul, damage_mul, cooldown_mul) = LEVEL_MULTIPLIERS[usize::from(level - 1)];
        let mut stats = Self {
            range: profile.range * range_mul,
            damage: profile.damage * damage_mul,
            cooldown: profile.cooldown * cooldown_mul,
            armor_pierce: 0.0,
            slow_factor: profile.slow_factor,
            slow_time: profile.slow_time,
            burn_dps: profile.burn_dps,
            burn_time: profile.burn_time,
            chain_count: profile.chain_count,
            chain_range: profile.chain_range,
            chain_falloff: profile.chain_falloff,
            emp_time: profile.emp_time,
        };

        if let Some(branch) = branch.filter(|branch| branch.tower() == kind) {
            for tier in 1..level {
                branch.tier(tier).apply(&mut stats);
            }
        }

        stats
    }
}

/// Cost of raising a tower from `level` to `level + 1`, or `None` at max level.
///
/// The price is 80% of the base cost times the level being bought, rounded
/// down.
#[must_use]
pub fn upgrade_cost(kind: TowerKind, level: u8) -> Option<u32> {
    if level >= MAX_TOWER_LEVEL {
        return None;
    }
    let next = u32::from(level.max(1)) + 1;
    Some(kind.profile().cost * next * 4 / 5)
}

/// Credits refunded when selling a tower of the given level.
#[must_use]
pub fn sell_refund(kind: TowerKind, level: u8) -> u32 {
    kind.profile().cost * (50 + 15 * u32::from(level)) / 100
}
