//! Creature tuning with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every struct deserializes from
//! TOML with per-field defaults, so a bestiary file only needs to name the
//! values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{BeastError, Result};
use crate::core::types::{BehaviorClass, EntityTag};

/// Tuning shared by every agent's base state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    // === MOVEMENT ===
    /// Forward speed while engaging (world units per second)
    pub move_speed: f32,

    /// Maximum yaw change per second, in degrees
    ///
    /// Only affects facing. Displacement always follows the desired heading,
    /// so a slow turner still backs away correctly while facing its target.
    pub turn_speed_deg: f32,

    /// Extra distance added to the forward obstacle probe
    pub obstacle_probe_margin: f32,

    /// Angular step between candidate headings when the way ahead is blocked
    ///
    /// Candidates alternate left/right (+30, -30, +60, -60 ...) up to 180.
    pub avoidance_step_deg: f32,

    /// How long a found detour heading is followed before re-steering
    pub detour_duration: f32,

    /// Height of the eyes above the body origin, used for sight and probes
    pub eye_height: f32,

    // === PERCEPTION ===
    /// Radius of the periodic perception sweep
    pub detection_radius: f32,

    /// Seconds between perception sweeps
    ///
    /// The engaged target is still re-validated every tick; this only
    /// throttles the radius query used to discover new targets.
    pub perception_interval: f32,

    /// Species this agent hunts and flees from
    pub target_tag: EntityTag,

    // === COMBAT ===
    /// Distance to the target at which strikes are attempted
    pub attack_range: f32,

    /// Health percentage (0-100) at or below which the agent flees
    pub flee_health_threshold: f32,

    /// Hard cap on any special-action session, enforced by the tick loop
    ///
    /// Must exceed the longest legitimate session of the archetype; sessions
    /// that run past it are force-cancelled and logged as stuck.
    pub special_action_watchdog: f32,

    pub wander: WanderConfig,
    pub flee: FleeConfig,
    pub strike: StrikeConfig,
    pub combo: ComboConfig,
    pub tactics: TacticsConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.5,
            turn_speed_deg: 540.0,
            obstacle_probe_margin: 0.4,
            avoidance_step_deg: 30.0,
            detour_duration: 0.4,
            eye_height: 0.6,
            detection_radius: 12.0,
            perception_interval: 0.2,
            target_tag: EntityTag::Player,
            attack_range: 1.5,
            flee_health_threshold: 20.0,
            special_action_watchdog: 8.0,
            wander: WanderConfig::default(),
            flee: FleeConfig::default(),
            strike: StrikeConfig::default(),
            combo: ComboConfig::default(),
            tactics: TacticsConfig::default(),
        }
    }
}

/// Passive wandering around the home point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Destinations are drawn inside this radius around home
    pub radius: f32,
    /// Distance at which a destination counts as reached
    pub arrival_tolerance: f32,
    /// Give up on a destination after walking this long
    pub max_walk_duration: f32,
    pub wait_min: f32,
    pub wait_max: f32,
    /// Height above home from which the downward surface probe starts
    pub probe_height: f32,
    /// Destination draws before settling for home
    pub max_attempts: u32,
    /// Fraction of `move_speed` used while wandering
    pub speed_multiplier: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            radius: 8.0,
            arrival_tolerance: 0.5,
            max_walk_duration: 6.0,
            wait_min: 1.0,
            wait_max: 3.0,
            probe_height: 4.0,
            max_attempts: 6,
            speed_multiplier: 0.5,
        }
    }
}

/// Retreat behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleeConfig {
    /// Distance of the retreat point from the agent
    pub retreat_distance: f32,
    /// Randomized rotation range applied when the retreat path is blocked
    pub min_turn_deg: f32,
    pub max_turn_deg: f32,
    /// Rotations tried before running at the blocked point anyway
    pub max_attempts: u32,
    /// Fraction of `move_speed` used while fleeing
    pub speed_multiplier: f32,
    /// Fleeing ends once health exceeds threshold times this factor
    ///
    /// At 1.5 with a 20% threshold the agent returns to passive at 30%.
    /// The gap prevents flickering between fleeing and fighting.
    pub recovery_factor: f32,
}

impl Default for FleeConfig {
    fn default() -> Self {
        Self {
            retreat_distance: 8.0,
            min_turn_deg: 30.0,
            max_turn_deg: 90.0,
            max_attempts: 4,
            speed_multiplier: 1.25,
            recovery_factor: 1.5,
        }
    }
}

/// Single melee strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrikeConfig {
    pub damage: f32,
    /// Seconds between strike attempts
    pub cooldown: f32,
    /// Delay between starting the swing and applying damage
    ///
    /// Matches the attack animation budget. Zero resolves the strike in the
    /// tick it starts.
    pub windup: f32,
    /// Knockback impulse magnitude along attacker -> target
    pub knockback_force: f32,
    /// Minimum upward component of the knockback impulse
    pub knockback_min_upward: f32,
}

impl Default for StrikeConfig {
    fn default() -> Self {
        Self {
            damage: 10.0,
            cooldown: 1.2,
            windup: 0.3,
            knockback_force: 4.0,
            knockback_min_upward: 2.0,
        }
    }
}

/// Combo chaining of consecutive strikes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    pub enabled: bool,
    /// A strike within this many seconds of the previous one extends the chain
    pub window: f32,
    /// Chain length at which the counter wraps back to zero
    pub max_hits: u32,
    /// Cooldown multiplier after a chain extension below the cap
    pub cooldown_factor: f32,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window: 1.5,
            max_hits: 3,
            cooldown_factor: 0.5,
        }
    }
}

/// Crowd dispersion around a shared target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticsConfig {
    /// Stand-off radius with a single crowding neighbor
    pub offset_radius: f32,
    /// Neighbor search radius as a multiple of `attack_range`
    pub neighbor_radius_factor: f32,
    /// Spread growth per same-class neighbor for melee agents
    pub melee_spread: f32,
    /// Spread growth per same-class neighbor for jumping agents
    pub jump_spread: f32,
    /// Evenly spaced fallback headings tried when the offset point is blocked
    pub fallback_directions: u32,
    /// Stand-off radius cap as a fraction of `attack_range`
    ///
    /// Keeps the stand-off point inside striking distance, so a crowded
    /// agent still reaches its target.
    pub max_range_fraction: f32,
}

impl Default for TacticsConfig {
    fn default() -> Self {
        Self {
            offset_radius: 1.0,
            neighbor_radius_factor: 2.5,
            melee_spread: 0.2,
            jump_spread: 0.4,
            fallback_directions: 8,
            max_range_fraction: 0.95,
        }
    }
}

/// Ranged archetype tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedConfig {
    /// Below this distance the agent backs away
    pub retreat_distance: f32,
    /// Above this distance the agent approaches
    pub max_preferred_distance: f32,
    pub fire_cooldown: f32,
    pub projectile_damage: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    /// Height of the projectile origin above the body
    pub muzzle_height: f32,
    pub charge: ChargeShotConfig,
}

impl Default for RangedConfig {
    fn default() -> Self {
        Self {
            retreat_distance: 5.0,
            max_preferred_distance: 10.0,
            fire_cooldown: 1.5,
            projectile_damage: 8.0,
            projectile_speed: 18.0,
            projectile_lifetime: 3.0,
            muzzle_height: 1.0,
            charge: ChargeShotConfig::default(),
        }
    }
}

/// Charge-shot special action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeShotConfig {
    pub enabled: bool,
    /// Chance per eligible tick to start charging
    pub probability: f32,
    /// Seconds after a charge ends before another may start
    pub cooldown: f32,
    /// Seconds spent charging before the shot
    pub duration: f32,
    pub damage_multiplier: f32,
}

impl Default for ChargeShotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 0.15,
            cooldown: 6.0,
            duration: 1.5,
            damage_multiplier: 2.5,
        }
    }
}

/// Jumping slime tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlimeConfig {
    pub jump_cooldown: f32,
    /// Targets closer than this are struck normally instead
    pub min_jump_distance: f32,
    /// Targets further than this are approached instead
    pub max_jump_distance: f32,
    /// Crouch before launch
    pub prepare_duration: f32,
    /// Seconds after launch before grounded polling starts
    ///
    /// Without it the probe still touches the floor on the launch tick.
    pub liftoff_grace: f32,
    /// Give up waiting for ground contact after this long in the air
    pub airborne_timeout: f32,
    /// Pause after landing before the agent can act again
    pub settle_duration: f32,
    pub base_up_impulse: f32,
    /// Extra upward impulse per meter of horizontal distance
    pub up_impulse_per_meter: f32,
    pub max_up_impulse: f32,
    /// Horizontal impulse per meter of horizontal distance
    pub forward_impulse_per_meter: f32,
    /// Length of the downward grounded probe
    pub ground_probe_distance: f32,
    /// Landing damage as a multiple of the base strike damage
    pub damage_multiplier: f32,
    pub impact_radius: f32,
    /// Landing knockback as a multiple of the base strike knockback
    pub knockback_multiplier: f32,
    pub split: SplitConfig,
}

impl Default for SlimeConfig {
    fn default() -> Self {
        Self {
            jump_cooldown: 4.0,
            min_jump_distance: 3.0,
            max_jump_distance: 9.0,
            prepare_duration: 0.6,
            liftoff_grace: 0.2,
            airborne_timeout: 3.0,
            settle_duration: 0.4,
            base_up_impulse: 4.0,
            up_impulse_per_meter: 0.6,
            max_up_impulse: 10.0,
            forward_impulse_per_meter: 0.65,
            ground_probe_distance: 0.15,
            damage_multiplier: 1.5,
            impact_radius: 2.5,
            knockback_multiplier: 2.0,
            split: SplitConfig::default(),
        }
    }
}

/// Splitting into smaller copies on death
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub enabled: bool,
    pub count: u32,
    /// Child max health as a fraction of the parent's
    pub health_fraction: f32,
    pub scatter_impulse: f32,
    /// Child body radius as a fraction of the parent's
    pub radius_scale: f32,
    /// How many times the line may split; children get one less
    pub generations: u32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            count: 2,
            health_fraction: 0.4,
            scatter_impulse: 3.0,
            radius_scale: 0.6,
            generations: 1,
        }
    }
}

/// Passive creature tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralConfig {
    /// A visible hunter inside this radius triggers a retreat
    pub threat_radius: f32,
}

impl Default for NeutralConfig {
    fn default() -> Self {
        Self { threat_radius: 4.0 }
    }
}

/// Archetype selection plus its private tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArchetypeConfig {
    Melee,
    Ranged(RangedConfig),
    Slime(SlimeConfig),
    Neutral(NeutralConfig),
}

impl Default for ArchetypeConfig {
    fn default() -> Self {
        ArchetypeConfig::Melee
    }
}

impl ArchetypeConfig {
    pub fn class(&self) -> BehaviorClass {
        match self {
            ArchetypeConfig::Melee | ArchetypeConfig::Slime(_) => BehaviorClass::Melee,
            ArchetypeConfig::Ranged(_) => BehaviorClass::Ranged,
            ArchetypeConfig::Neutral(_) => BehaviorClass::Neutral,
        }
    }
}

/// Everything needed to spawn one kind of creature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureBlueprint {
    pub name: String,
    #[serde(default = "default_max_health")]
    pub max_health: f32,
    #[serde(default = "default_body_radius")]
    pub body_radius: f32,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub archetype: ArchetypeConfig,
}

fn default_max_health() -> f32 {
    100.0
}

fn default_body_radius() -> f32 {
    0.5
}

impl CreatureBlueprint {
    pub fn new(name: impl Into<String>, archetype: ArchetypeConfig) -> Self {
        Self {
            name: name.into(),
            max_health: default_max_health(),
            body_radius: default_body_radius(),
            agent: AgentConfig::default(),
            archetype,
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(BeastError::Config(format!("{}: {}", self.name, msg)));
        let a = &self.agent;

        if self.max_health <= 0.0 {
            return fail(format!("max_health ({}) must be positive", self.max_health));
        }
        if a.move_speed <= 0.0 || a.turn_speed_deg <= 0.0 {
            return fail("move_speed and turn_speed_deg must be positive".into());
        }
        if a.attack_range <= 0.0 {
            return fail(format!("attack_range ({}) must be positive", a.attack_range));
        }
        // A target must be perceivable before it can be struck
        if a.detection_radius < a.attack_range {
            return fail(format!(
                "detection_radius ({}) should be >= attack_range ({})",
                a.detection_radius, a.attack_range
            ));
        }
        if !(0.0..=100.0).contains(&a.flee_health_threshold) {
            return fail(format!(
                "flee_health_threshold ({}) must be a percentage",
                a.flee_health_threshold
            ));
        }
        if a.wander.wait_min > a.wander.wait_max {
            return fail(format!(
                "wander.wait_min ({}) should be <= wander.wait_max ({})",
                a.wander.wait_min, a.wander.wait_max
            ));
        }
        if a.flee.min_turn_deg > a.flee.max_turn_deg {
            return fail("flee.min_turn_deg should be <= flee.max_turn_deg".into());
        }
        if a.combo.enabled && a.combo.max_hits < 2 {
            return fail(format!("combo.max_hits ({}) must be at least 2", a.combo.max_hits));
        }
        if a.combo.cooldown_factor <= 0.0 || a.combo.cooldown_factor > 1.0 {
            return fail("combo.cooldown_factor must be in (0, 1]".into());
        }
        if a.tactics.fallback_directions == 0 {
            return fail("tactics.fallback_directions must be positive".into());
        }

        match &self.archetype {
            ArchetypeConfig::Melee => {}
            ArchetypeConfig::Ranged(r) => {
                if r.retreat_distance >= r.max_preferred_distance {
                    return fail(format!(
                        "ranged.retreat_distance ({}) should be < max_preferred_distance ({})",
                        r.retreat_distance, r.max_preferred_distance
                    ));
                }
                if !(0.0..=1.0).contains(&r.charge.probability) {
                    return fail("ranged.charge.probability must be in [0, 1]".into());
                }
                if r.charge.enabled && r.charge.duration >= a.special_action_watchdog {
                    return fail("ranged.charge.duration exceeds special_action_watchdog".into());
                }
            }
            ArchetypeConfig::Slime(s) => {
                if s.min_jump_distance >= s.max_jump_distance {
                    return fail(format!(
                        "slime.min_jump_distance ({}) should be < max_jump_distance ({})",
                        s.min_jump_distance, s.max_jump_distance
                    ));
                }
                if s.split.enabled && !(s.split.health_fraction > 0.0 && s.split.health_fraction <= 1.0) {
                    return fail("slime.split.health_fraction must be in (0, 1]".into());
                }
                let longest =
                    s.prepare_duration + s.airborne_timeout + s.settle_duration;
                if longest >= a.special_action_watchdog {
                    return fail(format!(
                        "slime session can last {:.2}s, watchdog is {:.2}s",
                        longest, a.special_action_watchdog
                    ));
                }
            }
            ArchetypeConfig::Neutral(n) => {
                if n.threat_radius <= 0.0 {
                    return fail("neutral.threat_radius must be positive".into());
                }
            }
        }

        Ok(())
    }
}

/// A named collection of creature blueprints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bestiary {
    #[serde(rename = "creature", default)]
    pub creatures: Vec<CreatureBlueprint>,
}

impl Bestiary {
    /// Built-in blueprints, one per archetype
    pub fn builtin() -> Self {
        let mut brute = CreatureBlueprint::new("brute", ArchetypeConfig::Melee);
        brute.agent.combo.enabled = true;

        let mut slime = CreatureBlueprint::new("slime", ArchetypeConfig::Slime(SlimeConfig::default()));
        slime.max_health = 60.0;
        if let ArchetypeConfig::Slime(s) = &mut slime.archetype {
            s.split.enabled = true;
        }

        let mut archer = CreatureBlueprint::new("archer", ArchetypeConfig::Ranged(RangedConfig::default()));
        archer.agent.detection_radius = 16.0;

        let mut deer = CreatureBlueprint::new("deer", ArchetypeConfig::Neutral(NeutralConfig::default()));
        deer.agent.flee_health_threshold = 30.0;
        deer.agent.move_speed = 4.5;

        Self {
            creatures: vec![brute, slime, archer, deer],
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let bestiary: Bestiary = toml::from_str(content)?;
        bestiary.validate()?;
        Ok(bestiary)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn get(&self, name: &str) -> Option<&CreatureBlueprint> {
        self.creatures.iter().find(|c| c.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        for (i, creature) in self.creatures.iter().enumerate() {
            creature.validate()?;
            if self.creatures[..i].iter().any(|c| c.name == creature.name) {
                return Err(BeastError::Config(format!(
                    "duplicate creature name '{}'",
                    creature.name
                )));
            }
        }
        Ok(())
    }
}

/// Reference environment tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub gravity: f32,
    /// Height of the ground plane; `None` removes the floor entirely
    pub ground_height: Option<f32>,
    /// Size of each cell in the spatial hash grid (world units)
    ///
    /// Should be around the typical query radius divided by three.
    pub cell_size: f32,
    /// Agents further than this from the player are deactivated
    ///
    /// `None` leaves activation entirely to the caller.
    pub activation_radius: Option<f32>,
    /// Seconds between activation polls
    pub activation_interval: f32,
    /// Horizontal velocity lost per second while grounded
    pub ground_friction: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            ground_height: Some(0.0),
            cell_size: 4.0,
            activation_radius: Some(60.0),
            activation_interval: 0.5,
            ground_friction: 8.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bestiary_validates() {
        let bestiary = Bestiary::builtin();
        assert!(bestiary.validate().is_ok());
        assert!(bestiary.get("slime").is_some());
        assert!(bestiary.get("dragon").is_none());
    }

    #[test]
    fn test_toml_partial_overrides() {
        let toml = r#"
            [[creature]]
            name = "wolf"
            max_health = 40.0

            [creature.agent]
            move_speed = 6.0

            [creature.agent.combo]
            enabled = true

            [creature.archetype]
            kind = "melee"

            [[creature]]
            name = "blob"

            [creature.archetype]
            kind = "slime"
            jump_cooldown = 2.5
        "#;
        let bestiary = Bestiary::from_toml_str(toml).unwrap();
        let wolf = bestiary.get("wolf").unwrap();
        assert_eq!(wolf.max_health, 40.0);
        assert_eq!(wolf.agent.move_speed, 6.0);
        assert!(wolf.agent.combo.enabled);
        // Untouched values keep their defaults
        assert_eq!(wolf.agent.attack_range, AgentConfig::default().attack_range);

        let blob = bestiary.get("blob").unwrap();
        match &blob.archetype {
            ArchetypeConfig::Slime(s) => {
                assert_eq!(s.jump_cooldown, 2.5);
                assert_eq!(s.impact_radius, SlimeConfig::default().impact_radius);
            }
            other => panic!("expected slime, got {:?}", other),
        }
        assert_eq!(blob.archetype.class(), BehaviorClass::Melee);
    }

    #[test]
    fn test_validate_rejects_inverted_ranged_band() {
        let mut ranged = RangedConfig::default();
        ranged.retreat_distance = 12.0;
        let blueprint = CreatureBlueprint::new("bad", ArchetypeConfig::Ranged(ranged));
        assert!(matches!(blueprint.validate(), Err(BeastError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_watchdog_shorter_than_jump() {
        let mut blueprint = CreatureBlueprint::new("slow", ArchetypeConfig::Slime(SlimeConfig::default()));
        blueprint.agent.special_action_watchdog = 1.0;
        assert!(blueprint.validate().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let bestiary = Bestiary {
            creatures: vec![
                CreatureBlueprint::new("twin", ArchetypeConfig::Melee),
                CreatureBlueprint::new("twin", ArchetypeConfig::Melee),
            ],
        };
        assert!(bestiary.validate().is_err());
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(matches!(
            Bestiary::from_toml_str("[[creature]]\nmax_health = \"lots\""),
            Err(BeastError::Toml(_))
        ));
    }
}
