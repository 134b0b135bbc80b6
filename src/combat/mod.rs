pub mod combo;
pub mod resolution;
pub mod state;

pub use combo::{ComboStep, ComboTracker};
pub use resolution::{apply_hit, in_strike_range, knockback_impulse, HitSpec};
pub use state::{CombatState, Swing};
