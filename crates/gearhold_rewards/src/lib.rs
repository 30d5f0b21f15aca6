//! # GEARHOLD Rewards
//!
//! Experience, honor, reputation and kill credit for a single kill.
//!
//! ## Design Principles
//!
//! 1. **One call per kill** - [`KillRewarder::reward`] takes a snapshot of
//!    the kill and returns every grant; applying them is the caller's job
//! 2. **Injected curve** - XP comes from an [`XpFormula`], so the split
//!    logic is testable with fixed numbers
//! 3. **Groups once** - several killers from one group reward that group a
//!    single time
//!
//! ## Example
//!
//! ```rust,ignore
//! use gearhold_rewards::{KillRewarder, RewardConfig, StandardXpFormula};
//!
//! let config = RewardConfig::from_toml_str(&std::fs::read_to_string("rewards.toml")?)?;
//! let formula = StandardXpFormula::new(config.clone());
//! let rewards = KillRewarder::new(&formula, &config).reward(&kill);
//! for grant in &rewards.players {
//!     world.give_xp(grant.player, grant.xp);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod formulas;
pub mod rewarder;

pub use config::{RewardConfig, RewardConfigError};
pub use context::{ContentTier, CreatureVictim, Group, KillContext, MapKind, Participant, Victim, VictimKind};
pub use formulas::{gray_level, hk_honor_at_level, StandardXpFormula, XpFormula};
pub use rewarder::{KillRewarder, KillRewards, PlayerReward};
