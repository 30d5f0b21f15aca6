//! # Kill Rewarder
//!
//! Turns one [`KillContext`] into the list of grants it earns.
//!
//! ## Order of Work
//!
//! ```text
//! for each killer:
//!     grouped  → skip if the group was already rewarded
//!              → aggregate members alive and in range
//!              → base XP from the highest non-gray member
//!              → reward every member in range (the killer always)
//!     solo     → base XP from the killer, reward the killer
//! then, once per kill: encounter, guild and scenario credit
//! ```
//!
//! Battlegrounds only ever hand out XP. Player kills give honor and no XP,
//! reputation or creature credit.

use gearhold_shared::{CharacterGuid, CreatureEntry, GroupId, GuildId};
use std::collections::BTreeSet;

use crate::config::RewardConfig;
use crate::context::{Group, KillContext, MapKind, Participant, VictimKind};
use crate::formulas::{hk_honor_at_level_f, XpFormula};

/// Everything one character receives for a kill.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerReward {
    /// Character.
    pub player: CharacterGuid,
    /// Experience.
    pub xp: u32,
    /// Group rate the XP was computed with.
    pub group_rate: f32,
    /// Experience for the character's pet.
    pub pet_xp: u32,
    /// Honor.
    pub honor: u32,
    /// Share of the creature's reputation reward, if any.
    pub reputation_rate: Option<f32>,
    /// Creature kill credit for quests and criteria.
    pub kill_credit: bool,
    /// Player kill credit for quests.
    pub player_kill_credit: bool,
}

impl PlayerReward {
    fn new(player: CharacterGuid) -> Self {
        Self {
            player,
            xp: 0,
            group_rate: 1.0,
            pet_xp: 0,
            honor: 0,
            reputation_rate: None,
            kill_credit: false,
            player_kill_credit: false,
        }
    }
}

/// Result of distributing one kill.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KillRewards {
    /// Per-character grants, in reward order.
    pub players: Vec<PlayerReward>,
    /// Boss whose instance encounter advanced.
    pub encounter_credit: Option<CreatureEntry>,
    /// Guild kill criteria, attributed to the first killer.
    pub guild_credit: Option<(GuildId, CharacterGuid)>,
    /// Scenario kill criteria, attributed to the first killer.
    pub scenario_credit: Option<CharacterGuid>,
}

impl KillRewards {
    /// The grants for `player`, if it was rewarded.
    #[must_use]
    pub fn reward_for(&self, player: CharacterGuid) -> Option<&PlayerReward> {
        self.players.iter().find(|reward| reward.player == player)
    }

    /// Total XP handed out to characters.
    #[must_use]
    pub fn total_xp(&self) -> u64 {
        self.players.iter().map(|reward| u64::from(reward.xp)).sum()
    }
}

/// Highest-level member the victim is not trivial for.
#[derive(Clone, Copy, Debug)]
struct NotGray {
    level: u8,
}

/// Members of one group that count toward the split.
#[derive(Clone, Copy, Debug, Default)]
struct GroupAggregate {
    count: u32,
    sum_level: u32,
    max_level: u8,
    max_not_gray: Option<NotGray>,
    rate: f32,
}

impl GroupAggregate {
    /// The highest member also finds the kill worthwhile.
    fn is_full_xp(&self) -> bool {
        self.max_not_gray.is_some_and(|member| member.level == self.max_level)
    }

    fn share(&self, level: u8) -> f32 {
        if self.sum_level == 0 {
            return 0.0;
        }
        self.rate * f32::from(level) / self.sum_level as f32
    }
}

/// Kill reward distributor.
pub struct KillRewarder<'a> {
    formula: &'a dyn XpFormula,
    config: &'a RewardConfig,
}

impl<'a> KillRewarder<'a> {
    /// Distributor using `formula` for XP and `config` for rates.
    #[must_use]
    pub fn new(formula: &'a dyn XpFormula, config: &'a RewardConfig) -> Self {
        Self { formula, config }
    }

    /// Distributes the rewards of one kill.
    #[must_use]
    pub fn reward(&self, ctx: &KillContext) -> KillRewards {
        let mut out = KillRewards::default();
        let mut processed: BTreeSet<GroupId> = BTreeSet::new();
        let battleground = ctx.map == MapKind::Battleground;

        for &guid in &ctx.killers {
            let Some(killer) = ctx.participant(guid) else {
                tracing::warn!(?guid, "killer missing from participants");
                continue;
            };
            match killer.group.and_then(|id| ctx.group(id)) {
                Some(group) => {
                    if processed.insert(group.id) {
                        self.reward_group(ctx, killer, group, &mut out);
                    }
                }
                None => {
                    let xp = self.initial_xp(ctx, killer, killer.level);
                    if !battleground || xp > 0 {
                        self.reward_player(ctx, killer, None, xp, false, &mut out);
                    }
                }
            }
        }

        self.credit_once(ctx, &mut out);
        tracing::debug!(
            killers = ctx.killers.len(),
            rewarded = out.players.len(),
            xp = out.total_xp(),
            "kill rewarded"
        );
        out
    }

    fn aggregate(&self, ctx: &KillContext, group: &Group) -> GroupAggregate {
        let mut agg = GroupAggregate::default();
        for member in group.members.iter().filter_map(|guid| ctx.participant(*guid)) {
            if !member.alive || !member.in_reward_range {
                continue;
            }
            agg.count += 1;
            agg.sum_level += u32::from(member.level);
            agg.max_level = agg.max_level.max(member.level);
            let not_gray = self.formula.gray_level(member.level) < ctx.victim.level;
            if not_gray && agg.max_not_gray.map_or(true, |best| best.level < member.level) {
                agg.max_not_gray = Some(NotGray { level: member.level });
            }
        }
        agg
    }

    /// XP one unit at `level` earns: always in battlegrounds, otherwise
    /// only for creature kills and never from a vehicle.
    fn initial_xp(&self, ctx: &KillContext, killer: &Participant, level: u8) -> u32 {
        let battleground = ctx.map == MapKind::Battleground;
        if battleground || (!ctx.victim.is_pvp() && !killer.on_vehicle) {
            self.formula.kill_xp(level, &ctx.victim, ctx.map)
        } else {
            0
        }
    }

    fn reward_group(&self, ctx: &KillContext, killer: &Participant, group: &Group, out: &mut KillRewards) {
        let mut agg = self.aggregate(ctx, group);
        if agg.max_level == 0 {
            return;
        }
        let xp = agg
            .max_not_gray
            .map_or(0, |member| self.initial_xp(ctx, killer, member.level));
        let battleground = ctx.map == MapKind::Battleground;
        if battleground && xp == 0 {
            return;
        }
        let pvp = ctx.victim.is_pvp();
        let dungeon = !pvp && ctx.map.is_instance();
        agg.rate = if battleground {
            1.0
        } else {
            let raid = !pvp && ctx.map == MapKind::Raid && group.is_raid;
            self.formula.group_rate(agg.count, raid)
        };
        for member in group.members.iter().filter_map(|guid| ctx.participant(*guid)) {
            if member.guid == killer.guid || member.in_reward_range {
                self.reward_player(ctx, member, Some(&agg), xp, dungeon, out);
            }
        }
    }

    fn reward_player(
        &self,
        ctx: &KillContext,
        player: &Participant,
        group: Option<&GroupAggregate>,
        xp: u32,
        dungeon: bool,
        out: &mut KillRewards,
    ) {
        let battleground = ctx.map == MapKind::Battleground;
        let pvp = ctx.victim.is_pvp();
        let mut reward = PlayerReward::new(player.guid);

        if !battleground {
            reward.honor = self.honor(ctx, player, group.map_or(1, |agg| agg.count));
            reward.player_kill_credit = matches!(ctx.victim.kind, VictimKind::Player(_));
        }
        if !pvp || battleground {
            let rate = group.map_or(1.0, |agg| agg.share(player.level));
            if xp > 0 {
                self.reward_xp(ctx, player, group, xp, rate, &mut reward);
            }
            if !battleground {
                let share = if dungeon { 1.0 } else { rate };
                reward.reputation_rate = Some(share * self.config.reputation_rate);
                reward.kill_credit = ctx.victim.as_creature().is_some() && (player.alive || player.has_corpse);
            }
        }
        out.players.push(reward);
    }

    fn reward_xp(
        &self,
        ctx: &KillContext,
        player: &Participant,
        group: Option<&GroupAggregate>,
        base: u32,
        rate: f32,
        reward: &mut PlayerReward,
    ) {
        let mut xp = base;
        if let Some(agg) = group {
            let worthwhile = agg.max_not_gray.is_some_and(|member| member.level >= player.level);
            xp = if worthwhile && player.alive {
                if agg.is_full_xp() {
                    (xp as f32 * rate) as u32
                } else {
                    (xp as f32 * rate / 2.0) as u32 + 1
                }
            } else {
                0
            };
        }
        if xp == 0 || player.level >= self.config.max_level {
            return;
        }
        let creature_type = ctx.victim.as_creature().map(|creature| creature.creature_type);
        let xp = (xp as f32 * player.xp_multiplier(creature_type)) as u32;
        reward.xp = xp;
        reward.group_rate = group.map_or(1.0, |agg| agg.rate);
        if player.has_pet {
            reward.pet_xp = if group.is_some() { xp / 2 } else { xp };
        }
    }

    fn honor(&self, ctx: &KillContext, player: &Participant, count: u32) -> u32 {
        if !player.alive || player.inactive {
            return 0;
        }
        let victim = &ctx.victim;
        let mut honor = match &victim.kind {
            VictimKind::Player(_) => {
                let level = player.level.max(1);
                let gray = self.formula.gray_level(level);
                if victim.level <= gray {
                    return 0;
                }
                let spread = f32::from(level.saturating_sub(gray).max(1));
                (hk_honor_at_level_f(level, 1.0) * f32::from(victim.level - gray) / spread).ceil()
            }
            VictimKind::Creature(creature) if creature.racial_leader => 100.0,
            VictimKind::Creature(_) => return 0,
        };
        if count > 1 {
            honor /= count as f32;
        }
        honor *= 1.0 + player.honor_gain_pct.max(0) as f32 / 100.0;
        honor *= self.config.honor_rate;
        honor as u32
    }

    fn credit_once(&self, ctx: &KillContext, out: &mut KillRewards) {
        let (Some(creature), Some(&first)) = (ctx.victim.as_creature(), ctx.killers.first()) else {
            return;
        };
        if ctx.map.is_instance() && creature.dungeon_boss {
            out.encounter_credit = Some(creature.entry);
        }
        if let Some(guild) = ctx.map_guild {
            out.guild_credit = Some((guild, first));
        }
        if ctx.scenario {
            out.scenario_credit = Some(first);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CreatureVictim, Victim};

    struct FixedXp(u32);

    impl XpFormula for FixedXp {
        fn gray_level(&self, level: u8) -> u8 {
            crate::formulas::gray_level(level)
        }

        fn kill_xp(&self, _killer_level: u8, victim: &Victim, _map: MapKind) -> u32 {
            if victim.as_creature().is_some() {
                self.0
            } else {
                0
            }
        }

        fn group_rate(&self, count: u32, raid: bool) -> f32 {
            RewardConfig::default().group_rate(count, raid)
        }
    }

    fn creature_kill(level: u8, map: MapKind) -> KillContext {
        KillContext::new(Victim::creature(level, CreatureVictim::new(42)), map)
    }

    #[test]
    fn test_group_rewarded_once() {
        let formula = FixedXp(900);
        let config = RewardConfig::default();
        let group = GroupId(1);
        let ctx = creature_kill(60, MapKind::World)
            .with_killer(Participant::new(CharacterGuid(1), 60).in_group(group))
            .with_killer(Participant::new(CharacterGuid(2), 60).in_group(group))
            .with_group(Group {
                id: group,
                is_raid: false,
                members: vec![CharacterGuid(1), CharacterGuid(2)],
            });

        let rewards = KillRewarder::new(&formula, &config).reward(&ctx);
        assert_eq!(rewards.players.len(), 2);
        assert_eq!(rewards.reward_for(CharacterGuid(1)).unwrap().xp, 450);
        assert_eq!(rewards.reward_for(CharacterGuid(2)).unwrap().xp, 450);
    }

    #[test]
    fn test_gray_member_halves_group_xp() {
        let formula = FixedXp(1_000);
        let config = RewardConfig::default();
        let group = GroupId(1);
        // Victim level 45 is gray for 60 (gray 51) but not for 50 (gray 39).
        let ctx = creature_kill(45, MapKind::World)
            .with_killer(Participant::new(CharacterGuid(1), 50).in_group(group))
            .with_participant(Participant::new(CharacterGuid(2), 60).in_group(group))
            .with_group(Group {
                id: group,
                is_raid: false,
                members: vec![CharacterGuid(1), CharacterGuid(2)],
            });

        let rewards = KillRewarder::new(&formula, &config).reward(&ctx);
        let low = rewards.reward_for(CharacterGuid(1)).unwrap();
        let high = rewards.reward_for(CharacterGuid(2)).unwrap();
        assert_eq!(low.xp, (1_000.0 * 50.0 / 110.0 / 2.0) as u32 + 1);
        assert_eq!(high.xp, 0);
        assert!(high.kill_credit);
    }

    #[test]
    fn test_out_of_range_member_gets_nothing() {
        let formula = FixedXp(1_000);
        let config = RewardConfig::default();
        let group = GroupId(1);
        let mut far = Participant::new(CharacterGuid(2), 60).in_group(group);
        far.in_reward_range = false;
        let ctx = creature_kill(60, MapKind::World)
            .with_killer(Participant::new(CharacterGuid(1), 60).in_group(group))
            .with_participant(far)
            .with_group(Group {
                id: group,
                is_raid: false,
                members: vec![CharacterGuid(1), CharacterGuid(2)],
            });

        let rewards = KillRewarder::new(&formula, &config).reward(&ctx);
        assert_eq!(rewards.players.len(), 1);
        assert_eq!(rewards.players[0].xp, 1_000);
    }

    #[test]
    fn test_pet_share() {
        let formula = FixedXp(1_000);
        let config = RewardConfig::default();
        let mut hunter = Participant::new(CharacterGuid(1), 30);
        hunter.has_pet = true;
        let ctx = creature_kill(30, MapKind::World).with_killer(hunter.clone());
        let solo = KillRewarder::new(&formula, &config).reward(&ctx);
        assert_eq!(solo.players[0].xp, 1_000);
        assert_eq!(solo.players[0].pet_xp, 1_000);

        let group = GroupId(3);
        let ctx = creature_kill(30, MapKind::World)
            .with_killer(hunter.in_group(group))
            .with_group(Group {
                id: group,
                is_raid: false,
                members: vec![CharacterGuid(1)],
            });
        let grouped = KillRewarder::new(&formula, &config).reward(&ctx);
        assert_eq!(grouped.players[0].xp, 1_000);
        assert_eq!(grouped.players[0].pet_xp, 500);
    }

    #[test]
    fn test_player_kill_gives_honor_only() {
        let formula = FixedXp(1_000);
        let config = RewardConfig::default();
        let ctx = KillContext::new(Victim::player(60, CharacterGuid(9)), MapKind::World)
            .with_killer(Participant::new(CharacterGuid(1), 60));

        let reward = KillRewarder::new(&formula, &config).reward(&ctx).players.remove(0);
        assert_eq!(reward.xp, 0);
        assert_eq!(reward.honor, 93);
        assert!(reward.player_kill_credit);
        assert_eq!(reward.reputation_rate, None);
        assert!(!reward.kill_credit);
    }

    #[test]
    fn test_battleground_gives_xp_only() {
        let formula = FixedXp(500);
        let config = RewardConfig::default();
        let mut leader = CreatureVictim::new(7);
        leader.racial_leader = true;
        let ctx = KillContext::new(Victim::creature(60, leader), MapKind::Battleground)
            .with_killer(Participant::new(CharacterGuid(1), 60));

        let reward = KillRewarder::new(&formula, &config).reward(&ctx).players.remove(0);
        assert_eq!(reward.xp, 500);
        assert_eq!(reward.honor, 0);
        assert_eq!(reward.reputation_rate, None);
        assert!(!reward.kill_credit);
    }

    #[test]
    fn test_dead_without_corpse_gets_no_credit() {
        let formula = FixedXp(1_000);
        let config = RewardConfig::default();
        let group = GroupId(1);
        let mut ghost = Participant::new(CharacterGuid(2), 60).in_group(group);
        ghost.alive = false;
        let mut corpse = Participant::new(CharacterGuid(3), 60).in_group(group);
        corpse.alive = false;
        corpse.has_corpse = true;
        let ctx = creature_kill(60, MapKind::World)
            .with_killer(Participant::new(CharacterGuid(1), 60).in_group(group))
            .with_participant(ghost)
            .with_participant(corpse)
            .with_group(Group {
                id: group,
                is_raid: false,
                members: vec![CharacterGuid(1), CharacterGuid(2), CharacterGuid(3)],
            });

        let rewards = KillRewarder::new(&formula, &config).reward(&ctx);
        assert!(!rewards.reward_for(CharacterGuid(2)).unwrap().kill_credit);
        let corpse = rewards.reward_for(CharacterGuid(3)).unwrap();
        assert!(corpse.kill_credit);
        assert_eq!(corpse.xp, 0);
    }

    #[test]
    fn test_once_per_kill_credit() {
        let formula = FixedXp(1_000);
        let config = RewardConfig::default();
        let mut boss = CreatureVictim::new(1_234);
        boss.dungeon_boss = true;
        let mut ctx = KillContext::new(Victim::creature(62, boss), MapKind::Dungeon)
            .with_killer(Participant::new(CharacterGuid(1), 60))
            .with_killer(Participant::new(CharacterGuid(2), 60));
        ctx.map_guild = Some(GuildId(5));
        ctx.scenario = true;

        let rewards = KillRewarder::new(&formula, &config).reward(&ctx);
        assert_eq!(rewards.encounter_credit, Some(1_234));
        assert_eq!(rewards.guild_credit, Some((GuildId(5), CharacterGuid(1))));
        assert_eq!(rewards.scenario_credit, Some(CharacterGuid(1)));
        assert!(rewards.players.iter().all(|r| r.reputation_rate == Some(1.0)));
    }
}
