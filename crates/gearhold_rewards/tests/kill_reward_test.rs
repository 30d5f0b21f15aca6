//! Integration tests for kill reward distribution.

use gearhold_rewards::{
    CreatureVictim, Group, KillContext, KillRewarder, MapKind, Participant, RewardConfig, StandardXpFormula, Victim,
    XpFormula,
};
use gearhold_shared::{CharacterGuid, GroupId};

/// A creature worth a fixed amount of XP to anyone.
struct Worth(u32);

impl XpFormula for Worth {
    fn gray_level(&self, level: u8) -> u8 {
        gearhold_rewards::gray_level(level)
    }

    fn kill_xp(&self, _killer_level: u8, victim: &Victim, _map: MapKind) -> u32 {
        if victim.is_pvp() {
            0
        } else {
            self.0
        }
    }

    fn group_rate(&self, count: u32, raid: bool) -> f32 {
        RewardConfig::default().group_rate(count, raid)
    }
}

#[test]
fn test_solo_creature_kill() {
    let formula = Worth(1_000);
    let config = RewardConfig::default();
    let ctx = KillContext::new(Victim::creature(30, CreatureVictim::new(1)), MapKind::World)
        .with_killer(Participant::new(CharacterGuid(1), 30));

    let rewards = KillRewarder::new(&formula, &config).reward(&ctx);
    assert_eq!(rewards.players.len(), 1);
    let reward = &rewards.players[0];
    assert_eq!(reward.xp, 1_000);
    assert_eq!(reward.pet_xp, 0);
    assert_eq!(reward.honor, 0);
    assert_eq!(reward.reputation_rate, Some(1.0));
    assert!(reward.kill_credit);
    assert!(!reward.player_kill_credit);
}

#[test]
fn test_group_split_by_level() {
    let formula = Worth(900);
    let config = RewardConfig::default();
    let group = GroupId(10);
    let ctx = KillContext::new(Victim::creature(60, CreatureVictim::new(1)), MapKind::World)
        .with_killer(Participant::new(CharacterGuid(1), 30).in_group(group))
        .with_participant(Participant::new(CharacterGuid(2), 60).in_group(group))
        .with_group(Group {
            id: group,
            is_raid: false,
            members: vec![CharacterGuid(1), CharacterGuid(2)],
        });

    let rewards = KillRewarder::new(&formula, &config).reward(&ctx);
    let low = rewards.reward_for(CharacterGuid(1)).unwrap();
    let high = rewards.reward_for(CharacterGuid(2)).unwrap();

    // Two members: rate 1.0, shares 30/90 and 60/90.
    assert_eq!(low.group_rate, 1.0);
    assert_eq!(low.xp, 300);
    assert_eq!(high.xp, 600);
    assert_eq!(rewards.total_xp(), 900);
    assert_eq!(low.reputation_rate, Some(1.0 * 30.0 / 90.0));
}

#[test]
fn test_larger_groups_earn_a_bonus() {
    let formula = Worth(1_000);
    let config = RewardConfig::default();
    let group = GroupId(10);
    let members: Vec<CharacterGuid> = (1..=5).map(CharacterGuid).collect();
    let mut ctx = KillContext::new(Victim::creature(60, CreatureVictim::new(1)), MapKind::World)
        .with_killer(Participant::new(members[0], 60).in_group(group));
    for &member in &members[1..] {
        ctx = ctx.with_participant(Participant::new(member, 60).in_group(group));
    }
    ctx = ctx.with_group(Group {
        id: group,
        is_raid: false,
        members,
    });

    let rewards = KillRewarder::new(&formula, &config).reward(&ctx);
    assert_eq!(rewards.players.len(), 5);
    // Five members split 1.4x the base evenly.
    let first = rewards.players[0].xp;
    assert!(rewards.players.iter().all(|reward| reward.xp == first));
    assert!((1_395..=1_400).contains(&rewards.total_xp()));
    assert!(rewards.players.iter().all(|reward| (reward.group_rate - 1.4).abs() < 1e-6));
}

#[test]
fn test_standard_formula_end_to_end() {
    let config = RewardConfig::from_toml_str("xp_kill_rate = 2.0").unwrap();
    let formula = StandardXpFormula::new(config.clone());
    let mut wolf = CreatureVictim::new(299);
    wolf.tier = gearhold_rewards::ContentTier::Classic;
    let ctx = KillContext::new(Victim::creature(30, wolf), MapKind::World)
        .with_killer(Participant::new(CharacterGuid(1), 30));

    let rewards = KillRewarder::new(&formula, &config).reward(&ctx);
    assert_eq!(rewards.players[0].xp, 390);
}

#[test]
fn test_max_level_earns_no_xp() {
    let formula = Worth(1_000);
    let config = RewardConfig::from_toml_str("max_level = 60").unwrap();
    let ctx = KillContext::new(Victim::creature(62, CreatureVictim::new(1)), MapKind::World)
        .with_killer(Participant::new(CharacterGuid(1), 60));

    let reward = &KillRewarder::new(&formula, &config).reward(&ctx).players[0];
    assert_eq!(reward.xp, 0);
    assert!(reward.kill_credit);
}
