//! # Kill Context
//!
//! Everything the distributor needs to know about one kill, captured by the
//! caller at the moment of death. Nothing here refers back into the world.

use gearhold_shared::{CharacterGuid, CreatureEntry, GroupId, GuildId};

/// Expansion tier a creature belongs to; picks the XP base constant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentTier {
    /// Original content.
    Classic,
    /// First expansion.
    Burning,
    /// Second expansion.
    Wrath,
    /// Anything newer.
    #[default]
    Later,
}

/// Kind of map the kill happened on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MapKind {
    /// Open world.
    #[default]
    World,
    /// Five-player instance.
    Dungeon,
    /// Raid instance.
    Raid,
    /// Battleground.
    Battleground,
    /// Arena.
    Arena,
}

impl MapKind {
    /// Dungeons and raids.
    #[must_use]
    pub const fn is_instance(self) -> bool {
        matches!(self, Self::Dungeon | Self::Raid)
    }
}

/// A killed creature.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatureVictim {
    /// Creature template.
    pub entry: CreatureEntry,
    /// Creature type, matched by creature-type XP auras.
    pub creature_type: u32,
    /// Elite creatures give more XP.
    pub elite: bool,
    /// Content tier.
    pub tier: ContentTier,
    /// Per-template XP multiplier.
    pub xp_modifier: f32,
    /// Totems, critters and summons give nothing.
    pub grants_xp: bool,
    /// Faction leaders give honor.
    pub racial_leader: bool,
    /// Killing it advances the instance encounter state.
    pub dungeon_boss: bool,
    /// A pet or guardian of a player counts as a player-versus-player kill.
    pub controlled_by_player: bool,
}

impl CreatureVictim {
    /// An ordinary XP-granting creature.
    #[must_use]
    pub const fn new(entry: CreatureEntry) -> Self {
        Self {
            entry,
            creature_type: 0,
            elite: false,
            tier: ContentTier::Later,
            xp_modifier: 1.0,
            grants_xp: true,
            racial_leader: false,
            dungeon_boss: false,
            controlled_by_player: false,
        }
    }
}

/// What died.
#[derive(Clone, Debug, PartialEq)]
pub enum VictimKind {
    /// A creature.
    Creature(CreatureVictim),
    /// A player character.
    Player(CharacterGuid),
}

/// The victim of a kill.
#[derive(Clone, Debug, PartialEq)]
pub struct Victim {
    /// Victim level at death.
    pub level: u8,
    /// Creature or player.
    pub kind: VictimKind,
}

impl Victim {
    /// A creature victim.
    #[must_use]
    pub const fn creature(level: u8, creature: CreatureVictim) -> Self {
        Self {
            level,
            kind: VictimKind::Creature(creature),
        }
    }

    /// A player victim.
    #[must_use]
    pub const fn player(level: u8, guid: CharacterGuid) -> Self {
        Self {
            level,
            kind: VictimKind::Player(guid),
        }
    }

    /// The creature part, if any.
    #[must_use]
    pub const fn as_creature(&self) -> Option<&CreatureVictim> {
        match &self.kind {
            VictimKind::Creature(creature) => Some(creature),
            VictimKind::Player(_) => None,
        }
    }

    /// True for players and player-controlled creatures.
    #[must_use]
    pub const fn is_pvp(&self) -> bool {
        match &self.kind {
            VictimKind::Player(_) => true,
            VictimKind::Creature(creature) => creature.controlled_by_player,
        }
    }
}

/// A character that may receive part of the reward.
#[derive(Clone, Debug, PartialEq)]
pub struct Participant {
    /// Character.
    pub guid: CharacterGuid,
    /// Level.
    pub level: u8,
    /// Alive at the time of the kill.
    pub alive: bool,
    /// A dead character still has a corpse in the world.
    pub has_corpse: bool,
    /// Close enough to the victim to share group rewards.
    pub in_reward_range: bool,
    /// Riding a vehicle; vehicle kills give no XP.
    pub on_vehicle: bool,
    /// Has an active pet.
    pub has_pet: bool,
    /// Group membership.
    pub group: Option<GroupId>,
    /// Percent XP modifiers from auras; they multiply.
    pub xp_aura_pcts: Vec<i32>,
    /// Percent XP modifiers that only apply to one creature type.
    pub creature_type_xp_pcts: Vec<(u32, i32)>,
    /// Highest honor gain percent modifier.
    pub honor_gain_pct: i32,
    /// Flagged inactive in a battleground; earns no honor.
    pub inactive: bool,
}

impl Participant {
    /// A living solo character in range.
    #[must_use]
    pub const fn new(guid: CharacterGuid, level: u8) -> Self {
        Self {
            guid,
            level,
            alive: true,
            has_corpse: false,
            in_reward_range: true,
            on_vehicle: false,
            has_pet: false,
            group: None,
            xp_aura_pcts: Vec::new(),
            creature_type_xp_pcts: Vec::new(),
            honor_gain_pct: 0,
            inactive: false,
        }
    }

    /// Sets the group.
    #[must_use]
    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Multiplier applied to this character's XP for a kill of `creature_type`.
    #[must_use]
    pub fn xp_multiplier(&self, creature_type: Option<u32>) -> f32 {
        let pct = |value: i32| (100.0 + value as f32) / 100.0;
        let auras: f32 = self.xp_aura_pcts.iter().map(|&value| pct(value)).product();
        let typed: f32 = self
            .creature_type_xp_pcts
            .iter()
            .filter(|(kind, _)| Some(*kind) == creature_type)
            .map(|&(_, value)| pct(value))
            .product();
        auras * typed
    }
}

/// A party or raid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Group id.
    pub id: GroupId,
    /// Raid groups split XP at a flat rate inside raids.
    pub is_raid: bool,
    /// Members, in group order.
    pub members: Vec<CharacterGuid>,
}

/// One kill event.
#[derive(Clone, Debug, PartialEq)]
pub struct KillContext {
    /// What died.
    pub victim: Victim,
    /// Characters credited with the kill, in tap order.
    pub killers: Vec<CharacterGuid>,
    /// Killers and every group member that may share, with their state.
    pub participants: Vec<Participant>,
    /// Groups of the killers.
    pub groups: Vec<Group>,
    /// Map kind.
    pub map: MapKind,
    /// Guild owning the map, for guild kill criteria.
    pub map_guild: Option<GuildId>,
    /// The map runs a scenario.
    pub scenario: bool,
}

impl KillContext {
    /// A kill of `victim` on a `map`.
    #[must_use]
    pub fn new(victim: Victim, map: MapKind) -> Self {
        Self {
            victim,
            killers: Vec::new(),
            participants: Vec::new(),
            groups: Vec::new(),
            map,
            map_guild: None,
            scenario: false,
        }
    }

    /// Adds a killer and its state.
    #[must_use]
    pub fn with_killer(mut self, participant: Participant) -> Self {
        self.killers.push(participant.guid);
        self.participants.push(participant);
        self
    }

    /// Adds a non-killing participant.
    #[must_use]
    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.participants.push(participant);
        self
    }

    /// Adds a group.
    #[must_use]
    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    /// Looks up a participant.
    #[must_use]
    pub fn participant(&self, guid: CharacterGuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.guid == guid)
    }

    /// Looks up a group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }
}
