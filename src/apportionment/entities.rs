use crate::models::{AllianceType, Registry, VoteTally};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Party,
    Federation,
}

// A seat-competing unit: an independent party or a whole federation.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub party_ids: Vec<String>,
    pub total_votes: u64,
}

// Votes credited to one registered party.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartyVotes {
    pub label: u64,
    pub nominal: u64,
}

impl PartyVotes {
    pub fn total(&self) -> u64 {
        self.label + self.nominal
    }
}

#[derive(Debug, Default)]
pub struct Grouping {
    // In registration order; a federation sits where its first member is registered.
    pub entities: Vec<Entity>,
    pub party_votes: HashMap<String, PartyVotes>,
    pub log: Vec<String>,
    pub warnings: Vec<String>,
}

// Collapse the registry into competing entities and total their votes.
pub fn group_entities(registry: &Registry, tally: &VoteTally) -> Grouping {
    let mut grouping = Grouping::default();

    let registered_parties: HashSet<&str> = registry.parties.iter().map(|p| p.id.as_str()).collect();
    let registered_candidates: HashSet<&str> = registry.candidates.iter().map(|c| c.id.as_str()).collect();

    // Sorted so warnings come out in a stable order.
    let unknown_parties: BTreeSet<&String> = tally
        .party_votes
        .keys()
        .filter(|id| !registered_parties.contains(id.as_str()))
        .collect();
    for id in unknown_parties {
        grouping
            .warnings
            .push(format!("Votes for unregistered party '{}' were ignored", id));
    }
    let unknown_candidates: BTreeSet<&String> = tally
        .candidate_votes
        .keys()
        .filter(|id| !registered_candidates.contains(id.as_str()))
        .collect();
    for id in unknown_candidates {
        grouping
            .warnings
            .push(format!("Votes for unregistered candidate '{}' were ignored", id));
    }

    // Candidates filed under a party missing from the registry belong to no entity.
    for candidate in &registry.candidates {
        if registered_parties.contains(candidate.party_id.as_str()) {
            continue;
        }
        let votes = tally.candidate_votes.get(&candidate.id).copied().unwrap_or(0);
        if votes > 0 {
            grouping.warnings.push(format!(
                "Votes for candidate '{}' of unregistered party '{}' were ignored ({} votes)",
                candidate.id, candidate.party_id, votes
            ));
        }
    }

    for party in &registry.parties {
        let label = tally.party_votes.get(&party.id).copied().unwrap_or(0);
        let nominal: u64 = registry
            .candidates_of(&party.id)
            .map(|candidate| tally.candidate_votes.get(&candidate.id).copied().unwrap_or(0))
            .sum();
        grouping
            .party_votes
            .insert(party.id.clone(), PartyVotes { label, nominal });
    }

    for alliance in &registry.alliances {
        if alliance.alliance_type == AllianceType::Coalition {
            grouping.log.push(format!(
                "Coalition {} does not pool votes; its members compete as separate entities",
                alliance.name
            ));
        }
    }

    let mut emitted_federations: HashSet<&str> = HashSet::new();
    for party in &registry.parties {
        match registry.federation_of(&party.id) {
            Some(federation) => {
                if !emitted_federations.insert(federation.id.as_str()) {
                    continue;
                }
                let (members, unknown): (Vec<String>, Vec<String>) = federation
                    .member_party_ids
                    .iter()
                    .cloned()
                    .partition(|id| registered_parties.contains(id.as_str()));
                for id in unknown {
                    grouping.warnings.push(format!(
                        "Federation {} lists unregistered party '{}'; it was left out of the pool",
                        federation.name, id
                    ));
                }
                let total_votes: u64 = members
                    .iter()
                    .filter_map(|id| grouping.party_votes.get(id))
                    .map(PartyVotes::total)
                    .sum();
                grouping.log.push(format!(
                    "Federation {} pools {} member parties with {} votes",
                    federation.name,
                    members.len(),
                    total_votes
                ));
                grouping.entities.push(Entity {
                    id: federation.id.clone(),
                    name: federation.name.clone(),
                    kind: EntityKind::Federation,
                    party_ids: members,
                    total_votes,
                });
            }
            None => {
                let total_votes = grouping
                    .party_votes
                    .get(&party.id)
                    .map(PartyVotes::total)
                    .unwrap_or(0);
                grouping.entities.push(Entity {
                    id: party.id.clone(),
                    name: party.name.clone(),
                    kind: EntityKind::Party,
                    party_ids: vec![party.id.clone()],
                    total_votes,
                });
            }
        }
    }

    grouping
}
