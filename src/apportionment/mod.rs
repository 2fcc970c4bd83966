pub mod candidates;
pub mod dhondt;
pub mod entities;
pub mod quotient;

use crate::error::{EngineError, Result};
use crate::models::{Candidate, Registry, VoteTally};
use candidates::{CandidateResult, rank_and_elect};
use dhondt::highest_averages;
use entities::{EntityKind, group_entities};
use log::{debug, info, warn};
use quotient::Thresholds;
use serde::{Deserialize, Serialize};

// Seat allocation outcome for one competing entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResult {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub party_ids: Vec<String>,
    pub total_votes: u64,
    // `total_votes / EQ`, unfloored.
    pub quotient: f64,
    pub reached_quotient: bool,
    pub meets_barrier: bool,
    pub seats_from_quotient: u32,
    pub remainder_seats: u32,
    pub total_seats: u32,
    // Seats won but left without an eligible candidate.
    pub vacant_seats: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyResult {
    pub party_id: String,
    pub name: String,
    pub number: u32,
    pub label_votes: u64,
    pub nominal_votes: u64,
    pub total_votes: u64,
    pub federation_id: Option<String>,
    // Candidates of this party who were elected.
    pub elected: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederationMember {
    pub party_id: String,
    pub votes: u64,
    pub elected: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederationResult {
    pub federation_id: String,
    pub name: String,
    pub total_votes: u64,
    pub total_seats: u32,
    pub members: Vec<FederationMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApportionmentResult {
    pub valid_votes: u64,
    pub available_seats: u32,
    pub electoral_quotient: u64,
    pub barrier_threshold: u64,
    pub candidate_min_votes: u64,
    pub seats_by_quotient: u32,
    pub seats_by_remainder: u32,
    #[serde(rename = "noPartyReachedQE")]
    pub no_party_reached_qe: bool,
    pub entities: Vec<EntityResult>,
    pub party_results: Vec<PartyResult>,
    pub federation_results: Vec<FederationResult>,
    // Every ranked candidate, grouped by entity in registration order.
    pub candidates: Vec<CandidateResult>,
    pub elected_candidates: Vec<CandidateResult>,
    pub calculation_log: Vec<String>,
    pub warnings: Vec<String>,
}

impl ApportionmentResult {
    pub fn allocated_seats(&self) -> u32 {
        self.entities.iter().map(|e| e.total_seats).sum()
    }

    pub fn entity(&self, id: &str) -> Option<&EntityResult> {
        self.entities.iter().find(|e| e.id == id)
    }
}

// Allocate seats among parties and federations and pick the candidates who fill them.
pub fn calculate_seats(registry: &Registry, tally: &VoteTally) -> Result<ApportionmentResult> {
    let thresholds = Thresholds::compute(tally.valid_votes, tally.available_seats)?;
    let eq = thresholds.electoral_quotient;
    let available = tally.available_seats;

    // Thresholds first, everything below is judged against them
    let mut calculation_log = vec![
        format!("Valid votes: {}, available seats: {}", tally.valid_votes, available),
        format!("Electoral quotient: {} / {} = {}", tally.valid_votes, available, eq),
        format!("Barrier threshold (80% of EQ): {}", thresholds.barrier_threshold),
        format!("Candidate minimum (20% of EQ): {}", thresholds.candidate_min_votes),
    ];

    let grouping = group_entities(registry, tally);
    calculation_log.extend(grouping.log);
    // Ignored votes are part of the audit trail too
    for warning in &grouping.warnings {
        warn!("{}", warning);
        calculation_log.push(warning.clone());
    }
    let mut warnings = grouping.warnings;
    let entities = grouping.entities;
    let party_votes = grouping.party_votes;

    if entities.iter().all(|e| e.total_votes == 0) {
        return Err(EngineError::InvalidScenario(
            "no registered party received votes".to_string(),
        ));
    }

    // Quotient seats and barrier per entity
    let votes: Vec<u64> = entities.iter().map(|e| e.total_votes).collect();
    let reached: Vec<bool> = votes.iter().map(|v| *v >= eq).collect();
    let meets_barrier: Vec<bool> = votes.iter().map(|v| *v >= thresholds.barrier_threshold).collect();
    // Kept wide until the overflow check; a huge tally must not wrap.
    let floor_seats: Vec<u64> = votes
        .iter()
        .map(|v| if *v >= eq { *v / eq } else { 0 })
        .collect();

    for (i, entity) in entities.iter().enumerate() {
        calculation_log.push(format!(
            "{}: {} votes, quotient {:.4}, {} seat(s) by quotient, barrier {}",
            entity.name,
            entity.total_votes,
            entity.total_votes as f64 / eq as f64,
            floor_seats[i],
            if meets_barrier[i] { "met" } else { "not met" }
        ));
    }

    let no_party_reached_qe = !reached.iter().any(|r| *r);
    let mut seats = vec![0u32; entities.len()];
    let quotient_seats: Vec<u32>;
    let eligible: Vec<bool>;
    let to_award: u32;

    // Pick the pool and the number of seats left for highest averages
    if no_party_reached_qe {
        let message = "No entity reached the electoral quotient; all seats are distributed by highest averages among entities with votes".to_string();
        warn!("{}", message);
        warnings.push(message.clone());
        calculation_log.push(message);
        quotient_seats = vec![0; entities.len()];
        eligible = votes.iter().map(|v| *v > 0).collect();
        to_award = available;
    } else {
        let by_quotient = floor_seats.iter().fold(0u64, |acc, s| acc.saturating_add(*s));
        if by_quotient > u64::from(available) {
            let message = format!(
                "Quotient seats ({}) exceed available seats ({}); all seats are redistributed by highest averages among entities that reached the quotient",
                by_quotient, available
            );
            warn!("{}", message);
            warnings.push(message.clone());
            calculation_log.push(message);
            quotient_seats = vec![0; entities.len()];
            eligible = reached.clone();
            to_award = available;
        } else {
            // Every entry is at most `available` here.
            quotient_seats = floor_seats
                .iter()
                .map(|s| u32::try_from(*s).unwrap_or(u32::MAX))
                .collect();
            seats.copy_from_slice(&quotient_seats);
            eligible = meets_barrier.clone();
            to_award = available - u32::try_from(by_quotient).unwrap_or(available);
            calculation_log.push(format!(
                "{} seat(s) assigned by quotient, {} left for the remainder distribution",
                by_quotient, to_award
            ));
        }
    }

    // Remainder seats, one at a time
    let awards = highest_averages(&votes, &mut seats, &eligible, to_award);
    for (n, award) in awards.iter().enumerate() {
        let line = format!(
            "Remainder seat {}: {} (average {:.2}, now {} seat(s))",
            n + 1,
            entities[award.index].name,
            award.average,
            award.seats_after
        );
        debug!("{}", line);
        calculation_log.push(line);
    }
    if (awards.len() as u32) < to_award {
        return Err(EngineError::InvalidScenario(format!(
            "only {} of {} remaining seats could be distributed",
            awards.len(),
            to_award
        )));
    }

    let mut entity_results = Vec::with_capacity(entities.len());
    let mut all_candidates: Vec<CandidateResult> = Vec::new();

    // Fill each entity's seats from its (pooled) candidate list
    for (i, entity) in entities.iter().enumerate() {
        let pool: Vec<&Candidate> = registry
            .candidates
            .iter()
            .filter(|c| entity.party_ids.contains(&c.party_id))
            .collect();
        let ranked = rank_and_elect(&pool, &tally.candidate_votes, thresholds.candidate_min_votes, seats[i]);
        let elected = ranked.iter().filter(|c| c.elected).count() as u32;
        let vacant_seats = seats[i].saturating_sub(elected);

        if vacant_seats > 0 {
            let message = format!(
                "{} won {} seat(s) but has only {} candidate(s) above the individual minimum; {} seat(s) left vacant",
                entity.name, seats[i], elected, vacant_seats
            );
            warn!("{}", message);
            warnings.push(message);
        }
        for candidate in ranked.iter().filter(|c| c.elected) {
            calculation_log.push(format!(
                "Elected for {}: {} ({} votes, position {})",
                entity.name, candidate.name, candidate.votes, candidate.position
            ));
        }

        entity_results.push(EntityResult {
            id: entity.id.clone(),
            name: entity.name.clone(),
            kind: entity.kind,
            party_ids: entity.party_ids.clone(),
            total_votes: entity.total_votes,
            quotient: entity.total_votes as f64 / eq as f64,
            reached_quotient: reached[i],
            meets_barrier: meets_barrier[i],
            seats_from_quotient: quotient_seats[i],
            remainder_seats: seats[i] - quotient_seats[i],
            total_seats: seats[i],
            vacant_seats,
        });
        all_candidates.extend(ranked);
    }

    let elected_for = |party_id: &str| -> u32 {
        all_candidates
            .iter()
            .filter(|c| c.elected && c.party_id == party_id)
            .count() as u32
    };

    // Per-party view, federation members included
    let party_results: Vec<PartyResult> = registry
        .parties
        .iter()
        .map(|party| {
            let pv = party_votes.get(&party.id).copied().unwrap_or_default();
            PartyResult {
                party_id: party.id.clone(),
                name: party.name.clone(),
                number: party.number,
                label_votes: pv.label,
                nominal_votes: pv.nominal,
                total_votes: pv.total(),
                federation_id: registry.federation_of(&party.id).map(|f| f.id.clone()),
                elected: elected_for(&party.id),
            }
        })
        .collect();

    // Per-federation breakdown
    let federation_results: Vec<FederationResult> = entity_results
        .iter()
        .filter(|e| e.kind == EntityKind::Federation)
        .map(|e| FederationResult {
            federation_id: e.id.clone(),
            name: e.name.clone(),
            total_votes: e.total_votes,
            total_seats: e.total_seats,
            members: e
                .party_ids
                .iter()
                .map(|party_id| FederationMember {
                    party_id: party_id.clone(),
                    votes: party_votes.get(party_id).map(|pv| pv.total()).unwrap_or(0),
                    elected: elected_for(party_id),
                })
                .collect(),
        })
        .collect();

    let seats_by_quotient: u32 = entity_results.iter().map(|e| e.seats_from_quotient).sum();
    let seats_by_remainder: u32 = entity_results.iter().map(|e| e.remainder_seats).sum();
    let elected_candidates: Vec<CandidateResult> = all_candidates.iter().filter(|c| c.elected).cloned().collect();

    info!(
        "Apportioned {} seats (EQ {}): {} by quotient, {} by remainder, {} candidates elected",
        available,
        eq,
        seats_by_quotient,
        seats_by_remainder,
        elected_candidates.len()
    );

    Ok(ApportionmentResult {
        valid_votes: tally.valid_votes,
        available_seats: available,
        electoral_quotient: eq,
        barrier_threshold: thresholds.barrier_threshold,
        candidate_min_votes: thresholds.candidate_min_votes,
        seats_by_quotient,
        seats_by_remainder,
        no_party_reached_qe,
        entities: entity_results,
        party_results,
        federation_results,
        candidates: all_candidates,
        elected_candidates,
        calculation_log,
        warnings,
    })
}
