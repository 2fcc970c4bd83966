use std::cmp::Ordering;

// One seat handed out by the highest-averages loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Award {
    // Index into the contender slices.
    pub index: usize,
    // `votes / (seats_before + 1)` at the moment of the award.
    pub average: f64,
    // Seat count of the contender after the award.
    pub seats_after: u32,
}

// Award `to_award` seats one at a time to the eligible contender with the
// highest `votes / (seats + 1)`.
// Ties on the average go to the contender with more raw votes, then to the
// lower index (registration order). Contenders with zero votes never win.
// `seats` is updated in place; the returned list may be shorter than
// `to_award` only when no eligible contender holds votes.
pub fn highest_averages(votes: &[u64], seats: &mut [u32], eligible: &[bool], to_award: u32) -> Vec<Award> {
    debug_assert_eq!(votes.len(), seats.len());
    debug_assert_eq!(votes.len(), eligible.len());

    let mut awards = Vec::with_capacity(to_award as usize);

    for _ in 0..to_award {
        let mut best: Option<usize> = None;

        for index in 0..votes.len() {
            if !eligible[index] || votes[index] == 0 {
                continue;
            }
            best = match best {
                None => Some(index),
                Some(current) => {
                    if compare(votes, seats, index, current) == Ordering::Greater {
                        Some(index)
                    } else {
                        Some(current)
                    }
                }
            };
        }

        let Some(winner) = best else {
            break;
        };

        let average = votes[winner] as f64 / (seats[winner] + 1) as f64;
        seats[winner] += 1;
        awards.push(Award {
            index: winner,
            average,
            seats_after: seats[winner],
        });
    }

    awards
}

// `Greater` means contender `a` beats contender `b` for the next seat.
fn compare(votes: &[u64], seats: &[u32], a: usize, b: usize) -> Ordering {
    // a/(sa+1) vs b/(sb+1) without floating point.
    let lhs = votes[a] as u128 * (seats[b] as u128 + 1);
    let rhs = votes[b] as u128 * (seats[a] as u128 + 1);

    lhs.cmp(&rhs)
        .then(votes[a].cmp(&votes[b]))
        .then(b.cmp(&a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_dhondt_sequence() {
        // 100k / 80k / 30k / 20k for 8 seats: 4, 3, 1, 0.
        let votes = [100_000, 80_000, 30_000, 20_000];
        let mut seats = [0; 4];
        let awards = highest_averages(&votes, &mut seats, &[true; 4], 8);

        assert_eq!(awards.len(), 8);
        assert_eq!(seats, [4, 3, 1, 0]);
        assert_eq!(awards[0].index, 0);
        assert_eq!(awards[1].index, 1);
    }

    #[test]
    fn test_tie_on_average_goes_to_more_votes() {
        // 200/(1+1) == 100/(0+1): the larger party wins the tie.
        let votes = [100, 200];
        let mut seats = [0, 1];
        let awards = highest_averages(&votes, &mut seats, &[true, true], 1);

        assert_eq!(awards[0].index, 1);
        assert_eq!(seats, [0, 2]);
    }

    #[test]
    fn test_full_tie_goes_to_registration_order() {
        let votes = [150, 150];
        let mut seats = [0, 0];
        let awards = highest_averages(&votes, &mut seats, &[true, true], 1);

        assert_eq!(awards[0].index, 0);
    }

    #[test]
    fn test_ineligible_contenders_are_skipped() {
        let votes = [500, 100];
        let mut seats = [0, 0];
        let awards = highest_averages(&votes, &mut seats, &[false, true], 2);

        assert_eq!(awards.len(), 2);
        assert_eq!(seats, [0, 2]);
    }

    #[test]
    fn test_no_eligible_votes_awards_nothing() {
        let votes = [0, 0];
        let mut seats = [0, 0];
        let awards = highest_averages(&votes, &mut seats, &[true, true], 3);

        assert!(awards.is_empty());
    }
}
