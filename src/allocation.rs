//! Suggested-savings allocation.
//!
//! Pure functions over a snapshot of `(income, goals)`. Nothing here
//! mutates the goal set; the store calls [`recompute`] after every change
//! because each goal's share depends on the whole set. A per-goal
//! incremental update would be wrong: adding, editing, or removing any
//! goal shifts every other goal's proportion.

use crate::error::GoalError;
use crate::store::Goal;

/// Share of monthly income earmarked for goal savings. The remainder is
/// left for other obligations. Policy constant, not derived.
pub const ALLOCATION_FRACTION: f64 = 0.2;

/// A usable income is a finite, positive number. Anything else means "no
/// income configured yet" and every suggestion is zero.
pub fn valid_income(income: f64) -> bool {
    income.is_finite() && income > 0.0
}

/// Amount a goal needs saved per month to hit its target on time:
/// `target_amount / time_frame`. Fails closed on a zero time frame or a
/// non-positive target instead of dividing by zero.
pub fn required_monthly_rate(goal: &Goal) -> Result<f64, GoalError> {
    if goal.time_frame == 0 || !goal.target_amount.is_finite() || goal.target_amount <= 0.0 {
        return Err(GoalError::InvalidGoal {
            id: goal.id.clone(),
        });
    }
    Ok(goal.target_amount / f64::from(goal.time_frame))
}

/// Sum of required monthly rates over the set. Order-independent.
pub fn total_required_monthly_rate(goals: &[Goal]) -> Result<f64, GoalError> {
    goals.iter().map(required_monthly_rate).sum()
}

/// Suggested monthly contribution for `goal` within `goals`: a
/// proportional share of the allocatable income, capped at the goal's own
/// required rate so surplus capacity is never over-assigned to a single
/// goal. The share and the cap coincide only when the allocatable income
/// covers the total demand.
pub fn suggested_savings(goal: &Goal, goals: &[Goal], income: f64) -> Result<f64, GoalError> {
    let rate = required_monthly_rate(goal)?;
    if !valid_income(income) {
        return Ok(0.0);
    }
    let total = total_required_monthly_rate(goals)?;
    if total == 0.0 {
        return Ok(0.0);
    }
    let available = income * ALLOCATION_FRACTION;
    let proportion = rate / total;
    Ok(rate.min(available * proportion))
}

/// Recomputes `suggested_savings` for the entire set. All-or-nothing: if
/// any goal violates the target/time-frame invariant, no goal is updated.
pub fn recompute(goals: &mut [Goal], income: f64) -> Result<(), GoalError> {
    let snapshot = goals.to_vec();
    let values = goals
        .iter()
        .map(|goal| suggested_savings(goal, &snapshot, income))
        .collect::<Result<Vec<_>, _>>()?;
    for (goal, value) in goals.iter_mut().zip(values) {
        goal.suggested_savings = value;
    }
    Ok(())
}

/// Affordability gate for a proposed add or edit: the candidate's required
/// rate must fit in the income left after funding every other goal's
/// suggested savings. `excluding_id` removes the goal being edited from
/// the "others" so it does not count against itself.
///
/// Without a valid income nothing is affordable; callers are expected to
/// have income set before proposing goals.
pub fn can_afford(
    goals: &[Goal],
    candidate: &Goal,
    income: f64,
    excluding_id: Option<&str>,
) -> Result<(), GoalError> {
    let needed = required_monthly_rate(candidate)?;
    if !valid_income(income) {
        return Err(GoalError::InsufficientIncome {
            needed,
            leftover: 0.0,
            shortfall: needed,
        });
    }

    let others: Vec<Goal> = goals
        .iter()
        .filter(|g| excluding_id != Some(g.id.as_str()))
        .cloned()
        .collect();
    let mut committed = 0.0;
    for goal in &others {
        committed += suggested_savings(goal, &others, income)?;
    }

    let leftover = income - committed;
    if needed <= leftover {
        Ok(())
    } else {
        Err(GoalError::InsufficientIncome {
            needed,
            leftover,
            shortfall: needed - leftover,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(id: &str, target: f64, months: u32) -> Goal {
        Goal::new(id, format!("goal {id}"), target, months)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn total_rate_is_additive() {
        let goals = vec![goal("1", 120.0, 12), goal("2", 240.0, 12), goal("3", 90.0, 3)];
        let sum: f64 = goals
            .iter()
            .map(|g| required_monthly_rate(g).unwrap())
            .sum();
        assert!(close(total_required_monthly_rate(&goals).unwrap(), sum));
        assert!(close(sum, 10.0 + 20.0 + 30.0));
    }

    #[test]
    fn zero_time_frame_fails_closed() {
        let bad = goal("1", 100.0, 0);
        assert!(matches!(
            required_monthly_rate(&bad),
            Err(GoalError::InvalidGoal { .. })
        ));
        let also_bad = goal("2", -5.0, 10);
        assert!(matches!(
            required_monthly_rate(&also_bad),
            Err(GoalError::InvalidGoal { .. })
        ));
    }

    #[test]
    fn suggestion_never_exceeds_required_rate() {
        let goals = vec![goal("1", 1200.0, 12), goal("2", 5000.0, 10), goal("3", 80.0, 8)];
        for income in [50.0, 300.0, 2000.0, 100_000.0] {
            for g in &goals {
                let suggested = suggested_savings(g, &goals, income).unwrap();
                assert!(suggested <= required_monthly_rate(g).unwrap() + 1e-9);
            }
        }
    }

    #[test]
    fn full_funding_when_capacity_covers_demand() {
        let goals = vec![goal("1", 1200.0, 12), goal("2", 800.0, 8)];
        // available = 20% of 2000 = 400 >= total demand 200
        for g in &goals {
            let suggested = suggested_savings(g, &goals, 2000.0).unwrap();
            assert!(close(suggested, required_monthly_rate(g).unwrap()));
        }
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut goals = vec![goal("1", 1200.0, 12), goal("2", 900.0, 6), goal("3", 400.0, 4)];
        recompute(&mut goals, 750.0).unwrap();
        let first: Vec<f64> = goals.iter().map(|g| g.suggested_savings).collect();
        recompute(&mut goals, 750.0).unwrap();
        let second: Vec<f64> = goals.iter().map(|g| g.suggested_savings).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn deletion_shifts_remaining_shares() {
        // income 1000 => available 200; rates 100 and 200, total 300.
        let mut goals = vec![goal("1", 1200.0, 12), goal("2", 2400.0, 12)];
        recompute(&mut goals, 1000.0).unwrap();
        let constrained = goals[0].suggested_savings;
        assert!(close(constrained, 200.0 / 3.0));

        goals.remove(1);
        recompute(&mut goals, 1000.0).unwrap();
        // total demand dropped to 100, so the survivor is fully funded.
        assert!(close(goals[0].suggested_savings, 100.0));
        assert!(goals[0].suggested_savings > constrained);
    }

    #[test]
    fn equal_rates_split_evenly() {
        // income 1000, rates 100 + 100: available 200 covers both exactly.
        let goals = vec![goal("1", 1200.0, 12), goal("2", 800.0, 8)];
        for g in &goals {
            assert!(close(suggested_savings(g, &goals, 1000.0).unwrap(), 100.0));
        }
    }

    #[test]
    fn single_goal_capped_by_available_income() {
        // income 100 => available 20; rate 100, proportion 1.0.
        let goals = vec![goal("1", 1200.0, 12)];
        assert!(close(suggested_savings(&goals[0], &goals, 100.0).unwrap(), 20.0));
    }

    #[test]
    fn missing_income_means_zero_suggestions() {
        let goals = vec![goal("1", 1200.0, 12)];
        for income in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert_eq!(suggested_savings(&goals[0], &goals, income).unwrap(), 0.0);
        }
    }

    #[test]
    fn can_afford_rejects_with_shortfall() {
        // income 125 => available 25; existing goal rate 100 is capped at a
        // suggestion of 25, so leftover = 100. A 150/month goal is short 50.
        let existing = vec![goal("1", 1200.0, 12)];
        let candidate = goal("2", 1800.0, 12);
        match can_afford(&existing, &candidate, 125.0, None) {
            Err(GoalError::InsufficientIncome {
                needed,
                leftover,
                shortfall,
            }) => {
                assert!(close(needed, 150.0));
                assert!(close(leftover, 100.0));
                assert!(close(shortfall, 50.0));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn can_afford_excludes_goal_being_edited() {
        let goals = vec![goal("1", 1200.0, 12)];
        let grown = goal("1", 1800.0, 12);
        // Excluded from the others-sum, the whole income is free for it.
        assert!(can_afford(&goals, &grown, 150.0, Some("1")).is_ok());
        // Counted against itself it would not fit: its own suggestion (30)
        // leaves only 120 of the 150 income.
        assert!(matches!(
            can_afford(&goals, &grown, 150.0, None),
            Err(GoalError::InsufficientIncome { .. })
        ));
    }

    #[test]
    fn can_afford_rejects_without_valid_income() {
        let candidate = goal("1", 100.0, 10);
        for income in [0.0, -1.0, f64::NAN] {
            match can_afford(&[], &candidate, income, None) {
                Err(GoalError::InsufficientIncome { shortfall, .. }) => {
                    assert!(close(shortfall, 10.0));
                }
                other => panic!("expected rejection, got {other:?}"),
            }
        }
    }
}
