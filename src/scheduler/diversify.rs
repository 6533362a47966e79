use super::builder::BuiltModel;
use super::extract::extract_solution;
use super::types::{SchedError, Solution, SolutionSet, SolveBudget};
use crate::cp::{Backend, SolveOutcome, SolveParams, SolveStatus};
use crate::model::Roster;
use anyhow::anyhow;
use std::time::Instant;

/// Mode planning unique: un seul appel, limite longue, graine fixe.
pub(super) fn solve_single<B: Backend>(
    backend: &B,
    built: &BuiltModel,
    roster: &Roster,
    budget: &SolveBudget,
) -> Result<SolutionSet, SchedError> {
    let started = Instant::now();
    let params = SolveParams {
        time_limit: budget.single,
        seed: 0,
    };
    let outcome = backend.solve(&built.model, &built.penalties, &params);
    let status = outcome.status;
    tracing::info!(%status, "single solve finished");

    match status {
        SolveStatus::Optimal | SolveStatus::Feasible => {
            let solution = accept(outcome, built, roster)?;
            Ok(SolutionSet {
                solutions: vec![solution],
                elapsed: started.elapsed(),
            })
        }
        SolveStatus::Infeasible => Err(SchedError::Infeasible),
        SolveStatus::ModelInvalid => Err(SchedError::InvalidModel),
        SolveStatus::Unknown => Err(SchedError::NoSolution {
            elapsed_secs: started.elapsed().as_secs_f64(),
            status,
        }),
    }
}

/// Jusqu'à `count` tentatives (graine = index) sous un budget global; chaque
/// appel reçoit `min(restant, plafond)`. Les tentatives sans solution sont
/// journalisées et ignorées, un modèle infaisable ou invalide arrête tout.
pub(super) fn diversify<B: Backend>(
    backend: &B,
    built: &BuiltModel,
    roster: &Roster,
    count: usize,
    budget: &SolveBudget,
) -> Result<SolutionSet, SchedError> {
    let started = Instant::now();
    let mut solutions = Vec::with_capacity(count);
    let mut last_status = SolveStatus::Unknown;

    tracing::info!(
        count,
        budget_secs = budget.total.as_secs_f64(),
        "generating schedules"
    );

    for attempt in 0..count {
        let elapsed = started.elapsed();
        let Some(remaining) = budget.total.checked_sub(elapsed).filter(|r| !r.is_zero()) else {
            tracing::info!(
                collected = solutions.len(),
                elapsed_secs = elapsed.as_secs_f64(),
                "time budget exhausted"
            );
            break;
        };

        let params = SolveParams {
            time_limit: remaining.min(budget.per_call),
            seed: attempt as u64,
        };
        let outcome = backend.solve(&built.model, &built.penalties, &params);
        last_status = outcome.status;

        match outcome.status {
            SolveStatus::Optimal | SolveStatus::Feasible => {
                solutions.push(accept(outcome, built, roster)?);
                tracing::info!(
                    attempt,
                    collected = solutions.len(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "schedule generated"
                );
            }
            SolveStatus::Infeasible | SolveStatus::ModelInvalid => {
                tracing::warn!(attempt, status = %outcome.status, "model cannot be solved, stopping");
                break;
            }
            SolveStatus::Unknown => {
                tracing::warn!(attempt, status = %outcome.status, "attempt produced no schedule");
            }
        }
    }

    let elapsed = started.elapsed();
    if solutions.is_empty() {
        return Err(match last_status {
            SolveStatus::Infeasible => SchedError::Infeasible,
            SolveStatus::ModelInvalid => SchedError::InvalidModel,
            status => SchedError::NoSolution {
                elapsed_secs: elapsed.as_secs_f64(),
                status,
            },
        });
    }

    tracing::info!(
        count = solutions.len(),
        elapsed_secs = elapsed.as_secs_f64(),
        "schedules generated"
    );
    Ok(SolutionSet { solutions, elapsed })
}

fn accept(outcome: SolveOutcome, built: &BuiltModel, roster: &Roster) -> Result<Solution, SchedError> {
    let assignment = outcome
        .assignment
        .ok_or_else(|| anyhow!("backend reported {} without an assignment", outcome.status))?;
    extract_solution(roster, &built.grid, &assignment)
}
