//! Backend adossé au solveur CP à génération paresseuse de clauses `pumpkin-solver`.
//!
//! Chaque appel recrée un `Solver` à partir du [`CpModel`]: une variable
//! entière `0..=1` par drapeau, une contrainte linéaire par ligne du modèle,
//! et une variable objectif liée aux pénalités quand la liste n'est pas vide.

use super::{
    Assignment, Backend, BoolVar, CpModel, Penalty, Relation, SolveOutcome, SolveParams,
    SolveStatus,
};
use pumpkin_solver::constraints;
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::options::SolverOptions;
use pumpkin_solver::results::{
    OptimisationResult, ProblemSolution, SatisfactionResult, SolutionReference,
};
use pumpkin_solver::termination::TimeBudget;
use pumpkin_solver::variables::{AffineView, DomainId, TransformableVariable};
use pumpkin_solver::Solver;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Backend par défaut: la graine alimente le générateur aléatoire du solveur,
/// la limite de temps devient un `TimeBudget`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpkinBackend;

impl PumpkinBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Raison d'un modèle refusé avant la recherche.
enum Rejected {
    /// Conflit détecté dès la pose d'une contrainte.
    Infeasible,
    /// Coefficient ou borne hors de l'arithmétique 32 bits du solveur.
    Overflow,
}

impl Backend for PumpkinBackend {
    fn solve(&self, model: &CpModel, penalties: &[Penalty], params: &SolveParams) -> SolveOutcome {
        if let Err(reason) = model.validate(penalties) {
            tracing::warn!(%reason, "constraint model rejected");
            return SolveOutcome::without_solution(SolveStatus::ModelInvalid);
        }

        let mut termination = TimeBudget::starting_now(params.time_limit);
        let mut solver = Solver::with_options(SolverOptions {
            random_generator: SmallRng::seed_from_u64(params.seed),
            ..SolverOptions::default()
        });
        let vars: Vec<DomainId> = (0..model.num_vars())
            .map(|_| solver.new_bounded_integer(0, 1))
            .collect();

        let objective = match post_model(&mut solver, model, penalties, &vars) {
            Ok(objective) => objective,
            Err(Rejected::Infeasible) => {
                tracing::debug!(seed = params.seed, "conflict while posting constraints");
                return SolveOutcome::without_solution(SolveStatus::Infeasible);
            }
            Err(Rejected::Overflow) => {
                tracing::warn!("coefficient does not fit the solver integer range");
                return SolveOutcome::without_solution(SolveStatus::ModelInvalid);
            }
        };

        let mut brancher = solver.default_brancher();
        let (status, assignment) = match objective {
            None => match solver.satisfy(&mut brancher, &mut termination) {
                SatisfactionResult::Satisfiable(solution) => {
                    (SolveStatus::Optimal, Some(read_assignment(&solution.solution(), &vars)))
                }
                SatisfactionResult::Unsatisfiable(_, _) => (SolveStatus::Infeasible, None),
                SatisfactionResult::Unknown(_, _) => (SolveStatus::Unknown, None),
            },
            Some(objective) => {
                let procedure =
                    LinearSatUnsat::new(OptimisationDirection::Minimise, objective, |_: &Solver, _: SolutionReference<'_>, _: &_| {});
                match solver.optimise(&mut brancher, &mut termination, procedure) {
                    OptimisationResult::Optimal(solution) => {
                        (SolveStatus::Optimal, Some(read_assignment(&solution, &vars)))
                    }
                    OptimisationResult::Satisfiable(solution) => {
                        (SolveStatus::Feasible, Some(read_assignment(&solution, &vars)))
                    }
                    OptimisationResult::Unsatisfiable => (SolveStatus::Infeasible, None),
                    OptimisationResult::Unknown => (SolveStatus::Unknown, None),
                }
            }
        };

        if let Some(assignment) = &assignment {
            tracing::debug!(
                seed = params.seed,
                %status,
                penalty = Penalty::total(penalties, assignment),
                "solver finished"
            );
        }
        SolveOutcome { status, assignment }
    }
}

/// Pose les contraintes dures puis, s'il y a des pénalités, la variable objectif
/// `obj == sum(weight * flag)`.
fn post_model(
    solver: &mut Solver,
    model: &CpModel,
    penalties: &[Penalty],
    vars: &[DomainId],
) -> Result<Option<DomainId>, Rejected> {
    for constraint in model.constraints() {
        if constraint.terms.is_empty() {
            let holds = match constraint.relation {
                Relation::Le => 0 <= constraint.rhs,
                Relation::Eq => constraint.rhs == 0,
            };
            if holds {
                continue;
            }
            return Err(Rejected::Infeasible);
        }

        let terms = scaled_terms(vars, constraint.terms.iter().copied())?;
        let rhs = narrow(constraint.rhs)?;
        let tag = solver.new_constraint_tag();
        let posted = match constraint.relation {
            Relation::Le => solver
                .add_constraint(constraints::less_than_or_equals(terms, rhs, tag))
                .post(),
            Relation::Eq => solver
                .add_constraint(constraints::equals(terms, rhs, tag))
                .post(),
        };
        posted.map_err(|_| Rejected::Infeasible)?;
    }

    if penalties.is_empty() {
        return Ok(None);
    }

    let lower: i64 = penalties.iter().map(|p| p.weight.min(0)).sum();
    let upper: i64 = penalties.iter().map(|p| p.weight.max(0)).sum();
    let objective = solver.new_bounded_integer(narrow(lower)?, narrow(upper)?);

    let mut terms = scaled_terms(vars, penalties.iter().map(|p| (p.weight, p.flag)))?;
    terms.push(objective.scaled(-1));
    let tag = solver.new_constraint_tag();
    solver
        .add_constraint(constraints::equals(terms, 0, tag))
        .post()
        .map_err(|_| Rejected::Infeasible)?;

    Ok(Some(objective))
}

fn scaled_terms(
    vars: &[DomainId],
    terms: impl Iterator<Item = (i64, BoolVar)>,
) -> Result<Vec<AffineView<DomainId>>, Rejected> {
    terms
        .map(|(coef, var)| Ok(vars[var.index()].scaled(narrow(coef)?)))
        .collect()
}

fn narrow(value: i64) -> Result<i32, Rejected> {
    i32::try_from(value).map_err(|_| Rejected::Overflow)
}

fn read_assignment(solution: &impl ProblemSolution, vars: &[DomainId]) -> Assignment {
    Assignment::new(
        vars.iter()
            .map(|var| solution.get_integer_value(*var) == 1)
            .collect(),
    )
}
