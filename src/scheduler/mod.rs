mod builder;
mod check;
mod diversify;
mod extract;
mod types;
mod util;

pub use builder::{BuiltModel, ModelBuilder, VarGrid, CONSECUTIVE_OFF_BONUS};
pub use check::detect_violations;
pub use types::{
    GenerateResponse, MemberStats, SchedError, Solution, SolutionSet, SolveBudget, Violation,
    ViolationKind,
};

use crate::cp::{Backend, PumpkinBackend};
use crate::model::{GenerateOptions, Roster, ScheduleRequest};

/// Scheduler : encapsule une grille validée, ses options et le solveur utilisé
#[derive(Debug)]
pub struct Scheduler<B = PumpkinBackend> {
    roster: Roster,
    options: GenerateOptions,
    backend: B,
    budget: SolveBudget,
}

impl Scheduler {
    pub fn new(roster: Roster, options: GenerateOptions) -> Self {
        Self {
            roster,
            options,
            backend: PumpkinBackend::new(),
            budget: SolveBudget::default(),
        }
    }

    /// Valide la grille et les options d'une requête.
    pub fn from_request(request: &ScheduleRequest) -> Result<Self, SchedError> {
        let roster = Roster::from_request(&request.schedule, &request.option)?;
        Ok(Self::new(roster, request.option.clone()))
    }
}

impl<B: Backend> Scheduler<B> {
    pub fn with_backend<C: Backend>(self, backend: C) -> Scheduler<C> {
        Scheduler {
            roster: self.roster,
            options: self.options,
            backend,
            budget: self.budget,
        }
    }

    pub fn with_budget(mut self, budget: SolveBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }
    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }
    pub fn budget(&self) -> SolveBudget {
        self.budget
    }

    pub fn build_model(&self) -> BuiltModel {
        ModelBuilder::new(&self.roster, &self.options).build()
    }

    /// Produit jusqu'à `count` plannings; `1` passe en mode planning unique.
    pub fn generate(&self, count: usize) -> Result<SolutionSet, SchedError> {
        if count == 0 {
            return Err(SchedError::InvalidInput(
                "numSolutions must be at least 1".into(),
            ));
        }
        let built = self.build_model();
        if count == 1 {
            diversify::solve_single(&self.backend, &built, &self.roster, &self.budget)
        } else {
            diversify::diversify(&self.backend, &built, &self.roster, count, &self.budget)
        }
    }

    pub fn detect_violations(&self, solution: &Solution) -> Vec<Violation> {
        check::detect_violations(&self.roster, &self.options, solution)
    }
}

/// Chemin complet d'une requête: validation, génération, mise en forme de la réponse.
pub fn generate(request: &ScheduleRequest, budget: SolveBudget) -> GenerateResponse {
    let result = Scheduler::from_request(request)
        .and_then(|s| s.with_budget(budget).generate(request.num_solutions()));
    if let Ok(set) = &result {
        for (index, solution) in set.solutions.iter().enumerate() {
            for stats in solution.stats() {
                tracing::debug!(
                    schedule = index,
                    member = stats.name,
                    am = stats.am,
                    pm_hc = stats.pm_hc,
                    pm_ia = stats.pm_ia,
                    rest = stats.rest,
                    "member counts"
                );
            }
        }
    }
    result.into()
}
