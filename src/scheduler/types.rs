use crate::cp::SolveStatus;
use crate::model::MemberRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Budgets de temps du moteur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveBudget {
    /// Budget global du mode multi-plannings.
    pub total: Duration,
    /// Plafond de chaque appel au solveur en mode multi-plannings.
    pub per_call: Duration,
    /// Limite de l'unique appel en mode planning unique.
    pub single: Duration,
}

impl Default for SolveBudget {
    fn default() -> Self {
        Self {
            total: Duration::from_secs(10),
            per_call: Duration::from_secs(5),
            single: Duration::from_secs(60),
        }
    }
}

/// Un planning complet: une ligne par membre, une case par jour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Solution {
    pub rows: Vec<MemberRow>,
}

/// Compteurs par membre (observabilité uniquement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemberStats<'a> {
    pub name: &'a str,
    pub am: usize,
    pub pm_hc: usize,
    pub pm_ia: usize,
    pub off: usize,
    /// R + RQ
    pub rest: usize,
}

/// Plannings collectés, dans l'ordre des tentatives.
#[derive(Debug, Clone, Default)]
pub struct SolutionSet {
    pub solutions: Vec<Solution>,
    pub elapsed: Duration,
}

impl SolutionSet {
    pub fn count(&self) -> usize {
        self.solutions.len()
    }
}

/// Réponse publique (CLI, HTTP, fichier de sortie).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerateResponse {
    Success {
        schedules: Vec<Solution>,
        count: usize,
        elapsed_time: f64,
    },
    Error {
        message: String,
    },
}

impl From<SolutionSet> for GenerateResponse {
    fn from(set: SolutionSet) -> Self {
        let elapsed_time = (set.elapsed.as_secs_f64() * 100.0).round() / 100.0;
        Self::Success {
            count: set.solutions.len(),
            schedules: set.solutions,
            elapsed_time,
        }
    }
}

impl From<Result<SolutionSet, SchedError>> for GenerateResponse {
    fn from(result: Result<SolutionSet, SchedError>) -> Self {
        match result {
            Ok(set) => set.into(),
            Err(err) => Self::Error {
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    MemberMismatch,
    UnresolvedCell,
    FixedCellChanged,
    QuotaMismatch,
    AmStaffing,
    PmStaffing,
    RestNextToRq,
    PmBeforeAm,
    AmRun,
    PmRun,
    TotalRun,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MemberMismatch => "member",
            Self::UnresolvedCell => "cell",
            Self::FixedCellChanged => "fixed",
            Self::QuotaMismatch => "quota",
            Self::AmStaffing => "am-staffing",
            Self::PmStaffing => "pm-staffing",
            Self::RestNextToRq => "rq-adjacent",
            Self::PmBeforeAm => "pm-before-am",
            Self::AmRun => "am-run",
            Self::PmRun => "pm-run",
            Self::TotalRun => "total-run",
        }
    }
}

/// Règle dure non respectée par un planning produit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub member: Option<String>,
    /// Index de jour (0-based).
    pub day: Option<usize>,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind.as_str())?;
        if let Some(member) = &self.member {
            write!(f, " {member}")?;
        }
        if let Some(day) = self.day {
            write!(f, " day {}", day + 1)?;
        }
        write!(f, ": {}", self.detail)
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no schedule satisfies the constraints (INFEASIBLE)")]
    Infeasible,
    #[error("the constraint model is invalid (MODEL_INVALID)")]
    InvalidModel,
    #[error("could not generate a schedule (search time: {elapsed_secs:.2}s, last status: {status})")]
    NoSolution {
        elapsed_secs: f64,
        status: SolveStatus,
    },
    #[error("solver assignment leaves {member} without a shift on day {day}")]
    IncompleteAssignment { member: String, day: usize },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
