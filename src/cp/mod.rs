//! Modèle de contraintes booléennes linéaires et interface de solveur.
//!
//! Le moteur de planification construit un [`CpModel`] et sa liste de
//! [`Penalty`] une seule fois, puis les passe en lecture seule à un
//! [`Backend`] autant de fois que nécessaire. Chaque appel est une fonction
//! de (modèle, pénalités, graine, limite de temps).

mod pumpkin;

pub use pumpkin::PumpkinBackend;

use std::fmt;
use std::time::Duration;

/// Variable de décision booléenne (index dans le modèle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(u32);

impl BoolVar {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `sum <= rhs`
    Le,
    /// `sum == rhs`
    Eq,
}

/// `sum(coef * var) <relation> rhs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub terms: Vec<(i64, BoolVar)>,
    pub relation: Relation,
    pub rhs: i64,
}

/// Terme de pénalité `(poids, drapeau)`; l'objectif minimise la somme des
/// poids dont le drapeau est vrai. Une liste vide signifie "pas d'objectif".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Penalty {
    pub weight: i64,
    pub flag: BoolVar,
}

impl Penalty {
    pub fn total(penalties: &[Penalty], assignment: &Assignment) -> i64 {
        penalties
            .iter()
            .filter(|p| assignment.value(p.flag))
            .map(|p| p.weight)
            .sum()
    }
}

/// Modèle déclaratif: variables et contraintes dures.
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    names: Vec<String>,
    constraints: Vec<LinearConstraint>,
}

impl CpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        let var = BoolVar(self.names.len() as u32);
        self.names.push(name.into());
        var
    }

    pub fn add_le(&mut self, terms: Vec<(i64, BoolVar)>, rhs: i64) {
        self.constraints.push(LinearConstraint {
            terms,
            relation: Relation::Le,
            rhs,
        });
    }

    pub fn add_eq(&mut self, terms: Vec<(i64, BoolVar)>, rhs: i64) {
        self.constraints.push(LinearConstraint {
            terms,
            relation: Relation::Eq,
            rhs,
        });
    }

    pub fn fix(&mut self, var: BoolVar, value: bool) {
        self.add_eq(vec![(1, var)], i64::from(value));
    }

    /// `target <-> (a AND b)` en trois inégalités linéaires.
    pub fn add_and_equality(&mut self, target: BoolVar, a: BoolVar, b: BoolVar) {
        self.add_le(vec![(1, target), (-1, a)], 0);
        self.add_le(vec![(1, target), (-1, b)], 0);
        self.add_le(vec![(1, a), (1, b), (-1, target)], 1);
    }

    /// Contrainte constante `0 == 1`: rend le modèle infaisable sans variable.
    pub fn add_contradiction(&mut self) {
        self.add_eq(Vec::new(), 1);
    }

    pub fn num_vars(&self) -> usize {
        self.names.len()
    }

    pub fn var_name(&self, var: BoolVar) -> Option<&str> {
        self.names.get(var.index()).map(String::as_str)
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Toutes les contraintes dures sont-elles satisfaites par `assignment` ?
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        assignment.len() == self.num_vars()
            && self.constraints.iter().all(|c| {
                let activity: i64 = c
                    .terms
                    .iter()
                    .filter(|(_, v)| assignment.value(*v))
                    .map(|(coef, _)| *coef)
                    .sum();
                match c.relation {
                    Relation::Le => activity <= c.rhs,
                    Relation::Eq => activity == c.rhs,
                }
            })
    }

    /// Vérifie que chaque terme (contraintes et pénalités) référence une
    /// variable déclarée avec un coefficient non nul.
    pub fn validate(&self, penalties: &[Penalty]) -> Result<(), String> {
        let n = self.num_vars();
        let check = |terms: &[(i64, BoolVar)], what: &str| -> Result<(), String> {
            for (coef, var) in terms {
                if var.index() >= n {
                    return Err(format!("{what} references unknown variable #{}", var.0));
                }
                if *coef == 0 {
                    return Err(format!("{what} has a zero coefficient on #{}", var.0));
                }
            }
            Ok(())
        };
        for (idx, c) in self.constraints.iter().enumerate() {
            check(&c.terms, &format!("constraint {idx}"))?;
        }
        let objective: Vec<(i64, BoolVar)> = penalties.iter().map(|p| (p.weight, p.flag)).collect();
        check(&objective, "objective")
    }
}

/// Valeurs de toutes les variables d'un modèle résolu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<bool>,
}

impl Assignment {
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    pub fn value(&self, var: BoolVar) -> bool {
        self.values.get(var.index()).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    ModelInvalid,
    Unknown,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Optimal => "OPTIMAL",
            Self::Feasible => "FEASIBLE",
            Self::Infeasible => "INFEASIBLE",
            Self::ModelInvalid => "MODEL_INVALID",
            Self::Unknown => "UNKNOWN",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveParams {
    pub time_limit: Duration,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub assignment: Option<Assignment>,
}

impl SolveOutcome {
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            assignment: None,
        }
    }
}

/// Solveur de contraintes interchangeable.
///
/// Doit respecter la limite de temps, être déterministe pour un même triplet
/// (modèle, pénalités, graine) sans limite de temps, et accepter des appels
/// répétés sur le même modèle. Avec des pénalités, `Optimal` signifie que la
/// somme minimale est prouvée.
pub trait Backend {
    fn solve(&self, model: &CpModel, penalties: &[Penalty], params: &SolveParams) -> SolveOutcome;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn solve(&self, model: &CpModel, penalties: &[Penalty], params: &SolveParams) -> SolveOutcome {
        (**self).solve(model, penalties, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_equality_matches_truth_table() {
        let mut m = CpModel::new();
        let a = m.new_bool_var("a");
        let b = m.new_bool_var("b");
        let both = m.new_bool_var("a_and_b");
        m.add_and_equality(both, a, b);
        assert_eq!(m.var_name(both), Some("a_and_b"));

        for bits in 0..8u8 {
            let values = vec![bits & 1 != 0, bits & 2 != 0, bits & 4 != 0];
            let expected = values[2] == (values[0] && values[1]);
            assert_eq!(m.is_satisfied_by(&Assignment::new(values)), expected, "{bits:03b}");
        }
    }

    #[test]
    fn contradiction_is_never_satisfied() {
        let mut m = CpModel::new();
        let a = m.new_bool_var("a");
        m.add_le(vec![(1, a)], 1);
        assert!(m.is_satisfied_by(&Assignment::new(vec![true])));
        m.add_contradiction();
        assert!(!m.is_satisfied_by(&Assignment::new(vec![true])));
        assert!(!m.is_satisfied_by(&Assignment::new(vec![false])));
        assert!(m.validate(&[]).is_ok());
    }

    #[test]
    fn validation_catches_foreign_variables() {
        let mut other = CpModel::new();
        other.new_bool_var("x");
        let foreign = other.new_bool_var("y");

        let mut m = CpModel::new();
        let a = m.new_bool_var("a");
        m.add_le(vec![(1, a)], 1);
        assert!(m.validate(&[]).is_ok());
        assert!(m
            .validate(&[Penalty { weight: 0, flag: a }])
            .is_err());
        assert!(m
            .validate(&[Penalty { weight: -1, flag: foreign }])
            .is_err());
        m.add_le(vec![(1, foreign)], 1);
        assert!(m.validate(&[]).is_err());
    }

    #[test]
    fn penalty_total_counts_true_flags_only() {
        let mut m = CpModel::new();
        let a = m.new_bool_var("a");
        let b = m.new_bool_var("b");
        let penalties = [Penalty { weight: -5, flag: a }, Penalty { weight: 3, flag: b }];
        assert_eq!(Penalty::total(&penalties, &Assignment::new(vec![true, false])), -5);
        assert_eq!(Penalty::total(&penalties, &Assignment::new(vec![true, true])), -2);
        assert_eq!(Penalty::total(&[], &Assignment::new(vec![true, true])), 0);
    }
}
