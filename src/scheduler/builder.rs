//! Traduction des règles métier en modèle de contraintes.
//!
//! Chaque étape ajoute une famille de contraintes indépendante; le modèle
//! est construit une fois puis réutilisé tel quel par toutes les tentatives.

use super::util;
use crate::cp::{BoolVar, CpModel, Penalty};
use crate::model::{GenerateOptions, Roster, ShiftCategory, ShiftCode, StaffWeight};

/// Bonus (poids négatif) par paire de jours de repos consécutifs.
pub const CONSECUTIVE_OFF_BONUS: i64 = -5;

/// Drapeaux de catégorie de chaque case, indexés `[membre][jour]`.
#[derive(Debug, Clone)]
pub struct VarGrid {
    cells: Vec<Vec<[BoolVar; 4]>>,
}

impl VarGrid {
    pub fn flag(&self, member: usize, day: usize, category: ShiftCategory) -> BoolVar {
        self.cells[member][day][category.index()]
    }

    fn pm(&self, member: usize, day: usize) -> [BoolVar; 2] {
        [
            self.flag(member, day, ShiftCategory::PmHc),
            self.flag(member, day, ShiftCategory::PmIa),
        ]
    }

    fn work(&self, member: usize, day: usize) -> [BoolVar; 3] {
        let [hc, ia] = self.pm(member, day);
        [self.flag(member, day, ShiftCategory::Am), hc, ia]
    }
}

/// Modèle prêt à résoudre, avec la grille de variables et la liste de
/// pénalités transmise telle quelle au solveur à chaque appel.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub model: CpModel,
    pub grid: VarGrid,
    pub penalties: Vec<Penalty>,
}

pub struct ModelBuilder<'a> {
    roster: &'a Roster,
    options: &'a GenerateOptions,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(roster: &'a Roster, options: &'a GenerateOptions) -> Self {
        Self { roster, options }
    }

    pub fn build(&self) -> BuiltModel {
        let mut model = CpModel::new();
        let grid = self.create_variables(&mut model);

        self.add_exactly_one(&mut model, &grid);
        self.pin_fixed_cells(&mut model, &grid);
        self.add_daily_staffing(&mut model, &grid);
        self.add_day_off_quotas(&mut model, &grid);
        self.add_rq_adjacency(&mut model, &grid);
        self.add_pm_to_am(&mut model, &grid);
        self.add_run_limits(&mut model, &grid);
        self.add_rest_balance(&mut model);

        let penalties = self.soft_preferences(&mut model, &grid);

        tracing::debug!(
            members = self.roster.members().len(),
            days = self.roster.num_days(),
            vars = model.num_vars(),
            constraints = model.constraints().len(),
            penalties = penalties.len(),
            "constraint model built"
        );

        BuiltModel {
            model,
            grid,
            penalties,
        }
    }

    /// Quatre drapeaux par case, alloués jour par jour.
    fn create_variables(&self, model: &mut CpModel) -> VarGrid {
        let members = self.roster.members().len();
        let mut cells = vec![Vec::with_capacity(self.roster.num_days()); members];
        for day in 0..self.roster.num_days() {
            for (m, row) in cells.iter_mut().enumerate() {
                row.push(
                    ShiftCategory::ALL
                        .map(|cat| model.new_bool_var(format!("shift_m{m}_d{day}_s{}", cat.index()))),
                );
            }
        }
        VarGrid { cells }
    }

    fn add_exactly_one(&self, model: &mut CpModel, grid: &VarGrid) {
        for (m, member) in self.roster.members().iter().enumerate() {
            for day in (0..self.roster.num_days()).filter(|d| member.is_empty_cell(*d)) {
                let terms = ShiftCategory::ALL
                    .iter()
                    .map(|cat| (1, grid.flag(m, day, *cat)))
                    .collect();
                model.add_eq(terms, 1);
            }
        }
    }

    fn pin_fixed_cells(&self, model: &mut CpModel, grid: &VarGrid) {
        for (m, member) in self.roster.members().iter().enumerate() {
            for day in 0..self.roster.num_days() {
                let Some(code) = member.fixed(day) else {
                    continue;
                };
                for cat in ShiftCategory::ALL {
                    model.fix(grid.flag(m, day, cat), cat == code.category());
                }
            }
        }
    }

    /// AM = 1 chaque jour; PM = 2 (1 les jours réduits). Les cases de formation
    /// comptent pour moitié, d'où l'égalité doublée `2 * total == 2 * cible + demi`.
    fn add_daily_staffing(&self, model: &mut CpModel, grid: &VarGrid) {
        let members = self.roster.members().len();
        for day in 0..self.roster.num_days() {
            let staffing = self.staffing(day);
            let am: Vec<BoolVar> = (0..members)
                .map(|m| grid.flag(m, day, ShiftCategory::Am))
                .collect();
            let pm: Vec<BoolVar> = (0..members).flat_map(|m| grid.pm(m, day)).collect();

            add_staffing(model, &am, staffing.am_half, staffing.am_target);
            add_staffing(model, &pm, staffing.pm_half, staffing.pm_target);
        }
    }

    fn staffing(&self, day: usize) -> DayStaffing {
        let reduced = self
            .options
            .is_reduced_day(self.roster.month().weekday_class(day));
        let mut staffing = DayStaffing {
            am_target: 1,
            pm_target: if reduced { 1 } else { 2 },
            am_half: 0,
            pm_half: 0,
        };
        for member in self.roster.members() {
            match member.fixed(day) {
                Some(code) if code.weight() == StaffWeight::Half => {
                    if code.category().is_pm() {
                        staffing.pm_half += 1;
                    } else {
                        staffing.am_half += 1;
                    }
                }
                _ => {}
            }
        }
        staffing
    }

    /// Repos laissés par l'effectif sur le mois: par jour, membres moins
    /// drapeaux AM et PM imposés. `None` si une égalité doublée est impaire.
    fn implied_rest_days(&self) -> Option<i64> {
        let members = self.roster.members().len() as i64;
        (0..self.roster.num_days()).try_fold(0, |total, day| {
            let staffing = self.staffing(day);
            let am = staffed_flags(staffing.am_target, staffing.am_half)?;
            let pm = staffed_flags(staffing.pm_target, staffing.pm_half)?;
            Some(total + members - am - pm)
        })
    }

    /// Redondance arithmétique: la somme des quotas doit égaler les repos
    /// laissés par l'effectif. Un écart ne dépend d'aucune variable.
    fn add_rest_balance(&self, model: &mut CpModel) {
        let quotas: i64 = self
            .roster
            .members()
            .iter()
            .map(|m| i64::from(m.day_off_quota))
            .sum();
        match self.implied_rest_days() {
            Some(rest) if rest == quotas => {}
            rest => {
                tracing::warn!(
                    quotas,
                    rest = ?rest,
                    "day-off quotas cannot match the rest left by daily staffing"
                );
                model.add_contradiction();
            }
        }
    }

    /// Total des cases OFF (figées ou décidées) = quota du membre.
    fn add_day_off_quotas(&self, model: &mut CpModel, grid: &VarGrid) {
        for (m, member) in self.roster.members().iter().enumerate() {
            let terms = (0..self.roster.num_days())
                .map(|day| (1, grid.flag(m, day, ShiftCategory::Off)))
                .collect();
            model.add_eq(terms, i64::from(member.day_off_quota));
        }
    }

    /// Pas de repos attribué la veille ni le lendemain d'un RQ.
    fn add_rq_adjacency(&self, model: &mut CpModel, grid: &VarGrid) {
        let num_days = self.roster.num_days();
        for (m, member) in self.roster.members().iter().enumerate() {
            for day in (0..num_days).filter(|d| member.fixed(*d) == Some(ShiftCode::RQ)) {
                for near in util::neighbours(day, num_days) {
                    if member.is_empty_cell(near) {
                        model.fix(grid.flag(m, near, ShiftCategory::Off), false);
                    }
                }
            }
        }
    }

    fn add_pm_to_am(&self, model: &mut CpModel, grid: &VarGrid) {
        for m in 0..self.roster.members().len() {
            for day in 0..self.roster.num_days().saturating_sub(1) {
                let [hc, ia] = grid.pm(m, day);
                let am_next = grid.flag(m, day + 1, ShiftCategory::Am);
                model.add_le(vec![(1, hc), (1, ia), (1, am_next)], 1);
            }
        }
    }

    fn add_run_limits(&self, model: &mut CpModel, grid: &VarGrid) {
        let limits = self.options.continuous_work_limit;
        let num_days = self.roster.num_days();
        for m in 0..self.roster.members().len() {
            for window in util::run_windows(num_days, limits.am) {
                let terms = window
                    .map(|day| (1, grid.flag(m, day, ShiftCategory::Am)))
                    .collect();
                model.add_le(terms, limits.am as i64);
            }
            for window in util::run_windows(num_days, limits.pm) {
                let terms = window
                    .flat_map(|day| grid.pm(m, day))
                    .map(|flag| (1, flag))
                    .collect();
                model.add_le(terms, limits.pm as i64);
            }
            for window in util::run_windows(num_days, limits.total) {
                let terms = window
                    .flat_map(|day| grid.work(m, day))
                    .map(|flag| (1, flag))
                    .collect();
                model.add_le(terms, limits.total as i64);
            }
        }
    }

    fn soft_preferences(&self, model: &mut CpModel, grid: &VarGrid) -> Vec<Penalty> {
        let mut penalties = Vec::new();

        if self.options.day_off_stream.is_on() {
            for m in 0..self.roster.members().len() {
                for day in 0..self.roster.num_days().saturating_sub(1) {
                    let both_off = model.new_bool_var(format!("consecutive_off_m{m}_d{day}"));
                    model.add_and_equality(
                        both_off,
                        grid.flag(m, day, ShiftCategory::Off),
                        grid.flag(m, day + 1, ShiftCategory::Off),
                    );
                    penalties.push(Penalty {
                        weight: CONSECUTIVE_OFF_BONUS,
                        flag: both_off,
                    });
                }
            }
        }

        if self.options.work_code_average.is_on() {
            tracing::warn!("workCodeAverage is accepted but not enforced");
        }

        penalties
    }
}

/// Cible et cases de formation (demi-poids) d'un jour.
struct DayStaffing {
    am_target: i64,
    pm_target: i64,
    am_half: i64,
    pm_half: i64,
}

/// Drapeaux vrais imposés par l'égalité d'effectif; `None` si `2 * cible + demi` est impair.
fn staffed_flags(target: i64, half: i64) -> Option<i64> {
    if half == 0 {
        return Some(target);
    }
    let doubled = 2 * target + half;
    (doubled % 2 == 0).then_some(doubled / 2)
}

fn add_staffing(model: &mut CpModel, flags: &[BoolVar], half: i64, target: i64) {
    if half > 0 {
        model.add_eq(flags.iter().map(|f| (2, *f)).collect(), target * 2 + half);
    } else {
        model.add_eq(flags.iter().map(|f| (1, *f)).collect(), target);
    }
}
