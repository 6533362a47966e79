use super::builder::VarGrid;
use super::types::{MemberStats, SchedError, Solution};
use crate::cp::Assignment;
use crate::model::{MemberRow, Roster, ShiftCategory, ShiftCode};

/// Reconstruit les lignes de chaque membre: code d'origine si la case était
/// pré-remplie, sinon le code d'affichage de la catégorie choisie.
pub(super) fn extract_solution(
    roster: &Roster,
    grid: &VarGrid,
    assignment: &Assignment,
) -> Result<Solution, SchedError> {
    let rows = roster
        .members()
        .iter()
        .enumerate()
        .map(|(m, member)| {
            let days = (0..roster.num_days())
                .map(|day| match member.fixed(day) {
                    Some(code) => Ok(code.as_str().to_string()),
                    None => ShiftCategory::ALL
                        .into_iter()
                        .find(|cat| assignment.value(grid.flag(m, day, *cat)))
                        .map(|cat| cat.display_code().as_str().to_string())
                        .ok_or_else(|| SchedError::IncompleteAssignment {
                            member: member.name.clone(),
                            day: day + 1,
                        }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MemberRow {
                name: member.name.clone(),
                days,
            })
        })
        .collect::<Result<Vec<_>, SchedError>>()?;

    Ok(Solution { rows })
}

impl Solution {
    /// Compteurs par membre; les codes inconnus ou vides sont ignorés.
    pub fn stats(&self) -> Vec<MemberStats<'_>> {
        self.rows
            .iter()
            .map(|row| {
                let mut stats = MemberStats {
                    name: &row.name,
                    ..MemberStats::default()
                };
                for code in row.days.iter().filter_map(|d| d.parse::<ShiftCode>().ok()) {
                    match code.category() {
                        ShiftCategory::Off => stats.off += 1,
                        ShiftCategory::Am => stats.am += 1,
                        ShiftCategory::PmHc => stats.pm_hc += 1,
                        ShiftCategory::PmIa => stats.pm_ia += 1,
                    }
                    if matches!(code, ShiftCode::R | ShiftCode::RQ) {
                        stats.rest += 1;
                    }
                }
                stats
            })
            .collect()
    }

    pub fn row(&self, name: &str) -> Option<&MemberRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GenerateOptions;
    use crate::scheduler::builder::ModelBuilder;

    fn rows(list: &[(&str, &[&str])]) -> Vec<MemberRow> {
        list.iter()
            .map(|(name, days)| MemberRow {
                name: name.to_string(),
                days: days.iter().map(|d| d.to_string()).collect(),
            })
            .collect()
    }

    #[test]
    fn fixed_cells_win_over_decisions() {
        let opts = GenerateOptions::new("2026-02".parse().unwrap());
        let roster = Roster::from_request(&rows(&[("A", &["RQ", "", "DT"])]), &opts).unwrap();
        let built = ModelBuilder::new(&roster, &opts).build();

        // toutes les cases décidées en PM_IA, y compris (à tort) les cases figées
        let values = (0..built.model.num_vars())
            .map(|i| i % 4 == ShiftCategory::PmIa.index())
            .collect();
        let solution = extract_solution(&roster, &built.grid, &Assignment::new(values)).unwrap();
        let days = &solution.rows[0].days;
        assert_eq!(days.len(), 28);
        assert_eq!(days[0], "RQ");
        assert_eq!(days[1], "IA");
        assert_eq!(days[2], "DT");
        assert!(days[3..].iter().all(|d| d == "IA"));
    }

    #[test]
    fn missing_category_is_an_error() {
        let opts = GenerateOptions::new("2026-02".parse().unwrap());
        let roster = Roster::from_request(&rows(&[("A", &[])]), &opts).unwrap();
        let built = ModelBuilder::new(&roster, &opts).build();
        let values = vec![false; built.model.num_vars()];
        let err = extract_solution(&roster, &built.grid, &Assignment::new(values)).unwrap_err();
        assert!(matches!(err, SchedError::IncompleteAssignment { day: 1, .. }));
    }

    #[test]
    fn stats_count_categories_and_rest() {
        let solution = Solution {
            rows: rows(&[("A", &["R", "RQ", "DT", "Z", "ZT", "HC", "HCT", "IA", "IAT", ""])]),
        };
        let stats = solution.stats();
        assert_eq!(stats.len(), 1);
        let s = stats[0];
        assert_eq!(s.name, "A");
        assert_eq!((s.off, s.rest), (3, 2));
        assert_eq!((s.am, s.pm_hc, s.pm_ia), (2, 2, 2));
    }
}
