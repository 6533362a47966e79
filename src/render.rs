use crate::scheduler::Solution;
use std::fmt::Write;

/// Permet de customiser le rendu d'un planning (texte, HTML, etc.).
pub trait ScheduleRenderer {
    fn render(&self, solution: &Solution) -> String;

    /// Rendu d'une série de plannings, chacun précédé de son numéro.
    fn render_all(&self, schedules: &[Solution]) -> String {
        schedules
            .iter()
            .enumerate()
            .map(|(i, s)| format!("=== schedule {} ===\n{}", i + 1, self.render(s)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Tableau texte à largeur fixe, suivi des compteurs par membre.
#[derive(Debug, Clone, Copy)]
pub struct TextTable {
    pub name_width: usize,
    pub cell_width: usize,
}

impl Default for TextTable {
    fn default() -> Self {
        Self {
            name_width: 10,
            cell_width: 4,
        }
    }
}

impl ScheduleRenderer for TextTable {
    fn render(&self, solution: &Solution) -> String {
        let num_days = solution.rows.iter().map(|r| r.days.len()).max().unwrap_or(0);
        let (nw, cw) = (self.name_width, self.cell_width);
        let mut out = String::new();

        // écrire dans une String ne peut pas échouer
        let _ = write!(out, "{:<nw$}", "name");
        for day in 1..=num_days {
            let _ = write!(out, "{day:>cw$}");
        }
        out.push('\n');
        out.push_str(&"-".repeat(nw + num_days * cw));
        out.push('\n');

        for row in &solution.rows {
            let _ = write!(out, "{:<nw$}", row.name);
            for day in 0..num_days {
                let cell = row.days.get(day).map_or("", String::as_str);
                let cell = if cell.is_empty() { "-" } else { cell };
                let _ = write!(out, "{cell:>cw$}");
            }
            out.push('\n');
        }

        out.push_str("\n[stats]\n");
        for s in solution.stats() {
            let _ = writeln!(
                out,
                "  {}: Z={}, HC={}, IA={}, rest={}",
                s.name, s.am, s.pm_hc, s.pm_ia, s.rest
            );
        }
        out
    }
}
