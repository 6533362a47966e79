#![forbid(unsafe_code)]
//! Shiftplan : génération de plannings mensuels d'équipe par contraintes (sans BD).
//!
//! - Grille d'entrée JSON/CSV, cases pré-remplies respectées.
//! - Modèle booléen linéaire, solveur interchangeable (`cp::Backend`).
//! - Plusieurs plannings diversifiés par graine, sous budget de temps.
//! - Vérification indépendante des règles dures sur un planning produit.

pub mod calendar;
pub mod cp;
pub mod io;
pub mod model;
pub mod render;
#[cfg(feature = "server")]
pub mod server;
pub mod scheduler;
pub mod storage;

pub use calendar::{days_in_month, weekday_class, TargetMonth};
pub use model::{
    GenerateOptions, MemberRow, Roster, ScheduleRequest, ShiftCategory, ShiftCode, StaffWeight,
};
pub use render::{ScheduleRenderer, TextTable};
pub use scheduler::{
    detect_violations, generate, GenerateResponse, SchedError, Scheduler, Solution, SolutionSet,
    SolveBudget, Violation, ViolationKind,
};
pub use storage::{JsonStorage, Storage};
