use crate::calendar::TargetMonth;
use crate::scheduler::SchedError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Catégorie interne d'une case (exclusives pour un membre et un jour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShiftCategory {
    Off,
    Am,
    PmHc,
    PmIa,
}

impl ShiftCategory {
    pub const ALL: [ShiftCategory; 4] = [Self::Off, Self::Am, Self::PmHc, Self::PmIa];

    pub fn index(self) -> usize {
        match self {
            Self::Off => 0,
            Self::Am => 1,
            Self::PmHc => 2,
            Self::PmIa => 3,
        }
    }

    pub fn is_pm(self) -> bool {
        matches!(self, Self::PmHc | Self::PmIa)
    }

    pub fn is_work(self) -> bool {
        self != Self::Off
    }

    /// Code affiché quand le solveur choisit cette catégorie.
    pub fn display_code(self) -> ShiftCode {
        match self {
            Self::Off => ShiftCode::R,
            Self::Am => ShiftCode::Z,
            Self::PmHc => ShiftCode::HC,
            Self::PmIa => ShiftCode::IA,
        }
    }
}

/// Poids d'une case dans l'effectif journalier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffWeight {
    None,
    Half,
    Full,
}

impl StaffWeight {
    /// Poids doublé (0, 1, 2) pour rester en arithmétique entière.
    pub fn doubled(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Half => 1,
            Self::Full => 2,
        }
    }
}

/// Codes externes persistés dans les grilles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftCode {
    R,
    RQ,
    Z,
    HC,
    IA,
    ZT,
    HCT,
    IAT,
    DT,
}

impl ShiftCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::R => "R",
            Self::RQ => "RQ",
            Self::Z => "Z",
            Self::HC => "HC",
            Self::IA => "IA",
            Self::ZT => "ZT",
            Self::HCT => "HCT",
            Self::IAT => "IAT",
            Self::DT => "DT",
        }
    }

    pub fn category(self) -> ShiftCategory {
        match self {
            Self::R | Self::RQ | Self::DT => ShiftCategory::Off,
            Self::Z | Self::ZT => ShiftCategory::Am,
            Self::HC | Self::HCT => ShiftCategory::PmHc,
            Self::IA | Self::IAT => ShiftCategory::PmIa,
        }
    }

    pub fn weight(self) -> StaffWeight {
        match self {
            Self::DT => StaffWeight::None,
            Self::ZT | Self::HCT | Self::IAT => StaffWeight::Half,
            Self::R | Self::RQ | Self::Z | Self::HC | Self::IA => StaffWeight::Full,
        }
    }
}

impl FromStr for ShiftCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "R" => Self::R,
            "RQ" => Self::RQ,
            "Z" => Self::Z,
            "HC" => Self::HC,
            "IA" => Self::IA,
            "ZT" => Self::ZT,
            "HCT" => Self::HCT,
            "IAT" => Self::IAT,
            "DT" => Self::DT,
            other => return Err(format!("unknown shift code `{other}`")),
        })
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Décodage d'une case brute: `Ok(None)` pour une case vide (à décider).
pub fn parse_cell(raw: &str) -> Result<Option<ShiftCode>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some)
}

/// Ligne de grille telle qu'échangée en entrée et en sortie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRow {
    pub name: String,
    #[serde(default)]
    pub days: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    On,
    #[default]
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOffMode {
    All,
    #[default]
    Individual,
}

/// Longueurs maximales de séries consécutives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousWorkLimit {
    pub am: usize,
    pub pm: usize,
    pub total: usize,
}

impl Default for ContinuousWorkLimit {
    fn default() -> Self {
        Self {
            am: 5,
            pm: 4,
            total: 6,
        }
    }
}

/// Options de génération (`option` dans la requête).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    #[serde(default)]
    pub day_off: DayOffMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_off_value: Option<u32>,
    #[serde(default)]
    pub day_off_individual: BTreeMap<String, u32>,
    #[serde(default)]
    pub day_off_stream: Toggle,
    /// Accepté mais sans effet: aucune formule de répartition n'est encore définie.
    #[serde(default)]
    pub work_code_average: Toggle,
    #[serde(default)]
    pub continuous_work_limit: ContinuousWorkLimit,
    pub target_month: TargetMonth,
    #[serde(default)]
    pub reduced_staffing_days: Vec<u8>,
}

impl GenerateOptions {
    pub fn new(target_month: TargetMonth) -> Self {
        Self {
            day_off: DayOffMode::Individual,
            day_off_value: None,
            day_off_individual: BTreeMap::new(),
            day_off_stream: Toggle::Off,
            work_code_average: Toggle::Off,
            continuous_work_limit: ContinuousWorkLimit::default(),
            target_month,
            reduced_staffing_days: Vec::new(),
        }
    }

    pub fn is_reduced_day(&self, weekday_class: u8) -> bool {
        self.reduced_staffing_days.contains(&weekday_class)
    }
}

/// Requête complète (CLI, HTTP).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub schedule: Vec<MemberRow>,
    pub option: GenerateOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_solutions: Option<usize>,
}

pub const DEFAULT_NUM_SOLUTIONS: usize = 5;

impl ScheduleRequest {
    pub fn num_solutions(&self) -> usize {
        self.num_solutions.unwrap_or(DEFAULT_NUM_SOLUTIONS)
    }
}

/// Membre chargé: nom, cases pré-remplies (une par jour du mois), quota de repos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub cells: Vec<Option<ShiftCode>>,
    pub day_off_quota: u32,
}

impl Member {
    pub fn fixed(&self, day: usize) -> Option<ShiftCode> {
        self.cells.get(day).copied().flatten()
    }

    pub fn is_empty_cell(&self, day: usize) -> bool {
        self.fixed(day).is_none()
    }
}

/// Modèle de planning: calendrier cible et membres immuables.
#[derive(Debug, Clone)]
pub struct Roster {
    month: TargetMonth,
    members: Vec<Member>,
}

impl Roster {
    /// Charge et valide la grille d'une requête.
    pub fn from_request(rows: &[MemberRow], options: &GenerateOptions) -> Result<Self, SchedError> {
        if rows.is_empty() {
            return Err(SchedError::InvalidInput("schedule has no members".into()));
        }
        if let Some(day) = options.reduced_staffing_days.iter().find(|d| **d > 6) {
            return Err(SchedError::InvalidInput(format!(
                "reduced staffing weekday {day} is outside 0..=6"
            )));
        }

        let month = options.target_month;
        let num_days = month.days_in_month();
        let mut seen = HashSet::new();
        let mut members = Vec::with_capacity(rows.len());

        for row in rows {
            let name = row.name.trim();
            if name.is_empty() {
                return Err(SchedError::InvalidInput("member name cannot be empty".into()));
            }
            if !seen.insert(row.name.clone()) {
                return Err(SchedError::InvalidInput(format!(
                    "duplicate member name: {}",
                    row.name
                )));
            }
            if row.days.len() > num_days {
                tracing::warn!(
                    member = %row.name,
                    cells = row.days.len(),
                    num_days,
                    "cells beyond the target month are ignored"
                );
            }

            let mut cells = Vec::with_capacity(num_days);
            for day in 0..num_days {
                let raw = row.days.get(day).map(String::as_str).unwrap_or("");
                let cell = parse_cell(raw).map_err(|err| {
                    SchedError::InvalidInput(format!("{} day {}: {err}", row.name, day + 1))
                })?;
                cells.push(cell);
            }

            let day_off_quota = member_quota(&row.name, options)?;
            if day_off_quota as usize > num_days {
                return Err(SchedError::InvalidInput(format!(
                    "day-off quota {day_off_quota} for {} exceeds the {num_days} days of {month}",
                    row.name
                )));
            }

            members.push(Member {
                name: row.name.clone(),
                cells,
                day_off_quota,
            });
        }

        Ok(Self { month, members })
    }

    pub fn month(&self) -> TargetMonth {
        self.month
    }

    pub fn num_days(&self) -> usize {
        self.month.days_in_month()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn find_member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

fn member_quota(name: &str, options: &GenerateOptions) -> Result<u32, SchedError> {
    match options.day_off {
        DayOffMode::All => options.day_off_value.ok_or_else(|| {
            SchedError::InvalidInput("dayOff \"all\" requires dayOffValue".into())
        }),
        DayOffMode::Individual => Ok(match options.day_off_individual.get(name) {
            Some(quota) => *quota,
            None => {
                tracing::warn!(member = %name, "no individual day-off quota, using 0");
                0
            }
        }),
    }
}
