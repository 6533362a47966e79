use std::ops::Range;

/// Fenêtres glissantes de `limit + 1` jours entièrement contenues dans le mois.
pub(super) fn run_windows(num_days: usize, limit: usize) -> impl Iterator<Item = Range<usize>> {
    let width = limit.saturating_add(1);
    let count = (num_days + 1).saturating_sub(width);
    (0..count).map(move |start| start..start + width)
}

/// Veille et lendemain de `day`, quand ils existent dans le mois.
pub(super) fn neighbours(day: usize, num_days: usize) -> impl Iterator<Item = usize> {
    let prev = day.checked_sub(1);
    let next = (day + 1 < num_days).then_some(day + 1);
    prev.into_iter().chain(next)
}
