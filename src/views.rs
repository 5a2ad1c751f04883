//! View-time logic for the management screen: bucketing, month grouping,
//! card formatting and the confirm-before-mutate actions.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};

use crate::{
    models::trip::{Trip, TripPatch},
    services::trips::TripCatalog,
};

const MONTHS: [&str; 12] = [
    "Styczeń",
    "Luty",
    "Marzec",
    "Kwiecień",
    "Maj",
    "Czerwiec",
    "Lipiec",
    "Sierpień",
    "Wrzesień",
    "Październik",
    "Listopad",
    "Grudzień",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Upcoming,
    Archived,
}

/// Ended trips are archived whatever their cancelled flag says; a trip
/// ending today is still upcoming.
pub fn classify(trip: &Trip, today: NaiveDate) -> Bucket {
    if trip.cancelled || trip.end_date < today {
        Bucket::Archived
    } else {
        Bucket::Upcoming
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub trips: Vec<Trip>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitions {
    pub upcoming: Vec<MonthGroup>,
    pub archived: Vec<MonthGroup>,
}

/// Upcoming ascending by start date, archived descending, each grouped
/// by the (year, month) of the start date.
pub fn partition(trips: &[Trip], today: NaiveDate) -> Partitions {
    let (mut upcoming, mut archived): (Vec<Trip>, Vec<Trip>) = trips
        .iter()
        .cloned()
        .partition(|trip| classify(trip, today) == Bucket::Upcoming);
    upcoming.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    archived.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    Partitions {
        upcoming: group_by_month(upcoming),
        archived: group_by_month(archived),
    }
}

/// Input must already be sorted by start date.
fn group_by_month(trips: Vec<Trip>) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();
    for trip in trips {
        let (year, month) = (trip.start_date.year(), trip.start_date.month());
        match groups.last_mut() {
            Some(group) if group.year == year && group.month == month => group.trips.push(trip),
            _ => groups.push(MonthGroup {
                year,
                month,
                label: month_label(year, month),
                trips: vec![trip],
            }),
        }
    }
    groups
}

pub fn month_label(year: i32, month: u32) -> String {
    let name = MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!("{name} {year:04}")
}

/// Inclusive of both endpoints.
pub fn duration_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

pub fn days_until(start: NaiveDate, today: NaiveDate) -> i64 {
    (start - today).num_days()
}

pub fn is_ongoing(trip: &Trip, today: NaiveDate) -> bool {
    trip.start_date <= today && today <= trip.end_date
}

pub fn days_noun(days: i64) -> &'static str {
    if days == 1 {
        "dzień"
    } else {
        "dni"
    }
}

fn weeks_noun(weeks: i64) -> String {
    match weeks {
        1 => "1 tydzień".to_string(),
        2..=4 => format!("{weeks} tygodnie"),
        _ => format!("{weeks} tygodni"),
    }
}

/// `None` for trips that already started.
pub fn countdown_text(days: i64) -> Option<String> {
    match days {
        d if d < 0 => None,
        0 => Some("Dziś".into()),
        1 => Some("Jutro".into()),
        d if d < 7 => Some(format!("Za {d} dni")),
        d => {
            let weeks = weeks_noun(d / 7);
            Some(match d % 7 {
                0 => format!("Za {d} dni ({weeks})"),
                1 => format!("Za {d} dni ({weeks}, 1 dzień)"),
                rest => format!("Za {d} dni ({weeks}, {rest} dni)"),
            })
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn format_datetime(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%d.%m.%Y, %H:%M")
        .to_string()
}

/// Polish number formatting: decimal comma, up to three fraction digits,
/// non-breaking-space grouping from five integer digits up.
pub fn format_price(price: f64) -> String {
    let fixed = format!("{price:.3}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    let (integer, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", integer),
    };
    let grouped = if digits.len() >= 5 {
        let mut out = String::new();
        for (index, ch) in digits.chars().enumerate() {
            if index > 0 && (digits.len() - index) % 3 == 0 {
                out.push('\u{a0}');
            }
            out.push(ch);
        }
        out
    } else {
        digits.to_string()
    };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{fraction}")
    }
}

/// Everything the trip card template prints.
#[derive(Debug, Clone)]
pub struct TripCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub date_range: String,
    pub duration: String,
    pub price: String,
    pub cancelled: bool,
    pub ongoing: bool,
    pub countdown: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub toggle_label: &'static str,
    pub actions: bool,
}

impl TripCard {
    pub fn new(trip: &Trip, today: NaiveDate) -> Self {
        let days = duration_days(trip.start_date, trip.end_date);
        let ongoing = is_ongoing(trip, today);
        let countdown = if ongoing || trip.cancelled {
            None
        } else {
            countdown_text(days_until(trip.start_date, today))
        };
        let image_url = if trip.thumbnail_url.is_empty() {
            trip.image_url.clone()
        } else {
            trip.thumbnail_url.clone()
        };
        Self {
            id: trip.id_str().to_string(),
            title: trip.title.clone(),
            description: trip.description.clone(),
            image_url,
            date_range: format!(
                "{} – {}",
                format_date(trip.start_date),
                format_date(trip.end_date)
            ),
            duration: format!("{days} {}", days_noun(days)),
            price: format!("{} zł", format_price(trip.price)),
            cancelled: trip.cancelled,
            ongoing: ongoing && !trip.cancelled,
            countdown,
            created: audit_line(trip.created_at, trip.created_by.as_deref()),
            updated: audit_line(trip.updated_at, trip.updated_by.as_deref()),
            toggle_label: if trip.cancelled { "Przywróć" } else { "Odwołaj" },
            actions: true,
        }
    }

    /// Preview cards show the trip only, without edit/cancel/delete.
    pub fn without_actions(mut self) -> Self {
        self.actions = false;
        self
    }
}

fn audit_line(at: Option<DateTime<Utc>>, by: Option<&str>) -> Option<String> {
    let at = format_datetime(at?);
    Some(match by {
        Some(by) => format!("{at} przez {by}"),
        None => at,
    })
}

#[derive(Debug, Clone)]
pub struct MonthSection {
    pub label: String,
    pub cards: Vec<TripCard>,
}

fn sections(groups: &[MonthGroup], today: NaiveDate) -> Vec<MonthSection> {
    groups
        .iter()
        .map(|group| MonthSection {
            label: group.label.clone(),
            cards: group
                .trips
                .iter()
                .map(|trip| TripCard::new(trip, today))
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Cards,
    Compact,
}

impl ViewMode {
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some("compact") => ViewMode::Compact,
            _ => ViewMode::Cards,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManagementView {
    pub upcoming: Vec<MonthSection>,
    pub archived: Vec<MonthSection>,
    pub total: usize,
    pub compact: bool,
}

impl ManagementView {
    pub fn build(trips: &[Trip], today: NaiveDate, mode: ViewMode) -> Self {
        let partitions = partition(trips, today);
        Self {
            upcoming: sections(&partitions.upcoming, today),
            archived: sections(&partitions.archived, today),
            total: trips.len(),
            compact: mode == ViewMode::Compact,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogVariant {
    Danger,
    Warning,
    Info,
}

impl DialogVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogVariant::Danger => "danger",
            DialogVariant::Warning => "warning",
            DialogVariant::Info => "info",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: String,
    pub variant: DialogVariant,
}

/// A mutation waiting for explicit confirmation. Building one never
/// touches the store; only [`PendingAction::execute`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Delete { id: String },
    ToggleCancel { id: String, cancelled: bool },
}

impl PendingAction {
    /// Cancels an active trip or restores a cancelled one.
    pub fn toggle_cancel(trip: &Trip) -> Self {
        PendingAction::ToggleCancel {
            id: trip.id_str().to_string(),
            cancelled: !trip.cancelled,
        }
    }

    pub fn trip_id(&self) -> &str {
        match self {
            PendingAction::Delete { id } | PendingAction::ToggleCancel { id, .. } => id,
        }
    }

    pub fn dialog(&self, trip_title: &str) -> ConfirmDialog {
        match self {
            PendingAction::Delete { .. } => ConfirmDialog {
                title: "Usuń wycieczkę".into(),
                message: format!(
                    "Czy na pewno chcesz usunąć wycieczkę \"{trip_title}\"? Tej operacji nie można cofnąć."
                ),
                confirm_text: "Usuń".into(),
                cancel_text: "Anuluj".into(),
                variant: DialogVariant::Danger,
            },
            PendingAction::ToggleCancel {
                cancelled: true, ..
            } => ConfirmDialog {
                title: "Odwołaj wycieczkę".into(),
                message: format!("Czy na pewno chcesz odwołać wycieczkę \"{trip_title}\"?"),
                confirm_text: "Odwołaj".into(),
                cancel_text: "Anuluj".into(),
                variant: DialogVariant::Warning,
            },
            PendingAction::ToggleCancel {
                cancelled: false, ..
            } => ConfirmDialog {
                title: "Przywróć wycieczkę".into(),
                message: format!("Czy chcesz przywrócić wycieczkę \"{trip_title}\"?"),
                confirm_text: "Przywróć".into(),
                cancel_text: "Anuluj".into(),
                variant: DialogVariant::Info,
            },
        }
    }

    pub fn form_action(&self) -> String {
        match self {
            PendingAction::Delete { id } => format!("/trips/{id}/delete"),
            PendingAction::ToggleCancel { id, .. } => format!("/trips/{id}/cancel"),
        }
    }

    pub async fn execute(&self, catalog: &TripCatalog, actor: &str) -> bool {
        match self {
            PendingAction::Delete { id } => catalog.delete(id).await,
            PendingAction::ToggleCancel { id, cancelled } => {
                catalog
                    .update(id, TripPatch::cancelled(*cancelled), actor)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn countdown_follows_polish_wording() {
        assert_eq!(countdown_text(-1), None);
        assert_eq!(countdown_text(0).as_deref(), Some("Dziś"));
        assert_eq!(countdown_text(1).as_deref(), Some("Jutro"));
        assert_eq!(countdown_text(3).as_deref(), Some("Za 3 dni"));
        assert_eq!(countdown_text(7).as_deref(), Some("Za 7 dni (1 tydzień)"));
        assert_eq!(
            countdown_text(8).as_deref(),
            Some("Za 8 dni (1 tydzień, 1 dzień)")
        );
        assert_eq!(
            countdown_text(38).as_deref(),
            Some("Za 38 dni (5 tygodni, 3 dni)")
        );
    }

    #[test]
    fn price_uses_polish_grouping() {
        assert_eq!(format_price(0.0), "0");
        assert_eq!(format_price(1234.0), "1234");
        assert_eq!(format_price(12345.5), "12\u{a0}345,5");
        assert_eq!(format_price(1999.99), "1999,99");
        assert_eq!(format_price(1_250_000.0), "1\u{a0}250\u{a0}000");
    }

    #[test]
    fn duration_counts_both_endpoints() {
        assert_eq!(duration_days(date(2025, 6, 1), date(2025, 6, 5)), 5);
        assert_eq!(duration_days(date(2025, 6, 1), date(2025, 6, 1)), 1);
    }

    #[test]
    fn month_labels_are_localized() {
        assert_eq!(month_label(2025, 6), "Czerwiec 2025");
        assert_eq!(month_label(2026, 1), "Styczeń 2026");
    }
}
