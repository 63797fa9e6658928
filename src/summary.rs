use crate::ages::bracket_totals;
use crate::nationalities::{arrivals_by_nationality, canonical_country};
use crate::reservations::{lodging_totals, monthly_totals};
use crate::types::{AgeDistributionRecord, KpiRow, NationalityRecord, ReservationRecord};
use crate::util::format_number;
use std::cmp::Ordering;
use std::collections::BTreeMap;

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Headline figures for the general summary view.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientProfile {
    pub top_nationality: Option<(String, f64)>,
    pub top_age_bracket: Option<(String, f64)>,
    pub top_lodging_type: Option<(String, f64)>,
    pub busiest_months: Vec<(String, f64)>,
    pub total_reservations: f64,
    pub total_arrivals: f64,
}

pub fn build_profile(
    reservations: &[ReservationRecord],
    nationalities: &[NationalityRecord],
    ages: &[AgeDistributionRecord],
    country_names: &BTreeMap<String, Option<String>>,
) -> ClientProfile {
    let by_nationality = arrivals_by_nationality(nationalities);
    let total_arrivals: f64 = by_nationality.iter().map(|(_, v)| v).sum();
    // Aggregate buckets such as "Otros paises" are not a nationality.
    let top_nationality = by_nationality
        .into_iter()
        .find(|(name, _)| canonical_country(name, country_names).is_some());

    let lodgings = lodging_totals(reservations);
    let total_reservations: f64 = lodgings.iter().map(|(_, v)| v).sum();

    let mut months = monthly_totals(reservations);
    sort_desc(&mut months);
    months.truncate(2);
    months.sort_by(|a, b| a.0.cmp(&b.0));

    let mut brackets = bracket_totals(ages);
    sort_desc(&mut brackets);

    ClientProfile {
        top_nationality,
        top_age_bracket: brackets.into_iter().next(),
        top_lodging_type: lodgings.into_iter().next(),
        busiest_months: months,
        total_reservations,
        total_arrivals,
    }
}

/// Largest value first; the sort is stable so ties keep their input order.
fn sort_desc(values: &mut [(String, f64)]) {
    values.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}

/// `"2025-04"` -> `"abril 2025"`. Keys that are not `YYYY-MM` pass through.
pub fn format_month(period: &str) -> String {
    let parts: Vec<&str> = period.split('-').collect();
    if parts.len() == 2 {
        if let (Ok(year), Ok(month)) = (parts[0].parse::<i32>(), parts[1].parse::<usize>()) {
            if (1..=12).contains(&month) {
                return format!("{} {}", MONTHS_ES[month - 1], year);
            }
        }
    }
    period.to_string()
}

fn or_dash(value: Option<&(String, f64)>) -> String {
    value.map(|(name, _)| name.clone()).unwrap_or_else(|| "-".to_string())
}

impl ClientProfile {
    pub fn markdown(&self) -> Vec<String> {
        let months = if self.busiest_months.is_empty() {
            "-".to_string()
        } else {
            self.busiest_months
                .iter()
                .map(|(m, _)| format_month(m))
                .collect::<Vec<_>>()
                .join(" y ")
        };
        vec![
            format!(
                "- Principalmente **{}**, de entre **{}** años.",
                or_dash(self.top_nationality.as_ref()),
                or_dash(self.top_age_bracket.as_ref())
            ),
            format!(
                "- Alojamiento más usado: **{}**.",
                or_dash(self.top_lodging_type.as_ref())
            ),
            format!("- Mes de mayor actividad: **{}**.", months),
        ]
    }

    pub fn kpi_rows(&self) -> Vec<KpiRow> {
        let row = |indicator: &str, value: String| KpiRow {
            indicator: indicator.to_string(),
            value,
        };
        vec![
            row("Reservas totales", format_number(self.total_reservations, 0)),
            row("Llegadas totales", format_number(self.total_arrivals, 0)),
            row("Nacionalidad principal", or_dash(self.top_nationality.as_ref())),
            row("Tramo de edad principal", or_dash(self.top_age_bracket.as_ref())),
            row("Alojamiento principal", or_dash(self.top_lodging_type.as_ref())),
            row(
                "Meses punta",
                self.busiest_months
                    .iter()
                    .map(|(m, _)| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;

    fn res(period: &str, lodging: &str, count: f64) -> ReservationRecord {
        ReservationRecord {
            period: period.to_string(),
            lodging_type: lodging.to_string(),
            count: Some(count),
        }
    }

    fn nat(name: &str, arrivals: f64) -> NationalityRecord {
        NationalityRecord {
            period: "ABRIL".to_string(),
            nationality: name.to_string(),
            arrivals: Some(arrivals),
            overnights: None,
            pitches: None,
        }
    }

    fn age(lodging: &str, bracket: &str, count: f64) -> AgeDistributionRecord {
        AgeDistributionRecord {
            lodging_type: lodging.to_string(),
            age_bracket: bracket.to_string(),
            count,
        }
    }

    #[test]
    fn profile_picks_leaders_from_each_pipeline() {
        let reservations = vec![
            res("2025-04", "Parcela", 10.0),
            res("2025-05", "Parcela", 12.0),
            res("2025-05", "Casas Alpinas", 3.0),
            res("2025-08", "Casas Alpinas", 1.0),
        ];
        let nationalities = vec![nat("Otros paises", 500.0), nat("España", 80.0), nat("Francia", 8.0)];
        let ages = vec![
            age("Parcela", "19-40", 5.0),
            age("Parcela", "41-50", 9.0),
            age("Casas Alpinas", "41-50", 2.0),
        ];
        let cfg = DashboardConfig::default();
        let profile = build_profile(&reservations, &nationalities, &ages, &cfg.country_names);

        assert_eq!(profile.top_nationality, Some(("España".to_string(), 80.0)));
        assert_eq!(profile.top_age_bracket, Some(("41-50".to_string(), 11.0)));
        assert_eq!(profile.top_lodging_type, Some(("Parcela".to_string(), 22.0)));
        assert_eq!(
            profile.busiest_months,
            vec![("2025-04".to_string(), 10.0), ("2025-05".to_string(), 15.0)]
        );
        assert_eq!(profile.total_reservations, 26.0);
        assert_eq!(profile.total_arrivals, 588.0);

        let md = profile.markdown();
        assert_eq!(md[0], "- Principalmente **España**, de entre **41-50** años.");
        assert_eq!(md[2], "- Mes de mayor actividad: **abril 2025 y mayo 2025**.");
    }

    #[test]
    fn empty_inputs_render_dashes() {
        let profile = build_profile(&[], &[], &[], &BTreeMap::new());
        assert_eq!(profile.top_lodging_type, None);
        assert!(profile.markdown()[1].contains("**-**"));
        assert_eq!(profile.kpi_rows().len(), 6);
    }

    #[test]
    fn month_names_are_spanish() {
        assert_eq!(format_month("2025-08"), "agosto 2025");
        assert_eq!(format_month("2025-13"), "2025-13");
        assert_eq!(format_month("Junio"), "Junio");
    }
}
