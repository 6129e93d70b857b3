use chrono::NaiveDate;

use crate::directory::SELECT_ALL_ID;
use crate::query::Selection;
use crate::units::format_date;

/// Build a selection from command-line inputs. `--all` adds the synthetic
/// "select all" entry rather than replacing explicit picks.
pub fn selection_from_args(
    customer: Option<String>,
    endpoints: Vec<String>,
    all: bool,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Selection {
    let mut endpoints: Vec<String> = endpoints
        .iter()
        .flat_map(|raw| raw.split(','))
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if all {
        endpoints.push(SELECT_ALL_ID.to_string());
    }
    Selection {
        customer: customer.filter(|c| !c.trim().is_empty()),
        endpoints,
        start,
        end,
    }
}

/// Number of calendar days in an inclusive range.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

pub fn range_label(start: NaiveDate, end: NaiveDate) -> String {
    let days = inclusive_days(start, end);
    let suffix = if days == 1 { "day" } else { "days" };
    format!(
        "{} to {} ({days} {suffix})",
        format_date(start),
        format_date(end)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn endpoints_accept_comma_lists() {
        let selection = selection_from_args(
            Some("Acme".into()),
            vec!["workers_kv_read, images_stored".into(), "".into()],
            false,
            None,
            None,
        );
        assert_eq!(selection.endpoints, ["workers_kv_read", "images_stored"]);
    }

    #[test]
    fn all_flag_adds_select_all() {
        let selection = selection_from_args(None, Vec::new(), true, None, None);
        assert_eq!(selection.endpoints, [SELECT_ALL_ID]);
        assert!(selection.customer.is_none());
    }

    #[test]
    fn blank_customer_counts_as_missing() {
        let selection = selection_from_args(Some("   ".into()), Vec::new(), false, None, None);
        assert!(selection.customer.is_none());
    }

    #[test]
    fn range_label_counts_inclusive_days() {
        assert_eq!(
            range_label(date(2024, 1, 1), date(2024, 1, 31)),
            "2024-01-01 to 2024-01-31 (31 days)"
        );
        assert_eq!(
            range_label(date(2024, 2, 29), date(2024, 2, 29)),
            "2024-02-29 to 2024-02-29 (1 day)"
        );
    }
}
