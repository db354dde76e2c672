//! Year-interval labels.
//!
//! Turns a sorted run of fiscal years into compact labels such as
//! `["2019-2021", "2023"]`.

/// Collapse strictly increasing years into contiguous-range labels.
///
/// The input must already be sorted ascending and deduplicated; it is not
/// re-sorted here.
pub fn compress_years(years: &[i32]) -> Vec<String> {
    let mut labels = Vec::new();
    let Some((&first, rest)) = years.split_first() else {
        return labels;
    };

    let mut start = first;
    let mut end = first;
    for &year in rest {
        if end.checked_add(1) == Some(year) {
            end = year;
            continue;
        }
        labels.push(run_label(start, end));
        start = year;
        end = year;
    }
    labels.push(run_label(start, end));

    labels
}

/// Single display string for a set of periods, e.g. `"2019-2021, 2023"`.
pub fn period_label(years: &[i32]) -> String {
    let labels = compress_years(years);
    if labels.is_empty() {
        return "-".to_string();
    }
    labels.join(", ")
}

fn run_label(start: i32, end: i32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Expand labels back into the years they cover.
    fn expand(labels: &[String]) -> Vec<i32> {
        let mut years = Vec::new();
        for label in labels {
            match label.split_once('-') {
                Some((a, b)) => {
                    let a: i32 = a.parse().unwrap();
                    let b: i32 = b.parse().unwrap();
                    years.extend(a..=b);
                }
                None => years.push(label.parse().unwrap()),
            }
        }
        years
    }

    #[test]
    fn merges_contiguous_runs() {
        assert_eq!(compress_years(&[2019, 2020, 2021, 2023]), ["2019-2021", "2023"]);
    }

    #[test]
    fn empty_and_single() {
        assert!(compress_years(&[]).is_empty());
        assert_eq!(compress_years(&[2020]), ["2020"]);
    }

    #[test]
    fn isolated_years_stay_single() {
        assert_eq!(compress_years(&[2019, 2021, 2023]), ["2019", "2021", "2023"]);
    }

    #[test]
    fn fully_contiguous_is_one_range() {
        assert_eq!(compress_years(&[2015, 2016, 2017, 2018]), ["2015-2018"]);
    }

    #[test]
    fn recompressing_expanded_labels_is_stable() {
        let inputs: [&[i32]; 4] = [
            &[2019, 2020, 2021, 2023],
            &[2010, 2012, 2013, 2014, 2020],
            &[2020],
            &[2001, 2002],
        ];
        for years in inputs {
            let labels = compress_years(years);
            assert_eq!(expand(&labels), years);
            assert_eq!(compress_years(&expand(&labels)), labels);
        }
    }

    #[test]
    fn runs_ending_at_the_last_representable_year() {
        assert_eq!(compress_years(&[i32::MAX]), [i32::MAX.to_string()]);
        assert_eq!(
            compress_years(&[i32::MAX - 1, i32::MAX]),
            [format!("{}-{}", i32::MAX - 1, i32::MAX)]
        );
        assert_eq!(compress_years(&[i32::MIN, i32::MAX]).len(), 2);
    }

    #[test]
    fn period_label_joins_runs() {
        assert_eq!(period_label(&[2019, 2020, 2021, 2023]), "2019-2021, 2023");
        assert_eq!(period_label(&[]), "-");
    }
}
