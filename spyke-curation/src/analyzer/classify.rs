//! Reading the shape of a correlation histogram.
//!
//! `read_histogram` finds the short-circuit verdicts and the three bin
//! indices the shape classifier works on; `classify` turns them into a
//! label and a cut bin ("point of interest").

use spyke_core::constants::NOISY_GOOD_BOUNDARY;
use spyke_core::models::Label;

use super::histogram::CorrelationHistogram;

/// Outcome of reading a histogram before shape classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramReading {
    /// The last bin is empty: nothing correlates with the template.
    Noise,
    /// No empty bin below the last one: the distribution cannot be cut.
    Unanalyzable,
    Shaped {
        /// Last empty bin below the populated tail.
        gap: usize,
        /// Start of the last rising run of the histogram, plus one.
        last_var: usize,
        /// Highest bin at or below the decision threshold.
        under_th: usize,
    },
}

/// Why a histogram that passed the short-circuits still has no shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity(pub String);

/// Read the short-circuits and shape markers of `hist`.
///
/// `threshold` is the spike count at or below which a bin counts as empty
/// for the decision floor.
pub fn read_histogram(
    hist: &CorrelationHistogram,
    threshold: f64,
) -> Result<HistogramReading, Ambiguity> {
    let counts = hist.counts();
    let n = counts.len();
    if n < 2 {
        return Err(Ambiguity(format!("{n} bins are too few to read a shape")));
    }
    if counts[n - 1] == 0 {
        return Ok(HistogramReading::Noise);
    }

    let mut gap = n - 2;
    while counts[gap] != 0 {
        if gap == 0 {
            return Ok(HistogramReading::Unanalyzable);
        }
        gap -= 1;
    }

    let signs: Vec<i64> = hist.deriv().iter().map(|d| d.signum()).collect();
    let last_var = last_rise_start(&signs)
        .map(|i| i + 1)
        .ok_or_else(|| Ambiguity("histogram never rises".to_string()))?;

    let mut under_th = n - 2;
    while counts[under_th] as f64 > threshold {
        if under_th == 0 {
            return Err(Ambiguity(
                "every bin is above the distribution threshold".to_string(),
            ));
        }
        under_th -= 1;
    }

    Ok(HistogramReading::Shaped {
        gap,
        last_var,
        under_th,
    })
}

/// Index of the first element of the last run of `1`s in `signs`.
pub fn last_rise_start(signs: &[i64]) -> Option<usize> {
    (1..signs.len())
        .rev()
        .find(|&i| signs[i] == 1 && signs[i - 1] != 1)
        .or_else(|| (signs.first() == Some(&1)).then_some(0))
}

/// Strict local maxima of `x`, endpoints excluded. A flat top counts once,
/// at its midpoint (rounded down).
pub fn local_maxima(x: &[i64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Label a shaped histogram with bin `counts` and pick its cut bin.
///
/// A last rise above the decision floor reads as `mua`, unless it climbs
/// out of an empty bin. Otherwise a trough in the derivative past the cut
/// moves the cut onto it (`noisy`); without one, an early cut means
/// `noisy` and a late one `good`.
pub fn classify(counts: &[usize], under_th: usize, last_var: usize, deriv: &[i64]) -> (Label, usize) {
    let n_bins = counts.len();
    let poi = under_th.max(last_var);

    if under_th < last_var && counts[last_var - 1] != 0 {
        return (Label::Mua, poi);
    }

    let tail_end = deriv.len().saturating_sub(1);
    let troughs = if poi < tail_end {
        let inverted: Vec<i64> = deriv[poi..tail_end].iter().map(|d| -d).collect();
        local_maxima(&inverted)
    } else {
        Vec::new()
    };

    match troughs.iter().max() {
        Some(&p) => (Label::Noisy, p + poi + 1),
        None => {
            let boundary = (NOISY_GOOD_BOUNDARY * n_bins as f64) as usize;
            let label = if poi < boundary {
                Label::Noisy
            } else {
                Label::Good
            };
            (label, poi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist_from_counts(counts: &[(usize, usize)]) -> CorrelationHistogram {
        let mut correlations = Vec::new();
        for &(bin, count) in counts {
            correlations.extend(std::iter::repeat(-1.0 + 0.05 * (bin as f64 + 0.5)).take(count));
        }
        CorrelationHistogram::new(&correlations, 0.05)
    }

    #[test]
    fn last_rise_start_finds_final_run() {
        assert_eq!(last_rise_start(&[1, 1, -1, 0, 1, 1, -1]), Some(4));
        assert_eq!(last_rise_start(&[1, 1, -1]), Some(0));
        assert_eq!(last_rise_start(&[0, -1, 0]), None);
    }

    #[test]
    fn local_maxima_handles_plateaus_and_edges() {
        assert_eq!(local_maxima(&[0, 2, 1, 3, 3, 3, 0, 5]), vec![1, 4]);
        assert_eq!(local_maxima(&[5, 1, 0]), Vec::<usize>::new());
        assert_eq!(local_maxima(&[0, 1, 1]), Vec::<usize>::new());
    }

    #[test]
    fn empty_last_bin_is_noise() {
        let hist = hist_from_counts(&[(10, 40)]);
        assert_eq!(read_histogram(&hist, 0.1), Ok(HistogramReading::Noise));
    }

    #[test]
    fn gapless_histogram_is_unanalyzable() {
        let all: Vec<(usize, usize)> = (0..40).map(|b| (b, 2)).collect();
        let hist = hist_from_counts(&all);
        assert_eq!(read_histogram(&hist, 0.1), Ok(HistogramReading::Unanalyzable));
    }

    #[test]
    fn two_bumps_read_as_mua() {
        let hist = hist_from_counts(&[
            (26, 20),
            (27, 100),
            (28, 300),
            (29, 600),
            (30, 800),
            (31, 600),
            (32, 300),
            (33, 150),
            (34, 300),
            (35, 800),
            (36, 1500),
            (37, 1800),
            (38, 900),
            (39, 600),
        ]);
        let reading = read_histogram(&hist, 8.77).unwrap();
        assert_eq!(
            reading,
            HistogramReading::Shaped {
                gap: 25,
                last_var: 34,
                under_th: 25
            }
        );
        assert_eq!(classify(hist.counts(), 25, 34, &hist.deriv()), (Label::Mua, 34));
    }

    #[test]
    fn derivative_trough_moves_cut() {
        let hist = hist_from_counts(&[
            (29, 100),
            (30, 250),
            (31, 380),
            (32, 470),
            (33, 500),
            (34, 600),
            (35, 650),
            (36, 670),
            (37, 600),
            (38, 450),
            (39, 330),
        ]);
        let reading = read_histogram(&hist, 5.0).unwrap();
        assert_eq!(
            reading,
            HistogramReading::Shaped {
                gap: 28,
                last_var: 29,
                under_th: 28
            }
        );
        assert_eq!(classify(hist.counts(), 28, 29, &hist.deriv()), (Label::Noisy, 33));
    }

    #[test]
    fn single_spike_bin_is_good() {
        let hist = hist_from_counts(&[(39, 500)]);
        let reading = read_histogram(&hist, 0.5).unwrap();
        assert_eq!(
            reading,
            HistogramReading::Shaped {
                gap: 38,
                last_var: 39,
                under_th: 38
            }
        );
        assert_eq!(classify(hist.counts(), 38, 39, &hist.deriv()), (Label::Good, 39));
    }

    #[test]
    fn early_cut_without_trough_is_noisy() {
        let counts = vec![0usize; 40];
        let deriv = vec![0i64; 39];
        assert_eq!(classify(&counts, 10, 10, &deriv), (Label::Noisy, 10));
        assert_eq!(classify(&counts, 30, 30, &deriv), (Label::Good, 30));
    }

    #[test]
    fn sparse_valley_between_bumps_is_mua() {
        let hist = hist_from_counts(&[
            (27, 500),
            (28, 500),
            (29, 500),
            (30, 500),
            (31, 2),
            (32, 300),
            (33, 500),
            (34, 700),
            (35, 900),
            (36, 800),
            (37, 600),
            (38, 500),
            (39, 300),
        ]);
        let reading = read_histogram(&hist, 6.602).unwrap();
        assert_eq!(
            reading,
            HistogramReading::Shaped {
                gap: 26,
                last_var: 32,
                under_th: 31
            }
        );
        assert_eq!(classify(hist.counts(), 31, 32, &hist.deriv()), (Label::Mua, 32));
    }

    #[test]
    fn rise_out_of_an_empty_bin_is_not_mua() {
        let hist = hist_from_counts(&[(37, 500), (38, 1500), (39, 3000)]);
        let reading = read_histogram(&hist, 5.0).unwrap();
        assert_eq!(
            reading,
            HistogramReading::Shaped {
                gap: 36,
                last_var: 37,
                under_th: 36
            }
        );
        assert_eq!(classify(hist.counts(), 36, 37, &hist.deriv()), (Label::Good, 37));
    }
}
