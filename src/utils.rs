use crate::Chains;
use anyhow::{anyhow, Error, Result};
use arima::acf;
use average::{Mean, Variance};

/// Compute the arithmetic mean of an array.
pub fn mean(arr: &[f64]) -> Result<f64, Error> {
    if arr.is_empty() {
        return Err(anyhow!("Can't take mean of empty array"));
    }
    let m: Mean = arr.iter().copied().collect();
    Ok(m.mean())
}

/// Compute the sample variance of an array using Bessel's correction.
pub fn sample_variance(arr: &[f64]) -> Result<f64, Error> {
    if arr.len() < 2 {
        return Err(anyhow!(
            "Can't take sample variance of {} value(s), need at least 2",
            arr.len()
        ));
    }
    let v: Variance = arr.iter().copied().collect();
    Ok(v.sample_variance())
}

/// Sample standard deviation.
pub fn sample_sd(arr: &[f64]) -> Result<f64, Error> {
    Ok(sample_variance(arr)?.sqrt())
}

/// Concatenates chains end to end.
pub fn flatten(chains: &[Vec<f64>]) -> Vec<f64> {
    chains.iter().flat_map(|c| c.iter().copied()).collect()
}

/// Length of the shortest chain.
pub fn min_chain_len(chains: &[Vec<f64>]) -> Result<usize, Error> {
    chains
        .iter()
        .map(|c| c.len())
        .min()
        .ok_or_else(|| anyhow!("No chains supplied"))
}

/// Splits each chain into two chains of equal length.  When the
/// number of total draws N is odd, the (N+1)/2th draw is ignored.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation).
///
/// Current implementation assumes chains are all of equal size.
pub fn split_chains(chains: Chains) -> Result<Chains, Error> {
    if chains.is_empty() {
        return Err(anyhow!("Can't split empty array of chains"));
    }
    let num_draws = min_chain_len(&chains)?;
    if num_draws < 1 {
        return Err(anyhow!("No samples to split"));
    }
    let (half, offset) = if num_draws % 2 == 0 {
        (num_draws / 2, 0)
    } else {
        ((num_draws - 1) / 2, 1)
    };
    let mut split_draws = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        split_draws.push(chain[..half].to_vec());
        split_draws.push(chain[(half + offset)..num_draws].to_vec());
    }
    Ok(split_draws)
}

/// Sample quantile by linear interpolation between order statistics
/// (Hyndman and Fan type 7, the default in R and numpy).
pub fn quantile(sorted: &[f64], p: f64) -> Result<f64, Error> {
    if sorted.is_empty() {
        return Err(anyhow!("Can't take quantile of empty array"));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(anyhow!("Quantile probability must be in [0, 1], got {}", p));
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Ok(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Returns a sorted copy, NaN free input assumed.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Counts values into `bins` equal-width bins over `[lo, hi]`; the last bin
/// is closed on the right.  Returns `(left, right, count)` per bin.
pub fn bin_counts(
    values: &[f64],
    bins: usize,
    lo: f64,
    hi: f64,
) -> Result<Vec<(f64, f64, usize)>, Error> {
    if bins == 0 {
        return Err(anyhow!("Number of bins must be positive"));
    }
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return Err(anyhow!("Invalid histogram range [{}, {}]", lo, hi));
    }
    let (lo, hi) = if hi == lo { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, n)| (lo + i as f64 * width, lo + (i + 1) as f64 * width, n))
        .collect())
}

/// Equal-width histogram over the range of the data.
pub fn histogram(values: &[f64], bins: usize) -> Result<Vec<(f64, f64, usize)>, Error> {
    let s = sorted(values);
    let (lo, hi) = match (s.first(), s.last()) {
        (Some(lo), Some(hi)) => (*lo, *hi),
        _ => return Err(anyhow!("Can't build histogram of empty array")),
    };
    bin_counts(values, bins, lo, hi)
}

/// Ranks with ties replaced by their average rank, 1-based.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            ranks[k] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Kernel density bandwidth by Silverman's rule of thumb, matching R's
/// `bw.nrd0`.
pub fn silverman_bandwidth(values: &[f64]) -> Result<f64, Error> {
    let sd = sample_sd(values)?;
    let s = sorted(values);
    let iqr = quantile(&s, 0.75)? - quantile(&s, 0.25)?;
    let mut lo = sd.min(iqr / 1.34);
    if lo <= 0.0 {
        lo = if sd > 0.0 {
            sd
        } else if s[0] != 0.0 {
            s[0].abs()
        } else {
            1.0
        };
    }
    Ok(0.9 * lo * (values.len() as f64).powf(-0.2))
}

/// Number of grid points in a density estimate.
pub const DENSITY_POINTS: usize = 512;

/// Gaussian kernel density estimate evaluated on an even grid extending three
/// bandwidths past the data.
pub fn kernel_density(values: &[f64]) -> Result<Vec<(f64, f64)>, Error> {
    let bw = silverman_bandwidth(values)?;
    let s = sorted(values);
    let lo = s[0] - 3.0 * bw;
    let hi = s[s.len() - 1] + 3.0 * bw;
    let step = (hi - lo) / (DENSITY_POINTS - 1) as f64;
    let norm = 1.0 / (values.len() as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());
    Ok((0..DENSITY_POINTS)
        .map(|i| {
            let x = lo + i as f64 * step;
            let d = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bw;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>();
            (x, d * norm)
        })
        .collect())
}

/// Autocorrelation of a chain for lags `0..=lags`.
pub fn autocorrelation(chain: &[f64], lags: usize) -> Result<Vec<f64>, Error> {
    if lags >= chain.len() {
        return Err(anyhow!(
            "Number of lags ({}) must be smaller than the number of draws ({})",
            lags,
            chain.len()
        ));
    }
    acf::acf(chain, Some(lags), false)
        .map_err(|_| anyhow!("Failed to compute autocorrelation"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chain;

    #[test]
    fn test_stats() {
        // Test our basic stats functions using numbers computed with numpy.
        let arr = vec![
            2.13829088,
            -1.06214379,
            -0.79265699,
            -0.21300888,
            -1.07155142,
            -0.50425317,
            0.95708854,
            -1.23854172,
            1.37124938,
            1.17658286,
        ];
        let empty: Chain = vec![];
        assert_abs_diff_eq!(
            sample_variance(&arr).unwrap(),
            1.492596054209826,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(mean(&arr).unwrap(), 0.07610557018217139, epsilon = 1e-6);

        assert!(sample_variance(&empty).is_err());
        assert!(sample_variance(&[1.0]).is_err());
        assert!(mean(&empty).is_err());
    }

    #[test]
    fn test_split_empty_chains() {
        let chains = vec![vec![1.0], vec![], vec![]];
        assert!(split_chains(chains).is_err());
        assert!(split_chains(vec![vec![], vec![]]).is_err());
        assert!(split_chains(vec![]).is_err());
    }

    #[test]
    fn test_split_odd_chains() {
        // The middle value gets dropped per the Stan reference implementation
        let chains = vec![vec![1.0, 2.0, 3.0, 4.0, 4.5], vec![5.0, 6.0, 7.0, 8.0, 8.5]];
        let split = split_chains(chains).unwrap();
        assert_eq!(split[0], vec![1.0, 2.0]);
        assert_eq!(split[1], vec![4.0, 4.5]);
        assert_eq!(split[2], vec![5.0, 6.0]);
        assert_eq!(split[3], vec![8.0, 8.5]);
    }

    #[test]
    fn test_quantile_type7() {
        // numpy.quantile([1, 2, 3, 4], [0.25, 0.5, 0.9])
        let s = vec![1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(quantile(&s, 0.25).unwrap(), 1.75, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&s, 0.5).unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&s, 0.9).unwrap(), 3.7, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&s, 1.0).unwrap(), 4.0, epsilon = 1e-12);
        assert!(quantile(&s, 1.5).is_err());
        assert!(quantile(&[], 0.5).is_err());
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = vec![0.0, 0.1, 0.5, 0.9, 1.0];
        let bins = histogram(&values, 2).unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0], (0.0, 0.5, 2));
        assert_eq!(bins[1], (0.5, 1.0, 3));

        // constant input gets a unit wide range
        let bins = histogram(&[2.0, 2.0], 1).unwrap();
        assert_eq!(bins[0], (1.5, 2.5, 2));
        assert!(histogram(&values, 0).is_err());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[10.0, 30.0, 20.0, 20.0]);
        assert_eq!(ranks, vec![1.0, 4.0, 2.5, 2.5]);
    }

    #[test]
    fn test_kernel_density_integrates_to_one() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 / 10.0).collect();
        let density = kernel_density(&values).unwrap();
        assert_eq!(density.len(), DENSITY_POINTS);
        let step = density[1].0 - density[0].0;
        let area: f64 = density.iter().map(|(_, d)| d * step).sum();
        assert_abs_diff_eq!(area, 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_silverman_bandwidth_matches_r() {
        // bw.nrd0(c(1, 2, 3, 4, 5)) in R
        let bw = silverman_bandwidth(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let expected = 0.9 * (2.0 / 1.34f64).min(2.5f64.sqrt()) * 5f64.powf(-0.2);
        assert_abs_diff_eq!(bw, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_autocorrelation_lag_zero_is_one() {
        let chain = vec![0.3, -0.1, 0.8, 0.2, -0.5, 0.4, 0.0, 0.9];
        let acf = autocorrelation(&chain, 3).unwrap();
        assert_eq!(acf.len(), 4);
        assert_abs_diff_eq!(acf[0], 1.0, epsilon = 1e-12);
        assert!(autocorrelation(&chain, 8).is_err());
    }
}
