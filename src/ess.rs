use crate::draws::Draws;
use crate::utils::{flatten, mean, min_chain_len, sample_variance, split_chains};
use crate::{Chain, Chains};
use anyhow::{anyhow, Error, Result};
use arima::acf;

/// Computes the effective sample size (ESS) for the specified
/// parameter across all kept samples.  The value returned is the
/// minimum of ESS and the number_total_draws * log10(number_total_draws).
///
/// Chains are trimmed from the back to match the
/// length of the shortest chain.  Note that the effective sample size
/// can not be estimated with fewer than four draws.
///
/// Geyer's truncated autocorrelation sum `tau_hat` is bounded below by
/// `1 / log10(number_total_draws)` as in Stan 2.26 and later, so nearly
/// antithetic chains yield the upper limit instead of a negative ESS.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation)
///
/// Based on reference implementation in Stan v2.26.0 at
/// [https://github.com/stan-dev/stan/blob/v2.26.0/src/stan/analyze/mcmc/compute_effective_sample_size.hpp]()
///
///
/// # Arguments
/// * `chains` - Reference to a vector of chains, each of which is a vector of samples for
///              the same parameter
pub fn compute_effective_sample_size(chains: &[Chain]) -> Result<f64, Error> {
    let num_chains = chains.len();
    let num_draws = min_chain_len(chains)?;

    if num_draws < 4 {
        return Err(anyhow!("Must have at least 4 samples to compute ESS"));
    }

    let first = chains[0][0];
    let mut all_same = true;
    for chain in chains {
        for value in &chain[..num_draws] {
            if !value.is_finite() {
                return Err(anyhow!("All values must be finite to compute ESS"));
            }
            // stays true only if every element of every chain equals the first
            all_same &= (value - first).abs() < 1e-10;
        }
    }
    if all_same {
        return Err(anyhow!(
            "No ESS when elements are all constant (value={})",
            first
        ));
    }

    let mut chain_acov: Chains = Vec::with_capacity(num_chains);
    let mut chain_mean: Chain = Vec::with_capacity(num_chains);
    let mut chain_var: Chain = Vec::with_capacity(num_chains);
    for chain in chains {
        let chain = &chain[..num_draws];
        let acov = acf::acf(chain, None, true)
            .map_err(|_| anyhow!("Failed to compute autocovariance"))?;
        chain_mean.push(mean(chain)?);
        chain_var.push(acov[0] * num_draws as f64 / (num_draws as f64 - 1.0));
        chain_acov.push(acov);
    }

    let mean_var = mean(&chain_var)?;
    let mut var_plus = mean_var * (num_draws as f64 - 1.0) / num_draws as f64;
    if num_chains > 1 {
        var_plus += sample_variance(&chain_mean)?;
    }

    let mut rho_hat_s: Chain = vec![0.0; num_draws];
    let mut acov_s: Chain = chain_acov.iter().map(|acov| acov[1]).collect();
    let mut rho_hat_even = 1.0;
    rho_hat_s[0] = rho_hat_even;
    let mut rho_hat_odd = 1.0 - (mean_var - mean(&acov_s)?) / var_plus;
    rho_hat_s[1] = rho_hat_odd;

    // Convert raw autocovariance estimators into Geyer's initial
    // positive sequence. Loop only until num_draws - 4 to
    // leave the last pair of autocorrelations as a bias term that
    // reduces variance in the case of antithetical chains.
    let mut s = 1;
    while s < (num_draws - 4) && (rho_hat_even + rho_hat_odd) > 0.0 {
        for (a, acov) in acov_s.iter_mut().zip(&chain_acov) {
            *a = acov[s + 1];
        }
        rho_hat_even = 1.0 - (mean_var - mean(&acov_s)?) / var_plus;
        for (a, acov) in acov_s.iter_mut().zip(&chain_acov) {
            *a = acov[s + 2];
        }
        rho_hat_odd = 1.0 - (mean_var - mean(&acov_s)?) / var_plus;
        if (rho_hat_even + rho_hat_odd) >= 0.0 {
            rho_hat_s[s + 1] = rho_hat_even;
            rho_hat_s[s + 2] = rho_hat_odd;
        }
        s += 2;
    }

    let max_s = s;
    // used in the improved estimate, which reduces variance
    // in antithetic case -- see tau_hat below
    if rho_hat_even > 0.0 {
        rho_hat_s[max_s + 1] = rho_hat_even;
    }

    // Convert Geyer's initial positive sequence into an initial
    // monotone sequence
    let mut s = 1;
    while max_s >= 3 && s <= (max_s - 3) {
        if (rho_hat_s[s + 1] + rho_hat_s[s + 2]) > (rho_hat_s[s - 1] + rho_hat_s[s]) {
            rho_hat_s[s + 1] = (rho_hat_s[s - 1] + rho_hat_s[s]) / 2.0;
            rho_hat_s[s + 2] = rho_hat_s[s + 1];
        };
        s += 2;
    }

    let num_total_draws = num_chains as f64 * num_draws as f64;
    // Geyer's truncated estimator for the asymptotic variance
    // Improved estimate reduces variance in antithetic case
    let tau_hat: f64 =
        -1.0 + 2.0 * rho_hat_s.iter().take(max_s).sum::<f64>() + rho_hat_s[max_s + 1];
    // lower bound on tau_hat as in Stan >= 2.26
    let tau_hat = tau_hat.max(1.0 / num_total_draws.log10());
    let option1: f64 = num_total_draws / tau_hat;
    let option2: f64 = num_total_draws * num_total_draws.log10();
    Ok(option1.min(option2))
}

/// Computes the split effective sample size (ESS) for the specified
/// parameter across all kept samples.  When the number of total draws N
/// is odd, the (N+1)/2th draw is ignored.
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_effective_sample_size.hpp#L185-L199]()
pub fn compute_split_effective_sample_size(chains: &[Chain]) -> Result<f64, Error> {
    let num_draws = min_chain_len(chains)?;
    let trimmed: Chains = chains.iter().map(|c| c[..num_draws].to_vec()).collect();
    let split = split_chains(trimmed)?;
    compute_effective_sample_size(&split)
}

/// Computes the Monte Carlo Standard Error (MCSE) for the specified parameter
/// across all samples, which is the standard deviation of the samples over the
/// square root of effective sample size.
///
/// See the Stan reference manual section
/// ["Estimation of MCMC Standard Error"](https://mc-stan.org/docs/2_24/reference-manual/effective-sample-size-section.html#estimation-of-mcmc-standard-error)
pub fn compute_estimated_mcse(chains: &[Chain]) -> Result<f64, Error> {
    let ess = compute_effective_sample_size(chains)?;
    let var = sample_variance(&flatten(chains))?;
    Ok((var / ess).sqrt())
}

/// Ratio of split ESS to the total number of draws for every parameter in
/// `draws`, in draws order.
pub fn neff_ratio_all(draws: &Draws) -> Result<Vec<(String, f64)>, Error> {
    let total = draws.num_draws() as f64;
    draws
        .parameters()
        .iter()
        .map(|name| {
            let chains = draws.chains(name)?;
            let ess = compute_split_effective_sample_size(&chains)
                .map_err(|e| anyhow!("ESS for '{}': {}", name, e))?;
            Ok((name.clone(), ess / total))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_identical_autocovariance_in_arima_library_and_stan() {
        let arr = vec![
            0.747858687681513,
            0.290118161168511,
            -0.66263075102762,
            -0.00794439358648058,
            0.612494029879686,
            1.15915333101436,
            0.844402455747637,
            -0.493298834393585,
            0.140306938408938,
            -0.207331367372662,
            0.344322796977632,
            -0.216755313401662,
            -0.704730639551491,
            -0.262457923752462,
            0.338587814578015,
            0.79334841402936,
            -0.495245866959037,
            -0.736378128523917,
            -1.10220108378805,
            2.37069694852591,
        ];
        let stan_acov = vec![
            0.6269672577,
            -0.0113804234,
            -0.1668563930,
            -0.2086591087,
            0.1016590536,
            0.1767212413,
            -0.0059714922,
            -0.1489622883,
            -0.0996503101,
            0.0996094900,
            0.0450098619,
            -0.0109203038,
            -0.2154921627,
            -0.0374684937,
            0.1274360411,
            0.1121981758,
            0.0073812983,
            -0.1254719533,
            -0.0208019612,
            0.0681360996,
        ];
        let arima_acf_cov = acf::acf(&arr, None, true).unwrap();

        for i in 0..arr.len() {
            assert_abs_diff_eq!(arima_acf_cov[i], stan_acov[i], epsilon = 1e-10);
        }
    }

    #[test]
    pub fn compute_effective_sample_size_minimum_n() {
        let chains = vec![vec![1.0, 2.0, 3.0]];
        assert!(compute_effective_sample_size(&chains).is_err());
    }

    #[test]
    pub fn compute_effective_sample_size_sufficient_n() {
        let chains = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let ess = compute_effective_sample_size(&chains);
        assert!(ess.unwrap().is_finite());
    }

    #[test]
    pub fn compute_effective_sample_size_nan() {
        let chains = vec![vec![1.0, f64::NAN, 3.0, 4.0]];
        assert!(compute_effective_sample_size(&chains).is_err());
    }

    #[test]
    pub fn compute_effective_sample_size_constant() {
        let chains = vec![vec![1.0, 1.0, 1.0, 1.0], vec![1.0, 1.0, 1.0, 1.0]];
        let err = compute_effective_sample_size(&chains).unwrap_err();
        assert!(err.to_string().contains("constant"));
    }

    /// AR(1) chain with coefficient 0.8 and deterministic innovations.
    fn ar1(seed: usize, n: usize) -> Chain {
        let mut x = vec![0.0; n];
        for t in 1..n {
            x[t] = 0.8 * x[t - 1] + ((t * 37 + seed) % 23) as f64 / 23.0 - 0.5;
        }
        x
    }

    #[test]
    fn test_ess_reference_values() {
        // reference values from an independent transcription of the Stan
        // algorithm
        let chains = vec![ar1(11, 40), ar1(5, 40)];
        let ess = compute_effective_sample_size(&chains).unwrap();
        assert_abs_diff_eq!(ess, 38.339066679759, epsilon = 1e-8);
        let split = compute_split_effective_sample_size(&chains).unwrap();
        assert_abs_diff_eq!(split, 40.061864260477, epsilon = 1e-8);
    }

    #[test]
    fn test_alternating_chain() {
        // rho_1 ~ -1 stops the initial positive sequence at once, tau_hat = 2
        let chain: Chain = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let ess = compute_effective_sample_size(&[chain]).unwrap();
        assert_abs_diff_eq!(ess, 10.0, epsilon = 1e-10);
    }

    #[test]
    fn test_nearly_antithetic_chain_hits_upper_limit() {
        // unbounded tau_hat is about -0.149 here
        let chain: Chain = (0..20)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                sign * (1.0 + 0.1 * (((i * 7) % 5) as f64 - 2.0) / 2.0)
            })
            .collect();
        let ess = compute_effective_sample_size(&[chain]).unwrap();
        assert_abs_diff_eq!(ess, 20.0 * 20f64.log10(), epsilon = 1e-9);
    }

    #[test]
    fn test_mcse_is_positive() {
        let a: Chain = (0..40).map(|i| ((i * 13) % 17) as f64).collect();
        let b: Chain = (0..40).map(|i| ((i * 5) % 11) as f64).collect();
        let mcse = compute_estimated_mcse(&[a, b]).unwrap();
        assert!(mcse > 0.0 && mcse.is_finite());
    }

    #[test]
    fn test_neff_ratio_all() {
        let values = Array3::from_shape_fn((40, 2, 1), |(i, c, _)| {
            ((i * 13 + c * 7) % 17) as f64
        });
        let draws = Draws::new(values, vec!["mu".to_string()]).unwrap();
        let ratios = neff_ratio_all(&draws).unwrap();
        assert_eq!(ratios[0].0, "mu");
        assert!(ratios[0].1 > 0.0);
    }
}
