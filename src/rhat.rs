use crate::draws::Draws;
use crate::utils::{mean, min_chain_len, sample_variance, split_chains};
use crate::{Chain, Chains};
use anyhow::{anyhow, Error, Result};

/// Computes the potential scale reduction (Rhat) for the specified
/// parameter across all kept samples.  Chains are trimmed from the
/// back to match the length of the shortest chain.
///
/// See more details in Stan reference manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/2_24/reference-manual/notation-for-samples-chains-and-draws.html#potential-scale-reduction).
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_potential_scale_reduction.hpp]()
pub fn potential_scale_reduction_factor(chains: &[Chain]) -> Result<f64, Error> {
    if chains.len() < 2 {
        return Err(anyhow!("Rhat requires at least 2 chains, got {}", chains.len()));
    }
    let n = min_chain_len(chains)?;
    let mut chain_mean: Chain = Vec::with_capacity(chains.len());
    let mut chain_var: Chain = Vec::with_capacity(chains.len());

    for chain in chains {
        chain_mean.push(mean(&chain[..n])?);
        chain_var.push(sample_variance(&chain[..n])?);
    }

    let n = n as f64;
    let var_between = n * sample_variance(&chain_mean)?;
    let var_within = mean(&chain_var)?;
    Ok(((var_between / var_within + n - 1.0) / n).sqrt())
}

/// Computes the split potential scale reduction (Rhat) for the
/// specified parameter across all kept samples.  When the number of
/// total draws N is odd, the (N+1)/2th draw is ignored.
///
/// Chains are trimmed from the back to match the
/// length of the shortest chain.  A single chain is split in two, so one
/// chain of at least four draws is enough.
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_potential_scale_reduction.hpp]()
pub fn split_potential_scale_reduction_factor(chains: &[Chain]) -> Result<f64, Error> {
    let num_draws = min_chain_len(chains)?;
    let trimmed: Chains = chains.iter().map(|c| c[..num_draws].to_vec()).collect();
    let split = split_chains(trimmed)?;
    potential_scale_reduction_factor(&split)
}

/// Split Rhat of every parameter in `draws`, in draws order.
pub fn rhat_all(draws: &Draws) -> Result<Vec<(String, f64)>, Error> {
    draws
        .parameters()
        .iter()
        .map(|name| {
            let chains = draws.chains(name)?;
            let rhat = split_potential_scale_reduction_factor(&chains)
                .map_err(|e| anyhow!("Rhat for '{}': {}", name, e))?;
            Ok((name.clone(), rhat))
        })
        .collect()
}
