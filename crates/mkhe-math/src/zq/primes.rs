//! Generation of NTT-friendly primes.

use mkhe_util::is_prime;

/// Generate a `num_bits`-bit prime, congruent to 1 mod `modulo`, strictly
/// smaller than `upper_bound`. Note that `num_bits` must belong to (10..=62),
/// and upper_bound must be <= 1 << num_bits.
pub fn generate_prime(num_bits: usize, modulo: u64, upper_bound: u64) -> Option<u64> {
    if !(10..=62).contains(&num_bits) || modulo == 0 || upper_bound > (1u64 << num_bits) {
        return None;
    }

    let leading_zeros = (64 - num_bits) as u32;
    let has_size = |p: u64| p.leading_zeros() == leading_zeros;

    // Largest candidate congruent to 1 mod `modulo` below the bound.
    let mut candidate = upper_bound.checked_sub(1)?;
    candidate -= (candidate + modulo - 1) % modulo;

    while has_size(candidate) {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_sub(modulo)?;
    }
    None
}

/// Generate `count` distinct primes of `num_bits` bits congruent to 1 mod
/// `modulo`, skipping the primes listed in `exclude`.
pub fn generate_primes(
    num_bits: usize,
    modulo: u64,
    count: usize,
    exclude: &[u64],
) -> Option<Vec<u64>> {
    let mut primes = Vec::with_capacity(count);
    let mut upper_bound = 1u64.checked_shl(num_bits as u32)?;
    while primes.len() < count {
        let p = generate_prime(num_bits, modulo, upper_bound)?;
        if !exclude.contains(&p) {
            primes.push(p);
        }
        upper_bound = p;
    }
    Some(primes)
}
