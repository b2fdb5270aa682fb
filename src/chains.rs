/*!
# Chain Reshaping

The three pure stages between the raw, validity-filtered sample stream and a
rectangular `(n_chains, n_draws)` array:

1. [`split_by_chain`] de-interleaves a flat stream into one sequence per walker.
2. [`equally_weight`] expands every state by its multiplicity.
3. [`equal_length_stack`] truncates all chains to the shortest one and stacks them.

```rust
use twalk_reader::chains::{equal_length_stack, equally_weight, split_by_chain};

let values = [1.0, 10.0, 2.0, 20.0, 3.0];
let chain: [usize; 5] = [0, 1, 0, 1, 0];
let mult: [i64; 5] = [1, 2, 1, 1, 1];

let values = split_by_chain(&values, &chain, 2).unwrap();
let mults = split_by_chain(&mult, &chain, 2).unwrap();
assert_eq!(values, vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0]]);

let weighted: Vec<Vec<f64>> = values
    .iter()
    .zip(&mults)
    .map(|(v, m)| equally_weight(v, m))
    .collect::<Result<_, _>>()
    .unwrap();
assert_eq!(weighted[1], vec![10.0, 10.0, 20.0]);

let stacked = equal_length_stack(&weighted).unwrap();
assert_eq!(stacked.shape(), &[2, 3]);
```
*/

use ndarray::Array2;

use crate::error::{Result, TwalkError};

/// Partitions `values` into `n_chains` buckets by the parallel `chain` index.
///
/// Relative order inside each bucket is preserved. A chain index that never
/// occurs yields an empty bucket. `chain` must already be filtered exactly like
/// `values`.
pub fn split_by_chain<T: Clone>(
    values: &[T],
    chain: &[usize],
    n_chains: usize,
) -> Result<Vec<Vec<T>>> {
    if values.len() != chain.len() {
        return Err(TwalkError::LengthMismatch {
            expected: chain.len(),
            found: values.len(),
        });
    }

    let mut buckets: Vec<Vec<T>> = vec![Vec::new(); n_chains];
    for (value, &c) in values.iter().zip(chain) {
        let bucket = buckets.get_mut(c).ok_or_else(|| {
            TwalkError::MalformedStore(format!(
                "chain index {c} out of range for {n_chains} chains"
            ))
        })?;
        bucket.push(value.clone());
    }
    Ok(buckets)
}

/// Repeats every `values[i]` exactly `mults[i]` times, in position order.
///
/// A multiplicity of zero drops the state. A negative multiplicity is rejected
/// rather than clamped, and so is one that pushes the total past `usize`. An
/// expansion too large to allocate fails with [`TwalkError::Allocation`].
///
/// # Examples
///
/// ```rust
/// use twalk_reader::chains::equally_weight;
///
/// let out = equally_weight(&['a', 'b', 'c'], &[2, 0, 1]).unwrap();
/// assert_eq!(out, vec!['a', 'a', 'c']);
/// ```
pub fn equally_weight<T: Clone>(values: &[T], mults: &[i64]) -> Result<Vec<T>> {
    if values.len() != mults.len() {
        return Err(TwalkError::LengthMismatch {
            expected: values.len(),
            found: mults.len(),
        });
    }

    let mut total = 0usize;
    for (position, &m) in mults.iter().enumerate() {
        total = usize::try_from(m)
            .ok()
            .and_then(|m| total.checked_add(m))
            .ok_or(TwalkError::InvalidMultiplicity {
                position,
                value: m as f64,
            })?;
    }

    let mut out = Vec::new();
    out.try_reserve_exact(total)?;
    for (value, &m) in values.iter().zip(mults) {
        out.extend(std::iter::repeat(value).take(m as usize).cloned());
    }
    Ok(out)
}

/// Stacks chains of differing length as rows of one array, keeping only the
/// first `min(len)` elements of each.
///
/// Fails with [`TwalkError::NoChains`] when `chains` is empty. An empty chain is
/// not an error; it collapses the result to zero columns.
///
/// # Examples
///
/// ```rust
/// use ndarray::arr2;
/// use twalk_reader::chains::equal_length_stack;
///
/// let stacked = equal_length_stack(&[vec![1, 2, 3], vec![4, 5]]).unwrap();
/// assert_eq!(stacked, arr2(&[[1, 2], [4, 5]]));
/// ```
pub fn equal_length_stack<T: Clone>(chains: &[Vec<T>]) -> Result<Array2<T>> {
    let n = chains
        .iter()
        .map(Vec::len)
        .min()
        .ok_or(TwalkError::NoChains)?;
    Ok(Array2::from_shape_fn((chains.len(), n), |(c, i)| {
        chains[c][i].clone()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_split_preserves_order_and_count() {
        let values = [0.5, 1.5, 2.5, 3.5, 4.5, 5.5];
        let chain = [2, 0, 2, 1, 0, 2];
        let out = split_by_chain(&values, &chain, 3).unwrap();

        assert_eq!(out[0], vec![1.5, 4.5]);
        assert_eq!(out[1], vec![3.5]);
        assert_eq!(out[2], vec![0.5, 2.5, 5.5]);
        assert_eq!(out.iter().map(Vec::len).sum::<usize>(), values.len());
    }

    #[test]
    fn test_split_empty_chain_is_empty_bucket() {
        let out = split_by_chain(&[1, 2], &[0, 2], 3).unwrap();
        assert_eq!(out, vec![vec![1], vec![], vec![2]]);
    }

    #[test]
    fn test_split_rejects_out_of_range_index() {
        let res = split_by_chain(&[1, 2], &[0, 3], 2);
        assert!(matches!(res, Err(TwalkError::MalformedStore(_))));
    }

    #[test]
    fn test_split_rejects_length_mismatch() {
        let res = split_by_chain(&[1, 2, 3], &[0, 0], 1);
        assert!(matches!(
            res,
            Err(TwalkError::LengthMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_equally_weight_expands_in_order() {
        let out = equally_weight(&["a", "b", "c"], &[2, 0, 1]).unwrap();
        assert_eq!(out, vec!["a", "a", "c"]);
    }

    #[test]
    fn test_equally_weight_all_zero() {
        let out = equally_weight(&[1.0, 2.0], &[0, 0]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_equally_weight_rejects_negative() {
        let res = equally_weight(&[1.0, 2.0, 3.0], &[1, -2, 1]);
        match res {
            Err(TwalkError::InvalidMultiplicity { position, value }) => {
                assert_eq!(position, 1);
                assert_eq!(value, -2.0);
            }
            other => panic!("Expected InvalidMultiplicity, got {:?}", other),
        }
    }

    #[test]
    fn test_equally_weight_overflowing_total() {
        let res = equally_weight(&[1.0, 2.0, 3.0], &[i64::MAX; 3]);
        assert!(matches!(res, Err(TwalkError::InvalidMultiplicity { .. })));
    }

    #[test]
    fn test_equally_weight_unallocatable() {
        let res = equally_weight(&[1.0], &[i64::MAX]);
        assert!(matches!(res, Err(TwalkError::Allocation(_))));
    }

    #[test]
    fn test_stack_truncates_to_shortest() {
        let out = equal_length_stack(&[vec![1, 2, 3], vec![4, 5]]).unwrap();
        assert_eq!(out, arr2(&[[1, 2], [4, 5]]));
    }

    #[test]
    fn test_stack_with_empty_chain_has_zero_columns() {
        let out = equal_length_stack(&[vec![1.0, 2.0], vec![]]).unwrap();
        assert_eq!(out.shape(), &[2, 0]);
    }

    #[test]
    fn test_stack_without_chains_fails() {
        let chains: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            equal_length_stack(&chains),
            Err(TwalkError::NoChains)
        ));
    }
}
