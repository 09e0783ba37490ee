//! Property-based tests for tensor shape operations
//!
//! This module uses proptest to verify that shape bookkeeping never touches
//! the element buffer.

#[cfg(test)]
mod tests {
    use crate::DenseND;
    use proptest::prelude::*;

    // Ranks 2-4 with small extents, matching the tensors operators see
    fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..6, 2..=4)
    }

    fn iota(shape: &[usize]) -> DenseND<f64> {
        let len: usize = shape.iter().product();
        DenseND::from_vec((0..len).map(|x| x as f64).collect(), shape).unwrap()
    }

    proptest! {
        #[test]
        fn prop_unsqueeze_shape_law(shape in shape_strategy(), pick in 0usize..16) {
            let tensor = iota(&shape);
            let rank = tensor.rank();
            let axis = pick % (rank + 1);

            let out = tensor.unsqueeze(axis).unwrap();

            let mut expected = shape.clone();
            expected.insert(axis, 1);
            prop_assert_eq!(out.rank(), rank + 1);
            prop_assert_eq!(out.shape(), expected.as_slice());
            prop_assert_eq!(out.to_vec(), tensor.to_vec());
        }

        #[test]
        fn prop_negative_axis_matches_positive(shape in shape_strategy(), pick in 0usize..16) {
            let tensor = iota(&shape);
            let rank = tensor.rank() as isize;
            let positive = (pick as isize) % (rank + 1);
            let negative = positive - rank - 1;

            let a = tensor.unsqueeze_signed(positive).unwrap();
            let b = tensor.unsqueeze_signed(negative).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_reshape_roundtrip(shape in shape_strategy()) {
            let tensor = iota(&shape);
            let flat = tensor.reshape(&[tensor.len()]).unwrap();
            let restored = flat.reshape(&shape).unwrap();
            prop_assert_eq!(restored, tensor);
        }
    }
}
