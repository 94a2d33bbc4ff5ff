use num_traits::{Float, FromPrimitive};

/// `n` evenly spaced values from `start` to `end`, both ends
/// inclusive. `n` must be at least 2.
pub fn linspace<T>(start: T, end: T, n: usize) -> impl Iterator<Item = T>
where
    T: Float + FromPrimitive,
{
    let step = (end - start) / T::from(n - 1).unwrap();
    (0..n).map(move |i| start + T::from(i).unwrap() * step)
}

#[cfg(test)]
mod tests {
    use super::linspace;

    #[test]
    fn test_endpoints_inclusive() {
        let values: Vec<f64> = linspace(42.0, 43.0, 5).collect();
        assert_eq!(values, vec![42.0, 42.25, 42.5, 42.75, 43.0]);
    }

    #[test]
    fn test_two_points_are_the_endpoints() {
        let values: Vec<f64> = linspace(-1.5, 2.5, 2).collect();
        assert_eq!(values, vec![-1.5, 2.5]);
    }

    #[test]
    fn test_descending() {
        let values: Vec<f64> = linspace(1.0, 0.0, 3).collect();
        assert_eq!(values, vec![1.0, 0.5, 0.0]);
    }
}
