use std::ops::Neg;

/// Linear phase filter stored as its right half, centre tap first.
///
/// A whole sample symmetric (WSS) filter has odd length and its centre tap
/// is shared by both halves. A half sample symmetric (HSS) filter has even
/// length and is mirrored between its two middle taps.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<F> {
    WSS(Vec<F>),
    HSS(Vec<F>),
}

/// How the left half of a filter mirrors the stored right half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    Symmetric,
    Antisymmetric,
}

impl<F> Filter<F>
where
    F: Copy + Neg<Output = F>,
{
    /// Keeps the right half of `taps`.
    pub fn from_taps(taps: &[F]) -> Self {
        Self::from_half(taps[taps.len() >> 1..].to_vec(), taps.len())
    }

    /// Wraps a stored half for a filter of `len` taps.
    pub fn from_half(half: Vec<F>, len: usize) -> Self {
        if len % 2 == 1 {
            Filter::WSS(half)
        } else {
            Filter::HSS(half)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Filter::WSS(half) => (half.len() * 2).saturating_sub(1),
            Filter::HSS(half) => half.len() * 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.half().is_empty()
    }

    pub fn half(&self) -> &[F] {
        match self {
            Filter::WSS(half) | Filter::HSS(half) => half,
        }
    }

    /// All taps, left half rebuilt from the stored one.
    pub fn taps(&self, symmetry: Symmetry) -> Vec<F> {
        let (half, shared) = match self {
            Filter::WSS(half) => (half, 1),
            Filter::HSS(half) => (half, 0),
        };
        let mirror = |tap: &F| match symmetry {
            Symmetry::Symmetric => *tap,
            Symmetry::Antisymmetric => -*tap,
        };
        half.iter()
            .skip(shared)
            .rev()
            .map(mirror)
            .chain(half.iter().copied())
            .collect()
    }
}

/// Alternates the sign of `taps` around the centre index `len / 2`, which
/// keeps its sign unless `negate_centre` is set. Turns an analysis filter
/// into the synthesis filter of the other channel.
pub fn alternate_signs<F>(taps: &[F], negate_centre: bool) -> Vec<F>
where
    F: Copy + Neg<Output = F>,
{
    let centre = taps.len() >> 1;
    taps.iter()
        .enumerate()
        .map(|(i, &tap)| {
            let odd = i.abs_diff(centre) % 2 == 1;
            if odd != negate_centre {
                -tap
            } else {
                tap
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{alternate_signs, Filter, Symmetry};

    #[test]
    fn test_len() {
        let hss = Filter::HSS(vec![1.0, 2.0, 3.0]);
        assert_eq!(6, hss.len());
        let wss = Filter::WSS(vec![1.0, 2.0, 3.0]);
        assert_eq!(5, wss.len());
    }

    #[test]
    fn test_from_taps_keeps_right_half() {
        let wss = Filter::from_taps(&[3.0, 2.0, 1.0, 2.0, 3.0]);
        assert_eq!(Filter::WSS(vec![1.0, 2.0, 3.0]), wss);
        let hss = Filter::from_taps(&[-2.0, -1.0, 1.0, 2.0]);
        assert_eq!(Filter::HSS(vec![1.0, 2.0]), hss);
    }

    #[test]
    fn test_wss_taps() {
        let wss = Filter::WSS(vec![1.0, 2.0, 3.0]);
        assert_eq!(vec![3., 2., 1., 2., 3.], wss.taps(Symmetry::Symmetric));
    }

    #[test]
    fn test_hss_taps_symmetric() {
        let hss = Filter::HSS(vec![1.0, 2.0, 3.0]);
        assert_eq!(vec![3., 2., 1., 1., 2., 3.], hss.taps(Symmetry::Symmetric));
    }

    #[test]
    fn test_hss_taps_antisymmetric() {
        let hss = Filter::HSS(vec![1.0, 2.0, 3.0]);
        assert_eq!(vec![-3., -2., -1., 1., 2., 3.], hss.taps(Symmetry::Antisymmetric));
    }

    #[test]
    fn test_alternate_signs_odd() {
        let actual = alternate_signs(&[3., 2., 1., 2., 3.], false);
        assert_eq!(vec![3., -2., 1., -2., 3.], actual);
    }

    #[test]
    fn test_alternate_signs_even() {
        let actual = alternate_signs(&[-2., -1., 1., 2.], false);
        assert_eq!(vec![-2., 1., 1., -2.], actual);
        let actual = alternate_signs(&[2., 1., 1., 2.], true);
        assert_eq!(vec![-2., 1., -1., 2.], actual);
    }
}
