//! Genotype cell types and their reserved sentinel values.
//!
//! Cells follow the BCF typed-value convention: the smallest value of the
//! signed type marks a missing call and the next one marks end-of-vector,
//! i.e. "this sample has no further calls in a row of this width".

use std::fmt::Debug;

/// A signed integer wide enough to hold allele indices plus the two
/// reserved sentinels.
pub trait GenotypeCell: Copy + Eq + Debug + Send + Sync + 'static {
    fn missing() -> Self;

    fn end_of_vector() -> Self;

    /// Encode an allele index, `None` when it does not fit this width.
    fn from_allele(index: usize) -> Option<Self>;

    /// Decode an allele index, `None` for either sentinel.
    fn to_allele(self) -> Option<usize>;

    fn is_missing(self) -> bool {
        self == Self::missing()
    }

    fn is_end_of_vector(self) -> bool {
        self == Self::end_of_vector()
    }
}

macro_rules! impl_genotype_cell {
    ($ty:ty) => {
        impl GenotypeCell for $ty {
            fn missing() -> Self {
                <$ty>::MIN
            }

            fn end_of_vector() -> Self {
                <$ty>::MIN + 1
            }

            fn from_allele(index: usize) -> Option<Self> {
                <$ty>::try_from(index).ok()
            }

            fn to_allele(self) -> Option<usize> {
                usize::try_from(self).ok()
            }
        }
    };
}

impl_genotype_cell!(i8);
impl_genotype_cell!(i32);

/// The end-of-vector sentinel for cell type `T`.
pub fn end_of_vector<T: GenotypeCell>() -> T {
    T::end_of_vector()
}

/// The missing-call sentinel for cell type `T`.
pub fn missing<T: GenotypeCell>() -> T {
    T::missing()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_match_bcf_typed_values() {
        assert_eq!(missing::<i8>(), -128);
        assert_eq!(end_of_vector::<i8>(), -127);
        assert_eq!(missing::<i32>() as u32, 0x8000_0000);
        assert_eq!(end_of_vector::<i32>() as u32, 0x8000_0001);
    }

    #[test]
    fn allele_conversion_rejects_sentinels_and_overflow() {
        assert_eq!(i8::from_allele(3), Some(3));
        assert_eq!(i8::from_allele(128), None);
        assert_eq!(i32::from_allele(128), Some(128));
        assert_eq!(missing::<i8>().to_allele(), None);
        assert_eq!(end_of_vector::<i32>().to_allele(), None);
        assert_eq!(2i32.to_allele(), Some(2));
        assert!(end_of_vector::<i8>().is_end_of_vector());
        assert!(!end_of_vector::<i8>().is_missing());
    }
}
