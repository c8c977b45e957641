use crate::sequence::{AngleSequence, AngleVector};

/// One user frame paired with one reference frame for comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub index: usize,
    pub user: AngleVector,
    pub reference: AngleVector,
}

/// Pair frames by position: the i-th user frame with the i-th reference frame,
/// truncated to the shorter sequence.
///
/// The two videos share no clock, so this is only an approximation of true
/// temporal alignment: it ignores differences in frame rate and tempo. An
/// empty input yields no pairs.
pub fn align(user: AngleSequence, reference: AngleSequence) -> Vec<AlignedPair> {
    user.into_iter()
        .zip(reference)
        .enumerate()
        .map(|(index, (user, reference))| AlignedPair {
            index,
            user,
            reference,
        })
        .collect()
}
