/// Upper median of `fees`, or zero if there are none.
pub(crate) fn upper_median(fees: &[u128]) -> u128 {
    if fees.is_empty() {
        return 0;
    }
    let mut fees = fees.to_vec();
    let middle = fees.len() / 2;
    let (_, &mut median, _) = fees.select_nth_unstable(middle);
    median
}
