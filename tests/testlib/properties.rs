pub fn prop_intersection_correct<S>(result: &[u32], sets: &[S]) -> bool
where
    S: AsRef<[u32]>,
{
    prop_strictly_increasing(result) &&
    prop_result_items_all_common(result, sets) &&
    prop_all_common_items_in_result(result, sets)
}

pub fn prop_strictly_increasing(result: &[u32]) -> bool {
    result.windows(2).all(|w| w[0] < w[1])
}

// If an item is in the result, then it is a common item.
pub fn prop_result_items_all_common<S>(result: &[u32], sets: &[S]) -> bool
where
    S: AsRef<[u32]>,
{
    result.iter().all(|result_item| {
        sets.iter().all(|input_set| {
            input_set.as_ref().binary_search(result_item).is_ok()
        })
    })
}

// If an item is common, then it is in the result.
pub fn prop_all_common_items_in_result<S>(result: &[u32], sets: &[S]) -> bool
where
    S: AsRef<[u32]>,
{
    sets[0].as_ref().iter()
        .filter(|item| sets.iter().skip(1).all(|set| set.as_ref().binary_search(item).is_ok()))
        .all(|item| result.binary_search(item).is_ok())
}
