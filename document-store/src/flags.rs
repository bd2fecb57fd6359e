/// An aggregate carrying a per-owner boolean flag
///
/// Payment methods use it for `isDefault`. Among siblings sharing the same
/// owner, at most one may be flagged.
pub trait Flagged {
    fn owner(&self) -> &str;
    fn is_flagged(&self) -> bool;
    fn set_flag(&mut self, flagged: bool);
}

/// Clear the flag on every sibling of `owner`, except `except_id` if given.
///
/// Returns how many items were unflagged. The items themselves are matched by
/// `id_of` so the helper works for any aggregate shape.
pub fn clear_flag_siblings<T, F>(
    items: &mut [T],
    owner: &str,
    except_id: Option<&str>,
    id_of: F,
) -> usize
where
    T: Flagged,
    F: Fn(&T) -> &str,
{
    let mut cleared = 0;
    for item in items.iter_mut() {
        if item.owner() != owner || !item.is_flagged() {
            continue;
        }
        if except_id.is_some_and(|id| id_of(&*item) == id) {
            continue;
        }
        item.set_flag(false);
        cleared += 1;
    }
    cleared
}

/// Number of flagged items belonging to `owner`
pub fn flagged_count<T: Flagged>(items: &[T], owner: &str) -> usize {
    items
        .iter()
        .filter(|item| item.owner() == owner && item.is_flagged())
        .count()
}
