use super::*;

#[test]
fn test_index_list_link_unlink() {
    let mut list = IndexList::new(6);
    assert!(list.is_empty());
    assert_eq!(list.first(), None);

    list.push_back(2);
    list.push_back(4);
    list.insert_after(None, 0);
    list.insert_after(Some(2), 3);
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![0, 2, 3, 4]);
    assert_eq!(list.len(), 4);
    assert!(list.is_consistent());

    list.unlink(3);
    list.unlink(0);
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![2, 4]);
    assert!(!list.contains(0));
    assert_eq!(list.prev(4), Some(2));
    assert_eq!(list.next(4), None);
    assert_eq!(list.first(), Some(2));
    assert_eq!(list.last(), Some(4));
    assert_eq!(list.iter_from(Some(4)).collect::<Vec<_>>(), vec![4]);
    assert!(list.is_consistent());

    // prev/next round trip for every linked index
    for i in list.iter() {
        if let Some(p) = list.prev(i) {
            assert_eq!(list.next(p), Some(i));
        }
    }
}

#[test]
fn test_rows_stay_sorted() {
    let mut set = ActiveSet::new(8, 2);
    for &r in &[5, 1, 7, 3, 0] {
        set.activate(r, RowStatus::AtLower);
    }
    assert_eq!(set.rows().iter().collect::<Vec<_>>(), vec![0, 1, 3, 5, 7]);
    assert!(set.check_invariants());

    set.deactivate(3);
    set.deactivate(0);
    assert_eq!(set.rows().iter().collect::<Vec<_>>(), vec![1, 5, 7]);
    assert_eq!(set.recently_dropped(), &[3, 0]);
    assert_eq!(set.row_status(3), RowStatus::Dropped);

    set.activate(4, RowStatus::Equality);
    assert_eq!(set.rows().iter().collect::<Vec<_>>(), vec![1, 4, 5, 7]);
    assert!(set.check_invariants());

    assert_eq!(set.take_dropped(), vec![3, 0]);
    assert!(set.recently_dropped().is_empty());
}

#[test]
fn test_bound_and_free_columns() {
    let mut set = ActiveSet::new(0, 5);
    assert_eq!(set.free_columns().len(), 5);

    set.activate_bound(1, BoundSide::Lower);
    set.activate_bound(4, BoundSide::Upper);
    set.activate_bound(0, BoundSide::Lower);
    assert_eq!(set.col_status(4), ColumnStatus::AtUpper);
    assert_eq!(set.col_status(4).sign(), 1);
    assert_eq!(set.bound_columns().len(), 3);
    let mut free = set.free_columns().to_vec();
    free.sort();
    assert_eq!(free, vec![2, 3]);
    assert!(set.check_invariants());

    // switching sides keeps a single list entry
    set.activate_bound(1, BoundSide::Upper);
    assert_eq!(set.bound_columns().len(), 3);

    set.free(4);
    set.free(1);
    assert!(set.is_free(4));
    assert_eq!(set.bound_columns().iter().collect::<Vec<_>>(), vec![0]);
    assert_eq!(set.free_columns().len(), 4);
    assert!(set.check_invariants());
}
